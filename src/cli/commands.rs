//! Command dispatch

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::LoadOptions;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::GetMode;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage("no command given, see `modtree --help`".into()));
    };

    // completion needs no settings
    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let mut settings = Settings::load(cli.config.as_deref())?;
    if cli.parallel {
        settings.parallel = true;
    }
    let container = ServiceContainer::new(settings);
    run(&container, command, cli.config.as_deref())
}

/// Run `command` against an assembled container.
pub fn run(
    container: &ServiceContainer,
    command: &Commands,
    config: Option<&Path>,
) -> CliResult<()> {
    match command {
        Commands::Get { dir, update } => {
            let mode = if *update { GetMode::Update } else { GetMode::Get };
            _tree(container, dir, mode)
        }
        Commands::Tree { dir, mode } => {
            _tree(container, dir, mode.unwrap_or(container.settings.mode))
        }
        Commands::Validate { dir, mode } => {
            _validate(container, dir, mode.unwrap_or(container.settings.mode))
        }
        Commands::Fetch { source, dest } => _fetch(container, source, dest),
        Commands::Config { command } => _config(container, command, config),
        Commands::Completion { .. } => Ok(()),
    }
}

fn load_options(container: &ServiceContainer, mode: GetMode) -> LoadOptions {
    LoadOptions {
        mode,
        parallel: container.settings.parallel,
    }
}

#[instrument(skip(container))]
fn _tree(container: &ServiceContainer, dir: &Path, mode: GetMode) -> CliResult<()> {
    let tree = container
        .modules
        .load(dir, load_options(container, mode))?;
    output::info(&tree.to_termtree());
    Ok(())
}

#[instrument(skip(container))]
fn _validate(container: &ServiceContainer, dir: &Path, mode: GetMode) -> CliResult<()> {
    let tree = container
        .modules
        .validate(dir, load_options(container, mode))?;
    debug!("validate: tree depth {}", tree.depth());
    output::success(&format!("{} is valid", dir.display()));
    Ok(())
}

#[instrument(skip(container))]
fn _fetch(container: &ServiceContainer, source: &str, dest: &Path) -> CliResult<()> {
    let cwd = std::env::current_dir().map_err(|e| InfraError::io("current dir", e))?;
    container.modules.fetch(source, dest, &cwd)?;
    output::action("Fetched", &format!("{} -> {}", source, dest.display()));
    Ok(())
}

fn _config(
    container: &ServiceContainer,
    command: &ConfigCommands,
    config: Option<&Path>,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&container.settings.to_toml()?),
        ConfigCommands::Path => {
            output::header("Config files (lowest precedence first)");
            match global_config_path() {
                Some(p) => output::info(&format!("global:   {}", p.display())),
                None => output::info("global:   (no config directory)"),
            }
            if let Some(p) = config {
                output::info(&format!("explicit: {}", p.display()));
            }
            output::info(&format!(
                "storage:  {}",
                container.settings.storage_dir.display()
            ));
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}
