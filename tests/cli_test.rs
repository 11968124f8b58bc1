//! Tests for command dispatch against a real container

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use modtree::cli::commands::run;
use modtree::cli::{Commands, ConfigCommands};
use modtree::config::Settings;
use modtree::domain::GetMode;
use modtree::exitcode;
use modtree::infrastructure::di::ServiceContainer;

fn container(storage_dir: PathBuf) -> ServiceContainer {
    ServiceContainer::new(Settings {
        storage_dir,
        mode: GetMode::Get,
        parallel: false,
    })
}

fn write_module(dir: &Path, content: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("main.toml"), content).unwrap();
}

/// root passes `size` to ./db, which declares it.
fn project(temp: &TempDir) -> PathBuf {
    let root = temp.path().join("project");
    write_module(
        &root,
        "[[module]]\nname = \"db\"\nsource = \"./db\"\nsize = 3\n",
    );
    write_module(&root.join("db"), "[[variable]]\nname = \"size\"\n");
    root
}

#[test]
fn given_valid_project_when_validate_then_ok() {
    let temp = TempDir::new().unwrap();
    let root = project(&temp);
    let c = container(temp.path().join("store"));

    run(
        &c,
        &Commands::Validate {
            dir: root,
            mode: None,
        },
        None,
    )
    .unwrap();

    assert!(temp.path().join("store").is_dir());
}

#[test]
fn given_unfetched_modules_when_tree_mode_none_then_unavailable() {
    let temp = TempDir::new().unwrap();
    let root = project(&temp);
    let c = container(temp.path().join("store"));

    let err = run(
        &c,
        &Commands::Tree {
            dir: root,
            mode: Some(GetMode::None),
        },
        None,
    )
    .unwrap_err();

    assert_eq!(err.exit_code(), exitcode::UNAVAILABLE);
    assert_eq!(
        err.to_string(),
        "module db: not found, may need to be downloaded"
    );
}

#[test]
fn given_contract_violation_when_validate_then_data_error() {
    let temp = TempDir::new().unwrap();
    let root = project(&temp);
    write_module(&root.join("db"), "[[variable]]\nname = \"capacity\"\n");
    let c = container(temp.path().join("store"));

    let err = run(
        &c,
        &Commands::Validate {
            dir: root,
            mode: Some(GetMode::Update),
        },
        None,
    )
    .unwrap_err();

    assert_eq!(err.exit_code(), exitcode::DATAERR);
    assert_eq!(
        err.to_string(),
        "module <root>: module db: size is not a valid parameter"
    );
}

#[test]
fn given_missing_directory_when_get_then_io_error() {
    let temp = TempDir::new().unwrap();
    let c = container(temp.path().join("store"));

    let err = run(
        &c,
        &Commands::Get {
            dir: temp.path().join("absent"),
            update: false,
        },
        None,
    )
    .unwrap_err();

    assert_eq!(err.exit_code(), exitcode::IOERR);
}

#[test]
fn given_empty_project_when_get_then_no_input() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("empty");
    fs::create_dir_all(&root).unwrap();
    let c = container(temp.path().join("store"));

    let err = run(
        &c,
        &Commands::Get {
            dir: root,
            update: true,
        },
        None,
    )
    .unwrap_err();

    assert_eq!(err.exit_code(), exitcode::NOINPUT);
}

#[cfg(unix)]
#[test]
fn given_absolute_local_source_when_fetch_then_destination_is_linked() {
    let temp = TempDir::new().unwrap();
    let root = project(&temp);
    let dest = temp.path().join("out/db");
    let c = container(temp.path().join("store"));

    run(
        &c,
        &Commands::Fetch {
            source: root.join("db").display().to_string(),
            dest: dest.clone(),
        },
        None,
    )
    .unwrap();

    assert!(dest.join("main.toml").is_file());
}

#[test]
fn given_config_show_when_run_then_ok() {
    let temp = TempDir::new().unwrap();
    let c = container(temp.path().join("store"));

    run(
        &c,
        &Commands::Config {
            command: ConfigCommands::Show,
        },
        None,
    )
    .unwrap();
    assert_eq!(c.settings.storage_dir, temp.path().join("store"));
}
