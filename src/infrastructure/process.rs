//! Running external protocol tools with uniform error reporting.

use std::process::Output;

use tracing::{debug, instrument};

use crate::infrastructure::traits::CommandRunner;
use crate::infrastructure::{InfraError, InfraResult};

/// Run `program` with `args`, capturing stdout and stderr into one buffer.
///
/// A non-zero exit reports the program, its exit code and the captured
/// output. Any other failure (missing program, killed by a signal)
/// reports the program and whatever output exists.
#[instrument(level = "debug", skip(runner))]
pub fn run_command(runner: &dyn CommandRunner, program: &str, args: &[&str]) -> InfraResult<()> {
    let output = match runner.run(program, args) {
        Ok(output) => output,
        Err(e) => {
            return Err(InfraError::Failed {
                program: program.to_string(),
                output: e.to_string(),
            })
        }
    };

    if output.status.success() {
        debug!("{} finished", program);
        return Ok(());
    }

    let combined = combined_output(&output);
    match output.status.code() {
        Some(code) => Err(InfraError::Exited {
            program: program.to_string(),
            code,
            output: combined,
        }),
        None => Err(InfraError::Failed {
            program: program.to_string(),
            output: combined,
        }),
    }
}

fn combined_output(output: &Output) -> String {
    let mut buf = String::from_utf8_lossy(&output.stdout).into_owned();
    buf.push_str(&String::from_utf8_lossy(&output.stderr));
    buf
}
