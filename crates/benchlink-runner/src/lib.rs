//! Invokes the external Robot Framework generator tool
//!
//! The generator (`tb2robot`) converts downloaded report archives into Robot
//! Framework test suites (`write`) and folds execution results back into an
//! archive the server can import (`read`). It runs as a subprocess; commands
//! are built argv-style, never through a shell, so paths with spaces or
//! metacharacters cannot change the command.

mod command_spec;
mod process;
mod tool;

pub use command_spec::CommandSpec;
pub use process::run_command;
pub use tool::{GeneratorTool, Tb2RobotTool};

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from generator tool invocations.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {code}: {stderr_tail}")]
    Failed {
        program: String,
        code: i32,
        stderr_tail: String,
    },

    #[error("{program} was terminated by a signal")]
    Killed { program: String },

    #[error("working directory {path} does not exist")]
    MissingWorkingDir { path: PathBuf },
}
