//! Command-line configuration
//!
//! The only configurable input is the experiments root, `--experiment_dir`.
//! Programs that need their own flags flatten [`ExperimentArgs`] into their
//! parser instead of mutating a shared one:
//!
//! ```rust,no_run
//! use clap::Parser;
//! use trueno_lab::ExperimentArgs;
//!
//! #[derive(Parser)]
//! struct Cli {
//!     #[command(flatten)]
//!     experiment: ExperimentArgs,
//!
//!     #[arg(long, default_value_t = 10)]
//!     epochs: usize,
//! }
//!
//! let cli = Cli::parse();
//! println!("{}", cli.experiment.experiment_dir().display());
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};

/// Default experiments root.
pub const DEFAULT_EXPERIMENT_DIR: &str = "./experiments";

/// Environment variable consulted when `--experiment_dir` is absent.
pub const EXPERIMENT_DIR_ENV: &str = "TRUENO_LAB_EXPERIMENT_DIR";

/// Flags shared by every experiment program.
#[derive(Parser, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[command(about = "Experiment output options")]
pub struct ExperimentArgs {
    /// Root directory under which timestamped run directories are created
    #[arg(
        long = "experiment_dir",
        value_name = "PATH",
        env = EXPERIMENT_DIR_ENV,
        default_value = DEFAULT_EXPERIMENT_DIR
    )]
    experiment_dir: PathBuf,
}

impl ExperimentArgs {
    /// Arguments pointing at an explicit experiments root.
    #[must_use]
    pub fn new(experiment_dir: impl Into<PathBuf>) -> Self {
        Self {
            experiment_dir: experiment_dir.into(),
        }
    }

    /// Parse from the process arguments, exiting with usage on error.
    #[must_use]
    pub fn from_env() -> Self {
        Self::parse()
    }

    /// Parse from an explicit argument list (first item is the program name).
    ///
    /// # Errors
    ///
    /// Returns the `clap` error for unknown flags or a missing value.
    pub fn try_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)
    }

    /// The `clap` command describing these flags.
    #[must_use]
    pub fn command() -> clap::Command {
        <Self as CommandFactory>::command()
    }

    /// Experiments root.
    #[must_use]
    pub fn experiment_dir(&self) -> &Path {
        &self.experiment_dir
    }
}

impl Default for ExperimentArgs {
    fn default() -> Self {
        Self::new(DEFAULT_EXPERIMENT_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_experiment_dir() {
        let args = ExperimentArgs::default();
        assert_eq!(args.experiment_dir(), Path::new("./experiments"));
    }

    #[test]
    fn test_parse_experiment_dir_flag() {
        let args = ExperimentArgs::try_from_args(["prog", "--experiment_dir", "/tmp/runs"]).unwrap();
        assert_eq!(args.experiment_dir(), Path::new("/tmp/runs"));

        let args = ExperimentArgs::try_from_args(["prog", "--experiment_dir=out"]).unwrap();
        assert_eq!(args.experiment_dir(), Path::new("out"));
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(ExperimentArgs::try_from_args(["prog", "--bogus"]).is_err());
    }

    #[test]
    fn test_command_exposes_flag() {
        let command = ExperimentArgs::command();
        assert!(command
            .get_arguments()
            .any(|arg| arg.get_long() == Some("experiment_dir")));
    }
}
