//! # trueno-lab: Experiment Output Context
//!
//! **Version**: 0.1.0
//!
//! trueno-lab keeps the output of ad-hoc experiment programs organized.
//! Each run gets its own timestamped directory, console output is duplicated
//! into `out.log` inside it, and figures are saved next to the log.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Poka-Yoke safety**: Configuring a run has no side effects; the run
//!   directory is created only when the run is entered
//! - **Jidoka**: The log is closed on every exit path, panics included
//! - **Respect for People**: Captured output goes through an explicit writer
//!   handle, never by swapping process-wide stdout
//!
//! ## Layout
//!
//! ```text
//! {experiment_dir}/{name}_{YYYY-MM-DD-HH-MM-SS}/
//! ├── out.log            (when capture is enabled)
//! └── {figure_name}.pdf  (one per save_fig call)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::io::Write;
//! use trueno_lab::{ExperimentArgs, ExperimentContext};
//!
//! let args = ExperimentArgs::from_env();
//! let mut experiment = ExperimentContext::new("my_experiment", &args)?.enter()?;
//!
//! // Log output gets saved even if later work fails
//! writeln!(experiment, "Doing some work")?;
//!
//! experiment.exit()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod context;
pub mod error;
pub mod figure;
pub mod manifest;
pub mod style;
pub mod tee;

pub use config::ExperimentArgs;
pub use context::{ActiveExperiment, ExperimentContext, ExperimentContextBuilder};
pub use error::{Error, Result};
pub use figure::Figure;
pub use manifest::RunManifest;
pub use style::PlotStyle;
pub use tee::TeeWriter;
