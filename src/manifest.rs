//! Run Manifest - optional `experiment.json` describing a run directory

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::context::ExperimentContext;
use crate::style::PlotStyle;
use crate::Result;

/// File name of the manifest inside the run directory.
pub const MANIFEST_FILE_NAME: &str = "experiment.json";

/// Run Manifest records how a run directory came to be.
///
/// It is only written on request (see
/// [`ActiveExperiment::record_manifest`](crate::ActiveExperiment::record_manifest)),
/// so the default run layout stays `out.log` plus saved figures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunManifest {
    name: String,
    output_path: PathBuf,
    started_at: DateTime<Local>,
    capture_output: bool,
    style: PlotStyle,
    config: Option<serde_json::Value>,
}

impl RunManifest {
    /// Manifest for `context` without extra configuration.
    #[must_use]
    pub fn new(context: &ExperimentContext) -> Self {
        Self::builder(context).build()
    }

    /// Create a builder for attaching caller configuration.
    #[must_use]
    pub fn builder(context: &ExperimentContext) -> RunManifestBuilder {
        RunManifestBuilder::new(context)
    }

    /// Read a manifest back from a run directory.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file is missing and `Error::Manifest` if it
    /// is not a valid manifest.
    pub fn read_from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(dir.as_ref().join(MANIFEST_FILE_NAME))?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the manifest into `dir`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `Error::Manifest` or `Error::Io` on failure.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(MANIFEST_FILE_NAME);
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(&path, serialized)?;
        tracing::debug!(path = %path.display(), "wrote run manifest");
        Ok(path)
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the run directory.
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Get the run timestamp.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Whether console output was captured.
    #[must_use]
    pub const fn capture_output(&self) -> bool {
        self.capture_output
    }

    /// Get the plot style applied on entry.
    #[must_use]
    pub const fn style(&self) -> PlotStyle {
        self.style
    }

    /// Get the caller configuration, if any.
    #[must_use]
    pub const fn config(&self) -> Option<&serde_json::Value> {
        self.config.as_ref()
    }
}

/// Builder for `RunManifest`.
#[derive(Debug)]
pub struct RunManifestBuilder {
    manifest: RunManifest,
}

impl RunManifestBuilder {
    /// Create a new builder from the run's context.
    #[must_use]
    pub fn new(context: &ExperimentContext) -> Self {
        Self {
            manifest: RunManifest {
                name: context.name().to_string(),
                output_path: context.output_path().to_path_buf(),
                started_at: context.started_at(),
                capture_output: context.capture_output(),
                style: context.style(),
                config: None,
            },
        }
    }

    /// Attach caller configuration (hyperparameters, seeds, ...).
    #[must_use]
    pub fn config(mut self, config: serde_json::Value) -> Self {
        self.manifest.config = Some(config);
        self
    }

    /// Build the `RunManifest`.
    #[must_use]
    pub fn build(self) -> RunManifest {
        self.manifest
    }
}
