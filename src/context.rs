//! Experiment context: configure, then activate
//!
//! An [`ExperimentContext`] only computes where a run's output will live.
//! Nothing touches the filesystem until [`ExperimentContext::enter`], which
//! returns an [`ActiveExperiment`] guard. The guard owns the run directory's
//! log and releases it when it goes out of scope, including during a panic.
//!
//! ```text
//! ExperimentContext ──enter()──> ActiveExperiment ──exit()/drop──> console
//!   (paths only)                 (dir + out.log)
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::io::Write;
//! use trueno_lab::{ExperimentArgs, ExperimentContext};
//!
//! let args = ExperimentArgs::from_env();
//! ExperimentContext::new("my_experiment", &args)?.run(|experiment| {
//!     // Written to stdout and to <run dir>/out.log
//!     writeln!(experiment, "Doing some work")?;
//!     Ok::<_, trueno_lab::Error>(())
//! })?;
//! # Ok::<(), trueno_lab::Error>(())
//! ```

use std::fs;
use std::io::{self, Stdout, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::figure::{figure_file_name, Figure, DEFAULT_FIGURE_EXTENSION};
use crate::manifest::RunManifest;
use crate::style::{self, PlotStyle};
use crate::tee::TeeWriter;
use crate::{Error, ExperimentArgs, Result};

/// Log file created inside the run directory when capture is on.
pub const LOG_FILE_NAME: &str = "out.log";

/// `strftime` pattern for the run directory suffix (one second resolution).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// Printed to the console on entry, before capture starts.
pub const ENTER_BANNER: &str = "----- Entering experiment context -----";

/// Printed to the console on exit, after capture stops.
pub const EXIT_BANNER: &str = "----- Leaving experiment context ------";

/// Run directory name: `{name}_{timestamp}`.
#[must_use]
pub fn run_dir_name(name: &str, timestamp: &DateTime<Local>) -> String {
    format!("{name}_{}", timestamp.format(TIMESTAMP_FORMAT))
}

fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.chars().any(std::path::is_separator);
    if invalid {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

/// A configured experiment run.
///
/// Construction validates the name and computes
/// `{experiment_dir}/{name}_{timestamp}`; it creates nothing on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentContext {
    name: String,
    experiment_dir: PathBuf,
    output_path: PathBuf,
    capture_output: bool,
    style: PlotStyle,
    started_at: DateTime<Local>,
}

impl ExperimentContext {
    /// Configure a run with output capture enabled.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidName` if `name` is empty or contains a path separator.
    pub fn new(name: impl Into<String>, args: &ExperimentArgs) -> Result<Self> {
        Self::builder(name)
            .experiment_dir(args.experiment_dir())
            .build()
    }

    /// Builder for runs that need non-default settings.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ExperimentContextBuilder {
        ExperimentContextBuilder::new(name)
    }

    /// Experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configured experiments root.
    #[must_use]
    pub fn experiment_dir(&self) -> &Path {
        &self.experiment_dir
    }

    /// Timestamped run directory.
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Whether console output is duplicated into `out.log`.
    #[must_use]
    pub const fn capture_output(&self) -> bool {
        self.capture_output
    }

    /// Path of `out.log`, if capture is enabled.
    #[must_use]
    pub fn log_path(&self) -> Option<PathBuf> {
        self.capture_output
            .then(|| self.output_path.join(LOG_FILE_NAME))
    }

    /// Plot style applied on entry.
    #[must_use]
    pub const fn style(&self) -> PlotStyle {
        self.style
    }

    /// Timestamp used in the run directory name.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Activate the run with the process stdout as console.
    ///
    /// # Errors
    ///
    /// See [`ExperimentContext::enter_with`].
    pub fn enter(self) -> Result<ActiveExperiment<Stdout>> {
        self.enter_with(io::stdout())
    }

    /// Activate the run, printing to `console`.
    ///
    /// Creates the experiments root if needed and the run directory itself,
    /// opens `out.log` in append mode when capture is on, then prints the
    /// entry banner and applies the plot style.
    ///
    /// # Errors
    ///
    /// - `Error::DirectoryExists` if the run directory is already present
    ///   (another run with this name started in the same second)
    /// - `Error::Io` for any other filesystem or console failure
    pub fn enter_with<W: Write>(self, console: W) -> Result<ActiveExperiment<W>> {
        fs::create_dir_all(&self.experiment_dir)?;
        match fs::create_dir(&self.output_path) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::DirectoryExists {
                    path: self.output_path,
                });
            }
            Err(err) => return Err(err.into()),
        }
        tracing::info!(
            experiment = %self.name,
            path = %self.output_path.display(),
            "created run directory"
        );

        self.activate(console)
    }

    // Expects the run directory to exist. The banner is only printed once
    // the log is open, so a failed open leaves the console untouched.
    fn activate<W: Write>(self, console: W) -> Result<ActiveExperiment<W>> {
        let mut sink = match self.log_path() {
            Some(log_path) => Sink::Tee(TeeWriter::open(console, log_path)?),
            None => Sink::Console(console),
        };
        writeln!(sink.console_mut(), "{ENTER_BANNER}")?;
        style::set_style(self.style);

        Ok(ActiveExperiment {
            context: self,
            sink: Some(sink),
        })
    }

    /// Enter, run `body` against stdout, then exit.
    ///
    /// # Errors
    ///
    /// Entry and exit failures are converted into `E`; an error returned by
    /// `body` is passed through unchanged after cleanup.
    pub fn run<T, E, F>(self, body: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut ActiveExperiment<&mut Stdout>) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let mut stdout = io::stdout();
        self.run_with(&mut stdout, body)
    }

    /// Enter, run `body` against a borrowed `console`, then exit.
    ///
    /// The console is only borrowed for the run, so the caller still holds
    /// it afterwards whatever the outcome. Cleanup happens on every path:
    /// success, an error from `body`, or a panic unwinding through it.
    ///
    /// # Errors
    ///
    /// As for [`ExperimentContext::run`].
    pub fn run_with<'c, W, T, E, F>(self, console: &'c mut W, body: F) -> std::result::Result<T, E>
    where
        W: Write + ?Sized,
        F: FnOnce(&mut ActiveExperiment<&'c mut W>) -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let mut active = self.enter_with(console)?;
        // On error or panic, Drop closes the log; the body's error is returned as-is.
        let value = body(&mut active)?;
        active.exit()?;
        Ok(value)
    }
}

/// Builder for `ExperimentContext`.
#[derive(Debug)]
pub struct ExperimentContextBuilder {
    name: String,
    experiment_dir: PathBuf,
    capture_output: bool,
    style: PlotStyle,
    started_at: Option<DateTime<Local>>,
}

impl ExperimentContextBuilder {
    /// Builder with default root, capture on and the default style.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            experiment_dir: ExperimentArgs::default().experiment_dir().to_path_buf(),
            capture_output: true,
            style: PlotStyle::default(),
            started_at: None,
        }
    }

    /// Set the experiments root.
    #[must_use]
    pub fn experiment_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.experiment_dir = dir.into();
        self
    }

    /// Enable or disable duplicating console output into `out.log`.
    #[must_use]
    pub const fn capture_output(mut self, enabled: bool) -> Self {
        self.capture_output = enabled;
        self
    }

    /// Set the plot style applied on entry.
    #[must_use]
    pub const fn style(mut self, style: PlotStyle) -> Self {
        self.style = style;
        self
    }

    /// Pin the run timestamp instead of using the current local time.
    #[must_use]
    pub const fn started_at(mut self, timestamp: DateTime<Local>) -> Self {
        self.started_at = Some(timestamp);
        self
    }

    /// Build the context.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidName` if the name is empty, `.`/`..`, or
    /// contains a path separator.
    pub fn build(self) -> Result<ExperimentContext> {
        validate_name(&self.name)?;
        let started_at = self.started_at.unwrap_or_else(Local::now);
        let output_path = self
            .experiment_dir
            .join(run_dir_name(&self.name, &started_at));

        Ok(ExperimentContext {
            name: self.name,
            experiment_dir: self.experiment_dir,
            output_path,
            capture_output: self.capture_output,
            style: self.style,
            started_at,
        })
    }
}

#[derive(Debug)]
enum Sink<W: Write> {
    Console(W),
    Tee(TeeWriter<W>),
}

impl<W: Write> Sink<W> {
    fn console_mut(&mut self) -> &mut W {
        match self {
            Self::Console(console) => console,
            Self::Tee(tee) => tee.console_mut(),
        }
    }

    fn into_console(self) -> W {
        match self {
            Self::Console(console) => console,
            Self::Tee(tee) => tee.close(),
        }
    }
}

impl<W: Write> Write for Sink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Console(console) => console.write(buf),
            Self::Tee(tee) => tee.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Console(console) => console.flush(),
            Self::Tee(tee) => tee.flush(),
        }
    }
}

/// An entered experiment run.
///
/// Write through it (it implements [`Write`]) or hand [`ActiveExperiment::out`]
/// to code whose output should land in `out.log`. Dropping the guard closes
/// the log and prints the exit banner; [`ActiveExperiment::exit`] does the same
/// and reports errors.
#[derive(Debug)]
pub struct ActiveExperiment<W: Write> {
    context: ExperimentContext,
    // None only after exit() or during drop
    sink: Option<Sink<W>>,
}

impl<W: Write> ActiveExperiment<W> {
    /// The configuration this run was entered with.
    #[must_use]
    pub const fn context(&self) -> &ExperimentContext {
        &self.context
    }

    /// Timestamped run directory (exists while the guard is alive).
    #[must_use]
    pub fn output_path(&self) -> &Path {
        self.context.output_path()
    }

    /// Configured experiments root.
    #[must_use]
    pub fn experiment_dir(&self) -> &Path {
        self.context.experiment_dir()
    }

    /// Path of `out.log`, if capture is enabled.
    #[must_use]
    pub fn log_path(&self) -> Option<PathBuf> {
        self.context.log_path()
    }

    /// Writer handle for captured output.
    pub fn out(&mut self) -> &mut dyn Write {
        self
    }

    /// Save `figure` as `{name}.pdf` (spaces in `name` become underscores).
    ///
    /// # Errors
    ///
    /// Propagates the figure's save error.
    pub fn save_fig<F: Figure + ?Sized>(&self, figure: &mut F, name: &str) -> Result<PathBuf> {
        self.save_fig_as(figure, name, DEFAULT_FIGURE_EXTENSION)
    }

    /// Save `figure` into the run directory as `{name}{extension}`.
    ///
    /// Applies the figure's tight layout first. An existing file with the
    /// same name is overwritten.
    ///
    /// # Errors
    ///
    /// Propagates the figure's save error.
    pub fn save_fig_as<F: Figure + ?Sized>(
        &self,
        figure: &mut F,
        name: &str,
        extension: &str,
    ) -> Result<PathBuf> {
        figure.tight_layout();
        let path = self
            .context
            .output_path()
            .join(figure_file_name(name, extension));
        figure.save(&path)?;
        tracing::debug!(path = %path.display(), "saved figure");
        Ok(path)
    }

    /// Write `experiment.json` describing this run into the run directory.
    ///
    /// `config` is stored verbatim (hyperparameters and the like).
    ///
    /// # Errors
    ///
    /// Returns `Error::Manifest` or `Error::Io` if the file cannot be written.
    pub fn record_manifest(&self, config: Option<serde_json::Value>) -> Result<PathBuf> {
        let mut builder = RunManifest::builder(&self.context);
        if let Some(config) = config {
            builder = builder.config(config);
        }
        builder.build().write_to_dir(self.context.output_path())
    }

    /// Close the log, print the exit banner and hand the console back.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the banner cannot be written.
    pub fn exit(mut self) -> Result<W> {
        let sink = self.sink.take().ok_or_else(already_exited)?;
        finish(&self.context, sink)
    }

    fn sink(&mut self) -> io::Result<&mut Sink<W>> {
        self.sink.as_mut().ok_or_else(already_exited)
    }
}

fn already_exited() -> io::Error {
    io::Error::other("experiment context already exited")
}

fn finish<W: Write>(context: &ExperimentContext, sink: Sink<W>) -> Result<W> {
    let mut console = sink.into_console();
    writeln!(console, "{EXIT_BANNER}")?;
    console.flush()?;
    tracing::info!(
        experiment = %context.name(),
        path = %context.output_path().display(),
        "left experiment context"
    );
    Ok(console)
}

impl<W: Write> Write for ActiveExperiment<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sink()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink()?.flush()
    }
}

impl<W: Write> Drop for ActiveExperiment<W> {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            if let Err(err) = finish(&self.context, sink) {
                tracing::warn!(
                    experiment = %self.context.name(),
                    error = %err,
                    "failed to close experiment context cleanly"
                );
            }
        }
    }
}
