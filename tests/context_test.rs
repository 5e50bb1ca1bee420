//! Experiment context lifecycle tests
//!
//! Cover the run directory layout, output capture, console restoration on
//! every exit path and figure saving.

use std::fs;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use chrono::{Local, NaiveDateTime, TimeZone};
use trueno_lab::context::{ENTER_BANNER, EXIT_BANNER, LOG_FILE_NAME, TIMESTAMP_FORMAT};
use trueno_lab::{Error, ExperimentArgs, ExperimentContext, Figure, RunManifest};

/// Figure stand-in that writes its caption as the file body.
struct CaptionFigure {
    caption: String,
    tight_layouts: usize,
}

impl CaptionFigure {
    fn new(caption: &str) -> Self {
        Self {
            caption: caption.to_string(),
            tight_layouts: 0,
        }
    }
}

impl Figure for CaptionFigure {
    fn tight_layout(&mut self) {
        self.tight_layouts += 1;
    }

    fn save(&self, path: &Path) -> trueno_lab::Result<()> {
        fs::write(path, &self.caption)?;
        Ok(())
    }
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// =============================================================================
// Directory layout
// =============================================================================

#[test]
fn test_enter_exit_creates_one_run_directory_with_log() {
    let root = tempfile::tempdir().unwrap();
    let args = ExperimentArgs::new(root.path());

    let context = ExperimentContext::new("mnist", &args).unwrap();
    let mut console = Vec::new();
    let active = context.enter_with(&mut console).unwrap();
    active.exit().unwrap();

    let runs = entries(root.path());
    assert_eq!(runs.len(), 1);

    let timestamp = runs[0].strip_prefix("mnist_").expect("name prefix");
    assert!(NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).is_ok());

    assert_eq!(entries(&root.path().join(&runs[0])), vec![LOG_FILE_NAME]);
}

#[test]
fn test_experiments_root_created_on_enter() {
    let scratch = tempfile::tempdir().unwrap();
    let root = scratch.path().join("nested").join("experiments");

    let context = ExperimentContext::new("deep", &ExperimentArgs::new(&root)).unwrap();
    assert!(!root.exists());

    let mut console = Vec::new();
    let active = context.enter_with(&mut console).unwrap();
    assert!(active.output_path().is_dir());
    assert_eq!(active.experiment_dir(), root.as_path());
    active.exit().unwrap();
}

#[test]
fn test_same_name_same_second_collides() {
    let root = tempfile::tempdir().unwrap();
    let when = Local.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let build = || {
        ExperimentContext::builder("dup")
            .experiment_dir(root.path())
            .started_at(when)
            .build()
            .unwrap()
    };

    let mut console = Vec::new();
    let first = build().enter_with(&mut console).unwrap();

    let mut other_console = Vec::new();
    match build().enter_with(&mut other_console) {
        Err(Error::DirectoryExists { path }) => assert_eq!(path, first.output_path()),
        other => panic!("expected DirectoryExists, got {other:?}"),
    }

    first.exit().unwrap();
    // The failed run never printed its banner
    assert!(other_console.is_empty());
}

// =============================================================================
// Output capture
// =============================================================================

#[test]
fn test_captured_writes_reach_console_and_log() {
    let root = tempfile::tempdir().unwrap();
    let context = ExperimentContext::new("capture", &ExperimentArgs::new(root.path())).unwrap();
    let log_path = context.log_path().unwrap();

    let mut console = Vec::new();
    let mut active = context.enter_with(&mut console).unwrap();
    writeln!(active, "loss=0.25").unwrap();
    write!(active.out(), "partial ").unwrap();
    writeln!(active.out(), "line").unwrap();
    active.flush().unwrap();
    active.exit().unwrap();

    let console = String::from_utf8(console).unwrap();
    assert!(console.contains("loss=0.25\npartial line\n"));
    assert_eq!(fs::read_to_string(log_path).unwrap(), "loss=0.25\npartial line\n");
}

#[test]
fn test_run_with_returns_body_value() {
    let root = tempfile::tempdir().unwrap();
    let context = ExperimentContext::new("value", &ExperimentArgs::new(root.path())).unwrap();

    let mut console = Vec::new();
    let result: Result<u32, Error> = context.run_with(&mut console, |experiment| {
        writeln!(experiment, "computing")?;
        Ok(42)
    });

    assert_eq!(result.unwrap(), 42);
    let console = String::from_utf8(console).unwrap();
    assert_eq!(console, format!("{ENTER_BANNER}\ncomputing\n{EXIT_BANNER}\n"));
}

// =============================================================================
// Console restoration on every exit path
// =============================================================================

#[derive(Debug)]
enum BodyError {
    Lab(Error),
    Diverged(f64),
}

impl From<Error> for BodyError {
    fn from(err: Error) -> Self {
        Self::Lab(err)
    }
}

#[test]
fn test_body_error_passes_through_after_cleanup() {
    let root = tempfile::tempdir().unwrap();
    let context = ExperimentContext::new("diverge", &ExperimentArgs::new(root.path())).unwrap();
    let log_path = context.log_path().unwrap();

    let mut console = Vec::new();
    let result: Result<(), BodyError> = context.run_with(&mut console, |experiment| {
        writeln!(experiment, "step 1").map_err(Error::from)?;
        Err(BodyError::Diverged(f64::INFINITY))
    });

    assert!(matches!(result, Err(BodyError::Diverged(loss)) if loss.is_infinite()));
    let console = String::from_utf8(console).unwrap();
    assert!(console.ends_with(&format!("{EXIT_BANNER}\n")));
    assert_eq!(fs::read_to_string(log_path).unwrap(), "step 1\n");
}

/// Console owned by the test that must stay usable after the run.
#[derive(Default)]
struct SessionConsole {
    lines: Vec<String>,
    pending: String,
}

impl Write for SessionConsole {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.pending.push_str(&String::from_utf8_lossy(buf));
        while let Some(end) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=end).collect();
            self.lines.push(line.trim_end().to_string());
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_run_with_leaves_console_with_caller_on_error() {
    let root = tempfile::tempdir().unwrap();
    let context = ExperimentContext::new("owned", &ExperimentArgs::new(root.path())).unwrap();

    let mut console = SessionConsole::default();
    let result: Result<(), Error> = context.run_with(&mut console, |experiment| {
        writeln!(experiment, "rendering")?;
        Err(Error::Figure("backend unavailable".to_string()))
    });

    assert!(matches!(result, Err(Error::Figure(ref msg)) if msg == "backend unavailable"));
    writeln!(console, "after run").unwrap();
    assert_eq!(
        console.lines,
        vec![ENTER_BANNER, "rendering", EXIT_BANNER, "after run"]
    );
}

#[test]
fn test_panic_in_body_still_closes_context() {
    let root = tempfile::tempdir().unwrap();
    let context = ExperimentContext::new("crash", &ExperimentArgs::new(root.path())).unwrap();
    let log_path = context.log_path().unwrap();

    let mut console = Vec::new();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let _: Result<(), Error> = context.run_with(&mut console, |experiment| {
            writeln!(experiment, "before crash")?;
            panic!("experiment crashed");
        });
    }));

    assert!(outcome.is_err());
    let console = String::from_utf8(console).unwrap();
    assert!(console.contains("before crash\n"));
    assert!(console.ends_with(&format!("{EXIT_BANNER}\n")));
    assert_eq!(fs::read_to_string(log_path).unwrap(), "before crash\n");
}

#[test]
fn test_drop_without_exit_releases_console() {
    let root = tempfile::tempdir().unwrap();
    let context = ExperimentContext::new("dropped", &ExperimentArgs::new(root.path())).unwrap();

    let mut console = Vec::new();
    {
        let mut active = context.enter_with(&mut console).unwrap();
        writeln!(active, "scoped").unwrap();
    }

    let console = String::from_utf8(console).unwrap();
    assert_eq!(console, format!("{ENTER_BANNER}\nscoped\n{EXIT_BANNER}\n"));
}

// =============================================================================
// Figures
// =============================================================================

#[test]
fn test_save_fig_default_extension() {
    let root = tempfile::tempdir().unwrap();
    let context = ExperimentContext::new("plots", &ExperimentArgs::new(root.path())).unwrap();

    let mut console = Vec::new();
    let active = context.enter_with(&mut console).unwrap();
    let mut figure = CaptionFigure::new("accuracy");

    let path = active.save_fig(&mut figure, "My Figure").unwrap();

    assert_eq!(path, active.output_path().join("My_Figure.pdf"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "accuracy");
    assert_eq!(figure.tight_layouts, 1);
    active.exit().unwrap();
}

#[test]
fn test_save_fig_overwrites_same_name() {
    let root = tempfile::tempdir().unwrap();
    let context = ExperimentContext::new("plots", &ExperimentArgs::new(root.path())).unwrap();

    let mut console = Vec::new();
    let active = context.enter_with(&mut console).unwrap();

    active.save_fig(&mut CaptionFigure::new("first"), "loss curve").unwrap();
    let path = active.save_fig(&mut CaptionFigure::new("second"), "loss curve").unwrap();

    assert_eq!(fs::read_to_string(path).unwrap(), "second");
    let files = entries(active.output_path());
    assert_eq!(files, vec!["loss_curve.pdf".to_string(), LOG_FILE_NAME.to_string()]);
    active.exit().unwrap();
}

#[test]
fn test_save_fig_as_custom_extension() {
    let root = tempfile::tempdir().unwrap();
    let context = ExperimentContext::builder("png")
        .experiment_dir(root.path())
        .capture_output(false)
        .build()
        .unwrap();

    let mut console = Vec::new();
    let active = context.enter_with(&mut console).unwrap();
    let mut figure: Box<dyn Figure> = Box::new(CaptionFigure::new("pixels"));
    let path = active.save_fig_as(&mut figure, "sample grid", ".png").unwrap();

    assert_eq!(path.file_name().unwrap(), "sample_grid.png");
    active.exit().unwrap();
}

// =============================================================================
// Manifest
// =============================================================================

#[test]
fn test_record_manifest_round_trip() {
    let root = tempfile::tempdir().unwrap();
    let context = ExperimentContext::new("tracked", &ExperimentArgs::new(root.path())).unwrap();

    let mut console = Vec::new();
    let active = context.enter_with(&mut console).unwrap();
    let config = serde_json::json!({"epochs": 3, "seed": 7});
    active.record_manifest(Some(config.clone())).unwrap();

    let manifest = RunManifest::read_from_dir(active.output_path()).unwrap();
    assert_eq!(manifest.name(), "tracked");
    assert_eq!(manifest.output_path(), active.output_path());
    assert_eq!(manifest.config(), Some(&config));
    active.exit().unwrap();
}
