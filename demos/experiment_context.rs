//! Experiment Context Example
//!
//! Runs a toy training loop inside an experiment context: progress goes to
//! stdout and `out.log`, and the loss curve is saved as an SVG figure.
//!
//! Run with: cargo run --example experiment_context -- --experiment_dir /tmp/experiments --epochs 5

use std::io::Write;
use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use trueno_lab::style::{current_style, PlotStyle};
use trueno_lab::{ExperimentArgs, ExperimentContext, Figure};

#[derive(Parser)]
#[command(about = "Toy training run inside an experiment context")]
struct Cli {
    #[command(flatten)]
    experiment: ExperimentArgs,

    /// Number of simulated epochs
    #[arg(long, default_value_t = 10)]
    epochs: u32,
}

/// Minimal line plot rendered as SVG.
struct LineFigure {
    points: Vec<f64>,
    style: PlotStyle,
    margin: f64,
}

impl LineFigure {
    fn new(points: Vec<f64>) -> Self {
        Self {
            points,
            style: current_style(),
            margin: 40.0,
        }
    }

    fn to_svg(&self) -> String {
        let (width, height) = (400.0, 300.0);
        let max = self.points.iter().copied().fold(f64::EPSILON, f64::max);
        let step = (width - 2.0 * self.margin) / (self.points.len().max(2) - 1) as f64;

        let mut path = String::new();
        for (i, value) in self.points.iter().enumerate() {
            let x = self.margin + step * i as f64;
            let y = height - self.margin - (value / max) * (height - 2.0 * self.margin);
            let command = if i == 0 { "M" } else { "L" };
            path.push_str(&format!("{command}{x:.1},{y:.1} "));
        }

        let grid = if self.style.has_grid() {
            r##"<g stroke="#ddd">"##.to_string()
                + &(1..5)
                    .map(|i| {
                        let y = self.margin + f64::from(i) * (height - 2.0 * self.margin) / 5.0;
                        format!(r#"<line x1="{0}" x2="{1}" y1="{y}" y2="{y}"/>"#, self.margin, width - self.margin)
                    })
                    .collect::<String>()
                + "</g>"
        } else {
            String::new()
        };

        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}">{grid}<path d="{path}" fill="none" stroke="#1f77b4"/></svg>"##
        )
    }
}

impl Figure for LineFigure {
    fn tight_layout(&mut self) {
        self.margin = 10.0;
    }

    fn save(&self, path: &Path) -> trueno_lab::Result<()> {
        std::fs::write(path, self.to_svg())?;
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let context = ExperimentContext::new("toy_training", &cli.experiment)?;

    context.run(|experiment| {
        let dir = experiment.output_path().to_path_buf();
        writeln!(experiment, "Output directory: {}", dir.display())?;

        let mut losses = Vec::new();
        for epoch in 0..cli.epochs {
            let loss = 2.5 / (f64::from(epoch) + 1.0) + 0.1;
            writeln!(experiment, "Epoch {epoch}: loss={loss:.4}")?;
            losses.push(loss);
        }

        let mut figure = LineFigure::new(losses);
        let path = experiment.save_fig_as(&mut figure, "Loss Curve", ".svg")?;
        writeln!(experiment, "Saved {}", path.display())?;

        experiment.record_manifest(Some(serde_json::json!({ "epochs": cli.epochs })))?;
        Ok::<_, anyhow::Error>(())
    })
}
