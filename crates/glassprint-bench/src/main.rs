//! glassprint-bench: CLI tool for running the glass-pattern analysis on
//! image files and collecting diagnostics.
//!
//! Decodes an image file, runs the analysis, and prints the resulting
//! metrics with detailed per-stage diagnostics. Useful for:
//!
//! - Checking what a captured frame reports before it reaches the app
//! - Measuring per-stage durations to identify bottlenecks
//! - Inspecting which contours count as shapes (`--overlay`)
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin glassprint-bench -- [OPTIONS] <IMAGE_PATH>
//! ```
//!
//! Set `RUST_LOG=debug` to see per-stage events from the analysis.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use glassprint_analysis::{
    AnalysisConfig, AnalysisDiagnostics, AnalysisResult, Analyzer, SystemClock,
};
use serde::Serialize;

/// Glass-pattern analysis and diagnostics for glassprint.
///
/// Runs the analysis pipeline on a given image and prints the resulting
/// metrics with per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "glassprint-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Largest accepted frame size in pixels (`width * height`).
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_MAX_PIXELS, value_parser = clap::builder::RangedU64ValueParser::<u64>::new().range(1..))]
    max_pixels: u64,

    /// Write the contour overlay as an image to this path.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output result and diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Full analysis config as a JSON string.
    ///
    /// When provided, `--max-pixels` is ignored. The JSON must be a valid
    /// `AnalysisConfig` serialization; missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

/// One run's output in `--json` mode.
#[derive(Serialize)]
struct RunReport<'a> {
    result: &'a AnalysisResult,
    diagnostics: &'a AnalysisDiagnostics,
}

/// Build an [`AnalysisConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and
/// `--max-pixels` is ignored.
fn config_from_cli(cli: &Cli) -> Result<AnalysisConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(AnalysisConfig {
        max_pixels: cli.max_pixels,
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let analyzer = match config_from_cli(&cli)
        .and_then(|config| Analyzer::new(config).map_err(|e| e.to_string()))
    {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let image = match glassprint_analysis::grayscale::decode(&image_bytes) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error decoding {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        path = %cli.image_path.display(),
        bytes = image_bytes.len(),
        width = image.width(),
        height = image.height(),
        runs = cli.runs,
        max_pixels = analyzer.config().max_pixels,
        "analyzing image"
    );

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match glassprint_analysis::analyze_with_diagnostics(&image, analyzer.config(), &SystemClock)
        {
            Ok((result, diagnostics)) => {
                if cli.json {
                    let report = RunReport {
                        result: &result,
                        diagnostics: &diagnostics,
                    };
                    match serde_json::to_string_pretty(&report) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                    println!();
                    print_result(&result);
                }
                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Analysis error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if let Some(ref overlay_path) = cli.overlay {
        let written = analyzer
            .render_overlay(&image)
            .map_err(|e| e.to_string())
            .and_then(|overlay| overlay.save(overlay_path).map_err(|e| e.to_string()));
        match written {
            Ok(()) => eprintln!("Overlay written to {}", overlay_path.display()),
            Err(e) => {
                eprintln!("Error writing overlay to {}: {e}", overlay_path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Print the metrics record.
fn print_result(result: &AnalysisResult) {
    println!("Contours:   {}", result.contour_count);
    println!("Edges:      {}%", result.edge_strength);
    println!("Symmetry:   {}%", result.symmetry_score);
    println!("Complexity: {}", result.complexity_level);
}

/// Mean of a non-empty slice of durations in milliseconds.
#[allow(clippy::cast_precision_loss)]
fn mean_ms(durations: &[Duration]) -> f64 {
    let total: f64 = durations.iter().map(|d| d.as_secs_f64() * 1000.0).sum();
    total / durations.len().max(1) as f64
}

/// Print aggregated statistics across multiple runs.
fn print_multi_run_summary(all_diagnostics: &[AnalysisDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let totals: Vec<Duration> = all_diagnostics.iter().map(|d| d.total_duration).collect();
    let min = totals.iter().min().copied().unwrap_or_default();
    let max = totals.iter().max().copied().unwrap_or_default();
    println!(
        "Total duration: min={:.3}ms  mean={:.3}ms  max={:.3}ms",
        min.as_secs_f64() * 1000.0,
        mean_ms(&totals),
        max.as_secs_f64() * 1000.0,
    );

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_names = all_diagnostics[0].stages().map(|(name, _)| name);
    for (i, name) in stage_names.into_iter().enumerate() {
        let durations: Vec<Duration> = all_diagnostics
            .iter()
            .map(|d| d.stages()[i].1.duration)
            .collect();
        println!("{name:<24} {:>10.3}ms", mean_ms(&durations));
    }
}
