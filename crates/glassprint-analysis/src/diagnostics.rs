//! Analysis diagnostics: timing, counts, and other metrics for each stage.
//!
//! These diagnostics are permanent instrumentation for tuning and for
//! spotting slow frames. [`analyze_with_diagnostics`] collects them
//! alongside the analysis result.
//!
//! Time is read through the [`Clock`] trait so the library never touches
//! a platform clock on its own. [`SystemClock`] is backed by the
//! `web-time` crate, which uses `performance.now()` on WASM and
//! `std::time::Instant` on native.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info_span;

use crate::pipeline::{Analysis, PipelineStage};
use crate::types::{AnalysisConfig, AnalysisError, AnalysisResult, ColorImage};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// A source of monotonic time.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// [`Clock`] backed by [`web_time::Instant`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Instant = web_time::Instant;

    fn now(&self) -> web_time::Instant {
        web_time::Instant::now()
    }

    fn elapsed(&self, since: &web_time::Instant) -> Duration {
        since.elapsed()
    }
}

/// Diagnostics collected from a single analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDiagnostics {
    /// Stage 0: input, configuration, and working-set checks.
    pub validate: StageDiagnostics,
    /// Stage 1: luminance conversion.
    pub grayscale: StageDiagnostics,
    /// Stage 2: Gaussian smoothing.
    pub blur: StageDiagnostics,
    /// Stage 3: Canny edge detection.
    pub edge_detection: StageDiagnostics,
    /// Stage 4: contour tracing and shape counting.
    pub contour_tracing: StageDiagnostics,
    /// Stage 5: metric aggregation.
    pub metrics: StageDiagnostics,
    /// Total wall-clock duration of the entire analysis (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, sizes, etc.).
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Input validation metrics.
    Validate {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
        /// Bytes reserved for intermediate buffers.
        working_set_bytes: u64,
    },
    /// Grayscale conversion metrics.
    Grayscale {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
    /// Gaussian blur metrics.
    Blur {
        /// Kernel standard deviation.
        sigma: f32,
        /// Kernel width and height in pixels.
        kernel_size: u32,
    },
    /// Canny edge detection metrics.
    EdgeDetection {
        /// Low hysteresis threshold.
        low_threshold: f32,
        /// High hysteresis threshold.
        high_threshold: f32,
        /// Number of edge pixels in the output.
        edge_pixel_count: u64,
        /// Total pixel count for computing edge density.
        total_pixel_count: u64,
    },
    /// Contour tracing metrics.
    ContourTracing {
        /// Number of borders traced.
        contour_count: usize,
        /// Borders enclosing more than the minimum area.
        significant_count: usize,
        /// Significant shapes after merging the two borders of a stroke.
        shape_count: u32,
        /// Total number of points across all contours.
        total_point_count: usize,
        /// Maximum points in any single contour.
        max_contour_points: usize,
    },
    /// Metric aggregation results.
    Metrics {
        /// Edge density percentage.
        edge_strength: u8,
        /// Symmetry percentage.
        symmetry_score: u8,
        /// Complexity classification.
        complexity_level: crate::types::ComplexityLevel,
    },
}

impl AnalysisDiagnostics {
    /// Stages in execution order with their display names.
    #[must_use]
    pub fn stages(&self) -> [(&'static str, &StageDiagnostics); 6] {
        [
            ("Validate", &self.validate),
            ("Grayscale", &self.grayscale),
            ("Blur", &self.blur),
            ("Edge Detection", &self.edge_detection),
            ("Contour Tracing", &self.contour_tracing),
            ("Metrics", &self.metrics),
        ]
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Analysis Diagnostics Report\n{}", "=".repeat(60)));
        if let StageMetrics::Validate {
            width,
            height,
            pixel_count,
            ..
        } = self.validate.metrics
        {
            lines.push(format!("Image: {width}x{height} ({pixel_count} pixels)"));
        }
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Validate {
            working_set_bytes, ..
        } => format!("working set {working_set_bytes} bytes"),
        StageMetrics::Grayscale { width, height } => format!("{width}x{height}"),
        StageMetrics::Blur { sigma, kernel_size } => {
            format!("sigma={sigma:.2} kernel={kernel_size}x{kernel_size}")
        }
        StageMetrics::EdgeDetection {
            low_threshold,
            high_threshold,
            edge_pixel_count,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixel_count > 0 {
                *edge_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!(
                "low={low_threshold:.1} high={high_threshold:.1} edges={edge_pixel_count} ({density:.1}%)",
            )
        }
        StageMetrics::ContourTracing {
            contour_count,
            significant_count,
            shape_count,
            total_point_count,
            max_contour_points,
        } => format!(
            "{contour_count} contours ({significant_count} significant, {shape_count} shapes), {total_point_count} pts (max={max_contour_points})",
        ),
        StageMetrics::Metrics {
            edge_strength,
            symmetry_score,
            complexity_level,
        } => format!("edges={edge_strength}% symmetry={symmetry_score}% {complexity_level}"),
    }
}

/// Time one stage transition and capture the resulting stage's metrics.
fn timed<C: Clock, S: PipelineStage>(clock: &C, advance: impl FnOnce() -> S) -> (S, StageDiagnostics) {
    let start = clock.now();
    let stage = advance();
    let duration = clock.elapsed(&start);
    let metrics = stage.metrics();
    (stage, StageDiagnostics { duration, metrics })
}

/// Run the full analysis, timing every stage with `clock`.
///
/// Produces exactly the same [`AnalysisResult`] as
/// [`analyze_with_config`](crate::analyze_with_config).
///
/// # Errors
///
/// Same conditions as [`Pending::validate`](crate::pipeline::Pending::validate).
pub fn analyze_with_diagnostics<C: Clock>(
    image: &ColorImage,
    config: &AnalysisConfig,
    clock: &C,
) -> Result<(AnalysisResult, AnalysisDiagnostics), AnalysisError> {
    let _span = info_span!("analyze").entered();
    let total_start = clock.now();

    let start = clock.now();
    let validated = Analysis::new(image, config.clone()).validate()?;
    let validate = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: validated.metrics(),
    };

    let (gray, grayscale) = timed(clock, || validated.grayscale());
    let (smoothed, blur) = timed(clock, || gray.smooth());
    let (edges, edge_detection) = timed(clock, || smoothed.detect_edges());
    let (traced, contour_tracing) = timed(clock, || edges.trace_contours());

    let start = clock.now();
    let staged = traced.measure();
    let metrics = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: StageMetrics::Metrics {
            edge_strength: staged.result.edge_strength,
            symmetry_score: staged.result.symmetry_score,
            complexity_level: staged.result.complexity_level,
        },
    };

    let diagnostics = AnalysisDiagnostics {
        validate,
        grayscale,
        blur,
        edge_detection,
        contour_tracing,
        metrics,
        total_duration: clock.elapsed(&total_start),
    };
    Ok((staged.result, diagnostics))
}
