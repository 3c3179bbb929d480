//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! [`crate::analyze`] runs every stage in one call. [`Analysis`] lets the
//! caller drive execution one step at a time:
//!
//! ```rust
//! # use glassprint_analysis::{Analysis, AnalysisConfig, AnalysisError, ColorImage};
//! # fn run(image: &ColorImage) -> Result<(), AnalysisError> {
//! let staged = Analysis::new(image, AnalysisConfig::default())
//!     .validate()?
//!     .grayscale()
//!     .smooth()
//!     .detect_edges()
//!     .trace_contours()
//!     .measure();
//!
//! println!("{} shapes", staged.result.contour_count);
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state,
//! carrying all previously computed intermediates. Only
//! [`validate`](Pending::validate) can fail: every later stage works on
//! buffers whose size and layout are already known to be acceptable.
//!
//! Every stage runs inside a `tracing` span named after it and reports
//! its outcome as a `debug` event.
//!
//! # Memory
//!
//! Every stage from [`Grayscaled`] onward retains the raster stack
//! (luminance, smoothed, and edge images) alongside the traced contours.
//! For a 1000x1000 frame this is roughly 3 MB pinned until
//! [`ContoursTraced::measure`] hands it over in a [`StagedAnalysis`].
//! Callers that only need the metrics should prefer [`crate::analyze`],
//! which drops the intermediates before returning.

use tracing::{debug, info_span};

use crate::diagnostics::StageMetrics;
use crate::grayscale::ColorPixels;
use crate::types::{
    AnalysisConfig, AnalysisError, ColorImage, Contour, Dimensions, GrayImage, StagedAnalysis,
};

/// Bytes per pixel of the fixed-size raster buffers the pipeline holds:
/// three 8-bit rasters (luminance, smoothed, edges), two `i16` Sobel
/// gradients, and two `f32` magnitude buffers.
///
/// The hysteresis stack and the traced contour points grow with image
/// content and are not included. The reservation made during validation
/// is released again, so this is an admission check rather than a
/// guarantee that later allocations succeed.
pub const WORKING_BYTES_PER_PIXEL: u64 = 3 + 2 * 2 + 2 * 4;

/// Reserve, then release, the working set for a frame of `dimensions`.
///
/// Returns the reserved size in bytes.
fn check_working_set(dimensions: Dimensions, config: &AnalysisConfig) -> Result<u64, AnalysisError> {
    let pixel_count = dimensions.pixel_count();
    if pixel_count > config.max_pixels {
        return Err(AnalysisError::ResourceExhaustion(format!(
            "{}x{} is {pixel_count} pixels, above the limit of {}",
            dimensions.width, dimensions.height, config.max_pixels,
        )));
    }

    let overflow = || {
        AnalysisError::ResourceExhaustion(format!(
            "working set for {}x{} does not fit in memory",
            dimensions.width, dimensions.height,
        ))
    };
    let bytes = pixel_count
        .checked_mul(WORKING_BYTES_PER_PIXEL)
        .ok_or_else(overflow)?;
    let len = usize::try_from(bytes).map_err(|_| overflow())?;

    let mut probe: Vec<u8> = Vec::new();
    probe.try_reserve_exact(len).map_err(|e| {
        AnalysisError::ResourceExhaustion(format!("cannot reserve {bytes} bytes: {e}"))
    })?;
    Ok(bytes)
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// Call [`validate`](Self::validate) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .validate() to continue"]
#[derive(Debug)]
pub struct Pending<'a> {
    config: AnalysisConfig,
    image: &'a ColorImage,
}

impl<'a> Pending<'a> {
    /// The image to be analyzed.
    #[must_use]
    pub const fn image(&self) -> &'a ColorImage {
        self.image
    }

    /// The operational limits this run is held to.
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Check the configuration, the image layout, and the working set,
    /// then advance to the [`Validated`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidConfig`] if the configuration is
    /// invalid, [`AnalysisError::InvalidInput`] for a zero-area image or
    /// a pixel layout other than 8-bit RGB/RGBA, and
    /// [`AnalysisError::ResourceExhaustion`] when the intermediate
    /// buffers exceed `config.max_pixels` or cannot be reserved.
    pub fn validate(self) -> Result<Validated<'a>, AnalysisError> {
        let _span = info_span!("validate").entered();
        self.config.validate()?;
        let pixels = crate::grayscale::pixels(self.image)?;
        let dimensions = pixels.dimensions();
        let working_set_bytes = check_working_set(dimensions, &self.config)?;
        debug!(
            width = dimensions.width,
            height = dimensions.height,
            working_set_bytes,
            "input accepted"
        );
        Ok(Validated {
            pixels,
            dimensions,
            working_set_bytes,
        })
    }
}

// ───────────────────────── Stage 1: Validated ────────────────────────

/// Pipeline state after the input and its resource needs were checked.
///
/// Call [`grayscale`](Self::grayscale) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .grayscale() to continue"]
#[derive(Debug)]
pub struct Validated<'a> {
    pixels: ColorPixels<'a>,
    dimensions: Dimensions,
    working_set_bytes: u64,
}

impl Validated<'_> {
    /// Image dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Bytes reserved for intermediate buffers during validation.
    #[must_use]
    pub const fn working_set_bytes(&self) -> u64 {
        self.working_set_bytes
    }

    /// Advance to the grayscale stage.
    pub fn grayscale(self) -> Grayscaled {
        let _span = info_span!("grayscale").entered();
        let gray = self.pixels.to_luminance();
        debug!(width = gray.width(), height = gray.height(), "luminance computed");
        Grayscaled {
            gray,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 2: Grayscaled ───────────────────────

/// Pipeline state after luminance conversion.
///
/// Call [`smooth`](Self::smooth) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .smooth() to continue"]
#[derive(Debug)]
pub struct Grayscaled {
    gray: GrayImage,
    dimensions: Dimensions,
}

impl Grayscaled {
    /// The luminance image.
    #[must_use]
    pub const fn gray(&self) -> &GrayImage {
        &self.gray
    }

    /// Advance to the smoothing stage.
    pub fn smooth(self) -> Smoothed {
        let _span = info_span!("blur").entered();
        let smoothed = crate::blur::smooth(&self.gray);
        debug!(sigma = crate::blur::BLUR_SIGMA, "image smoothed");
        Smoothed {
            gray: self.gray,
            smoothed,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 3: Smoothed ─────────────────────────

/// Pipeline state after Gaussian smoothing.
///
/// Call [`detect_edges`](Self::detect_edges) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .detect_edges() to continue"]
#[derive(Debug)]
pub struct Smoothed {
    gray: GrayImage,
    smoothed: GrayImage,
    dimensions: Dimensions,
}

impl Smoothed {
    /// The smoothed luminance image.
    #[must_use]
    pub const fn smoothed(&self) -> &GrayImage {
        &self.smoothed
    }

    /// Advance to the edge detection stage.
    pub fn detect_edges(self) -> EdgesDetected {
        let _span = info_span!("edge_detection").entered();
        let edges = crate::edge::detect_edges(&self.smoothed);
        let edge_pixel_count = crate::edge::count_edge_pixels(&edges);
        debug!(edge_pixel_count, "edges detected");
        EdgesDetected {
            gray: self.gray,
            smoothed: self.smoothed,
            edges,
            edge_pixel_count,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 4: EdgesDetected ────────────────────

/// Pipeline state after Canny edge detection.
///
/// Call [`trace_contours`](Self::trace_contours) to advance to the next
/// stage.
#[must_use = "pipeline stages are consumed by advancing; call .trace_contours() to continue"]
#[derive(Debug)]
pub struct EdgesDetected {
    gray: GrayImage,
    smoothed: GrayImage,
    edges: GrayImage,
    edge_pixel_count: u64,
    dimensions: Dimensions,
}

impl EdgesDetected {
    /// The binary edge map.
    #[must_use]
    pub const fn edges(&self) -> &GrayImage {
        &self.edges
    }

    /// Number of set pixels in the edge map.
    #[must_use]
    pub const fn edge_pixel_count(&self) -> u64 {
        self.edge_pixel_count
    }

    /// Advance to the contour tracing stage.
    ///
    /// An edge map with no edges yields an empty contour list; that is a
    /// valid outcome, not an error.
    pub fn trace_contours(self) -> ContoursTraced {
        let _span = info_span!("contour_tracing").entered();
        let contours = crate::contour::trace(&self.edges);
        let shape_count = crate::contour::count_shapes(&contours);
        debug!(
            traced = contours.len(),
            significant = crate::contour::significant(&contours).count(),
            shape_count,
            "contours traced"
        );
        ContoursTraced {
            gray: self.gray,
            smoothed: self.smoothed,
            edges: self.edges,
            edge_pixel_count: self.edge_pixel_count,
            contours,
            shape_count,
            dimensions: self.dimensions,
        }
    }
}

// ───────────────────────── Stage 5: ContoursTraced ───────────────────

/// Pipeline state after contour tracing.
///
/// Call [`measure`](Self::measure) to compute the metrics and finish.
///
/// See the [module-level memory notes](self#memory) for the cost of
/// retaining all prior raster intermediates.
#[must_use = "call .measure() to finish the analysis"]
#[derive(Debug)]
pub struct ContoursTraced {
    gray: GrayImage,
    smoothed: GrayImage,
    edges: GrayImage,
    edge_pixel_count: u64,
    contours: Vec<Contour>,
    shape_count: u32,
    dimensions: Dimensions,
}

impl ContoursTraced {
    /// Every traced contour, hierarchy included.
    #[must_use]
    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// Number of significant shapes.
    #[must_use]
    pub const fn shape_count(&self) -> u32 {
        self.shape_count
    }

    /// Compute the metrics and return every intermediate with the result.
    pub fn measure(self) -> StagedAnalysis {
        let _span = info_span!("metrics").entered();
        let result = crate::metrics::summarize(&self.edges, &self.smoothed, self.shape_count);
        debug!(
            contour_count = result.contour_count,
            edge_strength = result.edge_strength,
            symmetry_score = result.symmetry_score,
            complexity_level = %result.complexity_level,
            "metrics computed"
        );
        StagedAnalysis {
            grayscale: self.gray,
            smoothed: self.smoothed,
            edges: self.edges,
            contours: self.contours,
            result,
            dimensions: self.dimensions,
        }
    }
}

// ─────────────────────────── PipelineStage ───────────────────────────

/// Total number of processing stages (excluding [`Pending`]).
pub const STAGE_COUNT: usize = 5;

/// Implemented by every stage that has performed work, giving uniform
/// access to its name, position, and diagnostics.
pub trait PipelineStage: Sized {
    /// Short name of this stage, matching its tracing span.
    const NAME: &'static str;

    /// Zero-based position of this stage (`0` for [`Validated`]).
    const INDEX: usize;

    /// Counts and sizes describing the work done to reach this state.
    fn metrics(&self) -> StageMetrics;

    /// Run every remaining stage and return the final [`StagedAnalysis`].
    fn complete(self) -> StagedAnalysis;
}

impl PipelineStage for Validated<'_> {
    const NAME: &'static str = "validate";
    const INDEX: usize = 0;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Validate {
            width: self.dimensions.width,
            height: self.dimensions.height,
            pixel_count: self.dimensions.pixel_count(),
            working_set_bytes: self.working_set_bytes,
        }
    }

    fn complete(self) -> StagedAnalysis {
        self.grayscale().complete()
    }
}

impl PipelineStage for Grayscaled {
    const NAME: &'static str = "grayscale";
    const INDEX: usize = 1;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Grayscale {
            width: self.gray.width(),
            height: self.gray.height(),
        }
    }

    fn complete(self) -> StagedAnalysis {
        self.smooth().complete()
    }
}

impl PipelineStage for Smoothed {
    const NAME: &'static str = "blur";
    const INDEX: usize = 2;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Blur {
            sigma: crate::blur::BLUR_SIGMA,
            kernel_size: crate::blur::BLUR_KERNEL_SIZE,
        }
    }

    fn complete(self) -> StagedAnalysis {
        self.detect_edges().complete()
    }
}

impl PipelineStage for EdgesDetected {
    const NAME: &'static str = "edge_detection";
    const INDEX: usize = 3;

    fn metrics(&self) -> StageMetrics {
        StageMetrics::EdgeDetection {
            low_threshold: crate::edge::CANNY_LOW,
            high_threshold: crate::edge::CANNY_HIGH,
            edge_pixel_count: self.edge_pixel_count,
            total_pixel_count: self.dimensions.pixel_count(),
        }
    }

    fn complete(self) -> StagedAnalysis {
        self.trace_contours().complete()
    }
}

impl PipelineStage for ContoursTraced {
    const NAME: &'static str = "contour_tracing";
    const INDEX: usize = 4;

    fn metrics(&self) -> StageMetrics {
        let point_counts = || self.contours.iter().map(|c| c.points.len());
        StageMetrics::ContourTracing {
            contour_count: self.contours.len(),
            significant_count: crate::contour::significant(&self.contours).count(),
            shape_count: self.shape_count,
            total_point_count: point_counts().sum(),
            max_contour_points: point_counts().max().unwrap_or(0),
        }
    }

    fn complete(self) -> StagedAnalysis {
        self.measure()
    }
}

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental analysis pipeline.
///
/// Created via [`Analysis::new`], which stores a borrow of the image and
/// the config without doing any processing. Each stage method consumes
/// the current state and returns the next, making it a compile-time
/// error to skip stages or call them out of order.
pub struct Analysis;

impl Analysis {
    /// Create a new pipeline for `image` under `config`.
    ///
    /// No processing is performed. Call
    /// [`.validate()`](Pending::validate) to begin.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(image: &ColorImage, config: AnalysisConfig) -> Pending<'_> {
        Pending { config, image }
    }
}
