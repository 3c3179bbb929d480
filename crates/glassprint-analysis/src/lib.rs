//! glassprint-analysis: Pure image analysis pipeline (sans-IO).
//!
//! Summarizes the visual pattern of a photographed glass surface:
//! grayscale -> blur -> edge detection -> contour tracing -> metrics.
//!
//! The result is a small [`AnalysisResult`]: how many distinct shapes
//! the frame contains, how dense its edges are, how symmetric it looks
//! left-to-right, and a coarse complexity label.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory
//! images and returns structured data. Every call owns its intermediate
//! buffers and shares no state with other calls, so frames can be
//! analyzed concurrently from any number of threads.
//!
//! Stages log through `tracing`; install a subscriber to see them.

pub mod blur;
pub mod canny;
pub mod contour;
pub mod diagnostics;
pub mod edge;
pub mod grayscale;
pub mod metrics;
pub mod overlay;
pub mod pipeline;
pub mod types;

pub use diagnostics::{AnalysisDiagnostics, Clock, SystemClock, analyze_with_diagnostics};
pub use pipeline::Analysis;
pub use types::{
    AnalysisConfig, AnalysisError, AnalysisResult, BorderKind, ColorImage, ComplexityLevel,
    Contour, Dimensions, GrayImage, Point, RgbImage, RgbaImage, StagedAnalysis,
};

/// Analyze a color image with the default [`AnalysisConfig`].
///
/// # Pipeline steps
///
/// 1. Validate layout, dimensions, and working set
/// 2. BT.601 luminance conversion
/// 3. 7x7 Gaussian smoothing (sigma 1.5)
/// 4. Canny edge detection (thresholds 40 / 120)
/// 5. Contour tracing and significant-shape counting
/// 6. Edge density, symmetry, and complexity metrics
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] if the image has zero width
/// or height or is not 8-bit RGB/RGBA. Returns
/// [`AnalysisError::ResourceExhaustion`] if the intermediate buffers
/// cannot be allocated.
pub fn analyze(image: &ColorImage) -> Result<AnalysisResult, AnalysisError> {
    analyze_with_config(image, &AnalysisConfig::default())
}

/// Analyze a color image under explicit operational limits.
///
/// # Errors
///
/// As [`analyze`], plus [`AnalysisError::InvalidConfig`] for an invalid
/// `config`.
pub fn analyze_with_config(
    image: &ColorImage,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    analyze_staged(image, config).map(|staged| staged.result)
}

/// Run the full pipeline and return every intermediate alongside the
/// result.
///
/// # Errors
///
/// Same conditions as [`analyze_with_config`].
pub fn analyze_staged(
    image: &ColorImage,
    config: &AnalysisConfig,
) -> Result<StagedAnalysis, AnalysisError> {
    let _span = tracing::info_span!("analyze").entered();
    Ok(Analysis::new(image, config.clone())
        .validate()?
        .grayscale()
        .smooth()
        .detect_edges()
        .trace_contours()
        .measure())
}

/// Return an RGB copy of `image` with every significant contour
/// stroked in orange (255, 165, 0) at a width of 3 pixels.
///
/// # Errors
///
/// Same conditions as [`analyze`].
pub fn render_overlay(image: &ColorImage) -> Result<RgbImage, AnalysisError> {
    overlay::render_overlay_with_config(image, &AnalysisConfig::default())
}

/// Immutable analysis service holding validated operational limits.
///
/// Construct once and share freely: every method takes `&self` and
/// holds no per-call state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Analyzer {
    /// Create an analyzer after checking `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidConfig`] if `config` is invalid.
    pub fn new(config: AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The limits this analyzer enforces.
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// See [`analyze`].
    ///
    /// # Errors
    ///
    /// Same conditions as [`analyze_with_config`].
    pub fn analyze(&self, image: &ColorImage) -> Result<AnalysisResult, AnalysisError> {
        analyze_with_config(image, &self.config)
    }

    /// See [`analyze_staged`].
    ///
    /// # Errors
    ///
    /// Same conditions as [`analyze_with_config`].
    pub fn analyze_staged(&self, image: &ColorImage) -> Result<StagedAnalysis, AnalysisError> {
        analyze_staged(image, &self.config)
    }

    /// See [`render_overlay`].
    ///
    /// # Errors
    ///
    /// Same conditions as [`analyze_with_config`].
    pub fn render_overlay(&self, image: &ColorImage) -> Result<RgbImage, AnalysisError> {
        overlay::render_overlay_with_config(image, &self.config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn half_and_half(width: u32, height: u32) -> ColorImage {
        ColorImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, _y| {
            if x < width / 2 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        }))
    }

    #[test]
    fn analyze_uniform_image_is_blank() {
        let img = ColorImage::ImageRgb8(RgbImage::from_pixel(25, 25, image::Rgb([128, 128, 128])));
        let result = analyze(&img).unwrap();
        assert_eq!(
            result,
            AnalysisResult {
                contour_count: 0,
                edge_strength: 0,
                symmetry_score: 100,
                complexity_level: ComplexityLevel::Simple,
            }
        );
    }

    #[test]
    fn analyze_single_pixel_is_accepted() {
        let img = ColorImage::ImageRgb8(RgbImage::from_pixel(1, 1, image::Rgb([200, 10, 10])));
        let result = analyze(&img).unwrap();
        assert_eq!(result.contour_count, 0);
        assert_eq!(result.edge_strength, 0);
        assert_eq!(result.symmetry_score, 0);
        assert_eq!(result.complexity_level, ComplexityLevel::Simple);
    }

    #[test]
    fn analyze_step_image_has_edges_but_no_shapes() {
        let result = analyze(&half_and_half(40, 40)).unwrap();
        assert!(result.edge_strength > 0);
        assert_eq!(result.contour_count, 0);
        assert_eq!(result.symmetry_score, 0);
    }

    #[test]
    fn analyze_staged_matches_analyze() {
        let img = half_and_half(30, 20);
        let staged = analyze_staged(&img, &AnalysisConfig::default()).unwrap();
        assert_eq!(staged.result, analyze(&img).unwrap());
        assert_eq!(staged.edges.dimensions(), (30, 20));
        assert_eq!(staged.grayscale.get_pixel(0, 0).0[0], 0);
    }

    #[test]
    fn analyze_rejects_empty_image() {
        let img = ColorImage::ImageRgba8(RgbaImage::new(0, 10));
        assert!(matches!(analyze(&img), Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn analyzer_rejects_invalid_config() {
        let result = Analyzer::new(AnalysisConfig { max_pixels: 0 });
        assert!(matches!(result, Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn analyzer_enforces_its_pixel_limit() {
        let analyzer = Analyzer::new(AnalysisConfig { max_pixels: 100 }).unwrap();
        assert_eq!(analyzer.config().max_pixels, 100);
        assert!(analyzer.analyze(&half_and_half(10, 10)).is_ok());
        assert!(matches!(
            analyzer.analyze(&half_and_half(11, 10)),
            Err(AnalysisError::ResourceExhaustion(_))
        ));
        assert!(matches!(
            analyzer.render_overlay(&half_and_half(11, 10)),
            Err(AnalysisError::ResourceExhaustion(_))
        ));
    }

    #[test]
    fn analyzer_methods_agree_with_free_functions() {
        let analyzer = Analyzer::default();
        let img = half_and_half(24, 24);
        assert_eq!(analyzer.analyze(&img).unwrap(), analyze(&img).unwrap());
        assert_eq!(
            analyzer.analyze_staged(&img).unwrap().result,
            analyze(&img).unwrap()
        );
        assert_eq!(
            analyzer.render_overlay(&img).unwrap(),
            render_overlay(&img).unwrap()
        );
    }

    #[test]
    fn public_types_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Analyzer>();
        assert_send_sync::<AnalysisResult>();
        assert_send_sync::<AnalysisError>();
        assert_send_sync::<StagedAnalysis>();
        assert_send_sync::<AnalysisDiagnostics>();
    }
}
