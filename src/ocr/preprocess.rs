//! Image variants fed to OCR.
//!
//! Each strategy produces one binarized grayscale variant of the input
//! photograph. A strategy that cannot be produced (no plate-shaped region,
//! an upscale that would overflow) is skipped; `original` is always produced
//! for a non-empty image.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::contrast::{equalize_histogram, otsu_level};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::{gaussian_blur_f32, median_filter};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::hough::{detect_lines, LineDetectionOptions};
use imageproc::morphology::close;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PlateError;

/// Upscaled variants larger than this on either side are skipped.
const MAX_ENLARGED_DIM: u32 = 10_000;

/// Skew estimation: Canny thresholds, Hough votes, lines sampled.
const SKEW_CANNY_LOW: f32 = 50.0;
const SKEW_CANNY_HIGH: f32 = 150.0;
const SKEW_VOTE_THRESHOLD: u32 = 100;
const SKEW_SUPPRESSION_RADIUS: u32 = 8;
const SKEW_MAX_LINES: usize = 10;
/// Skews at or below this many degrees are left alone.
const SKEW_MIN_DEGREES: f32 = 1.0;

/// Gaussian-weighted local mean for an 11x11 neighbourhood, minus a fixed offset.
const ADAPTIVE_SIGMA: f32 = 2.0;
const ADAPTIVE_OFFSET: i16 = 2;

/// Plate-region detection thresholds.
const CANNY_LOW: f32 = 30.0;
const CANNY_HIGH: f32 = 200.0;
const MIN_CONTOUR_AREA: f64 = 1000.0;
const POLY_EPSILON_FACTOR: f64 = 0.018;
const MIN_PLATE_WIDTH: u32 = 100;
const MIN_PLATE_HEIGHT: u32 = 30;
const MIN_ASPECT: f64 = 2.0;
const MAX_ASPECT: f64 = 5.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Grayscale → binarize → denoise
    Original,
    /// Cubic upscale, then the original processing
    Enlarged,
    /// Auto-detected plate region crop, then the original processing
    Region,
    /// Blur → histogram equalization → binarize → close
    Enhanced,
}

impl StrategyKind {
    /// Enumeration order used for candidate merging and tie-breaks.
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Original,
        StrategyKind::Enlarged,
        StrategyKind::Region,
        StrategyKind::Enhanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Original => "original",
            StrategyKind::Enlarged => "enlarged",
            StrategyKind::Region => "region",
            StrategyKind::Enhanced => "enhanced",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One preprocessed image, ready for OCR.
#[derive(Debug, Clone)]
pub struct ImageVariant {
    pub kind: StrategyKind,
    pub image: GrayImage,
}

/// Tunables for the strategy stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategySettings {
    /// Strategies to run, in enumeration order
    pub enabled: Vec<StrategyKind>,
    /// Scale factor for the `enlarged` strategy
    pub enlarge_factor: f32,
    /// Pixels added around a detected plate region
    pub region_margin: u32,
    /// Crops at or below this size are discarded
    pub min_crop_width: u32,
    pub min_crop_height: u32,
    /// Median filter radius used for denoising (2 = 5x5 window)
    pub median_radius: u32,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            enabled: StrategyKind::ALL.to_vec(),
            enlarge_factor: 2.5,
            region_margin: 20,
            min_crop_width: 50,
            min_crop_height: 20,
            median_radius: 2,
        }
    }
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlateRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Binarizes a grayscale image at its Otsu level.
///
/// Pixels brighter than the level become white, the rest black.
pub fn binarize_otsu(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    let (width, height) = gray.dimensions();
    let mut output = GrayImage::new(width, height);

    for (x, y, pixel) in gray.enumerate_pixels() {
        let value = if pixel[0] > level { 255u8 } else { 0u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// Original processing: binarize, then median-filter the speckle away.
pub fn binarize_and_denoise(gray: &GrayImage, median_radius: u32) -> GrayImage {
    let binary = binarize_otsu(gray);
    median_filter(&binary, median_radius, median_radius)
}

/// Binarizes against a Gaussian-weighted local mean.
///
/// A pixel is white when it is brighter than its neighbourhood mean minus
/// a small offset, so uneven lighting does not swamp half the image.
pub fn binarize_adaptive(gray: &GrayImage) -> GrayImage {
    let local_mean = gaussian_blur_f32(gray, ADAPTIVE_SIGMA);
    let (width, height) = gray.dimensions();
    let mut output = GrayImage::new(width, height);

    for (x, y, pixel) in gray.enumerate_pixels() {
        let threshold = local_mean.get_pixel(x, y)[0] as i16 - ADAPTIVE_OFFSET;
        let value = if pixel[0] as i16 > threshold { 255u8 } else { 0u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// Median tilt in degrees of the dominant near-horizontal lines.
///
/// Positive when lines fall from left to right. `None` when no line
/// collects enough Hough votes.
pub fn estimate_skew(gray: &GrayImage) -> Option<f32> {
    let edges = canny(gray, SKEW_CANNY_LOW, SKEW_CANNY_HIGH);
    let options = LineDetectionOptions {
        vote_threshold: SKEW_VOTE_THRESHOLD,
        suppression_radius: SKEW_SUPPRESSION_RADIUS,
    };

    let mut angles: Vec<f32> = detect_lines(&edges, options)
        .into_iter()
        .filter(|line| (45..=135).contains(&line.angle_in_degrees))
        .take(SKEW_MAX_LINES)
        .map(|line| line.angle_in_degrees as f32 - 90.0)
        .collect();
    if angles.is_empty() {
        return None;
    }

    angles.sort_by(f32::total_cmp);
    let mid = angles.len() / 2;
    if angles.len() % 2 == 0 {
        Some((angles[mid - 1] + angles[mid]) / 2.0)
    } else {
        Some(angles[mid])
    }
}

/// Rotates the image so its dominant lines become horizontal.
///
/// Uncovered corners are filled with the mean intensity.
pub fn deskew(gray: &GrayImage) -> GrayImage {
    let Some(angle) = estimate_skew(gray) else {
        return gray.clone();
    };
    if angle.abs() <= SKEW_MIN_DEGREES {
        return gray.clone();
    }

    let pixels = gray.as_raw();
    let mean = pixels.iter().map(|&p| p as u64).sum::<u64>() / pixels.len().max(1) as u64;
    rotate_about_center(
        gray,
        -angle.to_radians(),
        Interpolation::Bicubic,
        Luma([mean as u8]),
    )
}

/// Contrast-boosting pipeline for tilted, dim or unevenly lit photographs.
pub fn enhance(gray: &GrayImage) -> GrayImage {
    let straight = deskew(gray);
    let blurred = gaussian_blur_f32(&straight, 0.8);
    let equalized = equalize_histogram(&blurred);
    let binary = binarize_adaptive(&equalized);
    close(&binary, Norm::LInf, 1)
}

/// Cubic upscale by `factor`. `None` if the result would be empty or huge.
pub fn enlarge(image: &DynamicImage, factor: f32) -> Option<DynamicImage> {
    if !factor.is_finite() || factor <= 0.0 {
        return None;
    }
    let width = (image.width() as f32 * factor).round();
    let height = (image.height() as f32 * factor).round();
    if width < 1.0 || height < 1.0 || width > MAX_ENLARGED_DIM as f32 || height > MAX_ENLARGED_DIM as f32 {
        return None;
    }
    Some(image.resize_exact(width as u32, height as u32, FilterType::CatmullRom))
}

/// Area of a closed polygon (shoelace formula).
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area: i64 = 0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (twice_area.abs() as f64) / 2.0
}

/// Inclusive bounding box of a set of points.
fn bounding_rect(points: &[Point<i32>]) -> Option<PlateRegion> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_y = points.iter().map(|p| p.y).max()?;
    Some(PlateRegion {
        x: min_x.max(0) as u32,
        y: min_y.max(0) as u32,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
    })
}

/// Finds the largest quadrilateral with plate-like proportions.
pub fn detect_plate_region(gray: &GrayImage) -> Option<PlateRegion> {
    let smoothed = gaussian_blur_f32(gray, 1.5);
    let edges = canny(&smoothed, CANNY_LOW, CANNY_HIGH);

    let mut best: Option<(PlateRegion, f64)> = None;

    for contour in find_contours::<i32>(&edges) {
        let area = polygon_area(&contour.points);
        if area <= MIN_CONTOUR_AREA {
            continue;
        }

        let epsilon = POLY_EPSILON_FACTOR * arc_length(&contour.points, true);
        let mut approx = approximate_polygon_dp(&contour.points, epsilon, true);
        if approx.len() > 1 && approx.first() == approx.last() {
            approx.pop();
        }
        if approx.len() != 4 {
            continue;
        }

        let Some(rect) = bounding_rect(&approx) else {
            continue;
        };
        if rect.width <= MIN_PLATE_WIDTH || rect.height <= MIN_PLATE_HEIGHT {
            continue;
        }
        let aspect = rect.width as f64 / rect.height as f64;
        if !(MIN_ASPECT..=MAX_ASPECT).contains(&aspect) {
            continue;
        }

        if best.as_ref().is_none_or(|(_, best_area)| area > *best_area) {
            best = Some((rect, area));
        }
    }

    best.map(|(rect, _)| rect)
}

/// Grows `region` by `margin` on every side, clamped to the image bounds.
pub fn expand_region(region: &PlateRegion, margin: u32, width: u32, height: u32) -> PlateRegion {
    let x = region.x.saturating_sub(margin).min(width);
    let y = region.y.saturating_sub(margin).min(height);
    let w = (region.width + 2 * margin).min(width - x);
    let h = (region.height + 2 * margin).min(height - y);
    PlateRegion { x, y, width: w, height: h }
}

/// Crops a sub-region from a grayscale image.
pub fn crop_region(img: &GrayImage, region: &PlateRegion) -> GrayImage {
    image::imageops::crop_imm(img, region.x, region.y, region.width, region.height).to_image()
}

/// Produces the variant for one strategy.
pub fn preprocess(
    image: &DynamicImage,
    kind: StrategyKind,
    settings: &StrategySettings,
) -> Result<ImageVariant, PlateError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PlateError::PreprocessingUnavailable(kind));
    }

    let gray = image.to_luma8();
    let processed = match kind {
        StrategyKind::Original => binarize_and_denoise(&gray, settings.median_radius),
        StrategyKind::Enlarged => {
            let enlarged = enlarge(image, settings.enlarge_factor)
                .ok_or(PlateError::PreprocessingUnavailable(kind))?;
            binarize_and_denoise(&enlarged.to_luma8(), settings.median_radius)
        }
        StrategyKind::Region => {
            let region =
                detect_plate_region(&gray).ok_or(PlateError::PreprocessingUnavailable(kind))?;
            let (width, height) = gray.dimensions();
            let padded = expand_region(&region, settings.region_margin, width, height);
            if padded.width <= settings.min_crop_width || padded.height <= settings.min_crop_height {
                return Err(PlateError::PreprocessingUnavailable(kind));
            }
            binarize_and_denoise(&crop_region(&gray, &padded), settings.median_radius)
        }
        StrategyKind::Enhanced => enhance(&gray),
    };

    Ok(ImageVariant {
        kind,
        image: processed,
    })
}

/// Runs every enabled strategy, silently dropping the ones that fail.
pub fn generate_strategies(image: &DynamicImage, settings: &StrategySettings) -> Vec<ImageVariant> {
    let mut variants = Vec::with_capacity(settings.enabled.len());

    for kind in StrategyKind::ALL {
        if kind != StrategyKind::Original && !settings.enabled.contains(&kind) {
            continue;
        }
        match preprocess(image, kind, settings) {
            Ok(variant) => variants.push(variant),
            Err(e) => crate::log(&format!("Skipping strategy: {}", e)),
        }
    }

    variants
}
