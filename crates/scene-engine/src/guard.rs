//! Keeps uploads inside the background-removal service's size contract.

use std::io::Cursor;
use std::str::FromStr;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use scene_contracts::error::{PipelineError, PipelineResult};
use serde::Serialize;

use crate::asset::ImageAsset;

pub const DEFAULT_MAX_DIMENSION: u32 = 5000;
pub const DEFAULT_MAX_BYTES: usize = 30 * 1024 * 1024;
pub const DEFAULT_MAX_PASSES: u32 = 5;
pub const DEFAULT_SCALE: f32 = 0.8;
const JPEG_QUALITY: u8 = 90;

/// What to do when the byte cap is still exceeded after the last pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OversizePolicy {
    #[default]
    Fail,
    BestEffort,
}

impl FromStr for OversizePolicy {
    type Err = PipelineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "best-effort" | "best_effort" => Ok(Self::BestEffort),
            other => Err(PipelineError::configuration(format!(
                "unknown oversize policy '{other}' (expected fail or best-effort)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardConfig {
    pub max_dimension: u32,
    pub max_bytes: usize,
    pub max_passes: u32,
    pub scale: f32,
    pub policy: OversizePolicy,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            max_bytes: DEFAULT_MAX_BYTES,
            max_passes: DEFAULT_MAX_PASSES,
            scale: DEFAULT_SCALE,
            policy: OversizePolicy::Fail,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GuardPass {
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardReport {
    pub original_width: u32,
    pub original_height: u32,
    pub original_bytes: usize,
    pub final_width: u32,
    pub final_height: u32,
    pub final_bytes: usize,
    /// Accepted shrink passes, in order; each is strictly smaller than the
    /// payload before it in width, height and bytes. The initial dimension
    /// fit is not a pass.
    pub passes: Vec<GuardPass>,
    /// Shrink attempts made, accepted or not. Bounded by `max_passes`.
    pub attempts: u32,
    pub passthrough: bool,
    pub exhausted: bool,
}

#[derive(Debug, Clone)]
pub struct Guarded {
    pub asset: ImageAsset,
    pub report: GuardReport,
}

/// Proportional fit so the longer side is at most `max`. Never upscales.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    let max = max.max(1);
    if width <= max && height <= max {
        return (width, height);
    }
    let (long, short) = if width >= height {
        (width, height)
    } else {
        (height, width)
    };
    let scaled = ((u64::from(short) * u64::from(max) + u64::from(long) / 2) / u64::from(long))
        .max(1) as u32;
    if width >= height {
        (max, scaled)
    } else {
        (scaled, max)
    }
}

/// One shrink step: `floor(side * scale)`, at least one pixel smaller, never below 1.
/// `None` when the side is already 1 px.
fn shrink_side(side: u32, scale: f32) -> Option<u32> {
    if side <= 1 {
        return None;
    }
    let scaled = (f64::from(side) * f64::from(scale)).floor() as u32;
    Some(scaled.min(side - 1).max(1))
}

fn encode(image: &DynamicImage, lossless: bool) -> PipelineResult<ImageAsset> {
    let mut buf = Vec::new();
    let result = if lossless {
        image.write_with_encoder(PngEncoder::new(&mut buf))
    } else {
        DynamicImage::ImageRgb8(image.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY))
    };
    result.map_err(|err| PipelineError::processing(format!("image encode failed: {err}")))?;
    let mime = if lossless { "image/png" } else { "image/jpeg" };
    Ok(ImageAsset::new(buf, mime))
}

/// Brings `asset` within `config`'s dimension and byte limits.
///
/// Compliant input is returned untouched. Otherwise the image is fitted to
/// `max_dimension` and, while still over `max_bytes`, shrunk by `scale` per
/// attempt up to `max_passes` attempts. An attempt that does not shrink the
/// encoded size is discarded and the next one scales down further.
pub fn normalize(asset: &ImageAsset, config: &GuardConfig) -> PipelineResult<Guarded> {
    if asset.is_empty() {
        return Err(PipelineError::validation("No image provided"));
    }
    let (width, height) = asset.dimensions()?;
    let original_bytes = asset.len();

    if width <= config.max_dimension
        && height <= config.max_dimension
        && original_bytes <= config.max_bytes
    {
        tracing::debug!(width, height, bytes = original_bytes, "guard passthrough");
        return Ok(Guarded {
            asset: asset.clone(),
            report: GuardReport {
                original_width: width,
                original_height: height,
                original_bytes,
                final_width: width,
                final_height: height,
                final_bytes: original_bytes,
                passes: Vec::new(),
                attempts: 0,
                passthrough: true,
                exhausted: false,
            },
        });
    }

    let reader = ImageReader::new(Cursor::new(asset.bytes()))
        .with_guessed_format()
        .map_err(|err| PipelineError::processing(format!("could not read image: {err}")))?;
    let source_format = reader.format();
    let source = reader
        .decode()
        .map_err(|err| PipelineError::processing(format!("could not decode image: {err}")))?;
    let lossless = source.color().has_alpha() || source_format == Some(ImageFormat::Png);

    let (mut cur_w, mut cur_h) = fit_within(width, height, config.max_dimension);
    let mut current = if (cur_w, cur_h) == (width, height) {
        asset.clone()
    } else {
        let fitted = encode(&source.resize_exact(cur_w, cur_h, FilterType::Triangle), lossless)?;
        tracing::debug!(
            from_width = width,
            from_height = height,
            width = cur_w,
            height = cur_h,
            bytes = fitted.len(),
            "guard fitted dimensions"
        );
        fitted
    };

    // `current` only advances on a pass that shrinks both dimensions and
    // bytes, so it is always the smallest payload reached.
    let mut passes = Vec::new();
    let mut attempts = 0u32;
    let (mut try_w, mut try_h) = (cur_w, cur_h);
    let mut exhausted = false;
    while current.len() > config.max_bytes {
        if attempts >= config.max_passes {
            exhausted = true;
            break;
        }
        let (Some(next_w), Some(next_h)) = (
            shrink_side(try_w, config.scale),
            shrink_side(try_h, config.scale),
        ) else {
            exhausted = true;
            break;
        };
        attempts += 1;
        try_w = next_w;
        try_h = next_h;
        let candidate = encode(
            &source.resize_exact(next_w, next_h, FilterType::Triangle),
            lossless,
        )?;
        if candidate.len() >= current.len() {
            tracing::debug!(
                attempt = attempts,
                width = next_w,
                height = next_h,
                bytes = candidate.len(),
                previous_bytes = current.len(),
                "guard shrink attempt did not reduce size"
            );
            continue;
        }
        current = candidate;
        cur_w = next_w;
        cur_h = next_h;
        let pass = GuardPass {
            width: cur_w,
            height: cur_h,
            bytes: current.len(),
        };
        tracing::debug!(
            pass = passes.len() + 1,
            attempt = attempts,
            width = pass.width,
            height = pass.height,
            bytes = pass.bytes,
            "guard shrink pass"
        );
        passes.push(pass);
    }

    if exhausted {
        match config.policy {
            OversizePolicy::Fail => {
                return Err(PipelineError::processing(format!(
                    "image is still {} bytes after {attempts} shrink attempts (limit {})",
                    current.len(),
                    config.max_bytes
                )));
            }
            OversizePolicy::BestEffort => {
                tracing::warn!(
                    bytes = current.len(),
                    limit = config.max_bytes,
                    attempts,
                    passes = passes.len(),
                    "guard attempt cap reached; sending smallest oversize image"
                );
            }
        }
    }

    let final_bytes = current.len();
    Ok(Guarded {
        asset: current,
        report: GuardReport {
            original_width: width,
            original_height: height,
            original_bytes,
            final_width: cur_w,
            final_height: cur_h,
            final_bytes,
            passes,
            attempts,
            passthrough: false,
            exhausted,
        },
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    use super::{fit_within, normalize, shrink_side, GuardConfig, OversizePolicy};
    use crate::asset::ImageAsset;

    fn png(image: DynamicImage) -> ImageAsset {
        let mut buf = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        ImageAsset::new(buf, "image/png")
    }

    fn noisy_rgb(width: u32, height: u32) -> DynamicImage {
        let mut state = 0x2545_f491_u32;
        let image = RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [a, b, c, _] = state.to_le_bytes();
            Rgb([a, b, c])
        });
        DynamicImage::ImageRgb8(image)
    }

    #[test]
    fn fit_within_preserves_aspect() {
        assert_eq!(fit_within(6000, 4000, 5000), (5000, 3333));
        assert_eq!(fit_within(4000, 6000, 5000), (3333, 5000));
        assert_eq!(fit_within(4000, 3000, 5000), (4000, 3000));
        assert_eq!(fit_within(10_000, 1, 5000), (5000, 1));
    }

    #[test]
    fn shrink_side_always_makes_progress() {
        assert_eq!(shrink_side(100, 0.8), Some(80));
        assert_eq!(shrink_side(2, 0.95), Some(1));
        assert_eq!(shrink_side(4, 0.95), Some(3));
        assert_eq!(shrink_side(1, 0.8), None);
    }

    #[test]
    fn compliant_input_passes_through_untouched() {
        let asset = png(noisy_rgb(40, 20));
        let guarded = normalize(&asset, &GuardConfig::default()).unwrap();
        assert!(guarded.report.passthrough);
        assert_eq!(guarded.asset, asset);
        assert!(guarded.report.passes.is_empty());
    }

    #[test]
    fn oversize_dimensions_fit_longer_side() {
        let asset = png(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            600,
            400,
            Rgb([200, 180, 160]),
        )));
        let config = GuardConfig {
            max_dimension: 500,
            ..GuardConfig::default()
        };
        let guarded = normalize(&asset, &config).unwrap();
        assert_eq!(guarded.asset.dimensions().unwrap(), (500, 333));
        assert_eq!(
            (guarded.report.final_width, guarded.report.final_height),
            (500, 333)
        );
        assert!(guarded.report.passes.is_empty());
        assert_eq!(guarded.asset.mime(), "image/png");
    }

    #[test]
    fn transparency_survives_resizing() {
        let image = RgbaImage::from_fn(300, 120, |x, _| {
            if x < 150 {
                Rgba([10, 20, 30, 0])
            } else {
                Rgba([200, 100, 50, 255])
            }
        });
        let asset = png(DynamicImage::ImageRgba8(image));
        let config = GuardConfig {
            max_dimension: 100,
            ..GuardConfig::default()
        };
        let guarded = normalize(&asset, &config).unwrap();
        assert_eq!(guarded.asset.mime(), "image/png");
        let decoded = image::load_from_memory(guarded.asset.bytes()).unwrap();
        assert!(decoded.color().has_alpha());
        assert_eq!(decoded.to_rgba8().get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn byte_cap_shrinks_with_strictly_decreasing_dimensions() {
        let asset = png(noisy_rgb(200, 150));
        let config = GuardConfig {
            max_bytes: asset.len() / 3,
            ..GuardConfig::default()
        };
        let guarded = normalize(&asset, &config).unwrap();
        let report = &guarded.report;
        assert!(!report.passes.is_empty());
        assert!(report.passes.len() as u32 <= config.max_passes);
        assert!(guarded.asset.len() <= config.max_bytes);
        assert!(!report.exhausted);
        let mut last = (200, 150, asset.len());
        for pass in &report.passes {
            assert!(pass.width < last.0 && pass.height < last.1);
            assert!(pass.bytes < last.2, "pass grew: {} -> {}", last.2, pass.bytes);
            last = (pass.width, pass.height, pass.bytes);
        }
        assert_eq!(report.passes[0].width, 160);
        assert_eq!(report.final_bytes, guarded.asset.len());
    }

    #[test]
    fn shrink_passes_never_grow_the_payload() {
        // Downscaling a one-pixel checkerboard blurs it into a pattern that can
        // encode larger than the source.
        let image = RgbImage::from_fn(1200, 1200, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let asset = png(DynamicImage::ImageRgb8(image));
        let config = GuardConfig {
            max_bytes: 1,
            policy: OversizePolicy::BestEffort,
            ..GuardConfig::default()
        };
        let guarded = normalize(&asset, &config).unwrap();
        let report = &guarded.report;
        assert!(report.exhausted);
        assert!(report.passes.len() as u32 <= report.attempts);
        assert!(report.attempts <= config.max_passes);

        let mut last = (1200, 1200, asset.len());
        for pass in &report.passes {
            assert!(pass.width < last.0 && pass.height < last.1);
            assert!(pass.bytes < last.2, "pass grew: {} -> {}", last.2, pass.bytes);
            last = (pass.width, pass.height, pass.bytes);
        }

        let smallest = report
            .passes
            .iter()
            .map(|pass| pass.bytes)
            .chain(std::iter::once(asset.len()))
            .min()
            .unwrap();
        assert_eq!(guarded.asset.len(), smallest);
        assert_eq!(report.final_bytes, smallest);
        assert_eq!((report.final_width, report.final_height), (last.0, last.1));
        assert_eq!(guarded.asset.dimensions().unwrap(), (last.0, last.1));
    }

    #[test]
    fn six_by_four_thousand_upload_fits_to_five_thousand() {
        let asset = png(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            6000,
            4000,
            Rgb([236, 230, 220]),
        )));
        let guarded = normalize(&asset, &GuardConfig::default()).unwrap();
        assert!(!guarded.report.passthrough);
        assert!(guarded.report.passes.is_empty());
        assert_eq!(guarded.report.attempts, 0);
        assert_eq!(guarded.asset.dimensions().unwrap(), (5000, 3333));
        assert_eq!(
            (guarded.report.original_width, guarded.report.original_height),
            (6000, 4000)
        );
    }

    #[test]
    fn exhausted_cap_fails_by_default() {
        let asset = png(noisy_rgb(120, 120));
        let config = GuardConfig {
            max_bytes: 16,
            max_passes: 2,
            ..GuardConfig::default()
        };
        let err = normalize(&asset, &config).unwrap_err();
        assert_eq!(err.kind(), "processing");
    }

    #[test]
    fn exhausted_cap_best_effort_returns_smallest_attempt() {
        let asset = png(noisy_rgb(120, 120));
        let config = GuardConfig {
            max_bytes: 16,
            max_passes: 2,
            policy: OversizePolicy::BestEffort,
            ..GuardConfig::default()
        };
        let guarded = normalize(&asset, &config).unwrap();
        assert!(guarded.report.exhausted);
        assert_eq!(guarded.report.attempts, 2);
        assert_eq!(guarded.report.passes.len(), 2);
        assert_eq!(guarded.asset.dimensions().unwrap(), (76, 76));
        assert!(guarded.report.passes[1].bytes < guarded.report.passes[0].bytes);
    }

    #[test]
    fn empty_and_garbage_input_are_rejected() {
        let config = GuardConfig::default();
        let err = normalize(&ImageAsset::new(Vec::new(), "image/png"), &config).unwrap_err();
        assert_eq!(err.kind(), "validation");
        let err = normalize(&ImageAsset::new(b"not an image".to_vec(), "image/png"), &config)
            .unwrap_err();
        assert_eq!(err.kind(), "processing");
    }

    #[test]
    fn policy_parses() {
        assert_eq!("best-effort".parse::<OversizePolicy>(), Ok(OversizePolicy::BestEffort));
        assert!("sometimes".parse::<OversizePolicy>().is_err());
    }
}
