//! Offline adapters so the whole pipeline runs without credentials.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use scene_contracts::error::{PipelineError, PipelineResult};
use serde_json::json;
use sha2::{Digest, Sha256};

use super::{map_object, AdapterOutput, BackgroundRemover, ViewGenerator, ViewRequest};
use crate::asset::ImageAsset;

/// Per-channel distance at which a pixel still counts as background.
const KEY_TOLERANCE: u8 = 24;

fn decode(asset: &ImageAsset) -> PipelineResult<DynamicImage> {
    image::load_from_memory(asset.bytes())
        .map_err(|err| PipelineError::processing(format!("could not decode image: {err}")))
}

fn encode_png(image: &RgbaImage) -> PipelineResult<ImageAsset> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|err| PipelineError::processing(format!("image encode failed: {err}")))?;
    Ok(ImageAsset::new(buf, "image/png"))
}

fn color_from_prompt(prompt: &str, salt: usize) -> [u8; 3] {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    hasher.update((salt as u64).to_be_bytes());
    let digest = hasher.finalize();
    [digest[0], digest[1], digest[2]]
}

/// Makes every pixel close to the top-left corner color transparent.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryrunBackgroundRemover;

impl BackgroundRemover for DryrunBackgroundRemover {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn remove_background(&self, image: &ImageAsset) -> PipelineResult<AdapterOutput> {
        let mut rgba = decode(image)?.to_rgba8();
        let key = *rgba.get_pixel(0, 0);
        let mut keyed = 0usize;
        for pixel in rgba.pixels_mut() {
            let close = pixel.0[..3]
                .iter()
                .zip(&key.0[..3])
                .all(|(a, b)| a.abs_diff(*b) <= KEY_TOLERANCE);
            if close {
                pixel.0[3] = 0;
                keyed += 1;
            }
        }
        let asset = encode_png(&rgba)?;
        Ok(AdapterOutput {
            asset,
            provider_request: map_object(json!({
                "endpoint": "dryrun-native",
                "mime": image.mime(),
                "bytes": image.len(),
            })),
            provider_response: map_object(json!({
                "status": "ok",
                "keyed_pixels": keyed,
                "key_color": [key.0[0], key.0[1], key.0[2]],
            })),
        })
    }
}

/// Paints a prompt-hash colored canvas the size of the anchor and lays the
/// anchor over it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryrunViewGenerator;

impl ViewGenerator for DryrunViewGenerator {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn generate_view(&self, request: &ViewRequest<'_>) -> PipelineResult<AdapterOutput> {
        let anchor = decode(request.anchor)?.to_rgba8();
        let [r, g, b] = color_from_prompt(request.prompt.as_str(), request.references.len());
        let mut canvas = RgbaImage::from_pixel(anchor.width(), anchor.height(), Rgba([r, g, b, 255]));
        for (x, y, src) in anchor.enumerate_pixels() {
            let alpha = u16::from(src[3]);
            let dst = canvas.get_pixel_mut(x, y);
            for channel in 0..3 {
                let over = u16::from(src[channel]) * alpha;
                let under = u16::from(dst[channel]) * (255 - alpha);
                dst[channel] = ((over + under) / 255) as u8;
            }
        }
        let asset = encode_png(&canvas)?;
        Ok(AdapterOutput {
            asset,
            provider_request: map_object(json!({
                "endpoint": "dryrun-native",
                "prompt_fingerprint": request.prompt.fingerprint(),
                "references": request.references.len(),
            })),
            provider_response: map_object(json!({
                "status": "ok",
                "width": canvas.width(),
                "height": canvas.height(),
            })),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use scene_contracts::category::ProductCategory;
    use scene_contracts::prompts::PromptEngine;
    use scene_contracts::selection::{SeededSelector, ViewStage};

    use super::{DryrunBackgroundRemover, DryrunViewGenerator};
    use crate::adapters::{BackgroundRemover, ViewGenerator, ViewRequest};
    use crate::asset::ImageAsset;

    fn product_on_white() -> ImageAsset {
        let image = RgbImage::from_fn(32, 24, |x, y| {
            if (8..24).contains(&x) && (6..18).contains(&y) {
                Rgb([120, 60, 30])
            } else {
                Rgb([250, 250, 250])
            }
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        ImageAsset::new(buf, "image/png")
    }

    #[test]
    fn background_becomes_transparent() {
        let output = DryrunBackgroundRemover
            .remove_background(&product_on_white())
            .unwrap();
        let decoded = image::load_from_memory(output.asset.bytes()).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0)[3], 0);
        assert_eq!(decoded.get_pixel(16, 12)[3], 255);
        assert_eq!(output.provider_response["keyed_pixels"], 32 * 24 - 16 * 12);
    }

    #[test]
    fn view_matches_anchor_size_and_is_deterministic() {
        let transparent = DryrunBackgroundRemover
            .remove_background(&product_on_white())
            .unwrap()
            .asset;
        let prompt = PromptEngine::builtin()
            .unwrap()
            .assemble(
                ProductCategory::Shelf,
                ViewStage::Primary,
                &mut SeededSelector::new(6),
            )
            .unwrap()
            .document;
        let request = ViewRequest {
            prompt: &prompt,
            anchor: &transparent,
            references: &[],
        };
        let first = DryrunViewGenerator.generate_view(&request).unwrap();
        let second = DryrunViewGenerator.generate_view(&request).unwrap();
        assert_eq!(first.asset, second.asset);
        assert_eq!(first.asset.dimensions().unwrap(), (32, 24));
        let decoded = image::load_from_memory(first.asset.bytes()).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(16, 12).0, [120, 60, 30, 255]);
    }
}
