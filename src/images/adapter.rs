//! Size adaptation: encode an image so it fits a provider's byte budget.
//!
//! Adaptation escalates through three tiers, each attempted only when the
//! previous tier's output still exceeds the budget:
//!
//! 1. **Direct encode**: base64 of the original bytes.
//! 2. **Lossy resample**: re-encode at the same pixel dimensions as JPEG
//!    quality 60, shrinking the file through compression alone.
//! 3. **Geometric resize**: downscale both dimensions by
//!    `sqrt(max_size / (width * height))` with a Lanczos3 filter, then
//!    re-encode as in tier 2. The scale factor deliberately mirrors the
//!    long-standing behavior of relating the byte budget to the pixel area
//!    without a bytes-per-pixel calibration; it is an approximation, kept
//!    as-is rather than tuned.
//!
//! The adapter never mutates the record it reads: every provider gets its
//! artifact computed from an untouched copy of the original bytes, so the
//! order in which providers are processed cannot change any provider's
//! result.

use base64::{Engine, engine::general_purpose::STANDARD};
use image::DynamicImage;
use image::imageops::FilterType;

use crate::error::PromptError;
use crate::images::record::ImageRecord;
use crate::images::registry::ImageRegistry;
use crate::types::ImageConfig;

/// Quality used for the lossy tiers.
const RESAMPLE_QUALITY: u8 = 60;
/// Dimensions are never shrunk below this, so tier 3 cannot degenerate.
const MIN_DIMENSION: u32 = 16;

/// The outcome of adapting one image for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdaptedImage {
    /// A base64 payload guaranteed to fit the provider's budget, along with
    /// the media type of the bytes it encodes (tiers 2-3 re-encode as JPEG,
    /// so this can differ from the record's own media type).
    Encoded { data: String, media_type: String },
    /// The provider takes raw bytes or remote references; the original
    /// bytes pass through untouched.
    Passthrough(Vec<u8>),
}

impl AdaptedImage {
    /// Size of the artifact in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::Encoded { data, .. } => data.len(),
            Self::Passthrough(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The base64 payload, when this is an encoded artifact.
    pub fn as_encoded(&self) -> Option<&str> {
        match self {
            Self::Encoded { data, .. } => Some(data),
            Self::Passthrough(_) => None,
        }
    }
}

/// Adapts images to per-provider budgets; see the module docs for the tier
/// escalation.
#[derive(Debug, Clone)]
pub struct ImageAdapter {
    resample_quality: u8,
    min_dimension: u32,
}

impl Default for ImageAdapter {
    fn default() -> Self {
        Self {
            resample_quality: RESAMPLE_QUALITY,
            min_dimension: MIN_DIMENSION,
        }
    }
}

impl ImageAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the JPEG quality used by the lossy tiers.
    pub fn with_resample_quality(mut self, quality: u8) -> Self {
        self.resample_quality = quality;
        self
    }

    /// Produce an artifact for `provider_id` that fits `config.max_size`.
    ///
    /// Returns [`PromptError::ImageTooLarge`] when even maximal downscaling
    /// cannot satisfy the budget; an oversized artifact is never returned
    /// silently. Fails with [`PromptError::NotFetched`] when the record has
    /// no bytes yet.
    pub fn adapt(
        &self,
        record: &ImageRecord,
        provider_id: &str,
        config: &ImageConfig,
    ) -> Result<AdaptedImage, PromptError> {
        let path = record.source_path();
        let bytes = record.raw_bytes().ok_or_else(|| PromptError::NotFetched {
            path: path.to_string(),
        })?;

        if !config.requires_base64 {
            return Ok(AdaptedImage::Passthrough(bytes.to_vec()));
        }

        let max_size = config.max_size;

        // Tier 1: the original bytes may already fit.
        let direct = STANDARD.encode(bytes);
        if direct.len() <= max_size {
            return Ok(AdaptedImage::Encoded {
                data: direct,
                media_type: record
                    .media_type()
                    .unwrap_or("application/octet-stream")
                    .to_string(),
            });
        }

        // Tier 2: same dimensions, heavier compression.
        let img = image::load_from_memory(bytes).map_err(|e| PromptError::ImageDecode {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        let resampled = STANDARD.encode(self.encode_jpeg(path, &img)?);
        tracing::debug!(
            path,
            provider_id,
            direct = direct.len(),
            resampled = resampled.len(),
            max_size,
            "direct encoding over budget, resampled"
        );
        if resampled.len() <= max_size {
            return Ok(AdaptedImage::Encoded {
                data: resampled,
                media_type: "image/jpeg".to_string(),
            });
        }

        // Tier 3: shrink the pixel area toward the budget.
        let (width, height) = (img.width(), img.height());
        let scale = (max_size as f64 / (f64::from(width) * f64::from(height)))
            .sqrt()
            .min(1.0);
        let target_width = scale_dimension(width, scale, self.min_dimension);
        let target_height = scale_dimension(height, scale, self.min_dimension);
        let shrunk = img.resize_exact(target_width, target_height, FilterType::Lanczos3);
        let resized = STANDARD.encode(self.encode_jpeg(path, &shrunk)?);
        tracing::debug!(
            path,
            provider_id,
            from = ?(width, height),
            to = ?(target_width, target_height),
            resized = resized.len(),
            max_size,
            "resampling over budget, resized"
        );
        if resized.len() <= max_size {
            return Ok(AdaptedImage::Encoded {
                data: resized,
                media_type: "image/jpeg".to_string(),
            });
        }

        Err(PromptError::ImageTooLarge {
            path: path.to_string(),
            provider: provider_id.to_string(),
            max_size,
        })
    }

    /// Run [`ImageAdapter::adapt`] for a registered path and cache a base64
    /// result on the record under the provider key. Passthrough results are
    /// not encodes and are not cached.
    pub fn adapt_into_registry(
        &self,
        registry: &mut ImageRegistry,
        path: &str,
        provider_id: &str,
        config: &ImageConfig,
    ) -> Result<(), PromptError> {
        let record = registry.get(path).ok_or_else(|| PromptError::UnknownImage {
            path: path.to_string(),
        })?;
        let adapted = self.adapt(record, provider_id, config)?;
        if let AdaptedImage::Encoded { data, .. } = adapted {
            registry.add_encoded(path, provider_id, data)?;
        }
        Ok(())
    }

    fn encode_jpeg(&self, path: &str, img: &DynamicImage) -> Result<Vec<u8>, PromptError> {
        // JPEG has no alpha channel; flatten before encoding.
        let rgb = img.to_rgb8();
        let mut buf = Vec::new();
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, self.resample_quality);
        encoder
            .encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| PromptError::ImageDecode {
                path: path.to_string(),
                reason: format!("JPEG re-encode failed: {e}"),
            })?;
        Ok(buf)
    }
}

fn scale_dimension(value: u32, scale: f64, floor: u32) -> u32 {
    let scaled = (f64::from(value) * scale).floor() as u32;
    scaled.clamp(floor.min(value), value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    fn noise_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let n = x
                .wrapping_mul(3_266_489_917)
                .wrapping_add(y.wrapping_mul(374_761_393));
            let n = n ^ (n >> 13);
            Rgb([(n & 0xFF) as u8, ((n >> 8) & 0xFF) as u8, ((n >> 16) & 0xFF) as u8])
        })
    }

    fn png_record(img: &RgbImage, path: &str) -> ImageRecord {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img.clone())
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        ImageRecord::with_bytes(path, buf, None).unwrap()
    }

    fn base64_config(max_size: usize) -> ImageConfig {
        ImageConfig {
            requires_base64: true,
            max_size,
            ..ImageConfig::default()
        }
    }

    #[test]
    fn passthrough_bypasses_every_tier() {
        let record = png_record(&noise_image(8, 8), "a.png");
        let config = ImageConfig {
            requires_base64: false,
            // A budget nothing could fit; irrelevant for passthrough.
            max_size: 1,
            ..ImageConfig::default()
        };
        let adapted = ImageAdapter::new().adapt(&record, "openai", &config).unwrap();
        assert_eq!(
            adapted,
            AdaptedImage::Passthrough(record.raw_bytes().unwrap().to_vec())
        );
    }

    #[test]
    fn direct_tier_preserves_original_media_type() {
        let record = png_record(&noise_image(8, 8), "a.png");
        let config = base64_config(10_000_000);
        let adapted = ImageAdapter::new().adapt(&record, "anthropic", &config).unwrap();
        match adapted {
            AdaptedImage::Encoded { data, media_type } => {
                assert_eq!(media_type, "image/png");
                assert_eq!(data, STANDARD.encode(record.raw_bytes().unwrap()));
            }
            other => panic!("unexpected artifact: {other:?}"),
        }
    }

    #[test]
    fn resample_tier_is_chosen_before_resize() {
        // Noise defeats PNG compression, so the direct encoding is large
        // while the JPEG resample shrinks it substantially.
        let img = noise_image(120, 90);
        let record = png_record(&img, "noise.png");
        let adapter = ImageAdapter::new();

        // Reproduce the tier outputs to pick a budget strictly between
        // them: resample must fit, direct must not.
        let direct_len = STANDARD.encode(record.raw_bytes().unwrap()).len();
        let resampled = STANDARD.encode(
            adapter
                .encode_jpeg("noise.png", &DynamicImage::ImageRgb8(img.clone()))
                .unwrap(),
        );
        assert!(resampled.len() < direct_len);
        let budget = (resampled.len() + direct_len) / 2;

        let adapted = adapter
            .adapt(&record, "anthropic", &base64_config(budget))
            .unwrap();
        match adapted {
            AdaptedImage::Encoded { data, media_type } => {
                assert_eq!(media_type, "image/jpeg");
                // Exactly the tier-2 output: dimensions untouched.
                assert_eq!(data, resampled);
                let decoded = image::load_from_memory(&STANDARD.decode(&data).unwrap()).unwrap();
                assert_eq!((decoded.width(), decoded.height()), (120, 90));
            }
            other => panic!("unexpected artifact: {other:?}"),
        }
    }

    #[test]
    fn resize_tier_shrinks_dimensions_and_respects_budget() {
        // A flat image keeps the JPEG floor low enough that tier 3 always
        // lands under this budget.
        let img = RgbImage::from_pixel(500, 500, Rgb([200, 30, 30]));
        let record = png_record(&img, "red.png");
        let budget = 2_500;

        let adapted = ImageAdapter::new()
            .adapt(&record, "anthropic", &base64_config(budget))
            .unwrap();
        assert!(adapted.len() <= budget);

        let decoded =
            image::load_from_memory(&STANDARD.decode(adapted.as_encoded().unwrap()).unwrap())
                .unwrap();
        let (w, h) = (decoded.width(), decoded.height());
        assert!(w * h <= 500 * 500, "pixel area grew: {w}x{h}");
    }

    #[test]
    fn budget_guarantee_never_returns_oversized() {
        let record = png_record(&noise_image(200, 200), "noise.png");
        let adapter = ImageAdapter::new();
        for budget in [100usize, 2_000, 20_000, 60_000, 500_000] {
            match adapter.adapt(&record, "anthropic", &base64_config(budget)) {
                Ok(adapted) => assert!(
                    adapted.len() <= budget,
                    "artifact of {} exceeds budget {budget}",
                    adapted.len()
                ),
                Err(PromptError::ImageTooLarge { max_size, .. }) => {
                    assert_eq!(max_size, budget);
                }
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn impossible_budget_fails_with_too_large() {
        let record = png_record(&noise_image(64, 64), "noise.png");
        let err = ImageAdapter::new()
            .adapt(&record, "gemini", &base64_config(10))
            .unwrap_err();
        assert!(matches!(err, PromptError::ImageTooLarge { .. }));
    }

    #[test]
    fn adapt_does_not_mutate_the_record() {
        let record = png_record(&noise_image(300, 300), "noise.png");
        let before = record.raw_bytes().unwrap().to_vec();
        let tight = base64_config(5_000);
        let roomy = base64_config(10_000_000);
        let adapter = ImageAdapter::new();

        // A tight-budget provider first must not pre-shrink what a roomier
        // provider sees next.
        let _ = adapter.adapt(&record, "anthropic", &tight);
        let roomy_artifact = adapter.adapt(&record, "openai", &roomy).unwrap();

        assert_eq!(record.raw_bytes().unwrap(), &before[..]);
        assert_eq!(record.dimensions(), Some((300, 300)));
        assert_eq!(
            roomy_artifact.as_encoded().unwrap(),
            STANDARD.encode(&before)
        );
    }

    #[test]
    fn unfetched_record_is_rejected() {
        let record = ImageRecord::new("never-fetched.png");
        let err = ImageAdapter::new()
            .adapt(&record, "openai", &base64_config(1_000))
            .unwrap_err();
        assert!(matches!(err, PromptError::NotFetched { .. }));
    }

    #[test]
    fn adapt_into_registry_caches_only_encodes() {
        let mut registry = ImageRegistry::new();
        registry.register_record(png_record(&noise_image(8, 8), "a.png"));
        let adapter = ImageAdapter::new();

        adapter
            .adapt_into_registry(&mut registry, "a.png", "anthropic", &base64_config(1_000_000))
            .unwrap();
        assert!(registry.get("a.png").unwrap().has_encoding("anthropic"));

        // Passthrough providers get nothing cached.
        adapter
            .adapt_into_registry(&mut registry, "a.png", "openai", &ImageConfig::default())
            .unwrap();
        assert!(!registry.get("a.png").unwrap().has_encoding("openai"));

        let err = adapter
            .adapt_into_registry(&mut registry, "ghost.png", "openai", &ImageConfig::default())
            .unwrap_err();
        assert!(matches!(err, PromptError::UnknownImage { .. }));
    }

    #[test]
    fn dimension_floor_prevents_degenerate_shrink() {
        assert_eq!(scale_dimension(1000, 0.001, 16), 16);
        assert_eq!(scale_dimension(1000, 0.5, 16), 500);
        // Images already below the floor are never upscaled by the clamp.
        assert_eq!(scale_dimension(8, 0.001, 16), 8);
        assert_eq!(scale_dimension(1000, 2.0, 16), 1000);
    }
}
