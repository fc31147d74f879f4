use std::fmt;
use std::io::Cursor;
use std::path::Path;

use anyhow::Context;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageFormat, ImageReader};
use scene_contracts::error::{PipelineError, PipelineResult};

pub const DEFAULT_MIME: &str = "image/png";

/// Immutable encoded image plus its MIME type. Every pipeline stage produces
/// a new asset; none is edited in place.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAsset {
    bytes: Vec<u8>,
    mime: String,
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageAsset {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    /// Accepts `data:<mime>;base64,<payload>` or bare base64.
    pub fn from_data_url(raw: &str) -> PipelineResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PipelineError::validation("No image provided"));
        }
        let (mime, payload) = match raw.split_once(',') {
            Some((header, payload)) => (mime_from_header(header), payload),
            None => (None, raw),
        };
        let bytes = BASE64
            .decode(payload.trim().as_bytes())
            .map_err(|err| PipelineError::validation(format!("image is not valid base64: {err}")))?;
        if bytes.is_empty() {
            return Err(PipelineError::validation("No image provided"));
        }
        Ok(Self::new(bytes, mime.unwrap_or(DEFAULT_MIME)))
    }

    /// Reads a file, taking the MIME from its contents and falling back to the extension.
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
        let mime = sniff_mime(&bytes)
            .or_else(|| mime_for_path(path))
            .unwrap_or(DEFAULT_MIME);
        Ok(Self::new(bytes, mime))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.to_base64())
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }

    pub fn dimensions(&self) -> PipelineResult<(u32, u32)> {
        ImageReader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .map_err(|err| PipelineError::processing(format!("could not read image: {err}")))?
            .into_dimensions()
            .map_err(|err| PipelineError::processing(format!("could not decode image: {err}")))
    }
}

fn mime_from_header(header: &str) -> Option<&str> {
    let rest = header.trim().strip_prefix("data:")?;
    let mime = rest.split(';').next()?.trim();
    (!mime.is_empty()).then_some(mime)
}

pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Gif => Some("image/gif"),
        _ => None,
    }
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{mime_for_path, ImageAsset};

    #[test]
    fn parses_data_url_with_mime() {
        let asset = ImageAsset::from_data_url("data:image/jpeg;base64,aGVsbG8=").unwrap();
        assert_eq!(asset.mime(), "image/jpeg");
        assert_eq!(asset.bytes(), b"hello");
        assert_eq!(asset.extension(), "jpg");
    }

    #[test]
    fn bare_base64_defaults_to_png() {
        let asset = ImageAsset::from_data_url("aGVsbG8=").unwrap();
        assert_eq!(asset.mime(), "image/png");
        assert_eq!(asset.to_data_url(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn empty_or_invalid_payload_is_validation_error() {
        assert_eq!(ImageAsset::from_data_url("  ").unwrap_err().kind(), "validation");
        assert_eq!(
            ImageAsset::from_data_url("data:image/png;base64,").unwrap_err().kind(),
            "validation"
        );
        assert_eq!(
            ImageAsset::from_data_url("data:image/png;base64,@@@").unwrap_err().kind(),
            "validation"
        );
    }

    #[test]
    fn debug_does_not_dump_bytes() {
        let asset = ImageAsset::new(vec![1; 64], "image/png");
        let rendered = format!("{asset:?}");
        assert!(rendered.contains("len: 64"));
        assert!(!rendered.contains("[1, 1"));
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_for_path(Path::new("a/B.JPEG")), Some("image/jpeg"));
        assert_eq!(mime_for_path(Path::new("a/b.txt")), None);
    }
}
