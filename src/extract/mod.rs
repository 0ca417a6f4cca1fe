pub mod ocr;
pub mod pdf;

use std::path::Path;

use tracing::{debug, info};

use ocr::OcrClient;

/// Upload limit carried over from the web importer.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("file is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaType {
    Pdf,
    Image(String),
    Text,
}

impl MediaType {
    pub fn from_mime(mime: &str) -> Result<Self, ExtractError> {
        let mime = mime.trim().to_ascii_lowercase();
        match mime.as_str() {
            "application/pdf" => Ok(Self::Pdf),
            "text/plain" => Ok(Self::Text),
            m if IMAGE_TYPES.contains(&m) => Ok(Self::Image(mime)),
            _ => Err(ExtractError::UnsupportedMediaType(mime)),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let mime = match ext.as_str() {
            "pdf" => "application/pdf",
            "txt" | "text" => "text/plain",
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            _ => {
                return Err(ExtractError::UnsupportedMediaType(format!(
                    "unknown extension '{}'",
                    ext
                )))
            }
        };
        Self::from_mime(mime)
    }

    pub fn as_mime(&self) -> &str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Image(m) => m,
            Self::Text => "text/plain",
        }
    }
}

/// Turns uploaded bytes into plain text. Images go to a remote OCR service,
/// PDFs through the embedded text layer.
#[derive(Clone, Default)]
pub struct Extractor {
    ocr: Option<OcrClient>,
}

impl Extractor {
    pub fn new(ocr_url: Option<String>) -> Self {
        Self {
            ocr: ocr_url.map(OcrClient::new),
        }
    }

    pub async fn extract(&self, bytes: Vec<u8>, media: &MediaType) -> Result<String, ExtractError> {
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ExtractError::TooLarge {
                size: bytes.len(),
                limit: MAX_UPLOAD_BYTES,
            });
        }
        debug!("Extracting {} bytes as {}", bytes.len(), media.as_mime());

        let text = match media {
            MediaType::Text => String::from_utf8(bytes)
                .map_err(|e| ExtractError::ExtractionFailed(format!("invalid UTF-8: {}", e)))?,
            MediaType::Pdf => pdf::extract_text(bytes).await?,
            MediaType::Image(mime) => match &self.ocr {
                Some(client) => client.recognize(bytes, mime).await?,
                None => {
                    return Err(ExtractError::ExtractionFailed(
                        "no OCR endpoint configured for images (set KWT_OCR_URL)".into(),
                    ))
                }
            },
        };

        info!("Extracted {} chars from {}", text.len(), media.as_mime());
        Ok(text)
    }
}
