use std::time::Duration;

use tracing::warn;

use super::ExtractError;

const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Read the embedded text layer of a PDF. Scanned PDFs without one come back
/// blank and need to go through OCR as images instead.
pub async fn extract_text(bytes: Vec<u8>) -> Result<String, ExtractError> {
    let task = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes));

    let text = tokio::time::timeout(EXTRACTION_TIMEOUT, task)
        .await
        .map_err(|_| ExtractError::ExtractionFailed("PDF extraction timed out".into()))?
        // pdf-extract panics on some malformed files; the join error carries it.
        .map_err(|e| ExtractError::ExtractionFailed(format!("PDF extraction aborted: {}", e)))?
        .map_err(|e| ExtractError::ExtractionFailed(format!("failed to parse PDF: {}", e)))?;

    if text.trim().is_empty() {
        warn!("PDF has no text layer; it is probably a scan");
    }
    Ok(text)
}
