use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::{info, warn};

use super::ExtractError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for an HTTP OCR service that accepts raw image bytes and answers
/// with the recognised text as the response body.
#[derive(Clone)]
pub struct OcrClient {
    client: reqwest::Client,
    endpoint: String,
}

impl OcrClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    pub async fn recognize(&self, bytes: Vec<u8>, mime: &str) -> Result<String, ExtractError> {
        info!("Sending {} byte image to OCR at {}", bytes.len(), self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, mime)
            .timeout(REQUEST_TIMEOUT)
            .body(bytes)
            .send()
            .await
            .map_err(|e| ExtractError::ExtractionFailed(format!("OCR request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!("OCR service returned {}", status);
            return Err(ExtractError::ExtractionFailed(format!(
                "OCR service returned {}",
                status
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ExtractError::ExtractionFailed(format!("bad OCR response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_extraction_failure() {
        let client = OcrClient::new(format!("http://127.0.0.1:{}/ocr", closed_port()));
        let err = client.recognize(vec![0; 16], "image/png").await.unwrap_err();
        assert!(matches!(err, ExtractError::ExtractionFailed(m) if m.starts_with("OCR request failed")));
    }
}
