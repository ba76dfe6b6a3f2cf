//! Client for the multimodal full-view validation model.
//!
//! Sends the photo inline to a Messages-style HTTP API with the verdict tool
//! forced, using [`reqwest`]. Every failure ends in a passing verdict so a
//! model outage never blocks annotation work.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hanami_core::fullview::{
    build_request_body, parse_response, FullviewValidationResult, ImageFormat,
    SKIP_REASON_API_ERROR, SKIP_REASON_PARSE_ERROR,
};

use crate::config::VisionConfig;

/// Messages API version header value.
const API_VERSION: &str = "2023-06-01";

/// Errors from the validation API layer. Never surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum VisionApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("Vision API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// No API key is configured.
    #[error("VISION_API_KEY is not configured")]
    NotConfigured,
}

/// Judges whether a photo shows a whole tree.
#[async_trait]
pub trait FullviewValidator: Send + Sync {
    /// Model identifier recorded in the validation log.
    fn model_id(&self) -> &str;

    /// Verdict for the photo. Fails open.
    async fn validate(&self, image: &[u8]) -> FullviewValidationResult;
}

/// Sniff the image encoding from its header. Unknown encodings are sent as
/// JPEG.
pub fn detect_format(image: &[u8]) -> ImageFormat {
    match image::guess_format(image) {
        Ok(image::ImageFormat::Png) => ImageFormat::Png,
        Ok(image::ImageFormat::Gif) => ImageFormat::Gif,
        Ok(image::ImageFormat::WebP) => ImageFormat::Webp,
        Ok(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
        other => {
            tracing::debug!(detected = ?other, "Unrecognised image format, sending as JPEG");
            ImageFormat::Jpeg
        }
    }
}

/// [`FullviewValidator`] calling the HTTP API.
pub struct HttpFullviewValidator {
    client: reqwest::Client,
    config: VisionConfig,
}

impl HttpFullviewValidator {
    pub fn new(config: VisionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client, config }
    }

    async fn call(&self, image: &[u8]) -> Result<serde_json::Value, VisionApiError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(VisionApiError::NotConfigured)?;

        let body = build_request_body(
            &self.config.model_id,
            &BASE64.encode(image),
            detect_format(image),
        );

        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, VisionApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(VisionApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response(
        response: reqwest::Response,
    ) -> Result<serde_json::Value, VisionApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl FullviewValidator for HttpFullviewValidator {
    fn model_id(&self) -> &str {
        &self.config.model_id
    }

    async fn validate(&self, image: &[u8]) -> FullviewValidationResult {
        let started = Instant::now();

        let response = match self.call(image).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Full-view validation API call failed, skipping"
                );
                return FullviewValidationResult::fail_open(SKIP_REASON_API_ERROR);
            }
        };

        match parse_response(&response) {
            Ok(result) => {
                tracing::info!(
                    is_valid = result.is_valid,
                    confidence = result.confidence,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Full-view validation complete"
                );
                result
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not parse full-view validation response");
                FullviewValidationResult::fail_open(SKIP_REASON_PARSE_ERROR)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG_HEADER: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0";

    #[test]
    fn detects_known_formats() {
        assert_eq!(detect_format(PNG_HEADER), ImageFormat::Png);
        assert_eq!(detect_format(JPEG_HEADER), ImageFormat::Jpeg);
        assert_eq!(detect_format(b"GIF89a\x01\0\x01\0"), ImageFormat::Gif);
    }

    #[test]
    fn unknown_bytes_fall_back_to_jpeg() {
        assert_eq!(detect_format(b"not an image"), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn missing_api_key_fails_open() {
        let validator = HttpFullviewValidator::new(VisionConfig {
            api_url: "http://127.0.0.1:9/unused".into(),
            api_key: None,
            model_id: "test-model".into(),
            timeout_secs: 1,
        });

        let result = validator.validate(PNG_HEADER).await;
        assert!(result.is_valid);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.reason, SKIP_REASON_API_ERROR);
        assert_eq!(validator.model_id(), "test-model");
    }
}
