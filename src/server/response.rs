//! JSON bodies and the error to status mapping

use crate::{
    config::OutputFormat,
    error::{Result, StudioError},
    services::OutputFormatHandler,
    types::{ComparisonResult, Feature},
};
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use uuid::Uuid;

/// Body returned by every feature endpoint
#[derive(Debug, Serialize)]
pub struct ComparisonResponse {
    /// Data URL of the uploaded bytes, unchanged
    pub original: String,
    /// Data URL of the processed image, PNG encoded
    pub processed: String,
    pub width: u32,
    pub height: u32,
    pub processed_width: u32,
    pub processed_height: u32,
    pub feature: Feature,
    pub request_id: Uuid,
    pub elapsed_ms: u64,
}

impl ComparisonResponse {
    /// Encode both halves of `result`
    ///
    /// # Errors
    /// - `Image` if the processed image cannot be encoded
    pub fn from_result(result: &ComparisonResult) -> Result<Self> {
        let original = result.original();
        let (width, height) = original.dimensions();
        let processed = result.processed();
        let png = OutputFormatHandler::encode(processed, OutputFormat::Png, 100)?;

        Ok(Self {
            original: OutputFormatHandler::data_url(original.bytes(), original.mime_type()),
            processed: OutputFormatHandler::data_url(
                &png,
                OutputFormatHandler::mime_type(OutputFormat::Png),
            ),
            width,
            height,
            processed_width: processed.width(),
            processed_height: processed.height(),
            feature: result.feature(),
            request_id: result.request_id(),
            elapsed_ms: result.elapsed_ms(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ResponseError for StudioError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Backend(_) | Self::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed with {}: {}", status, self);
        } else {
            log::info!("Request rejected with {}: {}", status, self);
        }
        HttpResponse::build(status).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}
