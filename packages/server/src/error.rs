//! Maps library errors onto HTTP responses.

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError, error, web};
use area_insights_area::AreaStatsError;
use area_insights_chat::context::ContextError;
use area_insights_chat::summary::SummaryError;
use area_insights_server_models::ApiResponse;
use thiserror::Error;

/// Generic message for unexpected failures.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// An error answered with `{success: false, message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request is malformed or refers to something invalid.
    #[error("{0}")]
    BadRequest(String),

    /// The requested resource does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A third-party dependency cannot serve the request right now.
    #[error("{0}")]
    Unavailable(String),

    /// Something failed on our side. The message is safe to show.
    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiResponse::error(self.to_string()))
    }
}

impl From<AreaStatsError> for ApiError {
    fn from(e: AreaStatsError) -> Self {
        Self::NotFound(e.to_string())
    }
}

impl From<ContextError> for ApiError {
    fn from(e: ContextError) -> Self {
        match e {
            ContextError::UnknownPinCode(_) => Self::BadRequest("Invalid Pin Code".to_string()),
            ContextError::Json(e) => {
                log::error!("Failed to build chat context: {e}");
                Self::Internal(INTERNAL_MESSAGE.to_string())
            }
        }
    }
}

impl From<SummaryError> for ApiError {
    fn from(e: SummaryError) -> Self {
        match e {
            SummaryError::EmptyHistory => Self::BadRequest(e.to_string()),
            SummaryError::EmptySummary => Self::Internal(e.to_string()),
            SummaryError::Ai(e) => {
                log::error!("Summary completion failed: {e}");
                Self::Internal(SummaryError::EmptySummary.to_string())
            }
        }
    }
}

/// JSON extractor configuration that answers malformed bodies with a 400
/// envelope instead of actix's plain-text error.
#[must_use]
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| {
        let response =
            HttpResponse::BadRequest().json(ApiResponse::error(format!("Invalid request body: {err}")));
        error::InternalError::from_response(err, response).into()
    })
}
