use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::warranty::AdjudicationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Workflow(AdjudicationError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Workflow(err) => write!(f, "workflow error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Workflow(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Workflow(err) => workflow_status(err),
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            AppError::Workflow(err) => err.user_message(),
            other => other.to_string(),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

/// HTTP status for each adjudication failure.
pub fn workflow_status(err: &AdjudicationError) -> StatusCode {
    use crate::workflows::warranty::GatewayError;

    match err {
        AdjudicationError::NotFound(_) | AdjudicationError::Gateway(GatewayError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        AdjudicationError::Store(_) => StatusCode::BAD_REQUEST,
        AdjudicationError::Invalid(_) | AdjudicationError::Undecided { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AdjudicationError::InFlight(_) | AdjudicationError::ShippingOrderUnavailable(_) => {
            StatusCode::CONFLICT
        }
        AdjudicationError::Gateway(GatewayError::Rejected { .. }) => StatusCode::BAD_GATEWAY,
        AdjudicationError::Gateway(GatewayError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<AdjudicationError> for AppError {
    fn from(value: AdjudicationError) -> Self {
        Self::Workflow(value)
    }
}
