use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::automation::AutomationError;

impl AutomationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AutomationError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            AutomationError::MissingConfiguration(_) => StatusCode::BAD_REQUEST,
            AutomationError::FetchFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body sent back to the caller; details stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            AutomationError::MalformedPayload(_) => "Invalid payload",
            AutomationError::MissingConfiguration(_) => "Missing required data",
            AutomationError::FetchFailed { .. } => "Failed to fetch work item",
        }
    }
}

impl IntoResponse for AutomationError {
    fn into_response(self) -> Response {
        (self.status_code(), self.public_message()).into_response()
    }
}
