use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use super::state::AppState;
use crate::automation::{AutomationError, Outcome};

pub const COMPLETED_BODY: &str = "Task automation completed";

/// POST /api/ado/tasks
///
/// The body is taken raw so unparseable JSON is answered as an invalid payload.
pub async fn ado_task_automation(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AutomationError> {
    info!(bytes = body.len(), "ADO webhook received");

    match state.automation.handle(&body).await? {
        Outcome::Ignored => Ok(StatusCode::OK.into_response()),
        Outcome::Completed { story_id, report } => {
            let failures = report.failures();
            if !failures.is_empty() {
                let titles: Vec<&str> = failures.iter().map(|f| f.title).collect();
                warn!(story_id, ?titles, "Completed with task creation failures");
            }
            Ok((StatusCode::OK, COMPLETED_BODY).into_response())
        }
    }
}

/// GET /api/health
pub async fn health() -> &'static str {
    "ok"
}
