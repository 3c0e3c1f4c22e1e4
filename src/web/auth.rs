use std::collections::HashMap;

use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;
use tracing::warn;

use super::state::AppState;

pub const FUNCTION_KEY_HEADER: &str = "x-functions-key";

/// Function-level auth: the caller's key comes from the `x-functions-key` header
/// or the `code` query parameter. Open when no key is configured.
pub async fn require_function_key(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.function_key.as_deref() else {
        return next.run(request).await;
    };

    let supplied = request
        .headers()
        .get(FUNCTION_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| params.get("code").map(String::as_str));

    if supplied.is_some_and(|key| keys_match(key, expected)) {
        next.run(request).await
    } else {
        warn!(path = %request.uri().path(), "Rejected webhook call with missing or wrong function key");
        (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
    }
}

fn keys_match(supplied: &str, expected: &str) -> bool {
    supplied.as_bytes().ct_eq(expected.as_bytes()).into()
}
