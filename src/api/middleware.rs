//! Bearer-token gate in front of the API.

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::state::AppState;
use crate::error::Error;

/// Everything under /api needs a valid session token except login, which
/// is the way in. The resolved user rides the request extensions so
/// handlers never see the token itself.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if !path.starts_with("/api") || path == "/api/auth/login" {
        return next.run(req).await;
    }

    let token = match extract_bearer(req.headers().get(header::AUTHORIZATION)) {
        Some(token) => token,
        None => return unauthorized(),
    };

    match state.tokens.resolve(&token) {
        Some(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        None => unauthorized(),
    }
}

pub(crate) fn extract_bearer(header: Option<&HeaderValue>) -> Option<String> {
    let value = header?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(|token| token.trim().to_string())
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": Error::AuthenticationRequired.to_string()})),
    )
        .into_response()
}
