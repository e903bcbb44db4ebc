//! Session endpoints: login, logout, current user.

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, header},
};
use serde::{Deserialize, Serialize};

use super::middleware::extract_bearer;
use super::{ApiResponse, state::AppState};
use crate::models::User;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Json<ApiResponse<LoginResponse>> {
    match state.core.auth.login(&req.email, &req.password).await {
        Ok(user) => {
            let token = state.tokens.issue(&user);
            Json(ApiResponse::ok(LoginResponse { token, user }))
        }
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<ApiResponse<()>> {
    if let Some(token) = extract_bearer(headers.get(header::AUTHORIZATION)) {
        state.tokens.revoke(&token);
    }
    state.core.auth.logout();
    Json(ApiResponse::message("Signed out"))
}

pub async fn me(Extension(user): Extension<User>) -> Json<ApiResponse<User>> {
    Json(ApiResponse::ok(user))
}
