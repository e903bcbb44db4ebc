//! Diagram endpoints, capability-gated per request through the service
//! layer. The middleware has already resolved the acting user.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use super::{ApiResponse, state::AppState};
use crate::models::{Diagram, Edge, Node, Role, User};
use crate::services::diagrams as diagram_service;

#[derive(Serialize, Deserialize)]
pub struct DiagramIdResponse {
    pub id: String,
}

#[derive(Deserialize)]
pub struct SaveDiagramRequest {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

#[derive(Deserialize)]
pub struct ShareRequest {
    pub email: String,
    pub role: Role,
}

pub async fn list_diagrams(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Json<ApiResponse<Vec<Diagram>>> {
    match diagram_service::list_diagrams(&state.core, &user).await {
        Ok(diagrams) => Json(ApiResponse::ok(diagrams)),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}

pub async fn create_diagram(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Json<ApiResponse<DiagramIdResponse>> {
    match diagram_service::create_diagram(&state.core, &user).await {
        Ok(id) => Json(ApiResponse::ok_with_message(
            DiagramIdResponse { id },
            "Diagram created!",
        )),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}

pub async fn get_diagram(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Json<ApiResponse<Diagram>> {
    match diagram_service::fetch_diagram(&state.core, &user, &id).await {
        Ok(diagram) => Json(ApiResponse::ok(diagram)),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}

pub async fn save_diagram(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Json(req): Json<SaveDiagramRequest>,
) -> Json<ApiResponse<()>> {
    match diagram_service::save_diagram(&state.core, &user, &id, req.nodes, req.edges).await {
        Ok(()) => Json(ApiResponse::ok(())),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}

pub async fn share_diagram(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Json(req): Json<ShareRequest>,
) -> Json<ApiResponse<()>> {
    match diagram_service::share_diagram(&state.core, &user, &id, &req.email, req.role).await {
        Ok(target) => Json(ApiResponse::message(format!(
            "Diagram shared successfully with {} as {}!",
            target.email, req.role
        ))),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}

pub async fn delete_diagram(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Json<ApiResponse<()>> {
    match diagram_service::delete_diagram(&state.core, &user, &id).await {
        Ok(()) => Json(ApiResponse::message(format!("Diagram {} deleted!", id))),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}
