use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{GrantResponse, ShareRequest, TransferOwnerRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::types::{ResourceKind, Role};

pub async fn list_document_grants(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state
        .store
        .get_document(&id)
        .api_err("Failed to get document")?
        .or_not_found("Document not found")?;

    let role = state.engine.document_role(&auth.user.id, &id)?;
    if !role.allows(Role::Viewer) {
        return Err(ApiError::forbidden("Insufficient document permissions"));
    }

    let grants = state
        .store
        .list_document_grants(&id)
        .api_err("Failed to list grants")?;

    let grants: Vec<GrantResponse> = grants
        .into_iter()
        .map(|g| GrantResponse {
            user_id: g.user_id,
            role: g.role,
        })
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(grants)))
}

pub async fn share_document(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ShareRequest>,
) -> impl IntoResponse {
    state.engine.share(
        &auth.user.id,
        ResourceKind::Document,
        &id,
        &req.user_id,
        req.role,
    )?;

    Ok::<_, ApiError>(Json(ApiResponse::success(GrantResponse {
        user_id: req.user_id,
        role: req.role,
    })))
}

pub async fn revoke_document_grant(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path((id, user_id)): Path<(String, String)>,
) -> impl IntoResponse {
    state
        .engine
        .revoke(&auth.user.id, ResourceKind::Document, &id, &user_id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn transfer_document_owner(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TransferOwnerRequest>,
) -> impl IntoResponse {
    state
        .engine
        .transfer_owner(&auth.user.id, ResourceKind::Document, &id, &req.user_id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn list_project_grants(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state
        .store
        .get_project(&id)
        .api_err("Failed to get project")?
        .or_not_found("Project not found")?;

    let role = state.engine.project_role(&auth.user.id, &id)?;
    if !role.allows(Role::Viewer) {
        return Err(ApiError::forbidden("Insufficient project permissions"));
    }

    let grants = state
        .store
        .list_project_grants(&id)
        .api_err("Failed to list grants")?;

    let grants: Vec<GrantResponse> = grants
        .into_iter()
        .map(|g| GrantResponse {
            user_id: g.user_id,
            role: g.role,
        })
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(grants)))
}

pub async fn share_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ShareRequest>,
) -> impl IntoResponse {
    state.engine.share(
        &auth.user.id,
        ResourceKind::Project,
        &id,
        &req.user_id,
        req.role,
    )?;

    Ok::<_, ApiError>(Json(ApiResponse::success(GrantResponse {
        user_id: req.user_id,
        role: req.role,
    })))
}

pub async fn revoke_project_grant(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path((id, user_id)): Path<(String, String)>,
) -> impl IntoResponse {
    state
        .engine
        .revoke(&auth.user.id, ResourceKind::Project, &id, &user_id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn transfer_project_owner(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TransferOwnerRequest>,
) -> impl IntoResponse {
    state
        .engine
        .transfer_owner(&auth.user.id, ResourceKind::Project, &id, &req.user_id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
