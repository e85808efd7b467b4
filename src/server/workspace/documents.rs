use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{
    CreateDocumentRequest, DocumentResponse, LinkProjectRequest, PaginationParams, StarRequest,
    UpdateDocumentRequest,
};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreResultExt, paginate,
};
use crate::server::validation::validate_resource_name;

pub async fn list_documents(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let docs = state
        .store
        .list_documents_for_user(&auth.user.id, cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list documents")?;

    let (docs, next_cursor, has_more) =
        paginate(docs, DEFAULT_PAGE_SIZE as usize, |d| d.id.clone());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(docs, next_cursor, has_more)))
}

pub async fn list_trashed_documents(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let docs = state
        .store
        .list_trashed_documents_for_user(&auth.user.id, cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list trashed documents")?;

    let (docs, next_cursor, has_more) =
        paginate(docs, DEFAULT_PAGE_SIZE as usize, |d| d.id.clone());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(docs, next_cursor, has_more)))
}

pub async fn create_document(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDocumentRequest>,
) -> impl IntoResponse {
    validate_resource_name(&req.name, "Document")?;

    let document = state.engine.create_document(
        &auth.user.id,
        &req.name,
        &req.content,
        req.project_id.as_deref(),
    )?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(ApiResponse::success(DocumentResponse {
            document,
            content: req.content,
        })),
    ))
}

pub async fn get_document(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let (document, content) = state.engine.get_document(&auth.user.id, &id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(DocumentResponse {
        document,
        content,
    })))
}

pub async fn update_document(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateDocumentRequest>,
) -> impl IntoResponse {
    if let Some(ref name) = req.name {
        validate_resource_name(name, "Document")?;
    }

    let document = state.engine.update_document(
        &auth.user.id,
        &id,
        req.name.as_deref(),
        req.content.as_deref(),
    )?;

    Ok::<_, ApiError>(Json(ApiResponse::success(document)))
}

pub async fn trash_document(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let document = state.engine.trash_document(&auth.user.id, &id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(document)))
}

pub async fn restore_document(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let document = state.engine.restore_document(&auth.user.id, &id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(document)))
}

pub async fn star_document(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<StarRequest>,
) -> impl IntoResponse {
    let document = state.engine.star_document(&auth.user.id, &id, req.starred)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(document)))
}

/// Hard delete. The document must already be in the trash.
pub async fn purge_document(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state.engine.purge_document(&auth.user.id, &id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn list_document_projects(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let projects = state.engine.list_document_projects(&auth.user.id, &id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(projects)))
}

pub async fn link_document_to_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<LinkProjectRequest>,
) -> impl IntoResponse {
    state
        .engine
        .link_document(&auth.user.id, &id, &req.project_id)?;

    let projects = state.engine.list_document_projects(&auth.user.id, &id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(projects)))
}

pub async fn unlink_document_from_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path((id, project_id)): Path<(String, String)>,
) -> impl IntoResponse {
    state
        .engine
        .unlink_document(&auth.user.id, &id, &project_id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
