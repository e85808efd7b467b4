use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::dto::{CreateProjectRequest, PaginationParams, StarRequest, UpdateProjectRequest};
use crate::server::response::{
    ApiError, ApiResponse, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreResultExt, paginate,
};
use crate::server::validation::validate_resource_name;

pub async fn list_projects(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let projects = state
        .store
        .list_projects_for_user(&auth.user.id, cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list projects")?;

    let (projects, next_cursor, has_more) =
        paginate(projects, DEFAULT_PAGE_SIZE as usize, |p| p.id.clone());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(projects, next_cursor, has_more)))
}

pub async fn list_trashed_projects(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> impl IntoResponse {
    let cursor = params.cursor.as_deref().unwrap_or("");

    let projects = state
        .store
        .list_trashed_projects_for_user(&auth.user.id, cursor, DEFAULT_PAGE_SIZE + 1)
        .api_err("Failed to list trashed projects")?;

    let (projects, next_cursor, has_more) =
        paginate(projects, DEFAULT_PAGE_SIZE as usize, |p| p.id.clone());

    Ok::<_, ApiError>(Json(PaginatedResponse::new(projects, next_cursor, has_more)))
}

pub async fn create_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProjectRequest>,
) -> impl IntoResponse {
    validate_resource_name(&req.name, "Project")?;

    let project = state.engine.create_project(&auth.user.id, &req.name)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(project))))
}

pub async fn get_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let project = state.engine.get_project(&auth.user.id, &id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(project)))
}

pub async fn update_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateProjectRequest>,
) -> impl IntoResponse {
    validate_resource_name(&req.name, "Project")?;

    let project = state.engine.update_project(&auth.user.id, &id, &req.name)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(project)))
}

pub async fn trash_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let project = state.engine.trash_project(&auth.user.id, &id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(project)))
}

pub async fn restore_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let project = state.engine.restore_project(&auth.user.id, &id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(project)))
}

pub async fn star_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<StarRequest>,
) -> impl IntoResponse {
    let project = state.engine.star_project(&auth.user.id, &id, req.starred)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(project)))
}

/// Hard delete. Removes the project, its grants, and its links; the
/// documents that were linked into it stay untouched.
pub async fn purge_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state.engine.purge_project(&auth.user.id, &id)?;
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn list_project_documents(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let documents = state.engine.list_project_documents(&auth.user.id, &id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(documents)))
}
