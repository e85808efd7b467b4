mod documents;
mod projects;
mod sharing;
mod usage;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, patch, post, put},
};

use crate::server::AppState;

pub fn workspace_router() -> Router<Arc<AppState>> {
    Router::new()
        // Documents
        .route("/documents", get(documents::list_documents))
        .route("/documents", post(documents::create_document))
        .route("/documents/trash", get(documents::list_trashed_documents))
        .route("/documents/{id}", get(documents::get_document))
        .route("/documents/{id}", patch(documents::update_document))
        .route("/documents/{id}", delete(documents::purge_document))
        .route("/documents/{id}/trash", post(documents::trash_document))
        .route("/documents/{id}/restore", post(documents::restore_document))
        .route("/documents/{id}/star", put(documents::star_document))
        // Document-project membership (many-to-many)
        .route(
            "/documents/{id}/projects",
            get(documents::list_document_projects),
        )
        .route(
            "/documents/{id}/projects",
            post(documents::link_document_to_project),
        )
        .route(
            "/documents/{id}/projects/{project_id}",
            delete(documents::unlink_document_from_project),
        )
        // Document sharing
        .route("/documents/{id}/grants", get(sharing::list_document_grants))
        .route("/documents/{id}/grants", put(sharing::share_document))
        .route(
            "/documents/{id}/grants/{user_id}",
            delete(sharing::revoke_document_grant),
        )
        .route(
            "/documents/{id}/transfer",
            post(sharing::transfer_document_owner),
        )
        // Projects
        .route("/projects", get(projects::list_projects))
        .route("/projects", post(projects::create_project))
        .route("/projects/trash", get(projects::list_trashed_projects))
        .route("/projects/{id}", get(projects::get_project))
        .route("/projects/{id}", patch(projects::update_project))
        .route("/projects/{id}", delete(projects::purge_project))
        .route("/projects/{id}/trash", post(projects::trash_project))
        .route("/projects/{id}/restore", post(projects::restore_project))
        .route("/projects/{id}/star", put(projects::star_project))
        .route(
            "/projects/{id}/documents",
            get(projects::list_project_documents),
        )
        // Project sharing
        .route("/projects/{id}/grants", get(sharing::list_project_grants))
        .route("/projects/{id}/grants", put(sharing::share_project))
        .route(
            "/projects/{id}/grants/{user_id}",
            delete(sharing::revoke_project_grant),
        )
        .route(
            "/projects/{id}/transfer",
            post(sharing::transfer_project_owner),
        )
        // Storage usage
        .route("/usage", get(usage::get_storage_usage))
}
