use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse};

pub async fn get_storage_usage(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let usage = state.engine.storage_usage(&auth.user.id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(usage)))
}
