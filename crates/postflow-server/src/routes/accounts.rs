use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;
use meta_graph_client::Provider;

/// GET /api/accounts
/// Linked accounts for the current user (tokens never serialized).
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let accounts = postflow_db::accounts::list_for_user(&state.pool, user.id).await?;
    Ok(Json(json!({ "accounts": accounts })))
}

/// DELETE /api/accounts/{provider}
pub async fn unlink(
    State(state): State<AppState>,
    user: AuthUser,
    Path(provider): Path<String>,
) -> Result<Json<Value>, AppError> {
    let provider = Provider::parse(&provider)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown provider: {provider}")))?;

    let removed =
        postflow_db::accounts::delete_for_platform(&state.pool, user.id, provider.as_str()).await?;
    if !removed {
        return Err(AppError::NotFound(format!("No linked {provider} account")));
    }
    Ok(Json(json!({ "success": true })))
}
