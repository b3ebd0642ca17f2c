use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;
use meta_graph_client::Provider;
use postflow_db::posts::{CreatePostParams, UpdatePostParams};
use postflow_db::{PostStatus, ScheduledPostRow};

/// Platform caption limit (Threads is the tighter of the two)
const MAX_CAPTION_CHARS: usize = 2200;

#[derive(Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CreatePostRequest {
    platform: String,
    caption: String,
    #[ts(optional)]
    image_url: Option<String>,
    #[ts(optional)]
    affiliate_link: Option<String>,
    scheduled_at: DateTime<Utc>,
}

#[derive(Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct UpdatePostRequest {
    #[ts(optional)]
    caption: Option<String>,
    #[ts(optional)]
    image_url: Option<String>,
    #[ts(optional)]
    affiliate_link: Option<String>,
    #[ts(optional)]
    scheduled_at: Option<DateTime<Utc>>,
}

fn validate_caption(caption: &str) -> Result<(), AppError> {
    if caption.trim().is_empty() || caption.chars().count() > MAX_CAPTION_CHARS {
        return Err(AppError::BadRequest(format!(
            "caption must be 1-{MAX_CAPTION_CHARS} characters"
        )));
    }
    Ok(())
}

/// POST /api/posts
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreatePostRequest>,
) -> Result<Json<ScheduledPostRow>, AppError> {
    let platform = Provider::parse(&body.platform)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown platform: {}", body.platform)))?;
    validate_caption(&body.caption)?;

    let post = postflow_db::posts::create(
        &state.pool,
        &CreatePostParams {
            user_id: user.id,
            platform: platform.as_str().to_string(),
            caption: body.caption,
            image_url: body.image_url,
            affiliate_link: body.affiliate_link,
            scheduled_at: body.scheduled_at,
        },
    )
    .await?;

    info!(post_id = %post.id, platform = %platform, "Scheduled post");
    Ok(Json(post))
}

/// GET /api/posts
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, AppError> {
    let posts = postflow_db::posts::list_for_user(&state.pool, user.id).await?;
    Ok(Json(json!({ "posts": posts })))
}

/// GET /api/posts/{id}
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ScheduledPostRow>, AppError> {
    postflow_db::posts::get_owned(&state.pool, id, user.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Post not found".into()))
}

/// PUT /api/posts/{id}
/// Only still-scheduled posts can be edited.
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdatePostRequest>,
) -> Result<Json<ScheduledPostRow>, AppError> {
    if let Some(caption) = &body.caption {
        validate_caption(caption)?;
    }

    let existing = postflow_db::posts::get_owned(&state.pool, id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))?;
    if existing.status != PostStatus::Scheduled.as_str() {
        return Err(AppError::BadRequest(
            "Only scheduled posts can be edited".into(),
        ));
    }

    let updated = postflow_db::posts::update_owned(
        &state.pool,
        id,
        user.id,
        &UpdatePostParams {
            caption: body.caption,
            image_url: body.image_url,
            affiliate_link: body.affiliate_link,
            scheduled_at: body.scheduled_at,
        },
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Post not found".into()))?;

    Ok(Json(updated))
}

/// DELETE /api/posts/{id}
pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let removed = postflow_db::posts::delete_owned(&state.pool, id, user.id).await?;
    if !removed {
        return Err(AppError::NotFound("Post not found".into()));
    }
    info!(post_id = %id, "Deleted scheduled post");
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_caption() {
        assert!(validate_caption("hello").is_ok());
        assert!(validate_caption("   ").is_err());
        assert!(validate_caption(&"x".repeat(MAX_CAPTION_CHARS + 1)).is_err());
        assert!(validate_caption(&"x".repeat(MAX_CAPTION_CHARS)).is_ok());
    }
}
