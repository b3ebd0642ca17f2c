use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Presigned URLs stay valid for 15 minutes
const UPLOAD_URL_TTL_SECS: u64 = 900;

const ALLOWED_CONTENT_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
    ("video/mp4", "mp4"),
];

#[derive(Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct PresignRequest {
    content_type: String,
}

/// POST /api/uploads/presign
/// Step one of the upload handoff: the client PUTs the file to `uploadUrl`
/// itself, then references `publicUrl` when scheduling the post.
pub async fn presign(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<PresignRequest>,
) -> Result<Json<Value>, AppError> {
    let ext = extension_for(&body.content_type).ok_or_else(|| {
        AppError::BadRequest(format!("Unsupported content type: {}", body.content_type))
    })?;

    let key = format!("uploads/{}/{}.{}", user.id, Uuid::new_v4().simple(), ext);
    let upload_url = state
        .presigner
        .presign_put(&key, &body.content_type, UPLOAD_URL_TTL_SECS);
    let public_url = state.presigner.public_url(&key);

    info!(user_id = %user.id, key = %key, "Issued upload URL");
    Ok(Json(json!({
        "uploadUrl": upload_url,
        "publicUrl": public_url,
        "key": key,
    })))
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    ALLOWED_CONTENT_TYPES
        .iter()
        .find(|(ct, _)| *ct == content_type)
        .map(|(_, ext)| *ext)
}
