use axum::extract::{Query, State};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use op_store::{JobStatus, OpRecord};
use placeholder_cache::{PlaceholderCache, ERROR_KEY};

#[derive(Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GenerateImageRequest {
    prompt: String,
}

/// POST /api/generate/image
/// Returns a self-contained placeholder image for the prompt, memoized by
/// the prompt's leading characters. Blank prompts get the shared error
/// placeholder.
pub async fn image(
    State(state): State<AppState>,
    Json(body): Json<GenerateImageRequest>,
) -> Json<Value> {
    let prompt = body.prompt.trim().to_string();

    let image_url = if prompt.is_empty() {
        state
            .placeholders
            .get_or_insert_with(ERROR_KEY, || to_data_uri(&render_error_svg()))
    } else {
        let key = PlaceholderCache::cache_key(&prompt);
        state
            .placeholders
            .get_or_insert_with(&key, || to_data_uri(&render_placeholder_svg(&prompt)))
    };

    Json(json!({ "imageUrl": image_url }))
}

#[derive(Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GenerateVideoRequest {
    prompt: String,
}

/// POST /api/generate/video
/// Starts a mock video generation job and returns its operation id.
pub async fn video_start(
    State(state): State<AppState>,
    Json(body): Json<GenerateVideoRequest>,
) -> Result<Json<Value>, AppError> {
    let prompt = body.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(AppError::BadRequest("prompt is required".into()));
    }

    let id = format!("op_{}", Uuid::new_v4().simple());
    state.ops.insert(OpRecord {
        id: id.clone(),
        prompt,
        started_at: Utc::now(),
    });

    info!(operation_id = %id, "Started video generation");
    Ok(Json(json!({ "operationId": id })))
}

#[derive(Deserialize)]
pub struct StatusParams {
    id: Option<String>,
}

/// GET /api/generate/video/status?id=op_...
/// `{ done: false }` while pending; `{ done: true, videoUrl }` once the
/// completion policy fires. The completing poll removes the operation, so
/// any later poll for the same id is a 404.
pub async fn video_status(
    State(state): State<AppState>,
    Query(params): Query<StatusParams>,
) -> Result<Json<Value>, AppError> {
    let id = params
        .id
        .ok_or_else(|| AppError::BadRequest("id is required".into()))?;

    match state.ops.poll(&id, &*state.completion, Utc::now()) {
        JobStatus::NotFound => Err(AppError::NotFound("Unknown operation".into())),
        JobStatus::Pending => Ok(Json(json!({ "done": false }))),
        JobStatus::Done { video_url } => Ok(Json(json!({ "done": true, "videoUrl": video_url }))),
    }
}

fn render_placeholder_svg(prompt: &str) -> String {
    let hue = prompt
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_add(b as u32))
        % 360;
    let label: String = prompt.chars().take(64).collect();
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="1024" height="1024" viewBox="0 0 1024 1024"><rect width="1024" height="1024" fill="hsl({hue}, 45%, 82%)"/><rect x="32" y="32" width="960" height="960" fill="none" stroke="hsl({hue}, 40%, 55%)" stroke-width="4" rx="24"/><text x="512" y="512" font-family="sans-serif" font-size="40" fill="hsl({hue}, 45%, 28%)" text-anchor="middle">{}</text></svg>"#,
        xml_escape(&label),
    )
}

fn render_error_svg() -> String {
    r##"<svg xmlns="http://www.w3.org/2000/svg" width="1024" height="1024" viewBox="0 0 1024 1024"><rect width="1024" height="1024" fill="#e5e7eb"/><text x="512" y="512" font-family="sans-serif" font-size="48" fill="#6b7280" text-anchor="middle">image unavailable</text></svg>"##.to_string()
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn to_data_uri(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", BASE64.encode(svg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::{get, post};
    use axum::Router;
    use chrono::Duration;
    use meta_graph_client::{MetaGraphClient, OAuthApp};
    use op_store::{ElapsedThreshold, OpStore};
    use s3_presign::{Presigner, PresignerConfig};
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tower::ServiceExt;

    const TEST_VIDEO_URL: &str = "https://static.postflow.dev/demo/generated-video.mp4";

    fn test_state(complete_after_secs: i64) -> AppState {
        // Lazy pool: these routes never touch the database
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/postflow_test")
            .unwrap();

        AppState {
            pool,
            ops: Arc::new(OpStore::new()),
            completion: Arc::new(ElapsedThreshold::new(
                Duration::seconds(complete_after_secs),
                TEST_VIDEO_URL,
            )),
            placeholders: Arc::new(PlaceholderCache::new()),
            meta: Arc::new(MetaGraphClient::new(OAuthApp {
                app_id: "app".into(),
                app_secret: "secret".into(),
                redirect_base: "http://localhost:3000".into(),
            })),
            presigner: Arc::new(Presigner::new(PresignerConfig {
                endpoint: "http://localhost:9000".into(),
                bucket: "test".into(),
                region: "auto".into(),
                access_key_id: "ak".into(),
                secret_access_key: "sk".into(),
                public_base_url: "http://localhost:9000/test".into(),
            })),
            cron_secret: "test-secret".into(),
            started_at: Utc::now(),
        }
    }

    fn router(state: AppState) -> Router {
        Router::new()
            .route("/api/generate/image", post(image))
            .route("/api/generate/video", post(video_start))
            .route("/api/generate/video/status", get(video_status))
            .with_state(state)
    }

    async fn post_json(router: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(router: &Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_video_flow_start_pending() {
        let app = router(test_state(35));

        let (status, body) = post_json(&app, "/api/generate/video", r#"{"prompt":"x"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let id = body["operationId"].as_str().unwrap().to_string();
        assert!(id.starts_with("op_"));

        // Immediately polling is still pending
        let (status, body) = get_json(&app, &format!("/api/generate/video/status?id={id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["done"], false);
        assert!(body.get("videoUrl").is_none());
    }

    #[tokio::test]
    async fn test_video_flow_completes_then_404() {
        // Zero threshold: the first status poll observes completion
        let app = router(test_state(0));

        let (_, body) = post_json(&app, "/api/generate/video", r#"{"prompt":"x"}"#).await;
        let id = body["operationId"].as_str().unwrap().to_string();

        let (status, body) = get_json(&app, &format!("/api/generate/video/status?id={id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["done"], true);
        assert_eq!(body["videoUrl"], TEST_VIDEO_URL);

        // The completing poll consumed the record
        let (status, _) = get_json(&app, &format!("/api/generate/video/status?id={id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_video_status_unknown_id() {
        let app = router(test_state(35));
        let (status, _) = get_json(&app, "/api/generate/video/status?id=op_nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_video_status_missing_id() {
        let app = router(test_state(35));
        let (status, _) = get_json(&app, "/api/generate/video/status").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_video_start_requires_prompt() {
        let app = router(test_state(35));
        let (status, _) = post_json(&app, "/api/generate/video", r#"{"prompt":"  "}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_image_is_memoized() {
        let state = test_state(35);
        let app = router(state.clone());

        let (status, first) =
            post_json(&app, "/api/generate/image", r#"{"prompt":"a red fox"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let (_, second) = post_json(&app, "/api/generate/image", r#"{"prompt":"a red fox"}"#).await;

        assert_eq!(first["imageUrl"], second["imageUrl"]);
        assert!(first["imageUrl"]
            .as_str()
            .unwrap()
            .starts_with("data:image/svg+xml;base64,"));
        assert_eq!(state.placeholders.len(), 1);
        assert!(state.placeholders.stats().hits >= 1);
    }

    #[tokio::test]
    async fn test_image_prompts_sharing_prefix_collide() {
        let state = test_state(35);
        let app = router(state.clone());

        let prefix = "b".repeat(50);
        let a = format!(r#"{{"prompt":"{prefix} sunset"}}"#);
        let b = format!(r#"{{"prompt":"{prefix} bicycle"}}"#);

        let (_, first) = post_json(&app, "/api/generate/image", &a).await;
        let (_, second) = post_json(&app, "/api/generate/image", &b).await;

        // Truncated keys collide: the second prompt reuses the first image
        assert_eq!(first["imageUrl"], second["imageUrl"]);
        assert_eq!(state.placeholders.len(), 1);
    }

    #[tokio::test]
    async fn test_image_blank_prompt_uses_error_sentinel() {
        let state = test_state(35);
        let app = router(state.clone());

        let (status, body) = post_json(&app, "/api/generate/image", r#"{"prompt":"  "}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["imageUrl"].as_str().unwrap().starts_with("data:image"));
        assert!(state.placeholders.get(ERROR_KEY).is_some());
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
