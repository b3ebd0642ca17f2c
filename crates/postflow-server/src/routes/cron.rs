use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::state::AppState;
use meta_graph_client::Provider;
use postflow_db::ScheduledPostRow;

const CRON_SECRET_HEADER: &str = "x-cron-secret";

/// How many due posts one pass picks up
const PUBLISH_BATCH_SIZE: i64 = 20;

/// POST /api/cron/publish-due
/// Invoked by the hosting platform's scheduler. Publishes every due post
/// through its owner's linked account; a post that fails is marked failed
/// and left for the operator, never retried automatically.
pub async fn publish_due(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let presented = headers
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    if presented != Some(state.cron_secret.as_str()) {
        return Err(AppError::Unauthorized);
    }

    let due = postflow_db::posts::list_due(&state.pool, Utc::now(), PUBLISH_BATCH_SIZE).await?;
    info!(count = due.len(), "Publishing due posts");

    let mut published = 0u32;
    let mut failed = 0u32;

    for post in due {
        match publish_one(&state, &post).await {
            Ok(platform_post_id) => {
                postflow_db::posts::mark_published(&state.pool, post.id, &platform_post_id)
                    .await?;
                published += 1;
            }
            Err(message) => {
                warn!(post_id = %post.id, error = %message, "Publish failed");
                postflow_db::posts::mark_failed(&state.pool, post.id, &message).await?;
                failed += 1;
            }
        }
    }

    Ok(Json(json!({ "published": published, "failed": failed })))
}

async fn publish_one(state: &AppState, post: &ScheduledPostRow) -> Result<String, String> {
    let provider = Provider::parse(&post.platform)
        .ok_or_else(|| format!("Unknown platform: {}", post.platform))?;

    let account =
        postflow_db::accounts::get_for_platform(&state.pool, post.user_id, provider.as_str())
            .await
            .map_err(|e| {
                error!(error = %e, "Account lookup failed");
                "Account lookup failed".to_string()
            })?
            .ok_or_else(|| format!("No linked {provider} account"))?;

    let image_url = post
        .image_url
        .as_deref()
        .ok_or_else(|| "Post has no image".to_string())?;

    let caption = assemble_caption(&post.caption, post.affiliate_link.as_deref());

    state
        .meta
        .publish(
            provider,
            &account.access_token,
            &account.provider_account_id,
            &caption,
            image_url,
        )
        .await
        .map_err(|e| e.to_string())
}

/// Affiliate links ride along at the end of the caption
fn assemble_caption(caption: &str, affiliate_link: Option<&str>) -> String {
    match affiliate_link {
        Some(link) if !link.is_empty() => format!("{}\n\n{}", caption, link),
        _ => caption.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_caption_with_affiliate_link() {
        let assembled =
            assemble_caption("New arrivals are live", Some("https://shop.example.com/ref/42"));
        assert_eq!(
            assembled,
            "New arrivals are live\n\nhttps://shop.example.com/ref/42"
        );
    }

    #[test]
    fn test_assemble_caption_without_link() {
        assert_eq!(assemble_caption("caption", None), "caption");
        assert_eq!(assemble_caption("caption", Some("")), "caption");
    }
}
