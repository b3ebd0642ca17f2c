use crate::types::{PostStatus, ScheduledPostRow};
use chrono::{DateTime, Utc};
use uuid::Uuid;

const POST_COLUMNS: &str = "id, user_id, platform, caption, image_url, affiliate_link, \
                            scheduled_at, status, platform_post_id, error_message, \
                            published_at, created_at";

pub struct CreatePostParams {
    pub user_id: Uuid,
    pub platform: String,
    pub caption: String,
    pub image_url: Option<String>,
    pub affiliate_link: Option<String>,
    pub scheduled_at: DateTime<Utc>,
}

pub async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    p: &CreatePostParams,
) -> Result<ScheduledPostRow, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        INSERT INTO scheduled_posts
            (id, user_id, platform, caption, image_url, affiliate_link,
             scheduled_at, status, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
        RETURNING {POST_COLUMNS}
        "#,
    ))
    .bind(Uuid::new_v4())
    .bind(p.user_id)
    .bind(&p.platform)
    .bind(&p.caption)
    .bind(&p.image_url)
    .bind(&p.affiliate_link)
    .bind(p.scheduled_at)
    .bind(PostStatus::Scheduled.as_str())
    .fetch_one(executor)
    .await
}

/// A user's posts, soonest scheduled first
pub async fn list_for_user(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: Uuid,
) -> Result<Vec<ScheduledPostRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {POST_COLUMNS} FROM scheduled_posts WHERE user_id = $1 ORDER BY scheduled_at",
    ))
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Fetch a post only if `user_id` owns it
pub async fn get_owned(
    executor: impl sqlx::PgExecutor<'_>,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<ScheduledPostRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {POST_COLUMNS} FROM scheduled_posts WHERE id = $1 AND user_id = $2",
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub struct UpdatePostParams {
    pub caption: Option<String>,
    pub image_url: Option<String>,
    pub affiliate_link: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// Update the editable fields of an owned, still-scheduled post.
/// Absent fields keep their current values.
pub async fn update_owned(
    executor: impl sqlx::PgExecutor<'_>,
    id: Uuid,
    user_id: Uuid,
    p: &UpdatePostParams,
) -> Result<Option<ScheduledPostRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        UPDATE scheduled_posts SET
            caption = COALESCE($3, caption),
            image_url = COALESCE($4, image_url),
            affiliate_link = COALESCE($5, affiliate_link),
            scheduled_at = COALESCE($6, scheduled_at)
        WHERE id = $1 AND user_id = $2 AND status = 'scheduled'
        RETURNING {POST_COLUMNS}
        "#,
    ))
    .bind(id)
    .bind(user_id)
    .bind(&p.caption)
    .bind(&p.image_url)
    .bind(&p.affiliate_link)
    .bind(p.scheduled_at)
    .fetch_optional(executor)
    .await
}

/// Delete an owned post; returns whether a row was removed
pub async fn delete_owned(
    executor: impl sqlx::PgExecutor<'_>,
    id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM scheduled_posts WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Posts due for publishing: still scheduled, with a publish time at or
/// before `now`. Oldest first so a partial pass drains the backlog in order.
pub async fn list_due(
    executor: impl sqlx::PgExecutor<'_>,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<ScheduledPostRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        SELECT {POST_COLUMNS} FROM scheduled_posts
        WHERE status = 'scheduled' AND scheduled_at <= $1
        ORDER BY scheduled_at
        LIMIT $2
        "#,
    ))
    .bind(now)
    .bind(limit)
    .fetch_all(executor)
    .await
}

pub async fn mark_published(
    executor: impl sqlx::PgExecutor<'_>,
    id: Uuid,
    platform_post_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE scheduled_posts
        SET status = 'published', platform_post_id = $2, error_message = NULL, published_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(platform_post_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn mark_failed(
    executor: impl sqlx::PgExecutor<'_>,
    id: Uuid,
    error_message: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE scheduled_posts SET status = 'failed', error_message = $2 WHERE id = $1")
        .bind(id)
        .bind(error_message)
        .execute(executor)
        .await?;
    Ok(())
}
