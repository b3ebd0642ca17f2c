use crate::types::SessionRow;
use uuid::Uuid;

/// Create a session with an absolute expiry
pub async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    token: &str,
    user_id: Uuid,
    ttl_secs: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO sessions (token, user_id, expires_at, created_at)
        VALUES ($1, $2, NOW() + ($3 || ' seconds')::interval, NOW())
        "#,
    )
    .bind(token)
    .bind(user_id)
    .bind(ttl_secs.to_string())
    .execute(executor)
    .await?;
    Ok(())
}

/// Get a session by token, only if not expired
pub async fn get_valid(
    executor: impl sqlx::PgExecutor<'_>,
    token: &str,
) -> Result<Option<SessionRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT token, user_id, expires_at, created_at FROM sessions WHERE token = $1 AND expires_at > NOW()",
    )
    .bind(token)
    .fetch_optional(executor)
    .await
}

/// Delete a session (logout); deleting an unknown token is a no-op
pub async fn delete(
    executor: impl sqlx::PgExecutor<'_>,
    token: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(executor)
        .await?;
    Ok(())
}

/// Clean up expired sessions
pub async fn cleanup_expired(executor: impl sqlx::PgExecutor<'_>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at < NOW()")
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
