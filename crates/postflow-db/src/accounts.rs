use crate::types::LinkedAccountRow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

const ACCOUNT_COLUMNS: &str = "id, user_id, provider, provider_account_id, access_token, \
                               refresh_token, expires_at, scope, created_at";

pub struct UpsertAccountParams {
    pub user_id: Uuid,
    pub provider: String,
    pub provider_account_id: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub scope: Option<String>,
}

/// Insert a linked account, or refresh its tokens if the
/// (provider, provider_account_id) pair is already linked.
pub async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    p: &UpsertAccountParams,
) -> Result<LinkedAccountRow, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        INSERT INTO linked_accounts
            (id, user_id, provider, provider_account_id, access_token,
             refresh_token, expires_at, scope, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
        ON CONFLICT (provider, provider_account_id) DO UPDATE SET
            user_id = $2,
            access_token = $5,
            refresh_token = $6,
            expires_at = $7,
            scope = $8
        RETURNING {ACCOUNT_COLUMNS}
        "#,
    ))
    .bind(Uuid::new_v4())
    .bind(p.user_id)
    .bind(&p.provider)
    .bind(&p.provider_account_id)
    .bind(&p.access_token)
    .bind(&p.refresh_token)
    .bind(p.expires_at)
    .bind(&p.scope)
    .fetch_one(executor)
    .await
}

/// All accounts a user has linked
pub async fn list_for_user(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: Uuid,
) -> Result<Vec<LinkedAccountRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM linked_accounts WHERE user_id = $1 ORDER BY created_at",
    ))
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// The account a user has linked for one platform, if any
pub async fn get_for_platform(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: Uuid,
    provider: &str,
) -> Result<Option<LinkedAccountRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM linked_accounts WHERE user_id = $1 AND provider = $2",
    ))
    .bind(user_id)
    .bind(provider)
    .fetch_optional(executor)
    .await
}

/// Unlink a platform account; returns whether a row was removed
pub async fn delete_for_platform(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: Uuid,
    provider: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM linked_accounts WHERE user_id = $1 AND provider = $2")
        .bind(user_id)
        .bind(provider)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
