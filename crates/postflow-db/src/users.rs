use crate::types::UserRow;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, password_hash, display_name, created_at";

/// Create a user. A duplicate email surfaces as a unique violation
/// (see [`crate::is_unique_violation`]); no partial record is left behind.
pub async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    email: &str,
    password_hash: &str,
    display_name: Option<&str>,
) -> Result<UserRow, sqlx::Error> {
    sqlx::query_as(&format!(
        r#"
        INSERT INTO users (id, email, password_hash, display_name, created_at)
        VALUES ($1, $2, $3, $4, NOW())
        RETURNING {USER_COLUMNS}
        "#,
    ))
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(display_name)
    .fetch_one(executor)
    .await
}

/// Look up a user by email (exact match, emails are stored lowercased)
pub async fn get_by_email(
    executor: impl sqlx::PgExecutor<'_>,
    email: &str,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(executor)
        .await
}

pub async fn get_by_id(
    executor: impl sqlx::PgExecutor<'_>,
    id: Uuid,
) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}
