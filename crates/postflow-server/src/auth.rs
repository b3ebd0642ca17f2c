use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use sqlx::postgres::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session_token";

/// Session lifetime: 14 days
pub const SESSION_TTL_SECS: i64 = 14 * 24 * 60 * 60;

/// User information extracted from a valid session
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
}

/// Axum extractor that validates the session cookie and returns an [`AuthUser`].
///
/// Use this as a handler parameter to require authentication:
///
/// ```ignore
/// async fn my_handler(user: AuthUser, ...) -> Result<..., AppError> { ... }
/// ```
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Unauthorized)?;
        require_auth(&state.pool, &cookies)
            .await
            .map_err(|_| AppError::Unauthorized)
    }
}

/// Extract the session token from the cookie jar (optional-auth reads)
pub fn session_token(cookies: &CookieJar) -> Option<String> {
    cookies.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

/// Validate the session against the database and load its user
pub async fn require_auth(pool: &PgPool, cookies: &CookieJar) -> Result<AuthUser, ()> {
    let token = session_token(cookies).ok_or(())?;

    let session = postflow_db::sessions::get_valid(pool, &token)
        .await
        .ok()
        .flatten()
        .ok_or(())?;

    let user = postflow_db::users::get_by_id(pool, session.user_id)
        .await
        .ok()
        .flatten()
        .ok_or(())?;

    Ok(AuthUser {
        id: user.id,
        email: user.email,
        display_name: user.display_name,
    })
}

/// Set-Cookie value establishing a session
pub fn session_cookie(token: &str) -> String {
    format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}",
        SESSION_COOKIE, token, SESSION_TTL_SECS,
    )
}

/// Set-Cookie value clearing the session
pub fn clear_session_cookie() -> String {
    format!("{}=; HttpOnly; Path=/; Max-Age=0", SESSION_COOKIE)
}
