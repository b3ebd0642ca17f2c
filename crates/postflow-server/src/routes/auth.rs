use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::CookieJar;
use rand::rngs::OsRng;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use crate::auth::{self, clear_session_cookie, session_cookie, AuthUser, SESSION_TTL_SECS};
use crate::error::AppError;
use crate::state::AppState;
use crate::validation::{validate_email, validate_string_length};

#[derive(Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SignupRequest {
    email: String,
    password: String,
    #[ts(optional)]
    display_name: Option<String>,
}

#[derive(Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// POST /api/auth/signup
/// Creates a user, opens a session, and sets the session cookie.
/// A duplicate email returns 409 and leaves no new record behind.
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> Result<Response, AppError> {
    let email = body.email.trim().to_lowercase();
    validate_email(&email)?;
    validate_string_length(&body.password, 8, 128, "password")?;
    if let Some(name) = &body.display_name {
        validate_string_length(name, 1, 80, "displayName")?;
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(body.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))?
        .to_string();

    let user = postflow_db::users::create(
        &state.pool,
        &email,
        &password_hash,
        body.display_name.as_deref(),
    )
    .await
    .map_err(|e| {
        if postflow_db::is_unique_violation(&e) {
            AppError::Conflict("An account with this email already exists".into())
        } else {
            AppError::Database(e)
        }
    })?;

    info!(user_id = %user.id, "User signed up");

    let token = new_session_token();
    postflow_db::sessions::create(&state.pool, &token, user.id, SESSION_TTL_SECS).await?;

    Ok((
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(json!({ "user": user })),
    )
        .into_response())
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let email = body.email.trim().to_lowercase();

    let user = postflow_db::users::get_by_email(&state.pool, &email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let parsed = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(format!("Stored hash unreadable: {e}")))?;
    if Argon2::default()
        .verify_password(body.password.as_bytes(), &parsed)
        .is_err()
    {
        return Err(AppError::Unauthorized);
    }

    let token = new_session_token();
    postflow_db::sessions::create(&state.pool, &token, user.id, SESSION_TTL_SECS).await?;

    info!(user_id = %user.id, "User logged in");

    Ok((
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(json!({ "user": user })),
    )
        .into_response())
}

/// POST /api/auth/logout
/// Clears the session cookie and returns { success: true }.
pub async fn logout(State(state): State<AppState>, cookies: CookieJar) -> Response {
    if let Some(token) = auth::session_token(&cookies) {
        if let Err(e) = postflow_db::sessions::delete(&state.pool, &token).await {
            tracing::warn!(error = %e, "Failed to delete session on logout");
        }
    }

    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(json!({ "success": true })),
    )
        .into_response()
}

/// GET /api/auth/me
/// Returns { user: { id, email, displayName } } or { user: null }.
pub async fn me(State(state): State<AppState>, cookies: CookieJar) -> Json<Value> {
    match auth::require_auth(&state.pool, &cookies).await {
        Ok(AuthUser {
            id,
            email,
            display_name,
        }) => Json(json!({
            "user": { "id": id, "email": email, "displayName": display_name }
        })),
        Err(()) => Json(json!({ "user": null })),
    }
}

fn new_session_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}
