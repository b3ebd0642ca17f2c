use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;
use meta_graph_client::Provider;
use postflow_db::accounts::UpsertAccountParams;

const STATE_COOKIE: &str = "oauth_state";

fn parse_provider(raw: &str) -> Result<Provider, AppError> {
    Provider::parse(raw)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown provider: {raw}")))
}

/// GET /oauth/{provider}/login
/// Returns JSON { url: "..." } for the frontend to redirect to, and plants
/// a short-lived state cookie checked again at the callback.
pub async fn login(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(provider): Path<String>,
) -> Result<Response, AppError> {
    let provider = parse_provider(&provider)?;

    let csrf_state = Uuid::new_v4().simple().to_string();
    let url = state.meta.authorize_url(provider, &csrf_state);

    info!(provider = %provider, "OAuth link initiated");

    let cookie = format!(
        "{}={}; HttpOnly; Path=/oauth; Max-Age=600",
        STATE_COOKIE, csrf_state,
    );
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "url": url })),
    )
        .into_response())
}

#[derive(Deserialize)]
pub struct CallbackParams {
    code: String,
    state: Option<String>,
}

/// GET /oauth/{provider}/callback?code=...&state=...
/// Exchanges the code, upserts the linked account, and redirects to
/// /settings.
pub async fn callback(
    State(state): State<AppState>,
    user: AuthUser,
    cookies: CookieJar,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AppError> {
    let provider = parse_provider(&provider)?;

    let expected = cookies.get(STATE_COOKIE).map(|c| c.value().to_string());
    if expected.is_none() || expected != params.state {
        return Err(AppError::BadRequest("OAuth state mismatch".into()));
    }

    let token = state
        .meta
        .exchange_code(provider, &params.code)
        .await
        .map_err(|e| {
            error!(provider = %provider, error = %e, "OAuth code exchange failed");
            AppError::Internal(e.to_string())
        })?;

    let expires_at = token
        .expires_in
        .map(|secs| chrono::Utc::now() + chrono::Duration::seconds(secs));

    let account = postflow_db::accounts::upsert(
        &state.pool,
        &UpsertAccountParams {
            user_id: user.id,
            provider: provider.as_str().to_string(),
            provider_account_id: token.provider_user_id,
            access_token: token.access_token,
            refresh_token: None,
            expires_at,
            scope: token.scope,
        },
    )
    .await?;

    info!(
        provider = %provider,
        account_id = %account.provider_account_id,
        "Linked platform account"
    );

    let clear_state = format!("{}=; HttpOnly; Path=/oauth; Max-Age=0", STATE_COOKIE);
    Ok((
        [(header::SET_COOKIE, clear_state)],
        Redirect::to(&format!("/settings?linked={}", provider.as_str())),
    )
        .into_response())
}
