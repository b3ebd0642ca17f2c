mod auth;
mod config;
mod error;
mod routes;
mod state;
mod validation;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use placeholder_cache::PlaceholderCache;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use config::Config;
use state::AppState;

/// Eviction sweep cadence for the placeholder cache
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Expired-session cleanup cadence
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postflow_server=info".into()),
        )
        .json()
        .init();

    let config = Config::from_env();
    info!(port = config.port, "Starting postflow-server");

    // Connect to database
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    postflow_db::migrate::migrate(&pool)
        .await
        .expect("Failed to run migrations");

    let state = AppState::from_config(&config, pool.clone());

    spawn_cache_sweeper(state.placeholders.clone());
    spawn_session_cleanup(pool);

    // CORS
    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::COOKIE, header::AUTHORIZATION])
            .allow_credentials(true)
    };

    let app = Router::new()
        // Health
        .route("/health", get(routes::health::health))
        // Auth
        .route("/api/auth/signup", post(routes::auth::signup))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/auth/logout", post(routes::auth::logout))
        .route("/api/auth/me", get(routes::auth::me))
        // OAuth account linking
        .route("/oauth/{provider}/login", get(routes::oauth::login))
        .route("/oauth/{provider}/callback", get(routes::oauth::callback))
        .route("/api/accounts", get(routes::accounts::list))
        .route("/api/accounts/{provider}", delete(routes::accounts::unlink))
        // Scheduled posts
        .route(
            "/api/posts",
            get(routes::posts::list).post(routes::posts::create),
        )
        .route(
            "/api/posts/{id}",
            get(routes::posts::get)
                .put(routes::posts::update)
                .delete(routes::posts::delete),
        )
        // Generation
        .route("/api/generate/image", post(routes::generate::image))
        .route("/api/generate/video", post(routes::generate::video_start))
        .route(
            "/api/generate/video/status",
            get(routes::generate::video_status),
        )
        // Uploads
        .route("/api/uploads/presign", post(routes::uploads::presign))
        // Cron
        .route("/api/cron/publish-due", post(routes::cron::publish_due))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("Failed to bind");

    info!(port = config.port, "Listening");

    axum::serve(listener, app).await.expect("Server failed");
}

/// Periodic eviction for the placeholder cache, owned by the runtime rather
/// than a detached timer.
fn spawn_cache_sweeper(cache: Arc<PlaceholderCache>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        interval.tick().await; // first tick fires immediately
        loop {
            interval.tick().await;
            cache.sweep();
        }
    });
}

fn spawn_session_cleanup(pool: sqlx::PgPool) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            match postflow_db::sessions::cleanup_expired(&pool).await {
                Ok(0) => {}
                Ok(n) => info!(removed = n, "Cleaned up expired sessions"),
                Err(e) => tracing::warn!(error = %e, "Session cleanup failed"),
            }
        }
    });
}
