use chrono::{DateTime, Duration, Utc};
use meta_graph_client::{MetaGraphClient, OAuthApp};
use op_store::{CompletionPolicy, ElapsedThreshold, OpStore};
use placeholder_cache::PlaceholderCache;
use s3_presign::{Presigner, PresignerConfig};
use sqlx::postgres::PgPool;
use std::sync::Arc;

use crate::config::Config;

/// Shared application state passed to all route handlers.
///
/// Every store lives here as an explicit field constructed once at startup;
/// handlers receive it by reference instead of reaching for module-level
/// globals.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub ops: Arc<OpStore>,
    pub completion: Arc<dyn CompletionPolicy>,
    pub placeholders: Arc<PlaceholderCache>,
    pub meta: Arc<MetaGraphClient>,
    pub presigner: Arc<Presigner>,
    pub cron_secret: String,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn from_config(config: &Config, pool: PgPool) -> Self {
        let redirect_base = config
            .public_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", config.port));

        let meta = MetaGraphClient::new(OAuthApp {
            app_id: config.meta_app_id.clone(),
            app_secret: config.meta_app_secret.clone(),
            redirect_base,
        });

        let presigner = Presigner::new(PresignerConfig {
            endpoint: config.storage_endpoint.clone(),
            bucket: config.storage_bucket.clone(),
            region: config.storage_region.clone(),
            access_key_id: config.storage_access_key_id.clone(),
            secret_access_key: config.storage_secret_access_key.clone(),
            public_base_url: config.storage_public_base_url.clone(),
        });

        let completion = ElapsedThreshold::new(
            Duration::seconds(config.video_complete_after_secs),
            config.video_result_url.clone(),
        );

        Self {
            pool,
            ops: Arc::new(OpStore::new()),
            completion: Arc::new(completion),
            placeholders: Arc::new(PlaceholderCache::new()),
            meta: Arc::new(meta),
            presigner: Arc::new(presigner),
            cron_secret: config.cron_secret.clone(),
            started_at: Utc::now(),
        }
    }
}
