use std::env;

/// Application configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub cors_origins: Vec<String>,
    pub public_url: Option<String>,
    pub cron_secret: String,

    // Meta OAuth application
    pub meta_app_id: String,
    pub meta_app_secret: String,

    // S3-compatible object storage (R2)
    pub storage_endpoint: String,
    pub storage_bucket: String,
    pub storage_region: String,
    pub storage_access_key_id: String,
    pub storage_secret_access_key: String,
    pub storage_public_base_url: String,

    // Mock video generation
    pub video_complete_after_secs: i64,
    pub video_result_url: String,
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/postflow".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|s| s.split(',').map(|o| o.trim().to_string()).collect())
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ]
            });

        let public_url = env::var("PUBLIC_URL").ok();

        let cron_secret = env::var("CRON_SECRET").unwrap_or_else(|_| "dev-cron-secret".to_string());

        let meta_app_id = env::var("META_APP_ID").unwrap_or_default();
        let meta_app_secret = env::var("META_APP_SECRET").unwrap_or_default();

        let storage_endpoint = env::var("STORAGE_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:9000".to_string());
        let storage_bucket =
            env::var("STORAGE_BUCKET").unwrap_or_else(|_| "postflow-media".to_string());
        let storage_region = env::var("STORAGE_REGION").unwrap_or_else(|_| "auto".to_string());
        let storage_access_key_id = env::var("STORAGE_ACCESS_KEY_ID").unwrap_or_default();
        let storage_secret_access_key = env::var("STORAGE_SECRET_ACCESS_KEY").unwrap_or_default();
        let storage_public_base_url = env::var("STORAGE_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:9000/postflow-media".to_string());

        let video_complete_after_secs = env::var("VIDEO_COMPLETE_AFTER_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(35);
        let video_result_url = env::var("VIDEO_RESULT_URL")
            .unwrap_or_else(|_| "https://static.postflow.dev/demo/generated-video.mp4".to_string());

        Self {
            port,
            database_url,
            cors_origins,
            public_url,
            cron_secret,
            meta_app_id,
            meta_app_secret,
            storage_endpoint,
            storage_bucket,
            storage_region,
            storage_access_key_id,
            storage_secret_access_key,
            storage_public_base_url,
            video_complete_after_secs,
            video_result_url,
        }
    }
}
