use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use uuid::Uuid;

/// Scheduled-post lifecycle states, stored as lowercase text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum PostStatus {
    Scheduled,
    Published,
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Scheduled => "scheduled",
            PostStatus::Published => "published",
            PostStatus::Failed => "failed",
        }
    }
}

/// User row returned from SELECT queries
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,
    #[ts(optional)]
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Cookie-session row; never leaves the server
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Linked OAuth account row returned from SELECT queries
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct LinkedAccountRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub provider_account_id: String,
    #[serde(skip)]
    #[ts(skip)]
    pub access_token: String,
    #[serde(skip)]
    #[ts(skip)]
    pub refresh_token: Option<String>,
    #[ts(optional)]
    pub expires_at: Option<DateTime<Utc>>,
    #[ts(optional)]
    pub scope: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Scheduled post row returned from SELECT queries
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ScheduledPostRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: String,
    pub caption: String,
    #[ts(optional)]
    pub image_url: Option<String>,
    #[ts(optional)]
    pub affiliate_link: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub status: String,
    #[ts(optional)]
    pub platform_post_id: Option<String>,
    #[ts(optional)]
    pub error_message: Option<String>,
    #[ts(optional)]
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_status_as_str() {
        assert_eq!(PostStatus::Scheduled.as_str(), "scheduled");
        assert_eq!(PostStatus::Published.as_str(), "published");
        assert_eq!(PostStatus::Failed.as_str(), "failed");
    }

    #[test]
    fn test_user_row_serialization_hides_password_hash() {
        let user = UserRow {
            id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            display_name: Some("Alice".to_string()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("alice@example.com"));
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("passwordHash"));
    }

    #[test]
    fn test_linked_account_serialization_hides_tokens() {
        let account = LinkedAccountRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            provider: "threads".to_string(),
            provider_account_id: "178414".to_string(),
            access_token: "THQS-token".to_string(),
            refresh_token: None,
            expires_at: None,
            scope: Some("threads_basic".to_string()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&account).unwrap();
        assert!(json.contains("threads"));
        assert!(!json.contains("THQS-token"));
    }
}
