//! Wire and domain types for the Meta Graph client

use serde::{Deserialize, Serialize};

/// Publishing platform a user can link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Threads,
    Facebook,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Threads => "threads",
            Provider::Facebook => "facebook",
        }
    }

    /// Parse a path/database value like "threads". Unknown values are None.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "threads" => Some(Provider::Threads),
            "facebook" => Some(Provider::Facebook),
            _ => None,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a completed code exchange: the long-lived token plus the
/// platform-side account identity it belongs to.
#[derive(Debug, Clone)]
pub struct LinkedToken {
    pub access_token: String,
    /// Seconds until expiry, when the platform reports one
    pub expires_in: Option<i64>,
    pub provider_user_id: String,
    pub scope: Option<String>,
}

/// Minimal profile of a linked platform account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: Option<String>,
}

// Wire formats below. Field sets vary between Graph and Threads responses,
// so everything optional stays Option and the client decides what is fatal.

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: Option<i64>,
    /// Threads short-lived exchange includes the numeric account id
    pub user_id: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MeResponse {
    pub id: String,
    pub name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedObject {
    pub id: String,
    /// Page photo posts also report the feed post id
    pub post_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphErrorBody {
    pub error: Option<GraphErrorDetail>,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphErrorDetail {
    pub message: String,
}
