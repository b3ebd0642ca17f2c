use moka::future::Cache;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{MetaGraphError, Result};
use crate::types::{
    CreatedObject, GraphErrorBody, LinkedToken, MeResponse, Profile, Provider, TokenResponse,
};

const GRAPH_BASE: &str = "https://graph.facebook.com/v21.0";
const THREADS_BASE: &str = "https://graph.threads.net";
const THREADS_AUTHORIZE: &str = "https://threads.net/oauth/authorize";
const FACEBOOK_AUTHORIZE: &str = "https://www.facebook.com/v21.0/dialog/oauth";

const THREADS_SCOPES: &str = "threads_basic,threads_content_publish";
const FACEBOOK_SCOPES: &str = "pages_show_list,pages_manage_posts,pages_read_engagement";

/// OAuth application credentials plus the base URL our callbacks live under.
#[derive(Debug, Clone)]
pub struct OAuthApp {
    pub app_id: String,
    pub app_secret: String,
    /// e.g. `https://postflow.example.com`; callbacks are
    /// `{redirect_base}/oauth/{provider}/callback`
    pub redirect_base: String,
}

/// HTTP client for the Meta Graph and Threads APIs
pub struct MetaGraphClient {
    client: Client,
    app: OAuthApp,
    graph_base: String,
    threads_base: String,
    profile_cache: Cache<String, Profile>,
}

impl MetaGraphClient {
    pub fn new(app: OAuthApp) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            app,
            graph_base: GRAPH_BASE.to_string(),
            threads_base: THREADS_BASE.to_string(),
            profile_cache: Cache::new(1_000),
        }
    }

    /// Point both API bases at a different host (test servers).
    pub fn with_base_urls(mut self, graph_base: &str, threads_base: &str) -> Self {
        self.graph_base = graph_base.trim_end_matches('/').to_string();
        self.threads_base = threads_base.trim_end_matches('/').to_string();
        self
    }

    /// Callback URL registered with the platform for `provider`.
    pub fn redirect_uri(&self, provider: Provider) -> String {
        format!(
            "{}/oauth/{}/callback",
            self.app.redirect_base.trim_end_matches('/'),
            provider.as_str()
        )
    }

    /// Platform authorize URL the browser is sent to for account linking.
    pub fn authorize_url(&self, provider: Provider, state: &str) -> String {
        let (base, scopes) = match provider {
            Provider::Threads => (THREADS_AUTHORIZE, THREADS_SCOPES),
            Provider::Facebook => (FACEBOOK_AUTHORIZE, FACEBOOK_SCOPES),
        };
        format!(
            "{}?client_id={}&redirect_uri={}&scope={}&response_type=code&state={}",
            base,
            urlencoding::encode(&self.app.app_id),
            urlencoding::encode(&self.redirect_uri(provider)),
            urlencoding::encode(scopes),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for a long-lived token and the
    /// platform account id it belongs to.
    pub async fn exchange_code(&self, provider: Provider, code: &str) -> Result<LinkedToken> {
        match provider {
            Provider::Threads => self.exchange_threads_code(code).await,
            Provider::Facebook => self.exchange_facebook_code(code).await,
        }
    }

    async fn exchange_threads_code(&self, code: &str) -> Result<LinkedToken> {
        let redirect_uri = self.redirect_uri(Provider::Threads);
        let resp = self
            .client
            .post(format!("{}/oauth/access_token", self.threads_base))
            .form(&[
                ("client_id", self.app.app_id.as_str()),
                ("client_secret", self.app.app_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri.as_str()),
                ("code", code),
            ])
            .send()
            .await?;
        let short: TokenResponse = self.expect_json(resp).await?;

        let provider_user_id = short
            .user_id
            .map(|v| v.to_string().trim_matches('"').to_string())
            .ok_or(MetaGraphError::MissingField("user_id"))?;

        // Short-lived tokens last an hour; trade up to the 60-day variant
        let resp = self
            .client
            .get(format!("{}/access_token", self.threads_base))
            .query(&[
                ("grant_type", "th_exchange_token"),
                ("client_secret", self.app.app_secret.as_str()),
                ("access_token", short.access_token.as_str()),
            ])
            .send()
            .await?;
        let long: TokenResponse = self.expect_json(resp).await?;

        info!(provider = "threads", user_id = %provider_user_id, "Exchanged OAuth code");
        Ok(LinkedToken {
            access_token: long.access_token,
            expires_in: long.expires_in,
            provider_user_id,
            scope: Some(THREADS_SCOPES.to_string()),
        })
    }

    async fn exchange_facebook_code(&self, code: &str) -> Result<LinkedToken> {
        let redirect_uri = self.redirect_uri(Provider::Facebook);
        let resp = self
            .client
            .get(format!("{}/oauth/access_token", self.graph_base))
            .query(&[
                ("client_id", self.app.app_id.as_str()),
                ("client_secret", self.app.app_secret.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("code", code),
            ])
            .send()
            .await?;
        let short: TokenResponse = self.expect_json(resp).await?;

        let resp = self
            .client
            .get(format!("{}/oauth/access_token", self.graph_base))
            .query(&[
                ("grant_type", "fb_exchange_token"),
                ("client_id", self.app.app_id.as_str()),
                ("client_secret", self.app.app_secret.as_str()),
                ("fb_exchange_token", short.access_token.as_str()),
            ])
            .send()
            .await?;
        let long: TokenResponse = self.expect_json(resp).await?;

        // The Graph token response carries no account id; ask /me
        let resp = self
            .client
            .get(format!("{}/me", self.graph_base))
            .query(&[
                ("fields", "id,name"),
                ("access_token", long.access_token.as_str()),
            ])
            .send()
            .await?;
        let me: MeResponse = self.expect_json(resp).await?;

        info!(provider = "facebook", user_id = %me.id, "Exchanged OAuth code");
        Ok(LinkedToken {
            access_token: long.access_token,
            expires_in: long.expires_in,
            provider_user_id: me.id,
            scope: Some(FACEBOOK_SCOPES.to_string()),
        })
    }

    /// Fetch the display profile of a linked account, memoized per
    /// provider + account id.
    pub async fn fetch_profile(
        &self,
        provider: Provider,
        provider_user_id: &str,
        access_token: &str,
    ) -> Result<Profile> {
        let cache_key = format!("{}:{}", provider, provider_user_id);
        if let Some(profile) = self.profile_cache.get(&cache_key).await {
            return Ok(profile);
        }

        let base = match provider {
            Provider::Threads => &self.threads_base,
            Provider::Facebook => &self.graph_base,
        };
        let fields = match provider {
            Provider::Threads => "id,username",
            Provider::Facebook => "id,name",
        };
        let resp = self
            .client
            .get(format!("{}/{}", base, provider_user_id))
            .query(&[("fields", fields), ("access_token", access_token)])
            .send()
            .await?;
        let me: MeResponse = self.expect_json(resp).await?;

        let profile = Profile {
            id: me.id,
            name: me.name.or(me.username),
        };
        self.profile_cache.insert(cache_key, profile.clone()).await;
        Ok(profile)
    }

    /// Publish an image post, returning the platform post id.
    pub async fn publish(
        &self,
        provider: Provider,
        access_token: &str,
        provider_user_id: &str,
        caption: &str,
        image_url: &str,
    ) -> Result<String> {
        match provider {
            Provider::Threads => {
                self.publish_threads(access_token, provider_user_id, caption, image_url)
                    .await
            }
            Provider::Facebook => {
                self.publish_facebook(access_token, provider_user_id, caption, image_url)
                    .await
            }
        }
    }

    /// Threads publishing is two-step: create a media container, then
    /// publish it.
    async fn publish_threads(
        &self,
        access_token: &str,
        user_id: &str,
        caption: &str,
        image_url: &str,
    ) -> Result<String> {
        let resp = self
            .client
            .post(format!("{}/{}/threads", self.threads_base, user_id))
            .form(&[
                ("media_type", "IMAGE"),
                ("image_url", image_url),
                ("text", caption),
                ("access_token", access_token),
            ])
            .send()
            .await?;
        let container: CreatedObject = self.expect_json(resp).await?;
        debug!(container_id = %container.id, "Created Threads media container");

        let resp = self
            .client
            .post(format!("{}/{}/threads_publish", self.threads_base, user_id))
            .form(&[
                ("creation_id", container.id.as_str()),
                ("access_token", access_token),
            ])
            .send()
            .await?;
        let published: CreatedObject = self.expect_json(resp).await?;

        info!(post_id = %published.id, "Published to Threads");
        Ok(published.id)
    }

    async fn publish_facebook(
        &self,
        access_token: &str,
        page_id: &str,
        caption: &str,
        image_url: &str,
    ) -> Result<String> {
        let resp = self
            .client
            .post(format!("{}/{}/photos", self.graph_base, page_id))
            .form(&[
                ("url", image_url),
                ("caption", caption),
                ("access_token", access_token),
            ])
            .send()
            .await?;
        let created: CreatedObject = self.expect_json(resp).await?;

        let post_id = created.post_id.unwrap_or(created.id);
        info!(post_id = %post_id, "Published to Facebook page");
        Ok(post_id)
    }

    async fn expect_json<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }
        let message = resp
            .json::<GraphErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error.map(|e| e.message).or(body.error_message))
            .unwrap_or_else(|| "unrecognized platform error body".to_string());
        Err(MetaGraphError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
