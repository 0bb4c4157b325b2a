//! API client for the grocery inventory REST API.
//!
//! `ApiClient` implements `PantryApi` over reqwest: bearer-token auth, JSON
//! bodies and a bounded exponential backoff when the server rate limits.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::auth::SessionData;
use crate::config::Config;
use crate::models::inventory::ItemPayload;
use crate::models::{ImageAnalysis, InventoryItem, Preferences, User, UserId};

use super::{ApiError, PantryApi};

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay for rate limiting, doubled on each retry.
const INITIAL_BACKOFF: Duration = Duration::from_millis(1000);

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
    user: User,
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// API client for the inventory service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    initial_backoff: Duration,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            initial_backoff: INITIAL_BACKOFF,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.api_base_url.clone(), config.request_timeout())
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            token: Some(token),
            ..self.clone()
        }
    }

    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should
    /// retry), or Err for other errors.
    async fn check_response_for_retry(response: reqwest::Response) -> Result<Option<reqwest::Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<reqwest::Response>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .headers(self.auth_headers()?);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request
                .send()
                .await
                .map_err(ApiError::NetworkError)
                .with_context(|| format!("Failed to send {} request to {}", method, url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    debug!(%method, url = %url, "Request succeeded");
                    return Ok(response);
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = %url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send::<()>(Method::GET, path, None).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", path))
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", path))
    }

    /// Send a request whose response body the client has no use for.
    async fn execute<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: Option<&B>) -> Result<()> {
        self.send(method, path, body).await?;
        Ok(())
    }
}

#[async_trait]
impl PantryApi for ApiClient {
    async fn list_inventory(&self, user: UserId) -> Result<Vec<InventoryItem>> {
        let items: Vec<InventoryItem> = self.get(&format!("/inventory/{}", user)).await?;
        debug!(user = %user, count = items.len(), "Fetched inventory");
        Ok(items)
    }

    async fn add_item(&self, user: UserId, item: &ItemPayload) -> Result<()> {
        self.execute(Method::POST, &format!("/inventory/{}", user), Some(item))
            .await
            .context("Failed to add item")
    }

    async fn edit_item(&self, user: UserId, item_id: i64, item: &ItemPayload) -> Result<()> {
        self.execute(Method::PUT, &format!("/inventory/{}/{}", user, item_id), Some(item))
            .await
            .context("Failed to update item")
    }

    async fn delete_item(&self, user: UserId, item_id: i64) -> Result<()> {
        self.execute::<()>(Method::DELETE, &format!("/inventory/{}/{}", user, item_id), None)
            .await
            .context("Failed to delete item")
    }

    async fn get_preferences(&self, user: UserId) -> Result<Preferences> {
        self.get(&format!("/preferences/{}", user)).await
    }

    async fn update_preferences(&self, user: UserId, prefs: &Preferences) -> Result<()> {
        self.execute(Method::PUT, &format!("/preferences/{}", user), Some(prefs))
            .await
            .context("Failed to save preferences")
    }

    async fn analyse_image(&self, image_base64: &str) -> Result<ImageAnalysis> {
        self.post_json("/recipes/analyse-image", &json!({ "image": image_base64 }))
            .await
            .context("Failed to analyse image")
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionData> {
        let auth: AuthResponse = self
            .post_json("/auth/login", &Credentials { email, password })
            .await
            .context("Failed to sign in")?;

        Ok(SessionData {
            token: auth.token,
            user: auth.user,
            created_at: Utc::now(),
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<()> {
        self.execute(Method::POST, "/auth/signup", Some(&Credentials { email, password }))
            .await
            .context("Failed to create account")
    }

    async fn verify_email(&self, code: &str) -> Result<()> {
        self.execute(Method::POST, "/auth/verify-email", Some(&json!({ "token": code })))
            .await
            .context("Failed to verify email")
    }

    async fn resend_verification(&self, user: UserId) -> Result<()> {
        self.execute::<()>(Method::POST, &format!("/auth/resend-verification/{}", user), None)
            .await
            .context("Failed to resend verification email")
    }

    async fn logout(&self, all_devices: bool) -> Result<()> {
        self.execute(Method::POST, "/auth/logout", Some(&json!({ "all_devices": all_devices })))
            .await
            .context("Failed to log out")
    }
}

// ============================================================================
// Tests
// ============================================================================
