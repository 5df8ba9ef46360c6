//! OAuth2 client-credentials authentication for the France Travail API.
//!
//! The access token is a process-wide cached value. The cache mutex is held
//! across the check-then-fetch-then-store sequence, so at most one refresh
//! is in flight; concurrent callers wait on it and read the fresh token.

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::debug;

use crate::api::models::{AccessTokenResponse, CachedToken};
use crate::config::FranceTravailSettings;
use crate::error::ApiError;

const TOKEN_SCOPE: &str = "api_offresdemploiv2 o2dsoffre";

/// Token cache for the France Travail API.
pub struct AuthClient {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    cache: Mutex<Option<CachedToken>>,
}

impl AuthClient {
    pub fn new(http: reqwest::Client, settings: &FranceTravailSettings) -> Self {
        Self {
            http,
            token_url: settings.token_url.clone(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            cache: Mutex::new(None),
        }
    }

    /// Return a valid access token, refreshing it if the cached one is
    /// absent or expired.
    pub async fn get_access_token(&self) -> Result<String, ApiError> {
        let mut cache = self.cache.lock().await;

        if let Some(token) = cache.as_ref() {
            if !token.is_expired(Utc::now()) {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.request_new_token().await?;
        let access_token = fresh.access_token.clone();
        *cache = Some(fresh);
        Ok(access_token)
    }

    async fn request_new_token(&self) -> Result<CachedToken, ApiError> {
        debug!("Requesting new France Travail access token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("scope", TOKEN_SCOPE),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .query(&[("realm", "/partenaire")])
            .form(&form)
            .send()
            .await
            .map_err(|e| ApiError::TokenRequest {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::TokenRequest {
                reason: format!("status {}: {}", status.as_u16(), message),
            });
        }

        let body: AccessTokenResponse =
            response.json().await.map_err(|e| ApiError::TokenRequest {
                reason: format!("invalid token payload: {e}"),
            })?;

        Ok(CachedToken::from_response(body, Utc::now()))
    }

    /// Seed the cache directly (tests).
    #[cfg(test)]
    pub(crate) async fn seed_token(&self, token: CachedToken) {
        *self.cache.lock().await = Some(token);
    }
}
