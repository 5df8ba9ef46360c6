//! HTTP client for the France Travail job-offer API.
//!
//! Search requests are retried up to 3 attempts with exponential backoff
//! (4s base, capped at 10s, plus jitter) before the failure is surfaced to
//! the calling tool.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::api::auth::AuthClient;
use crate::api::models::{JobOffer, SearchOfferRequest, SearchOfferResponse};
use crate::error::ApiError;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_SECS: u64 = 4;
const BACKOFF_CAP_SECS: u64 = 10;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the offres d'emploi v2 API.
pub struct JobSearchClient {
    http: reqwest::Client,
    auth: Arc<AuthClient>,
    base_url: String,
}

impl JobSearchClient {
    /// `api_base_url` is the partner root (e.g.
    /// `https://api.francetravail.io/partenaire`).
    pub fn new(auth: Arc<AuthClient>, api_base_url: &str) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            auth,
            base_url: format!("{}/offresdemploi/v2", api_base_url.trim_end_matches('/')),
        }
    }

    /// Search job offers matching the request.
    pub async fn search_offers(
        &self,
        request: &SearchOfferRequest,
    ) -> Result<SearchOfferResponse, ApiError> {
        let params = build_search_params(request);
        let url = format!("{}/offres/search", self.base_url);

        let mut last_error: Option<ApiError> = None;
        for attempt in 1..=MAX_ATTEMPTS {
            if attempt > 1 {
                let delay = backoff_delay(attempt);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Job search failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }

            match self.search_once(&url, &params).await {
                Ok(response) => return Ok(response),
                Err(e) => last_error = Some(e),
            }
        }

        Err(ApiError::RetriesExhausted {
            attempts: MAX_ATTEMPTS,
            reason: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn search_once(
        &self,
        url: &str,
        params: &[(String, String)],
    ) -> Result<SearchOfferResponse, ApiError> {
        let token = self.auth.get_access_token().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(&token)
            .header("Accept", "application/json")
            .query(params)
            .send()
            .await?;

        let status = response.status();
        // 204: valid search with an empty result window
        if status.as_u16() == 204 {
            return Ok(SearchOfferResponse {
                total_results: 0,
                offers: Vec::new(),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<SearchOfferResponse>()
            .await
            .map_err(|e| ApiError::InvalidPayload(e.to_string()))
    }

    /// Fetch the details of a single offer.
    pub async fn get_offer_details(&self, offer_id: &str) -> Result<JobOffer, ApiError> {
        let token = self.auth.get_access_token().await?;
        let url = format!("{}/offres/{}", self.base_url, offer_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<JobOffer>()
            .await
            .map_err(|e| ApiError::InvalidPayload(e.to_string()))
    }
}

/// Exponential backoff with the tenacity-style window: 4s, 8s, capped at
/// 10s, plus up to 500ms of jitter.
fn backoff_delay(attempt: u32) -> Duration {
    let exp = BACKOFF_BASE_SECS.saturating_mul(1 << (attempt - 2));
    let secs = exp.min(BACKOFF_CAP_SECS);
    let jitter_ms = rand::thread_rng().gen_range(0..500);
    Duration::from_secs(secs) + Duration::from_millis(jitter_ms)
}

/// Build the French query parameters the API expects.
fn build_search_params(request: &SearchOfferRequest) -> Vec<(String, String)> {
    let start = request.page * request.per_page;
    let end = (request.page + 1) * request.per_page - 1;
    let mut params = vec![("range".to_string(), format!("{}-{}", start, end))];

    if let Some(keywords) = &request.keywords {
        params.push(("motsCles".to_string(), keywords.clone()));
    }
    if let Some(location) = &request.location {
        params.push(("commune".to_string(), location.clone()));
        params.push(("distance".to_string(), request.distance.to_string()));
    }
    if !request.contract_types.is_empty() {
        let joined = request
            .contract_types
            .iter()
            .map(|c| c.code())
            .collect::<Vec<_>>()
            .join(",");
        params.push(("typeContrat".to_string(), joined));
    }
    if !request.experience_levels.is_empty() {
        let joined = request
            .experience_levels
            .iter()
            .map(|e| e.code())
            .collect::<Vec<_>>()
            .join(",");
        params.push(("experience".to_string(), joined));
    }
    if let Some(min_salary) = request.min_salary {
        params.push(("salaireMin".to_string(), min_salary.to_string()));
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{ContractType, ExperienceLevel};

    #[test]
    fn range_param_follows_pagination() {
        let mut request = SearchOfferRequest::new();
        request.per_page = 10;
        request.page = 2;
        let params = build_search_params(&request);
        assert!(params.contains(&("range".to_string(), "20-29".to_string())));
    }

    #[test]
    fn distance_only_sent_with_location() {
        let mut request = SearchOfferRequest::new();
        request.keywords = Some("développeur".to_string());
        let params = build_search_params(&request);
        assert!(params.iter().all(|(k, _)| k != "distance"));

        request.location = Some("75101".to_string());
        let params = build_search_params(&request);
        assert!(params.contains(&("commune".to_string(), "75101".to_string())));
        assert!(params.contains(&("distance".to_string(), "10".to_string())));
    }

    #[test]
    fn contract_and_experience_codes_are_joined() {
        let mut request = SearchOfferRequest::new();
        request.contract_types = vec![ContractType::Cdi, ContractType::Interim];
        request.experience_levels = vec![ExperienceLevel::Debutant];
        let params = build_search_params(&request);
        assert!(params.contains(&("typeContrat".to_string(), "CDI,MIS".to_string())));
        assert!(params.contains(&("experience".to_string(), "D".to_string())));
    }

    #[test]
    fn backoff_is_capped() {
        // attempt 2 → 4s base, attempt 3 → 8s, both under the 10s cap
        assert!(backoff_delay(2) >= Duration::from_secs(4));
        assert!(backoff_delay(2) < Duration::from_secs(5));
        assert!(backoff_delay(3) >= Duration::from_secs(8));
        assert!(backoff_delay(3) < Duration::from_secs(9));
    }

    #[tokio::test]
    async fn offer_details_fetches_a_single_offer() {
        use crate::config::FranceTravailSettings;
        use axum::Router;
        use axum::routing::{get, post};

        let app = Router::new()
            .route(
                "/token",
                post(|| async {
                    axum::Json(serde_json::json!({
                        "access_token": "test-token",
                        "token_type": "Bearer",
                        "expires_in": 1200,
                        "scope": "api_offresdemploiv2"
                    }))
                }),
            )
            .route(
                "/offresdemploi/v2/offres/{id}",
                get(|| async {
                    axum::Json(serde_json::json!({
                        "id": "189XYZ",
                        "intitule": "Boulanger H/F",
                        "entreprise": {"nom": "Fournil du Coin"},
                        "typeContrat": "CDI",
                        "dateCreation": "2026-03-10T07:00:00Z"
                    }))
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let auth = std::sync::Arc::new(crate::api::AuthClient::new(
            reqwest::Client::new(),
            &FranceTravailSettings {
                client_id: "id".to_string(),
                client_secret: secrecy::SecretString::from("secret"),
                api_base_url: base.clone(),
                token_url: format!("{}/token", base),
            },
        ));
        let client = JobSearchClient::new(auth, &base);

        let offer = client.get_offer_details("189XYZ").await.unwrap();
        assert_eq!(offer.title, "Boulanger H/F");
        assert_eq!(offer.company_name(), "Fournil du Coin");
    }
}
