//! Job-offer search tool backed by the France Travail API.

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::JobSearchClient;
use crate::api::models::{ContractType, ExperienceLevel, SearchOfferRequest};
use crate::tools::tool::{Tool, ToolContext, ToolError, ToolOutput, optional_str, u64_or};

/// Offers shown per result page, kept small for readability in chat.
const DISPLAY_LIMIT: usize = 5;

pub struct JobSearchTool {
    client: Arc<JobSearchClient>,
}

impl JobSearchTool {
    pub fn new(client: Arc<JobSearchClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for JobSearchTool {
    fn name(&self) -> &str {
        "search_job_offers"
    }

    fn description(&self) -> &str {
        "Recherche des offres d'emploi sur France Travail. À utiliser dès que \
         l'utilisateur cherche un emploi, un poste ou des offres dans une ville \
         ou un domaine."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "keywords": {
                    "type": "string",
                    "description": "Mots-clés de recherche (métier, compétences)"
                },
                "location": {
                    "type": "string",
                    "description": "Ville ou code INSEE de la commune"
                },
                "distance": {
                    "type": "integer",
                    "description": "Rayon de recherche en km (défaut : 10)",
                    "default": 10
                },
                "contract_types": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Types de contrat (CDI, CDD, MIS, SAI, STG)"
                },
                "experience_level": {
                    "type": "string",
                    "description": "Niveau d'expérience : D (débutant), E (expérimenté), S (senior)"
                },
                "page": {
                    "type": "integer",
                    "description": "Page de résultats (défaut : 0)",
                    "default": 0
                }
            }
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = std::time::Instant::now();

        let mut request = SearchOfferRequest::new();
        request.keywords = optional_str(&params, "keywords").map(str::to_string);
        request.location = optional_str(&params, "location").map(str::to_string);
        request.distance = u64_or(&params, "distance", 10).min(100) as u32;
        request.page = u64_or(&params, "page", 0) as u32;

        // Unknown contract labels are dropped, unknown experience levels ignored
        if let Some(types) = params.get("contract_types").and_then(|v| v.as_array()) {
            request.contract_types = types
                .iter()
                .filter_map(|v| v.as_str())
                .filter_map(ContractType::parse)
                .collect();
        }
        if let Some(level) = optional_str(&params, "experience_level") {
            request.experience_levels = ExperienceLevel::parse(level).into_iter().collect();
        }

        let response = self
            .client
            .search_offers(&request)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("Erreur lors de la recherche : {}", e)))?;

        if response.offers.is_empty() {
            return Ok(ToolOutput::text(
                "Aucune offre d'emploi trouvée pour ces critères. \
                 Essayez d'élargir la recherche (mots-clés plus généraux, distance plus grande).",
                start.elapsed(),
            ));
        }

        let shown: Vec<serde_json::Value> = response
            .offers
            .iter()
            .take(DISPLAY_LIMIT)
            .map(|offer| {
                serde_json::json!({
                    "id": offer.id,
                    "title": offer.title,
                    "company": offer.company_name(),
                    "location": offer.location_label(),
                    "contract": offer.contract_type,
                    "salary": offer.salary.libelle,
                    "experience": offer.experience_required,
                    "created": offer.date_creation.format("%d/%m/%Y").to_string(),
                    "url": offer.origin.url_origine,
                })
            })
            .collect();

        let output = serde_json::json!({
            "total": response.total_results,
            "page": request.page,
            "offers": shown,
        });

        Ok(ToolOutput::json(&output, start.elapsed()))
    }
}
