//! Administrative-information tool — fixed table of France Travail
//! procedures (inscription, actualisation, allocations).

use std::collections::HashMap;
use std::sync::LazyLock;

use async_trait::async_trait;

use crate::tools::tool::{Tool, ToolContext, ToolError, ToolOutput, optional_str, require_str};

struct AdminTopic {
    title: &'static str,
    details: serde_json::Value,
}

static ADMIN_TOPICS: LazyLock<HashMap<&'static str, AdminTopic>> = LazyLock::new(|| {
    HashMap::from([
        (
            "inscription",
            AdminTopic {
                title: "Inscription à France Travail",
                details: serde_json::json!({
                    "steps": [
                        "1. Créer son espace personnel sur francetravail.fr",
                        "2. Remplir le formulaire d'inscription en ligne",
                        "3. Préparer les documents : pièce d'identité, CV, RIB",
                        "4. Valider l'inscription et prendre RDV avec un conseiller",
                        "5. Se présenter au RDV avec tous les documents"
                    ],
                    "documents": [
                        "Pièce d'identité",
                        "Justificatif de domicile",
                        "CV",
                        "RIB",
                        "Carte vitale"
                    ],
                    "delai": "RDV sous 5 jours ouvrés"
                }),
            },
        ),
        (
            "actualisation",
            AdminTopic {
                title: "Actualisation mensuelle",
                details: serde_json::json!({
                    "steps": [
                        "1. Se connecter à son espace personnel",
                        "2. Cliquer sur 'M'actualiser'",
                        "3. Déclarer sa situation du mois",
                        "4. Indiquer les heures travaillées si activité",
                        "5. Valider avant le 15 du mois"
                    ],
                    "period": "Entre le 28 et le 15 du mois suivant",
                    "important": "L'actualisation conditionne le paiement des allocations"
                }),
            },
        ),
        (
            "allocations",
            AdminTopic {
                title: "Allocations chômage (ARE)",
                details: serde_json::json!({
                    "conditions": [
                        "Avoir travaillé au moins 6 mois sur les 24 derniers mois",
                        "Être inscrit comme demandeur d'emploi",
                        "Rechercher activement un emploi",
                        "Être physiquement apte au travail",
                        "Ne pas avoir atteint l'âge de la retraite"
                    ],
                    "calcul": "57% à 75% du salaire journalier de référence",
                    "duree": "Variable selon l'âge et la durée de cotisation"
                }),
            },
        ),
    ])
});

pub struct AdminInfoTool;

impl AdminInfoTool {
    pub fn new() -> Self {
        Self
    }

    fn valid_topics() -> String {
        let mut topics: Vec<&str> = ADMIN_TOPICS.keys().copied().collect();
        topics.sort_unstable();
        topics.join(", ")
    }
}

impl Default for AdminInfoTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for AdminInfoTool {
    fn name(&self) -> &str {
        "get_admin_info"
    }

    fn description(&self) -> &str {
        "Fournit des informations administratives détaillées sur les démarches \
         France Travail : inscription, actualisation, allocations."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "topic": {
                    "type": "string",
                    "description": "Sujet administratif (inscription, actualisation, allocations)"
                },
                "user_situation": {
                    "type": "string",
                    "description": "Situation spécifique de l'utilisateur"
                }
            },
            "required": ["topic"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = std::time::Instant::now();
        let topic = require_str(&params, "topic")?;
        let user_situation = optional_str(&params, "user_situation");

        let normalized = topic.trim().to_lowercase();
        let Some(info) = ADMIN_TOPICS.get(normalized.as_str()) else {
            // Unknown topic is an answer, not an error: list what we do know
            return Ok(ToolOutput::text(
                format!(
                    "Pas d'information disponible sur : {}. Sujets disponibles : {}",
                    topic,
                    Self::valid_topics()
                ),
                start.elapsed(),
            ));
        };

        let output = serde_json::json!({
            "topic": info.title,
            "details": info.details,
            "user_situation": user_situation.unwrap_or("Situation générale"),
        });

        Ok(ToolOutput::json(&output, start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_topic_returns_details() {
        let tool = AdminInfoTool::new();
        let output = tool
            .execute(
                serde_json::json!({"topic": "inscription"}),
                &ToolContext::default(),
            )
            .await
            .unwrap();
        assert!(output.content.contains("Inscription à France Travail"));
        assert!(output.content.contains("francetravail.fr"));
        assert!(output.content.contains("Situation générale"));
    }

    #[tokio::test]
    async fn topic_lookup_is_case_insensitive() {
        let tool = AdminInfoTool::new();
        let output = tool
            .execute(
                serde_json::json!({"topic": "  Actualisation "}),
                &ToolContext::default(),
            )
            .await
            .unwrap();
        assert!(output.content.contains("Actualisation mensuelle"));
    }

    #[tokio::test]
    async fn unknown_topic_lists_valid_topics() {
        let tool = AdminInfoTool::new();
        let output = tool
            .execute(
                serde_json::json!({"topic": "unknown_topic"}),
                &ToolContext::default(),
            )
            .await
            .unwrap();
        assert!(output.content.contains("Sujets disponibles"));
        assert!(output.content.contains("actualisation"));
        assert!(output.content.contains("allocations"));
        assert!(output.content.contains("inscription"));
    }

    #[tokio::test]
    async fn user_situation_is_echoed() {
        let tool = AdminInfoTool::new();
        let output = tool
            .execute(
                serde_json::json!({"topic": "allocations", "user_situation": "Fin de CDD"}),
                &ToolContext::default(),
            )
            .await
            .unwrap();
        assert!(output.content.contains("Fin de CDD"));
    }
}
