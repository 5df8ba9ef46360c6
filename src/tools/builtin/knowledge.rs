//! Knowledge-base search tool.

use std::sync::Arc;

use async_trait::async_trait;

use crate::knowledge::KnowledgeBase;
use crate::tools::tool::{Tool, ToolContext, ToolError, ToolOutput, optional_str, require_str, u64_or};

const MAX_RESULTS: u64 = 10;

pub struct KnowledgeSearchTool {
    knowledge: Arc<dyn KnowledgeBase>,
}

impl KnowledgeSearchTool {
    pub fn new(knowledge: Arc<dyn KnowledgeBase>) -> Self {
        Self { knowledge }
    }
}

#[async_trait]
impl Tool for KnowledgeSearchTool {
    fn name(&self) -> &str {
        "search_knowledge"
    }

    fn description(&self) -> &str {
        "Recherche dans la base de connaissances France Travail : démarches, \
         droits, aides, formations. À utiliser pour répondre aux questions \
         générales sur l'emploi et l'accompagnement."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Question ou recherche"
                },
                "category": {
                    "type": "string",
                    "description": "Catégorie spécifique (formation, aide, droit, etc.)"
                },
                "limit": {
                    "type": "integer",
                    "description": "Nombre de résultats (défaut : 3)",
                    "default": 3
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = std::time::Instant::now();
        let query = require_str(&params, "query")?;
        let category = optional_str(&params, "category");
        let limit = u64_or(&params, "limit", 3).min(MAX_RESULTS) as usize;

        let results = self
            .knowledge
            .search(query, category, limit)
            .await
            .map_err(|e| ToolError::ExecutionFailed(format!("Erreur lors de la recherche : {}", e)))?;

        if results.is_empty() {
            return Ok(ToolOutput::text(
                "Aucune information trouvée dans la base de connaissances.",
                start.elapsed(),
            ));
        }

        let formatted: Vec<serde_json::Value> = results
            .iter()
            .map(|snippet| {
                serde_json::json!({
                    "content": snippet.content,
                    "source": snippet.source,
                    "category": snippet.category,
                })
            })
            .collect();

        Ok(ToolOutput::json(&serde_json::Value::Array(formatted), start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::InMemoryKnowledgeBase;
    use crate::tools::tool::ToolContext;

    async fn tool_with_data() -> KnowledgeSearchTool {
        let kb = InMemoryKnowledgeBase::new();
        kb.add_document(
            "L'actualisation mensuelle doit être validée avant le 15 du mois.",
            "FAQ France Travail",
            "aide",
        )
        .await
        .unwrap();
        KnowledgeSearchTool::new(Arc::new(kb))
    }

    #[tokio::test]
    async fn returns_formatted_snippets() {
        let tool = tool_with_data().await;
        let output = tool
            .execute(
                serde_json::json!({"query": "actualisation mensuelle"}),
                &ToolContext::default(),
            )
            .await
            .unwrap();
        assert!(output.content.contains("actualisation"));
        assert!(output.content.contains("FAQ France Travail"));
    }

    #[tokio::test]
    async fn empty_results_yield_fixed_message() {
        let tool = tool_with_data().await;
        let output = tool
            .execute(
                serde_json::json!({"query": "sujet introuvable xyz"}),
                &ToolContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(
            output.content,
            "Aucune information trouvée dans la base de connaissances."
        );
    }

    #[tokio::test]
    async fn missing_query_is_invalid() {
        let tool = tool_with_data().await;
        let result = tool
            .execute(serde_json::json!({}), &ToolContext::default())
            .await;
        assert!(matches!(result, Err(ToolError::InvalidParameters(_))));
    }
}
