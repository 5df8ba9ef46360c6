//! Document-generation tool — delegates to the document generator.

use std::sync::Arc;

use async_trait::async_trait;

use crate::docs::{DocumentGenerator, DocumentType};
use crate::error::DocumentError;
use crate::tools::tool::{Tool, ToolContext, ToolError, ToolOutput, require_str};

pub struct DocumentTool {
    generator: Arc<DocumentGenerator>,
}

impl DocumentTool {
    pub fn new(generator: Arc<DocumentGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Tool for DocumentTool {
    fn name(&self) -> &str {
        "generate_document"
    }

    fn description(&self) -> &str {
        "Génère un document (CV ou lettre de motivation) à partir de données \
         structurées et renvoie le chemin du fichier produit."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "doc_type": {
                    "type": "string",
                    "enum": ["cv", "lettre_motivation"],
                    "description": "Type de document à générer"
                },
                "data": {
                    "type": "object",
                    "description": "Données nécessaires à la génération (nom, expériences, compétences...)"
                }
            },
            "required": ["doc_type", "data"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        _ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let start = std::time::Instant::now();
        let doc_type_str = require_str(&params, "doc_type")?;

        // Unsupported type is a validation error the model can react to
        let doc_type = DocumentType::parse(doc_type_str).map_err(|_| {
            ToolError::InvalidParameters(format!(
                "Type de document non supporté : {} (attendu : cv, lettre_motivation)",
                doc_type_str
            ))
        })?;

        let data = params
            .get("data")
            .cloned()
            .ok_or_else(|| ToolError::InvalidParameters("champ requis manquant : data".to_string()))?;

        let path = self
            .generator
            .generate(doc_type, &data)
            .await
            .map_err(|e| match e {
                DocumentError::InvalidData { reason } => ToolError::InvalidParameters(reason),
                other => ToolError::ExecutionFailed(format!("Erreur lors de la génération : {}", other)),
            })?;

        Ok(ToolOutput::text(
            format!("Document généré avec succès : {}", path.display()),
            start.elapsed(),
        ))
    }
}
