//! Document generation — CV and cover-letter artifacts.
//!
//! Renders Markdown documents from structured data and writes them into an
//! output directory with timestamped filenames. Invoked by the
//! `generate_document` tool; synchronous from the agent's point of view.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::error::DocumentError;

/// Supported document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    Cv,
    LettreMotivation,
}

impl DocumentType {
    /// Parse the tool-facing type label.
    pub fn parse(s: &str) -> Result<Self, DocumentError> {
        match s {
            "cv" => Ok(DocumentType::Cv),
            "lettre_motivation" => Ok(DocumentType::LettreMotivation),
            other => Err(DocumentError::UnsupportedType {
                doc_type: other.to_string(),
            }),
        }
    }

    fn file_prefix(&self) -> &'static str {
        match self {
            DocumentType::Cv => "CV",
            DocumentType::LettreMotivation => "Lettre_motivation",
        }
    }
}

/// Generator writing Markdown artifacts to disk.
pub struct DocumentGenerator {
    output_dir: PathBuf,
}

impl DocumentGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Render and save a document. Returns the path of the produced file.
    pub async fn generate(
        &self,
        doc_type: DocumentType,
        data: &serde_json::Value,
    ) -> Result<PathBuf, DocumentError> {
        if !data.is_object() {
            return Err(DocumentError::InvalidData {
                reason: "data must be a JSON object".to_string(),
            });
        }

        let content = match doc_type {
            DocumentType::Cv => render_cv(data),
            DocumentType::LettreMotivation => render_cover_letter(data),
        };

        tokio::fs::create_dir_all(&self.output_dir).await?;

        let name = data
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("candidat")
            .replace(' ', "_");
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let filename = format!("{}_{}_{}.md", doc_type.file_prefix(), name, timestamp);
        let path = self.output_dir.join(filename);

        tokio::fs::write(&path, content).await?;
        info!(path = %path.display(), "Document generated");
        Ok(path)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

fn str_field<'a>(data: &'a serde_json::Value, key: &str, default: &'a str) -> &'a str {
    data.get(key).and_then(|v| v.as_str()).unwrap_or(default)
}

fn render_cv(data: &serde_json::Value) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", str_field(data, "name", "Nom Prénom")));

    let mut contact = Vec::new();
    for key in ["email", "phone", "address", "linkedin"] {
        if let Some(value) = data.get(key).and_then(|v| v.as_str()) {
            contact.push(value.to_string());
        }
    }
    if !contact.is_empty() {
        out.push_str(&format!("{}\n\n", contact.join(" | ")));
    }

    if let Some(target_job) = data.get("target_job").and_then(|v| v.as_str()) {
        out.push_str("## Objectif Professionnel\n\n");
        out.push_str(&format!("Recherche un poste de {}\n\n", target_job));
    }

    if let Some(experiences) = data.get("experiences").and_then(|v| v.as_array()) {
        out.push_str("## Expériences Professionnelles\n\n");
        for exp in experiences {
            out.push_str(&format!(
                "**{} - {}**  \n{}\n",
                str_field(exp, "title", ""),
                str_field(exp, "company", ""),
                str_field(exp, "period", ""),
            ));
            if let Some(missions) = exp.get("missions").and_then(|v| v.as_array()) {
                for mission in missions {
                    if let Some(text) = mission.as_str() {
                        out.push_str(&format!("- {}\n", text));
                    }
                }
            }
            out.push('\n');
        }
    }

    match data.get("skills") {
        Some(serde_json::Value::Array(skills)) => {
            out.push_str("## Compétences\n\n");
            let list: Vec<&str> = skills.iter().filter_map(|s| s.as_str()).collect();
            out.push_str(&format!("{}\n\n", list.join(" • ")));
        }
        Some(serde_json::Value::String(skills)) => {
            out.push_str("## Compétences\n\n");
            out.push_str(&format!("{}\n\n", skills));
        }
        _ => {}
    }

    if let Some(education) = data.get("education").and_then(|v| v.as_array()) {
        out.push_str("## Formation\n\n");
        for edu in education {
            out.push_str(&format!(
                "**{} - {}**  \n{}\n\n",
                str_field(edu, "degree", ""),
                str_field(edu, "school", ""),
                str_field(edu, "year", ""),
            ));
        }
    }

    out
}

fn render_cover_letter(data: &serde_json::Value) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", str_field(data, "name", "Nom Prénom")));
    if let Some(address) = data.get("address").and_then(|v| v.as_str()) {
        out.push_str(&format!("{}\n", address));
    }
    for key in ["email", "phone"] {
        if let Some(value) = data.get(key).and_then(|v| v.as_str()) {
            out.push_str(&format!("{}\n", value));
        }
    }
    out.push('\n');

    out.push_str(&format!(
        "{}\n",
        str_field(data, "company_name", "Nom de l'entreprise")
    ));
    if let Some(company_address) = data.get("company_address").and_then(|v| v.as_str()) {
        out.push_str(&format!("{}\n", company_address));
    }
    out.push('\n');

    out.push_str(&format!(
        "Le {}\n\n",
        Utc::now().format("%d/%m/%Y")
    ));
    out.push_str(&format!(
        "Objet : {}\n\n",
        str_field(data, "object", "Candidature")
    ));
    out.push_str("Madame, Monsieur,\n\n");

    if let Some(content) = data.get("content").and_then(|v| v.as_array()) {
        for paragraph in content {
            if let Some(text) = paragraph.as_str() {
                out.push_str(&format!("{}\n\n", text));
            }
        }
    } else if let Some(body) = data.get("body").and_then(|v| v.as_str()) {
        out.push_str(&format!("{}\n\n", body));
    }

    out.push_str(
        "Je vous prie d'agréer, Madame, Monsieur, l'expression de mes salutations distinguées.\n\n",
    );
    out.push_str(&format!("{}\n", str_field(data, "name", "Nom Prénom")));
    out
}
