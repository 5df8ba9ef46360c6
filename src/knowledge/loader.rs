//! Seed-data loading for the knowledge base.
//!
//! Reads `faq.json`, `guides.json` and `formations.json` from a data
//! directory. Missing files are skipped; malformed files are an error.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::KnowledgeError;
use crate::knowledge::KnowledgeBase;

#[derive(Debug, Deserialize)]
struct FaqItem {
    question: String,
    answer: String,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GuideItem {
    title: String,
    content: String,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FormationItem {
    title: String,
    provider: String,
    duration: String,
    level: String,
    description: String,
    #[serde(default)]
    prerequisites: Vec<String>,
    #[serde(default)]
    outcomes: Vec<String>,
}

/// Load all seed files from `dir` into `kb`. Returns the number of
/// documents added.
pub async fn load_seed_dir(
    kb: &dyn KnowledgeBase,
    dir: &Path,
) -> Result<usize, KnowledgeError> {
    let mut count = 0;

    if let Some(items) = read_json::<Vec<FaqItem>>(&dir.join("faq.json")).await? {
        for item in items {
            let content = format!("Question: {}\nRéponse: {}", item.question, item.answer);
            kb.add_document(
                &content,
                "FAQ France Travail",
                item.category.as_deref().unwrap_or("general"),
            )
            .await?;
            count += 1;
        }
    }

    if let Some(items) = read_json::<Vec<GuideItem>>(&dir.join("guides.json")).await? {
        for item in items {
            kb.add_document(
                &item.content,
                &item.title,
                item.category.as_deref().unwrap_or("guide"),
            )
            .await?;
            count += 1;
        }
    }

    if let Some(items) = read_json::<Vec<FormationItem>>(&dir.join("formations.json")).await? {
        for item in items {
            let content = format!(
                "Formation: {}\nOrganisme: {}\nDurée: {}\nNiveau: {}\nDescription: {}\nPrérequis: {}\nDébouchés: {}",
                item.title,
                item.provider,
                item.duration,
                item.level,
                item.description,
                item.prerequisites.join(", "),
                item.outcomes.join(", "),
            );
            kb.add_document(&content, &item.provider, "formation").await?;
            count += 1;
        }
    }

    info!(count, dir = %dir.display(), "Knowledge seed data loaded");
    Ok(count)
}

async fn read_json<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<Option<T>, KnowledgeError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = tokio::fs::read_to_string(path).await?;
    let parsed = serde_json::from_str(&raw).map_err(|e| KnowledgeError::LoadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::InMemoryKnowledgeBase;

    #[tokio::test]
    async fn loads_available_files_and_skips_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("faq.json"),
            r#"[{"question": "Comment s'actualiser ?", "answer": "Avant le 15 du mois.", "category": "aide"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("formations.json"),
            r#"[{"title": "Rust avancé", "provider": "OpenClassrooms", "duration": "3 mois",
                 "level": "intermédiaire", "description": "Programmation système."}]"#,
        )
        .unwrap();

        let kb = InMemoryKnowledgeBase::new();
        let count = load_seed_dir(&kb, dir.path()).await.unwrap();
        assert_eq!(count, 2);

        let results = kb.search("actualiser", None, 3).await.unwrap();
        assert_eq!(results[0].category, "aide");
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("faq.json"), "not json").unwrap();

        let kb = InMemoryKnowledgeBase::new();
        let result = load_seed_dir(&kb, dir.path()).await;
        assert!(matches!(result, Err(KnowledgeError::LoadFailed { .. })));
    }
}
