//! Typed models for the France Travail job-offer API.
//!
//! Wire field names are French (`motsCles`, `lieuTravail`, ...); the serde
//! renames keep the Rust side readable.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Safety margin subtracted from the server-declared token lifetime.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

/// Contract types accepted by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractType {
    Cdi,
    Cdd,
    Interim,
    Alternance,
    Stage,
}

impl ContractType {
    /// API code for this contract type.
    pub fn code(&self) -> &'static str {
        match self {
            ContractType::Cdi => "CDI",
            ContractType::Cdd => "CDD",
            ContractType::Interim => "MIS",
            ContractType::Alternance => "SAI",
            ContractType::Stage => "STG",
        }
    }

    /// Parse a user-supplied label. Unknown labels yield None and are
    /// silently dropped by the search tool.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CDI" => Some(ContractType::Cdi),
            "CDD" => Some(ContractType::Cdd),
            "MIS" | "INTERIM" => Some(ContractType::Interim),
            "SAI" | "ALTERNANCE" => Some(ContractType::Alternance),
            "STG" | "STAGE" => Some(ContractType::Stage),
            _ => None,
        }
    }
}

/// Experience levels accepted by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Debutant,
    Experimente,
    Senior,
}

impl ExperienceLevel {
    pub fn code(&self) -> &'static str {
        match self {
            ExperienceLevel::Debutant => "D",
            ExperienceLevel::Experimente => "E",
            ExperienceLevel::Senior => "S",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "D" | "DEBUTANT" | "DÉBUTANT" => Some(ExperienceLevel::Debutant),
            "E" | "EXPERIMENTE" | "EXPÉRIMENTÉ" => Some(ExperienceLevel::Experimente),
            "S" | "SENIOR" => Some(ExperienceLevel::Senior),
            _ => None,
        }
    }
}

/// Search request built by the job-search tool.
#[derive(Debug, Clone, Default)]
pub struct SearchOfferRequest {
    pub keywords: Option<String>,
    pub location: Option<String>,
    pub distance: u32,
    pub contract_types: Vec<ContractType>,
    pub experience_levels: Vec<ExperienceLevel>,
    pub min_salary: Option<u32>,
    pub page: u32,
    pub per_page: u32,
}

impl SearchOfferRequest {
    pub fn new() -> Self {
        Self {
            distance: 10,
            per_page: 10,
            ..Default::default()
        }
    }
}

// ── Wire models ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Company {
    #[serde(default)]
    pub nom: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkLocation {
    #[serde(default)]
    pub libelle: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Salary {
    #[serde(default)]
    pub libelle: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Skill {
    #[serde(default)]
    pub libelle: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OfferOrigin {
    #[serde(rename = "urlOrigine", default)]
    pub url_origine: Option<String>,
}

/// One job offer as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct JobOffer {
    pub id: String,
    #[serde(rename = "intitule")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "entreprise", default)]
    pub company: Company,
    #[serde(rename = "lieuTravail", default)]
    pub location: WorkLocation,
    #[serde(rename = "typeContrat", default)]
    pub contract_type: String,
    #[serde(rename = "salaire", default)]
    pub salary: Salary,
    #[serde(rename = "experienceExige", default)]
    pub experience_required: Option<String>,
    #[serde(rename = "competences", default)]
    pub skills: Vec<Skill>,
    #[serde(rename = "dateCreation")]
    pub date_creation: DateTime<Utc>,
    #[serde(rename = "dateActualisation", default)]
    pub date_update: Option<DateTime<Utc>>,
    #[serde(rename = "origineOffre", default)]
    pub origin: OfferOrigin,
}

impl JobOffer {
    pub fn company_name(&self) -> &str {
        self.company.nom.as_deref().unwrap_or("Non précisé")
    }

    pub fn location_label(&self) -> &str {
        self.location.libelle.as_deref().unwrap_or("Non précisé")
    }
}

/// Search response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchOfferResponse {
    #[serde(rename = "totalResultats", default)]
    pub total_results: u32,
    #[serde(rename = "resultats", default)]
    pub offers: Vec<JobOffer>,
}

// ── OAuth token ─────────────────────────────────────────────────────

/// Token endpoint response body.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default)]
    pub scope: String,
}

/// Cached access token with a precomputed expiry instant.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Validity window = server-declared lifetime minus a 60s safety margin.
    pub fn from_response(response: AccessTokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            access_token: response.access_token,
            expires_at: now + Duration::seconds(response.expires_in - TOKEN_EXPIRY_MARGIN_SECS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
