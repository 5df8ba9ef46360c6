//! Specialized chains — single-shot template completions for concrete
//! deliverables (profile analysis, CV, cover letter, training plan, admin
//! explanation). No tool use, no loop: one completion per call.

use std::sync::Arc;

use crate::agent::intent::Intent;
use crate::agent::prompts;
use crate::conversation::UserProfile;
use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

/// Returned for intents that have no specialized chain. The specialization
/// gate keeps those intents on the general path upstream.
pub const UNSUPPORTED_SPECIALIZED_MESSAGE: &str =
    "Je ne peux pas traiter cette demande spécialisée pour le moment.";

/// Dispatcher over the specialized prompt chains.
pub struct SpecializedChains {
    llm: Arc<dyn LlmProvider>,
    max_tokens: u32,
    temperature: f32,
}

impl SpecializedChains {
    pub fn new(llm: Arc<dyn LlmProvider>, max_tokens: u32, temperature: f32) -> Self {
        Self {
            llm,
            max_tokens,
            temperature,
        }
    }

    /// Route an intent to its chain. Exactly one completion call.
    pub async fn run(
        &self,
        intent: Intent,
        message: &str,
        profile: &UserProfile,
    ) -> Result<String, LlmError> {
        let profile_text = profile.summary();
        match intent {
            Intent::Profile => self.analyze_profile(&profile_text, message).await,
            Intent::CvHelp => {
                self.generate_cv(
                    &profile_text,
                    profile.target_job.as_deref().unwrap_or("À définir"),
                    "À compléter",
                    &skills_or_default(profile),
                )
                .await
            }
            Intent::CoverLetter => {
                self.generate_cover_letter(&profile_text, "À préciser", message, "À développer")
                    .await
            }
            Intent::Training => {
                let skills = if profile.skills.is_empty() {
                    "À définir".to_string()
                } else {
                    profile.skills.join(", ")
                };
                self.training_advice(
                    &skills,
                    profile.target_job.as_deref().unwrap_or("À préciser"),
                    "À déterminer",
                    "À préciser",
                )
                .await
            }
            Intent::Admin => self.admin_help(message, &profile_text, "").await,
            Intent::JobSearch | Intent::General => {
                Ok(UNSUPPORTED_SPECIALIZED_MESSAGE.to_string())
            }
        }
    }

    pub async fn analyze_profile(
        &self,
        user_info: &str,
        objectives: &str,
    ) -> Result<String, LlmError> {
        self.complete(prompts::profile_analysis_prompt(user_info, objectives))
            .await
    }

    pub async fn generate_cv(
        &self,
        profile: &str,
        target_job: &str,
        experiences: &str,
        skills: &str,
    ) -> Result<String, LlmError> {
        self.complete(prompts::cv_generation_prompt(
            profile, target_job, experiences, skills,
        ))
        .await
    }

    pub async fn generate_cover_letter(
        &self,
        profile: &str,
        company: &str,
        job_offer: &str,
        motivations: &str,
    ) -> Result<String, LlmError> {
        self.complete(prompts::cover_letter_prompt(
            profile, company, job_offer, motivations,
        ))
        .await
    }

    pub async fn training_advice(
        &self,
        current_skills: &str,
        target_job: &str,
        available_time: &str,
        budget: &str,
    ) -> Result<String, LlmError> {
        self.complete(prompts::training_advice_prompt(
            current_skills,
            target_job,
            available_time,
            budget,
        ))
        .await
    }

    pub async fn admin_help(
        &self,
        question: &str,
        user_situation: &str,
        context: &str,
    ) -> Result<String, LlmError> {
        self.complete(prompts::admin_help_prompt(question, user_situation, context))
            .await
    }

    async fn complete(&self, prompt: String) -> Result<String, LlmError> {
        let mut request = CompletionRequest::new(vec![ChatMessage::user(prompt)]);
        request.max_tokens = self.max_tokens;
        request.temperature = self.temperature;
        let response = self.llm.complete(request).await?;
        Ok(response.content)
    }
}

fn skills_or_default(profile: &UserProfile) -> String {
    if profile.skills.is_empty() {
        "À compléter".to_string()
    } else {
        profile.skills.join(", ")
    }
}
