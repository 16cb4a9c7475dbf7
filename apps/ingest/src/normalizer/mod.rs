//! Structured-Data Normalization: plain text → strict schema via the LLM.
//!
//! Never fails outward. Transport errors, non-JSON output, and wrong-shaped
//! JSON all produce a degraded record that keeps the input text.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::PipelineLimits;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_FABRICATION_INSTRUCTION};
use crate::llm_client::{strip_json_fences, GenerationRequest, LlmError, TextGenerator};
use crate::models::record::{
    dedup_skills, CertificationEntry, Contact, EducationEntry, ExperienceEntry, JobPostingRecord,
    LanguageEntry, ProjectEntry, RecordStatus, StructuredRecord, SCHEMA_VERSION,
};

pub mod prompts;

use prompts::{JOB_POSTING_PROMPT, JOB_POSTING_SYSTEM, PROFILE_PROMPT, PROFILE_SYSTEM};

/// Internal only; absorbed into a degraded record.
#[derive(Debug, Error)]
enum UpstreamModelError {
    #[error("model call failed: {0}")]
    Transport(#[from] LlmError),

    #[error("model output does not match schema: {0}")]
    Schema(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileSchema {
    #[serde(default)]
    contact: Option<Contact>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    experience: Vec<ExperienceEntry>,
    #[serde(default)]
    education: Vec<EducationEntry>,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    certifications: Vec<CertificationEntry>,
    #[serde(default)]
    languages: Vec<LanguageEntry>,
    #[serde(default)]
    projects: Vec<ProjectEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JobPostingSchema {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    employment_type: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    responsibilities: Vec<String>,
    #[serde(default)]
    requirements: Vec<String>,
    #[serde(default)]
    nice_to_have: Vec<String>,
    #[serde(default)]
    skills: Vec<String>,
}

#[derive(Clone)]
pub struct Normalizer {
    generator: Arc<dyn TextGenerator>,
    temperature: f32,
    max_tokens: u32,
}

impl Normalizer {
    pub fn new(generator: Arc<dyn TextGenerator>, limits: &PipelineLimits) -> Self {
        Self {
            generator,
            temperature: limits.llm_temperature,
            max_tokens: limits.llm_max_tokens,
        }
    }

    /// Candidate document text → `StructuredRecord`.
    pub async fn normalize_profile(&self, text: &str) -> StructuredRecord {
        let prompt = PROFILE_PROMPT.replace("{document_text}", text);
        let parsed = self
            .structured::<ProfileSchema>(PROFILE_SYSTEM, &prompt)
            .await
            .map(|schema| profile_record(schema, text));

        match parsed {
            Ok(record) if record.has_structured_content() => {
                info!(
                    "Profile structured: {} experience, {} education, {} skills",
                    record.experience.len(),
                    record.education.len(),
                    record.skills.len()
                );
                record
            }
            Ok(_) => {
                warn!("Profile structuring returned no sections; degrading to raw text");
                StructuredRecord::degraded(text)
            }
            Err(e) => {
                warn!("Profile structuring failed; degrading to raw text: {e}");
                StructuredRecord::degraded(text)
            }
        }
    }

    /// Job posting text → `JobPostingRecord`.
    pub async fn normalize_job_posting(&self, text: &str) -> JobPostingRecord {
        let prompt = JOB_POSTING_PROMPT.replace("{posting_text}", text);
        let parsed = self
            .structured::<JobPostingSchema>(JOB_POSTING_SYSTEM, &prompt)
            .await
            .map(|schema| job_posting_record(schema, text));

        match parsed {
            Ok(record) if record.has_structured_content() => {
                info!(
                    "Job posting structured: title={:?}, {} requirements",
                    record.title,
                    record.requirements.len()
                );
                record
            }
            Ok(_) => {
                warn!("Job posting structuring returned no sections; degrading to raw text");
                JobPostingRecord::degraded(text)
            }
            Err(e) => {
                warn!("Job posting structuring failed; degrading to raw text: {e}");
                JobPostingRecord::degraded(text)
            }
        }
    }

    async fn structured<T: DeserializeOwned>(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<T, UpstreamModelError> {
        let system = format!("{system}\n\n{JSON_ONLY_SYSTEM}\n\n{NO_FABRICATION_INSTRUCTION}");
        let request = GenerationRequest {
            system: &system,
            user_text: prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let output = self.generator.generate(&request).await?;
        Ok(serde_json::from_str(strip_json_fences(&output))?)
    }
}

fn profile_record(schema: ProfileSchema, text: &str) -> StructuredRecord {
    StructuredRecord {
        schema_version: SCHEMA_VERSION,
        status: RecordStatus::Structured,
        contact: schema.contact.unwrap_or_default(),
        summary: schema.summary,
        experience: schema.experience,
        education: schema.education,
        skills: dedup_skills(schema.skills),
        certifications: schema.certifications,
        languages: schema.languages,
        projects: schema.projects,
        extracted_text: text.to_string(),
    }
}

fn job_posting_record(schema: JobPostingSchema, text: &str) -> JobPostingRecord {
    JobPostingRecord {
        schema_version: SCHEMA_VERSION,
        status: RecordStatus::Structured,
        title: schema.title,
        company: schema.company,
        location: schema.location,
        employment_type: schema.employment_type,
        summary: schema.summary,
        responsibilities: schema.responsibilities,
        requirements: schema.requirements,
        nice_to_have: schema.nice_to_have,
        skills: dedup_skills(schema.skills),
        source_text: text.to_string(),
    }
}
