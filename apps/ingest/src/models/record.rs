//! Normalized output records. Immutable once returned by the normalizer.

use serde::{Deserialize, Serialize};

/// Bumped whenever the shape of the model-facing schema changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Whether structuring succeeded or the record fell back to raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Structured,
    Degraded,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Contact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl Contact {
    pub fn is_empty(&self) -> bool {
        [
            &self.name,
            &self.email,
            &self.phone,
            &self.location,
            &self.link,
        ]
        .iter()
        .all(|f| f.as_deref().map_or(true, |s| s.trim().is_empty()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperienceEntry {
    pub title: String,
    pub employer: String,
    #[serde(default)]
    pub start_date: Option<String>,
    /// `None` or "Present" for a current role.
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EducationEntry {
    pub institution: String,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CertificationEntry {
    pub name: String,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanguageEntry {
    pub language: String,
    #[serde(default)]
    pub proficiency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Normalized candidate profile. Always produced, possibly degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRecord {
    pub schema_version: u32,
    pub status: RecordStatus,
    pub contact: Contact,
    pub summary: Option<String>,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    /// Case-insensitively unique, first spelling wins.
    pub skills: Vec<String>,
    pub certifications: Vec<CertificationEntry>,
    pub languages: Vec<LanguageEntry>,
    pub projects: Vec<ProjectEntry>,
    pub extracted_text: String,
}

impl StructuredRecord {
    /// Raw text only; every structured section empty.
    pub fn degraded(extracted_text: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            status: RecordStatus::Degraded,
            contact: Contact::default(),
            summary: None,
            experience: Vec::new(),
            education: Vec::new(),
            skills: Vec::new(),
            certifications: Vec::new(),
            languages: Vec::new(),
            projects: Vec::new(),
            extracted_text: extracted_text.into(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status == RecordStatus::Degraded
    }

    pub(crate) fn has_structured_content(&self) -> bool {
        !self.contact.is_empty()
            || self.summary.as_deref().is_some_and(|s| !s.trim().is_empty())
            || !self.experience.is_empty()
            || !self.education.is_empty()
            || !self.skills.is_empty()
            || !self.certifications.is_empty()
            || !self.languages.is_empty()
            || !self.projects.is_empty()
    }
}

/// Normalized job posting. Degrades the same way as `StructuredRecord`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPostingRecord {
    pub schema_version: u32,
    pub status: RecordStatus,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub summary: Option<String>,
    pub responsibilities: Vec<String>,
    pub requirements: Vec<String>,
    pub nice_to_have: Vec<String>,
    pub skills: Vec<String>,
    pub source_text: String,
}

impl JobPostingRecord {
    pub fn degraded(source_text: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            status: RecordStatus::Degraded,
            title: None,
            company: None,
            location: None,
            employment_type: None,
            summary: None,
            responsibilities: Vec::new(),
            requirements: Vec::new(),
            nice_to_have: Vec::new(),
            skills: Vec::new(),
            source_text: source_text.into(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status == RecordStatus::Degraded
    }

    pub(crate) fn has_structured_content(&self) -> bool {
        [
            &self.title,
            &self.company,
            &self.location,
            &self.employment_type,
            &self.summary,
        ]
        .iter()
        .any(|f| f.as_deref().is_some_and(|s| !s.trim().is_empty()))
            || !self.responsibilities.is_empty()
            || !self.requirements.is_empty()
            || !self.nice_to_have.is_empty()
            || !self.skills.is_empty()
    }
}

/// Deduplicates case-insensitively, trimming and dropping blanks. Keeps first spelling.
pub fn dedup_skills(skills: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_record_has_empty_sections() {
        let record = StructuredRecord::degraded("raw resume text");
        assert!(record.is_degraded());
        assert!(!record.has_structured_content());
        assert_eq!(record.extracted_text, "raw resume text");
        assert_eq!(record.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_contact_blank_fields_count_as_empty() {
        let contact = Contact {
            name: Some("  ".to_string()),
            ..Contact::default()
        };
        assert!(contact.is_empty());
    }

    #[test]
    fn test_experience_rejects_unknown_fields() {
        let json = r#"{"title": "Engineer", "employer": "Acme", "salary": "lots"}"#;
        assert!(serde_json::from_str::<ExperienceEntry>(json).is_err());
    }

    #[test]
    fn test_experience_optional_fields_default() {
        let json = r#"{"title": "Engineer", "employer": "Acme"}"#;
        let entry: ExperienceEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.start_date, None);
        assert_eq!(entry.description, None);
    }

    #[test]
    fn test_dedup_skills_case_insensitive() {
        let skills = vec![
            "Rust".to_string(),
            " rust ".to_string(),
            "SQL".to_string(),
            "".to_string(),
        ];
        assert_eq!(dedup_skills(skills), vec!["Rust", "SQL"]);
    }

    #[test]
    fn test_job_posting_minor_sections_count_as_content() {
        let mut record = JobPostingRecord::degraded("Remote contract role");
        assert!(!record.has_structured_content());

        record.location = Some("Remote".to_string());
        assert!(record.has_structured_content());

        let mut record = JobPostingRecord::degraded("Remote contract role");
        record.employment_type = Some("Contract".to_string());
        assert!(record.has_structured_content());

        let mut record = JobPostingRecord::degraded("Remote contract role");
        record.nice_to_have = vec!["Kafka".to_string()];
        assert!(record.has_structured_content());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&RecordStatus::Degraded).unwrap();
        assert_eq!(json, r#""degraded""#);
    }
}
