// Structuring prompt templates. The schema text here and the serde types in
// `models::record` must describe the same shape.

pub const PROFILE_SYSTEM: &str = "\
You convert resume / CV text into structured JSON for a hiring platform. \
You MUST respond with a single JSON object only — no markdown fences, no commentary.";

pub const PROFILE_PROMPT: &str = r#"Extract the candidate profile from the document text below.

DOCUMENT TEXT:
{document_text}

OUTPUT SCHEMA (return exactly this structure, no other keys):
{
  "contact": {
    "name": "string" | null,
    "email": "string" | null,
    "phone": "string" | null,
    "location": "string" | null,
    "link": "string" | null
  },
  "summary": "string" | null,
  "experience": [
    {
      "title": "string",
      "employer": "string",
      "start_date": "string" | null,
      "end_date": "string" | null,
      "location": "string" | null,
      "description": "string" | null
    }
  ],
  "education": [
    {
      "institution": "string",
      "degree": "string" | null,
      "field": "string" | null,
      "start_date": "string" | null,
      "end_date": "string" | null,
      "description": "string" | null
    }
  ],
  "skills": ["string"],
  "certifications": [{"name": "string", "issuer": "string" | null, "date": "string" | null}],
  "languages": [{"language": "string", "proficiency": "string" | null}],
  "projects": [
    {"name": "string", "description": "string" | null, "technologies": ["string"], "url": "string" | null}
  ]
}

RULES:
1. Omit any section that does not appear in the document. Never invent employers, dates, or skills.
2. Keep experience and education in the order they appear in the document.
3. Dates are copied as written (e.g. "Jan 2020", "2019"); use "Present" for a current role.
4. Return ONLY the JSON object."#;

pub const JOB_POSTING_SYSTEM: &str = "\
You convert job postings into structured JSON for a hiring platform. \
You MUST respond with a single JSON object only — no markdown fences, no commentary.";

pub const JOB_POSTING_PROMPT: &str = r#"Extract the job posting details from the text below.

JOB POSTING TEXT:
{posting_text}

OUTPUT SCHEMA (return exactly this structure, no other keys):
{
  "title": "string" | null,
  "company": "string" | null,
  "location": "string" | null,
  "employment_type": "string" | null,
  "summary": "string" | null,
  "responsibilities": ["string"],
  "requirements": ["string"],
  "nice_to_have": ["string"],
  "skills": ["string"]
}

RULES:
1. Omit anything the posting does not state. Never invent requirements or benefits.
2. "requirements" are must-haves; "nice_to_have" are preferred/bonus qualifications.
3. Return ONLY the JSON object."#;
