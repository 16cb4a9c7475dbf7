use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Reference to an uploaded blob owned by a user. The bytes live in storage.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoredDocument {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub bucket: String,
    pub path: String,
    pub original_name: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}
