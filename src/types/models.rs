use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Running total of content bytes across all documents this user owns,
    /// including trashed ones. Maintained by the engine, never recomputed
    /// on the request path.
    pub storage_bytes: i64,
    pub storage_quota_bytes: i64,
    pub max_documents: i32,
    pub max_projects: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    #[serde(skip)]
    pub token_hash: String,
    #[serde(skip)]
    pub token_lookup: String,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Document metadata. Content is stored alongside but fetched separately so
/// list endpoints never drag blobs around.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    /// Byte length of the content blob, cached for storage accounting.
    pub size_bytes: i64,
    pub is_starred: bool,
    pub is_trashed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub is_starred: bool,
    pub is_trashed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentGrant {
    pub document_id: String,
    pub user_id: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectGrant {
    pub project_id: String,
    pub user_id: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storage usage report. The raw byte counter is authoritative; the derived
/// fields are for display only.
#[derive(Debug, Clone, Serialize)]
pub struct StorageUsage {
    pub bytes_used: i64,
    pub quota_bytes: i64,
    pub percentage: f64,
}

impl StorageUsage {
    #[must_use]
    pub fn new(bytes_used: i64, quota_bytes: i64) -> Self {
        let percentage = if quota_bytes > 0 {
            bytes_used as f64 / quota_bytes as f64 * 100.0
        } else {
            0.0
        };
        Self {
            bytes_used,
            quota_bytes,
            percentage,
        }
    }

    #[must_use]
    pub fn kilobytes(&self) -> f64 {
        self.bytes_used as f64 / 1024.0
    }

    #[must_use]
    pub fn megabytes(&self) -> f64 {
        self.bytes_used as f64 / 1024.0 / 1024.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_percentage() {
        let usage = StorageUsage::new(10, 500 * 1024 * 1024);
        assert!((usage.percentage - 0.0000019073486328125).abs() < 1e-12);

        let usage = StorageUsage::new(50 * 1024 * 1024, 500 * 1024 * 1024);
        assert_eq!(usage.percentage, 10.0);
    }

    #[test]
    fn test_usage_zero_quota() {
        let usage = StorageUsage::new(0, 0);
        assert_eq!(usage.percentage, 0.0);
    }

    #[test]
    fn test_display_helpers() {
        let usage = StorageUsage::new(5 * 1024 * 1024, 500 * 1024 * 1024);
        assert_eq!(usage.kilobytes(), 5120.0);
        assert_eq!(usage.megabytes(), 5.0);
    }
}
