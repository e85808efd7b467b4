mod schema;
mod sqlite;

pub use sqlite::SqliteStore;
pub(crate) use sqlite::{format_datetime, read_document, read_project};

use crate::error::Result;
use crate::types::*;

/// Store defines the read and single-row-write database interface.
///
/// Multi-step mutations that carry invariants (document/project lifecycle,
/// grants, links, storage accounting) do not live here: they go through the
/// engine, which runs them in one transaction on the underlying connection.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, user: &User) -> Result<()>;
    fn get_user(&self, id: &str) -> Result<Option<User>>;
    fn get_user_by_name(&self, name: &str) -> Result<Option<User>>;
    fn list_users(&self, cursor: &str, limit: i32) -> Result<Vec<User>>;
    fn update_user_limits(
        &self,
        id: &str,
        storage_quota_bytes: Option<i64>,
        max_documents: Option<i32>,
        max_projects: Option<i32>,
    ) -> Result<()>;
    fn delete_user(&self, id: &str) -> Result<bool>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn list_tokens(&self, cursor: &str, limit: i32) -> Result<Vec<Token>>;
    fn list_user_tokens(&self, user_id: &str) -> Result<Vec<Token>>;
    fn delete_token(&self, id: &str) -> Result<bool>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;

    // Document reads
    fn get_document(&self, id: &str) -> Result<Option<Document>>;
    fn get_document_content(&self, id: &str) -> Result<Option<String>>;
    /// Active (non-trashed) documents the user owns or has a grant on.
    fn list_documents_for_user(&self, user_id: &str, cursor: &str, limit: i32)
    -> Result<Vec<Document>>;
    /// Trashed documents the user owns or has a grant on.
    fn list_trashed_documents_for_user(
        &self,
        user_id: &str,
        cursor: &str,
        limit: i32,
    ) -> Result<Vec<Document>>;
    fn count_owned_documents(&self, user_id: &str) -> Result<i32>;
    /// Recomputed sum of size_bytes over all documents owned by the user.
    /// Used only by the storage audit, never on the request path.
    fn sum_owned_document_bytes(&self, user_id: &str) -> Result<i64>;

    // Project reads
    fn get_project(&self, id: &str) -> Result<Option<Project>>;
    fn list_projects_for_user(&self, user_id: &str, cursor: &str, limit: i32)
    -> Result<Vec<Project>>;
    fn list_trashed_projects_for_user(
        &self,
        user_id: &str,
        cursor: &str,
        limit: i32,
    ) -> Result<Vec<Project>>;
    fn count_owned_projects(&self, user_id: &str) -> Result<i32>;

    // Grant reads
    fn get_document_grant(&self, document_id: &str, user_id: &str)
    -> Result<Option<DocumentGrant>>;
    fn list_document_grants(&self, document_id: &str) -> Result<Vec<DocumentGrant>>;
    fn get_project_grant(&self, project_id: &str, user_id: &str) -> Result<Option<ProjectGrant>>;
    fn list_project_grants(&self, project_id: &str) -> Result<Vec<ProjectGrant>>;
    /// Number of owner-role grant rows on a document. 1 for every live
    /// document; anything else is an invariant violation.
    fn count_document_owner_rows(&self, document_id: &str) -> Result<i32>;
    fn count_project_owner_rows(&self, project_id: &str) -> Result<i32>;

    // Association reads
    fn list_project_documents(&self, project_id: &str) -> Result<Vec<Document>>;
    fn list_document_projects(&self, document_id: &str) -> Result<Vec<Project>>;

    // Admin token check
    fn has_admin_token(&self) -> Result<bool>;

    fn close(&self) -> Result<()>;
}
