//! The resource engine: every mutation of documents, projects, grants,
//! links, and storage counters goes through here, one transaction per
//! operation. An operation authorizes first, pre-checks quota where content
//! is involved, applies the mutation, and commits — or rolls the whole
//! thing back. Nothing outside this module writes those tables.

mod access;
mod lifecycle;
mod links;
mod quota;

use std::cmp;
use std::sync::Arc;

use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::{SqliteStore, Store};
use crate::types::{Document, Project, ResourceKind, Role, StorageUsage};

/// Default per-user ceilings, applied when an admin creates a user without
/// overrides.
pub const DEFAULT_STORAGE_QUOTA_BYTES: i64 = 500 * 1024 * 1024;
pub const DEFAULT_MAX_DOCUMENTS: i32 = 1000;
pub const DEFAULT_MAX_PROJECTS: i32 = 100;

/// Engine policy knobs. `inherit_project_role` controls whether creating a
/// document inside a project mirrors the project's grants onto the new
/// document (capped at editor, never raising an existing grant). Off by
/// default: project membership should not silently widen document access.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnginePolicy {
    pub inherit_project_role: bool,
    pub default_storage_quota_bytes: i64,
    pub default_max_documents: i32,
    pub default_max_projects: i32,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            inherit_project_role: false,
            default_storage_quota_bytes: DEFAULT_STORAGE_QUOTA_BYTES,
            default_max_documents: DEFAULT_MAX_DOCUMENTS,
            default_max_projects: DEFAULT_MAX_PROJECTS,
        }
    }
}

#[derive(Clone)]
pub struct Engine {
    store: Arc<SqliteStore>,
    policy: EnginePolicy,
}

impl Engine {
    pub fn new(store: Arc<SqliteStore>, policy: EnginePolicy) -> Self {
        Self { store, policy }
    }

    #[must_use]
    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    // Document operations

    /// Creates a document owned by `user_id`, charging its byte length
    /// against the owner's quota. With `project_id` the document is linked
    /// into the project (caller needs editor there too).
    pub fn create_document(
        &self,
        user_id: &str,
        name: &str,
        content: &str,
        project_id: Option<&str>,
    ) -> Result<Document> {
        let mut conn = self.store.connection();
        let tx = conn.transaction()?;

        let max_documents: i32 = tx
            .query_row(
                "SELECT max_documents FROM users WHERE id = ?1",
                [user_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(Error::NotFound)?;
        let owned: i32 = tx.query_row(
            "SELECT COUNT(*) FROM documents WHERE owner_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        if owned >= max_documents {
            return Err(Error::LimitExceeded(format!(
                "document limit of {max_documents} reached"
            )));
        }

        let project = match project_id {
            Some(pid) => {
                let project = lifecycle::get_project(&tx, pid)?.ok_or(Error::NotFound)?;
                access::require_project_role(&tx, user_id, pid, Role::Editor)?;
                lifecycle::ensure_active(project.is_trashed, "project")?;
                Some(project)
            }
            None => None,
        };

        quota::charge(&tx, user_id, content.len() as i64)?;

        let now = Utc::now();
        let doc = Document {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            owner_id: user_id.to_string(),
            size_bytes: content.len() as i64,
            is_starred: false,
            is_trashed: false,
            created_at: now,
            updated_at: now,
        };

        lifecycle::insert_document(&tx, &doc, content)?;
        access::upsert_document_grant(&tx, &doc.id, user_id, Role::Owner)?;

        if let Some(project) = project {
            links::link(&tx, &doc.id, &project.id)?;

            if self.policy.inherit_project_role {
                self.mirror_project_grants(&tx, &project.id, &doc.id, user_id)?;
            }
        }

        tx.commit()?;
        Ok(doc)
    }

    /// Mirrors project grants onto a newly created document, capped at
    /// editor. An existing higher document grant is never lowered, and the
    /// creator's owner row is never touched.
    fn mirror_project_grants(
        &self,
        conn: &rusqlite::Connection,
        project_id: &str,
        document_id: &str,
        creator_id: &str,
    ) -> Result<()> {
        let mut stmt =
            conn.prepare("SELECT user_id, role FROM project_grants WHERE project_id = ?1")?;
        let grants = stmt
            .query_map([project_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Role>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for (member_id, project_role) in grants {
            if member_id == creator_id {
                continue;
            }
            let inherited = cmp::min(project_role, Role::Editor);
            let existing = access::document_role(conn, &member_id, document_id)?;
            if inherited > existing {
                access::upsert_document_grant(conn, document_id, &member_id, inherited)?;
            }
        }
        Ok(())
    }

    /// Updates name and/or content. A content change charges the byte delta
    /// to the document's owner (not the caller), so shared editors spend
    /// the owner's quota.
    pub fn update_document(
        &self,
        user_id: &str,
        document_id: &str,
        name: Option<&str>,
        content: Option<&str>,
    ) -> Result<Document> {
        let mut conn = self.store.connection();
        let tx = conn.transaction()?;

        let doc = lifecycle::get_document(&tx, document_id)?.ok_or(Error::NotFound)?;
        access::require_document_role(&tx, user_id, document_id, Role::Editor)?;
        lifecycle::ensure_active(doc.is_trashed, "document")?;

        if let Some(content) = content {
            let delta = content.len() as i64 - doc.size_bytes;
            quota::charge(&tx, &doc.owner_id, delta)?;
            lifecycle::set_document_content(&tx, document_id, content)?;
        }
        if let Some(name) = name {
            lifecycle::set_document_name(&tx, document_id, name)?;
        }

        let updated = lifecycle::get_document(&tx, document_id)?.ok_or(Error::NotFound)?;
        tx.commit()?;
        Ok(updated)
    }

    pub fn trash_document(&self, user_id: &str, document_id: &str) -> Result<Document> {
        let mut conn = self.store.connection();
        let tx = conn.transaction()?;

        let doc = lifecycle::get_document(&tx, document_id)?.ok_or(Error::NotFound)?;
        access::require_document_role(&tx, user_id, document_id, Role::Editor)?;
        lifecycle::ensure_active(doc.is_trashed, "document")?;
        lifecycle::set_document_trashed(&tx, document_id, true)?;

        let updated = lifecycle::get_document(&tx, document_id)?.ok_or(Error::NotFound)?;
        tx.commit()?;
        Ok(updated)
    }

    pub fn restore_document(&self, user_id: &str, document_id: &str) -> Result<Document> {
        let mut conn = self.store.connection();
        let tx = conn.transaction()?;

        let doc = lifecycle::get_document(&tx, document_id)?.ok_or(Error::NotFound)?;
        access::require_document_role(&tx, user_id, document_id, Role::Editor)?;
        lifecycle::ensure_trashed(doc.is_trashed, "document")?;
        lifecycle::set_document_trashed(&tx, document_id, false)?;

        let updated = lifecycle::get_document(&tx, document_id)?.ok_or(Error::NotFound)?;
        tx.commit()?;
        Ok(updated)
    }

    /// Star or unstar. Works in the trash too — starring is organizational
    /// metadata, not a content mutation.
    pub fn star_document(
        &self,
        user_id: &str,
        document_id: &str,
        starred: bool,
    ) -> Result<Document> {
        let mut conn = self.store.connection();
        let tx = conn.transaction()?;

        lifecycle::get_document(&tx, document_id)?.ok_or(Error::NotFound)?;
        access::require_document_role(&tx, user_id, document_id, Role::Editor)?;
        lifecycle::set_document_starred(&tx, document_id, starred)?;

        let updated = lifecycle::get_document(&tx, document_id)?.ok_or(Error::NotFound)?;
        tx.commit()?;
        Ok(updated)
    }

    /// Irreversibly deletes a trashed document: releases its byte charge
    /// from the owner, removes grant and link rows, then the row itself.
    /// Owner only.
    pub fn purge_document(&self, user_id: &str, document_id: &str) -> Result<()> {
        let mut conn = self.store.connection();
        let tx = conn.transaction()?;

        let doc = lifecycle::get_document(&tx, document_id)?.ok_or(Error::NotFound)?;
        access::require_document_role(&tx, user_id, document_id, Role::Owner)?;
        lifecycle::ensure_trashed(doc.is_trashed, "document")?;

        quota::release(&tx, &doc.owner_id, doc.size_bytes)?;
        access::remove_document_grants(&tx, document_id)?;
        links::remove_document_links(&tx, document_id)?;
        lifecycle::delete_document_row(&tx, document_id)?;

        tx.commit()?;
        Ok(())
    }

    /// Content read. Any role (viewer and up) suffices, including on
    /// trashed documents.
    pub fn get_document(&self, user_id: &str, document_id: &str) -> Result<(Document, String)> {
        let conn = self.store.connection();

        let doc = lifecycle::get_document(&conn, document_id)?.ok_or(Error::NotFound)?;
        access::require_document_role(&conn, user_id, document_id, Role::Viewer)?;
        let content =
            lifecycle::get_document_content(&conn, document_id)?.ok_or(Error::NotFound)?;
        Ok((doc, content))
    }

    // Project operations

    pub fn create_project(&self, user_id: &str, name: &str) -> Result<Project> {
        let mut conn = self.store.connection();
        let tx = conn.transaction()?;

        let max_projects: i32 = tx
            .query_row(
                "SELECT max_projects FROM users WHERE id = ?1",
                [user_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(Error::NotFound)?;
        let owned: i32 = tx.query_row(
            "SELECT COUNT(*) FROM projects WHERE owner_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        if owned >= max_projects {
            return Err(Error::LimitExceeded(format!(
                "project limit of {max_projects} reached"
            )));
        }

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            owner_id: user_id.to_string(),
            is_starred: false,
            is_trashed: false,
            created_at: now,
            updated_at: now,
        };

        lifecycle::insert_project(&tx, &project)?;
        access::upsert_project_grant(&tx, &project.id, user_id, Role::Owner)?;

        tx.commit()?;
        Ok(project)
    }

    pub fn update_project(&self, user_id: &str, project_id: &str, name: &str) -> Result<Project> {
        let mut conn = self.store.connection();
        let tx = conn.transaction()?;

        let project = lifecycle::get_project(&tx, project_id)?.ok_or(Error::NotFound)?;
        access::require_project_role(&tx, user_id, project_id, Role::Editor)?;
        lifecycle::ensure_active(project.is_trashed, "project")?;
        lifecycle::set_project_name(&tx, project_id, name)?;

        let updated = lifecycle::get_project(&tx, project_id)?.ok_or(Error::NotFound)?;
        tx.commit()?;
        Ok(updated)
    }

    pub fn get_project(&self, user_id: &str, project_id: &str) -> Result<Project> {
        let conn = self.store.connection();

        let project = lifecycle::get_project(&conn, project_id)?.ok_or(Error::NotFound)?;
        access::require_project_role(&conn, user_id, project_id, Role::Viewer)?;
        Ok(project)
    }

    pub fn trash_project(&self, user_id: &str, project_id: &str) -> Result<Project> {
        let mut conn = self.store.connection();
        let tx = conn.transaction()?;

        let project = lifecycle::get_project(&tx, project_id)?.ok_or(Error::NotFound)?;
        access::require_project_role(&tx, user_id, project_id, Role::Editor)?;
        lifecycle::ensure_active(project.is_trashed, "project")?;
        lifecycle::set_project_trashed(&tx, project_id, true)?;

        let updated = lifecycle::get_project(&tx, project_id)?.ok_or(Error::NotFound)?;
        tx.commit()?;
        Ok(updated)
    }

    pub fn restore_project(&self, user_id: &str, project_id: &str) -> Result<Project> {
        let mut conn = self.store.connection();
        let tx = conn.transaction()?;

        let project = lifecycle::get_project(&tx, project_id)?.ok_or(Error::NotFound)?;
        access::require_project_role(&tx, user_id, project_id, Role::Editor)?;
        lifecycle::ensure_trashed(project.is_trashed, "project")?;
        lifecycle::set_project_trashed(&tx, project_id, false)?;

        let updated = lifecycle::get_project(&tx, project_id)?.ok_or(Error::NotFound)?;
        tx.commit()?;
        Ok(updated)
    }

    pub fn star_project(&self, user_id: &str, project_id: &str, starred: bool) -> Result<Project> {
        let mut conn = self.store.connection();
        let tx = conn.transaction()?;

        lifecycle::get_project(&tx, project_id)?.ok_or(Error::NotFound)?;
        access::require_project_role(&tx, user_id, project_id, Role::Editor)?;
        lifecycle::set_project_starred(&tx, project_id, starred)?;

        let updated = lifecycle::get_project(&tx, project_id)?.ok_or(Error::NotFound)?;
        tx.commit()?;
        Ok(updated)
    }

    /// Irreversibly deletes a trashed project: removes its grant rows and
    /// membership links. The documents that were in the project are never
    /// touched — deleting a container does not delete its contents.
    pub fn purge_project(&self, user_id: &str, project_id: &str) -> Result<()> {
        let mut conn = self.store.connection();
        let tx = conn.transaction()?;

        let project = lifecycle::get_project(&tx, project_id)?.ok_or(Error::NotFound)?;
        access::require_project_role(&tx, user_id, project_id, Role::Owner)?;
        lifecycle::ensure_trashed(project.is_trashed, "project")?;

        access::remove_project_grants(&tx, project_id)?;
        links::remove_project_links(&tx, project_id)?;
        lifecycle::delete_project_row(&tx, project_id)?;

        tx.commit()?;
        Ok(())
    }

    // Associations

    /// Links a document into a project. Requires editor on both sides and
    /// both active. Linking an already-linked pair succeeds silently.
    pub fn link_document(
        &self,
        user_id: &str,
        document_id: &str,
        project_id: &str,
    ) -> Result<()> {
        let mut conn = self.store.connection();
        let tx = conn.transaction()?;

        let doc = lifecycle::get_document(&tx, document_id)?.ok_or(Error::NotFound)?;
        let project = lifecycle::get_project(&tx, project_id)?.ok_or(Error::NotFound)?;
        access::require_document_role(&tx, user_id, document_id, Role::Editor)?;
        access::require_project_role(&tx, user_id, project_id, Role::Editor)?;
        lifecycle::ensure_active(doc.is_trashed, "document")?;
        lifecycle::ensure_active(project.is_trashed, "project")?;

        links::link(&tx, document_id, project_id)?;

        tx.commit()?;
        Ok(())
    }

    /// Removes a document from a project. Same requirements as `link`;
    /// unlinking a pair that is not linked succeeds silently.
    pub fn unlink_document(
        &self,
        user_id: &str,
        document_id: &str,
        project_id: &str,
    ) -> Result<()> {
        let mut conn = self.store.connection();
        let tx = conn.transaction()?;

        let doc = lifecycle::get_document(&tx, document_id)?.ok_or(Error::NotFound)?;
        let project = lifecycle::get_project(&tx, project_id)?.ok_or(Error::NotFound)?;
        access::require_document_role(&tx, user_id, document_id, Role::Editor)?;
        access::require_project_role(&tx, user_id, project_id, Role::Editor)?;
        lifecycle::ensure_active(doc.is_trashed, "document")?;
        lifecycle::ensure_active(project.is_trashed, "project")?;

        links::unlink(&tx, document_id, project_id)?;

        tx.commit()?;
        Ok(())
    }

    /// Documents linked into a project, visible to anyone with a role on
    /// the project. Membership exposes metadata only: reading a document's
    /// content still requires a document-level role.
    pub fn list_project_documents(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> Result<Vec<Document>> {
        let conn = self.store.connection();

        lifecycle::get_project(&conn, project_id)?.ok_or(Error::NotFound)?;
        access::require_project_role(&conn, user_id, project_id, Role::Viewer)?;
        links::project_documents(&conn, project_id)
    }

    pub fn list_document_projects(
        &self,
        user_id: &str,
        document_id: &str,
    ) -> Result<Vec<Project>> {
        let conn = self.store.connection();

        lifecycle::get_document(&conn, document_id)?.ok_or(Error::NotFound)?;
        access::require_document_role(&conn, user_id, document_id, Role::Viewer)?;
        links::document_projects(&conn, document_id)
    }

    // Sharing

    /// Grants `role` on a resource to `target_id`. Owner only; the role
    /// must be viewer or editor — ownership moves through `transfer_owner`.
    pub fn share(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &str,
        target_id: &str,
        role: Role,
    ) -> Result<()> {
        if !role.is_grantable() {
            return Err(Error::BadRequest(
                "role must be viewer or editor".to_string(),
            ));
        }

        let mut conn = self.store.connection();
        let tx = conn.transaction()?;

        let owner_id = match kind {
            ResourceKind::Document => {
                let doc = lifecycle::get_document(&tx, resource_id)?.ok_or(Error::NotFound)?;
                access::require_document_role(&tx, user_id, resource_id, Role::Owner)?;
                doc.owner_id
            }
            ResourceKind::Project => {
                let project = lifecycle::get_project(&tx, resource_id)?.ok_or(Error::NotFound)?;
                access::require_project_role(&tx, user_id, resource_id, Role::Owner)?;
                project.owner_id
            }
        };

        if !access::user_exists(&tx, target_id)? {
            return Err(Error::NotFound);
        }
        if target_id == owner_id {
            return Err(Error::Conflict(
                "cannot change the owner's role; transfer ownership instead".to_string(),
            ));
        }

        match kind {
            ResourceKind::Document => {
                access::upsert_document_grant(&tx, resource_id, target_id, role)?;
            }
            ResourceKind::Project => {
                access::upsert_project_grant(&tx, resource_id, target_id, role)?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Removes `target_id`'s grant. Owner only; the owner row itself can
    /// never be revoked — a resource always has exactly one owner.
    pub fn revoke(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &str,
        target_id: &str,
    ) -> Result<()> {
        let mut conn = self.store.connection();
        let tx = conn.transaction()?;

        let removed = match kind {
            ResourceKind::Document => {
                let doc = lifecycle::get_document(&tx, resource_id)?.ok_or(Error::NotFound)?;
                access::require_document_role(&tx, user_id, resource_id, Role::Owner)?;
                if target_id == doc.owner_id {
                    return Err(Error::Conflict(
                        "cannot revoke the owner's access".to_string(),
                    ));
                }
                access::delete_document_grant(&tx, resource_id, target_id)?
            }
            ResourceKind::Project => {
                let project = lifecycle::get_project(&tx, resource_id)?.ok_or(Error::NotFound)?;
                access::require_project_role(&tx, user_id, resource_id, Role::Owner)?;
                if target_id == project.owner_id {
                    return Err(Error::Conflict(
                        "cannot revoke the owner's access".to_string(),
                    ));
                }
                access::delete_project_grant(&tx, resource_id, target_id)?
            }
        };

        if !removed {
            return Err(Error::NotFound);
        }

        tx.commit()?;
        Ok(())
    }

    /// Transfers ownership. The old owner is demoted to editor and the new
    /// owner promoted in the same transaction, so the resource never has
    /// zero or two owners. For documents the byte charge moves with the
    /// ownership and the transfer fails if the new owner lacks quota
    /// headroom.
    pub fn transfer_owner(
        &self,
        user_id: &str,
        kind: ResourceKind,
        resource_id: &str,
        new_owner_id: &str,
    ) -> Result<()> {
        let mut conn = self.store.connection();
        let tx = conn.transaction()?;

        match kind {
            ResourceKind::Document => {
                let doc = lifecycle::get_document(&tx, resource_id)?.ok_or(Error::NotFound)?;
                access::require_document_role(&tx, user_id, resource_id, Role::Owner)?;
                if new_owner_id == doc.owner_id {
                    return Err(Error::Conflict("user already owns this document".to_string()));
                }
                if !access::user_exists(&tx, new_owner_id)? {
                    return Err(Error::NotFound);
                }

                quota::release(&tx, &doc.owner_id, doc.size_bytes)?;
                quota::charge(&tx, new_owner_id, doc.size_bytes)?;
                lifecycle::set_document_owner(&tx, resource_id, new_owner_id)?;
                access::upsert_document_grant(&tx, resource_id, &doc.owner_id, Role::Editor)?;
                access::upsert_document_grant(&tx, resource_id, new_owner_id, Role::Owner)?;
            }
            ResourceKind::Project => {
                let project = lifecycle::get_project(&tx, resource_id)?.ok_or(Error::NotFound)?;
                access::require_project_role(&tx, user_id, resource_id, Role::Owner)?;
                if new_owner_id == project.owner_id {
                    return Err(Error::Conflict("user already owns this project".to_string()));
                }
                if !access::user_exists(&tx, new_owner_id)? {
                    return Err(Error::NotFound);
                }

                lifecycle::set_project_owner(&tx, resource_id, new_owner_id)?;
                access::upsert_project_grant(&tx, resource_id, &project.owner_id, Role::Editor)?;
                access::upsert_project_grant(&tx, resource_id, new_owner_id, Role::Owner)?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    // Role resolution (pure reads, exposed for handlers)

    pub fn document_role(&self, user_id: &str, document_id: &str) -> Result<Role> {
        let conn = self.store.connection();
        access::document_role(&conn, user_id, document_id)
    }

    pub fn project_role(&self, user_id: &str, project_id: &str) -> Result<Role> {
        let conn = self.store.connection();
        access::project_role(&conn, user_id, project_id)
    }

    // Storage accounting

    pub fn storage_usage(&self, user_id: &str) -> Result<StorageUsage> {
        let user = self.store.get_user(user_id)?.ok_or(Error::NotFound)?;
        Ok(StorageUsage::new(
            user.storage_bytes,
            user.storage_quota_bytes,
        ))
    }

    /// Consistency check: the counter must equal the recomputed sum of
    /// owned document sizes. A mismatch means the accounting drifted and
    /// is surfaced as an invariant violation, never patched up silently.
    pub fn audit_storage(&self, user_id: &str) -> Result<StorageUsage> {
        let conn = self.store.connection();

        let row: Option<(i64, i64)> = conn
            .query_row(
                "SELECT storage_bytes, storage_quota_bytes FROM users WHERE id = ?1",
                [user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (counter, quota) = row.ok_or(Error::NotFound)?;

        let computed: i64 = conn.query_row(
            "SELECT COALESCE(SUM(size_bytes), 0) FROM documents WHERE owner_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;

        if counter != computed {
            tracing::error!(
                user_id,
                counter,
                computed,
                "storage counter does not match stored content"
            );
            return Err(Error::InvariantViolation(format!(
                "storage counter for user {user_id} is {counter}, stored content sums to {computed}"
            )));
        }

        Ok(StorageUsage::new(counter, quota))
    }
}
