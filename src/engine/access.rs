use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{Error, Result};
use crate::store::format_datetime;
use crate::types::Role;

/// Resolves the role a user holds on a document from the direct grant row.
/// No row means no access; project membership never widens this.
pub(crate) fn document_role(conn: &Connection, user_id: &str, document_id: &str) -> Result<Role> {
    let role: Option<Role> = conn
        .query_row(
            "SELECT role FROM document_grants WHERE document_id = ?1 AND user_id = ?2",
            params![document_id, user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(role.unwrap_or(Role::None))
}

pub(crate) fn project_role(conn: &Connection, user_id: &str, project_id: &str) -> Result<Role> {
    let role: Option<Role> = conn
        .query_row(
            "SELECT role FROM project_grants WHERE project_id = ?1 AND user_id = ?2",
            params![project_id, user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(role.unwrap_or(Role::None))
}

/// Resolves and checks in one step. Insufficient role is `Forbidden`, an
/// expected outcome rather than an internal error.
pub(crate) fn require_document_role(
    conn: &Connection,
    user_id: &str,
    document_id: &str,
    required: Role,
) -> Result<Role> {
    let role = document_role(conn, user_id, document_id)?;
    if !role.allows(required) {
        return Err(Error::Forbidden);
    }
    Ok(role)
}

pub(crate) fn require_project_role(
    conn: &Connection,
    user_id: &str,
    project_id: &str,
    required: Role,
) -> Result<Role> {
    let role = project_role(conn, user_id, project_id)?;
    if !role.allows(required) {
        return Err(Error::Forbidden);
    }
    Ok(role)
}

pub(crate) fn upsert_document_grant(
    conn: &Connection,
    document_id: &str,
    user_id: &str,
    role: Role,
) -> Result<()> {
    let now = format_datetime(&chrono::Utc::now());
    conn.execute(
        "INSERT INTO document_grants (document_id, user_id, role, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT (document_id, user_id) DO UPDATE SET
            role = excluded.role,
            updated_at = excluded.updated_at",
        params![document_id, user_id, role, now],
    )?;
    Ok(())
}

pub(crate) fn upsert_project_grant(
    conn: &Connection,
    project_id: &str,
    user_id: &str,
    role: Role,
) -> Result<()> {
    let now = format_datetime(&chrono::Utc::now());
    conn.execute(
        "INSERT INTO project_grants (project_id, user_id, role, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT (project_id, user_id) DO UPDATE SET
            role = excluded.role,
            updated_at = excluded.updated_at",
        params![project_id, user_id, role, now],
    )?;
    Ok(())
}

pub(crate) fn delete_document_grant(
    conn: &Connection,
    document_id: &str,
    user_id: &str,
) -> Result<bool> {
    let rows = conn.execute(
        "DELETE FROM document_grants WHERE document_id = ?1 AND user_id = ?2",
        params![document_id, user_id],
    )?;
    Ok(rows > 0)
}

pub(crate) fn delete_project_grant(
    conn: &Connection,
    project_id: &str,
    user_id: &str,
) -> Result<bool> {
    let rows = conn.execute(
        "DELETE FROM project_grants WHERE project_id = ?1 AND user_id = ?2",
        params![project_id, user_id],
    )?;
    Ok(rows > 0)
}

/// Removes every grant row for a document. Only valid inside a purge
/// transaction, after which the document row itself goes away.
pub(crate) fn remove_document_grants(conn: &Connection, document_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM document_grants WHERE document_id = ?1",
        params![document_id],
    )?;
    Ok(())
}

pub(crate) fn remove_project_grants(conn: &Connection, project_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM project_grants WHERE project_id = ?1",
        params![project_id],
    )?;
    Ok(())
}

pub(crate) fn user_exists(conn: &Connection, user_id: &str) -> Result<bool> {
    let found: Option<i32> = conn
        .query_row(
            "SELECT 1 FROM users WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}
