use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{Error, Result};
use crate::store::{format_datetime, read_document, read_project};
use crate::types::{Document, Project};

/// State guard for operations that only make sense on an active resource.
/// Trashed resources must be restored first; this is a `Conflict`, not
/// `Forbidden` — the caller may well have the role, the state is wrong.
pub(crate) fn ensure_active(is_trashed: bool, what: &str) -> Result<()> {
    if is_trashed {
        return Err(Error::Conflict(format!("{what} is in the trash")));
    }
    Ok(())
}

/// State guard for purge: only trashed resources can be purged.
pub(crate) fn ensure_trashed(is_trashed: bool, what: &str) -> Result<()> {
    if !is_trashed {
        return Err(Error::Conflict(format!("{what} is not in the trash")));
    }
    Ok(())
}

pub(crate) fn get_document(conn: &Connection, id: &str) -> Result<Option<Document>> {
    conn.query_row(
        "SELECT id, name, owner_id, size_bytes, is_starred, is_trashed, created_at, updated_at
         FROM documents WHERE id = ?1",
        params![id],
        read_document,
    )
    .optional()
    .map_err(Error::from)
}

pub(crate) fn get_project(conn: &Connection, id: &str) -> Result<Option<Project>> {
    conn.query_row(
        "SELECT id, name, owner_id, is_starred, is_trashed, created_at, updated_at
         FROM projects WHERE id = ?1",
        params![id],
        read_project,
    )
    .optional()
    .map_err(Error::from)
}

pub(crate) fn get_document_content(conn: &Connection, id: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT content FROM documents WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
    .optional()
    .map_err(Error::from)
}

pub(crate) fn insert_document(conn: &Connection, doc: &Document, content: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO documents (id, name, owner_id, content, size_bytes, is_starred, is_trashed, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            doc.id,
            doc.name,
            doc.owner_id,
            content,
            doc.size_bytes,
            doc.is_starred,
            doc.is_trashed,
            format_datetime(&doc.created_at),
            format_datetime(&doc.updated_at),
        ],
    )?;
    Ok(())
}

pub(crate) fn insert_project(conn: &Connection, project: &Project) -> Result<()> {
    conn.execute(
        "INSERT INTO projects (id, name, owner_id, is_starred, is_trashed, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            project.id,
            project.name,
            project.owner_id,
            project.is_starred,
            project.is_trashed,
            format_datetime(&project.created_at),
            format_datetime(&project.updated_at),
        ],
    )?;
    Ok(())
}

pub(crate) fn set_document_name(conn: &Connection, id: &str, name: &str) -> Result<()> {
    let rows = conn.execute(
        "UPDATE documents SET name = ?1, updated_at = ?2 WHERE id = ?3",
        params![name, format_datetime(&Utc::now()), id],
    )?;
    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

/// Writes new content and its cached byte length in one statement so the
/// two can never disagree.
pub(crate) fn set_document_content(conn: &Connection, id: &str, content: &str) -> Result<()> {
    let rows = conn.execute(
        "UPDATE documents SET content = ?1, size_bytes = ?2, updated_at = ?3 WHERE id = ?4",
        params![
            content,
            content.len() as i64,
            format_datetime(&Utc::now()),
            id
        ],
    )?;
    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

pub(crate) fn set_document_trashed(conn: &Connection, id: &str, trashed: bool) -> Result<()> {
    let rows = conn.execute(
        "UPDATE documents SET is_trashed = ?1, updated_at = ?2 WHERE id = ?3",
        params![trashed, format_datetime(&Utc::now()), id],
    )?;
    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

pub(crate) fn set_document_starred(conn: &Connection, id: &str, starred: bool) -> Result<()> {
    let rows = conn.execute(
        "UPDATE documents SET is_starred = ?1, updated_at = ?2 WHERE id = ?3",
        params![starred, format_datetime(&Utc::now()), id],
    )?;
    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

pub(crate) fn set_document_owner(conn: &Connection, id: &str, owner_id: &str) -> Result<()> {
    let rows = conn.execute(
        "UPDATE documents SET owner_id = ?1, updated_at = ?2 WHERE id = ?3",
        params![owner_id, format_datetime(&Utc::now()), id],
    )?;
    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

pub(crate) fn delete_document_row(conn: &Connection, id: &str) -> Result<()> {
    let rows = conn.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

pub(crate) fn set_project_name(conn: &Connection, id: &str, name: &str) -> Result<()> {
    let rows = conn.execute(
        "UPDATE projects SET name = ?1, updated_at = ?2 WHERE id = ?3",
        params![name, format_datetime(&Utc::now()), id],
    )?;
    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

pub(crate) fn set_project_trashed(conn: &Connection, id: &str, trashed: bool) -> Result<()> {
    let rows = conn.execute(
        "UPDATE projects SET is_trashed = ?1, updated_at = ?2 WHERE id = ?3",
        params![trashed, format_datetime(&Utc::now()), id],
    )?;
    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

pub(crate) fn set_project_starred(conn: &Connection, id: &str, starred: bool) -> Result<()> {
    let rows = conn.execute(
        "UPDATE projects SET is_starred = ?1, updated_at = ?2 WHERE id = ?3",
        params![starred, format_datetime(&Utc::now()), id],
    )?;
    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

pub(crate) fn set_project_owner(conn: &Connection, id: &str, owner_id: &str) -> Result<()> {
    let rows = conn.execute(
        "UPDATE projects SET owner_id = ?1, updated_at = ?2 WHERE id = ?3",
        params![owner_id, format_datetime(&Utc::now()), id],
    )?;
    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

pub(crate) fn delete_project_row(conn: &Connection, id: &str) -> Result<()> {
    let rows = conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}
