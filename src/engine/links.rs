use rusqlite::{Connection, params};

use crate::error::Result;
use crate::store::{read_document, read_project};
use crate::types::{Document, Project};

/// Adds a membership link. Linking an already-linked pair is a no-op.
pub(crate) fn link(conn: &Connection, document_id: &str, project_id: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO document_project_links (document_id, project_id) VALUES (?1, ?2)",
        params![document_id, project_id],
    )?;
    Ok(())
}

/// Removes a membership link. Returns false if the pair was not linked.
pub(crate) fn unlink(conn: &Connection, document_id: &str, project_id: &str) -> Result<bool> {
    let rows = conn.execute(
        "DELETE FROM document_project_links WHERE document_id = ?1 AND project_id = ?2",
        params![document_id, project_id],
    )?;
    Ok(rows > 0)
}

/// Removes every link a document participates in. Part of document purge.
pub(crate) fn remove_document_links(conn: &Connection, document_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM document_project_links WHERE document_id = ?1",
        params![document_id],
    )?;
    Ok(())
}

/// Removes every link into a project. Part of project purge; the documents
/// themselves are left untouched.
pub(crate) fn remove_project_links(conn: &Connection, project_id: &str) -> Result<()> {
    conn.execute(
        "DELETE FROM document_project_links WHERE project_id = ?1",
        params![project_id],
    )?;
    Ok(())
}

pub(crate) fn project_documents(conn: &Connection, project_id: &str) -> Result<Vec<Document>> {
    let mut stmt = conn.prepare(
        "SELECT d.id, d.name, d.owner_id, d.size_bytes, d.is_starred, d.is_trashed, d.created_at, d.updated_at
         FROM documents d
         JOIN document_project_links l ON l.document_id = d.id
         WHERE l.project_id = ?1
         ORDER BY d.name",
    )?;

    let rows = stmt.query_map(params![project_id], read_document)?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(crate::error::Error::from)
}

pub(crate) fn document_projects(conn: &Connection, document_id: &str) -> Result<Vec<Project>> {
    let mut stmt = conn.prepare(
        "SELECT p.id, p.name, p.owner_id, p.is_starred, p.is_trashed, p.created_at, p.updated_at
         FROM projects p
         JOIN document_project_links l ON l.project_id = p.id
         WHERE l.document_id = ?1
         ORDER BY p.name",
    )?;

    let rows = stmt.query_map(params![document_id], read_project)?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(crate::error::Error::from)
}
