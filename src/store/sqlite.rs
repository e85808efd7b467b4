use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection. The engine
    /// uses this to run multi-step operations in a single transaction.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

const USER_COLS: &str =
    "id, name, storage_bytes, storage_quota_bytes, max_documents, max_projects, created_at, updated_at";

fn read_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        storage_bytes: row.get(2)?,
        storage_quota_bytes: row.get(3)?,
        max_documents: row.get(4)?,
        max_projects: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

const DOCUMENT_COLS: &str =
    "id, name, owner_id, size_bytes, is_starred, is_trashed, created_at, updated_at";

pub(crate) fn read_document(row: &rusqlite::Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get(0)?,
        name: row.get(1)?,
        owner_id: row.get(2)?,
        size_bytes: row.get(3)?,
        is_starred: row.get(4)?,
        is_trashed: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
    })
}

const PROJECT_COLS: &str = "id, name, owner_id, is_starred, is_trashed, created_at, updated_at";

pub(crate) fn read_project(row: &rusqlite::Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        owner_id: row.get(2)?,
        is_starred: row.get(3)?,
        is_trashed: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn read_token(row: &rusqlite::Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        is_admin: row.get(3)?,
        user_id: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        expires_at: row.get::<_, Option<String>>(6)?.map(|s| parse_datetime(&s)),
        last_used_at: row.get::<_, Option<String>>(7)?.map(|s| parse_datetime(&s)),
    })
}

const TOKEN_COLS: &str =
    "id, token_hash, token_lookup, is_admin, user_id, created_at, expires_at, last_used_at";

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, user: &User) -> Result<()> {
        let result = self.conn().execute(
            &format!("INSERT INTO users ({USER_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            params![
                user.id,
                user.name,
                user.storage_bytes,
                user.storage_quota_bytes,
                user.max_documents,
                user.max_projects,
                format_datetime(&user.created_at),
                format_datetime(&user.updated_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::AlreadyExists)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
            params![id],
            read_user,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_name(&self, name: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE name = ?1"),
            params![name],
            read_user,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_users(&self, cursor: &str, limit: i32) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLS} FROM users WHERE id > ?1 ORDER BY id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], read_user)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_user_limits(
        &self,
        id: &str,
        storage_quota_bytes: Option<i64>,
        max_documents: Option<i32>,
        max_projects: Option<i32>,
    ) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET
                storage_quota_bytes = COALESCE(?1, storage_quota_bytes),
                max_documents = COALESCE(?2, max_documents),
                max_projects = COALESCE(?3, max_projects),
                updated_at = ?4
             WHERE id = ?5",
            params![
                storage_quota_bytes,
                max_documents,
                max_projects,
                format_datetime(&Utc::now()),
                id
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_user(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, is_admin, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.is_admin,
                token.user_id,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::TokenLookupCollision)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLS} FROM tokens WHERE id = ?1"),
            params![id],
            read_token,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLS} FROM tokens WHERE token_lookup = ?1"),
            params![lookup],
            read_token,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_tokens(&self, cursor: &str, limit: i32) -> Result<Vec<Token>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TOKEN_COLS} FROM tokens WHERE id > ?1 ORDER BY id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], read_token)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_user_tokens(&self, user_id: &str) -> Result<Vec<Token>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TOKEN_COLS} FROM tokens WHERE user_id = ?1 ORDER BY created_at DESC"
        ))?;

        let rows = stmt.query_map(params![user_id], read_token)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_token(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM tokens WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Document reads

    fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {DOCUMENT_COLS} FROM documents WHERE id = ?1"),
            params![id],
            read_document,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_document_content(&self, id: &str) -> Result<Option<String>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT content FROM documents WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_documents_for_user(
        &self,
        user_id: &str,
        cursor: &str,
        limit: i32,
    ) -> Result<Vec<Document>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {cols} FROM documents d
             JOIN document_grants g ON g.document_id = d.id
             WHERE g.user_id = ?1 AND d.is_trashed = 0 AND d.id > ?2
             ORDER BY d.id LIMIT ?3",
            cols = doc_cols_qualified()
        ))?;

        let rows = stmt.query_map(params![user_id, cursor, limit], read_document)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_trashed_documents_for_user(
        &self,
        user_id: &str,
        cursor: &str,
        limit: i32,
    ) -> Result<Vec<Document>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {cols} FROM documents d
             JOIN document_grants g ON g.document_id = d.id
             WHERE g.user_id = ?1 AND d.is_trashed = 1 AND d.id > ?2
             ORDER BY d.id LIMIT ?3",
            cols = doc_cols_qualified()
        ))?;

        let rows = stmt.query_map(params![user_id, cursor, limit], read_document)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_owned_documents(&self, user_id: &str) -> Result<i32> {
        let conn = self.conn();
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE owner_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn sum_owned_document_bytes(&self, user_id: &str) -> Result<i64> {
        let conn = self.conn();
        let sum: i64 = conn.query_row(
            "SELECT COALESCE(SUM(size_bytes), 0) FROM documents WHERE owner_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(sum)
    }

    // Project reads

    fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PROJECT_COLS} FROM projects WHERE id = ?1"),
            params![id],
            read_project,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_projects_for_user(
        &self,
        user_id: &str,
        cursor: &str,
        limit: i32,
    ) -> Result<Vec<Project>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {cols} FROM projects p
             JOIN project_grants g ON g.project_id = p.id
             WHERE g.user_id = ?1 AND p.is_trashed = 0 AND p.id > ?2
             ORDER BY p.id LIMIT ?3",
            cols = project_cols_qualified()
        ))?;

        let rows = stmt.query_map(params![user_id, cursor, limit], read_project)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_trashed_projects_for_user(
        &self,
        user_id: &str,
        cursor: &str,
        limit: i32,
    ) -> Result<Vec<Project>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {cols} FROM projects p
             JOIN project_grants g ON g.project_id = p.id
             WHERE g.user_id = ?1 AND p.is_trashed = 1 AND p.id > ?2
             ORDER BY p.id LIMIT ?3",
            cols = project_cols_qualified()
        ))?;

        let rows = stmt.query_map(params![user_id, cursor, limit], read_project)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_owned_projects(&self, user_id: &str) -> Result<i32> {
        let conn = self.conn();
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM projects WHERE owner_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // Grant reads

    fn get_document_grant(
        &self,
        document_id: &str,
        user_id: &str,
    ) -> Result<Option<DocumentGrant>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT document_id, user_id, role, created_at, updated_at
             FROM document_grants WHERE document_id = ?1 AND user_id = ?2",
            params![document_id, user_id],
            read_document_grant,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_document_grants(&self, document_id: &str) -> Result<Vec<DocumentGrant>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT document_id, user_id, role, created_at, updated_at
             FROM document_grants WHERE document_id = ?1 ORDER BY user_id",
        )?;

        let rows = stmt.query_map(params![document_id], read_document_grant)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_project_grant(&self, project_id: &str, user_id: &str) -> Result<Option<ProjectGrant>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT project_id, user_id, role, created_at, updated_at
             FROM project_grants WHERE project_id = ?1 AND user_id = ?2",
            params![project_id, user_id],
            read_project_grant,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_project_grants(&self, project_id: &str) -> Result<Vec<ProjectGrant>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT project_id, user_id, role, created_at, updated_at
             FROM project_grants WHERE project_id = ?1 ORDER BY user_id",
        )?;

        let rows = stmt.query_map(params![project_id], read_project_grant)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn count_document_owner_rows(&self, document_id: &str) -> Result<i32> {
        let conn = self.conn();
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM document_grants WHERE document_id = ?1 AND role = 'owner'",
            params![document_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn count_project_owner_rows(&self, project_id: &str) -> Result<i32> {
        let conn = self.conn();
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM project_grants WHERE project_id = ?1 AND role = 'owner'",
            params![project_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // Association reads

    fn list_project_documents(&self, project_id: &str) -> Result<Vec<Document>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {cols} FROM documents d
             JOIN document_project_links l ON l.document_id = d.id
             WHERE l.project_id = ?1
             ORDER BY d.name",
            cols = doc_cols_qualified()
        ))?;

        let rows = stmt.query_map(params![project_id], read_document)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_document_projects(&self, document_id: &str) -> Result<Vec<Project>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {cols} FROM projects p
             JOIN document_project_links l ON l.project_id = p.id
             WHERE l.document_id = ?1
             ORDER BY p.name",
            cols = project_cols_qualified()
        ))?;

        let rows = stmt.query_map(params![document_id], read_project)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn has_admin_token(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM tokens WHERE is_admin = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

fn read_document_grant(row: &rusqlite::Row<'_>) -> rusqlite::Result<DocumentGrant> {
    Ok(DocumentGrant {
        document_id: row.get(0)?,
        user_id: row.get(1)?,
        role: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
        updated_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn read_project_grant(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProjectGrant> {
    Ok(ProjectGrant {
        project_id: row.get(0)?,
        user_id: row.get(1)?,
        role: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
        updated_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn doc_cols_qualified() -> String {
    DOCUMENT_COLS
        .split(", ")
        .map(|c| format!("d.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn project_cols_qualified() -> String {
    PROJECT_COLS
        .split(", ")
        .map(|c| format!("p.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}
