use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{Error, Result};
use crate::store::format_datetime;

/// Adjusts a user's storage counter by `delta` bytes inside the caller's
/// transaction. Positive deltas are checked against the quota with
/// `current + delta <= quota` (landing exactly on the quota is accepted);
/// negative deltas always apply. The counter must never go negative: that
/// means the accounting has drifted from the stored content, which is
/// surfaced, never clamped away.
pub(crate) fn charge(conn: &Connection, user_id: &str, delta: i64) -> Result<()> {
    if delta == 0 {
        return Ok(());
    }

    let row: Option<(i64, i64)> = conn
        .query_row(
            "SELECT storage_bytes, storage_quota_bytes FROM users WHERE id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let (used, quota) = row.ok_or(Error::NotFound)?;

    let next = used + delta;
    if next < 0 {
        tracing::error!(
            user_id,
            used,
            delta,
            "storage counter would go negative; accounting has drifted"
        );
        return Err(Error::InvariantViolation(format!(
            "storage counter for user {user_id} would become {next}"
        )));
    }
    if delta > 0 && next > quota {
        return Err(Error::QuotaExceeded);
    }

    conn.execute(
        "UPDATE users SET storage_bytes = ?1, updated_at = ?2 WHERE id = ?3",
        params![next, format_datetime(&chrono::Utc::now()), user_id],
    )?;
    Ok(())
}

/// Releases `bytes` previously charged to the user (purge, ownership
/// transfer). `bytes` is a non-negative amount, not a delta.
pub(crate) fn release(conn: &Connection, user_id: &str, bytes: i64) -> Result<()> {
    debug_assert!(bytes >= 0);
    charge(conn, user_id, -bytes)
}
