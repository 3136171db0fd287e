//! Connection readiness checks run when a repository is constructed.

use crate::db::migrations::{current_version, latest_version};
use crate::repo::crud::{RepoError, RepoResult};
use rusqlite::Connection;

pub(crate) const ARTICLE_COLUMNS: &[&str] = &[
    "id",
    "title",
    "content",
    "hashtag",
    "created_at",
    "created_by",
    "modified_at",
    "modified_by",
];

pub(crate) const ARTICLE_COMMENT_COLUMNS: &[&str] = &[
    "id",
    "article_id",
    "content",
    "created_at",
    "created_by",
    "modified_at",
    "modified_by",
];

/// Rejects connections that were not opened through `db::open_db*` or whose
/// schema lacks the board tables.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for (table, columns) in [
        ("article", ARTICLE_COLUMNS),
        ("article_comment", ARTICLE_COMMENT_COLUMNS),
    ] {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
