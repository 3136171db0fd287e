//! Generic CRUD contract and repository error type.

use crate::auditing::AuditError;
use crate::db::DbError;
use crate::repo::paging::{Page, PageRequest, Sort};
use log::warn;
use rusqlite::{Connection, ErrorCode, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error returned by every repository operation.
#[derive(Debug)]
pub enum RepoError {
    /// The store rejected a write (NOT NULL, CHECK, FOREIGN KEY, ...).
    ConstraintViolation(String),
    Db(DbError),
    Audit(AuditError),
    /// An update targeted a persisted identity that no longer exists.
    NotFound(String),
    InvalidData(String),
    InvalidPageRequest(String),
    UnknownSortProperty(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConstraintViolation(message) => write!(f, "constraint violation: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Audit(err) => write!(f, "{err}"),
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::InvalidPageRequest(message) => write!(f, "invalid page request: {message}"),
            Self::UnknownSortProperty(property) => {
                write!(f, "unknown sort property `{property}`")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it through db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Audit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => err.into(),
            other => Self::Db(other),
        }
    }
}

impl From<AuditError> for RepoError {
    fn from(value: AuditError) -> Self {
        Self::Audit(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(err, message)
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Self::ConstraintViolation(message.unwrap_or_else(|| err.to_string()))
            }
            other => Self::Db(DbError::Sqlite(other)),
        }
    }
}

/// Generic data-access contract over one entity type `T` keyed by `ID`.
///
/// Implemented once per entity per storage engine.
pub trait CrudRepository<T, ID> {
    /// Inserts a transient entity or updates a persisted one, returning the
    /// stored state (identity and audit metadata assigned).
    fn save(&self, entity: T) -> RepoResult<T>;
    /// Saves every entity in one transaction; all or nothing.
    fn save_all(&self, entities: Vec<T>) -> RepoResult<Vec<T>>;
    fn find_by_id(&self, id: ID) -> RepoResult<Option<T>>;
    /// Returns the entities that exist among `ids`, in identity order.
    fn find_all_by_id(&self, ids: &[ID]) -> RepoResult<Vec<T>>;
    /// Returns every entity in storage-default (identity) order.
    fn find_all(&self) -> RepoResult<Vec<T>>;
    fn find_all_sorted(&self, sort: &Sort) -> RepoResult<Vec<T>>;
    fn find_page(&self, request: &PageRequest) -> RepoResult<Page<T>>;
    fn count(&self) -> RepoResult<u64>;
    fn exists_by_id(&self, id: ID) -> RepoResult<bool>;
    /// Returns `false` when no row matched.
    fn delete_by_id(&self, id: ID) -> RepoResult<bool>;
    /// Deleting a transient entity is a no-op.
    fn delete(&self, entity: &T) -> RepoResult<()>;
    fn delete_all(&self) -> RepoResult<()>;
}

const WRITE_SAVEPOINT: &str = "board_write";

/// Runs `work` as one atomic write.
///
/// In autocommit mode this opens and commits an `IMMEDIATE` transaction.
/// Inside a caller-owned transaction it nests a savepoint instead, so a
/// failed write is undone while commit stays with the caller.
pub(crate) fn in_write_scope<T, F>(conn: &Connection, work: F) -> RepoResult<T>
where
    F: FnOnce(&Connection) -> RepoResult<T>,
{
    if !conn.is_autocommit() {
        return in_savepoint(conn, work);
    }
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let value = work(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// Runs several reads against one snapshot.
///
/// In autocommit mode this wraps them in a `DEFERRED` transaction; inside a
/// caller-owned transaction the caller's snapshot already applies.
pub(crate) fn in_read_scope<T, F>(conn: &Connection, work: F) -> RepoResult<T>
where
    F: FnOnce(&Connection) -> RepoResult<T>,
{
    if !conn.is_autocommit() {
        return work(conn);
    }
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Deferred)?;
    let value = work(&tx)?;
    tx.commit()?;
    Ok(value)
}

fn in_savepoint<T, F>(conn: &Connection, work: F) -> RepoResult<T>
where
    F: FnOnce(&Connection) -> RepoResult<T>,
{
    conn.execute_batch(&format!("SAVEPOINT {WRITE_SAVEPOINT};"))?;
    match work(conn) {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {WRITE_SAVEPOINT};"))?;
            Ok(value)
        }
        Err(err) => {
            let undo = format!("ROLLBACK TO {WRITE_SAVEPOINT}; RELEASE {WRITE_SAVEPOINT};");
            if let Err(rollback_err) = conn.execute_batch(&undo) {
                warn!(
                    "event=savepoint_rollback module=repo status=error error={rollback_err}"
                );
            }
            Err(err)
        }
    }
}

/// Runs a `SELECT COUNT(*)` style query.
pub(crate) fn count_rows(conn: &Connection, sql: &str) -> RepoResult<u64> {
    let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    u64::try_from(count).map_err(|_| RepoError::InvalidData(format!("negative row count {count}")))
}
