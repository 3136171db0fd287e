//! Repository contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the generic CRUD contract shared by every entity repository.
//! - Keep SQL, transactions and audit stamping inside the persistence
//!   boundary.
//!
//! # Invariants
//! - Lookups by identity return `Ok(None)`/`Ok(false)` for missing rows.
//! - Constraint failures reported by SQLite surface as
//!   `RepoError::ConstraintViolation` and are never retried.
//! - Every write resolves its audit stamp before touching the store.
//! - Writes join a caller-owned transaction through a savepoint and only open
//!   their own transaction on an autocommit connection.

pub mod article_comment_repo;
pub mod article_repo;
pub mod crud;
pub mod paging;
mod schema;
