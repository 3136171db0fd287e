//! Board entity model.
//!
//! # Responsibility
//! - Define the `Article` aggregate and its owned `ArticleComment` records.
//! - Carry audit metadata assigned by the persistence write path.
//!
//! # Invariants
//! - Identity is assigned by the store only; callers cannot set it.
//! - Equality and hashing follow identity alone; transient records equal
//!   nothing.

pub mod article;
pub mod article_comment;
pub mod audit;
