//! Persistence core for the bulletin board.
//! Articles, their comments, audit stamping and the repositories over them.

pub mod auditing;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use auditing::{
    ActorProvider, AuditError, Auditing, Clock, FixedActor, ManualClock, NoActor, SystemClock,
};
pub use config::{BoardConfig, DatabaseLocation};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::article::{Article, ArticleId};
pub use model::article_comment::{ArticleComment, ArticleCommentId};
pub use model::audit::{AuditMetadata, AuditStamp};
pub use repo::article_comment_repo::SqliteArticleCommentRepository;
pub use repo::article_repo::SqliteArticleRepository;
pub use repo::crud::{CrudRepository, RepoError, RepoResult};
pub use repo::paging::{Direction, Order, Page, PageRequest, Sort};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
