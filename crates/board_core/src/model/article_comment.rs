//! Comment records owned by an [`Article`](crate::model::article::Article).

use crate::model::article::ArticleId;
use crate::model::audit::AuditMetadata;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Store-assigned comment identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArticleCommentId(pub i64);

impl Display for ArticleCommentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A comment attached to exactly one article.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleComment {
    id: Option<ArticleCommentId>,
    article_id: Option<ArticleId>,
    content: String,
    #[serde(flatten)]
    audit: Option<AuditMetadata>,
}

impl ArticleComment {
    /// Builds a transient comment to be attached through its parent article.
    pub fn of(content: impl Into<String>) -> Self {
        Self {
            id: None,
            article_id: None,
            content: content.into(),
            audit: None,
        }
    }

    /// Builds a transient comment for an already persisted article, for use
    /// with the comment repository directly.
    pub fn for_article(article_id: ArticleId, content: impl Into<String>) -> Self {
        Self {
            article_id: Some(article_id),
            ..Self::of(content)
        }
    }

    pub(crate) fn from_parts(
        id: ArticleCommentId,
        article_id: ArticleId,
        content: String,
        audit: AuditMetadata,
    ) -> Self {
        Self {
            id: Some(id),
            article_id: Some(article_id),
            content,
            audit: Some(audit),
        }
    }

    pub fn id(&self) -> Option<ArticleCommentId> {
        self.id
    }

    pub fn article_id(&self) -> Option<ArticleId> {
        self.article_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn audit(&self) -> Option<&AuditMetadata> {
        self.audit.as_ref()
    }

    pub fn created_at(&self) -> Option<i64> {
        self.audit.as_ref().map(|audit| audit.created_at)
    }

    pub fn created_by(&self) -> Option<&str> {
        self.audit.as_ref().map(|audit| audit.created_by.as_str())
    }

    pub fn modified_at(&self) -> Option<i64> {
        self.audit.as_ref().map(|audit| audit.modified_at)
    }

    pub fn modified_by(&self) -> Option<&str> {
        self.audit.as_ref().map(|audit| audit.modified_by.as_str())
    }

    pub fn is_transient(&self) -> bool {
        self.id.is_none()
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }
}

impl PartialEq for ArticleComment {
    fn eq(&self, other: &Self) -> bool {
        self.id.is_some() && self.id == other.id
    }
}

impl Hash for ArticleComment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
