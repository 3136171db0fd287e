//! Article aggregate.
//!
//! # Invariants
//! - `id` and `audit` are assigned by the repository write path only.
//! - Comments are owned by the article; deleting the article deletes them.
//! - When loaded from the store, comments are ordered by their identity.

use crate::model::article_comment::ArticleComment;
use crate::model::audit::AuditMetadata;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Store-assigned article identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArticleId(pub i64);

impl Display for ArticleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bulletin-board post.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    id: Option<ArticleId>,
    title: String,
    content: String,
    hashtag: Option<String>,
    comments: Vec<ArticleComment>,
    #[serde(flatten)]
    audit: Option<AuditMetadata>,
}

impl Article {
    /// Builds a transient article. The only sanctioned constructor.
    ///
    /// Performs no validation; storage constraints are enforced on save.
    pub fn of(
        title: impl Into<String>,
        content: impl Into<String>,
        hashtag: Option<impl Into<String>>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
            hashtag: hashtag.map(Into::into),
            comments: Vec::new(),
            audit: None,
        }
    }

    pub(crate) fn from_parts(
        id: ArticleId,
        title: String,
        content: String,
        hashtag: Option<String>,
        comments: Vec<ArticleComment>,
        audit: AuditMetadata,
    ) -> Self {
        Self {
            id: Some(id),
            title,
            content,
            hashtag,
            comments,
            audit: Some(audit),
        }
    }

    pub fn id(&self) -> Option<ArticleId> {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn hashtag(&self) -> Option<&str> {
        self.hashtag.as_deref()
    }

    /// Owned comments; identity-ordered once the article has been loaded.
    pub fn comments(&self) -> &[ArticleComment] {
        &self.comments
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

    /// Returns whether the store has not assigned an identity yet.
    pub fn is_transient(&self) -> bool {
        self.id.is_none()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn set_hashtag(&mut self, hashtag: Option<impl Into<String>>) {
        self.hashtag = hashtag.map(Into::into);
    }

    /// Replaces the whole comment collection.
    ///
    /// On the next save, comments missing from the new collection are deleted
    /// from the store, new ones are inserted and changed ones are updated.
    pub fn set_comments(&mut self, comments: Vec<ArticleComment>) {
        self.comments = comments;
    }

    pub(crate) fn take_comments(&mut self) -> Vec<ArticleComment> {
        std::mem::take(&mut self.comments)
    }
}

impl PartialEq for Article {
    fn eq(&self, other: &Self) -> bool {
        self.id.is_some() && self.id == other.id
    }
}

impl Hash for Article {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
