//! Article comment repository and the comment row helpers shared with the
//! article aggregate.
//!
//! # Invariants
//! - A comment row always references an existing article; inserting one
//!   without `article_id` or with a dangling id is a constraint violation.
//! - A persisted comment never moves to another article.

use crate::auditing::Auditing;
use crate::model::article::ArticleId;
use crate::model::article_comment::{ArticleComment, ArticleCommentId};
use crate::model::audit::{AuditMetadata, AuditStamp};
use crate::repo::crud::{
    count_rows, in_read_scope, in_write_scope, CrudRepository, RepoError, RepoResult,
};
use crate::repo::paging::{Page, PageRequest, Sort};
use crate::repo::schema::ensure_connection_ready;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const COMMENT_SELECT_SQL: &str = "SELECT
    id,
    article_id,
    content,
    created_at,
    created_by,
    modified_at,
    modified_by
FROM article_comment";

const COUNT_SQL: &str = "SELECT COUNT(*) FROM article_comment;";

/// SQLite-backed comment repository.
pub struct SqliteArticleCommentRepository<'conn> {
    conn: &'conn Connection,
    auditing: Auditing,
}

impl<'conn> SqliteArticleCommentRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection, auditing: Auditing) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn, auditing })
    }

    fn save_in(
        &self,
        conn: &Connection,
        comment: &ArticleComment,
        stamp: &AuditStamp,
    ) -> RepoResult<ArticleCommentId> {
        match comment.id() {
            None => {
                let article_id = comment.article_id();
                insert_comment(conn, article_id, comment.content(), stamp)
            }
            Some(id) => {
                let stored = load_comment(conn, id)?
                    .ok_or_else(|| RepoError::NotFound(format!("article comment {id}")))?;
                if let Some(article_id) = comment.article_id() {
                    if stored.article_id() != Some(article_id) {
                        return Err(RepoError::InvalidData(format!(
                            "article comment {id} cannot move to article {article_id}"
                        )));
                    }
                }
                update_comment_if_changed(conn, &stored, comment.content(), stamp)?;
                Ok(id)
            }
        }
    }

    fn reload(&self, conn: &Connection, id: ArticleCommentId) -> RepoResult<ArticleComment> {
        load_comment(conn, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("article comment {id} vanished during save"))
        })
    }
}

impl CrudRepository<ArticleComment, ArticleCommentId> for SqliteArticleCommentRepository<'_> {
    fn save(&self, comment: ArticleComment) -> RepoResult<ArticleComment> {
        let stamp = self.auditing.resolve()?;
        let (id, saved) = in_write_scope(self.conn, |conn| {
            let id = self.save_in(conn, &comment, &stamp)?;
            Ok((id, self.reload(conn, id)?))
        })?;

        debug!(
            "event=comment_save module=repo status=ok comment_id={id} article_id={}",
            saved.article_id().map_or_else(String::new, |id| id.to_string())
        );
        Ok(saved)
    }

    fn save_all(&self, comments: Vec<ArticleComment>) -> RepoResult<Vec<ArticleComment>> {
        let stamp = self.auditing.resolve()?;
        let saved = in_write_scope(self.conn, |conn| {
            let mut ids = Vec::with_capacity(comments.len());
            for comment in &comments {
                ids.push(self.save_in(conn, comment, &stamp)?);
            }
            ids.into_iter()
                .map(|id| self.reload(conn, id))
                .collect::<RepoResult<Vec<_>>>()
        })?;

        debug!(
            "event=comment_save_all module=repo status=ok count={}",
            saved.len()
        );
        Ok(saved)
    }

    fn find_by_id(&self, id: ArticleCommentId) -> RepoResult<Option<ArticleComment>> {
        load_comment(self.conn, id)
    }

    fn find_all_by_id(&self, ids: &[ArticleCommentId]) -> RepoResult<Vec<ArticleComment>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("{COMMENT_SELECT_SQL} WHERE id IN ({placeholders}) ORDER BY id ASC");
        query_comments(
            self.conn,
            &sql,
            ids.iter().map(|id| Value::Integer(id.0)).collect(),
        )
    }

    fn find_all(&self) -> RepoResult<Vec<ArticleComment>> {
        self.find_all_sorted(&Sort::unsorted())
    }

    fn find_all_sorted(&self, sort: &Sort) -> RepoResult<Vec<ArticleComment>> {
        let order_by = sort.to_order_by(comment_sort_column)?;
        query_comments(self.conn, &format!("{COMMENT_SELECT_SQL}{order_by}"), Vec::new())
    }

    fn find_page(&self, request: &PageRequest) -> RepoResult<Page<ArticleComment>> {
        request.validate()?;
        let order_by = request.sort().to_order_by(comment_sort_column)?;
        let bounds = request.bounds()?;
        let (total_elements, content) = in_read_scope(self.conn, |conn| {
            let total = count_rows(conn, COUNT_SQL)?;
            let content = query_comments(
                conn,
                &format!("{COMMENT_SELECT_SQL}{order_by} LIMIT ? OFFSET ?"),
                bounds,
            )?;
            Ok((total, content))
        })?;
        Ok(Page {
            content,
            number: request.page(),
            size: request.size(),
            total_elements,
        })
    }

    fn count(&self) -> RepoResult<u64> {
        count_rows(self.conn, COUNT_SQL)
    }

    fn exists_by_id(&self, id: ArticleCommentId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM article_comment WHERE id = ?1);",
            [id.0],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn delete_by_id(&self, id: ArticleCommentId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM article_comment WHERE id = ?1;", [id.0])?;
        debug!("event=comment_delete module=repo status=ok comment_id={id} deleted={changed}");
        Ok(changed > 0)
    }

    fn delete(&self, comment: &ArticleComment) -> RepoResult<()> {
        if let Some(id) = comment.id() {
            self.delete_by_id(id)?;
        }
        Ok(())
    }

    fn delete_all(&self) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM article_comment;", [])?;
        debug!("event=comment_delete_all module=repo status=ok deleted={changed}");
        Ok(())
    }
}

/// Maps a sortable comment property to its column.
fn comment_sort_column(property: &str) -> Option<&'static str> {
    match property {
        "id" => Some("id"),
        "article_id" | "articleId" => Some("article_id"),
        "content" => Some("content"),
        "created_at" | "createdAt" => Some("created_at"),
        "created_by" | "createdBy" => Some("created_by"),
        "modified_at" | "modifiedAt" => Some("modified_at"),
        "modified_by" | "modifiedBy" => Some("modified_by"),
        _ => None,
    }
}

/// Inserts one comment row and returns its new identity.
pub(crate) fn insert_comment(
    conn: &Connection,
    article_id: Option<ArticleId>,
    content: &str,
    stamp: &AuditStamp,
) -> RepoResult<ArticleCommentId> {
    let audit = AuditMetadata::on_create(stamp);
    conn.execute(
        "INSERT INTO article_comment (
            article_id,
            content,
            created_at,
            created_by,
            modified_at,
            modified_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            article_id.map(|id| id.0),
            content,
            audit.created_at,
            audit.created_by,
            audit.modified_at,
            audit.modified_by,
        ],
    )?;
    Ok(ArticleCommentId(conn.last_insert_rowid()))
}

/// Rewrites the content of a stored comment when it differs, restamping the
/// modification metadata. Unchanged comments keep their metadata.
pub(crate) fn update_comment_if_changed(
    conn: &Connection,
    stored: &ArticleComment,
    content: &str,
    stamp: &AuditStamp,
) -> RepoResult<()> {
    if stored.content() == content {
        return Ok(());
    }
    let (Some(id), Some(previous)) = (stored.id(), stored.audit()) else {
        return Err(RepoError::InvalidData(
            "stored comment is missing identity or audit metadata".to_string(),
        ));
    };

    let audit = AuditMetadata::on_update(previous, stamp);
    conn.execute(
        "UPDATE article_comment
         SET
            content = ?1,
            modified_at = ?2,
            modified_by = ?3
         WHERE id = ?4;",
        params![content, audit.modified_at, audit.modified_by, id.0],
    )?;
    Ok(())
}

pub(crate) fn load_comment(
    conn: &Connection,
    id: ArticleCommentId,
) -> RepoResult<Option<ArticleComment>> {
    let mut stmt = conn.prepare(&format!("{COMMENT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.0])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_comment_row(row)?));
    }
    Ok(None)
}

/// Loads the comments of one article in identity order.
pub(crate) fn load_comments_for_article(
    conn: &Connection,
    article_id: ArticleId,
) -> RepoResult<Vec<ArticleComment>> {
    query_comments(
        conn,
        &format!("{COMMENT_SELECT_SQL} WHERE article_id = ? ORDER BY id ASC"),
        vec![Value::Integer(article_id.0)],
    )
}

pub(crate) fn delete_comments_for_article(
    conn: &Connection,
    article_id: ArticleId,
) -> RepoResult<usize> {
    let changed = conn.execute(
        "DELETE FROM article_comment WHERE article_id = ?1;",
        [article_id.0],
    )?;
    Ok(changed)
}

/// Returns the article a comment belongs to, if the comment exists.
pub(crate) fn comment_owner(
    conn: &Connection,
    id: ArticleCommentId,
) -> RepoResult<Option<ArticleId>> {
    let owner = conn
        .query_row(
            "SELECT article_id FROM article_comment WHERE id = ?1;",
            [id.0],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(owner.map(ArticleId))
}

fn query_comments(
    conn: &Connection,
    sql: &str,
    bind_values: Vec<Value>,
) -> RepoResult<Vec<ArticleComment>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut comments = Vec::new();
    while let Some(row) = rows.next()? {
        comments.push(parse_comment_row(row)?);
    }
    Ok(comments)
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<ArticleComment> {
    let audit = AuditMetadata {
        created_at: row.get("created_at")?,
        created_by: row.get("created_by")?,
        modified_at: row.get("modified_at")?,
        modified_by: row.get("modified_by")?,
    };
    Ok(ArticleComment::from_parts(
        ArticleCommentId(row.get("id")?),
        ArticleId(row.get("article_id")?),
        row.get("content")?,
        audit,
    ))
}
