//! Article repository: persists the article aggregate with its comments.
//!
//! # Responsibility
//! - Insert/update the article row and synchronize its comment rows in one
//!   transaction.
//! - Stamp audit metadata on every row it writes.
//!
//! # Invariants
//! - An unchanged article keeps its modification metadata on re-save.
//! - Comments dropped from the collection are deleted on save.
//! - Deleting an article deletes its comments in the same transaction.

use crate::auditing::Auditing;
use crate::model::article::{Article, ArticleId};
use crate::model::article_comment::ArticleComment;
use crate::model::audit::{AuditMetadata, AuditStamp};
use crate::repo::article_comment_repo::{
    comment_owner, delete_comments_for_article, insert_comment, load_comments_for_article,
    update_comment_if_changed,
};
use crate::repo::crud::{
    count_rows, in_read_scope, in_write_scope, CrudRepository, RepoError, RepoResult,
};
use crate::repo::paging::{Page, PageRequest, Sort};
use crate::repo::schema::ensure_connection_ready;
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::{BTreeMap, BTreeSet};

const ARTICLE_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    hashtag,
    created_at,
    created_by,
    modified_at,
    modified_by
FROM article";

const COUNT_SQL: &str = "SELECT COUNT(*) FROM article;";

/// SQLite-backed article repository.
pub struct SqliteArticleRepository<'conn> {
    conn: &'conn Connection,
    auditing: Auditing,
}

impl<'conn> SqliteArticleRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection, auditing: Auditing) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn, auditing })
    }
}

impl CrudRepository<Article, ArticleId> for SqliteArticleRepository<'_> {
    fn save(&self, article: Article) -> RepoResult<Article> {
        let stamp = self.auditing.resolve()?;
        let (id, saved) = in_write_scope(self.conn, |conn| {
            let id = save_article(conn, article, &stamp)?;
            Ok((id, reload_article(conn, id)?))
        })?;

        debug!(
            "event=article_save module=repo status=ok article_id={id} comments={}",
            saved.comments().len()
        );
        Ok(saved)
    }

    fn save_all(&self, articles: Vec<Article>) -> RepoResult<Vec<Article>> {
        let stamp = self.auditing.resolve()?;
        let saved = in_write_scope(self.conn, |conn| {
            let mut ids = Vec::with_capacity(articles.len());
            for article in articles {
                ids.push(save_article(conn, article, &stamp)?);
            }
            ids.into_iter()
                .map(|id| reload_article(conn, id))
                .collect::<RepoResult<Vec<_>>>()
        })?;

        debug!(
            "event=article_save_all module=repo status=ok count={}",
            saved.len()
        );
        Ok(saved)
    }

    fn find_by_id(&self, id: ArticleId) -> RepoResult<Option<Article>> {
        load_article(self.conn, id)
    }

    fn find_all_by_id(&self, ids: &[ArticleId]) -> RepoResult<Vec<Article>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("{ARTICLE_SELECT_SQL} WHERE id IN ({placeholders}) ORDER BY id ASC");
        query_articles(
            self.conn,
            &sql,
            ids.iter().map(|id| Value::Integer(id.0)).collect(),
        )
    }

    fn find_all(&self) -> RepoResult<Vec<Article>> {
        self.find_all_sorted(&Sort::unsorted())
    }

    fn find_all_sorted(&self, sort: &Sort) -> RepoResult<Vec<Article>> {
        let order_by = sort.to_order_by(article_sort_column)?;
        query_articles(self.conn, &format!("{ARTICLE_SELECT_SQL}{order_by}"), Vec::new())
    }

    fn find_page(&self, request: &PageRequest) -> RepoResult<Page<Article>> {
        request.validate()?;
        let order_by = request.sort().to_order_by(article_sort_column)?;
        let bounds = request.bounds()?;
        let (total_elements, content) = in_read_scope(self.conn, |conn| {
            let total = count_rows(conn, COUNT_SQL)?;
            let content = query_articles(
                conn,
                &format!("{ARTICLE_SELECT_SQL}{order_by} LIMIT ? OFFSET ?"),
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

    fn exists_by_id(&self, id: ArticleId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM article WHERE id = ?1);",
            [id.0],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn delete_by_id(&self, id: ArticleId) -> RepoResult<bool> {
        let (changed, comments) = in_write_scope(self.conn, |conn| {
            let comments = delete_comments_for_article(conn, id)?;
            let changed = conn.execute("DELETE FROM article WHERE id = ?1;", [id.0])?;
            Ok((changed, comments))
        })?;

        debug!(
            "event=article_delete module=repo status=ok article_id={id} deleted={changed} comments_deleted={comments}"
        );
        Ok(changed > 0)
    }

    fn delete(&self, article: &Article) -> RepoResult<()> {
        if let Some(id) = article.id() {
            self.delete_by_id(id)?;
        }
        Ok(())
    }

    fn delete_all(&self) -> RepoResult<()> {
        let (articles, comments) = in_write_scope(self.conn, |conn| {
            let comments = conn.execute("DELETE FROM article_comment;", [])?;
            let articles = conn.execute("DELETE FROM article;", [])?;
            Ok((articles, comments))
        })?;

        debug!(
            "event=article_delete_all module=repo status=ok deleted={articles} comments_deleted={comments}"
        );
        Ok(())
    }
}

fn article_sort_column(property: &str) -> Option<&'static str> {
    match property {
        "id" => Some("id"),
        "title" => Some("title"),
        "content" => Some("content"),
        "hashtag" => Some("hashtag"),
        "created_at" | "createdAt" => Some("created_at"),
        "created_by" | "createdBy" => Some("created_by"),
        "modified_at" | "modifiedAt" => Some("modified_at"),
        "modified_by" | "modifiedBy" => Some("modified_by"),
        _ => None,
    }
}

fn save_article(
    conn: &Connection,
    mut article: Article,
    stamp: &AuditStamp,
) -> RepoResult<ArticleId> {
    let comments = article.take_comments();
    let id = match article.id() {
        None => insert_article(conn, &article, stamp)?,
        Some(id) => {
            update_article_if_changed(conn, id, &article, stamp)?;
            id
        }
    };
    sync_comments(conn, id, &comments, stamp)?;
    Ok(id)
}

fn insert_article(
    conn: &Connection,
    article: &Article,
    stamp: &AuditStamp,
) -> RepoResult<ArticleId> {
    let audit = AuditMetadata::on_create(stamp);
    conn.execute(
        "INSERT INTO article (
            title,
            content,
            hashtag,
            created_at,
            created_by,
            modified_at,
            modified_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
        params![
            article.title(),
            article.content(),
            article.hashtag(),
            audit.created_at,
            audit.created_by,
            audit.modified_at,
            audit.modified_by,
        ],
    )?;
    Ok(ArticleId(conn.last_insert_rowid()))
}

fn update_article_if_changed(
    conn: &Connection,
    id: ArticleId,
    article: &Article,
    stamp: &AuditStamp,
) -> RepoResult<()> {
    let stored = load_article_row(conn, id)?
        .ok_or_else(|| RepoError::NotFound(format!("article {id}")))?;

    let unchanged = stored.title() == article.title()
        && stored.content() == article.content()
        && stored.hashtag() == article.hashtag();
    if unchanged {
        return Ok(());
    }

    let previous = stored
        .audit()
        .ok_or_else(|| RepoError::InvalidData(format!("article {id} has no audit metadata")))?;
    let audit = AuditMetadata::on_update(previous, stamp);
    conn.execute(
        "UPDATE article
         SET
            title = ?1,
            content = ?2,
            hashtag = ?3,
            modified_at = ?4,
            modified_by = ?5
         WHERE id = ?6;",
        params![
            article.title(),
            article.content(),
            article.hashtag(),
            audit.modified_at,
            audit.modified_by,
            id.0,
        ],
    )?;
    Ok(())
}

/// Makes the stored comment rows of `article_id` match `comments`.
fn sync_comments(
    conn: &Connection,
    article_id: ArticleId,
    comments: &[ArticleComment],
    stamp: &AuditStamp,
) -> RepoResult<()> {
    let stored: BTreeMap<_, _> = load_comments_for_article(conn, article_id)?
        .into_iter()
        .filter_map(|comment| comment.id().map(|id| (id, comment)))
        .collect();
    let kept: BTreeSet<_> = comments.iter().filter_map(ArticleComment::id).collect();

    for id in stored.keys().filter(|id| !kept.contains(*id)) {
        conn.execute("DELETE FROM article_comment WHERE id = ?1;", [id.0])?;
    }

    for comment in comments {
        match comment.id() {
            None => {
                if let Some(declared) = comment.article_id() {
                    if declared != article_id {
                        return Err(RepoError::InvalidData(format!(
                            "new comment declared for article {declared} cannot be saved under article {article_id}"
                        )));
                    }
                }
                insert_comment(conn, Some(article_id), comment.content(), stamp)?;
            }
            Some(id) => {
                let Some(current) = stored.get(&id) else {
                    return Err(match comment_owner(conn, id)? {
                        Some(owner) => RepoError::InvalidData(format!(
                            "article comment {id} belongs to article {owner}, not {article_id}"
                        )),
                        None => RepoError::NotFound(format!("article comment {id}")),
                    });
                };
                update_comment_if_changed(conn, current, comment.content(), stamp)?;
            }
        }
    }

    Ok(())
}

fn reload_article(conn: &Connection, id: ArticleId) -> RepoResult<Article> {
    load_article(conn, id)?
        .ok_or_else(|| RepoError::InvalidData(format!("article {id} vanished during save")))
}

fn load_article(conn: &Connection, id: ArticleId) -> RepoResult<Option<Article>> {
    let Some(article) = load_article_row(conn, id)? else {
        return Ok(None);
    };
    Ok(Some(with_comments(conn, article)?))
}

/// Loads the article row only, without its comments.
fn load_article_row(conn: &Connection, id: ArticleId) -> RepoResult<Option<Article>> {
    let mut stmt = conn.prepare(&format!("{ARTICLE_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.0])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_article_row(row)?));
    }
    Ok(None)
}

fn query_articles(
    conn: &Connection,
    sql: &str,
    bind_values: Vec<Value>,
) -> RepoResult<Vec<Article>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut articles = Vec::new();
    while let Some(row) = rows.next()? {
        articles.push(parse_article_row(row)?);
    }
    articles
        .into_iter()
        .map(|article| with_comments(conn, article))
        .collect()
}

fn with_comments(conn: &Connection, mut article: Article) -> RepoResult<Article> {
    let id = article
        .id()
        .ok_or_else(|| RepoError::InvalidData("loaded article has no id".to_string()))?;
    article.set_comments(load_comments_for_article(conn, id)?);
    Ok(article)
}

fn parse_article_row(row: &Row<'_>) -> RepoResult<Article> {
    let audit = AuditMetadata {
        created_at: row.get("created_at")?,
        created_by: row.get("created_by")?,
        modified_at: row.get("modified_at")?,
        modified_by: row.get("modified_by")?,
    };
    Ok(Article::from_parts(
        ArticleId(row.get("id")?),
        row.get("title")?,
        row.get("content")?,
        row.get("hashtag")?,
        Vec::new(),
        audit,
    ))
}
