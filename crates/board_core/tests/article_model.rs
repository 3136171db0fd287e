use board_core::db::open_db_in_memory;
use board_core::{Article, ArticleComment, Auditing, CrudRepository, SqliteArticleRepository};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn hash_of(article: &Article) -> u64 {
    let mut hasher = DefaultHasher::new();
    article.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn loaded_copies_of_one_row_are_equal_and_hash_alike() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn, Auditing::with_actor("jmj")).unwrap();

    let saved = repo
        .save(Article::of("title", "content", None::<String>))
        .unwrap();
    let mut loaded = repo.find_by_id(saved.id().unwrap()).unwrap().unwrap();
    loaded.set_title("diverged in memory");

    assert_eq!(saved, loaded);
    assert_eq!(hash_of(&saved), hash_of(&loaded));
}

#[test]
fn transient_articles_are_never_equal() {
    let a = Article::of("same", "same", Some("#same"));
    let b = Article::of("same", "same", Some("#same"));

    assert_ne!(a, b);
    assert!(a != a.clone());
}

#[test]
fn serialization_exposes_fields_and_flattened_audit() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteArticleRepository::try_new(&conn, Auditing::with_actor("jmj")).unwrap();

    let mut article = Article::of("title", "content", Some("#rust"));
    article.set_comments(vec![ArticleComment::of("nice")]);
    let saved = repo.save(article).unwrap();

    let json = serde_json::to_value(&saved).unwrap();
    assert_eq!(json["id"], saved.id().unwrap().0);
    assert_eq!(json["title"], "title");
    assert_eq!(json["hashtag"], "#rust");
    assert_eq!(json["created_by"], "jmj");
    assert_eq!(json["modified_at"], json["created_at"]);
    assert_eq!(json["comments"][0]["content"], "nice");
    assert_eq!(json["comments"][0]["article_id"], saved.id().unwrap().0);
}

#[test]
fn transient_serialization_has_null_id_and_no_audit() {
    let json = serde_json::to_value(Article::of("t", "c", None::<String>)).unwrap();
    assert!(json["id"].is_null());
    assert!(json["hashtag"].is_null());
    assert!(json.get("created_at").is_none());
}
