use board_core::db::open_db_in_memory;
use board_core::{
    Article, Auditing, CrudRepository, Direction, FixedActor, ManualClock, PageRequest, RepoError,
    Sort, SqliteArticleRepository,
};
use rusqlite::Connection;
use std::sync::Arc;

fn seeded_repo(conn: &Connection) -> SqliteArticleRepository<'_> {
    let clock = Arc::new(ManualClock::starting_at(1_000));
    let repo = SqliteArticleRepository::try_new(
        conn,
        Auditing::new(Arc::new(FixedActor::new("jmj")), clock.clone()),
    )
    .unwrap();

    for (title, hashtag) in [
        ("delta", Some("#b")),
        ("alpha", Some("#a")),
        ("echo", None),
        ("charlie", Some("#a")),
        ("bravo", Some("#b")),
    ] {
        repo.save(Article::of(title, "content", hashtag)).unwrap();
        clock.advance(1_000);
    }
    repo
}

fn titles(articles: &[Article]) -> Vec<&str> {
    articles.iter().map(Article::title).collect()
}

#[test]
fn find_all_uses_insertion_identity_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded_repo(&conn);

    let all = repo.find_all().unwrap();
    assert_eq!(titles(&all), vec!["delta", "alpha", "echo", "charlie", "bravo"]);
}

#[test]
fn find_all_sorted_honors_multiple_criteria() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded_repo(&conn);

    let by_title = repo.find_all_sorted(&Sort::asc("title")).unwrap();
    assert_eq!(
        titles(&by_title),
        vec!["alpha", "bravo", "charlie", "delta", "echo"]
    );

    let newest_first = repo.find_all_sorted(&Sort::desc("createdAt")).unwrap();
    assert_eq!(newest_first[0].title(), "bravo");

    let by_tag = repo
        .find_all_sorted(&Sort::asc("hashtag").then("title", Direction::Desc))
        .unwrap();
    // SQLite orders NULL first.
    assert_eq!(
        titles(&by_tag),
        vec!["echo", "charlie", "alpha", "delta", "bravo"]
    );
}

#[test]
fn find_page_slices_and_reports_totals() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded_repo(&conn);

    let request = PageRequest::of(1, 2).with_sort(Sort::asc("title"));
    let page = repo.find_page(&request).unwrap();

    assert_eq!(titles(&page.content), vec!["charlie", "delta"]);
    assert_eq!(page.number, 1);
    assert_eq!(page.size, 2);
    assert_eq!(page.total_elements, 5);
    assert_eq!(page.total_pages(), 3);
    assert!(page.has_next());
    assert!(page.has_previous());

    let last = repo.find_page(&PageRequest::of(2, 2)).unwrap();
    assert_eq!(titles(&last.content), vec!["bravo"]);
    assert!(!last.has_next());

    let beyond = repo.find_page(&PageRequest::of(9, 2)).unwrap();
    assert!(beyond.is_empty());
    assert_eq!(beyond.total_elements, 5);
}

#[test]
fn find_page_rejects_zero_size_and_unknown_properties() {
    let conn = open_db_in_memory().unwrap();
    let repo = seeded_repo(&conn);

    assert!(matches!(
        repo.find_page(&PageRequest::of(0, 0)),
        Err(RepoError::InvalidPageRequest(_))
    ));
    assert!(matches!(
        repo.find_all_sorted(&Sort::asc("views")),
        Err(RepoError::UnknownSortProperty(property)) if property == "views"
    ));
}

#[test]
fn find_page_reads_inside_a_caller_owned_transaction() {
    let mut conn = open_db_in_memory().unwrap();
    seeded_repo(&conn);

    let tx = conn.transaction().unwrap();
    {
        let repo = seeded_repo(&tx);
        let page = repo
            .find_page(&PageRequest::of(0, 4).with_sort(Sort::asc("title")))
            .unwrap();
        assert_eq!(page.total_elements, 10);
        assert_eq!(titles(&page.content), vec!["alpha", "alpha", "bravo", "bravo"]);
    }
    tx.rollback().unwrap();

    let repo = seeded_repo(&conn);
    let page = repo.find_page(&PageRequest::of(0, 4)).unwrap();
    assert_eq!(page.total_elements, 10);
    assert_eq!(page.total_pages(), 3);
}
