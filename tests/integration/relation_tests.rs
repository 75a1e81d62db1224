//! Contributor and publication synchronization tests

use shelfmark_server::{
    models::{ContributorRole, Person, Publisher},
    repository::{relations::PublicationChange, Repository},
};
use sqlx::SqliteConnection;

use crate::common::{count, repository};

async fn persons(repo: &Repository, conn: &mut SqliteConnection, names: &[&str]) -> Vec<i64> {
    let mut ids = Vec::new();
    for name in names {
        let id = repo
            .natural_keys
            .resolve_person(conn, &Person::new(Some(name), None))
            .await
            .unwrap();
        ids.push(id);
    }
    ids
}

#[tokio::test]
async fn test_synchronize_keeps_desired_order() {
    let repo = repository().await;
    let mut conn = repo.pool.acquire().await.unwrap();
    let book_id = repo.books.create_placeholder(&mut conn).await.unwrap();
    let ids = persons(&repo, &mut conn, &["A", "B", "C"]).await;
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    let report = repo
        .relations
        .synchronize(&mut conn, book_id, ContributorRole::Author, &[b, a, c])
        .await
        .unwrap();
    assert_eq!(report.added, 3);
    assert_eq!(
        repo.relations.current(&mut conn, book_id, ContributorRole::Author).await.unwrap(),
        vec![b, a, c]
    );

    let report = repo
        .relations
        .synchronize(&mut conn, book_id, ContributorRole::Author, &[c, a])
        .await
        .unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(report.added, 0);
    assert_eq!(
        repo.relations.current(&mut conn, book_id, ContributorRole::Author).await.unwrap(),
        vec![c, a]
    );

    let positions: Vec<i64> = repo
        .relations
        .contributions(&mut conn, book_id, ContributorRole::Author)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.position)
        .collect();
    assert_eq!(positions, vec![0, 1]);
}

#[tokio::test]
async fn test_synchronize_twice_is_noop() {
    let repo = repository().await;
    let mut conn = repo.pool.acquire().await.unwrap();
    let book_id = repo.books.create_placeholder(&mut conn).await.unwrap();
    let ids = persons(&repo, &mut conn, &["A", "B"]).await;

    repo.relations
        .synchronize(&mut conn, book_id, ContributorRole::Editor, &ids)
        .await
        .unwrap();
    let report = repo
        .relations
        .synchronize(&mut conn, book_id, ContributorRole::Editor, &ids)
        .await
        .unwrap();

    assert!(report.is_noop());
    assert_eq!(count(&mut conn, "contributions").await, 2);
}

#[tokio::test]
async fn test_duplicate_person_keeps_last_position() {
    let repo = repository().await;
    let mut conn = repo.pool.acquire().await.unwrap();
    let book_id = repo.books.create_placeholder(&mut conn).await.unwrap();
    let ids = persons(&repo, &mut conn, &["A", "B"]).await;
    let (a, b) = (ids[0], ids[1]);

    repo.relations
        .synchronize(&mut conn, book_id, ContributorRole::Author, &[a, b, a])
        .await
        .unwrap();

    assert_eq!(
        repo.relations.current(&mut conn, book_id, ContributorRole::Author).await.unwrap(),
        vec![b, a]
    );
    assert_eq!(count(&mut conn, "contributions").await, 2);
}

#[tokio::test]
async fn test_roles_are_independent() {
    let repo = repository().await;
    let mut conn = repo.pool.acquire().await.unwrap();
    let book_id = repo.books.create_placeholder(&mut conn).await.unwrap();
    let ids = persons(&repo, &mut conn, &["A", "B"]).await;

    repo.relations
        .synchronize(&mut conn, book_id, ContributorRole::Author, &[ids[0]])
        .await
        .unwrap();
    repo.relations
        .synchronize(&mut conn, book_id, ContributorRole::Editor, &[ids[0], ids[1]])
        .await
        .unwrap();
    repo.relations
        .synchronize(&mut conn, book_id, ContributorRole::Editor, &[])
        .await
        .unwrap();

    assert_eq!(
        repo.relations.current(&mut conn, book_id, ContributorRole::Author).await.unwrap(),
        vec![ids[0]]
    );
    assert!(repo
        .relations
        .current(&mut conn, book_id, ContributorRole::Editor)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_publication_is_single_slot() {
    let repo = repository().await;
    let mut conn = repo.pool.acquire().await.unwrap();
    let book_id = repo.books.create_placeholder(&mut conn).await.unwrap();
    let first = repo
        .natural_keys
        .resolve_publisher(&mut conn, &Publisher::new(Some("Library of America"), Some("New York")))
        .await
        .unwrap();
    let second = repo
        .natural_keys
        .resolve_publisher(&mut conn, &Publisher::new(Some("Penguin"), Some("London")))
        .await
        .unwrap();

    let change = repo
        .relations
        .synchronize_publication(&mut conn, book_id, Some(first))
        .await
        .unwrap();
    assert_eq!(change, PublicationChange::Added);

    let change = repo
        .relations
        .synchronize_publication(&mut conn, book_id, Some(first))
        .await
        .unwrap();
    assert_eq!(change, PublicationChange::Unchanged);

    let change = repo
        .relations
        .synchronize_publication(&mut conn, book_id, Some(second))
        .await
        .unwrap();
    assert_eq!(change, PublicationChange::Replaced);
    assert_eq!(count(&mut conn, "publications").await, 1);
    assert_eq!(repo.relations.publication(&mut conn, book_id).await.unwrap(), Some(second));

    let change = repo
        .relations
        .synchronize_publication(&mut conn, book_id, None)
        .await
        .unwrap();
    assert_eq!(change, PublicationChange::Removed);
    assert_eq!(repo.relations.publication(&mut conn, book_id).await.unwrap(), None);

    let change = repo
        .relations
        .synchronize_publication(&mut conn, book_id, None)
        .await
        .unwrap();
    assert_eq!(change, PublicationChange::Unchanged);
}
