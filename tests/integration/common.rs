//! Shared fixtures

use shelfmark_server::{
    models::{EntryForm, FullEntry},
    repository::Repository,
    services::catalog::CatalogService,
};
use sqlx::SqliteConnection;

pub async fn repository() -> Repository {
    Repository::open_in_memory()
        .await
        .expect("in-memory repository")
}

pub async fn catalog() -> (Repository, CatalogService) {
    let repo = repository().await;
    let catalog = CatalogService::new(repo.clone());
    (repo, catalog)
}

/// Row count of `table`, read through an already held connection
pub async fn count(conn: &mut SqliteConnection, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(conn)
        .await
        .expect("count rows")
}

/// Row count of `table`, read through the pool
pub async fn count_rows(repo: &Repository, table: &str) -> i64 {
    let mut conn = repo.pool.acquire().await.expect("connection");
    count(&mut conn, table).await
}

/// Entry as an editor would type it
pub fn form(title: &str, authors: &str, publisher: &str) -> EntryForm {
    EntryForm {
        title: Some(title.to_string()),
        authors: authors.to_string(),
        publisher: publisher.to_string(),
        ..Default::default()
    }
}

pub fn new_entry(title: &str, authors: &str, publisher: &str) -> FullEntry {
    form(title, authors, publisher).into_entry(None)
}

/// Save a new entry and return its book id
pub async fn add(catalog: &CatalogService, entry: FullEntry) -> i64 {
    catalog.save_entry(entry).await.expect("save entry").row.id
}
