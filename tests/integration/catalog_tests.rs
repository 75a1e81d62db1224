//! Catalog service tests: saves, reads and deletes of whole entries

use shelfmark_server::{
    error::AppError,
    models::{EntryForm, FullEntry, PageRequest, Person, SaveOutcome},
};

use crate::common::{add, catalog, count_rows, form, new_entry};

fn poetry_and_tales(title: &str) -> FullEntry {
    EntryForm {
        isbn10: Some("0940450186".to_string()),
        isbn13: Some("9780940450189".to_string()),
        ..form(title, "Poe, Edgar Allan", "New York: Library of America")
    }
    .into_entry(None)
}

#[tokio::test]
async fn test_same_isbn_pair_keeps_first_book() {
    let (repo, catalog) = catalog().await;

    let created = catalog.save_entry(poetry_and_tales("Poetry and Tales")).await.unwrap();
    assert_eq!(created.outcome, SaveOutcome::Created);
    assert_eq!(created.row.title.as_deref(), Some("Poetry and Tales"));
    assert_eq!(created.row.authors, "Poe, Edgar Allan");
    assert_eq!(created.row.publisher, "New York: Library of America");

    let again = catalog.save_entry(poetry_and_tales("Tales")).await.unwrap();
    assert_eq!(again.outcome, SaveOutcome::Existing);
    assert_eq!(again.row.id, created.row.id);
    assert_eq!(again.row.title.as_deref(), Some("Poetry and Tales"));

    assert_eq!(count_rows(&repo, "books").await, 1);
    assert_eq!(count_rows(&repo, "catalog_rows").await, 1);
    assert_eq!(count_rows(&repo, "persons").await, 1);
}

#[tokio::test]
async fn test_existing_book_discards_new_contributors() {
    let (repo, catalog) = catalog().await;
    catalog.save_entry(poetry_and_tales("Poetry and Tales")).await.unwrap();

    let mut resubmitted = poetry_and_tales("Poetry and Tales");
    resubmitted.authors = Person::parse_list("Quinn, Patrick F.");
    let saved = catalog.save_entry(resubmitted).await.unwrap();

    assert_eq!(saved.outcome, SaveOutcome::Existing);
    assert_eq!(saved.row.authors, "Poe, Edgar Allan");
    assert_eq!(count_rows(&repo, "persons").await, 1);
}

#[tokio::test]
async fn test_shared_person_is_stored_once() {
    let (repo, catalog) = catalog().await;

    add(&catalog, new_entry("Poetry", "Poe, Edgar Allan", "")).await;
    add(&catalog, new_entry("Tales", "Poe, Edgar Allan; Baudelaire, Charles", "")).await;

    assert_eq!(count_rows(&repo, "persons").await, 2);
    assert_eq!(count_rows(&repo, "contributions").await, 3);
}

#[tokio::test]
async fn test_get_entry_returns_nested_shape() {
    let (_, catalog) = catalog().await;
    let entry = EntryForm {
        editors: "Quinn, Patrick F.".to_string(),
        year: Some(1984),
        ..form(
            "Poetry and Tales",
            "Poe, Edgar Allan; Baudelaire, Charles",
            "New York: Library of America",
        )
    };
    let id = add(&catalog, entry.into_entry(None)).await;

    let stored = catalog.get_entry(id).await.unwrap().unwrap();
    assert_eq!(stored.book.id, Some(id));
    assert_eq!(stored.book.year, Some(1984));
    assert_eq!(Person::join(&stored.authors), "Poe, Edgar Allan; Baudelaire, Charles");
    assert_eq!(Person::join(&stored.editors), "Quinn, Patrick F.");
    let publisher = stored.publisher.unwrap();
    assert_eq!(publisher.name.as_deref(), Some("Library of America"));
    assert_eq!(publisher.location.as_deref(), Some("New York"));

    assert!(catalog.get_entry(id + 1).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_rewrites_relations_and_row() {
    let (repo, catalog) = catalog().await;
    let id = add(
        &catalog,
        new_entry("Poetry", "Poe, Edgar Allan; Baudelaire, Charles", "New York: Library of America"),
    )
    .await;

    let update = EntryForm {
        shelf_mark: Some("PS2602".to_string()),
        ..form("Poetry and Tales", "Baudelaire, Charles; Poe, Edgar Allan", "London: Penguin")
    };
    let saved = catalog.save_entry(update.into_entry(Some(id))).await.unwrap();

    assert_eq!(saved.outcome, SaveOutcome::Updated);
    assert_eq!(saved.row.id, id);
    assert_eq!(saved.row.title.as_deref(), Some("Poetry and Tales"));
    assert_eq!(saved.row.authors, "Baudelaire, Charles; Poe, Edgar Allan");
    assert_eq!(saved.row.publisher, "London: Penguin");
    assert_eq!(saved.row.shelf_mark.as_deref(), Some("PS2602"));
    assert_eq!(catalog.get_row(id).await.unwrap(), Some(saved.row));

    // The old publisher lost its only book.
    assert_eq!(count_rows(&repo, "publishers").await, 1);
    assert_eq!(count_rows(&repo, "publications").await, 1);
}

#[tokio::test]
async fn test_update_removing_everything_purges_orphans() {
    let (repo, catalog) = catalog().await;
    let id = add(&catalog, new_entry("Poetry", "Poe, Edgar Allan", "New York: Library of America")).await;

    let saved = catalog
        .save_entry(form("Poetry", "", "").into_entry(Some(id)))
        .await
        .unwrap();

    assert_eq!(saved.row.authors, "");
    assert_eq!(saved.row.publisher, "");
    assert_eq!(count_rows(&repo, "persons").await, 0);
    assert_eq!(count_rows(&repo, "publishers").await, 0);
}

#[tokio::test]
async fn test_update_unknown_book_is_not_found() {
    let (repo, catalog) = catalog().await;

    let result = catalog
        .save_entry(form("Ghost", "Poe, Edgar Allan", "").into_entry(Some(42)))
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(count_rows(&repo, "persons").await, 0);
}

#[tokio::test]
async fn test_update_to_taken_isbn_pair_conflicts() {
    let (_, catalog) = catalog().await;
    catalog.save_entry(poetry_and_tales("Poetry and Tales")).await.unwrap();
    let other = add(&catalog, new_entry("Other", "", "")).await;

    let mut update = poetry_and_tales("Other");
    update.book.id = Some(other);
    let result = catalog.save_entry(update).await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    let row = catalog.get_row(other).await.unwrap().unwrap();
    assert_eq!(row.authors, "");
}

#[tokio::test]
async fn test_failed_save_leaves_no_partial_state() {
    let (repo, catalog) = catalog().await;

    let mut entry = new_entry("Broken", "Poe, Edgar Allan", "New York: Library of America");
    entry.editors.push(Person::default());
    let result = catalog.save_entry(entry).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    for table in ["books", "persons", "publishers", "contributions", "catalog_rows"] {
        assert_eq!(count_rows(&repo, table).await, 0, "{}", table);
    }
}

#[tokio::test]
async fn test_create_empty_entry() {
    let (_, catalog) = catalog().await;

    let first = catalog.create_empty_entry().await.unwrap();
    let second = catalog.create_empty_entry().await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.title, None);
    assert_eq!(first.authors, "");
    assert_eq!(first.year, None);

    let page = catalog.query_page(&PageRequest::new(0, 10)).await.unwrap();
    assert_eq!(page.total_matching_rows, 2);
}

#[tokio::test]
async fn test_delete_cascades_and_purges() {
    let (repo, catalog) = catalog().await;
    let kept = add(&catalog, new_entry("Tales", "Poe, Edgar Allan", "")).await;
    let id = add(
        &catalog,
        new_entry("Poetry", "Poe, Edgar Allan; Baudelaire, Charles", "New York: Library of America"),
    )
    .await;

    assert!(catalog.delete_entry(id).await.unwrap());

    assert!(catalog.get_entry(id).await.unwrap().is_none());
    assert!(catalog.get_row(id).await.unwrap().is_none());
    assert_eq!(count_rows(&repo, "contributions").await, 1);
    assert_eq!(count_rows(&repo, "publications").await, 0);
    assert_eq!(count_rows(&repo, "persons").await, 1);
    assert_eq!(count_rows(&repo, "publishers").await, 0);
    assert!(catalog.get_row(kept).await.unwrap().is_some());

    assert!(!catalog.delete_entry(id).await.unwrap());
}

#[tokio::test]
async fn test_rebuild_projection_matches_incremental_rows() {
    let (repo, catalog) = catalog().await;
    let id = add(&catalog, poetry_and_tales("Poetry and Tales")).await;
    catalog.create_empty_entry().await.unwrap();
    let before = catalog.get_row(id).await.unwrap();

    sqlx::query("DELETE FROM catalog_rows").execute(&repo.pool).await.unwrap();
    let rebuilt = catalog.rebuild_projection().await.unwrap();

    assert_eq!(rebuilt, 2);
    assert_eq!(catalog.get_row(id).await.unwrap(), before);
}
