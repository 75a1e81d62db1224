//! Ordered many-to-many synchronization between books and persons, and the
//! single-slot book-publisher link.

use std::collections::{HashMap, HashSet};

use sqlx::SqliteConnection;

use crate::{
    error::AppResult,
    models::{contribution::Contribution, ContributorRole, SyncReport},
};

/// What happened to a book's publication link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationChange {
    Unchanged,
    Added,
    Removed,
    Replaced,
}

#[derive(Clone, Default)]
pub struct RelationSynchronizer;

impl RelationSynchronizer {
    pub fn new() -> Self {
        Self
    }

    /// Associations of `book_id` in `role`, in display order.
    pub async fn contributions(
        &self,
        conn: &mut SqliteConnection,
        book_id: i64,
        role: ContributorRole,
    ) -> AppResult<Vec<Contribution>> {
        let rows = sqlx::query_as::<_, Contribution>(
            r#"
            SELECT book_id, person_id, role, position
            FROM contributions
            WHERE book_id = ?1 AND role = ?2
            ORDER BY position, person_id
            "#,
        )
        .bind(book_id)
        .bind(role.as_str())
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// Person ids associated with `book_id` in `role`, in display order.
    pub async fn current(
        &self,
        conn: &mut SqliteConnection,
        book_id: i64,
        role: ContributorRole,
    ) -> AppResult<Vec<i64>> {
        Ok(self
            .contributions(conn, book_id, role)
            .await?
            .into_iter()
            .map(|c| c.person_id)
            .collect())
    }

    /// Make the stored associations of `book_id` in `role` equal `desired`.
    ///
    /// Persons no longer desired are deleted, every desired person is upserted
    /// with its zero-based position. A person listed twice keeps its last
    /// position. Rows already at the right position are not rewritten.
    pub async fn synchronize(
        &self,
        conn: &mut SqliteConnection,
        book_id: i64,
        role: ContributorRole,
        desired: &[i64],
    ) -> AppResult<SyncReport> {
        let current: HashMap<i64, i64> = self
            .contributions(conn, book_id, role)
            .await?
            .into_iter()
            .map(|c| (c.person_id, c.position))
            .collect();

        let mut positions: HashMap<i64, i64> = HashMap::with_capacity(desired.len());
        for (position, person_id) in desired.iter().enumerate() {
            positions.insert(*person_id, position as i64);
        }
        let mut target: Vec<(i64, i64)> = positions.into_iter().collect();
        target.sort_by_key(|(_, position)| *position);

        let wanted: HashSet<i64> = target.iter().map(|(id, _)| *id).collect();
        let to_remove: Vec<i64> = current
            .keys()
            .filter(|id| !wanted.contains(id))
            .copied()
            .collect();

        let mut report = SyncReport::default();

        if !to_remove.is_empty() {
            for &person_id in &to_remove {
                sqlx::query(
                    "DELETE FROM contributions WHERE book_id = ?1 AND person_id = ?2 AND role = ?3",
                )
                .bind(book_id)
                .bind(person_id)
                .bind(role.as_str())
                .execute(&mut *conn)
                .await?;
            }
            report.removed = to_remove.len();
        }

        if !target.is_empty() {
            for &(person_id, position) in &target {
                sqlx::query(
                    r#"
                    INSERT INTO contributions (book_id, person_id, role, position)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT (book_id, person_id, role)
                    DO UPDATE SET position = excluded.position
                    WHERE contributions.position <> excluded.position
                    "#,
                )
                .bind(book_id)
                .bind(person_id)
                .bind(role.as_str())
                .bind(position)
                .execute(&mut *conn)
                .await?;

                match current.get(&person_id) {
                    None => report.added += 1,
                    Some(&old) if old != position => report.moved += 1,
                    Some(_) => {}
                }
            }
        }

        if !report.is_noop() {
            tracing::debug!(
                book_id,
                %role,
                removed = report.removed,
                added = report.added,
                moved = report.moved,
                "Synchronized contributors"
            );
        }

        Ok(report)
    }

    /// Publisher currently linked to `book_id`
    pub async fn publication(&self, conn: &mut SqliteConnection, book_id: i64) -> AppResult<Option<i64>> {
        let publisher_id = sqlx::query_scalar("SELECT publisher_id FROM publications WHERE book_id = ?1")
            .bind(book_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(publisher_id)
    }

    /// Point `book_id` at `publisher_id`, or unlink it when `None`.
    ///
    /// The current link is removed only when the publisher changes or goes
    /// away, and a link is added only when it differs from the current one.
    pub async fn synchronize_publication(
        &self,
        conn: &mut SqliteConnection,
        book_id: i64,
        publisher_id: Option<i64>,
    ) -> AppResult<PublicationChange> {
        let current = self.publication(conn, book_id).await?;

        let remove = current.is_some() && current != publisher_id;
        let add = publisher_id.is_some() && publisher_id != current;

        if remove {
            sqlx::query("DELETE FROM publications WHERE book_id = ?1")
                .bind(book_id)
                .execute(&mut *conn)
                .await?;
        }

        if let (true, Some(publisher_id)) = (add, publisher_id) {
            sqlx::query("INSERT INTO publications (book_id, publisher_id) VALUES (?1, ?2)")
                .bind(book_id)
                .bind(publisher_id)
                .execute(&mut *conn)
                .await?;
        }

        let change = match (remove, add) {
            (false, false) => PublicationChange::Unchanged,
            (false, true) => PublicationChange::Added,
            (true, false) => PublicationChange::Removed,
            (true, true) => PublicationChange::Replaced,
        };
        if change != PublicationChange::Unchanged {
            tracing::debug!(book_id, ?publisher_id, ?change, "Synchronized publication");
        }

        Ok(change)
    }
}
