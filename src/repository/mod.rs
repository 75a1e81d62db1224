//! Repository layer for database operations

pub mod books;
pub mod natural_keys;
pub mod pages;
pub mod projection;
pub mod relations;

use std::{str::FromStr, sync::Arc};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite, Transaction,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{config::DatabaseConfig, error::AppResult};

/// Main repository struct holding the connection pool and the catalog collaborators
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Sqlite>,
    pub natural_keys: natural_keys::NaturalKeyStore,
    pub relations: relations::RelationSynchronizer,
    pub books: books::BooksRepository,
    pub projection: projection::Projection,
    pub pages: pages::PageQueryEngine,
    pub locator: pages::PageLocator,
    /// SQLite admits one writer at a time; write transactions queue here
    /// instead of failing with `database is locked`.
    write_lock: Arc<Mutex<()>>,
}

/// Exclusive permission to write, held until the transaction is finished
pub type WriteGuard = OwnedMutexGuard<()>;

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            natural_keys: natural_keys::NaturalKeyStore::new(),
            relations: relations::RelationSynchronizer::new(),
            books: books::BooksRepository::new(),
            projection: projection::Projection::new(),
            pages: pages::PageQueryEngine::new(pool.clone()),
            locator: pages::PageLocator::new(pool.clone()),
            write_lock: Arc::new(Mutex::new(())),
            pool,
        }
    }

    /// Begin a write transaction once every earlier writer has finished.
    ///
    /// Keep the guard alive until the transaction is committed or dropped.
    pub async fn begin_write(&self) -> AppResult<(WriteGuard, Transaction<'static, Sqlite>)> {
        let guard = self.write_lock.clone().lock_owned().await;
        let tx = self.pool.begin().await?;
        Ok((guard, tx))
    }

    /// Open a pool from configuration. The database file is created if missing.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Pool<Sqlite>> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_with(options)
            .await?;
        Ok(pool)
    }

    /// Open a migrated in-memory database, useful for testing.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is
    /// pinned to one connection that is never recycled.
    pub async fn open_in_memory() -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let repository = Self::new(pool);
        repository.migrate().await?;
        Ok(repository)
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}
