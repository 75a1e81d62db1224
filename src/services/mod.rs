//! Business logic services

pub mod catalog;
pub mod view;

use std::time::Duration;

use crate::{config::CatalogConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    search_debounce: Duration,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, catalog_config: &CatalogConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository),
            search_debounce: Duration::from_millis(catalog_config.search_debounce_ms),
        }
    }

    /// Open a view with its own query sequence and search debounce.
    /// Each interactive client holds one; views never share staleness state.
    pub fn open_view(&self) -> view::CatalogView {
        view::CatalogView::new(self.catalog.clone(), self.search_debounce)
    }
}
