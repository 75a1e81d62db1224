//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{entries, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shelfmark API",
        version = "0.3.0",
        description = "Book catalog REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Entries
        entries::list_entries,
        entries::get_entry,
        entries::locate_entry,
        entries::create_empty_entry,
        entries::create_entry,
        entries::update_entry,
        entries::delete_entry,
    ),
    components(
        schemas(
            // Catalog
            crate::models::Book,
            crate::models::Person,
            crate::models::Publisher,
            crate::models::FullEntry,
            crate::models::EntryForm,
            crate::models::DenormalizedRow,
            crate::models::Page,
            crate::models::SortKey,
            crate::models::SortDirection,
            crate::models::SaveOutcome,
            crate::models::SaveResponse,
            entries::PageParams,
            entries::LocationResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "entries", description = "Catalog entries and paginated views")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
