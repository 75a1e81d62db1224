//! Catalog entry endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    config::CatalogConfig,
    error::{AppError, AppResult},
    models::{
        DenormalizedRow, EntryForm, FullEntry, Page, PageRequest, SaveOutcome, SaveResponse,
        SortDirection, SortKey, ViewState,
    },
};

/// Page, sort and filter query parameters
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Zero-based page index (default: 0)
    #[validate(range(min = 0, message = "Page index must not be negative"))]
    pub page_index: Option<i64>,
    /// Rows per page (default from configuration)
    #[validate(range(min = 1, message = "Page size must be at least 1"))]
    pub page_size: Option<i64>,
    /// Case-insensitive substring matched against all displayed text
    pub filter: Option<String>,
    pub sort_key: Option<SortKey>,
    pub sort_direction: Option<SortDirection>,
    /// Match the filter ignoring case (default: true)
    pub case_insensitive: Option<bool>,
}

impl PageParams {
    fn into_request(self, config: &CatalogConfig) -> AppResult<PageRequest> {
        self.validate()?;

        let page_size = self.page_size.unwrap_or(config.default_page_size);
        if page_size > config.max_page_size {
            return Err(AppError::BadRequest(format!(
                "Page size must not exceed {}",
                config.max_page_size
            )));
        }

        Ok(PageRequest {
            page_index: self.page_index.unwrap_or(0),
            page_size,
            view: ViewState {
                filter: self.filter,
                sort_key: self.sort_key.unwrap_or_default(),
                sort_direction: self.sort_direction.unwrap_or_default(),
                case_insensitive: self.case_insensitive.unwrap_or(true),
            },
        })
    }
}

/// Page that holds a given entry
#[derive(Serialize, Deserialize, ToSchema)]
pub struct LocationResponse {
    pub page_index: i64,
}

/// List catalog rows with sorting, filtering and pagination
#[utoipa::path(
    get,
    path = "/entries",
    tag = "entries",
    params(PageParams),
    responses(
        (status = 200, description = "One page of catalog rows", body = Page),
        (status = 400, description = "Invalid paging parameters")
    )
)]
pub async fn list_entries(
    State(state): State<crate::AppState>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<Page>> {
    let request = params.into_request(&state.config.catalog)?;
    let page = state.services.catalog.query_page(&request).await?;
    Ok(Json(page))
}

/// Get a full entry by book ID
#[utoipa::path(
    get,
    path = "/entries/{id}",
    tag = "entries",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Entry details", body = FullEntry),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn get_entry(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<FullEntry>> {
    state
        .services
        .catalog
        .get_entry(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Entry {} not found", id)))
}

/// Find the page holding an entry under the given sort and filter
#[utoipa::path(
    get,
    path = "/entries/{id}/location",
    tag = "entries",
    params(
        ("id" = i64, Path, description = "Book ID"),
        PageParams
    ),
    responses(
        (status = 200, description = "Page index of the entry", body = LocationResponse),
        (status = 404, description = "Entry missing or filtered out")
    )
)]
pub async fn locate_entry(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    Query(params): Query<PageParams>,
) -> AppResult<Json<LocationResponse>> {
    let request = params.into_request(&state.config.catalog)?;
    state
        .services
        .catalog
        .locate(id, request.page_size, &request.view)
        .await?
        .map(|page_index| Json(LocationResponse { page_index }))
        .ok_or_else(|| AppError::NotFound(format!("Entry {} not in view", id)))
}

/// Create an empty placeholder entry
#[utoipa::path(
    post,
    path = "/entries/empty",
    tag = "entries",
    responses(
        (status = 201, description = "Placeholder created", body = DenormalizedRow)
    )
)]
pub async fn create_empty_entry(
    State(state): State<crate::AppState>,
) -> AppResult<(StatusCode, Json<DenormalizedRow>)> {
    let row = state.services.catalog.create_empty_entry().await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// Create an entry from an edit form
#[utoipa::path(
    post,
    path = "/entries",
    tag = "entries",
    request_body = EntryForm,
    responses(
        (status = 201, description = "Entry created", body = SaveResponse),
        (status = 200, description = "A book with this ISBN pair already exists", body = SaveResponse),
        (status = 422, description = "A person or publisher has no name")
    )
)]
pub async fn create_entry(
    State(state): State<crate::AppState>,
    Json(form): Json<EntryForm>,
) -> AppResult<(StatusCode, Json<SaveResponse>)> {
    form.validate()?;

    let saved = state.services.catalog.save_entry(form.into_entry(None)).await?;
    let status = match saved.outcome {
        SaveOutcome::Created => StatusCode::CREATED,
        _ => StatusCode::OK,
    };
    Ok((status, Json(saved)))
}

/// Update an entry from an edit form
#[utoipa::path(
    put,
    path = "/entries/{id}",
    tag = "entries",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    request_body = EntryForm,
    responses(
        (status = 200, description = "Entry updated", body = SaveResponse),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "Another book has this ISBN pair"),
        (status = 422, description = "A person or publisher has no name")
    )
)]
pub async fn update_entry(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
    Json(form): Json<EntryForm>,
) -> AppResult<Json<SaveResponse>> {
    form.validate()?;

    let saved = state.services.catalog.save_entry(form.into_entry(Some(id))).await?;
    Ok(Json(saved))
}

/// Delete an entry
#[utoipa::path(
    delete,
    path = "/entries/{id}",
    tag = "entries",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 404, description = "Entry not found")
    )
)]
pub async fn delete_entry(
    State(state): State<crate::AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    if !state.services.catalog.delete_entry(id).await? {
        return Err(AppError::NotFound(format!("Entry {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
