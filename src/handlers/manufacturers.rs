use axum::{
    extract::{Extension, Path, Query, State},
    response::{Json, Response},
};
use axum_extra::extract::WithRejection;
use common::{ManufacturerForm, ManufacturerSearchForm, PageInfo, PageQuery, SearchForm, SearchFormState};
use model::entities::manufacturer;
use model::listing;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{self, CurrentUser};
use crate::error::{AppError, is_unique_violation};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, ManufacturerListApiResponse};

const LIST_URL: &str = "/manufacturers/";
const NAME_TAKEN: &str = "Manufacturer with this Name already exists.";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ManufacturerResponse {
    pub id: i32,
    pub name: String,
    pub country: String,
    /// `"<name> <country>"`
    pub display: String,
}

impl From<manufacturer::Model> for ManufacturerResponse {
    fn from(model: manufacturer::Model) -> Self {
        let display = model.to_string();
        Self {
            id: model.id,
            name: model.name,
            country: model.country,
            display,
        }
    }
}

/// One page of the manufacturer list
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ManufacturerListContext {
    pub manufacturer_list: Vec<ManufacturerResponse>,
    pub is_paginated: bool,
    pub page: PageInfo,
    pub search_form: SearchFormState,
    pub user: String,
}

async fn ensure_name_free(state: &AppState, name: &str, exclude: Option<i32>) -> Result<(), AppError> {
    let mut query = manufacturer::Entity::find().filter(manufacturer::Column::Name.eq(name));
    if let Some(id) = exclude {
        query = query.filter(manufacturer::Column::Id.ne(id));
    }
    if query.one(&state.db).await?.is_some() {
        debug!("Manufacturer name '{}' is taken", name);
        return Err(AppError::field("name", NAME_TAKEN));
    }
    Ok(())
}

fn map_write_error(error: sea_orm::DbErr) -> AppError {
    if is_unique_violation(&error) {
        AppError::field("name", NAME_TAKEN)
    } else {
        AppError::Database(error)
    }
}

/// List manufacturers, filtered by name
#[utoipa::path(
    get,
    path = "/manufacturers/",
    params(ManufacturerSearchForm, PageQuery),
    responses(
        (status = 200, description = "One page of manufacturers ordered by name", body = ManufacturerListApiResponse),
        (status = 302, description = "Not logged in; redirect to the login page"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "manufacturers"
)]
#[instrument(skip(state, current))]
pub async fn list_manufacturers(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(search): Query<ManufacturerSearchForm>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<ManufacturerListContext>>, AppError> {
    trace!("Entering list_manufacturers");
    let name = search.cleaned();

    let page = listing::fetch_page(&state.db, listing::manufacturers(&name), page.request())
        .await?
        .map(ManufacturerResponse::from);
    debug!("Returning {} manufacturers", page.items.len());

    Ok(Json(ApiResponse::ok(
        ManufacturerListContext {
            manufacturer_list: page.items,
            is_paginated: page.info.is_paginated(),
            page: page.info,
            search_form: search.state(),
            user: current.driver.to_string(),
        },
        "Manufacturers retrieved successfully",
    )))
}

/// Create a manufacturer
#[utoipa::path(
    post,
    path = "/manufacturers/create/",
    request_body = ManufacturerForm,
    responses(
        (status = 302, description = "Created; redirect to the manufacturer list"),
        (status = 400, description = "Invalid form data", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "manufacturers"
)]
#[instrument(skip(state))]
pub async fn create_manufacturer(
    State(state): State<AppState>,
    WithRejection(Json(form), _): WithRejection<Json<ManufacturerForm>, AppError>,
) -> Result<Response, AppError> {
    form.validate()?;
    ensure_name_free(&state, &form.name, None).await?;

    let created = manufacturer::ActiveModel {
        name: Set(form.name),
        country: Set(form.country),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(map_write_error)?;

    info!("Created manufacturer {}", created.id);
    Ok(auth::found(LIST_URL))
}

/// Update a manufacturer
#[utoipa::path(
    post,
    path = "/manufacturers/{id}/update/",
    params(("id" = i32, Path, description = "Manufacturer ID")),
    request_body = ManufacturerForm,
    responses(
        (status = 302, description = "Updated; redirect to the manufacturer list"),
        (status = 400, description = "Invalid form data", body = ErrorResponse),
        (status = 404, description = "Manufacturer not found", body = ErrorResponse)
    ),
    tag = "manufacturers"
)]
#[instrument(skip(state))]
pub async fn update_manufacturer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    WithRejection(Json(form), _): WithRejection<Json<ManufacturerForm>, AppError>,
) -> Result<Response, AppError> {
    let existing = manufacturer::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("Manufacturer", id))?;

    form.validate()?;
    ensure_name_free(&state, &form.name, Some(id)).await?;

    let mut active = existing.into_active_model();
    active.name = Set(form.name);
    active.country = Set(form.country);
    active.update(&state.db).await.map_err(map_write_error)?;

    info!("Updated manufacturer {}", id);
    Ok(auth::found(LIST_URL))
}

/// Delete a manufacturer together with its cars
#[utoipa::path(
    post,
    path = "/manufacturers/{id}/delete/",
    params(("id" = i32, Path, description = "Manufacturer ID")),
    responses(
        (status = 302, description = "Deleted; redirect to the manufacturer list"),
        (status = 404, description = "Manufacturer not found", body = ErrorResponse)
    ),
    tag = "manufacturers"
)]
#[instrument(skip(state))]
pub async fn delete_manufacturer(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Response, AppError> {
    let result = manufacturer::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Manufacturer", id));
    }

    info!("Deleted manufacturer {}", id);
    Ok(auth::found(LIST_URL))
}
