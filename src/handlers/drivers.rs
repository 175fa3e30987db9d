use axum::{
    extract::{Extension, Path, Query, State},
    response::{Json, Response},
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use common::{
    DriverCreationForm, DriverLicenseUpdateForm, DriverSearchForm, PageInfo, PageQuery, SearchForm, SearchFormState,
};
use model::entities::{car, driver, manufacturer};
use model::listing;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel, ModelTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

use super::cars::CarResponse;
use crate::auth::{self, CurrentUser};
use crate::error::AppError;
use crate::schemas::{ApiResponse, AppState, DriverDetailApiResponse, DriverListApiResponse, ErrorResponse};

const LIST_URL: &str = "/drivers/";
const USERNAME_TAKEN: &str = "A user with that username already exists.";
const LICENSE_TAKEN: &str = "Driver with this License number already exists.";

/// A driver as shown in lists
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DriverResponse {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
    /// `"<username> (<first_name> <last_name>)"`
    pub display: String,
    pub absolute_url: String,
}

impl From<driver::Model> for DriverResponse {
    fn from(model: driver::Model) -> Self {
        Self {
            display: model.to_string(),
            absolute_url: model.absolute_url(),
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            license_number: model.license_number,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DriverListContext {
    pub driver_list: Vec<DriverResponse>,
    pub is_paginated: bool,
    pub page: PageInfo,
    pub search_form: SearchFormState,
    pub user: String,
}

/// A driver with the cars they drive
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DriverDetail {
    #[serde(flatten)]
    pub driver: DriverResponse,
    pub cars: Vec<CarResponse>,
}

async fn ensure_license_free<C: ConnectionTrait>(db: &C, license_number: &str, exclude: Option<i32>) -> Result<(), AppError> {
    let mut query = driver::Entity::find().filter(driver::Column::LicenseNumber.eq(license_number));
    if let Some(id) = exclude {
        query = query.filter(driver::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        debug!("License number {} is taken", license_number);
        return Err(AppError::field("license_number", LICENSE_TAKEN));
    }
    Ok(())
}

/// Maps a unique index violation back to the field it guards.
fn map_write_error(error: DbErr) -> AppError {
    match error.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) if message.contains("license_number") => {
            AppError::field("license_number", LICENSE_TAKEN)
        }
        Some(SqlErr::UniqueConstraintViolation(message)) if message.contains("username") => {
            AppError::field("username", USERNAME_TAKEN)
        }
        _ => AppError::Database(error),
    }
}

/// Validates a creation form and stores the new driver with a hashed password.
pub async fn register_driver<C: ConnectionTrait>(db: &C, form: DriverCreationForm) -> Result<driver::Model, AppError> {
    form.validate()?;

    let username_taken = driver::Entity::find()
        .filter(driver::Column::Username.eq(form.username.as_str()))
        .one(db)
        .await?
        .is_some();
    if username_taken {
        debug!("Username {} is taken", form.username);
        return Err(AppError::field("username", USERNAME_TAKEN));
    }
    ensure_license_free(db, &form.license_number, None).await?;

    let password = auth::hash_password(&form.password1)?;
    let created = driver::ActiveModel {
        username: Set(form.username),
        password: Set(password),
        first_name: Set(form.first_name),
        last_name: Set(form.last_name),
        email: Set(String::new()),
        is_staff: Set(false),
        is_active: Set(true),
        date_joined: Set(Utc::now()),
        last_login: Set(None),
        license_number: Set(form.license_number),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(map_write_error)?;

    info!("Registered driver {} ({})", created.id, created.username);
    Ok(created)
}

/// List drivers, filtered by username
#[utoipa::path(
    get,
    path = "/drivers/",
    params(DriverSearchForm, PageQuery),
    responses(
        (status = 200, description = "One page of drivers", body = DriverListApiResponse),
        (status = 302, description = "Not logged in; redirect to the login page"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "drivers"
)]
#[instrument(skip(state, current))]
pub async fn list_drivers(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(search): Query<DriverSearchForm>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<DriverListContext>>, AppError> {
    trace!("Entering list_drivers");
    let username = search.cleaned();

    let page = listing::fetch_page(&state.db, listing::drivers(&username), page.request())
        .await?
        .map(DriverResponse::from);
    debug!("Returning {} drivers", page.items.len());

    Ok(Json(ApiResponse::ok(
        DriverListContext {
            driver_list: page.items,
            is_paginated: page.info.is_paginated(),
            page: page.info,
            search_form: search.state(),
            user: current.driver.to_string(),
        },
        "Drivers retrieved successfully",
    )))
}

/// Get a driver with their cars
#[utoipa::path(
    get,
    path = "/drivers/{id}/",
    params(("id" = i32, Path, description = "Driver ID")),
    responses(
        (status = 200, description = "Driver details", body = DriverDetailApiResponse),
        (status = 404, description = "Driver not found", body = ErrorResponse)
    ),
    tag = "drivers"
)]
#[instrument(skip(state))]
pub async fn get_driver(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<DriverDetail>>, AppError> {
    let driver = driver::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("Driver", id))?;

    let cars = driver
        .find_related(car::Entity)
        .find_also_related(manufacturer::Entity)
        .order_by_asc(car::Column::Id)
        .all(&state.db)
        .await?;
    debug!("Driver {} drives {} cars", id, cars.len());

    Ok(Json(ApiResponse::ok(
        DriverDetail {
            driver: driver.into(),
            cars: cars
                .into_iter()
                .map(|(car, manufacturer)| CarResponse::new(car, manufacturer))
                .collect(),
        },
        "Driver retrieved successfully",
    )))
}

/// Register a new driver
#[utoipa::path(
    post,
    path = "/drivers/create/",
    request_body = DriverCreationForm,
    responses(
        (status = 302, description = "Created; redirect to the new driver's page"),
        (status = 400, description = "Invalid form data", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "drivers"
)]
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn create_driver(
    State(state): State<AppState>,
    WithRejection(Json(form), _): WithRejection<Json<DriverCreationForm>, AppError>,
) -> Result<Response, AppError> {
    let created = register_driver(&state.db, form).await?;
    Ok(auth::found(created.absolute_url()))
}

/// Replace a driver's license number
#[utoipa::path(
    post,
    path = "/drivers/{id}/update/",
    params(("id" = i32, Path, description = "Driver ID")),
    request_body = DriverLicenseUpdateForm,
    responses(
        (status = 302, description = "Updated; redirect to the driver list"),
        (status = 400, description = "Invalid license number", body = ErrorResponse),
        (status = 404, description = "Driver not found", body = ErrorResponse)
    ),
    tag = "drivers"
)]
#[instrument(skip(state))]
pub async fn update_driver_license(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    WithRejection(Json(form), _): WithRejection<Json<DriverLicenseUpdateForm>, AppError>,
) -> Result<Response, AppError> {
    let existing = driver::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("Driver", id))?;

    form.validate()?;
    ensure_license_free(&state.db, &form.license_number, Some(id)).await?;

    let mut active = existing.into_active_model();
    active.license_number = Set(form.license_number);
    active.update(&state.db).await.map_err(map_write_error)?;

    info!("Updated license number of driver {}", id);
    Ok(auth::found(LIST_URL))
}

/// Delete a driver
#[utoipa::path(
    post,
    path = "/drivers/{id}/delete/",
    params(("id" = i32, Path, description = "Driver ID")),
    responses(
        (status = 302, description = "Deleted; redirect to the driver list"),
        (status = 404, description = "Driver not found", body = ErrorResponse)
    ),
    tag = "drivers"
)]
#[instrument(skip(state, current))]
pub async fn delete_driver(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let result = driver::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Driver", id));
    }

    if id == current.driver.id {
        state.sessions.invalidate(&current.session_key).await;
    }
    info!("Deleted driver {}", id);
    Ok(auth::found(LIST_URL))
}
