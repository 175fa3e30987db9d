use axum::{
    extract::{Extension, Path, Query, State},
    response::{Json, Response},
};
use axum_extra::extract::WithRejection;
use common::{CarForm, CarSearchForm, PageInfo, PageQuery, SearchForm, SearchFormState};
use model::entities::{car, car_driver, driver, manufacturer};
use model::listing;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

use super::drivers::DriverResponse;
use super::manufacturers::ManufacturerResponse;
use crate::auth::{self, CurrentUser};
use crate::error::AppError;
use crate::schemas::{ApiResponse, AppState, CarDetailApiResponse, CarListApiResponse, ErrorResponse};

const LIST_URL: &str = "/cars/";

/// A car as shown in lists
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CarResponse {
    pub id: i32,
    pub model: String,
    pub manufacturer_id: i32,
    /// Display string of the manufacturer
    pub manufacturer: String,
    pub absolute_url: String,
}

impl CarResponse {
    pub fn new(car: car::Model, manufacturer: Option<manufacturer::Model>) -> Self {
        Self {
            absolute_url: car.absolute_url(),
            manufacturer: manufacturer.map(|m| m.to_string()).unwrap_or_default(),
            id: car.id,
            model: car.model,
            manufacturer_id: car.manufacturer_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CarListContext {
    pub car_list: Vec<CarResponse>,
    pub is_paginated: bool,
    pub page: PageInfo,
    pub search_form: SearchFormState,
    pub user: String,
}

/// A car with its manufacturer and drivers
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CarDetail {
    pub id: i32,
    pub model: String,
    pub manufacturer: ManufacturerResponse,
    pub drivers: Vec<DriverResponse>,
    pub absolute_url: String,
    /// Whether the logged-in driver is assigned to this car
    pub is_assigned: bool,
}

/// Checks the foreign keys a car form refers to. Returns the deduplicated
/// driver ids.
async fn check_references<C: ConnectionTrait>(db: &C, form: &CarForm) -> Result<Vec<i32>, AppError> {
    if manufacturer::Entity::find_by_id(form.manufacturer_id).one(db).await?.is_none() {
        debug!("Unknown manufacturer {}", form.manufacturer_id);
        return Err(AppError::field(
            "manufacturer_id",
            "Select a valid choice. That choice is not one of the available choices.",
        ));
    }

    let driver_ids: Vec<i32> = form.drivers.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    if driver_ids.is_empty() {
        return Ok(driver_ids);
    }

    let known: BTreeSet<i32> = driver::Entity::find()
        .filter(driver::Column::Id.is_in(driver_ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|d| d.id)
        .collect();
    if let Some(missing) = driver_ids.iter().find(|id| !known.contains(*id)) {
        debug!("Unknown driver {}", missing);
        return Err(AppError::field(
            "drivers",
            format!("Select a valid choice. {} is not one of the available choices.", missing),
        ));
    }
    Ok(driver_ids)
}

/// Replaces the driver assignments of `car_id`.
async fn assign_drivers<C: ConnectionTrait>(db: &C, car_id: i32, driver_ids: &[i32]) -> Result<(), AppError> {
    car_driver::Entity::delete_many()
        .filter(car_driver::Column::CarId.eq(car_id))
        .exec(db)
        .await?;

    if driver_ids.is_empty() {
        return Ok(());
    }
    let rows = driver_ids.iter().map(|&driver_id| car_driver::ActiveModel {
        car_id: Set(car_id),
        driver_id: Set(driver_id),
    });
    let inserted = car_driver::Entity::insert_many(rows).exec_without_returning(db).await?;
    trace!("Assigned {} drivers to car {}", inserted, car_id);
    Ok(())
}

/// List cars, filtered by model
#[utoipa::path(
    get,
    path = "/cars/",
    params(CarSearchForm, PageQuery),
    responses(
        (status = 200, description = "One page of cars with their manufacturers", body = CarListApiResponse),
        (status = 302, description = "Not logged in; redirect to the login page"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "cars"
)]
#[instrument(skip(state, current))]
pub async fn list_cars(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(search): Query<CarSearchForm>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<CarListContext>>, AppError> {
    trace!("Entering list_cars");
    let model = search.cleaned();

    let page = listing::fetch_page(&state.db, listing::cars(&model), page.request())
        .await?
        .map(|(car, manufacturer)| CarResponse::new(car, manufacturer));
    debug!("Returning {} cars", page.items.len());

    Ok(Json(ApiResponse::ok(
        CarListContext {
            car_list: page.items,
            is_paginated: page.info.is_paginated(),
            page: page.info,
            search_form: search.state(),
            user: current.driver.to_string(),
        },
        "Cars retrieved successfully",
    )))
}

/// Get a car with its manufacturer and drivers
#[utoipa::path(
    get,
    path = "/cars/{id}/",
    params(("id" = i32, Path, description = "Car ID")),
    responses(
        (status = 200, description = "Car details", body = CarDetailApiResponse),
        (status = 404, description = "Car not found", body = ErrorResponse)
    ),
    tag = "cars"
)]
#[instrument(skip(state, current))]
pub async fn get_car(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CarDetail>>, AppError> {
    let (car, manufacturer) = car::Entity::find_by_id(id)
        .find_also_related(manufacturer::Entity)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("Car", id))?;
    let manufacturer = manufacturer.ok_or_else(|| AppError::not_found("Manufacturer", car.manufacturer_id))?;

    let drivers = car
        .find_related(driver::Entity)
        .order_by_asc(driver::Column::Id)
        .all(&state.db)
        .await?;
    let is_assigned = drivers.iter().any(|d| d.id == current.driver.id);
    debug!("Car {} has {} drivers", id, drivers.len());

    Ok(Json(ApiResponse::ok(
        CarDetail {
            absolute_url: car.absolute_url(),
            id: car.id,
            model: car.model,
            manufacturer: manufacturer.into(),
            drivers: drivers.into_iter().map(DriverResponse::from).collect(),
            is_assigned,
        },
        "Car retrieved successfully",
    )))
}

/// Create a car and assign its drivers
#[utoipa::path(
    post,
    path = "/cars/create/",
    request_body = CarForm,
    responses(
        (status = 302, description = "Created; redirect to the car list"),
        (status = 400, description = "Invalid form data", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "cars"
)]
#[instrument(skip(state))]
pub async fn create_car(
    State(state): State<AppState>,
    WithRejection(Json(form), _): WithRejection<Json<CarForm>, AppError>,
) -> Result<Response, AppError> {
    form.validate()?;

    let txn = state.db.begin().await?;
    let driver_ids = check_references(&txn, &form).await?;
    let created = car::ActiveModel {
        model: Set(form.model),
        manufacturer_id: Set(form.manufacturer_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    assign_drivers(&txn, created.id, &driver_ids).await?;
    txn.commit().await?;

    info!("Created car {} with {} drivers", created.id, driver_ids.len());
    Ok(auth::found(LIST_URL))
}

/// Update a car and replace its drivers
#[utoipa::path(
    post,
    path = "/cars/{id}/update/",
    params(("id" = i32, Path, description = "Car ID")),
    request_body = CarForm,
    responses(
        (status = 302, description = "Updated; redirect to the car list"),
        (status = 400, description = "Invalid form data", body = ErrorResponse),
        (status = 404, description = "Car not found", body = ErrorResponse)
    ),
    tag = "cars"
)]
#[instrument(skip(state))]
pub async fn update_car(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    WithRejection(Json(form), _): WithRejection<Json<CarForm>, AppError>,
) -> Result<Response, AppError> {
    let existing = car::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("Car", id))?;
    form.validate()?;

    let txn = state.db.begin().await?;
    let driver_ids = check_references(&txn, &form).await?;
    let mut active = existing.into_active_model();
    active.model = Set(form.model);
    active.manufacturer_id = Set(form.manufacturer_id);
    active.update(&txn).await?;
    assign_drivers(&txn, id, &driver_ids).await?;
    txn.commit().await?;

    info!("Updated car {}", id);
    Ok(auth::found(LIST_URL))
}

/// Delete a car
#[utoipa::path(
    post,
    path = "/cars/{id}/delete/",
    params(("id" = i32, Path, description = "Car ID")),
    responses(
        (status = 302, description = "Deleted; redirect to the car list"),
        (status = 404, description = "Car not found", body = ErrorResponse)
    ),
    tag = "cars"
)]
#[instrument(skip(state))]
pub async fn delete_car(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Response, AppError> {
    let result = car::Entity::delete_by_id(id).exec(&state.db).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Car", id));
    }

    info!("Deleted car {}", id);
    Ok(auth::found(LIST_URL))
}

/// Assign the logged-in driver to a car, or unassign them if already assigned
#[utoipa::path(
    post,
    path = "/cars/{id}/toggle-assign/",
    params(("id" = i32, Path, description = "Car ID")),
    responses(
        (status = 302, description = "Toggled; redirect to the car detail page"),
        (status = 404, description = "Car not found", body = ErrorResponse)
    ),
    tag = "cars"
)]
#[instrument(skip(state, current))]
pub async fn toggle_assign_to_car(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let car = car::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("Car", id))?;
    let driver_id = current.driver.id;

    let assignment = car_driver::Entity::find()
        .filter(car_driver::Column::CarId.eq(car.id))
        .filter(car_driver::Column::DriverId.eq(driver_id));

    if assignment.count(&state.db).await? > 0 {
        car_driver::Entity::delete_many()
            .filter(car_driver::Column::CarId.eq(car.id))
            .filter(car_driver::Column::DriverId.eq(driver_id))
            .exec(&state.db)
            .await?;
        info!("Driver {} left car {}", driver_id, car.id);
    } else {
        car_driver::Entity::insert(car_driver::ActiveModel {
            car_id: Set(car.id),
            driver_id: Set(driver_id),
        })
        .exec_without_returning(&state.db)
        .await?;
        info!("Driver {} joined car {}", driver_id, car.id);
    }

    Ok(auth::found(car.absolute_url()))
}
