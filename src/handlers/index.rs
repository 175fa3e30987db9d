use axum::{
    extract::{Extension, State},
    response::Json,
};
use model::entities::prelude::*;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::auth::{self, CurrentUser};
use crate::error::AppError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse, IndexApiResponse};

/// Fleet overview shown on the home page
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IndexContext {
    pub num_drivers: u64,
    pub num_cars: u64,
    pub num_manufacturers: u64,
    /// How many times this session has loaded the home page, this visit included
    pub num_visits: u64,
    /// Display string of the logged-in driver
    pub user: String,
}

/// Home page
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Fleet overview", body = IndexApiResponse),
        (status = 302, description = "Not logged in; redirect to the login page"),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "index"
)]
#[instrument(skip(state, current))]
pub async fn index(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<IndexContext>>, AppError> {
    let num_drivers = Driver::find().count(&state.db).await?;
    let num_cars = Car::find().count(&state.db).await?;
    let num_manufacturers = Manufacturer::find().count(&state.db).await?;
    let num_visits = auth::record_visit(&state, &current.session_key).await;

    debug!(
        "Index: {} drivers, {} cars, {} manufacturers, visit {}",
        num_drivers, num_cars, num_manufacturers, num_visits
    );

    Ok(Json(ApiResponse::ok(
        IndexContext {
            num_drivers,
            num_cars,
            num_manufacturers,
            num_visits,
            user: current.driver.to_string(),
        },
        "Fleet overview",
    )))
}
