use common::{PageInfo, SearchFormState};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::auth::Session;
use crate::config::Settings;
use crate::handlers::{
    accounts::LoginPage,
    cars::{CarDetail, CarListContext, CarResponse},
    drivers::{DriverDetail, DriverListContext, DriverResponse},
    index::IndexContext,
    manufacturers::{ManufacturerListContext, ManufacturerResponse},
};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Logged-in sessions keyed by the session cookie value
    pub sessions: Cache<String, Session>,
    pub settings: Arc<Settings>,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
#[aliases(
    IndexApiResponse = ApiResponse<IndexContext>,
    ManufacturerListApiResponse = ApiResponse<ManufacturerListContext>,
    CarListApiResponse = ApiResponse<CarListContext>,
    CarDetailApiResponse = ApiResponse<CarDetail>,
    DriverListApiResponse = ApiResponse<DriverListContext>,
    DriverDetailApiResponse = ApiResponse<DriverDetail>,
)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
    /// Per-field validation messages; `__all__` holds errors not tied to a field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<BTreeMap<String, Vec<String>>>,
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::accounts::login_page,
        crate::handlers::accounts::login,
        crate::handlers::accounts::logout,
        crate::handlers::index::index,
        crate::handlers::manufacturers::list_manufacturers,
        crate::handlers::manufacturers::create_manufacturer,
        crate::handlers::manufacturers::update_manufacturer,
        crate::handlers::manufacturers::delete_manufacturer,
        crate::handlers::cars::list_cars,
        crate::handlers::cars::get_car,
        crate::handlers::cars::create_car,
        crate::handlers::cars::update_car,
        crate::handlers::cars::delete_car,
        crate::handlers::cars::toggle_assign_to_car,
        crate::handlers::drivers::list_drivers,
        crate::handlers::drivers::get_driver,
        crate::handlers::drivers::create_driver,
        crate::handlers::drivers::update_driver_license,
        crate::handlers::drivers::delete_driver,
    ),
    components(
        schemas(
            IndexApiResponse,
            ManufacturerListApiResponse,
            CarListApiResponse,
            CarDetailApiResponse,
            DriverListApiResponse,
            DriverDetailApiResponse,
            ErrorResponse,
            HealthResponse,
            LoginPage,
            IndexContext,
            ManufacturerListContext,
            ManufacturerResponse,
            CarListContext,
            CarResponse,
            CarDetail,
            DriverListContext,
            DriverResponse,
            DriverDetail,
            PageInfo,
            SearchFormState,
            common::ManufacturerForm,
            common::CarForm,
            common::DriverCreationForm,
            common::DriverLicenseUpdateForm,
            common::LoginForm,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "accounts", description = "Login and logout"),
        (name = "index", description = "Fleet overview"),
        (name = "manufacturers", description = "Manufacturer pages"),
        (name = "cars", description = "Car pages"),
        (name = "drivers", description = "Driver pages"),
    ),
    info(
        title = "Taxi Service API",
        description = "Taxi fleet management - manufacturers, cars, and their drivers",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
