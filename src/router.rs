use crate::auth::require_login;
use crate::handlers::{
    accounts::{login, login_page, logout},
    cars::{create_car, delete_car, get_car, list_cars, toggle_assign_to_car, update_car},
    drivers::{create_driver, delete_driver, get_driver, list_drivers, update_driver_license},
    health::health_check,
    index::index,
    manufacturers::{create_manufacturer, delete_manufacturer, list_manufacturers, update_manufacturer},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use axum_prometheus::PrometheusMetricLayer;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Pages that need a logged-in driver
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        // Manufacturers
        .route("/manufacturers/", get(list_manufacturers))
        .route("/manufacturers/create/", post(create_manufacturer))
        .route("/manufacturers/:id/update/", post(update_manufacturer))
        .route("/manufacturers/:id/delete/", post(delete_manufacturer))
        // Cars
        .route("/cars/", get(list_cars))
        .route("/cars/create/", post(create_car))
        .route("/cars/:id/", get(get_car))
        .route("/cars/:id/update/", post(update_car))
        .route("/cars/:id/delete/", post(delete_car))
        .route("/cars/:id/toggle-assign/", post(toggle_assign_to_car))
        // Drivers
        .route("/drivers/", get(list_drivers))
        .route("/drivers/create/", post(create_driver))
        .route("/drivers/:id/", get(get_driver))
        .route("/drivers/:id/update/", post(update_driver_license))
        .route("/drivers/:id/delete/", post(delete_driver))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login))
}

fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Login and logout
        .route("/accounts/login/", get(login_page).post(login))
        .route("/accounts/logout/", post(logout))
        .merge(protected_routes(state))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let timeout = state.settings.request_timeout();
    routes(&state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(timeout)),
        )
        .with_state(state)
}

/// [`create_router`] plus Prometheus request metrics served at `/metrics`.
///
/// The metrics recorder is process-global, so this is called once per process.
pub fn create_router_with_metrics(state: AppState) -> Router {
    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
    create_router(state)
        .route("/metrics", get(move || async move { metric_handle.render() }))
        .layer(prometheus_layer)
}
