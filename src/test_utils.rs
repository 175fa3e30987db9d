#[cfg(test)]
pub mod test_utils {
    use crate::auth::{hash_password, SESSION_COOKIE};
    use crate::config::Settings;
    use crate::router::create_router;
    use crate::schemas::AppState;
    use axum::http::StatusCode;
    use axum::Router;
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use model::entities::{car, driver, manufacturer};
    use moka::future::Cache;
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
    use std::sync::Arc;
    use tracing::Level;

    pub const TEST_PASSWORD: &str = "test12password";

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    /// Create AppState for testing
    pub async fn setup_test_app_state() -> AppState {
        let db = setup_test_db().await;
        let settings = Settings::default();
        let sessions = Cache::builder()
            .max_capacity(100)
            .time_to_live(settings.session_ttl())
            .build();

        AppState {
            db,
            sessions,
            settings: Arc::new(settings),
        }
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level follows RUST_LOG and defaults to WARN. Only the first
    /// call in a test binary installs the subscriber.
    pub fn init_test_tracing() {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| level.parse::<Level>().ok())
            .unwrap_or(Level::WARN);

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> Router {
        init_test_tracing();
        create_router(setup_test_app_state().await)
    }

    /// Test server plus the state behind it, for seeding data directly.
    pub async fn setup_test_server() -> (TestServer, AppState) {
        init_test_tracing();
        let state = setup_test_app_state().await;
        let server = TestServer::new(create_router(state.clone())).unwrap();
        (server, state)
    }

    pub async fn insert_driver(
        db: &DatabaseConnection,
        username: &str,
        first_name: &str,
        last_name: &str,
        license_number: &str,
    ) -> driver::Model {
        driver::ActiveModel {
            username: Set(username.to_string()),
            password: Set(hash_password(TEST_PASSWORD).unwrap()),
            first_name: Set(first_name.to_string()),
            last_name: Set(last_name.to_string()),
            email: Set(String::new()),
            is_staff: Set(false),
            is_active: Set(true),
            date_joined: Set(Utc::now()),
            last_login: Set(None),
            license_number: Set(license_number.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create driver")
    }

    pub async fn insert_manufacturer(db: &DatabaseConnection, name: &str, country: &str) -> manufacturer::Model {
        manufacturer::ActiveModel {
            name: Set(name.to_string()),
            country: Set(country.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create manufacturer")
    }

    pub async fn insert_car(db: &DatabaseConnection, model: &str, manufacturer_id: i32) -> car::Model {
        car::ActiveModel {
            model: Set(model.to_string()),
            manufacturer_id: Set(manufacturer_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create car")
    }

    /// Logs in through the login endpoint and returns the session cookie.
    pub async fn login(server: &TestServer, username: &str, password: &str) -> Cookie<'static> {
        let response = server
            .post("/accounts/login/")
            .form(&[("username", username), ("password", password)])
            .await;
        response.assert_status(StatusCode::FOUND);
        response.cookie(SESSION_COOKIE)
    }

    /// Server with one logged-in driver, `user1_username (user1_fname user1_lname)`.
    pub async fn setup_logged_in() -> (TestServer, AppState, Cookie<'static>, driver::Model) {
        let (server, state) = setup_test_server().await;
        let driver = insert_driver(&state.db, "user1_username", "user1_fname", "user1_lname", "QWE12345").await;
        let cookie = login(&server, &driver.username, TEST_PASSWORD).await;
        (server, state, cookie, driver)
    }
}
