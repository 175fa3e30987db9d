use anyhow::{Context, Result};
use common::DriverCreationForm;
use sea_orm::Database;
use tracing::{debug, error, info, trace};

use crate::error::AppError;
use crate::handlers::drivers::register_driver;

/// Account details given on the command line.
#[derive(Debug, Clone)]
pub struct NewDriver {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
    pub password: String,
}

impl From<NewDriver> for DriverCreationForm {
    fn from(driver: NewDriver) -> Self {
        Self {
            username: driver.username,
            first_name: driver.first_name,
            last_name: driver.last_name,
            license_number: driver.license_number,
            password2: driver.password.clone(),
            password1: driver.password,
        }
    }
}

pub async fn create_driver(database_url: &str, driver: NewDriver) -> Result<()> {
    trace!("Entering create_driver function");
    debug!("Database URL: {}", database_url);

    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", database_url))?;

    match register_driver(&db, driver.into()).await {
        Ok(created) => {
            info!("Created driver {} with id {}", created, created.id);
        }
        Err(AppError::Validation(errors)) => {
            for (field, messages) in &errors {
                for message in messages {
                    error!("{}: {}", field, message);
                }
            }
            anyhow::bail!("Driver was not created: invalid input");
        }
        Err(e) => {
            error!("Failed to create driver: {}", e);
            return Err(e.into());
        }
    }

    db.close().await?;
    Ok(())
}
