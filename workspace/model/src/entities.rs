//! SeaORM entities for the taxi fleet: manufacturers, their cars, and the
//! drivers assigned to those cars.

pub mod car;
pub mod car_driver;
pub mod driver;
pub mod manufacturer;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::car::Entity as Car;
    pub use super::car_driver::Entity as CarDriver;
    pub use super::driver::Entity as Driver;
    pub use super::manufacturer::Entity as Manufacturer;
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{
        ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait,
        ModelTrait, PaginatorTrait, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    fn new_driver(username: &str, license_number: &str) -> driver::ActiveModel {
        driver::ActiveModel {
            username: Set(username.to_string()),
            password: Set("!".to_string()),
            first_name: Set(format!("{username}_fname")),
            last_name: Set(format!("{username}_lname")),
            email: Set(String::new()),
            is_staff: Set(false),
            is_active: Set(true),
            date_joined: Set(Utc::now()),
            last_login: Set(None),
            license_number: Set(license_number.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let manufacturer1 = manufacturer::ActiveModel {
            name: Set("manufacturer1_name".to_string()),
            country: Set("manufacturer1_country".to_string()),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let driver1 = new_driver("user1", "QWE12345").insert(&db).await?;
        let driver2 = new_driver("user2", "ASD12345").insert(&db).await?;

        let car1 = car::ActiveModel {
            model: Set("car1_model".to_string()),
            manufacturer_id: Set(manufacturer1.id),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        for driver in [&driver1, &driver2] {
            car_driver::ActiveModel {
                car_id: Set(car1.id),
                driver_id: Set(driver.id),
            }
            .insert(&db)
            .await?;
        }

        let drivers = car1.find_related(Driver).all(&db).await?;
        assert_eq!(drivers.len(), 2);

        let cars = driver1.find_related(Car).all(&db).await?;
        assert_eq!(cars, vec![car1.clone()]);

        let maker = car1.find_related(Manufacturer).one(&db).await?;
        assert_eq!(maker, Some(manufacturer1.clone()));

        // Deleting the manufacturer takes its cars and their assignments along.
        manufacturer1.delete(&db).await?;
        assert_eq!(Car::find().count(&db).await?, 0);
        assert_eq!(CarDriver::find().count(&db).await?, 0);
        assert_eq!(Driver::find().count(&db).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_license_number_unique() -> Result<(), DbErr> {
        let db = setup_db().await?;
        new_driver("user1", "QWE12345").insert(&db).await?;
        let duplicate = new_driver("user2", "QWE12345").insert(&db).await;
        assert!(duplicate.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_manufacturer_name_unique() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let make = |country: &str| manufacturer::ActiveModel {
            name: Set("Lincoln".to_string()),
            country: Set(country.to_string()),
            ..Default::default()
        };
        make("USA").insert(&db).await?;
        assert!(make("Canada").insert(&db).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_car_manufacturer_required() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let orphan = car::ActiveModel {
            model: Set("orphan".to_string()),
            manufacturer_id: Set(42),
            ..Default::default()
        }
        .insert(&db)
        .await;
        assert!(orphan.is_err());
        Ok(())
    }

    #[test]
    fn test_display_strings() {
        let manufacturer = manufacturer::Model {
            id: 1,
            name: "manufacturer1_name".to_string(),
            country: "manufacturer1_country".to_string(),
        };
        assert_eq!(manufacturer.to_string(), "manufacturer1_name manufacturer1_country");

        let car = car::Model {
            id: 3,
            model: "car1_model".to_string(),
            manufacturer_id: 1,
        };
        assert_eq!(car.to_string(), "car1_model");
        assert_eq!(car.absolute_url(), "/cars/3/");

        let driver = driver::Model {
            id: 1,
            username: "user1_username".to_string(),
            password: "!".to_string(),
            first_name: "user1_fname".to_string(),
            last_name: "user1_lname".to_string(),
            email: "user1@test.com".to_string(),
            is_staff: false,
            is_active: true,
            date_joined: Utc::now(),
            last_login: None,
            license_number: "QWE12345".to_string(),
        };
        assert_eq!(driver.to_string(), "user1_username (user1_fname user1_lname)");
        assert_eq!(driver.absolute_url(), "/drivers/1/");
        assert_eq!(driver::VERBOSE_NAME, "driver");
        assert_eq!(driver::LICENSE_NUMBER_LABEL, "license number");
    }
}
