use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create manufacturers table
        manager
            .create_table(
                Table::create()
                    .table(Manufacturers::Table)
                    .if_not_exists()
                    .col(pk_auto(Manufacturers::Id))
                    .col(string_len(Manufacturers::Name, 255).unique_key())
                    .col(string_len(Manufacturers::Country, 255))
                    .to_owned(),
            )
            .await?;

        // Create drivers table
        manager
            .create_table(
                Table::create()
                    .table(Drivers::Table)
                    .if_not_exists()
                    .col(pk_auto(Drivers::Id))
                    .col(string_len(Drivers::Username, 150).unique_key())
                    .col(string_len(Drivers::Password, 128))
                    .col(string_len(Drivers::FirstName, 150).default(""))
                    .col(string_len(Drivers::LastName, 150).default(""))
                    .col(string_len(Drivers::Email, 254).default(""))
                    .col(boolean(Drivers::IsStaff).default(false))
                    .col(boolean(Drivers::IsActive).default(true))
                    .col(timestamp_with_time_zone(Drivers::DateJoined))
                    .col(timestamp_with_time_zone_null(Drivers::LastLogin))
                    .col(string_len(Drivers::LicenseNumber, 8).unique_key())
                    .to_owned(),
            )
            .await?;

        // Create cars table
        manager
            .create_table(
                Table::create()
                    .table(Cars::Table)
                    .if_not_exists()
                    .col(pk_auto(Cars::Id))
                    .col(string_len(Cars::Model, 255))
                    .col(integer(Cars::ManufacturerId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_car_manufacturer")
                            .from(Cars::Table, Cars::ManufacturerId)
                            .to(Manufacturers::Table, Manufacturers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create cars_drivers table (join table)
        manager
            .create_table(
                Table::create()
                    .table(CarsDrivers::Table)
                    .if_not_exists()
                    .col(integer(CarsDrivers::CarId))
                    .col(integer(CarsDrivers::DriverId))
                    .primary_key(
                        Index::create()
                            .name("pk_cars_drivers")
                            .col(CarsDrivers::CarId)
                            .col(CarsDrivers::DriverId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cars_drivers_car")
                            .from(CarsDrivers::Table, CarsDrivers::CarId)
                            .to(Cars::Table, Cars::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cars_drivers_driver")
                            .from(CarsDrivers::Table, CarsDrivers::DriverId)
                            .to(Drivers::Table, Drivers::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CarsDrivers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cars::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Drivers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Manufacturers::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Manufacturers {
    Table,
    Id,
    Name,
    Country,
}

#[derive(DeriveIden)]
enum Drivers {
    Table,
    Id,
    Username,
    Password,
    FirstName,
    LastName,
    Email,
    IsStaff,
    IsActive,
    DateJoined,
    LastLogin,
    LicenseNumber,
}

#[derive(DeriveIden)]
enum Cars {
    Table,
    Id,
    Model,
    ManufacturerId,
}

#[derive(DeriveIden)]
enum CarsDrivers {
    Table,
    CarId,
    DriverId,
}
