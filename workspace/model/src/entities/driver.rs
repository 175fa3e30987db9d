use sea_orm::entity::prelude::*;
use std::fmt;

/// Human-readable name of the entity, used in messages.
pub const VERBOSE_NAME: &str = "driver";

/// Label of the `license_number` field in forms and error messages.
pub const LICENSE_NUMBER_LABEL: &str = "license number";

/// A user account that can log in and drive cars.
///
/// Besides the usual account fields every driver carries a unique license
/// number of the form `AAA99999`; the format is enforced by the driver forms,
/// uniqueness by the database.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "drivers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2 PHC string, never the raw password.
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTimeUtc,
    pub last_login: Option<DateTimeUtc>,
    #[sea_orm(unique)]
    pub license_number: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::car_driver::Entity")]
    CarDriver,
}

// Many-to-many through `cars_drivers`.
impl Related<super::car::Entity> for Entity {
    fn to() -> RelationDef {
        super::car_driver::Relation::Car.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::car_driver::Relation::Driver.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn absolute_url(&self) -> String {
        format!("/drivers/{}/", self.id)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.username, self.first_name, self.last_name)
    }
}
