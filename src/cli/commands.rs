pub mod create_driver;
pub mod initdb;
pub mod migrate_and_serve;
pub mod serve;

pub use create_driver::{create_driver, NewDriver};
pub use initdb::init_database;
pub use migrate_and_serve::migrate_and_serve;
pub use serve::serve;
