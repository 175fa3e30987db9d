pub mod entities;
pub mod listing;

// Re-export tracing for use in this crate
pub use tracing;
