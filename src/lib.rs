pub mod alerts;
pub mod availability;
pub mod config;
pub mod country;
pub mod models;
pub mod registry;
pub mod scheduler;
pub mod utils;
pub mod view;
pub mod watchlist;

// Re-export commonly used types
pub use availability::{AvailabilityCheck, AvailabilityClient};
pub use config::{AppConfig, CliArgs};
pub use models::Listing;
pub use registry::{TrackedEntry, WatchRegistry};
pub use scheduler::StockMonitor;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
