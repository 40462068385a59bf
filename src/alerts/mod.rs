pub mod traits;
pub mod manager;
pub mod notifiers;

pub use manager::AlertManager;
pub use traits::{AlertSink, StockAlert};
