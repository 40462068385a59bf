use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::utils::error::AlertError;

pub const ALERT_TITLE: &str = "Vuitton Monitor";

/// Raised once for every out-of-stock to in-stock transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAlert {
    pub product_id: String,
    pub variant_id: String,
    pub url: String,
    pub detected_at: DateTime<Utc>,
}

impl StockAlert {
    pub fn title(&self) -> &'static str {
        ALERT_TITLE
    }

    pub fn message(&self) -> String {
        if self.variant_id.is_empty() {
            format!("Product {:?} is in stock!", self.product_id)
        } else {
            format!(
                "Product {:?} ({}) is in stock!",
                self.product_id, self.variant_id
            )
        }
    }
}

/// Trait for implementing alert delivery (desktop, browser, Discord, etc.)
///
/// Delivery is best-effort: callers log failures and move on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, alert: &StockAlert) -> Result<(), AlertError>;
}
