use async_trait::async_trait;

use crate::alerts::traits::{AlertSink, StockAlert};
use crate::utils::error::AlertError;

/// Opens the product page in the user's default browser.
#[derive(Debug, Default)]
pub struct BrowserLauncher;

impl BrowserLauncher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AlertSink for BrowserLauncher {
    fn name(&self) -> &'static str {
        "browser"
    }

    async fn deliver(&self, alert: &StockAlert) -> Result<(), AlertError> {
        let url = alert.url.clone();
        tokio::task::spawn_blocking(move || webbrowser::open(&url))
            .await
            .map_err(|e| AlertError::Delivery {
                sink: self.name().to_string(),
                message: e.to_string(),
            })??;
        Ok(())
    }
}
