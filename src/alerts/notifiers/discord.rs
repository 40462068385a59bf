use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::alerts::traits::{AlertSink, StockAlert};
use crate::utils::error::AlertError;

const IN_STOCK_COLOR: u32 = 0x00ff00;

/// Posts stock alerts to a Discord channel through a webhook.
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
    username: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String) -> Self {
        DiscordNotifier {
            client: Client::new(),
            webhook_url,
            username: "Vuitton Monitor".to_string(),
        }
    }

    fn create_embed(&self, alert: &StockAlert) -> serde_json::Value {
        let mut fields = vec![json!({
            "name": "🛍️ Product",
            "value": format!("[{}]({})", alert.product_id, alert.url),
            "inline": true
        })];

        if !alert.variant_id.is_empty() {
            fields.push(json!({
                "name": "🏷️ SKU",
                "value": alert.variant_id,
                "inline": true
            }));
        }

        json!({
            "title": format!("✅ {}", alert.message()),
            "url": alert.url,
            "color": IN_STOCK_COLOR,
            "timestamp": alert.detected_at.to_rfc3339(),
            "fields": fields,
            "footer": { "text": alert.title() }
        })
    }

    pub fn create_webhook_payload(&self, alert: &StockAlert) -> serde_json::Value {
        json!({
            "username": self.username,
            "embeds": [self.create_embed(alert)]
        })
    }
}

#[async_trait]
impl AlertSink for DiscordNotifier {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn deliver(&self, alert: &StockAlert) -> Result<(), AlertError> {
        let payload = self.create_webhook_payload(alert);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AlertError::Delivery {
                sink: self.name().to_string(),
                message: format!("webhook responded with {}", response.status()),
            });
        }
        Ok(())
    }
}
