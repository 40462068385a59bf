use std::sync::Arc;

use futures::future::join_all;

use super::notifiers::{BrowserLauncher, DesktopNotifier, DiscordNotifier};
use super::traits::{AlertSink, StockAlert};
use crate::config::AlertsConfig;

pub type AlertSinkArc = Arc<dyn AlertSink>;

/// Fans a stock alert out to every configured sink.
#[derive(Clone, Default)]
pub struct AlertManager {
    sinks: Vec<AlertSinkArc>,
}

impl AlertManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the sinks enabled in `config`.
    pub fn from_config(config: &AlertsConfig) -> Self {
        let mut manager = Self::new();
        if config.desktop {
            manager.register(Arc::new(DesktopNotifier::new()));
        }
        if config.browser {
            manager.register(Arc::new(BrowserLauncher::new()));
        }
        if let Some(webhook_url) = &config.discord_webhook_url {
            manager.register(Arc::new(DiscordNotifier::new(webhook_url.clone())));
        }
        manager
    }

    pub fn register(&mut self, sink: AlertSinkArc) {
        tracing::debug!("Registered alert sink: {}", sink.name());
        self.sinks.push(sink);
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Delivers `alert` to all sinks concurrently and returns how many
    /// succeeded. Failures are logged, never propagated.
    pub async fn dispatch(&self, alert: &StockAlert) -> usize {
        metrics::counter!("watcher_alerts_total").increment(1);

        let results = join_all(self.sinks.iter().map(|sink| async move {
            let outcome = sink.deliver(alert).await;
            (sink.name(), outcome)
        }))
        .await;

        let mut delivered = 0;
        for (name, outcome) in results {
            match outcome {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!("Alert sink {} failed for {}: {}", name, alert.product_id, e),
            }
        }
        delivered
    }
}
