use async_trait::async_trait;
use tokio::process::Command;

use crate::alerts::traits::{AlertSink, StockAlert};
use crate::utils::error::AlertError;

/// Pops a desktop notification through the platform's notification tool.
#[derive(Debug, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    pub fn new() -> Self {
        Self
    }

    fn command(title: &str, message: &str) -> Option<Command> {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("osascript");
            cmd.arg("-e")
                .arg(format!("display notification {message:?} with title {title:?}"));
            Some(cmd)
        } else if cfg!(unix) {
            let mut cmd = Command::new("notify-send");
            cmd.arg(title).arg(message);
            Some(cmd)
        } else {
            None
        }
    }
}

#[async_trait]
impl AlertSink for DesktopNotifier {
    fn name(&self) -> &'static str {
        "desktop"
    }

    async fn deliver(&self, alert: &StockAlert) -> Result<(), AlertError> {
        let Some(mut cmd) = Self::command(alert.title(), &alert.message()) else {
            return Err(AlertError::Unsupported {
                sink: self.name().to_string(),
            });
        };

        let status = cmd.kill_on_drop(true).status().await?;
        if !status.success() {
            return Err(AlertError::Delivery {
                sink: self.name().to_string(),
                message: format!("notification tool exited with {status}"),
            });
        }
        Ok(())
    }
}
