use super::*;
use chrono::Utc;
use tokio_test::{assert_err, assert_ok};
use lv_stock_watcher::alerts::notifiers::DiscordNotifier;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn alert() -> StockAlert {
    StockAlert {
        product_id: "nvprod3130266v".to_string(),
        variant_id: "1A9JN8".to_string(),
        url: TRAINERS.to_string(),
        detected_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_discord_webhook_delivery() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/123/test"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = DiscordNotifier::new(format!("{}/api/webhooks/123/test", server.uri()));

    assert_ok!(notifier.deliver(&alert()).await);
}

#[tokio::test]
async fn test_discord_failure_is_swallowed_by_manager() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let webhook = format!("{}/api/webhooks/123/test", server.uri());
    assert_err!(DiscordNotifier::new(webhook).deliver(&alert()).await);

    let recording = RecordingSink::default();
    let mut manager = AlertManager::new();
    manager.register(Arc::new(DiscordNotifier::new(format!(
        "{}/api/webhooks/123/test",
        server.uri()
    ))));
    manager.register(Arc::new(recording.clone()));

    assert_eq!(manager.dispatch(&alert()).await, 1);
    assert_eq!(recording.product_ids(), vec!["nvprod3130266v".to_string()]);
}
