use super::*;
use lv_stock_watcher::registry::MergeReport;
use lv_stock_watcher::scheduler::{ProbeSummary, ReloadOutcome};
use tokio::sync::{Notify, Semaphore};
use tokio_util::sync::CancellationToken;

/// Reports every listing in stock, but holds the probe of one variant until
/// the test opens the gate.
struct GatedProber {
    held_variant: String,
    started: Notify,
    gate: Semaphore,
}

impl GatedProber {
    fn holding(variant: &str) -> Self {
        Self {
            held_variant: variant.to_string(),
            started: Notify::new(),
            gate: Semaphore::new(0),
        }
    }
}

#[async_trait]
impl AvailabilityCheck for GatedProber {
    async fn check(&self, listing: &Listing) -> Result<bool, ProbeError> {
        if listing.variant_id() == self.held_variant {
            self.started.notify_one();
            self.gate.acquire().await.unwrap().forget();
        }
        Ok(true)
    }
}

#[tokio::test]
async fn test_initial_reload_tracks_every_listing() {
    let file = watch_file(&[TRAINERS, "", SHAWL, CANDLE, ""]);
    let (monitor, _) = create_test_monitor(file.path(), Arc::new(ScriptedProber::new()));

    let outcome = monitor.reload_cycle().await;

    let ReloadOutcome::Loaded(report) = outcome else {
        panic!("expected a load, got {outcome:?}");
    };
    assert_eq!(report.inserted.len(), 3);
    assert_eq!(monitor.registry().len().await, 3);

    let trainers = monitor.registry().get("nvprod3130266v").await.unwrap();
    assert_eq!(trainers.listing.variant_id(), "1A9JN8");
    assert!(!trainers.in_stock);
}

#[tokio::test]
async fn test_unchanged_file_is_not_reloaded() {
    let file = watch_file(&[TRAINERS, SHAWL]);
    let (monitor, _) = create_test_monitor(file.path(), Arc::new(ScriptedProber::new()));

    monitor.reload_cycle().await;
    let before = monitor.registry().snapshot().await;

    assert_eq!(monitor.reload_cycle().await, ReloadOutcome::Unchanged);
    assert_eq!(monitor.registry().snapshot().await, before);
}

#[tokio::test]
async fn test_removed_listing_is_evicted_on_reload() {
    let file = watch_file(&[TRAINERS, SHAWL]);
    let (monitor, _) = create_test_monitor(file.path(), Arc::new(ScriptedProber::new()));
    monitor.reload_cycle().await;

    rewrite(file.path(), &[SHAWL, CANDLE]);
    let outcome = monitor.reload_cycle().await;

    assert_eq!(
        outcome,
        ReloadOutcome::Loaded(MergeReport {
            inserted: vec!["nvprod1910068v".to_string()],
            refreshed: vec!["nvprod3390166v".to_string()],
            evicted: vec!["nvprod3130266v".to_string()],
            unparsable: vec![],
        })
    );
    assert!(monitor.registry().get("nvprod3130266v").await.is_none());
    assert_eq!(monitor.registry().len().await, 2);
}

#[tokio::test]
async fn test_in_stock_status_survives_reload() {
    let file = watch_file(&[SHAWL]);
    let prober = Arc::new(ScriptedProber::new().script("nvprod3390166v", &[Scripted::InStock]));
    let (monitor, sink) = create_test_monitor(file.path(), prober);
    monitor.reload_cycle().await;
    monitor.probe_cycle().await;

    rewrite(file.path(), &[SHAWL, CANDLE]);
    monitor.reload_cycle().await;
    monitor.probe_cycle().await;

    assert!(monitor.registry().get("nvprod3390166v").await.unwrap().in_stock);
    assert_eq!(sink.product_ids(), vec!["nvprod3390166v".to_string()]);
}

#[tokio::test]
async fn test_too_many_listings_leaves_registry_unchanged() {
    let file = watch_file(&[TRAINERS, SHAWL]);
    let (monitor, _) = create_test_monitor(file.path(), Arc::new(ScriptedProber::new()));
    monitor.reload_cycle().await;
    let before = monitor.registry().snapshot().await;

    let eleven: Vec<String> = (0..11).map(|i| format!("{CANDLE}#SKU{i}")).collect();
    let eleven: Vec<&str> = eleven.iter().map(String::as_str).collect();
    rewrite(file.path(), &eleven);

    let outcome = monitor.reload_cycle().await;
    assert!(matches!(outcome, ReloadOutcome::Failed(ref msg) if msg.contains("Too many")));
    assert_eq!(monitor.registry().snapshot().await, before);
    assert!(monitor.last_message().await.unwrap().contains("Too many"));
}

#[tokio::test]
async fn test_missing_file_leaves_registry_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.txt");
    rewrite(&path, &[TRAINERS]);
    let (monitor, _) = create_test_monitor(&path, Arc::new(ScriptedProber::new()));
    monitor.reload_cycle().await;

    std::fs::remove_file(&path).unwrap();

    assert!(matches!(monitor.reload_cycle().await, ReloadOutcome::Failed(_)));
    assert_eq!(monitor.registry().len().await, 1);
}

#[tokio::test]
async fn test_empty_file_is_reported_and_registry_kept() {
    let file = watch_file(&[TRAINERS]);
    let (monitor, _) = create_test_monitor(file.path(), Arc::new(ScriptedProber::new()));
    monitor.reload_cycle().await;

    rewrite(file.path(), &["", "   "]);

    assert_eq!(monitor.reload_cycle().await, ReloadOutcome::Empty);
    assert_eq!(monitor.registry().len().await, 1);
    assert!(monitor.last_message().await.unwrap().contains("No products to monitor"));
}

#[tokio::test]
async fn test_unparsable_listing_is_skipped() {
    let file = watch_file(&["https://www.google.com", SHAWL]);
    let (monitor, _) = create_test_monitor(file.path(), Arc::new(ScriptedProber::new()));

    let ReloadOutcome::Loaded(report) = monitor.reload_cycle().await else {
        panic!("expected a load");
    };

    assert_eq!(report.unparsable, vec!["https://www.google.com".to_string()]);
    assert_eq!(monitor.registry().len().await, 1);
    assert!(monitor.last_message().await.is_some());
}

#[tokio::test]
async fn test_alert_fires_once_per_transition() {
    let file = watch_file(&[SHAWL]);
    let prober = Arc::new(ScriptedProber::new().script(
        "nvprod3390166v",
        &[
            Scripted::OutOfStock,
            Scripted::InStock,
            Scripted::InStock,
            Scripted::OutOfStock,
            Scripted::InStock,
        ],
    ));
    let (monitor, sink) = create_test_monitor(file.path(), prober);
    monitor.reload_cycle().await;

    let mut alerts = Vec::new();
    for _ in 0..5 {
        alerts.push(monitor.probe_cycle().await.alerts);
    }

    assert_eq!(alerts, vec![0, 1, 0, 0, 1]);
    assert_eq!(sink.product_ids().len(), 2);
}

#[tokio::test]
async fn test_first_seen_in_stock_alerts() {
    let file = watch_file(&[TRAINERS]);
    let prober = Arc::new(ScriptedProber::new().script("nvprod3130266v", &[Scripted::InStock]));
    let (monitor, sink) = create_test_monitor(file.path(), prober);
    monitor.reload_cycle().await;

    monitor.probe_cycle().await;

    let alerts = sink.alerts.lock().unwrap().clone();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].variant_id, "1A9JN8");
    assert_eq!(alerts[0].url, TRAINERS);
}

#[tokio::test]
async fn test_failed_probe_does_not_abort_batch() {
    let file = watch_file(&[TRAINERS, SHAWL, CANDLE]);
    let prober = Arc::new(
        ScriptedProber::new()
            .script("nvprod3130266v", &[Scripted::Fail])
            .script("nvprod3390166v", &[Scripted::InStock])
            .script("nvprod1910068v", &[Scripted::OutOfStock]),
    );
    let (monitor, sink) = create_test_monitor(file.path(), prober.clone());
    monitor.reload_cycle().await;

    let summary = monitor.probe_cycle().await;

    assert_eq!(
        summary,
        ProbeSummary {
            probed: 3,
            failed: 1,
            alerts: 1,
        }
    );
    assert_eq!(prober.calls().len(), 3);
    assert_eq!(sink.product_ids(), vec!["nvprod3390166v".to_string()]);
    assert!(!monitor.registry().get("nvprod3130266v").await.unwrap().in_stock);
    assert!(monitor.last_message().await.unwrap().contains("nvprod3130266v"));
}

#[tokio::test]
async fn test_probe_cycle_with_empty_registry() {
    let file = watch_file(&[]);
    let prober = Arc::new(ScriptedProber::new());
    let (monitor, _) = create_test_monitor(file.path(), prober.clone());

    assert_eq!(monitor.reload_cycle().await, ReloadOutcome::Empty);
    assert_eq!(monitor.probe_cycle().await, ProbeSummary::default());
    assert!(prober.calls().is_empty());
}

#[tokio::test]
async fn test_run_loop_probes_and_stops_on_shutdown() {
    let file = watch_file(&[SHAWL]);
    let prober = Arc::new(ScriptedProber::new().script("nvprod3390166v", &[Scripted::InStock]));
    let (monitor, sink) = create_test_monitor(file.path(), prober.clone());
    let registry = monitor.registry().clone();

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(monitor.run(shutdown.clone()));

    tokio::time::sleep(Duration::from_millis(300)).await;
    shutdown.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("monitor did not stop")
        .unwrap();
    assert!(result.is_ok());

    // Initial load happened before the first tick, and repeated probes of a
    // sustained in-stock product alert only once.
    assert_eq!(registry.len().await, 1);
    assert!(prober.calls().len() >= 2);
    assert_eq!(sink.product_ids(), vec!["nvprod3390166v".to_string()]);
}

#[tokio::test]
async fn test_result_for_replaced_variant_is_discarded() {
    let old_variant = "https://en.louisvuitton.com/eng-nl/products/charlie-trainers-nvprod3130266v#1A9JN8";
    let new_variant = "https://en.louisvuitton.com/eng-nl/products/charlie-trainers-nvprod3130266v#1A9JNC0";
    let file = watch_file(&[old_variant]);
    let prober = Arc::new(GatedProber::holding("1A9JN8"));
    let sink = RecordingSink::default();
    let mut alerts = AlertManager::new();
    alerts.register(Arc::new(sink.clone()));
    let monitor = StockMonitor::new(test_scheduler_config(file.path()), prober.clone(), alerts);
    monitor.reload_cycle().await;

    let in_flight = {
        let monitor = monitor.clone();
        tokio::spawn(async move { monitor.probe_cycle().await })
    };
    prober.started.notified().await;

    rewrite(file.path(), &[new_variant]);
    assert!(matches!(monitor.reload_cycle().await, ReloadOutcome::Loaded(_)));
    prober.gate.add_permits(1);

    let stale = in_flight.await.unwrap();
    assert_eq!(stale.alerts, 0);
    let entry = monitor.registry().get("nvprod3130266v").await.unwrap();
    assert_eq!(entry.listing.reference, new_variant);
    assert!(!entry.in_stock);
    assert!(sink.product_ids().is_empty());

    // The new variant's own transition still alerts.
    assert_eq!(monitor.probe_cycle().await.alerts, 1);
    let delivered = sink.alerts.lock().unwrap().clone();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].url, new_variant);
}

#[tokio::test]
async fn test_edit_right_after_reload_is_picked_up() {
    let file = watch_file(&[SHAWL]);
    let (monitor, _) = create_test_monitor(file.path(), Arc::new(ScriptedProber::new()));
    monitor.reload_cycle().await;

    for round in 0..50 {
        // No pause between the reload and the write.
        let lines: &[&str] = if round % 2 == 0 { &[SHAWL, CANDLE] } else { &[SHAWL] };
        rewrite(file.path(), lines);

        let outcome = monitor.reload_cycle().await;
        assert!(
            matches!(outcome, ReloadOutcome::Loaded(_)),
            "edit {round} was missed: {outcome:?}"
        );
        assert_eq!(monitor.registry().len().await, lines.len());
    }
}
