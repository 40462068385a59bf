use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::alerts::{AlertManager, StockAlert};
use crate::availability::AvailabilityCheck;
use crate::config::SchedulerConfig;
use crate::registry::{MergeReport, WatchRegistry};
use crate::utils::error::LoadError;
use crate::view::{redraw, render_status, StatusHeader};
use crate::watchlist::{file_stamp, load_watchlist, FileStamp};

/// What a single reload cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The file has not changed since the last successful read.
    Unchanged,
    /// The file holds no listings; the registry was left as it was.
    Empty,
    Loaded(MergeReport),
    Failed(String),
}

impl ReloadOutcome {
    /// Whether the status view should be redrawn after this reload.
    pub fn affects_view(&self) -> bool {
        !matches!(self, ReloadOutcome::Unchanged)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeSummary {
    pub probed: usize,
    pub failed: usize,
    pub alerts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleKind {
    Reload,
    Probe,
}

/// Clears a cycle's in-flight flag when the cycle ends, even if it is aborted.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The polling loop: reloads the watch-list and probes availability on two
/// independent timers, alerting once per transition into stock.
#[derive(Clone)]
pub struct StockMonitor {
    config: SchedulerConfig,
    registry: WatchRegistry,
    prober: Arc<dyn AvailabilityCheck>,
    alerts: AlertManager,
    last_read: Arc<Mutex<Option<FileStamp>>>,
    message: Arc<Mutex<Option<String>>>,
    status_header: Option<StatusHeader>,
    reload_running: Arc<AtomicBool>,
    probe_running: Arc<AtomicBool>,
}

impl StockMonitor {
    pub fn new(
        config: SchedulerConfig,
        prober: Arc<dyn AvailabilityCheck>,
        alerts: AlertManager,
    ) -> Self {
        Self {
            config,
            registry: WatchRegistry::new(),
            prober,
            alerts,
            last_read: Arc::new(Mutex::new(None)),
            message: Arc::new(Mutex::new(None)),
            status_header: None,
            reload_running: Arc::new(AtomicBool::new(false)),
            probe_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Prints the status table to stdout after every cycle.
    pub fn with_status_table(mut self, header: StatusHeader) -> Self {
        self.status_header = Some(header);
        self
    }

    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }

    /// Runs until `shutdown` is cancelled.
    ///
    /// The watch-list is loaded once before the timers start. On shutdown no new
    /// cycles are scheduled and in-flight ones get `shutdown_timeout` to finish.
    pub async fn run(self, shutdown: CancellationToken) -> crate::Result<()> {
        tracing::info!(
            "Starting monitor: reload every {:?}, probe every {:?}",
            self.config.reload_interval,
            self.config.probe_interval
        );

        self.reload_cycle().await;
        self.report_status().await;

        let start = Instant::now();
        let mut reload_timer = interval_at(start + self.config.reload_interval, self.config.reload_interval);
        reload_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut probe_timer = interval_at(start + self.config.probe_interval, self.config.probe_interval);
        probe_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut tasks: JoinSet<()> = JoinSet::new();
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = reload_timer.tick() => self.spawn_cycle(&mut tasks, CycleKind::Reload),
                _ = probe_timer.tick() => self.spawn_cycle(&mut tasks, CycleKind::Probe),
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!("Cycle task failed: {}", e);
                    }
                }
            }
        }

        tracing::info!("Shutting down, waiting for {} in-flight cycle(s)", tasks.len());
        let drained = tokio::time::timeout(self.config.shutdown_timeout, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::warn!("In-flight cycles did not finish within {:?}, aborting", self.config.shutdown_timeout);
            tasks.abort_all();
        }

        self.set_message(Some("Bye!".to_string())).await;
        self.report_status().await;
        Ok(())
    }

    fn spawn_cycle(&self, tasks: &mut JoinSet<()>, kind: CycleKind) {
        let flag = match kind {
            CycleKind::Reload => &self.reload_running,
            CycleKind::Probe => &self.probe_running,
        };
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("{:?} cycle still running, skipping tick", kind);
            return;
        }

        let guard = InFlightGuard(Arc::clone(flag));
        let this = self.clone();
        tasks.spawn(async move {
            let _guard = guard;
            let changed = match kind {
                CycleKind::Reload => this.reload_cycle().await.affects_view(),
                CycleKind::Probe => {
                    this.probe_cycle().await;
                    true
                }
            };
            if changed {
                this.report_status().await;
            }
        });
    }

    /// Re-reads the watch-list if it changed and merges it into the registry.
    ///
    /// Load failures leave the registry untouched.
    pub async fn reload_cycle(&self) -> ReloadOutcome {
        let path = &self.config.watchlist_path;
        let mut last_read = self.last_read.lock().await;
        let stamp = file_stamp(path).await;
        if stamp.is_some() && stamp == *last_read {
            tracing::trace!("{} unchanged, skipping reload", path.display());
            return ReloadOutcome::Unchanged;
        }

        // Stamped before reading: an edit racing the read shows up as a new
        // stamp on the next tick.
        let listings = match load_watchlist(path, self.config.max_listings).await {
            Ok(listings) => {
                *last_read = stamp;
                listings
            }
            Err(e) => {
                if matches!(e, LoadError::TooManyListings { .. }) {
                    *last_read = stamp;
                }
                tracing::warn!("{}", e);
                self.set_message(Some(e.to_string())).await;
                return ReloadOutcome::Failed(e.to_string());
            }
        };
        drop(last_read);

        if listings.is_empty() {
            let msg = "No products to monitor, please update your products text file";
            tracing::warn!("{}", msg);
            self.set_message(Some(msg.to_string())).await;
            return ReloadOutcome::Empty;
        }

        let report = self.registry.merge(listings, Utc::now()).await;
        metrics::counter!("watcher_reloads_total").increment(1);

        for reference in &report.unparsable {
            tracing::warn!(
                "Failed to determine product ID for {:?}, does it include a product code?",
                reference
            );
        }
        tracing::info!(
            "Reloaded {}: {} added, {} kept, {} removed, {} unparsable",
            path.display(),
            report.inserted.len(),
            report.refreshed.len(),
            report.evicted.len(),
            report.unparsable.len()
        );

        let message = (!report.unparsable.is_empty()).then(|| {
            format!(
                "Failed to determine product ID for {} URL(s), do they include a product code?",
                report.unparsable.len()
            )
        });
        self.set_message(message).await;

        ReloadOutcome::Loaded(report)
    }

    /// Probes every tracked entry and raises an alert for each transition into
    /// stock.
    ///
    /// Probes run off a snapshot without holding the registry lock; each result
    /// is applied under a short write lock. A failed probe never stops the batch.
    pub async fn probe_cycle(&self) -> ProbeSummary {
        let snapshot = self.registry.snapshot().await;
        let mut summary = ProbeSummary::default();
        if snapshot.is_empty() {
            return summary;
        }

        let mut results = stream::iter(snapshot)
            .map(|(product_id, entry)| {
                let prober = Arc::clone(&self.prober);
                async move {
                    let result = prober.check(&entry.listing).await;
                    (product_id, entry.listing, result)
                }
            })
            .buffer_unordered(self.config.probe_concurrency.max(1));

        let mut errors = Vec::new();
        while let Some((product_id, listing, result)) = results.next().await {
            summary.probed += 1;
            metrics::counter!("watcher_probes_total").increment(1);

            let in_stock = match result {
                Ok(in_stock) => in_stock,
                Err(e) => {
                    summary.failed += 1;
                    metrics::counter!("watcher_probe_failures_total").increment(1);
                    let msg = format!("Unable to check availability of {:?}: {}", product_id, e);
                    tracing::warn!("{}", msg);
                    errors.push(msg);
                    continue;
                }
            };

            match self.registry.apply_probe_result(&listing, in_stock).await {
                Some(true) => {
                    let alert = StockAlert {
                        product_id: product_id.clone(),
                        variant_id: listing.variant_id(),
                        url: listing.reference.clone(),
                        detected_at: Utc::now(),
                    };
                    tracing::info!("{}", alert.message());
                    self.alerts.dispatch(&alert).await;
                    summary.alerts += 1;
                }
                Some(false) => {
                    tracing::debug!("{} in stock: {}", product_id, in_stock);
                }
                None => {
                    tracing::debug!(
                        "{} was removed or replaced during the probe, discarding result",
                        product_id
                    );
                }
            }
        }

        tracing::debug!(
            "Probe cycle done: {} probed, {} failed, {} alert(s)",
            summary.probed,
            summary.failed,
            summary.alerts
        );
        self.set_message((!errors.is_empty()).then(|| errors.join("\n"))).await;
        summary
    }

    pub async fn last_message(&self) -> Option<String> {
        self.message.lock().await.clone()
    }

    async fn set_message(&self, message: Option<String>) {
        *self.message.lock().await = message;
    }

    async fn report_status(&self) {
        let Some(header) = &self.status_header else {
            return;
        };
        let entries = self.registry.snapshot().await;
        let message = self.last_message().await;
        let frame = render_status(header, &entries, message.as_deref());
        if let Err(e) = redraw(&mut std::io::stdout().lock(), &frame) {
            tracing::warn!("Unable to draw status table: {}", e);
        }
    }
}
