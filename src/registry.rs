use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::Listing;

/// Per-product state kept between cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntry {
    pub listing: Listing,
    pub in_stock: bool,
    pub last_seen_at: DateTime<Utc>,
    /// Reload pass that last saw this listing. Eviction compares passes, not
    /// wall-clock times, so a clock step cannot keep a stale entry alive.
    pub last_seen_pass: u64,
}

impl TrackedEntry {
    pub fn new(listing: Listing, pass: u64, now: DateTime<Utc>) -> Self {
        Self {
            listing,
            in_stock: false,
            last_seen_at: now,
            last_seen_pass: pass,
        }
    }

    /// Stores the probed status and returns true only on an out-of-stock to
    /// in-stock transition.
    pub fn apply_probe_result(&mut self, in_stock: bool) -> bool {
        let transitioned = !self.in_stock && in_stock;
        self.in_stock = in_stock;
        transitioned
    }
}

/// Outcome of merging a freshly loaded watch-list into the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub inserted: Vec<String>,
    pub refreshed: Vec<String>,
    pub evicted: Vec<String>,
    /// References for which no product id could be extracted.
    pub unparsable: Vec<String>,
}

impl MergeReport {
    pub fn is_unchanged(&self) -> bool {
        self.inserted.is_empty() && self.evicted.is_empty()
    }
}

/// Inserts or refreshes every loaded listing under reload `pass`, then evicts
/// entries that this pass did not see.
///
/// A repeated product id keeps the last listing loaded for it. Existing entries
/// keep their stock status.
pub fn merge(
    entries: &mut BTreeMap<String, TrackedEntry>,
    listings: Vec<Listing>,
    pass: u64,
    now: DateTime<Utc>,
) -> MergeReport {
    let mut report = MergeReport::default();

    for listing in listings {
        let product_id = listing.product_id();
        if product_id.is_empty() {
            report.unparsable.push(listing.reference);
            continue;
        }

        match entries.get_mut(&product_id) {
            Some(entry) => {
                entry.listing = listing;
                entry.last_seen_at = now;
                entry.last_seen_pass = pass;
                if !report.inserted.contains(&product_id) && !report.refreshed.contains(&product_id) {
                    report.refreshed.push(product_id);
                }
            }
            None => {
                entries.insert(product_id.clone(), TrackedEntry::new(listing, pass, now));
                report.inserted.push(product_id);
            }
        }
    }

    entries.retain(|product_id, entry| {
        let keep = entry.last_seen_pass == pass;
        if !keep {
            report.evicted.push(product_id.clone());
        }
        keep
    });

    report
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: BTreeMap<String, TrackedEntry>,
    pass: u64,
}

/// Shared, lock-protected map of tracked entries keyed by product id.
///
/// Cloning yields another handle onto the same state.
#[derive(Debug, Clone, Default)]
pub struct WatchRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new reload pass and applies [`merge`] under a single write
    /// lock, so no reader ever sees a half-merged registry.
    pub async fn merge(&self, listings: Vec<Listing>, now: DateTime<Utc>) -> MergeReport {
        let mut state = self.state.write().await;
        state.pass += 1;
        let pass = state.pass;
        let report = merge(&mut state.entries, listings, pass, now);
        metrics::gauge!("watcher_tracked_listings").set(state.entries.len() as f64);
        report
    }

    /// Returns a copy of all entries, ordered by product id.
    pub async fn snapshot(&self) -> Vec<(String, TrackedEntry)> {
        let state = self.state.read().await;
        state
            .entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.clone()))
            .collect()
    }

    /// Records the result of probing `probed`.
    ///
    /// Returns `None` when the result is stale: the entry was evicted, or a
    /// reload replaced its listing (e.g. with another variant) while the probe
    /// was in flight. Otherwise returns whether this result is a transition
    /// into stock.
    pub async fn apply_probe_result(&self, probed: &Listing, in_stock: bool) -> Option<bool> {
        let mut state = self.state.write().await;
        state
            .entries
            .get_mut(&probed.product_id())
            .filter(|entry| entry.listing == *probed)
            .map(|entry| entry.apply_probe_result(in_stock))
    }

    pub async fn get(&self, product_id: &str) -> Option<TrackedEntry> {
        self.state.read().await.entries.get(product_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}
