//! The scan orchestrator.
//!
//! Drives one full scan (fetch, aggregate, detect, correlate, persist,
//! report) and repeats it on a fixed cadence until an external stop
//! signal arrives. A failed scan logs, counts as zero alerts and waits
//! out the normal interval; nothing short of the stop signal ends the
//! loop.

use crate::monitor::aggregator::{bucket_by_token_and_minute, token_rollups};
use crate::monitor::coordination::CoordinationDetector;
use crate::monitor::correlation::CorrelationAnalyzer;
use crate::monitor::prices::PriceSource;
use crate::monitor::storage::ActivityStore;
use crate::monitor::types::{MonitorConfig, ScanReport};
use crate::types::WhaleActivity;
use anyhow::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Periodic whale-activity monitor.
///
/// Owns the scan/alert counters; multiple instances never share state,
/// so tests can run monitors side by side.
pub struct ActivityMonitor {
    store: Arc<dyn ActivityStore>,
    prices: Arc<dyn PriceSource>,
    detector: CoordinationDetector,
    analyzer: CorrelationAnalyzer,
    config: MonitorConfig,
    scan_count: u64,
    total_alerts: u64,
}

impl ActivityMonitor {
    pub fn new(
        store: Arc<dyn ActivityStore>,
        prices: Arc<dyn PriceSource>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            store,
            prices,
            detector: CoordinationDetector::new(config.clone()),
            analyzer: CorrelationAnalyzer::new(config.clone()),
            config,
            scan_count: 0,
            total_alerts: 0,
        }
    }

    pub fn scan_count(&self) -> u64 {
        self.scan_count
    }

    pub fn total_alerts(&self) -> u64 {
        self.total_alerts
    }

    /// Main monitoring loop.
    ///
    /// Suspends exactly once per iteration, after the scan; the same
    /// pause doubles as the backoff after a failed scan. The stop signal
    /// is observed at the suspension point and wins immediately.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Activity monitor starting - pump/dump detection");
        info!("Scan interval: {}s", self.config.scan_interval.as_secs());
        info!("Coordination threshold: {}+ whales", self.config.coordination_threshold);
        info!("Time window: {} minutes", self.config.lookback_minutes);
        info!("Pump detection: {}+ rapid buys", self.config.pump.rapid_buys);
        info!("Dump detection: {}+ rapid sells", self.config.dump.rapid_sells);
        info!("Minimum whale threshold: ${}", self.config.whale_threshold_usd);

        match self
            .store
            .fetch_whale_registry(self.config.whale_threshold_usd)
            .await
        {
            Ok(whales) => info!("Monitoring {} database whales for coordination", whales.len()),
            Err(e) => warn!("Failed to fetch whale registry: {:#}", e),
        }

        loop {
            match self.scan_once().await {
                Ok(report) => {
                    info!(
                        "Scan #{} complete: {} alerts this scan, {} total",
                        report.scan_number, report.alerts_persisted, report.total_alerts
                    );
                }
                Err(e) => {
                    error!("Monitoring error: {:#}", e);
                    info!("Retrying in {}s", self.config.scan_interval.as_secs());
                }
            }

            tokio::select! {
                _ = sleep(self.config.scan_interval) => {}
                _ = shutdown.changed() => {
                    info!("Activity monitor stopped by operator");
                    break;
                }
            }
        }
    }

    /// Run one full scan over the current activity snapshot.
    pub async fn scan_once(&mut self) -> Result<ScanReport> {
        self.scan_count += 1;
        info!("Activity scan #{} - pump/dump detection", self.scan_count);

        let activities = self.fetch_recent_activity().await;

        if activities.is_empty() {
            info!("No recent whale activity detected");
            return Ok(ScanReport {
                scan_number: self.scan_count,
                total_alerts: self.total_alerts,
                ..ScanReport::default()
            });
        }

        info!(
            "Found {} whale activities in last {} minutes",
            activities.len(),
            self.config.lookback_minutes
        );

        self.report_token_rollups(&activities).await;

        // Detector and analyzer see the same snapshot
        let buckets = bucket_by_token_and_minute(&activities);
        let alerts = self.detector.detect(&buckets);
        let correlations = self.analyzer.analyze(&activities);

        let mut alerts_persisted = 0usize;
        if !alerts.is_empty() {
            info!("Coordination alerts detected:");
            for alert in &alerts {
                info!("{}: {}", alert.kind.as_str(), alert.token);
                info!(
                    "  {} whales, ${:.0} volume, confidence {:.0}%",
                    alert.whale_count,
                    alert.total_volume_usd,
                    alert.confidence * 100.0
                );
                info!("  Bucket time: {}", alert.bucket_time.format("%H:%M:%S UTC"));

                // Best-effort persistence; a failed write drops this alert
                // from the store but not from the scan report.
                match self.store.save_alert(alert).await {
                    Ok(_) => alerts_persisted += 1,
                    Err(e) => warn!("Failed to save alert for {}: {:#}", alert.token, e),
                }
            }
        }

        if !correlations.is_empty() {
            info!("Wallet correlations found:");
            for correlation in &correlations {
                info!(
                    "{} correlation: {}... <-> {}...",
                    correlation.suspicion.as_str(),
                    short_id(&correlation.wallet_a),
                    short_id(&correlation.wallet_b)
                );
                info!("  Common tokens: {}", correlation.common_tokens.join(", "));
                info!("  Score: {:.0}%", correlation.correlation_score * 100.0);
            }
        }

        if alerts.is_empty() && correlations.is_empty() {
            info!("No suspicious coordination patterns detected");
        }

        self.total_alerts += alerts_persisted as u64;

        Ok(ScanReport {
            scan_number: self.scan_count,
            activities_examined: activities.len(),
            alerts_emitted: alerts.len(),
            alerts_persisted,
            correlations_found: correlations.len(),
            total_alerts: self.total_alerts,
        })
    }

    /// Fetch the lookback window of activity; store failures are logged
    /// and flattened into an empty (valid, uninteresting) snapshot.
    async fn fetch_recent_activity(&self) -> Vec<WhaleActivity> {
        let cutoff = Utc::now() - Duration::minutes(self.config.lookback_minutes);

        match self
            .store
            .fetch_recent_activity(cutoff, self.config.whale_threshold_usd)
            .await
        {
            Ok(activities) => activities,
            Err(e) => {
                warn!("Failed to fetch recent activity: {:#}", e);
                Vec::new()
            }
        }
    }

    async fn report_token_rollups(&self, activities: &[WhaleActivity]) {
        info!("Whale activity summary:");
        for (token, rollup) in token_rollups(activities) {
            let price = self.prices.price_usd(&token).await;
            info!(
                "{}: {} whales, {} buys, {} sells, ${:.0} volume (price ${})",
                token,
                rollup.wallet_count(),
                rollup.buys,
                rollup.sells,
                rollup.volume_usd,
                price
            );
        }
    }
}

fn short_id(wallet: &str) -> &str {
    wallet.get(..10).unwrap_or(wallet)
}
