//! Produced values and configuration for the activity monitor.
//!
//! This contains the alert/correlation types the detectors emit and the
//! threshold configuration the whole subsystem reads.

use crate::types::{WalletAddress, WhaleActivity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// The coordination pattern an alert describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    #[serde(rename = "POTENTIAL_PUMP")]
    PotentialPump,
    #[serde(rename = "POTENTIAL_DUMP")]
    PotentialDump,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::PotentialPump => "POTENTIAL_PUMP",
            AlertKind::PotentialDump => "POTENTIAL_DUMP",
        }
    }
}

/// A coordinated buying or selling pattern detected in one time bucket.
///
/// Created transiently per scan and written once to the store; never
/// updated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinationAlert {
    pub kind: AlertKind,
    /// Token symbol the coordination happened on
    pub token: String,
    /// Minute bucket the contributing activities fell into
    pub bucket_time: DateTime<Utc>,
    /// Distinct wallets among the contributing activities
    pub whale_count: usize,
    /// Sum of USD amounts over the contributing activities
    pub total_volume_usd: f64,
    /// Saturates at 1.0 (distinct wallets over the rapid-action threshold)
    pub confidence: f64,
    /// The activities that triggered the alert
    pub activities: Vec<WhaleActivity>,
}

impl CoordinationAlert {
    /// Build the storable payload for this alert.
    ///
    /// Timestamps are rendered as ISO-8601 strings here; the store layer
    /// binds the payload as-is and performs no time conversion of its own.
    pub fn to_payload(&self) -> AlertPayload {
        AlertPayload {
            alert_type: self.kind.as_str().to_string(),
            token: self.token.clone(),
            bucket_time: self.bucket_time.to_rfc3339(),
            whale_count: self.whale_count,
            total_volume_usd: self.total_volume_usd,
            confidence: self.confidence,
            activities: self
                .activities
                .iter()
                .map(|a| ActivityPayload {
                    wallet: a.wallet.clone(),
                    kind: a.kind,
                    amount_tokens: a.amount_tokens,
                    amount_usd: a.amount_usd,
                    timestamp: a.timestamp.to_rfc3339(),
                    tx_id: a.tx_id.clone(),
                })
                .collect(),
        }
    }
}

/// JSON-safe rendering of a [`CoordinationAlert`] for the alert table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertPayload {
    pub alert_type: String,
    pub token: String,
    pub bucket_time: String,
    pub whale_count: usize,
    pub total_volume_usd: f64,
    pub confidence: f64,
    pub activities: Vec<ActivityPayload>,
}

/// One contributing activity inside an [`AlertPayload`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityPayload {
    pub wallet: WalletAddress,
    pub kind: crate::types::ActivityKind,
    pub amount_tokens: f64,
    pub amount_usd: f64,
    pub timestamp: String,
    pub tx_id: String,
}

/// How suspicious a wallet correlation looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuspicionLevel {
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "MEDIUM")]
    Medium,
}

impl SuspicionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuspicionLevel::High => "HIGH",
            SuspicionLevel::Medium => "MEDIUM",
        }
    }
}

/// Correlated trading behavior between two wallets.
///
/// Reported in the scan output; not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletCorrelation {
    pub wallet_a: WalletAddress,
    pub wallet_b: WalletAddress,
    /// Tokens both wallets traded, sorted
    pub common_tokens: Vec<String>,
    /// Count of timestamp pairs within the correlation window
    pub time_correlations: usize,
    /// Saturates at 1.0
    pub correlation_score: f64,
    pub suspicion: SuspicionLevel,
}

/// Per-token activity rollup for the scan report.
#[derive(Debug, Clone, Default)]
pub struct TokenRollup {
    pub wallets: BTreeSet<WalletAddress>,
    pub buys: usize,
    pub sells: usize,
    pub volume_usd: f64,
}

impl TokenRollup {
    pub fn wallet_count(&self) -> usize {
        self.wallets.len()
    }
}

/// Summary of one completed scan.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub scan_number: u64,
    pub activities_examined: usize,
    /// Alerts the detector produced this scan
    pub alerts_emitted: usize,
    /// Alerts that made it into the store (persistence is best-effort)
    pub alerts_persisted: usize,
    pub correlations_found: usize,
    /// Running total of persisted alerts across all scans of this instance
    pub total_alerts: u64,
}

/// Pump-side detection thresholds.
///
/// `volume_spike` and `price_increase` are carried in configuration but
/// the emission decision keys on counts only.
/// TODO: wire volume/price confirmation into the decision once a live
/// price oracle replaces the static table.
#[derive(Debug, Clone)]
pub struct PumpIndicators {
    /// Buy-like activities in one bucket needed to flag a pump
    pub rapid_buys: usize,
    /// Multiple of normal volume considered a spike
    pub volume_spike: f64,
    /// Fractional price increase considered pump-like
    pub price_increase: f64,
}

impl Default for PumpIndicators {
    fn default() -> Self {
        Self {
            rapid_buys: 5,
            volume_spike: 3.0,
            price_increase: 0.15,
        }
    }
}

/// Dump-side detection thresholds; same caveat as [`PumpIndicators`].
#[derive(Debug, Clone)]
pub struct DumpIndicators {
    /// Sell activities in one bucket needed to flag a dump
    pub rapid_sells: usize,
    pub volume_spike: f64,
    pub price_decrease: f64,
}

impl Default for DumpIndicators {
    fn default() -> Self {
        Self {
            rapid_sells: 4,
            volume_spike: 2.5,
            price_decrease: 0.10,
        }
    }
}

/// Threshold configuration for the whole monitor.
///
/// All values are fixed at process start; there is no runtime
/// reconfiguration surface.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Pause between scans; also the backoff after a failed scan
    pub scan_interval: Duration,
    /// How far back each scan looks for activity
    pub lookback_minutes: i64,
    /// Minimum activities in a bucket to consider it for pump/dump analysis
    pub coordination_threshold: usize,
    pub pump: PumpIndicators,
    pub dump: DumpIndicators,
    /// Minimum per-activity USD value to count as whale activity
    pub whale_threshold_usd: f64,
    /// Two activities this close in time count as correlated (seconds)
    pub correlation_window_secs: i64,
    /// Wallet pairs sharing fewer tokens than this are skipped
    pub min_common_tokens: usize,
    /// Minimum correlated timestamp pairs before a correlation is reported
    pub min_time_correlations: usize,
    /// Correlation scores above this are HIGH suspicion
    pub high_suspicion_cutoff: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(60),
            lookback_minutes: 15,
            coordination_threshold: 3,
            pump: PumpIndicators::default(),
            dump: DumpIndicators::default(),
            whale_threshold_usd: 1000.0,
            correlation_window_secs: 300,
            min_common_tokens: 2,
            min_time_correlations: 2,
            high_suspicion_cutoff: 0.7,
        }
    }
}
