//! Core types and data structures for the whale-sentinel monitoring system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A wallet address (kept as a string so the monitor stays chain-agnostic)
pub type WalletAddress = String;

/// The kind of on-chain activity a whale transaction represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Buy,
    Sell,
    Transfer,
}

impl ActivityKind {
    /// Buys and transfers both move tokens toward a wallet, so the
    /// coordination detector counts them on the accumulation side.
    pub fn is_buy_like(&self) -> bool {
        matches!(self, ActivityKind::Buy | ActivityKind::Transfer)
    }

    pub fn is_sell_like(&self) -> bool {
        matches!(self, ActivityKind::Sell)
    }
}

/// A single observed whale transaction.
///
/// Sourced from the activity store; the monitor only ever reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhaleActivity {
    /// The wallet that performed the activity
    pub wallet: WalletAddress,
    /// Token symbol the activity concerns
    pub token: String,
    /// Buy, sell or transfer
    pub kind: ActivityKind,
    /// Amount in token units
    pub amount_tokens: f64,
    /// USD-equivalent amount (non-negative)
    pub amount_usd: f64,
    /// When the transaction landed on-chain
    pub timestamp: DateTime<Utc>,
    /// Unique transaction identifier
    pub tx_id: String,
}

/// Aggregate registry row for one (wallet, token) pair over the
/// trailing whale-registry window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhaleStats {
    pub wallet: WalletAddress,
    pub token: String,
    pub transaction_count: i64,
    pub total_volume_usd: f64,
    pub last_activity: DateTime<Utc>,
}
