//! whale-sentinel - periodic pump/dump detection over whale activity
//!
//! This crate scans a store of whale transactions on a fixed cadence and
//! flags coordinated buying/selling and correlated wallet behavior.

pub mod monitor;
pub mod types;

// Re-export main types for convenience
pub use types::{ActivityKind, WalletAddress, WhaleActivity, WhaleStats};
