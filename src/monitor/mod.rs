//! Monitor module - activity scanning and coordination detection
//!
//! This module contains the periodic scan orchestrator and the detection
//! family it drives: time-window aggregation, pump/dump classification
//! and pairwise wallet correlation.

pub mod aggregator;
pub mod coordination;
pub mod correlation;
pub mod prices;
pub mod scanner;
pub mod storage;
pub mod types;

// Re-export main types
pub use types::{
    AlertKind, AlertPayload, CoordinationAlert, DumpIndicators, MonitorConfig,
    PumpIndicators, ScanReport, SuspicionLevel, TokenRollup, WalletCorrelation,
};

// Re-export key components
pub use coordination::CoordinationDetector;
pub use correlation::CorrelationAnalyzer;
pub use prices::{CoinGeckoPriceSource, PriceSource, StaticPriceTable};
pub use scanner::ActivityMonitor;
pub use storage::{ActivityStore, SqliteActivityStore};
