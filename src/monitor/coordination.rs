//! Coordination pattern detection.
//!
//! Classifies (token, minute) buckets as pump or dump candidates from
//! activity counts and distinct-wallet counts. The volume-spike and
//! price-move indicators in the configuration are not consulted here;
//! emission keys on counts alone.

use crate::monitor::aggregator::BucketedActivities;
use crate::monitor::types::{AlertKind, CoordinationAlert, MonitorConfig};
use crate::types::WhaleActivity;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Detector for coordinated buying/selling inside one time bucket.
pub struct CoordinationDetector {
    config: MonitorConfig,
}

impl CoordinationDetector {
    pub fn new(config: MonitorConfig) -> Self {
        Self { config }
    }

    /// Scan every (token, bucket) pair for pump and dump patterns.
    ///
    /// The two tests are independent; a bucket with heavy churn can emit
    /// both a pump and a dump alert.
    #[instrument(skip(self, buckets))]
    pub fn detect(&self, buckets: &BucketedActivities) -> Vec<CoordinationAlert> {
        let mut alerts = Vec::new();

        for (token, by_minute) in buckets {
            for (bucket_time, activities) in by_minute {
                if activities.len() < self.config.coordination_threshold {
                    continue;
                }

                let buy_like: Vec<&WhaleActivity> =
                    activities.iter().filter(|a| a.kind.is_buy_like()).collect();
                let sell_like: Vec<&WhaleActivity> =
                    activities.iter().filter(|a| a.kind.is_sell_like()).collect();

                if buy_like.len() >= self.config.pump.rapid_buys {
                    alerts.push(self.build_alert(
                        AlertKind::PotentialPump,
                        token,
                        *bucket_time,
                        &buy_like,
                        self.config.pump.rapid_buys,
                    ));
                }

                if sell_like.len() >= self.config.dump.rapid_sells {
                    alerts.push(self.build_alert(
                        AlertKind::PotentialDump,
                        token,
                        *bucket_time,
                        &sell_like,
                        self.config.dump.rapid_sells,
                    ));
                }
            }
        }

        debug!("Detected {} coordination alerts", alerts.len());
        alerts
    }

    fn build_alert(
        &self,
        kind: AlertKind,
        token: &str,
        bucket_time: chrono::DateTime<chrono::Utc>,
        contributing: &[&WhaleActivity],
        rapid_threshold: usize,
    ) -> CoordinationAlert {
        let unique_wallets: BTreeSet<&str> =
            contributing.iter().map(|a| a.wallet.as_str()).collect();
        let total_volume_usd: f64 = contributing.iter().map(|a| a.amount_usd).sum();

        // The division saturates at 1.0 rather than being clamped afterwards
        let confidence = (unique_wallets.len() as f64 / rapid_threshold as f64).min(1.0);

        CoordinationAlert {
            kind,
            token: token.to_string(),
            bucket_time,
            whale_count: unique_wallets.len(),
            total_volume_usd,
            confidence,
            activities: contributing.iter().map(|a| (*a).clone()).collect(),
        }
    }
}
