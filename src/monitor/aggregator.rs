//! Time-window aggregation of whale activity.
//!
//! Groups raw activity records by token and minute bucket for the
//! coordination detector, and rolls activity up per token for the scan
//! report. Ordered maps keep iteration deterministic across scans.

use crate::monitor::types::TokenRollup;
use crate::types::WhaleActivity;
use chrono::{DateTime, Duration, DurationRound, Utc};
use std::collections::BTreeMap;

/// token -> minute bucket -> activities in that bucket
pub type BucketedActivities = BTreeMap<String, BTreeMap<DateTime<Utc>, Vec<WhaleActivity>>>;

/// Truncate a timestamp to the whole minute it falls in.
///
/// Two activities with the same truncated minute always land in the same
/// bucket regardless of sub-minute precision or scan order.
pub fn minute_bucket(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .duration_trunc(Duration::minutes(1))
        .unwrap_or(timestamp)
}

/// Group activities by (token, minute bucket).
///
/// Every input activity lands in exactly one bucket; nothing is dropped
/// or duplicated.
pub fn bucket_by_token_and_minute(activities: &[WhaleActivity]) -> BucketedActivities {
    let mut buckets: BucketedActivities = BTreeMap::new();

    for activity in activities {
        buckets
            .entry(activity.token.clone())
            .or_default()
            .entry(minute_bucket(activity.timestamp))
            .or_default()
            .push(activity.clone());
    }

    buckets
}

/// Roll activity up per token: distinct wallets, buy/sell counts, volume.
pub fn token_rollups(activities: &[WhaleActivity]) -> BTreeMap<String, TokenRollup> {
    let mut rollups: BTreeMap<String, TokenRollup> = BTreeMap::new();

    for activity in activities {
        let rollup = rollups.entry(activity.token.clone()).or_default();
        rollup.wallets.insert(activity.wallet.clone());
        rollup.volume_usd += activity.amount_usd;

        if activity.kind.is_buy_like() {
            rollup.buys += 1;
        } else if activity.kind.is_sell_like() {
            rollup.sells += 1;
        }
    }

    rollups
}
