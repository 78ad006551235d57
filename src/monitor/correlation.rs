//! Pairwise wallet correlation analysis.
//!
//! Compares every pair of active wallets for shared tokens and
//! time-proximate activity. The pair scan is O(n²) over distinct
//! wallets, which is fine at whale scale; if wallet counts ever outgrow
//! that, group wallets by token first and compare only within
//! shared-token groups.

use crate::monitor::types::{MonitorConfig, SuspicionLevel, WalletCorrelation};
use crate::types::WhaleActivity;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument};

/// Analyzer for correlated trading behavior between wallet pairs.
pub struct CorrelationAnalyzer {
    config: MonitorConfig,
}

impl CorrelationAnalyzer {
    pub fn new(config: MonitorConfig) -> Self {
        Self { config }
    }

    /// Compare every unordered pair of distinct wallets in the snapshot.
    ///
    /// Wallet grouping uses an ordered map, so which pairs get reported
    /// and their scores never depend on input order.
    #[instrument(skip(self, activities))]
    pub fn analyze(&self, activities: &[WhaleActivity]) -> Vec<WalletCorrelation> {
        if activities.len() < 2 {
            return Vec::new();
        }

        let mut by_wallet: BTreeMap<&str, Vec<&WhaleActivity>> = BTreeMap::new();
        for activity in activities {
            by_wallet.entry(activity.wallet.as_str()).or_default().push(activity);
        }

        let wallets: Vec<&str> = by_wallet.keys().copied().collect();
        let mut correlations = Vec::new();

        for i in 0..wallets.len() {
            for j in (i + 1)..wallets.len() {
                let wallet_a = wallets[i];
                let wallet_b = wallets[j];

                if let Some(correlation) =
                    self.correlate_pair(wallet_a, &by_wallet[wallet_a], wallet_b, &by_wallet[wallet_b])
                {
                    correlations.push(correlation);
                }
            }
        }

        debug!("Found {} wallet correlations", correlations.len());
        correlations
    }

    fn correlate_pair(
        &self,
        wallet_a: &str,
        activities_a: &[&WhaleActivity],
        wallet_b: &str,
        activities_b: &[&WhaleActivity],
    ) -> Option<WalletCorrelation> {
        let tokens_a: BTreeSet<&str> = activities_a.iter().map(|a| a.token.as_str()).collect();
        let tokens_b: BTreeSet<&str> = activities_b.iter().map(|a| a.token.as_str()).collect();
        let common_tokens: BTreeSet<&str> = tokens_a.intersection(&tokens_b).copied().collect();

        if common_tokens.len() < self.config.min_common_tokens {
            return None;
        }

        let times_a = restrict_to_tokens(activities_a, &common_tokens);
        let times_b = restrict_to_tokens(activities_b, &common_tokens);

        // Every (a, b) timestamp pair inside the window counts; one
        // timestamp in A may match several in B. Compared in milliseconds
        // so a 300.5s gap does not truncate into the window.
        let window_ms = self.config.correlation_window_secs * 1000;
        let mut time_correlations = 0usize;
        for time_a in &times_a {
            for time_b in &times_b {
                if (*time_a - *time_b).num_milliseconds().abs() <= window_ms {
                    time_correlations += 1;
                }
            }
        }

        if time_correlations < self.config.min_time_correlations {
            return None;
        }

        // Saturating by construction, never clamped after the fact
        let denominator = times_a.len().max(times_b.len()) as f64;
        let correlation_score = (time_correlations as f64 / denominator).min(1.0);

        let suspicion = if correlation_score > self.config.high_suspicion_cutoff {
            SuspicionLevel::High
        } else {
            SuspicionLevel::Medium
        };

        Some(WalletCorrelation {
            wallet_a: wallet_a.to_string(),
            wallet_b: wallet_b.to_string(),
            common_tokens: common_tokens.iter().map(|t| t.to_string()).collect(),
            time_correlations,
            correlation_score,
            suspicion,
        })
    }
}

fn restrict_to_tokens(
    activities: &[&WhaleActivity],
    tokens: &BTreeSet<&str>,
) -> Vec<DateTime<Utc>> {
    activities
        .iter()
        .filter(|a| tokens.contains(a.token.as_str()))
        .map(|a| a.timestamp)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActivityKind;
    use chrono::{TimeZone, Utc};

    fn create_test_analyzer() -> CorrelationAnalyzer {
        CorrelationAnalyzer::new(MonitorConfig::default())
    }

    fn at_minute(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minute)
    }

    fn activity(wallet: &str, token: &str, minute: i64, tx: &str) -> WhaleActivity {
        WhaleActivity {
            wallet: wallet.to_string(),
            token: token.to_string(),
            kind: ActivityKind::Buy,
            amount_tokens: 10.0,
            amount_usd: 5000.0,
            timestamp: at_minute(minute),
            tx_id: tx.to_string(),
        }
    }

    #[test]
    fn test_single_common_token_never_correlates() {
        // Same token, same minute: timing is as close as it gets, but one
        // shared token is below the minimum of two.
        let activities = vec![
            activity("alice", "PEPE", 0, "tx1"),
            activity("alice", "PEPE", 1, "tx2"),
            activity("bob", "PEPE", 0, "tx3"),
            activity("bob", "PEPE", 1, "tx4"),
        ];

        let correlations = create_test_analyzer().analyze(&activities);
        assert!(correlations.is_empty());
    }

    #[test]
    fn test_close_pairs_on_shared_tokens_correlate() {
        let activities = vec![
            activity("alice", "UNI", 0, "tx1"),
            activity("alice", "LINK", 2, "tx2"),
            activity("alice", "AAVE", 4, "tx3"),
            activity("bob", "UNI", 1, "tx4"),
            activity("bob", "LINK", 3, "tx5"),
            activity("bob", "AAVE", 5, "tx6"),
        ];

        let correlations = create_test_analyzer().analyze(&activities);

        assert_eq!(correlations.len(), 1);
        let c = &correlations[0];
        assert_eq!(c.wallet_a, "alice");
        assert_eq!(c.wallet_b, "bob");
        assert_eq!(c.common_tokens, vec!["AAVE", "LINK", "UNI"]);
        assert!(c.time_correlations >= 2);
    }

    #[test]
    fn test_score_saturates_at_one() {
        // 3x3 timestamps all within the window: 9 matches over max-len 3
        let activities = vec![
            activity("alice", "UNI", 0, "tx1"),
            activity("alice", "LINK", 1, "tx2"),
            activity("alice", "UNI", 2, "tx3"),
            activity("bob", "UNI", 0, "tx4"),
            activity("bob", "LINK", 1, "tx5"),
            activity("bob", "UNI", 2, "tx6"),
        ];

        let correlations = create_test_analyzer().analyze(&activities);

        assert_eq!(correlations.len(), 1);
        assert_eq!(correlations[0].time_correlations, 9);
        assert_eq!(correlations[0].correlation_score, 1.0);
        assert_eq!(correlations[0].suspicion, SuspicionLevel::High);
    }

    #[test]
    fn test_suspicion_boundary_at_exactly_0_7() {
        // alice: 10 activities on shared tokens; 7 matching pairs exactly.
        // bob at minute 3 reaches alice's 0,2,4,6; bob at 51 reaches
        // 50,52,54. Score 7/10 = 0.7 is not strictly above the cutoff.
        let alice_minutes = [0, 2, 4, 6, 50, 52, 54, 200, 300, 400];
        let mut activities: Vec<WhaleActivity> = alice_minutes
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let token = if i % 2 == 0 { "UNI" } else { "LINK" };
                activity("alice", token, *m, &format!("a{}", i))
            })
            .collect();
        activities.push(activity("bob", "UNI", 3, "b1"));
        activities.push(activity("bob", "LINK", 51, "b2"));

        let correlations = create_test_analyzer().analyze(&activities);

        assert_eq!(correlations.len(), 1);
        let c = &correlations[0];
        assert_eq!(c.time_correlations, 7);
        assert!((c.correlation_score - 0.7).abs() < 1e-12);
        assert_eq!(c.suspicion, SuspicionLevel::Medium);
    }

    #[test]
    fn test_suspicion_high_just_above_cutoff() {
        // Same shape but alice's far-away minute 200 moves to 8, giving
        // bob's first timestamp a fifth neighbor: 8/10 = 0.8 > 0.7.
        let alice_minutes = [0, 2, 4, 6, 8, 50, 52, 54, 300, 400];
        let mut activities: Vec<WhaleActivity> = alice_minutes
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let token = if i % 2 == 0 { "UNI" } else { "LINK" };
                activity("alice", token, *m, &format!("a{}", i))
            })
            .collect();
        activities.push(activity("bob", "UNI", 3, "b1"));
        activities.push(activity("bob", "LINK", 51, "b2"));

        let correlations = create_test_analyzer().analyze(&activities);

        assert_eq!(correlations.len(), 1);
        let c = &correlations[0];
        assert_eq!(c.time_correlations, 8);
        assert!((c.correlation_score - 0.8).abs() < 1e-12);
        assert_eq!(c.suspicion, SuspicionLevel::High);
    }

    #[test]
    fn test_single_close_pair_not_reported() {
        // Only one timestamp pair inside the window; minimum is two.
        let activities = vec![
            activity("alice", "UNI", 0, "tx1"),
            activity("alice", "LINK", 100, "tx2"),
            activity("bob", "UNI", 1, "tx3"),
            activity("bob", "LINK", 200, "tx4"),
        ];

        let correlations = create_test_analyzer().analyze(&activities);
        assert!(correlations.is_empty());
    }

    #[test]
    fn test_input_order_does_not_change_result() {
        let mut activities = vec![
            activity("alice", "UNI", 0, "tx1"),
            activity("alice", "LINK", 2, "tx2"),
            activity("bob", "UNI", 1, "tx3"),
            activity("bob", "LINK", 3, "tx4"),
        ];

        let forward = create_test_analyzer().analyze(&activities);
        activities.reverse();
        let reversed = create_test_analyzer().analyze(&activities);

        assert_eq!(forward.len(), reversed.len());
        assert_eq!(forward[0].wallet_a, reversed[0].wallet_a);
        assert_eq!(forward[0].wallet_b, reversed[0].wallet_b);
        assert_eq!(forward[0].correlation_score, reversed[0].correlation_score);
        assert_eq!(forward[0].time_correlations, reversed[0].time_correlations);
    }

    #[test]
    fn test_fewer_than_two_activities() {
        let activities = vec![activity("alice", "UNI", 0, "tx1")];
        assert!(create_test_analyzer().analyze(&activities).is_empty());
    }
}
