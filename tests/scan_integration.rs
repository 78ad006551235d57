//! End-to-end scan against a real SQLite activity store.

use chrono::Utc;
use std::sync::Arc;
use whale_sentinel::monitor::{
    ActivityMonitor, ActivityStore, MonitorConfig, SqliteActivityStore, StaticPriceTable,
};
use whale_sentinel::types::{ActivityKind, WhaleActivity};

async fn temp_store(dir: &tempfile::TempDir) -> SqliteActivityStore {
    let db_path = dir.path().join("activity.db");
    let url = format!("sqlite:{}?mode=rwc", db_path.display());
    SqliteActivityStore::connect(&url)
        .await
        .expect("Failed to create store")
}

fn buy_at(
    wallet: &str,
    token: &str,
    usd: f64,
    timestamp: chrono::DateTime<Utc>,
    tx_id: &str,
) -> WhaleActivity {
    WhaleActivity {
        wallet: wallet.to_string(),
        token: token.to_string(),
        kind: ActivityKind::Buy,
        amount_tokens: usd / 0.00002,
        amount_usd: usd,
        timestamp,
        tx_id: tx_id.to_string(),
    }
}

#[tokio::test]
async fn test_full_scan_over_seeded_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(temp_store(&dir).await);

    // Five distinct whales buying the same token inside one minute; a
    // single shared timestamp keeps them in one bucket no matter when
    // the test runs.
    let now = Utc::now();
    for i in 0..5 {
        store
            .record_activity(&buy_at(
                &format!("0xwhale{:02}", i),
                "PEPE",
                5000.0,
                now,
                &format!("tx{}", i),
            ))
            .await
            .expect("Failed to seed activity");
    }

    let mut monitor = ActivityMonitor::new(
        store.clone(),
        Arc::new(StaticPriceTable::new()),
        MonitorConfig::default(),
    );

    let report = monitor.scan_once().await.expect("Scan failed");

    assert_eq!(report.scan_number, 1);
    assert_eq!(report.activities_examined, 5);
    assert_eq!(report.alerts_emitted, 1);
    assert_eq!(report.alerts_persisted, 1);
    assert_eq!(report.total_alerts, 1);

    // The alert row made it into the alert table
    let (alert_type, token, whale_count, confidence): (String, String, i64, f64) =
        sqlx::query_as(
            "SELECT alert_type, token_symbol, whale_count, confidence_score FROM pump_dump_alerts",
        )
        .fetch_one(store.get_db_pool())
        .await
        .expect("Alert row missing");

    assert_eq!(alert_type, "POTENTIAL_PUMP");
    assert_eq!(token, "PEPE");
    assert_eq!(whale_count, 5);
    assert_eq!(confidence, 1.0);
}

#[tokio::test]
async fn test_whale_registry_reflects_seeded_volume() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir).await;

    let now = Utc::now();
    store
        .record_activity(&buy_at("0xbigwhale", "UNI", 250_000.0, now, "tx-big"))
        .await
        .unwrap();
    store
        .record_activity(&buy_at("0xsmallfry", "UNI", 50.0, now, "tx-small"))
        .await
        .unwrap();

    let registry = store.fetch_whale_registry(1000.0).await.unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(registry[0].wallet, "0xbigwhale");
    assert_eq!(registry[0].transaction_count, 1);
    assert!(registry[0].total_volume_usd > 1000.0);
}

#[tokio::test]
async fn test_quiet_store_scans_clean() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(temp_store(&dir).await);

    let mut monitor = ActivityMonitor::new(
        store,
        Arc::new(StaticPriceTable::new()),
        MonitorConfig::default(),
    );

    let report = monitor.scan_once().await.expect("Scan failed");

    assert_eq!(report.activities_examined, 0);
    assert_eq!(report.alerts_emitted, 0);
    assert_eq!(report.correlations_found, 0);
}
