//! Storage abstraction for whale activity and alerts.
//!
//! This module defines the formal contract the monitor requires of its
//! data store, plus the SQLite implementation. Schema creation is
//! idempotent and owned by the store, not the detectors.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{sqlite::SqlitePoolOptions, FromRow, Pool, Sqlite};
use tracing::{debug, info};

use crate::monitor::types::CoordinationAlert;
use crate::types::{ActivityKind, WhaleActivity, WhaleStats};

/// How far back the whale registry aggregates activity.
const REGISTRY_WINDOW_DAYS: i64 = 7;

/// Formal contract for the activity store.
///
/// The monitor reads whale registries and recent activity through this
/// trait and writes alerts back; any database engine can sit behind it.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Wallets whose aggregate USD volume over the trailing 7-day window
    /// exceeds `min_volume_usd`, ordered by volume descending.
    async fn fetch_whale_registry(&self, min_volume_usd: f64) -> Result<Vec<WhaleStats>>;

    /// All activity after `cutoff` with USD amount above `min_amount_usd`,
    /// ordered by timestamp descending.
    async fn fetch_recent_activity(
        &self,
        cutoff: DateTime<Utc>,
        min_amount_usd: f64,
    ) -> Result<Vec<WhaleActivity>>;

    /// Persist one coordination alert. Returns the row id.
    async fn save_alert(&self, alert: &CoordinationAlert) -> Result<i64>;

    /// Ingestion-side write of a raw activity record.
    async fn record_activity(&self, activity: &WhaleActivity) -> Result<()>;

    /// Health check for the storage backend.
    async fn health_check(&self) -> Result<bool>;
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Buy => "buy",
            ActivityKind::Sell => "sell",
            ActivityKind::Transfer => "transfer",
        }
    }

    fn parse(value: &str) -> Result<Self> {
        match value {
            "buy" => Ok(ActivityKind::Buy),
            "sell" => Ok(ActivityKind::Sell),
            "transfer" => Ok(ActivityKind::Transfer),
            other => Err(anyhow!("Unknown activity type: {}", other)),
        }
    }
}

#[derive(FromRow)]
struct WhaleStatsRow {
    wallet_address: String,
    coin_symbol: String,
    transaction_count: i64,
    total_volume: f64,
    last_activity: DateTime<Utc>,
}

#[derive(FromRow)]
struct ActivityRow {
    wallet_address: String,
    coin_symbol: String,
    activity_type: String,
    amount_tokens: f64,
    amount_usd: f64,
    block_timestamp: DateTime<Utc>,
    transaction_id: String,
}

impl ActivityRow {
    fn into_activity(self) -> Result<WhaleActivity> {
        Ok(WhaleActivity {
            wallet: self.wallet_address,
            token: self.coin_symbol,
            kind: ActivityKind::parse(&self.activity_type)?,
            amount_tokens: self.amount_tokens,
            amount_usd: self.amount_usd,
            timestamp: self.block_timestamp,
            tx_id: self.transaction_id,
        })
    }
}

/// SQLite implementation of the [`ActivityStore`] contract.
///
/// Connections come out of the pool per query and go straight back, so
/// nothing idles across the scan interval.
pub struct SqliteActivityStore {
    pool: Pool<Sqlite>,
}

impl SqliteActivityStore {
    /// Connect and bootstrap the schema if it is not there yet.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("Failed to connect to SQLite database")?;

        Self::create_schema(&pool).await?;

        info!("Activity store initialized at {}", database_url);
        Ok(Self { pool })
    }

    async fn create_schema(pool: &Pool<Sqlite>) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS whale_transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                wallet_address TEXT NOT NULL,
                coin_symbol TEXT NOT NULL,
                activity_type TEXT NOT NULL,
                amount_tokens REAL NOT NULL,
                amount_usd REAL NOT NULL,
                block_timestamp TEXT NOT NULL,
                transaction_id TEXT NOT NULL UNIQUE
            );
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create whale_transactions table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pump_dump_alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                alert_type TEXT NOT NULL,
                token_symbol TEXT NOT NULL,
                whale_count INTEGER NOT NULL,
                total_volume REAL NOT NULL,
                confidence_score REAL NOT NULL,
                alert_timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                alert_data TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create pump_dump_alerts table")?;

        Ok(())
    }

    pub fn get_db_pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl ActivityStore for SqliteActivityStore {
    async fn fetch_whale_registry(&self, min_volume_usd: f64) -> Result<Vec<WhaleStats>> {
        let cutoff = Utc::now() - Duration::days(REGISTRY_WINDOW_DAYS);

        let rows: Vec<WhaleStatsRow> = sqlx::query_as(
            r#"
            SELECT wallet_address, coin_symbol,
                   COUNT(*) as transaction_count,
                   SUM(amount_usd) as total_volume,
                   MAX(block_timestamp) as last_activity
            FROM whale_transactions
            WHERE block_timestamp > ?
            GROUP BY wallet_address, coin_symbol
            HAVING SUM(amount_usd) > ?
            ORDER BY total_volume DESC;
            "#,
        )
        .bind(cutoff)
        .bind(min_volume_usd)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch whale registry")?;

        Ok(rows
            .into_iter()
            .map(|row| WhaleStats {
                wallet: row.wallet_address,
                token: row.coin_symbol,
                transaction_count: row.transaction_count,
                total_volume_usd: row.total_volume,
                last_activity: row.last_activity,
            })
            .collect())
    }

    async fn fetch_recent_activity(
        &self,
        cutoff: DateTime<Utc>,
        min_amount_usd: f64,
    ) -> Result<Vec<WhaleActivity>> {
        let rows: Vec<ActivityRow> = sqlx::query_as(
            r#"
            SELECT wallet_address, coin_symbol, activity_type,
                   amount_tokens, amount_usd, block_timestamp,
                   transaction_id
            FROM whale_transactions
            WHERE block_timestamp > ?
            AND amount_usd > ?
            ORDER BY block_timestamp DESC;
            "#,
        )
        .bind(cutoff)
        .bind(min_amount_usd)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch recent activity")?;

        rows.into_iter().map(ActivityRow::into_activity).collect()
    }

    async fn save_alert(&self, alert: &CoordinationAlert) -> Result<i64> {
        debug!("Saving {} alert for {}", alert.kind.as_str(), alert.token);

        // Timestamps inside the payload must already be ISO-8601 text;
        // to_payload() performs that conversion, the store does not.
        let payload = serde_json::to_string(&alert.to_payload())
            .context("Failed to serialize alert payload")?;

        let row_id = sqlx::query(
            r#"
            INSERT INTO pump_dump_alerts
            (alert_type, token_symbol, whale_count, total_volume, confidence_score, alert_data)
            VALUES (?, ?, ?, ?, ?, ?);
            "#,
        )
        .bind(alert.kind.as_str())
        .bind(&alert.token)
        .bind(alert.whale_count as i64)
        .bind(round2(alert.total_volume_usd))
        .bind(round2(alert.confidence))
        .bind(payload)
        .execute(&self.pool)
        .await
        .context("Failed to save alert")?
        .last_insert_rowid();

        Ok(row_id)
    }

    async fn record_activity(&self, activity: &WhaleActivity) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO whale_transactions
            (wallet_address, coin_symbol, activity_type, amount_tokens, amount_usd, block_timestamp, transaction_id)
            VALUES (?, ?, ?, ?, ?, ?, ?);
            "#,
        )
        .bind(&activity.wallet)
        .bind(&activity.token)
        .bind(activity.kind.as_str())
        .bind(activity.amount_tokens)
        .bind(activity.amount_usd)
        .bind(activity.timestamp)
        .bind(&activity.tx_id)
        .execute(&self.pool)
        .await
        .context("Failed to record activity")?;

        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        let row: (i64,) = sqlx::query_as("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Health check query failed")?;
        Ok(row.0 == 1)
    }
}

/// Fixed-point rounding for the two-decimal alert columns.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
