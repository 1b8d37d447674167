use crate::models::{Device, MacAddress};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

#[derive(sqlx::FromRow)]
struct DeviceRow {
    name: String,
    mac: String,
    key: String,
    registered_at: DateTime<Utc>,
    last_checkin: Option<DateTime<Utc>>,
}

/// Durable mirror of the registry in the `devices` table.
pub struct DeviceService {
    pool: SqlitePool,
}

impl DeviceService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn persist(&self, device: &Device) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO devices (name, mac, key, registered_at, last_checkin) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&device.name)
        .bind(device.mac.as_str())
        .bind(&device.key)
        .bind(device.registered_at)
        .bind(device.last_checkin)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to insert device {}", device.mac))?;
        Ok(())
    }

    /// Stores `at` unless the row already holds a later check-in, so writes
    /// arriving out of order never move `last_checkin` back.
    pub async fn record_checkin(&self, key: &str, at: DateTime<Utc>) -> anyhow::Result<()> {
        // timestamps share one RFC 3339 encoding with a fixed offset, text order is time order
        let result = sqlx::query(
            "UPDATE devices SET last_checkin = ? WHERE key = ? AND (last_checkin IS NULL OR last_checkin < ?)",
        )
        .bind(at)
        .bind(key)
        .bind(at)
        .execute(&self.pool)
        .await
        .context("Failed to update last check-in")?;
        if result.rows_affected() > 0 {
            return Ok(());
        }
        let stored = sqlx::query("SELECT id FROM devices WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to look up checked in device")?;
        if stored.is_none() {
            anyhow::bail!("No stored device holds the checked in key");
        }
        tracing::debug!("Ignored check-in at {at}, a later one is already stored");
        Ok(())
    }

    /// Every stored device in registration order. Rows with an unparsable MAC are skipped.
    pub async fn load_all(&self) -> anyhow::Result<Vec<Device>> {
        let rows = sqlx::query_as::<_, DeviceRow>(
            "SELECT name, mac, key, registered_at, last_checkin FROM devices ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load stored devices")?;
        Ok(rows
            .into_iter()
            .filter_map(|row| match MacAddress::parse(&row.mac) {
                Ok(mac) => Some(Device {
                    name: row.name,
                    mac,
                    key: row.key,
                    registered_at: row.registered_at,
                    last_checkin: row.last_checkin,
                }),
                Err(err) => {
                    tracing::warn!("Skipped stored device '{}': {err}", row.name);
                    None
                }
            })
            .collect())
    }
}
