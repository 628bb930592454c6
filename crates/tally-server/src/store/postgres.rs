//! Postgres-backed store handle.
//!
//! The pool is created lazily: no connection is attempted until the first
//! query, so startup gating stays with the readiness probe. `max_connections`
//! bounds concurrent in-flight queries; callers beyond that bound wait for a
//! free connection up to `acquire_timeout`, after which the query fails
//! instead of hanging.
//!
//! Liveness pings bypass the pool: one ping is one connect plus `SELECT 1`,
//! so a refusing store fails fast instead of burning the acquire timeout on
//! the pool's internal reconnect loop.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgConnection, PgPool};

use tally_core::error::{Result, TallyError};

use super::Store;
use crate::config::StoreSection;

pub struct PgStore {
    pool: PgPool,
    options: PgConnectOptions,
    ping_timeout: Duration,
}

fn store_err(e: sqlx::Error) -> TallyError {
    TallyError::Store(e.to_string())
}

impl PgStore {
    pub fn connect_lazy(cfg: &StoreSection) -> Self {
        // Credentials go into the options only; never log them.
        let options = PgConnectOptions::new()
            .host(&cfg.host)
            .port(cfg.port)
            .username(&cfg.user)
            .password(&cfg.password)
            .database(&cfg.database);

        tracing::debug!(
            host = %cfg.host,
            port = cfg.port,
            database = %cfg.database,
            max_connections = cfg.max_connections,
            "postgres pool configured"
        );

        Self::with_options(
            options,
            cfg.max_connections,
            Duration::from_millis(cfg.acquire_timeout_ms),
        )
    }

    /// Build from explicit connect options (e.g. parsed from a URL).
    /// `acquire_timeout` also bounds a single liveness ping.
    pub fn with_options(
        options: PgConnectOptions,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Self {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy_with(options.clone());

        Self {
            pool,
            options,
            ping_timeout: acquire_timeout,
        }
    }

    async fn ping_once(&self) -> std::result::Result<(), sqlx::Error> {
        let mut conn = PgConnection::connect_with(&self.options).await?;
        sqlx::query("SELECT 1").execute(&mut conn).await?;
        conn.close().await
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<()> {
        if self.pool.is_closed() {
            return Err(TallyError::Store("pool closed".into()));
        }
        match tokio::time::timeout(self.ping_timeout, self.ping_once()).await {
            Ok(res) => res.map_err(store_err),
            Err(_) => Err(TallyError::Store(format!(
                "ping timed out after {}ms",
                self.ping_timeout.as_millis()
            ))),
        }
    }

    async fn create_counter_table(&self) -> Result<()> {
        // SERIAL keeps the shape of tables created by earlier deployments.
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS hit_counter (
                id SERIAL PRIMARY KEY,
                total BIGINT NOT NULL DEFAULT 0
            )"#,
        )
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn insert_counter_if_absent(&self, id: i32, total: u64) -> Result<bool> {
        let total = i64::try_from(total)
            .map_err(|_| TallyError::Store(format!("total out of range: {total}")))?;
        let res = sqlx::query(
            r#"INSERT INTO hit_counter (id, total) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING"#,
        )
        .bind(id)
        .bind(total)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(res.rows_affected() == 1)
    }

    async fn increment_counter(&self, id: i32) -> Result<u64> {
        let res = sqlx::query(r#"UPDATE hit_counter SET total = total + 1 WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(res.rows_affected())
    }

    async fn read_counter(&self, id: i32) -> Result<Option<u64>> {
        let total: Option<i64> =
            sqlx::query_scalar(r#"SELECT total FROM hit_counter WHERE id = $1"#)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;

        total
            .map(|t| {
                u64::try_from(t)
                    .map_err(|_| TallyError::Store(format!("counter total is negative: {t}")))
            })
            .transpose()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
