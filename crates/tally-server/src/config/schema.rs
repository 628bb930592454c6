use std::net::SocketAddr;

use serde::Deserialize;
use tally_core::error::{Result, TallyError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TallyConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub readiness: ReadinessSection,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            store: StoreSection::default(),
            readiness: ReadinessSection::default(),
        }
    }
}

impl TallyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TallyError::Config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.store.validate()?;
        self.readiness.validate()?;

        Ok(())
    }

    /// Apply environment-style overrides on top of file/default values.
    ///
    /// `lookup` abstracts the environment so callers and tests can inject
    /// their own source.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LISTEN_ADDR") {
            self.server.listen = v;
        }
        if let Some(v) = lookup("DB_HOST") {
            self.store.host = v;
        }
        if let Some(v) = lookup("DB_PORT") {
            self.store.port = v
                .parse()
                .map_err(|e| TallyError::Config(format!("DB_PORT must be a port number: {e}")))?;
        }
        if let Some(v) = lookup("DB_USER") {
            self.store.user = v;
        }
        if let Some(v) = lookup("DB_PASSWORD") {
            self.store.password = v;
        }
        if let Some(v) = lookup("DB_NAME") {
            self.store.database = v;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Delay before every `/health` store check. Deployments keep the default
    /// 5000 ms; other values are a test/ops override and change the
    /// observable behavior of `/health`.
    #[serde(default = "default_health_delay_ms")]
    pub health_delay_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            health_delay_ms: default_health_delay_ms(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if self.health_delay_ms > 60_000 {
            return Err(TallyError::Config(
                "server.health_delay_ms must be at most 60000".into(),
            ));
        }
        if self.health_delay_ms != default_health_delay_ms() {
            tracing::warn!(
                health_delay_ms = self.health_delay_ms,
                "health delay overridden; /health timing differs from the 5000ms default"
            );
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            TallyError::Config(format!(
                "server.listen must be a valid SocketAddr ({}): {e}",
                self.listen
            ))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}
fn default_health_delay_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// In-process store; nothing survives a restart.
    Memory,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: StoreBackend,

    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_db_user")]
    pub user: String,

    #[serde(default = "default_db_password")]
    pub password: String,

    #[serde(default = "default_db_name")]
    pub database: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

// Hand-written so the password never reaches logs.
impl std::fmt::Debug for StoreSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSection")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_ms", &self.acquire_timeout_ms)
            .finish()
    }
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: default_db_password(),
            database: default_db_name(),
            max_connections: default_max_connections(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
        }
    }
}

impl StoreSection {
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(TallyError::Config("store.host must not be empty".into()));
        }
        if self.database.is_empty() {
            return Err(TallyError::Config("store.database must not be empty".into()));
        }
        if !(1..=256).contains(&self.max_connections) {
            return Err(TallyError::Config(
                "store.max_connections must be between 1 and 256".into(),
            ));
        }
        if !(100..=120_000).contains(&self.acquire_timeout_ms) {
            return Err(TallyError::Config(
                "store.acquire_timeout_ms must be between 100 and 120000".into(),
            ));
        }
        Ok(())
    }
}

fn default_db_host() -> String {
    "db".into()
}
fn default_db_port() -> u16 {
    5432
}
fn default_db_user() -> String {
    "appuser".into()
}
fn default_db_password() -> String {
    "apppass".into()
}
fn default_db_name() -> String {
    "appdb".into()
}
fn default_max_connections() -> u32 {
    10
}
fn default_acquire_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadinessSection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for ReadinessSection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl ReadinessSection {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(TallyError::Config(
                "readiness.max_attempts must be at least 1".into(),
            ));
        }
        if self.interval_ms > 60_000 {
            return Err(TallyError::Config(
                "readiness.interval_ms must be at most 60000".into(),
            ));
        }
        Ok(())
    }
}

fn default_max_attempts() -> u32 {
    30
}
fn default_interval_ms() -> u64 {
    500
}
