//! Server config loader (strict parsing + environment overrides).

pub mod schema;

use std::fs;

use tally_core::error::{Result, TallyError};

pub use schema::{ReadinessSection, ServerSection, StoreBackend, StoreSection, TallyConfig};

/// Environment variable naming an optional YAML config file.
pub const CONFIG_PATH_ENV: &str = "TALLY_CONFIG";

pub fn load_from_file(path: &str) -> Result<TallyConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| TallyError::Config(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<TallyConfig> {
    let cfg: TallyConfig =
        serde_yaml::from_str(s).map_err(|e| TallyError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load the process config: file named by `TALLY_CONFIG` (or defaults),
/// then `DB_*` / `LISTEN_ADDR` overrides, then validation.
pub fn load_from_env() -> Result<TallyConfig> {
    let mut cfg = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => load_from_file(&path)?,
        Err(_) => TallyConfig::default(),
    };
    cfg.apply_env(|key| std::env::var(key).ok())?;
    cfg.validate()?;
    Ok(cfg)
}
