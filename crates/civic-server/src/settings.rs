//! Layered server configuration: built-in defaults, then an optional TOML
//! file, then `CIVIC_*` environment variables.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, Source};
use serde::Deserialize;

/// Runtime server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:        String,
  pub port:        u16,
  pub store_path:  PathBuf,
  /// Frontend origin allowed by CORS.
  pub cors_origin: String,
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Read configuration, treating a missing file at `path` as empty.
pub fn load(path: &Path) -> Result<ServerConfig, ConfigError> {
  layered(File::from(path).required(false))
}

fn layered<F>(file: F) -> Result<ServerConfig, ConfigError>
where
  F: Source + Send + Sync + 'static,
{
  let mut cfg: ServerConfig = Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 5001_i64)?
    .set_default("store_path", "civic.db")?
    .set_default("cors_origin", "http://localhost:3000")?
    .add_source(file)
    .add_source(Environment::with_prefix("CIVIC"))
    .build()?
    .try_deserialize()?;

  cfg.store_path = expand_tilde(&cfg.store_path);
  Ok(cfg)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
