//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use rollcall_types::VerificationParams;
use rollcall_utils::LogFormat;

use crate::NodeError;

const MIB: usize = 1024 * 1024;

/// Configuration for a rollcall server.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so an
/// empty file is a valid configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Address the HTTP server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound on the LMDB map, in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// How often stale superseded payloads and lapsed logins are dropped, in seconds.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,

    /// Lifetime of a bearer login, in seconds.
    #[serde(default = "default_login_ttl_secs")]
    pub login_ttl_secs: u64,

    #[serde(default)]
    pub verification: VerificationParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./rollcall_data")
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_map_size_mb() -> usize {
    64
}

fn default_purge_interval_secs() -> u64 {
    60
}

fn default_login_ttl_secs() -> u64 {
    8 * 60 * 60
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject settings the node cannot run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.listen_addr.trim().is_empty() {
            return Err(NodeError::Config("listen_addr must not be empty".into()));
        }
        if self.map_size_mb == 0 {
            return Err(NodeError::Config("map_size_mb must be positive".into()));
        }
        if self.purge_interval_secs == 0 {
            return Err(NodeError::Config("purge_interval_secs must be positive".into()));
        }
        if self.login_ttl_secs == 0 {
            return Err(NodeError::Config("login_ttl_secs must be positive".into()));
        }
        self.verification
            .validate()
            .map_err(|e| NodeError::Config(e.to_string()))
    }

    /// LMDB map size in bytes.
    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(MIB)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            listen_addr: default_listen_addr(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            map_size_mb: default_map_size_mb(),
            purge_interval_secs: default_purge_interval_secs(),
            login_ttl_secs: default_login_ttl_secs(),
            verification: VerificationParams::default(),
        }
    }
}
