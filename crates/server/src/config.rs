use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// HTTP request timeout in seconds. Kept above the pipeline's own query
    /// deadline so a slow query reports `timeout` rather than being cut.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// YAML pipeline configuration (corpora, vocabulary, model, endpoints)
    #[serde(default = "default_pipeline_config_path")]
    pub pipeline_config_path: PathBuf,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default = "default_true")]
    pub json_logs: bool,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            pipeline_config_path: default_pipeline_config_path(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            json_logs: default_true(),
            metrics_enabled: default_true(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `server.toml` and
    /// `JOURNALREC_SERVER__*` environment variables, in rising precedence.
    pub fn load() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("JOURNALREC_SERVER").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.timeout_secs > 0, "timeout_secs must be >= 1");
        anyhow::ensure!(
            !self.pipeline_config_path.as_os_str().is_empty(),
            "pipeline_config_path must be set"
        );
        Ok(())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    250
}

fn default_pipeline_config_path() -> PathBuf {
    PathBuf::from("journalrec.yaml")
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.timeout_secs, 250);
        assert_eq!(cfg.pipeline_config_path, PathBuf::from("journalrec.yaml"));
        assert!(cfg.enable_cors);
        assert!(cfg.metrics_enabled);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let cfg = ServerConfig::default();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let cfg = ServerConfig {
            timeout_secs: 0,
            ..ServerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
