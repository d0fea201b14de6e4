//! Gateway configuration
//!
//! Built-in defaults, then an optional TOML file, then `AGRI_GATEWAY__*`
//! environment variables (`AGRI_GATEWAY__SERVER__PORT=9000`).

use artifact_store::ArtifactManifest;
use config::{Config, ConfigError, Environment, File};
use data_validator::ValidationConfig;
use intent_client::{CannedReplies, DialogflowConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the config file
pub const CONFIG_PATH_ENV: &str = "AGRI_GATEWAY_CONFIG";
/// Config file read when none is given
pub const DEFAULT_CONFIG_FILE: &str = "gateway.toml";

const ENV_PREFIX: &str = "AGRI_GATEWAY";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request body limit in bytes
    pub max_upload_bytes: usize,
    /// Where uploads are stored while a request runs
    pub upload_dir: PathBuf,
    /// Upper bound on one inference call (ms)
    pub inference_timeout_ms: u64,
    pub log_format: LogFormat,
    /// Serve Prometheus metrics on `/metrics`
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_bytes: 10 * 1024 * 1024,
            upload_dir: PathBuf::from("uploads"),
            inference_timeout_ms: 30_000,
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Complete gateway configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub server: ServerConfig,
    pub models: ArtifactManifest,
    pub validation: ValidationConfig,
    /// Intent service; the chat route answers 500 when absent
    pub intent: Option<DialogflowConfig>,
    pub canned_replies: CannedReplies,
}

/// Resolve the config file: explicit path, then `AGRI_GATEWAY_CONFIG`
pub fn config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one, `gateway.toml` in the working
/// directory is read if present.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
    };

    let config = Config::builder()
        .add_source(Config::try_from(&GatewayConfig::default())?)
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let gateway: GatewayConfig = config.try_deserialize()?;
    debug!("Loaded configuration: {:?}", gateway.server);
    Ok(gateway)
}

#[cfg(test)]
mod tests {
    use super::*;
    use artifact_store::ArtifactSpec;
    use std::io::Write;

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.server.bind_addr(), "0.0.0.0:5000");
        assert_eq!(config.server.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.server.inference_timeout_ms, 30_000);
        assert!(config.intent.is_none());
        assert!(config.validation.accept_numeric_strings);
        assert_eq!(config.models.artifacts.len(), 7);
        assert!(config.canned_replies.lookup("crop_recommendation").is_some());
    }

    #[test]
    fn test_file_overrides_merge_with_defaults() {
        let file = write_toml(
            r#"
            [server]
            port = 8080
            log_format = "json"

            [validation]
            accept_numeric_strings = false

            [models.artifacts.market_model]
            kind = "regressor"
            path = "/srv/models/market.onnx"
            features = 3

            [intent]
            project_id = "agri-bot"

            [canned_replies]
            greeting = "Hello farmer!"
            "#,
        );

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.log_format, LogFormat::Json);
        // Untouched keys keep their defaults
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.models.artifacts.len(), 7);
        assert!(!config.validation.accept_numeric_strings);
        assert_eq!(
            config.models.artifacts["market_model"],
            ArtifactSpec::Regressor {
                path: PathBuf::from("/srv/models/market.onnx"),
                features: 3,
                output: 0,
            }
        );

        let intent = config.intent.unwrap();
        assert_eq!(intent.project_id, "agri-bot");
        assert_eq!(intent.language_code, "en");
        assert_eq!(config.canned_replies.lookup("Greeting"), Some("Hello farmer!"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_explicit_path_wins() {
        assert_eq!(
            config_path(Some(PathBuf::from("custom.toml"))),
            Some(PathBuf::from("custom.toml"))
        );
    }
}
