use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use neo_exporter::tasks::Nep17Balance;
use serde::Deserialize;
use url::Url;

const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_HEALTH_RECHECK_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_METRICS_ENDPOINT: &str = ":16512";
const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(15);
const DEFAULT_LOG_LEVEL: &str = "info";

/// Exporter configuration: a YAML file overlaid with `NEO_EXPORTER_*`
/// environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub chain: ChainConfig,
    /// Main chain endpoints, used by the FS chain job to compare alphabets.
    pub mainnet: Option<MainnetConfig>,
    pub contracts: ContractsConfig,
    pub metrics: MetricsConfig,
    pub logger: LoggerConfig,
    pub locode: LocodeConfig,
    pub nep17: Vec<Nep17Balance>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Monitor the NeoFS chain; the main chain otherwise.
    pub fschain: bool,
    pub rpc: RpcConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub endpoint: Vec<String>,
    #[serde(with = "duration")]
    pub dial_timeout: Duration,
    #[serde(with = "duration")]
    pub health_recheck_interval: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: Vec::new(),
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            health_recheck_interval: DEFAULT_HEALTH_RECHECK_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MainnetConfig {
    pub rpc: RpcConfig,
}

/// Contract hash overrides. Unset FS chain contracts are resolved through NNS.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContractsConfig {
    pub neofs: Option<String>,
    pub netmap: Option<String>,
    pub container: Option<String>,
    pub balance: Option<String>,
    pub proxy: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Listen address; an empty host (`:16512`) binds every interface.
    pub endpoint: String,
    #[serde(with = "duration")]
    pub interval: Duration,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_METRICS_ENDPOINT.to_string(),
            interval: DEFAULT_METRICS_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub level: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocodeConfig {
    pub db: LocodeDbConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LocodeDbConfig {
    pub path: Option<PathBuf>,
}

impl MonitorConfig {
    /// Reads the YAML file at `path`.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Ok(serde_yaml::from_reader(file)?)
    }

    /// File (when given) plus process environment, validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies `NEO_EXPORTER_*` overrides; empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let dur = |name: &'static str| -> Result<Option<Duration>, ConfigError> {
            var(name)
                .map(|v| {
                    parse_duration(&v).map_err(|e| ConfigError::Invalid(format!("{name}: {e}")))
                })
                .transpose()
        };

        if let Some(v) = var("NEO_EXPORTER_CHAIN_FSCHAIN") {
            self.chain.fschain = match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(ConfigError::Invalid(format!(
                        "NEO_EXPORTER_CHAIN_FSCHAIN: expected a boolean, got {other:?}"
                    )))
                }
            };
        }
        if let Some(v) = var("NEO_EXPORTER_CHAIN_RPC_ENDPOINT") {
            self.chain.rpc.endpoint = split_list(&v);
        }
        if let Some(d) = dur("NEO_EXPORTER_CHAIN_RPC_DIAL_TIMEOUT")? {
            self.chain.rpc.dial_timeout = d;
        }
        if let Some(d) = dur("NEO_EXPORTER_CHAIN_RPC_HEALTH_RECHECK_INTERVAL")? {
            self.chain.rpc.health_recheck_interval = d;
        }
        if let Some(v) = var("NEO_EXPORTER_METRICS_ENDPOINT") {
            self.metrics.endpoint = v;
        }
        if let Some(d) = dur("NEO_EXPORTER_METRICS_INTERVAL")? {
            self.metrics.interval = d;
        }
        if let Some(v) = var("NEO_EXPORTER_LOGGER_LEVEL") {
            self.logger.level = v;
        }
        if let Some(v) = var("NEO_EXPORTER_LOCODE_DB_PATH") {
            self.locode.db.path = Some(PathBuf::from(v));
        }
        if let Some(v) = var("NEO_EXPORTER_CONTRACTS_NEOFS") {
            self.contracts.neofs = Some(v);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.rpc.endpoint.is_empty() {
            return Err(ConfigError::MissingRequired("chain.rpc.endpoint"));
        }
        for endpoint in &self.chain.rpc.endpoint {
            validate_endpoint(endpoint)?;
        }
        if let Some(endpoints) = self.main_chain_endpoints() {
            for endpoint in endpoints {
                validate_endpoint(endpoint)?;
            }
        }
        if self.metrics.interval.is_zero() {
            return Err(ConfigError::Invalid(
                "metrics.interval must be positive".to_string(),
            ));
        }
        self.listen_addr()?;
        Ok(())
    }

    /// Main chain endpoints, when any are configured.
    pub fn main_chain_endpoints(&self) -> Option<&[String]> {
        self.mainnet
            .as_ref()
            .map(|m| m.rpc.endpoint.as_slice())
            .filter(|e| !e.is_empty())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let endpoint = self.metrics.endpoint.trim();
        let full = match endpoint.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}"),
            None => endpoint.to_string(),
        };
        full.parse()
            .map_err(|e| ConfigError::Invalid(format!("metrics.endpoint {endpoint:?}: {e}")))
    }

    /// Tracing filter directive for the configured level.
    pub fn log_filter(&self) -> String {
        format!("{},actix_web=info", safe_level(&self.logger.level))
    }
}

/// Maps a configured level name onto a tracing level; unknown names mean info.
pub fn safe_level(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "debug" => "debug",
        "warn" => "warn",
        "error" | "fatal" | "panic" => "error",
        _ => "info",
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let url = Url::parse(endpoint).map_err(|_| ConfigError::InvalidUrl(endpoint.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        "ws" | "wss" => Err(ConfigError::Invalid(format!(
            "{endpoint}: websocket endpoints are not supported, use the node's http(s) address"
        ))),
        _ => Err(ConfigError::InvalidUrl(endpoint.to_string())),
    }
}

/// Parses Go-style durations (`500ms`, `15s`, `1m30s`, `2h`) or a bare number
/// of seconds.
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("empty duration".to_string());
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| format!("invalid duration {raw:?}"));
    }

    let overflow = || format!("duration {raw:?} is too large");
    let mut total = Duration::ZERO;
    let mut rest = raw;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("invalid duration {raw:?}"));
        }
        let value: u64 = rest[..digits].parse().map_err(|_| overflow())?;
        rest = &rest[digits..];
        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let segment = match &rest[..unit_len] {
            "ns" => Some(Duration::from_nanos(value)),
            "us" | "µs" => Some(Duration::from_micros(value)),
            "ms" => Some(Duration::from_millis(value)),
            "s" => Some(Duration::from_secs(value)),
            "m" => value.checked_mul(60).map(Duration::from_secs),
            "h" => value.checked_mul(3600).map(Duration::from_secs),
            "" => return Err(format!("missing unit in duration {raw:?}")),
            _ => return Err(format!("invalid duration unit in {raw:?}")),
        };
        total = segment
            .and_then(|d| total.checked_add(d))
            .ok_or_else(overflow)?;
        rest = &rest[unit_len..];
    }
    Ok(total)
}

mod duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Seconds(s) => Ok(Duration::from_secs(s)),
            Raw::Text(t) => super::parse_duration(&t).map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("can't read config file: {0}")]
    Io(String),

    #[error("can't parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("missing required setting: {0}")]
    MissingRequired(&'static str),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
chain:
  fschain: true
  rpc:
    endpoint:
      - http://morph1:30333
      - http://morph2:30333
    dial_timeout: 30s
mainnet:
  rpc:
    endpoint:
      - http://main:20332
contracts:
  proxy: "0x1111111111111111111111111111111111111111"
metrics:
  interval: 500ms
logger:
  level: debug
nep17:
  - contract: GAS
    label: treasury
    totalSupply: true
    balanceOf:
      - NepwUjd9GhqgNkrfXaxj9mmsFhFzGoFuWM
"#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_parse_yaml_with_defaults() {
        let cfg: MonitorConfig = serde_yaml::from_str(SAMPLE).unwrap();
        assert!(cfg.chain.fschain);
        assert_eq!(cfg.chain.rpc.endpoint.len(), 2);
        assert_eq!(cfg.chain.rpc.dial_timeout, Duration::from_secs(30));
        assert_eq!(cfg.chain.rpc.health_recheck_interval, Duration::from_secs(5));
        assert_eq!(cfg.metrics.endpoint, ":16512");
        assert_eq!(cfg.metrics.interval, Duration::from_millis(500));
        assert_eq!(cfg.logger.level, "debug");
        assert_eq!(cfg.main_chain_endpoints().unwrap(), ["http://main:20332"]);
        assert!(cfg.contracts.netmap.is_none());
        assert_eq!(cfg.nep17.len(), 1);
        assert_eq!(cfg.nep17[0].label, "treasury");
        assert!(cfg.nep17[0].total_supply);
        cfg.validate().unwrap();
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let cfg: MonitorConfig = serde_yaml::from_str("{}").unwrap();
        assert!(!cfg.chain.fschain);
        assert_eq!(cfg.chain.rpc.dial_timeout, Duration::from_secs(60));
        assert_eq!(cfg.metrics.interval, Duration::from_secs(15));
        assert_eq!(cfg.logger.level, "info");
        assert!(cfg.main_chain_endpoints().is_none());
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg: MonitorConfig = serde_yaml::from_str(SAMPLE).unwrap();
        cfg.apply_overrides(env(&[
            ("NEO_EXPORTER_CHAIN_FSCHAIN", "false"),
            ("NEO_EXPORTER_CHAIN_RPC_ENDPOINT", "http://a:1, http://b:2,"),
            ("NEO_EXPORTER_METRICS_INTERVAL", "1m"),
            ("NEO_EXPORTER_METRICS_ENDPOINT", "127.0.0.1:9000"),
            ("NEO_EXPORTER_LOGGER_LEVEL", ""),
        ]))
        .unwrap();
        assert!(!cfg.chain.fschain);
        assert_eq!(cfg.chain.rpc.endpoint, ["http://a:1", "http://b:2"]);
        assert_eq!(cfg.metrics.interval, Duration::from_secs(60));
        assert_eq!(cfg.listen_addr().unwrap().port(), 9000);
        assert_eq!(cfg.logger.level, "debug");
    }

    #[test]
    fn test_bad_override_rejected() {
        let mut cfg = MonitorConfig::default();
        let err = cfg
            .apply_overrides(env(&[("NEO_EXPORTER_METRICS_INTERVAL", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_validation() {
        let mut cfg = MonitorConfig::default();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MissingRequired("chain.rpc.endpoint"))
        ));

        cfg.chain.rpc.endpoint = vec!["ftp://node:1".to_string()];
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidUrl(_))));

        cfg.chain.rpc.endpoint = vec!["wss://node:1/ws".to_string()];
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("websocket"));

        cfg.chain.rpc.endpoint = vec!["http://node:1".to_string()];
        cfg.validate().unwrap();

        cfg.metrics.interval = Duration::ZERO;
        assert!(cfg.validate().is_err());

        cfg.metrics.interval = Duration::from_secs(1);
        cfg.metrics.endpoint = "not an address".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_listen_addr_without_host_binds_everywhere() {
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.listen_addr().unwrap(), "0.0.0.0:16512".parse().unwrap());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("15").unwrap(), Duration::from_secs(15));
        assert_eq!(parse_duration("15s").unwrap(), Duration::from_secs(15));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(
            parse_duration("1h0m500ms").unwrap(),
            Duration::from_millis(3_600_500)
        );
        assert!(parse_duration("").is_err());
        assert!(parse_duration("5d").is_err());
        assert!(parse_duration("1m30").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration(&format!("{}h", u64::MAX)).is_err());
        assert!(parse_duration("99999999999999999999s").is_err());
    }

    #[test]
    fn test_safe_level() {
        assert_eq!(safe_level("DEBUG"), "debug");
        assert_eq!(safe_level("fatal"), "error");
        assert_eq!(safe_level("panic"), "error");
        assert_eq!(safe_level("verbose"), "info");
        let cfg = MonitorConfig::default();
        assert_eq!(cfg.log_filter(), "info,actix_web=info");
    }
}
