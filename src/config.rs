//! Typed configuration loaded from TOML, with secrets from the environment.

use cron::Schedule;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::indicators::momentum::{StochRsiParams, WaveTrendParams};
use crate::models::Timeframe;
use crate::services::exchanges::binance::DEFAULT_BINANCE_URL;
use crate::services::exchanges::kucoin::DEFAULT_KUCOIN_URL;
use crate::services::notifier::telegram::DEFAULT_TELEGRAM_URL;
use crate::services::UniverseFilter;
use crate::signals::{ConfirmationGate, ConfirmationLine, UnavailablePolicy, ZoneThresholds};

pub const DEFAULT_CONFIG_PATH: &str = "wavewatch.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
}

/// Deployment environment from `APP_ENV` (default `sandbox`).
pub fn get_environment() -> String {
    env::var("APP_ENV").unwrap_or_else(|_| "sandbox".to_string())
}

pub fn is_production() -> bool {
    matches!(get_environment().as_str(), "production" | "prod")
}

pub fn get_redis_url() -> String {
    env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

/// Path of the TOML file from `WAVEWATCH_CONFIG`.
pub fn get_config_path() -> PathBuf {
    env::var("WAVEWATCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanSettings,
    pub wavetrend: WaveTrendSettings,
    pub confirmation: ConfirmationSettings,
    pub dedup: DedupSettings,
    pub exchanges: ExchangeSettings,
    pub universe: UniverseFilter,
    pub notifier: NotifierSettings,
    pub schedule: ScheduleSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub timeframe: Timeframe,
    /// Candles requested per symbol.
    pub candle_limit: usize,
    /// Fewer candles than this skips the symbol as insufficient.
    pub min_candles: usize,
    pub request_delay_ms: u64,
    pub freshness_window_secs: u64,
    pub universe_path: PathBuf,
    pub max_symbols: Option<usize>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::H2,
            candle_limit: 200,
            min_candles: 50,
            request_delay_ms: 250,
            freshness_window_secs: 15 * 60,
            universe_path: PathBuf::from("cache/market_data.json"),
            max_symbols: None,
        }
    }
}

impl ScanSettings {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn freshness_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.freshness_window_secs as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTrendSettings {
    pub channel_len: usize,
    pub average_len: usize,
    pub ma_len: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for WaveTrendSettings {
    fn default() -> Self {
        let params = WaveTrendParams::default();
        let zones = ZoneThresholds::default();
        Self {
            channel_len: params.channel_len,
            average_len: params.average_len,
            ma_len: params.ma_len,
            oversold: zones.oversold,
            overbought: zones.overbought,
        }
    }
}

impl WaveTrendSettings {
    pub fn params(&self) -> WaveTrendParams {
        WaveTrendParams {
            channel_len: self.channel_len,
            average_len: self.average_len,
            ma_len: self.ma_len,
        }
    }

    pub fn zones(&self) -> ZoneThresholds {
        ZoneThresholds {
            oversold: self.oversold,
            overbought: self.overbought,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationSettings {
    pub enabled: bool,
    /// Defaults to the scan timeframe.
    pub timeframe: Option<Timeframe>,
    pub rsi_period: usize,
    pub stoch_period: usize,
    pub k_smooth: usize,
    pub d_smooth: usize,
    pub line: ConfirmationLine,
    pub oversold: f64,
    pub overbought: f64,
    pub on_unavailable: UnavailablePolicy,
}

impl Default for ConfirmationSettings {
    fn default() -> Self {
        let gate = ConfirmationGate::default();
        Self {
            enabled: true,
            timeframe: None,
            rsi_period: gate.params.rsi_period,
            stoch_period: gate.params.stoch_period,
            k_smooth: gate.params.k_smooth,
            d_smooth: gate.params.d_smooth,
            line: gate.line,
            oversold: gate.oversold,
            overbought: gate.overbought,
            on_unavailable: gate.on_unavailable,
        }
    }
}

impl ConfirmationSettings {
    pub fn gate(&self) -> ConfirmationGate {
        ConfirmationGate {
            params: StochRsiParams {
                rsi_period: self.rsi_period,
                stoch_period: self.stoch_period,
                k_smooth: self.k_smooth,
                d_smooth: self.d_smooth,
            },
            line: self.line,
            oversold: self.oversold,
            overbought: self.overbought,
            on_unavailable: self.on_unavailable,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupBackend {
    #[default]
    File,
    Redis,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupSettings {
    pub backend: DedupBackend,
    pub path: PathBuf,
    pub retention_secs: u64,
    pub key_prefix: String,
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            backend: DedupBackend::File,
            path: PathBuf::from("cache/alert_cache.json"),
            retention_secs: 7 * 24 * 3_600,
            key_prefix: "wavewatch:alert:".to_string(),
        }
    }
}

impl DedupSettings {
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.retention_secs as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeSettings {
    pub order: Vec<String>,
    pub binance_url: String,
    pub kucoin_url: String,
    pub timeout_secs: u64,
    pub retries: usize,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            order: vec!["binance".to_string(), "kucoin".to_string()],
            binance_url: DEFAULT_BINANCE_URL.to_string(),
            kucoin_url: DEFAULT_KUCOIN_URL.to_string(),
            timeout_secs: 15,
            retries: 3,
        }
    }
}

impl ExchangeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Telegram,
    Log,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierSettings {
    pub kind: NotifierKind,
    pub telegram_url: String,
    pub timeout_secs: u64,
    /// Collect the alerts of a pass and send them as one message.
    pub batch: bool,
}

impl Default for NotifierSettings {
    fn default() -> Self {
        Self {
            kind: NotifierKind::Telegram,
            telegram_url: DEFAULT_TELEGRAM_URL.to_string(),
            timeout_secs: 10,
            batch: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Six-field cron expression (with seconds). Unset runs a single scan.
    pub cron: Option<String>,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml(&raw)
    }

    /// Parse and validate.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn confirmation_timeframe(&self) -> Timeframe {
        self.confirmation.timeframe.unwrap_or(self.scan.timeframe)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let wt = &self.wavetrend;
        if wt.channel_len == 0 || wt.average_len == 0 || wt.ma_len == 0 {
            return invalid("wavetrend periods must be positive");
        }
        if !(wt.oversold < 0.0 && wt.overbought > 0.0) {
            return invalid("wavetrend oversold must be negative and overbought positive");
        }

        let scan = &self.scan;
        let required = wt.params().warmup() + 2;
        if scan.min_candles < required {
            return Err(ConfigError::Validation(format!(
                "scan.min_candles must be at least {} for the configured wavetrend periods",
                required
            )));
        }
        if scan.candle_limit < scan.min_candles {
            return invalid("scan.candle_limit must be >= scan.min_candles");
        }
        if scan.freshness_window_secs as i64 > scan.timeframe.seconds() {
            return invalid("scan.freshness_window_secs cannot exceed the timeframe width");
        }

        let conf = &self.confirmation;
        if conf.enabled {
            if conf.rsi_period == 0
                || conf.stoch_period == 0
                || conf.k_smooth == 0
                || conf.d_smooth == 0
            {
                return invalid("confirmation periods must be positive");
            }
            let in_range = |v: f64| (0.0..=100.0).contains(&v);
            if !in_range(conf.oversold) || !in_range(conf.overbought) {
                return invalid("confirmation thresholds must lie within [0, 100]");
            }
            if conf.oversold >= conf.overbought {
                return invalid("confirmation.oversold must be below confirmation.overbought");
            }
        }

        if self.dedup.retention_secs == 0 {
            return invalid("dedup.retention_secs must be positive");
        }
        if self.dedup.backend == DedupBackend::Redis && self.dedup.key_prefix.is_empty() {
            return invalid("dedup.key_prefix must not be empty for the redis backend");
        }

        if self.exchanges.order.is_empty() {
            return invalid("exchanges.order must name at least one exchange");
        }
        for name in &self.exchanges.order {
            if !matches!(name.as_str(), "binance" | "kucoin") {
                return Err(ConfigError::Validation(format!("unknown exchange '{}'", name)));
            }
        }

        if let Some(expr) = &self.schedule.cron {
            Schedule::from_str(expr).map_err(|e| {
                ConfigError::Validation(format!("invalid cron expression '{}': {}", expr, e))
            })?;
        }

        Ok(())
    }
}

fn invalid<T>(message: &str) -> Result<T, ConfigError> {
    Err(ConfigError::Validation(message.to_string()))
}

/// Telegram credentials from `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`.
pub fn telegram_credentials() -> Result<(String, String), ConfigError> {
    let token =
        env::var("TELEGRAM_BOT_TOKEN").map_err(|_| ConfigError::MissingEnv("TELEGRAM_BOT_TOKEN"))?;
    let chat_id =
        env::var("TELEGRAM_CHAT_ID").map_err(|_| ConfigError::MissingEnv("TELEGRAM_CHAT_ID"))?;
    Ok((token, chat_id))
}
