//! Wavewatch scanner
//!
//! Loads the coin universe, scans it once, or on every cron tick when
//! `[schedule] cron` is set, and exits non-zero only on fatal errors.

use dotenvy::dotenv;
use std::env;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use wavewatch::cache::{DedupCache, JsonFileStore, KeyValueStore, MemoryStore, RedisStore};
use wavewatch::config::{self, Config, DedupBackend, NotifierKind};
use wavewatch::core::{ScanScheduler, Scanner, ScannerSettings};
use wavewatch::logging;
use wavewatch::metrics::Metrics;
use wavewatch::models::CoinInfo;
use wavewatch::services::exchanges::{
    BinanceClient, ExchangeCandleSource, ExchangeClient, KucoinClient, RetryPolicy,
};
use wavewatch::services::notifier::{LogNotifier, TelegramNotifier};
use wavewatch::services::{CandleSource, CoinUniverse, Notifier};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenv().ok();
    logging::init_logging();

    let env = config::get_environment();
    info!("Starting Wavewatch scanner");
    info!(environment = %env, "Environment");

    let config_path = config::get_config_path();
    let config = match Config::load(&config_path).await {
        Ok(config) => config,
        Err(config::ConfigError::Read { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            warn!(path = %config_path.display(), "Config file not found, using defaults");
            Config::default()
        }
        Err(e) => return Err(e.into()),
    };
    info!(
        timeframe = %config.scan.timeframe,
        confirmation = config.confirmation.enabled,
        "Configuration loaded from {}",
        config_path.display()
    );

    let metrics = Arc::new(Metrics::new()?);
    let store = open_store(&config).await?;
    let dedup = DedupCache::new(store, config.scan.timeframe).with_metrics(metrics.clone());
    let source = build_source(&config)?;
    let notifier = build_notifier(&config)?;

    let scanner = Arc::new(
        Scanner::new(ScannerSettings::from_config(&config), source, notifier, dedup)
            .with_metrics(metrics.clone()),
    );
    let config = Arc::new(config);

    let Some(expr) = config.schedule.cron.clone() else {
        run_once(&scanner, &config, &metrics).await?;
        return Ok(());
    };

    let scheduler = ScanScheduler::new(&expr)?;
    let (tick_scanner, tick_config, tick_metrics) =
        (scanner.clone(), config.clone(), metrics.clone());
    scheduler
        .start(move || {
            let scanner = tick_scanner.clone();
            let config = tick_config.clone();
            let metrics = tick_metrics.clone();
            async move {
                if let Err(e) = run_once(&scanner, &config, &metrics).await {
                    error!(error = %e, "Scheduled scan failed");
                }
            }
        })
        .await?;

    info!("Scanner scheduled, waiting for shutdown signal...");
    signal::ctrl_c().await?;
    info!("Shutting down scanner...");
    scheduler.stop().await;
    info!("Scanner stopped");
    Ok(())
}

async fn run_once(scanner: &Scanner, config: &Config, metrics: &Metrics) -> Result<(), BoxError> {
    let coins = load_coins(config).await?;
    scanner.run_scan(&coins).await;
    write_metrics(metrics).await;
    Ok(())
}

/// The universe is reloaded each pass so a refreshed snapshot is picked up.
async fn load_coins(config: &Config) -> Result<Vec<CoinInfo>, BoxError> {
    let universe = CoinUniverse::load(&config.scan.universe_path).await?;
    let (mut coins, _) = config.universe.apply(&universe.coins);
    if let Some(max) = config.scan.max_symbols {
        coins.truncate(max);
    }
    Ok(coins)
}

async fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>, BoxError> {
    let store: Arc<dyn KeyValueStore> = match config.dedup.backend {
        DedupBackend::File => {
            let store = JsonFileStore::open(&config.dedup.path).await?;
            info!(path = %store.path().display(), "Dedup file store ready");
            Arc::new(store)
        }
        DedupBackend::Redis => {
            info!("Initializing Redis connection...");
            let ttl = std::time::Duration::from_secs(config.dedup.retention_secs);
            Arc::new(
                RedisStore::connect(&config::get_redis_url(), config.dedup.key_prefix.clone(), ttl)
                    .await?,
            )
        }
        DedupBackend::Memory => {
            warn!("Using in-memory dedup store: alerts may repeat after a restart");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}

fn build_source(config: &Config) -> Result<Arc<dyn CandleSource>, BoxError> {
    let settings = &config.exchanges;
    let mut clients: Vec<Arc<dyn ExchangeClient>> = Vec::new();
    for name in &settings.order {
        match name.as_str() {
            "binance" => clients.push(Arc::new(BinanceClient::new(
                settings.binance_url.clone(),
                settings.timeout(),
            )?)),
            "kucoin" => clients.push(Arc::new(KucoinClient::new(
                settings.kucoin_url.clone(),
                settings.timeout(),
            )?)),
            other => return Err(format!("unknown exchange '{}'", other).into()),
        }
    }
    let retry = RetryPolicy {
        max_retries: settings.retries,
        ..RetryPolicy::default()
    };
    Ok(Arc::new(ExchangeCandleSource::new(clients, retry)))
}

fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>, BoxError> {
    match config.notifier.kind {
        NotifierKind::Log => Ok(Arc::new(LogNotifier)),
        NotifierKind::Telegram => {
            let (token, chat_id) = config::telegram_credentials()?;
            Ok(Arc::new(TelegramNotifier::new(
                config.notifier.telegram_url.clone(),
                token,
                chat_id,
                std::time::Duration::from_secs(config.notifier.timeout_secs),
            )?))
        }
    }
}

/// Prometheus text file for node-exporter's textfile collector.
async fn write_metrics(metrics: &Metrics) {
    let Ok(path) = env::var("METRICS_TEXTFILE") else {
        return;
    };
    match metrics.export() {
        Ok(text) => {
            if let Err(e) = tokio::fs::write(&path, text).await {
                warn!(path = %path, error = %e, "Failed to write metrics file");
            }
        }
        Err(e) => warn!(error = %e, "Failed to export metrics"),
    }
}
