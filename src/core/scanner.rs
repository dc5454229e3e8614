//! Scan orchestrator: runs every symbol through the signal pipeline and
//! forwards fresh, confirmed, first-in-bucket signals to the notifier.
//!
//! fetch -> validate -> Heikin-Ashi -> WaveTrend -> crossover -> freshness
//!       -> stochastic RSI confirmation -> dedup -> notify

use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cache::DedupCache;
use crate::config::Config;
use crate::indicators::momentum::{calculate_wavetrend, WaveTrendParams};
use crate::indicators::{heikin_ashi, validate_candles, IndicatorError};
use crate::metrics::Metrics;
use crate::models::{
    Alert, CoinInfo, ConfirmationStatus, ScanResult, SignalCandidate, SignalKind, Timeframe,
};
use crate::services::{CandleBatch, CandleSource, DataSourceError, Notifier, NotifyError};
use crate::signals::{ConfirmationGate, FreshnessGate, SignalDetector, ZoneThresholds};

/// Per-symbol failures. Caught and counted by `run_scan`, never propagated.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("confirmation unavailable for {symbol}: {reason}")]
    ConfirmationUnavailable { symbol: String, reason: String },
}

/// Wall clock, injectable so freshness can be tested.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.write() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.write() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.read().map(|now| *now).unwrap_or_else(|_| Utc::now())
    }
}

#[derive(Debug, Clone)]
pub struct ScannerSettings {
    pub timeframe: Timeframe,
    pub candle_limit: usize,
    pub min_candles: usize,
    pub request_delay: Duration,
    pub freshness_window: chrono::Duration,
    pub wavetrend: WaveTrendParams,
    pub zones: ZoneThresholds,
    /// `None` disables the confirmation oscillator.
    pub confirmation: Option<ConfirmationGate>,
    pub confirmation_timeframe: Timeframe,
    pub retention: chrono::Duration,
    /// Hold alerts until the end of the pass and send them together.
    pub batch_alerts: bool,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ScannerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeframe: config.scan.timeframe,
            candle_limit: config.scan.candle_limit,
            min_candles: config.scan.min_candles,
            request_delay: config.scan.request_delay(),
            freshness_window: config.scan.freshness_window(),
            wavetrend: config.wavetrend.params(),
            zones: config.wavetrend.zones(),
            confirmation: config
                .confirmation
                .enabled
                .then(|| config.confirmation.gate()),
            confirmation_timeframe: config.confirmation_timeframe(),
            retention: config.dedup.retention(),
            batch_alerts: config.notifier.batch,
        }
    }
}

/// How one symbol's pass ended when nothing went wrong.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOutcome {
    NoSignal,
    Stale { kind: SignalKind },
    Unconfirmed { kind: SignalKind, value: f64 },
    Duplicate { kind: SignalKind },
    Alerted(Box<Alert>),
}

/// Result of the detection half of the pipeline.
enum Screened {
    Skipped(SymbolOutcome),
    Fresh {
        candidate: SignalCandidate,
        batch: CandleBatch,
    },
}

/// Result of confirmation and dedup for a fresh candidate.
enum Admission {
    Rejected(SymbolOutcome),
    Ready(Box<Alert>),
}

pub struct Scanner {
    settings: ScannerSettings,
    source: Arc<dyn CandleSource>,
    notifier: Arc<dyn Notifier>,
    dedup: DedupCache,
    detector: SignalDetector,
    freshness: FreshnessGate,
    clock: Arc<dyn Clock>,
    metrics: Option<Arc<Metrics>>,
}

impl Scanner {
    pub fn new(
        settings: ScannerSettings,
        source: Arc<dyn CandleSource>,
        notifier: Arc<dyn Notifier>,
        dedup: DedupCache,
    ) -> Self {
        let detector = SignalDetector::new(settings.zones);
        let freshness = FreshnessGate::new(settings.timeframe, settings.freshness_window);
        Self {
            settings,
            source,
            notifier,
            dedup,
            detector,
            freshness,
            clock: Arc::new(SystemClock),
            metrics: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn settings(&self) -> &ScannerSettings {
        &self.settings
    }

    pub fn dedup(&self) -> &DedupCache {
        &self.dedup
    }

    /// One pass over `coins`. A failing symbol is logged and counted in
    /// `errors` and the scan moves on. A fresh candidate counts in
    /// `signals_found` however its pass ends. With `batch_alerts` the
    /// admitted alerts go out in one delivery after the loop. Expired dedup
    /// records are purged at the end regardless of what happened.
    pub async fn run_scan(&self, coins: &[CoinInfo]) -> ScanResult {
        let started = Instant::now();
        let mut result = ScanResult::default();
        let mut pending: Vec<Alert> = Vec::new();

        info!(
            symbols = coins.len(),
            timeframe = %self.settings.timeframe,
            batch = self.settings.batch_alerts,
            "Scanner: starting scan of {} symbols on {}",
            coins.len(),
            self.settings.timeframe
        );

        for (i, coin) in coins.iter().enumerate() {
            if i > 0 && !self.settings.request_delay.is_zero() {
                tokio::time::sleep(self.settings.request_delay).await;
            }

            result.processed += 1;
            let outcome = match self.detect_symbol(coin).await {
                Ok(Screened::Skipped(outcome)) => Ok(outcome),
                Ok(Screened::Fresh { candidate, batch }) => {
                    result.signals_found += 1;
                    match self.admit(coin, candidate, &batch).await {
                        Ok(Admission::Rejected(outcome)) => Ok(outcome),
                        Ok(Admission::Ready(alert)) if self.settings.batch_alerts => {
                            // Delivered with the rest after the loop.
                            pending.push(*alert);
                            Ok(SymbolOutcome::NoSignal)
                        }
                        Ok(Admission::Ready(alert)) => self.deliver(alert).await,
                        Err(e) => Err(e),
                    }
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(SymbolOutcome::Alerted(alert)) => {
                    result.alerts_sent += 1;
                    self.record_sent(&alert);
                }
                Ok(_) => {}
                Err(e) => {
                    result.errors += 1;
                    self.record_error();
                    warn!(
                        symbol = %coin.ticker(),
                        error = %e,
                        "Scanner: skipping {} this pass",
                        coin.ticker()
                    );
                }
            }
        }

        if !pending.is_empty() {
            match self.notifier.notify_batch(&pending).await {
                Ok(()) => {
                    result.alerts_sent += pending.len();
                    for alert in &pending {
                        self.record_sent(alert);
                    }
                    info!(
                        alerts = pending.len(),
                        notifier = self.notifier.name(),
                        "Scanner: sent {} alerts in one batch",
                        pending.len()
                    );
                }
                Err(e) => {
                    result.errors += 1;
                    self.record_error();
                    error!(
                        alerts = pending.len(),
                        notifier = self.notifier.name(),
                        error = %e,
                        "Scanner: failed to deliver batch of {} alerts",
                        pending.len()
                    );
                }
            }
        }

        let now = self.clock.now();
        match self.dedup.cleanup_expired(self.settings.retention, now).await {
            Ok(removed) => debug!(removed, "Scanner: dedup cleanup finished"),
            Err(e) => warn!(error = %e, "Scanner: dedup cleanup failed"),
        }

        if let Some(ref metrics) = self.metrics {
            metrics.scans_total.inc();
            metrics
                .symbols_processed_total
                .inc_by(result.processed as u64);
            metrics
                .last_scan_duration_seconds
                .set(started.elapsed().as_secs_f64());
            metrics
                .last_scan_timestamp_seconds
                .set(now.timestamp() as f64);
        }

        info!(
            processed = result.processed,
            signals_found = result.signals_found,
            alerts_sent = result.alerts_sent,
            errors = result.errors,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scanner: scan complete - {} processed, {} signals, {} alerts, {} errors",
            result.processed,
            result.signals_found,
            result.alerts_sent,
            result.errors
        );
        result
    }

    /// Runs one symbol through the whole pipeline, delivering any alert on
    /// its own.
    pub async fn process_symbol(&self, coin: &CoinInfo) -> Result<SymbolOutcome, ScanError> {
        match self.detect_symbol(coin).await? {
            Screened::Skipped(outcome) => Ok(outcome),
            Screened::Fresh { candidate, batch } => {
                match self.admit(coin, candidate, &batch).await? {
                    Admission::Rejected(outcome) => Ok(outcome),
                    Admission::Ready(alert) => self.deliver(alert).await,
                }
            }
        }
    }

    /// Fetch, indicators, crossover and freshness.
    async fn detect_symbol(&self, coin: &CoinInfo) -> Result<Screened, ScanError> {
        let symbol = coin.ticker();
        let timeframe = self.settings.timeframe;

        let batch = self
            .source
            .fetch_candles(&symbol, timeframe, self.settings.candle_limit)
            .await?;
        debug!(
            symbol = %symbol,
            exchange = %batch.exchange,
            count = batch.candles.len(),
            "Scanner: fetched {} candles for {}",
            batch.candles.len(),
            symbol
        );

        let min_candles = self.settings.min_candles.max(self.settings.wavetrend.min_candles());
        IndicatorError::require(min_candles, batch.candles.len())?;
        validate_candles(&batch.candles)?;

        let smoothed = heikin_ashi(&batch.candles, min_candles)?;
        let wave = calculate_wavetrend(&smoothed, &self.settings.wavetrend)?;
        let Some(crossing) = self.detector.detect(&wave)? else {
            return Ok(Screened::Skipped(SymbolOutcome::NoSignal));
        };
        let Some(candle) = batch.candles.get(crossing.index) else {
            return Ok(Screened::Skipped(SymbolOutcome::NoSignal));
        };
        let candidate = SignalCandidate {
            symbol: symbol.clone(),
            kind: crossing.kind,
            wt1: crossing.wt1,
            wt2: crossing.wt2,
            candle_timestamp: candle.timestamp,
            timeframe,
            source_exchange: batch.exchange.clone(),
        };

        let now = self.clock.now();
        if !self.freshness.check(candidate.candle_timestamp, now) {
            debug!(
                symbol = %symbol,
                kind = %candidate.kind,
                candle = %candidate.candle_timestamp,
                bucket_age_secs = self.freshness.bucket_age(now).num_seconds(),
                window_secs = self.freshness.window().num_seconds(),
                "Scanner: {} {} is stale, dropping",
                candidate.kind,
                symbol
            );
            return Ok(Screened::Skipped(SymbolOutcome::Stale {
                kind: candidate.kind,
            }));
        }

        info!(
            symbol = %symbol,
            kind = %candidate.kind,
            wt1 = candidate.wt1,
            wt2 = candidate.wt2,
            "Scanner: {} signal on {}",
            candidate.kind,
            symbol
        );
        if let Some(ref metrics) = self.metrics {
            metrics
                .signals_found_total
                .with_label_values(&[candidate.kind.as_str()])
                .inc();
        }

        Ok(Screened::Fresh { candidate, batch })
    }

    /// Confirmation gate, then the dedup claim for the candle's bucket.
    async fn admit(
        &self,
        coin: &CoinInfo,
        candidate: SignalCandidate,
        batch: &CandleBatch,
    ) -> Result<Admission, ScanError> {
        let symbol = candidate.symbol.clone();
        let confirmation = self.confirm(&symbol, candidate.kind, batch).await;
        if let Some(gate) = &self.settings.confirmation {
            if !gate.admits(&confirmation) {
                return match confirmation {
                    ConfirmationStatus::Unconfirmed { value } => {
                        info!(
                            symbol = %symbol,
                            kind = %candidate.kind,
                            value,
                            "Scanner: {} {} not confirmed by stochastic RSI ({:.2})",
                            candidate.kind,
                            symbol,
                            value
                        );
                        Ok(Admission::Rejected(SymbolOutcome::Unconfirmed {
                            kind: candidate.kind,
                            value,
                        }))
                    }
                    ConfirmationStatus::Unavailable { reason } => {
                        Err(ScanError::ConfirmationUnavailable { symbol, reason })
                    }
                    _ => Ok(Admission::Rejected(SymbolOutcome::NoSignal)),
                };
            }
            if let ConfirmationStatus::Unavailable { reason } = &confirmation {
                warn!(
                    symbol = %symbol,
                    reason = %reason,
                    "Scanner: confirmation unavailable for {}, sending primary signal alone",
                    symbol
                );
            }
        }

        let now = self.clock.now();
        if !self
            .dedup
            .is_allowed(&symbol, candidate.kind, candidate.candle_timestamp, now)
            .await
        {
            return Ok(Admission::Rejected(SymbolOutcome::Duplicate {
                kind: candidate.kind,
            }));
        }

        Ok(Admission::Ready(Box::new(Alert {
            candidate,
            coin: coin.clone(),
            confirmation,
            detected_at: now,
        })))
    }

    async fn deliver(&self, alert: Box<Alert>) -> Result<SymbolOutcome, ScanError> {
        let symbol = &alert.candidate.symbol;
        if let Err(e) = self.notifier.notify(&alert).await {
            error!(
                symbol = %symbol,
                kind = %alert.candidate.kind,
                notifier = self.notifier.name(),
                error = %e,
                "Scanner: failed to deliver {} alert for {}",
                alert.candidate.kind,
                symbol
            );
            return Err(e.into());
        }

        info!(
            symbol = %symbol,
            kind = %alert.candidate.kind,
            notifier = self.notifier.name(),
            confirmation = alert.confirmation.label(),
            "Scanner: alert sent for {} {}",
            alert.candidate.kind,
            symbol
        );
        Ok(SymbolOutcome::Alerted(alert))
    }

    fn record_sent(&self, alert: &Alert) {
        if let Some(ref metrics) = self.metrics {
            metrics
                .alerts_sent_total
                .with_label_values(&[alert.candidate.kind.as_str()])
                .inc();
        }
    }

    fn record_error(&self) {
        if let Some(ref metrics) = self.metrics {
            metrics.scan_errors_total.inc();
        }
    }

    /// Stochastic RSI status for `kind`. Reuses `primary` when the
    /// confirmation timeframe matches the scan timeframe.
    async fn confirm(
        &self,
        symbol: &str,
        kind: SignalKind,
        primary: &CandleBatch,
    ) -> ConfirmationStatus {
        let Some(gate) = &self.settings.confirmation else {
            return ConfirmationStatus::Disabled;
        };

        let closes = if self.settings.confirmation_timeframe == self.settings.timeframe {
            primary.closes()
        } else {
            let limit = self
                .settings
                .candle_limit
                .max(gate.params.min_closes() + 1);
            match self
                .source
                .fetch_candles(symbol, self.settings.confirmation_timeframe, limit)
                .await
            {
                Ok(batch) => batch.closes(),
                Err(e) => {
                    return ConfirmationStatus::Unavailable {
                        reason: e.to_string(),
                    }
                }
            }
        };

        let status = gate.evaluate(kind, &closes);
        debug!(
            symbol = %symbol,
            kind = %kind,
            status = status.label(),
            value = ?status.value(),
            "Scanner: confirmation evaluated"
        );
        status
    }
}
