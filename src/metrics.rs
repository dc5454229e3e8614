//! Prometheus counters for scan runs.

use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub scans_total: IntCounter,
    pub symbols_processed_total: IntCounter,
    pub signals_found_total: IntCounterVec,
    pub alerts_sent_total: IntCounterVec,
    pub scan_errors_total: IntCounter,
    pub dedup_store_failures_total: IntCounter,
    pub last_scan_duration_seconds: Gauge,
    pub last_scan_timestamp_seconds: Gauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let scans_total = IntCounter::new("wavewatch_scans_total", "Completed scan passes")?;
        let symbols_processed_total = IntCounter::new(
            "wavewatch_symbols_processed_total",
            "Symbols attempted across all scans",
        )?;
        let signals_found_total = IntCounterVec::new(
            Opts::new(
                "wavewatch_signals_found_total",
                "Fresh WaveTrend signals that reached confirmation",
            ),
            &["kind"],
        )?;
        let alerts_sent_total = IntCounterVec::new(
            Opts::new("wavewatch_alerts_sent_total", "Alerts delivered"),
            &["kind"],
        )?;
        let scan_errors_total =
            IntCounter::new("wavewatch_scan_errors_total", "Per-symbol scan failures")?;
        let dedup_store_failures_total = IntCounter::new(
            "wavewatch_dedup_store_failures_total",
            "Dedup store errors that denied an alert",
        )?;
        let last_scan_duration_seconds = Gauge::new(
            "wavewatch_last_scan_duration_seconds",
            "Wall time of the most recent scan",
        )?;
        let last_scan_timestamp_seconds = Gauge::new(
            "wavewatch_last_scan_timestamp_seconds",
            "Unix time the most recent scan finished",
        )?;

        registry.register(Box::new(scans_total.clone()))?;
        registry.register(Box::new(symbols_processed_total.clone()))?;
        registry.register(Box::new(signals_found_total.clone()))?;
        registry.register(Box::new(alerts_sent_total.clone()))?;
        registry.register(Box::new(scan_errors_total.clone()))?;
        registry.register(Box::new(dedup_store_failures_total.clone()))?;
        registry.register(Box::new(last_scan_duration_seconds.clone()))?;
        registry.register(Box::new(last_scan_timestamp_seconds.clone()))?;

        Ok(Self {
            registry,
            scans_total,
            symbols_processed_total,
            signals_found_total,
            alerts_sent_total,
            scan_errors_total,
            dedup_store_failures_total,
            last_scan_duration_seconds,
            last_scan_timestamp_seconds,
        })
    }

    /// Text exposition format of every registered metric.
    pub fn export(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
