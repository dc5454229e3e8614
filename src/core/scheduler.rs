//! Cron-based scheduler that runs a scan on every tick

use chrono::{DateTime, Utc};
use cron::Schedule;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid cron expression '{expr}': {reason}")]
    InvalidCron { expr: String, reason: String },

    #[error("scheduler is already running")]
    AlreadyRunning,
}

pub struct ScanScheduler {
    expr: String,
    schedule: Schedule,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl ScanScheduler {
    /// `expr` uses the six-field cron form with seconds, e.g. `0 1 */2 * * *`.
    pub fn new(expr: &str) -> Result<Self, SchedulerError> {
        let schedule = Schedule::from_str(expr).map_err(|e| SchedulerError::InvalidCron {
            expr: expr.to_string(),
            reason: e.to_string(),
        })?;

        info!(cron = %expr, "ScanScheduler: created with cron '{}'", expr);

        Ok(Self {
            expr: expr.to_string(),
            schedule,
            handle: Arc::new(RwLock::new(None)),
        })
    }

    pub fn expression(&self) -> &str {
        &self.expr
    }

    /// Next tick strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }

    /// Spawn the loop. `task` runs to completion on each tick; a tick that
    /// passes while a scan is still running is skipped.
    pub async fn start<F, Fut>(&self, task: F) -> Result<(), SchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut guard = self.handle.write().await;
        if guard.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }

        let schedule = self.schedule.clone();
        let handle = tokio::spawn(async move {
            info!("ScanScheduler: started, waiting for cron schedule...");

            loop {
                let Some(next_tick) = schedule.upcoming(Utc).next() else {
                    info!("ScanScheduler: schedule has no further ticks, stopping");
                    break;
                };
                let now = Utc::now();
                if next_tick > now {
                    let wait = (next_tick - now).to_std().unwrap_or_default();
                    debug!(next_tick = %next_tick, "ScanScheduler: sleeping until next tick");
                    tokio::time::sleep(wait).await;
                }

                info!(tick = %next_tick, "ScanScheduler: cron tick, running scan");
                task().await;
            }
        });

        *guard = Some(handle);
        info!("ScanScheduler: started successfully");
        Ok(())
    }

    pub async fn stop(&self) {
        let mut handle = self.handle.write().await;
        if let Some(h) = handle.take() {
            h.abort();
            info!("ScanScheduler: stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        let handle = self.handle.read().await;
        handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}
