//! Telegram Bot API `sendMessage` with HTML formatting.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{Notifier, NotifyError};
use crate::models::{Alert, ConfirmationStatus, SignalKind};

pub const DEFAULT_TELEGRAM_URL: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

pub struct TelegramNotifier {
    client: reqwest::Client,
    base_url: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let token = token.into();
        let chat_id = chat_id.into();
        if token.trim().is_empty() || chat_id.trim().is_empty() {
            warn!("TelegramNotifier: missing bot token or chat id");
            return Err(NotifyError::NotConfigured(
                "TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID are required".to_string(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            chat_id,
        })
    }

    pub async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);
        let payload = SendMessagePayload {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };

        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error body".to_string());
            return Err(NotifyError::Api {
                status: status.as_u16(),
                body,
            });
        }
        debug!(chat_id = %self.chat_id, "TelegramNotifier: message delivered");
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        self.send_message(&render_alert(alert)).await
    }

    async fn notify_batch(&self, alerts: &[Alert]) -> Result<(), NotifyError> {
        if alerts.is_empty() {
            return Ok(());
        }
        self.send_message(&render_alerts(alerts)).await
    }
}

/// HTML body of an alert message.
pub fn render_alert(alert: &Alert) -> String {
    let candidate = &alert.candidate;
    let coin = &alert.coin;
    let symbol = escape_html(&candidate.symbol.to_uppercase());
    let (icon, zone) = match candidate.kind {
        SignalKind::Buy => ("🟢", "oversold"),
        SignalKind::Sell => ("🔴", "overbought"),
    };

    let mut lines = vec![
        format!(
            "{} <b>{} {}</b> · {}",
            icon,
            candidate.kind,
            symbol,
            escape_html(candidate.timeframe.as_str())
        ),
        format!(
            "WaveTrend {}: wt1 <code>{:.2}</code> / wt2 <code>{:.2}</code>",
            zone, candidate.wt1, candidate.wt2
        ),
        format!("Stoch RSI: {}", describe_confirmation(&alert.confirmation)),
    ];

    if coin.current_price > 0.0 {
        lines.push(format!("Price: <code>{}</code>", format_price(coin.current_price)));
    }
    if let Some(change) = coin.price_change_percentage_24h {
        lines.push(format!("24h: {:+.2}%", change));
    }
    if coin.market_cap > 0.0 {
        lines.push(format!("Market cap: {}", format_usd(coin.market_cap)));
    }
    lines.push(format!(
        "Candle: {} UTC · {}",
        candidate.candle_timestamp.format("%Y-%m-%d %H:%M"),
        escape_html(&candidate.source_exchange)
    ));
    lines.push(format!(
        "<a href=\"https://www.tradingview.com/chart/?symbol={}:{}USDT\">Chart</a>",
        escape_html(&candidate.source_exchange.to_uppercase()),
        symbol
    ));

    lines.join("\n")
}

/// HTML body of one consolidated message for a whole scan pass: BUY and
/// SELL sections, then a confirmation summary.
pub fn render_alerts(alerts: &[Alert]) -> String {
    let mut lines = vec![format!("🎯 <b>{} SIGNALS</b>", alerts.len())];

    for kind in [SignalKind::Buy, SignalKind::Sell] {
        let group: Vec<&Alert> = alerts
            .iter()
            .filter(|a| a.candidate.kind == kind)
            .collect();
        if group.is_empty() {
            continue;
        }
        let icon = match kind {
            SignalKind::Buy => "🟢",
            SignalKind::Sell => "🔴",
        };
        lines.push(String::new());
        lines.push(format!("{} <b>{} SIGNALS</b>", icon, kind));
        for (i, alert) in group.iter().enumerate() {
            lines.push(render_batch_entry(i + 1, alert));
        }
    }

    let count = |kind: SignalKind| alerts.iter().filter(|a| a.candidate.kind == kind).count();
    let confirmed = alerts
        .iter()
        .filter(|a| matches!(a.confirmation, ConfirmationStatus::Confirmed { .. }))
        .count();
    let fallback = alerts
        .iter()
        .filter(|a| matches!(a.confirmation, ConfirmationStatus::Unavailable { .. }))
        .count();

    lines.push(String::new());
    lines.push(format!(
        "Total: {} · Buy: {} · Sell: {}",
        alerts.len(),
        count(SignalKind::Buy),
        count(SignalKind::Sell)
    ));
    lines.push(format!("Stoch RSI confirmed: {}", confirmed));
    lines.push(format!("Sent without confirmation: {}", fallback));

    lines.join("\n")
}

fn render_batch_entry(position: usize, alert: &Alert) -> String {
    let candidate = &alert.candidate;
    let coin = &alert.coin;
    let symbol = escape_html(&candidate.symbol.to_uppercase());
    let age = (alert.detected_at - candidate.candle_timestamp)
        .num_seconds()
        .max(0);

    let mut head = format!("{}. <b>{}</b>", position, symbol);
    if coin.current_price > 0.0 {
        head.push_str(&format!(" · <code>{}</code>", format_price(coin.current_price)));
    }
    if let Some(change) = coin.price_change_percentage_24h {
        head.push_str(&format!(" · {:+.1}%", change));
    }

    format!(
        "{}\n   WT <code>{:.1}</code>/<code>{:.1}</code> · Stoch RSI: {}\n   {} · {}s after open",
        head,
        candidate.wt1,
        candidate.wt2,
        describe_confirmation(&alert.confirmation),
        escape_html(&candidate.source_exchange),
        age
    )
}

fn describe_confirmation(status: &ConfirmationStatus) -> String {
    match status {
        ConfirmationStatus::Disabled => "not used".to_string(),
        ConfirmationStatus::Confirmed { value } => format!("{:.0} ✅", value),
        ConfirmationStatus::Unconfirmed { value } => format!("{:.0} ⚠️", value),
        ConfirmationStatus::Unavailable { .. } => "unavailable ⚠️".to_string(),
    }
}

fn format_usd(amount: f64) -> String {
    if amount >= 1_000_000_000.0 {
        format!("${:.1}B", amount / 1_000_000_000.0)
    } else if amount >= 1_000_000.0 {
        format!("${:.0}M", amount / 1_000_000.0)
    } else if amount >= 1_000.0 {
        format!("${:.1}K", amount / 1_000.0)
    } else {
        format!("${:.2}", amount)
    }
}

fn format_price(price: f64) -> String {
    if price >= 1.0 {
        format!("${:.4}", price)
    } else {
        format!("${:.8}", price)
    }
}

/// Escapes the three characters Telegram's HTML mode treats as markup.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
