pub mod command_handler;
pub mod listener;
pub mod messages;
pub mod sender;

use crate::analyzer::AnalyzerImpl;
use crate::config::{AppConfig, TelegramConfig};
use crate::model::{NotifyError, PositionSignal, Recommendation, RecommendationLabel};
use crate::storage::SqliteStore;
use chrono::Duration;
use futures::future::join_all;
use reqwest::Client;
use std::sync::atomic::AtomicI64;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, Notify};
use tracing::{info, warn};

/// The same alert is not repeated within this window.
const ALERT_COOLDOWN_HOURS: i64 = 24;

pub struct TelegramNotifier {
    pub bot_token: String,
    pub chat_id: i64,
    pub client: Client,
    pub offset: Arc<AtomicI64>,
    pub storage: Arc<Mutex<SqliteStore>>,
    pub config: Arc<AppConfig>,
    pub analyzer: Arc<AnalyzerImpl>,
    pub start_time: Instant,
    pub refresh_notify: Arc<Notify>,
}

impl TelegramNotifier {
    pub fn new(
        telegram: &TelegramConfig,
        storage: Arc<Mutex<SqliteStore>>,
        config: Arc<AppConfig>,
        analyzer: Arc<AnalyzerImpl>,
        refresh_notify: Arc<Notify>,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::ApiError(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            bot_token: telegram.bot_token.clone(),
            chat_id: telegram.chat_id,
            client,
            offset: Arc::new(AtomicI64::new(0)),
            storage,
            config,
            analyzer,
            start_time: Instant::now(),
            refresh_notify,
        })
    }

    pub async fn notify_text(&self, text: &str) -> Result<(), NotifyError> {
        sender::send_text(self, text).await
    }

    pub async fn listen_for_commands(&self) {
        listener::listen_for_commands(self).await;
    }

    pub async fn set_my_commands(&self) -> Result<(), reqwest::Error> {
        let url = format!("https://api.telegram.org/bot{}/setMyCommands", self.bot_token);
        let commands = serde_json::json!({
            "commands": [
                { "command": "ping", "description": "Check connection" },
                { "command": "status", "description": "Tracker status" },
                { "command": "help", "description": "Command list" },
                { "command": "gainers", "description": "Top gainers" },
                { "command": "losers", "description": "Top losers" },
                { "command": "top", "description": "Buy recommendations" },
                { "command": "portfolio", "description": "Signals for held stocks" },
                { "command": "config", "description": "Current configuration" },
                { "command": "refresh", "description": "Run a cycle now" },
                { "command": "uptime", "description": "Service uptime" }
            ]
        });
        self.client.post(&url).json(&commands).send().await?.error_for_status()?;
        Ok(())
    }

    pub fn spawn_listener(notifier: Arc<TelegramNotifier>) {
        tokio::spawn(async move {
            tracing::info!("▶️ Starting Telegram listener...");
            notifier.listen_for_commands().await;
            tracing::info!("🛑 Telegram listener ended.");
        });
    }

    /// Sends bearish position signals and STRONG BUY recommendations that
    /// were not already sent within the cooldown.
    pub async fn dispatch_alerts(&self, positions: &[PositionSignal], recommendations: &[Recommendation]) {
        let candidates: Vec<(String, String)> = positions
            .iter()
            .filter(|p| p.signal.is_bearish())
            .map(|p| (format!("{}:{}", p.symbol, p.signal), messages::position_alert(p)))
            .chain(
                recommendations
                    .iter()
                    .filter(|r| r.label == RecommendationLabel::StrongBuy)
                    .map(|r| (format!("{}:{}", r.symbol, r.label), messages::recommendation_alert(r))),
            )
            .collect();

        let due: Vec<(String, String)> = {
            let storage = self.storage.lock().await;
            candidates
                .into_iter()
                .filter(|(key, _)| match storage.should_alert(key, Duration::hours(ALERT_COOLDOWN_HOURS)) {
                    Ok(flag) => flag,
                    Err(e) => {
                        warn!("❌ [alerts] Error checking alert status for {}: {:?}", key, e);
                        false
                    }
                })
                .collect()
        };

        if due.is_empty() {
            info!("[alerts] Nothing new to send.");
            return;
        }

        let results = join_all(due.iter().map(|(_, text)| self.notify_text(text))).await;

        let storage = self.storage.lock().await;
        for ((key, _), result) in due.iter().zip(results) {
            match result {
                Ok(()) => {
                    if let Err(e) = storage.mark_alerted(key) {
                        warn!("❌ [alerts] Mark alerted failed for {}: {:?}", key, e);
                    }
                }
                Err(e) => warn!("❌ [alerts] Sending {} failed: {:?}", key, e),
            }
        }
    }
}
