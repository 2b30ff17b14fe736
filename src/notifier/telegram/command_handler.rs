// notifier/telegram/command_handler.rs

use crate::analyzer::position::resolve_holdings;
use crate::analyzer::Analyzer;
use crate::notifier::telegram::messages;
use crate::notifier::telegram::TelegramNotifier;
use crate::storage::SnapshotStore;
use tracing::{info, warn};

/// `/top@SomeBot extra` -> `/top`
fn command_name(text: &str) -> &str {
    let first = text.split_whitespace().next().unwrap_or("");
    first.split('@').next().unwrap_or(first)
}

/// Builds the reply for a command from the current contents of the store.
async fn build_reply(command: &str, notifier: &TelegramNotifier) -> String {
    let cfg = &notifier.config;
    match command {
        "/ping" => "✅ I am online!".to_string(),
        "/help" => messages::HELP.to_string(),
        "/refresh" => {
            info!("/refresh command received, triggering refresh...");
            notifier.refresh_notify.notify_one();
            "🔄 Refresh initiated.".to_string()
        }
        "/uptime" => {
            let uptime = notifier.start_time.elapsed();
            format!(
                "⏱ Uptime: {:02}:{:02}:{:02}",
                uptime.as_secs() / 3600,
                (uptime.as_secs() % 3600) / 60,
                uptime.as_secs() % 60
            )
        }
        "/config" => {
            let mut msg = format!(
                "⚙️ Interval: {}s | history: {} snapshots | retention: {}\n",
                cfg.check_interval_seconds, cfg.history_window, cfg.retention_limit
            );
            if cfg.portfolio.is_empty() {
                msg.push_str("⚠️ No holdings configured.");
            } else {
                for h in &cfg.portfolio {
                    match &h.symbol {
                        Some(symbol) => msg.push_str(&format!("🔸 {} [{}]\n", h.name, symbol)),
                        None => msg.push_str(&format!("🔸 {} [prefix match]\n", h.name)),
                    }
                }
            }
            msg
        }
        "/status" => {
            let (count, latest) = {
                let storage = notifier.storage.lock().await;
                if storage.is_empty() {
                    return "📭 No snapshots captured yet.".to_string();
                }
                (storage.len(), storage.latest())
            };
            match latest {
                Some(snap) => format!(
                    "📊 {} snapshot(s) stored. Last capture: {} ({} stocks).",
                    count,
                    snap.captured_at.format("%Y-%m-%d %H:%M UTC"),
                    snap.quotes.len()
                ),
                None => "📭 No snapshots captured yet.".to_string(),
            }
        }
        "/gainers" | "/losers" | "/top" | "/portfolio" => {
            let snapshots = notifier.storage.lock().await.recent(cfg.history_window);
            let Some(current) = snapshots.last().map(|s| s.quotes.clone()) else {
                return "📭 No snapshots captured yet.".to_string();
            };
            let analyzer = &notifier.analyzer;
            match command {
                "/gainers" => messages::movers("📈 Top gainers:", &analyzer.top_gainers(&current, cfg.movers_count)),
                "/losers" => messages::movers("📉 Top losers:", &analyzer.top_losers(&current, cfg.movers_count)),
                "/top" => messages::recommendations(&analyzer.recommend(&current, &snapshots, cfg.recommendation_count)),
                _ => {
                    let resolved = resolve_holdings(&current, &cfg.portfolio);
                    let signals: Vec<_> = resolved
                        .matched
                        .iter()
                        .map(|(holding, quote)| analyzer.evaluate(holding, quote, &snapshots))
                        .collect();
                    messages::positions(&signals, &resolved.missing)
                }
            }
        }
        _ => "🤖 Unknown command. Type /help for a list of commands.".to_string(),
    }
}

/// Handles an incoming command and replies in the configured chat.
pub async fn handle_command(command_text: &str, notifier: &TelegramNotifier) {
    info!("Handling command: {}", command_text);
    let command = command_name(command_text);
    let reply = build_reply(command, notifier).await;
    if let Err(e) = notifier.notify_text(&reply).await {
        warn!("{} reply error: {:?}", command, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bot_mention_and_arguments() {
        assert_eq!(command_name("/top@NgxBot"), "/top");
        assert_eq!(command_name("  /portfolio now"), "/portfolio");
        assert_eq!(command_name(""), "");
    }
}
