// notifier/telegram/messages.rs

use crate::model::{InstrumentQuote, PositionSignal, Recommendation};

pub const HELP: &str = "📋 Available commands:\n\
    /ping - check connection\n\
    /status - tracker status\n\
    /help - command list\n\
    /gainers - top gainers of the last capture\n\
    /losers - top losers of the last capture\n\
    /top - buy recommendations\n\
    /portfolio - signals for held stocks\n\
    /config - current configuration\n\
    /refresh - run a cycle now\n\
    /uptime - service uptime";

pub fn position_alert(signal: &PositionSignal) -> String {
    format!(
        "🚨 {}: {}\n📉 Net: {:+.2}% | Recent avg: {:+.2}%/session\n🔻 Consecutive declines: {}\n📝 {}",
        signal.symbol,
        signal.signal,
        signal.net_change_pct,
        signal.recent_avg_pct,
        signal.consecutive_down,
        signal.reason
    )
}

pub fn recommendation_alert(rec: &Recommendation) -> String {
    format!(
        "💹 {}: {}\n⭐ Score: {:.2}\n💰 Close: ₦{:.2} ({:+.2}%)",
        rec.symbol, rec.label, rec.score, rec.close, rec.pct_change
    )
}

pub fn movers(title: &str, quotes: &[InstrumentQuote]) -> String {
    if quotes.is_empty() {
        return format!("{}\n📭 Nothing to show.", title);
    }
    let mut msg = format!("{}\n", title);
    for (i, q) in quotes.iter().enumerate() {
        msg.push_str(&format!("{}. {} - ₦{:.2} ({:+.2}%)\n", i + 1, q.symbol, q.close, q.pct_change));
    }
    msg
}

pub fn recommendations(recs: &[Recommendation]) -> String {
    if recs.is_empty() {
        return "📭 No recommendations yet.".to_string();
    }
    let mut msg = String::from("🏆 Recommendations:\n");
    for (i, r) in recs.iter().enumerate() {
        msg.push_str(&format!("{}. {} - {} ({:.2})\n", i + 1, r.symbol, r.label, r.score));
    }
    msg
}

pub fn positions(signals: &[PositionSignal], missing: &[String]) -> String {
    let mut msg = String::from("💼 Portfolio:\n");
    for s in signals {
        msg.push_str(&format!("🔸 {} [{}] {}\n", s.symbol, s.signal, s.reason));
    }
    if !missing.is_empty() {
        msg.push_str(&format!("❔ Not found: {}\n", missing.join(", ")));
    }
    msg
}
