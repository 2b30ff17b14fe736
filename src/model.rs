// Core structs: InstrumentQuote, MarketSnapshot, Recommendation, PositionSignal
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One company's observation in one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentQuote {
    pub symbol: String,
    pub prev_close: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub change: f64,
    pub pct_change: f64,
    pub trades: f64,
    pub volume: f64,
    pub value: f64,
    pub captured_at: DateTime<Utc>,
}

/// All instruments captured in one scheduled cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub captured_at: DateTime<Utc>,
    pub quotes: Vec<InstrumentQuote>,
}

impl MarketSnapshot {
    pub fn new(captured_at: DateTime<Utc>, quotes: Vec<InstrumentQuote>) -> Self {
        Self { captured_at, quotes }
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    #[cfg(test)]
    pub fn quote(&self, symbol: &str) -> Option<&InstrumentQuote> {
        self.quotes.iter().find(|q| q.symbol == symbol)
    }
}

/// Per-snapshot observation of one symbol inside a price history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub close: f64,
    pub volume: f64,
    pub pct_change: f64,
}

/// Named component scores of one scoring run.
///
/// A field is `None` when its signal could not be computed from the available
/// data. `consecutive_declines` is a flag: it is only ever set to 3.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalBreakdown {
    #[serde(rename = "momentum_%", skip_serializing_if = "Option::is_none")]
    pub momentum_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistency: Option<f64>,
    #[serde(rename = "volume_trend_%", skip_serializing_if = "Option::is_none")]
    pub volume_trend_pct: Option<f64>,
    #[serde(rename = "recent_momentum_%", skip_serializing_if = "Option::is_none")]
    pub recent_momentum_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consecutive_declines: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_score: Option<f64>,
}

impl SignalBreakdown {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationLabel {
    #[serde(rename = "STRONG BUY")]
    StrongBuy,
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "WATCH")]
    Watch,
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "WATCH / BUY (single-session)")]
    SingleSession,
}

impl RecommendationLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrongBuy => "STRONG BUY",
            Self::Buy => "BUY",
            Self::Watch => "WATCH",
            Self::Hold => "HOLD",
            Self::SingleSession => "WATCH / BUY (single-session)",
        }
    }
}

impl fmt::Display for RecommendationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A ranked instrument, merged with the live quote of the current cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub symbol: String,
    pub score: f64,
    #[serde(skip_serializing_if = "SignalBreakdown::is_empty")]
    pub breakdown: SignalBreakdown,
    pub label: RecommendationLabel,
    pub close: f64,
    pub pct_change: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "CONSIDER SELLING")]
    ConsiderSelling,
    #[serde(rename = "WATCH CLOSELY")]
    WatchClosely,
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "KEEP")]
    Keep,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sell => "SELL",
            Self::ConsiderSelling => "CONSIDER SELLING",
            Self::WatchClosely => "WATCH CLOSELY",
            Self::Hold => "HOLD",
            Self::Keep => "KEEP",
        }
    }

    /// Signals that warrant an alert to the position owner.
    pub fn is_bearish(&self) -> bool {
        matches!(self, Self::Sell | Self::ConsiderSelling)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Action signal for one held instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSignal {
    pub symbol: String,
    pub signal: SignalKind,
    pub reason: String,
    pub net_change_pct: f64,
    pub recent_avg_pct: f64,
    pub consecutive_down: u32,
    pub sessions_observed: usize,
    pub week_change_pct: f64,
    pub three_day_change_pct: f64,
}

#[derive(Debug, Clone)]
pub struct ScrapeRequest {
    pub url: String,
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected response status {status}")]
    InvalidResponse { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("HTML parse error: {0}")]
    HtmlParseError(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("corrupt record: {0}")]
    CorruptRecord(String),
    #[error("failed to prepare storage directory: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Telegram API error: {0}")]
    ApiError(String),
    #[error("Telegram unreachable")]
    Unreachable,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recommendation(breakdown: SignalBreakdown) -> Recommendation {
        Recommendation {
            symbol: "ZENITHBANK".into(),
            score: 12.5,
            breakdown,
            label: RecommendationLabel::Buy,
            close: 41.0,
            pct_change: 2.5,
            volume: 1000.0,
        }
    }

    #[test]
    fn empty_breakdown_is_omitted_from_json() {
        let json = serde_json::to_value(recommendation(SignalBreakdown::default())).unwrap();
        assert!(json.get("breakdown").is_none());
        assert_eq!(json["label"], "BUY");
    }

    #[test]
    fn breakdown_keys_carry_percent_suffix() {
        let json = serde_json::to_value(recommendation(SignalBreakdown {
            momentum_pct: Some(4.0),
            ..SignalBreakdown::default()
        }))
        .unwrap();
        assert_eq!(json["breakdown"]["momentum_%"], 4.0);
        assert!(json["breakdown"].get("consistency").is_none());
    }
}
