use crate::storage::DEFAULT_RETENTION_LIMIT;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_SOURCE_URL: &str = "https://ngxgroup.com/exchange/data/equities-price-list/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Weights and thresholds of the trend scorer and the position evaluator.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringConfig {
    /// Multiplier applied to the net percentage change over the full history.
    pub momentum_weight: f64,
    /// Points for a history where every period change is positive.
    pub consistency_weight: f64,
    /// Added when price and volume both rise.
    pub volume_confirmation_bonus: f64,
    /// Subtracted when price falls while volume rises.
    pub volume_divergence_penalty: f64,
    /// Multiplier applied to the last-3 vs earlier mean change.
    pub recent_momentum_weight: f64,
    /// Subtracted when the last three period changes are all negative.
    pub decline_streak_penalty: f64,
    pub strong_buy_threshold: f64,
    pub buy_threshold: f64,
    pub watch_threshold: f64,
    /// Observations in the one-week window (hourly captures).
    pub week_window: usize,
    /// Observations in the three-day window (hourly captures).
    pub three_day_window: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            momentum_weight: 0.4,
            consistency_weight: 20.0,
            volume_confirmation_bonus: 10.0,
            volume_divergence_penalty: 5.0,
            recent_momentum_weight: 0.3,
            decline_streak_penalty: 15.0,
            strong_buy_threshold: 30.0,
            buy_threshold: 15.0,
            watch_threshold: 5.0,
            week_window: 168,
            three_day_window: 72,
        }
    }
}

/// A held instrument. `symbol` is the explicit mapping to the live feed; without
/// it the first word of `name` is prefix-matched against live symbols.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HoldingConfig {
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_source_url")]
    pub source_url: String,
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_retention_limit")]
    pub retention_limit: usize,
    #[serde(default = "default_movers_count")]
    pub movers_count: usize,
    #[serde(default = "default_recommendation_count")]
    pub recommendation_count: usize,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub portfolio: Vec<HoldingConfig>,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
}

fn default_source_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_check_interval() -> u64 {
    3600
}

fn default_history_window() -> usize {
    24
}

fn default_retention_limit() -> usize {
    DEFAULT_RETENTION_LIMIT
}

fn default_movers_count() -> usize {
    10
}

fn default_recommendation_count() -> usize {
    5
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/ngx.db")
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("data/reports")
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    Ok(serde_json::from_str(content)?)
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}
