// Multi-signal trend scoring for one symbol's observation history.

use crate::config::ScoringConfig;
use crate::model::{Observation, RecommendationLabel, SignalBreakdown};
use crate::utils::{mean, pct_change, round2, tail};

/// Trailing closes compared against everything before them.
const RECENT_WINDOW: usize = 3;
/// Trailing period changes that must all be negative to trigger the streak penalty.
const DECLINE_STREAK: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendScore {
    /// Sum of all signal contributions, rounded to two decimals.
    pub score: f64,
    pub breakdown: SignalBreakdown,
}

impl TrendScore {
    fn undefined() -> Self {
        Self {
            score: 0.0,
            breakdown: SignalBreakdown::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrendScorer {
    config: ScoringConfig,
}

impl TrendScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Scores a chronological observation sequence. Histories with fewer than
    /// two closes have no trend and score 0 with an empty breakdown.
    pub fn score(&self, history: &[Observation]) -> TrendScore {
        let closes: Vec<f64> = history.iter().map(|o| o.close).filter(|v| v.is_finite()).collect();
        let vols: Vec<f64> = history.iter().map(|o| o.volume).filter(|v| v.is_finite()).collect();
        let pcts: Vec<f64> = history.iter().map(|o| o.pct_change).filter(|v| v.is_finite()).collect();

        if closes.len() < 2 {
            return TrendScore::undefined();
        }

        let cfg = &self.config;
        let mut breakdown = SignalBreakdown::default();
        let mut score = 0.0;

        // Momentum
        let net_change = pct_change(closes[0], closes[closes.len() - 1]);
        breakdown.momentum_pct = Some(round2(net_change));
        score += net_change * cfg.momentum_weight;

        // Consistency
        if !pcts.is_empty() {
            let positive = pcts.iter().filter(|&&p| p > 0.0).count();
            let consistency = positive as f64 / pcts.len() as f64;
            breakdown.consistency = Some(round2(consistency));
            score += consistency * cfg.consistency_weight;
        }

        // Volume confirmation; falling volume carries no signal either way.
        if vols.len() >= 2 && vols[0] != 0.0 {
            let vol_trend = pct_change(vols[0], vols[vols.len() - 1]);
            breakdown.volume_trend_pct = Some(round2(vol_trend));
            if net_change > 0.0 && vol_trend > 0.0 {
                score += cfg.volume_confirmation_bonus;
            } else if net_change < 0.0 && vol_trend > 0.0 {
                score -= cfg.volume_divergence_penalty;
            }
        }

        // Recent momentum
        if closes.len() > RECENT_WINDOW {
            let split = closes.len() - RECENT_WINDOW;
            let recent_avg = mean(&closes[split..]);
            let earlier_avg = mean(&closes[..split]);
            if earlier_avg != 0.0 {
                let recent_momentum = pct_change(earlier_avg, recent_avg);
                breakdown.recent_momentum_pct = Some(round2(recent_momentum));
                score += recent_momentum * cfg.recent_momentum_weight;
            }
        }

        // Decline streak
        if pcts.len() >= DECLINE_STREAK && tail(&pcts, DECLINE_STREAK).iter().all(|&p| p < 0.0) {
            score -= cfg.decline_streak_penalty;
            breakdown.consecutive_declines = Some(DECLINE_STREAK as u32);
        }

        let score = round2(score);
        breakdown.total_score = Some(score);
        TrendScore { score, breakdown }
    }

    pub fn label(&self, score: f64) -> RecommendationLabel {
        let cfg = &self.config;
        if score >= cfg.strong_buy_threshold {
            RecommendationLabel::StrongBuy
        } else if score >= cfg.buy_threshold {
            RecommendationLabel::Buy
        } else if score >= cfg.watch_threshold {
            RecommendationLabel::Watch
        } else {
            RecommendationLabel::Hold
        }
    }
}
