// Ranks instruments by trend score and labels the top of the list.

use crate::analyzer::history::build_price_history;
use crate::analyzer::scoring::TrendScorer;
use crate::model::{InstrumentQuote, MarketSnapshot, Recommendation, RecommendationLabel, SignalBreakdown};
use crate::utils::round2;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info};

/// Minimum number of snapshots before the multi-signal path is used.
const MIN_SNAPSHOTS: usize = 2;

fn by_score_desc(a_score: f64, a_symbol: &str, b_score: f64, b_symbol: &str) -> Ordering {
    b_score
        .partial_cmp(&a_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a_symbol.cmp(b_symbol))
}

/// Ranks the current quotes using the trend history in `snapshots`.
///
/// Symbols missing from `current` are removed before the list is cut to
/// `top_n`, so a stale leader never displaces a listed candidate.
///
/// Falls back to [`single_session_recommendations`] when there is not enough
/// history or when no symbol that is still listed scores above zero.
pub fn recommend(
    scorer: &TrendScorer,
    current: &[InstrumentQuote],
    snapshots: &[MarketSnapshot],
    top_n: usize,
) -> Vec<Recommendation> {
    if snapshots.len() < MIN_SNAPSHOTS {
        info!("Insufficient history ({} snapshot(s)); using single-session signals only.", snapshots.len());
        return single_session_recommendations(current, top_n);
    }

    let history = build_price_history(snapshots);
    debug!("Scoring {} symbol(s) across {} snapshot(s)", history.len(), snapshots.len());
    let live: HashMap<&str, &InstrumentQuote> = current.iter().map(|q| (q.symbol.as_str(), q)).collect();

    let mut ranked: Vec<Recommendation> = Vec::new();
    for (symbol, observations) in history.iter() {
        if observations.len() < 2 {
            continue;
        }
        let result = scorer.score(observations);
        if result.score <= 0.0 {
            continue;
        }
        // Symbols that are no longer in the live feed are not actionable.
        let Some(quote) = live.get(symbol) else {
            continue;
        };
        ranked.push(Recommendation {
            symbol: symbol.to_string(),
            score: result.score,
            label: scorer.label(result.score),
            breakdown: result.breakdown,
            close: quote.close,
            pct_change: quote.pct_change,
            volume: quote.volume,
        });
    }

    if ranked.is_empty() {
        info!("No positively trending symbols in {} snapshot(s); using single-session signals.", snapshots.len());
        return single_session_recommendations(current, top_n);
    }

    ranked.sort_by(|a, b| by_score_desc(a.score, &a.symbol, b.score, &b.symbol));
    ranked.truncate(top_n);
    ranked
}

/// Ranks gainers with traded volume by `pctChange * ln(1 + volume)`.
pub fn single_session_recommendations(current: &[InstrumentQuote], top_n: usize) -> Vec<Recommendation> {
    let mut candidates: Vec<(f64, &InstrumentQuote)> = current
        .iter()
        .filter(|q| q.pct_change > 0.0 && q.volume > 0.0)
        .map(|q| (q.pct_change * q.volume.ln_1p(), q))
        .collect();

    candidates.sort_by(|a, b| by_score_desc(a.0, &a.1.symbol, b.0, &b.1.symbol));

    candidates
        .into_iter()
        .take(top_n)
        .map(|(score, q)| Recommendation {
            symbol: q.symbol.clone(),
            score: round2(score),
            breakdown: SignalBreakdown {
                momentum_pct: Some(round2(q.pct_change)),
                ..SignalBreakdown::default()
            },
            label: RecommendationLabel::SingleSession,
            close: q.close,
            pct_change: q.pct_change,
            volume: q.volume,
        })
        .collect()
}
