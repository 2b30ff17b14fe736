// Sell/hold classification for held instruments.

use crate::config::{HoldingConfig, ScoringConfig};
use crate::model::{InstrumentQuote, MarketSnapshot, PositionSignal, SignalKind};
use crate::utils::{mean, round2, span_change, tail};

/// Trailing period changes averaged into `recent_avg_pct`.
const RECENT_WINDOW: usize = 3;

/// How a configured holding is found in the live feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolMatcher {
    /// Case-insensitive equality with a configured symbol.
    Exact(String),
    /// Case-insensitive prefix match on the first word of a display name.
    Prefix(String),
}

impl SymbolMatcher {
    pub fn for_holding(holding: &HoldingConfig) -> Self {
        match holding.symbol.as_deref().map(str::trim) {
            Some(symbol) if !symbol.is_empty() => Self::Exact(symbol.to_uppercase()),
            _ => Self::from_name(&holding.name),
        }
    }

    pub fn from_name(name: &str) -> Self {
        let token = name.split_whitespace().next().unwrap_or_default();
        Self::Prefix(token.to_uppercase())
    }

    pub fn matches(&self, symbol: &str) -> bool {
        let symbol = symbol.trim().to_uppercase();
        match self {
            Self::Exact(expected) => symbol == *expected,
            Self::Prefix(prefix) => !prefix.is_empty() && symbol.starts_with(prefix.as_str()),
        }
    }

    pub fn find<'a>(&self, quotes: &'a [InstrumentQuote]) -> Option<&'a InstrumentQuote> {
        quotes.iter().find(|q| self.matches(&q.symbol))
    }
}

/// Holdings found in the current quotes, plus the names of those that were not.
#[derive(Debug, Clone, Default)]
pub struct ResolvedHoldings {
    pub matched: Vec<(HoldingConfig, InstrumentQuote)>,
    pub missing: Vec<String>,
}

pub fn resolve_holdings(quotes: &[InstrumentQuote], holdings: &[HoldingConfig]) -> ResolvedHoldings {
    let mut resolved = ResolvedHoldings::default();
    for holding in holdings {
        match SymbolMatcher::for_holding(holding).find(quotes) {
            Some(quote) => resolved.matched.push((holding.clone(), quote.clone())),
            None => resolved.missing.push(holding.name.clone()),
        }
    }
    resolved
}

#[derive(Debug, Clone)]
pub struct PositionEvaluator {
    week_window: usize,
    three_day_window: usize,
}

impl Default for PositionEvaluator {
    fn default() -> Self {
        Self::new(&ScoringConfig::default())
    }
}

impl PositionEvaluator {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            week_window: config.week_window,
            three_day_window: config.three_day_window,
        }
    }

    pub fn evaluate(
        &self,
        matcher: &SymbolMatcher,
        current: &InstrumentQuote,
        snapshots: &[MarketSnapshot],
    ) -> PositionSignal {
        if snapshots.len() < 2 {
            let pct = current.pct_change;
            let signal = if pct < -3.0 {
                SignalKind::WatchClosely
            } else {
                SignalKind::Hold
            };
            return PositionSignal {
                symbol: current.symbol.clone(),
                signal,
                reason: "Insufficient history; check back after more snapshots".to_string(),
                net_change_pct: pct,
                recent_avg_pct: pct,
                consecutive_down: u32::from(pct < 0.0),
                sessions_observed: 1,
                week_change_pct: pct,
                three_day_change_pct: pct,
            };
        }

        let (closes, pcts): (Vec<f64>, Vec<f64>) = snapshots
            .iter()
            .filter_map(|s| matcher.find(&s.quotes))
            .map(|q| (q.close, q.pct_change))
            .unzip();

        if closes.len() < 2 {
            return PositionSignal {
                symbol: current.symbol.clone(),
                signal: SignalKind::Hold,
                reason: "Not enough historical data yet".to_string(),
                net_change_pct: 0.0,
                recent_avg_pct: 0.0,
                consecutive_down: 0,
                sessions_observed: 0,
                week_change_pct: 0.0,
                three_day_change_pct: 0.0,
            };
        }

        let sessions = closes.len();
        let net_change = span_change(&closes);
        let recent_avg = mean(tail(&pcts, RECENT_WINDOW));
        let consecutive_down = pcts.iter().rev().take_while(|&&p| p < 0.0).count() as u32;
        let week_change = span_change(tail(&closes, self.week_window));
        let three_day_change = span_change(tail(&closes, self.three_day_window));

        let (signal, reason) = classify(net_change, recent_avg, consecutive_down, sessions);

        PositionSignal {
            symbol: current.symbol.clone(),
            signal,
            reason,
            net_change_pct: round2(net_change),
            recent_avg_pct: round2(recent_avg),
            consecutive_down,
            sessions_observed: sessions,
            week_change_pct: round2(week_change),
            three_day_change_pct: round2(three_day_change),
        }
    }
}

/// First matching rule wins.
fn classify(net_change: f64, recent_avg: f64, consecutive_down: u32, sessions: usize) -> (SignalKind, String) {
    if net_change <= -10.0 && consecutive_down >= 5 {
        (
            SignalKind::Sell,
            format!(
                "Down {:.1}% over {} sessions with {} consecutive declines",
                net_change.abs(),
                sessions,
                consecutive_down
            ),
        )
    } else if net_change <= -5.0 && recent_avg < -1.0 {
        (
            SignalKind::ConsiderSelling,
            format!("Down {:.1}% overall; recent avg {:.1}%/session", net_change.abs(), recent_avg),
        )
    } else if consecutive_down >= 5 {
        (
            SignalKind::ConsiderSelling,
            format!("{} consecutive declining sessions; momentum is bearish", consecutive_down),
        )
    } else if net_change < -2.0 && recent_avg < 0.0 {
        (
            SignalKind::WatchClosely,
            format!("Down {:.1}% with negative recent trend", net_change.abs()),
        )
    } else if net_change > 5.0 && recent_avg > 0.0 {
        (
            SignalKind::Keep,
            format!("Up {:.1}% over {} sessions; strong trend", net_change, sessions),
        )
    } else if net_change > 0.0 {
        (
            SignalKind::Hold,
            format!("Slight gain of {:.1}%; stable, continue monitoring", net_change),
        )
    } else {
        (
            SignalKind::Hold,
            format!("Mixed signals over {} sessions; no clear direction", sessions),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::{quote, snapshot};

    fn series(symbol: &str, points: &[(f64, f64)]) -> Vec<MarketSnapshot> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(close, pct))| snapshot(i, vec![quote("OTHER", 1.0, 0.0, 1.0), quote(symbol, close, pct, 10.0)]))
            .collect()
    }

    fn evaluate(symbol: &str, points: &[(f64, f64)]) -> PositionSignal {
        let snaps = series(symbol, points);
        let current = snaps.last().unwrap().quote(symbol).unwrap().clone();
        PositionEvaluator::default().evaluate(&SymbolMatcher::from_name(symbol), &current, &snaps)
    }

    #[test]
    fn steady_decline_is_sell() {
        let sig = evaluate(
            "CUTIX",
            &[(100.0, -1.0), (98.0, -1.0), (96.0, -1.0), (93.0, -1.0), (90.0, -1.0), (88.0, -1.0)],
        );
        assert_eq!(sig.signal, SignalKind::Sell);
        assert_eq!(sig.net_change_pct, -12.0);
        assert_eq!(sig.consecutive_down, 6);
        assert_eq!(sig.sessions_observed, 6);
        assert_eq!(sig.reason, "Down 12.0% over 6 sessions with 6 consecutive declines");
    }

    #[test]
    fn recovery_resets_decline_streak() {
        let sig = evaluate("CUTIX", &[(100.0, -5.0), (95.0, -5.0), (90.0, -5.0), (91.0, 1.0), (92.0, 1.0)]);
        assert_eq!(sig.consecutive_down, 0);
        assert_eq!(sig.recent_avg_pct, -1.0);
        assert_eq!(sig.signal, SignalKind::WatchClosely);
    }

    #[test]
    fn deep_loss_with_weak_recent_trend_considers_selling() {
        let sig = evaluate("CUTIX", &[(100.0, 1.0), (97.0, -3.0), (94.0, -3.0), (93.0, -1.0)]);
        assert_eq!(sig.signal, SignalKind::ConsiderSelling);
        assert!(sig.reason.starts_with("Down 7.0% overall"));
    }

    #[test]
    fn long_streak_alone_considers_selling() {
        let sig = evaluate(
            "CUTIX",
            &[(100.0, -0.5), (99.5, -0.5), (99.0, -0.5), (98.5, -0.5), (98.0, -0.5), (97.5, -0.5)],
        );
        assert_eq!(sig.signal, SignalKind::ConsiderSelling);
        assert_eq!(sig.reason, "6 consecutive declining sessions; momentum is bearish");
    }

    #[test]
    fn strong_gain_is_keep_and_small_gain_is_hold() {
        let keep = evaluate("ZENITH", &[(40.0, 1.0), (42.0, 5.0), (44.0, 4.76)]);
        assert_eq!(keep.signal, SignalKind::Keep);

        let hold = evaluate("ZENITH", &[(40.0, 1.0), (40.4, 1.0), (40.8, 0.99)]);
        assert_eq!(hold.signal, SignalKind::Hold);
        assert!(hold.reason.starts_with("Slight gain of 2.0%"));

        let flat = evaluate("ZENITH", &[(40.0, 0.0), (40.0, 0.0)]);
        assert_eq!(flat.signal, SignalKind::Hold);
        assert_eq!(flat.reason, "Mixed signals over 2 sessions; no clear direction");
    }

    #[test]
    fn single_snapshot_uses_current_change() {
        let snaps = series("CUTIX", &[(10.0, -4.0)]);
        let current = snaps[0].quote("CUTIX").unwrap().clone();
        let sig = PositionEvaluator::default().evaluate(&SymbolMatcher::from_name("CUTIX"), &current, &snaps);
        assert_eq!(sig.signal, SignalKind::WatchClosely);
        assert_eq!(sig.net_change_pct, -4.0);
        assert_eq!(sig.week_change_pct, -4.0);
        assert_eq!(sig.three_day_change_pct, -4.0);

        let calm = InstrumentQuote { pct_change: -1.0, ..current };
        let sig = PositionEvaluator::default().evaluate(&SymbolMatcher::from_name("CUTIX"), &calm, &[]);
        assert_eq!(sig.signal, SignalKind::Hold);
    }

    #[test]
    fn unmatched_history_holds_with_zero_stats() {
        let snaps = series("OTHERCO", &[(10.0, 1.0), (11.0, 10.0)]);
        let current = quote("CUTIX", 3.0, -8.0, 10.0);
        let sig = PositionEvaluator::default().evaluate(&SymbolMatcher::from_name("CUTIX"), &current, &snaps);
        assert_eq!(sig.signal, SignalKind::Hold);
        assert_eq!(sig.reason, "Not enough historical data yet");
        assert_eq!(sig.sessions_observed, 0);
        assert_eq!(sig.net_change_pct, 0.0);
    }

    #[test]
    fn window_changes_use_trailing_observations() {
        let points: Vec<(f64, f64)> = (1..=80).map(|c| (c as f64, 1.0)).collect();
        let sig = evaluate("ZENITH", &points);
        assert_eq!(sig.week_change_pct, 7900.0);
        assert_eq!(sig.three_day_change_pct, round2((80.0 - 9.0) / 9.0 * 100.0));
    }

    #[test]
    fn prefix_matcher_tolerates_annotations() {
        let m = SymbolMatcher::from_name("sovrenins trust");
        assert!(m.matches("SOVRENINS [MRF]"));
        assert!(!m.matches("SOVEREIGN"));
        assert!(!SymbolMatcher::from_name("   ").matches("ANY"));
    }

    #[test]
    fn explicit_symbol_matches_exactly() {
        let holding = HoldingConfig {
            name: "Cutix Plc".into(),
            symbol: Some("cutix".into()),
        };
        let m = SymbolMatcher::for_holding(&holding);
        assert!(m.matches("CUTIX"));
        assert!(!m.matches("CUTIXB"));
    }

    #[test]
    fn resolve_reports_missing_holdings() {
        let quotes = vec![quote("AFRIPRUD", 7.0, 1.0, 10.0), quote("CUTIX", 3.0, 0.0, 10.0)];
        let holdings = vec![
            HoldingConfig { name: "AFRIPRUD".into(), symbol: None },
            HoldingConfig { name: "UNIVINSURE".into(), symbol: None },
        ];
        let resolved = resolve_holdings(&quotes, &holdings);
        assert_eq!(resolved.matched.len(), 1);
        assert_eq!(resolved.matched[0].1.symbol, "AFRIPRUD");
        assert_eq!(resolved.missing, vec!["UNIVINSURE".to_string()]);
    }
}
