use crate::analyzer::movers::{top_gainers, top_losers};
use crate::analyzer::position::{PositionEvaluator, SymbolMatcher};
use crate::analyzer::ranking::recommend;
use crate::analyzer::scoring::TrendScorer;
use crate::config::{HoldingConfig, ScoringConfig};
use crate::model::{InstrumentQuote, MarketSnapshot, PositionSignal, Recommendation};

/// Trait defining the interface the report and notifier consume.
pub trait Analyzer {
    fn top_gainers(&self, quotes: &[InstrumentQuote], n: usize) -> Vec<InstrumentQuote>;
    fn top_losers(&self, quotes: &[InstrumentQuote], n: usize) -> Vec<InstrumentQuote>;
    /// Ranked buy candidates for the current cycle.
    fn recommend(
        &self,
        quotes: &[InstrumentQuote],
        snapshots: &[MarketSnapshot],
        top_n: usize,
    ) -> Vec<Recommendation>;
    /// Action signal for one held instrument.
    fn evaluate(
        &self,
        holding: &HoldingConfig,
        quote: &InstrumentQuote,
        snapshots: &[MarketSnapshot],
    ) -> PositionSignal;
}

/// Implementation of the trend analyzer.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerImpl {
    scorer: TrendScorer,
    evaluator: PositionEvaluator,
}

impl AnalyzerImpl {
    pub fn new(config: ScoringConfig) -> Self {
        Self {
            evaluator: PositionEvaluator::new(&config),
            scorer: TrendScorer::new(config),
        }
    }
}

impl Analyzer for AnalyzerImpl {
    fn top_gainers(&self, quotes: &[InstrumentQuote], n: usize) -> Vec<InstrumentQuote> {
        top_gainers(quotes, n)
    }

    fn top_losers(&self, quotes: &[InstrumentQuote], n: usize) -> Vec<InstrumentQuote> {
        top_losers(quotes, n)
    }

    fn recommend(
        &self,
        quotes: &[InstrumentQuote],
        snapshots: &[MarketSnapshot],
        top_n: usize,
    ) -> Vec<Recommendation> {
        recommend(&self.scorer, quotes, snapshots, top_n)
    }

    fn evaluate(
        &self,
        holding: &HoldingConfig,
        quote: &InstrumentQuote,
        snapshots: &[MarketSnapshot],
    ) -> PositionSignal {
        self.evaluator
            .evaluate(&SymbolMatcher::for_holding(holding), quote, snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RecommendationLabel, SignalKind};
    use crate::storage::test_support::{quote, snapshot};
    use crate::storage::{MemoryStore, SnapshotStore};

    #[test]
    fn store_to_recommendation_flow() {
        let analyzer = AnalyzerImpl::new(ScoringConfig::default());
        let mut store = MemoryStore::new(720);

        let closes = [10.0, 10.5, 11.0, 11.5, 12.0];
        for (i, close) in closes.iter().enumerate() {
            let pct = if i == 0 { 1.0 } else { (close / closes[i - 1] - 1.0) * 100.0 };
            store
                .append(snapshot(
                    i,
                    vec![quote("ZENITH", *close, pct, 100.0 * (i + 1) as f64), quote("CUTIX", 5.0 - i as f64 * 0.5, -5.0, 10.0)],
                ))
                .unwrap();
        }

        let snapshots = store.recent(24);
        let current = snapshots.last().unwrap().quotes.clone();

        let recs = analyzer.recommend(&current, &snapshots, 5);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].symbol, "ZENITH");
        assert_eq!(recs[0].label, RecommendationLabel::StrongBuy);

        let holding = HoldingConfig {
            name: "Cutix".into(),
            symbol: None,
        };
        let cutix = current.iter().find(|q| q.symbol == "CUTIX").unwrap();
        let signal = analyzer.evaluate(&holding, cutix, &snapshots);
        assert_eq!(signal.signal, SignalKind::Sell);
        assert_eq!(signal.consecutive_down, 5);

        assert_eq!(analyzer.top_gainers(&current, 10)[0].symbol, "ZENITH");
        assert_eq!(analyzer.top_losers(&current, 10)[0].symbol, "CUTIX");
    }
}
