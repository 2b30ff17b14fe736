use crate::model::{MarketSnapshot, Observation};
use std::collections::BTreeMap;

/// Per-symbol observation sequences, in snapshot order.
///
/// A symbol absent from a snapshot has no entry for it; sequences are never
/// padded, so they may differ in length.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PriceHistory {
    series: BTreeMap<String, Vec<Observation>>,
}

impl PriceHistory {
    #[cfg(test)]
    pub fn get(&self, symbol: &str) -> Option<&[Observation]> {
        self.series.get(symbol).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Observation])> {
        self.series.iter().map(|(s, obs)| (s.as_str(), obs.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Merges snapshots (oldest first) into per-symbol series.
pub fn build_price_history(snapshots: &[MarketSnapshot]) -> PriceHistory {
    let mut series: BTreeMap<String, Vec<Observation>> = BTreeMap::new();

    for snapshot in snapshots {
        for quote in &snapshot.quotes {
            if quote.symbol.is_empty() || !quote.close.is_finite() {
                continue;
            }
            series.entry(quote.symbol.clone()).or_default().push(Observation {
                close: quote.close,
                volume: quote.volume,
                pct_change: quote.pct_change,
            });
        }
    }

    PriceHistory { series }
}
