use crate::model::InstrumentQuote;
use std::cmp::Ordering;

/// Top `n` quotes with a strictly positive period change, largest gain first.
pub fn top_gainers(quotes: &[InstrumentQuote], n: usize) -> Vec<InstrumentQuote> {
    let mut gainers: Vec<InstrumentQuote> = quotes.iter().filter(|q| q.pct_change > 0.0).cloned().collect();
    gainers.sort_by(|a, b| b.pct_change.partial_cmp(&a.pct_change).unwrap_or(Ordering::Equal));
    gainers.truncate(n);
    gainers
}

/// Top `n` quotes with a strictly negative period change, largest loss first.
pub fn top_losers(quotes: &[InstrumentQuote], n: usize) -> Vec<InstrumentQuote> {
    let mut losers: Vec<InstrumentQuote> = quotes.iter().filter(|q| q.pct_change < 0.0).cloned().collect();
    losers.sort_by(|a, b| a.pct_change.partial_cmp(&b.pct_change).unwrap_or(Ordering::Equal));
    losers.truncate(n);
    losers
}

/// Advancing, declining and unchanged counts for the market overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Breadth {
    pub total: usize,
    pub advancing: usize,
    pub declining: usize,
    pub unchanged: usize,
}

pub fn market_breadth(quotes: &[InstrumentQuote]) -> Breadth {
    quotes.iter().fold(
        Breadth {
            total: quotes.len(),
            ..Breadth::default()
        },
        |mut b, q| {
            if q.pct_change > 0.0 {
                b.advancing += 1;
            } else if q.pct_change < 0.0 {
                b.declining += 1;
            } else {
                b.unchanged += 1;
            }
            b
        },
    )
}
