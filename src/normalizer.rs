use crate::model::{InstrumentQuote, MarketSnapshot};
use crate::utils::period_pct;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Cleans one extraction result into a snapshot stamped with `captured_at`.
pub fn normalize_all(quotes: Vec<InstrumentQuote>, captured_at: DateTime<Utc>) -> MarketSnapshot {
    let mut seen = HashSet::new();
    let quotes = quotes
        .into_iter()
        .filter_map(|q| normalize_quote(q, captured_at))
        .filter(|q| seen.insert(q.symbol.clone()))
        .collect();
    MarketSnapshot::new(captured_at, quotes)
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 { value } else { 0.0 }
}

fn signed(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn normalize_quote(quote: InstrumentQuote, captured_at: DateTime<Utc>) -> Option<InstrumentQuote> {
    let symbol = quote.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return None;
    }

    let prev_close = non_negative(quote.prev_close);
    let change = signed(quote.change);
    Some(InstrumentQuote {
        symbol,
        prev_close,
        open: non_negative(quote.open),
        high: non_negative(quote.high),
        low: non_negative(quote.low),
        close: non_negative(quote.close),
        change,
        pct_change: period_pct(change, prev_close),
        trades: non_negative(quote.trades),
        volume: non_negative(quote.volume),
        value: non_negative(quote.value),
        captured_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::{hour, quote};

    #[test]
    fn cleans_symbols_and_drops_blanks_and_duplicates() {
        let raw = vec![
            quote(" zenithbank ", 41.0, 2.5, 100.0),
            quote("", 1.0, 0.0, 1.0),
            quote("ZENITHBANK", 99.0, 0.0, 1.0),
            quote("cutix", 3.0, -1.0, 10.0),
        ];
        let snap = normalize_all(raw, hour(3));
        let symbols: Vec<_> = snap.quotes.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ZENITHBANK", "CUTIX"]);
        assert_eq!(snap.quotes[0].close, 41.0);
        assert!(snap.quotes.iter().all(|q| q.captured_at == hour(3)));
        assert_eq!(snap.captured_at, hour(3));
    }

    #[test]
    fn enforces_field_invariants() {
        let raw = InstrumentQuote {
            prev_close: 0.0,
            change: 0.5,
            pct_change: 12.0,
            volume: -10.0,
            close: f64::NAN,
            ..quote("X", 1.0, 0.0, 1.0)
        };
        let q = &normalize_all(vec![raw], hour(0)).quotes[0];
        assert_eq!(q.pct_change, 0.0);
        assert_eq!(q.volume, 0.0);
        assert_eq!(q.close, 0.0);
        assert_eq!(q.change, 0.5);
    }
}
