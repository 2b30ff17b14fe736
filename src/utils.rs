// Utility functions

/// Rounds to two decimal places for reporting.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage change from `first` to `last`; 0 when `first` is 0.
pub fn pct_change(first: f64, last: f64) -> f64 {
    if first == 0.0 {
        return 0.0;
    }
    (last - first) / first * 100.0
}

/// First-to-last percentage change of a series; 0 for fewer than two points.
pub fn span_change(values: &[f64]) -> f64 {
    match (values.first(), values.last()) {
        (Some(&first), Some(&last)) if values.len() >= 2 => pct_change(first, last),
        _ => 0.0,
    }
}

/// Period change in percent of the previous close; 0 when there is no previous close.
pub fn period_pct(change: f64, prev_close: f64) -> f64 {
    if prev_close == 0.0 {
        return 0.0;
    }
    change / prev_close * 100.0
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Last `n` elements of a slice (all of it when shorter).
pub fn tail<T>(values: &[T], n: usize) -> &[T] {
    &values[values.len().saturating_sub(n)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_change_guards_zero_base() {
        assert_eq!(pct_change(0.0, 10.0), 0.0);
        assert_eq!(pct_change(50.0, 55.0), 10.0);
    }

    #[test]
    fn period_pct_guards_missing_previous_close() {
        assert_eq!(period_pct(1.0, 0.0), 0.0);
        assert_eq!(period_pct(-0.5, 10.0), -5.0);
    }

    #[test]
    fn span_change_needs_two_points() {
        assert_eq!(span_change(&[]), 0.0);
        assert_eq!(span_change(&[10.0]), 0.0);
        assert_eq!(span_change(&[10.0, 12.0, 9.0]), -10.0);
    }

    #[test]
    fn tail_clamps_to_len() {
        assert_eq!(tail(&[1, 2, 3], 2), &[2, 3]);
        assert_eq!(tail(&[1, 2, 3], 10), &[1, 2, 3]);
    }

    #[test]
    fn round2_rounds_half_away() {
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(-2.344), -2.34);
    }
}
