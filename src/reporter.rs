// Console report rendering and persistence.

use crate::analyzer::movers::market_breadth;
use crate::model::{InstrumentQuote, PositionSignal, Recommendation};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const DIVIDER: &str = "===========================================================================";
const THIN_DIV: &str = "---------------------------------------------------------------------------";

/// Everything one cycle produced, ready to render.
pub struct CycleReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub quotes: &'a [InstrumentQuote],
    pub gainers: &'a [InstrumentQuote],
    pub losers: &'a [InstrumentQuote],
    pub recommendations: &'a [Recommendation],
    pub positions: &'a [PositionSignal],
    pub missing_holdings: &'a [String],
    pub snapshots_used: usize,
}

pub fn format_currency(value: f64) -> String {
    if value >= 1_000_000_000.0 {
        format!("₦{:.2}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("₦{:.2}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("₦{:.1}K", value / 1_000.0)
    } else {
        format!("₦{:.2}", value)
    }
}

pub fn format_volume(volume: f64) -> String {
    if volume >= 1_000_000.0 {
        format!("{:.2}M", volume / 1_000_000.0)
    } else if volume >= 1_000.0 {
        format!("{:.1}K", volume / 1_000.0)
    } else {
        format!("{}", volume as i64)
    }
}

fn arrow(pct: f64) -> char {
    if pct >= 0.0 { '▲' } else { '▼' }
}

fn movers_table(quotes: &[InstrumentQuote]) -> String {
    let mut out = format!(
        "{:<4} {:<15} {:>8} {:>8} {:>8} {:>9} {:>12} {:>12}\n{}\n",
        "#", "SYMBOL", "PREV", "CLOSE", "CHG", "PCT", "VOLUME", "VALUE", THIN_DIV
    );
    for (i, q) in quotes.iter().enumerate() {
        let a = arrow(q.pct_change);
        let _ = writeln!(
            out,
            "{:<4} {:<15} {:>8.2} {:>8.2} {}{:>7.2} {}{:>7.2}% {:>12} {:>12}",
            i + 1,
            q.symbol,
            q.prev_close,
            q.close,
            a,
            q.change.abs(),
            a,
            q.pct_change.abs(),
            format_volume(q.volume),
            format_currency(q.value)
        );
    }
    out
}

/// Short explanation of a recommendation built from its breakdown.
pub fn reasoning(rec: &Recommendation) -> String {
    let b = &rec.breakdown;
    if b.consistency.is_none() {
        return "Single-session signal".to_string();
    }
    let mut parts = Vec::new();
    if let Some(m) = b.momentum_pct {
        parts.push(format!("Mom:{:+.1}%", m));
    }
    if let Some(c) = b.consistency {
        parts.push(format!("Cons:{:.0}%", c * 100.0));
    }
    if let Some(v) = b.volume_trend_pct {
        parts.push(format!("Vol:{:+.0}%", v));
    }
    if b.consecutive_declines.is_some() {
        parts.push("3 down".to_string());
    }
    parts.join("  ")
}

fn recommendations_table(recs: &[Recommendation]) -> String {
    let mut out = format!(
        "{:<4} {:<15} {:>8} {:>9} {:>8} {:>12} {:<28} REASONING\n{}\n",
        "#", "SYMBOL", "CLOSE", "PCT", "SCORE", "VOLUME", "SIGNAL", THIN_DIV
    );
    for (i, r) in recs.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:<4} {:<15} {:>8.2} {:>+8.2}% {:>8.1} {:>12} {:<28} {}",
            i + 1,
            r.symbol,
            r.close,
            r.pct_change,
            r.score,
            format_volume(r.volume),
            r.label,
            reasoning(r)
        );
    }
    out
}

fn positions_table(positions: &[PositionSignal], missing: &[String]) -> String {
    let mut out = format!(
        "{:<15} {:<17} {:>8} {:>8} {:>8} {:>8} {:>6}  REASON\n{}\n",
        "SYMBOL", "SIGNAL", "NET", "RECENT", "3-DAY", "WEEK", "DOWN", THIN_DIV
    );
    for p in positions {
        let _ = writeln!(
            out,
            "{:<15} {:<17} {:>+7.2}% {:>+7.2}% {:>+7.2}% {:>+7.2}% {:>6}  {}",
            p.symbol,
            p.signal,
            p.net_change_pct,
            p.recent_avg_pct,
            p.three_day_change_pct,
            p.week_change_pct,
            p.consecutive_down,
            p.reason
        );
    }
    if !missing.is_empty() {
        let _ = writeln!(out, "Not found in today's data: {}", missing.join(", "));
    }
    out
}

pub fn build_report(report: &CycleReport<'_>) -> String {
    let breadth = market_breadth(report.quotes);
    let now = report.generated_at.format("%A, %d %B %Y  %H:%M:%S UTC");

    let mut sections = vec![
        String::new(),
        DIVIDER.to_string(),
        format!("  NGX EQUITIES TRACKER  |  {}", now),
        DIVIDER.to_string(),
        format!(
            "  Market Overview: {} stocks  |  ▲ {} advancing  |  ▼ {} declining  |  {} unchanged",
            breadth.total, breadth.advancing, breadth.declining, breadth.unchanged
        ),
        format!("  Historical snapshots used: {}", report.snapshots_used),
        DIVIDER.to_string(),
        String::new(),
        "  TOP GAINERS".to_string(),
        THIN_DIV.to_string(),
        movers_table(report.gainers),
        DIVIDER.to_string(),
        String::new(),
        "  TOP LOSERS".to_string(),
        THIN_DIV.to_string(),
        movers_table(report.losers),
        DIVIDER.to_string(),
        String::new(),
        "  BUY RECOMMENDATIONS  (based on multi-session trend analysis)".to_string(),
        THIN_DIV.to_string(),
        recommendations_table(report.recommendations),
    ];

    if !report.positions.is_empty() || !report.missing_holdings.is_empty() {
        sections.extend([
            DIVIDER.to_string(),
            String::new(),
            "  PORTFOLIO SIGNALS".to_string(),
            THIN_DIV.to_string(),
            positions_table(report.positions, report.missing_holdings),
        ]);
    }

    sections.extend([
        DIVIDER.to_string(),
        "  SIGNAL GUIDE:  STRONG BUY >=30pts  |  BUY >=15pts  |  WATCH >=5pts  |  HOLD <5pts".to_string(),
        "  Score factors: price momentum, trend consistency, volume confirmation,".to_string(),
        "  recent momentum; -15pts for 3 down-sessions".to_string(),
        DIVIDER.to_string(),
        String::new(),
    ]);

    sections.join("\n")
}

/// Writes the report to `dir/report_<timestamp>.txt`.
pub fn save_report(report: &str, dir: &Path, generated_at: DateTime<Utc>) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("report_{}.txt", generated_at.format("%Y%m%d_%H%M%S")));
    fs::write(&path, report)?;
    info!("Report saved: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RecommendationLabel, SignalBreakdown, SignalKind};
    use crate::storage::test_support::{hour, quote};

    fn recommendation() -> Recommendation {
        Recommendation {
            symbol: "ZENITHBANK".into(),
            score: 38.0,
            breakdown: SignalBreakdown {
                momentum_pct: Some(20.0),
                consistency: Some(1.0),
                volume_trend_pct: Some(400.0),
                total_score: Some(38.0),
                ..SignalBreakdown::default()
            },
            label: RecommendationLabel::StrongBuy,
            close: 12.0,
            pct_change: 4.35,
            volume: 1_500_000.0,
        }
    }

    #[test]
    fn abbreviations() {
        assert_eq!(format_currency(2_500_000_000.0), "₦2.50B");
        assert_eq!(format_currency(1_250_000.0), "₦1.25M");
        assert_eq!(format_currency(1_500.0), "₦1.5K");
        assert_eq!(format_currency(12.0), "₦12.00");
        assert_eq!(format_volume(2_000_000.0), "2.00M");
        assert_eq!(format_volume(999.0), "999");
    }

    #[test]
    fn reasoning_summarises_breakdown() {
        assert_eq!(reasoning(&recommendation()), "Mom:+20.0%  Cons:100%  Vol:+400%");

        let single = Recommendation {
            breakdown: SignalBreakdown {
                momentum_pct: Some(4.0),
                ..SignalBreakdown::default()
            },
            label: RecommendationLabel::SingleSession,
            ..recommendation()
        };
        assert_eq!(reasoning(&single), "Single-session signal");
    }

    #[test]
    fn report_contains_every_section() {
        let quotes = vec![quote("ZENITHBANK", 12.0, 4.35, 1_500_000.0), quote("CUTIX", 3.0, -2.0, 10.0)];
        let recs = vec![recommendation()];
        let positions = vec![PositionSignal {
            symbol: "CUTIX".into(),
            signal: SignalKind::Sell,
            reason: "Down 12.0% over 6 sessions with 6 consecutive declines".into(),
            net_change_pct: -12.0,
            recent_avg_pct: -1.0,
            consecutive_down: 6,
            sessions_observed: 6,
            week_change_pct: -12.0,
            three_day_change_pct: -12.0,
        }];
        let missing = vec!["UNIVINSURE".to_string()];
        let text = build_report(&CycleReport {
            generated_at: hour(0),
            quotes: &quotes,
            gainers: &quotes[..1],
            losers: &quotes[1..],
            recommendations: &recs,
            positions: &positions,
            missing_holdings: &missing,
            snapshots_used: 6,
        });

        assert!(text.contains("2 stocks"));
        assert!(text.contains("▲ 1 advancing"));
        assert!(text.contains("Historical snapshots used: 6"));
        assert!(text.contains("STRONG BUY"));
        assert!(text.contains("PORTFOLIO SIGNALS"));
        assert!(text.contains("SELL"));
        assert!(text.contains("Not found in today's data: UNIVINSURE"));
    }

    #[test]
    fn saves_report_to_timestamped_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_report("hello", &dir.path().join("reports"), hour(0)).unwrap();
        assert_eq!(path.file_name().unwrap(), "report_20260105_100000.txt");
        assert_eq!(fs::read_to_string(path).unwrap(), "hello");
    }
}
