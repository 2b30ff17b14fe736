// NGX equities price-list HTML parsing
use crate::model::{InstrumentQuote, ParserError};
use crate::utils::period_pct;
use chrono::{DateTime, Utc};
use scraper::{Html, Selector};

/// Rows with fewer cells than this are layout rows, not securities.
const MIN_CELLS: usize = 6;

pub trait Parser {
    fn parse(&self, html: &str, captured_at: DateTime<Utc>) -> Result<Vec<InstrumentQuote>, ParserError>;
}

pub struct NgxParser {
    row_selector: Selector,
    cell_selector: Selector,
}

impl NgxParser {
    pub fn new() -> Result<Self, ParserError> {
        let row_selector = Selector::parse("table tbody tr").map_err(|e| ParserError::HtmlParseError(e.to_string()))?;
        let cell_selector = Selector::parse("td").map_err(|e| ParserError::HtmlParseError(e.to_string()))?;
        Ok(Self {
            row_selector,
            cell_selector,
        })
    }
}

impl Parser for NgxParser {
    fn parse(&self, html: &str, captured_at: DateTime<Utc>) -> Result<Vec<InstrumentQuote>, ParserError> {
        let document = Html::parse_document(html);
        let mut quotes = Vec::new();

        for row in document.select(&self.row_selector) {
            let cells: Vec<String> = row
                .select(&self.cell_selector)
                .map(|td| td.text().collect::<String>().trim().to_string())
                .collect();
            if cells.len() < MIN_CELLS {
                continue;
            }

            let cell = |i: usize| cells.get(i).map(String::as_str).unwrap_or("");
            let symbol = cell(0).to_string();
            if symbol.is_empty() {
                continue;
            }

            let prev_close = parse_number(cell(1));
            let change = parse_change(cell(6));
            quotes.push(InstrumentQuote {
                symbol,
                prev_close,
                open: parse_number(cell(2)),
                high: parse_number(cell(3)),
                low: parse_number(cell(4)),
                close: parse_number(cell(5)),
                change,
                pct_change: period_pct(change, prev_close),
                trades: parse_number(cell(7)),
                volume: parse_number(cell(8)),
                value: parse_number(cell(9)),
                captured_at,
            });
        }

        Ok(quotes)
    }
}

/// Parses a number with thousands separators; blanks, dashes and garbage become 0.
pub fn parse_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return 0.0;
    }
    text.replace(',', "").parse::<f64>().unwrap_or(0.0)
}

/// Parses a change cell such as `▲0.62`, `▼1.50` or `-0.25` into a signed value.
pub fn parse_change(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() || text == "-" {
        return 0.0;
    }
    let negative = text.contains('▼') || text.starts_with('-');
    let clean: String = text
        .chars()
        .filter(|c| !matches!(c, '▲' | '▼' | ',' | '+' | '-') && !c.is_whitespace())
        .collect();
    match clean.parse::<f64>() {
        Ok(v) if negative => -v.abs(),
        Ok(v) => v.abs(),
        Err(_) => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PAGE: &str = r#"
        <html><body>
        <table class="dataTable">
          <thead><tr><th>Company</th><th>Prev</th></tr></thead>
          <tbody>
            <tr><td>ZENITHBANK</td><td>40.00</td><td>40.10</td><td>41.50</td><td>39.90</td><td>41.00</td><td>▲1.00</td><td>1,204</td><td>12,345,678</td><td>506,172,798.00</td><td>05-Jan-26</td></tr>
            <tr><td>CUTIX</td><td>3.10</td><td>3.10</td><td>3.10</td><td>2.90</td><td>2.95</td><td>▼0.15</td><td>88</td><td>450,000</td><td>1,327,500.00</td><td>05-Jan-26</td></tr>
            <tr><td>NEWCO</td><td>-</td><td>-</td><td>-</td><td>-</td><td>1.00</td><td>N/A</td><td></td><td>abc</td><td>-</td></tr>
            <tr><td> </td><td>1</td><td>1</td><td>1</td><td>1</td><td>1</td></tr>
            <tr><td colspan="3">Advert</td></tr>
          </tbody>
        </table>
        </body></html>
    "#;

    fn parse_page() -> Vec<InstrumentQuote> {
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap();
        NgxParser::new().unwrap().parse(PAGE, at).unwrap()
    }

    #[test]
    fn parses_security_rows() {
        let quotes = parse_page();
        let symbols: Vec<_> = quotes.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ZENITHBANK", "CUTIX", "NEWCO"]);

        let zenith = &quotes[0];
        assert_eq!(zenith.prev_close, 40.0);
        assert_eq!(zenith.close, 41.0);
        assert_eq!(zenith.change, 1.0);
        assert!((zenith.pct_change - 2.5).abs() < 1e-9);
        assert_eq!(zenith.trades, 1204.0);
        assert_eq!(zenith.volume, 12_345_678.0);

        assert_eq!(quotes[1].change, -0.15);
    }

    #[test]
    fn malformed_cells_become_zero() {
        let newco = &parse_page()[2];
        assert_eq!(newco.prev_close, 0.0);
        assert_eq!(newco.change, 0.0);
        assert_eq!(newco.pct_change, 0.0);
        assert_eq!(newco.volume, 0.0);
        assert_eq!(newco.value, 0.0);
        assert_eq!(newco.close, 1.0);
    }

    #[test]
    fn change_markers_set_the_sign() {
        assert_eq!(parse_change("▲0.62"), 0.62);
        assert_eq!(parse_change("▼1.50"), -1.5);
        assert_eq!(parse_change("-0.25"), -0.25);
        assert_eq!(parse_change("+0.30"), 0.3);
        assert_eq!(parse_change("-"), 0.0);
        assert_eq!(parse_change("n/a"), 0.0);
    }

    #[test]
    fn numbers_drop_separators() {
        assert_eq!(parse_number("1,234.50"), 1234.5);
        assert_eq!(parse_number(" 7 "), 7.0);
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("--"), 0.0);
    }

    #[test]
    fn page_without_table_yields_nothing() {
        let at = Utc::now();
        let quotes = NgxParser::new().unwrap().parse("<html><p>Loading…</p></html>", at).unwrap();
        assert!(quotes.is_empty());
    }
}
