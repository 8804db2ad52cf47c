use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

// A field is either a quoted span or a run of non-comma/non-whitespace
// characters. Mirrors how the published-sheet export quotes its cells.
fn field_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""[^"]*"|[^",\s]+"#).unwrap())
}

/// Parse a raw CSV blob into one map per data line, keyed by the lower-cased
/// header row. Missing trailing fields default to the empty string; lines with
/// extra tokens have the excess ignored. Never errors: inputs with fewer than
/// two non-blank lines yield an empty vec.
pub fn parse(text: &str) -> Vec<BTreeMap<String, String>> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return Vec::new();
    }

    let headers: Vec<String> = lines[0]
        .split(',')
        .map(|h| strip_quotes(h).to_lowercase())
        .collect();

    let mut rows = Vec::with_capacity(lines.len() - 1);
    for line in &lines[1..] {
        let values: Vec<String> = field_pattern()
            .find_iter(line)
            .map(|m| strip_quotes(m.as_str()))
            .collect();

        let mut row = BTreeMap::new();
        for (idx, header) in headers.iter().enumerate() {
            let value = values.get(idx).cloned().unwrap_or_default();
            row.insert(header.clone(), value);
        }
        rows.push(row);
    }

    rows
}

fn strip_quotes(s: &str) -> String {
    s.trim().trim_matches('"').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_one_row_per_data_line_keyed_by_headers() {
        let text = "Empresa,Ticker,Industria\nMicrosoft,NASDAQ:MSFT,Software\nApple,NASDAQ:AAPL,Hardware\n";
        let rows = parse(text);
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert!(row.contains_key("empresa"));
            assert!(row.contains_key("ticker"));
            assert!(row.contains_key("industria"));
        }
        assert_eq!(rows[0]["empresa"], "Microsoft");
        assert_eq!(rows[1]["ticker"], "NASDAQ:AAPL");
    }

    #[test]
    fn lowercases_and_unquotes_headers() {
        let text = "\"Empresa\",\"Precio_Objetivo\"\nMicrosoft,450\n";
        let rows = parse(text);
        assert_eq!(rows[0]["empresa"], "Microsoft");
        assert_eq!(rows[0]["precio_objetivo"], "450");
    }

    #[test]
    fn quoted_fields_keep_embedded_commas_and_spaces() {
        let text = "empresa,moat\n\"Coca-Cola Company\",\"Marca, red de distribucion\"\n";
        let rows = parse(text);
        assert_eq!(rows[0]["empresa"], "Coca-Cola Company");
        assert_eq!(rows[0]["moat"], "Marca, red de distribucion");
    }

    #[test]
    fn short_rows_pad_missing_columns_with_empty_strings() {
        let text = "empresa,ticker,industria\nMicrosoft,NASDAQ:MSFT\n";
        let rows = parse(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["industria"], "");
    }

    #[test]
    fn fewer_than_two_lines_yields_empty() {
        assert!(parse("").is_empty());
        assert!(parse("empresa,ticker\n").is_empty());
        assert!(parse("\n   \n").is_empty());
    }

    #[test]
    fn blank_lines_are_skipped_entirely() {
        let text = "empresa,ticker\n\nMicrosoft,NASDAQ:MSFT\n   \nApple,NASDAQ:AAPL\n";
        let rows = parse(text);
        assert_eq!(rows.len(), 2);
    }
}
