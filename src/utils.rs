use std::sync::OnceLock;

use regex::Regex;

use crate::errors::AppError;

fn symbol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Z0-9.^=\-]{1,15}$").expect("symbol pattern is a valid regex")
    })
}

/// Trim and upper-case a ticker. Empty input yields an empty string.
pub fn normalize_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub fn is_valid_symbol(symbol: &str) -> bool {
    symbol_pattern().is_match(symbol)
}

pub fn parse_symbol(raw: &str) -> Result<String, AppError> {
    let symbol = normalize_symbol(raw);
    if !is_valid_symbol(&symbol) {
        return Err(AppError::Validation(format!("invalid symbol: '{}'", raw)));
    }
    Ok(symbol)
}

/// Normalize a batch, dropping blanks and duplicates while keeping first-seen order.
pub fn normalize_symbols<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for symbol in raw.iter().map(|s| normalize_symbol(s.as_ref())) {
        if !symbol.is_empty() && !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbols_dedupes_and_uppercases() {
        let symbols = normalize_symbols(&[" aapl", "MSFT", "AAPL", "", "brk.b"]);
        assert_eq!(symbols, vec!["AAPL", "MSFT", "BRK.B"]);
    }

    #[test]
    fn test_symbol_validation() {
        assert!(is_valid_symbol("AAPL"));
        assert!(is_valid_symbol("^GSPC"));
        assert!(is_valid_symbol("EURUSD=X"));
        assert!(is_valid_symbol("ZZZZINVALID"));
        assert!(!is_valid_symbol("AA PL"));
        assert!(!is_valid_symbol(""));
        assert!(parse_symbol("drop table;").is_err());
    }
}
