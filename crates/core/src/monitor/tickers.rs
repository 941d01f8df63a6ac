use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Upper-case tokens that look like symbols but are not.
const NOT_TICKERS: &[&str] = &[
    "SEBI", "SEC", "NSE", "BSE", "IPO", "CEO", "CFO", "USD", "INR", "ACT", "NOW", "BUY", "SELL",
    "THE", "AND", "FOR", "YOU", "OTP", "KYC", "URGENT",
];

fn ticker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:\$|\b)([A-Z]{2,5})\b").expect("ticker regex"))
}

/// Symbol-like tokens (`$AAPL` or bare `AAPL`) in order of appearance, `$` stripped.
pub fn extract_tickers(text: &str) -> Vec<String> {
    ticker_re()
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .filter(|t| !NOT_TICKERS.contains(&t.as_str()))
        .collect()
}

pub fn mentions_ticker(text: &str, ticker: &str) -> bool {
    let ticker = ticker.trim().trim_start_matches('$').to_ascii_uppercase();
    !ticker.is_empty() && text.to_uppercase().contains(&ticker)
}

pub fn count_mentions<'a>(texts: impl IntoIterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for text in texts {
        for ticker in extract_tickers(text) {
            *counts.entry(ticker).or_insert(0) += 1;
        }
    }
    counts
}
