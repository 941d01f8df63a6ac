//! Corporate-announcement and trading-platform screens. The keyword scorers are offline and
//! deterministic; [`corporate::CorporateChecker`] blends them with an optional model assessment
//! and an exchange-filings lookup.

use serde::Serialize;

pub mod announcement;
pub mod assessment;
pub mod corporate;
pub mod filings;
pub mod platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScreeningVerdict {
    #[serde(rename = "HIGH RISK")]
    HighRisk,
    #[serde(rename = "WATCH")]
    Watch,
    #[serde(rename = "SAFE")]
    Safe,
}

impl ScreeningVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScreeningVerdict::HighRisk => "HIGH RISK",
            ScreeningVerdict::Watch => "WATCH",
            ScreeningVerdict::Safe => "SAFE",
        }
    }

    /// Anything other than the three labels (underscores tolerated) is `Watch`.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().replace('_', " ").as_str() {
            "HIGH RISK" => ScreeningVerdict::HighRisk,
            "SAFE" => ScreeningVerdict::Safe,
            _ => ScreeningVerdict::Watch,
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let h = haystack.to_lowercase();
    needles.iter().any(|n| h.contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_labels_are_lenient() {
        assert_eq!(ScreeningVerdict::from_raw("high_risk"), ScreeningVerdict::HighRisk);
        assert_eq!(ScreeningVerdict::from_raw(" safe "), ScreeningVerdict::Safe);
        assert_eq!(ScreeningVerdict::from_raw("LIKELY SAFE"), ScreeningVerdict::Watch);
    }
}
