use crate::screening::{contains_any, ScreeningVerdict};
use serde::Serialize;

const KNOWN_FAKE_PLATFORMS: &[&str] = &["trusttrade pro", "quickprofit app", "investmax123"];
const REGISTERED_BROKERS: &[&str] = &["zerodha", "upstox", "groww"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformVerification {
    pub confidence_score: u8,
    pub verdict: ScreeningVerdict,
    pub reasoning: &'static str,
    pub evidence_link: &'static str,
}

pub fn verify_platform(name: &str) -> PlatformVerification {
    let name = name.trim();
    if name.is_empty() {
        return PlatformVerification {
            confidence_score: 50,
            verdict: ScreeningVerdict::Watch,
            reasoning: "No name provided. Further verification needed against official app stores and SEBI investor alerts.",
            evidence_link: "https://www.sebi.gov.in/",
        };
    }

    if contains_any(name, KNOWN_FAKE_PLATFORMS) {
        // 25 +/- 5, jittered by name length so repeated lookups stay stable.
        let jitter = (name.chars().count() % 11) as i32 - 5;
        let score = (25 + jitter).clamp(20, 30) as u8;
        return PlatformVerification {
            confidence_score: score,
            verdict: ScreeningVerdict::HighRisk,
            reasoning: "Name resembles common fake platforms attempting to impersonate legitimate brokers; likely unregistered and risky.",
            evidence_link: "https://www.sebi.gov.in/investors.html",
        };
    }

    if contains_any(name, REGISTERED_BROKERS) {
        return PlatformVerification {
            confidence_score: 90,
            verdict: ScreeningVerdict::Safe,
            reasoning: "Recognized, registered platform with established presence in India; matches legitimate broker names.",
            evidence_link: "https://www.nseindia.com/market-data/sebi-registered-intermediaries",
        };
    }

    PlatformVerification {
        confidence_score: 50,
        verdict: ScreeningVerdict::Watch,
        reasoning: "Unable to confirm legitimacy from name alone. Recommend checking official broker lists and app store publisher details.",
        evidence_link: "https://www.sebi.gov.in/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_platform_scores_in_band() {
        for name in ["TrustTrade Pro", "QuickProfit App download", "investmax123"] {
            let v = verify_platform(name);
            assert_eq!(v.verdict, ScreeningVerdict::HighRisk);
            assert!((20..=30).contains(&v.confidence_score), "{name}");
        }
    }

    #[test]
    fn registered_broker_is_safe() {
        let v = verify_platform("Zerodha Kite");
        assert_eq!(v.verdict, ScreeningVerdict::Safe);
        assert_eq!(v.confidence_score, 90);
    }

    #[test]
    fn unknown_or_empty_is_watch() {
        assert_eq!(verify_platform("").verdict, ScreeningVerdict::Watch);
        assert_eq!(verify_platform("Some New App").confidence_score, 50);
    }
}
