use crate::classify::heuristic::percent_claims;
use crate::screening::{contains_any, ScreeningVerdict};
use serde::Serialize;

const RISK_KEYWORDS: &[&str] = &[
    "300% revenue",
    "sebi approval",
    "fake news",
    "guaranteed",
    "leaked",
    "insider",
    "act now",
    "limited time",
    "double your",
];

const GOVERNANCE_KEYWORDS: &[&str] = &[
    "stable quarterly",
    "as per filings",
    "board approved",
    "regulatory approvals",
    "press release",
    "audited results",
    "conference call",
    "earnings release",
];

const BASELINE: i32 = 60;
const EXTREME_PERCENT: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnouncementAnalysis {
    pub credibility: u8,
    pub verdict: ScreeningVerdict,
    pub reasoning: String,
    pub evidence_link: &'static str,
}

pub fn analyze_announcement(text: &str) -> AnnouncementAnalysis {
    let text = text.trim();
    if text.is_empty() {
        return AnnouncementAnalysis {
            credibility: 50,
            verdict: ScreeningVerdict::Watch,
            reasoning: "No content provided. Further verification needed via official exchange filings.".to_string(),
            evidence_link: "https://www.nseindia.com/",
        };
    }

    let extreme_percent = percent_claims(text).any(|p| p >= EXTREME_PERCENT);
    let risk_words = contains_any(text, RISK_KEYWORDS);
    let governance = contains_any(text, GOVERNANCE_KEYWORDS);

    let mut credibility = BASELINE;
    if extreme_percent {
        credibility -= 25;
    }
    if risk_words {
        credibility -= 20;
    }
    if governance {
        credibility += 20;
    }
    let credibility = credibility.clamp(0, 100) as u8;

    if extreme_percent || risk_words {
        let mut bits = Vec::new();
        if extreme_percent {
            bits.push("contains extreme percentage claims");
        }
        if risk_words {
            bits.push("uses promotional or unsubstantiated language");
        }
        return AnnouncementAnalysis {
            credibility: credibility.min(35),
            verdict: ScreeningVerdict::HighRisk,
            reasoning: format!(
                "Flagged as suspicious: {} without official backing.",
                bits.join(" and ")
            ),
            evidence_link: "https://www.sebi.gov.in/",
        };
    }

    if governance {
        return AnnouncementAnalysis {
            credibility: credibility.max(85),
            verdict: ScreeningVerdict::Safe,
            reasoning: "Contains governance/filing cues typical of legitimate disclosures (e.g., board approvals, audited results).".to_string(),
            evidence_link: "https://www.bseindia.com/",
        };
    }

    AnnouncementAnalysis {
        credibility,
        verdict: ScreeningVerdict::Watch,
        reasoning: "No clear indicators of credibility or manipulation. Recommend checking exchange announcements for confirmation.".to_string(),
        evidence_link: "https://www.nseindia.com/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_watch() {
        let a = analyze_announcement("  ");
        assert_eq!(a.verdict, ScreeningVerdict::Watch);
        assert_eq!(a.credibility, 50);
    }

    #[test]
    fn promotional_claims_are_high_risk() {
        let a = analyze_announcement(
            "Company ABC announces a special guaranteed dividend of 25% next month. Act now!",
        );
        assert_eq!(a.verdict, ScreeningVerdict::HighRisk);
        assert_eq!(a.credibility, 35);
        assert!(a.reasoning.contains("promotional"));
    }

    #[test]
    fn extreme_percent_with_risk_words_stacks() {
        let a = analyze_announcement("Leaked: 400% profit jump expected");
        assert_eq!(a.verdict, ScreeningVerdict::HighRisk);
        assert_eq!(a.credibility, 15);
        assert!(a.reasoning.contains("extreme percentage claims and"));
    }

    #[test]
    fn governance_cues_are_safe() {
        let a = analyze_announcement(
            "XYZ Ltd. board approved the acquisition, subject to customary regulatory approvals.",
        );
        assert_eq!(a.verdict, ScreeningVerdict::Safe);
        assert_eq!(a.credibility, 85);
    }

    #[test]
    fn neutral_text_is_watch_at_baseline() {
        let a = analyze_announcement("The company will hold its annual general meeting in May.");
        assert_eq!(a.verdict, ScreeningVerdict::Watch);
        assert_eq!(a.credibility, 60);
    }
}
