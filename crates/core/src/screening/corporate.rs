use crate::llm::LlmClient;
use crate::screening::announcement::{analyze_announcement, AnnouncementAnalysis};
use crate::screening::assessment::{assess_announcement, AnnouncementAssessment};
use crate::screening::filings::{search_exchange_filings, FilingEvidence, FilingsFeed};
use crate::screening::ScreeningVerdict;
use serde::Serialize;
use std::sync::Arc;

/// Credibility added when an exchange filing backs the announcement.
pub const FILING_MATCH_BONUS: i32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceItem {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorporateCheckReport {
    pub credibility: u8,
    pub verdict: ScreeningVerdict,
    pub reasoning: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<EvidenceItem>,
}

/// Announcement credibility from three sources: the model (when configured), the filings
/// lookup and the keyword scorer. The model's verdict wins when it answers.
pub struct CorporateChecker {
    llm: Option<Arc<dyn LlmClient>>,
    feed: Option<Arc<dyn FilingsFeed>>,
}

impl CorporateChecker {
    pub fn new(llm: Option<Arc<dyn LlmClient>>, feed: Option<Arc<dyn FilingsFeed>>) -> Self {
        Self { llm, feed }
    }

    pub fn feed(&self) -> Option<&dyn FilingsFeed> {
        self.feed.as_deref()
    }

    pub async fn check(&self, text: &str) -> CorporateCheckReport {
        let text = text.trim();

        let assessment = async {
            let llm = self.llm.as_deref().filter(|_| !text.is_empty())?;
            match assess_announcement(llm, text).await {
                Ok(a) => Some(a),
                Err(err) => {
                    tracing::warn!(
                        provider = llm.provider().as_str(),
                        error = %err,
                        "announcement assessment failed; using keyword scorer"
                    );
                    None
                }
            }
        };
        let filings = search_exchange_filings(self.feed.as_deref(), text);

        let (assessment, filings) = tokio::join!(assessment, filings);
        blend(assessment, filings, analyze_announcement(text))
    }
}

pub fn blend(
    assessment: Option<AnnouncementAssessment>,
    filings: Option<FilingEvidence>,
    keywords: AnnouncementAnalysis,
) -> CorporateCheckReport {
    let matched = filings.as_ref().is_some_and(|f| f.matched);

    let (base, verdict, reasoning) = match assessment {
        Some(a) => (a.credibility, a.verdict, a.reasoning),
        None => (keywords.credibility, keywords.verdict, keywords.reasoning),
    };
    let bonus = if matched { FILING_MATCH_BONUS } else { 0 };
    let credibility = (i32::from(base) + bonus).clamp(0, 100) as u8;

    let mut evidence = Vec::new();
    if let Some(f) = filings {
        evidence.push(EvidenceItem {
            label: f.title,
            url: Some(f.url),
            snippet: Some(f.snippet),
        });
    }
    if !matched {
        evidence.push(EvidenceItem {
            label: "Reference".to_string(),
            url: Some(keywords.evidence_link.to_string()),
            snippet: None,
        });
    }

    CorporateCheckReport {
        credibility,
        verdict,
        reasoning,
        evidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Provider;
    use crate::screening::filings::doubles::StaticFeed;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AnalystLlm {
        reply: anyhow::Result<&'static str>,
        calls: AtomicUsize,
    }

    impl AnalystLlm {
        fn replying(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(anyhow::anyhow!("timeout")),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for AnalystLlm {
        fn provider(&self) -> Provider {
            Provider::Gemini
        }

        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(s) => Ok(s.to_string()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    #[tokio::test]
    async fn model_verdict_wins_and_filing_match_adds_bonus() {
        let llm = AnalystLlm::replying(
            "{\"credibilityScore\": 97, \"verdict\": \"SAFE\", \
             \"reasoning\": \"Formal disclosure.\"}",
        );
        let checker = CorporateChecker::new(Some(llm.clone()), None);

        let report = checker
            .check("XYZ Ltd. board has approved the acquisition of LMN Pvt. Ltd.")
            .await;
        assert_eq!(report.verdict, ScreeningVerdict::Safe);
        assert_eq!(report.credibility, 100);
        assert_eq!(report.reasoning, "Formal disclosure.");
        assert_eq!(report.evidence.len(), 1);
        assert_eq!(
            report.evidence[0].label,
            "Board-approved corporate action (detected by pattern)"
        );
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_model_falls_back_to_keywords() {
        let feed = Arc::new(StaticFeed::failing());
        let checker = CorporateChecker::new(Some(AnalystLlm::failing()), Some(feed.clone()));

        let report = checker
            .check("Leaked: guaranteed 400% profit jump, act now")
            .await;
        assert_eq!(report.verdict, ScreeningVerdict::HighRisk);
        assert_eq!(report.credibility, 15);
        assert_eq!(report.evidence.len(), 2);
        assert_eq!(report.evidence[1].label, "Reference");
        assert_eq!(report.evidence[1].url.as_deref(), Some("https://www.sebi.gov.in/"));
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn feed_hit_boosts_keyword_credibility() {
        let feed = Arc::new(StaticFeed::serving(
            "<Item><Title>Infosys: audited results</Title></Item>",
        ));
        let checker = CorporateChecker::new(None, Some(feed));

        let report = checker
            .check("Infosys press release on audited results")
            .await;
        assert_eq!(report.verdict, ScreeningVerdict::Safe);
        assert_eq!(report.credibility, 90);
        assert_eq!(report.evidence.len(), 1);
    }

    #[tokio::test]
    async fn empty_text_skips_model_and_filings() {
        let llm = AnalystLlm::replying("{}");
        let checker = CorporateChecker::new(Some(llm.clone()), None);

        let report = checker.check("  ").await;
        assert_eq!(report.verdict, ScreeningVerdict::Watch);
        assert_eq!(report.credibility, 50);
        assert_eq!(report.evidence.len(), 1);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn evidence_is_omitted_from_json_when_empty() {
        let report = CorporateCheckReport {
            credibility: 50,
            verdict: ScreeningVerdict::Watch,
            reasoning: "r".to_string(),
            evidence: Vec::new(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("evidence").is_none());
        assert_eq!(json["verdict"], "WATCH");
    }
}
