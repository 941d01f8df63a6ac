use crate::config::Settings;
use crate::domain::contract::RawVerdict;
use crate::domain::verdict::{Category, ClassificationRequest, ClassificationResult, Tier, Verdict};
use crate::llm::json::parse_verdict_text;
use crate::llm::prompt::classification_prompt;
use crate::llm::LlmClient;
use std::sync::Arc;

pub mod heuristic;

use heuristic::HeuristicScorer;

pub const FALLBACK_CONFIDENCE: u8 = 50;
pub const FALLBACK_REASON: &str = "System error, fallback response";
pub const EMPTY_CONTENT_REASON: &str = "No content provided; nothing to analyze";

/// One strategy in the fallback chain. An `Err` means "this tier could not decide"; the
/// classifier moves on to the next one.
#[async_trait::async_trait]
pub trait ClassificationTier: Send + Sync {
    fn tier(&self) -> Tier;

    async fn attempt(&self, req: &ClassificationRequest) -> anyhow::Result<RawVerdict>;
}

pub struct LlmTier {
    client: Arc<dyn LlmClient>,
}

impl LlmTier {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl ClassificationTier for LlmTier {
    fn tier(&self) -> Tier {
        Tier::Llm
    }

    async fn attempt(&self, req: &ClassificationRequest) -> anyhow::Result<RawVerdict> {
        let prompt = classification_prompt(req);
        let text = self.client.generate(&prompt).await?;
        let (raw, path) = parse_verdict_text(&text);
        tracing::info!(
            provider = self.client.provider().as_str(),
            parse_path = ?path,
            category = %req.category,
            "model verdict parsed"
        );
        Ok(raw)
    }
}

pub struct HeuristicTier {
    scorer: HeuristicScorer,
}

impl HeuristicTier {
    pub fn new(scorer: HeuristicScorer) -> Self {
        Self { scorer }
    }
}

#[async_trait::async_trait]
impl ClassificationTier for HeuristicTier {
    fn tier(&self) -> Tier {
        Tier::Heuristic
    }

    async fn attempt(&self, req: &ClassificationRequest) -> anyhow::Result<RawVerdict> {
        Ok(self.scorer.raw_verdict(&req.content))
    }
}

/// Ordered fallback chain: model first (when configured), heuristic scorer last.
/// [`Classifier::classify`] is total.
pub struct Classifier {
    tiers: Vec<Box<dyn ClassificationTier>>,
    evidence_refs: Vec<String>,
}

impl Classifier {
    pub fn new(tiers: Vec<Box<dyn ClassificationTier>>, evidence_refs: Vec<String>) -> Self {
        Self {
            tiers,
            evidence_refs,
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let llm = crate::llm::client_from_settings(settings);
        if llm.is_none() {
            tracing::info!("no model credential configured; classifier runs heuristic-only");
        }
        Self::with_llm(llm, settings.evidence_urls.clone())
    }

    pub fn with_llm(
        llm: Option<Arc<dyn LlmClient>>,
        evidence_refs: Vec<String>,
    ) -> anyhow::Result<Self> {
        let mut tiers: Vec<Box<dyn ClassificationTier>> = Vec::new();
        if let Some(client) = llm {
            tiers.push(Box::new(LlmTier::new(client)));
        }
        tiers.push(Box::new(HeuristicTier::new(HeuristicScorer::with_defaults()?)));
        Ok(Self::new(tiers, evidence_refs))
    }

    pub fn evidence_refs(&self) -> &[String] {
        &self.evidence_refs
    }

    pub async fn classify(&self, content: &str, category: Category) -> ClassificationResult {
        self.classify_request(&ClassificationRequest::new(content, category))
            .await
    }

    pub async fn classify_request(&self, req: &ClassificationRequest) -> ClassificationResult {
        if req.content.trim().is_empty() {
            return self.fallback(EMPTY_CONTENT_REASON);
        }

        for tier in &self.tiers {
            match tier.attempt(req).await {
                Ok(raw) => {
                    let result = raw.normalize(tier.tier(), &self.evidence_refs);
                    tracing::info!(
                        tier = ?result.tier,
                        verdict = %result.verdict,
                        confidence = result.confidence,
                        "classification complete"
                    );
                    return result;
                }
                Err(err) => {
                    tracing::warn!(
                        tier = ?tier.tier(),
                        error = %err,
                        "classification tier failed; trying next"
                    );
                }
            }
        }

        tracing::error!("all classification tiers failed; returning fallback verdict");
        self.fallback(FALLBACK_REASON)
    }

    fn fallback(&self, reason: &str) -> ClassificationResult {
        ClassificationResult {
            verdict: Verdict::Watch,
            confidence: FALLBACK_CONFIDENCE,
            reasons: vec![reason.to_string()],
            evidence_refs: self.evidence_refs.clone(),
            tier: Tier::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_EVIDENCE_URLS;
    use crate::llm::Provider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CannedLlm {
        reply: Option<String>,
        calls: AtomicUsize,
    }

    impl CannedLlm {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(text.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for CannedLlm {
        fn provider(&self) -> Provider {
            Provider::Gemini
        }

        async fn generate(&self, _prompt: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Some(text) => Ok(text.clone()),
                None => anyhow::bail!("quota exceeded"),
            }
        }
    }

    struct AlwaysFails;

    #[async_trait::async_trait]
    impl ClassificationTier for AlwaysFails {
        fn tier(&self) -> Tier {
            Tier::Llm
        }

        async fn attempt(&self, _req: &ClassificationRequest) -> anyhow::Result<RawVerdict> {
            anyhow::bail!("unavailable")
        }
    }

    fn evidence() -> Vec<String> {
        DEFAULT_EVIDENCE_URLS.iter().map(|s| s.to_string()).collect()
    }

    fn assert_contract(r: &ClassificationResult) {
        assert!(Verdict::ALL.contains(&r.verdict));
        assert!(r.confidence <= 100);
        assert!(!r.reasons.is_empty());
    }

    #[tokio::test]
    async fn offline_scenario_high_risk() {
        let classifier = Classifier::with_llm(None, evidence()).unwrap();
        let r = classifier
            .classify(
                "Invest ₹10,000 today and double your money in 7 days — guaranteed returns!",
                Category::Tip,
            )
            .await;
        assert_eq!(r.verdict, Verdict::HighRisk);
        assert_eq!(r.confidence, 90);
        assert!(r.reasons.len() >= 2);
        assert_eq!(r.tier, Tier::Heuristic);
        assert_eq!(r.evidence_refs, evidence());
    }

    #[tokio::test]
    async fn offline_scenario_likely_safe() {
        let classifier = Classifier::with_llm(None, evidence()).unwrap();
        let r = classifier
            .classify(
                "Consider diversified mutual funds for long-term wealth creation",
                Category::Advisor,
            )
            .await;
        assert_eq!(r.verdict, Verdict::LikelySafe);
        assert_eq!(r.confidence, 85);
        assert_eq!(r.reasons, vec![heuristic::NO_RED_FLAGS_REASON.to_string()]);
    }

    #[tokio::test]
    async fn offline_classification_is_repeatable() {
        let classifier = Classifier::with_llm(None, evidence()).unwrap();
        let text = "Hurry, limited time insider tip on XYZ";
        let a = classifier.classify(text, Category::Tip).await;
        let b = classifier.classify(text, Category::Tip).await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn model_verdict_is_normalized() {
        let llm = CannedLlm::replying(
            "```json\n{\"verdict\": \"HIGH_RISK\", \"confidence\": 150, \
             \"reasons\": [\"Impersonates a broker\"]}\n```",
        );
        let classifier = Classifier::with_llm(Some(llm.clone()), evidence()).unwrap();
        let r = classifier.classify("anything", Category::Link).await;
        assert_eq!(r.verdict, Verdict::HighRisk);
        assert_eq!(r.confidence, 100);
        assert_eq!(r.reasons, vec!["Impersonates a broker".to_string()]);
        assert_eq!(r.tier, Tier::Llm);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn negative_confidence_clamps_to_zero() {
        let llm =
            CannedLlm::replying("{\"verdict\": \"WATCH\", \"confidence\": -10, \"reasons\": []}");
        let classifier = Classifier::with_llm(Some(llm), evidence()).unwrap();
        let r = classifier.classify("anything", Category::Tip).await;
        assert_eq!(r.confidence, 0);
        assert_eq!(r.reasons, vec!["Analysis completed".to_string()]);
    }

    #[tokio::test]
    async fn unknown_model_verdict_becomes_watch() {
        let llm = CannedLlm::replying(
            "{\"verdict\": \"SCAM\", \"confidence\": 80, \"reasons\": [\"x\"]}",
        );
        let classifier = Classifier::with_llm(Some(llm), evidence()).unwrap();
        let r = classifier.classify("anything", Category::Tip).await;
        assert_eq!(r.verdict, Verdict::Watch);
        assert_eq!(r.confidence, 80);
    }

    #[tokio::test]
    async fn prose_reply_uses_field_defaults() {
        let llm = CannedLlm::replying("Looks suspicious to me, but I cannot be sure.");
        let classifier = Classifier::with_llm(Some(llm), evidence()).unwrap();
        let r = classifier.classify("anything", Category::Tip).await;
        assert_eq!(r.tier, Tier::Llm);
        assert_eq!(r.verdict, Verdict::Watch);
        assert_eq!(r.confidence, 75);
        assert_eq!(r.reasons, vec!["Analysis completed".to_string()]);
    }

    #[tokio::test]
    async fn model_error_falls_through_to_heuristic() {
        let llm = CannedLlm::failing();
        let classifier = Classifier::with_llm(Some(llm.clone()), evidence()).unwrap();
        let r = classifier
            .classify("Guaranteed 200% returns, act now!", Category::Tip)
            .await;
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        assert_eq!(r.tier, Tier::Heuristic);
        assert_eq!(r.verdict, Verdict::HighRisk);
        assert_contract(&r);
    }

    #[tokio::test]
    async fn exhausted_chain_returns_watch_fifty() {
        let classifier = Classifier::new(vec![Box::new(AlwaysFails)], evidence());
        let r = classifier.classify("anything", Category::File).await;
        assert_eq!(r.verdict, Verdict::Watch);
        assert_eq!(r.confidence, FALLBACK_CONFIDENCE);
        assert_eq!(r.reasons, vec![FALLBACK_REASON.to_string()]);
        assert_eq!(r.tier, Tier::Fallback);
    }

    #[tokio::test]
    async fn empty_content_skips_tiers() {
        let llm = CannedLlm::replying("{\"verdict\": \"HIGH_RISK\"}");
        let classifier = Classifier::with_llm(Some(llm.clone()), evidence()).unwrap();
        let r = classifier.classify("   ", Category::Tip).await;
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
        assert_eq!(r.verdict, Verdict::Watch);
        assert_eq!(r.confidence, 50);
        assert_contract(&r);
    }
}
