//! Offline keyword/pattern scorer, the last tier of the classifier.
//!
//! Pure and deterministic: the same text always yields the same verdict, confidence and
//! reasons, in rule order.

use crate::domain::contract::RawVerdict;
use crate::domain::verdict::Verdict;
use anyhow::Context;
use regex::Regex;

pub const NO_RED_FLAGS_REASON: &str = "No red flags detected in the submitted content";

#[derive(Debug, Clone)]
pub enum Matcher {
    /// Case-insensitive regex.
    Pattern(Regex),
    /// Any `N%` figure at or above the threshold.
    PercentAtLeast(f64),
}

impl Matcher {
    fn matches(&self, text: &str) -> bool {
        match self {
            Matcher::Pattern(re) => re.is_match(text),
            Matcher::PercentAtLeast(min) => percent_claims(text).any(|p| p >= *min),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RiskRule {
    pub reason: String,
    pub weight: u32,
    pub matcher: Matcher,
}

impl RiskRule {
    pub fn pattern(reason: &str, weight: u32, pattern: &str) -> anyhow::Result<Self> {
        let re = Regex::new(&format!("(?i){pattern}"))
            .with_context(|| format!("invalid heuristic pattern: {pattern}"))?;
        Ok(Self {
            reason: reason.to_string(),
            weight,
            matcher: Matcher::Pattern(re),
        })
    }
}

#[derive(Debug, Clone)]
pub struct HeuristicConfig {
    pub rules: Vec<RiskRule>,
    pub high_risk_threshold: u32,
    pub watch_threshold: u32,
    pub high_risk_confidence: u8,
    pub watch_confidence: u8,
    pub safe_confidence: u8,
}

impl HeuristicConfig {
    pub fn with_default_rules() -> anyhow::Result<Self> {
        let rules = vec![
            RiskRule::pattern("Promises guaranteed returns", 30, r"\bguarantee(d|s)?\b")?,
            RiskRule::pattern(
                "Claims the investment will double or multiply",
                30,
                r"\b(doubl(e|es|ing) your|multiply your|multibagger)\b",
            )?,
            RiskRule::pattern(
                "Describes the opportunity as risk-free",
                25,
                r"\b(risk[- ]free|no risk|zero risk)\b",
            )?,
            RiskRule {
                reason: "Makes unrealistic percentage return claims".to_string(),
                weight: 25,
                matcher: Matcher::PercentAtLeast(100.0),
            },
            RiskRule::pattern(
                "References insider or leaked information",
                25,
                r"\b(insider|leaked|confidential (tip|source)s?|sure[- ]shot)\b",
            )?,
            RiskRule::pattern(
                "Uses urgency or pressure language",
                20,
                r"\b(act now|limited time|hurry|last chance|today only|don'?t miss|before it'?s too late)\b",
            )?,
            RiskRule::pattern(
                "Claims regulatory approval without evidence",
                20,
                r"\b(sebi|sec)[- ](approved|approval|certified)\b",
            )?,
            RiskRule::pattern(
                "Mentions price manipulation cues",
                20,
                r"\b(pump|upper circuit|operator (game|play)|jackpot stock)\b",
            )?,
            RiskRule::pattern(
                "Promises returns within days",
                15,
                r"\b(in|within) \d{1,2} (days?|hours?)\b",
            )?,
            RiskRule::pattern(
                "Moves the conversation to private messaging groups",
                15,
                r"\b(whatsapp|telegram) (group|channel|me)\b",
            )?,
        ];

        Ok(Self {
            rules,
            high_risk_threshold: 50,
            watch_threshold: 25,
            high_risk_confidence: 90,
            watch_confidence: 75,
            safe_confidence: 85,
        })
    }
}

#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    config: HeuristicConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicScore {
    pub score: u32,
    pub verdict: Verdict,
    pub confidence: u8,
    pub reasons: Vec<String>,
}

impl HeuristicScorer {
    pub fn new(config: HeuristicConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::new(HeuristicConfig::with_default_rules()?))
    }

    pub fn score(&self, text: &str) -> HeuristicScore {
        let mut score = 0u32;
        let mut reasons = Vec::new();
        for rule in &self.config.rules {
            if rule.matcher.matches(text) {
                score = score.saturating_add(rule.weight);
                reasons.push(rule.reason.clone());
            }
        }

        let c = &self.config;
        let (verdict, confidence) = if score >= c.high_risk_threshold {
            (Verdict::HighRisk, c.high_risk_confidence)
        } else if score >= c.watch_threshold {
            (Verdict::Watch, c.watch_confidence)
        } else {
            (Verdict::LikelySafe, c.safe_confidence)
        };

        if reasons.is_empty() {
            reasons.push(NO_RED_FLAGS_REASON.to_string());
        }

        HeuristicScore {
            score,
            verdict,
            confidence,
            reasons,
        }
    }

    pub fn raw_verdict(&self, text: &str) -> RawVerdict {
        let scored = self.score(text);
        tracing::debug!(
            score = scored.score,
            verdict = %scored.verdict,
            matched = scored.reasons.len(),
            "heuristic score"
        );
        RawVerdict {
            verdict: Some(scored.verdict.as_str().to_string()),
            confidence: Some(f64::from(scored.confidence)),
            reasons: scored.reasons,
        }
    }
}

/// Every `N%` figure in the text, in order.
pub fn percent_claims(text: &str) -> impl Iterator<Item = f64> + '_ {
    static_percent_re()
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<f64>().ok())
}

fn static_percent_re() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,4}(?:\.\d+)?)\s*%").expect("percent regex"))
}
