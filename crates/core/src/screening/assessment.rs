use crate::llm::json::extract_json;
use crate::llm::prompt::announcement_prompt;
use crate::llm::LlmClient;
use crate::screening::ScreeningVerdict;
use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_CREDIBILITY: f64 = 50.0;
const DEFAULT_REASONING: &str = "LLM reasoning unavailable.";

/// Model view of an announcement's credibility.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnouncementAssessment {
    pub credibility: u8,
    pub verdict: ScreeningVerdict,
    pub reasoning: String,
}

#[derive(Debug, Deserialize)]
struct AssessmentPayload {
    #[serde(default, rename = "credibilityScore", alias = "credibility_score")]
    credibility_score: Option<Value>,
    #[serde(default)]
    verdict: Option<String>,
    #[serde(default)]
    reasoning: Option<Value>,
}

pub async fn assess_announcement(
    client: &dyn LlmClient,
    text: &str,
) -> anyhow::Result<AnnouncementAssessment> {
    let text = text.trim();
    anyhow::ensure!(!text.is_empty(), "empty announcement");

    let out = client.generate(&announcement_prompt(text)).await?;
    parse_assessment(&out)
}

/// Strict parse only; there is no field-level salvage for this prompt.
pub fn parse_assessment(text: &str) -> anyhow::Result<AnnouncementAssessment> {
    let json_str = extract_json(text).context("no JSON object in model output")?;
    let payload = serde_json::from_str::<AssessmentPayload>(&json_str)
        .with_context(|| format!("model output is not valid assessment JSON: {json_str}"))?;

    let credibility = payload
        .credibility_score
        .as_ref()
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|v| v.is_finite())
        .unwrap_or(DEFAULT_CREDIBILITY)
        .round()
        .clamp(0.0, 100.0) as u8;

    let reasoning = match payload.reasoning {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => DEFAULT_REASONING.to_string(),
    };

    Ok(AnnouncementAssessment {
        credibility,
        verdict: payload
            .verdict
            .as_deref()
            .map(ScreeningVerdict::from_raw)
            .unwrap_or(ScreeningVerdict::Watch),
        reasoning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Provider;

    struct Replying(&'static str);

    #[async_trait::async_trait]
    impl LlmClient for Replying {
        fn provider(&self) -> Provider {
            Provider::Gemini
        }

        async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            assert!(prompt.contains("compliance analyst"));
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn reads_fenced_assessment() {
        let llm = Replying(
            "```json\n{\"credibilityScore\": 22, \"verdict\": \"HIGH RISK\", \
             \"reasoning\": \"Promotional tone.\"}\n```",
        );
        let a = assess_announcement(&llm, "Guaranteed 300% dividend").await.unwrap();
        assert_eq!(a.credibility, 22);
        assert_eq!(a.verdict, ScreeningVerdict::HighRisk);
        assert_eq!(a.reasoning, "Promotional tone.");
    }

    #[test]
    fn out_of_range_fields_are_normalized() {
        let a = parse_assessment("{\"credibilityScore\": 140.6, \"verdict\": \"MAYBE\"}").unwrap();
        assert_eq!(a.credibility, 100);
        assert_eq!(a.verdict, ScreeningVerdict::Watch);
        assert_eq!(a.reasoning, DEFAULT_REASONING);

        let a = parse_assessment("{\"credibilityScore\": \"n/a\", \"verdict\": \"SAFE\"}").unwrap();
        assert_eq!(a.credibility, 50);
        assert_eq!(a.verdict, ScreeningVerdict::Safe);
    }

    #[test]
    fn prose_without_json_is_an_error() {
        assert!(parse_assessment("Looks fine to me.").is_err());
    }

    #[tokio::test]
    async fn empty_text_skips_the_model() {
        assert!(assess_announcement(&Replying("{}"), "   ").await.is_err());
    }
}
