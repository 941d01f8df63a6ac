use crate::domain::verdict::{ClassificationResult, Tier, Verdict};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_CONFIDENCE: f64 = 75.0;
pub const DEFAULT_REASON: &str = "Analysis completed";

/// JSON shape the model is asked to emit. Every key is optional because models drift;
/// missing or mistyped values are filled in by [`RawVerdict::normalize`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmVerdictPayload {
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub confidence: Option<Value>,
    #[serde(default)]
    pub reasons: Option<Value>,
}

impl LlmVerdictPayload {
    pub fn into_raw(self) -> RawVerdict {
        RawVerdict {
            verdict: self.verdict,
            confidence: self.confidence.as_ref().and_then(number_like),
            reasons: self.reasons.map(reasons_from_value).unwrap_or_default(),
        }
    }
}

/// Tier output before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawVerdict {
    pub verdict: Option<String>,
    pub confidence: Option<f64>,
    pub reasons: Vec<String>,
}

impl RawVerdict {
    /// The single place the output contract is enforced: verdict coerced into the three
    /// known forms, confidence clamped to [0, 100], reasons never empty.
    pub fn normalize(self, tier: Tier, evidence_refs: &[String]) -> ClassificationResult {
        let verdict = self
            .verdict
            .as_deref()
            .map(Verdict::from_raw)
            .unwrap_or(Verdict::Watch);

        let confidence = clamp_confidence(self.confidence.unwrap_or(DEFAULT_CONFIDENCE));

        let mut reasons: Vec<String> = self
            .reasons
            .into_iter()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        if reasons.is_empty() {
            reasons.push(DEFAULT_REASON.to_string());
        }

        ClassificationResult {
            verdict,
            confidence,
            reasons,
            evidence_refs: evidence_refs.to_vec(),
            tier,
        }
    }
}

pub fn clamp_confidence(raw: f64) -> u8 {
    if raw.is_nan() {
        return DEFAULT_CONFIDENCE as u8;
    }
    raw.round().clamp(0.0, 100.0) as u8
}

fn number_like(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn reasons_from_value(v: Value) -> Vec<String> {
    match v {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(s) => vec![s],
        _ => Vec::new(),
    }
}
