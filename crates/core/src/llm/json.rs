use crate::domain::contract::{LlmVerdictPayload, RawVerdict};
use anyhow::Context;
use regex::Regex;
use std::sync::OnceLock;

/// How a verdict was recovered from model text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePath {
    StrictJson,
    RegexFields,
}

/// The first `{` to the last `}` of the model text, after any Markdown fence is removed.
pub fn extract_json(text: &str) -> Option<String> {
    let body = strip_fence(text.trim());
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(body[start..=end].trim().to_string())
}

// Handles ```json ... ```, bare ``` fences and single-line fences.
fn strip_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.trim_end().strip_suffix("```").unwrap_or(rest);
    rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric())
}

pub fn parse_strict(text: &str) -> anyhow::Result<RawVerdict> {
    let json_str = extract_json(text).context("no JSON object in model output")?;
    let payload = serde_json::from_str::<LlmVerdictPayload>(&json_str)
        .with_context(|| format!("model output is not valid verdict JSON: {json_str}"))?;
    Ok(payload.into_raw())
}

/// Field-by-field recovery for near-JSON output. Each field is optional; defaults are applied
/// later during normalization.
pub fn parse_fields(text: &str) -> RawVerdict {
    let verdict = verdict_re()
        .captures(text)
        .map(|c| c[1].trim().to_ascii_uppercase());

    let confidence = confidence_re()
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok());

    let reasons = reasons_re()
        .captures(text)
        .map(|c| {
            c[1].split(',')
                .map(|r| r.trim().replace('"', ""))
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect()
        })
        .unwrap_or_default();

    RawVerdict {
        verdict,
        confidence,
        reasons,
    }
}

/// Strict JSON first, field regexes second. Never fails.
pub fn parse_verdict_text(text: &str) -> (RawVerdict, ParsePath) {
    match parse_strict(text) {
        Ok(raw) => (raw, ParsePath::StrictJson),
        Err(err) => {
            tracing::warn!(
                error = %err,
                "strict JSON parse failed; falling back to field extraction"
            );
            (parse_fields(text), ParsePath::RegexFields)
        }
    }
}

fn verdict_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)verdict["\s]*:["\s]*"([^"]+)""#).expect("verdict regex")
    })
}

fn confidence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)confidence["\s]*:["\s]*(-?\d+)"#).expect("confidence regex")
    })
}

fn reasons_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)reasons["\s]*:["\s]*\[(.*?)\]"#).expect("reasons regex")
    })
}
