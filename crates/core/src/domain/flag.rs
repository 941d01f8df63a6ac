use crate::domain::verdict::{Category, ClassificationResult, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted classification, as the monitoring views see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagRecord {
    pub id: Uuid,
    pub input_text: String,
    pub input_type: Category,
    pub verdict: Verdict,
    pub confidence: u8,
    pub reasons: Vec<String>,
    pub evidence: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub reported: bool,
    /// When the flag was escalated to the regulator.
    pub reported_at: Option<DateTime<Utc>>,
    /// Whether the escalation was filed without the reporter's identity.
    pub anonymous: bool,
}

impl FlagRecord {
    pub fn from_result(
        input_text: impl Into<String>,
        input_type: Category,
        result: &ClassificationResult,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            input_text: input_text.into(),
            input_type,
            verdict: result.verdict,
            confidence: result.confidence,
            reasons: result.reasons.clone(),
            evidence: result.evidence_refs.clone(),
            created_at,
            reported: false,
            reported_at: None,
            anonymous: false,
        }
    }
}
