use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "HIGH RISK", alias = "HIGH_RISK")]
    HighRisk,
    #[serde(rename = "WATCH")]
    Watch,
    #[serde(rename = "LIKELY SAFE", alias = "LIKELY_SAFE")]
    LikelySafe,
}

impl Verdict {
    pub const ALL: [Verdict; 3] = [Verdict::HighRisk, Verdict::Watch, Verdict::LikelySafe];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::HighRisk => "HIGH RISK",
            Verdict::Watch => "WATCH",
            Verdict::LikelySafe => "LIKELY SAFE",
        }
    }

    /// Lenient parse used on model output. Underscore and space forms are both accepted,
    /// case-insensitively; anything else is `Watch`.
    pub fn from_raw(raw: &str) -> Self {
        let folded = raw
            .trim()
            .to_ascii_uppercase()
            .replace(['_', '-'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match folded.as_str() {
            "HIGH RISK" => Verdict::HighRisk,
            "LIKELY SAFE" => Verdict::LikelySafe,
            _ => Verdict::Watch,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Advisor,
    #[default]
    Tip,
    Link,
    File,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Advisor => "advisor",
            Category::Tip => "tip",
            Category::Link => "link",
            Category::File => "file",
        }
    }

    /// Unknown hints fall back to `Tip`, the most common submission kind.
    pub fn from_hint(hint: &str) -> Self {
        match hint.trim().to_ascii_lowercase().as_str() {
            "advisor" => Category::Advisor,
            "link" => Category::Link,
            "file" => Category::File,
            _ => Category::Tip,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub content: String,
    pub category: Category,
}

impl ClassificationRequest {
    pub fn new(content: impl Into<String>, category: Category) -> Self {
        Self {
            content: content.into(),
            category,
        }
    }
}

/// Which strategy in the fallback chain produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Llm,
    Heuristic,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub verdict: Verdict,
    pub confidence: u8,
    pub reasons: Vec<String>,
    pub evidence_refs: Vec<String>,
    pub tier: Tier,
}
