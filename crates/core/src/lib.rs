pub mod classify;
pub mod domain;
pub mod llm;
pub mod market;
pub mod monitor;
pub mod screening;
pub mod storage;
pub mod time;

pub mod config {
    use anyhow::Context;

    pub const DEFAULT_EVIDENCE_URLS: [&str; 2] =
        ["https://www.sebi.gov.in/", "https://www.investor.gov/"];

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub gemini_api_key: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub alpha_vantage_api_key: Option<String>,
        pub evidence_urls: Vec<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: non_empty_var("DATABASE_URL"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                gemini_api_key: non_empty_var("GEMINI_API_KEY"),
                anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
                alpha_vantage_api_key: non_empty_var("ALPHA_VANTAGE_API_KEY"),
                evidence_urls: parse_evidence_urls(std::env::var("EVIDENCE_URLS").ok()),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_gemini_api_key(&self) -> anyhow::Result<&str> {
            self.gemini_api_key
                .as_deref()
                .context("GEMINI_API_KEY is required")
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }

        pub fn require_alpha_vantage_api_key(&self) -> anyhow::Result<&str> {
            self.alpha_vantage_api_key
                .as_deref()
                .context("ALPHA_VANTAGE_API_KEY is required")
        }
    }

    // Blank values count as unset so an empty `KEY=` line in .env disables the tier.
    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn parse_evidence_urls(raw: Option<String>) -> Vec<String> {
        let parsed: Vec<String> = raw
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if parsed.is_empty() {
            DEFAULT_EVIDENCE_URLS.iter().map(|s| s.to_string()).collect()
        } else {
            parsed
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn evidence_urls_default_when_unset_or_blank() {
            assert_eq!(parse_evidence_urls(None).len(), 2);
            assert_eq!(parse_evidence_urls(Some(" , ".to_string())).len(), 2);
        }

        #[test]
        fn evidence_urls_split_on_commas() {
            let urls =
                parse_evidence_urls(Some("https://a.example/, https://b.example/".to_string()));
            assert_eq!(urls, vec!["https://a.example/", "https://b.example/"]);
        }
    }
}
