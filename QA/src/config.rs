use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_DOCUMENTS: &str = "public/budget.pdf,public/transcript.pdf";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Runtime settings, read from the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Ordered; the corpus keeps this order.
    pub documents: Vec<PathBuf>,
    pub bind_addr: String,
    pub verbose: bool,
    pub max_corpus_tokens: Option<usize>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = var("OPENAI_API_KEY")
            .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let max_tokens = match var("OPENAI_MAX_TOKENS") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("OPENAI_MAX_TOKENS is not a valid integer: {}", v))?,
            None => DEFAULT_MAX_TOKENS,
        };

        let temperature = match var("OPENAI_TEMPERATURE") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("OPENAI_TEMPERATURE is not a valid number: {}", v))?,
            None => DEFAULT_TEMPERATURE,
        };

        let max_corpus_tokens = match var("NIRMAI_MAX_CORPUS_TOKENS") {
            Some(v) => Some(v.trim().parse().with_context(|| {
                format!("NIRMAI_MAX_CORPUS_TOKENS is not a valid integer: {}", v)
            })?),
            None => None,
        };

        let documents = var("NIRMAI_DOCUMENTS")
            .unwrap_or_else(|| DEFAULT_DOCUMENTS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .collect::<Vec<_>>();

        if documents.is_empty() {
            return Err(anyhow::anyhow!("NIRMAI_DOCUMENTS lists no files"));
        }

        let verbose = var("NIRMAI_VERBOSE")
            .map(|v| {
                matches!(
                    v.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes" | "on"
                )
            })
            .unwrap_or(false);

        Ok(Self {
            api_key,
            base_url: var("OPENAI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens,
            temperature,
            documents,
            bind_addr: var("NIRMAI_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            verbose,
            max_corpus_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_original_deployment() {
        let config = Config::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-test")])).unwrap();

        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.max_tokens, 500);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(
            config.documents,
            vec![PathBuf::from("public/budget.pdf"), PathBuf::from("public/transcript.pdf")]
        );
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert!(!config.verbose);
        assert_eq!(config.max_corpus_tokens, None);
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        assert!(Config::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://localhost:9999/"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("OPENAI_MAX_TOKENS", "128"),
            ("OPENAI_TEMPERATURE", "0.2"),
            ("NIRMAI_DOCUMENTS", " a.pdf , ,b.pdf,c.pdf "),
            ("NIRMAI_VERBOSE", "TRUE"),
            ("NIRMAI_MAX_CORPUS_TOKENS", "4000"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:9999");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, 128);
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(
            config.documents,
            vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf"), PathBuf::from("c.pdf")]
        );
        assert!(config.verbose);
        assert_eq!(config.max_corpus_tokens, Some(4000));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MAX_TOKENS", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("OPENAI_MAX_TOKENS"));

        assert!(Config::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("NIRMAI_DOCUMENTS", " , "),
        ]))
        .is_err());
    }
}
