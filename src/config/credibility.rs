// src/config/credibility.rs
//! Runtime configuration: TOML file plus env overrides.
//!
//! TOML shape:
//! ```toml
//! [scoring]
//! concurrency = 8
//! deadline_secs = 30   # 0 disables the deadline
//!
//! [twitter]
//! api_host = "https://api.twitter.com"
//! max_results = 100
//! timeout_secs = 10
//! ```
//!
//! The bearer token is never read from the file, only from `TWITTER_API_TOKEN`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::analyze::EvaluateOptions;

pub const DEFAULT_CONFIG_PATH: &str = "config/credibility.toml";

pub const ENV_CONFIG_PATH: &str = "CREDIBILITY_CONFIG_PATH";
pub const ENV_CONCURRENCY: &str = "CREDIBILITY_CONCURRENCY";
pub const ENV_MAX_RESULTS: &str = "CREDIBILITY_MAX_RESULTS";
pub const ENV_API_HOST: &str = "TWITTER_API_HOST";
pub const ENV_API_TOKEN: &str = "TWITTER_API_TOKEN";

pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_DEADLINE_SECS: u64 = 30;
pub const DEFAULT_MAX_RESULTS: u32 = 100;
pub const MIN_MAX_RESULTS: u32 = 10;

fn default_api_host() -> String {
    "https://api.twitter.com".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CredibilityConfig {
    pub scoring: ScoringSection,
    pub twitter: TwitterSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringSection {
    /// Upper bound on in-flight audience lookups per evaluation.
    pub concurrency: usize,
    /// Wall-clock limit for one evaluation, in seconds.
    pub deadline_secs: u64,
}

impl Default for ScoringSection {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            deadline_secs: DEFAULT_DEADLINE_SECS,
        }
    }
}

impl ScoringSection {
    pub fn options(&self) -> EvaluateOptions {
        EvaluateOptions {
            concurrency: self.concurrency.max(1),
            deadline: (self.deadline_secs > 0).then(|| Duration::from_secs(self.deadline_secs)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TwitterSection {
    pub api_host: String,
    pub max_results: u32,
    pub timeout_secs: u64,
    #[serde(skip)]
    pub bearer_token: Option<String>,
}

impl Default for TwitterSection {
    fn default() -> Self {
        Self {
            api_host: default_api_host(),
            max_results: DEFAULT_MAX_RESULTS,
            timeout_secs: default_timeout_secs(),
            bearer_token: None,
        }
    }
}

impl CredibilityConfig {
    /// Load using `CREDIBILITY_CONFIG_PATH` or `config/credibility.toml`.
    /// A missing default file yields defaults; a missing explicit path is an error.
    pub fn load() -> Result<Self> {
        let explicit = std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);
        let mut cfg = match explicit {
            Some(path) => Self::load_from_file(&path)?,
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::load_from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };
        cfg.apply_env_overrides();
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading credibility config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing credibility config at {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: CredibilityConfig = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(n) = parse_env::<usize>(ENV_CONCURRENCY) {
            self.scoring.concurrency = n;
        }
        if let Some(n) = parse_env::<u32>(ENV_MAX_RESULTS) {
            self.twitter.max_results = n;
        }
        if let Ok(host) = std::env::var(ENV_API_HOST) {
            if !host.trim().is_empty() {
                self.twitter.api_host = host.trim().to_string();
            }
        }
        self.twitter.bearer_token = std::env::var(ENV_API_TOKEN)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
    }

    fn sanitize(&mut self) {
        self.scoring.concurrency = self.scoring.concurrency.max(1);
        self.twitter.max_results = self
            .twitter
            .max_results
            .clamp(MIN_MAX_RESULTS, DEFAULT_MAX_RESULTS);
        self.twitter.api_host = self.twitter.api_host.trim_end_matches('/').to_string();
        if self.twitter.timeout_secs == 0 {
            self.twitter.timeout_secs = default_timeout_secs();
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = CredibilityConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.scoring.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(cfg.twitter.max_results, DEFAULT_MAX_RESULTS);
        assert_eq!(cfg.twitter.api_host, "https://api.twitter.com");
        assert!(cfg.twitter.bearer_token.is_none());
        assert_eq!(cfg.scoring.options().deadline, Some(Duration::from_secs(30)));
    }

    #[test]
    fn zero_deadline_disables_it() {
        let cfg = CredibilityConfig::from_toml_str("[scoring]\ndeadline_secs = 0\n").unwrap();
        assert!(cfg.scoring.options().deadline.is_none());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let toml = r#"
            [scoring]
            concurrency = 0

            [twitter]
            api_host = "http://localhost:9000/"
            max_results = 500
        "#;
        let cfg = CredibilityConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.scoring.concurrency, 1);
        assert_eq!(cfg.twitter.max_results, 100);
        assert_eq!(cfg.twitter.api_host, "http://localhost:9000");
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(CredibilityConfig::from_toml_str("[scoring\nconcurrency = ").is_err());
    }
}
