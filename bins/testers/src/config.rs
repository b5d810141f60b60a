// Runtime configuration for a testers run
use anyhow::{Context, Result};
use std::time::Duration;
use testers_common::types::{ScoringPolicy, Suite};

pub const ENV_SCORING: &str = "TESTER_SCORING";
pub const ENV_TIMEOUT_SECS: &str = "TESTER_TIMEOUT_SECS";
pub const ENV_PRETTY: &str = "TESTER_PRETTY";
pub const ENV_LOG_FORMAT: &str = "TESTER_LOG_FORMAT";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerConfig {
    pub scoring: ScoringPolicy,
    /// Replaces the suite timeout when set
    pub timeout_override_secs: Option<u64>,
    pub pretty: bool,
}

impl RunnerConfig {
    /// Resolve settings: explicit flags first, then environment, then defaults
    pub fn resolve(
        scoring: Option<ScoringPolicy>,
        timeout_secs: Option<u64>,
        pretty: bool,
    ) -> Result<Self> {
        Self::resolve_with(scoring, timeout_secs, pretty, |key| std::env::var(key).ok())
    }

    fn resolve_with<F>(
        scoring: Option<ScoringPolicy>,
        timeout_secs: Option<u64>,
        pretty: bool,
        env: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let scoring = match scoring {
            Some(policy) => policy,
            None => match env(ENV_SCORING) {
                Some(raw) => raw
                    .parse::<ScoringPolicy>()
                    .map_err(anyhow::Error::msg)
                    .with_context(|| format!("Invalid {}", ENV_SCORING))?,
                None => ScoringPolicy::default(),
            },
        };

        let timeout_override_secs = match timeout_secs {
            Some(secs) => Some(secs),
            None => match env(ENV_TIMEOUT_SECS) {
                Some(raw) => Some(
                    raw.trim()
                        .parse::<u64>()
                        .with_context(|| format!("Invalid {}: {}", ENV_TIMEOUT_SECS, raw))?,
                ),
                None => None,
            },
        }
        .filter(|secs| *secs > 0);

        let pretty = pretty || env(ENV_PRETTY).is_some_and(|v| v.to_lowercase() == "true");

        Ok(Self {
            scoring,
            timeout_override_secs,
            pretty,
        })
    }

    /// Per-case deadline for the given suite
    pub fn timeout_for(&self, suite: &Suite) -> Duration {
        match self.timeout_override_secs {
            Some(secs) => Duration::from_secs(secs),
            None => suite.timeout(),
        }
    }
}

/// Whether log lines should be emitted as JSON
pub fn json_logs() -> bool {
    std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false)
}
