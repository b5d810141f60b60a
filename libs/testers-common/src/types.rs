use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// One input / expected-output pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    #[serde(alias = "Input")]
    pub input: String,
    #[serde(rename = "output", alias = "Output")]
    pub expected_output: String,
}

impl Case {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
        }
    }
}

/// Ordered cases sharing one wall-clock timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suite {
    #[serde(rename = "tests", alias = "Tests", default)]
    pub cases: Vec<Case>,
    #[serde(rename = "exec_time", alias = "ExecTime")]
    pub timeout_secs: u64,
}

impl Suite {
    pub fn new(cases: Vec<Case>, timeout_secs: u64) -> Self {
        Self { cases, timeout_secs }
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Terminal classification of a single case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    TimedOut,
    /// The target could not be started for this case
    Skipped,
}

impl Outcome {
    pub fn points(self) -> u32 {
        match self {
            Outcome::Passed => 1,
            Outcome::Failed | Outcome::TimedOut | Outcome::Skipped => 0,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Outcome::Passed => "passed",
            Outcome::Failed => "failed",
            Outcome::TimedOut => "timed_out",
            Outcome::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

/// Result record for one case.
///
/// `position` is 1-based. `output` is the captured combined output and is
/// always empty for `TimedOut` and `Skipped`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseResult {
    pub position: usize,
    pub total: usize,
    pub outcome: Outcome,
    pub expected: String,
    pub output: String,
    pub execution_ms: u64,
}

impl CaseResult {
    /// Human-readable verdict line(s), derived only from the outcome tag
    pub fn display_text(&self) -> String {
        let label = format!("{}/{}", self.position, self.total);
        match self.outcome {
            Outcome::Passed => format!("{} : PASSED\n", label),
            Outcome::Failed => format!(
                "{} : FAILED\n\tExpected {}\n\tGot {}\n",
                label, self.expected, self.output
            ),
            Outcome::TimedOut => format!("{} : FAILED\n\tTIME OUT\n", label),
            Outcome::Skipped => format!("{} : Error Skiped\n", label),
        }
    }

    /// Bracketed snapshot of the captured output
    pub fn captured_line(&self) -> String {
        match self.outcome {
            Outcome::Passed | Outcome::Failed => format!("[{}]\n", self.output),
            Outcome::TimedOut | Outcome::Skipped => "[]\n".to_string(),
        }
    }
}

/// Aggregate of a whole run, in suite order
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub completion: u8,
    pub results: Vec<CaseResult>,
}

impl RunReport {
    pub fn passed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome == Outcome::Passed)
            .count()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("test suite contains no cases; completion is undefined")]
pub struct DegenerateSuiteError;

/// How passed points turn into a completion percentage.
///
/// `Strict` truncates `passed / total` before scaling, so anything short
/// of a clean sweep scores 0. `Proportional` scales first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringPolicy {
    #[default]
    Strict,
    Proportional,
}

impl ScoringPolicy {
    pub fn completion(self, points: u32, total: usize) -> Result<u8, DegenerateSuiteError> {
        if total == 0 {
            return Err(DegenerateSuiteError);
        }
        let points = u64::from(points);
        let total = total as u64;
        let pct = match self {
            ScoringPolicy::Strict => (points / total) * 100,
            ScoringPolicy::Proportional => (points * 100) / total,
        };
        Ok(pct.min(100) as u8)
    }
}

impl fmt::Display for ScoringPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScoringPolicy::Strict => write!(f, "strict"),
            ScoringPolicy::Proportional => write!(f, "proportional"),
        }
    }
}

impl std::str::FromStr for ScoringPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(ScoringPolicy::Strict),
            "proportional" => Ok(ScoringPolicy::Proportional),
            other => Err(format!("unknown scoring policy: {}", other)),
        }
    }
}
