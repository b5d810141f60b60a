/// Test Evaluator - Verdicts and Scoring
///
/// **Core Responsibility:**
/// Turn raw execution outputs into per-case outcomes and fold them into
/// a completion score.
///
/// **Classification Rules:**
/// - Deadline exceeded: TimedOut, captured output dropped
/// - Process could not be started: Skipped
/// - Otherwise: Passed iff combined output equals the expected output
///   byte for byte. No trimming, no newline normalization.
/// - Exit code is ignored
///
/// **Scoring Rules:**
/// - Passed earns 1 point, every other outcome 0
/// - completion comes from the configured `ScoringPolicy`

use crate::engine::SpawnError;
use chrono::{DateTime, Utc};
use testers_common::types::{
    Case, CaseResult, DegenerateSuiteError, Outcome, RunReport, ScoringPolicy,
};
use uuid::Uuid;

/// Raw execution output for a single case
/// Produced by ProcessEngine, consumed by the evaluator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutput {
    /// stdout and stderr interleaved in write order
    pub combined: Vec<u8>,
    pub exit_code: Option<i32>,
    pub execution_ms: u64,
    pub timed_out: bool,
    /// Output could not be read to completion
    pub capture_failed: bool,
}

pub fn classify(output: &ExecutionOutput, case: &Case) -> Outcome {
    if output.timed_out {
        Outcome::TimedOut
    } else if output.capture_failed {
        Outcome::Failed
    } else if output.combined == case.expected_output.as_bytes() {
        Outcome::Passed
    } else {
        Outcome::Failed
    }
}

/// Build the result record for the case at 1-based `position` of `total`
pub fn evaluate_case(
    position: usize,
    total: usize,
    execution: &Result<ExecutionOutput, SpawnError>,
    case: &Case,
) -> CaseResult {
    let (outcome, output, execution_ms) = match execution {
        Ok(out) => {
            let outcome = classify(out, case);
            let captured = match outcome {
                Outcome::Passed | Outcome::Failed => {
                    String::from_utf8_lossy(&out.combined).into_owned()
                }
                Outcome::TimedOut | Outcome::Skipped => String::new(),
            };
            (outcome, captured, out.execution_ms)
        }
        Err(_) => (Outcome::Skipped, String::new(), 0),
    };

    CaseResult {
        position,
        total,
        outcome,
        expected: case.expected_output.clone(),
        output,
        execution_ms,
    }
}

pub fn score(results: &[CaseResult], policy: ScoringPolicy) -> Result<u8, DegenerateSuiteError> {
    let points: u32 = results.iter().map(|r| r.outcome.points()).sum();
    policy.completion(points, results.len())
}

/// Fold finished case results into the run report
pub fn aggregate(
    results: Vec<CaseResult>,
    policy: ScoringPolicy,
    run_id: Uuid,
    started_at: DateTime<Utc>,
) -> Result<RunReport, DegenerateSuiteError> {
    let completion = score(&results, policy)?;

    Ok(RunReport {
        run_id,
        started_at,
        finished_at: Utc::now(),
        completion,
        results,
    })
}
