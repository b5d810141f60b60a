/// Suite Executor - High-Level Orchestration
///
/// **Responsibility:**
/// Drive every case of a suite through the engine, one at a time, and
/// fold the verdicts into a run report.
///
/// **Architecture:**
/// 1. Use ProcessEngine to run the target once per case (engine.rs)
/// 2. Use the evaluator to classify and score (evaluator.rs)
/// 3. Return the aggregated RunReport
///
/// This module is the glue layer - it knows nothing about:
/// - How processes are launched (engine's job)
/// - How outputs are judged (evaluator's job)

use crate::config::RunnerConfig;
use crate::engine::{Invocation, ProcessEngine};
use crate::evaluator;
use chrono::Utc;
use testers_common::types::{DegenerateSuiteError, Outcome, RunReport, Suite};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Execute a whole suite against one invocation.
///
/// Cases run strictly in order. Only an empty suite aborts the run; every
/// per-case failure is recorded in that case's result.
pub async fn run_suite(
    suite: &Suite,
    invocation: &Invocation,
    config: &RunnerConfig,
) -> Result<RunReport, DegenerateSuiteError> {
    run_suite_with(&ProcessEngine::new(), suite, invocation, config).await
}

pub async fn run_suite_with(
    engine: &ProcessEngine,
    suite: &Suite,
    invocation: &Invocation,
    config: &RunnerConfig,
) -> Result<RunReport, DegenerateSuiteError> {
    if suite.is_empty() {
        return Err(DegenerateSuiteError);
    }

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let total = suite.len();
    let timeout = config.timeout_for(suite);

    info!(
        run_id = %run_id,
        target = %invocation,
        cases = total,
        timeout_secs = timeout.as_secs(),
        scoring = %config.scoring,
        "Starting suite"
    );

    let mut results = Vec::with_capacity(total);
    for (idx, case) in suite.cases.iter().enumerate() {
        let position = idx + 1;
        let span = info_span!("case", run_id = %run_id, position, total);

        let execution = engine
            .run(invocation, case, timeout)
            .instrument(span.clone())
            .await;

        let _entered = span.enter();
        if let Err(e) = &execution {
            warn!(error = %e, "Could not start target; skipping case");
        }

        let result = evaluator::evaluate_case(position, total, &execution, case);
        match result.outcome {
            Outcome::Passed => info!(
                outcome = %result.outcome,
                execution_ms = result.execution_ms,
                "Case finished"
            ),
            _ => warn!(
                outcome = %result.outcome,
                execution_ms = result.execution_ms,
                "Case finished"
            ),
        }
        results.push(result);
    }

    let report = evaluator::aggregate(results, config.scoring, run_id, started_at)?;

    info!(
        run_id = %run_id,
        passed = report.passed(),
        cases = total,
        completion = report.completion,
        "Suite completed"
    );

    Ok(report)
}
