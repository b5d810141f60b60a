use crate::types::{CaseResult, Outcome, RunReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Wire shape of a single case.
///
/// `toStdout` / `toStderr` are the field names downstream graders parse.
#[derive(Debug, Serialize)]
struct CaseEntry {
    position: usize,
    total: usize,
    status: Outcome,
    #[serde(rename = "toStdout")]
    to_stdout: String,
    #[serde(rename = "toStderr")]
    to_stderr: String,
    execution_ms: u64,
}

#[derive(Debug, Serialize)]
struct ReportEntry {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    completion: u8,
    results: Vec<CaseEntry>,
}

impl From<&CaseResult> for CaseEntry {
    fn from(result: &CaseResult) -> Self {
        CaseEntry {
            position: result.position,
            total: result.total,
            status: result.outcome,
            to_stdout: result.display_text(),
            to_stderr: result.captured_line(),
            execution_ms: result.execution_ms,
        }
    }
}

/// Serialize a finished run as a single JSON object
pub fn render(report: &RunReport, pretty: bool) -> Result<String, serde_json::Error> {
    let entry = ReportEntry {
        run_id: report.run_id,
        started_at: report.started_at,
        finished_at: report.finished_at,
        completion: report.completion,
        results: report.results.iter().map(CaseEntry::from).collect(),
    };

    if pretty {
        serde_json::to_string_pretty(&entry)
    } else {
        serde_json::to_string(&entry)
    }
}
