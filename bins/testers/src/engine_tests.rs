/// Process-level tests for the local execution path
///
/// These tests launch real `sh` scripts and verify that:
/// 1. Matching output passes and mismatches fail byte for byte
/// 2. Timeouts kill the target and drop its partial output
/// 3. Spawn failures are skipped, not failed
/// 4. stdout and stderr are captured in write order
/// 5. Large inputs and outputs stream through without deadlock
/// 6. The executor keeps case order and scores the run

#[cfg(test)]
mod process_tests {
    use crate::config::RunnerConfig;
    use crate::engine::{Invocation, ProcessEngine, SpawnError, COMPILER_MODE};
    use crate::evaluator::classify;
    use crate::executor::run_suite;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};
    use testers_common::types::{Case, DegenerateSuiteError, Outcome, ScoringPolicy, Suite};

    /// Write an `sh` script into `dir` and return an interpreter-mode invocation for it
    fn sh_script(dir: &tempfile::TempDir, name: &str, body: &str) -> Invocation {
        let path: PathBuf = dir.path().join(name);
        std::fs::write(&path, body).expect("Failed to write script");
        Invocation::from_mode("sh", path.to_str().expect("utf-8 temp path"))
    }

    fn sum_suite(timeout_secs: u64) -> Suite {
        Suite::new(
            vec![Case::new("1 2\n", "3\n"), Case::new("5 5\n", "10\n")],
            timeout_secs,
        )
    }

    /// Scenario: a correct adder passes every case
    #[tokio::test]
    async fn test_adder_passes_all_cases() {
        let dir = tempfile::tempdir().unwrap();
        let inv = sh_script(&dir, "add.sh", "read a b\necho $((a + b))\n");

        let report = run_suite(&sum_suite(5), &inv, &RunnerConfig::default())
            .await
            .unwrap();

        assert_eq!(report.results.len(), 2);
        assert!(report.results.iter().all(|r| r.outcome == Outcome::Passed));
        assert_eq!(report.completion, 100);
        assert_eq!(report.results[0].display_text(), "1/2 : PASSED\n");
        assert_eq!(report.results[1].captured_line(), "[10\n]\n");
    }

    /// Scenario: a program that always prints 0 fails every case
    #[tokio::test]
    async fn test_constant_output_fails_all_cases() {
        let dir = tempfile::tempdir().unwrap();
        let inv = sh_script(&dir, "zero.sh", "echo 0\n");

        let report = run_suite(&sum_suite(5), &inv, &RunnerConfig::default())
            .await
            .unwrap();

        assert!(report.results.iter().all(|r| r.outcome == Outcome::Failed));
        assert_eq!(report.completion, 0);
        assert_eq!(
            report.results[1].display_text(),
            "2/2 : FAILED\n\tExpected 10\n\n\tGot 0\n\n"
        );
    }

    /// Scenario: a slow program is killed at the deadline
    #[tokio::test]
    async fn test_slow_program_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let inv = sh_script(&dir, "slow.sh", "printf partial\nexec sleep 10\n");
        let suite = Suite::new(vec![Case::new("", "partial")], 1);

        let start = Instant::now();
        let report = run_suite(&suite, &inv, &RunnerConfig::default())
            .await
            .unwrap();

        assert!(start.elapsed() < Duration::from_secs(8));
        let result = &report.results[0];
        assert_eq!(result.outcome, Outcome::TimedOut);
        assert!(result.output.is_empty());
        assert_eq!(result.captured_line(), "[]\n");
        assert_eq!(result.display_text(), "1/1 : FAILED\n\tTIME OUT\n");
        assert_eq!(report.completion, 0);
    }

    #[tokio::test]
    async fn test_timeout_does_not_abort_remaining_cases() {
        let dir = tempfile::tempdir().unwrap();
        let inv = sh_script(
            &dir,
            "maybe_slow.sh",
            "read mode\nif [ \"$mode\" = slow ]; then exec sleep 10; fi\necho done\n",
        );
        let suite = Suite::new(
            vec![
                Case::new("slow\n", "done\n"),
                Case::new("fast\n", "done\n"),
            ],
            1,
        );
        let config = RunnerConfig {
            scoring: ScoringPolicy::Proportional,
            ..RunnerConfig::default()
        };

        let report = run_suite(&suite, &inv, &config).await.unwrap();

        assert_eq!(report.results[0].outcome, Outcome::TimedOut);
        assert_eq!(report.results[1].outcome, Outcome::Passed);
        assert_eq!(report.completion, 50);
    }

    #[tokio::test]
    async fn test_missing_program_is_skipped() {
        let inv = Invocation::from_mode(COMPILER_MODE, "/definitely/not/a/real/binary");
        let engine = ProcessEngine::new();

        let err = engine
            .run(&inv, &Case::new("", ""), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SpawnError::Launch { .. }));

        let suite = Suite::new(vec![Case::new("", ""), Case::new("x", "x")], 1);
        let report = run_suite(&suite, &inv, &RunnerConfig::default())
            .await
            .unwrap();

        assert_eq!(report.results.len(), 2);
        for result in &report.results {
            assert_eq!(result.outcome, Outcome::Skipped);
            assert!(result.display_text().ends_with(" : Error Skiped\n"));
        }
        assert_eq!(report.completion, 0);
    }

    #[tokio::test]
    async fn test_missing_trailing_newline_fails() {
        let dir = tempfile::tempdir().unwrap();
        let inv = sh_script(&dir, "bare.sh", "printf 3\n");
        let case = Case::new("", "3\n");

        let output = ProcessEngine::new()
            .run(&inv, &case, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(output.combined, b"3");
        assert_eq!(classify(&output, &case), Outcome::Failed);
    }

    #[tokio::test]
    async fn test_stdout_and_stderr_keep_write_order() {
        let dir = tempfile::tempdir().unwrap();
        let inv = sh_script(
            &dir,
            "mixed.sh",
            "printf 'out1\\n'\nprintf 'err1\\n' >&2\nprintf 'out2\\n'\nprintf 'err2\\n' >&2\n",
        );
        let case = Case::new("", "out1\nerr1\nout2\nerr2\n");

        let output = ProcessEngine::new()
            .run(&inv, &case, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(output.combined, b"out1\nerr1\nout2\nerr2\n");
        assert_eq!(classify(&output, &case), Outcome::Passed);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_judged_on_output() {
        let dir = tempfile::tempdir().unwrap();
        let inv = sh_script(&dir, "fail.sh", "echo ok\nexit 3\n");
        let case = Case::new("", "ok\n");

        let output = ProcessEngine::new()
            .run(&inv, &case, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert_eq!(classify(&output, &case), Outcome::Passed);
    }

    #[tokio::test]
    async fn test_compiler_mode_runs_program_directly() {
        let inv = Invocation::from_mode(COMPILER_MODE, "cat");
        let case = Case::new("echo me\n", "echo me\n");

        let output = ProcessEngine::new()
            .run(&inv, &case, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(classify(&output, &case), Outcome::Passed);
    }

    #[tokio::test]
    async fn test_target_ignoring_stdin_still_completes() {
        let dir = tempfile::tempdir().unwrap();
        let inv = sh_script(&dir, "deaf.sh", "echo hi\n");
        let big_input = "x".repeat(1024 * 1024);
        let case = Case::new(big_input, "hi\n");

        let output = ProcessEngine::new()
            .run(&inv, &case, Duration::from_secs(5))
            .await
            .unwrap();

        assert!(!output.timed_out);
        assert_eq!(classify(&output, &case), Outcome::Passed);
    }

    #[tokio::test]
    async fn test_large_input_reaches_target() {
        let dir = tempfile::tempdir().unwrap();
        let inv = sh_script(&dir, "count.sh", "wc -c | tr -d ' '\n");
        let size = 11 * 1024 * 1024;
        let suite = Suite::new(vec![Case::new("x".repeat(size), format!("{}\n", size))], 30);

        let report = run_suite(&suite, &inv, &RunnerConfig::default())
            .await
            .unwrap();

        assert_eq!(report.results[0].outcome, Outcome::Passed);
        assert_eq!(report.completion, 100);
    }

    #[tokio::test]
    async fn test_echo_larger_than_pipe_buffer() {
        let inv = Invocation::from_mode(COMPILER_MODE, "cat");
        let input = "0123456789abcdef\n".repeat(128 * 1024);
        assert!(input.len() >= 2 * 1024 * 1024);
        let case = Case::new(input.clone(), input);

        let output = ProcessEngine::new()
            .run(&inv, &case, Duration::from_secs(10))
            .await
            .unwrap();

        assert!(!output.timed_out);
        assert_eq!(output.combined.len(), case.expected_output.len());
        assert_eq!(classify(&output, &case), Outcome::Passed);
    }

    #[tokio::test]
    async fn test_background_child_does_not_cause_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let inv = sh_script(&dir, "bg.sh", "echo 3\nsleep 5 &\n");
        let case = Case::new("", "3\n");

        let start = Instant::now();
        let output = ProcessEngine::new()
            .run(&inv, &case, Duration::from_secs(2))
            .await
            .unwrap();

        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(!output.timed_out);
        assert_eq!(output.combined, b"3\n");
        assert_eq!(classify(&output, &case), Outcome::Passed);
    }

    #[tokio::test]
    async fn test_empty_suite_is_rejected() {
        let inv = Invocation::from_mode(COMPILER_MODE, "cat");
        let suite = Suite::new(Vec::new(), 1);

        let err = run_suite(&suite, &inv, &RunnerConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err, DegenerateSuiteError);
    }

    #[tokio::test]
    async fn test_results_follow_suite_order() {
        let dir = tempfile::tempdir().unwrap();
        let inv = sh_script(&dir, "echo.sh", "cat\n");
        let suite = Suite::new(
            vec![
                Case::new("a\n", "a\n"),
                Case::new("b\n", "wrong\n"),
                Case::new("c\n", "c\n"),
            ],
            5,
        );

        let report = run_suite(&suite, &inv, &RunnerConfig::default())
            .await
            .unwrap();

        let labels: Vec<(usize, usize)> =
            report.results.iter().map(|r| (r.position, r.total)).collect();
        assert_eq!(labels, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(report.results[1].outcome, Outcome::Failed);
        assert_eq!(report.results[1].output, "b\n");
        assert_eq!(report.completion, 0);
    }
}
