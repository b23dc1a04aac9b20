//! Run command handler

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use crate::RunArgs;
use pruner::{
    build_provider, GitRepository, Orchestrator, ProcessOutcome, ProviderKind, RunPlan, RunSummary,
    StateStore,
};
use std::fmt::Write as _;
use std::path::Path;

/// Execute the run command from `cwd`
pub async fn execute_run(config: &CliConfig, args: &RunArgs, cwd: &Path) -> CliResult<()> {
    let kind = ProviderKind::from_name(&args.provider)?;
    let repo = GitRepository::discover(cwd).await?;
    let store = StateStore::new(repo.root());
    let settings = store.load_settings().await?.ok_or_else(|| {
        CliError::config("Pruner is not initialized in this repository. Run `pruner init` first.")
    })?;

    let provider = build_provider(kind, &settings, repo.root())?;
    let orchestrator = Orchestrator::new(provider.as_ref(), &store, &repo);
    let mut reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());

    let plan = orchestrator.plan().await?;
    if args.dry_run {
        print!("{}", describe_plan(&plan));
        return Ok(());
    }
    if config.verbosity.is_verbose() {
        reporter.info(&plan_headline(&plan));
    }

    reporter.start_spinner("Running tests");
    let summary = orchestrator.execute(plan).await;
    reporter.stop_spinner();

    report_summary(&reporter, &summary?)
}

/// Print the outcome of a run; a failed run is an error
pub fn report_summary(reporter: &ProgressReporter, summary: &RunSummary) -> CliResult<()> {
    if !summary.succeeded() {
        reporter.failure("Could not run tests.");
        reporter.block(&summary.outcome.stdout);
        reporter.block(&summary.outcome.stderr);
        return Err(CliError::test_execution(exit_description(&summary.outcome)));
    }

    reporter.success("Tests ran successfully:");
    if let Some(warning) = coverage_warning(summary) {
        reporter.warning(&warning);
    }
    let stdout = summary.outcome.stdout.trim_end();
    if !stdout.is_empty() {
        println!("{stdout}");
    }
    Ok(())
}

/// Warning for a successful run that recorded no per-test coverage
pub fn coverage_warning(summary: &RunSummary) -> Option<String> {
    (summary.succeeded() && summary.gathered_lines == 0).then(|| {
        "No per-test coverage was gathered; check that the test projects reference AltCover. \
         The next run will not be narrowed by this one."
            .to_string()
    })
}

/// One-line summary of a plan
pub fn plan_headline(plan: &RunPlan) -> String {
    if plan.runs_everything() {
        return format!(
            "{} changed file(s); no recorded coverage to narrow by, running all tests",
            plan.changed_files.len()
        );
    }
    format!(
        "{} changed file(s); {} affected, {} known unaffected",
        plan.changed_files.len(),
        plan.selection.affected.len(),
        plan.selection.unaffected.len()
    )
}

/// Human-readable rendering of a plan for `--dry-run`
pub fn describe_plan(plan: &RunPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", plan_headline(plan));
    for changed in &plan.changed_files {
        let _ = writeln!(out, "  changed  {} ({} line(s))", changed.name, changed.line_numbers.len());
    }
    for test in &plan.selection.affected {
        let _ = writeln!(out, "  affected {}", test.name);
    }
    if plan.runs_everything() {
        let _ = writeln!(out, "filter: <none>");
    } else {
        let _ = writeln!(out, "filter: {}", plan.filter);
    }
    out
}

/// Describe how the runner exited
pub fn exit_description(outcome: &ProcessOutcome) -> String {
    match outcome.exit_code {
        Some(code) => format!("test runner exited with code {code}"),
        None => "test runner was terminated by a signal".to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pruner::{ChangedFile, Test, TestSelection};

    fn plan(affected: &[&str], unaffected: &[&str], filter: &str) -> RunPlan {
        RunPlan {
            changed_files: vec![ChangedFile::new("src/A.cs", [3, 4])],
            selection: TestSelection {
                affected: affected.iter().enumerate().map(|(i, n)| Test::new(i as u64 + 1, *n)).collect(),
                unaffected: unaffected
                    .iter()
                    .enumerate()
                    .map(|(i, n)| Test::new(i as u64 + 100, *n))
                    .collect(),
            },
            filter: filter.to_string(),
            previous: None,
        }
    }

    fn summary(exit_code: Option<i32>, gathered_lines: usize) -> RunSummary {
        RunSummary {
            plan: plan(&[], &[], ""),
            outcome: ProcessOutcome {
                exit_code,
                stdout: "Passed!  - Failed: 0".to_string(),
                stderr: String::new(),
            },
            state_updated: exit_code == Some(0),
            gathered_lines,
        }
    }

    #[test]
    fn test_describe_plan_lists_affected_and_filter() {
        let text = describe_plan(&plan(&["N.T"], &["N.U"], "(FullyQualifiedName=N.T)|(FullyQualifiedName!=N.U)"));
        assert!(text.contains("1 affected, 1 known unaffected"));
        assert!(text.contains("changed  src/A.cs (2 line(s))"));
        assert!(text.contains("affected N.T"));
        assert!(text.contains("filter: (FullyQualifiedName=N.T)|(FullyQualifiedName!=N.U)"));
    }

    #[test]
    fn test_describe_plan_without_filter() {
        let text = describe_plan(&plan(&[], &[], ""));
        assert!(text.contains("running all tests"));
        assert!(text.contains("filter: <none>"));
    }

    #[test]
    fn test_exit_description() {
        let mut outcome = ProcessOutcome::default();
        assert!(exit_description(&outcome).contains("signal"));
        outcome.exit_code = Some(3);
        assert_eq!(exit_description(&outcome), "test runner exited with code 3");
    }

    #[test]
    fn test_report_summary_success() {
        let reporter = ProgressReporter::new(false, true);
        assert!(report_summary(&reporter, &summary(Some(0), 4)).is_ok());
    }

    #[test]
    fn test_report_summary_failure_is_error() {
        let reporter = ProgressReporter::new(false, true);
        let err = report_summary(&reporter, &summary(Some(1), 0)).unwrap_err();
        assert!(matches!(err, CliError::TestExecution { .. }));
        assert!(err.to_string().contains("code 1"));
    }

    #[test]
    fn test_coverage_warning_only_for_empty_successful_runs() {
        let warning = coverage_warning(&summary(Some(0), 0)).unwrap();
        assert!(warning.contains("AltCover"));
        assert!(coverage_warning(&summary(Some(0), 3)).is_none());
        assert!(coverage_warning(&summary(Some(1), 0)).is_none());

        let reporter = ProgressReporter::new(false, true);
        assert!(report_summary(&reporter, &summary(Some(0), 0)).is_ok());
    }
}
