//! Run Orchestrator
//!
//! ```text
//! load state ─► diff ─► select ─► filter ─► execute ─┬─ exit != 0 ─► stop
//!                                                    └─ exit == 0 ─► gather ─► merge ─► save
//! ```
//!
//! Persisted state only advances after a successful test run.

use crate::diff::changed_files;
use crate::git::DiffSource;
use crate::process::ProcessOutcome;
use crate::provider::TestProvider;
use crate::result::PrunerResult;
use crate::selector::{select_tests, TestSelection};
use crate::state::{ChangedFile, State};
use crate::store::StateStore;

/// Everything decided before the test runner is invoked
#[derive(Debug, Clone, Default)]
pub struct RunPlan {
    /// Changed lines of the working tree
    pub changed_files: Vec<ChangedFile>,
    /// Known tests split by impact
    pub selection: TestSelection,
    /// Filter handed to the runner; empty runs everything
    pub filter: String,
    /// State loaded at the start of the run
    pub previous: Option<State>,
}

impl RunPlan {
    /// True when the runner will be asked to run every test
    #[must_use]
    pub fn runs_everything(&self) -> bool {
        self.filter.is_empty()
    }
}

/// Result of one invocation
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// The plan that was executed
    pub plan: RunPlan,
    /// Exit status and output of the runner
    pub outcome: ProcessOutcome,
    /// Whether new state was persisted
    pub state_updated: bool,
    /// Coverage lines gathered from this run's reports
    pub gathered_lines: usize,
}

impl RunSummary {
    /// True when the runner exited cleanly
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.outcome.success()
    }
}

/// Drives one provider through a selective test run
pub struct Orchestrator<'a> {
    provider: &'a dyn TestProvider,
    store: &'a StateStore,
    diff_source: &'a dyn DiffSource,
}

impl std::fmt::Debug for Orchestrator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.name())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator
    #[must_use]
    pub fn new(provider: &'a dyn TestProvider, store: &'a StateStore, diff_source: &'a dyn DiffSource) -> Self {
        Self {
            provider,
            store,
            diff_source,
        }
    }

    /// Work out which tests to run, without running anything
    pub async fn plan(&self) -> PrunerResult<RunPlan> {
        let previous = self.store.load(self.provider.name()).await?;
        let diff_text = self.diff_source.diff_text().await?;
        let changed_files = changed_files(&diff_text);
        let selection = select_tests(previous.as_ref(), &changed_files);
        let filter = self.provider.filter_syntax().build(&selection);

        tracing::info!(
            provider = self.provider.name(),
            first_run = previous.is_none(),
            changed_files = changed_files.len(),
            "planned run"
        );
        Ok(RunPlan {
            changed_files,
            selection,
            filter,
            previous,
        })
    }

    /// Run the planned tests and, on success, persist merged coverage
    pub async fn execute(&self, plan: RunPlan) -> PrunerResult<RunSummary> {
        let outcome = self.provider.execute_tests(&plan.filter).await?;
        if !outcome.success() {
            tracing::warn!(exit_code = ?outcome.exit_code, "test run failed; state left untouched");
            return Ok(RunSummary {
                plan,
                outcome,
                state_updated: false,
                gathered_lines: 0,
            });
        }

        let current = self.provider.gather_state().await?;
        let gathered_lines = current.coverage.len();
        if gathered_lines == 0 {
            tracing::warn!(provider = self.provider.name(), "run produced no per-test coverage");
        }
        let merged = self.provider.merge_state(plan.previous.clone(), current);
        self.store.save(self.provider.name(), &merged).await?;

        Ok(RunSummary {
            plan,
            outcome,
            state_updated: true,
            gathered_lines,
        })
    }

    /// [`Orchestrator::plan`] followed by [`Orchestrator::execute`]
    pub async fn run(&self) -> PrunerResult<RunSummary> {
        let plan = self.plan().await?;
        self.execute(plan).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::filter::FilterSyntax;
    use crate::result::PrunerError;
    use crate::settings::SettingsQuestion;
    use crate::state::{CoverageLine, SourceFile, Test};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FakeProvider {
        exit_code: i32,
        gathered: State,
        filters: Mutex<Vec<String>>,
        gathers: Mutex<usize>,
    }

    impl FakeProvider {
        fn new(exit_code: i32, gathered: State) -> Self {
            Self {
                exit_code,
                gathered,
                filters: Mutex::new(Vec::new()),
                gathers: Mutex::new(0),
            }
        }

        fn filters(&self) -> Vec<String> {
            self.filters.lock().unwrap().clone()
        }

        fn gathers(&self) -> usize {
            *self.gathers.lock().unwrap()
        }
    }

    #[async_trait]
    impl TestProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn init_questions() -> &'static [SettingsQuestion] {
            &[]
        }

        fn filter_syntax(&self) -> FilterSyntax {
            FilterSyntax::vstest()
        }

        async fn execute_tests(&self, filter: &str) -> PrunerResult<ProcessOutcome> {
            self.filters.lock().unwrap().push(filter.to_owned());
            Ok(ProcessOutcome {
                exit_code: Some(self.exit_code),
                stdout: "runner output".to_owned(),
                stderr: String::new(),
            })
        }

        async fn gather_state(&self) -> PrunerResult<State> {
            *self.gathers.lock().unwrap() += 1;
            Ok(self.gathered.clone())
        }
    }

    struct FakeDiff(Result<String, ()>);

    #[async_trait]
    impl DiffSource for FakeDiff {
        async fn diff_text(&self) -> PrunerResult<String> {
            self.0.clone().map_err(|()| PrunerError::git("bad revision"))
        }
    }

    fn diff_of(path: &str, line: u32) -> FakeDiff {
        FakeDiff(Ok(format!(
            "diff --git a/{path} b/{path}\n--- a/{path}\n+++ b/{path}\n@@ -{line},1 +{line},1 @@\n-old\n+new\n"
        )))
    }

    fn prior() -> State {
        State {
            tests: vec![Test::new(9, "N.T")],
            files: vec![SourceFile::new(1, "A.cs")],
            coverage: vec![CoverageLine::new(1, 20, [9])],
        }
    }

    async fn store_with(dir: &TempDir, state: Option<&State>) -> StateStore {
        let store = StateStore::new(dir.path());
        if let Some(state) = state {
            store.save("fake", state).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_changed_covered_line_selects_test() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, Some(&prior())).await;
        let provider = FakeProvider::new(0, State::new());
        let diff = diff_of("A.cs", 20);

        let plan = Orchestrator::new(&provider, &store, &diff).plan().await.unwrap();

        assert_eq!(plan.selection.affected, vec![Test::new(9, "N.T")]);
        assert!(plan.selection.unaffected.is_empty());
        assert_eq!(plan.filter, "(FullyQualifiedName=N.T)");
    }

    #[tokio::test]
    async fn test_unknown_file_excludes_known_test() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, Some(&prior())).await;
        let provider = FakeProvider::new(0, State::new());
        let diff = diff_of("B.cs", 1);

        let plan = Orchestrator::new(&provider, &store, &diff).plan().await.unwrap();

        assert!(plan.selection.affected.is_empty());
        assert_eq!(plan.selection.unaffected, vec![Test::new(9, "N.T")]);
        assert_eq!(plan.filter, "(FullyQualifiedName!=N.T)");
    }

    #[tokio::test]
    async fn test_first_run_runs_everything_and_saves() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, None).await;
        let provider = FakeProvider::new(0, prior());
        let diff = diff_of("A.cs", 20);

        let summary = Orchestrator::new(&provider, &store, &diff).run().await.unwrap();

        assert!(summary.succeeded());
        assert!(summary.state_updated);
        assert_eq!(summary.gathered_lines, prior().coverage.len());
        assert!(summary.plan.runs_everything());
        assert_eq!(provider.filters(), vec![String::new()]);
        assert_eq!(store.load("fake").await.unwrap(), Some(prior()));
    }

    #[tokio::test]
    async fn test_failed_run_leaves_state_untouched() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, Some(&prior())).await;
        let before = std::fs::read(store.state_path("fake")).unwrap();
        let provider = FakeProvider::new(1, State::new());
        let diff = diff_of("A.cs", 20);

        let summary = Orchestrator::new(&provider, &store, &diff).run().await.unwrap();

        assert!(!summary.succeeded());
        assert!(!summary.state_updated);
        assert_eq!(summary.gathered_lines, 0);
        assert_eq!(summary.outcome.stdout, "runner output");
        assert_eq!(provider.gathers(), 0);
        assert_eq!(std::fs::read(store.state_path("fake")).unwrap(), before);
    }

    #[tokio::test]
    async fn test_failed_first_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, None).await;
        let provider = FakeProvider::new(2, prior());
        let diff = FakeDiff(Ok(String::new()));

        Orchestrator::new(&provider, &store, &diff).run().await.unwrap();

        assert!(!store.state_path("fake").exists());
    }

    #[tokio::test]
    async fn test_successful_run_keeps_prior_coverage_on_collision() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, Some(&prior())).await;
        let gathered = State {
            tests: vec![Test::new(9, "N.T"), Test::new(10, "N.New")],
            files: vec![SourceFile::new(1, "A.cs")],
            coverage: vec![CoverageLine::new(1, 20, [10]), CoverageLine::new(1, 21, [10])],
        };
        let provider = FakeProvider::new(0, gathered);
        let diff = diff_of("A.cs", 20);

        let summary = Orchestrator::new(&provider, &store, &diff).run().await.unwrap();
        assert!(summary.state_updated);

        let saved = store.load("fake").await.unwrap().unwrap();
        assert_eq!(saved.tests, vec![Test::new(9, "N.T"), Test::new(10, "N.New")]);
        assert_eq!(
            saved.coverage,
            vec![CoverageLine::new(1, 20, [9]), CoverageLine::new(1, 21, [10])]
        );
    }

    #[tokio::test]
    async fn test_diff_failure_aborts_before_running() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, Some(&prior())).await;
        let provider = FakeProvider::new(0, State::new());
        let diff = FakeDiff(Err(()));

        let err = Orchestrator::new(&provider, &store, &diff).run().await.unwrap_err();

        assert!(matches!(err, PrunerError::Git { .. }));
        assert!(provider.filters().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_state_aborts_before_running() {
        let dir = TempDir::new().unwrap();
        let store = store_with(&dir, None).await;
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.state_path("fake"), "[").unwrap();
        let provider = FakeProvider::new(0, State::new());
        let diff = diff_of("A.cs", 20);

        let err = Orchestrator::new(&provider, &store, &diff).run().await.unwrap_err();

        assert!(matches!(err, PrunerError::StateCorrupt { .. }));
        assert!(provider.filters().is_empty());
    }
}
