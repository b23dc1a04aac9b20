//! `dotnet test` integration
//!
//! Tests run under AltCover with per-test call context, which makes each
//! test project drop a `coverage.xml` next to it. Those reports are the
//! input of the [`crate::coverage`] normalizer.

use crate::coverage::{normalize_reports, CoverageNormalizer};
use crate::filter::FilterSyntax;
use crate::merge::MergePolicy;
use crate::process::{resolve_binary, run_captured, ProcessOutcome};
use crate::provider::TestProvider;
use crate::result::{PrunerError, PrunerResult};
use crate::settings::SettingsQuestion;
use crate::state::State;
use crate::store::StateStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable overriding the `dotnet` executable
pub const ENV_DOTNET_BIN: &str = "PRUNER_DOTNET_BIN";

const DEFAULT_DOTNET_BIN: &str = "dotnet";

/// Test attributes AltCover attributes coverage to
const CALL_CONTEXT_ATTRIBUTES: [&str; 4] = ["TestMethod", "Test", "Fact", "Theory"];

const COVERAGE_REPORT_GLOB: &str = "**/coverage.xml";
const LCOV_GLOB: &str = "**/lcov.info";

const INIT_QUESTIONS: [SettingsQuestion; 1] = [SettingsQuestion {
    key: "workingDirectory",
    message: "What working directory would you like to use?",
    hint: "The directory where you would normally run 'dotnet test' from.",
}];

/// Settings section of the `dotnet` provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DotNetSettings {
    /// Where `dotnet test` runs; relative to the project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<PathBuf>,
}

/// Provider running `dotnet test` with AltCover coverage
#[derive(Debug, Clone)]
pub struct DotNetProvider {
    binary: PathBuf,
    project_root: PathBuf,
    working_directory: PathBuf,
    merge_policy: MergePolicy,
}

impl DotNetProvider {
    /// Create the provider for a project
    ///
    /// # Errors
    ///
    /// Fails when `PRUNER_DOTNET_BIN` is set but empty.
    pub fn new(settings: DotNetSettings, project_root: &Path, merge_policy: MergePolicy) -> PrunerResult<Self> {
        let binary = resolve_binary(ENV_DOTNET_BIN, DEFAULT_DOTNET_BIN)?;
        let working_directory = match settings.working_directory {
            Some(dir) if !dir.as_os_str().is_empty() => project_root.join(dir),
            _ => project_root.to_path_buf(),
        };
        Ok(Self {
            binary,
            project_root: project_root.to_path_buf(),
            working_directory,
            merge_policy,
        })
    }

    /// Use a different executable in place of `dotnet`
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Directory `dotnet test` runs in
    #[must_use]
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Arguments passed to `dotnet` for a filter
    #[must_use]
    pub fn test_args(filter: &str) -> Vec<OsString> {
        let call_context = CALL_CONTEXT_ATTRIBUTES
            .iter()
            .map(|attribute| format!("[{attribute}]"))
            .collect::<Vec<_>>()
            .join("|");

        let mut args = vec![OsString::from("test")];
        if !filter.is_empty() {
            args.push("--filter".into());
            args.push(filter.into());
        }
        args.push("/p:AltCover=true".into());
        args.push(format!("/p:AltCoverCallContext={call_context}").into());
        args.push("/p:AltCoverForce=true".into());
        args.push("/p:AltCoverXmlReport=coverage.xml".into());
        args
    }

    fn find(&self, pattern: &str) -> PrunerResult<Vec<PathBuf>> {
        let base = glob::Pattern::escape(&self.working_directory.to_string_lossy());
        let full = format!("{base}/{pattern}");
        // Skips dot-directories such as `.pruner` and `.git`.
        let options = glob::MatchOptions {
            require_literal_leading_dot: true,
            ..glob::MatchOptions::new()
        };
        let paths = glob::glob_with(&full, options)
            .map_err(|e| PrunerError::settings(format!("invalid glob {full}: {e}")))?;

        let mut found = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) => found.push(path),
                Err(error) => tracing::warn!(%error, "skipping unreadable path"),
            }
        }
        found.sort();
        Ok(found)
    }

    async fn persist_lcov_files(&self) -> PrunerResult<()> {
        let store = StateStore::new(&self.project_root);
        for (index, path) in self.find(LCOV_GLOB)?.iter().enumerate() {
            store.persist_artifact(index, path).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TestProvider for DotNetProvider {
    fn name(&self) -> &'static str {
        "dotnet"
    }

    fn init_questions() -> &'static [SettingsQuestion] {
        &INIT_QUESTIONS
    }

    fn filter_syntax(&self) -> FilterSyntax {
        FilterSyntax::vstest()
    }

    async fn execute_tests(&self, filter: &str) -> PrunerResult<ProcessOutcome> {
        tracing::info!(
            working_directory = %self.working_directory.display(),
            filtered = !filter.is_empty(),
            "running dotnet test"
        );
        run_captured(&self.binary, &Self::test_args(filter), &self.working_directory).await
    }

    async fn gather_state(&self) -> PrunerResult<State> {
        self.persist_lcov_files().await?;

        let reports = self.find(COVERAGE_REPORT_GLOB)?;
        tracing::info!(reports = reports.len(), "gathering coverage");

        let contents = futures::future::try_join_all(reports.iter().map(|path| async move {
            tokio::fs::read_to_string(path)
                .await
                .map_err(|error| PrunerError::coverage_report(path.clone(), error.to_string()))
        }))
        .await?;
        let origins: Vec<String> = reports.iter().map(|path| path.display().to_string()).collect();

        let normalizer = CoverageNormalizer::new(&self.project_root);
        Ok(normalize_reports(
            &normalizer,
            origins.iter().map(String::as_str).zip(contents.iter().map(String::as_str)),
        ))
    }

    fn merge_policy(&self) -> MergePolicy {
        self.merge_policy
    }
}
