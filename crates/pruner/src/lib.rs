//! Pruner: incremental test selection driven by per-test line coverage
//!
//! Pruner remembers which tests executed which source lines. On the next run
//! it reads the working-tree diff, keeps only the tests whose recorded
//! coverage touches a changed line (plus every test it has never seen), and
//! hands the runner a filter expression selecting exactly those.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       PRUNER Architecture                         │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐                 │
//! │  │ git diff   │──►│ Diff       │──►│ Test       │──► filter       │
//! │  │            │   │ Translator │   │ Selector   │      │          │
//! │  └────────────┘   └────────────┘   └────────────┘      ▼          │
//! │        ▲                                 ▲       ┌────────────┐   │
//! │        │                                 │       │ Test       │   │
//! │  ┌────────────┐   ┌────────────┐   ┌─────┴──────┐│ Provider   │   │
//! │  │ .pruner/   │◄──│ State      │◄──│ Coverage   ││ (dotnet)   │   │
//! │  │ <name>.json│   │ Reconciler │   │ Normalizer │◄┘            │   │
//! │  └────────────┘   └────────────┘   └────────────┘ └────────────┘   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Persisted state only advances after the runner exits successfully.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// AltCover/OpenCover report schema and the Coverage Normalizer
pub mod coverage;

/// Unified diff → changed lines per file
pub mod diff;

/// Runner filter expressions
pub mod filter;

/// Git work tree collaborator
#[allow(clippy::missing_errors_doc)]
pub mod git;

/// State Reconciler
pub mod merge;

/// Run Orchestrator
#[allow(clippy::missing_errors_doc)]
pub mod orchestrator;

/// External processes
#[allow(clippy::missing_errors_doc)]
pub mod process;

/// Test runner integration trait
pub mod provider;

/// Supported test runner integrations
#[allow(clippy::missing_errors_doc)]
pub mod providers;

mod result;

/// Test Selector
pub mod selector;

/// Project settings
#[allow(clippy::missing_errors_doc)]
pub mod settings;

/// Coverage data model
pub mod state;

/// `.pruner` directory storage
#[allow(clippy::missing_errors_doc)]
pub mod store;

pub use coverage::{normalize_reports, CoverageNormalizer, CoverageSession};
pub use diff::changed_files;
pub use filter::FilterSyntax;
pub use git::{DiffSource, GitRepository};
pub use merge::{reconcile, MergePolicy, StateBuilder};
pub use orchestrator::{Orchestrator, RunPlan, RunSummary};
pub use process::ProcessOutcome;
pub use provider::TestProvider;
pub use providers::{build_provider, supported_provider_names, DotNetProvider, DotNetSettings, ProviderKind};
pub use result::{PrunerError, PrunerResult};
pub use selector::{select_tests, TestSelection};
pub use settings::{PrunerSettings, SettingsQuestion};
pub use state::{ChangedFile, CoverageLine, FileId, SourceFile, State, Test, TestId};
pub use store::StateStore;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::coverage::*;
    pub use super::diff::*;
    pub use super::filter::*;
    pub use super::git::*;
    pub use super::merge::*;
    pub use super::orchestrator::*;
    pub use super::process::ProcessOutcome;
    pub use super::provider::*;
    pub use super::providers::*;
    pub use super::result::*;
    pub use super::selector::*;
    pub use super::settings::*;
    pub use super::state::*;
    pub use super::store::*;
}
