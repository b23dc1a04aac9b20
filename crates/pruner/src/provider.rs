//! Test runner integration seam
//!
//! The orchestrator only talks to a [`TestProvider`]; each supported
//! toolchain supplies one implementation (see [`crate::providers`]).

use crate::filter::FilterSyntax;
use crate::merge::{reconcile, MergePolicy};
use crate::process::ProcessOutcome;
use crate::result::PrunerResult;
use crate::settings::SettingsQuestion;
use crate::state::State;
use async_trait::async_trait;

/// Capabilities of one test runner integration
#[async_trait]
pub trait TestProvider: Send + Sync {
    /// Name keying persisted state and settings
    fn name(&self) -> &'static str;

    /// Questions asked by `init`
    fn init_questions() -> &'static [SettingsQuestion]
    where
        Self: Sized;

    /// Filter language of the runner
    fn filter_syntax(&self) -> FilterSyntax;

    /// Run the tests admitted by `filter`; empty means all
    async fn execute_tests(&self, filter: &str) -> PrunerResult<ProcessOutcome>;

    /// Collect coverage produced by the last execution
    async fn gather_state(&self) -> PrunerResult<State>;

    /// Policy applied by [`TestProvider::merge_state`]
    fn merge_policy(&self) -> MergePolicy {
        MergePolicy::default()
    }

    /// Merge fresh coverage into previously persisted state
    fn merge_state(&self, previous: Option<State>, current: State) -> State {
        reconcile(previous, current, self.merge_policy())
    }
}
