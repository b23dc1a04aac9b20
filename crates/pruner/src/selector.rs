//! Test Selector
//!
//! Splits the previously known tests into those whose recorded coverage
//! touches a changed line (`affected`) and the rest (`unaffected`). Tests
//! the previous state has never seen are in neither list; the filter built
//! from the two lists still runs them.

use crate::state::{ChangedFile, State, Test, TestId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Result of test selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSelection {
    /// Known tests covering at least one changed line
    pub affected: Vec<Test>,
    /// Known tests not found to be affected
    pub unaffected: Vec<Test>,
}

impl TestSelection {
    /// True when there is no signal either way (first run)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.affected.is_empty() && self.unaffected.is_empty()
    }
}

/// Select affected and unaffected tests for a change set
///
/// Without previous state both lists are empty, which the filter turns into
/// "run everything".
#[must_use]
pub fn select_tests(previous: Option<&State>, changed_files: &[ChangedFile]) -> TestSelection {
    let Some(previous) = previous else {
        tracing::debug!("no previous state; selecting all tests");
        return TestSelection::default();
    };

    let mut affected_ids: BTreeSet<TestId> = BTreeSet::new();
    for changed in changed_files {
        let Some(file) = previous.file_by_path(&changed.name) else {
            tracing::debug!(file = %changed.name, "changed file has no recorded coverage");
            continue;
        };
        for line in previous.coverage_for(file.id) {
            if changed.line_numbers.contains(&line.line_number) {
                affected_ids.extend(line.test_ids.iter().copied());
            }
        }
    }

    // Ids that no longer resolve to a test simply never match below.
    let (affected, unaffected): (Vec<Test>, Vec<Test>) = previous
        .tests
        .iter()
        .cloned()
        .partition(|test| affected_ids.contains(&test.id));

    tracing::info!(
        changed_files = changed_files.len(),
        affected = affected.len(),
        unaffected = unaffected.len(),
        "selected tests"
    );
    TestSelection {
        affected,
        unaffected,
    }
}
