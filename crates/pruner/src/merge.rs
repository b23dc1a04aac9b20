//! State Reconciler
//!
//! Folds coverage batches into one [`State`]. Ids coming from a report are
//! only valid inside that report, so every absorbed batch is first re-keyed
//! by natural key: a test by `name`, a file by `path`. A known entity keeps
//! the id it already has; a new one keeps its own id when that is free and
//! otherwise takes one past the highest id handed out. Coverage ids are
//! rewritten through the same maps before the merge policy is applied.

use crate::state::{CoverageLine, FileId, SourceFile, State, Test, TestId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// What happens when two batches record the same `(file, line)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergePolicy {
    /// The entry seen first is kept unchanged; later ones are discarded
    #[default]
    FirstWriteWins,
    /// Test ids of colliding entries are unioned
    UnionCoverage,
}

/// Incremental, re-keying fold of coverage batches
#[derive(Debug, Default)]
pub struct StateBuilder {
    policy: MergePolicy,
    state: State,
    tests_by_name: HashMap<String, TestId>,
    files_by_path: HashMap<String, FileId>,
    test_ids: IdSpace,
    file_ids: IdSpace,
    coverage_slots: HashMap<(FileId, u32), usize>,
}

impl StateBuilder {
    /// Create an empty builder
    #[must_use]
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Merge one batch expressed in its own id space
    pub fn absorb(&mut self, batch: State) {
        let mut test_map: HashMap<TestId, TestId> = HashMap::with_capacity(batch.tests.len());
        for test in batch.tests {
            let id = self.intern_test(test.id, test.name);
            test_map.entry(test.id).or_insert(id);
        }

        let mut file_map: HashMap<FileId, FileId> = HashMap::with_capacity(batch.files.len());
        for file in batch.files {
            let id = self.intern_file(file.id, file.path);
            file_map.entry(file.id).or_insert(id);
        }

        for line in batch.coverage {
            let Some(&file_id) = file_map.get(&line.file_id) else {
                continue;
            };
            let test_ids: BTreeSet<TestId> = line
                .test_ids
                .iter()
                .filter_map(|id| test_map.get(id).copied())
                .collect();
            if test_ids.is_empty() {
                continue;
            }
            self.insert_coverage(CoverageLine {
                test_ids,
                file_id,
                line_number: line.line_number,
            });
        }
    }

    /// Finish the fold
    #[must_use]
    pub fn build(self) -> State {
        self.state
    }

    fn intern_test(&mut self, preferred: TestId, name: String) -> TestId {
        if let Some(&id) = self.tests_by_name.get(&name) {
            return id;
        }
        let id = self.test_ids.claim(preferred);
        self.tests_by_name.insert(name.clone(), id);
        self.state.tests.push(Test { id, name });
        id
    }

    fn intern_file(&mut self, preferred: FileId, path: String) -> FileId {
        if let Some(&id) = self.files_by_path.get(&path) {
            return id;
        }
        let id = self.file_ids.claim(preferred);
        self.files_by_path.insert(path.clone(), id);
        self.state.files.push(SourceFile { id, path });
        id
    }

    fn insert_coverage(&mut self, line: CoverageLine) {
        match self.coverage_slots.get(&line.key()) {
            Some(&slot) => {
                if self.policy == MergePolicy::UnionCoverage {
                    self.state.coverage[slot].test_ids.extend(line.test_ids);
                }
            }
            None => {
                self.coverage_slots
                    .insert(line.key(), self.state.coverage.len());
                self.state.coverage.push(line);
            }
        }
    }
}

/// Ids handed out so far and the highest of them
#[derive(Debug, Default)]
struct IdSpace {
    used: HashSet<u64>,
    highest: u64,
}

impl IdSpace {
    /// `preferred` when it is non-zero and free, otherwise one past the highest
    fn claim(&mut self, preferred: u64) -> u64 {
        let id = if preferred != 0 && !self.used.contains(&preferred) {
            preferred
        } else {
            self.highest + 1
        };
        self.used.insert(id);
        self.highest = self.highest.max(id);
        id
    }
}

/// Merge freshly gathered state into the previously persisted state
///
/// Entries are taken prior-first, then new, each deduplicated by its
/// natural key. Under [`MergePolicy::FirstWriteWins`] a prior entry is never
/// updated by a colliding new one.
#[must_use]
pub fn reconcile(previous: Option<State>, current: State, policy: MergePolicy) -> State {
    let mut builder = StateBuilder::new(policy);
    if let Some(previous) = previous {
        builder.absorb(previous);
    }
    builder.absorb(current);
    let merged = builder.build();
    tracing::debug!(
        tests = merged.tests.len(),
        files = merged.files.len(),
        lines = merged.coverage.len(),
        ?policy,
        "reconciled state"
    );
    merged
}
