//! Coverage data model
//!
//! A [`State`] is the line-granularity coverage index persisted between
//! runs: which tests touched which line of which file. Numeric ids are
//! working identifiers only; the stable keys are a test's `name`, a file's
//! `path`, and `(file_id, line_number)` for coverage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifier of a test within one [`State`]
pub type TestId = u64;

/// Identifier of a source file within one [`State`]
pub type FileId = u64;

/// A test case known from coverage
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Test {
    /// Working identifier
    pub id: TestId,
    /// Fully-qualified dotted method name
    pub name: String,
}

impl Test {
    /// Create a test
    #[must_use]
    pub fn new(id: TestId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A source file known from coverage
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceFile {
    /// Working identifier
    pub id: FileId,
    /// Slash-separated path relative to the project root
    pub path: String,
}

impl SourceFile {
    /// Create a source file
    #[must_use]
    pub fn new(id: FileId, path: impl Into<String>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }
}

/// The tests that exercised one line of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageLine {
    /// Tests that executed this line
    pub test_ids: BTreeSet<TestId>,
    /// File the line belongs to
    pub file_id: FileId,
    /// 1-based line number
    pub line_number: u32,
}

impl CoverageLine {
    /// Create a coverage entry
    #[must_use]
    pub fn new(file_id: FileId, line_number: u32, test_ids: impl IntoIterator<Item = TestId>) -> Self {
        Self {
            test_ids: test_ids.into_iter().collect(),
            file_id,
            line_number,
        }
    }

    /// Uniqueness key of this entry
    #[must_use]
    pub const fn key(&self) -> (FileId, u32) {
        (self.file_id, self.line_number)
    }
}

/// Persisted coverage index for one provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Known tests, unique by name
    #[serde(default)]
    pub tests: Vec<Test>,
    /// Known files, unique by path
    #[serde(default)]
    pub files: Vec<SourceFile>,
    /// Line coverage, unique by `(file_id, line_number)`
    #[serde(default)]
    pub coverage: Vec<CoverageLine>,
}

impl State {
    /// Create an empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing is known
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty() && self.files.is_empty() && self.coverage.is_empty()
    }

    /// Look up a test by id
    #[must_use]
    pub fn test(&self, id: TestId) -> Option<&Test> {
        self.tests.iter().find(|test| test.id == id)
    }

    /// Look up a file by its root-relative path
    #[must_use]
    pub fn file_by_path(&self, path: &str) -> Option<&SourceFile> {
        self.files.iter().find(|file| file.path == path)
    }

    /// Coverage entries recorded for one file
    pub fn coverage_for(&self, file_id: FileId) -> impl Iterator<Item = &CoverageLine> {
        self.coverage
            .iter()
            .filter(move |line| line.file_id == file_id)
    }
}

/// The changed-line footprint of one file in a diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedFile {
    /// Path as reported by version control
    pub name: String,
    /// Added or deleted line numbers
    pub line_numbers: BTreeSet<u32>,
}

impl ChangedFile {
    /// Create a changed file
    #[must_use]
    pub fn new(name: impl Into<String>, line_numbers: impl IntoIterator<Item = u32>) -> Self {
        Self {
            name: name.into(),
            line_numbers: line_numbers.into_iter().collect(),
        }
    }
}
