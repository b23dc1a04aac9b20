//! Hierarchical report → flat coverage batch
//!
//! The output of [`CoverageNormalizer::normalize`] still carries the ids the
//! report assigned. Those are only meaningful inside that one report; fold
//! batches through [`crate::merge::StateBuilder`] before comparing them with
//! anything else.

use super::report::{CoverageSession, Module, SequencePoint};
use crate::state::{CoverageLine, FileId, SourceFile, State, Test, TestId};
use std::collections::BTreeSet;
use std::path::Path;

/// Sequence points spanning more lines than this are treated as malformed
pub const MAX_SEQUENCE_POINT_SPAN: u32 = 10_000;

/// Normalizes coverage reports relative to one project root
#[derive(Debug, Clone)]
pub struct CoverageNormalizer {
    root_prefix: String,
}

impl CoverageNormalizer {
    /// Create a normalizer for files under `project_root`
    #[must_use]
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        let root = normalize_path_separators(&project_root.as_ref().to_string_lossy());
        let root = root.trim_end_matches('/');
        Self {
            root_prefix: format!("{root}/"),
        }
    }

    /// Flatten a parsed report into one report-scoped batch
    #[must_use]
    pub fn normalize(&self, session: &CoverageSession) -> State {
        let mut batch = State::new();
        for module in session.modules() {
            self.collect_files(module, &mut batch.files);
            collect_tests(module, &mut batch.tests);
            collect_coverage(module, &mut batch.coverage);
        }
        tracing::debug!(
            tests = batch.tests.len(),
            files = batch.files.len(),
            lines = batch.coverage.len(),
            "normalized coverage report"
        );
        batch
    }

    /// Root-relative, slash-separated path, or `None` outside the root
    #[must_use]
    pub fn relative_path(&self, full_path: &str) -> Option<String> {
        let normalized = normalize_path_separators(full_path);
        normalized
            .strip_prefix(&self.root_prefix)
            .filter(|relative| !relative.is_empty())
            .map(str::to_owned)
    }

    fn collect_files(&self, module: &Module, files: &mut Vec<SourceFile>) {
        for entry in module.files() {
            let (Some(id), Some(full_path)) = (parse_id(entry.uid.as_deref()), entry.full_path.as_deref())
            else {
                tracing::debug!(?entry, "dropping file entry without uid/fullPath");
                continue;
            };
            match self.relative_path(full_path) {
                Some(path) => files.push(SourceFile { id, path }),
                None => tracing::trace!(full_path, "file outside project root"),
            }
        }
    }
}

fn collect_tests(module: &Module, tests: &mut Vec<Test>) {
    for method in module.tracked_methods() {
        let id = parse_id(method.uid.as_deref());
        let name = method.name.as_deref().and_then(sanitize_method_name);
        match (id, name) {
            (Some(id), Some(name)) => tests.push(Test { id, name }),
            _ => tracing::debug!(?method, "dropping tracked method"),
        }
    }
}

fn collect_coverage(module: &Module, coverage: &mut Vec<CoverageLine>) {
    for point in module.sequence_points() {
        let Some((file_id, start, end, test_ids)) = sequence_point_parts(point) else {
            continue;
        };
        coverage.extend((start..=end).map(|line_number| CoverageLine {
            test_ids: test_ids.clone(),
            file_id,
            line_number,
        }));
    }
}

fn sequence_point_parts(point: &SequencePoint) -> Option<(FileId, u32, u32, BTreeSet<TestId>)> {
    let file_id = parse_id(point.fileid.as_deref())?;
    let test_ids: BTreeSet<TestId> = point
        .tracked_method_uids()
        .filter_map(|uid| parse_id(Some(uid)))
        .collect();
    if test_ids.is_empty() {
        return None;
    }

    let start: u32 = point.sl.as_deref()?.trim().parse().ok()?;
    let end: u32 = point.el.as_deref()?.trim().parse().ok()?;
    if end < start || end - start >= MAX_SEQUENCE_POINT_SPAN {
        tracing::warn!(start, end, file_id, "rejecting malformed sequence point");
        return None;
    }
    Some((file_id, start, end, test_ids))
}

/// Parse a report id; zero and garbage are both "missing"
fn parse_id(raw: Option<&str>) -> Option<u64> {
    raw?.trim().parse::<u64>().ok().filter(|id| *id != 0)
}

/// `System.Void Ns.Type::Method(System.Int32)` → `Ns.Type.Method`
///
/// Returns `None` when there is no second whitespace-separated token.
#[must_use]
pub fn sanitize_method_name(raw: &str) -> Option<String> {
    let signature = raw.split_whitespace().nth(1)?;
    let dotted = signature.replace("::", ".");
    let name = match dotted.find('(') {
        Some(open) => &dotted[..open],
        None => dotted.as_str(),
    };
    (!name.is_empty()).then(|| name.to_owned())
}

/// Rewrite `\` separators to `/`
#[must_use]
pub fn normalize_path_separators(path: &str) -> String {
    path.replace('\\', "/")
}
