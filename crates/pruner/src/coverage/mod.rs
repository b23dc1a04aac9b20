//! Coverage Normalizer
//!
//! Converts AltCover/OpenCover XML reports into the flat [`crate::State`]
//! model: one [`crate::CoverageLine`] per source line per sequence point,
//! carrying the ids of every test that executed it.
//!
//! ```text
//! coverage.xml ─► CoverageSession ─► CoverageNormalizer ─► batch (report ids)
//!                                                              │
//!                        StateBuilder (re-key by name/path) ◄──┘
//! ```

mod normalize;
mod report;

pub use normalize::{
    normalize_path_separators, sanitize_method_name, CoverageNormalizer, MAX_SEQUENCE_POINT_SPAN,
};
pub use report::{
    Class, Classes, CoverageSession, FileEntry, Files, Method, Methods, Module, Modules,
    SequencePoint, SequencePoints, TrackedMethod, TrackedMethodRef, TrackedMethodRefs,
    TrackedMethods,
};

use crate::merge::{MergePolicy, StateBuilder};
use crate::state::State;

/// Normalize several report documents into one State
///
/// Each document is its own id space. Documents that fail to parse are
/// skipped with a warning; coverage of the same line from different
/// documents is unioned.
#[must_use]
pub fn normalize_reports<'a>(
    normalizer: &CoverageNormalizer,
    documents: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> State {
    let mut builder = StateBuilder::new(MergePolicy::UnionCoverage);
    for (origin, xml) in documents {
        match CoverageSession::from_xml(xml) {
            Ok(session) => builder.absorb(normalizer.normalize(&session)),
            Err(error) => {
                tracing::warn!(report = origin, %error, "skipping unreadable coverage report");
            }
        }
    }
    builder.build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::state::{CoverageLine, Test};

    fn report(test_uid: u64, test_name: &str, file_uid: u64, line: u32) -> String {
        format!(
            r#"<CoverageSession><Modules><Module>
                <Files><File uid="{file_uid}" fullPath="/repo/Shared.cs"/></Files>
                <Classes><Class><Methods><Method><SequencePoints>
                    <SequencePoint sl="{line}" el="{line}" fileid="{file_uid}">
                        <TrackedMethodRefs><TrackedMethodRef uid="{test_uid}"/></TrackedMethodRefs>
                    </SequencePoint>
                </SequencePoints></Method></Methods></Class></Classes>
                <TrackedMethods><TrackedMethod uid="{test_uid}" name="System.Void {test_name}()"/></TrackedMethods>
            </Module></Modules></CoverageSession>"#
        )
    }

    #[test]
    fn test_reports_with_colliding_ids_are_rekeyed() {
        let first = report(1, "Web.Tests::Renders", 1, 5);
        let second = report(1, "Api.Tests::Serves", 1, 5);

        let state = normalize_reports(
            &CoverageNormalizer::new("/repo"),
            [("web/coverage.xml", first.as_str()), ("api/coverage.xml", second.as_str())],
        );

        assert_eq!(state.files.len(), 1);
        assert_eq!(state.tests.len(), 2);
        let renders = state.tests.iter().find(|t| t.name == "Web.Tests.Renders").unwrap();
        let serves = state.tests.iter().find(|t| t.name == "Api.Tests.Serves").unwrap();
        assert_ne!(renders.id, serves.id);
        assert_eq!(
            state.coverage,
            vec![CoverageLine::new(state.files[0].id, 5, [renders.id, serves.id])]
        );
    }

    #[test]
    fn test_unparseable_report_is_skipped() {
        let good = report(3, "Lib.Tests::Works", 2, 9);
        let state = normalize_reports(
            &CoverageNormalizer::new("/repo"),
            [("bad.xml", "<CoverageSession><Modules>"), ("good.xml", good.as_str())],
        );

        assert_eq!(state.tests, vec![Test::new(3, "Lib.Tests.Works")]);
    }
}
