//! Test filter expressions
//!
//! ```text
//! (Name=A|Name=B)|(Name!=C&Name!=D)
//!  └─ affected ─┘  └── unaffected ──┘
//! ```
//!
//! The unaffected half admits every test that is not known to be safe to
//! skip, which includes tests the previous run never saw. An empty
//! expression means "run everything".

use crate::selector::TestSelection;
use crate::state::Test;

/// Operators of a runner's filter language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSyntax {
    /// Test identity property compared against
    pub property: &'static str,
    /// Equality operator
    pub equals: &'static str,
    /// Inequality operator
    pub not_equals: &'static str,
    /// Logical OR
    pub or: &'static str,
    /// Logical AND
    pub and: &'static str,
}

impl FilterSyntax {
    /// `dotnet test --filter` (VSTest) syntax
    #[must_use]
    pub const fn vstest() -> Self {
        Self {
            property: "FullyQualifiedName",
            equals: "=",
            not_equals: "!=",
            or: "|",
            and: "&",
        }
    }

    fn clause(&self, tests: &[Test], compare: &str, join: &str) -> String {
        tests
            .iter()
            .map(|test| format!("{}{compare}{}", self.property, test.name))
            .collect::<Vec<_>>()
            .join(join)
    }

    /// Build the filter for a selection
    #[must_use]
    pub fn build(&self, selection: &TestSelection) -> String {
        let affected = self.clause(&selection.affected, self.equals, self.or);
        let unaffected = self.clause(&selection.unaffected, self.not_equals, self.and);

        [affected, unaffected]
            .into_iter()
            .filter(|clause| !clause.is_empty())
            .map(|clause| format!("({clause})"))
            .collect::<Vec<_>>()
            .join(self.or)
    }
}

impl Default for FilterSyntax {
    fn default() -> Self {
        Self::vstest()
    }
}
