//! Providers command handler

use pruner::ProviderKind;
use std::fmt::Write as _;

/// Print the supported providers to stdout
pub fn execute_providers() {
    print!("{}", render_providers());
}

/// Listing of every provider and the settings `init` accepts for it
pub fn render_providers() -> String {
    let mut out = String::new();
    for kind in ProviderKind::ALL {
        let _ = writeln!(out, "{}", kind.name());
        for question in kind.init_questions() {
            let _ = writeln!(out, "  --answer {}=<value>", question.key);
            let _ = writeln!(out, "      {} {}", question.message, question.hint);
        }
    }
    out
}
