//! Line-comment stripping for the relaxed JSON dialect used by spec files.
//!
//! The dialect is plain JSON plus `//` comments running to the end of the
//! line. A single regex finds string literals and comments in one left-to-right
//! pass; literals are kept verbatim and comments dropped, so `//` inside a
//! string (URLs, for instance) is never mistaken for a comment.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static LITERAL_OR_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"("(?:[^"\\\n]|\\.)*")|(//[^\n]*)"#).expect("comment regex is valid")
});

/// Remove `//` comments, leaving string literals untouched.
#[must_use]
pub fn strip_comments(text: &str) -> String {
    LITERAL_OR_COMMENT
        .replace_all(text, |caps: &Captures<'_>| match caps.get(1) {
            Some(literal) => literal.as_str().to_string(),
            None => String::new(),
        })
        .into_owned()
}
