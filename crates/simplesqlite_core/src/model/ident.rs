//! SQL identifier validation.
//!
//! Table and column names are interpolated into SQL text, so every name is
//! checked against a conservative identifier pattern first.

use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid"));

/// Returns whether `name` can be used verbatim as a table or column name.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_PATTERN.is_match(name)
}
