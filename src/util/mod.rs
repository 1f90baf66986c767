//! Utilities Module - shared infrastructure
//!
//! - `one_or_many`: scalar-or-list values (`source`, `glob`, `secondaryFiles`)
//! - `validate_id`: id checks for ports and steps

mod one_or_many;

use crate::error::{CwlError, Result};

pub use one_or_many::{OneOrMany, SourceSet};

const ID_RULE: &str = "must start with a letter or '_', then letters, digits, '_' or '-'";

/// Validate a port or step id.
///
/// Ids are joined with `.` and `/` when wiring a workflow, so neither may
/// appear inside an id. Rules:
/// - Must not be empty
/// - Must start with a letter or underscore
/// - Remaining characters: letters, digits, `_` or `-`
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(CwlError::InvalidId {
            id: id.to_string(),
            reason: "cannot be empty".into(),
        });
    }

    if id.contains('.') || id.contains('/') {
        return Err(CwlError::InvalidId {
            id: id.to_string(),
            reason: "'.' and '/' are reserved for step.port references".into(),
        });
    }

    // First character: [A-Za-z_]
    let first = id.as_bytes()[0];
    if !first.is_ascii_alphabetic() && first != b'_' {
        return Err(CwlError::InvalidId {
            id: id.to_string(),
            reason: ID_RULE.into(),
        });
    }

    // Remaining characters: [A-Za-z0-9_-]
    for &byte in &id.as_bytes()[1..] {
        if !byte.is_ascii_alphanumeric() && byte != b'_' && byte != b'-' {
            return Err(CwlError::InvalidId {
                id: id.to_string(),
                reason: ID_RULE.into(),
            });
        }
    }

    Ok(())
}
