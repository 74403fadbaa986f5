//! Database query modules.

pub mod contents;
pub mod variants;

use reelhook_common::Error;

/// Whether a rusqlite error is a UNIQUE/constraint violation.
pub(crate) fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

pub(crate) fn db_err(e: rusqlite::Error) -> Error {
    Error::database(e.to_string())
}
