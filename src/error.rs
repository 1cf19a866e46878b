//! Error type for the fallible table mutations.

use thiserror::Error;

/// Why a strict insert, update, or removal did not happen.
///
/// A failed operation never modifies the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TableError {
    /// A strict insert found an entry with the same prefix already present.
    #[error("an entry with this prefix already exists")]
    AlreadyExists,
    /// An update or a strict removal found no entry with the given prefix.
    #[error("no entry with this prefix exists")]
    NotFound,
}
