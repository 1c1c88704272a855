//! Error types for the `artifacts-catalog` crate.
//!
//! All fallible operations in this crate return [`CatalogError`] through the
//! standard [`Result`] type alias.

/// Errors that can occur while loading or querying the catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// An item code is not in the catalog.
    #[error("unknown item: {0}")]
    UnknownItem(String),

    /// A monster code is not in the catalog.
    #[error("unknown monster: {0}")]
    UnknownMonster(String),

    /// A resource code is not in the catalog.
    #[error("unknown resource: {0}")]
    UnknownResource(String),

    /// The same code appeared twice in one collection.
    #[error("duplicate {kind} code: {code}")]
    Duplicate {
        /// Collection name (item, monster, resource).
        kind: &'static str,
        /// The repeated code.
        code: String,
    },

    /// A recipe or loot table names an item the catalog does not have.
    #[error("{owner} references unknown item {item}")]
    DanglingReference {
        /// Code of the referencing record.
        owner: String,
        /// Missing item code.
        item: String,
    },

    /// The snapshot file could not be read or written.
    #[error("catalog file {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The snapshot file is not valid catalog JSON.
    #[error("catalog file {path} is malformed: {source}")]
    Parse {
        /// File path.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}
