//! Error types for the engine binary.
//!
//! [`EngineError`] covers everything that can stop the engine from
//! starting. Once the character loops run, failures stay inside them.

use std::path::PathBuf;

/// Startup failure.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: artifacts_core::ConfigError,
    },

    /// Talking to the game API failed.
    #[error("API error: {source}")]
    Api {
        /// The underlying client error.
        #[from]
        source: artifacts_client::ApiError,
    },

    /// Loading or building the catalog failed.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: artifacts_catalog::CatalogError,
    },

    /// The simulated backend was selected without a catalog snapshot.
    #[error("the simulated backend needs a catalog snapshot (catalog.snapshot)")]
    NoCatalog,

    /// The configured snapshot does not exist and cannot be fetched.
    #[error("catalog snapshot {path} not found")]
    MissingSnapshot {
        /// Configured snapshot path.
        path: PathBuf,
    },
}
