//! Read-only game catalog for the Artifacts automation engine.
//!
//! The catalog is loaded once at startup, either fetched from the game API
//! or read from a JSON snapshot, and then shared by reference between all
//! character loops. Nothing mutates it after construction.
//!
//! # Modules
//!
//! - [`catalog`] -- [`Catalog`] with code lookups, reverse drop indices
//!   and closest-tile queries.
//! - [`cost`] -- Effort estimate used to rank acquisition options.
//! - [`error`] -- Error types for loading and lookups.
//! - [`snapshot`] -- On-disk JSON form of the catalog.

pub mod catalog;
pub mod cost;
pub mod error;
pub mod snapshot;

// Re-export primary types at crate root.
pub use catalog::Catalog;
pub use cost::{TASK_ITEM_COST, UNSOURCED_ITEM_COST, estimate_cost};
pub use error::CatalogError;
pub use snapshot::CatalogSnapshot;
