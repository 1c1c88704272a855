//! Shared bank contents for the Artifacts automation engine.
//!
//! All characters on an account share one bank. This crate keeps an
//! in-memory copy of it behind a single mutex, hands out owned snapshots,
//! and publishes a [`BankEvent`] on a broadcast channel whenever the
//! server reports different contents.
//!
//! The server is the source of truth. The copy here is only ever replaced
//! with what an action response or a bank refresh reports; see
//! [`bank`] for the retry contract callers follow when a withdraw loses a
//! race with another character.
//!
//! # Modules
//!
//! - [`bank`] -- The [`Bank`] itself and its change events.
//! - [`snapshot`] -- Owned copies and per-item diffs.

pub mod bank;
pub mod snapshot;

// Re-export primary types at crate root.
pub use bank::{Bank, BankEvent};
pub use snapshot::{BankChange, BankSnapshot};
