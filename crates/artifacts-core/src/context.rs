//! Shared handles every character loop works with.

use std::sync::Arc;

use artifacts_bank::Bank;
use artifacts_catalog::Catalog;
use artifacts_client::ActionBackend;

use crate::config::TaskSettings;
use crate::queue::WorkQueue;
use crate::roster::Roster;
use crate::shutdown::Shutdown;

/// Everything a task needs besides the character it drives.
///
/// Cheap to clone: each field is shared.
#[derive(Clone)]
pub struct Context {
    /// Game catalog.
    pub catalog: Arc<Catalog>,
    /// Where actions are sent.
    pub backend: Arc<ActionBackend>,
    /// Cached bank contents.
    pub bank: Arc<Bank>,
    /// Latest state of every character.
    pub roster: Arc<Roster>,
    /// Crafter wants for harvesters.
    pub wants: Arc<WorkQueue>,
    /// Stop signal.
    pub shutdown: Arc<Shutdown>,
    /// Task and role tuning.
    pub settings: TaskSettings,
    /// Number of harvesters sharing crafter wants.
    pub harvesters: u32,
}

impl Context {
    /// Context with a fresh roster, want queue and stop signal.
    pub fn new(
        catalog: Arc<Catalog>,
        backend: Arc<ActionBackend>,
        bank: Arc<Bank>,
        settings: TaskSettings,
    ) -> Self {
        Self {
            catalog,
            backend,
            bank,
            roster: Arc::new(Roster::new()),
            wants: Arc::new(WorkQueue::new()),
            shutdown: Arc::new(Shutdown::new()),
            settings,
            harvesters: 0,
        }
    }

    /// Set the harvester count used to split crafter wants.
    #[must_use]
    pub const fn with_harvesters(mut self, harvesters: u32) -> Self {
        self.harvesters = harvesters;
        self
    }
}
