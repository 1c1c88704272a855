//! Log what the presentation channels carry.
//!
//! Subscribes to bank events and character updates and writes them to the
//! log, so a run can be followed without a front end.

use std::sync::Arc;

use artifacts_bank::Bank;
use artifacts_core::{Roster, Shutdown};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Spawn the reporter. It stops on shutdown or when both channels close.
pub fn spawn(bank: &Bank, roster: &Roster, shutdown: Arc<Shutdown>) -> JoinHandle<()> {
    let mut bank_events = bank.subscribe();
    let mut updates = roster.subscribe();

    tokio::spawn(async move {
        let mut bank_open = true;
        let mut roster_open = true;
        while bank_open || roster_open {
            tokio::select! {
                () = shutdown.wait() => break,
                event = bank_events.recv(), if bank_open => match event {
                    Ok(event) => {
                        for change in &event.changes {
                            info!(
                                revision = event.revision,
                                item = %change.code,
                                delta = change.delta(),
                                quantity = change.after,
                                "Bank changed"
                            );
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Bank reporter fell behind");
                    }
                    Err(RecvError::Closed) => bank_open = false,
                },
                update = updates.recv(), if roster_open => match update {
                    Ok(update) => debug!(
                        character = %update.snapshot.name,
                        position = %update.snapshot.position,
                        inventory = update.snapshot.inventory_count(),
                        activity = ?update.activity,
                        "Character update"
                    ),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Character reporter fell behind");
                    }
                    Err(RecvError::Closed) => roster_open = false,
                },
            }
        }
    })
}
