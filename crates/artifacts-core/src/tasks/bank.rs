//! Bank helpers shared by the task loops.

use artifacts_types::ItemQuantity;
use tracing::{debug, warn};

use crate::character::Character;
use crate::context::Context;
use crate::error::TaskError;

/// Outcome of a withdraw sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Withdrawal {
    /// Every item was taken.
    Complete,
    /// Another character got there first. The bank has been refreshed and
    /// the caller should re-plan from its loop head.
    Raced,
}

/// Deposit the whole inventory. The character must be on a bank tile.
pub async fn deposit_all(ctx: &Context, character: &mut Character) -> Result<(), TaskError> {
    let items: Vec<(String, u32)> = character
        .snapshot()
        .inventory
        .iter()
        .filter(|(_, quantity)| **quantity > 0)
        .map(|(code, quantity)| (code.clone(), *quantity))
        .collect();
    for (code, quantity) in items {
        character.deposit(ctx, &code, quantity).await?;
    }
    Ok(())
}

/// Walk to the closest bank and deposit the whole inventory.
///
/// Does nothing when the inventory is already empty.
pub async fn move_to_bank_and_deposit_all(
    ctx: &Context,
    character: &mut Character,
) -> Result<(), TaskError> {
    if character.snapshot().inventory_count() == 0 {
        return Ok(());
    }
    debug!(character = %character.name(), "Depositing inventory");
    character.move_to_bank(ctx).await?;
    deposit_all(ctx, character).await
}

/// Walk to the closest bank and withdraw items in order.
///
/// A withdraw that fails because the bank no longer holds the item
/// refreshes the shared bank and reports [`Withdrawal::Raced`] instead of
/// an error.
pub async fn withdraw_items(
    ctx: &Context,
    character: &mut Character,
    items: &[ItemQuantity],
) -> Result<Withdrawal, TaskError> {
    if items.iter().all(|i| i.quantity == 0) {
        return Ok(Withdrawal::Complete);
    }
    character.move_to_bank(ctx).await?;
    for item in items.iter().filter(|i| i.quantity > 0) {
        match character.withdraw(ctx, &item.code, item.quantity).await {
            Ok(()) => {}
            Err(error) if error.is_bank_race() => {
                warn!(
                    character = %character.name(),
                    item = %item.code,
                    quantity = item.quantity,
                    error = %error,
                    "Lost bank race, refreshing"
                );
                character.refresh_bank(ctx).await?;
                return Ok(Withdrawal::Raced);
            }
            Err(error) => return Err(error),
        }
    }
    Ok(Withdrawal::Complete)
}
