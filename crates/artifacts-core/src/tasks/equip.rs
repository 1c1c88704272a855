//! Wear the best owned gear against a target.

use std::collections::BTreeMap;

use artifacts_equipment::{EquipmentSet, OwnedGear, best_owned_equipment};
use artifacts_types::{ItemQuantity, StatsProfile};
use tracing::info;

use crate::character::Character;
use crate::context::Context;
use crate::error::TaskError;
use crate::tasks::bank::{Withdrawal, deposit_all, move_to_bank_and_deposit_all, withdraw_items};

/// Run the optimizer against `target` and make the character wear the
/// result.
///
/// Changed slots are emptied first, upgrades missing from the inventory
/// are taken from the bank, then the chosen items are equipped. When the
/// bank was used the inventory is deposited afterwards. A lost bank race
/// restarts from a fresh optimization.
pub async fn equip_best(
    ctx: &Context,
    character: &mut Character,
    target: &StatsProfile,
) -> Result<EquipmentSet, TaskError> {
    loop {
        let bank = ctx.bank.snapshot();
        let owned = OwnedGear::new(character.snapshot(), &bank.items);
        let set = best_owned_equipment(&ctx.catalog, &owned, target);
        let changes = set.changes_from(&character.snapshot().equipment);
        if changes.is_empty() {
            return Ok(set);
        }

        info!(
            character = %character.name(),
            changes = changes.len(),
            can_win = set.can_win(),
            "Changing equipment"
        );

        let slots_to_clear = changes.iter().filter(|c| c.current.is_some()).count();
        let free = usize::try_from(character.snapshot().inventory_free()).unwrap_or(usize::MAX);
        if free < slots_to_clear {
            move_to_bank_and_deposit_all(ctx, character).await?;
        }
        for change in changes.iter().filter(|c| c.current.is_some()) {
            character.unequip(ctx, change.slot).await?;
        }

        let mut wanted: BTreeMap<&str, u32> = BTreeMap::new();
        for code in changes.iter().filter_map(|c| c.wanted.as_deref()) {
            let entry = wanted.entry(code).or_insert(0);
            *entry = entry.saturating_add(1);
        }
        let missing = wanted
            .iter()
            .any(|(code, count)| character.snapshot().inventory_quantity(code) < *count);

        if missing {
            character.move_to_bank(ctx).await?;
            deposit_all(ctx, character).await?;
            let items: Vec<ItemQuantity> = wanted
                .iter()
                .map(|(code, count)| ItemQuantity::new(*code, *count))
                .collect();
            if withdraw_items(ctx, character, &items).await? == Withdrawal::Raced {
                continue;
            }
        }

        for change in &changes {
            if let Some(code) = &change.wanted {
                character.equip(ctx, change.slot, code).await?;
            }
        }

        if missing {
            move_to_bank_and_deposit_all(ctx, character).await?;
        }
        return Ok(set);
    }
}
