//! Rough acquisition cost of an item.
//!
//! The estimate is a unitless effort score used to rank options: which
//! gear to craft first, which material source a plan should use, how to
//! split a material order across harvesters. It is not a time in seconds.
//!
//! - Crafted items cost the sum of their inputs.
//! - Gathered items cost `avg_quantity * rate * resource_level` for the
//!   cheapest resource.
//! - Monster drops cost `avg_quantity * expected_kills * monster_level`,
//!   where `expected_kills` is the number of fights that yield the item
//!   with 75% confidence.
//! - Task rewards and anything without a known source get fixed costs.

use artifacts_types::Drop;

use crate::catalog::Catalog;
use crate::error::CatalogError;

/// Cost of items only obtainable through tasks.
pub const TASK_ITEM_COST: u64 = 30_000;

/// Cost of items with no gatherable, droppable or craftable source.
pub const UNSOURCED_ITEM_COST: u64 = 5_000;

/// Confidence that the expected number of kills yields at least one drop.
const DROP_CONFIDENCE: f64 = 0.75;

/// Maximum recipe depth followed before giving up on an item.
const MAX_RECIPE_DEPTH: u32 = 16;

/// Estimated effort to obtain one unit of an item.
///
/// # Errors
///
/// Returns [`CatalogError::UnknownItem`] if the item, or any input of its
/// recipe, is not in the catalog.
pub fn estimate_cost(catalog: &Catalog, code: &str) -> Result<u64, CatalogError> {
    cost_at_depth(catalog, code, 0)
}

fn cost_at_depth(catalog: &Catalog, code: &str, depth: u32) -> Result<u64, CatalogError> {
    let item = catalog.require_item(code)?;

    if let Some(recipe) = item.recipe.as_ref().filter(|_| depth < MAX_RECIPE_DEPTH) {
        let mut total: u64 = 0;
        for input in &recipe.items {
            let unit = cost_at_depth(catalog, &input.code, depth.saturating_add(1))?;
            total = total.saturating_add(unit.saturating_mul(u64::from(input.quantity)));
        }
        return Ok(total);
    }

    let gathered = catalog
        .resources_dropping(code)
        .filter_map(|r| r.drop_of(code).map(|d| gather_cost(d, r.level)))
        .min();
    if let Some(cost) = gathered {
        return Ok(cost);
    }

    let looted = catalog
        .monsters_dropping(code)
        .filter_map(|m| m.drop_of(code).map(|d| loot_cost(d, m.level)))
        .min();
    if let Some(cost) = looted {
        return Ok(cost);
    }

    if item.is_task_reward() {
        return Ok(TASK_ITEM_COST);
    }
    Ok(UNSOURCED_ITEM_COST)
}

fn average_quantity(drop: &Drop) -> f64 {
    f64::from(drop.min_quantity.saturating_add(drop.max_quantity)) / 2.0
}

fn gather_cost(drop: &Drop, level: u32) -> u64 {
    to_cost(average_quantity(drop) * f64::from(drop.rate) * f64::from(level))
}

fn loot_cost(drop: &Drop, level: u32) -> u64 {
    let expected_kills = if drop.rate <= 1 {
        1.0
    } else {
        let p_miss = 1.0 - 1.0 / f64::from(drop.rate);
        (1.0 - DROP_CONFIDENCE).ln() / p_miss.ln()
    };
    to_cost(average_quantity(drop) * expected_kills * f64::from(level))
}

/// Truncate a non-negative estimate to an integer cost.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_cost(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use artifacts_types::{GatheringSkill, Item, ItemQuantity, Monster, Recipe, Resource, Skill, StatsProfile};

    use super::*;
    use crate::snapshot::CatalogSnapshot;

    fn item(code: &str, subtype: &str) -> Item {
        Item {
            code: code.to_owned(),
            name: code.to_owned(),
            level: 1,
            item_type: "resource".to_owned(),
            subtype: subtype.to_owned(),
            recipe: None,
            stats: None,
        }
    }

    fn catalog() -> Catalog {
        let mut plank = item("ash_plank", "");
        plank.recipe = Some(Recipe {
            skill: Skill::Woodcutting,
            level: 1,
            quantity: 1,
            items: vec![ItemQuantity::new("ash_wood", 10)],
        });
        let snapshot = CatalogSnapshot {
            items: vec![
                item("ash_wood", ""),
                plank,
                item("feather", ""),
                item("jasper_crystal", "task"),
                item("gold_coin", ""),
            ],
            monsters: vec![Monster {
                code: "chicken".to_owned(),
                name: "Chicken".to_owned(),
                level: 2,
                stats: StatsProfile::default(),
                drops: vec![Drop {
                    code: "feather".to_owned(),
                    rate: 4,
                    min_quantity: 1,
                    max_quantity: 1,
                }],
            }],
            resources: vec![Resource {
                code: "ash_tree".to_owned(),
                name: "Ash Tree".to_owned(),
                skill: GatheringSkill::Woodcutting,
                level: 3,
                drops: vec![Drop {
                    code: "ash_wood".to_owned(),
                    rate: 1,
                    min_quantity: 1,
                    max_quantity: 3,
                }],
            }],
            maps: Vec::new(),
        };
        Catalog::from_snapshot(snapshot).unwrap_or_default()
    }

    #[test]
    fn gathered_cost_scales_with_level() {
        // avg 2 * rate 1 * level 3
        assert_eq!(estimate_cost(&catalog(), "ash_wood").ok(), Some(6));
    }

    #[test]
    fn crafted_cost_sums_inputs() {
        assert_eq!(estimate_cost(&catalog(), "ash_plank").ok(), Some(60));
    }

    #[test]
    fn monster_drop_uses_expected_kills() {
        // ln(0.25) / ln(0.75) is about 4.82 kills, times level 2
        assert_eq!(estimate_cost(&catalog(), "feather").ok(), Some(9));
    }

    #[test]
    fn fixed_costs_for_unsourced_items() {
        let catalog = catalog();
        assert_eq!(estimate_cost(&catalog, "jasper_crystal").ok(), Some(TASK_ITEM_COST));
        assert_eq!(estimate_cost(&catalog, "gold_coin").ok(), Some(UNSOURCED_ITEM_COST));
        assert!(estimate_cost(&catalog, "nothing").is_err());
    }
}
