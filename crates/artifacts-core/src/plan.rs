//! Acquisition plans.
//!
//! A plan is a tree of concrete steps for obtaining an item: walk
//! somewhere, withdraw, gather, fight, craft. [`plan_for_item`] picks, at
//! each item, the option with the lowest [`PlanNode::weight`] (expected
//! number of actions), preferring a withdraw whenever the bank can cover
//! the whole quantity. Banked units are reserved as they are planned, so
//! two inputs never count the same units.
//!
//! [`execute`] runs a plan through the task loops.

use std::collections::BTreeMap;
use std::fmt;

use artifacts_bank::BankSnapshot;
use artifacts_catalog::Catalog;
use artifacts_types::{ContentKind, ItemQuantity, Skill};
use futures::future::BoxFuture;
use tracing::debug;

use crate::character::Character;
use crate::context::Context;
use crate::error::TaskError;
use crate::runtime::run;
use crate::tasks::{CollectItems, Craft, Fight, Harvest, Withdrawal, collect, withdraw_items};

/// Deepest recipe nesting followed while planning.
const MAX_PLAN_DEPTH: u32 = 16;

/// Where a [`PlanNode::Move`] goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// The closest bank.
    Bank,
    /// The closest workshop for a crafting skill.
    Workshop(Skill),
    /// The closest tile of a resource.
    Resource(String),
    /// The closest tile of a monster.
    Monster(String),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bank => f.write_str("bank"),
            Self::Workshop(skill) => write!(f, "{skill} workshop"),
            Self::Resource(code) => write!(f, "resource {code}"),
            Self::Monster(code) => write!(f, "monster {code}"),
        }
    }
}

/// One step of a plan.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanNode {
    /// Walk to a destination.
    Move(Destination),
    /// Take items from the bank.
    Withdraw(ItemQuantity),
    /// Craft an item; the quantity is the number of crafts.
    Craft(ItemQuantity),
    /// Fight a monster until it has dropped enough of an item.
    Fight {
        /// Monster code.
        monster: String,
        /// Item and quantity wanted from the drops.
        item: ItemQuantity,
        /// Expected units per fight.
        per_action: f64,
    },
    /// Gather a resource until it has dropped enough of an item.
    Gather {
        /// Resource code.
        resource: String,
        /// Item and quantity wanted from the drops.
        item: ItemQuantity,
        /// Expected units per gather.
        per_action: f64,
    },
    /// Run children in order.
    Sequence(Vec<PlanNode>),
}

impl PlanNode {
    /// Expected number of actions the node takes.
    pub fn weight(&self) -> f64 {
        match self {
            Self::Move(_) | Self::Withdraw(_) | Self::Craft(_) => 1.0,
            Self::Fight {
                item, per_action, ..
            }
            | Self::Gather {
                item, per_action, ..
            } => {
                if *per_action > 0.0 {
                    f64::from(item.quantity) / per_action
                } else {
                    f64::INFINITY
                }
            }
            Self::Sequence(children) => children.iter().map(Self::weight).sum(),
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match self {
            Self::Move(destination) => writeln!(f, "{pad}Move to {destination}"),
            Self::Withdraw(item) => writeln!(f, "{pad}Withdraw {}x {}", item.quantity, item.code),
            Self::Craft(item) => writeln!(f, "{pad}Craft {}x {}", item.quantity, item.code),
            Self::Fight { monster, item, .. } => writeln!(
                f,
                "{pad}Fight {monster} for {}x {} (~{:.0} fights)",
                item.quantity,
                item.code,
                self.weight()
            ),
            Self::Gather { resource, item, .. } => writeln!(
                f,
                "{pad}Gather {resource} for {}x {} (~{:.0} gathers)",
                item.quantity,
                item.code,
                self.weight()
            ),
            Self::Sequence(children) => {
                writeln!(f, "{pad}Sequence (weight {:.1})", self.weight())?;
                for child in children {
                    child.fmt_indented(f, depth.saturating_add(1))?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// Build the cheapest plan for obtaining `quantity` units of `code`.
///
/// # Errors
///
/// Returns [`TaskError::Catalog`] for unknown items and
/// [`TaskError::NoSource`] when no option exists.
pub fn plan_for_item(
    catalog: &Catalog,
    bank: &BankSnapshot,
    code: &str,
    quantity: u32,
) -> Result<PlanNode, TaskError> {
    let mut available = bank.items.clone();
    plan_at_depth(catalog, &mut available, code, quantity, 0)
}

fn plan_at_depth(
    catalog: &Catalog,
    available: &mut BTreeMap<String, u32>,
    code: &str,
    quantity: u32,
    depth: u32,
) -> Result<PlanNode, TaskError> {
    let item = catalog.require_item(code)?;
    let no_source = || TaskError::NoSource {
        item: code.to_owned(),
    };
    if depth > MAX_PLAN_DEPTH {
        return Err(no_source());
    }

    if let Some(banked) = available.get_mut(code).filter(|q| **q >= quantity) {
        *banked = banked.saturating_sub(quantity);
        return Ok(PlanNode::Sequence(vec![
            PlanNode::Move(Destination::Bank),
            PlanNode::Withdraw(ItemQuantity::new(code, quantity)),
        ]));
    }

    let wanted = ItemQuantity::new(code, quantity);
    let mut options: Vec<(PlanNode, BTreeMap<String, u32>)> = Vec::new();

    for resource in catalog.resources_dropping(code) {
        let per_action = resource
            .drop_of(code)
            .map_or(0.0, artifacts_types::Drop::average_per_action);
        options.push((
            PlanNode::Sequence(vec![
                PlanNode::Move(Destination::Resource(resource.code.clone())),
                PlanNode::Gather {
                    resource: resource.code.clone(),
                    item: wanted.clone(),
                    per_action,
                },
            ]),
            available.clone(),
        ));
    }

    for monster in catalog.monsters_dropping(code) {
        let per_action = monster
            .drop_of(code)
            .map_or(0.0, artifacts_types::Drop::average_per_action);
        options.push((
            PlanNode::Sequence(vec![
                PlanNode::Move(Destination::Monster(monster.code.clone())),
                PlanNode::Fight {
                    monster: monster.code.clone(),
                    item: wanted.clone(),
                    per_action,
                },
            ]),
            available.clone(),
        ));
    }

    if let Some(recipe) = &item.recipe {
        let crafts = quantity.div_ceil(recipe.quantity.max(1));
        let mut reserved = available.clone();
        let mut steps = Vec::with_capacity(recipe.items.len().saturating_add(2));
        let mut complete = true;
        for input in &recipe.items {
            let needed = input.quantity.saturating_mul(crafts);
            match plan_at_depth(catalog, &mut reserved, &input.code, needed, depth.saturating_add(1))
            {
                Ok(step) => steps.push(step),
                Err(error) => {
                    debug!(item = %code, input = %input.code, error = %error, "Recipe input has no plan");
                    complete = false;
                    break;
                }
            }
        }
        if complete {
            steps.push(PlanNode::Move(Destination::Workshop(recipe.skill)));
            steps.push(PlanNode::Craft(ItemQuantity::new(code, crafts)));
            options.push((PlanNode::Sequence(steps), reserved));
        }
    }

    let (plan, reserved) = options
        .into_iter()
        .min_by(|a, b| a.0.weight().total_cmp(&b.0.weight()))
        .ok_or_else(no_source)?;
    *available = reserved;
    Ok(plan)
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Carry out a plan.
///
/// A withdraw that loses a bank race falls back to collecting the item.
pub fn execute<'a>(
    ctx: &'a Context,
    character: &'a mut Character,
    node: &'a PlanNode,
) -> BoxFuture<'a, Result<(), TaskError>> {
    Box::pin(async move {
        match node {
            PlanNode::Move(destination) => match destination {
                Destination::Bank => character.move_to_bank(ctx).await,
                Destination::Workshop(skill) => character.move_to_workshop(ctx, *skill).await,
                Destination::Resource(code) => {
                    character
                        .move_to_closest(ctx, ContentKind::Resource, code)
                        .await
                }
                Destination::Monster(code) => {
                    character
                        .move_to_closest(ctx, ContentKind::Monster, code)
                        .await
                }
            },
            PlanNode::Withdraw(item) => {
                let outcome = withdraw_items(ctx, character, std::slice::from_ref(item)).await?;
                if outcome == Withdrawal::Raced {
                    let fallback = CollectItems::new(item.code.as_str(), item.quantity);
                    collect(ctx, character, fallback).await?;
                }
                Ok(())
            }
            PlanNode::Craft(item) => {
                let mut craft = Craft::new(item.code.as_str(), item.quantity);
                run(ctx, character, &mut craft).await?;
                if craft.progress().made == 0 {
                    return Err(TaskError::NothingCrafted {
                        item: item.code.clone(),
                    });
                }
                Ok(())
            }
            PlanNode::Gather { resource, item, .. } => {
                let (code, quantity) = (item.code.clone(), item.quantity);
                let mut harvest = Harvest::new(resource.as_str())
                    .until(Box::new(move |_, p| p.dropped(&code) >= quantity));
                run(ctx, character, &mut harvest).await?;
                if harvest.progress().gathered == 0 {
                    return Err(TaskError::CannotHarvest {
                        resource: resource.clone(),
                    });
                }
                Ok(())
            }
            PlanNode::Fight { monster, item, .. } => {
                let limit = ctx.settings.consecutive_loss_limit;
                let (code, quantity) = (item.code.clone(), item.quantity);
                let mut fight = Fight::new(monster.as_str())
                    .loss_limit(limit)
                    .until(Box::new(move |_, p| p.dropped(&code) >= quantity));
                run(ctx, character, &mut fight).await?;
                let progress = fight.progress();
                if progress.unwinnable || progress.fights == 0 || progress.consecutive_losses >= limit
                {
                    return Err(TaskError::Unwinnable {
                        monster: monster.clone(),
                    });
                }
                Ok(())
            }
            PlanNode::Sequence(children) => {
                for child in children {
                    execute(ctx, character, child).await?;
                }
                Ok(())
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use artifacts_catalog::CatalogSnapshot;
    use artifacts_types::{Drop, GatheringSkill, Item, MapContent, MapTile, Position, Recipe, Resource};

    use super::*;

    fn item(code: &str, recipe: Option<Recipe>) -> Item {
        Item {
            code: code.to_owned(),
            name: code.to_owned(),
            level: 1,
            item_type: "resource".to_owned(),
            subtype: String::new(),
            recipe,
            stats: None,
        }
    }

    fn catalog() -> Catalog {
        let plank_recipe = Recipe {
            skill: Skill::Woodcutting,
            level: 1,
            quantity: 1,
            items: vec![ItemQuantity::new("ash_wood", 10)],
        };
        let snapshot = CatalogSnapshot {
            items: vec![
                item("ash_wood", None),
                item("ash_plank", Some(plank_recipe)),
            ],
            monsters: Vec::new(),
            resources: vec![Resource {
                code: "ash_tree".to_owned(),
                name: "Ash Tree".to_owned(),
                skill: GatheringSkill::Woodcutting,
                level: 1,
                drops: vec![Drop {
                    code: "ash_wood".to_owned(),
                    rate: 1,
                    min_quantity: 1,
                    max_quantity: 1,
                }],
            }],
            maps: vec![MapTile {
                name: "Forest".to_owned(),
                position: Position::new(1, 0),
                content: Some(MapContent {
                    kind: ContentKind::Resource,
                    code: "ash_tree".to_owned(),
                }),
            }],
        };
        Catalog::from_snapshot(snapshot).unwrap()
    }

    #[test]
    fn banked_items_are_withdrawn() {
        let bank = BankSnapshot {
            items: BTreeMap::from([("ash_plank".to_owned(), 3)]),
            revision: 1,
        };
        let plan = plan_for_item(&catalog(), &bank, "ash_plank", 2);
        assert_eq!(
            plan.ok(),
            Some(PlanNode::Sequence(vec![
                PlanNode::Move(Destination::Bank),
                PlanNode::Withdraw(ItemQuantity::new("ash_plank", 2)),
            ]))
        );
    }

    #[test]
    fn crafting_plans_gather_inputs_then_craft() {
        let plan = plan_for_item(&catalog(), &BankSnapshot::default(), "ash_plank", 2).unwrap();
        let steps = match plan {
            PlanNode::Sequence(steps) => steps,
            other => vec![other],
        };
        assert_eq!(steps.len(), 3);
        assert!(matches!(steps.first(), Some(PlanNode::Sequence(_))));
        assert_eq!(
            steps.last(),
            Some(&PlanNode::Craft(ItemQuantity::new("ash_plank", 2)))
        );
        // 2 moves + 20 gathers + 1 craft
        let total: f64 = steps.iter().map(PlanNode::weight).sum();
        assert!((total - 23.0).abs() < 1e-9);
    }

    #[test]
    fn bank_units_are_not_counted_twice() {
        let mut available = BTreeMap::from([("ash_wood".to_owned(), 10)]);
        let cat = catalog();
        let first = plan_at_depth(&cat, &mut available, "ash_wood", 10, 0);
        let second = plan_at_depth(&cat, &mut available, "ash_wood", 10, 0);
        assert!(matches!(first, Ok(PlanNode::Sequence(ref s)) if s.len() == 2 && matches!(s.get(1), Some(PlanNode::Withdraw(_)))));
        assert!(matches!(second, Ok(PlanNode::Sequence(ref s)) if matches!(s.get(1), Some(PlanNode::Gather { .. }))));
    }

    #[test]
    fn unknown_sources_are_reported() {
        let plan = plan_for_item(&catalog(), &BankSnapshot::default(), "dragon_scale", 1);
        assert!(matches!(plan, Err(TaskError::Catalog { .. })));
    }

    #[test]
    fn display_indents_nested_sequences() {
        let plan = plan_for_item(&catalog(), &BankSnapshot::default(), "ash_plank", 1)
            .unwrap()
            .to_string();
        assert!(plan.starts_with("Sequence"));
        assert!(plan.contains("\n  Sequence"));
        assert!(plan.contains("\n    Gather ash_tree for 10x ash_wood"));
        assert!(plan.contains("\n  Craft 1x ash_plank"));
    }
}
