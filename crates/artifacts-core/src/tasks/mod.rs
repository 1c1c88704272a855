//! Task combinators.
//!
//! Each combinator is a [`Task`](crate::runtime::Task) holding its goal
//! parameters, an optional stop predicate, and the progress it has
//! accumulated. Run one with [`run`](crate::runtime::run) and read its
//! progress afterwards.
//!
//! - [`harvest`] -- Gather a resource.
//! - [`craft`] -- Craft an item from inventory and bank inputs.
//! - [`fight`] -- Fight a monster.
//! - [`task_loop`] -- Take and finish monster tasks.
//! - [`task_item`] -- Exchange task coins for task rewards.
//! - [`collect`] -- Obtain an item by any of its sources.
//! - [`make`] -- Make an item in batches.
//! - [`equip`] -- Wear the optimizer's choice.
//! - [`bank`] -- Deposit and withdraw helpers.

pub mod bank;
pub mod collect;
pub mod craft;
pub mod equip;
pub mod fight;
pub mod harvest;
pub mod make;
pub mod task_item;
pub mod task_loop;

pub use bank::{Withdrawal, deposit_all, move_to_bank_and_deposit_all, withdraw_items};
pub use collect::{CollectItems, CollectProgress, CollectState, collect};
pub use craft::{Craft, CraftProgress, CraftState, craftable};
pub use equip::equip_best;
pub use fight::{Fight, FightProgress, FightState};
pub use harvest::{Harvest, HarvestProgress, HarvestState};
pub use make::{MakeItems, MakeProgress, MakeState};
pub use task_item::{TaskItem, TaskItemProgress, TaskItemState};
pub use task_loop::{TaskLoop, TaskLoopProgress, TaskLoopState};
