//! In-memory game server.
//!
//! Applies the game's rules to a catalog and a set of characters without
//! touching the network. The engine uses it for dry runs; the integration
//! tests use it as a deterministic backend and read back the action log it
//! records.
//!
//! Rules follow the live server where it matters to the engine: actions
//! only work on the right tile (598 otherwise), bank withdraws fail with
//! 404/478 when the bank is short, the inventory rejects overflow with 497,
//! and a character in cooldown gets 499.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use artifacts_catalog::Catalog;
use artifacts_types::{
    Action, ActionDetails, ActionResponse, CharacterSnapshot, ContentKind, Drop, FightOutcome,
    FightResult, Item, ItemQuantity, Monster, Position, Skill, SkillProgress, SkillResult, Slot,
    StatsProfile, TaskAssignment, TaskProgress, TaskReward, TaskType,
};
use chrono::{TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, codes};

/// Currency paid out by the tasks master.
pub const TASKS_COIN: &str = "tasks_coin";

/// Coins paid for a completed task.
pub const TASK_COMPLETION_COINS: u32 = 2;

/// Coins spent on one task exchange.
pub const EXCHANGE_COST: u32 = 3;

/// Coins spent to cancel a task.
pub const CANCEL_COST: u32 = 1;

/// Hit points of a character before gear: `120 + 5 * level`.
const BASE_HP: i32 = 120;
const HP_PER_LEVEL: i32 = 5;

/// How fights are decided.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FightPolicy {
    /// Compare turns to kill from worn gear against the monster.
    #[default]
    Simulate,
    /// Every fight is won.
    AlwaysWin,
    /// Every fight is lost.
    AlwaysLose,
}

/// Simulated server settings.
#[derive(Debug, Clone, Default)]
pub struct SimulatedConfig {
    /// Cooldown applied after every successful action.
    pub cooldown: Duration,
    /// Fight resolution.
    pub fight_policy: FightPolicy,
    /// Seed for drops and task assignment.
    pub seed: u64,
}

/// One action the server received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    /// Acting character.
    pub character: String,
    /// The request.
    pub action: Action,
    /// Whether the action succeeded.
    pub succeeded: bool,
}

struct World {
    characters: BTreeMap<String, CharacterSnapshot>,
    bank: BTreeMap<String, u32>,
    fight_policy: FightPolicy,
    rng: StdRng,
    log: Vec<ActionRecord>,
}

/// Shared handle to an in-memory game world. Clones see the same world.
#[derive(Clone)]
pub struct SimulatedServer {
    catalog: Arc<Catalog>,
    cooldown: Duration,
    world: Arc<Mutex<World>>,
}

impl SimulatedServer {
    /// Create an empty world over a catalog.
    pub fn new(catalog: Arc<Catalog>, config: &SimulatedConfig) -> Self {
        let world = World {
            characters: BTreeMap::new(),
            bank: BTreeMap::new(),
            fight_policy: config.fight_policy,
            rng: StdRng::seed_from_u64(config.seed),
            log: Vec::new(),
        };
        Self {
            catalog,
            cooldown: config.cooldown,
            world: Arc::new(Mutex::new(world)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace a character.
    pub fn add_character(&self, character: CharacterSnapshot) {
        self.lock()
            .characters
            .insert(character.name.clone(), character);
    }

    /// Replace the bank contents.
    pub fn set_bank(&self, items: BTreeMap<String, u32>) {
        self.lock().bank = items.into_iter().filter(|(_, q)| *q > 0).collect();
    }

    /// Change how fights are decided.
    pub fn set_fight_policy(&self, policy: FightPolicy) {
        self.lock().fight_policy = policy;
    }

    /// Every action received so far, in order.
    pub fn action_log(&self) -> Vec<ActionRecord> {
        self.lock().log.clone()
    }

    /// Current bank contents.
    pub fn bank_items(&self) -> BTreeMap<String, u32> {
        self.lock().bank.clone()
    }

    /// Current state of one character.
    pub fn character(&self, name: &str) -> Result<CharacterSnapshot, ApiError> {
        self.lock()
            .characters
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError::status(codes::NOT_FOUND, format!("character {name} not found")))
    }

    /// Every character in the world.
    pub fn characters(&self) -> Vec<CharacterSnapshot> {
        self.lock().characters.values().cloned().collect()
    }

    /// Apply one action.
    pub fn execute(&self, name: &str, action: &Action) -> Result<ActionResponse, ApiError> {
        let mut guard = self.lock();
        let world = &mut *guard;
        let now = Utc::now();

        let result = match world.characters.get_mut(name) {
            None => Err(ApiError::status(
                codes::NOT_FOUND,
                format!("character {name} not found"),
            )),
            Some(character) if now < character.cooldown_expires => Err(ApiError::status(
                codes::COOLDOWN,
                "character in cooldown",
            )),
            Some(character) => {
                let mut rules = Rules {
                    catalog: &self.catalog,
                    character,
                    bank: &mut world.bank,
                    rng: &mut world.rng,
                    fight_policy: world.fight_policy,
                };
                rules.apply(action).map(|details| {
                    let seconds = u32::try_from(self.cooldown.as_secs()).unwrap_or(u32::MAX);
                    let delta = TimeDelta::from_std(self.cooldown).unwrap_or_default();
                    rules.character.cooldown_seconds = seconds;
                    rules.character.cooldown_expires =
                        now.checked_add_signed(delta).unwrap_or(now);
                    ActionResponse {
                        character: rules.character.clone(),
                        bank: action.touches_bank().then(|| rules.bank.clone()),
                        details,
                    }
                })
            }
        };

        debug!(
            character = name,
            action = action.name(),
            ok = result.is_ok(),
            "Simulated action"
        );
        world.log.push(ActionRecord {
            character: name.to_owned(),
            action: action.clone(),
            succeeded: result.is_ok(),
        });
        result
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

struct Rules<'a> {
    catalog: &'a Catalog,
    character: &'a mut CharacterSnapshot,
    bank: &'a mut BTreeMap<String, u32>,
    rng: &'a mut StdRng,
    fight_policy: FightPolicy,
}

impl<'a> Rules<'a> {
    fn apply(&mut self, action: &Action) -> Result<ActionDetails, ApiError> {
        match action {
            Action::Move { position } => self.travel(*position),
            Action::Gather => self.gather(),
            Action::Craft(q) => self.craft(q),
            Action::Fight => self.fight(),
            Action::Equip { slot, code } => self.equip(*slot, code),
            Action::Unequip { slot } => self.unequip(*slot),
            Action::Deposit(q) => self.deposit(q),
            Action::Withdraw(q) => self.withdraw(q),
            Action::AcceptTask => self.accept_task(),
            Action::CompleteTask => self.complete_task(),
            Action::ExchangeTask => self.exchange_task(),
            Action::CancelTask => self.cancel_task(),
            Action::Recycle(q) => self.recycle(q),
        }
    }

    // -- helpers ------------------------------------------------------------

    /// Code of the content of `kind` on the character's tile.
    fn content(&self, kind: ContentKind) -> Result<String, ApiError> {
        let position = self.character.position;
        self.catalog
            .tiles()
            .iter()
            .filter(|t| t.position == position)
            .filter_map(|t| t.content.as_ref())
            .find(|c| c.kind == kind)
            .map(|c| c.code.clone())
            .ok_or_else(|| {
                ApiError::status(
                    codes::NOT_FOUND_ON_MAP,
                    format!("no {} on {position}", kind.as_str()),
                )
            })
    }

    fn item(&self, code: &str) -> Result<&'a Item, ApiError> {
        self.catalog
            .item(code)
            .ok_or_else(|| ApiError::status(codes::NOT_FOUND, format!("item {code} not found")))
    }

    fn take(&mut self, code: &str, quantity: u32) -> Result<(), ApiError> {
        let held = self.character.inventory_quantity(code);
        if held < quantity {
            return Err(ApiError::status(
                codes::MISSING_ITEM,
                format!("missing {code}: have {held}, need {quantity}"),
            ));
        }
        remove_units(&mut self.character.inventory, code, quantity);
        Ok(())
    }

    fn give(&mut self, items: &[ItemQuantity]) -> Result<(), ApiError> {
        let incoming = items
            .iter()
            .fold(0_u32, |acc, q| acc.saturating_add(q.quantity));
        if incoming > self.character.inventory_free() {
            return Err(ApiError::status(codes::INVENTORY_FULL, "inventory is full"));
        }
        for q in items.iter().filter(|q| q.quantity > 0) {
            add_units(&mut self.character.inventory, &q.code, q.quantity);
        }
        Ok(())
    }

    fn ensure_room(&self) -> Result<(), ApiError> {
        if self.character.is_inventory_full() {
            return Err(ApiError::status(codes::INVENTORY_FULL, "inventory is full"));
        }
        Ok(())
    }

    fn roll(&mut self, drops: &[Drop]) -> Vec<ItemQuantity> {
        let mut rolled = Vec::new();
        for drop in drops {
            let hit = drop.rate <= 1 || self.rng.random_ratio(1, drop.rate);
            if !hit {
                continue;
            }
            let quantity = if drop.min_quantity < drop.max_quantity {
                self.rng.random_range(drop.min_quantity..=drop.max_quantity)
            } else {
                drop.min_quantity
            };
            if quantity > 0 {
                rolled.push(ItemQuantity::new(drop.code.clone(), quantity));
            }
        }
        rolled
    }

    fn grant_xp(&mut self, skill: Skill, xp: u64) {
        let progress = self.character.skills.entry(skill).or_insert(SkillProgress {
            level: 1,
            xp: 0,
            max_xp: 150,
        });
        progress.xp = progress.xp.saturating_add(xp);
        while progress.max_xp > 0 && progress.xp >= progress.max_xp {
            progress.xp = progress.xp.saturating_sub(progress.max_xp);
            progress.level = progress.level.saturating_add(1);
            progress.max_xp = u64::from(progress.level).saturating_mul(150);
        }
    }

    fn advance_task(&mut self, task_type: TaskType, code: &str, units: u32) {
        if let Some(task) = self
            .character
            .task
            .as_mut()
            .filter(|t| t.task_type == task_type && t.code == code)
        {
            task.progress = task.progress.saturating_add(units).min(task.total);
        }
    }

    // -- actions ------------------------------------------------------------

    fn travel(&mut self, destination: Position) -> Result<ActionDetails, ApiError> {
        if destination == self.character.position {
            return Err(ApiError::status(
                codes::ALREADY_AT_DESTINATION,
                "already at destination",
            ));
        }
        if !self.catalog.tiles().iter().any(|t| t.position == destination) {
            return Err(ApiError::status(
                codes::NOT_FOUND,
                format!("map {destination} not found"),
            ));
        }
        self.character.position = destination;
        Ok(ActionDetails::None)
    }

    fn gather(&mut self) -> Result<ActionDetails, ApiError> {
        let code = self.content(ContentKind::Resource)?;
        let resource = self
            .catalog
            .resource(&code)
            .ok_or_else(|| ApiError::status(codes::NOT_FOUND, format!("resource {code} not found")))?;
        let skill = resource.skill.skill();
        if self.character.level(skill) < resource.level {
            return Err(ApiError::status(
                codes::LEVEL_TOO_LOW,
                format!("{skill} level too low for {code}"),
            ));
        }
        self.ensure_room()?;
        let items = self.roll(&resource.drops);
        self.give(&items)?;
        for q in &items {
            self.advance_task(TaskType::Items, &q.code, q.quantity);
        }
        let xp = xp_for(resource.level);
        self.grant_xp(skill, xp);
        Ok(ActionDetails::Skill(SkillResult { xp, items }))
    }

    fn craft(&mut self, order: &ItemQuantity) -> Result<ActionDetails, ApiError> {
        let item = self.item(&order.code)?;
        let recipe = item.recipe.as_ref().ok_or_else(|| {
            ApiError::status(codes::NOT_FOUND, format!("{} is not craftable", item.code))
        })?;
        let workshop = self.content(ContentKind::Workshop)?;
        if workshop != recipe.skill.as_str() {
            return Err(ApiError::status(
                codes::NOT_FOUND_ON_MAP,
                format!("{} needs the {} workshop", item.code, recipe.skill),
            ));
        }
        if self.character.level(recipe.skill) < recipe.level {
            return Err(ApiError::status(
                codes::LEVEL_TOO_LOW,
                format!("{} level too low for {}", recipe.skill, item.code),
            ));
        }
        for input in &recipe.items {
            let need = input.quantity.saturating_mul(order.quantity);
            if self.character.inventory_quantity(&input.code) < need {
                return Err(ApiError::status(
                    codes::MISSING_ITEM,
                    format!("missing {} for {}", input.code, item.code),
                ));
            }
        }
        let consumed = recipe
            .inventory_required()
            .saturating_mul(order.quantity);
        let produced = recipe.quantity.saturating_mul(order.quantity);
        if produced > self.character.inventory_free().saturating_add(consumed) {
            return Err(ApiError::status(codes::INVENTORY_FULL, "inventory is full"));
        }
        for input in &recipe.items {
            remove_units(
                &mut self.character.inventory,
                &input.code,
                input.quantity.saturating_mul(order.quantity),
            );
        }
        let items = vec![ItemQuantity::new(item.code.clone(), produced)];
        self.give(&items)?;
        self.advance_task(TaskType::Items, &item.code, produced);
        let xp = xp_for(recipe.level).saturating_mul(u64::from(order.quantity));
        self.grant_xp(recipe.skill, xp);
        Ok(ActionDetails::Skill(SkillResult { xp, items }))
    }

    fn fight(&mut self) -> Result<ActionDetails, ApiError> {
        let code = self.content(ContentKind::Monster)?;
        let monster = self
            .catalog
            .monster(&code)
            .ok_or_else(|| ApiError::status(codes::NOT_FOUND, format!("monster {code} not found")))?;
        self.ensure_room()?;

        let (outcome, turns) = match self.fight_policy {
            FightPolicy::AlwaysWin => (FightOutcome::Win, 1),
            FightPolicy::AlwaysLose => (FightOutcome::Lose, 1),
            FightPolicy::Simulate => self.simulate(monster),
        };

        if outcome == FightOutcome::Lose {
            self.character.position = Position::default();
            return Ok(ActionDetails::Fight(FightResult {
                outcome,
                turns,
                xp: 0,
                gold: 0,
                drops: Vec::new(),
            }));
        }

        let mut drops = self.roll(&monster.drops);
        let mut free = self.character.inventory_free();
        for q in &mut drops {
            q.quantity = q.quantity.min(free);
            free = free.saturating_sub(q.quantity);
        }
        drops.retain(|q| q.quantity > 0);
        self.give(&drops)?;
        let xp = xp_for(monster.level);
        let gold = u64::from(self.rng.random_range(0..=monster.level));
        self.grant_xp(Skill::Combat, xp);
        self.character.gold = self.character.gold.saturating_add(gold);
        self.advance_task(TaskType::Monsters, &monster.code, 1);
        Ok(ActionDetails::Fight(FightResult {
            outcome,
            turns,
            xp,
            gold,
            drops,
        }))
    }

    /// Resolve a fight from worn gear: the character strikes first.
    fn simulate(&self, monster: &Monster) -> (FightOutcome, u32) {
        let worn = self
            .character
            .equipment
            .values()
            .filter_map(|code| self.catalog.item(code))
            .filter_map(|item| item.stats.as_ref());
        let gear = StatsProfile::accumulate(worn);
        let level = i32::try_from(self.character.level(Skill::Combat)).unwrap_or(i32::MAX);
        let player_hp = BASE_HP
            .saturating_add(HP_PER_LEVEL.saturating_mul(level))
            .saturating_add(gear.hp);

        let to_kill_monster = turns(monster.stats.hp, gear.damage_against(&monster.stats));
        let to_kill_player = turns(player_hp, monster.stats.damage_against(&gear));
        if to_kill_monster <= to_kill_player && to_kill_monster != u32::MAX {
            (FightOutcome::Win, to_kill_monster)
        } else {
            (FightOutcome::Lose, to_kill_player.min(100))
        }
    }

    fn equip(&mut self, slot: Slot, code: &str) -> Result<ActionDetails, ApiError> {
        let item = self.item(code)?;
        if !item.slots().contains(&slot) {
            return Err(ApiError::status(
                codes::CONDITIONS_NOT_MET,
                format!("{code} does not fit {slot}"),
            ));
        }
        if item.level > self.character.level(Skill::Combat) {
            return Err(ApiError::status(
                codes::CONDITIONS_NOT_MET,
                format!("level too low to wear {code}"),
            ));
        }
        if self.character.worn(slot).is_some() {
            return Err(ApiError::status(
                codes::SLOT_CONFLICT,
                format!("{slot} slot is not empty"),
            ));
        }
        self.take(code, 1)?;
        self.character.equipment.insert(slot, code.to_owned());
        Ok(ActionDetails::None)
    }

    fn unequip(&mut self, slot: Slot) -> Result<ActionDetails, ApiError> {
        let code = self
            .character
            .worn(slot)
            .map(ToOwned::to_owned)
            .ok_or_else(|| ApiError::status(codes::SLOT_CONFLICT, format!("{slot} slot is empty")))?;
        self.give(&[ItemQuantity::new(code, 1)])?;
        self.character.equipment.remove(&slot);
        Ok(ActionDetails::None)
    }

    fn deposit(&mut self, q: &ItemQuantity) -> Result<ActionDetails, ApiError> {
        self.content(ContentKind::Bank)?;
        self.take(&q.code, q.quantity)?;
        add_units(self.bank, &q.code, q.quantity);
        Ok(ActionDetails::None)
    }

    fn withdraw(&mut self, q: &ItemQuantity) -> Result<ActionDetails, ApiError> {
        self.content(ContentKind::Bank)?;
        let stored = self.bank.get(&q.code).copied().unwrap_or(0);
        if stored == 0 {
            return Err(ApiError::status(
                codes::NOT_FOUND,
                format!("{} not found in bank", q.code),
            ));
        }
        if stored < q.quantity {
            return Err(ApiError::status(
                codes::MISSING_ITEM,
                format!("bank holds {stored} {}", q.code),
            ));
        }
        self.give(std::slice::from_ref(q))?;
        remove_units(self.bank, &q.code, q.quantity);
        Ok(ActionDetails::None)
    }

    fn accept_task(&mut self) -> Result<ActionDetails, ApiError> {
        let master = self.content(ContentKind::TasksMaster)?;
        if self.character.task.is_some() {
            return Err(ApiError::status(
                codes::TASK_ALREADY_ASSIGNED,
                "character already has a task",
            ));
        }
        let task_type = master.parse().unwrap_or(TaskType::Monsters);
        let combat = self.character.level(Skill::Combat);
        let choices: Vec<String> = match task_type {
            TaskType::Monsters => self
                .catalog
                .monsters()
                .filter(|m| m.level <= combat)
                .map(|m| m.code.clone())
                .collect(),
            TaskType::Items => self
                .catalog
                .resources()
                .filter(|r| r.level <= self.character.level(r.skill.skill()))
                .filter_map(|r| r.drops.first())
                .map(|d| d.code.clone())
                .collect(),
        };
        if choices.is_empty() {
            return Err(ApiError::status(codes::NOT_FOUND, "no task available"));
        }
        let index = self.rng.random_range(0..choices.len());
        let code = choices.get(index).cloned().unwrap_or_default();
        let total = self.rng.random_range(3..=8);
        self.character.task = Some(TaskProgress {
            code: code.clone(),
            task_type,
            progress: 0,
            total,
        });
        Ok(ActionDetails::Task(TaskAssignment {
            code,
            task_type,
            total,
        }))
    }

    fn complete_task(&mut self) -> Result<ActionDetails, ApiError> {
        self.content(ContentKind::TasksMaster)?;
        let task = self
            .character
            .task
            .as_ref()
            .ok_or_else(|| ApiError::status(codes::NO_TASK, "character has no task"))?;
        if !task.is_finished() {
            return Err(ApiError::status(
                codes::TASK_NOT_COMPLETED,
                "task is not completed",
            ));
        }
        let items = vec![ItemQuantity::new(TASKS_COIN, TASK_COMPLETION_COINS)];
        self.give(&items)?;
        self.character.task = None;
        Ok(ActionDetails::Reward(TaskReward { items, gold: 0 }))
    }

    fn exchange_task(&mut self) -> Result<ActionDetails, ApiError> {
        self.content(ContentKind::TasksMaster)?;
        self.take(TASKS_COIN, EXCHANGE_COST)?;
        let rewards: Vec<&Item> = self
            .catalog
            .items()
            .filter(|i| i.is_task_reward() && i.code != TASKS_COIN)
            .collect();
        let items = if rewards.is_empty() {
            Vec::new()
        } else {
            let index = self.rng.random_range(0..rewards.len());
            rewards
                .get(index)
                .map(|i| vec![ItemQuantity::new(i.code.clone(), 1)])
                .unwrap_or_default()
        };
        self.give(&items)?;
        Ok(ActionDetails::Reward(TaskReward { items, gold: 0 }))
    }

    fn cancel_task(&mut self) -> Result<ActionDetails, ApiError> {
        self.content(ContentKind::TasksMaster)?;
        if self.character.task.is_none() {
            return Err(ApiError::status(codes::NO_TASK, "character has no task"));
        }
        self.take(TASKS_COIN, CANCEL_COST)?;
        self.character.task = None;
        Ok(ActionDetails::None)
    }

    fn recycle(&mut self, order: &ItemQuantity) -> Result<ActionDetails, ApiError> {
        let item = self.item(&order.code)?;
        let recipe = item.recipe.as_ref().ok_or_else(|| {
            ApiError::status(codes::NOT_FOUND, format!("{} is not recyclable", item.code))
        })?;
        let workshop = self.content(ContentKind::Workshop)?;
        if workshop != recipe.skill.as_str() {
            return Err(ApiError::status(
                codes::NOT_FOUND_ON_MAP,
                format!("{} needs the {} workshop", item.code, recipe.skill),
            ));
        }
        self.take(&item.code, order.quantity)?;
        let items: Vec<ItemQuantity> = recipe
            .items
            .iter()
            .map(|input| {
                ItemQuantity::new(
                    input.code.clone(),
                    input.quantity.saturating_mul(order.quantity).div_ceil(2),
                )
            })
            .collect();
        self.give(&items)?;
        Ok(ActionDetails::Skill(SkillResult { xp: 0, items }))
    }
}

fn add_units(map: &mut BTreeMap<String, u32>, code: &str, quantity: u32) {
    let entry = map.entry(code.to_owned()).or_insert(0);
    *entry = entry.saturating_add(quantity);
}

fn remove_units(map: &mut BTreeMap<String, u32>, code: &str, quantity: u32) {
    let left = map.get(code).copied().unwrap_or(0).saturating_sub(quantity);
    if left == 0 {
        map.remove(code);
    } else {
        map.insert(code.to_owned(), left);
    }
}

fn xp_for(level: u32) -> u64 {
    u64::from(level.max(1)).saturating_mul(10)
}

/// Turns needed to deal `hp` at `damage` per turn; `u32::MAX` when the
/// damage is not positive.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "ceil of a positive ratio clamped below u32::MAX"
)]
fn turns(hp: i32, damage: f64) -> u32 {
    if damage <= 0.0 {
        return u32::MAX;
    }
    let ratio = (f64::from(hp.max(0)) / damage).ceil();
    ratio.min(f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use artifacts_catalog::CatalogSnapshot;
    use artifacts_types::{GatheringSkill, MapContent, MapTile, Recipe, Resource};

    use super::*;

    fn tile(x: i32, y: i32, kind: ContentKind, code: &str) -> MapTile {
        MapTile {
            name: code.to_owned(),
            position: Position::new(x, y),
            content: Some(MapContent {
                kind,
                code: code.to_owned(),
            }),
        }
    }

    fn server() -> SimulatedServer {
        let snapshot = CatalogSnapshot {
            items: vec![
                Item {
                    code: "ash_wood".to_owned(),
                    name: "Ash Wood".to_owned(),
                    level: 1,
                    item_type: "resource".to_owned(),
                    subtype: "woodcutting".to_owned(),
                    recipe: None,
                    stats: None,
                },
                Item {
                    code: "ash_plank".to_owned(),
                    name: "Ash Plank".to_owned(),
                    level: 1,
                    item_type: "resource".to_owned(),
                    subtype: "plank".to_owned(),
                    recipe: Some(Recipe {
                        skill: Skill::Woodcutting,
                        level: 1,
                        quantity: 1,
                        items: vec![ItemQuantity::new("ash_wood", 10)],
                    }),
                    stats: None,
                },
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
            maps: vec![
                MapTile {
                    name: "origin".to_owned(),
                    position: Position::new(0, 0),
                    content: None,
                },
                tile(1, 0, ContentKind::Resource, "ash_tree"),
                tile(2, 0, ContentKind::Bank, "bank"),
                tile(3, 0, ContentKind::Workshop, "woodcutting"),
            ],
        };
        let catalog = Catalog::from_snapshot(snapshot).unwrap_or_default();
        let server = SimulatedServer::new(Arc::new(catalog), &SimulatedConfig::default());
        server.add_character(CharacterSnapshot::new("ada"));
        server
    }

    #[test]
    fn actions_require_the_right_tile() {
        let server = server();
        let result = server.execute("ada", &Action::Gather);
        assert_eq!(result.err().and_then(|e| e.code()), Some(codes::NOT_FOUND_ON_MAP));

        let moved = server.execute(
            "ada",
            &Action::Move {
                position: Position::new(1, 0),
            },
        );
        assert!(moved.is_ok());
        let gathered = server.execute("ada", &Action::Gather);
        assert_eq!(
            gathered.ok().map(|r| r.character.inventory_quantity("ash_wood")),
            Some(1)
        );
        assert_eq!(server.action_log().len(), 3);
    }

    #[test]
    fn withdraw_reports_bank_races() {
        let server = server();
        server.set_bank(BTreeMap::from([("ash_wood".to_owned(), 3)]));
        let mut ada = CharacterSnapshot::new("ada");
        ada.position = Position::new(2, 0);
        server.add_character(ada);

        let short = server.execute("ada", &Action::Withdraw(ItemQuantity::new("ash_wood", 5)));
        assert_eq!(short.err().and_then(|e| e.code()), Some(codes::MISSING_ITEM));
        let gone = server.execute("ada", &Action::Withdraw(ItemQuantity::new("copper", 1)));
        assert_eq!(gone.err().and_then(|e| e.code()), Some(codes::NOT_FOUND));

        let ok = server.execute("ada", &Action::Withdraw(ItemQuantity::new("ash_wood", 3)));
        assert_eq!(ok.ok().and_then(|r| r.bank).map(|b| b.is_empty()), Some(true));
    }

    #[test]
    fn craft_consumes_inputs() {
        let server = server();
        let mut ada = CharacterSnapshot::new("ada");
        ada.position = Position::new(3, 0);
        ada.inventory.insert("ash_wood".to_owned(), 25);
        server.add_character(ada);

        let crafted = server.execute("ada", &Action::Craft(ItemQuantity::new("ash_plank", 2)));
        let character = crafted.ok().map(|r| r.character);
        assert_eq!(character.as_ref().map(|c| c.inventory_quantity("ash_wood")), Some(5));
        assert_eq!(character.map(|c| c.inventory_quantity("ash_plank")), Some(2));

        let short = server.execute("ada", &Action::Craft(ItemQuantity::new("ash_plank", 1)));
        assert_eq!(short.err().and_then(|e| e.code()), Some(codes::MISSING_ITEM));
    }

    #[test]
    fn cooldown_blocks_next_action() {
        let snapshot = server();
        let server = SimulatedServer {
            cooldown: Duration::from_secs(30),
            ..snapshot
        };
        let first = server.execute(
            "ada",
            &Action::Move {
                position: Position::new(1, 0),
            },
        );
        assert_eq!(first.ok().map(|r| r.character.cooldown_seconds), Some(30));
        let second = server.execute("ada", &Action::Gather);
        assert!(second.err().is_some_and(|e| e.is_transient()));
    }

    #[test]
    fn turns_round_up() {
        assert_eq!(turns(60, 25.0), 3);
        assert_eq!(turns(60, 0.0), u32::MAX);
    }
}
