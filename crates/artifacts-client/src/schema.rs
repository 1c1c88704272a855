//! Wire shapes of the game API and their conversion into domain types.
//!
//! The API flattens a lot: skill levels are `{skill}_level` fields on the
//! character, worn items are `{slot}_slot` fields, monster stats are
//! `attack_{element}` fields. These structs mirror the JSON and the
//! `into_*` methods rebuild the nested domain model.

use std::collections::BTreeMap;

use artifacts_types::{
    ActionDetails, ActionResponse, CharacterSnapshot, ContentKind, Drop, Element, FightOutcome,
    FightResult, Item, ItemQuantity, MapContent, MapTile, Monster, Position, Recipe, Resource,
    Skill, SkillProgress, SkillResult, Slot, StatsProfile, TaskAssignment, TaskProgress,
    TaskReward, TaskType,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// `{"data": ...}` wrapper around every successful response.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    /// Payload.
    pub data: T,
}

/// One page of a paginated listing.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    /// Records on this page.
    pub data: Vec<T>,
    /// Total number of pages.
    #[serde(default)]
    pub pages: Option<u32>,
}

/// `{"error": {"code", "message"}}` body of a failed request.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    /// Error payload.
    pub error: ErrorBody,
}

/// Error payload.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    /// Game error code.
    pub code: u16,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Shared records
// ---------------------------------------------------------------------------

/// `{code, quantity}` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireQuantity {
    /// Item code.
    pub code: String,
    /// Units.
    pub quantity: u32,
}

impl From<WireQuantity> for ItemQuantity {
    fn from(w: WireQuantity) -> Self {
        Self::new(w.code, w.quantity)
    }
}

/// Loot-table entry.
#[derive(Debug, Deserialize)]
pub struct WireDrop {
    /// Item code.
    pub code: String,
    /// One in `rate`.
    pub rate: u32,
    /// Minimum units.
    pub min_quantity: u32,
    /// Maximum units.
    pub max_quantity: u32,
}

impl From<WireDrop> for Drop {
    fn from(w: WireDrop) -> Self {
        Self {
            code: w.code,
            rate: w.rate,
            min_quantity: w.min_quantity,
            max_quantity: w.max_quantity,
        }
    }
}

// ---------------------------------------------------------------------------
// Character
// ---------------------------------------------------------------------------

/// Inventory slot.
#[derive(Debug, Deserialize)]
pub struct WireInventorySlot {
    /// Item code, empty for a free slot.
    #[serde(default)]
    pub code: String,
    /// Units.
    #[serde(default)]
    pub quantity: u32,
}

/// Character as the API reports it.
#[derive(Debug, Deserialize)]
pub struct WireCharacter {
    /// Name.
    pub name: String,
    /// Combat level.
    pub level: u32,
    /// Combat experience.
    #[serde(default)]
    pub xp: u64,
    /// Combat experience for the next level.
    #[serde(default)]
    pub max_xp: u64,
    /// Gold.
    #[serde(default)]
    pub gold: u64,
    /// Hit points.
    #[serde(default)]
    pub hp: u32,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Last cooldown, in seconds.
    #[serde(default)]
    pub cooldown: u32,
    /// End of the cooldown.
    #[serde(default)]
    pub cooldown_expiration: Option<DateTime<Utc>>,
    /// Current task code, empty when none.
    #[serde(default)]
    pub task: String,
    /// Current task type.
    #[serde(default)]
    pub task_type: String,
    /// Task progress.
    #[serde(default)]
    pub task_progress: u32,
    /// Task total.
    #[serde(default)]
    pub task_total: u32,
    /// Inventory capacity.
    #[serde(default)]
    pub inventory_max_items: u32,
    /// Inventory slots.
    #[serde(default)]
    pub inventory: Vec<WireInventorySlot>,
    /// Every other field: per-skill levels and worn slots.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl WireCharacter {
    fn extra_u64(&self, key: &str) -> u64 {
        self.extra.get(key).and_then(Value::as_u64).unwrap_or(0)
    }

    /// Rebuild the domain snapshot.
    pub fn into_snapshot(self) -> CharacterSnapshot {
        let mut skills = BTreeMap::new();
        skills.insert(
            Skill::Combat,
            SkillProgress {
                level: self.level,
                xp: self.xp,
                max_xp: self.max_xp,
            },
        );
        for skill in Skill::ALL.into_iter().filter(|s| *s != Skill::Combat) {
            let name = skill.as_str();
            let level = u32::try_from(self.extra_u64(&format!("{name}_level"))).unwrap_or(u32::MAX);
            skills.insert(
                skill,
                SkillProgress {
                    level,
                    xp: self.extra_u64(&format!("{name}_xp")),
                    max_xp: self.extra_u64(&format!("{name}_max_xp")),
                },
            );
        }

        let equipment = Slot::ORDER
            .into_iter()
            .filter_map(|slot| {
                let code = self
                    .extra
                    .get(&format!("{}_slot", slot.as_str()))
                    .and_then(Value::as_str)
                    .filter(|c| !c.is_empty())?;
                Some((slot, code.to_owned()))
            })
            .collect();

        let mut inventory: BTreeMap<String, u32> = BTreeMap::new();
        for slot in &self.inventory {
            if slot.code.is_empty() || slot.quantity == 0 {
                continue;
            }
            let entry = inventory.entry(slot.code.clone()).or_insert(0);
            *entry = entry.saturating_add(slot.quantity);
        }

        let task = if self.task.is_empty() {
            None
        } else {
            self.task_type.parse::<TaskType>().ok().map(|task_type| TaskProgress {
                code: self.task.clone(),
                task_type,
                progress: self.task_progress,
                total: self.task_total,
            })
        };

        CharacterSnapshot {
            name: self.name,
            position: Position::new(self.x, self.y),
            hp: self.hp,
            gold: self.gold,
            skills,
            inventory,
            inventory_max_items: self.inventory_max_items,
            equipment,
            cooldown_seconds: self.cooldown,
            cooldown_expires: self.cooldown_expiration.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            task,
        }
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Item effect.
#[derive(Debug, Deserialize)]
pub struct WireEffect {
    /// Effect name (`attack_fire`, `hp`, `mining`, ...).
    #[serde(alias = "code")]
    pub name: String,
    /// Effect value.
    pub value: i32,
}

/// Crafting recipe.
#[derive(Debug, Deserialize)]
pub struct WireCraft {
    /// Crafting skill.
    pub skill: String,
    /// Minimum level.
    pub level: u32,
    /// Inputs.
    #[serde(default)]
    pub items: Vec<WireQuantity>,
    /// Units produced.
    #[serde(default = "default_craft_quantity")]
    pub quantity: u32,
}

const fn default_craft_quantity() -> u32 {
    1
}

/// Item as the API reports it.
#[derive(Debug, Deserialize)]
pub struct WireItem {
    /// Display name.
    pub name: String,
    /// Code.
    pub code: String,
    /// Level.
    pub level: u32,
    /// Type.
    #[serde(rename = "type")]
    pub item_type: String,
    /// Subtype.
    #[serde(default)]
    pub subtype: String,
    /// Effects.
    #[serde(default)]
    pub effects: Vec<WireEffect>,
    /// Recipe.
    #[serde(default)]
    pub craft: Option<WireCraft>,
}

impl WireItem {
    /// Rebuild the domain item.
    pub fn into_item(self) -> Result<Item, ApiError> {
        let recipe = self
            .craft
            .map(|craft| {
                let skill = craft
                    .skill
                    .parse::<Skill>()
                    .map_err(|e| ApiError::Decode(format!("item {}: {e}", self.code)))?;
                Ok::<_, ApiError>(Recipe {
                    skill,
                    level: craft.level,
                    quantity: craft.quantity,
                    items: craft.items.into_iter().map(ItemQuantity::from).collect(),
                })
            })
            .transpose()?;

        let is_tool = self.subtype == "tool";
        let wearable = !Slot::for_item_type(&self.item_type).is_empty();
        let stats = (wearable && !self.effects.is_empty()).then(|| {
            StatsProfile::from_effects(
                self.effects.iter().map(|e| (e.name.as_str(), e.value)),
                is_tool,
            )
        });

        Ok(Item {
            code: self.code,
            name: self.name,
            level: self.level,
            item_type: self.item_type,
            subtype: self.subtype,
            recipe,
            stats,
        })
    }
}

/// Monster as the API reports it.
#[derive(Debug, Deserialize)]
pub struct WireMonster {
    /// Display name.
    pub name: String,
    /// Code.
    pub code: String,
    /// Level.
    pub level: u32,
    /// Hit points.
    pub hp: i32,
    /// Flattened `attack_*` and `res_*` fields.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    /// Loot table.
    #[serde(default)]
    pub drops: Vec<WireDrop>,
}

impl WireMonster {
    /// Rebuild the domain monster.
    pub fn into_monster(self) -> Monster {
        let field = |key: String| {
            self.extra
                .get(&key)
                .and_then(Value::as_i64)
                .and_then(|v| i32::try_from(v).ok())
                .unwrap_or(0)
        };
        let mut stats = StatsProfile {
            hp: self.hp,
            ..StatsProfile::default()
        };
        for element in Element::ALL {
            *stats.attack.get_mut(element) = field(format!("attack_{}", element.as_str()));
            *stats.resistance.get_mut(element) = field(format!("res_{}", element.as_str()));
        }
        Monster {
            code: self.code,
            name: self.name,
            level: self.level,
            stats,
            drops: self.drops.into_iter().map(Drop::from).collect(),
        }
    }
}

/// Resource as the API reports it.
#[derive(Debug, Deserialize)]
pub struct WireResource {
    /// Display name.
    pub name: String,
    /// Code.
    pub code: String,
    /// Gathering skill.
    pub skill: String,
    /// Level.
    pub level: u32,
    /// Loot table.
    #[serde(default)]
    pub drops: Vec<WireDrop>,
}

impl WireResource {
    /// Rebuild the domain resource.
    pub fn into_resource(self) -> Result<Resource, ApiError> {
        let skill = self
            .skill
            .parse()
            .map_err(|e| ApiError::Decode(format!("resource {}: {e}", self.code)))?;
        Ok(Resource {
            code: self.code,
            name: self.name,
            skill,
            level: self.level,
            drops: self.drops.into_iter().map(Drop::from).collect(),
        })
    }
}

/// Tile content.
#[derive(Debug, Deserialize)]
pub struct WireContent {
    /// Content kind.
    #[serde(rename = "type")]
    pub kind: String,
    /// Content code.
    pub code: String,
}

/// Map tile as the API reports it.
#[derive(Debug, Deserialize)]
pub struct WireMapTile {
    /// Tile name.
    #[serde(default)]
    pub name: String,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Content.
    #[serde(default)]
    pub content: Option<WireContent>,
}

impl WireMapTile {
    /// Rebuild the domain tile. Unknown content kinds become empty tiles.
    pub fn into_tile(self) -> MapTile {
        let content = self.content.and_then(|c| {
            let kind = c.kind.parse::<ContentKind>().ok()?;
            Some(MapContent { kind, code: c.code })
        });
        MapTile {
            name: self.name,
            position: Position::new(self.x, self.y),
            content,
        }
    }
}

// ---------------------------------------------------------------------------
// Action responses
// ---------------------------------------------------------------------------

/// Gather, craft or recycle details.
#[derive(Debug, Deserialize)]
pub struct WireSkillInfo {
    /// Experience gained.
    #[serde(default)]
    pub xp: u64,
    /// Items received.
    #[serde(default)]
    pub items: Vec<WireQuantity>,
}

/// Fight details.
#[derive(Debug, Deserialize)]
pub struct WireFight {
    /// Experience gained.
    #[serde(default)]
    pub xp: u64,
    /// Gold looted.
    #[serde(default)]
    pub gold: u64,
    /// Items looted.
    #[serde(default)]
    pub drops: Vec<WireQuantity>,
    /// Turns fought.
    #[serde(default)]
    pub turns: u32,
    /// `win` or `loss`.
    pub result: String,
}

/// Newly accepted task.
#[derive(Debug, Deserialize)]
pub struct WireTask {
    /// Target code.
    pub code: String,
    /// Task type.
    #[serde(rename = "type")]
    pub task_type: String,
    /// Units required.
    pub total: u32,
}

/// Task reward.
#[derive(Debug, Deserialize)]
pub struct WireRewards {
    /// Items received.
    #[serde(default)]
    pub items: Vec<WireQuantity>,
    /// Gold received.
    #[serde(default)]
    pub gold: u64,
}

/// `data` of any action response.
#[derive(Debug, Deserialize)]
pub struct WireActionData {
    /// Character after the action.
    pub character: WireCharacter,
    /// Bank contents, on bank actions.
    #[serde(default)]
    pub bank: Option<Vec<WireQuantity>>,
    /// Skill details.
    #[serde(default)]
    pub details: Option<WireSkillInfo>,
    /// Fight details.
    #[serde(default)]
    pub fight: Option<WireFight>,
    /// Accepted task.
    #[serde(default)]
    pub task: Option<WireTask>,
    /// Task reward.
    #[serde(default, alias = "reward")]
    pub rewards: Option<WireRewards>,
}

impl WireActionData {
    /// Rebuild the domain response.
    pub fn into_response(self) -> Result<ActionResponse, ApiError> {
        let details = if let Some(fight) = self.fight {
            ActionDetails::Fight(FightResult {
                outcome: if fight.result == "win" {
                    FightOutcome::Win
                } else {
                    FightOutcome::Lose
                },
                turns: fight.turns,
                xp: fight.xp,
                gold: fight.gold,
                drops: fight.drops.into_iter().map(ItemQuantity::from).collect(),
            })
        } else if let Some(task) = self.task {
            let task_type = task
                .task_type
                .parse()
                .map_err(|e| ApiError::Decode(format!("task {}: {e}", task.code)))?;
            ActionDetails::Task(TaskAssignment {
                code: task.code,
                task_type,
                total: task.total,
            })
        } else if let Some(rewards) = self.rewards {
            ActionDetails::Reward(TaskReward {
                items: rewards.items.into_iter().map(ItemQuantity::from).collect(),
                gold: rewards.gold,
            })
        } else if let Some(info) = self.details {
            ActionDetails::Skill(SkillResult {
                xp: info.xp,
                items: info.items.into_iter().map(ItemQuantity::from).collect(),
            })
        } else {
            ActionDetails::None
        };

        let bank = self.bank.map(|items| {
            items
                .into_iter()
                .map(|q| (q.code, q.quantity))
                .collect::<BTreeMap<_, _>>()
        });

        Ok(ActionResponse {
            character: self.character.into_snapshot(),
            bank,
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character_json() -> Value {
        serde_json::json!({
            "name": "ada",
            "level": 7,
            "xp": 120,
            "max_xp": 900,
            "gold": 42,
            "hp": 150,
            "x": 2,
            "y": -1,
            "mining_level": 12,
            "mining_xp": 30,
            "mining_max_xp": 1500,
            "woodcutting_level": 3,
            "weapon_slot": "copper_dagger",
            "ring1_slot": "",
            "cooldown": 25,
            "cooldown_expiration": "2024-09-01T12:00:25Z",
            "task": "chicken",
            "task_type": "monsters",
            "task_progress": 4,
            "task_total": 10,
            "inventory_max_items": 100,
            "inventory": [
                {"slot": 1, "code": "copper_ore", "quantity": 5},
                {"slot": 2, "code": "", "quantity": 0},
                {"slot": 3, "code": "copper_ore", "quantity": 2}
            ]
        })
    }

    #[test]
    fn character_flattened_fields_are_rebuilt() {
        let snapshot = serde_json::from_value::<WireCharacter>(character_json())
            .map(WireCharacter::into_snapshot)
            .unwrap_or_else(|_| CharacterSnapshot::new("undecoded"));
        assert_eq!(snapshot.name, "ada");
        assert_eq!(snapshot.level(Skill::Combat), 7);
        assert_eq!(snapshot.level(Skill::Mining), 12);
        assert_eq!(snapshot.level(Skill::Woodcutting), 3);
        assert_eq!(snapshot.level(Skill::Cooking), 0);
        assert_eq!(snapshot.worn(Slot::Weapon), Some("copper_dagger"));
        assert_eq!(snapshot.worn(Slot::Ring1), None);
        assert_eq!(snapshot.inventory_quantity("copper_ore"), 7);
        assert_eq!(snapshot.position, Position::new(2, -1));
        assert_eq!(snapshot.task.map(|t| (t.progress, t.total)), Some((4, 10)));
    }

    #[test]
    fn item_effects_become_stats() {
        let json = serde_json::json!({
            "name": "Copper Axe",
            "code": "copper_axe",
            "level": 1,
            "type": "weapon",
            "subtype": "tool",
            "effects": [{"name": "woodcutting", "value": -10}, {"name": "attack_earth", "value": 4}],
            "craft": {"skill": "weaponcrafting", "level": 1, "items": [{"code": "copper", "quantity": 6}], "quantity": 1}
        });
        let item = serde_json::from_value::<WireItem>(json)
            .ok()
            .and_then(|w| w.into_item().ok());
        let stats = item.as_ref().and_then(|i| i.stats);
        assert_eq!(stats.map(|s| s.tool_attack.woodcutting), Some(10));
        assert_eq!(stats.map(|s| s.attack.earth), Some(4));
        assert_eq!(stats.map(|s| s.is_tool), Some(true));
        assert_eq!(
            item.and_then(|i| i.recipe).map(|r| r.skill),
            Some(Skill::Weaponcrafting)
        );
    }

    #[test]
    fn consumables_have_no_stats() {
        let json = serde_json::json!({
            "name": "Cooked Chicken", "code": "cooked_chicken", "level": 1,
            "type": "consumable", "effects": [{"name": "heal", "value": 75}]
        });
        let item = serde_json::from_value::<WireItem>(json)
            .ok()
            .and_then(|w| w.into_item().ok());
        assert_eq!(item.map(|i| i.stats.is_none()), Some(true));
    }

    #[test]
    fn monster_fields_become_profile() {
        let json = serde_json::json!({
            "name": "Chicken", "code": "chicken", "level": 1, "hp": 60,
            "attack_water": 4, "res_fire": 0, "res_air": 5,
            "drops": [{"code": "feather", "rate": 8, "min_quantity": 1, "max_quantity": 1}]
        });
        let monster = serde_json::from_value::<WireMonster>(json).ok().map(WireMonster::into_monster);
        assert_eq!(monster.as_ref().map(|m| m.stats.attack.water), Some(4));
        assert_eq!(monster.as_ref().map(|m| m.stats.resistance.air), Some(5));
        assert_eq!(monster.map(|m| m.drops.len()), Some(1));
    }

    #[test]
    fn fight_response_decodes() {
        let json = serde_json::json!({
            "cooldown": {"total_seconds": 20},
            "fight": {"xp": 12, "gold": 3, "drops": [{"code": "feather", "quantity": 1}], "turns": 5, "result": "loss"},
            "character": character_json()
        });
        let response = serde_json::from_value::<WireActionData>(json)
            .ok()
            .and_then(|d| d.into_response().ok());
        let outcome = response.and_then(|r| match r.details {
            ActionDetails::Fight(f) => Some(f.outcome),
            _ => None,
        });
        assert_eq!(outcome, Some(FightOutcome::Lose));
    }

    #[test]
    fn unknown_tile_content_is_dropped() {
        let json = serde_json::json!({"name": "x", "x": 1, "y": 1, "content": {"type": "portal", "code": "p"}});
        let tile = serde_json::from_value::<WireMapTile>(json).ok().map(WireMapTile::into_tile);
        assert_eq!(tile.map(|t| t.content.is_none()), Some(true));
    }
}
