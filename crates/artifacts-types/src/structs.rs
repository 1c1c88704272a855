//! Catalog records: items, recipes, monsters, resources and map tiles.
//!
//! These are loaded once at startup and never mutated afterwards. They are
//! shared by reference through the catalog repository.

use serde::{Deserialize, Serialize};

use crate::enums::{ContentKind, GatheringSkill, Skill, Slot};
use crate::stats::StatsProfile;

// ---------------------------------------------------------------------------
// Positions and quantities
// ---------------------------------------------------------------------------

/// A map coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Position {
    /// Create a position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another position.
    pub const fn distance(self, other: Self) -> u32 {
        self.x
            .abs_diff(other.x)
            .saturating_add(self.y.abs_diff(other.y))
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An item code with a quantity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemQuantity {
    /// Item code.
    pub code: String,
    /// Number of units.
    pub quantity: u32,
}

impl ItemQuantity {
    /// Create an item quantity.
    pub fn new(code: impl Into<String>, quantity: u32) -> Self {
        Self {
            code: code.into(),
            quantity,
        }
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// How an item is crafted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Crafting skill used.
    pub skill: Skill,
    /// Minimum skill level.
    pub level: u32,
    /// Units produced per craft.
    pub quantity: u32,
    /// Inputs consumed per craft, in catalog order.
    pub items: Vec<ItemQuantity>,
}

impl Recipe {
    /// Inventory slots one craft's inputs occupy.
    pub fn inventory_required(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |acc, i| acc.saturating_add(i.quantity))
    }

    /// Quantity of `code` consumed per craft.
    pub fn requires(&self, code: &str) -> u32 {
        self.items
            .iter()
            .find(|i| i.code == code)
            .map_or(0, |i| i.quantity)
    }
}

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Level requirement to equip.
    pub level: u32,
    /// Catalog type (weapon, ring, resource, ...).
    #[serde(rename = "type")]
    pub item_type: String,
    /// Catalog subtype (tool, task, mob, ...).
    #[serde(default)]
    pub subtype: String,
    /// Crafting recipe, if craftable.
    #[serde(default)]
    pub recipe: Option<Recipe>,
    /// Equipment profile, if the item has effects.
    #[serde(default)]
    pub stats: Option<StatsProfile>,
}

impl Item {
    /// Whether this item is a gathering tool.
    pub fn is_tool(&self) -> bool {
        self.subtype == "tool"
    }

    /// Whether this item is earned from tasks rather than gathered.
    pub fn is_task_reward(&self) -> bool {
        self.subtype == "task"
    }

    /// Slots this item can be worn in.
    pub fn slots(&self) -> &'static [Slot] {
        Slot::for_item_type(&self.item_type)
    }

    /// Whether the item can be worn at all.
    pub fn is_equipment(&self) -> bool {
        !self.slots().is_empty()
    }
}

impl core::fmt::Display for Item {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

// ---------------------------------------------------------------------------
// Monsters and resources
// ---------------------------------------------------------------------------

/// A loot-table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drop {
    /// Dropped item code.
    pub code: String,
    /// Drop odds, "1 in `rate`".
    pub rate: u32,
    /// Minimum units per drop.
    pub min_quantity: u32,
    /// Maximum units per drop.
    pub max_quantity: u32,
}

impl Drop {
    /// Expected units of the item per action.
    pub fn average_per_action(&self) -> f64 {
        if self.rate == 0 {
            return 0.0;
        }
        let average = f64::from(self.min_quantity.saturating_add(self.max_quantity)) / 2.0;
        average / f64::from(self.rate)
    }
}

/// A monster that can be fought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    /// Unique code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Monster level.
    pub level: u32,
    /// Combat profile.
    pub stats: StatsProfile,
    /// Loot table.
    #[serde(default)]
    pub drops: Vec<Drop>,
}

impl Monster {
    /// Loot entry for an item, if the monster drops it.
    pub fn drop_of(&self, code: &str) -> Option<&Drop> {
        self.drops.iter().find(|d| d.code == code)
    }
}

impl core::fmt::Display for Monster {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

/// A harvestable resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Unique code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Skill used to harvest it.
    pub skill: GatheringSkill,
    /// Minimum skill level.
    pub level: u32,
    /// Loot table.
    #[serde(default)]
    pub drops: Vec<Drop>,
}

impl Resource {
    /// Loot entry for an item, if the resource yields it.
    pub fn drop_of(&self, code: &str) -> Option<&Drop> {
        self.drops.iter().find(|d| d.code == code)
    }

    /// Profile the optimizer targets when picking a tool for this resource.
    pub fn target_profile(&self) -> StatsProfile {
        StatsProfile::resource_target(self.skill)
    }
}

impl core::fmt::Display for Resource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// What occupies a map tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapContent {
    /// Kind of content.
    pub kind: ContentKind,
    /// Content code (resource code, monster code, workshop skill, ...).
    pub code: String,
}

/// A map tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapTile {
    /// Tile name.
    pub name: String,
    /// Tile coordinate.
    pub position: Position,
    /// Tile content, if any.
    #[serde(default)]
    pub content: Option<MapContent>,
}

impl MapTile {
    /// Whether the tile hosts the given content.
    pub fn hosts(&self, kind: ContentKind, code: &str) -> bool {
        self.content
            .as_ref()
            .is_some_and(|c| c.kind == kind && c.code == code)
    }
}
