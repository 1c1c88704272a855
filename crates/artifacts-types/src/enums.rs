//! Enumeration types shared across the automation engine.
//!
//! Wire names follow the game API (`snake_case`), so every enum here
//! round-trips through the same strings the remote server uses.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// A string did not name a known variant of one of the enums below.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    /// Which enum was being parsed (e.g. "skill").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------------

/// A trainable character skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    /// Fighting monsters.
    Combat,
    /// Gathering ore from rocks.
    Mining,
    /// Gathering logs from trees.
    Woodcutting,
    /// Gathering fish from fishing spots.
    Fishing,
    /// Crafting weapons and tools.
    Weaponcrafting,
    /// Crafting armor pieces.
    Gearcrafting,
    /// Crafting rings and amulets.
    Jewelrycrafting,
    /// Cooking food.
    Cooking,
    /// Brewing potions.
    Alchemy,
}

impl Skill {
    /// Every skill, in a stable order.
    pub const ALL: [Self; 9] = [
        Self::Combat,
        Self::Mining,
        Self::Woodcutting,
        Self::Fishing,
        Self::Weaponcrafting,
        Self::Gearcrafting,
        Self::Jewelrycrafting,
        Self::Cooking,
        Self::Alchemy,
    ];

    /// Wire name of the skill.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Combat => "combat",
            Self::Mining => "mining",
            Self::Woodcutting => "woodcutting",
            Self::Fishing => "fishing",
            Self::Weaponcrafting => "weaponcrafting",
            Self::Gearcrafting => "gearcrafting",
            Self::Jewelrycrafting => "jewelrycrafting",
            Self::Cooking => "cooking",
            Self::Alchemy => "alchemy",
        }
    }

    /// The gathering skill this skill corresponds to, if it is one.
    pub const fn gathering(self) -> Option<GatheringSkill> {
        match self {
            Self::Mining => Some(GatheringSkill::Mining),
            Self::Woodcutting => Some(GatheringSkill::Woodcutting),
            Self::Fishing => Some(GatheringSkill::Fishing),
            _ => None,
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Skill {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|skill| skill.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("skill", s))
    }
}

/// The three skills that harvest resources and benefit from tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatheringSkill {
    /// Trees.
    Woodcutting,
    /// Rocks.
    Mining,
    /// Fishing spots.
    Fishing,
}

impl GatheringSkill {
    /// Every gathering skill.
    pub const ALL: [Self; 3] = [Self::Woodcutting, Self::Mining, Self::Fishing];

    /// The general skill this gathering skill trains.
    pub const fn skill(self) -> Skill {
        match self {
            Self::Woodcutting => Skill::Woodcutting,
            Self::Mining => Skill::Mining,
            Self::Fishing => Skill::Fishing,
        }
    }

    /// Wire name of the skill.
    pub const fn as_str(self) -> &'static str {
        self.skill().as_str()
    }
}

impl fmt::Display for GatheringSkill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatheringSkill {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|skill| skill.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("gathering skill", s))
    }
}

// ---------------------------------------------------------------------------
// Combat
// ---------------------------------------------------------------------------

/// An elemental damage channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    /// Fire.
    Fire,
    /// Water.
    Water,
    /// Earth.
    Earth,
    /// Air.
    Air,
}

impl Element {
    /// Every element.
    pub const ALL: [Self; 4] = [Self::Fire, Self::Water, Self::Earth, Self::Air];

    /// Wire name of the element.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fire => "fire",
            Self::Water => "water",
            Self::Earth => "earth",
            Self::Air => "air",
        }
    }
}

impl FromStr for Element {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|element| element.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("element", s))
    }
}

/// Result of a single fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FightOutcome {
    /// The character won.
    Win,
    /// The character lost and respawned.
    Lose,
}

// ---------------------------------------------------------------------------
// Equipment slots
// ---------------------------------------------------------------------------

/// An equipment slot the optimizer manages.
///
/// Declaration order is the order in which the optimizer resolves slots,
/// with the weapon first so its element can narrow the other pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// Main weapon or gathering tool.
    Weapon,
    /// Head armor.
    Helmet,
    /// Neck jewelry.
    Amulet,
    /// Chest armor.
    BodyArmor,
    /// Off-hand shield.
    Shield,
    /// First ring.
    Ring1,
    /// Second ring.
    Ring2,
    /// Leg armor.
    LegArmor,
    /// Footwear.
    Boots,
}

impl Slot {
    /// All managed slots in resolution order.
    pub const ORDER: [Self; 9] = [
        Self::Weapon,
        Self::Helmet,
        Self::Amulet,
        Self::BodyArmor,
        Self::Shield,
        Self::Ring1,
        Self::Ring2,
        Self::LegArmor,
        Self::Boots,
    ];

    /// Wire name of the slot.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weapon => "weapon",
            Self::Helmet => "helmet",
            Self::Amulet => "amulet",
            Self::BodyArmor => "body_armor",
            Self::Shield => "shield",
            Self::Ring1 => "ring1",
            Self::Ring2 => "ring2",
            Self::LegArmor => "leg_armor",
            Self::Boots => "boots",
        }
    }

    /// Slots an item of the given catalog type can occupy.
    ///
    /// Rings fit either ring slot. Non-equipment types (resources,
    /// consumables, currency) occupy none.
    pub fn for_item_type(item_type: &str) -> &'static [Self] {
        match item_type {
            "weapon" => &[Self::Weapon],
            "helmet" => &[Self::Helmet],
            "amulet" => &[Self::Amulet],
            "body_armor" => &[Self::BodyArmor],
            "shield" => &[Self::Shield],
            "ring" => &[Self::Ring1, Self::Ring2],
            "leg_armor" => &[Self::LegArmor],
            "boots" => &[Self::Boots],
            _ => &[],
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Slot {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ORDER
            .into_iter()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("slot", s))
    }
}

// ---------------------------------------------------------------------------
// Tasks and map content
// ---------------------------------------------------------------------------

/// Kind of bounty handed out by a tasks master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Kill a number of one monster.
    Monsters,
    /// Deliver a number of one item.
    Items,
}

impl TaskType {
    /// Wire name of the task type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monsters => "monsters",
            Self::Items => "items",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Monsters, Self::Items]
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("task type", s))
    }
}

/// What a map tile hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Account bank.
    Bank,
    /// Harvestable resource.
    Resource,
    /// Crafting workshop, coded by skill.
    Workshop,
    /// Monster spawn.
    Monster,
    /// Task giver, coded by task type.
    TasksMaster,
    /// Player market.
    GrandExchange,
}

impl ContentKind {
    /// Every content kind.
    pub const ALL: [Self; 6] = [
        Self::Bank,
        Self::Resource,
        Self::Workshop,
        Self::Monster,
        Self::TasksMaster,
        Self::GrandExchange,
    ];

    /// Wire name of the content kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::Resource => "resource",
            Self::Workshop => "workshop",
            Self::Monster => "monster",
            Self::TasksMaster => "tasks_master",
            Self::GrandExchange => "grand_exchange",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("content kind", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rings_fit_both_ring_slots() {
        assert_eq!(Slot::for_item_type("ring"), &[Slot::Ring1, Slot::Ring2]);
        assert!(Slot::for_item_type("resource").is_empty());
    }

    #[test]
    fn wire_names_round_trip() {
        for slot in Slot::ORDER {
            assert_eq!(slot.as_str().parse::<Slot>(), Ok(slot));
        }
        for skill in Skill::ALL {
            assert_eq!(skill.as_str().parse::<Skill>(), Ok(skill));
        }
        assert!("ring3".parse::<Slot>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&Slot::BodyArmor).unwrap_or_default();
        assert_eq!(json, "\"body_armor\"");
        let kind: Result<ContentKind, _> = serde_json::from_str("\"tasks_master\"");
        assert_eq!(kind.ok(), Some(ContentKind::TasksMaster));
    }

    #[test]
    fn gathering_skills_map_to_skills() {
        assert_eq!(GatheringSkill::Mining.skill(), Skill::Mining);
        assert_eq!(Skill::Fishing.gathering(), Some(GatheringSkill::Fishing));
        assert_eq!(Skill::Cooking.gathering(), None);
    }
}
