//! Elemental stat profiles and the expected-damage model.
//!
//! A [`StatsProfile`] describes what a monster, a resource, a single item,
//! or a whole set of worn items contributes to a fight: attack, resistance
//! and bonus damage per element, tool power per gathering skill, hit
//! points, haste and restore.
//!
//! # Damage
//!
//! For each element where the attacker's attack is positive:
//!
//! ```text
//! attack * (1 + bonus/100) * (1 - res/100) * (1 - res/1000)
//! ```
//!
//! Against a resource the tool channels (woodcutting, mining, fishing)
//! count as well, but only where the attacker's tool attack is positive
//! and the resource's matching resistance is negative.
//!
//! # Accumulation
//!
//! [`StatsProfile::add`] and [`StatsProfile::remove`] are field-wise and
//! use wrapping integer arithmetic, so `add(x)` followed by `remove(x)`
//! always restores the previous value exactly. The equipment optimizer
//! relies on this to mutate one accumulator in place.

use serde::{Deserialize, Serialize};

use crate::enums::{Element, GatheringSkill};

/// Hit points of the synthetic resource target used when picking tools.
pub const RESOURCE_TARGET_HP: i32 = 20;

/// Tool resistance of the synthetic resource target. Any positive tool
/// attack for the matching skill beats it.
pub const RESOURCE_TARGET_RESISTANCE: i32 = -128;

// ---------------------------------------------------------------------------
// Channel groups
// ---------------------------------------------------------------------------

/// One integer value per element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementValues {
    /// Fire channel.
    pub fire: i32,
    /// Water channel.
    pub water: i32,
    /// Earth channel.
    pub earth: i32,
    /// Air channel.
    pub air: i32,
}

impl ElementValues {
    /// Value of one element.
    pub const fn get(&self, element: Element) -> i32 {
        match element {
            Element::Fire => self.fire,
            Element::Water => self.water,
            Element::Earth => self.earth,
            Element::Air => self.air,
        }
    }

    /// Mutable access to one element.
    pub const fn get_mut(&mut self, element: Element) -> &mut i32 {
        match element {
            Element::Fire => &mut self.fire,
            Element::Water => &mut self.water,
            Element::Earth => &mut self.earth,
            Element::Air => &mut self.air,
        }
    }

    /// Elements with a strictly positive value.
    pub fn positive(&self) -> impl Iterator<Item = Element> + '_ {
        Element::ALL.into_iter().filter(|e| self.get(*e) > 0)
    }

    const fn wrapping_add(self, other: Self) -> Self {
        Self {
            fire: self.fire.wrapping_add(other.fire),
            water: self.water.wrapping_add(other.water),
            earth: self.earth.wrapping_add(other.earth),
            air: self.air.wrapping_add(other.air),
        }
    }

    const fn wrapping_sub(self, other: Self) -> Self {
        Self {
            fire: self.fire.wrapping_sub(other.fire),
            water: self.water.wrapping_sub(other.water),
            earth: self.earth.wrapping_sub(other.earth),
            air: self.air.wrapping_sub(other.air),
        }
    }
}

/// One integer value per gathering skill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GatheringValues {
    /// Woodcutting channel.
    pub woodcutting: i32,
    /// Mining channel.
    pub mining: i32,
    /// Fishing channel.
    pub fishing: i32,
}

impl GatheringValues {
    /// Value of one gathering skill.
    pub const fn get(&self, skill: GatheringSkill) -> i32 {
        match skill {
            GatheringSkill::Woodcutting => self.woodcutting,
            GatheringSkill::Mining => self.mining,
            GatheringSkill::Fishing => self.fishing,
        }
    }

    /// Mutable access to one gathering skill.
    pub const fn get_mut(&mut self, skill: GatheringSkill) -> &mut i32 {
        match skill {
            GatheringSkill::Woodcutting => &mut self.woodcutting,
            GatheringSkill::Mining => &mut self.mining,
            GatheringSkill::Fishing => &mut self.fishing,
        }
    }

    const fn wrapping_add(self, other: Self) -> Self {
        Self {
            woodcutting: self.woodcutting.wrapping_add(other.woodcutting),
            mining: self.mining.wrapping_add(other.mining),
            fishing: self.fishing.wrapping_add(other.fishing),
        }
    }

    const fn wrapping_sub(self, other: Self) -> Self {
        Self {
            woodcutting: self.woodcutting.wrapping_sub(other.woodcutting),
            mining: self.mining.wrapping_sub(other.mining),
            fishing: self.fishing.wrapping_sub(other.fishing),
        }
    }
}

// ---------------------------------------------------------------------------
// StatsProfile
// ---------------------------------------------------------------------------

/// Additive combat and gathering profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatsProfile {
    /// Elemental attack.
    pub attack: ElementValues,
    /// Elemental resistance, in percent.
    pub resistance: ElementValues,
    /// Elemental bonus damage, in percent.
    pub damage: ElementValues,
    /// Tool power per gathering skill.
    pub tool_attack: GatheringValues,
    /// Resistance per gathering skill. Negative on resources that a tool
    /// of that skill can work.
    pub tool_resistance: GatheringValues,
    /// Hit points.
    pub hp: i32,
    /// Haste.
    pub haste: i32,
    /// Hit points restored (consumables).
    pub restore: i32,
    /// The profile belongs to a gathering tool.
    pub is_tool: bool,
    /// The profile describes a resource rather than a monster.
    pub is_resource: bool,
}

impl StatsProfile {
    /// Synthetic target used to pick the best tool for a gathering skill.
    pub fn resource_target(skill: GatheringSkill) -> Self {
        let mut profile = Self {
            hp: RESOURCE_TARGET_HP,
            is_resource: true,
            ..Self::default()
        };
        *profile.tool_resistance.get_mut(skill) = RESOURCE_TARGET_RESISTANCE;
        profile
    }

    /// Build an item profile from the catalog's `(effect name, value)`
    /// list.
    ///
    /// Tool effects are cooldown reductions stored as negative values;
    /// they become positive tool attack. Effects without a combat meaning
    /// (wisdom, prospecting, inventory space, ...) are ignored.
    pub fn from_effects<'a, I>(effects: I, is_tool: bool) -> Self
    where
        I: IntoIterator<Item = (&'a str, i32)>,
    {
        let mut profile = Self {
            is_tool,
            ..Self::default()
        };
        for (name, value) in effects {
            profile.apply_effect(name, value);
        }
        profile
    }

    fn apply_effect(&mut self, name: &str, value: i32) {
        if let Ok(skill) = name.parse::<GatheringSkill>() {
            *self.tool_attack.get_mut(skill) = value.wrapping_neg();
            return;
        }
        match name {
            "hp" => self.hp = value,
            "haste" => self.haste = value,
            "restore" => self.restore = value,
            _ => {
                let channel = if let Some(element) = name.strip_prefix("attack_") {
                    element.parse().ok().map(|e| self.attack.get_mut(e))
                } else if let Some(element) = name.strip_prefix("dmg_") {
                    element.parse().ok().map(|e| self.damage.get_mut(e))
                } else if let Some(element) = name.strip_prefix("res_") {
                    element.parse().ok().map(|e| self.resistance.get_mut(e))
                } else {
                    None
                };
                if let Some(slot) = channel {
                    *slot = value;
                }
            }
        }
    }

    /// Add another profile's numeric channels to this one.
    pub const fn add(&mut self, other: &Self) {
        self.attack = self.attack.wrapping_add(other.attack);
        self.resistance = self.resistance.wrapping_add(other.resistance);
        self.damage = self.damage.wrapping_add(other.damage);
        self.tool_attack = self.tool_attack.wrapping_add(other.tool_attack);
        self.tool_resistance = self.tool_resistance.wrapping_add(other.tool_resistance);
        self.hp = self.hp.wrapping_add(other.hp);
        self.haste = self.haste.wrapping_add(other.haste);
        self.restore = self.restore.wrapping_add(other.restore);
    }

    /// Subtract another profile's numeric channels. Exact inverse of
    /// [`add`](Self::add).
    pub const fn remove(&mut self, other: &Self) {
        self.attack = self.attack.wrapping_sub(other.attack);
        self.resistance = self.resistance.wrapping_sub(other.resistance);
        self.damage = self.damage.wrapping_sub(other.damage);
        self.tool_attack = self.tool_attack.wrapping_sub(other.tool_attack);
        self.tool_resistance = self.tool_resistance.wrapping_sub(other.tool_resistance);
        self.hp = self.hp.wrapping_sub(other.hp);
        self.haste = self.haste.wrapping_sub(other.haste);
        self.restore = self.restore.wrapping_sub(other.restore);
    }

    /// Sum of several profiles.
    pub fn accumulate<'a, I>(profiles: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        profiles.into_iter().fold(Self::default(), |mut acc, p| {
            acc.add(p);
            acc
        })
    }

    /// Expected damage per turn this profile deals to `defender`.
    pub fn damage_against(&self, defender: &Self) -> f64 {
        let elemental: f64 = Element::ALL
            .into_iter()
            .filter(|e| self.attack.get(*e) > 0)
            .map(|e| {
                channel_damage(
                    self.attack.get(e),
                    self.damage.get(e),
                    defender.resistance.get(e),
                )
            })
            .sum();

        if !defender.is_resource {
            return elemental;
        }

        let tools: f64 = GatheringSkill::ALL
            .into_iter()
            .filter(|s| self.tool_attack.get(*s) > 0 && defender.tool_resistance.get(*s) < 0)
            .map(|s| channel_damage(self.tool_attack.get(s), 0, defender.tool_resistance.get(s)))
            .sum();

        elemental + tools
    }

    /// Elements this profile attacks or boosts damage in.
    pub fn offensive_elements(&self) -> impl Iterator<Item = Element> + '_ {
        Element::ALL
            .into_iter()
            .filter(|e| self.attack.get(*e) > 0 || self.damage.get(*e) > 0)
    }
}

/// Damage of one channel.
fn channel_damage(attack: i32, bonus: i32, resistance: i32) -> f64 {
    let attack = f64::from(attack);
    let bonus = f64::from(bonus);
    let resistance = f64::from(resistance);
    attack * (1.0 + bonus / 100.0) * (1.0 - resistance / 100.0) * (1.0 - resistance / 1000.0)
}
