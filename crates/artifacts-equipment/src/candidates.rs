//! Candidate pools: which owned items may go into which slot.

use std::collections::BTreeMap;

use artifacts_catalog::Catalog;
use artifacts_types::{CharacterSnapshot, Element, Skill, Slot, StatsProfile};

/// Items more than this many levels below a slot's best candidate are
/// dropped from the slot's pool.
pub const LEVEL_WINDOW: u32 = 5;

/// Everything a character owns that could be worn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedGear {
    /// Units owned per item code, across bank, inventory and worn slots.
    pub counts: BTreeMap<String, u32>,
    /// Items currently worn.
    pub worn: BTreeMap<Slot, String>,
    /// Combat level, caps the level of usable items.
    pub combat_level: u32,
}

impl OwnedGear {
    /// Gear owned by a character given the current bank contents.
    pub fn new(character: &CharacterSnapshot, bank: &BTreeMap<String, u32>) -> Self {
        let mut counts: BTreeMap<String, u32> = BTreeMap::new();
        let sources = bank
            .iter()
            .chain(character.inventory.iter())
            .map(|(code, qty)| (code.as_str(), *qty))
            .chain(character.equipment.values().map(|code| (code.as_str(), 1)));
        for (code, qty) in sources {
            if qty == 0 {
                continue;
            }
            let entry = counts.entry(code.to_owned()).or_insert(0);
            *entry = entry.saturating_add(qty);
        }
        Self {
            counts,
            worn: character.equipment.clone(),
            combat_level: character.level(Skill::Combat),
        }
    }

    /// Units owned of an item.
    pub fn count(&self, code: &str) -> u32 {
        self.counts.get(code).copied().unwrap_or(0)
    }
}

/// One item considered for a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Item code.
    pub code: String,
    /// Item level.
    pub level: u32,
    /// Item stats.
    pub profile: StatsProfile,
    /// Units owned.
    pub owned: u32,
}

impl Candidate {
    /// Whether the item may be worn next to a weapon attacking in
    /// `weapon_elements`. Items without offensive elements always fit.
    pub fn fits_weapon(&self, weapon_elements: &[Element]) -> bool {
        if weapon_elements.is_empty() {
            return true;
        }
        let mut offensive = self.profile.offensive_elements().peekable();
        if offensive.peek().is_none() {
            return true;
        }
        offensive.any(|e| weapon_elements.contains(&e))
    }
}

/// Candidate pools per slot, each sorted by code.
pub type Pools = BTreeMap<Slot, Vec<Candidate>>;

/// Build the pools for a target.
///
/// Only items with stats, a wearable type, a level within reach and the
/// right tool-ness for the target are considered. Rings feed both ring
/// slots.
pub fn build_pools(catalog: &Catalog, owned: &OwnedGear, target: &StatsProfile) -> Pools {
    let mut pools: Pools = BTreeMap::new();
    for (code, count) in &owned.counts {
        let Some(item) = catalog.item(code) else {
            continue;
        };
        let Some(profile) = item.stats else { continue };
        if item.level > owned.combat_level || item.is_tool() != target.is_resource {
            continue;
        }
        for slot in item.slots() {
            pools.entry(*slot).or_default().push(Candidate {
                code: code.clone(),
                level: item.level,
                profile,
                owned: *count,
            });
        }
    }

    for pool in pools.values_mut() {
        let highest = pool.iter().map(|c| c.level).max().unwrap_or(0);
        pool.retain(|c| c.level.saturating_add(LEVEL_WINDOW) >= highest);
        pool.sort_by(|a, b| a.code.cmp(&b.code));
    }
    pools.retain(|_, pool| !pool.is_empty());
    pools
}

/// Elements a weapon attacks with.
pub fn weapon_elements(profile: &StatsProfile) -> Vec<Element> {
    Element::ALL
        .into_iter()
        .filter(|e| profile.attack.get(*e) > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use artifacts_catalog::CatalogSnapshot;
    use artifacts_types::Item;

    use super::*;

    fn gear(code: &str, item_type: &str, subtype: &str, level: u32, fire: i32) -> Item {
        let mut stats = StatsProfile {
            is_tool: subtype == "tool",
            ..StatsProfile::default()
        };
        stats.attack.fire = fire;
        Item {
            code: code.to_owned(),
            name: code.to_owned(),
            level,
            item_type: item_type.to_owned(),
            subtype: subtype.to_owned(),
            recipe: None,
            stats: Some(stats),
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_snapshot(CatalogSnapshot {
            items: vec![
                gear("old_sword", "weapon", "", 1, 5),
                gear("iron_sword", "weapon", "", 10, 20),
                gear("steel_sword", "weapon", "", 20, 40),
                gear("copper_axe", "weapon", "tool", 1, 0),
                gear("copper_ring", "ring", "", 1, 0),
            ],
            ..CatalogSnapshot::default()
        })
        .unwrap_or_default()
    }

    fn owned(codes: &[&str], level: u32) -> OwnedGear {
        OwnedGear {
            counts: codes.iter().map(|c| ((*c).to_owned(), 1)).collect(),
            worn: BTreeMap::new(),
            combat_level: level,
        }
    }

    #[test]
    fn prunes_items_far_below_the_best() {
        let pools = build_pools(
            &catalog(),
            &owned(&["old_sword", "iron_sword"], 10),
            &StatsProfile::default(),
        );
        let weapons: Vec<&str> = pools
            .get(&Slot::Weapon)
            .map(|p| p.iter().map(|c| c.code.as_str()).collect())
            .unwrap_or_default();
        assert_eq!(weapons, vec!["iron_sword"]);
    }

    #[test]
    fn excludes_items_above_combat_level() {
        let pools = build_pools(
            &catalog(),
            &owned(&["iron_sword", "steel_sword"], 15),
            &StatsProfile::default(),
        );
        assert_eq!(pools.get(&Slot::Weapon).map(Vec::len), Some(1));
    }

    #[test]
    fn tools_only_against_resources() {
        let owned = owned(&["copper_axe", "iron_sword"], 10);
        let monster = build_pools(&catalog(), &owned, &StatsProfile::default());
        let resource = build_pools(
            &catalog(),
            &owned,
            &StatsProfile::resource_target(artifacts_types::GatheringSkill::Woodcutting),
        );
        assert_eq!(
            monster.get(&Slot::Weapon).and_then(|p| p.first()).map(|c| c.code.as_str()),
            Some("iron_sword")
        );
        assert_eq!(
            resource.get(&Slot::Weapon).and_then(|p| p.first()).map(|c| c.code.as_str()),
            Some("copper_axe")
        );
    }

    #[test]
    fn rings_feed_both_ring_slots() {
        let pools = build_pools(&catalog(), &owned(&["copper_ring"], 1), &StatsProfile::default());
        assert!(pools.contains_key(&Slot::Ring1));
        assert!(pools.contains_key(&Slot::Ring2));
    }

    #[test]
    fn owned_counts_merge_all_sources() {
        let mut character = CharacterSnapshot::new("ada");
        character.inventory.insert("copper_ring".to_owned(), 1);
        character.equipment.insert(Slot::Ring1, "copper_ring".to_owned());
        let bank: BTreeMap<String, u32> = [("copper_ring".to_owned(), 2)].into_iter().collect();
        let owned = OwnedGear::new(&character, &bank);
        assert_eq!(owned.count("copper_ring"), 4);
        assert_eq!(owned.combat_level, 1);
    }

    #[test]
    fn weapon_filter_keeps_neutral_items() {
        let mut neutral = StatsProfile::default();
        neutral.hp = 30;
        let mut water = StatsProfile::default();
        water.damage.water = 10;
        let mut fire = StatsProfile::default();
        fire.attack.fire = 4;
        let candidate = |profile| Candidate {
            code: "x".to_owned(),
            level: 1,
            profile,
            owned: 1,
        };
        let elements = [Element::Fire];
        assert!(candidate(neutral).fits_weapon(&elements));
        assert!(!candidate(water).fits_weapon(&elements));
        assert!(candidate(fire).fits_weapon(&elements));
        assert!(candidate(water).fits_weapon(&[]));
    }
}
