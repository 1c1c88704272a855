//! Best-owned-equipment search.
//!
//! Slots are resolved one at a time in [`Slot::ORDER`]. For the slot being
//! resolved every available candidate is tried, and each trial is scored by
//! a depth-first search over the slots still open. The winner is fixed and
//! never revisited. The weapon goes first so its attack elements can narrow
//! the pools of every later slot. The item a slot already wears stays
//! eligible there whatever its elements, so narrowing never strips a slot.
//!
//! A score is the pair of turn estimates at the leaf: fewer turns to kill
//! the target wins, then more turns to survive, then more haste. Anything
//! still tied keeps the earlier candidate in code order.

use std::collections::BTreeMap;

use artifacts_catalog::Catalog;
use artifacts_types::{Element, Slot, StatsProfile};
use tracing::debug;

use crate::candidates::{Candidate, OwnedGear, Pools, build_pools, weapon_elements};
use crate::set::{EquipmentSet, UNBOUNDED};

/// Character hit points before gear and levels.
pub const BASE_PLAYER_HP: i32 = 120;

/// Hit points gained per combat level.
pub const HP_PER_LEVEL: i32 = 5;

/// Pick the best gear the character owns against `target`.
pub fn best_owned_equipment(
    catalog: &Catalog,
    owned: &OwnedGear,
    target: &StatsProfile,
) -> EquipmentSet {
    let pools = build_pools(catalog, owned, target);
    let mut search = Search::new(&pools, &owned.worn, target, owned.combat_level);

    // Slots with nothing to choose keep what they wear.
    for (slot, code) in &owned.worn {
        if pools.contains_key(slot) {
            continue;
        }
        if let Some(profile) = catalog.item(code).and_then(|i| i.stats) {
            search.acc.add(&profile);
        }
    }

    let slots: Vec<Slot> = Slot::ORDER
        .into_iter()
        .filter(|s| pools.contains_key(s))
        .collect();

    let mut set = EquipmentSet::default();
    let mut elements: Vec<Element> = Vec::new();

    for (index, slot) in slots.iter().enumerate() {
        let rest = slots.get(index.saturating_add(1)..).unwrap_or(&[]);
        let available: Vec<&Candidate> = pools
            .get(slot)
            .into_iter()
            .flatten()
            .filter(|c| search.available(*slot, c, &elements))
            .collect();

        let chosen = match available.as_slice() {
            [] => None,
            [only] => Some(*only),
            many => {
                let mut best: Option<(&Candidate, Score)> = None;
                for &candidate in many {
                    let trial_elements = search.elements_after(*slot, candidate, &elements);
                    search.put(candidate);
                    let score = search.best_rest(rest, &trial_elements);
                    search.take(candidate);
                    if best.as_ref().is_none_or(|(_, b)| score.beats(b)) {
                        best = Some((candidate, score));
                    }
                }
                best.map(|(c, _)| c)
            }
        };

        if let Some(candidate) = chosen {
            elements = search.elements_after(*slot, candidate, &elements);
            search.put(candidate);
        }
        set.items.insert(*slot, chosen.map(|c| c.code.clone()));
    }

    let score = search.leaf();
    set.turns_to_kill_monster = score.turns_to_kill_monster;
    set.turns_to_kill_player = score.turns_to_kill_player;
    set.haste = score.haste;

    debug!(
        slots = set.items.len(),
        turns_to_kill_monster = set.turns_to_kill_monster,
        turns_to_kill_player = set.turns_to_kill_player,
        haste = set.haste,
        "Equipment optimized"
    );
    set
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Score {
    turns_to_kill_monster: u32,
    turns_to_kill_player: u32,
    haste: i32,
}

impl Score {
    /// Strictly better than `other`.
    const fn beats(&self, other: &Self) -> bool {
        if self.turns_to_kill_monster != other.turns_to_kill_monster {
            return self.turns_to_kill_monster < other.turns_to_kill_monster;
        }
        if self.turns_to_kill_player != other.turns_to_kill_player {
            return self.turns_to_kill_player > other.turns_to_kill_player;
        }
        self.haste > other.haste
    }
}

/// Turns needed to remove `hp` at `damage` per turn.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn turns_to_kill(hp: i32, damage: f64) -> u32 {
    if !damage.is_finite() || damage <= 0.0 {
        return UNBOUNDED;
    }
    let turns = (f64::from(hp.max(0)) / damage).ceil();
    if turns >= f64::from(UNBOUNDED) {
        UNBOUNDED
    } else {
        turns as u32
    }
}

// ---------------------------------------------------------------------------
// Search state
// ---------------------------------------------------------------------------

struct Search<'a> {
    pools: &'a Pools,
    worn: &'a BTreeMap<Slot, String>,
    target: &'a StatsProfile,
    /// Character hit points before gear.
    base_hp: i32,
    /// Stats of everything currently placed.
    acc: StatsProfile,
    /// Slots currently holding each item.
    in_use: BTreeMap<&'a str, u32>,
}

impl<'a> Search<'a> {
    fn new(
        pools: &'a Pools,
        worn: &'a BTreeMap<Slot, String>,
        target: &'a StatsProfile,
        level: u32,
    ) -> Self {
        let base_hp = i32::try_from(level)
            .unwrap_or(i32::MAX)
            .saturating_mul(HP_PER_LEVEL)
            .saturating_add(BASE_PLAYER_HP);
        Self {
            pools,
            worn,
            target,
            base_hp,
            acc: StatsProfile::default(),
            in_use: BTreeMap::new(),
        }
    }

    fn available(&self, slot: Slot, candidate: &Candidate, elements: &[Element]) -> bool {
        let used = self.in_use.get(candidate.code.as_str()).copied().unwrap_or(0);
        let worn_here = self.worn.get(&slot).is_some_and(|code| *code == candidate.code);
        used < candidate.owned
            && (self.target.is_resource || worn_here || candidate.fits_weapon(elements))
    }

    fn elements_after(&self, slot: Slot, candidate: &Candidate, current: &[Element]) -> Vec<Element> {
        if slot == Slot::Weapon && !self.target.is_resource {
            weapon_elements(&candidate.profile)
        } else {
            current.to_vec()
        }
    }

    fn put(&mut self, candidate: &'a Candidate) {
        self.acc.add(&candidate.profile);
        let used = self.in_use.entry(candidate.code.as_str()).or_insert(0);
        *used = used.saturating_add(1);
    }

    fn take(&mut self, candidate: &'a Candidate) {
        self.acc.remove(&candidate.profile);
        if let Some(used) = self.in_use.get_mut(candidate.code.as_str()) {
            *used = used.saturating_sub(1);
        }
    }

    fn leaf(&self) -> Score {
        let player_damage = self.acc.damage_against(self.target);
        let target_damage = self.target.damage_against(&self.acc);
        let player_hp = self.acc.hp.saturating_add(self.base_hp);
        Score {
            turns_to_kill_monster: turns_to_kill(self.target.hp, player_damage),
            turns_to_kill_player: turns_to_kill(player_hp, target_damage),
            haste: self.acc.haste,
        }
    }

    /// Best score reachable by filling `slots` on top of what is placed.
    fn best_rest(&mut self, slots: &[Slot], elements: &[Element]) -> Score {
        let Some((slot, rest)) = slots.split_first() else {
            return self.leaf();
        };
        let pools = self.pools;
        let mut best: Option<Score> = None;
        for candidate in pools.get(slot).into_iter().flatten() {
            if !self.available(*slot, candidate, elements) {
                continue;
            }
            let trial_elements = self.elements_after(*slot, candidate, elements);
            self.put(candidate);
            let score = self.best_rest(rest, &trial_elements);
            self.take(candidate);
            if best.as_ref().is_none_or(|b| score.beats(b)) {
                best = Some(score);
            }
        }
        match best {
            Some(score) => score,
            None => self.best_rest(rest, elements),
        }
    }
}

#[cfg(test)]
mod tests {
    use artifacts_catalog::CatalogSnapshot;
    use artifacts_types::{GatheringSkill, Item};

    use super::*;

    fn item(code: &str, item_type: &str, level: u32, stats: StatsProfile) -> Item {
        Item {
            code: code.to_owned(),
            name: code.to_owned(),
            level,
            item_type: item_type.to_owned(),
            subtype: if stats.is_tool { "tool".to_owned() } else { String::new() },
            recipe: None,
            stats: Some(stats),
        }
    }

    fn fire(attack: i32) -> StatsProfile {
        let mut p = StatsProfile::default();
        p.attack.fire = attack;
        p
    }

    fn hp(hp: i32, haste: i32) -> StatsProfile {
        StatsProfile {
            hp,
            haste,
            ..StatsProfile::default()
        }
    }

    fn monster() -> StatsProfile {
        let mut m = StatsProfile {
            hp: 100,
            ..StatsProfile::default()
        };
        m.attack.earth = 10;
        m
    }

    fn catalog(items: Vec<Item>) -> Catalog {
        Catalog::from_snapshot(CatalogSnapshot {
            items,
            ..CatalogSnapshot::default()
        })
        .unwrap_or_default()
    }

    fn owned(counts: &[(&str, u32)], level: u32) -> OwnedGear {
        OwnedGear {
            counts: counts.iter().map(|(c, q)| ((*c).to_owned(), *q)).collect(),
            worn: BTreeMap::new(),
            combat_level: level,
        }
    }

    #[test]
    fn sword_beats_dagger() {
        let catalog = catalog(vec![
            item("copper_dagger", "weapon", 1, fire(6)),
            item("iron_sword", "weapon", 5, fire(25)),
        ]);
        let set = best_owned_equipment(
            &catalog,
            &owned(&[("copper_dagger", 1), ("iron_sword", 1)], 5),
            &monster(),
        );
        assert_eq!(set.item(Slot::Weapon), Some("iron_sword"));
        assert_eq!(set.turns_to_kill_monster, 4);
        // (120 + 25) hp against 10 earth damage per turn
        assert_eq!(set.turns_to_kill_player, 15);
        assert!(set.can_win());
    }

    fn unarmed_target(hp: i32) -> StatsProfile {
        StatsProfile {
            hp,
            ..StatsProfile::default()
        }
    }

    #[test]
    fn fewer_turns_beat_more_haste() {
        let mut dagger = fire(8);
        dagger.haste = 5;
        let catalog = catalog(vec![
            item("copper_dagger", "weapon", 1, dagger),
            item("iron_sword", "weapon", 1, fire(10)),
        ]);
        let gear = owned(&[("copper_dagger", 1), ("iron_sword", 1)], 5);
        let set = best_owned_equipment(&catalog, &gear, &unarmed_target(50));

        // 50 hp: 10 per turn is 5 turns, 8 per turn is 7
        assert_eq!(set.item(Slot::Weapon), Some("iron_sword"));
        assert_eq!(set.turns_to_kill_monster, 5);
        assert_eq!(set.haste, 0);
        assert!(set.can_win());

        let dagger_only = best_owned_equipment(
            &catalog,
            &owned(&[("copper_dagger", 1)], 5),
            &unarmed_target(50),
        );
        assert_eq!(dagger_only.turns_to_kill_monster, 7);
    }

    #[test]
    fn haste_breaks_equal_turns() {
        let mut quick = fire(10);
        quick.haste = 3;
        let catalog = catalog(vec![
            item("a_sword", "weapon", 1, fire(10)),
            item("z_quick_sword", "weapon", 1, quick),
        ]);
        let set = best_owned_equipment(
            &catalog,
            &owned(&[("a_sword", 1), ("z_quick_sword", 1)], 5),
            &unarmed_target(50),
        );
        assert_eq!(set.item(Slot::Weapon), Some("z_quick_sword"));
        assert_eq!(set.turns_to_kill_monster, 5);
        assert_eq!(set.haste, 3);
    }

    #[test]
    fn worn_item_survives_weapon_narrowing() {
        let mut water = StatsProfile::default();
        water.attack.water = 50;
        let catalog = catalog(vec![
            item("fire_staff", "weapon", 1, fire(20)),
            item("water_amulet", "amulet", 1, water),
        ]);
        let mut gear = owned(&[("fire_staff", 1), ("water_amulet", 1)], 1);
        gear.worn.insert(Slot::Amulet, "water_amulet".to_owned());

        let set = best_owned_equipment(&catalog, &gear, &monster());
        assert_eq!(set.item(Slot::Amulet), Some("water_amulet"));
        assert!(set.changes_from(&gear.worn).iter().all(|c| c.slot != Slot::Amulet));
    }

    #[test]
    fn haste_breaks_ties_regardless_of_code_order() {
        for (fast, slow) in [("a_helmet", "b_helmet"), ("b_helmet", "a_helmet")] {
            let catalog = catalog(vec![
                item("sword", "weapon", 1, fire(10)),
                item(fast, "helmet", 1, hp(10, 5)),
                item(slow, "helmet", 1, hp(10, 0)),
            ]);
            let set = best_owned_equipment(
                &catalog,
                &owned(&[("sword", 1), (fast, 1), (slow, 1)], 1),
                &monster(),
            );
            assert_eq!(set.item(Slot::Helmet), Some(fast));
            assert_eq!(set.haste, 5);
        }
    }

    #[test]
    fn dominant_item_never_worsens_the_set() {
        let mut base_items = vec![
            item("sword", "weapon", 1, fire(10)),
            item("leather_armor", "body_armor", 1, hp(20, 0)),
        ];
        let base_owned = [("sword", 1), ("leather_armor", 1)];
        let before = best_owned_equipment(
            &catalog(base_items.clone()),
            &owned(&base_owned, 10),
            &monster(),
        );

        let mut plate = hp(80, 2);
        plate.resistance.earth = 20;
        base_items.push(item("plate_armor", "body_armor", 1, plate));
        let after = best_owned_equipment(
            &catalog(base_items),
            &owned(&[("sword", 1), ("leather_armor", 1), ("plate_armor", 1)], 10),
            &monster(),
        );

        assert_eq!(after.item(Slot::BodyArmor), Some("plate_armor"));
        assert!(after.turns_to_kill_monster <= before.turns_to_kill_monster);
        assert!(after.turns_to_kill_player >= before.turns_to_kill_player);
    }

    #[test]
    fn one_ring_fills_one_slot() {
        let catalog = catalog(vec![
            item("sword", "weapon", 1, fire(10)),
            item("copper_ring", "ring", 1, hp(15, 0)),
        ]);
        let single = best_owned_equipment(
            &catalog,
            &owned(&[("sword", 1), ("copper_ring", 1)], 1),
            &monster(),
        );
        let filled = [Slot::Ring1, Slot::Ring2]
            .into_iter()
            .filter(|s| single.item(*s).is_some())
            .count();
        assert_eq!(filled, 1);

        let pair = best_owned_equipment(
            &catalog,
            &owned(&[("sword", 1), ("copper_ring", 2)], 1),
            &monster(),
        );
        assert_eq!(pair.item(Slot::Ring1), Some("copper_ring"));
        assert_eq!(pair.item(Slot::Ring2), Some("copper_ring"));
    }

    #[test]
    fn weapon_element_narrows_other_slots() {
        let mut water = StatsProfile::default();
        water.attack.water = 50;
        let catalog = catalog(vec![
            item("fire_staff", "weapon", 1, fire(20)),
            item("fire_amulet", "amulet", 1, fire(5)),
            item("water_amulet", "amulet", 1, water),
        ]);
        let set = best_owned_equipment(
            &catalog,
            &owned(
                &[("fire_staff", 1), ("fire_amulet", 1), ("water_amulet", 1)],
                1,
            ),
            &monster(),
        );
        assert_eq!(set.item(Slot::Amulet), Some("fire_amulet"));
    }

    #[test]
    fn resource_target_picks_tool_and_keeps_armor() {
        let mut axe = StatsProfile {
            is_tool: true,
            ..StatsProfile::default()
        };
        axe.tool_attack.woodcutting = 10;
        let catalog = catalog(vec![
            item("copper_axe", "weapon", 1, axe),
            item("sword", "weapon", 1, fire(10)),
            item("leather_hat", "helmet", 1, hp(10, 0)),
        ]);
        let mut gear = owned(&[("copper_axe", 1), ("sword", 1), ("leather_hat", 1)], 1);
        gear.worn.insert(Slot::Helmet, "leather_hat".to_owned());

        let set = best_owned_equipment(
            &catalog,
            &gear,
            &StatsProfile::resource_target(GatheringSkill::Woodcutting),
        );
        assert_eq!(set.item(Slot::Weapon), Some("copper_axe"));
        assert!(!set.items.contains_key(&Slot::Helmet));
        assert!(set.changes_from(&gear.worn).iter().all(|c| c.slot == Slot::Weapon));
        // 20 hp against 10 * 2.28 * 1.128 damage
        assert_eq!(set.turns_to_kill_monster, 1);
        assert_eq!(set.turns_to_kill_player, UNBOUNDED);
    }

    #[test]
    fn no_damage_means_no_win() {
        let catalog = catalog(vec![item("leather_hat", "helmet", 1, hp(10, 0))]);
        let set = best_owned_equipment(
            &catalog,
            &owned(&[("leather_hat", 1)], 1),
            &monster(),
        );
        assert_eq!(set.turns_to_kill_monster, UNBOUNDED);
        assert!(!set.can_win());
    }

    #[test]
    fn turns_round_up() {
        assert_eq!(turns_to_kill(100, 47.5), 3);
        assert_eq!(turns_to_kill(100, 50.0), 2);
        assert_eq!(turns_to_kill(100, 0.0), UNBOUNDED);
        assert_eq!(turns_to_kill(100, -3.0), UNBOUNDED);
    }
}
