//! The catalog repository.
//!
//! [`Catalog`] holds every item, monster, resource and map tile, plus the
//! reverse indices the task combinators need: which resources and monsters
//! drop an item, and where each kind of content sits on the map. It is
//! built once, wrapped in an `Arc`, and only read afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use artifacts_types::{ContentKind, Item, MapTile, Monster, Position, Resource, Skill, TaskType};
use tracing::{info, warn};

use crate::error::CatalogError;
use crate::snapshot::CatalogSnapshot;

/// Read-only game catalog with lookup indices.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Items by code.
    items: BTreeMap<String, Item>,
    /// Monsters by code.
    monsters: BTreeMap<String, Monster>,
    /// Resources by code.
    resources: BTreeMap<String, Resource>,
    /// Map tiles in load order.
    tiles: Vec<MapTile>,
    /// Tile positions by content kind and code.
    locations: BTreeMap<(ContentKind, String), Vec<Position>>,
    /// Resource codes dropping an item, lowest level first.
    resources_by_drop: BTreeMap<String, Vec<String>>,
    /// Monster codes dropping an item, lowest level first.
    monsters_by_drop: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    /// Build the catalog and its indices from raw collections.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Duplicate`] when a code repeats and
    /// [`CatalogError::DanglingReference`] when a recipe consumes an item
    /// that does not exist.
    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();

        for item in snapshot.items {
            let code = item.code.clone();
            if catalog.items.insert(code.clone(), item).is_some() {
                return Err(CatalogError::Duplicate { kind: "item", code });
            }
        }
        for monster in snapshot.monsters {
            let code = monster.code.clone();
            if catalog.monsters.insert(code.clone(), monster).is_some() {
                return Err(CatalogError::Duplicate {
                    kind: "monster",
                    code,
                });
            }
        }
        for resource in snapshot.resources {
            let code = resource.code.clone();
            if catalog.resources.insert(code.clone(), resource).is_some() {
                return Err(CatalogError::Duplicate {
                    kind: "resource",
                    code,
                });
            }
        }

        catalog.check_recipes()?;
        catalog.index_drops();

        for tile in &snapshot.maps {
            if let Some(content) = &tile.content {
                catalog
                    .locations
                    .entry((content.kind, content.code.clone()))
                    .or_default()
                    .push(tile.position);
            }
        }
        catalog.tiles = snapshot.maps;

        info!(
            items = catalog.items.len(),
            monsters = catalog.monsters.len(),
            resources = catalog.resources.len(),
            tiles = catalog.tiles.len(),
            "Catalog built"
        );
        Ok(catalog)
    }

    /// Load and index a JSON snapshot file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        Self::from_snapshot(CatalogSnapshot::read(path)?)
    }

    /// Copy the raw collections back out, for saving.
    pub fn to_snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            items: self.items.values().cloned().collect(),
            monsters: self.monsters.values().cloned().collect(),
            resources: self.resources.values().cloned().collect(),
            maps: self.tiles.clone(),
        }
    }

    fn check_recipes(&self) -> Result<(), CatalogError> {
        for item in self.items.values() {
            let Some(recipe) = &item.recipe else { continue };
            if let Some(missing) = recipe
                .items
                .iter()
                .find(|input| !self.items.contains_key(&input.code))
            {
                return Err(CatalogError::DanglingReference {
                    owner: item.code.clone(),
                    item: missing.code.clone(),
                });
            }
        }
        Ok(())
    }

    fn index_drops(&mut self) {
        let mut resources: Vec<&Resource> = self.resources.values().collect();
        resources.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.code.cmp(&b.code)));
        for resource in resources {
            for drop in &resource.drops {
                if !self.items.contains_key(&drop.code) {
                    warn!(resource = %resource.code, item = %drop.code, "Drop of unknown item");
                }
                self.resources_by_drop
                    .entry(drop.code.clone())
                    .or_default()
                    .push(resource.code.clone());
            }
        }

        let mut monsters: Vec<&Monster> = self.monsters.values().collect();
        monsters.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.code.cmp(&b.code)));
        for monster in monsters {
            for drop in &monster.drops {
                if !self.items.contains_key(&drop.code) {
                    warn!(monster = %monster.code, item = %drop.code, "Drop of unknown item");
                }
                self.monsters_by_drop
                    .entry(drop.code.clone())
                    .or_default()
                    .push(monster.code.clone());
            }
        }
    }

    // -------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------

    /// Item by code.
    pub fn item(&self, code: &str) -> Option<&Item> {
        self.items.get(code)
    }

    /// Item by code, or [`CatalogError::UnknownItem`].
    pub fn require_item(&self, code: &str) -> Result<&Item, CatalogError> {
        self.item(code)
            .ok_or_else(|| CatalogError::UnknownItem(code.to_owned()))
    }

    /// Monster by code.
    pub fn monster(&self, code: &str) -> Option<&Monster> {
        self.monsters.get(code)
    }

    /// Monster by code, or [`CatalogError::UnknownMonster`].
    pub fn require_monster(&self, code: &str) -> Result<&Monster, CatalogError> {
        self.monster(code)
            .ok_or_else(|| CatalogError::UnknownMonster(code.to_owned()))
    }

    /// Resource by code.
    pub fn resource(&self, code: &str) -> Option<&Resource> {
        self.resources.get(code)
    }

    /// Resource by code, or [`CatalogError::UnknownResource`].
    pub fn require_resource(&self, code: &str) -> Result<&Resource, CatalogError> {
        self.resource(code)
            .ok_or_else(|| CatalogError::UnknownResource(code.to_owned()))
    }

    /// All items, ordered by code.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// All monsters, ordered by code.
    pub fn monsters(&self) -> impl Iterator<Item = &Monster> {
        self.monsters.values()
    }

    /// All resources, ordered by code.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// All map tiles.
    pub fn tiles(&self) -> &[MapTile] {
        &self.tiles
    }

    /// Resources that drop an item, lowest level first.
    pub fn resources_dropping<'a>(&'a self, code: &str) -> impl Iterator<Item = &'a Resource> {
        self.resources_by_drop
            .get(code)
            .into_iter()
            .flatten()
            .filter_map(|c| self.resources.get(c))
    }

    /// Monsters that drop an item, lowest level first.
    pub fn monsters_dropping<'a>(&'a self, code: &str) -> impl Iterator<Item = &'a Monster> {
        self.monsters_by_drop
            .get(code)
            .into_iter()
            .flatten()
            .filter_map(|c| self.monsters.get(c))
    }

    /// Items crafted with a skill, ordered by code.
    pub fn crafted_with(&self, skill: Skill) -> impl Iterator<Item = &Item> {
        self.items
            .values()
            .filter(move |i| i.recipe.as_ref().is_some_and(|r| r.skill == skill))
    }

    // -------------------------------------------------------------------
    // Map
    // -------------------------------------------------------------------

    /// Every tile hosting the given content.
    pub fn locations(&self, kind: ContentKind, code: &str) -> &[Position] {
        self.locations
            .get(&(kind, code.to_owned()))
            .map_or(&[], Vec::as_slice)
    }

    /// Closest tile hosting the given content, by Manhattan distance.
    /// Ties keep the first tile in load order.
    pub fn closest(&self, kind: ContentKind, code: &str, from: Position) -> Option<Position> {
        self.locations(kind, code)
            .iter()
            .copied()
            .min_by_key(|p| from.distance(*p))
    }

    /// Closest bank.
    pub fn closest_bank(&self, from: Position) -> Option<Position> {
        self.closest(ContentKind::Bank, ContentKind::Bank.as_str(), from)
    }

    /// Closest workshop for a crafting skill.
    pub fn closest_workshop(&self, skill: Skill, from: Position) -> Option<Position> {
        self.closest(ContentKind::Workshop, skill.as_str(), from)
    }

    /// Closest tasks master handing out the given task type.
    pub fn closest_tasks_master(&self, task_type: TaskType, from: Position) -> Option<Position> {
        self.closest(ContentKind::TasksMaster, task_type.as_str(), from)
    }
}

#[cfg(test)]
mod tests {
    use artifacts_types::{Drop, ItemQuantity, MapContent, Recipe, StatsProfile};

    use super::*;

    fn item(code: &str, level: u32) -> Item {
        Item {
            code: code.to_owned(),
            name: code.to_owned(),
            level,
            item_type: "resource".to_owned(),
            subtype: String::new(),
            recipe: None,
            stats: None,
        }
    }

    fn drop(code: &str) -> Drop {
        Drop {
            code: code.to_owned(),
            rate: 1,
            min_quantity: 1,
            max_quantity: 1,
        }
    }

    fn tile(x: i32, y: i32, kind: ContentKind, code: &str) -> MapTile {
        MapTile {
            name: format!("{code}@{x},{y}"),
            position: Position::new(x, y),
            content: Some(MapContent {
                kind,
                code: code.to_owned(),
            }),
        }
    }

    fn sample() -> CatalogSnapshot {
        let mut bar = item("copper_bar", 1);
        bar.recipe = Some(Recipe {
            skill: Skill::Mining,
            level: 1,
            quantity: 1,
            items: vec![ItemQuantity::new("copper_ore", 10)],
        });
        CatalogSnapshot {
            items: vec![item("copper_ore", 1), bar, item("feather", 1)],
            monsters: vec![
                Monster {
                    code: "wolf".to_owned(),
                    name: "Wolf".to_owned(),
                    level: 8,
                    stats: StatsProfile::default(),
                    drops: vec![drop("feather")],
                },
                Monster {
                    code: "chicken".to_owned(),
                    name: "Chicken".to_owned(),
                    level: 1,
                    stats: StatsProfile::default(),
                    drops: vec![drop("feather")],
                },
            ],
            resources: vec![Resource {
                code: "copper_rocks".to_owned(),
                name: "Copper Rocks".to_owned(),
                skill: artifacts_types::GatheringSkill::Mining,
                level: 1,
                drops: vec![drop("copper_ore")],
            }],
            maps: vec![
                tile(4, 1, ContentKind::Bank, "bank"),
                tile(-2, 0, ContentKind::Bank, "bank"),
                tile(1, 5, ContentKind::Workshop, "mining"),
                tile(2, 0, ContentKind::Resource, "copper_rocks"),
            ],
        }
    }

    #[test]
    fn reverse_drop_index_orders_by_level() {
        let catalog = Catalog::from_snapshot(sample()).unwrap_or_default();
        let codes: Vec<&str> = catalog
            .monsters_dropping("feather")
            .map(|m| m.code.as_str())
            .collect();
        assert_eq!(codes, vec!["chicken", "wolf"]);
        assert_eq!(
            catalog.resources_dropping("copper_ore").count(),
            1
        );
        assert_eq!(catalog.monsters_dropping("copper_ore").count(), 0);
    }

    #[test]
    fn closest_bank_uses_manhattan_distance() {
        let catalog = Catalog::from_snapshot(sample()).unwrap_or_default();
        assert_eq!(
            catalog.closest_bank(Position::new(0, 0)),
            Some(Position::new(-2, 0))
        );
        assert_eq!(
            catalog.closest_bank(Position::new(3, 3)),
            Some(Position::new(4, 1))
        );
        assert_eq!(
            catalog.closest_workshop(Skill::Mining, Position::new(0, 0)),
            Some(Position::new(1, 5))
        );
        assert_eq!(catalog.closest_workshop(Skill::Cooking, Position::new(0, 0)), None);
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let mut snapshot = sample();
        snapshot.items.push(item("feather", 2));
        assert!(matches!(
            Catalog::from_snapshot(snapshot),
            Err(CatalogError::Duplicate { kind: "item", .. })
        ));
    }

    #[test]
    fn dangling_recipe_input_is_rejected() {
        let mut snapshot = sample();
        snapshot.items.retain(|i| i.code != "copper_ore");
        assert!(matches!(
            Catalog::from_snapshot(snapshot),
            Err(CatalogError::DanglingReference { .. })
        ));
    }

    #[test]
    fn crafted_with_filters_by_skill() {
        let catalog = Catalog::from_snapshot(sample()).unwrap_or_default();
        let mining: Vec<&str> = catalog
            .crafted_with(Skill::Mining)
            .map(|i| i.code.as_str())
            .collect();
        assert_eq!(mining, vec!["copper_bar"]);
        assert_eq!(catalog.crafted_with(Skill::Cooking).count(), 0);
    }

    #[test]
    fn snapshot_survives_rebuild() {
        let catalog = Catalog::from_snapshot(sample()).unwrap_or_default();
        let rebuilt = Catalog::from_snapshot(catalog.to_snapshot()).unwrap_or_default();
        assert_eq!(rebuilt.items().count(), 3);
        assert_eq!(rebuilt.tiles().len(), 4);
    }
}
