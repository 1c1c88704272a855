//! Serializable catalog snapshot.
//!
//! The engine can fetch the catalog from the game API once and store it as a
//! single JSON document. Later runs (and the simulated server) load the same
//! document without touching the network.

use std::path::Path;

use artifacts_types::{Item, MapTile, Monster, Resource};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CatalogError;

/// Raw catalog collections, in the shape they are stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Every item.
    #[serde(default)]
    pub items: Vec<Item>,
    /// Every monster.
    #[serde(default)]
    pub monsters: Vec<Monster>,
    /// Every resource.
    #[serde(default)]
    pub resources: Vec<Resource>,
    /// Every map tile.
    #[serde(default)]
    pub maps: Vec<MapTile>,
}

impl CatalogSnapshot {
    /// Read a snapshot from a JSON file.
    pub fn read(path: &Path) -> Result<Self, CatalogError> {
        let path_str = path.display().to_string();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path_str.clone(),
            source,
        })?;
        let snapshot: Self = serde_json::from_str(&text).map_err(|source| CatalogError::Parse {
            path: path_str.clone(),
            source,
        })?;
        info!(
            path = %path_str,
            items = snapshot.items.len(),
            monsters = snapshot.monsters.len(),
            resources = snapshot.resources.len(),
            tiles = snapshot.maps.len(),
            "Catalog snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Write the snapshot as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> Result<(), CatalogError> {
        let path_str = path.display().to_string();
        let text = serde_json::to_string_pretty(self).map_err(|source| CatalogError::Parse {
            path: path_str.clone(),
            source,
        })?;
        std::fs::write(path, text).map_err(|source| CatalogError::Io {
            path: path_str.clone(),
            source,
        })?;
        info!(path = %path_str, "Catalog snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_collections_default_to_empty() {
        let snapshot: Result<CatalogSnapshot, _> = serde_json::from_str(r#"{"items": []}"#);
        assert_eq!(snapshot.ok(), Some(CatalogSnapshot::default()));
    }

    #[test]
    fn write_then_read_from_disk() {
        let path = std::env::temp_dir().join(format!(
            "artifacts-catalog-{}.json",
            std::process::id()
        ));
        let snapshot = CatalogSnapshot::default();
        assert!(snapshot.write(&path).is_ok());
        let loaded = CatalogSnapshot::read(&path).ok();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, Some(snapshot));
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = CatalogSnapshot::read(Path::new("/nonexistent/catalog.json"));
        assert!(matches!(result, Err(CatalogError::Io { .. })));
    }
}
