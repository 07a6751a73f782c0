//! Game configuration, read from `path-logic.json`.

use log::{info, LevelFilter};
use serde::Deserialize;

use crate::assets::AssetItem;
use crate::error::{Error, Result};
use crate::loader::maps::{parse_json, EmptyMaps};
use crate::source::AssetSource;

/// Default location of the configuration document.
pub const CONFIG_PATH: &str = "path-logic.json";

fn default_tileset_folder() -> String {
    "assets/path-logic/data/tilesets".to_owned()
}

fn default_images_root() -> String {
    "assets/path-logic".to_owned()
}

fn default_ui_assets() -> Vec<AssetItem> {
    vec![AssetItem::image("level_select", "assets/path-logic/level_select.png")]
}

fn default_tile_size() -> f32 {
    128.0
}

fn half() -> f32 {
    0.5
}

fn default_rotation_base() -> u32 {
    40
}

fn default_update_rate() -> u32 {
    60
}

fn default_log_level() -> LevelFilter {
    LevelFilter::Info
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Level maps, in play order.
    pub map_paths: Vec<String>,
    pub tileset_folder: String,
    /// Tile images are re-rooted here (`<root>/<subfolder>/<file>`).
    pub images_root: String,
    /// Images not referenced by any tileset, such as the level selector.
    pub ui_assets: Vec<AssetItem>,
    pub empty_maps: EmptyMaps,
    /// Source size of one tile in pixels.
    pub tile_size: f32,
    pub hint_opacity: f32,
    /// First tile id of the rotatable range.
    pub rotation_base: u32,
    /// Fixed updates per second.
    pub update_rate: u32,
    /// Lets a tap on the start screen jump straight to level selection.
    pub testing_bypass: bool,
    pub shuffle_seed: Option<u64>,
    pub log_level: LevelFilter,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            map_paths: Vec::new(),
            tileset_folder: default_tileset_folder(),
            images_root: default_images_root(),
            ui_assets: default_ui_assets(),
            empty_maps: EmptyMaps::default(),
            tile_size: default_tile_size(),
            hint_opacity: half(),
            rotation_base: default_rotation_base(),
            update_rate: default_update_rate(),
            testing_bypass: false,
            shuffle_seed: None,
            log_level: default_log_level(),
        }
    }
}

impl GameConfig {
    pub fn from_json_str(path: &str, text: &str) -> Result<Self> {
        parse_json(path, text)
    }

    /// Reads the configuration at `path`. A missing document yields the
    /// defaults; a malformed one is an error.
    pub async fn load<S: AssetSource>(source: &S, path: &str) -> Result<Self> {
        match source.read_string(path).await {
            Ok(text) => Self::from_json_str(path, &text),
            Err(Error::Fetch { .. }) => {
                info!("No configuration at {}, using defaults", path);
                Ok(Self::default())
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use crate::task::block_on;

    #[test]
    fn partial_document_keeps_defaults() {
        let cfg = GameConfig::from_json_str(
            "cfg.json",
            r#"{"map_paths": ["maps/1.json"], "empty_maps": "allow", "log_level": "debug", "shuffle_seed": 7}"#,
        )
        .unwrap();
        assert_eq!(cfg.map_paths, vec!["maps/1.json"]);
        assert_eq!(cfg.empty_maps, EmptyMaps::Allow);
        assert_eq!(cfg.log_level, LevelFilter::Debug);
        assert_eq!(cfg.shuffle_seed, Some(7));
        assert_eq!(cfg.tile_size, 128.0);
        assert_eq!(cfg.hint_opacity, 0.5);
        assert_eq!(cfg.rotation_base, 40);
        assert_eq!(cfg.ui_assets[0].id, "level_select");
    }

    #[test]
    fn missing_file_gives_defaults() {
        let cfg = block_on(GameConfig::load(&MemorySource::new(), CONFIG_PATH)).unwrap();
        assert_eq!(cfg, GameConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let src = MemorySource::new().with_file(CONFIG_PATH, "{ nope");
        let err = block_on(GameConfig::load(&src, CONFIG_PATH)).unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
    }
}
