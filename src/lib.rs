//! Path-logic: a tile-flipping road puzzle played on Tiled JSON maps with
//! Macroquad.
//!
//! Maps and tilesets are fetched through an [`AssetSource`], turned into
//! [`Level`]s and driven by the [`StateMachine`]. Drawing goes through the
//! [`Canvas`] trait so everything above the renderer runs without a window.

pub mod assets;
pub mod canvas;
pub mod config;
mod error;
pub mod game;
pub mod input;
pub mod layer;
pub mod level;
pub mod loader {
    //! Map and tileset documents.
    pub mod maps;
    pub mod tilesets;
}
pub mod render;
pub mod source;
pub mod state;
pub mod task;
pub mod tiled;
pub mod time;

pub use assets::{Asset, AssetItem, AssetKind, AssetLoader};
pub use canvas::{Canvas, ImageParams};
pub use config::{GameConfig, CONFIG_PATH};
pub use error::{Error, Result};
pub use game::Game;
pub use layer::{classify, extract_layers, extract_tile_layers, LayerFilter, LayerFlags};
pub use level::{Level, LevelManager, LevelView};
pub use loader::maps::{load_maps, EmptyMaps};
pub use loader::tilesets::{check_consistent_order, resolve_tile_catalog, Tile};
pub use render::MacroquadCanvas;
pub use source::{AssetSource, FileSource, MemorySource};
pub use state::{GameState, LifecycleEvent, StateKind, StateMachine};
pub use tiled::MapDocument;
