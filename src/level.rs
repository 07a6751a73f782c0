//! Puzzle level built from one map: layers, solution snapshot and win check.

use std::collections::HashSet;

use log::{debug, warn};
use macroquad::color::Color;
use macroquad::math::{vec2, Rect, Vec2};

use crate::assets::{AssetKind, AssetLoader};
use crate::canvas::{Canvas, ImageParams};
use crate::error::{Error, Result};
use crate::layer::{extract_layers, LayerFilter, LayerFlags};
use crate::tiled::{MapDocument, TileId};

/// Number of orientations an interactive tile cycles through.
pub const ORIENTATIONS: u32 = 4;

const GRID_COLOR: Color = Color::new(0.0, 0.0, 0.0, 0.25);

/// Orientation step of `id`: `(id - base) mod 4`, always in `0..4`.
pub fn orientation(id: u32, base: u32) -> u32 {
    (i64::from(id) - i64::from(base)).rem_euclid(i64::from(ORIENTATIONS)) as u32
}

/// The id one quarter-turn further: `B, B+1, B+2, B+3, B, ...`.
pub fn next_orientation(id: u32, base: u32) -> u32 {
    base + (orientation(id, base) + 1) % ORIENTATIONS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelTile {
    pub x: u32,
    pub y: u32,
    pub id: u32,
    /// Whether an image for `id` was loaded when the layer was built.
    pub valid: bool,
}

/// A classified tile layer, stored sparsely at `x + y * width`.
#[derive(Debug, Clone)]
pub struct LevelLayer {
    pub name: String,
    pub tiles: Vec<Option<LevelTile>>,
    pub flags: LayerFlags,
    pub opacity: f32,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelObject {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Degrees, clockwise around the bottom-left corner.
    pub rotation: f32,
    pub valid: bool,
}

#[derive(Debug, Clone)]
pub struct LevelObjectLayer {
    pub name: String,
    pub objects: Vec<LevelObject>,
    pub renderable: bool,
    pub opacity: f32,
    pub visible: bool,
}

/// Where a level lands on screen: fitted to the viewport and centred along
/// its long axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelView {
    pub origin: Vec2,
    pub scale: f32,
    pub tile_size: f32,
}

impl LevelView {
    pub fn fit(viewport: Vec2, tile_size: f32, columns: u32, rows: u32) -> Self {
        let map_w = tile_size * columns.max(1) as f32;
        let map_h = tile_size * rows.max(1) as f32;
        let scale = (viewport.x / map_w).min(viewport.y / map_h);
        let tile_px = tile_size * scale;

        let mut origin = Vec2::ZERO;
        if viewport.y < viewport.x {
            origin.x = viewport.x * 0.5 - columns as f32 * tile_px * 0.5;
        } else {
            origin.y = viewport.y * 0.5 - rows as f32 * tile_px * 0.5;
        }
        Self {
            origin,
            scale,
            tile_size,
        }
    }

    /// Size of one tile on screen.
    pub fn tile_px(&self) -> f32 {
        self.tile_size * self.scale
    }

    /// Screen point to tile coordinates (may be out of range).
    pub fn to_tile(&self, screen: Vec2) -> (i32, i32) {
        let local = (screen - self.origin) / self.tile_px();
        (local.x.floor() as i32, local.y.floor() as i32)
    }

    pub fn tile_rect(&self, x: u32, y: u32) -> Rect {
        let px = self.tile_px();
        Rect::new(
            self.origin.x + x as f32 * px,
            self.origin.y + y as f32 * px,
            px,
            px,
        )
    }

    /// Map-pixel point to screen.
    pub fn map_point(&self, p: Vec2) -> Vec2 {
        self.origin + p * self.scale
    }
}

/// One playable map.
#[derive(Debug, Clone)]
pub struct Level {
    map: MapDocument,
    rotation_base: u32,
    layers: Vec<LevelLayer>,
    objects: Vec<LevelObjectLayer>,
    interactive: Option<usize>,
    solution: Option<Vec<Option<u32>>>,
    available: HashSet<u32>,
}

impl Level {
    pub fn new(map: MapDocument, rotation_base: u32) -> Self {
        Self {
            map,
            rotation_base,
            layers: Vec::new(),
            objects: Vec::new(),
            interactive: None,
            solution: None,
            available: HashSet::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.map.width
    }

    pub fn height(&self) -> u32 {
        self.map.height
    }

    pub fn layers(&self) -> &[LevelLayer] {
        &self.layers
    }

    pub fn object_layers(&self) -> &[LevelObjectLayer] {
        &self.objects
    }

    /// Tile ids of the interactive layer as they were before shuffling.
    pub fn solution(&self) -> Option<&[Option<u32>]> {
        self.solution.as_deref()
    }

    /// Builds the layers, dims hint layers and, if the map has an interactive
    /// layer, snapshots it and shuffles every tile's orientation using `pick`
    /// (any value; taken modulo 4).
    pub fn start(
        &mut self,
        assets: &AssetLoader,
        hint_opacity: f32,
        pick: &mut dyn FnMut() -> u32,
    ) {
        self.load_map(assets);
        self.set_hint_layers_opacity(hint_opacity);

        self.solution = None;
        let Some(index) = self.interactive else {
            debug!("level has no interactive layer");
            return;
        };
        self.solution = Some(
            self.layers[index]
                .tiles
                .iter()
                .map(|tile| tile.map(|t| t.id))
                .collect(),
        );

        let base = self.rotation_base;
        let available = &self.available;
        for tile in self.layers[index].tiles.iter_mut().flatten() {
            tile.id = base + pick() % ORIENTATIONS;
            tile.valid = available.contains(&tile.id);
        }
    }

    fn load_map(&mut self, assets: &AssetLoader) {
        self.available = assets
            .ids(AssetKind::Image)
            .filter_map(|id| id.parse().ok())
            .collect();

        let width = self.map.width as usize;
        let cells = width * self.map.height as usize;
        let extracted = extract_layers(&self.map, LayerFilter::RenderableOnly);

        let mut layers = Vec::new();
        let mut interactive = None;
        for (layer, flags) in extracted.tiles {
            if layer.data.is_empty() {
                continue;
            }
            let mut tiles = vec![None; cells];
            for (i, &raw) in layer.data.iter().enumerate().take(cells) {
                let id = TileId(raw).clean();
                if id == 0 {
                    continue;
                }
                tiles[i] = Some(LevelTile {
                    x: (i % width) as u32,
                    y: (i / width) as u32,
                    id,
                    valid: self.available.contains(&id),
                });
            }
            if flags.interactive {
                if interactive.is_some() {
                    warn!(
                        "Layer '{}' is also interactive; only the first one counts",
                        layer.name
                    );
                } else {
                    interactive = Some(layers.len());
                }
            }
            layers.push(LevelLayer {
                name: layer.name.clone(),
                tiles,
                flags,
                opacity: layer.opacity,
                visible: layer.visible,
            });
        }

        self.objects = extracted
            .objects
            .into_iter()
            .map(|(layer, flags)| LevelObjectLayer {
                name: layer.name.clone(),
                objects: layer
                    .objects
                    .iter()
                    .filter(|o| o.visible)
                    .filter_map(|o| {
                        let id = TileId(o.gid?).clean();
                        Some(LevelObject {
                            id,
                            x: o.x,
                            y: o.y,
                            width: o.width,
                            height: o.height,
                            rotation: o.rotation,
                            valid: self.available.contains(&id),
                        })
                    })
                    .collect(),
                renderable: flags.renderable,
                opacity: layer.opacity,
                visible: layer.visible,
            })
            .collect();
        self.layers = layers;
        self.interactive = interactive;
    }

    pub fn set_hint_layers_opacity(&mut self, opacity: f32) {
        for layer in self.layers.iter_mut().filter(|l| l.flags.hint) {
            layer.opacity = opacity;
        }
    }

    pub fn interactive_layer(&self) -> Option<&LevelLayer> {
        self.interactive.map(|i| &self.layers[i])
    }

    fn cell(&self, x: i32, y: i32) -> Option<usize> {
        let (x, y) = (u32::try_from(x).ok()?, u32::try_from(y).ok()?);
        (x < self.width() && y < self.height()).then(|| (x + y * self.width()) as usize)
    }

    pub fn interactive_tile(&self, x: i32, y: i32) -> Option<&LevelTile> {
        let cell = self.cell(x, y)?;
        self.interactive_layer()?.tiles.get(cell)?.as_ref()
    }

    /// Replaces the id of an existing interactive tile. No-op on empty cells.
    pub fn set_interactive_tile_id(&mut self, x: i32, y: i32, id: u32) {
        let (Some(cell), Some(layer)) = (self.cell(x, y), self.interactive) else {
            return;
        };
        if let Some(Some(tile)) = self.layers[layer].tiles.get_mut(cell) {
            tile.id = id;
            tile.valid = self.available.contains(&id);
        }
    }

    /// Turns the interactive tile at `(x, y)` one step. Returns whether a
    /// tile was there to turn.
    pub fn try_flip_tile(&mut self, x: i32, y: i32) -> bool {
        let Some(tile) = self.interactive_tile(x, y) else {
            return false;
        };
        let next = next_orientation(tile.id, self.rotation_base);
        self.set_interactive_tile_id(x, y, next);
        true
    }

    /// True once every snapshotted cell holds its original id again.
    pub fn is_complete(&self) -> bool {
        let (Some(solution), Some(layer)) = (&self.solution, self.interactive_layer()) else {
            return false;
        };
        solution.iter().enumerate().all(|(i, expected)| match expected {
            None => true,
            Some(id) => layer.tiles.get(i).copied().flatten().map(|t| t.id) == Some(*id),
        })
    }

    /// Draws tile layers in order, the grid, then renderable object layers.
    /// Tiles whose image is missing are skipped.
    pub fn render(&self, canvas: &mut dyn Canvas, assets: &AssetLoader, view: &LevelView) {
        for layer in self.layers.iter().filter(|l| l.visible) {
            for tile in layer.tiles.iter().flatten().filter(|t| t.valid) {
                let id = tile.id.to_string();
                if let Ok(image) = assets.image(&id) {
                    let params = ImageParams {
                        opacity: layer.opacity,
                        ..Default::default()
                    };
                    canvas.image(&id, image, view.tile_rect(tile.x, tile.y), params);
                }
            }
        }

        self.render_grid(canvas, view);

        for layer in self.objects.iter().filter(|l| l.visible && l.renderable) {
            for obj in layer.objects.iter().filter(|o| o.valid) {
                let id = obj.id.to_string();
                let Ok(image) = assets.image(&id) else {
                    continue;
                };
                let anchor = view.map_point(vec2(obj.x, obj.y));
                let size = vec2(obj.width, obj.height) * view.scale;
                let dest = Rect::new(anchor.x, anchor.y - size.y, size.x, size.y);
                let params = ImageParams {
                    opacity: layer.opacity,
                    rotation: obj.rotation.to_radians(),
                    pivot: Some(anchor),
                };
                canvas.image(&id, image, dest, params);
            }
        }
    }

    fn render_grid(&self, canvas: &mut dyn Canvas, view: &LevelView) {
        let px = view.tile_px();
        let (w, h) = (self.width() as f32 * px, self.height() as f32 * px);
        for i in 0..self.width() {
            let x = view.origin.x + i as f32 * px;
            canvas.line(vec2(x, view.origin.y), vec2(x, view.origin.y + h), 1.0, GRID_COLOR);
        }
        for i in 0..self.height() {
            let y = view.origin.y + i as f32 * px;
            canvas.line(vec2(view.origin.x, y), vec2(view.origin.x + w, y), 1.0, GRID_COLOR);
        }
    }
}

/// Owns every level of the game and tracks which one is running.
#[derive(Debug, Default)]
pub struct LevelManager {
    levels: Vec<Level>,
    current: Option<usize>,
}

impl LevelManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_maps(&mut self, maps: Vec<MapDocument>, rotation_base: u32) {
        self.levels = maps
            .into_iter()
            .map(|map| Level::new(map, rotation_base))
            .collect();
        self.current = None;
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Starts level `index` and makes it current.
    pub fn start_level(
        &mut self,
        index: usize,
        assets: &AssetLoader,
        hint_opacity: f32,
        pick: &mut dyn FnMut() -> u32,
    ) -> Result<&mut Level> {
        let count = self.levels.len();
        let level = self
            .levels
            .get_mut(index)
            .ok_or(Error::LevelIndex { index, count })?;
        level.start(assets, hint_opacity, pick);
        self.current = Some(index);
        Ok(level)
    }

    pub fn current_level(&self) -> Option<&Level> {
        self.current.and_then(|i| self.levels.get(i))
    }

    pub fn current_level_mut(&mut self) -> Option<&mut Level> {
        self.current.and_then(|i| self.levels.get_mut(i))
    }
}
