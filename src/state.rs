//! Screen flow: start screen, level selection, play, win and error.

use std::fmt;

use log::{debug, error, info, warn};
use macroquad::color::{Color, BLACK, RED, WHITE};
use macroquad::math::{vec2, Rect, Vec2};

use crate::assets::{Asset, AssetItem, AssetKind, AssetLoader};
use crate::canvas::{Canvas, FontRef, ImageParams};
use crate::config::GameConfig;
use crate::error::{Error, Result};
use crate::level::{LevelManager, LevelView, ORIENTATIONS};
use crate::loader::maps::load_maps;
use crate::loader::tilesets::resolve_tile_catalog;
use crate::source::AssetSource;
use crate::task::Task;
use crate::tiled::MapDocument;

/// `#222034`
const BACKGROUND: Color = Color::new(
    0x22 as f32 / 255.0,
    0x20 as f32 / 255.0,
    0x34 as f32 / 255.0,
    1.0,
);

/// Asset id of the level selection artwork.
pub const LEVEL_SELECT: &str = "level_select";
/// Asset id of the optional title font.
pub const TITLE_FONT: &str = "pixelSquare";

/// The active screen and its parameters.
#[derive(Debug)]
pub enum GameState {
    /// Loads maps, tilesets and images, then starts the first level.
    StartScreen { map_paths: Vec<String> },
    LevelSelector,
    LoadedLevel { level_index: usize },
    LevelWon,
    Error { error: Error },
}

/// Fieldless tag of a [`GameState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    StartScreen,
    LevelSelector,
    LoadedLevel,
    LevelWon,
    Error,
}

impl GameState {
    pub fn kind(&self) -> StateKind {
        match self {
            GameState::StartScreen { .. } => StateKind::StartScreen,
            GameState::LevelSelector => StateKind::LevelSelector,
            GameState::LoadedLevel { .. } => StateKind::LoadedLevel,
            GameState::LevelWon => StateKind::LevelWon,
            GameState::Error { .. } => StateKind::Error,
        }
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Lifecycle record kept by the machine, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Entered(StateKind),
    Exited(StateKind),
}

/// Output of the start screen's loading task.
struct Prepared {
    maps: Vec<MapDocument>,
    assets: AssetLoader,
}

/// Loads every map, the first map's tile catalog and all images into a
/// fresh loader. Tile images are registered under their global id.
async fn prepare<S: AssetSource>(
    source: S,
    config: GameConfig,
    map_paths: Vec<String>,
) -> Result<Prepared> {
    let maps = load_maps(&source, &map_paths, config.empty_maps).await?;
    let tiles = match maps.first() {
        Some(first) => {
            let (folder, root) = (&config.tileset_folder, &config.images_root);
            resolve_tile_catalog(&source, first, folder, root).await?
        }
        None => Vec::new(),
    };

    let tile_images = tiles
        .into_iter()
        .map(|tile| AssetItem::image(tile.id.to_string(), tile.image));
    let mut assets = AssetLoader::new();
    assets.set_items_to_load(config.ui_assets.iter().cloned().chain(tile_images));
    assets.load(&source).await?;
    Ok(Prepared { maps, assets })
}

fn default_picker() -> Box<dyn FnMut() -> u32> {
    Box::new(|| macroquad::rand::gen_range(0, ORIENTATIONS))
}

/// Owns the current [`GameState`] and everything the states act on.
///
/// Starts with no state; `render` and `touched` do nothing until the first
/// [`transition_to`](Self::transition_to).
pub struct StateMachine<S> {
    source: S,
    config: GameConfig,
    assets: AssetLoader,
    levels: LevelManager,
    viewport: Vec2,
    picker: Box<dyn FnMut() -> u32>,
    state: Option<GameState>,
    loading: Option<Task<Result<Prepared>>>,
    journal: Vec<LifecycleEvent>,
}

impl<S: AssetSource + Clone + 'static> StateMachine<S> {
    pub fn new(source: S, config: GameConfig) -> Self {
        Self {
            source,
            config,
            assets: AssetLoader::new(),
            levels: LevelManager::new(),
            viewport: Vec2::ZERO,
            picker: default_picker(),
            state: None,
            loading: None,
            journal: Vec::new(),
        }
    }

    /// Replaces the orientation picker used when a level shuffles its tiles.
    pub fn with_picker(mut self, picker: impl FnMut() -> u32 + 'static) -> Self {
        self.picker = Box::new(picker);
        self
    }

    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    pub fn kind(&self) -> Option<StateKind> {
        self.state.as_ref().map(GameState::kind)
    }

    pub fn journal(&self) -> &[LifecycleEvent] {
        &self.journal
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn assets(&self) -> &AssetLoader {
        &self.assets
    }

    pub fn levels(&self) -> &LevelManager {
        &self.levels
    }

    pub fn levels_mut(&mut self) -> &mut LevelManager {
        &mut self.levels
    }

    /// Whether the start screen's loading task is still running.
    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    /// Exits the current state, then enters `next`. A state whose entry
    /// fails hands over to the follow-up state it returns.
    pub fn transition_to(&mut self, next: GameState) {
        let mut next = Some(next);
        while let Some(state) = next.take() {
            if let Some(old) = self.state.take() {
                self.exit(&old);
            }
            self.state = Some(state);
            next = self.enter();
        }
    }

    fn exit(&mut self, old: &GameState) {
        debug!("Exit {}", old.kind());
        self.journal.push(LifecycleEvent::Exited(old.kind()));
    }

    fn enter(&mut self) -> Option<GameState> {
        let state = self.state.as_ref()?;
        let kind = state.kind();
        debug!("Enter {}", kind);
        self.journal.push(LifecycleEvent::Entered(kind));

        match state {
            GameState::StartScreen { map_paths } => {
                let task = Task::spawn(prepare(
                    self.source.clone(),
                    self.config.clone(),
                    map_paths.clone(),
                ));
                if self.loading.replace(task).is_some() {
                    debug!("Dropping unfinished load");
                }
                None
            }
            GameState::LevelSelector => {
                if !self.assets.has(AssetKind::Image, LEVEL_SELECT) && self.loading.is_none() {
                    warn!("Level selector image '{}' is not loaded", LEVEL_SELECT);
                }
                None
            }
            GameState::LoadedLevel { level_index } => {
                let index = *level_index;
                match self.levels.start_level(
                    index,
                    &self.assets,
                    self.config.hint_opacity,
                    &mut *self.picker,
                ) {
                    Ok(_) => {
                        info!("Level {} started", index);
                        None
                    }
                    Err(error) => Some(GameState::Error { error }),
                }
            }
            GameState::LevelWon => {
                info!("Level complete");
                None
            }
            GameState::Error { error } => {
                error!("An error occurred: {}", error);
                None
            }
        }
    }

    /// Applies the start screen's load result once it is ready.
    ///
    /// Maps and assets are installed whatever screen is showing; only a
    /// machine still on the start screen moves on to the first level.
    pub fn update(&mut self) {
        let Some(task) = self.loading.as_mut() else {
            return;
        };
        let Some(result) = task.poll() else {
            return;
        };
        self.loading = None;

        match result {
            Ok(prepared) => {
                self.levels.set_maps(prepared.maps, self.config.rotation_base);
                self.assets.adopt(prepared.assets);
                if self.kind() == Some(StateKind::StartScreen) {
                    self.transition_to(GameState::LoadedLevel { level_index: 0 });
                }
            }
            Err(error) => self.transition_to(GameState::Error { error }),
        }
    }

    /// Records the drawable size used to map pointer positions onto tiles.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport = vec2(width, height);
    }

    fn level_view(&self, columns: u32, rows: u32) -> LevelView {
        LevelView::fit(self.viewport, self.config.tile_size, columns, rows)
    }

    /// Pointer down at canvas coordinates.
    pub fn touched(&mut self, x: f32, y: f32) {
        let next = match &self.state {
            None => None,
            Some(GameState::StartScreen { .. }) if self.config.testing_bypass => {
                Some(GameState::LevelSelector)
            }
            Some(GameState::LevelSelector) => Some(GameState::LoadedLevel { level_index: 0 }),
            Some(GameState::LoadedLevel { .. }) => {
                let view = self
                    .levels
                    .current_level()
                    .map(|level| self.level_view(level.width(), level.height()));
                match self.levels.current_level_mut() {
                    Some(level) => {
                        // Before the first render there is no board to hit.
                        if let Some(view) = view.filter(|v| v.tile_px() > 0.0) {
                            let (tx, ty) = view.to_tile(vec2(x, y));
                            level.try_flip_tile(tx, ty);
                        }
                        level.is_complete().then_some(GameState::LevelWon)
                    }
                    None => None,
                }
            }
            Some(_) => None,
        };
        if let Some(next) = next {
            self.transition_to(next);
        }
    }

    fn font(&self) -> Option<FontRef<'_>> {
        match self.assets.get(AssetKind::Font, TITLE_FONT) {
            Ok(Asset::Font(bytes)) => Some((TITLE_FONT, &bytes[..])),
            _ => None,
        }
    }

    /// Draws the current state. The canvas size becomes the new viewport.
    pub fn render(&mut self, canvas: &mut dyn Canvas) {
        if self.state.is_none() {
            return;
        }
        let size = canvas.size();
        self.resize(size.x, size.y);
        canvas.begin_frame(self.assets.generation());
        canvas.clear(BLACK);

        let Some(state) = &self.state else {
            return;
        };
        match state {
            GameState::StartScreen { .. } => {
                canvas.fill_rect(Rect::new(0.0, 0.0, size.x, size.y), BACKGROUND);
                let font = self.font();
                canvas.text("Road builder", vec2(100.0, 300.0), 160.0, WHITE, font);
                canvas.text("Loading...", vec2(100.0, 500.0), 72.0, WHITE, font);
            }
            GameState::LevelSelector => {
                if let Ok(image) = self.assets.image(LEVEL_SELECT) {
                    let dim = vec2(image.width() as f32, image.height() as f32);
                    let pos = (size - dim) * 0.5;
                    let dest = Rect::new(pos.x, pos.y, dim.x, dim.y);
                    canvas.image(LEVEL_SELECT, image, dest, ImageParams::default());
                }
            }
            GameState::LoadedLevel { .. } | GameState::LevelWon => {
                if let Some(level) = self.levels.current_level() {
                    let view = self.level_view(level.width(), level.height());
                    level.render(canvas, &self.assets, &view);
                }
                if let GameState::LevelWon = state {
                    let font = self.font();
                    canvas.text("Level complete!", vec2(40.0, size.y * 0.5), 96.0, WHITE, font);
                }
            }
            GameState::Error { error } => {
                canvas.text(&error.to_string(), vec2(20.0, 40.0), 32.0, RED, None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::testing::{png_source, RecordingCanvas};
    use crate::source::MemorySource;

    const MAP: &str = r#"{
      "width": 2, "height": 1,
      "tilesets": [{"firstgid": 40, "source": "../tilesets/roads.tsx"}],
      "layers": [
        {"type": "tilelayer", "name": "roads", "data": [40, 41],
         "properties": [
           {"name": "renderable", "type": "bool", "value": true},
           {"name": "interactive", "type": "bool", "value": true}]}
      ]
    }"#;

    const ROADS: &str = r#"{"tiles": [
        {"id": 0, "image": "art/roads/r0.png", "imagewidth": 128, "imageheight": 128},
        {"id": 1, "image": "art/roads/r1.png", "imagewidth": 128, "imageheight": 128},
        {"id": 2, "image": "art/roads/r2.png", "imagewidth": 128, "imageheight": 128},
        {"id": 3, "image": "art/roads/r3.png", "imagewidth": 128, "imageheight": 128}
    ]}"#;

    fn source() -> MemorySource {
        let images = "img/roads/r0.png, img/roads/r1.png, img/roads/r2.png, img/roads/r3.png";
        png_source(&format!("{}, img/select.png", images))
            .with_file("maps/1.json", MAP)
            .with_file("ts/roads.json", ROADS)
    }

    fn config() -> GameConfig {
        GameConfig {
            map_paths: vec!["maps/1.json".to_owned()],
            tileset_folder: "ts".to_owned(),
            images_root: "img".to_owned(),
            ui_assets: vec![AssetItem::image(LEVEL_SELECT, "img/select.png")],
            ..GameConfig::default()
        }
    }

    fn machine(config: GameConfig) -> StateMachine<MemorySource> {
        StateMachine::new(source(), config).with_picker(|| 1)
    }

    fn start(m: &mut StateMachine<MemorySource>) {
        let map_paths = m.config().map_paths.clone();
        m.transition_to(GameState::StartScreen { map_paths });
        m.update();
    }

    #[test]
    fn no_state_ignores_render_and_touch() {
        let mut m = machine(config());
        let mut canvas = RecordingCanvas::new(100.0, 100.0);
        m.touched(1.0, 1.0);
        m.render(&mut canvas);
        assert!(m.state().is_none());
        assert!(canvas.ops.is_empty());
        assert!(m.journal().is_empty());
    }

    #[test]
    fn start_screen_loads_then_starts_first_level() {
        let mut m = machine(config());
        let map_paths = m.config().map_paths.clone();
        m.transition_to(GameState::StartScreen { map_paths });
        assert_eq!(m.kind(), Some(StateKind::StartScreen));
        assert!(m.is_loading());

        let mut canvas = RecordingCanvas::new(800.0, 600.0);
        m.render(&mut canvas);
        assert_eq!(canvas.texts(), vec!["Road builder", "Loading..."]);

        m.update();
        assert_eq!(m.kind(), Some(StateKind::LoadedLevel));
        assert!(!m.is_loading());
        assert!(m.assets().has(AssetKind::Image, "40"));
        assert!(m.assets().has(AssetKind::Image, "43"));
        assert!(m.assets().has(AssetKind::Image, LEVEL_SELECT));
        assert_eq!(
            m.journal(),
            &[
                LifecycleEvent::Entered(StateKind::StartScreen),
                LifecycleEvent::Exited(StateKind::StartScreen),
                LifecycleEvent::Entered(StateKind::LoadedLevel),
            ]
        );
    }

    #[test]
    fn load_failure_goes_to_error_state() {
        let mut cfg = config();
        cfg.map_paths = vec!["maps/missing.json".to_owned()];
        let mut m = machine(cfg);
        start(&mut m);

        match m.state() {
            Some(GameState::Error { error }) => assert!(error.is_load()),
            other => panic!("expected error state, got {:?}", other),
        }
        let mut canvas = RecordingCanvas::new(800.0, 600.0);
        m.render(&mut canvas);
        assert_eq!(canvas.texts().len(), 1);
        assert!(canvas.texts()[0].contains("maps/missing.json"));
    }

    #[test]
    fn empty_map_list_is_an_error_by_default() {
        let mut cfg = config();
        cfg.map_paths.clear();
        let mut m = machine(cfg);
        start(&mut m);
        assert!(matches!(m.state(), Some(GameState::Error { error: Error::NoMaps })));
    }

    #[test]
    fn out_of_range_level_routes_to_error() {
        let mut m = machine(config());
        start(&mut m);
        m.transition_to(GameState::LoadedLevel { level_index: 5 });
        assert!(matches!(
            m.state(),
            Some(GameState::Error { error: Error::LevelIndex { index: 5, count: 1 } })
        ));
        assert_eq!(
            &m.journal()[m.journal().len() - 4..],
            &[
                LifecycleEvent::Exited(StateKind::LoadedLevel),
                LifecycleEvent::Entered(StateKind::LoadedLevel),
                LifecycleEvent::Exited(StateKind::LoadedLevel),
                LifecycleEvent::Entered(StateKind::Error),
            ]
        );
    }

    #[test]
    fn flipping_every_tile_home_wins() {
        // Picker 1 turns [40, 41] into [41, 41]; three taps on cell 0 restore it.
        let mut m = machine(config());
        start(&mut m);
        m.resize(256.0, 128.0);

        m.touched(10.0, 10.0);
        m.touched(10.0, 10.0);
        assert_eq!(m.kind(), Some(StateKind::LoadedLevel));
        m.touched(10.0, 10.0);
        assert_eq!(m.kind(), Some(StateKind::LevelWon));

        m.touched(10.0, 10.0);
        assert_eq!(m.kind(), Some(StateKind::LevelWon));
    }

    #[test]
    fn taps_outside_the_board_do_nothing() {
        let mut m = machine(config());
        start(&mut m);
        m.resize(256.0, 512.0);
        // Board is 256x128 centred vertically at y = 192.
        m.touched(10.0, 10.0);
        let level = m.levels().current_level().unwrap();
        assert_eq!(level.interactive_tile(0, 0).map(|t| t.id), Some(41));
    }

    #[test]
    fn start_screen_tap_requires_testing_bypass() {
        let mut m = machine(config());
        m.transition_to(GameState::StartScreen { map_paths: Vec::new() });
        m.touched(0.0, 0.0);
        assert_eq!(m.kind(), Some(StateKind::StartScreen));
    }

    #[test]
    fn bypass_keeps_loading_behind_the_level_selector() {
        let mut cfg = config();
        cfg.testing_bypass = true;
        let mut m = machine(cfg);
        let map_paths = m.config().map_paths.clone();
        m.transition_to(GameState::StartScreen { map_paths });

        m.touched(0.0, 0.0);
        assert_eq!(m.kind(), Some(StateKind::LevelSelector));
        assert!(m.is_loading());

        m.update();
        assert_eq!(m.kind(), Some(StateKind::LevelSelector));
        assert!(!m.is_loading());
        assert!(m.assets().has(AssetKind::Image, LEVEL_SELECT));
        assert_eq!(m.levels().len(), 1);

        m.touched(0.0, 0.0);
        assert_eq!(m.kind(), Some(StateKind::LoadedLevel));
    }

    #[test]
    fn already_solved_board_wins_on_any_tap() {
        // Picks 0 then 1 reproduce the solution [40, 41].
        let mut n = 0;
        let mut m = StateMachine::new(source(), config()).with_picker(move || {
            n += 1;
            n - 1
        });
        start(&mut m);
        assert_eq!(m.kind(), Some(StateKind::LoadedLevel));

        m.resize(256.0, 128.0);
        m.touched(500.0, 500.0);
        assert_eq!(m.kind(), Some(StateKind::LevelWon));
    }

    #[test]
    fn level_selector_centres_artwork_and_starts_level_zero() {
        let mut m = machine(config());
        start(&mut m);
        m.transition_to(GameState::LevelSelector);

        let mut canvas = RecordingCanvas::new(100.0, 50.0);
        m.render(&mut canvas);
        let images = canvas.images();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].0, LEVEL_SELECT);
        assert_eq!(images[0].1, Rect::new(49.0, 24.0, 2.0, 2.0));

        m.touched(0.0, 0.0);
        assert_eq!(m.kind(), Some(StateKind::LoadedLevel));
    }
}
