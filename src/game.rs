//! Top-level composition: clock, input and state machine.

use crate::canvas::Canvas;
use crate::config::GameConfig;
use crate::input::{InputEvent, InputQueue, MacroquadPointer};
use crate::source::AssetSource;
use crate::state::{GameState, StateMachine};
use crate::time::FixedTimestep;

pub struct Game<S> {
    clock: FixedTimestep,
    input: InputQueue,
    pointer: MacroquadPointer,
    machine: StateMachine<S>,
}

impl<S: AssetSource + Clone + 'static> Game<S> {
    pub fn new(source: S, config: GameConfig) -> Self {
        Self::with_machine(StateMachine::new(source, config))
    }

    pub fn with_machine(machine: StateMachine<S>) -> Self {
        Self {
            clock: FixedTimestep::from_rate(machine.config().update_rate),
            input: InputQueue::new(),
            pointer: MacroquadPointer::new(),
            machine,
        }
    }

    /// Enters the start screen with the configured maps.
    pub fn start(&mut self) {
        let map_paths = self.machine.config().map_paths.clone();
        self.machine.transition_to(GameState::StartScreen { map_paths });
    }

    /// Starts listening to macroquad's mouse and touch input.
    pub fn attach_input(&mut self) {
        self.pointer.attach();
    }

    pub fn detach_input(&mut self) {
        self.pointer.detach();
    }

    pub fn input_mut(&mut self) -> &mut InputQueue {
        &mut self.input
    }

    pub fn machine(&self) -> &StateMachine<S> {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut StateMachine<S> {
        &mut self.machine
    }

    /// Runs the fixed updates owed for `frame_dt` seconds, then draws once.
    pub fn frame(&mut self, frame_dt: f32, canvas: &mut dyn Canvas) {
        self.pointer.poll(&mut self.input);
        let steps = self.clock.accumulate(frame_dt);
        for _ in 0..steps {
            self.update();
        }
        self.machine.render(canvas);
    }

    fn update(&mut self) {
        for event in self.input.drain() {
            match event {
                InputEvent::PointerDown { x, y } => self.machine.touched(x, y),
                InputEvent::Resize { width, height } => self.machine.resize(width, height),
                InputEvent::PointerUp { .. } | InputEvent::PointerMove { .. } => {}
            }
        }
        self.machine.update();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::testing::RecordingCanvas;
    use crate::loader::maps::EmptyMaps;
    use crate::source::MemorySource;
    use crate::state::StateKind;

    #[test]
    fn input_waits_for_the_next_fixed_step() {
        let config = GameConfig {
            testing_bypass: true,
            empty_maps: EmptyMaps::Allow,
            ui_assets: Vec::new(),
            ..GameConfig::default()
        };
        let mut game = Game::new(MemorySource::new(), config);
        game.start();
        assert_eq!(game.machine().kind(), Some(StateKind::StartScreen));

        let mut canvas = RecordingCanvas::new(640.0, 480.0);
        game.input_mut().push(InputEvent::PointerDown { x: 1.0, y: 1.0 });
        game.frame(0.001, &mut canvas);
        assert_eq!(game.machine().kind(), Some(StateKind::StartScreen));

        game.frame(1.0 / 30.0, &mut canvas);
        assert_eq!(game.machine().kind(), Some(StateKind::LevelSelector));
        assert!(game.input_mut().drain().is_empty());
    }

    #[test]
    fn missing_maps_surface_as_error_after_one_step() {
        let config = GameConfig {
            map_paths: vec!["maps/none.json".to_owned()],
            ..GameConfig::default()
        };
        let mut game = Game::new(MemorySource::new(), config);
        game.start();
        let mut canvas = RecordingCanvas::new(640.0, 480.0);
        game.frame(1.0 / 60.0, &mut canvas);
        assert_eq!(game.machine().kind(), Some(StateKind::Error));
    }
}
