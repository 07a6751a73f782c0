//! Fixed-rate update clock.

/// Frame time is banked and paid out in whole ticks of `step` seconds.
/// At most `max_ticks` are owed at once; a longer stall is forgotten.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f32,
    banked: f32,
    max_ticks: u32,
}

impl FixedTimestep {
    /// `hz` ticks per second, owing at most ten per frame.
    pub fn from_rate(hz: u32) -> Self {
        Self {
            step: 1.0 / hz.max(1) as f32,
            banked: 0.0,
            max_ticks: 10,
        }
    }

    /// Banks `frame_dt` seconds and returns how many ticks to run now.
    pub fn accumulate(&mut self, frame_dt: f32) -> u32 {
        let cap = self.step * self.max_ticks as f32;
        self.banked = (self.banked + frame_dt.max(0.0)).min(cap);
        let ticks = (self.banked / self.step).floor();
        self.banked -= ticks * self.step;
        ticks as u32
    }
}
