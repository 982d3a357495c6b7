//! Frame rate telemetry.

use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

/// Rolling frames-per-second estimate, recomputed once per elapsed second
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window_frames: u32,
    total_frames: u64,
    window_start: Instant,
    fps: f64,
}

impl FpsCounter {
    /// Counter starting now
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Counter whose first window opens at `start`
    pub fn starting_at(start: Instant) -> Self {
        Self {
            window_frames: 0,
            total_frames: 0,
            window_start: start,
            fps: 0.0,
        }
    }

    /// Count one frame now; returns the new rate when a window closed
    pub fn tick(&mut self) -> Option<f64> {
        self.tick_at(Instant::now())
    }

    /// Count one frame at `now`
    pub fn tick_at(&mut self, now: Instant) -> Option<f64> {
        self.window_frames += 1;
        self.total_frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < WINDOW {
            return None;
        }
        self.fps = self.window_frames as f64 / elapsed.as_secs_f64();
        self.window_frames = 0;
        self.window_start = now;
        Some(self.fps)
    }

    /// Latest estimate
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Frames counted since the last reset
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Clear all counts and open a new window now
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}
