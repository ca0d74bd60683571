//! Frame clock - turns host timestamps into a bounded per-frame delta.
//!
//! The host calls [`Clock::frame`] from its own scheduler (a render loop,
//! a timer, a test). The clock never sleeps or spawns anything itself.

use std::time::{Duration, Instant};

/// Largest delta handed to systems in one frame. A host that was suspended
/// resumes with at most this much simulated time.
pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(100);

/// Upper bound for [`Clock::set_time_scale`]. A scaled frame delta is at
/// most `MAX_FRAME_DELTA * MAX_TIME_SCALE`.
pub const MAX_TIME_SCALE: f32 = 10.0;

/// Anything driven once per frame
pub trait Updatable {
    fn update(&mut self, dt: Duration);
}

#[derive(Debug, Clone)]
pub struct Clock {
    running: bool,
    last_tick: Option<Instant>,
    frames: u64,
    elapsed: Duration,
    time_scale: f32,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            running: false,
            last_tick: None,
            frames: 0,
            elapsed: Duration::ZERO,
            time_scale: 1.0,
        }
    }

    /// Begin ticking from `now`. No-op if already running.
    pub fn start(&mut self, now: Instant) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_tick = Some(now);
    }

    /// Stop ticking. Whatever the systems hold is left as is; a later
    /// `start` resumes from there.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Compute this frame's delta, or `None` while stopped
    pub fn advance(&mut self, now: Instant) -> Option<Duration> {
        if !self.running {
            return None;
        }

        let last = self.last_tick.unwrap_or(now);
        let raw = now.saturating_duration_since(last);
        self.last_tick = Some(now.max(last));

        let mut dt = raw.min(MAX_FRAME_DELTA);
        if self.time_scale != 1.0 {
            dt = dt.mul_f32(self.time_scale);
        }

        self.frames += 1;
        self.elapsed += dt;
        Some(dt)
    }

    /// Advance and run every system, in slice order, with the same delta
    pub fn frame(&mut self, now: Instant, systems: &mut [&mut dyn Updatable]) -> Option<Duration> {
        let dt = self.advance(now)?;
        for system in systems.iter_mut() {
            system.update(dt);
        }
        Some(dt)
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, 0.0 = frozen).
    ///
    /// Clamped to `[0, MAX_TIME_SCALE]`; NaN resets to 1.0.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_nan() {
            1.0
        } else {
            scale.clamp(0.0, MAX_TIME_SCALE)
        };
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Frames run since creation
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Total delta handed out since creation
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
