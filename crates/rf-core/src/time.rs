//! Frame clock
//!
//! All schedulers are polled with a monotonic timestamp in seconds. The
//! driver owns the clock and advances it once per frame; nothing in the
//! workspace reads wall time on its own.

use serde::{Deserialize, Serialize};

/// Monotonic time source, in seconds
pub trait Clock {
    fn now(&self) -> f64;
}

/// Externally advanced clock (game loop, simulator, tests)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualClock {
    now: f64,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self { now: start }
    }

    /// Advance by `delta` seconds and return the new time.
    ///
    /// Negative or non-finite deltas are ignored so the clock never runs
    /// backwards.
    pub fn advance(&mut self, delta: f64) -> f64 {
        if delta.is_finite() && delta > 0.0 {
            self.now += delta;
        }
        self.now
    }

    /// Jump forward to `time` (no-op if it lies in the past)
    pub fn advance_to(&mut self, time: f64) -> f64 {
        if time > self.now {
            self.now = time;
        }
        self.now
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> f64 {
        self.now
    }
}

/// Fixed-rate frame stepping on top of a [`ManualClock`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameRate(pub u32);

impl FrameRate {
    pub const FPS_60: Self = Self(60);

    /// Duration of one frame in seconds
    #[inline]
    pub fn frame_seconds(self) -> f64 {
        1.0 / self.0.max(1) as f64
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_60
    }
}
