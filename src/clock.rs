use serde::{Deserialize, Serialize};

/// Timing information for one tick of the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameTiming {
    /// Seconds since the first tick.
    pub elapsed: f64,
    /// Seconds since the previous tick; zero on the first tick.
    pub delta: f64,
}

/// Derives per-tick timing from host-supplied timestamps.
///
/// The host feeds the refresh-signal timestamp into [`FrameClock::advance`];
/// the clock never reads a global time source, which keeps frame-dependent
/// animation deterministic under test.
#[derive(Debug, Default)]
pub struct FrameClock {
    epoch: Option<f64>,
    last: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a timestamp (seconds) into elapsed/delta timing. The first
    /// sample establishes the epoch. A sample earlier than the previous
    /// one yields a zero delta rather than a negative step.
    pub fn advance(&mut self, now_seconds: f64) -> FrameTiming {
        let epoch = *self.epoch.get_or_insert(now_seconds);
        let elapsed = (now_seconds - epoch).max(0.0);
        let delta = (elapsed - self.last).max(0.0);
        self.last = elapsed;
        FrameTiming { elapsed, delta }
    }
}
