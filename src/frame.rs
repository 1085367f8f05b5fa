// SPDX-License-Identifier: MPL-2.0

//! Per-frame timing and viewport state.

use std::time::{Duration, Instant};

/// Everything an update or draw call needs to know about the current frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameContext {
    /// Seconds elapsed since the previous frame.
    pub dt: f32,
    pub frame_index: u64,
    pub viewport: Viewport,
}

impl FrameContext {
    pub fn new(dt: f32, viewport: Viewport) -> Self {
        Self {
            dt,
            frame_index: 0,
            viewport,
        }
    }
}

/// The size, in physical pixels, of the surface being rendered to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height, or 1 for a zero-height (minimized) viewport.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }

        self.width as f32 / self.height as f32
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

/// Produces a [`FrameContext`] for every frame.
///
/// Delta times are clamped so that a stall (a debugger pause, a dragged window) does not turn into
/// one enormous step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);

        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the baseline so the next tick does not include time spent suspended.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self, viewport: Viewport) -> FrameContext {
        self.tick_at(Instant::now(), viewport)
    }

    fn tick_at(&mut self, now: Instant, viewport: Viewport) -> FrameContext {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let frame = FrameContext {
            dt: dt.as_secs_f32(),
            frame_index: self.frame_index,
            viewport,
        };
        self.frame_index = self.frame_index.wrapping_add(1);

        frame
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn aspect_guards_zero_height() {
        assert_relative_eq!(Viewport::new(1920, 1080).aspect(), 16.0 / 9.0);
        assert_eq!(Viewport::new(1920, 0).aspect(), 1.0);
    }

    #[test]
    fn tick_clamps_and_counts() {
        let mut clock =
            FrameClock::with_clamps(Duration::from_millis(1), Duration::from_millis(100));
        let start = clock.last;
        let viewport = Viewport::new(640, 480);

        let first = clock.tick_at(start + Duration::from_secs(5), viewport);
        assert_relative_eq!(first.dt, 0.1, epsilon = 1e-6);
        assert_eq!(first.frame_index, 0);

        let second = clock.tick_at(start + Duration::from_secs(5), viewport);
        assert_relative_eq!(second.dt, 0.001, epsilon = 1e-6);
        assert_eq!(second.frame_index, 1);
        assert_eq!(second.viewport, viewport);
    }
}
