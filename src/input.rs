// SPDX-License-Identifier: MPL-2.0

//! Movement and pointer input, queued between frames.
//!
//! The windowing layer feeds events into an [`InputState`] as they arrive; once per frame the
//! accumulated deltas are drained into a [`FrameInput`] that the camera consumes.

use crate::linear::Vec2;

/// A movement direction, relative to the camera's facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

/// Which movement directions are held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MovementInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl MovementInput {
    pub fn set(&mut self, movement: Movement, held: bool) {
        let slot = match movement {
            Movement::Forward => &mut self.forward,
            Movement::Backward => &mut self.backward,
            Movement::Left => &mut self.left,
            Movement::Right => &mut self.right,
            Movement::Up => &mut self.up,
            Movement::Down => &mut self.down,
        };
        *slot = held;
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

/// The input for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub movement: MovementInput,
    /// Pointer motion since the previous frame, in pixels. +X is right and +Y is down.
    pub pointer: Vec2,
    /// Scroll since the previous frame, in lines. Positive scrolls away from the user.
    pub scroll: f32,
}

/// Input accumulated between frames.
#[derive(Clone, Debug, Default)]
pub struct InputState {
    movement: MovementInput,
    pointer: Vec2,
    scroll: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, movement: Movement) {
        self.movement.set(movement, true);
    }

    pub fn release(&mut self, movement: Movement) {
        self.movement.set(movement, false);
    }

    /// Adds relative pointer motion.
    pub fn pointer_moved(&mut self, dx: f32, dy: f32) {
        self.pointer += Vec2::new(dx, dy);
    }

    /// Adds the offset of an absolute pointer position from the point the cursor is re-centered
    /// to every frame.
    pub fn pointer_moved_to(&mut self, x: f32, y: f32, center: (f32, f32)) {
        self.pointer_moved(x - center.0, y - center.1);
    }

    pub fn scrolled(&mut self, lines: f32) {
        self.scroll += lines;
    }

    /// Releases everything, e.g. when the window loses focus mid-press.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Drains the accumulated pointer and scroll deltas. Held movement stays held.
    pub fn take_frame(&mut self) -> FrameInput {
        let frame = FrameInput {
            movement: self.movement,
            pointer: self.pointer,
            scroll: self.scroll,
        };
        self.pointer = Vec2::ZERO;
        self.scroll = 0.0;

        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_are_drained_but_keys_stay_held() {
        let mut input = InputState::new();
        input.press(Movement::Forward);
        input.pointer_moved(3.0, -1.0);
        input.pointer_moved(1.0, 1.0);
        input.scrolled(2.0);

        let frame = input.take_frame();
        assert!(frame.movement.forward);
        assert_eq!(frame.pointer, Vec2::new(4.0, 0.0));
        assert_eq!(frame.scroll, 2.0);

        let frame = input.take_frame();
        assert!(frame.movement.forward);
        assert_eq!(frame.pointer, Vec2::ZERO);
        assert_eq!(frame.scroll, 0.0);
    }

    #[test]
    fn recentered_pointer() {
        let mut input = InputState::new();
        input.pointer_moved_to(970.0, 530.0, (960.0, 540.0));

        assert_eq!(input.take_frame().pointer, Vec2::new(10.0, -10.0));
    }

    #[test]
    fn release_and_clear() {
        let mut input = InputState::new();
        input.press(Movement::Left);
        input.press(Movement::Up);
        input.release(Movement::Left);

        let frame = input.take_frame();
        assert!(!frame.movement.left);
        assert!(frame.movement.up);

        input.clear();
        assert!(input.take_frame().movement.is_idle());
    }
}
