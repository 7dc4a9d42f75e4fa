use crate::Direction;
use winit::keyboard::KeyCode;

/// Which movement keys are currently held.
///
/// Updated synchronously from key-down / key-up callbacks and read once per
/// frame. There is no queue: only the latest state per direction matters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key(&mut self, direction: Direction, pressed: bool) {
        let flag = match direction {
            Direction::Forward => &mut self.forward,
            Direction::Backward => &mut self.backward,
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
        };
        if *flag != pressed {
            tracing::trace!(%direction, pressed, "movement key");
        }
        *flag = pressed;
    }

    /// Route a physical key event. Returns the direction it was bound to, or
    /// `None` (and leaves the state untouched) for unbound keys.
    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) -> Option<Direction> {
        let direction = Direction::from_key_code(key)?;
        self.set_key(direction, pressed);
        Some(direction)
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        match direction {
            Direction::Forward => self.forward,
            Direction::Backward => self.backward,
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn any_held(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    /// Directions currently held, in `Direction::ALL` order.
    pub fn held(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|d| self.is_held(*d))
    }

    /// Drop every held key, e.g. when the window loses focus and key-up
    /// events would otherwise be missed.
    pub fn release_all(&mut self) {
        *self = Self::default();
    }
}
