use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

/// A movement direction relative to where the camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown direction {0:?} (expected forward, backward, left or right)")]
pub struct ParseDirectionError(pub String);

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Forward,
        Direction::Backward,
        Direction::Left,
        Direction::Right,
    ];

    /// Map a physical key to a direction. WASD and the arrow keys are bound;
    /// everything else is `None`.
    pub fn from_key_code(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => Some(Self::Forward),
            KeyCode::KeyS | KeyCode::ArrowDown => Some(Self::Backward),
            KeyCode::KeyA | KeyCode::ArrowLeft => Some(Self::Left),
            KeyCode::KeyD | KeyCode::ArrowRight => Some(Self::Right),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "w" => Ok(Self::Forward),
            "backward" | "back" | "s" => Ok(Self::Backward),
            "left" | "a" => Ok(Self::Left),
            "right" | "d" => Ok(Self::Right),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasd_and_arrows_are_bound() {
        assert_eq!(Direction::from_key_code(KeyCode::KeyW), Some(Direction::Forward));
        assert_eq!(Direction::from_key_code(KeyCode::ArrowUp), Some(Direction::Forward));
        assert_eq!(Direction::from_key_code(KeyCode::KeyS), Some(Direction::Backward));
        assert_eq!(Direction::from_key_code(KeyCode::ArrowDown), Some(Direction::Backward));
        assert_eq!(Direction::from_key_code(KeyCode::KeyA), Some(Direction::Left));
        assert_eq!(Direction::from_key_code(KeyCode::ArrowLeft), Some(Direction::Left));
        assert_eq!(Direction::from_key_code(KeyCode::KeyD), Some(Direction::Right));
        assert_eq!(Direction::from_key_code(KeyCode::ArrowRight), Some(Direction::Right));
    }

    #[test]
    fn other_keys_are_unbound() {
        for key in [KeyCode::KeyQ, KeyCode::Space, KeyCode::Escape, KeyCode::ShiftLeft] {
            assert_eq!(Direction::from_key_code(key), None);
        }
    }

    #[test]
    fn parse_names_and_letters() {
        assert_eq!("forward".parse::<Direction>().unwrap(), Direction::Forward);
        assert_eq!("Back".parse::<Direction>().unwrap(), Direction::Backward);
        assert_eq!("a".parse::<Direction>().unwrap(), Direction::Left);
        assert_eq!(" right ".parse::<Direction>().unwrap(), Direction::Right);
        assert!("up".parse::<Direction>().is_err());
    }

    #[test]
    fn display_roundtrips_through_parse() {
        for d in Direction::ALL {
            assert_eq!(d.to_string().parse::<Direction>().unwrap(), d);
        }
    }
}
