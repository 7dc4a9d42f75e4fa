//! Desktop movement input: physical key map and held-key state.
//!
//! # Invariants
//! - Only key events mutate the flags; the frame loop only reads them.
//! - Last writer wins per direction; opposite directions may both be held.

pub mod direction;
pub mod state;

pub use direction::{Direction, ParseDirectionError};
pub use state::InputState;
