//! Platform-agnostic pointer input.
//!
//! The window runtime translates platform events into calls on [`InputState`],
//! which produces the [`PointerInput`](crate::event::PointerInput)s the scene
//! dispatches.

mod state;
mod types;

pub use state::InputState;
pub use types::{ButtonState, Modifiers, MouseButton, PointerType, TouchPhase, WheelDelta};
