use glam::Vec2;

use crate::input::{Modifiers, MouseButton, PointerType, WheelDelta};

use super::EventKind;

/// Raw pointer input as delivered by the host, in client coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerInput {
    pub kind: EventKind,
    /// Position relative to the host's client area, in logical pixels.
    pub client: Vec2,
    pub button: Option<MouseButton>,
    pub pointer_id: u64,
    pub pointer_type: PointerType,
    pub modifiers: Modifiers,
    pub wheel: Option<WheelDelta>,
}

impl PointerInput {
    pub fn new(kind: EventKind, client: Vec2) -> Self {
        Self {
            kind,
            client,
            button: None,
            pointer_id: 0,
            pointer_type: PointerType::Mouse,
            modifiers: Modifiers::default(),
            wheel: None,
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = Some(button);
        self
    }

    pub fn with_pointer(mut self, pointer_id: u64, pointer_type: PointerType) -> Self {
        self.pointer_id = pointer_id;
        self.pointer_type = pointer_type;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_wheel(mut self, delta: WheelDelta) -> Self {
        self.wheel = Some(delta);
        self
    }

    /// Same input, re-labelled as `kind`.
    pub fn as_kind(mut self, kind: EventKind) -> Self {
        self.kind = kind;
        self
    }
}
