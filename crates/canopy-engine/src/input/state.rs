use std::collections::{HashMap, HashSet};

use glam::Vec2;
use indextree::NodeId;

use crate::event::{EventKind, PointerInput};

use super::types::{ButtonState, Modifiers, MouseButton, PointerType, TouchPhase, WheelDelta};

/// Pointer state for one window.
///
/// Turns platform-level changes into the sequence of [`PointerInput`]s to
/// dispatch, and remembers press targets so a release over the same node can
/// be followed by a click.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,
    /// Last known pointer position in client logical pixels.
    pointer_pos: Option<Vec2>,
    buttons_down: HashSet<MouseButton>,
    press_targets: HashMap<MouseButton, Option<NodeId>>,
}

impl InputState {
    #[inline]
    pub fn pointer_pos(&self) -> Option<Vec2> {
        self.pointer_pos
    }

    pub fn button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    fn input(&self, kind: EventKind, at: Vec2) -> PointerInput {
        PointerInput::new(kind, at).with_modifiers(self.modifiers)
    }

    /// The mouse moved: pointer move first, then mouse move.
    pub fn pointer_moved(&mut self, pos: Vec2) -> [PointerInput; 2] {
        self.pointer_pos = Some(pos);
        [
            self.input(EventKind::PointerMove, pos),
            self.input(EventKind::MouseMove, pos),
        ]
    }

    /// A mouse button changed. Repeated presses and releases of a button that
    /// is not down produce nothing.
    pub fn button(&mut self, button: MouseButton, state: ButtonState) -> Vec<PointerInput> {
        let at = self.pointer_pos.unwrap_or(Vec2::ZERO);
        let kinds = match state {
            ButtonState::Pressed if self.buttons_down.insert(button) => {
                [EventKind::PointerDown, EventKind::MouseDown]
            }
            ButtonState::Released if self.buttons_down.remove(&button) => {
                [EventKind::PointerUp, EventKind::MouseUp]
            }
            _ => return Vec::new(),
        };
        kinds
            .into_iter()
            .map(|k| self.input(k, at).with_button(button))
            .collect()
    }

    /// Runs one button change through `dispatch` in platform order: the
    /// pointer and mouse pair first, then `Click` once the whole release has
    /// been dispatched, so handlers see `PointerUp`, `MouseUp`, `Click`.
    ///
    /// `dispatch` returns the resolved target, or `None` when dispatch failed.
    pub fn button_gesture<F>(&mut self, button: MouseButton, state: ButtonState, mut dispatch: F)
    where
        F: FnMut(PointerInput) -> Option<Option<NodeId>>,
    {
        let mut click = None;
        for input in self.button(button, state) {
            let kind = input.kind;
            let Some(target) = dispatch(input) else {
                continue;
            };
            match kind {
                EventKind::PointerDown => self.record_press(button, target),
                EventKind::PointerUp => click = self.click_for_release(button, target),
                _ => {}
            }
        }
        if let Some(click) = click {
            dispatch(click);
        }
    }

    /// Remembers which node a press landed on.
    pub fn record_press(&mut self, button: MouseButton, target: Option<NodeId>) {
        self.press_targets.insert(button, target);
    }

    /// Consumes the press target for `button`. Returns a click input when the
    /// release landed on the same node as the press.
    pub fn click_for_release(&mut self, button: MouseButton, target: Option<NodeId>) -> Option<PointerInput> {
        let pressed = self.press_targets.remove(&button).flatten()?;
        if Some(pressed) != target {
            return None;
        }
        let at = self.pointer_pos.unwrap_or(Vec2::ZERO);
        Some(self.input(EventKind::Click, at).with_button(button))
    }

    /// Wheel input at the current pointer position, if it is known.
    pub fn wheel(&self, delta: WheelDelta) -> Option<PointerInput> {
        let at = self.pointer_pos?;
        Some(self.input(EventKind::Wheel, at).with_wheel(delta))
    }

    /// One touch contact update. Touches only produce pointer-family kinds.
    pub fn touch(&mut self, id: u64, phase: TouchPhase, pos: Vec2) -> PointerInput {
        let kind = match phase {
            TouchPhase::Started => EventKind::PointerDown,
            TouchPhase::Moved => EventKind::PointerMove,
            TouchPhase::Ended => EventKind::PointerUp,
            TouchPhase::Cancelled => EventKind::PointerCancel,
        };
        self.input(kind, pos)
            .with_pointer(id, PointerType::Touch)
            .with_button(MouseButton::Left)
    }

    /// Focus changed. Losing focus mid-press cancels the gesture.
    pub fn focus_changed(&mut self, focused: bool) -> Option<PointerInput> {
        self.focused = focused;
        if focused || self.buttons_down.is_empty() {
            return None;
        }
        self.buttons_down.clear();
        self.press_targets.clear();
        let at = self.pointer_pos.unwrap_or(Vec2::ZERO);
        Some(self.input(EventKind::PointerCancel, at))
    }

    /// The pointer left the window. Returns the input to hand to
    /// `Dispatcher::pointer_left`, if the pointer was inside.
    pub fn pointer_left(&mut self) -> Option<PointerInput> {
        let at = self.pointer_pos.take()?;
        Some(self.input(EventKind::MouseMove, at))
    }
}
