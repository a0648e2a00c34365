use std::any::Any;
use std::rc::Rc;

use glam::Vec2;
use indextree::NodeId;

use super::{EventKind, PointerInput};

/// Propagation phase a handler is running in.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Phase {
    /// Ancestors of the target, root first.
    Capture,
    /// The target itself (and surface fallbacks).
    Target,
    /// Ancestors of the target, parent first.
    Bubble,
}

/// Event object handed to handlers.
///
/// Handlers may stop propagation or prevent the default action; the dispatcher
/// reads both flags after each handler returns.
pub struct PointerEvent {
    kind: EventKind,
    input: PointerInput,
    point: Vec2,
    local: Option<Vec2>,
    target: Option<NodeId>,
    current: Option<NodeId>,
    phase: Phase,
    payload: Option<Rc<dyn Any>>,
    propagation_stopped: bool,
    default_prevented: bool,
}

impl PointerEvent {
    pub(crate) fn new(kind: EventKind, input: PointerInput, point: Vec2, target: Option<NodeId>) -> Self {
        Self {
            kind,
            input,
            point,
            local: None,
            target,
            current: None,
            phase: Phase::Target,
            payload: None,
            propagation_stopped: false,
            default_prevented: false,
        }
    }

    /// Points the event at the node whose handler runs next.
    pub(crate) fn retarget(
        &mut self,
        current: Option<NodeId>,
        local: Option<Vec2>,
        payload: Option<Rc<dyn Any>>,
        phase: Phase,
    ) {
        self.current = current;
        self.local = local;
        self.payload = payload;
        self.phase = phase;
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// The raw input this event was built from.
    #[inline]
    pub fn input(&self) -> &PointerInput {
        &self.input
    }

    /// Position relative to the drawing surface's top-left, in logical pixels.
    #[inline]
    pub fn point(&self) -> Vec2 {
        self.point
    }

    /// Position in the current node's local space. `None` for surface handlers.
    #[inline]
    pub fn local_point(&self) -> Option<Vec2> {
        self.local
    }

    /// Node the event was resolved to.
    #[inline]
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// Node whose handler is running.
    #[inline]
    pub fn current_target(&self) -> Option<NodeId> {
        self.current
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The current node's payload, if it has one of type `T`.
    pub fn payload<T: 'static>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref::<T>()
    }

    pub fn payload_any(&self) -> Option<&Rc<dyn Any>> {
        self.payload.as_ref()
    }

    #[inline]
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    #[inline]
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    #[inline]
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    #[inline]
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

impl std::fmt::Debug for PointerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerEvent")
            .field("kind", &self.kind)
            .field("point", &self.point)
            .field("local", &self.local)
            .field("target", &self.target)
            .field("current", &self.current)
            .field("phase", &self.phase)
            .field("propagation_stopped", &self.propagation_stopped)
            .field("default_prevented", &self.default_prevented)
            .finish()
    }
}
