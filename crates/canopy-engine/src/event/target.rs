use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::coords::Bounds;
use crate::scene::SceneTree;

use super::{EventKind, PointerEvent};

/// Event handler. Receives the event and the tree, which it may mutate.
pub type Handler = Rc<dyn Fn(&mut PointerEvent, &mut SceneTree) -> anyhow::Result<()>>;

/// Wraps a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut PointerEvent, &mut SceneTree) -> anyhow::Result<()> + 'static,
{
    Rc::new(f)
}

/// Interactive region of the scene.
///
/// `bounds` are axis-aligned in the node's local space; the node's transform (and
/// its ancestors') place them in the scene.
#[derive(Default)]
pub struct HitTestNode {
    pub bounds: Bounds,
    /// Cursor name shown while hovered (`"pointer"`, `"text"`, ...).
    pub cursor: Option<String>,
    payload: Option<Rc<dyn Any>>,
    handlers: HashMap<EventKind, Handler>,
    capture_handlers: HashMap<EventKind, Handler>,
}

impl HitTestNode {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    /// Attaches an opaque value handed to handlers unchanged.
    pub fn with_payload<T: 'static>(mut self, payload: T) -> Self {
        self.payload = Some(Rc::new(payload));
        self
    }

    /// Registers the target/bubble handler for `kind`.
    pub fn on<F>(mut self, kind: EventKind, f: F) -> Self
    where
        F: Fn(&mut PointerEvent, &mut SceneTree) -> anyhow::Result<()> + 'static,
    {
        self.handlers.insert(kind, handler(f));
        self
    }

    /// Registers the capture-phase handler for `kind`.
    pub fn on_capture<F>(mut self, kind: EventKind, f: F) -> Self
    where
        F: Fn(&mut PointerEvent, &mut SceneTree) -> anyhow::Result<()> + 'static,
    {
        self.capture_handlers.insert(kind, handler(f));
        self
    }

    /// Replaces (or clears, with `None`) the target/bubble handler for `kind`.
    pub fn set_handler(&mut self, kind: EventKind, handler: Option<Handler>) {
        match handler {
            Some(h) => self.handlers.insert(kind, h),
            None => self.handlers.remove(&kind),
        };
    }

    pub fn set_capture_handler(&mut self, kind: EventKind, handler: Option<Handler>) {
        match handler {
            Some(h) => self.capture_handlers.insert(kind, h),
            None => self.capture_handlers.remove(&kind),
        };
    }

    pub fn set_payload(&mut self, payload: Option<Rc<dyn Any>>) {
        self.payload = payload;
    }

    pub fn handler(&self, kind: EventKind) -> Option<Handler> {
        self.handlers.get(&kind).cloned()
    }

    pub fn capture_handler(&self, kind: EventKind) -> Option<Handler> {
        self.capture_handlers.get(&kind).cloned()
    }

    pub fn payload(&self) -> Option<Rc<dyn Any>> {
        self.payload.clone()
    }
}

impl fmt::Debug for HitTestNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HitTestNode")
            .field("bounds", &self.bounds)
            .field("cursor", &self.cursor)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("capture_handlers", &self.capture_handlers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
