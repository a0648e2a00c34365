use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Result;
use glam::Vec2;
use indextree::NodeId;

use crate::error::SceneError;
use crate::hit::HitTester;
use crate::scene::{to_local, world_transform, SceneTree};

use super::kind::{ENTER_KINDS, LEAVE_KINDS};
use super::{EventKind, Handler, HostSurface, Phase, PointerEvent, PointerInput};

/// What happens when a handler returns an error.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum HandlerErrorPolicy {
    /// Abort the dispatch and return the error to the caller.
    #[default]
    Propagate,
    /// Log the error and keep invoking the remaining handlers.
    LogAndContinue,
}

/// Result of one dispatch.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DispatchOutcome {
    /// At least one handler (node or surface fallback) ran.
    pub handled: bool,
    /// A handler asked to suppress the host's default behavior.
    pub default_prevented: bool,
    /// The resolved hit-test node, if any.
    pub target: Option<NodeId>,
}

/// Identity of the hovered node. The serial guards against arena slot reuse.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
struct Hover {
    node: NodeId,
    serial: u64,
}

/// A node on the propagation path with everything its handlers need, captured
/// before any handler runs.
struct PathStop {
    node: NodeId,
    local: Option<Vec2>,
    payload: Option<Rc<dyn Any>>,
    capture: Option<Handler>,
    handler: Option<Handler>,
}

/// Routes pointer input through the scene: hit-test, hover tracking, then
/// capture → target → bubble over the target's hit-test ancestors.
///
/// One dispatcher per scene graph; its hover slot is never shared.
pub struct Dispatcher {
    hit: HitTester,
    hover: Option<Hover>,
    cursor: String,
    default_cursor: String,
    policy: HandlerErrorPolicy,
    surface_handlers: HashMap<EventKind, Handler>,
}

impl Dispatcher {
    pub fn new(default_cursor: impl Into<String>, policy: HandlerErrorPolicy) -> Self {
        let default_cursor = default_cursor.into();
        Self {
            hit: HitTester::new(),
            hover: None,
            cursor: default_cursor.clone(),
            default_cursor,
            policy,
            surface_handlers: HashMap::new(),
        }
    }

    /// Registers a surface-level handler that runs when nothing in the scene handles `kind`.
    pub fn set_surface_handler(&mut self, kind: EventKind, handler: Option<Handler>) {
        match handler {
            Some(h) => self.surface_handlers.insert(kind, h),
            None => self.surface_handlers.remove(&kind),
        };
    }

    /// The hovered node, if it is still part of the tree.
    pub fn hovered(&self, tree: &SceneTree) -> Option<NodeId> {
        self.hover.filter(|h| is_live(tree, h)).map(|h| h.node)
    }

    /// Cursor most recently pushed to the surface.
    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    #[inline]
    pub fn policy(&self) -> HandlerErrorPolicy {
        self.policy
    }

    /// Dispatches one raw input.
    pub fn dispatch(
        &mut self,
        tree: &mut SceneTree,
        surface: &mut dyn HostSurface,
        input: PointerInput,
    ) -> Result<DispatchOutcome> {
        if input.kind.is_synthetic() {
            return Err(SceneError::SyntheticEvent(input.kind).into());
        }

        let origin = surface.bounding_rect().origin();
        let point = input.client - origin;
        let target = self.hit.find_target(tree, point);
        log::trace!("dispatch {:?} at {point} -> {target:?}", input.kind);

        if input.kind.is_move() {
            self.update_hover(tree, surface, &input, point, target)?;
        }

        let mut outcome = self.propagate(tree, &input, point, target)?;

        if !outcome.handled {
            if let Some(fallback) = self.surface_handlers.get(&input.kind).cloned() {
                let mut event = PointerEvent::new(input.kind, input, point, target);
                event.retarget(None, None, None, Phase::Target);
                self.invoke(&fallback, &mut event, tree)?;
                outcome.handled = true;
                outcome.default_prevented |= event.is_default_prevented();
            }
        }

        Ok(outcome)
    }

    /// The pointer left the surface: leave the hovered node and reset the cursor.
    pub fn pointer_left(
        &mut self,
        tree: &mut SceneTree,
        surface: &mut dyn HostSurface,
        input: PointerInput,
    ) -> Result<()> {
        let origin = surface.bounding_rect().origin();
        let point = input.client - origin;
        self.update_hover(tree, surface, &input, point, None)
    }

    fn update_hover(
        &mut self,
        tree: &mut SceneTree,
        surface: &mut dyn HostSurface,
        input: &PointerInput,
        point: Vec2,
        target: Option<NodeId>,
    ) -> Result<()> {
        let next = target.and_then(|id| {
            tree.get(id).map(|n| Hover {
                node: id,
                serial: n.serial(),
            })
        });
        let previous = self.hover;
        if previous == next {
            return Ok(());
        }

        self.hover = next;
        self.push_cursor(tree, surface);

        if let Some(prev) = previous.filter(|h| is_live(tree, h)) {
            for kind in LEAVE_KINDS {
                self.fire_direct(tree, prev.node, kind, input, point)?;
            }
        }
        if let Some(next) = next {
            for kind in ENTER_KINDS {
                if !is_live(tree, &next) {
                    break;
                }
                self.fire_direct(tree, next.node, kind, input, point)?;
            }
        }
        Ok(())
    }

    fn push_cursor(&mut self, tree: &SceneTree, surface: &mut dyn HostSurface) {
        let cursor = self
            .hovered(tree)
            .and_then(|id| tree.hit_test(id).ok())
            .and_then(|h| h.cursor.clone())
            .unwrap_or_else(|| self.default_cursor.clone());
        surface.set_cursor(&cursor);
        self.cursor = cursor;
    }

    /// Invokes `node`'s own handler for an enter/leave kind, without propagation.
    fn fire_direct(
        &self,
        tree: &mut SceneTree,
        node: NodeId,
        kind: EventKind,
        input: &PointerInput,
        point: Vec2,
    ) -> Result<()> {
        let Ok(hit) = tree.hit_test(node) else {
            return Ok(());
        };
        let Some(handler) = hit.handler(kind) else {
            return Ok(());
        };
        let payload = hit.payload();
        let local = to_local(&world_transform(tree, node), point);

        let mut event = PointerEvent::new(kind, input.as_kind(kind), point, Some(node));
        event.retarget(Some(node), local, payload, Phase::Target);
        self.invoke(&handler, &mut event, tree)
    }

    /// Capture → target → bubble for `input.kind` over the hit-test ancestors of `target`.
    fn propagate(
        &self,
        tree: &mut SceneTree,
        input: &PointerInput,
        point: Vec2,
        target: Option<NodeId>,
    ) -> Result<DispatchOutcome> {
        let mut outcome = DispatchOutcome {
            target,
            ..DispatchOutcome::default()
        };
        let Some(target) = target else {
            return Ok(outcome);
        };

        let kind = input.kind;
        let path = snapshot_path(tree, target, kind, point);
        let Some((target_stop, ancestors)) = path.split_last() else {
            return Ok(outcome);
        };

        let mut sequence: Vec<(&PathStop, Phase, &Handler)> = Vec::new();
        for stop in ancestors {
            if let Some(h) = &stop.capture {
                sequence.push((stop, Phase::Capture, h));
            }
        }
        if let Some(h) = &target_stop.capture {
            sequence.push((target_stop, Phase::Target, h));
        }
        if let Some(h) = &target_stop.handler {
            sequence.push((target_stop, Phase::Target, h));
        }
        for stop in ancestors.iter().rev() {
            if let Some(h) = &stop.handler {
                sequence.push((stop, Phase::Bubble, h));
            }
        }

        let mut event = PointerEvent::new(kind, *input, point, Some(target));
        for (stop, phase, handler) in sequence {
            event.retarget(Some(stop.node), stop.local, stop.payload.clone(), phase);
            self.invoke(handler, &mut event, tree)?;
            outcome.handled = true;
            if event.is_propagation_stopped() {
                log::trace!("{kind:?} propagation stopped at {}", stop.node);
                break;
            }
        }
        outcome.default_prevented = event.is_default_prevented();
        Ok(outcome)
    }

    fn invoke(&self, handler: &Handler, event: &mut PointerEvent, tree: &mut SceneTree) -> Result<()> {
        match handler(event, tree) {
            Ok(()) => Ok(()),
            Err(err) => match self.policy {
                HandlerErrorPolicy::Propagate => {
                    Err(err.context(format!("{:?} handler failed", event.kind())))
                }
                HandlerErrorPolicy::LogAndContinue => {
                    log::error!("{:?} handler failed: {err:#}", event.kind());
                    Ok(())
                }
            },
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new("default", HandlerErrorPolicy::default())
    }
}

fn is_live(tree: &SceneTree, hover: &Hover) -> bool {
    tree.get(hover.node).is_some_and(|n| n.serial() == hover.serial)
}

/// Root-to-target chain of hit-test nodes with their handlers for `kind`.
fn snapshot_path(tree: &SceneTree, target: NodeId, kind: EventKind, point: Vec2) -> Vec<PathStop> {
    tree.path_from_root(target)
        .into_iter()
        .filter_map(|id| {
            let hit = tree.hit_test(id).ok()?;
            Some(PathStop {
                node: id,
                local: to_local(&world_transform(tree, id), point),
                payload: hit.payload(),
                capture: hit.capture_handler(kind),
                handler: hit.handler(kind),
            })
        })
        .collect()
}
