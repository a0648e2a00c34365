//! Pointer events: kinds, raw input, handler registration and dispatch.

mod dispatcher;
mod input;
mod kind;
mod pointer;
mod surface;
mod target;

pub use dispatcher::{DispatchOutcome, Dispatcher, HandlerErrorPolicy};
pub use input::PointerInput;
pub use kind::EventKind;
pub use pointer::{Phase, PointerEvent};
pub use surface::HostSurface;
pub use target::{handler, Handler, HitTestNode};
