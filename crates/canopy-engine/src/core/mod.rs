//! Contract between the window runtime and the application.
//!
//! The runtime owns windows, GPU backends and scenes; the application builds
//! its scene once in [`App::mount`] and reacts to frames and window events.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, MountCtx};
