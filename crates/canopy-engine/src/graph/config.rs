use crate::coords::ColorRgba;
use crate::event::HandlerErrorPolicy;

/// Per-surface scene settings.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Color the surface is cleared to before each frame.
    pub clear_color: ColorRgba,
    /// Cursor shown when no hovered node names one.
    pub default_cursor: String,
    pub handler_errors: HandlerErrorPolicy,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            clear_color: ColorRgba::TRANSPARENT,
            default_cursor: "default".to_owned(),
            handler_errors: HandlerErrorPolicy::Propagate,
        }
    }
}
