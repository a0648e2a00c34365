use crate::coords::{Bounds, Viewport};

/// The host-side drawing surface a scene graph renders into and receives input from.
pub trait HostSurface {
    /// Surface rectangle in the same client space pointer input is reported in.
    fn bounding_rect(&self) -> Bounds;

    /// Physical pixels per logical pixel.
    fn device_pixel_ratio(&self) -> f32;

    /// Sets the cursor shown over the surface (`"default"`, `"pointer"`, ...).
    fn set_cursor(&mut self, cursor: &str);

    /// Logical size of the surface.
    fn viewport(&self) -> Viewport {
        let r = self.bounding_rect();
        Viewport::new(r.width, r.height)
    }

    /// Backing buffer size in physical pixels.
    fn backing_size(&self) -> (u32, u32) {
        self.viewport().backing_size(self.device_pixel_ratio())
    }
}
