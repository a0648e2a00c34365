use glam::Mat4;

/// Viewport size in logical pixels.
///
/// Shaders receive [`Viewport::projection`] to map logical px positions to clip space.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Size of the backing buffer in physical pixels for the given device pixel ratio.
    ///
    /// Never returns a zero dimension.
    pub fn backing_size(self, device_pixel_ratio: f32) -> (u32, u32) {
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        let w = (self.width * dpr).round().max(1.0) as u32;
        let h = (self.height * dpr).round().max(1.0) as u32;
        (w, h)
    }

    /// Orthographic projection from logical pixels (top-left origin, +Y down) to clip space.
    pub fn projection(self) -> Mat4 {
        let w = self.width.max(1.0);
        let h = self.height.max(1.0);
        Mat4::orthographic_rh(0.0, w, h, 0.0, -1.0, 1.0)
    }
}
