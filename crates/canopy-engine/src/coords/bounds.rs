use super::Vec2;

/// Axis-aligned rectangle in a node's local space (top-left origin, +Y down).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub const fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    #[inline]
    pub fn origin(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    #[inline]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// True when the rectangle covers no area. Negative extents count as empty.
    #[inline]
    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Half-open containment: `[x, x + width) × [y, y + height)`.
    ///
    /// Empty bounds contain nothing, so adjacent nodes sharing an edge never
    /// both match the same point.
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        if self.is_empty() {
            return false;
        }
        p.x >= self.x && p.y >= self.y && p.x < self.x + self.width && p.y < self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(x: f32, y: f32, w: f32, h: f32) -> Bounds { Bounds::new(x, y, w, h) }

    // ── contains ──────────────────────────────────────────────────────────

    #[test]
    fn contains_interior_point() {
        assert!(b(10.0, 10.0, 50.0, 30.0).contains(Vec2::new(35.0, 25.0)));
    }

    #[test]
    fn contains_top_left_inclusive() {
        assert!(b(10.0, 10.0, 50.0, 30.0).contains(Vec2::new(10.0, 10.0)));
    }

    #[test]
    fn contains_far_corner_exclusive() {
        assert!(!b(10.0, 10.0, 50.0, 30.0).contains(Vec2::new(60.0, 40.0)));
        assert!(!b(10.0, 10.0, 50.0, 30.0).contains(Vec2::new(60.0, 20.0)));
        assert!(!b(10.0, 10.0, 50.0, 30.0).contains(Vec2::new(20.0, 40.0)));
    }

    #[test]
    fn contains_outside() {
        assert!(!b(10.0, 10.0, 50.0, 30.0).contains(Vec2::new(100.0, 100.0)));
        assert!(!b(10.0, 10.0, 50.0, 30.0).contains(Vec2::new(9.9, 20.0)));
    }

    #[test]
    fn shared_edge_matches_only_one_side() {
        let left = b(0.0, 0.0, 10.0, 10.0);
        let right = b(10.0, 0.0, 10.0, 10.0);
        let p = Vec2::new(10.0, 5.0);
        assert!(!left.contains(p));
        assert!(right.contains(p));
    }

    // ── is_empty ──────────────────────────────────────────────────────────

    #[test]
    fn zero_size_never_matches() {
        assert!(!b(5.0, 5.0, 0.0, 10.0).contains(Vec2::new(5.0, 5.0)));
        assert!(!b(5.0, 5.0, 10.0, 0.0).contains(Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn negative_size_is_empty() {
        assert!(b(0.0, 0.0, -4.0, 5.0).is_empty());
        assert!(!b(0.0, 0.0, -4.0, 5.0).contains(Vec2::new(-1.0, 1.0)));
    }

    #[test]
    fn is_empty_positive_size() {
        assert!(!b(0.0, 0.0, 1.0, 1.0).is_empty());
    }
}
