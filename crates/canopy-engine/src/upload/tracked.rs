/// A value with a dirty flag.
///
/// Starts dirty so the first consumer always sees it. Assigning an equal value
/// leaves the flag untouched.
#[derive(Debug, Clone)]
pub struct Tracked<T> {
    value: T,
    dirty: bool,
}

impl<T: PartialEq> Tracked<T> {
    pub fn new(value: T) -> Self {
        Self { value, dirty: true }
    }

    #[inline]
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Stores `value`, marking the slot dirty only if it differs from the current one.
    ///
    /// Returns whether the value changed.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.dirty = true;
        true
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    #[inline]
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Returns the dirty flag and clears it.
    #[inline]
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

impl<T: PartialEq + Default> Default for Tracked<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_dirty() {
        let mut t = Tracked::new((0u32, 0u32));
        assert!(t.is_dirty());
        assert!(t.take_dirty());
        assert!(!t.is_dirty());
    }

    #[test]
    fn equal_assignment_stays_clean() {
        let mut t = Tracked::new(3.0f32);
        t.mark_clean();
        assert!(!t.set(3.0));
        assert!(!t.is_dirty());
    }

    #[test]
    fn unequal_assignment_marks_dirty() {
        let mut t = Tracked::new((640u32, 480u32));
        t.mark_clean();
        assert!(t.set((800, 600)));
        assert_eq!(*t.get(), (800, 600));
        assert!(t.take_dirty());
        assert!(!t.take_dirty());
    }
}
