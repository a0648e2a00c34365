/// Pointer event kinds a hit-test node can handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EventKind {
    PointerDown,
    PointerUp,
    PointerMove,
    PointerEnter,
    PointerLeave,
    PointerCancel,
    MouseDown,
    MouseUp,
    MouseMove,
    MouseEnter,
    MouseLeave,
    Click,
    Wheel,
}

impl EventKind {
    pub const ALL: [EventKind; 13] = [
        EventKind::PointerDown,
        EventKind::PointerUp,
        EventKind::PointerMove,
        EventKind::PointerEnter,
        EventKind::PointerLeave,
        EventKind::PointerCancel,
        EventKind::MouseDown,
        EventKind::MouseUp,
        EventKind::MouseMove,
        EventKind::MouseEnter,
        EventKind::MouseLeave,
        EventKind::Click,
        EventKind::Wheel,
    ];

    /// Move kinds drive hover tracking.
    #[inline]
    pub fn is_move(self) -> bool {
        matches!(self, EventKind::PointerMove | EventKind::MouseMove)
    }

    /// Enter/leave kinds are only ever produced by hover tracking.
    #[inline]
    pub fn is_synthetic(self) -> bool {
        matches!(
            self,
            EventKind::PointerEnter
                | EventKind::PointerLeave
                | EventKind::MouseEnter
                | EventKind::MouseLeave
        )
    }
}

/// Kinds fired on the previously hovered node, in order, when hover moves away.
pub(crate) const LEAVE_KINDS: [EventKind; 2] = [EventKind::PointerLeave, EventKind::MouseLeave];

/// Kinds fired on the newly hovered node, in order.
pub(crate) const ENTER_KINDS: [EventKind; 2] = [EventKind::PointerEnter, EventKind::MouseEnter];
