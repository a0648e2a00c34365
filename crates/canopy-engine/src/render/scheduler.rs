/// Host hook that asks for one refresh callback.
pub trait FrameRequester {
    fn request_frame(&self);
}

/// Coalesces redraw requests: however many arrive before the host's refresh
/// callback, the host is asked exactly once.
pub struct RenderScheduler {
    pending: bool,
    requester: Box<dyn FrameRequester>,
}

impl RenderScheduler {
    pub fn new(requester: Box<dyn FrameRequester>) -> Self {
        Self {
            pending: false,
            requester,
        }
    }

    /// Returns `true` if this call asked the host for a frame.
    pub fn request_redraw(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        self.requester.request_frame();
        true
    }

    /// The host scheduled a refresh on its own; treat it as requested
    /// without asking again.
    #[inline]
    pub fn mark_pending(&mut self) {
        self.pending = true;
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Called at the start of the refresh callback. Returns whether a frame was pending.
    #[inline]
    pub fn take_pending(&mut self) -> bool {
        std::mem::replace(&mut self.pending, false)
    }
}

impl std::fmt::Debug for RenderScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}
