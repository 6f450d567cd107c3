use log::trace;

/// Identifies one pending "next frame" callback.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Host-side display refresh scheduling.
///
/// A requested frame fires once at the next refresh. Cancelling a handle
/// that is not pending is a contract violation.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;

    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Queue of requested frame callbacks, drained by the host on each refresh.
#[derive(Debug, Default)]
pub struct FrameQueue {
    next_id: u64,
    pending: Vec<FrameHandle>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, handle: FrameHandle) -> bool {
        self.pending.contains(&handle)
    }

    /// Takes every callback due at this refresh. Frames requested while the
    /// returned ones run wait for the next refresh.
    pub fn take_due(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.pending)
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending.push(handle);
        trace!("frame {} requested", handle.id());
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let Some(position) = self.pending.iter().position(|h| *h == handle)
        else {
            panic!("cancelled frame {} is not pending", handle.id());
        };
        self.pending.remove(position);
        trace!("frame {} cancelled", handle.id());
    }
}
