use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared stop flag. Clones observe the same flag, so any holder can stop
/// the loop, even from inside a frame.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub u64);

/// Source of display-refresh callbacks
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameId;
    fn cancel_frame(&mut self, id: FrameId);
}

/// One pending request, replaced by each new request. The Bevy plugin takes
/// it once per `Update`.
#[derive(Debug, Default)]
pub struct DisplayScheduler {
    next: u64,
    pending: Option<FrameId>,
}

impl DisplayScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_pending(&mut self) -> Option<FrameId> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<FrameId> {
        self.pending
    }
}

impl FrameScheduler for DisplayScheduler {
    fn request_frame(&mut self) -> FrameId {
        self.next += 1;
        let id = FrameId(self.next);
        self.pending = Some(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        if self.pending == Some(id) {
            self.pending = None;
        }
    }
}

/// Queue of requested frames driven by hand (headless runs, tests)
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next: u64,
    queue: VecDeque<FrameId>,
    requested: u64,
    cancelled: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest outstanding request
    pub fn next_frame(&mut self) -> Option<FrameId> {
        self.queue.pop_front()
    }

    pub fn outstanding(&self) -> usize {
        self.queue.len()
    }

    pub fn requested(&self) -> u64 {
        self.requested
    }

    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameId {
        self.next += 1;
        self.requested += 1;
        let id = FrameId(self.next);
        self.queue.push_back(id);
        id
    }

    fn cancel_frame(&mut self, id: FrameId) {
        let before = self.queue.len();
        self.queue.retain(|&f| f != id);
        if self.queue.len() != before {
            self.cancelled += 1;
        }
    }
}
