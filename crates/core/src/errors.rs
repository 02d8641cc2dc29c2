//! Bounded FIFO of error classifications raised during parsing and dispatch.

use crate::limits::ERROR_CAPACITY;
use arraydeque::{ArrayDeque, Wrapping};
use scpi_toolkit_diagnostics::{ErrorCode, ErrorReport};

/// Destination for raised error codes.
///
/// The dispatcher fans every raised error into its queue and into the
/// optional user callback through this seam; tests substitute a capturing
/// sink to observe error traffic directly.
pub trait ErrorSink {
    /// Record one error classification.
    fn raise(&mut self, code: ErrorCode);
}

impl<F: FnMut(ErrorCode)> ErrorSink for F {
    fn raise(&mut self, code: ErrorCode) {
        self(code);
    }
}

/// Fixed-capacity FIFO of [`ErrorCode`]s.
///
/// Overflow policy: when the ring is full, pushing evicts the oldest entry
/// (bounded-ring semantics), so the most recent error is never lost
/// silently. Clients observe errors in the order they occurred.
#[derive(Debug, Default)]
pub struct ErrorQueue {
    ring: ArrayDeque<ErrorCode, ERROR_CAPACITY, Wrapping>,
}

impl ErrorQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued errors.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Whether the queue holds no errors.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Append an error, evicting the oldest entry when full.
    pub fn push(&mut self, code: ErrorCode) {
        debug_assert!(code != ErrorCode::NoError, "NoError is a sentinel");
        let _evicted = self.ring.push_back(code);
    }

    /// Pop the oldest error, if any.
    pub fn pop(&mut self) -> Option<ErrorCode> {
        self.ring.pop_front()
    }

    /// Pop the oldest error paired with its readable text, or the `NoError`
    /// sentinel when the queue is empty.
    pub fn get_message(&mut self) -> ErrorReport {
        match self.pop() {
            Some(code) => ErrorReport::from_code(code),
            None => ErrorReport::no_error(),
        }
    }

    /// Drop all queued errors.
    pub fn clear(&mut self) {
        self.ring.clear();
    }
}

impl ErrorSink for ErrorQueue {
    fn raise(&mut self, code: ErrorCode) {
        self.push(code);
    }
}
