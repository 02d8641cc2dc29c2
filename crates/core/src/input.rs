//! Byte-level input collection: the fixed message buffer and the
//! collection-window timeout.
//!
//! Bytes arrive in arbitrary chunks from a transport the core does not own.
//! [`LineCollector`] accumulates them until a `\n` terminator, reporting
//! overflow when a line exceeds the buffer, and [`TimeoutGuard`] bounds how
//! long a started line may remain unterminated. Neither allocates.

use crate::limits::{DEFAULT_TIMEOUT_MS, MESSAGE_CAPACITY};
use arrayvec::ArrayVec;
use std::time::{Duration, Instant};

// ── TimeoutGuard ────────────────────────────────────────────────────────

/// Tracks the deadline of one input-collection window.
///
/// Armed when the first byte of a new line arrives; disarmed when the line
/// completes or is abandoned. While idle (disarmed) no timeout applies.
/// The clock is passed in explicitly so hosts and tests can drive it
/// deterministically.
#[derive(Debug)]
pub struct TimeoutGuard {
    timeout: Duration,
    armed_at: Option<Instant>,
}

impl TimeoutGuard {
    /// Guard with the given deadline.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            armed_at: None,
        }
    }

    /// Change the deadline for subsequent windows.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// The configured deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start the window at `now`. No-op if already armed: the window is
    /// anchored to its first byte, not refreshed per byte.
    pub fn arm(&mut self, now: Instant) {
        self.armed_at.get_or_insert(now);
    }

    /// End the window.
    pub fn disarm(&mut self) {
        self.armed_at = None;
    }

    /// Whether a window is currently open.
    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    /// Whether the open window has outlived the deadline at `now`.
    pub fn expired(&self, now: Instant) -> bool {
        self.armed_at
            .is_some_and(|start| now.duration_since(start) > self.timeout)
    }
}

impl Default for TimeoutGuard {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }
}

// ── LineCollector ───────────────────────────────────────────────────────

/// Outcome of feeding one byte to the collector.
#[derive(Debug, PartialEq, Eq)]
pub enum Feed {
    /// Byte absorbed; no complete line yet.
    Pending,
    /// A terminator arrived; the completed line is ready to take.
    Line,
    /// The byte did not fit. The partial line was dropped and everything up
    /// to the next terminator will be discarded.
    Overflow,
}

/// Accumulates raw bytes into a fixed-capacity message buffer.
///
/// The terminator is `\n`; a trailing `\r` is stripped from completed lines
/// so both `\n` and `\r\n` transports work. After an overflow the collector
/// swallows the rest of the oversized line, so one oversized line costs
/// exactly one error and the next line parses normally.
#[derive(Debug, Default)]
pub struct LineCollector {
    buf: ArrayVec<u8, MESSAGE_CAPACITY>,
    discarding: bool,
}

impl LineCollector {
    /// Empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing is buffered and nothing is being discarded.
    pub fn is_idle(&self) -> bool {
        self.buf.is_empty() && !self.discarding
    }

    /// Number of buffered bytes of the current partial line.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether no bytes are buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Feed one byte.
    pub fn push(&mut self, byte: u8) -> Feed {
        if self.discarding {
            if byte == b'\n' {
                self.discarding = false;
            }
            return Feed::Pending;
        }
        if byte == b'\n' {
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
            return Feed::Line;
        }
        match self.buf.try_push(byte) {
            Ok(()) => Feed::Pending,
            Err(_) => {
                self.buf.clear();
                self.discarding = true;
                Feed::Overflow
            }
        }
    }

    /// Take the completed line, leaving the collector idle.
    pub fn take_line(&mut self) -> ArrayVec<u8, MESSAGE_CAPACITY> {
        std::mem::take(&mut self.buf)
    }

    /// Drop any partial line and leave the collector idle.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.discarding = false;
    }
}
