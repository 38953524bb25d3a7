//! Error type and the bounded error queue drawing calls report into

use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;

use log::debug;

/// Default number of queued messages before new ones are dropped
pub const DEFAULT_ERROR_CAPACITY: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("{op} given n < 3 (n = {n})")]
    TooFewPoints { op: &'static str, n: usize },

    #[error("{op} given {colors} colors for {n} points")]
    TooFewColors { op: &'static str, n: usize, colors: usize },

    #[error("{op} could not lock surface: {reason}")]
    LockFailed { op: &'static str, reason: String },

    #[error("pixel ({x}, {y}) is outside the surface bounds")]
    OutOfBounds { x: i32, y: i32 },

    #[error("{0} popped an empty stack")]
    EmptyStack(&'static str),

    #[error("unsupported bits per pixel: {0}")]
    UnsupportedFormat(u8),

    #[error("pixel data holds {actual} bytes, {expected} needed")]
    BufferSize { expected: usize, actual: usize },

    #[error("transform scale must be non-zero (x = {x}, y = {y})")]
    InvalidScale { x: f32, y: f32 },

    #[error("surface dimensions {width}x{height} are out of range")]
    Dimensions { width: i64, height: i64 },

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// ErrorQueue
// ============================================================================

/// A queued error message with the time it was reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    pub message: String,
    /// Milliseconds since the owning queue was created
    pub millis: u128,
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at time {}ms", self.message, self.millis)
    }
}

/// FIFO of error messages. Once full, further reports are dropped silently.
#[derive(Debug, Clone)]
pub struct ErrorQueue {
    entries: VecDeque<ErrorEntry>,
    capacity: usize,
    epoch: Instant,
}

impl ErrorQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            epoch: Instant::now(),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.entries.len() >= self.capacity {
            debug!("error queue full, dropping: {}", message);
            return;
        }
        self.entries.push_back(ErrorEntry {
            message,
            millis: self.epoch.elapsed().as_millis(),
        });
    }

    /// Oldest entry rendered as `"<message> at time <N>ms"`
    pub fn pop(&mut self) -> Option<String> {
        self.entries.pop_front().map(|e| e.to_string())
    }

    pub fn pop_entry(&mut self) -> Option<ErrorEntry> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorEntry> {
        self.entries.iter()
    }
}

impl Default for ErrorQueue {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_CAPACITY)
    }
}
