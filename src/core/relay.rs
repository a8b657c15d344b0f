//! # Stdin Relay Queue
//!
//! The FIFO bridging asynchronous line submission to the interpreter's
//! pull-based character input. The producer is the line editor (whole
//! lines, terminator included); the consumer is the interpreter's input
//! source, draining one character per pull.
//!
//! `dequeue_one` never blocks and never fabricates data: `None` means
//! "no data", and it is the interpreter's documented limitation that it
//! must cope with that instead of a blocking read. Both sides run within
//! the same non-preemptive event loop, so no locking is needed; FIFO
//! order is the sole ordering guarantee.

use std::collections::VecDeque;

/// Ordered queue of pending input character codes.
#[derive(Debug, Default)]
pub struct RelayQueue {
    queue: VecDeque<u8>,
}

impl RelayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every character code of `text` to the tail, preserving order.
    /// Callers enqueue only complete lines (with their trailing `\n`), so
    /// the consumer always observes whole lines in submission order.
    pub fn enqueue(&mut self, text: &str) {
        self.queue.extend(text.bytes());
    }

    /// Remove and return the head character code, or `None` if empty.
    pub fn dequeue_one(&mut self) -> Option<u8> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop all pending input. Used when a session starts or stops so a new
    /// game never reads leftovers from the previous one.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
