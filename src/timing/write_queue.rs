//! Register Write Queue
//!
//! Register writes are produced by a single chronological CPU stream, so the
//! queue only ever accepts non-decreasing timestamps.

use crate::{PsgError, Result};
use std::collections::VecDeque;

/// A register byte written by the CPU at a given cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingWrite {
    /// CPU cycle the write was issued at
    pub timestamp: u64,
    /// Raw register byte
    pub payload: u8,
}

/// FIFO of register writes awaiting application
#[derive(Debug, Clone, Default)]
pub struct WriteQueue {
    writes: VecDeque<PendingWrite>,
    /// Timestamp of the most recently accepted write (survives draining)
    last_timestamp: Option<u64>,
}

impl WriteQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a write; rejects timestamps earlier than the previous write
    pub fn enqueue(&mut self, timestamp: u64, payload: u8) -> Result<()> {
        if let Some(previous) = self.last_timestamp {
            if timestamp < previous {
                return Err(PsgError::OutOfOrderWrite {
                    timestamp,
                    previous,
                });
            }
        }
        self.writes.push_back(PendingWrite { timestamp, payload });
        self.last_timestamp = Some(timestamp);
        Ok(())
    }

    /// Pop the oldest write if it is due at or before `offset` cycles past `window_start`
    ///
    /// Writes stamped before `window_start` are due immediately.
    #[inline]
    pub fn pop_due(&mut self, window_start: u64, offset: u64) -> Option<PendingWrite> {
        match self.writes.front() {
            Some(front) if front.timestamp.saturating_sub(window_start) <= offset => {
                self.writes.pop_front()
            }
            _ => None,
        }
    }

    /// Pop the oldest write regardless of its timestamp
    #[inline]
    pub fn pop(&mut self) -> Option<PendingWrite> {
        self.writes.pop_front()
    }

    /// Number of writes waiting
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Whether no writes are waiting
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Timestamp of the most recently accepted write
    pub fn last_timestamp(&self) -> Option<u64> {
        self.last_timestamp
    }

    /// Drop every pending write and forget the ordering history
    pub fn clear(&mut self) {
        self.writes.clear();
        self.last_timestamp = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = WriteQueue::new();
        queue.enqueue(100, 0x01).unwrap();
        queue.enqueue(150, 0x02).unwrap();
        queue.enqueue(150, 0x03).unwrap();

        assert_eq!(queue.pop().map(|w| w.payload), Some(0x01));
        assert_eq!(queue.pop().map(|w| w.payload), Some(0x02));
        assert_eq!(queue.pop().map(|w| w.payload), Some(0x03));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut queue = WriteQueue::new();
        queue.enqueue(200, 0x90).unwrap();
        let err = queue.enqueue(199, 0x91).unwrap_err();
        assert!(matches!(
            err,
            PsgError::OutOfOrderWrite {
                timestamp: 199,
                previous: 200
            }
        ));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_ordering_survives_draining() {
        let mut queue = WriteQueue::new();
        queue.enqueue(500, 0x90).unwrap();
        queue.pop();
        assert!(queue.is_empty());
        assert!(queue.enqueue(400, 0x91).is_err());
        assert!(queue.enqueue(500, 0x91).is_ok());
    }

    #[test]
    fn test_pop_due_respects_offset() {
        let mut queue = WriteQueue::new();
        queue.enqueue(1_100, 0xA0).unwrap();
        queue.enqueue(1_150, 0xA1).unwrap();

        assert!(queue.pop_due(1_000, 99).is_none());
        assert_eq!(queue.pop_due(1_000, 100).map(|w| w.payload), Some(0xA0));
        assert!(queue.pop_due(1_000, 100).is_none());
        assert_eq!(queue.pop_due(1_000, 150).map(|w| w.payload), Some(0xA1));
    }

    #[test]
    fn test_stale_write_is_due_immediately() {
        let mut queue = WriteQueue::new();
        queue.enqueue(10, 0x9F).unwrap();
        assert_eq!(queue.pop_due(50, 0).map(|w| w.timestamp), Some(10));
    }

    #[test]
    fn test_clear_resets_history() {
        let mut queue = WriteQueue::new();
        queue.enqueue(1_000, 0x9F).unwrap();
        queue.clear();
        assert_eq!(queue.last_timestamp(), None);
        assert!(queue.enqueue(0, 0x9F).is_ok());
    }
}
