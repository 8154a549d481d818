//! Ringbuffer module for tracking recent readings.
//!
//! This module provides a fixed-size ringbuffer holding the most recent
//! numeric readings of one instrument with predictable memory usage.

/// A circular buffer of readings with fixed capacity.
#[derive(Debug, Clone)]
pub struct Ringbuffer {
    entries: Vec<f64>,
    capacity: usize,
    write_index: usize,
    count: usize,
}

impl Ringbuffer {
    /// Creates a new ringbuffer with the specified capacity.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: vec![0.0; capacity],
            capacity,
            write_index: 0,
            count: 0,
        }
    }

    /// Pushes a new reading into the ringbuffer.
    ///
    /// If the buffer is full, the oldest reading will be overwritten.
    pub fn push(&mut self, value: f64) {
        self.entries[self.write_index] = value;
        self.write_index = (self.write_index + 1) % self.capacity;

        if self.count < self.capacity {
            self.count += 1;
        }
    }

    /// Returns all readings in chronological order (oldest to newest).
    pub fn get_history(&self) -> Vec<f64> {
        if self.count == 0 {
            return Vec::new();
        }

        let mut result = Vec::with_capacity(self.count);

        if self.count < self.capacity {
            // Buffer not yet full, entries are in order from 0 to count-1
            result.extend_from_slice(&self.entries[0..self.count]);
        } else {
            // Buffer is full: oldest entry sits at write_index
            result.extend_from_slice(&self.entries[self.write_index..]);
            result.extend_from_slice(&self.entries[0..self.write_index]);
        }

        result
    }

    /// Returns the most recently pushed reading.
    pub fn latest(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        let index = (self.write_index + self.capacity - 1) % self.capacity;
        Some(self.entries[index])
    }

    /// Returns the current number of readings in the buffer.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns the maximum capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
