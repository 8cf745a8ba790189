use std::collections::VecDeque;

use crate::config::BufferPolicy;
use crate::models::Sample;

/// Result of offering a sample to the buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Insertion {
    Stored,
    /// Stored after dropping the oldest sample
    Evicted(Sample),
    /// Buffer full under the bounded policy
    Rejected,
}

/// Bounded, ordered window of recent samples (oldest first)
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
    capacity: usize,
    policy: BufferPolicy,
}

impl SampleBuffer {
    pub fn new(capacity: usize, policy: BufferPolicy) -> Self {
        SampleBuffer {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            policy,
        }
    }

    pub fn insert(&mut self, sample: Sample) -> Insertion {
        if self.samples.len() < self.capacity {
            self.samples.push_back(sample);
            return Insertion::Stored;
        }

        match self.policy {
            BufferPolicy::Bounded => Insertion::Rejected,
            BufferPolicy::SlidingWindow => match self.samples.pop_front() {
                Some(oldest) => {
                    self.samples.push_back(sample);
                    Insertion::Evicted(oldest)
                }
                // zero capacity never admits anything
                None => Insertion::Rejected,
            },
        }
    }

    /// Samples with both fields valid, in insertion order
    pub fn valid_pairs(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.samples.iter().filter_map(Sample::valid_pair)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// False once a bounded buffer is full; sampling pauses until it is drained
    pub fn is_accepting(&self) -> bool {
        self.policy == BufferPolicy::SlidingWindow || !self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
