use std::collections::VecDeque;

/// Number of latency samples retained by the client.
pub const LATENCY_WINDOW_CAPACITY: usize = 100;

/// Bounded, completion-ordered sequence of latency samples in milliseconds.
///
/// When full, pushing a new sample evicts the oldest one (FIFO).
#[derive(Debug, Clone)]
pub struct LatencyWindow {
    samples: VecDeque<u64>,
    capacity: usize,
}

impl Default for LatencyWindow {
    fn default() -> Self {
        Self::with_capacity(LATENCY_WINDOW_CAPACITY)
    }
}

impl LatencyWindow {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample_ms: u64) {
        if self.capacity == 0 {
            return;
        }
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample_ms);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Mean of the retained samples rounded to the nearest millisecond, or 0 when empty.
    pub fn average(&self) -> u64 {
        if self.samples.is_empty() {
            return 0;
        }
        let sum: u128 = self.samples.iter().map(|s| u128::from(*s)).sum();
        (sum as f64 / self.samples.len() as f64).round() as u64
    }

    pub fn to_vec(&self) -> Vec<u64> {
        self.samples.iter().copied().collect()
    }
}
