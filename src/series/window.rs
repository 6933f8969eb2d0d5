use std::collections::VecDeque;

use super::SeriesError;

/// FIFO window of samples with a running sum.
///
/// A capacity of 0 means the window grows without bound. Once a bounded window is
/// full, every push evicts the oldest sample first.
#[derive(Debug, Clone, Default)]
pub struct SampleWindow {
    capacity: usize,
    samples: VecDeque<f64>,
    sum: f64,
}

impl SampleWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
            sum: 0.0,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.capacity > 0 && self.samples.len() >= self.capacity {
            if let Some(evicted) = self.samples.pop_front() {
                self.sum -= evicted;
            }
        }

        self.samples.push_back(value);
        self.sum += value;
    }

    pub fn get(&self, index: usize) -> Result<f64, SeriesError> {
        self.samples
            .get(index)
            .copied()
            .ok_or(SeriesError::IndexOutOfBounds {
                index,
                len: self.samples.len(),
            })
    }

    /// Unchecked access for callers that iterate within `0..len()`.
    pub(crate) fn at(&self, index: usize) -> f64 {
        self.samples[index]
    }

    pub fn first(&self) -> Option<f64> {
        self.samples.front().copied()
    }

    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.sum / self.samples.len() as f64
    }

    /// Median of a sorted copy; the window order is left untouched.
    pub fn median(&self) -> f64 {
        super::median_of(self.samples.iter().copied().collect())
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.sum = 0.0;
    }
}
