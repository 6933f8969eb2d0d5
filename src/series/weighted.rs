use super::SampleWindow;

/// Sliding weighted average over paired (value, weight) samples.
#[derive(Debug, Clone, Default)]
pub struct WeightedAverage {
    weighted: SampleWindow,
    weights: SampleWindow,
}

impl WeightedAverage {
    pub fn new(capacity: usize) -> Self {
        Self {
            weighted: SampleWindow::new(capacity),
            weights: SampleWindow::new(capacity),
        }
    }

    pub fn push(&mut self, value: f64, weight: f64) {
        self.weighted.push(value * weight);
        self.weights.push(weight);
    }

    pub fn average(&self) -> f64 {
        if self.weighted.is_empty() || self.weighted.sum() == 0.0 || self.weights.sum() == 0.0 {
            return 0.0;
        }
        self.weighted.sum() / self.weights.sum()
    }

    pub fn len(&self) -> usize {
        self.weighted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weighted.is_empty()
    }

    pub fn reset(&mut self) {
        self.weighted.reset();
        self.weights.reset();
    }
}
