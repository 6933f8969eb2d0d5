use std::cell::Cell;
use std::collections::VecDeque;

use super::{median_of, SampleWindow};

/// Theil-Sen linear regression over a sliding window.
///
/// `slopes[i]` holds the slopes from point `i` to every later point, so evicting the
/// oldest point drops exactly the first row. Both coefficients are computed on
/// demand and cached until the next mutation.
#[derive(Debug, Clone, Default)]
pub struct TheilSenLinear {
    capacity: usize,
    x: SampleWindow,
    y: SampleWindow,
    slopes: VecDeque<Vec<f64>>,
    a: Cell<Option<f64>>,
    b: Cell<Option<f64>>,
}

impl TheilSenLinear {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            x: SampleWindow::new(capacity),
            y: SampleWindow::new(capacity),
            slopes: VecDeque::with_capacity(capacity),
            a: Cell::new(None),
            b: Cell::new(None),
        }
    }

    pub fn push(&mut self, x: f64, y: f64) {
        if self.capacity > 0 && self.slopes.len() >= self.capacity {
            self.slopes.pop_front();
        }

        self.x.push(x);
        self.y.push(y);
        self.invalidate();

        let newest = self.x.len() - 1;
        for i in 0..newest {
            let slope = self.slope_between(i, newest);
            self.slopes[i].push(slope);
        }

        self.slopes.push_back(Vec::with_capacity(self.capacity));
    }

    /// Median of every pairwise slope in the window.
    pub fn median(&self) -> f64 {
        median_of(self.slopes.iter().flatten().copied().collect())
    }

    /// Slope estimate.
    pub fn coefficient_a(&self) -> f64 {
        if let Some(a) = self.a.get() {
            return a;
        }
        let a = self.median();
        self.a.set(Some(a));
        a
    }

    /// Intercept estimate: median residual `y - a * x` over the window.
    pub fn coefficient_b(&self) -> f64 {
        if let Some(b) = self.b.get() {
            return b;
        }
        let a = self.coefficient_a();
        let intercepts = self
            .x
            .iter()
            .zip(self.y.iter())
            .map(|(x, y)| y - a * x)
            .collect();
        let b = median_of(intercepts);
        self.b.set(Some(b));
        b
    }

    /// Oldest y value still in the window.
    pub fn y_at_series_begin(&self) -> Option<f64> {
        self.y.first()
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
        self.slopes.clear();
        self.invalidate();
    }

    fn invalidate(&self) {
        self.a.set(None);
        self.b.set(None);
    }

    fn slope_between(&self, first: usize, second: usize) -> f64 {
        let x1 = self.x.at(first);
        let x2 = self.x.at(second);

        if first == second || x1 == x2 {
            return 0.0;
        }

        (self.y.at(second) - self.y.at(first)) / (x2 - x1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_empty() {
        let ts = TheilSenLinear::new(7);
        assert_eq!(ts.median(), 0.0);
        assert_eq!(ts.coefficient_a(), 0.0);
        assert_eq!(ts.coefficient_b(), 0.0);
        assert_eq!(ts.y_at_series_begin(), None);
    }

    #[test]
    fn test_resists_outlier() {
        let mut ts = TheilSenLinear::new(0);
        for (x, y) in [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0), (4.0, 8.0), (5.0, 100.0)] {
            ts.push(x, y);
        }
        assert_eq!(ts.coefficient_a(), 2.0);
        assert_eq!(ts.coefficient_b(), 0.0);
    }

    #[test]
    fn test_window_evicts_oldest_row() {
        let mut ts = TheilSenLinear::new(4);
        for (x, y) in [(1.0, 50.0), (2.0, 4.0), (3.0, 6.0), (4.0, 8.0), (5.0, 10.0)] {
            ts.push(x, y);
        }
        assert_eq!(ts.len(), 4);
        assert_eq!(ts.y_at_series_begin(), Some(4.0));
        assert_eq!(ts.median(), 2.0);
        assert_eq!(ts.coefficient_b(), 0.0);
    }

    #[test]
    fn test_equal_x_counts_as_zero_slope() {
        let mut ts = TheilSenLinear::new(0);
        ts.push(1.0, 1.0);
        ts.push(1.0, 5.0);
        ts.push(2.0, 2.0);
        // slopes: 0 (equal x), 1, -3
        assert_eq!(ts.median(), 0.0);
    }

    #[test]
    fn test_lazy_coefficients_match_eager() {
        let mut rng = rand::thread_rng();
        let mut ts = TheilSenLinear::new(7);
        let mut x = 0.0;
        for _ in 0..200 {
            x += rng.gen_range(0.5..2.0);
            ts.push(x, rng.gen_range(-10.0..10.0));
            if rng.gen_bool(0.5) {
                let _ = ts.coefficient_b();
            }
            assert_eq!(ts.coefficient_a(), ts.median());
            assert_eq!(ts.len(), ts.slopes.len());
        }
    }

    #[test]
    fn test_reset() {
        let mut ts = TheilSenLinear::new(3);
        ts.push(1.0, 1.0);
        ts.push(2.0, 3.0);
        assert_eq!(ts.coefficient_a(), 2.0);
        ts.reset();
        assert!(ts.is_empty());
        assert_eq!(ts.median(), 0.0);
        assert_eq!(ts.coefficient_a(), 0.0);
    }
}
