use std::collections::VecDeque;

use super::{median_of, SampleWindow, TheilSenLinear};

/// Robust quadratic fit `y = a·x² + b·x + c` over a sliding window.
///
/// `a` is the median of the three-point estimators for every triple `(i, j, k)` with
/// `i < j < k`; `b` and `c` come from a Theil-Sen linear fit of `y - a·x²`.
/// Coefficients are refreshed on every push.
#[derive(Debug, Clone, Default)]
pub struct TheilSenQuadratic {
    capacity: usize,
    x: SampleWindow,
    y: SampleWindow,
    // estimators grouped by the index of their first point
    estimators: VecDeque<Vec<f64>>,
    a: f64,
    b: f64,
    c: f64,
}

impl TheilSenQuadratic {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            x: SampleWindow::new(capacity),
            y: SampleWindow::new(capacity),
            estimators: VecDeque::with_capacity(capacity),
            a: 0.0,
            b: 0.0,
            c: 0.0,
        }
    }

    pub fn push(&mut self, x: f64, y: f64) {
        if self.capacity > 0 && self.x.len() >= self.capacity {
            self.estimators.pop_front();
        }

        self.x.push(x);
        self.y.push(y);

        let n = self.x.len();
        if n < 3 {
            self.a = 0.0;
            self.b = 0.0;
            self.c = 0.0;
            return;
        }

        self.estimators.push_back(Vec::new());
        let newest = n - 1;
        for i in 0..n - 2 {
            for j in i + 1..newest {
                let estimate = self.leading_coefficient(i, j, newest);
                self.estimators[i].push(estimate);
            }
        }

        self.a = median_of(self.estimators.iter().flatten().copied().collect());

        let mut residue = TheilSenLinear::new(self.capacity);
        for (x, y) in self.x.iter().zip(self.y.iter()) {
            residue.push(x, y - self.a * (x * x));
        }

        self.b = residue.coefficient_a();
        self.c = residue.coefficient_b();
    }

    /// `(a, b, c)` of the current fit; all zero below three samples.
    pub fn coefficients(&self) -> (f64, f64, f64) {
        (self.a, self.b, self.c)
    }

    pub fn first_derivative_at_position(&self, position: usize) -> f64 {
        if self.x.len() < 3 || position >= self.x.len() {
            return 0.0;
        }
        self.a * 2.0 * self.x.at(position) + self.b
    }

    pub fn second_derivative_at_position(&self, position: usize) -> f64 {
        if self.x.len() < 3 || position >= self.x.len() {
            return 0.0;
        }
        self.a * 2.0
    }

    pub fn goodness_of_fit(&self) -> f64 {
        if self.x.len() < 3 {
            return 0.0;
        }

        let average_y = self.y.average();
        let mut sse = 0.0;
        let mut sst = 0.0;

        for (x, y) in self.x.iter().zip(self.y.iter()) {
            sse += (y - self.project(x)).powi(2);
            sst += (y - average_y).powi(2);
        }

        if sst == 0.0 || sse > sst {
            return 0.0;
        }
        if sse == 0.0 {
            return 1.0;
        }

        1.0 - sse / sst
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
        self.estimators.clear();
        self.a = 0.0;
        self.b = 0.0;
        self.c = 0.0;
    }

    fn project(&self, x: f64) -> f64 {
        self.a * x * x + self.b * x + self.c
    }

    fn leading_coefficient(&self, first: usize, second: usize, third: usize) -> f64 {
        let x1 = self.x.at(first);
        let x2 = self.x.at(second);
        let x3 = self.x.at(third);

        if x1 == x2 || x1 == x3 || x2 == x3 {
            return 0.0;
        }

        let y1 = self.y.at(first);
        let y2 = self.y.at(second);
        let y3 = self.y.at(third);

        (x1 * (y3 - y2) + y1 * (x2 - x3) + (x3 * y2 - x2 * y3))
            / ((x1 - x2) * (x1 - x3) * (x2 - x3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parabola(x: f64) -> f64 {
        3.0 * x * x - 2.0 * x + 1.0
    }

    #[test]
    fn test_fewer_than_three_points() {
        let mut ts = TheilSenQuadratic::new(7);
        ts.push(0.0, 1.0);
        ts.push(1.0, 2.0);
        assert_eq!(ts.goodness_of_fit(), 0.0);
        assert_eq!(ts.first_derivative_at_position(0), 0.0);
        assert_eq!(ts.second_derivative_at_position(1), 0.0);
        assert_eq!(ts.coefficients(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_exact_parabola() {
        let mut ts = TheilSenQuadratic::new(0);
        for x in 0..6 {
            ts.push(x as f64, parabola(x as f64));
        }
        assert_eq!(ts.coefficients(), (3.0, -2.0, 1.0));
        assert_eq!(ts.goodness_of_fit(), 1.0);
        assert_eq!(ts.first_derivative_at_position(2), 10.0);
        assert_eq!(ts.second_derivative_at_position(0), 6.0);
    }

    #[test]
    fn test_derivatives_past_window_are_zero() {
        let mut ts = TheilSenQuadratic::new(7);
        for x in 0..5 {
            ts.push(x as f64, parabola(x as f64));
        }
        assert_eq!(ts.first_derivative_at_position(5), 0.0);
        assert_eq!(ts.first_derivative_at_position(100), 0.0);
        assert_eq!(ts.second_derivative_at_position(5), 0.0);
        assert!(ts.second_derivative_at_position(4) != 0.0);
    }

    #[test]
    fn test_resists_single_outlier() {
        let mut ts = TheilSenQuadratic::new(0);
        for x in 0..7 {
            let bump = if x == 3 { 40.0 } else { 0.0 };
            ts.push(x as f64, parabola(x as f64) + bump);
        }
        let (a, b, c) = ts.coefficients();
        assert_eq!((a, b, c), (3.0, -2.0, 1.0));
        let fit = ts.goodness_of_fit();
        assert!(fit > 0.8 && fit < 0.81, "fit was {}", fit);
    }

    #[test]
    fn test_sliding_window() {
        let mut ts = TheilSenQuadratic::new(5);
        for x in 0..9 {
            let x = x as f64;
            ts.push(x, 0.5 * x * x + x);
        }
        assert_eq!(ts.len(), 5);
        assert_eq!(ts.estimators.len(), 3);
        assert_eq!(ts.coefficients(), (0.5, 1.0, 0.0));
        // oldest retained x is 4
        assert_eq!(ts.first_derivative_at_position(0), 5.0);
        assert_eq!(ts.goodness_of_fit(), 1.0);
    }

    #[test]
    fn test_flat_series_has_no_fit() {
        let mut ts = TheilSenQuadratic::new(0);
        for x in 0..4 {
            ts.push(x as f64, 2.0);
        }
        assert_eq!(ts.goodness_of_fit(), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut ts = TheilSenQuadratic::new(4);
        for x in 0..4 {
            ts.push(x as f64, parabola(x as f64));
        }
        ts.reset();
        assert!(ts.is_empty());
        assert_eq!(ts.coefficients(), (0.0, 0.0, 0.0));
        assert_eq!(ts.goodness_of_fit(), 0.0);
    }
}
