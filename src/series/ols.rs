use super::SampleWindow;

/// Ordinary least squares over a sliding window, kept as running sums.
#[derive(Debug, Clone, Default)]
pub struct OlsLinear {
    x: SampleWindow,
    x_square: SampleWindow,
    y: SampleWindow,
    y_square: SampleWindow,
    xy: SampleWindow,
}

impl OlsLinear {
    pub fn new(capacity: usize) -> Self {
        Self {
            x: SampleWindow::new(capacity),
            x_square: SampleWindow::new(capacity),
            y: SampleWindow::new(capacity),
            y_square: SampleWindow::new(capacity),
            xy: SampleWindow::new(capacity),
        }
    }

    pub fn push(&mut self, x: f64, y: f64) {
        self.x.push(x);
        self.x_square.push(x * x);
        self.y.push(y);
        self.y_square.push(y * y);
        self.xy.push(x * y);
    }

    pub fn slope(&self) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }

        let n = self.x.len() as f64;
        let numerator = n * self.xy.sum() - self.x.sum() * self.y.sum();
        let denominator = n * self.x_square.sum() - self.x.sum() * self.x.sum();

        if denominator == 0.0 {
            0.0
        } else {
            numerator / denominator
        }
    }

    /// R² from the running sums: 1 - SSE/SST.
    pub fn goodness_of_fit(&self) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }

        let n = self.x.len() as f64;
        let slope = self.slope();
        let intercept = (self.y.sum() - slope * self.x.sum()) / n;

        let sse = self.y_square.sum() - intercept * self.y.sum() - slope * self.xy.sum();
        let sst = self.y_square.sum() - (self.y.sum() * self.y.sum()) / n;

        if sst == 0.0 {
            0.0
        } else {
            1.0 - sse / sst
        }
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    pub fn reset(&mut self) {
        self.x.reset();
        self.x_square.reset();
        self.y.reset();
        self.y_square.reset();
        self.xy.reset();
    }

    fn is_degenerate(&self) -> bool {
        self.x.len() < 2 || self.x.sum() == 0.0
    }
}
