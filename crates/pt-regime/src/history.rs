use std::collections::VecDeque;

/// Fixed-capacity trailing window used to z-score a fresh reading against
/// its own recent history. Oldest sample drops off once `cap` is reached.
#[derive(Clone, Debug)]
pub struct RollingWindow {
    values: VecDeque<f64>,
    cap: usize,
}

impl RollingWindow {
    pub fn new(cap: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(cap),
            cap,
        }
    }

    fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    fn population_stdev(&self) -> f64 {
        let mean = self.mean();
        let variance = self
            .values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / self.values.len() as f64;
        variance.sqrt()
    }

    /// Appends `value` to the window, then returns its z-score against the
    /// (post-append) window contents. `0.0` with fewer than two samples or
    /// zero variance.
    pub fn push_and_zscore(&mut self, value: f64) -> f64 {
        if self.values.len() == self.cap {
            self.values.pop_front();
        }
        self.values.push_back(value);

        if self.values.len() < 2 {
            return 0.0;
        }
        let std = self.population_stdev();
        if std == 0.0 {
            return 0.0;
        }
        (value - self.mean()) / std
    }
}
