//! Progress trend over a sliding window of mastery scores.
//!
//! A least-squares slope classifies the window as up, down, flat, or stuck
//! (flat slope plus abnormally low variance, which reads as a plateau).

use crate::config::TrendParams;
use crate::types::TrendState;
use std::collections::VecDeque;

const MIN_SAMPLES: usize = 5;

pub struct TrendAnalyzer {
    params: TrendParams,
    history: VecDeque<f64>,
    current_trend: TrendState,
}

impl TrendAnalyzer {
    pub fn new(params: TrendParams) -> Self {
        Self {
            params,
            history: VecDeque::with_capacity(64),
            current_trend: TrendState::Flat,
        }
    }

    pub fn update(&mut self, mastery_score: f64) -> TrendState {
        self.history.push_back(mastery_score);
        if self.history.len() > self.params.window_size {
            self.history.pop_front();
        }

        if self.history.len() < MIN_SAMPLES {
            self.current_trend = TrendState::Flat;
            return self.current_trend;
        }

        let slope = self.slope();
        let variance = self.variance();

        self.current_trend = if slope > self.params.up_threshold {
            TrendState::Up
        } else if slope < self.params.down_threshold {
            TrendState::Down
        } else if variance < self.params.stuck_variance_threshold && slope.abs() < 0.01 {
            TrendState::Stuck
        } else {
            TrendState::Flat
        };

        self.current_trend
    }

    pub fn current(&self) -> TrendState {
        self.current_trend
    }

    fn slope(&self) -> f64 {
        if self.history.len() < 2 {
            return 0.0;
        }

        let n = self.history.len() as f64;
        let sum_x: f64 = (0..self.history.len()).map(|i| i as f64).sum();
        let sum_y: f64 = self.history.iter().sum();
        let sum_xy: f64 = self
            .history
            .iter()
            .enumerate()
            .map(|(i, y)| i as f64 * y)
            .sum();
        let sum_xx: f64 = (0..self.history.len()).map(|i| (i as f64).powi(2)).sum();

        let denominator = n * sum_xx - sum_x.powi(2);
        if denominator.abs() < 1e-10 {
            return 0.0;
        }
        (n * sum_xy - sum_x * sum_y) / denominator
    }

    fn variance(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let mean = self.history.iter().sum::<f64>() / self.history.len() as f64;
        self.history.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / self.history.len() as f64
    }
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self::new(TrendParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_few_samples_report_flat() {
        let mut analyzer = TrendAnalyzer::default();
        for i in 0..4 {
            assert_eq!(analyzer.update(i as f64 * 0.2), TrendState::Flat);
        }
    }

    #[test]
    fn rising_scores_report_up() {
        let mut analyzer = TrendAnalyzer::default();
        let mut trend = TrendState::Flat;
        for i in 0..10 {
            trend = analyzer.update(0.1 * i as f64);
        }
        assert_eq!(trend, TrendState::Up);
    }

    #[test]
    fn falling_scores_report_down() {
        let mut analyzer = TrendAnalyzer::default();
        let mut trend = TrendState::Flat;
        for i in 0..10 {
            trend = analyzer.update(1.0 - 0.1 * i as f64);
        }
        assert_eq!(trend, TrendState::Down);
    }

    #[test]
    fn constant_scores_report_stuck() {
        let mut analyzer = TrendAnalyzer::default();
        let mut trend = TrendState::Flat;
        for _ in 0..10 {
            trend = analyzer.update(0.5);
        }
        assert_eq!(trend, TrendState::Stuck);
    }

    #[test]
    fn noisy_flat_scores_report_flat() {
        let mut analyzer = TrendAnalyzer::default();
        let scores = [0.3, 0.7, 0.4, 0.6, 0.35, 0.65, 0.45, 0.55, 0.3, 0.7];
        let mut trend = TrendState::Flat;
        for s in scores {
            trend = analyzer.update(s);
        }
        assert_eq!(trend, TrendState::Flat);
    }
}
