//! Motivation as a leaky accumulator over review outcomes.

use crate::config::MotivationParams;

#[derive(Debug, Clone, Default)]
pub struct MotivationEvent {
    pub is_correct: bool,
    pub is_quit: bool,
}

pub struct MotivationTracker {
    params: MotivationParams,
    current_value: f64,
    streak: i32,
}

impl MotivationTracker {
    pub fn new(params: MotivationParams) -> Self {
        Self {
            params,
            current_value: 0.5,
            streak: 0,
        }
    }

    pub fn update(&mut self, event: &MotivationEvent) -> f64 {
        if event.is_quit {
            self.current_value = self.params.rho * self.current_value - self.params.mu;
            self.streak = 0;
        } else if event.is_correct {
            self.streak += 1;
            let streak_bonus = (self.streak as f64 / 10.0).min(0.5) * self.params.kappa;
            self.current_value =
                self.params.rho * self.current_value + self.params.kappa + streak_bonus;
        } else {
            self.streak = 0;
            self.current_value = self.params.rho * self.current_value - self.params.lambda;
        }

        self.current_value = self.current_value.clamp(-1.0, 1.0);
        self.current_value
    }

    pub fn current(&self) -> f64 {
        self.current_value
    }

    pub fn streak(&self) -> i32 {
        self.streak
    }

    pub fn set_value(&mut self, value: f64) {
        self.current_value = value.clamp(-1.0, 1.0);
    }
}

impl Default for MotivationTracker {
    fn default() -> Self {
        Self::new(MotivationParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_answers_build_motivation_with_streak_bonus() {
        let mut tracker = MotivationTracker::default();
        let mut previous = tracker.current();
        for _ in 0..5 {
            let value = tracker.update(&MotivationEvent {
                is_correct: true,
                is_quit: false,
            });
            assert!(value > previous * 0.9);
            previous = value;
        }
        assert_eq!(tracker.streak(), 5);
    }

    #[test]
    fn wrong_answer_drops_motivation_and_streak() {
        let mut tracker = MotivationTracker::default();
        tracker.update(&MotivationEvent {
            is_correct: true,
            is_quit: false,
        });
        let before = tracker.current();
        let after = tracker.update(&MotivationEvent {
            is_correct: false,
            is_quit: false,
        });
        assert!(after < before);
        assert_eq!(tracker.streak(), 0);
    }

    #[test]
    fn quitting_hurts_more_than_a_wrong_answer() {
        let mut quitter = MotivationTracker::default();
        let mut fumbler = MotivationTracker::default();
        quitter.update(&MotivationEvent {
            is_correct: false,
            is_quit: true,
        });
        fumbler.update(&MotivationEvent {
            is_correct: false,
            is_quit: false,
        });
        assert!(quitter.current() < fumbler.current());
    }

    #[test]
    fn value_stays_in_range() {
        let mut tracker = MotivationTracker::default();
        for _ in 0..200 {
            tracker.update(&MotivationEvent {
                is_correct: true,
                is_quit: false,
            });
        }
        assert!(tracker.current() <= 1.0);
        for _ in 0..200 {
            tracker.update(&MotivationEvent {
                is_correct: false,
                is_quit: true,
            });
        }
        assert!(tracker.current() >= -1.0);
    }
}
