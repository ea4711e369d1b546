//! Encoding variability: words studied across varied contexts are encoded
//! more robustly and earn a small bonus.
//!
//! Variety is measured on four dimensions (time-of-day bin, weekday, question
//! type, device) over the most recent study contexts for the word.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const BETA: f64 = 0.15;
const MAX_BONUS: f64 = 0.15;
const HISTORY_WINDOW: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyContext {
    pub hour_of_day: u8,
    pub day_of_week: u8,
    pub question_type: String,
    pub device_type: String,
}

pub fn variability_bonus(contexts: &[StudyContext]) -> f64 {
    if contexts.is_empty() {
        return 0.0;
    }

    let start = contexts.len().saturating_sub(HISTORY_WINDOW);
    let window = &contexts[start..];

    // 4-hour time bins give six possible slots per day.
    let hour_bins: HashSet<u8> = window.iter().map(|c| c.hour_of_day / 4).collect();
    let days: HashSet<u8> = window.iter().map(|c| c.day_of_week).collect();
    let types: HashSet<&str> = window.iter().map(|c| c.question_type.as_str()).collect();
    let devices: HashSet<&str> = window.iter().map(|c| c.device_type.as_str()).collect();

    let hour_spread = (hour_bins.len() as f64 - 1.0).max(0.0) / 5.0;
    let day_spread = (days.len() as f64 - 1.0).max(0.0) / 6.0;
    let type_spread = (types.len() as f64 - 1.0).max(0.0) / 3.0;
    let device_spread = (devices.len() as f64 - 1.0).max(0.0) / 2.0;

    let variability = (hour_spread + day_spread + type_spread + device_spread) / 4.0;
    (BETA * variability).min(MAX_BONUS)
}
