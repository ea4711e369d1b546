//! Interference from recently studied confusable words.
//!
//! If a look-alike or sound-alike was seen inside the recent session window,
//! the current word gets a penalty proportional to how close the pair is.

use serde::{Deserialize, Serialize};

const MAX_PENALTY: f64 = 0.50;
const SESSION_WINDOW: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfusablePair {
    pub confusable_word_id: String,
    /// Similarity distance in [0, 1]: 0 means nearly identical.
    pub distance: f64,
}

pub fn interference_penalty(confusables: &[ConfusablePair], recent_word_ids: &[String]) -> f64 {
    if confusables.is_empty() || recent_word_ids.is_empty() {
        return 0.0;
    }

    let start = recent_word_ids.len().saturating_sub(SESSION_WINDOW);
    let window = &recent_word_ids[start..];

    let mut penalty = 0.0;
    for pair in confusables {
        if window.iter().any(|id| *id == pair.confusable_word_id) {
            let proximity = 1.0 - pair.distance.clamp(0.0, 1.0);
            penalty += proximity * MAX_PENALTY / SESSION_WINDOW as f64;
        }
    }

    penalty.min(MAX_PENALTY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(id: &str, distance: f64) -> ConfusablePair {
        ConfusablePair {
            confusable_word_id: id.into(),
            distance,
        }
    }

    #[test]
    fn empty_inputs_yield_zero() {
        assert_eq!(interference_penalty(&[], &["w1".into()]), 0.0);
        assert_eq!(interference_penalty(&[pair("w1", 0.2)], &[]), 0.0);
    }

    #[test]
    fn confusable_outside_window_is_ignored() {
        let mut recent: Vec<String> = (0..SESSION_WINDOW).map(|i| format!("w{i}")).collect();
        recent.insert(0, "old".into());
        assert_eq!(interference_penalty(&[pair("old", 0.0)], &recent), 0.0);
    }

    #[test]
    fn closer_pairs_penalize_more() {
        let recent = vec!["rival".to_string()];
        let near = interference_penalty(&[pair("rival", 0.1)], &recent);
        let far = interference_penalty(&[pair("rival", 0.8)], &recent);
        assert!(near > far);
        assert!(far > 0.0);
    }

    #[test]
    fn penalty_never_exceeds_cap() {
        let recent: Vec<String> = (0..SESSION_WINDOW).map(|i| format!("w{i}")).collect();
        let confusables: Vec<_> = recent.iter().map(|id| pair(id, 0.0)).collect();
        let many: Vec<_> = confusables
            .iter()
            .cycle()
            .take(confusables.len() * 10)
            .cloned()
            .collect();
        assert!(interference_penalty(&many, &recent) <= MAX_PENALTY + 1e-12);
    }
}
