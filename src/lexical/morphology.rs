//! Morphological transfer: knowing a word's parts makes the whole cheaper.
//!
//! Each mastered morpheme contributes up to α to the transfer bonus, with a
//! hard cap so long compounds do not trivialize themselves.

use serde::{Deserialize, Serialize};

const ALPHA: f64 = 0.1;
const MAX_BONUS: f64 = 0.30;
const MASTERY_LEVEL_MAX: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MorphemeMastery {
    pub morpheme_id: String,
    /// Mastery level on a 0-5 scale.
    pub mastery_level: f64,
}

pub fn transfer_bonus(morphemes: &[MorphemeMastery]) -> f64 {
    if morphemes.is_empty() {
        return 0.0;
    }

    let total: f64 = morphemes
        .iter()
        .map(|m| ALPHA * (m.mastery_level / MASTERY_LEVEL_MAX).clamp(0.0, 1.0))
        .sum();

    total.min(MAX_BONUS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mastered(id: &str) -> MorphemeMastery {
        MorphemeMastery {
            morpheme_id: id.into(),
            mastery_level: 5.0,
        }
    }

    #[test]
    fn no_morphemes_no_bonus() {
        assert_eq!(transfer_bonus(&[]), 0.0);
    }

    #[test]
    fn fully_mastered_morpheme_contributes_alpha() {
        let bonus = transfer_bonus(&[mastered("trans")]);
        assert!((bonus - ALPHA).abs() < 1e-9);
    }

    #[test]
    fn partial_mastery_scales_linearly() {
        let half = transfer_bonus(&[MorphemeMastery {
            morpheme_id: "port".into(),
            mastery_level: 2.5,
        }]);
        assert!((half - ALPHA / 2.0).abs() < 1e-9);
    }

    #[test]
    fn bonus_caps_for_long_compounds() {
        let many: Vec<_> = (0..8).map(|i| mastered(&format!("m{i}"))).collect();
        assert!((transfer_bonus(&many) - MAX_BONUS).abs() < 1e-9);
    }

    #[test]
    fn negative_mastery_is_ignored() {
        let bonus = transfer_bonus(&[MorphemeMastery {
            morpheme_id: "x".into(),
            mastery_level: -3.0,
        }]);
        assert_eq!(bonus, 0.0);
    }
}
