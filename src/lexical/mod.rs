//! Vocabulary-specific specialization signals layered on the memory model.

pub mod interference;
pub mod morphology;
pub mod variability;

pub use interference::{interference_penalty, ConfusablePair};
pub use morphology::{transfer_bonus, MorphemeMastery};
pub use variability::{variability_bonus, StudyContext};

const MULTIPLIER_MIN: f64 = 0.5;
const MULTIPLIER_MAX: f64 = 2.0;

/// Combined per-word difficulty multiplier.
///
/// Transfer and variability bonuses stretch intervals; interference shrinks
/// them. Composed multiplicatively so the signals stay independent, then
/// clamped to a sane range.
pub fn specialization_multiplier(
    morphemes: &[MorphemeMastery],
    confusables: &[ConfusablePair],
    recent_word_ids: &[String],
    contexts: &[StudyContext],
) -> f64 {
    let transfer = transfer_bonus(morphemes);
    let variability = variability_bonus(contexts);
    let interference = interference_penalty(confusables, recent_word_ids);

    let multiplier = (1.0 + transfer) * (1.0 + variability) * (1.0 - interference);
    multiplier.clamp(MULTIPLIER_MIN, MULTIPLIER_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_inputs_give_unit_multiplier() {
        let mult = specialization_multiplier(&[], &[], &[], &[]);
        assert!((mult - 1.0).abs() < 1e-12);
    }

    #[test]
    fn bonuses_raise_and_interference_lowers() {
        let morphemes = vec![MorphemeMastery {
            morpheme_id: "re".into(),
            mastery_level: 5.0,
        }];
        let raised = specialization_multiplier(&morphemes, &[], &[], &[]);
        assert!(raised > 1.0);

        let confusables = vec![ConfusablePair {
            confusable_word_id: "affect".into(),
            distance: 0.0,
        }];
        let recent = vec!["affect".to_string()];
        let lowered = specialization_multiplier(&[], &confusables, &recent, &[]);
        assert!(lowered < 1.0);
    }

    #[test]
    fn multiplier_stays_within_bounds() {
        let morphemes: Vec<_> = (0..20)
            .map(|i| MorphemeMastery {
                morpheme_id: format!("m{i}"),
                mastery_level: 5.0,
            })
            .collect();
        let mult = specialization_multiplier(&morphemes, &[], &[], &[]);
        assert!(mult <= MULTIPLIER_MAX);
        assert!(specialization_multiplier(&[], &[], &[], &[]) >= MULTIPLIER_MIN);
    }
}
