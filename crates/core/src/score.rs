use serde::{Deserialize, Serialize};

/// Lower bound of the confidence band policies emit into.
pub const SCORE_FLOOR: f32 = 80.0;
/// Upper bound of the confidence band.
pub const SCORE_CEIL: f32 = 100.0;

/// Item count at which the items component of the coverage score saturates.
const ITEM_TARGET: usize = 5;

/// Which parsed fields were actually found in the recognized text, as
/// reported by the field parser. Input to the scoring policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCoverage {
    pub merchant: bool,
    pub amount: bool,
    pub date: bool,
    pub items: usize,
}

/// Pluggable confidence scoring. Implementations return a value the
/// controller clamps into [`SCORE_FLOOR`, `SCORE_CEIL`].
pub trait ScorePolicy: Send + Sync {
    fn score(&self, coverage: &FieldCoverage) -> f32;
}

/// Default policy: floor plus the band span weighted by field coverage.
/// Deterministic for a given parse result.
pub struct CoverageScore;

impl ScorePolicy for CoverageScore {
    fn score(&self, coverage: &FieldCoverage) -> f32 {
        let unit = |found: bool| if found { 1.0f32 } else { 0.0 };
        let items_frac = coverage.items.min(ITEM_TARGET) as f32 / ITEM_TARGET as f32;
        let frac = 0.35 * unit(coverage.merchant)
            + 0.35 * unit(coverage.amount)
            + 0.20 * unit(coverage.date)
            + 0.10 * items_frac;
        SCORE_FLOOR + (SCORE_CEIL - SCORE_FLOOR) * frac
    }
}

/// Fixed-value policy for tests and calibration.
pub struct FixedScore(pub f32);

impl ScorePolicy for FixedScore {
    fn score(&self, _coverage: &FieldCoverage) -> f32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> FieldCoverage {
        FieldCoverage { merchant: true, amount: true, date: true, items: 5 }
    }

    #[test]
    fn coverage_score_spans_the_band() {
        assert_eq!(CoverageScore.score(&FieldCoverage::default()), SCORE_FLOOR);
        assert_eq!(CoverageScore.score(&full()), SCORE_CEIL);
    }

    #[test]
    fn coverage_score_is_monotonic_in_fields() {
        let none = CoverageScore.score(&FieldCoverage::default());
        let merchant_only =
            CoverageScore.score(&FieldCoverage { merchant: true, ..Default::default() });
        let merchant_and_amount = CoverageScore.score(&FieldCoverage {
            merchant: true,
            amount: true,
            ..Default::default()
        });
        assert!(none < merchant_only);
        assert!(merchant_only < merchant_and_amount);
        assert!(merchant_and_amount < CoverageScore.score(&full()));
    }

    #[test]
    fn item_component_saturates_at_target() {
        let at_target = CoverageScore.score(&FieldCoverage { items: 5, ..Default::default() });
        let over_target = CoverageScore.score(&FieldCoverage { items: 12, ..Default::default() });
        assert_eq!(at_target, over_target);
    }

    #[test]
    fn fixed_score_ignores_coverage() {
        assert_eq!(FixedScore(91.0).score(&FieldCoverage::default()), 91.0);
        assert_eq!(FixedScore(91.0).score(&full()), 91.0);
    }
}
