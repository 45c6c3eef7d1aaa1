/// Min-max range scaling shared by the heuristic and learned scorers
///
/// Scaling is relative to the batch being scaled: the lowest value in the
/// batch maps to `range.min` and the highest to `range.max`. A wallet's score
/// therefore depends on which other wallets share its batch.

use serde::{Deserialize, Serialize};

use crate::core::{ScoringError, DEFAULT_SCORE_MAX, DEFAULT_SCORE_MIN};

/// Target score interval, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_SCORE_MIN,
            max: DEFAULT_SCORE_MAX,
        }
    }
}

impl ScoreRange {
    pub fn new(min: f64, max: f64) -> Result<Self, ScoringError> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        // Scores are emitted as unsigned integers
        if !self.min.is_finite() || !self.max.is_finite() || self.min < 0.0 || self.min >= self.max {
            return Err(ScoringError::InvalidRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// NaN has no position in the batch; infinities saturate to the largest finite magnitude
fn saturate(value: f64) -> Option<f64> {
    (!value.is_nan()).then(|| value.clamp(-f64::MAX, f64::MAX))
}

/// Min and max over the non-NaN values of a batch, infinities saturated
fn finite_bounds(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .filter_map(|&v| saturate(v))
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Min-max normalize `values` into `range`.
///
/// All-equal batches (including a batch of one) map every element to the
/// range midpoint. NaN inputs are treated as the batch minimum and
/// infinities saturate to `±f64::MAX`.
pub fn scale(values: &[f64], range: ScoreRange) -> Vec<f64> {
    let Some((min_val, max_val)) = finite_bounds(values) else {
        return vec![range.midpoint(); values.len()];
    };

    if max_val == min_val {
        return vec![range.midpoint(); values.len()];
    }

    let denominator = max_val - min_val;
    values
        .iter()
        .map(|&v| {
            let v = saturate(v).unwrap_or(min_val);
            let fraction = if denominator.is_finite() {
                (v - min_val) / denominator
            } else {
                (v / 2.0 - min_val / 2.0) / (max_val / 2.0 - min_val / 2.0)
            };
            range.clamp(fraction * range.span() + range.min)
        })
        .collect()
}

/// Scale non-negative values by the batch maximum, so the top value maps to
/// `range.max` and zero maps to `range.min`.
///
/// Used by the action-tally heuristic. Shares the all-equal midpoint policy
/// with [`scale`].
pub fn scale_by_max(values: &[f64], range: ScoreRange) -> Vec<f64> {
    let Some((min_val, max_val)) = finite_bounds(values) else {
        return vec![range.midpoint(); values.len()];
    };

    if max_val == min_val || max_val <= 0.0 {
        return vec![range.midpoint(); values.len()];
    }

    values
        .iter()
        .map(|&v| {
            let v = saturate(v).unwrap_or(0.0).max(0.0);
            range.clamp(v / max_val * range.span() + range.min)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_endpoints() {
        let scaled = scale(&[3.0, 7.0, 5.0], ScoreRange::default());
        assert_eq!(scaled[0], 0.0);
        assert_eq!(scaled[1], 1000.0);
        assert_eq!(scaled[2], 500.0);
    }

    #[test]
    fn test_scale_outputs_within_range() {
        let range = ScoreRange::new(300.0, 850.0).unwrap();
        let values = [-12.5, 0.0, 4.2, 1e9, 17.0, -3.0];
        for v in scale(&values, range) {
            assert!(v >= 300.0 && v <= 850.0, "{} out of range", v);
        }
    }

    #[test]
    fn test_scale_all_equal_returns_midpoint() {
        let scaled = scale(&[42.0, 42.0, 42.0], ScoreRange::default());
        assert_eq!(scaled, vec![500.0, 500.0, 500.0]);

        let single = scale(&[-7.0], ScoreRange::new(0.0, 10.0).unwrap());
        assert_eq!(single, vec![5.0]);
    }

    #[test]
    fn test_scale_empty_batch() {
        assert!(scale(&[], ScoreRange::default()).is_empty());
    }

    #[test]
    fn test_scale_never_emits_nan() {
        let scaled = scale(&[f64::NAN, 1.0, 2.0], ScoreRange::default());
        assert!(scaled.iter().all(|v| v.is_finite()));
        assert_eq!(scaled[0], 0.0);

        let all_nan = scale(&[f64::NAN, f64::NAN], ScoreRange::default());
        assert_eq!(all_nan, vec![500.0, 500.0]);
    }

    #[test]
    fn test_scale_by_max_top_wallet_gets_max() {
        let scaled = scale_by_max(&[0.0, 5.0, 10.0], ScoreRange::default());
        assert_eq!(scaled, vec![0.0, 500.0, 1000.0]);
    }

    #[test]
    fn test_scale_by_max_degenerate_batches() {
        assert_eq!(scale_by_max(&[7.0], ScoreRange::default()), vec![500.0]);
        assert_eq!(scale_by_max(&[0.0, 0.0], ScoreRange::default()), vec![500.0, 500.0]);
    }

    #[test]
    fn test_infinite_input_saturates_to_top_of_range() {
        let scaled = scale(&[1e6, f64::INFINITY, 0.0], ScoreRange::default());
        assert_eq!(scaled[1], 1000.0);
        assert_eq!(scaled[2], 0.0);
        assert!(scaled[0] < 1.0);

        let spread = scale(&[f64::NEG_INFINITY, 0.0, f64::INFINITY], ScoreRange::default());
        assert_eq!(spread, vec![0.0, 500.0, 1000.0]);

        let by_max = scale_by_max(&[1e6, f64::INFINITY], ScoreRange::default());
        assert_eq!(by_max[1], 1000.0);
    }

    #[test]
    fn test_negative_floor_rejected() {
        assert!(ScoreRange::new(-100.0, 100.0).is_err());
        assert!(ScoreRange::new(0.0, 100.0).is_ok());
    }

    #[test]
    fn test_invalid_range_rejected() {
        assert!(ScoreRange::new(10.0, 10.0).is_err());
        assert!(ScoreRange::new(1000.0, 0.0).is_err());
        assert!(ScoreRange::new(0.0, f64::INFINITY).is_err());
    }
}
