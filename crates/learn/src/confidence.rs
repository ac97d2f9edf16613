use serde::{Deserialize, Serialize};
use tagwise_core::{Correction, ValidationError};

pub const INITIAL_CONFIDENCE: f64 = 0.5;
pub const REINFORCEMENT_STEP: f64 = 0.1;
pub const PRUNE_THRESHOLD: f64 = 0.3;

/// Slack in the prune comparison. Absorbs the rounding of decimal steps
/// (`0.7 - 0.4` is `0.29999999999999993`) and nothing larger.
const PRUNE_TOLERANCE: f64 = 4.0 * f64::EPSILON;

pub fn clamp_confidence(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Outcome of applying feedback to a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Adjusted {
    Kept(Correction),
    Pruned,
}

/// Arithmetic for strengthening, weakening and pruning rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidencePolicy {
    /// Confidence given to a rule the first time its pattern is seen.
    pub initial: f64,
    /// Added on every reuse through `create_or_update`.
    pub step: f64,
    /// Feedback that leaves a rule strictly below this deletes it.
    pub prune_below: f64,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            initial: INITIAL_CONFIDENCE,
            step: REINFORCEMENT_STEP,
            prune_below: PRUNE_THRESHOLD,
        }
    }
}

impl ConfidencePolicy {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [
            ("initial", self.initial),
            ("step", self.step),
            ("prune_below", self.prune_below),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::InvalidPolicy(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.initial < self.prune_below {
            return Err(ValidationError::InvalidPolicy(format!(
                "initial ({}) is below prune_below ({})",
                self.initial, self.prune_below
            )));
        }
        Ok(())
    }

    /// Applied when a pattern is taught again.
    pub fn reinforce(&self, mut rule: Correction) -> Correction {
        rule.confidence = clamp_confidence(rule.confidence + self.step);
        rule.times_applied = rule.times_applied.saturating_add(1);
        rule
    }

    /// Feedback: moves confidence by `delta`, pruning below the threshold.
    /// `times_applied` is left as is.
    pub fn adjust(&self, mut rule: Correction, delta: f64) -> Adjusted {
        let confidence = clamp_confidence(rule.confidence + delta);
        if confidence < self.prune_below - PRUNE_TOLERANCE {
            return Adjusted::Pruned;
        }
        rule.confidence = confidence;
        Adjusted::Kept(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tagwise_core::{MatchType, PatternKey};

    fn rule(confidence: f64) -> Correction {
        let key = PatternKey::new("NETFLIX", MatchType::Exact).unwrap();
        Correction::new(key, vec![], confidence, None, None, Utc::now())
    }

    fn kept(adjusted: Adjusted) -> Correction {
        match adjusted {
            Adjusted::Kept(c) => c,
            Adjusted::Pruned => panic!("expected rule to survive"),
        }
    }

    #[test]
    fn reinforce_steps_confidence_and_counts() {
        let policy = ConfidencePolicy::default();
        let once = policy.reinforce(rule(0.5));
        assert_eq!(once.confidence, 0.6);
        assert_eq!(once.times_applied, 1);

        let twice = policy.reinforce(once);
        assert_eq!(twice.confidence, 0.7);
        assert_eq!(twice.times_applied, 2);
    }

    #[test]
    fn reinforce_saturates_at_one() {
        let policy = ConfidencePolicy::default();
        let r = policy.reinforce(rule(1.0));
        assert_eq!(r.confidence, 1.0);
        let r = policy.reinforce(rule(0.95));
        assert_eq!(r.confidence, 1.0);
    }

    #[test]
    fn adjust_prunes_strictly_below_threshold() {
        let policy = ConfidencePolicy::default();
        assert_eq!(policy.adjust(rule(0.5), -0.3), Adjusted::Pruned);
        assert_eq!(policy.adjust(rule(0.3), -0.0001), Adjusted::Pruned);
        assert_eq!(kept(policy.adjust(rule(0.5), -0.2)).confidence, 0.3);
    }

    #[test]
    fn decimal_drift_at_threshold_is_kept() {
        let policy = ConfidencePolicy::default();
        let r = kept(policy.adjust(rule(0.7), -0.4));
        assert!((r.confidence - 0.3).abs() < 1e-12);
    }

    #[test]
    fn tiny_negative_delta_at_threshold_prunes() {
        let policy = ConfidencePolicy::default();
        assert_eq!(policy.adjust(rule(0.3), -1e-10), Adjusted::Pruned);
        assert_eq!(policy.adjust(rule(0.3), -1e-12), Adjusted::Pruned);
    }

    #[test]
    fn tiny_positive_delta_is_not_swallowed() {
        let policy = ConfidencePolicy::default();
        assert_eq!(kept(policy.adjust(rule(0.5), 1e-10)).confidence, 0.5 + 1e-10);
    }

    #[test]
    fn adjust_clamps_both_ends() {
        let policy = ConfidencePolicy::default();
        assert_eq!(kept(policy.adjust(rule(0.9), 5.0)).confidence, 1.0);
        assert_eq!(policy.adjust(rule(0.9), -5.0), Adjusted::Pruned);
    }

    #[test]
    fn adjust_leaves_times_applied_alone() {
        let policy = ConfidencePolicy::default();
        let mut r = rule(0.5);
        r.times_applied = 4;
        assert_eq!(kept(policy.adjust(r, 0.2)).times_applied, 4);
    }

    #[test]
    fn zero_threshold_never_prunes() {
        let policy = ConfidencePolicy {
            prune_below: 0.0,
            ..ConfidencePolicy::default()
        };
        assert_eq!(kept(policy.adjust(rule(0.5), -1.0)).confidence, 0.0);
    }

    #[test]
    fn default_policy_is_valid() {
        assert!(ConfidencePolicy::default().validate().is_ok());
    }

    #[test]
    fn policy_validation_rejects_bad_values() {
        let out_of_range = ConfidencePolicy {
            step: 1.5,
            ..ConfidencePolicy::default()
        };
        assert!(out_of_range.validate().is_err());

        let nan = ConfidencePolicy {
            initial: f64::NAN,
            ..ConfidencePolicy::default()
        };
        assert!(nan.validate().is_err());

        let born_prunable = ConfidencePolicy {
            initial: 0.2,
            ..ConfidencePolicy::default()
        };
        assert!(matches!(
            born_prunable.validate(),
            Err(ValidationError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn clamp_confidence_bounds() {
        assert_eq!(clamp_confidence(-0.2), 0.0);
        assert_eq!(clamp_confidence(1.2), 1.0);
        assert_eq!(clamp_confidence(0.1234567891), 0.1234567891);
    }
}
