use crate::models::SeverityLevel;
use serde::{Deserialize, Serialize};

/// Severity-dependent weighting used to rank candidate facilities.
///
/// Scores are *lower is better* and deliberately mix units (km, hours,
/// a 0-1 occupancy ratio): the coefficients are tuning knobs, not a
/// dimensionally consistent cost. The defaults must stay fixed for
/// behavioral compatibility; tuning experiments swap in a different
/// policy value instead of editing the engine.
///
/// * critical: `0.7·distance + 0.3·(wait/60)` — capacity is excluded,
///   proximity and speed dominate for critical patients.
/// * all others: `0.4·distance + 0.3·(wait/60) + 0.3·(occupancy/100)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub critical_distance: f64,
    pub critical_wait: f64,
    pub distance: f64,
    pub wait: f64,
    pub occupancy: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            critical_distance: 0.7,
            critical_wait: 0.3,
            distance: 0.4,
            wait: 0.3,
            occupancy: 0.3,
        }
    }
}

/// Scalar candidate score under the given policy; lower is better.
pub fn score_candidate(
    policy: &ScoringPolicy,
    severity: SeverityLevel,
    distance_km: f64,
    predicted_wait_minutes: u32,
    occupancy_rate: f64,
) -> f64 {
    let wait_hours = predicted_wait_minutes as f64 / 60.0;

    match severity {
        SeverityLevel::Critical => {
            policy.critical_distance * distance_km + policy.critical_wait * wait_hours
        }
        _ => {
            let capacity_score = (100.0 - occupancy_rate) / 100.0;
            policy.distance * distance_km
                + policy.wait * wait_hours
                + policy.occupancy * (1.0 - capacity_score)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let policy = ScoringPolicy::default();
        assert_eq!(policy.critical_distance, 0.7);
        assert_eq!(policy.critical_wait, 0.3);
        assert_eq!(policy.distance, 0.4);
        assert_eq!(policy.wait, 0.3);
        assert_eq!(policy.occupancy, 0.3);
    }

    #[test]
    fn test_critical_score_ignores_occupancy() {
        let policy = ScoringPolicy::default();
        let empty = score_candidate(&policy, SeverityLevel::Critical, 10.0, 30, 5.0);
        let full = score_candidate(&policy, SeverityLevel::Critical, 10.0, 30, 98.0);
        assert_eq!(empty, full);
    }

    #[test]
    fn test_non_critical_score_penalizes_occupancy() {
        let policy = ScoringPolicy::default();
        let empty = score_candidate(&policy, SeverityLevel::High, 10.0, 30, 5.0);
        let full = score_candidate(&policy, SeverityLevel::High, 10.0, 30, 98.0);
        assert!(full > empty);
    }

    #[test]
    fn test_standard_formula_by_hand() {
        let policy = ScoringPolicy::default();
        // 0.4*8 + 0.3*(45/60) + 0.3*(60/100)
        let score = score_candidate(&policy, SeverityLevel::Medium, 8.0, 45, 60.0);
        let expected = 0.4 * 8.0 + 0.3 * 0.75 + 0.3 * 0.6;
        assert!((score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_critical_formula_by_hand() {
        let policy = ScoringPolicy::default();
        // 0.7*8 + 0.3*(45/60)
        let score = score_candidate(&policy, SeverityLevel::Critical, 8.0, 45, 60.0);
        let expected = 0.7 * 8.0 + 0.3 * 0.75;
        assert!((score - expected).abs() < 1e-12);
    }
}
