use crate::core::capacity;
use crate::core::geo::distance_km;
use crate::core::predictor::WaitTimePredictor;
use crate::core::scoring::{score_candidate, ScoringPolicy};
use crate::models::{
    Alternative, CapacityReport, Facility, Recommendation, ReferralRequest,
};
use thiserror::Error;
use tracing::debug;

/// Number of runner-up facilities returned alongside the primary pick
const ALTERNATIVE_COUNT: usize = 3;

/// Structured "no result" outcomes of [`RecommendationEngine::recommend`]
///
/// `NoneAvailable` and `NoneInRange` are distinct so callers can tell
/// "no supply at all" apart from "no supply within range".
#[derive(Debug, Error, PartialEq)]
pub enum RecommendError {
    #[error("no hospitals available")]
    NoneAvailable,

    #[error("no hospitals within {max_distance_km}km")]
    NoneInRange { max_distance_km: f64 },

    #[error("invalid patient coordinates ({latitude}, {longitude})")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("maximum distance must be positive and finite, got {0}")]
    InvalidMaxDistance(f64),
}

/// Candidate facility with its computed features; lives only inside
/// one `recommend` call.
struct ScoredCandidate<'a> {
    facility: &'a Facility,
    distance_km: f64,
    predicted_wait_minutes: u32,
    capacity: CapacityReport,
    score: f64,
}

/// Matches an incoming patient to the best available facility under a
/// weighted tradeoff between travel distance, predicted wait, and
/// remaining capacity.
///
/// # Pipeline
/// 1. Availability filter: beds free and emergency services offered
/// 2. Range filter: great-circle distance within the caller's limit
/// 3. Per-candidate wait prediction and capacity analysis
/// 4. Severity-dependent scoring (lower is better) and ranking
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    policy: ScoringPolicy,
}

impl RecommendationEngine {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    pub fn with_default_policy() -> Self {
        Self {
            policy: ScoringPolicy::default(),
        }
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Recommend the best facility for a referral request.
    ///
    /// Read-only: never writes a referral record. Ties in the score
    /// ranking break on the lower facility id, so results are
    /// deterministic regardless of input order.
    pub fn recommend(
        &self,
        facilities: &[Facility],
        predictor: &WaitTimePredictor,
        request: &ReferralRequest,
    ) -> Result<Recommendation, RecommendError> {
        validate_request(request)?;

        let available: Vec<&Facility> = facilities
            .iter()
            .filter(|f| f.available_beds > 0 && f.emergency_available)
            .collect();

        if available.is_empty() {
            return Err(RecommendError::NoneAvailable);
        }

        let mut candidates: Vec<ScoredCandidate> = available
            .into_iter()
            .filter_map(|facility| {
                let distance = distance_km(
                    request.patient_lat,
                    request.patient_lon,
                    facility.latitude,
                    facility.longitude,
                );
                if distance > request.max_distance_km {
                    return None;
                }

                let predicted_wait_minutes = predictor.predict(facility.id, request.severity);
                let capacity = capacity::analyze(Some(facility));
                let score = score_candidate(
                    &self.policy,
                    request.severity,
                    distance,
                    predicted_wait_minutes,
                    capacity.occupancy_rate,
                );

                Some(ScoredCandidate {
                    facility,
                    distance_km: distance,
                    predicted_wait_minutes,
                    capacity,
                    score,
                })
            })
            .collect();

        if candidates.is_empty() {
            return Err(RecommendError::NoneInRange {
                max_distance_km: request.max_distance_km,
            });
        }

        // Ascending by score; equal scores go to the lower facility id
        candidates.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.facility.id.cmp(&b.facility.id))
        });

        let alternatives: Vec<Alternative> = candidates
            .iter()
            .skip(1)
            .take(ALTERNATIVE_COUNT)
            .map(|c| Alternative {
                name: c.facility.name.clone(),
                distance_km: c.distance_km,
                predicted_wait_minutes: c.predicted_wait_minutes,
            })
            .collect();

        let best = &candidates[0];
        debug!(
            facility_id = best.facility.id,
            score = best.score,
            candidates = candidates.len(),
            "referral recommendation ranked"
        );

        Ok(Recommendation {
            facility_id: best.facility.id,
            facility_name: best.facility.name.clone(),
            facility_address: best.facility.address.clone(),
            latitude: best.facility.latitude,
            longitude: best.facility.longitude,
            distance_km: best.distance_km,
            predicted_wait_minutes: best.predicted_wait_minutes,
            available_beds: best.capacity.available_beds,
            occupancy_rate: best.capacity.occupancy_rate,
            alternatives,
        })
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::with_default_policy()
    }
}

/// Reject malformed input at the boundary instead of producing
/// nonsense distances downstream.
fn validate_request(request: &ReferralRequest) -> Result<(), RecommendError> {
    let lat_ok = request.patient_lat.is_finite() && request.patient_lat.abs() <= 90.0;
    let lon_ok = request.patient_lon.is_finite() && request.patient_lon.abs() <= 180.0;
    if !lat_ok || !lon_ok {
        return Err(RecommendError::InvalidCoordinates {
            latitude: request.patient_lat,
            longitude: request.patient_lon,
        });
    }
    if !request.max_distance_km.is_finite() || request.max_distance_km <= 0.0 {
        return Err(RecommendError::InvalidMaxDistance(request.max_distance_km));
    }
    Ok(())
}
