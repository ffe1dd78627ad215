use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Facility identifier as stored by the upstream registry.
pub type FacilityId = i64;

/// Hospital facility record with location and live bed capacity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub id: FacilityId,
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub total_beds: u32,
    #[serde(default)]
    pub available_beds: u32,
    #[serde(default = "default_true")]
    pub emergency_available: bool,
}

fn default_true() -> bool {
    true
}

/// Patient triage category
///
/// Drives both the regression feature encoding and the scoring policy
/// branch: `Critical` uses a distinct weighting that ignores capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityLevel {
    /// Ordinal encoding used as a regression feature
    pub fn encoded(self) -> f64 {
        match self {
            SeverityLevel::Low => 1.0,
            SeverityLevel::Medium => 2.0,
            SeverityLevel::High => 3.0,
            SeverityLevel::Critical => 4.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeverityLevel::Low => "low",
            SeverityLevel::Medium => "medium",
            SeverityLevel::High => "high",
            SeverityLevel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One historical wait-time measurement for a facility
///
/// Created by upstream ingestion and consumed only for training and
/// evaluation; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitTimeObservation {
    pub id: i64,
    pub facility_id: FacilityId,
    pub severity: SeverityLevel,
    pub timestamp: DateTime<Utc>,
    pub wait_minutes: u32,
}

/// Point-in-time bed occupancy sample for a facility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacitySnapshot {
    pub facility_id: FacilityId,
    pub available_beds: u32,
    pub occupied_beds: u32,
    pub timestamp: DateTime<Utc>,
}

/// Occupancy status band derived from the occupancy rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityStatus {
    Low,
    Moderate,
    High,
    Critical,
    /// Facility could not be resolved; numeric fields are zeroed.
    Unknown,
}

/// Capacity summary for one facility, as shown on dashboard cards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityReport {
    pub status: CapacityStatus,
    pub available_beds: u32,
    pub total_beds: u32,
    pub occupancy_rate: f64,
    pub emergency_available: bool,
}

/// Short-horizon utilization trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityTrend {
    Increasing,
    Decreasing,
    Stable,
}

/// Incoming referral query: where the patient is, how urgent, and how
/// far the caller is willing to transport them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralRequest {
    pub patient_lat: f64,
    pub patient_lon: f64,
    pub severity: SeverityLevel,
    #[serde(default = "default_max_distance_km")]
    pub max_distance_km: f64,
}

fn default_max_distance_km() -> f64 {
    50.0
}

/// Lightweight preview of a runner-up facility (positions 2-4 in the
/// ranked order). Carries no score and no full capacity report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alternative {
    pub name: String,
    pub distance_km: f64,
    pub predicted_wait_minutes: u32,
}

/// Successful referral recommendation
///
/// Pure output: the engine never writes a referral record. Persisting
/// the referral once the caller accepts is the dashboard's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub facility_id: FacilityId,
    pub facility_name: String,
    pub facility_address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_km: f64,
    pub predicted_wait_minutes: u32,
    pub available_beds: u32,
    pub occupancy_rate: f64,
    pub alternatives: Vec<Alternative>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_encoding_is_ordinal() {
        assert_eq!(SeverityLevel::Low.encoded(), 1.0);
        assert_eq!(SeverityLevel::Medium.encoded(), 2.0);
        assert_eq!(SeverityLevel::High.encoded(), 3.0);
        assert_eq!(SeverityLevel::Critical.encoded(), 4.0);
    }

    #[test]
    fn severity_serde_lowercase() {
        let level: SeverityLevel = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(level, SeverityLevel::Critical);
        assert_eq!(serde_json::to_string(&SeverityLevel::Low).unwrap(), "\"low\"");
    }
}
