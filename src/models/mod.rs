// Model exports
pub mod domain;

pub use domain::{
    Alternative, CapacityReport, CapacitySnapshot, CapacityStatus, CapacityTrend, Facility,
    FacilityId, Recommendation, ReferralRequest, SeverityLevel, WaitTimeObservation,
};
