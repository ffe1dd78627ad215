//! Referral Algo - recommendation and prediction engine for emergency
//! patient routing
//!
//! This library matches an incoming patient to the best available
//! hospital under a weighted tradeoff between travel distance,
//! predicted queueing delay, and remaining bed capacity. It also owns
//! the trainable wait-time model and the offline evaluation harness
//! used to validate model changes before deployment.
//!
//! The crate is read-mostly and stateless apart from the one trained
//! model held by a [`WaitTimePredictor`]; persistence, geocoding, and
//! the dashboard live in external collaborators.

pub mod config;
pub mod core;
pub mod models;

// Re-export commonly used types
pub use crate::core::{
    distance_km, RecommendError, RecommendationEngine, ScoringPolicy, SplitOptions,
    WaitTimePredictor,
};
pub use crate::models::{
    CapacitySnapshot, Facility, Recommendation, ReferralRequest, SeverityLevel,
    WaitTimeObservation,
};
