use crate::models::{FacilityId, SeverityLevel, WaitTimeObservation};
use chrono::{DateTime, Datelike, Timelike, Utc};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::error::Failed;
use smartcore::linalg::basic::matrix::DenseMatrix;
use thiserror::Error;
use tracing::{info, warn};

/// Minimum observations required before a model can be fit
pub const MIN_TRAINING_SAMPLES: usize = 10;

/// Floor applied to every trained prediction, in minutes
pub const DEFAULT_MIN_WAIT_MINUTES: u32 = 5;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Errors raised while fitting the wait-time model
///
/// A failed `train` never regresses an existing model; the predictor
/// keeps whatever state it had before the call.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("not enough observations to train: got {got}, need {needed}")]
    InsufficientData { got: usize, needed: usize },

    #[error("model fit failed: {0}")]
    Fit(#[from] Failed),
}

/// Wait-time model as an explicit tagged state, not a boolean flag
enum Model {
    Untrained,
    Trained {
        forest: Forest,
        trained_at: DateTime<Utc>,
    },
}

/// Tunable knobs for the wait-time regressor
#[derive(Debug, Clone, Copy)]
pub struct PredictorSettings {
    pub n_trees: u16,
    pub seed: u64,
    pub min_wait_minutes: u32,
}

impl Default for PredictorSettings {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            min_wait_minutes: DEFAULT_MIN_WAIT_MINUTES,
        }
    }
}

/// Predicts expected emergency-department wait in minutes from
/// (facility, severity, hour of day, day of week).
///
/// Holds at most one trained model for the process lifetime; `train`
/// replaces the whole model, there is no incremental update. `predict`
/// takes `&self` and is safe for concurrent read-only use; callers must
/// not run `train` concurrently with anything else (single writer, many
/// readers), which `&mut self` enforces within one instance.
pub struct WaitTimePredictor {
    model: Model,
    settings: PredictorSettings,
}

impl WaitTimePredictor {
    pub fn new(settings: PredictorSettings) -> Self {
        Self {
            model: Model::Untrained,
            settings,
        }
    }

    pub fn is_trained(&self) -> bool {
        matches!(self.model, Model::Trained { .. })
    }

    /// When the current model was fit, if any
    pub fn trained_at(&self) -> Option<DateTime<Utc>> {
        match &self.model {
            Model::Trained { trained_at, .. } => Some(*trained_at),
            Model::Untrained => None,
        }
    }

    /// Fit a fresh model from a snapshot of historical observations.
    ///
    /// Returns the number of samples used. Needs at least
    /// [`MIN_TRAINING_SAMPLES`] rows; below that the call fails and the
    /// current model (trained or not) is left untouched.
    pub fn train(&mut self, observations: &[WaitTimeObservation]) -> Result<usize, TrainError> {
        if observations.len() < MIN_TRAINING_SAMPLES {
            return Err(TrainError::InsufficientData {
                got: observations.len(),
                needed: MIN_TRAINING_SAMPLES,
            });
        }

        let rows: Vec<Vec<f64>> = observations.iter().map(feature_row).collect();
        let labels: Vec<f64> = observations.iter().map(|o| o.wait_minutes as f64).collect();

        let x = DenseMatrix::from_2d_vec(&rows)?;
        let params = RandomForestRegressorParameters::default()
            .with_n_trees(self.settings.n_trees.into())
            .with_seed(self.settings.seed);
        let forest = RandomForestRegressor::fit(&x, &labels, params)?;

        info!(samples = observations.len(), "wait-time model trained");
        self.model = Model::Trained {
            forest,
            trained_at: Utc::now(),
        };
        Ok(observations.len())
    }

    /// Predict the expected wait in minutes for one facility/severity.
    ///
    /// Never fails: an untrained model or any internal prediction fault
    /// degrades to the static fallback table, so a referral decision is
    /// never blocked by the model. Trained output is floored at
    /// `min_wait_minutes`. The feature vector uses the current
    /// wall-clock hour and day, always predicting "right now".
    pub fn predict(&self, facility_id: FacilityId, severity: SeverityLevel) -> u32 {
        let Model::Trained { forest, .. } = &self.model else {
            return fallback_wait(severity);
        };

        let now = Utc::now();
        let row = vec![vec![
            facility_id as f64,
            severity.encoded(),
            now.hour() as f64,
            now.weekday().num_days_from_monday() as f64,
        ]];

        let raw = DenseMatrix::from_2d_vec(&row)
            .and_then(|x| forest.predict(&x))
            .map(|preds| preds.first().copied().unwrap_or(f64::NAN));

        match raw {
            Ok(minutes) if minutes.is_finite() => {
                (minutes as i64).max(self.settings.min_wait_minutes as i64) as u32
            }
            Ok(minutes) => {
                warn!(facility_id, %severity, minutes, "non-finite prediction, using fallback");
                fallback_wait(severity)
            }
            Err(err) => {
                warn!(facility_id, %severity, error = %err, "prediction failed, using fallback");
                fallback_wait(severity)
            }
        }
    }
}

impl Default for WaitTimePredictor {
    fn default() -> Self {
        Self::new(PredictorSettings::default())
    }
}

/// Static severity -> minutes table used whenever no trained model is
/// available or a prediction faults.
///
/// Critical is deliberately shorter than medium/high: it models triage
/// priority, not case difficulty.
pub const fn fallback_wait(severity: SeverityLevel) -> u32 {
    match severity {
        SeverityLevel::Low => 30,
        SeverityLevel::Medium => 60,
        SeverityLevel::High => 90,
        SeverityLevel::Critical => 15,
    }
}

/// Feature vector: (facility id, severity 1-4, hour 0-23, weekday 0-6
/// with Monday = 0)
fn feature_row(obs: &WaitTimeObservation) -> Vec<f64> {
    vec![
        obs.facility_id as f64,
        obs.severity.encoded(),
        obs.timestamp.hour() as f64,
        obs.timestamp.weekday().num_days_from_monday() as f64,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn observation(
        id: i64,
        facility_id: FacilityId,
        severity: SeverityLevel,
        hours_ago: i64,
        wait_minutes: u32,
    ) -> WaitTimeObservation {
        WaitTimeObservation {
            id,
            facility_id,
            severity,
            timestamp: Utc::now() - Duration::hours(hours_ago),
            wait_minutes,
        }
    }

    #[test]
    fn test_fallback_table_when_untrained() {
        let predictor = WaitTimePredictor::default();
        assert!(!predictor.is_trained());

        // Same table regardless of facility id
        for facility_id in [1, 99, 12345] {
            assert_eq!(predictor.predict(facility_id, SeverityLevel::Low), 30);
            assert_eq!(predictor.predict(facility_id, SeverityLevel::Medium), 60);
            assert_eq!(predictor.predict(facility_id, SeverityLevel::High), 90);
            assert_eq!(predictor.predict(facility_id, SeverityLevel::Critical), 15);
        }
    }

    #[test]
    fn test_train_rejects_insufficient_data() {
        let mut predictor = WaitTimePredictor::default();
        let observations: Vec<WaitTimeObservation> = (0..9)
            .map(|i| observation(i, 1, SeverityLevel::Medium, i, 45))
            .collect();

        let err = predictor.train(&observations).unwrap_err();
        assert!(matches!(
            err,
            TrainError::InsufficientData { got: 9, needed: 10 }
        ));
        assert!(!predictor.is_trained());
    }

    #[test]
    fn test_failed_train_keeps_existing_model() {
        let mut predictor = WaitTimePredictor::default();
        let observations: Vec<WaitTimeObservation> = (0..20)
            .map(|i| observation(i, 1 + i % 3, SeverityLevel::Medium, i, 40 + i as u32))
            .collect();

        predictor.train(&observations).unwrap();
        assert!(predictor.is_trained());
        let trained_at = predictor.trained_at();

        assert!(predictor.train(&observations[..3]).is_err());
        assert!(predictor.is_trained());
        assert_eq!(predictor.trained_at(), trained_at);
    }

    #[test]
    fn test_trained_prediction_has_minimum_floor() {
        let mut predictor = WaitTimePredictor::default();
        // All observed waits are zero, so the raw prediction is ~0 and
        // must be clamped up to the floor
        let observations: Vec<WaitTimeObservation> = (0..30)
            .map(|i| observation(i, 1 + i % 4, SeverityLevel::Low, i, 0))
            .collect();

        predictor.train(&observations).unwrap();
        let minutes = predictor.predict(1, SeverityLevel::Low);
        assert_eq!(minutes, DEFAULT_MIN_WAIT_MINUTES);
    }

    #[test]
    fn test_retrain_replaces_model() {
        let mut predictor = WaitTimePredictor::default();
        let low: Vec<WaitTimeObservation> = (0..15)
            .map(|i| observation(i, 1, SeverityLevel::Medium, i, 0))
            .collect();
        let high: Vec<WaitTimeObservation> = (0..15)
            .map(|i| observation(i, 1, SeverityLevel::Medium, i, 600))
            .collect();

        predictor.train(&low).unwrap();
        let before = predictor.predict(1, SeverityLevel::Medium);

        predictor.train(&high).unwrap();
        let after = predictor.predict(1, SeverityLevel::Medium);

        assert_eq!(before, DEFAULT_MIN_WAIT_MINUTES);
        assert!(after > before, "retraining should replace the old fit");
    }
}
