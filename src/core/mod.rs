// Core algorithm exports
pub mod capacity;
pub mod evaluation;
pub mod geo;
pub mod predictor;
pub mod recommend;
pub mod scoring;

pub use evaluation::{
    compare_baseline_vs_augmented, evaluate_augmented, evaluate_baseline,
    evaluate_with_geofeatures, run_hyperparameter_search, EvaluationReport, GeoFeatureConfig,
    ParamGrid, SearchOutcome, SplitOptions,
};
pub use geo::{distance_km, kernel_density, multi_radius_counts};
pub use predictor::{PredictorSettings, TrainError, WaitTimePredictor};
pub use recommend::{RecommendError, RecommendationEngine};
pub use scoring::{score_candidate, ScoringPolicy};
