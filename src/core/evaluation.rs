//! Offline evaluation and tuning for the wait-time model.
//!
//! Everything here is read-only with respect to the historical store
//! and deterministic for a fixed seed, so two runs over the same
//! observations produce bit-identical reports. Nothing in this module
//! is ever invoked on the live recommendation path.

use crate::core::geo::{distance_km, kernel_density, multi_radius_counts};
use crate::models::{Facility, FacilityId, WaitTimeObservation};
use chrono::{Datelike, Timelike};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::error::Failed;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};
use std::collections::HashMap;
use std::time::Instant;
use tracing::info;

/// Minimum observations before the hyperparameter search will run
const MIN_SEARCH_SAMPLES: usize = 50;

/// Shrinkage applied to each boosted tree
const BOOSTING_LEARNING_RATE: f64 = 0.1;

type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;
type Tree = DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Train/test split controls shared by all evaluation entry points
#[derive(Debug, Clone, Copy)]
pub struct SplitOptions {
    /// Fraction of rows held out for testing
    pub test_fraction: f64,
    /// Seed for the split shuffle and the forest
    pub seed: u64,
    /// Below this many usable rows the evaluation reports nothing
    pub min_samples: usize,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            min_samples: 20,
        }
    }
}

/// Regression metrics and timings for one evaluation run
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub n_samples: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub train_time_seconds: f64,
    pub predict_time_seconds: f64,
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    /// MAE of predicting the training-set median everywhere; the bar
    /// any model has to clear
    pub baseline_median_mae: f64,
    pub model: String,
    pub features_used: Vec<String>,
}

/// Paired baseline/augmented reports for a feature-set comparison
#[derive(Debug, Clone, Serialize)]
pub struct FeatureComparison {
    pub baseline: Option<EvaluationReport>,
    pub augmented: Option<EvaluationReport>,
}

/// Optional geospatial feature columns for
/// [`evaluate_with_geofeatures`]
#[derive(Debug, Clone)]
pub struct GeoFeatureConfig {
    /// One neighbor-count column per radius
    pub radii_km: Vec<f64>,
    pub include_kernel: bool,
    pub kernel_bandwidth_km: f64,
    /// Patient coordinates are not part of wait-time history, so the
    /// caller supplies an observation id -> (lat, lon) mapping
    pub include_patient_distance: bool,
    pub patient_locations: HashMap<i64, (f64, f64)>,
}

impl Default for GeoFeatureConfig {
    fn default() -> Self {
        Self {
            radii_km: vec![1.0, 5.0, 10.0],
            include_kernel: false,
            kernel_bandwidth_km: 5.0,
            include_patient_distance: false,
            patient_locations: HashMap::new(),
        }
    }
}

/// Hyperparameter grid for [`run_hyperparameter_search`]
#[derive(Debug, Clone)]
pub struct ParamGrid {
    pub n_trees: Vec<u16>,
    pub max_depth: Vec<u16>,
    pub boosted_n_trees: Vec<u16>,
    pub boosted_max_depth: Vec<u16>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            n_trees: vec![50, 100],
            max_depth: vec![5, 10],
            boosted_n_trees: vec![50],
            boosted_max_depth: vec![3],
        }
    }
}

/// Winning parameters for one model family. `best_score` follows the
/// search convention of negative MAE, so larger (closer to zero) is
/// better.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BestParams {
    pub n_trees: u16,
    pub max_depth: u16,
    pub best_score: f64,
}

/// Search result for both model families
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub forest: BestParams,
    pub boosted: BestParams,
}

/// Evaluate the production feature set (facility, severity, hour,
/// weekday) with a single random train/test split.
///
/// Returns `None` when fewer than `min_samples` rows exist; that is a
/// valid "not enough data yet" outcome, not a failure.
pub fn evaluate_baseline(
    observations: &[WaitTimeObservation],
    opts: &SplitOptions,
) -> Option<EvaluationReport> {
    let rows: Vec<Vec<f64>> = observations.iter().map(base_feature_row).collect();
    let labels: Vec<f64> = observations.iter().map(|o| o.wait_minutes as f64).collect();

    evaluate_dataset(
        rows,
        labels,
        base_feature_names(),
        "RandomForestRegressor",
        opts,
    )
}

/// Baseline pipeline plus one extra feature: the count of other
/// facilities within `radius_km` of each observation's facility.
///
/// Quantifies whether geospatial context helps prediction at all.
pub fn evaluate_augmented(
    observations: &[WaitTimeObservation],
    facilities: &[Facility],
    radius_km: f64,
    opts: &SplitOptions,
) -> Option<EvaluationReport> {
    let counts = multi_radius_counts(facilities, &[radius_km]);
    let known: HashMap<FacilityId, &Facility> = facilities.iter().map(|f| (f.id, f)).collect();

    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for obs in observations {
        // Observations for unknown facilities carry no usable geography
        if !known.contains_key(&obs.facility_id) {
            continue;
        }
        let nearby = counts
            .get(&obs.facility_id)
            .and_then(|c| c.first().copied())
            .unwrap_or(0);
        let mut row = base_feature_row(obs);
        row.push(nearby as f64);
        rows.push(row);
        labels.push(obs.wait_minutes as f64);
    }

    let mut names = base_feature_names();
    names.push("nearby_count".to_string());

    evaluate_dataset(rows, labels, names, "RandomForestRegressor_augmented", opts)
}

/// Run baseline and augmented evaluations over the same data so the
/// two reports can be compared side by side.
pub fn compare_baseline_vs_augmented(
    observations: &[WaitTimeObservation],
    facilities: &[Facility],
    radius_km: f64,
    opts: &SplitOptions,
) -> FeatureComparison {
    FeatureComparison {
        baseline: evaluate_baseline(observations, opts),
        augmented: evaluate_augmented(observations, facilities, radius_km, opts),
    }
}

/// Generalized geospatial evaluation: arbitrarily many radius-count
/// columns, an optional kernel-density column, and an optional
/// patient-to-facility distance column.
///
/// The report lists `features_used`, so two runs are comparable by
/// inspecting which columns each included.
pub fn evaluate_with_geofeatures(
    observations: &[WaitTimeObservation],
    facilities: &[Facility],
    config: &GeoFeatureConfig,
    opts: &SplitOptions,
) -> Option<EvaluationReport> {
    let counts = multi_radius_counts(facilities, &config.radii_km);
    let densities = if config.include_kernel {
        kernel_density(facilities, config.kernel_bandwidth_km)
    } else {
        HashMap::new()
    };
    let known: HashMap<FacilityId, &Facility> = facilities.iter().map(|f| (f.id, f)).collect();

    let mut names = base_feature_names();
    for radius in &config.radii_km {
        names.push(format!("count_within_{:.0}km", radius));
    }
    if config.include_kernel {
        names.push("kernel_density".to_string());
    }
    if config.include_patient_distance {
        names.push("patient_distance_km".to_string());
    }

    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for obs in observations {
        let Some(facility) = known.get(&obs.facility_id) else {
            continue;
        };

        let mut row = base_feature_row(obs);
        match counts.get(&obs.facility_id) {
            Some(c) => row.extend(c.iter().map(|n| *n as f64)),
            None => row.extend(std::iter::repeat(0.0).take(config.radii_km.len())),
        }
        if config.include_kernel {
            row.push(densities.get(&obs.facility_id).copied().unwrap_or(0.0));
        }
        if config.include_patient_distance {
            // No recorded patient location means zero distance rather
            // than dropping the row
            let patient_distance = config
                .patient_locations
                .get(&obs.id)
                .map(|(lat, lon)| distance_km(*lat, *lon, facility.latitude, facility.longitude))
                .unwrap_or(0.0);
            row.push(patient_distance);
        }

        rows.push(row);
        labels.push(obs.wait_minutes as f64);
    }

    evaluate_dataset(rows, labels, names, "RandomForestRegressor", opts)
}

/// Grid-search both model families with cross-validated negative MAE.
///
/// `use_time_series` switches from seeded k-fold to expanding
/// chronological folds, which never let a model peek at the future.
/// Needs at least 50 observations; otherwise `None`.
pub fn run_hyperparameter_search(
    observations: &[WaitTimeObservation],
    grid: &ParamGrid,
    cv_splits: usize,
    use_time_series: bool,
    seed: u64,
) -> Option<SearchOutcome> {
    if observations.len() < MIN_SEARCH_SAMPLES || cv_splits < 2 {
        return None;
    }

    let rows: Vec<Vec<f64>> = observations.iter().map(base_feature_row).collect();
    let labels: Vec<f64> = observations.iter().map(|o| o.wait_minutes as f64).collect();

    let folds = if use_time_series {
        chronological_folds(observations, cv_splits)
    } else {
        kfold_indices(rows.len(), cv_splits, seed)
    };
    if folds.is_empty() {
        return None;
    }

    let mut forest_best: Option<BestParams> = None;
    for &n_trees in &grid.n_trees {
        for &max_depth in &grid.max_depth {
            let mae = cross_validated_mae(&rows, &labels, &folds, |x, y| {
                let params = RandomForestRegressorParameters::default()
                    .with_n_trees(n_trees.into())
                    .with_max_depth(max_depth.into())
                    .with_seed(seed);
                Forest::fit(x, y, params).map(FittedModel::Forest)
            })?;
            let candidate = BestParams {
                n_trees,
                max_depth,
                best_score: -mae,
            };
            if forest_best.map_or(true, |b| candidate.best_score > b.best_score) {
                forest_best = Some(candidate);
            }
        }
    }

    let mut boosted_best: Option<BestParams> = None;
    for &n_trees in &grid.boosted_n_trees {
        for &max_depth in &grid.boosted_max_depth {
            let mae = cross_validated_mae(&rows, &labels, &folds, |x, y| {
                BoostedTrees::fit(x, y, n_trees, max_depth, BOOSTING_LEARNING_RATE)
                    .map(FittedModel::Boosted)
            })?;
            let candidate = BestParams {
                n_trees,
                max_depth,
                best_score: -mae,
            };
            if boosted_best.map_or(true, |b| candidate.best_score > b.best_score) {
                boosted_best = Some(candidate);
            }
        }
    }

    let outcome = SearchOutcome {
        forest: forest_best?,
        boosted: boosted_best?,
    };
    info!(
        forest_score = outcome.forest.best_score,
        boosted_score = outcome.boosted.best_score,
        time_series = use_time_series,
        "hyperparameter search finished"
    );
    Some(outcome)
}

// ---------------------------------------------------------------------
// Dataset plumbing

fn base_feature_names() -> Vec<String> {
    ["facility_id", "severity", "hour", "day_of_week"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn base_feature_row(obs: &WaitTimeObservation) -> Vec<f64> {
    vec![
        obs.facility_id as f64,
        obs.severity.encoded(),
        obs.timestamp.hour() as f64,
        obs.timestamp.weekday().num_days_from_monday() as f64,
    ]
}

/// Shared fit-and-score core behind every single-split evaluation
fn evaluate_dataset(
    rows: Vec<Vec<f64>>,
    labels: Vec<f64>,
    features_used: Vec<String>,
    model_name: &str,
    opts: &SplitOptions,
) -> Option<EvaluationReport> {
    let n_samples = rows.len();
    if n_samples < opts.min_samples || n_samples < 2 {
        return None;
    }

    let (train_idx, test_idx) = split_indices(n_samples, opts.test_fraction, opts.seed);

    let train_rows: Vec<Vec<f64>> = train_idx.iter().map(|&i| rows[i].clone()).collect();
    let train_labels: Vec<f64> = train_idx.iter().map(|&i| labels[i]).collect();
    let test_rows: Vec<Vec<f64>> = test_idx.iter().map(|&i| rows[i].clone()).collect();
    let test_labels: Vec<f64> = test_idx.iter().map(|&i| labels[i]).collect();

    let x_train = DenseMatrix::from_2d_vec(&train_rows).ok()?;
    let x_test = DenseMatrix::from_2d_vec(&test_rows).ok()?;

    let params = RandomForestRegressorParameters::default()
        .with_n_trees(100)
        .with_seed(opts.seed);

    let started = Instant::now();
    let model = Forest::fit(&x_train, &train_labels, params).ok()?;
    let train_time_seconds = started.elapsed().as_secs_f64();

    let started = Instant::now();
    let predictions = model.predict(&x_test).ok()?;
    let predict_time_seconds = started.elapsed().as_secs_f64();

    let mae = mean_absolute_error(&test_labels, &predictions);
    let rmse = root_mean_squared_error(&test_labels, &predictions);
    let r2 = r2_score(&test_labels, &predictions);

    let baseline = median(&train_labels);
    let baseline_predictions = vec![baseline; test_labels.len()];
    let baseline_median_mae = mean_absolute_error(&test_labels, &baseline_predictions);

    info!(
        model = model_name,
        n_samples, mae, rmse, r2, "wait-time model evaluated"
    );

    Some(EvaluationReport {
        n_samples,
        train_size: train_rows.len(),
        test_size: test_rows.len(),
        train_time_seconds,
        predict_time_seconds,
        mae,
        rmse,
        r2,
        baseline_median_mae,
        model: model_name.to_string(),
        features_used,
    })
}

/// Seeded random train/test split over row indices
fn split_indices(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_len = ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1);
    let test = indices.split_off(n - test_len);
    (indices, test)
}

/// Seeded k-fold: shuffle once, then each fold in turn is the test set
fn kfold_indices(n: usize, k: usize, seed: u64) -> Vec<(Vec<usize>, Vec<usize>)> {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let fold_size = n / k;
    if fold_size == 0 {
        return Vec::new();
    }

    (0..k)
        .map(|fold| {
            let start = fold * fold_size;
            let end = if fold == k - 1 { n } else { start + fold_size };
            let test: Vec<usize> = indices[start..end].to_vec();
            let train: Vec<usize> = indices[..start]
                .iter()
                .chain(&indices[end..])
                .copied()
                .collect();
            (train, test)
        })
        .collect()
}

/// Expanding chronological folds: train on everything before the test
/// chunk, never after it
fn chronological_folds(
    observations: &[WaitTimeObservation],
    k: usize,
) -> Vec<(Vec<usize>, Vec<usize>)> {
    let mut indices: Vec<usize> = (0..observations.len()).collect();
    indices.sort_by_key(|&i| observations[i].timestamp);

    let n = indices.len();
    let chunk = n / (k + 1);
    if chunk == 0 {
        return Vec::new();
    }

    (1..=k)
        .map(|fold| {
            let split = fold * chunk;
            let end = if fold == k { n } else { split + chunk };
            (indices[..split].to_vec(), indices[split..end].to_vec())
        })
        .collect()
}

/// Either fitted model family, scored the same way during the search
enum FittedModel {
    Forest(Forest),
    Boosted(BoostedTrees),
}

impl FittedModel {
    fn predict(&self, x: &DenseMatrix<f64>) -> Result<Vec<f64>, Failed> {
        match self {
            FittedModel::Forest(forest) => forest.predict(x),
            FittedModel::Boosted(boosted) => boosted.predict(x),
        }
    }
}

/// Mean test-fold MAE for one parameter combination
fn cross_validated_mae<F>(
    rows: &[Vec<f64>],
    labels: &[f64],
    folds: &[(Vec<usize>, Vec<usize>)],
    fit: F,
) -> Option<f64>
where
    F: Fn(&DenseMatrix<f64>, &Vec<f64>) -> Result<FittedModel, Failed>,
{
    let mut total = 0.0;
    for (train_idx, test_idx) in folds {
        if train_idx.is_empty() || test_idx.is_empty() {
            return None;
        }
        let train_rows: Vec<Vec<f64>> = train_idx.iter().map(|&i| rows[i].clone()).collect();
        let train_labels: Vec<f64> = train_idx.iter().map(|&i| labels[i]).collect();
        let test_rows: Vec<Vec<f64>> = test_idx.iter().map(|&i| rows[i].clone()).collect();
        let test_labels: Vec<f64> = test_idx.iter().map(|&i| labels[i]).collect();

        let x_train = DenseMatrix::from_2d_vec(&train_rows).ok()?;
        let x_test = DenseMatrix::from_2d_vec(&test_rows).ok()?;

        let model = fit(&x_train, &train_labels).ok()?;
        let predictions = model.predict(&x_test).ok()?;
        total += mean_absolute_error(&test_labels, &predictions);
    }
    Some(total / folds.len() as f64)
}

/// Gradient-boosted regression trees built from residual fits.
///
/// smartcore ships no boosted regressor, so the boosted family is a
/// plain shrinkage loop over its decision trees: start from the label
/// mean and let each tree fit what the ensemble still gets wrong.
struct BoostedTrees {
    base: f64,
    learning_rate: f64,
    trees: Vec<Tree>,
}

impl BoostedTrees {
    fn fit(
        x: &DenseMatrix<f64>,
        y: &Vec<f64>,
        n_trees: u16,
        max_depth: u16,
        learning_rate: f64,
    ) -> Result<Self, Failed> {
        let base = y.iter().sum::<f64>() / y.len() as f64;
        let mut current = vec![base; y.len()];
        let mut trees = Vec::with_capacity(n_trees as usize);

        for _ in 0..n_trees {
            let residuals: Vec<f64> = y.iter().zip(&current).map(|(yi, ci)| yi - ci).collect();
            let params = DecisionTreeRegressorParameters::default().with_max_depth(max_depth.into());
            let tree = Tree::fit(x, &residuals, params)?;
            let update = tree.predict(x)?;
            for (c, u) in current.iter_mut().zip(&update) {
                *c += learning_rate * u;
            }
            trees.push(tree);
        }

        Ok(Self {
            base,
            learning_rate,
            trees,
        })
    }

    fn predict(&self, x: &DenseMatrix<f64>) -> Result<Vec<f64>, Failed> {
        let mut predictions = vec![self.base; x.shape().0];
        for tree in &self.trees {
            let update = tree.predict(x)?;
            for (p, u) in predictions.iter_mut().zip(&update) {
                *p += self.learning_rate * u;
            }
        }
        Ok(predictions)
    }
}

// ---------------------------------------------------------------------
// Metrics

fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

fn root_mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    (actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64)
        .sqrt()
}

fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    if ss_tot == 0.0 {
        return 0.0;
    }
    1.0 - ss_res / ss_tot
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeverityLevel;
    use chrono::{Duration, TimeZone, Utc};

    fn observation(i: i64) -> WaitTimeObservation {
        let severities = [
            SeverityLevel::Low,
            SeverityLevel::Medium,
            SeverityLevel::High,
            SeverityLevel::Critical,
        ];
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        WaitTimeObservation {
            id: i,
            facility_id: 1 + i % 4,
            severity: severities[(i % 4) as usize],
            timestamp: base + Duration::hours(i),
            // Waits that depend on facility and severity, so there is
            // signal to fit
            wait_minutes: (20 + (i % 4) * 25 + (i % 3) * 7) as u32,
        }
    }

    fn observations(n: i64) -> Vec<WaitTimeObservation> {
        (0..n).map(observation).collect()
    }

    fn facility(id: i64, lat: f64, lon: f64) -> Facility {
        Facility {
            id,
            name: format!("RS {}", id),
            address: String::new(),
            latitude: lat,
            longitude: lon,
            total_beds: 100,
            available_beds: 50,
            emergency_available: true,
        }
    }

    fn facilities() -> Vec<Facility> {
        vec![
            facility(1, -6.2088, 106.8456),
            facility(2, -6.2188, 106.8490),
            facility(3, -6.2600, 106.9000),
            facility(4, -6.9175, 107.6191),
        ]
    }

    #[test]
    fn test_insufficient_data_returns_none() {
        let opts = SplitOptions::default();
        assert!(evaluate_baseline(&observations(19), &opts).is_none());
        assert!(evaluate_augmented(&observations(19), &facilities(), 5.0, &opts).is_none());
        assert!(evaluate_with_geofeatures(
            &observations(19),
            &facilities(),
            &GeoFeatureConfig::default(),
            &opts
        )
        .is_none());
    }

    #[test]
    fn test_baseline_report_shape() {
        let opts = SplitOptions::default();
        let report = evaluate_baseline(&observations(60), &opts).unwrap();

        assert_eq!(report.n_samples, 60);
        assert_eq!(report.train_size + report.test_size, 60);
        assert_eq!(report.test_size, 12);
        assert_eq!(report.model, "RandomForestRegressor");
        assert_eq!(
            report.features_used,
            vec!["facility_id", "severity", "hour", "day_of_week"]
        );
        assert!(report.mae >= 0.0);
        assert!(report.rmse >= report.mae);
        assert!(report.baseline_median_mae >= 0.0);
    }

    #[test]
    fn test_baseline_is_deterministic_for_fixed_seed() {
        let opts = SplitOptions::default();
        let data = observations(80);

        let first = evaluate_baseline(&data, &opts).unwrap();
        let second = evaluate_baseline(&data, &opts).unwrap();

        assert_eq!(first.mae, second.mae);
        assert_eq!(first.rmse, second.rmse);
        assert_eq!(first.r2, second.r2);
        assert_eq!(first.baseline_median_mae, second.baseline_median_mae);
    }

    #[test]
    fn test_augmented_adds_nearby_count_feature() {
        let opts = SplitOptions::default();
        let report = evaluate_augmented(&observations(60), &facilities(), 5.0, &opts).unwrap();

        assert_eq!(report.model, "RandomForestRegressor_augmented");
        assert_eq!(report.features_used.last().unwrap(), "nearby_count");
        assert_eq!(report.features_used.len(), 5);
    }

    #[test]
    fn test_augmented_drops_unknown_facilities() {
        let opts = SplitOptions {
            min_samples: 10,
            ..SplitOptions::default()
        };
        let mut data = observations(40);
        for obs in data.iter_mut().take(25) {
            obs.facility_id = 999;
        }

        // 15 usable rows survive the facility join
        let report = evaluate_augmented(&data, &facilities(), 5.0, &opts).unwrap();
        assert_eq!(report.n_samples, 15);
    }

    #[test]
    fn test_geofeatures_column_list() {
        let opts = SplitOptions::default();
        let mut config = GeoFeatureConfig {
            radii_km: vec![2.0, 10.0],
            include_kernel: true,
            include_patient_distance: true,
            ..GeoFeatureConfig::default()
        };
        config
            .patient_locations
            .insert(0, (-6.2000, 106.8400));

        let report =
            evaluate_with_geofeatures(&observations(60), &facilities(), &config, &opts).unwrap();

        assert_eq!(
            report.features_used,
            vec![
                "facility_id",
                "severity",
                "hour",
                "day_of_week",
                "count_within_2km",
                "count_within_10km",
                "kernel_density",
                "patient_distance_km",
            ]
        );
    }

    #[test]
    fn test_comparison_carries_both_reports() {
        let opts = SplitOptions::default();
        let comparison =
            compare_baseline_vs_augmented(&observations(60), &facilities(), 5.0, &opts);
        assert!(comparison.baseline.is_some());
        assert!(comparison.augmented.is_some());
    }

    #[test]
    fn test_search_requires_fifty_observations() {
        let outcome =
            run_hyperparameter_search(&observations(49), &ParamGrid::default(), 3, false, 42);
        assert!(outcome.is_none());
    }

    #[test]
    fn test_search_reports_both_families() {
        let outcome =
            run_hyperparameter_search(&observations(80), &ParamGrid::default(), 3, false, 42)
                .unwrap();

        let grid = ParamGrid::default();
        assert!(grid.n_trees.contains(&outcome.forest.n_trees));
        assert!(grid.max_depth.contains(&outcome.forest.max_depth));
        assert_eq!(outcome.boosted.n_trees, 50);
        assert_eq!(outcome.boosted.max_depth, 3);
        // neg-MAE convention: scores are non-positive
        assert!(outcome.forest.best_score <= 0.0);
        assert!(outcome.boosted.best_score <= 0.0);
    }

    #[test]
    fn test_search_time_series_split() {
        let outcome =
            run_hyperparameter_search(&observations(80), &ParamGrid::default(), 3, true, 42)
                .unwrap();
        assert!(outcome.forest.best_score.is_finite());
    }

    #[test]
    fn test_split_indices_are_disjoint_and_cover() {
        let (train, test) = split_indices(100, 0.2, 7);
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_chronological_folds_never_train_on_future() {
        let data = observations(40);
        let folds = chronological_folds(&data, 3);
        assert_eq!(folds.len(), 3);
        for (train, test) in &folds {
            let max_train = train.iter().map(|&i| data[i].timestamp).max().unwrap();
            let min_test = test.iter().map(|&i| data[i].timestamp).min().unwrap();
            assert!(max_train < min_test);
        }
    }

    #[test]
    fn test_metric_helpers() {
        let actual = vec![10.0, 20.0, 30.0, 40.0];
        let predicted = vec![12.0, 18.0, 33.0, 37.0];

        assert!((mean_absolute_error(&actual, &predicted) - 2.5).abs() < 1e-12);
        assert!((root_mean_squared_error(&actual, &predicted) - 6.5_f64.sqrt()).abs() < 1e-12);
        assert!(r2_score(&actual, &actual) == 1.0);
        assert_eq!(median(&[1.0, 3.0, 2.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }
}
