use crate::models::{CapacityReport, CapacitySnapshot, CapacityStatus, CapacityTrend, Facility};

/// Snapshots considered by the trend analysis window
pub const DEFAULT_TREND_WINDOW: usize = 24;

/// Minimum snapshots required before a trend is reported
const MIN_TREND_SAMPLES: usize = 10;

/// Band at which a utilization shift still counts as stable
const TREND_STABILITY_BAND: f64 = 0.05;

/// Bed occupancy as a percentage of total beds.
///
/// Defined as 0 when the facility reports no beds at all; a facility
/// with no beds has no meaningful occupancy and must not divide by zero.
#[inline]
pub fn occupancy_rate(total_beds: u32, available_beds: u32) -> f64 {
    if total_beds == 0 {
        return 0.0;
    }
    let occupied = total_beds.saturating_sub(available_beds);
    occupied as f64 / total_beds as f64 * 100.0
}

/// Classify an occupancy percentage into a status band.
///
/// Thresholds are fixed design constants: <50 low, <75 moderate,
/// <90 high, else critical.
#[inline]
pub fn classify(occupancy_rate: f64) -> CapacityStatus {
    if occupancy_rate < 50.0 {
        CapacityStatus::Low
    } else if occupancy_rate < 75.0 {
        CapacityStatus::Moderate
    } else if occupancy_rate < 90.0 {
        CapacityStatus::High
    } else {
        CapacityStatus::Critical
    }
}

/// Build the capacity summary for a facility.
///
/// A missing facility yields an `Unknown` report with zeroed numbers
/// rather than an error; dashboard cards render that directly.
pub fn analyze(facility: Option<&Facility>) -> CapacityReport {
    let Some(facility) = facility else {
        return CapacityReport {
            status: CapacityStatus::Unknown,
            available_beds: 0,
            total_beds: 0,
            occupancy_rate: 0.0,
            emergency_available: false,
        };
    };

    let rate = occupancy_rate(facility.total_beds, facility.available_beds);

    CapacityReport {
        status: classify(rate),
        available_beds: facility.available_beds,
        total_beds: facility.total_beds,
        occupancy_rate: (rate * 100.0).round() / 100.0,
        emergency_available: facility.emergency_available,
    }
}

/// Coarse utilization trend over the most recent snapshots.
///
/// Takes up to `window` of the newest snapshots, orders them
/// chronologically, and compares the mean utilization of the older
/// half against the newer half. A shift within ±0.05 is `Stable`;
/// fewer than 10 snapshots is `Stable` by definition.
pub fn trend(snapshots: &[CapacitySnapshot], window: usize) -> CapacityTrend {
    if snapshots.len() < MIN_TREND_SAMPLES {
        return CapacityTrend::Stable;
    }

    let mut recent: Vec<&CapacitySnapshot> = snapshots.iter().collect();
    recent.sort_by_key(|s| s.timestamp);
    if recent.len() > window {
        recent.drain(..recent.len() - window);
    }

    // Snapshots with no beds at all carry no utilization signal
    let ratios: Vec<f64> = recent
        .iter()
        .filter_map(|s| {
            let total = s.available_beds + s.occupied_beds;
            (total > 0).then(|| s.occupied_beds as f64 / total as f64)
        })
        .collect();

    if ratios.len() < 2 {
        return CapacityTrend::Stable;
    }

    let mid = ratios.len() / 2;
    let older_mean = ratios[..mid].iter().sum::<f64>() / mid as f64;
    let newer_mean = ratios[mid..].iter().sum::<f64>() / (ratios.len() - mid) as f64;
    let diff = newer_mean - older_mean;

    if diff > TREND_STABILITY_BAND {
        CapacityTrend::Increasing
    } else if diff < -TREND_STABILITY_BAND {
        CapacityTrend::Decreasing
    } else {
        CapacityTrend::Stable
    }
}
