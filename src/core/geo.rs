use crate::models::{Facility, FacilityId};
use std::collections::HashMap;

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the great-circle (haversine) distance between two points
/// in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// For each facility, count the other facilities within each radius.
///
/// Radii are processed in the order given, and the returned counts keep
/// that order. A facility never counts itself.
///
/// O(n² · r) over the facility list; fine for registry sizes up to a
/// few thousand. Swap in a spatial grid or R-tree if that ceiling is
/// hit, as long as the counts stay identical.
pub fn multi_radius_counts(
    facilities: &[Facility],
    radii_km: &[f64],
) -> HashMap<FacilityId, Vec<u32>> {
    let mut result = HashMap::with_capacity(facilities.len());

    for facility in facilities {
        let mut counts = vec![0u32; radii_km.len()];
        for other in facilities {
            if other.id == facility.id {
                continue;
            }
            let d = distance_km(
                facility.latitude,
                facility.longitude,
                other.latitude,
                other.longitude,
            );
            for (count, radius) in counts.iter_mut().zip(radii_km) {
                if d <= *radius {
                    *count += 1;
                }
            }
        }
        result.insert(facility.id, counts);
    }

    result
}

/// Unnormalized Gaussian kernel density at each facility's location,
/// using every other facility as a kernel center.
///
/// `Σ exp(-0.5 · (d / bandwidth)²)` over all other facilities; larger
/// values mean denser facility clusters. Self-contribution is excluded.
pub fn kernel_density(facilities: &[Facility], bandwidth_km: f64) -> HashMap<FacilityId, f64> {
    // Guard against a zero bandwidth collapsing the kernel
    let bandwidth = bandwidth_km.max(1e-9);
    let mut density = HashMap::with_capacity(facilities.len());

    for facility in facilities {
        let mut sum = 0.0;
        for other in facilities {
            if other.id == facility.id {
                continue;
            }
            let d = distance_km(
                facility.latitude,
                facility.longitude,
                other.latitude,
                other.longitude,
            );
            sum += (-0.5 * (d / bandwidth).powi(2)).exp();
        }
        density.insert(facility.id, sum);
    }

    density
}
