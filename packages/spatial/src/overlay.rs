//! Hazard coverage and drainage density per region.
//!
//! Both computations confine a layer to each region polygon (polygon
//! intersection for hazard areas, line clipping for the drainage
//! network) and express the result relative to the region area. Regions
//! are independent of each other; results are keyed by region id so
//! callers can merge them in key order.

use std::collections::BTreeMap;

use geo::{
    Area, BooleanOps, BoundingRect, Euclidean, Intersects, Length, MultiLineString, MultiPolygon,
};

use crate::Region;

/// Relative tolerance before a coverage above 100 % is reported as a
/// geometry defect.
const COVERAGE_TOLERANCE: f64 = 1e-6;

/// Metres per kilometre.
const M_PER_KM: f64 = 1_000.0;

/// Merges overlapping polygons into a single non-overlapping
/// [`MultiPolygon`] in one overlay pass.
#[must_use]
pub fn dissolve(polygons: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    geo::unary_union(polygons.iter())
}

/// Percentage of each region's area covered by `hazard`.
///
/// The hazard layer is dissolved first, so a spot covered by several
/// hazard polygons counts once. An empty hazard layer yields `0.0` for
/// every region. Coverage above 100 % can only come from defective input
/// geometry; it is logged and returned as computed.
#[must_use]
pub fn hazard_coverage_pct(regions: &[Region], hazard: &MultiPolygon<f64>) -> BTreeMap<String, f64> {
    if hazard.0.is_empty() {
        return regions.iter().map(|r| (r.id.clone(), 0.0)).collect();
    }

    let hazard = dissolve(hazard);
    let hazard_bounds = hazard.bounding_rect();

    regions
        .iter()
        .map(|region| {
            let overlaps = match (region.geometry.bounding_rect(), hazard_bounds) {
                (Some(a), Some(b)) => a.intersects(&b),
                _ => false,
            };

            let covered_m2 = if overlaps {
                region.geometry.intersection(&hazard).unsigned_area()
            } else {
                0.0
            };

            let region_m2 = region.area_m2();
            let pct = if region_m2 > 0.0 {
                covered_m2 / region_m2 * 100.0
            } else {
                0.0
            };

            if pct > 100.0 * (1.0 + COVERAGE_TOLERANCE) {
                log::warn!(
                    "Hazard coverage of region {} is {pct:.4}% (> 100%); check input geometry",
                    region.id
                );
            }

            (region.id.clone(), pct)
        })
        .collect()
}

/// Length in metres of `lines` falling inside each region.
#[must_use]
pub fn clipped_length_m(regions: &[Region], lines: &MultiLineString<f64>) -> BTreeMap<String, f64> {
    regions
        .iter()
        .map(|region| {
            let length = if lines.0.is_empty() {
                0.0
            } else {
                Euclidean.length(&region.geometry.clip(lines, false))
            };
            (region.id.clone(), length)
        })
        .collect()
}

/// Kilometres of drainage network per km² of region, combining every
/// line layer in `networks`.
///
/// Zero-area regions get a density of `0.0`.
#[must_use]
pub fn drainage_density(
    regions: &[Region],
    networks: &[&MultiLineString<f64>],
) -> BTreeMap<String, f64> {
    let mut total_m: BTreeMap<String, f64> =
        regions.iter().map(|r| (r.id.clone(), 0.0)).collect();

    for network in networks {
        for (id, length) in clipped_length_m(regions, network) {
            *total_m.entry(id).or_default() += length;
        }
    }

    regions
        .iter()
        .map(|region| {
            let km = total_m.get(&region.id).copied().unwrap_or_default() / M_PER_KM;
            (region.id.clone(), region.per_km2(km))
        })
        .collect()
}
