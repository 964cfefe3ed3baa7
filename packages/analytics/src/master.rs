//! Master table assembly.
//!
//! Every fragment is left-joined onto the region set. A region missing
//! from a fragment gets `0`, except for `mean_hdi`, which gets the mean
//! over the regions that did match so that missing socio-economic data
//! neither penalizes nor favors a region.

use std::collections::BTreeMap;

use urban_risk_models::RegionIndicators;
use urban_risk_spatial::Region;

use crate::CountShare;

/// Per-region outputs of the aggregation and overlay stages, all keyed by
/// region id.
#[derive(Debug, Clone, Default)]
pub struct IndicatorFragments {
    /// Waste complaint counts and shares.
    pub waste: BTreeMap<String, CountShare>,
    /// Flood occurrence counts and shares.
    pub flooding: BTreeMap<String, CountShare>,
    /// Mean HDI of matched regions.
    pub hdi: BTreeMap<String, f64>,
    /// Geological risk coverage in percent.
    pub geo_risk_pct: BTreeMap<String, f64>,
    /// Flood-prone coverage in percent.
    pub flood_risk_pct: BTreeMap<String, f64>,
    /// Drainage network density in km/km².
    pub drainage_density: BTreeMap<String, f64>,
}

/// Mean of the values, or `None` if there are none.
#[allow(clippy::cast_precision_loss)]
fn mean<'a>(values: impl ExactSizeIterator<Item = &'a f64>) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    Some(values.sum::<f64>() / n as f64)
}

/// Logs labels of a fragment that no region carries. Their values take no
/// part in the master table.
fn warn_unmatched<V>(fragment: &str, values: &BTreeMap<String, V>, regions: &[Region]) {
    let unmatched: Vec<&str> = values
        .keys()
        .filter(|label| !regions.iter().any(|r| &r.id == *label))
        .map(String::as_str)
        .collect();

    if !unmatched.is_empty() {
        log::warn!("{fragment}: labels {unmatched:?} match no region and are ignored");
    }
}

/// Builds one [`RegionIndicators`] row per region, in region order.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn assemble(regions: &[Region], fragments: &IndicatorFragments) -> Vec<RegionIndicators> {
    warn_unmatched("Waste", &fragments.waste, regions);
    warn_unmatched("Flooding", &fragments.flooding, regions);
    warn_unmatched("HDI", &fragments.hdi, regions);

    let matched_hdi: Vec<f64> = regions
        .iter()
        .filter_map(|r| fragments.hdi.get(&r.id).copied())
        .collect();
    let hdi_fill = mean(matched_hdi.iter()).unwrap_or_else(|| {
        log::warn!("HDI: no region matched any neighborhood; filling with 0");
        0.0
    });

    let lookup = |map: &BTreeMap<String, f64>, id: &str| map.get(id).copied().unwrap_or(0.0);

    regions
        .iter()
        .map(|region| {
            let waste = fragments.waste.get(&region.id).copied().unwrap_or_default();
            let flooding = fragments
                .flooding
                .get(&region.id)
                .copied()
                .unwrap_or_default();

            RegionIndicators {
                region_id: region.id.clone(),
                area_km2: region.area_km2,
                waste_count: waste.count,
                waste_pct_of_city: waste.pct_of_city,
                waste_density: region.per_km2(waste.count as f64),
                flood_count: flooding.count,
                flood_pct_of_city: flooding.pct_of_city,
                mean_hdi: fragments.hdi.get(&region.id).copied().unwrap_or(hdi_fill),
                pct_area_geo_risk: lookup(&fragments.geo_risk_pct, &region.id),
                pct_area_flood_risk: lookup(&fragments.flood_risk_pct, &region.id),
                drainage_density: lookup(&fragments.drainage_density, &region.id),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{MultiPolygon, polygon};

    fn square(id: &str, x0: f64, side: f64) -> Region {
        Region::new(
            id,
            MultiPolygon::new(vec![polygon![
                (x: x0, y: 9_585_000.0),
                (x: x0 + side, y: 9_585_000.0),
                (x: x0 + side, y: 9_585_000.0 + side),
                (x: x0, y: 9_585_000.0 + side),
            ]]),
        )
    }

    fn regions() -> Vec<Region> {
        vec![
            square("SER I", 550_000.0, 2_000.0),
            square("SER II", 560_000.0, 1_000.0),
            square("SER III", 570_000.0, 1_000.0),
        ]
    }

    #[test]
    fn fills_missing_joins_with_zero() {
        let mut fragments = IndicatorFragments::default();
        fragments.waste.insert(
            "SER I".to_string(),
            CountShare {
                count: 8,
                pct_of_city: 100.0,
            },
        );

        let table = assemble(&regions(), &fragments);
        assert_eq!(table.len(), 3);

        let first = &table[0];
        assert_eq!(first.region_id, "SER I");
        assert_eq!(first.waste_count, 8);
        assert!((first.area_km2 - 4.0).abs() < 1e-9);
        assert!((first.waste_density - 2.0).abs() < 1e-9);

        let second = &table[1];
        assert_eq!(second.waste_count, 0);
        assert!(second.waste_density.abs() < f64::EPSILON);
        assert_eq!(second.flood_count, 0);
        assert!(second.pct_area_geo_risk.abs() < f64::EPSILON);
        assert!(second.drainage_density.abs() < f64::EPSILON);
    }

    #[test]
    fn missing_hdi_gets_mean_of_matched_regions() {
        let mut fragments = IndicatorFragments::default();
        fragments.hdi.insert("SER I".to_string(), 0.6);
        fragments.hdi.insert("SER II".to_string(), 0.8);
        fragments.hdi.insert("Elsewhere".to_string(), 0.1);

        let table = assemble(&regions(), &fragments);
        assert!((table[0].mean_hdi - 0.6).abs() < 1e-12);
        assert!((table[1].mean_hdi - 0.8).abs() < 1e-12);
        assert!(
            (table[2].mean_hdi - 0.7).abs() < 1e-12,
            "unmatched region should get the mean of matched regions, got {}",
            table[2].mean_hdi
        );
    }

    #[test]
    fn no_hdi_at_all_fills_zero() {
        let table = assemble(&regions(), &IndicatorFragments::default());
        assert!(table.iter().all(|r| r.mean_hdi.abs() < f64::EPSILON));
    }

    #[test]
    fn zero_area_region_has_zero_density() {
        let degenerate = Region::new("SER X", MultiPolygon::new(Vec::new()));
        let mut fragments = IndicatorFragments::default();
        fragments.waste.insert(
            "SER X".to_string(),
            CountShare {
                count: 5,
                pct_of_city: 100.0,
            },
        );

        let table = assemble(&[degenerate], &fragments);
        assert_eq!(table[0].waste_count, 5);
        assert!(table[0].waste_density.abs() < f64::EPSILON);
    }
}
