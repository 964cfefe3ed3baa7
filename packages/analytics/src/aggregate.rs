//! Attribute aggregation: tabular records to per-region values.

use std::collections::BTreeMap;

use urban_risk_source::rules::{FloodRule, WasteRule};
use urban_risk_source::{ComplaintRecord, HdiRecord, OccurrenceRecord};

/// A per-region count and its share of the citywide total.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CountShare {
    /// Records attributed to the region.
    pub count: u64,
    /// `count / citywide total * 100`; `0` when the total is zero.
    pub pct_of_city: f64,
}

/// Attaches each label's share of the sum of all counts.
#[allow(clippy::cast_precision_loss)]
fn with_city_share(counts: BTreeMap<String, u64>) -> BTreeMap<String, CountShare> {
    let total: u64 = counts.values().sum();

    counts
        .into_iter()
        .map(|(label, count)| {
            let pct_of_city = if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            (label, CountShare { count, pct_of_city })
        })
        .collect()
}

/// Counts waste-related complaints per zone label.
#[must_use]
pub fn aggregate_waste(
    records: &[ComplaintRecord],
    rule: &WasteRule,
) -> BTreeMap<String, CountShare> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for record in records.iter().filter(|r| rule.is_waste(r)) {
        *counts.entry(record.zone.trim().to_string()).or_default() += 1;
    }

    let result = with_city_share(counts);
    log::info!(
        "Waste: {} complaints across {} zones",
        result.values().map(|s| s.count).sum::<u64>(),
        result.len()
    );
    result
}

/// Sums flood occurrences per canonical region label.
#[must_use]
pub fn aggregate_flooding(
    records: &[OccurrenceRecord],
    rule: &FloodRule,
) -> BTreeMap<String, CountShare> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for record in records {
        if let Some(region) = rule.region_of(record) {
            *counts.entry(region).or_default() += record.count;
        }
    }

    let result = with_city_share(counts);
    log::info!(
        "Flooding: {} occurrences across {} regions",
        result.values().map(|s| s.count).sum::<u64>(),
        result.len()
    );
    result
}

/// Mean HDI per region, joining records to regions through the
/// neighborhood name map. Records whose neighborhood has no region are
/// ignored.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate_hdi(
    records: &[HdiRecord],
    neighborhood_regions: &BTreeMap<String, String>,
) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    let mut unmatched = 0usize;

    for record in records {
        let Some(region) = neighborhood_regions.get(record.neighborhood.trim()) else {
            unmatched += 1;
            continue;
        };
        let entry = sums.entry(region.as_str()).or_default();
        entry.0 += record.hdi;
        entry.1 += 1;
    }

    if unmatched > 0 {
        log::warn!("HDI: {unmatched} of {} neighborhoods matched no region", records.len());
    }

    sums.into_iter()
        .map(|(region, (sum, n))| (region.to_string(), sum / n as f64))
        .collect()
}
