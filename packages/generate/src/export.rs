//! Export adapter: master table to front end records and region geometry.

use std::collections::BTreeMap;

use urban_risk_models::config::TierLabels;
use urban_risk_models::{ExportRecord, RegionMetrics};
use urban_risk_spatial::{Layer, LayerFeature};

/// Rounds half away from zero to `decimals` places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Reshapes one annotated region into the front end record.
#[must_use]
pub fn to_record(metrics: &RegionMetrics, labels: &TierLabels) -> ExportRecord {
    let indicators = metrics.indicators();

    ExportRecord {
        regiao: indicators.region_id.clone(),
        lixo: indicators.waste_count,
        alagamento: indicators.flood_count,
        idh: round_to(indicators.mean_hdi, 3),
        risco_geo: round_to(indicators.pct_area_geo_risk, 2),
        densidade_drenagem: round_to(indicators.drainage_density, 2),
        cluster: labels.label(metrics.scored.risk_tier).to_string(),
        predict: metrics.narrative_text.clone(),
    }
}

/// Reshapes the master table, keeping its order.
#[must_use]
pub fn to_records(metrics: &[RegionMetrics], labels: &TierLabels) -> Vec<ExportRecord> {
    metrics.iter().map(|m| to_record(m, labels)).collect()
}

/// Left-joins `records` onto the display-CRS region layer by key.
///
/// Each output feature keeps its original geometry and only the key
/// property of the source, plus every record field. Features whose key
/// has no record get `null` for all record fields.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if a record cannot be converted to a
/// JSON object.
pub fn attach_to_geometry(
    display: &Layer,
    key_property: &str,
    records: &[ExportRecord],
) -> Result<Layer, serde_json::Error> {
    let by_key: BTreeMap<&str, &ExportRecord> =
        records.iter().map(|r| (r.regiao.as_str(), r)).collect();

    let mut unmatched = 0usize;
    let mut features = Vec::with_capacity(display.features.len());

    for feature in &display.features {
        let mut properties = serde_json::Map::new();
        if let Some(key) = feature.properties.get(key_property) {
            properties.insert(key_property.to_string(), key.clone());
        }

        let record = feature
            .property_text(key_property)
            .and_then(|key| by_key.get(key.as_str()).copied());

        match record {
            Some(record) => {
                if let serde_json::Value::Object(fields) = serde_json::to_value(record)? {
                    for (name, value) in fields {
                        properties.entry(name).or_insert(value);
                    }
                }
            }
            None => {
                unmatched += 1;
                for name in ExportRecord::FIELDS {
                    properties
                        .entry((*name).to_string())
                        .or_insert(serde_json::Value::Null);
                }
            }
        }

        features.push(LayerFeature {
            properties,
            geometry: feature.geometry.clone(),
        });
    }

    if unmatched > 0 {
        log::warn!(
            "{unmatched} features of {} have no metrics; writing null attributes",
            display.name
        );
    }

    Ok(Layer {
        name: display.name.clone(),
        crs: display.crs,
        features,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, polygon};
    use urban_risk_models::{NormalizedIndicators, RegionIndicators, RiskTier, ScoredRegion};
    use urban_risk_spatial::Crs;

    fn labels() -> TierLabels {
        TierLabels {
            low: "Baixo".to_string(),
            medium: "Médio".to_string(),
            high: "Alto".to_string(),
        }
    }

    fn metrics(id: &str) -> RegionMetrics {
        RegionMetrics {
            scored: ScoredRegion {
                indicators: RegionIndicators {
                    region_id: id.to_string(),
                    area_km2: 10.0,
                    waste_count: 5,
                    waste_pct_of_city: 83.333,
                    waste_density: 0.5,
                    flood_count: 2,
                    flood_pct_of_city: 100.0,
                    mean_hdi: 0.456_78,
                    pct_area_geo_risk: 19.996,
                    pct_area_flood_risk: 0.0,
                    drainage_density: 1.234_9,
                },
                normalized: NormalizedIndicators::default(),
                risk_score: 0.7,
                risk_tier: RiskTier::High,
            },
            narrative_text: "alert".to_string(),
        }
    }

    fn feature(key: &str) -> LayerFeature {
        let mut properties = serde_json::Map::new();
        properties.insert("regiao_adm".to_string(), serde_json::json!(key));
        properties.insert("area_oficial".to_string(), serde_json::json!(12.5));
        LayerFeature {
            properties,
            geometry: Geometry::Polygon(polygon![
                (x: -38.5, y: -3.7),
                (x: -38.4, y: -3.7),
                (x: -38.4, y: -3.8),
            ]),
        }
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert!((round_to(0.456_78, 3) - 0.457).abs() < 1e-12);
        assert!((round_to(19.996, 2) - 20.0).abs() < 1e-12);
        assert!((round_to(1.125, 2) - 1.13).abs() < 1e-12);
        assert!(round_to(0.0, 2).abs() < f64::EPSILON);
    }

    #[test]
    fn record_uses_localized_label_and_rounding() {
        let record = to_record(&metrics("SER I"), &labels());
        assert_eq!(record.regiao, "SER I");
        assert_eq!(record.lixo, 5);
        assert_eq!(record.alagamento, 2);
        assert!((record.idh - 0.457).abs() < 1e-12);
        assert!((record.risco_geo - 20.0).abs() < 1e-12);
        assert!((record.densidade_drenagem - 1.23).abs() < 1e-12);
        assert_eq!(record.cluster, "Alto");
        assert_eq!(record.predict, "alert");
    }

    #[test]
    fn geometry_join_keeps_key_and_nulls_unmatched() {
        let display = Layer {
            name: "regions".to_string(),
            crs: Crs::Geographic,
            features: vec![feature("SER I"), feature("SER IX")],
        };
        let records = to_records(&[metrics("SER I")], &labels());

        let joined = attach_to_geometry(&display, "regiao_adm", &records).unwrap();
        assert_eq!(joined.features.len(), 2);
        assert_eq!(joined.features[0].geometry, display.features[0].geometry);

        let matched = &joined.features[0].properties;
        assert_eq!(matched["regiao_adm"], "SER I");
        assert_eq!(matched["regiao"], "SER I");
        assert_eq!(matched["cluster"], "Alto");
        assert!(!matched.contains_key("area_oficial"));
        assert_eq!(matched.len(), ExportRecord::FIELDS.len() + 1);

        let unmatched = &joined.features[1].properties;
        assert_eq!(unmatched["regiao_adm"], "SER IX");
        for name in ExportRecord::FIELDS {
            assert!(unmatched[*name].is_null(), "{name} should be null");
        }
    }
}
