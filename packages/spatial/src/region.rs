//! Region polygons, the unit of aggregation.

use std::collections::BTreeMap;

use geo::{Area, MultiPolygon};

use crate::{Layer, SpatialError};

/// Square metres per square kilometre.
pub const M2_PER_KM2: f64 = 1_000_000.0;

/// An administrative region in the metric CRS.
#[derive(Debug, Clone)]
pub struct Region {
    /// Unique region key.
    pub id: String,
    /// Region polygon(s), metric CRS.
    pub geometry: MultiPolygon<f64>,
    /// Planar area in km².
    pub area_km2: f64,
}

impl Region {
    /// Creates a region, computing its area from `geometry`.
    #[must_use]
    pub fn new(id: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        let area_km2 = geometry.unsigned_area() / M2_PER_KM2;
        Self {
            id: id.into(),
            geometry,
            area_km2,
        }
    }

    /// Area in m².
    #[must_use]
    pub fn area_m2(&self) -> f64 {
        self.area_km2 * M2_PER_KM2
    }

    /// Divides `value` by the region area in km², defining the result as
    /// `0.0` for a zero-area region.
    #[must_use]
    pub fn per_km2(&self, value: f64) -> f64 {
        if self.area_km2 > 0.0 {
            value / self.area_km2
        } else {
            0.0
        }
    }
}

/// Builds the region set from a metric layer, keyed by `key_property`.
///
/// Regions are returned sorted by key, which is the stable order every
/// downstream stage relies on.
///
/// # Errors
///
/// Returns [`SpatialError`] if the layer is not metric, a feature lacks
/// the key property or is not polygonal, or two features share a key.
pub fn regions_from_layer(layer: &Layer, key_property: &str) -> Result<Vec<Region>, SpatialError> {
    if !layer.crs.is_metric() {
        return Err(SpatialError::Reprojection {
            message: format!(
                "region layer {} must be in a metric CRS, found {}",
                layer.name, layer.crs
            ),
        });
    }

    let mut regions = BTreeMap::new();

    for (index, feature) in layer.features.iter().enumerate() {
        let key = feature
            .property_text(key_property)
            .ok_or_else(|| SpatialError::MissingProperty {
                layer: layer.name.clone(),
                index,
                property: key_property.to_string(),
            })?;

        let geometry = layer.polygonal(index, &feature.geometry)?;
        let region = Region::new(key.clone(), geometry);

        if region.area_km2 <= 0.0 {
            log::warn!("Region {key} has zero area; its densities will be 0");
        }

        if regions.insert(key.clone(), region).is_some() {
            return Err(SpatialError::DuplicateRegion { key });
        }
    }

    log::info!("Built {} regions from layer {}", regions.len(), layer.name);
    Ok(regions.into_values().collect())
}
