//! In-memory R-tree over region polygons for point-in-polygon lookups.
//!
//! Used to attribute neighborhoods to regions by their centroid. Region
//! boundaries are expected to tile the city without overlap, but the
//! index does not assume it: a point inside several regions resolves to
//! the smallest region key.

use std::collections::BTreeMap;

use geo::{BoundingRect, Centroid, Contains, MultiPolygon, Point};
use rstar::{AABB, RTree, RTreeObject};

use crate::{Layer, Region, SpatialError};

/// A region polygon stored in the R-tree with its key.
struct RegionEntry {
    region_id: String,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for RegionEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Result of locating a point among the regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Containment<'a> {
    /// No region strictly contains the point.
    Outside,
    /// Exactly one region contains the point.
    Unique(&'a str),
    /// Several regions contain the point, sorted by key.
    Ambiguous(Vec<&'a str>),
}

impl<'a> Containment<'a> {
    /// Resolves to one region key: the only match, or the smallest key
    /// among several.
    #[must_use]
    pub fn resolve(&self) -> Option<&'a str> {
        match self {
            Self::Outside => None,
            Self::Unique(id) => Some(*id),
            Self::Ambiguous(ids) => ids.first().copied(),
        }
    }
}

/// Pre-built spatial index over a region set.
pub struct RegionIndex {
    regions: RTree<RegionEntry>,
}

impl RegionIndex {
    /// Builds the index from regions in the metric CRS.
    #[must_use]
    pub fn build(regions: &[Region]) -> Self {
        let entries = regions
            .iter()
            .map(|region| RegionEntry {
                region_id: region.id.clone(),
                envelope: compute_envelope(&region.geometry),
                polygon: region.geometry.clone(),
            })
            .collect();

        Self {
            regions: RTree::bulk_load(entries),
        }
    }

    /// Finds every region whose interior contains `point`. Points on a
    /// region boundary are not contained.
    #[must_use]
    pub fn locate(&self, point: Point<f64>) -> Containment<'_> {
        let query_env = AABB::from_point([point.x(), point.y()]);

        let mut matches: Vec<&str> = self
            .regions
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygon.contains(&point))
            .map(|entry| entry.region_id.as_str())
            .collect();
        matches.sort_unstable();

        match matches.len() {
            0 => Containment::Outside,
            1 => Containment::Unique(matches[0]),
            _ => Containment::Ambiguous(matches),
        }
    }

    /// Maps each feature of `layer` to the region containing its centroid,
    /// keyed by the feature's `name_property`.
    ///
    /// `layer` must be in the same CRS as the indexed regions. Features
    /// whose centroid falls outside every region are dropped; features in
    /// several regions go to the smallest region key. When two features
    /// share a name, the first one keeps it.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if a feature is not polygonal or has no
    /// name.
    pub fn assign_centroids(
        &self,
        layer: &Layer,
        name_property: &str,
    ) -> Result<BTreeMap<String, String>, SpatialError> {
        let mut assignments = BTreeMap::new();
        let mut outside = 0usize;

        for (index, feature) in layer.features.iter().enumerate() {
            let name = feature.property_text(name_property).ok_or_else(|| {
                SpatialError::MissingProperty {
                    layer: layer.name.clone(),
                    index,
                    property: name_property.to_string(),
                }
            })?;

            let polygon = layer.polygonal(index, &feature.geometry)?;
            let Some(centroid) = polygon.centroid() else {
                log::debug!("{name} has an empty geometry; skipping");
                outside += 1;
                continue;
            };

            let containment = self.locate(centroid);
            if let Containment::Ambiguous(ids) = &containment {
                log::warn!("Centroid of {name} lies in several regions {ids:?}; using {}", ids[0]);
            }

            let Some(region_id) = containment.resolve() else {
                log::debug!("Centroid of {name} is outside every region");
                outside += 1;
                continue;
            };

            match assignments.get(&name) {
                Some(existing) if existing != region_id => {
                    log::warn!(
                        "Neighborhood name {name} appears in regions {existing} and {region_id}; keeping {existing}"
                    );
                }
                Some(_) => {}
                None => {
                    assignments.insert(name, region_id.to_string());
                }
            }
        }

        if outside > 0 {
            log::warn!(
                "{outside} of {} neighborhoods in {} matched no region",
                layer.features.len(),
                layer.name
            );
        }

        Ok(assignments)
    }
}

/// Compute the bounding box envelope for a [`MultiPolygon`].
fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}
