#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Geometry side of the region risk pipeline.
//!
//! Loads `GeoJSON` layers, reprojects them into one metric coordinate
//! reference system, and provides the region-level geometric operations
//! the scoring pipeline needs:
//!
//! * [`crs`]: CRS identification and UTM reprojection
//! * [`layer`]: `GeoJSON` feature layers tagged with their CRS
//! * [`region`]: region polygons with their area in km²
//! * [`index`]: R-tree point-in-polygon lookups for centroid joins
//! * [`overlay`]: hazard coverage percentages and drainage network density
//!
//! All area and length values are planar, computed in the target metric
//! CRS. Any loading or reprojection failure is returned as a
//! [`SpatialError`] and is meant to abort the run.

pub mod crs;
pub mod index;
pub mod layer;
pub mod overlay;
pub mod region;

pub use crs::Crs;
pub use index::RegionIndex;
pub use layer::{Layer, LayerFeature};
pub use region::Region;

/// Errors that can occur while loading or normalizing geometry.
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    /// Reading a layer file failed.
    #[error("I/O error reading layer '{layer}': {source}")]
    Io {
        /// Layer name (file name or caller-provided label).
        layer: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The layer is not valid `GeoJSON`.
    #[error("Invalid GeoJSON in layer '{layer}': {source}")]
    GeoJson {
        /// Layer name.
        layer: String,
        /// Underlying parse error.
        source: Box<geojson::Error>,
    },

    /// The layer declares a coordinate reference system that cannot be
    /// reprojected.
    #[error("Unsupported coordinate reference system: {name}")]
    UnsupportedCrs {
        /// The CRS name or EPSG code as declared.
        name: String,
    },

    /// A coordinate could not be transformed between two systems.
    #[error("Reprojection failed: {message}")]
    Reprojection {
        /// Description of the offending coordinate.
        message: String,
    },

    /// A feature has a geometry type the layer cannot hold.
    #[error("Layer '{layer}' feature {index}: expected {expected} geometry, found {found}")]
    GeometryType {
        /// Layer name.
        layer: String,
        /// Zero-based feature index.
        index: usize,
        /// Expected geometry family.
        expected: &'static str,
        /// Geometry type found.
        found: String,
    },

    /// A required feature property is missing or not a scalar.
    #[error("Layer '{layer}' feature {index} has no usable '{property}' property")]
    MissingProperty {
        /// Layer name.
        layer: String,
        /// Zero-based feature index.
        index: usize,
        /// Property name.
        property: String,
    },

    /// Two region features share the same key.
    #[error("Duplicate region key '{key}'")]
    DuplicateRegion {
        /// The repeated key.
        key: String,
    },
}

/// Returns a short geometry type name for diagnostics.
#[must_use]
pub const fn geometry_type_name(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
    }
}
