//! `GeoJSON` feature layers tagged with their coordinate reference system.

use std::path::Path;

use geo::{Geometry, MultiLineString, MultiPolygon};
use geojson::{GeoJson, JsonObject};

use crate::{Crs, SpatialError, geometry_type_name};

/// One feature of a [`Layer`]: a non-null geometry and its properties.
#[derive(Debug, Clone)]
pub struct LayerFeature {
    /// Feature properties (empty when the source has none).
    pub properties: JsonObject,
    /// Feature geometry in the layer's CRS.
    pub geometry: Geometry<f64>,
}

impl LayerFeature {
    /// Returns a property as trimmed text. Strings are trimmed, numbers
    /// and booleans are formatted; `null`, arrays and objects yield
    /// `None`, as do blank strings.
    #[must_use]
    pub fn property_text(&self, key: &str) -> Option<String> {
        let text = match self.properties.get(key)? {
            serde_json::Value::String(s) => s.trim().to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        if text.is_empty() { None } else { Some(text) }
    }
}

/// A named set of features sharing one CRS.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Name used in diagnostics (usually the file name).
    pub name: String,
    /// CRS of every feature geometry.
    pub crs: Crs,
    /// Features with non-null geometry, in source order.
    pub features: Vec<LayerFeature>,
}

impl Layer {
    /// Creates an empty layer.
    #[must_use]
    pub fn empty(name: &str, crs: Crs) -> Self {
        Self {
            name: name.to_string(),
            crs,
            features: Vec::new(),
        }
    }

    /// Reads and parses a `GeoJSON` file.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the file cannot be read, is not valid
    /// `GeoJSON`, or declares an unsupported CRS.
    pub fn load(path: &Path) -> Result<Self, SpatialError> {
        let name = path.file_name().map_or_else(
            || path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        );

        let text = std::fs::read_to_string(path).map_err(|source| SpatialError::Io {
            layer: name.clone(),
            source,
        })?;

        let layer = Self::from_geojson_str(&name, &text)?;
        log::info!(
            "Loaded layer {name}: {} features ({})",
            layer.features.len(),
            layer.crs
        );
        Ok(layer)
    }

    /// Parses a `GeoJSON` document.
    ///
    /// Accepts a `FeatureCollection`, a single `Feature`, or a bare
    /// geometry. The CRS comes from the legacy `crs` member when present
    /// and defaults to geographic WGS84. Features without geometry are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the text is not valid `GeoJSON` or the
    /// declared CRS is unsupported.
    pub fn from_geojson_str(name: &str, text: &str) -> Result<Self, SpatialError> {
        let parse_error = |source: geojson::Error| SpatialError::GeoJson {
            layer: name.to_string(),
            source: Box::new(source),
        };

        let geojson: GeoJson = text.parse().map_err(parse_error)?;

        let (raw_features, foreign_members) = match geojson {
            GeoJson::FeatureCollection(fc) => (fc.features, fc.foreign_members),
            GeoJson::Feature(feature) => (vec![feature], None),
            GeoJson::Geometry(geometry) => (
                vec![geojson::Feature {
                    bbox: None,
                    geometry: Some(geometry),
                    id: None,
                    properties: None,
                    foreign_members: None,
                }],
                None,
            ),
        };

        let crs = foreign_members
            .as_ref()
            .and_then(|members| members.get("crs"))
            .map_or(Ok(Crs::default()), declared_crs)?;

        let mut features = Vec::with_capacity(raw_features.len());
        let mut skipped = 0usize;

        for feature in raw_features {
            let Some(geometry) = feature.geometry else {
                skipped += 1;
                continue;
            };
            let geometry = Geometry::<f64>::try_from(geometry).map_err(parse_error)?;
            features.push(LayerFeature {
                properties: feature.properties.unwrap_or_default(),
                geometry,
            });
        }

        if skipped > 0 {
            log::debug!("Layer {name}: skipped {skipped} features without geometry");
        }

        Ok(Self {
            name: name.to_string(),
            crs,
            features,
        })
    }

    /// Returns a copy of this layer with every geometry in `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Reprojection`] if any coordinate cannot be
    /// transformed.
    pub fn reproject(&self, target: Crs) -> Result<Self, SpatialError> {
        let features = self
            .features
            .iter()
            .map(|feature| {
                Ok(LayerFeature {
                    properties: feature.properties.clone(),
                    geometry: self.crs.reproject(&feature.geometry, target)?,
                })
            })
            .collect::<Result<Vec<_>, SpatialError>>()?;

        Ok(Self {
            name: self.name.clone(),
            crs: target,
            features,
        })
    }

    /// Serializes the layer as a `FeatureCollection`.
    ///
    /// Projected layers carry a legacy `crs` member naming their EPSG code
    /// so they read back in the same system; geographic layers follow
    /// RFC 7946 and carry none.
    #[must_use]
    pub fn to_feature_collection(&self) -> geojson::FeatureCollection {
        let features = self
            .features
            .iter()
            .map(|feature| geojson::Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(
                    &feature.geometry,
                ))),
                id: None,
                properties: Some(feature.properties.clone()),
                foreign_members: None,
            })
            .collect();

        let foreign_members = match (self.crs, self.crs.epsg()) {
            (Crs::Utm(_), Some(code)) => {
                let mut members = JsonObject::new();
                members.insert(
                    "crs".to_string(),
                    serde_json::json!({
                        "type": "name",
                        "properties": { "name": format!("urn:ogc:def:crs:EPSG::{code}") },
                    }),
                );
                Some(members)
            }
            _ => None,
        };

        geojson::FeatureCollection {
            bbox: None,
            features,
            foreign_members,
        }
    }

    /// Collects every polygon in the layer into one [`MultiPolygon`].
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::GeometryType`] if a feature is not polygonal.
    pub fn polygons(&self) -> Result<MultiPolygon<f64>, SpatialError> {
        let mut polygons = Vec::new();
        for (index, feature) in self.features.iter().enumerate() {
            polygons.extend(self.polygonal(index, &feature.geometry)?.0);
        }
        Ok(MultiPolygon::new(polygons))
    }

    /// Collects every line in the layer into one [`MultiLineString`].
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::GeometryType`] if a feature is not linear.
    pub fn lines(&self) -> Result<MultiLineString<f64>, SpatialError> {
        let mut lines = Vec::new();
        for (index, feature) in self.features.iter().enumerate() {
            lines.extend(self.linear(index, &feature.geometry)?.0);
        }
        Ok(MultiLineString::new(lines))
    }

    /// Converts one feature geometry to a [`MultiPolygon`].
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::GeometryType`] for non-polygonal geometry.
    pub fn polygonal(
        &self,
        index: usize,
        geometry: &Geometry<f64>,
    ) -> Result<MultiPolygon<f64>, SpatialError> {
        match geometry {
            Geometry::Polygon(p) => Ok(MultiPolygon::new(vec![p.clone()])),
            Geometry::MultiPolygon(mp) => Ok(mp.clone()),
            Geometry::Rect(r) => Ok(MultiPolygon::new(vec![r.to_polygon()])),
            Geometry::Triangle(t) => Ok(MultiPolygon::new(vec![t.to_polygon()])),
            Geometry::GeometryCollection(gc) => {
                let mut polygons = Vec::new();
                for member in gc {
                    polygons.extend(self.polygonal(index, member)?.0);
                }
                Ok(MultiPolygon::new(polygons))
            }
            other => Err(self.wrong_type(index, "polygon", other)),
        }
    }

    fn linear(
        &self,
        index: usize,
        geometry: &Geometry<f64>,
    ) -> Result<MultiLineString<f64>, SpatialError> {
        match geometry {
            Geometry::Line(l) => Ok(MultiLineString::new(vec![(*l).into()])),
            Geometry::LineString(ls) => Ok(MultiLineString::new(vec![ls.clone()])),
            Geometry::MultiLineString(mls) => Ok(mls.clone()),
            Geometry::GeometryCollection(gc) => {
                let mut lines = Vec::new();
                for member in gc {
                    lines.extend(self.linear(index, member)?.0);
                }
                Ok(MultiLineString::new(lines))
            }
            other => Err(self.wrong_type(index, "line", other)),
        }
    }

    fn wrong_type(&self, index: usize, expected: &'static str, found: &Geometry<f64>) -> SpatialError {
        SpatialError::GeometryType {
            layer: self.name.clone(),
            index,
            expected,
            found: geometry_type_name(found).to_string(),
        }
    }
}

/// Reads the legacy `GeoJSON` `crs` member:
/// `{"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::31984"}}`.
fn declared_crs(member: &serde_json::Value) -> Result<Crs, SpatialError> {
    let name = member
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| SpatialError::UnsupportedCrs {
            name: member.to_string(),
        })?;
    Crs::from_name(name)
}
