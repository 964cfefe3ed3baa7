//! Coordinate reference systems and reprojection.
//!
//! Only the systems the pipeline meets in practice are supported:
//! geographic longitude/latitude (WGS84, SIRGAS 2000) and Universal
//! Transverse Mercator zones. UTM uses the transverse Mercator series
//! expansion (Snyder, *Map Projections: A Working Manual*, §8), which is
//! millimetre-accurate across the width of a zone.

use geo::{Coord, Geometry, MapCoords};

use crate::SpatialError;

/// UTM scale factor on the central meridian.
const UTM_SCALE: f64 = 0.9996;

/// UTM false easting in metres.
const FALSE_EASTING: f64 = 500_000.0;

/// UTM false northing for southern hemisphere zones, in metres.
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Geodetic datum, which fixes the reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datum {
    /// World Geodetic System 1984.
    Wgs84,
    /// SIRGAS 2000 (GRS80 ellipsoid).
    Sirgas2000,
}

impl Datum {
    const fn semi_major_axis(self) -> f64 {
        match self {
            Self::Wgs84 | Self::Sirgas2000 => 6_378_137.0,
        }
    }

    const fn flattening(self) -> f64 {
        match self {
            Self::Wgs84 => 1.0 / 298.257_223_563,
            Self::Sirgas2000 => 1.0 / 298.257_222_101,
        }
    }

    /// First eccentricity squared.
    const fn e2(self) -> f64 {
        let f = self.flattening();
        f * (2.0 - f)
    }
}

/// A UTM zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    /// Zone number, 1 to 60.
    pub number: u8,
    /// Whether the zone uses the southern hemisphere false northing.
    pub south: bool,
    /// Datum of the zone.
    pub datum: Datum,
}

/// A coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crs {
    /// Longitude/latitude in degrees (x = longitude, y = latitude).
    Geographic,
    /// Projected UTM coordinates in metres.
    Utm(UtmZone),
}

impl Default for Crs {
    /// `GeoJSON` (RFC 7946) coordinates are WGS84 longitude/latitude unless
    /// the document says otherwise.
    fn default() -> Self {
        Self::Geographic
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Geographic => write!(f, "geographic lon/lat"),
            Self::Utm(zone) => write!(
                f,
                "UTM zone {}{} ({:?})",
                zone.number,
                if zone.south { 'S' } else { 'N' },
                zone.datum
            ),
        }
    }
}

impl Crs {
    /// Resolves an EPSG code.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnsupportedCrs`] for codes outside the
    /// supported geographic and UTM families.
    pub fn from_epsg(code: u32) -> Result<Self, SpatialError> {
        let utm = |number: u32, south: bool, datum: Datum| {
            u8::try_from(number).map(|number| {
                Self::Utm(UtmZone {
                    number,
                    south,
                    datum,
                })
            })
        };

        let crs = match code {
            4326 | 4674 => Ok(Self::Geographic),
            32601..=32660 => utm(code - 32600, false, Datum::Wgs84),
            32701..=32760 => utm(code - 32700, true, Datum::Wgs84),
            // SIRGAS 2000 / UTM zones 17S..25S
            31977..=31985 => utm(code - 31977 + 17, true, Datum::Sirgas2000),
            _ => {
                return Err(SpatialError::UnsupportedCrs {
                    name: format!("EPSG:{code}"),
                });
            }
        };

        crs.map_err(|_| SpatialError::UnsupportedCrs {
            name: format!("EPSG:{code}"),
        })
    }

    /// Resolves a CRS name as found in a `GeoJSON` `crs` member, such as
    /// `EPSG:31984`, `urn:ogc:def:crs:EPSG::4326`, or
    /// `urn:ogc:def:crs:OGC:1.3:CRS84`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnsupportedCrs`] if the name is not an
    /// EPSG reference or CRS84, or if the EPSG code is unsupported.
    pub fn from_name(name: &str) -> Result<Self, SpatialError> {
        let trimmed = name.trim();
        let upper = trimmed.to_ascii_uppercase();

        if upper.ends_with("CRS84") {
            return Ok(Self::Geographic);
        }

        let unsupported = || SpatialError::UnsupportedCrs {
            name: trimmed.to_string(),
        };

        if !upper.contains("EPSG") {
            return Err(unsupported());
        }

        let code = upper
            .rsplit(':')
            .next()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .ok_or_else(unsupported)?;

        Self::from_epsg(code)
    }

    /// EPSG code of this system, or `None` for a zone no registered code
    /// describes. Geographic coordinates report WGS84.
    #[must_use]
    pub fn epsg(self) -> Option<u32> {
        match self {
            Self::Geographic => Some(4326),
            Self::Utm(zone) => {
                let number = u32::from(zone.number);
                match (zone.datum, zone.south) {
                    (Datum::Wgs84, false) => Some(32600 + number),
                    (Datum::Wgs84, true) => Some(32700 + number),
                    (Datum::Sirgas2000, true) if (17..=25).contains(&number) => {
                        Some(31977 + number - 17)
                    }
                    (Datum::Sirgas2000, _) => None,
                }
            }
        }
    }

    /// Whether coordinates in this system are in metres.
    #[must_use]
    pub const fn is_metric(self) -> bool {
        matches!(self, Self::Utm(_))
    }

    /// Transforms a single coordinate from `self` into `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Reprojection`] for non-finite input or
    /// geographic coordinates outside the valid longitude/latitude range.
    pub fn transform(self, target: Self, coord: Coord<f64>) -> Result<Coord<f64>, SpatialError> {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            return Err(SpatialError::Reprojection {
                message: format!("non-finite coordinate ({}, {})", coord.x, coord.y),
            });
        }

        if self == target {
            return Ok(coord);
        }

        let (lon, lat) = match self {
            Self::Geographic => (coord.x, coord.y),
            Self::Utm(zone) => zone.inverse(coord),
        };

        match target {
            Self::Geographic => Ok(Coord { x: lon, y: lat }),
            Self::Utm(zone) => zone.forward(lon, lat),
        }
    }

    /// Reprojects every coordinate of `geometry` into `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::Reprojection`] if any coordinate fails to
    /// transform.
    pub fn reproject(
        self,
        geometry: &Geometry<f64>,
        target: Self,
    ) -> Result<Geometry<f64>, SpatialError> {
        if self == target {
            return Ok(geometry.clone());
        }
        geometry.try_map_coords(move |coord| self.transform(target, coord))
    }
}

impl UtmZone {
    /// Longitude of the zone's central meridian, in degrees.
    #[must_use]
    pub fn central_meridian(self) -> f64 {
        f64::from(self.number).mul_add(6.0, -183.0)
    }

    const fn false_northing(self) -> f64 {
        if self.south { FALSE_NORTHING_SOUTH } else { 0.0 }
    }

    /// Meridian arc length from the equator to latitude `phi` (radians).
    fn meridian_arc(self, phi: f64) -> f64 {
        let a = self.datum.semi_major_axis();
        let e2 = self.datum.e2();
        let e4 = e2 * e2;
        let e6 = e4 * e2;

        a * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    /// Geographic degrees to projected metres.
    #[allow(clippy::suboptimal_flops, clippy::many_single_char_names)]
    fn forward(self, lon: f64, lat: f64) -> Result<Coord<f64>, SpatialError> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(SpatialError::Reprojection {
                message: format!("({lon}, {lat}) is not a valid longitude/latitude"),
            });
        }

        let a = self.datum.semi_major_axis();
        let e2 = self.datum.e2();
        let ep2 = e2 / (1.0 - e2);

        let phi = lat.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = a / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let big_a = (lon - self.central_meridian()).to_radians() * cos_phi;
        let m = self.meridian_arc(phi);

        let a2 = big_a * big_a;
        let a3 = a2 * big_a;
        let a4 = a3 * big_a;
        let a5 = a4 * big_a;
        let a6 = a5 * big_a;

        let x = UTM_SCALE
            * n
            * (big_a
                + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0)
            + FALSE_EASTING;

        let y = UTM_SCALE
            * (m + n
                * tan_phi
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0))
            + self.false_northing();

        Ok(Coord { x, y })
    }

    /// Projected metres to geographic degrees `(lon, lat)`.
    #[allow(clippy::suboptimal_flops, clippy::many_single_char_names)]
    fn inverse(self, coord: Coord<f64>) -> (f64, f64) {
        let a = self.datum.semi_major_axis();
        let e2 = self.datum.e2();
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let ep2 = e2 / (1.0 - e2);

        let m = (coord.y - self.false_northing()) / UTM_SCALE;
        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

        let sqrt_1_e2 = (1.0 - e2).sqrt();
        let e1 = (1.0 - sqrt_1_e2) / (1.0 + sqrt_1_e2);
        let e1_2 = e1 * e1;
        let e1_3 = e1_2 * e1;
        let e1_4 = e1_3 * e1;

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = phi1.tan();
        let c1 = ep2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let denom = 1.0 - e2 * sin_phi1 * sin_phi1;
        let n1 = a / denom.sqrt();
        let r1 = a * (1.0 - e2) / denom.powf(1.5);
        let d = (coord.x - FALSE_EASTING) / (n1 * UTM_SCALE);

        let d2 = d * d;
        let d3 = d2 * d;
        let d4 = d3 * d;
        let d5 = d4 * d;
        let d6 = d5 * d;

        let phi = phi1
            - (n1 * tan_phi1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d4 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * ep2
                        - 3.0 * c1 * c1)
                        * d6
                        / 720.0);

        let lambda = (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d5
                / 120.0)
            / cos_phi1;

        (
            self.central_meridian() + lambda.to_degrees(),
            phi.to_degrees(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONE_24S: Crs = Crs::Utm(UtmZone {
        number: 24,
        south: true,
        datum: Datum::Sirgas2000,
    });

    #[test]
    fn resolves_sirgas_utm_zone() {
        assert_eq!(Crs::from_epsg(31984).unwrap(), ZONE_24S);
    }

    #[test]
    fn resolves_wgs84_utm_zones() {
        assert_eq!(
            Crs::from_epsg(32724).unwrap(),
            Crs::Utm(UtmZone {
                number: 24,
                south: true,
                datum: Datum::Wgs84,
            })
        );
        assert_eq!(
            Crs::from_epsg(32618).unwrap(),
            Crs::Utm(UtmZone {
                number: 18,
                south: false,
                datum: Datum::Wgs84,
            })
        );
    }

    #[test]
    fn epsg_code_matches_resolved_system() {
        for code in [4326, 31977, 31984, 31985, 32618, 32724] {
            assert_eq!(Crs::from_epsg(code).unwrap().epsg(), Some(code));
        }
    }

    #[test]
    fn rejects_unknown_epsg() {
        assert!(matches!(
            Crs::from_epsg(3857),
            Err(SpatialError::UnsupportedCrs { .. })
        ));
    }

    #[test]
    fn parses_geojson_crs_names() {
        assert_eq!(
            Crs::from_name("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap(),
            Crs::Geographic
        );
        assert_eq!(
            Crs::from_name("urn:ogc:def:crs:EPSG::4326").unwrap(),
            Crs::Geographic
        );
        assert_eq!(Crs::from_name("EPSG:31984").unwrap(), ZONE_24S);
        assert!(Crs::from_name("urn:ogc:def:crs:SR-ORG::6864").is_err());
    }

    #[test]
    fn central_meridian_on_equator_maps_to_false_origin() {
        let projected = Crs::Geographic
            .transform(ZONE_24S, Coord { x: -39.0, y: 0.0 })
            .unwrap();
        assert!((projected.x - 500_000.0).abs() < 1e-6);
        assert!((projected.y - 10_000_000.0).abs() < 1e-6);
    }

    #[test]
    fn one_degree_of_latitude_matches_scaled_meridian_arc() {
        let projected = Crs::Geographic
            .transform(ZONE_24S, Coord { x: -39.0, y: -1.0 })
            .unwrap();
        // 110 574.3 m of meridian arc, scaled by 0.9996
        let expected = 10_000_000.0 - 110_574.3 * 0.9996;
        assert!(
            (projected.y - expected).abs() < 1.0,
            "northing {} too far from {expected}",
            projected.y
        );
        assert!((projected.x - 500_000.0).abs() < 1e-6);
    }

    #[test]
    fn inverse_recovers_geographic_coordinate() {
        let original = Coord {
            x: -38.5267,
            y: -3.7319,
        };
        let projected = Crs::Geographic.transform(ZONE_24S, original).unwrap();
        let back = ZONE_24S.transform(Crs::Geographic, projected).unwrap();
        assert!((back.x - original.x).abs() < 1e-7);
        assert!((back.y - original.y).abs() < 1e-7);
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let result = Crs::Geographic.transform(ZONE_24S, Coord { x: -39.0, y: 95.0 });
        assert!(matches!(result, Err(SpatialError::Reprojection { .. })));
    }

    #[test]
    fn same_crs_is_identity() {
        let coord = Coord { x: 551_234.5, y: 9_587_000.25 };
        assert_eq!(ZONE_24S.transform(ZONE_24S, coord).unwrap(), coord);
    }
}
