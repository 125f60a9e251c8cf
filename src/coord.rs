//! Coordinate primitives: LatLon/UTM values, conversion, distance, bounding boxes.
//!
//! WGS-84 ellipsoidal constants and the transverse Mercator projection
//! formulas below follow the standard Snyder (1987) series used throughout
//! the geodesy literature; they are not lifted from any one pack file, but
//! the zone/band layout and the "convert then haversine" distance fallback
//! mirror `examples/original_source/src/dem_cache.cpp`'s handling of
//! `LatLonArcSeconds` vs. `UTMMeters` tiles.

use serde::{Deserialize, Serialize};

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    /// Degrees, in `[-90, 90]`.
    pub lat: f64,
    /// Degrees, in `(-180, 180]`.
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        LatLon { lat, lon }
    }

    /// Great-circle distance in metres (haversine formula).
    pub fn distance_haversine(&self, other: &LatLon) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Convert to UTM using the standard WGS-84 transverse Mercator series.
    pub fn to_utm(&self) -> UTM {
        let zone = utm_zone_number(self.lon);
        let letter = utm_band_letter(self.lat);
        self.to_utm_zone(zone, letter)
    }

    /// Convert to UTM forcing a specific zone (used when re-projecting a
    /// point that must stay within a neighboring zone's grid).
    pub fn to_utm_zone(&self, zone: u8, letter: char) -> UTM {
        let a = WGS84_A;
        let f = WGS84_F;
        let e2 = 2.0 * f - f * f;
        let ep2 = e2 / (1.0 - e2);

        let lat_rad = self.lat.to_radians();
        let central_meridian = (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0;
        let lon_rad = self.lon.to_radians();
        let lambda0 = central_meridian.to_radians();

        let n = a / (1.0 - e2 * lat_rad.sin().powi(2)).sqrt();
        let t = lat_rad.tan().powi(2);
        let c = ep2 * lat_rad.cos().powi(2);
        let big_a = lat_rad.cos() * (lon_rad - lambda0);

        let m = a
            * ((1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2.powi(3) / 256.0) * lat_rad
                - (3.0 * e2 / 8.0 + 3.0 * e2 * e2 / 32.0 + 45.0 * e2.powi(3) / 1024.0)
                    * (2.0 * lat_rad).sin()
                + (15.0 * e2 * e2 / 256.0 + 45.0 * e2.powi(3) / 1024.0) * (4.0 * lat_rad).sin()
                - (35.0 * e2.powi(3) / 3072.0) * (6.0 * lat_rad).sin());

        let easting = UTM_K0
            * n
            * (big_a
                + (1.0 - t + c) * big_a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * big_a.powi(5) / 120.0)
            + UTM_FALSE_EASTING;

        let mut northing = UTM_K0
            * (m + n
                * lat_rad.tan()
                * (big_a.powi(2) / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * big_a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * big_a.powi(6) / 720.0));

        if self.lat < 0.0 {
            northing += UTM_FALSE_NORTHING_SOUTH;
        }

        UTM {
            easting,
            northing,
            zone,
            letter,
        }
    }
}

/// A projected Universal Transverse Mercator coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UTM {
    pub easting: f64,
    pub northing: f64,
    /// 1..=60
    pub zone: u8,
    /// MGRS latitude band letter (C..X, excluding I and O).
    pub letter: char,
}

impl UTM {
    /// True when northing encodes the southern hemisphere per MGRS bands.
    pub fn is_southern_hemisphere(&self) -> bool {
        self.letter < 'N'
    }

    /// Convert back to geographic LatLon using the WGS-84 inverse series.
    pub fn to_latlon(&self) -> LatLon {
        let a = WGS84_A;
        let f = WGS84_F;
        let e2 = 2.0 * f - f * f;
        let ep2 = e2 / (1.0 - e2);
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let northing = if self.is_southern_hemisphere() {
            self.northing - UTM_FALSE_NORTHING_SOUTH
        } else {
            self.northing
        };

        let m = northing / UTM_K0;
        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2.powi(3) / 256.0));

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let n1 = a / (1.0 - e2 * phi1.sin().powi(2)).sqrt();
        let t1 = phi1.tan().powi(2);
        let c1 = ep2 * phi1.cos().powi(2);
        let r1 = a * (1.0 - e2) / (1.0 - e2 * phi1.sin().powi(2)).powf(1.5);
        let d = (self.easting - UTM_FALSE_EASTING) / (n1 * UTM_K0);

        let lat_rad = phi1
            - (n1 * phi1.tan() / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);

        let central_meridian = (self.zone as f64 - 1.0) * 6.0 - 180.0 + 3.0;
        let lambda0 = central_meridian.to_radians();

        let lon_rad = lambda0
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                    * d.powi(5)
                    / 120.0)
                / phi1.cos();

        LatLon {
            lat: lat_rad.to_degrees(),
            lon: lon_rad.to_degrees(),
        }
    }

    /// Planar distance in metres; only meaningful within the same zone.
    pub fn distance_planar(&self, other: &UTM) -> f64 {
        let de = self.easting - other.easting;
        let dn = self.northing - other.northing;
        (de * de + dn * dn).sqrt()
    }
}

fn utm_zone_number(lon: f64) -> u8 {
    (((lon + 180.0) / 6.0).floor() as i32 + 1).clamp(1, 60) as u8
}

fn utm_band_letter(lat: f64) -> char {
    const BANDS: &[char] = &[
        'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V',
        'W', 'X',
    ];
    if lat < -80.0 {
        return 'C';
    }
    if lat > 84.0 {
        return 'X';
    }
    let idx = (((lat + 80.0) / 8.0).floor() as usize).min(BANDS.len() - 1);
    BANDS[idx]
}

/// Which variant a [`Coord`] currently holds; mirrors the source system's
/// file/layer-wide coordinate mode so conversions only happen when asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordMode {
    LatLon,
    Utm,
}

/// A coordinate carrying its own representation, convertible either way
/// without information loss beyond floating-point error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Coord {
    LatLon(LatLon),
    Utm(UTM),
}

impl Coord {
    pub fn mode(&self) -> CoordMode {
        match self {
            Coord::LatLon(_) => CoordMode::LatLon,
            Coord::Utm(_) => CoordMode::Utm,
        }
    }

    pub fn as_latlon(&self) -> LatLon {
        match self {
            Coord::LatLon(ll) => *ll,
            Coord::Utm(utm) => utm.to_latlon(),
        }
    }

    pub fn as_utm(&self) -> UTM {
        match self {
            Coord::LatLon(ll) => ll.to_utm(),
            Coord::Utm(utm) => *utm,
        }
    }

    /// Convert in place to the requested representation.
    pub fn to_mode(&self, mode: CoordMode) -> Coord {
        match mode {
            CoordMode::LatLon => Coord::LatLon(self.as_latlon()),
            CoordMode::Utm => Coord::Utm(self.as_utm()),
        }
    }

    /// Great-circle distance when either side is LatLon; planar UTM distance
    /// when both sides are UTM in the same zone; otherwise converts to
    /// LatLon and falls back to haversine.
    pub fn distance(&self, other: &Coord) -> f64 {
        match (self, other) {
            (Coord::Utm(a), Coord::Utm(b)) if a.zone == b.zone => a.distance_planar(b),
            _ => self.as_latlon().distance_haversine(&other.as_latlon()),
        }
    }
}

/// An axis-aligned lat/lon bounding box. Longitude wrap across the
/// antimeridian is the caller's responsibility, not this type's.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLonBBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl LatLonBBox {
    /// An empty bbox with no contained points yet; `extend` grows it.
    pub fn empty() -> Self {
        LatLonBBox {
            north: f64::NEG_INFINITY,
            south: f64::INFINITY,
            east: f64::NEG_INFINITY,
            west: f64::INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.south > self.north
    }

    pub fn from_point(p: &LatLon) -> Self {
        LatLonBBox {
            north: p.lat,
            south: p.lat,
            east: p.lon,
            west: p.lon,
        }
    }

    pub fn extend(&mut self, p: &LatLon) {
        if self.is_empty() {
            self.north = p.lat;
            self.south = p.lat;
            self.east = p.lon;
            self.west = p.lon;
            return;
        }
        self.north = self.north.max(p.lat);
        self.south = self.south.min(p.lat);
        self.east = self.east.max(p.lon);
        self.west = self.west.min(p.lon);
    }

    pub fn extend_bbox(&mut self, other: &LatLonBBox) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = *other;
            return;
        }
        self.north = self.north.max(other.north);
        self.south = self.south.min(other.south);
        self.east = self.east.max(other.east);
        self.west = self.west.min(other.west);
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a LatLon>) -> Self {
        let mut bbox = LatLonBBox::empty();
        for p in points {
            bbox.extend(p);
        }
        bbox
    }

    pub fn intersects(&self, other: &LatLonBBox) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.west <= other.east
            && self.east >= other.west
            && self.south <= other.north
            && self.north >= other.south
    }
}

/// Elevation in metres, with a sentinel for "no data".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Altitude(i16);

impl Altitude {
    pub const INVALID: Altitude = Altitude(i16::MIN);

    pub fn new(metres: i16) -> Self {
        Altitude(metres)
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    pub fn value(self) -> Option<i16> {
        self.is_valid().then_some(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn bbox_extends_over_points() {
        let pts = [LatLon::new(10.0, 10.0), LatLon::new(-5.0, 20.0), LatLon::new(5.0, -3.0)];
        let bbox = LatLonBBox::from_points(&pts);
        assert_eq!(bbox.north, 10.0);
        assert_eq!(bbox.south, -5.0);
        assert_eq!(bbox.east, 20.0);
        assert_eq!(bbox.west, -3.0);
    }

    #[test]
    fn bbox_intersects() {
        let a = LatLonBBox { north: 10.0, south: 0.0, east: 10.0, west: 0.0 };
        let b = LatLonBBox { north: 5.0, south: -5.0, east: 5.0, west: -5.0 };
        let c = LatLonBBox { north: 100.0, south: 90.0, east: 100.0, west: 90.0 };
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn utm_round_trip_within_zone() {
        let p = LatLon::new(45.5, 9.2);
        let utm = p.to_utm();
        let back = utm.to_latlon();
        assert_relative_eq!(back.lat, p.lat, epsilon = 1e-5);
        assert_relative_eq!(back.lon, p.lon, epsilon = 1e-5);
    }

    #[test]
    fn utm_zone_matches_geographic_position() {
        // A point right at a zone boundary should report the zone of its
        // own side of the boundary, not a neighbor's.
        let p = LatLon::new(10.0, 6.1); // just east of the 0/6 boundary -> zone 31
        let utm = p.to_utm();
        assert_eq!(utm.zone, 31);
    }

    #[test]
    fn haversine_matches_known_distance() {
        // Two points one hundredth of a degree of latitude apart at the
        // equator are very close to 1.1132 km apart.
        let a = LatLon::new(0.0, 0.0);
        let b = LatLon::new(0.01, 0.0);
        let d = a.distance_haversine(&b);
        assert_relative_eq!(d, 1113.2, epsilon = 1.0);
    }

    #[test]
    fn altitude_sentinel() {
        assert!(!Altitude::INVALID.is_valid());
        assert_eq!(Altitude::INVALID.value(), None);
        assert_eq!(Altitude::new(120).value(), Some(120));
    }
}
