//! Sample interpolation strategies for reading an elevation at an
//! arbitrary geographic point, rather than only at grid nodes.
//!
//! The three-way choice and the "at least 3 valid neighbors" Shepard rule
//! are grounded on `examples/original_source/src/dems.cpp`'s
//! `get_elev_by_coord` and its `DEM_INTERPOL_*` modes.

use crate::coord::LatLon;

use super::tile::Dem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Nearest-grid-node lookup; no smoothing.
    None,
    /// Bilinear interpolation, valid only when all 4 enclosing samples
    /// are present; returns `None` if any one of them is missing.
    SimpleBilinear,
    /// Inverse-distance-weighted (Shepard's method) average of whichever
    /// of the 4 enclosing samples are present, as long as at least 3 are
    /// valid; otherwise `None`.
    Shepard,
}

impl Dem {
    pub fn elevation_at(&self, point: &LatLon, mode: Interpolation) -> Option<f64> {
        let (row, col) = self.point_to_grid(point)?;
        match mode {
            Interpolation::None => {
                let r = row.round() as usize;
                let c = col.round() as usize;
                self.sample(r, c).map(f64::from)
            }
            Interpolation::SimpleBilinear => self.bilinear(row, col),
            Interpolation::Shepard => self.shepard(row, col),
        }
    }

    fn enclosing_corners(&self, row: f64, col: f64) -> [(usize, usize, f64, f64); 4] {
        let r0 = row.floor() as usize;
        let c0 = col.floor() as usize;
        let r1 = (r0 + 1).min(self.rows - 1);
        let c1 = (c0 + 1).min(self.cols - 1);
        let dr = row - r0 as f64;
        let dc = col - c0 as f64;
        [
            (r0, c0, 1.0 - dr, 1.0 - dc),
            (r0, c1, 1.0 - dr, dc),
            (r1, c0, dr, 1.0 - dc),
            (r1, c1, dr, dc),
        ]
    }

    fn bilinear(&self, row: f64, col: f64) -> Option<f64> {
        let corners = self.enclosing_corners(row, col);
        let mut total = 0.0;
        for (r, c, wr, wc) in corners {
            let v = self.sample(r, c)?;
            total += v as f64 * wr * wc;
        }
        Some(total)
    }

    fn shepard(&self, row: f64, col: f64) -> Option<f64> {
        let corners = self.enclosing_corners(row, col);
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        let mut valid = 0;
        for (r, c, _, _) in corners {
            if let Some(v) = self.sample(r, c) {
                let dr = row - r as f64;
                let dc = col - c as f64;
                let dist = (dr * dr + dc * dc).sqrt().max(1e-9);
                let weight = 1.0 / dist;
                weighted_sum += v as f64 * weight;
                weight_total += weight;
                valid += 1;
            }
        }
        if valid < 3 {
            return None;
        }
        Some(weighted_sum / weight_total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dem::tile::HorizUnits;

    fn flat_dem(value: i16) -> Dem {
        unsafe_construct(vec![value; 4], 2, 2)
    }

    // Test-only constructor; production code always goes through
    // `Dem::load_hgt`.
    fn unsafe_construct(samples: Vec<i16>, rows: usize, cols: usize) -> Dem {
        Dem {
            horiz_units: HorizUnits::LatLonArcSeconds,
            origin: LatLon::new(0.0, 0.0),
            spacing: 1.0,
            rows,
            cols,
            utm_zone: None,
            utm_origin: None,
            samples,
        }
    }

    #[test]
    fn bilinear_on_flat_grid_returns_the_flat_value() {
        let dem = flat_dem(100);
        let v = dem.elevation_at(&LatLon::new(0.5, 0.5), Interpolation::SimpleBilinear).unwrap();
        assert!((v - 100.0).abs() < 1e-9);
    }

    #[test]
    fn bilinear_returns_none_when_a_corner_is_missing() {
        let mut dem = flat_dem(100);
        dem.samples[0] = super::super::tile::NODATA;
        assert_eq!(dem.elevation_at(&LatLon::new(0.5, 0.5), Interpolation::SimpleBilinear), None);
    }

    #[test]
    fn shepard_tolerates_one_missing_corner() {
        let mut dem = flat_dem(100);
        dem.samples[0] = super::super::tile::NODATA;
        let v = dem.elevation_at(&LatLon::new(0.5, 0.5), Interpolation::Shepard);
        assert!(v.is_some());
    }

    #[test]
    fn shepard_fails_with_only_two_valid_corners() {
        let mut dem = flat_dem(100);
        dem.samples[0] = super::super::tile::NODATA;
        dem.samples[1] = super::super::tile::NODATA;
        assert_eq!(dem.elevation_at(&LatLon::new(0.5, 0.5), Interpolation::Shepard), None);
    }

    fn flat_utm_dem(value: i16, zone: u8, sw_easting: f64, sw_northing: f64) -> Dem {
        Dem {
            horiz_units: HorizUnits::Utm,
            origin: LatLon::new(0.0, 0.0),
            spacing: 100.0,
            rows: 2,
            cols: 2,
            utm_zone: Some(zone),
            utm_origin: Some((sw_easting, sw_northing)),
            samples: vec![value; 4],
        }
    }

    #[test]
    fn utm_tile_yields_elevation_when_query_zone_matches() {
        let query = LatLon::new(45.0, 10.0);
        let utm = query.to_utm();
        let dem = flat_utm_dem(200, utm.zone, utm.easting - 50.0, utm.northing - 50.0);
        assert_eq!(dem.elevation_at(&query, Interpolation::SimpleBilinear), Some(200.0));
    }

    #[test]
    fn utm_tile_yields_none_when_query_zone_differs() {
        let query = LatLon::new(45.0, 10.0);
        let utm = query.to_utm();
        let other_zone = if utm.zone == 1 { 2 } else { utm.zone - 1 };
        let dem = flat_utm_dem(200, other_zone, utm.easting - 50.0, utm.northing - 50.0);
        assert_eq!(dem.elevation_at(&query, Interpolation::SimpleBilinear), None);
    }
}
