//! Filling in missing trackpoint altitude from a digital elevation model.
//!
//! Grounded on `examples/original_source/src/viktrack.h`'s
//! `vik_track_apply_dem_data` and `vik_track_smooth_missing_elevation_data`,
//! looking up each point's altitude from a tile source one point at a time.

use crate::coord::LatLon;
use crate::error::TrackError;

use super::Track;

/// Anything that can answer "what's the elevation at this point", so this
/// module doesn't need to depend on `crate::dem`'s cache machinery
/// directly; `DemCache` and `Trw`'s aggregate lookup both implement it.
pub trait ElevationSource {
    fn elevation_at(&self, point: &LatLon) -> Option<f64>;
}

impl Track {
    /// Set `altitude` on every point from `source`. When `skip_existing`
    /// is true, a point that already carries an altitude is left alone.
    /// A point `source` has no data for is left unchanged either way.
    /// Returns the number of points changed.
    pub fn apply_dem_data(&mut self, skip_existing: bool, source: &impl ElevationSource) -> Result<usize, TrackError> {
        self.require_non_empty()?;
        let mut changed = 0;
        for tp in self.points.iter_mut() {
            if skip_existing && tp.altitude.is_some() {
                continue;
            }
            if let Some(alt) = source.elevation_at(&tp.coord.as_latlon()) {
                tp.altitude = Some(alt);
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Fill any point still missing an altitude between two
    /// altitude-bearing points. With `flat=true`, each missing point
    /// takes the left (earlier) neighbor's altitude; otherwise it's
    /// linearly interpolated by distance along the track. A run that
    /// touches either end of the track (no altitude-bearing point on one
    /// side) is left unchanged. Returns the number of points changed.
    pub fn smooth_missing_elevation(&mut self, flat: bool) -> Result<usize, TrackError> {
        self.require_non_empty()?;
        let known: Vec<usize> = self
            .points
            .iter()
            .enumerate()
            .filter_map(|(i, tp)| tp.altitude.map(|_| i))
            .collect();
        if known.len() < 2 {
            return Ok(0);
        }
        let mut changed = 0;
        for w in known.windows(2) {
            let (lo, hi) = (w[0], w[1]);
            if hi == lo + 1 {
                continue;
            }
            let alt_lo = self.points[lo].altitude.unwrap();
            if flat {
                for i in (lo + 1)..hi {
                    self.points[i].altitude = Some(alt_lo);
                    changed += 1;
                }
                continue;
            }
            let alt_hi = self.points[hi].altitude.unwrap();
            let d_total = self.distance_between(lo, hi);
            if d_total <= 0.0 {
                continue;
            }
            let mut d_running = 0.0;
            for i in (lo + 1)..hi {
                d_running += self.points[i - 1].coord.distance(&self.points[i].coord);
                let frac = d_running / d_total;
                self.points[i].altitude = Some(alt_lo + frac * (alt_hi - alt_lo));
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn distance_between(&self, lo: usize, hi: usize) -> f64 {
        self.points[lo..=hi].windows(2).map(|w| w[0].coord.distance(&w[1].coord)).sum()
    }
}
