//! Fixed-length resampling, polyline simplification, and time
//! interpolation.
//!
//! The six `*_by_distance`/`*_by_time` functions mirror
//! `examples/original_source/src/viktrack.h`'s `vik_track_get_speed_cropped`
//! chunking: a track is divided into `num_chunks` equal shares of the
//! chosen domain, and each chunk reports the value sampled at its
//! midpoint, with `NaN` standing in for a chunk with no data nearby.
//! `simplify` is a Douglas-Peucker implementation adapted to `Trackpoint`;
//! `interpolate_times` applies the same linear-by-distance interpolation
//! described in `viktrack.h`'s `vik_track_set_properties_dialog` time-fill
//! code.

use crate::error::TrackError;
use crate::trackpoint::Trackpoint;

use super::Track;

impl Track {
    /// Altitude sampled at `num_chunks` equally spaced fractions of total
    /// distance.
    pub fn elevation_by_distance(&self, num_chunks: u32) -> Result<Vec<f64>, TrackError> {
        self.resample_by(num_chunks, false, |tp| tp.altitude)
    }

    /// Altitude sampled at `num_chunks` equally spaced fractions of
    /// elapsed time.
    pub fn elevation_by_time(&self, num_chunks: u32) -> Result<Vec<f64>, TrackError> {
        self.resample_by(num_chunks, true, |tp| tp.altitude)
    }

    /// Speed sampled at `num_chunks` equally spaced fractions of elapsed
    /// time.
    pub fn speed_by_time(&self, num_chunks: u32) -> Result<Vec<f64>, TrackError> {
        self.resample_by(num_chunks, true, |tp| tp.speed)
    }

    /// Speed sampled at `num_chunks` equally spaced fractions of total
    /// distance.
    pub fn speed_by_distance(&self, num_chunks: u32) -> Result<Vec<f64>, TrackError> {
        self.resample_by(num_chunks, false, |tp| tp.speed)
    }

    /// Cumulative distance travelled, sampled at `num_chunks` equally
    /// spaced fractions of elapsed time.
    pub fn distance_by_time(&self, num_chunks: u32) -> Result<Vec<f64>, TrackError> {
        self.require_non_empty()?;
        if num_chunks < 2 {
            return Err(TrackError::InvalidChunkSize(num_chunks));
        }
        if self.duration(true) == 0 {
            return Ok(vec![f64::NAN; num_chunks as usize]);
        }
        Ok((0..num_chunks)
            .map(|i| {
                let frac = (i as f64 + 0.5) / num_chunks as f64;
                match self.closest_tp_by_percentage_time(frac) {
                    Some(idx) => cumulative_distance(&self.points, idx),
                    None => f64::NAN,
                }
            })
            .collect())
    }

    /// Local gradient (rise/run as a percentage) sampled at `num_chunks`
    /// equally spaced fractions of total distance, computed between each
    /// chunk's nearest point and its immediate successor.
    pub fn gradient_by_distance(&self, num_chunks: u32) -> Result<Vec<f64>, TrackError> {
        self.require_non_empty()?;
        if num_chunks < 2 {
            return Err(TrackError::InvalidChunkSize(num_chunks));
        }
        Ok((0..num_chunks)
            .map(|i| {
                let frac = (i as f64 + 0.5) / num_chunks as f64;
                let Some(idx) = self.closest_tp_by_percentage_distance(frac) else {
                    return f64::NAN;
                };
                let Some(next) = self.points.get(idx + 1) else {
                    return f64::NAN;
                };
                let cur = &self.points[idx];
                let (Some(alt_a), Some(alt_b)) = (cur.altitude, next.altitude) else {
                    return f64::NAN;
                };
                let run = cur.coord.distance(&next.coord);
                if run <= 0.0 {
                    f64::NAN
                } else {
                    (alt_b - alt_a) / run * 100.0
                }
            })
            .collect())
    }

    fn resample_by(
        &self,
        num_chunks: u32,
        by_time: bool,
        extract: impl Fn(&Trackpoint) -> Option<f64>,
    ) -> Result<Vec<f64>, TrackError> {
        self.require_non_empty()?;
        if num_chunks < 2 {
            return Err(TrackError::InvalidChunkSize(num_chunks));
        }
        if by_time && self.duration(true) == 0 {
            return Ok(vec![f64::NAN; num_chunks as usize]);
        }
        Ok((0..num_chunks)
            .map(|i| {
                let frac = (i as f64 + 0.5) / num_chunks as f64;
                let idx = if by_time {
                    self.closest_tp_by_percentage_time(frac)
                } else {
                    self.closest_tp_by_percentage_distance(frac)
                };
                idx.and_then(|i| self.points.get(i)).and_then(&extract).unwrap_or(f64::NAN)
            })
            .collect())
    }

    /// Douglas-Peucker simplification: keep only the points needed so that
    /// no discarded point deviates from the simplified polyline by more
    /// than `epsilon_metres`. The first and last points are always kept.
    pub fn simplify(&self, epsilon_metres: f64) -> Result<Vec<Trackpoint>, TrackError> {
        self.require_non_empty()?;
        if self.points.len() <= 2 {
            return Ok(self.points.clone());
        }
        let mut keep = vec![false; self.points.len()];
        keep[0] = true;
        keep[self.points.len() - 1] = true;
        rdp(&self.points, 0, self.points.len() - 1, epsilon_metres, &mut keep);
        Ok(self
            .points
            .iter()
            .zip(keep.iter())
            .filter_map(|(tp, &k)| k.then(|| tp.clone()))
            .collect())
    }

    /// Fill in any point with a missing timestamp by linear interpolation
    /// (in the distance domain) between its nearest timestamped
    /// neighbors. Points before the first or after the last timestamped
    /// point are left untouched.
    pub fn interpolate_times(&self) -> Result<Vec<Trackpoint>, TrackError> {
        self.require_non_empty()?;
        self.check_time_ordering()?;
        let mut out = self.points.clone();
        let known: Vec<usize> = out
            .iter()
            .enumerate()
            .filter_map(|(i, tp)| tp.timestamp.map(|_| i))
            .collect();
        for w in known.windows(2) {
            let (lo, hi) = (w[0], w[1]);
            if hi == lo + 1 {
                continue;
            }
            let t_lo = out[lo].timestamp.unwrap();
            let t_hi = out[hi].timestamp.unwrap();
            let d_lo: f64 = cumulative_distance(&out, lo);
            let d_hi: f64 = cumulative_distance(&out, hi);
            if d_hi <= d_lo {
                continue;
            }
            for i in (lo + 1)..hi {
                let d_i = cumulative_distance(&out, i);
                let frac = (d_i - d_lo) / (d_hi - d_lo);
                let ts = t_lo as f64 + frac * (t_hi - t_lo) as f64;
                out[i].timestamp = Some(ts.round() as i64);
            }
        }
        Ok(out)
    }
}

fn cumulative_distance(points: &[Trackpoint], upto: usize) -> f64 {
    points
        .windows(2)
        .take(upto)
        .map(|w| w[0].coord.distance(&w[1].coord))
        .sum()
}

/// Perpendicular distance (metres, via Heron's formula over great-circle
/// side lengths) from `p` to the segment `a`-`b`.
fn perpendicular_distance(a: &Trackpoint, b: &Trackpoint, p: &Trackpoint) -> f64 {
    let d_ab = a.coord.distance(&b.coord);
    if d_ab == 0.0 {
        return a.coord.distance(&p.coord);
    }
    let d_ap = a.coord.distance(&p.coord);
    let d_bp = b.coord.distance(&p.coord);
    let s = (d_ab + d_ap + d_bp) / 2.0;
    let area_sq = (s * (s - d_ab) * (s - d_ap) * (s - d_bp)).max(0.0);
    2.0 * area_sq.sqrt() / d_ab
}

fn rdp(points: &[Trackpoint], start: usize, end: usize, epsilon: f64, keep: &mut [bool]) {
    if end <= start + 1 {
        return;
    }
    let mut max_dist = 0.0;
    let mut max_idx = start;
    for i in (start + 1)..end {
        let d = perpendicular_distance(&points[start], &points[end], &points[i]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }
    if max_dist > epsilon {
        keep[max_idx] = true;
        rdp(points, start, max_idx, epsilon, keep);
        rdp(points, max_idx, end, epsilon, keep);
    }
}

#[cfg(test)]
mod tests {
    use crate::coord::{Coord, LatLon};
    use crate::trackpoint::Trackpoint;
    use crate::track::Track;
    use crate::uid::Uid;

    fn tp(lat: f64, lon: f64, ts: i64) -> Trackpoint {
        let mut t = Trackpoint::new(Coord::LatLon(LatLon::new(lat, lon)));
        t.timestamp = Some(ts);
        t
    }

    #[test]
    fn simplify_drops_colinear_points() {
        let mut t = Track::new(Uid::from_raw(1), false);
        t.points.push(tp(0.0, 0.0, 0));
        t.points.push(tp(0.0, 0.5, 1));
        t.points.push(tp(0.0, 1.0, 2));
        let simplified = t.simplify(1.0).unwrap();
        assert_eq!(simplified.len(), 2);
    }

    #[test]
    fn simplify_keeps_a_point_that_deviates() {
        let mut t = Track::new(Uid::from_raw(1), false);
        t.points.push(tp(0.0, 0.0, 0));
        t.points.push(tp(1.0, 0.5, 1));
        t.points.push(tp(0.0, 1.0, 2));
        let simplified = t.simplify(100.0).unwrap();
        assert_eq!(simplified.len(), 3);
    }

    #[test]
    fn resample_rejects_small_chunk_count() {
        let mut t = Track::new(Uid::from_raw(1), false);
        t.points.push(tp(0.0, 0.0, 0));
        assert!(t.elevation_by_distance(1).is_err());
    }

    #[test]
    fn elevation_by_distance_has_exactly_num_chunks_entries() {
        let mut t = Track::new(Uid::from_raw(1), false);
        for i in 0..10 {
            let mut p = tp(0.0, i as f64 * 0.001, i as i64);
            p.altitude = Some(i as f64);
            t.points.push(p);
        }
        let chunks = t.elevation_by_distance(4).unwrap();
        assert_eq!(chunks.len(), 4);
    }

    #[test]
    fn interpolate_times_fills_gap_proportionally() {
        let mut t = Track::new(Uid::from_raw(1), false);
        let mut a = tp(0.0, 0.0, 0);
        a.timestamp = Some(0);
        let mut mid = tp(0.0, 0.5, 0);
        mid.timestamp = None;
        let mut b = tp(0.0, 1.0, 0);
        b.timestamp = Some(100);
        t.points.extend([a, mid, b]);
        let filled = t.interpolate_times().unwrap();
        let mid_ts = filled[1].timestamp.unwrap();
        assert!((40..=60).contains(&mid_ts));
    }
}
