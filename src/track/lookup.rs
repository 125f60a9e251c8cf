//! Point lookups by distance and by percentage along the track, grounded
//! on `examples/original_source/src/viktrack.h`'s
//! `vik_track_get_tp_by_dist`, `vik_track_get_closest_tp_by_percentage_dist`,
//! and `vik_track_get_closest_tp_by_percentage_time`.

use super::Track;

/// A trackpoint's position within its track, by index. Tracks don't give
/// individual points stable uids, so a reference is only valid against
/// the `Track` it was looked up from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TpRef(pub usize);

impl Track {
    /// The trackpoint at or around cumulative distance `target_metres`
    /// along the track (including segment gaps). When the target lands
    /// exactly on a point's own cumulative distance, that point is
    /// returned outright. Otherwise it falls strictly between two
    /// points, and `get_next_point` chooses the point just past it if
    /// true, or just before it if false. A run of coincident points
    /// (zero distance apart) that the target lands on ties between
    /// several equally-valid candidates; that tie resolves to the
    /// earliest (lowest-index) one, which is what a left-to-right scan
    /// naturally finds first. Returns that point's `TpRef` and its own
    /// cumulative distance from the start.
    pub fn tp_by_distance(&self, target_metres: f64, get_next_point: bool) -> Option<(TpRef, f64)> {
        if self.points.is_empty() {
            return None;
        }
        if target_metres <= 0.0 {
            return Some((TpRef(0), 0.0));
        }
        let mut cumulative = 0.0;
        for (i, w) in self.points.windows(2).enumerate() {
            let d = w[0].coord.distance(&w[1].coord);
            let next_cumulative = cumulative + d;
            if next_cumulative == target_metres {
                return Some((TpRef(i + 1), next_cumulative));
            }
            if next_cumulative > target_metres {
                return if get_next_point {
                    Some((TpRef(i + 1), next_cumulative))
                } else {
                    Some((TpRef(i), cumulative))
                };
            }
            cumulative = next_cumulative;
        }
        Some((TpRef(self.points.len() - 1), cumulative))
    }

    /// The trackpoint closest to `pct` (0.0..=1.0) of the way along the
    /// track by cumulative distance.
    pub fn closest_tp_by_percentage_distance(&self, pct: f64) -> Option<usize> {
        if self.points.len() < 2 {
            return self.points.first().map(|_| 0);
        }
        let total = self.length();
        if total <= 0.0 {
            return Some(0);
        }
        let target = pct.clamp(0.0, 1.0) * total;
        self.closest_index_by_cumulative(target, |w| w[0].coord.distance(&w[1].coord))
    }

    /// The trackpoint closest to `pct` (0.0..=1.0) of the way along the
    /// track by elapsed time. Returns `None` if points lack timestamps.
    pub fn closest_tp_by_percentage_time(&self, pct: f64) -> Option<usize> {
        let first = self.points.first()?.timestamp?;
        let last = self.points.last()?.timestamp?;
        let total = (last - first) as f64;
        if total <= 0.0 {
            return Some(0);
        }
        let target = pct.clamp(0.0, 1.0) * total;
        let mut cumulative = 0.0;
        let mut best_idx = 0;
        let mut best_delta = f64::INFINITY;
        for (i, tp) in self.points.iter().enumerate() {
            if let Some(ts) = tp.timestamp {
                cumulative = ts as f64 - first as f64;
            }
            let delta = (cumulative - target).abs();
            if delta < best_delta {
                best_delta = delta;
                best_idx = i;
            }
        }
        Some(best_idx)
    }

    fn closest_index_by_cumulative(&self, target: f64, step: impl Fn(&[crate::trackpoint::Trackpoint]) -> f64) -> Option<usize> {
        let mut cumulative = 0.0;
        let mut best_idx = 0;
        let mut best_delta = (cumulative - target).abs();
        for (i, w) in self.points.windows(2).enumerate() {
            cumulative += step(w);
            let delta = (cumulative - target).abs();
            if delta < best_delta {
                best_delta = delta;
                best_idx = i + 1;
            }
        }
        Some(best_idx)
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

    fn sample_track() -> Track {
        let mut t = Track::new(Uid::from_raw(1), false);
        for i in 0..5 {
            t.points.push(tp(0.0 + i as f64 * 0.01, 0.0, i as i64 * 10));
        }
        t
    }

    #[test]
    fn tp_by_distance_at_zero_is_first_point() {
        let t = sample_track();
        let (tp_ref, metres) = t.tp_by_distance(0.0, true).unwrap();
        assert_eq!(tp_ref, TpRef(0));
        assert_eq!(metres, 0.0);
    }

    #[test]
    fn tp_by_distance_past_end_is_last_point() {
        let t = sample_track();
        let (tp_ref, _) = t.tp_by_distance(1_000_000.0, true).unwrap();
        assert_eq!(tp_ref, TpRef(4));
        let (tp_ref, _) = t.tp_by_distance(1_000_000.0, false).unwrap();
        assert_eq!(tp_ref, TpRef(4));
    }

    #[test]
    fn tp_by_distance_between_points_chooses_next_or_previous() {
        let t = sample_track();
        let one_hop = t.points[0].coord.distance(&t.points[1].coord);
        let midway = one_hop * 1.5;

        let (next, next_metres) = t.tp_by_distance(midway, true).unwrap();
        assert_eq!(next, TpRef(2));
        assert!((next_metres - one_hop * 2.0).abs() < 1e-6);

        let (prev, prev_metres) = t.tp_by_distance(midway, false).unwrap();
        assert_eq!(prev, TpRef(1));
        assert!((prev_metres - one_hop).abs() < 1e-6);
    }

    #[test]
    fn tp_by_distance_exact_landing_is_unambiguous_regardless_of_flag() {
        let t = sample_track();
        let one_hop = t.points[0].coord.distance(&t.points[1].coord);

        let (next, _) = t.tp_by_distance(one_hop, true).unwrap();
        assert_eq!(next, TpRef(1));
        let (prev, _) = t.tp_by_distance(one_hop, false).unwrap();
        assert_eq!(prev, TpRef(1));
    }

    #[test]
    fn tp_by_distance_at_length_returns_the_last_point() {
        let t = sample_track();
        let total = t.length();
        let (last, _) = t.tp_by_distance(total, false).unwrap();
        assert_eq!(last, TpRef(4));
        let (last, _) = t.tp_by_distance(total, true).unwrap();
        assert_eq!(last, TpRef(4));
    }

    #[test]
    fn tp_by_distance_ties_among_coincident_points_resolve_to_earliest() {
        let mut t = sample_track();
        // Duplicate point 1's position at index 2, so the segment between
        // them has zero length; landing exactly on that shared distance
        // should resolve to the earliest (lower-index) of the tied points.
        let dup = t.points[1].clone();
        t.points.insert(2, dup);

        let one_hop = t.points[0].coord.distance(&t.points[1].coord);
        let (tp_ref, _) = t.tp_by_distance(one_hop, true).unwrap();
        assert_eq!(tp_ref, TpRef(1));
    }

    #[test]
    fn closest_by_percentage_distance_midpoint() {
        let t = sample_track();
        let idx = t.closest_tp_by_percentage_distance(0.5).unwrap();
        assert_eq!(idx, 2);
    }

    #[test]
    fn closest_by_percentage_time_midpoint() {
        let t = sample_track();
        let idx = t.closest_tp_by_percentage_time(0.5).unwrap();
        assert_eq!(idx, 2);
    }
}
