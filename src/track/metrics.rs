//! Statistical reductions over a track's points: length, duration, speed,
//! elevation gain, and point-level extrema lookups.
//!
//! Function set grounded on `examples/original_source/src/viktrack.h`'s
//! `vik_track_get_length`, `get_length_including_gaps`, `get_duration`,
//! `get_max_speed`, `get_average_speed`, `get_elevation_gain`, and the
//! `tp_at_max_speed`/`tp_at_max_alt`/`tp_at_min_alt` family; the
//! moving-vs-elapsed distinction mirrors flight-duration helpers seen
//! elsewhere (flight time excludes ground legs the way moving speed here
//! excludes stationary legs).

use crate::error::TrackError;

use super::Track;

impl Track {
    /// Sum of point-to-point distances, counting the distance across a
    /// segment break. This is the track's "real" total length.
    pub fn length(&self) -> f64 {
        self.length_impl(true)
    }

    /// Like [`Track::length`] but skips any gap that spans a segment
    /// boundary (`new_segment == true`), summing only within-segment
    /// travel.
    pub fn length_excluding_gaps(&self) -> f64 {
        self.length_impl(false)
    }

    fn length_impl(&self, include_gaps: bool) -> f64 {
        let mut total = 0.0;
        for w in self.points.windows(2) {
            let (a, b) = (&w[0], &w[1]);
            if !include_gaps && b.new_segment {
                continue;
            }
            total += a.coord.distance(&b.coord);
        }
        total
    }

    /// Total time span from first to last timestamped point. When
    /// `include_segments` is false, sums only the duration within each
    /// segment (excluding the gap between segments).
    pub fn duration(&self, include_segments: bool) -> i64 {
        if include_segments {
            let first = self.points.iter().find_map(|tp| tp.timestamp);
            let last = self.points.iter().rev().find_map(|tp| tp.timestamp);
            match (first, last) {
                (Some(a), Some(b)) => b - a,
                _ => 0,
            }
        } else {
            self.segment_ranges()
                .iter()
                .map(|&(start, end)| {
                    let segment = &self.points[start..end];
                    let first = segment.iter().find_map(|tp| tp.timestamp);
                    let last = segment.iter().rev().find_map(|tp| tp.timestamp);
                    match (first, last) {
                        (Some(a), Some(b)) => b - a,
                        _ => 0,
                    }
                })
                .sum()
        }
    }

    /// Average speed over the track's full length and duration, in
    /// metres per second. `None` if duration is zero or unknown.
    pub fn average_speed(&self) -> Option<f64> {
        let duration = self.duration(true);
        if duration <= 0 {
            return None;
        }
        Some(self.length() / duration as f64)
    }

    /// Average speed excluding pauses: a consecutive, same-segment pair
    /// whose time gap is `>= stop_length_seconds` does not contribute its
    /// distance or time to the average.
    pub fn average_speed_moving(&self, stop_length_seconds: i64) -> Option<f64> {
        let mut moving_distance = 0.0;
        let mut moving_time = 0i64;
        for w in self.points.windows(2) {
            let (a, b) = (&w[0], &w[1]);
            if b.new_segment {
                continue;
            }
            let (Some(ta), Some(tb)) = (a.timestamp, b.timestamp) else {
                continue;
            };
            let dt = tb - ta;
            if dt <= 0 || dt >= stop_length_seconds {
                continue;
            }
            moving_distance += a.coord.distance(&b.coord);
            moving_time += dt;
        }
        if moving_time == 0 {
            None
        } else {
            Some(moving_distance / moving_time as f64)
        }
    }

    /// The highest instantaneous speed (distance/Δt) over consecutive,
    /// same-segment, timestamped pairs.
    pub fn max_speed(&self) -> Option<f64> {
        let mut best: Option<f64> = None;
        for w in self.points.windows(2) {
            let (a, b) = (&w[0], &w[1]);
            if b.new_segment {
                continue;
            }
            let (Some(ta), Some(tb)) = (a.timestamp, b.timestamp) else {
                continue;
            };
            let dt = tb - ta;
            if dt <= 0 {
                continue;
            }
            let speed = a.coord.distance(&b.coord) / dt as f64;
            best = max_opt(best, speed);
        }
        best
    }

    /// Index of the point ending the pair at which [`Track::max_speed`]
    /// occurs, if any.
    pub fn tp_at_max_speed(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, w) in self.points.windows(2).enumerate() {
            let (a, b) = (&w[0], &w[1]);
            if b.new_segment {
                continue;
            }
            let (Some(ta), Some(tb)) = (a.timestamp, b.timestamp) else {
                continue;
            };
            let dt = tb - ta;
            if dt <= 0 {
                continue;
            }
            let speed = a.coord.distance(&b.coord) / dt as f64;
            if best.map_or(true, |(_, s)| speed > s) {
                best = Some((i + 1, speed));
            }
        }
        best.map(|(i, _)| i)
    }

    /// `(ascent, descent)` summed over consecutive points that both carry
    /// an altitude, in metres. Both values are non-negative.
    pub fn elevation_gain(&self) -> Option<(f64, f64)> {
        let mut up = 0.0;
        let mut down = 0.0;
        let mut any = false;
        for w in self.points.windows(2) {
            if let (Some(a), Some(b)) = (w[0].altitude, w[1].altitude) {
                any = true;
                if b > a {
                    up += b - a;
                } else {
                    down += a - b;
                }
            }
        }
        any.then_some((up, down))
    }

    pub fn min_alt(&self) -> Option<f64> {
        self.points.iter().filter_map(|tp| tp.altitude).fold(None, min_opt)
    }

    pub fn max_alt(&self) -> Option<f64> {
        self.points.iter().filter_map(|tp| tp.altitude).fold(None, max_opt)
    }

    pub fn tp_at_min_alt(&self) -> Option<usize> {
        self.points
            .iter()
            .enumerate()
            .filter_map(|(i, tp)| tp.altitude.map(|a| (i, a)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    pub fn tp_at_max_alt(&self) -> Option<usize> {
        self.points
            .iter()
            .enumerate()
            .filter_map(|(i, tp)| tp.altitude.map(|a| (i, a)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Number of consecutive point pairs whose coordinates are identical.
    pub fn dup_point_count(&self) -> usize {
        self.points.windows(2).filter(|w| w[0].coord == w[1].coord).count()
    }

    /// Number of consecutive point pairs that share a timestamp.
    pub fn same_time_point_count(&self) -> usize {
        self.points
            .windows(2)
            .filter(|w| w[0].timestamp.is_some() && w[0].timestamp == w[1].timestamp)
            .count()
    }

    /// Verify that timestamps are non-decreasing within each segment,
    /// returning the first violation found. Used by edits that assume
    /// time-ordering (resampling, interpolation, `split_by_time`).
    pub fn check_time_ordering(&self) -> Result<(), TrackError> {
        for (start, end) in self.segment_ranges() {
            for i in start..end.saturating_sub(1) {
                let (a, b) = (&self.points[i], &self.points[i + 1]);
                if let (Some(ta), Some(tb)) = (a.timestamp, b.timestamp) {
                    if tb < ta {
                        return Err(TrackError::Ordering {
                            previous_index: i,
                            previous_timestamp: Some(ta),
                            offending_index: i + 1,
                            offending_timestamp: Some(tb),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

fn max_opt(acc: Option<f64>, x: f64) -> Option<f64> {
    Some(acc.map_or(x, |a| a.max(x)))
}

fn min_opt(acc: Option<f64>, x: f64) -> Option<f64> {
    Some(acc.map_or(x, |a| a.min(x)))
}

#[cfg(test)]
mod tests {
    use crate::coord::{Coord, LatLon};
    use crate::trackpoint::Trackpoint;
    use crate::track::Track;
    use crate::uid::Uid;
    use approx::assert_relative_eq;

    fn tp_at(lat: f64, lon: f64, ts: Option<i64>) -> Trackpoint {
        let mut t = Trackpoint::new(Coord::LatLon(LatLon::new(lat, lon)));
        t.timestamp = ts;
        t
    }

    /// Three equatorial points 0.001 degrees apart (~111.32m per hop), the
    /// middle hop flagged as a new segment: ~222.64m including the gap,
    /// ~111.32m excluding it.
    #[test]
    fn length_including_vs_excluding_gaps() {
        let mut t = Track::new(Uid::from_raw(1), false);
        t.points.push(tp_at(0.0, 0.0, Some(0)));
        let mut middle = tp_at(0.0, 0.001, Some(10));
        middle.new_segment = true;
        t.points.push(middle);
        t.points.push(tp_at(0.0, 0.002, Some(20)));

        assert_relative_eq!(t.length(), 222.64, epsilon = 1.0);
        assert_relative_eq!(t.length_excluding_gaps(), 111.32, epsilon = 1.0);
    }

    #[test]
    fn duration_and_average_speed() {
        let mut t = Track::new(Uid::from_raw(1), false);
        t.points.push(tp_at(0.0, 0.0, Some(0)));
        t.points.push(tp_at(0.01, 0.0, Some(10)));
        assert_eq!(t.duration(true), 10);
        assert!(t.average_speed().unwrap() > 100.0);
    }

    #[test]
    fn elevation_gain_splits_ascent_and_descent() {
        let mut t = Track::new(Uid::from_raw(1), false);
        let mut a = tp_at(0.0, 0.0, Some(0));
        a.altitude = Some(100.0);
        let mut b = tp_at(0.0, 0.0, Some(1));
        b.altitude = Some(90.0);
        let mut c = tp_at(0.0, 0.0, Some(2));
        c.altitude = Some(110.0);
        t.points.extend([a, b, c]);
        assert_eq!(t.elevation_gain(), Some((20.0, 10.0)));
    }

    #[test]
    fn tp_at_max_alt_finds_the_peak_index() {
        let mut t = Track::new(Uid::from_raw(1), false);
        let mut a = tp_at(0.0, 0.0, None);
        a.altitude = Some(10.0);
        let mut b = tp_at(0.0, 0.0, None);
        b.altitude = Some(50.0);
        let mut c = tp_at(0.0, 0.0, None);
        c.altitude = Some(30.0);
        t.points.extend([a, b, c]);
        assert_eq!(t.tp_at_max_alt(), Some(1));
    }

    #[test]
    fn dup_and_same_time_counts() {
        let mut t = Track::new(Uid::from_raw(1), false);
        t.points.push(tp_at(0.0, 0.0, Some(0)));
        t.points.push(tp_at(0.0, 0.0, Some(0)));
        t.points.push(tp_at(1.0, 1.0, Some(5)));
        assert_eq!(t.dup_point_count(), 1);
        assert_eq!(t.same_time_point_count(), 1);
    }

    #[test]
    fn empty_track_metrics_are_none_or_zero() {
        let t = Track::new(Uid::from_raw(1), false);
        assert_eq!(t.length(), 0.0);
        assert_eq!(t.duration(true), 0);
        assert_eq!(t.max_speed(), None);
    }
}
