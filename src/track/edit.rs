//! Structural edits that add, remove, or rearrange points, or split one
//! track into several.
//!
//! Grounded on `examples/original_source/src/viktrack.h`'s
//! `vik_track_reverse`, `vik_track_merge_segments`,
//! `vik_track_split_segments`, `vik_track_split_at_trackpoint`,
//! `vik_track_remove_dup_points`, and `vik_track_steal_and_append_points`.
//! Every edit here either succeeds and leaves the track internally
//! consistent (`bbox` recomputed) or returns an error without mutating
//! `self`, per the no-partial-mutation contract.

use crate::error::TrackError;
use crate::trackpoint::Trackpoint;

use super::Track;

impl Track {
    /// Reverse point order in place. `new_segment` flags move with their
    /// point but the flag that marked "start of segment N" now marks
    /// "start of segment N" from the other end, so segment boundaries are
    /// recomputed rather than merely carried along.
    pub fn reverse(&mut self) -> Result<(), TrackError> {
        self.require_non_empty()?;
        let len = self.points.len();
        // `new_segment` on original index k means "a gap precedes point k",
        // i.e. between original (k-1, k). After reversal that gap sits
        // between new indices (len-k, len-k-1), so it now precedes new
        // index (len-k).
        let mut new_boundaries = vec![false; len];
        for (k, tp) in self.points.iter().enumerate().skip(1) {
            if tp.new_segment {
                new_boundaries[len - k] = true;
            }
        }
        self.points.reverse();
        for (tp, &boundary) in self.points.iter_mut().zip(new_boundaries.iter()) {
            tp.new_segment = boundary;
        }
        if let Some(first) = self.points.first_mut() {
            first.new_segment = false;
        }
        self.recalculate_bbox();
        Ok(())
    }

    /// Clear every `new_segment` flag but the first point's, collapsing
    /// all segments into one.
    pub fn merge_segments(&mut self) -> Result<(), TrackError> {
        self.require_non_empty()?;
        for tp in self.points.iter_mut().skip(1) {
            tp.new_segment = false;
        }
        Ok(())
    }

    /// Split each segment out into its own `Track`, preserving point order
    /// and metadata (name suffixed with segment number by the caller, not
    /// here). Returns one track per segment, in order.
    pub fn split_into_segments(&self) -> Result<Vec<Track>, TrackError> {
        self.require_non_empty()?;
        let mut out = Vec::new();
        for (start, end) in self.segment_ranges() {
            let mut seg = self.without_points();
            seg.points = self.points[start..end].to_vec();
            if let Some(first) = seg.points.first_mut() {
                first.new_segment = false;
            }
            seg.recalculate_bbox();
            out.push(seg);
        }
        Ok(out)
    }

    /// Split into multiple tracks wherever the gap between consecutive
    /// timestamped points exceeds `threshold_secs`.
    pub fn split_by_time(&self, threshold_secs: i64) -> Result<Vec<Track>, TrackError> {
        self.require_non_empty()?;
        self.check_time_ordering()?;
        let mut out = Vec::new();
        let mut start = 0;
        for i in 1..self.points.len() {
            let gap = match (self.points[i - 1].timestamp, self.points[i].timestamp) {
                (Some(a), Some(b)) => b - a,
                _ => 0,
            };
            if gap > threshold_secs {
                out.push(self.sub_track(start, i));
                start = i;
            }
        }
        out.push(self.sub_track(start, self.points.len()));
        Ok(out)
    }

    /// Split into chunks of at most `n` points each (the last chunk may be
    /// shorter).
    pub fn split_every_n_points(&self, n: usize) -> Result<Vec<Track>, TrackError> {
        self.require_non_empty()?;
        if n == 0 {
            return Err(TrackError::InvalidChunkSize(0));
        }
        let mut out = Vec::new();
        let mut start = 0;
        while start < self.points.len() {
            let end = (start + n).min(self.points.len());
            out.push(self.sub_track(start, end));
            start = end;
        }
        Ok(out)
    }

    /// Split into exactly two tracks at point index `at`, which is
    /// duplicated so both halves retain it as their shared boundary
    /// point.
    pub fn split_at(&self, at: usize) -> Result<(Track, Track), TrackError> {
        self.require_non_empty()?;
        if at == 0 || at >= self.points.len() {
            return Err(TrackError::InvalidIndex { index: at, len: self.points.len() });
        }
        Ok((self.sub_track(0, at + 1), self.sub_track(at, self.points.len())))
    }

    fn sub_track(&self, start: usize, end: usize) -> Track {
        let mut seg = self.without_points();
        seg.points = self.points[start..end].to_vec();
        if let Some(first) = seg.points.first_mut() {
            first.new_segment = false;
        }
        seg.recalculate_bbox();
        seg
    }

    /// Move all of `other`'s points onto the end of `self`, leaving
    /// `other` empty. The first moved point is marked as a new segment so
    /// the seam is visible.
    pub fn steal_and_append(&mut self, other: &mut Track) -> Result<(), TrackError> {
        other.require_non_empty()?;
        let mut moved = std::mem::take(&mut other.points);
        if let Some(first) = moved.first_mut() {
            first.new_segment = true;
        }
        self.points.append(&mut moved);
        self.recalculate_bbox();
        other.recalculate_bbox();
        Ok(())
    }

    /// Clone this track's points with time/speed/precision fields and
    /// segment boundaries cleared, suitable as a route's point list. A
    /// route carries geometry only, never timing.
    pub fn to_route_points(&self) -> Vec<Trackpoint> {
        let mut points = self.points.clone();
        for tp in points.iter_mut() {
            tp.new_segment = false;
            tp.timestamp = None;
            tp.speed = None;
            tp.hdop = None;
            tp.vdop = None;
            tp.pdop = None;
        }
        points
    }

    /// Remove points whose coordinate exactly matches the previous kept
    /// point. Returns the number removed.
    pub fn remove_dup_points(&mut self) -> usize {
        let before = self.points.len();
        let mut kept: Vec<Trackpoint> = Vec::with_capacity(before);
        for tp in self.points.drain(..) {
            if kept.last().map_or(false, |prev: &Trackpoint| prev.coord == tp.coord) {
                continue;
            }
            kept.push(tp);
        }
        self.points = kept;
        self.recalculate_bbox();
        before - self.points.len()
    }

    /// Remove points that share a timestamp with the previous kept point.
    /// Returns the number removed.
    pub fn remove_same_time_points(&mut self) -> usize {
        let before = self.points.len();
        let mut kept: Vec<Trackpoint> = Vec::with_capacity(before);
        for tp in self.points.drain(..) {
            let dup = kept
                .last()
                .map_or(false, |prev: &Trackpoint| prev.timestamp.is_some() && prev.timestamp == tp.timestamp && !tp.new_segment);
            if dup {
                continue;
            }
            kept.push(tp);
        }
        self.points = kept;
        before - self.points.len()
    }

    /// Clear every timestamp, preserving point order. Idempotent: running
    /// it twice leaves the track the same as running it once. Used
    /// before sharing a track publicly without revealing when it was
    /// recorded.
    pub fn anonymize_times(&mut self) -> Result<(), TrackError> {
        self.require_non_empty()?;
        for tp in self.points.iter_mut() {
            tp.timestamp = None;
        }
        Ok(())
    }
}
