//! Track/Route engine: geometric computations, statistical reductions,
//! structural edits, and DEM enrichment over a sequence of [`Trackpoint`]s.
//!
//! `Track` and `Route` are the same type (`is_route` flag), grounded on
//! `examples/original_source/src/viktrack.h`'s comment: "Instead of having a
//! separate VikRoute type, routes are considered tracks... all track
//! operations must cope with a 'route' version." This is the largest
//! single component, so its sub-operations are split into sibling
//! modules (metrics / resample / lookup / edit / dem_enrich) rather than
//! one flat file.

pub mod dem_enrich;
pub mod edit;
pub mod lookup;
pub mod metrics;
pub mod resample;

use serde::{Deserialize, Serialize};

use crate::coord::LatLonBBox;
use crate::error::TrackError;
use crate::trackpoint::Trackpoint;
use crate::uid::Uid;

/// An RGB color for track display; carried through the model even though
/// rendering itself is out of scope here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub uid: Uid,
    pub name: Option<String>,
    pub comment: Option<String>,
    pub description: Option<String>,
    pub source: Option<String>,
    pub track_type: Option<String>,
    pub color: Option<Rgb>,
    pub visible: bool,
    pub is_route: bool,
    pub points: Vec<Trackpoint>,
    pub bbox: LatLonBBox,
}

impl Track {
    pub fn new(uid: Uid, is_route: bool) -> Self {
        Track {
            uid,
            name: None,
            comment: None,
            description: None,
            source: None,
            track_type: None,
            color: None,
            visible: true,
            is_route,
            points: Vec::new(),
            bbox: LatLonBBox::empty(),
        }
    }

    /// A deep copy with an empty point list, same uid. Used by structural
    /// edits that need a sibling track to move points into (grounded on
    /// `viktrack.h`'s `vik_track_copy(tr, copy_points)`).
    pub fn without_points(&self) -> Self {
        Track {
            points: Vec::new(),
            bbox: LatLonBBox::empty(),
            ..self.clone()
        }
    }

    /// Recompute `bbox` from `points`. Must be called by the caller after
    /// any structural edit that doesn't already do so internally.
    pub fn recalculate_bbox(&mut self) {
        let latlons: Vec<_> = self.points.iter().map(|tp| tp.coord.as_latlon()).collect();
        self.bbox = LatLonBBox::from_points(latlons.iter());
    }

    pub fn tp_count(&self) -> usize {
        self.points.len()
    }

    pub fn first(&self) -> Option<&Trackpoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Trackpoint> {
        self.points.last()
    }

    /// One more than the number of in-body `new_segment=true` flags,
    /// excluding the first point. Routes are always a single segment
    /// regardless of stored flags.
    pub fn segment_count(&self) -> usize {
        if self.points.is_empty() {
            return 0;
        }
        if self.is_route {
            return 1;
        }
        1 + self.points.iter().skip(1).filter(|tp| tp.new_segment).count()
    }

    /// Iterate `(start, end)` index ranges for each maximal segment.
    pub(crate) fn segment_ranges(&self) -> Vec<(usize, usize)> {
        if self.points.is_empty() {
            return Vec::new();
        }
        if self.is_route {
            return vec![(0, self.points.len())];
        }
        let mut ranges = Vec::new();
        let mut start = 0;
        for (i, tp) in self.points.iter().enumerate().skip(1) {
            if tp.new_segment {
                ranges.push((start, i));
                start = i;
            }
        }
        ranges.push((start, self.points.len()));
        ranges
    }

    pub(crate) fn require_non_empty(&self) -> Result<(), TrackError> {
        if self.points.is_empty() {
            Err(TrackError::EmptyTrack)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{Coord, LatLon};

    fn tp(lat: f64, lon: f64) -> Trackpoint {
        Trackpoint::new(Coord::LatLon(LatLon::new(lat, lon)))
    }

    #[test]
    fn bbox_matches_point_envelope() {
        let mut t = Track::new(Uid::from_raw(1), false);
        t.points.push(tp(0.0, 0.0));
        t.points.push(tp(1.0, 2.0));
        t.points.push(tp(-1.0, -2.0));
        t.recalculate_bbox();
        assert_eq!(t.bbox.north, 1.0);
        assert_eq!(t.bbox.south, -1.0);
        assert_eq!(t.bbox.east, 2.0);
        assert_eq!(t.bbox.west, -2.0);
    }

    #[test]
    fn segment_count_single_point() {
        let mut t = Track::new(Uid::from_raw(1), false);
        t.points.push(tp(0.0, 0.0));
        assert_eq!(t.segment_count(), 1);
    }

    #[test]
    fn route_is_always_one_segment() {
        let mut t = Track::new(Uid::from_raw(1), true);
        t.points.push(tp(0.0, 0.0));
        let mut second = tp(0.0, 1.0);
        second.new_segment = true;
        t.points.push(second);
        assert_eq!(t.segment_count(), 1);
    }
}
