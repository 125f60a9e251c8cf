//! A single sample in a track.
//!
//! Field set grounded on `examples/original_source/src/viktrack.h`'s
//! `_VikTrackpoint`, translated from "sentinel double" fields (`VIK_DEFAULT_ALTITUDE`,
//! `NAN` for no-speed) to `Option<T>`, the idiomatic Rust equivalent and
//! the same pattern used elsewhere in this codebase for modeling optional
//! GPS fields.

use serde::{Deserialize, Serialize};

use crate::coord::Coord;

/// GPS fix quality, from `viktrack.h`'s `VIK_GPS_MODE_*` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixMode {
    NoSeen,
    NoFix,
    Fix2D,
    Fix3D,
    Dgps,
    Pps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trackpoint {
    pub coord: Coord,
    /// UTC seconds since epoch.
    pub timestamp: Option<i64>,
    /// Metres.
    pub altitude: Option<f64>,
    /// Metres per second.
    pub speed: Option<f64>,
    /// Degrees, 0..360.
    pub course: Option<f64>,
    /// True if this point starts a new segment. Meaningful only for
    /// tracks; a route is always treated as one segment regardless of this
    /// flag (see `Track::segment_count`).
    pub new_segment: bool,
    pub n_sats: Option<u8>,
    pub fix_mode: FixMode,
    pub hdop: Option<f64>,
    pub vdop: Option<f64>,
    pub pdop: Option<f64>,
    pub name: Option<String>,
}

impl Trackpoint {
    pub fn new(coord: Coord) -> Self {
        Trackpoint {
            coord,
            timestamp: None,
            altitude: None,
            speed: None,
            course: None,
            new_segment: false,
            n_sats: None,
            fix_mode: FixMode::NoSeen,
            hdop: None,
            vdop: None,
            pdop: None,
            name: None,
        }
    }
}
