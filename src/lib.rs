//! `trw-core`: the in-memory data model and algorithmic core of a GPS
//! track/route/waypoint (TRW) analyzer — the same role `viktrack.h`,
//! `vikwaypoint.h`, and `vikaggregatelayer.h` play together in the
//! original Viking/SlavGPS codebase, minus any windowing toolkit or
//! rendering surface (Non-goal: this crate has no GUI of its own; a
//! caller wires it up to whatever front end it likes).
//!
//! Module map:
//! - [`coord`]: lat/lon and UTM coordinate types, distance, bounding boxes.
//! - [`trackpoint`]: a single GPS fix.
//! - [`track`]: tracks and routes — geometry, statistics, resampling,
//!   structural edits, and DEM-based elevation enrichment.
//! - [`waypoint`]: a single named point of interest.
//! - [`dem`]: SRTM `.hgt` tile loading, a refcounted tile cache, and
//!   sample interpolation.
//! - [`trw`]: the container that owns one coordinate system's worth of
//!   tracks, routes, and waypoints under stable uids.
//! - [`aggregate`]: a tree of nested containers for display grouping and
//!   cross-container queries.
//! - [`job`]: the background job engine and its progress-observer
//!   protocol.
//! - [`thumbnail`]: waypoint-image thumbnail generation atop the job
//!   engine.
//! - [`settings`]: runtime-tunable configuration.
//! - [`uid`]: stable per-container identifiers.
//! - [`error`]: the crate's typed error taxonomy.

pub mod aggregate;
pub mod coord;
pub mod dem;
pub mod error;
pub mod job;
pub mod settings;
pub mod thumbnail;
pub mod track;
pub mod trackpoint;
pub mod trw;
pub mod uid;
pub mod waypoint;

pub use aggregate::{Aggregate, AggregateChild, LayerKind};
pub use coord::{Coord, CoordMode, LatLon, LatLonBBox, UTM};
pub use error::{Cancelled, JobError, LoadError, TrackError};
pub use track::Track;
pub use trackpoint::Trackpoint;
pub use trw::{ItemKind, ItemRef, Selection, Trw};
pub use uid::Uid;
pub use waypoint::Waypoint;
