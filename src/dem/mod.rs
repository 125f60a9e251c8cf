//! Digital elevation model tiles: loading, recognition, reference-counted
//! caching, and sample interpolation.
//!
//! Grounded on `examples/original_source/src/dem_cache.cpp` and
//! `dems.cpp` for the cache/refcount shape and source recognition, and on
//! the standard SRTM `.hgt` tile format (gzip-compressed big-endian `i16`
//! grids, north-to-south row order, 3601x3601 for 1 arc-second or
//! 1201x1201 for 3 arc-second).

pub mod cache;
pub mod interpolate;
pub mod tile;

pub use cache::{DemCache, TileHandle};
pub use interpolate::Interpolation;
pub use tile::{Dem, DemSource};
