//! The `Dem` tile itself: a rectangular grid of elevation samples with an
//! origin, spacing, and coordinate system, plus SRTM `.hgt` parsing.
//!
//! Grid layout and the gzip/big-endian/row-flip details follow the
//! standard SRTM `.hgt` on-disk layout; the `horiz_units`/`origin` fields
//! and `recognize` dispatch are grounded on
//! `examples/original_source/src/dems.cpp`'s `recognize_source_type`,
//! which sniffs a DEM file's header rather than trusting its extension.

use std::io::Read as _;
use std::path::Path;

use flate2::read::GzDecoder;

use crate::coord::LatLon;
use crate::error::LoadError;

/// Coordinate system a tile's `origin`/`spacing` are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizUnits {
    LatLonArcSeconds,
    Utm,
}

/// Which on-disk DEM format a file was recognized as, grounded on
/// `dems.cpp`'s format dispatch. `Unrecognized` is reported instead of an
/// error so a batch load can skip bad files without aborting the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemSource {
    Srtm1, // 1 arc-second, 3601x3601
    Srtm3, // 3 arc-second, 1201x1201
    /// USGS 24K ASCII DEM (the original's other recognized kind).
    /// Recognition only: the pack carries no grounding material for the
    /// free-field ASCII record layout, so `load_hgt` reports it as an
    /// unsupported format rather than guessing at a decoder.
    Usgs24k,
    Unrecognized,
}

impl DemSource {
    pub fn side_len(self) -> Option<usize> {
        match self {
            DemSource::Srtm1 => Some(3601),
            DemSource::Srtm3 => Some(1201),
            DemSource::Usgs24k | DemSource::Unrecognized => None,
        }
    }
}

/// A loaded elevation grid. Rows are stored north-to-south on disk (row 0
/// is the northernmost); `sample` flips this internally so callers can
/// think in south-to-north array-index terms if they prefer, via `row`.
#[derive(Debug, Clone)]
pub struct Dem {
    pub horiz_units: HorizUnits,
    /// Southwest corner of the tile, in `horiz_units`. For `Utm` tiles
    /// this is ignored in favor of `utm_origin`, which is expressed in
    /// metres rather than degrees.
    pub origin: LatLon,
    /// Degrees (or metres, for UTM tiles) between adjacent samples.
    pub spacing: f64,
    pub rows: usize,
    pub cols: usize,
    /// UTM zone this tile was surveyed in. Required (and meaningful) only
    /// when `horiz_units == HorizUnits::Utm`; a query point converts to
    /// UTM and is rejected with `None` if its zone doesn't match this one.
    pub utm_zone: Option<u8>,
    /// Southwest corner of the tile in UTM metres (easting, northing),
    /// used instead of `origin` when `horiz_units == HorizUnits::Utm`.
    pub utm_origin: Option<(f64, f64)>,
    /// Row-major, north-to-south as stored on disk; `i16::MIN` marks a
    /// missing sample.
    pub(crate) samples: Vec<i16>,
}

pub const NODATA: i16 = i16::MIN;

impl Dem {
    /// Sniff `path`'s contents (not its extension) to decide whether it's
    /// a recognized DEM format, per `dems.cpp`'s `recognize_source_type`.
    /// Content/size is tried first; a `.dem` extension is the fallback for
    /// formats (USGS 24K) whose size can't be deduced without parsing it.
    pub fn recognize(path: &Path) -> Result<DemSource, LoadError> {
        let bytes = std::fs::read(path).map_err(|e| LoadError::Io { path: path.to_path_buf(), source: e })?;
        let decompressed_len = gzip_uncompressed_len(&bytes).unwrap_or(bytes.len());
        let side_len_1 = 3601 * 3601 * 2;
        let side_len_3 = 1201 * 1201 * 2;
        if decompressed_len == side_len_1 {
            Ok(DemSource::Srtm1)
        } else if decompressed_len == side_len_3 {
            Ok(DemSource::Srtm3)
        } else if path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("dem")) {
            Ok(DemSource::Usgs24k)
        } else {
            Ok(DemSource::Unrecognized)
        }
    }

    /// Parse an SRTM `.hgt(.gz)` file, with `origin` set from the
    /// filename's `N37W123`-style prefix per SRTM convention.
    pub fn load_hgt(path: &Path) -> Result<Dem, LoadError> {
        let source = Self::recognize(path)?;
        if source == DemSource::Usgs24k {
            return Err(LoadError::Parse {
                path: path.to_path_buf(),
                reason: "USGS 24K DEM recognized but decoding is not implemented".to_string(),
            });
        }
        let side_len = source
            .side_len()
            .ok_or_else(|| LoadError::UnrecognizedFormat { path: path.to_path_buf() })?;

        let raw = std::fs::read(path).map_err(|e| LoadError::Io { path: path.to_path_buf(), source: e })?;
        let bytes = if is_gzip(&raw) {
            let mut decoder = GzDecoder::new(&raw[..]);
            let mut buf = Vec::new();
            decoder
                .read_to_end(&mut buf)
                .map_err(|e| LoadError::Io { path: path.to_path_buf(), source: e })?;
            buf
        } else {
            raw
        };

        let expected = side_len * side_len * 2;
        if bytes.len() != expected {
            return Err(LoadError::Parse {
                path: path.to_path_buf(),
                reason: format!("expected {expected} bytes, got {}", bytes.len()),
            });
        }

        let mut samples = Vec::with_capacity(side_len * side_len);
        for chunk in bytes.chunks_exact(2) {
            samples.push(i16::from_be_bytes([chunk[0], chunk[1]]));
        }

        let origin = parse_hgt_filename_origin(path).ok_or_else(|| LoadError::Parse {
            path: path.to_path_buf(),
            reason: "could not parse N/S/E/W origin from filename".to_string(),
        })?;

        Ok(Dem {
            horiz_units: HorizUnits::LatLonArcSeconds,
            origin,
            spacing: 1.0 / (side_len as f64 - 1.0),
            rows: side_len,
            cols: side_len,
            utm_zone: None,
            utm_origin: None,
            samples,
        })
    }

    /// Raw sample at array position `(row, col)`, `row` counted
    /// south-to-north (0 = southernmost), matching `origin`'s corner.
    /// Returns `None` for out-of-range indices or a `NODATA` sample.
    pub fn sample(&self, row: usize, col: usize) -> Option<i16> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        // Stored north-to-south; flip to south-to-north for the caller.
        let disk_row = self.rows - 1 - row;
        let value = self.samples[disk_row * self.cols + col];
        (value != NODATA).then_some(value)
    }

    /// Fractional row/col for a geographic point, or `None` if it falls
    /// outside this tile's coverage. For a `Utm`-typed tile, the point is
    /// converted to UTM first; a zone mismatch against the tile's own
    /// zone is treated the same as falling outside coverage.
    pub fn point_to_grid(&self, p: &LatLon) -> Option<(f64, f64)> {
        let (row, col) = match self.horiz_units {
            HorizUnits::LatLonArcSeconds => {
                ((p.lat - self.origin.lat) / self.spacing, (p.lon - self.origin.lon) / self.spacing)
            }
            HorizUnits::Utm => {
                let zone = self.utm_zone?;
                let (east0, north0) = self.utm_origin?;
                let utm = p.to_utm();
                if utm.zone != zone {
                    return None;
                }
                ((utm.northing - north0) / self.spacing, (utm.easting - east0) / self.spacing)
            }
        };
        if row < 0.0 || col < 0.0 || row > (self.rows - 1) as f64 || col > (self.cols - 1) as f64 {
            None
        } else {
            Some((row, col))
        }
    }
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

fn gzip_uncompressed_len(bytes: &[u8]) -> Option<usize> {
    if !is_gzip(bytes) {
        return None;
    }
    let mut decoder = GzDecoder::new(bytes);
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf).ok()?;
    Some(buf.len())
}

/// SRTM filenames encode the southwest corner, e.g. `N37W123.hgt.gz`.
fn parse_hgt_filename_origin(path: &Path) -> Option<LatLon> {
    let stem = path.file_stem()?.to_str()?;
    let stem = stem.strip_suffix(".hgt").unwrap_or(stem);
    let (lat_part, rest) = stem.split_at(1);
    let lat_sign = match lat_part {
        "N" => 1.0,
        "S" => -1.0,
        _ => return None,
    };
    let lon_idx = rest.find(['E', 'W'])?;
    let (lat_digits, lon_with_dir) = rest.split_at(lon_idx);
    let (lon_part, lon_digits) = lon_with_dir.split_at(1);
    let lon_sign = match lon_part {
        "E" => 1.0,
        "W" => -1.0,
        _ => return None,
    };
    let lat: f64 = lat_digits.parse().ok()?;
    let lon: f64 = lon_digits.parse().ok()?;
    Some(LatLon::new(lat_sign * lat, lon_sign * lon))
}
