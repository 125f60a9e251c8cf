//! A single named point of interest, plus the name/date/proximity lookups
//! a container of waypoints supports.
//!
//! Field set and lookup operations grounded on
//! `examples/original_source/src/vikwaypoint.h`'s `VikWaypoint` struct and
//! the companion `vik_trw_layer_waypoint_find_*` helpers in the original
//! layer implementation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::aggregate::epoch_matches_date;
use crate::coord::{Coord, LatLonBBox};
use crate::uid::Uid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waypoint {
    pub uid: Uid,
    pub name: String,
    pub coord: Coord,
    pub comment: Option<String>,
    pub description: Option<String>,
    pub source: Option<String>,
    pub altitude: Option<f64>,
    pub timestamp: Option<i64>,
    pub visible: bool,
    pub url: Option<String>,
    /// Opaque path to an associated image; this crate never decodes or
    /// validates it (see `crate::thumbnail` for that).
    pub image_path: Option<String>,
    /// Cached thumbnail dimensions for display, filled in by
    /// `crate::thumbnail` once the image has been read; `None` until
    /// then or if `image_path` is `None`.
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    /// A user-assigned "symbol" name (e.g. an icon key); not interpreted
    /// here, only stored and round-tripped.
    pub symbol: Option<String>,
}

impl Waypoint {
    pub fn new(uid: Uid, name: impl Into<String>, coord: Coord) -> Self {
        Waypoint {
            uid,
            name: name.into(),
            coord,
            comment: None,
            description: None,
            source: None,
            altitude: None,
            timestamp: None,
            visible: true,
            url: None,
            image_path: None,
            image_width: None,
            image_height: None,
            symbol: None,
        }
    }
}

/// Name/date/proximity lookups over a flat collection of waypoints.
/// `Trw` stores waypoints in a `HashMap<Uid, Waypoint>`; this trait lets
/// the lookup logic be written and tested once against any ordered view
/// of that map's values.
pub trait WaypointStore {
    fn waypoints(&self) -> &[Waypoint];

    fn find_by_name(&self, name: &str) -> Option<&Waypoint> {
        self.waypoints().iter().find(|w| w.name == name)
    }

    /// Every waypoint whose timestamp falls on `date` (`"YYYY-MM-DD"`),
    /// regardless of time of day. Returns empty if `date` doesn't parse.
    fn find_by_date(&self, date: &str) -> Vec<&Waypoint> {
        let Ok(target) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
            return Vec::new();
        };
        self.waypoints().iter().filter(|w| w.timestamp.is_some_and(|ts| epoch_matches_date(ts, target))).collect()
    }

    /// The waypoint whose coordinate is nearest `coord`, by great-circle
    /// or planar distance depending on coordinate representation.
    fn search_closest(&self, coord: &Coord) -> Option<&Waypoint> {
        self.waypoints()
            .iter()
            .min_by(|a, b| a.coord.distance(coord).total_cmp(&b.coord.distance(coord)))
    }

    /// The union bounding box over every visible waypoint.
    fn visible_bbox(&self) -> LatLonBBox {
        let mut bbox = LatLonBBox::empty();
        for w in self.waypoints().iter().filter(|w| w.visible) {
            bbox.extend(&w.coord.as_latlon());
        }
        bbox
    }

    /// Zero-padded three-digit successor to the highest `{prefix}nnn`
    /// name in use (`"Waypoint003"` -> `"004"`), matching the auto-naming
    /// convention used for "Waypoint001", "Waypoint002", etc. Empty once
    /// `"999"` is taken and no further number is available.
    fn highest_wp_number_next(&self, prefix: &str) -> String {
        let next = self
            .waypoints()
            .iter()
            .filter_map(|w| w.name.strip_prefix(prefix))
            .filter_map(|suffix| suffix.parse::<u32>().ok())
            .max()
            .map_or(1, |n| n + 1);
        if next > 999 {
            String::new()
        } else {
            format!("{next:03}")
        }
    }

    /// If `base` is not already taken, return it unchanged; otherwise
    /// append `#2`, `#3`, ... until a free name is found.
    fn unique_name_suggestion(&self, base: &str) -> String {
        if self.find_by_name(base).is_none() {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}#{n}");
            if self.find_by_name(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::LatLon;

    struct FakeStore(Vec<Waypoint>);
    impl WaypointStore for FakeStore {
        fn waypoints(&self) -> &[Waypoint] {
            &self.0
        }
    }

    fn wp(uid: u64, name: &str) -> Waypoint {
        Waypoint::new(Uid::from_raw(uid), name, Coord::LatLon(LatLon::new(0.0, 0.0)))
    }

    #[test]
    fn unique_name_suggestion_skips_taken_names() {
        let store = FakeStore(vec![wp(1, "Home"), wp(2, "Home#2")]);
        assert_eq!(store.unique_name_suggestion("Home"), "Home#3");
        assert_eq!(store.unique_name_suggestion("Office"), "Office");
    }

    #[test]
    fn highest_wp_number_next_skips_gaps() {
        let store = FakeStore(vec![wp(1, "Waypoint001"), wp(2, "Waypoint003")]);
        assert_eq!(store.highest_wp_number_next("Waypoint"), "004");
    }

    #[test]
    fn highest_wp_number_next_is_empty_once_exhausted() {
        let store = FakeStore(vec![wp(1, "Waypoint999")]);
        assert_eq!(store.highest_wp_number_next("Waypoint"), "");
    }

    #[test]
    fn search_closest_finds_nearest() {
        let store = FakeStore(vec![
            Waypoint::new(Uid::from_raw(1), "far", Coord::LatLon(LatLon::new(10.0, 10.0))),
            Waypoint::new(Uid::from_raw(2), "near", Coord::LatLon(LatLon::new(0.01, 0.0))),
        ]);
        let closest = store.search_closest(&Coord::LatLon(LatLon::new(0.0, 0.0))).unwrap();
        assert_eq!(closest.name, "near");
    }

    #[test]
    fn find_by_date_returns_all_matches() {
        let mut a = wp(1, "a");
        a.timestamp = Some(NaiveDate::from_ymd_opt(2020, 6, 15).unwrap().and_hms_opt(8, 0, 0).unwrap().and_utc().timestamp());
        let mut b = wp(2, "b");
        b.timestamp = Some(NaiveDate::from_ymd_opt(2020, 6, 15).unwrap().and_hms_opt(20, 0, 0).unwrap().and_utc().timestamp());
        let mut c = wp(3, "c");
        c.timestamp = Some(NaiveDate::from_ymd_opt(2020, 6, 16).unwrap().and_hms_opt(8, 0, 0).unwrap().and_utc().timestamp());
        let store = FakeStore(vec![a, b, c]);
        assert_eq!(store.find_by_date("2020-06-15").len(), 2);
    }

    #[test]
    fn find_by_date_rejects_an_unparsable_date() {
        let store = FakeStore(vec![wp(1, "a")]);
        assert!(store.find_by_date("not-a-date").is_empty());
    }
}
