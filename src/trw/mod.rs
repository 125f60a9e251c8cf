//! TRW container: owns a container's tracks, routes, and waypoints under
//! one identity, with visibility, sort-order preferences, and a
//! selection pointer.
//!
//! Grounded on `examples/original_source/src/viktrack.h`'s surrounding
//! layer conventions (a `VikTrwLayer` owning `GHashTable`s of tracks,
//! routes, and waypoints keyed by name), replacing its cyclic
//! parent/child graphs with a uid-keyed arena-of-items instead.

pub mod sort;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::coord::{CoordMode, LatLonBBox};
use crate::track::Track;
use crate::uid::{Uid, UidAllocator};
use crate::waypoint::Waypoint;

pub use sort::SortOrder;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub author: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub timestamp: Option<i64>,
}

/// Which kind of item a `Selection` or `move_item` reference points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Track,
    Route,
    Waypoint,
    /// A whole container's tracks, selected as one group (e.g. "select
    /// all tracks in this TRW") rather than any single track.
    GroupOfTracks,
    /// Same, for waypoints.
    GroupOfWaypoints,
}

/// A reference to one item owned by a specific `Trw`. Weak in the sense
/// that it carries no borrow — resolving it is a map lookup that may
/// come back empty if the item was since deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub kind: ItemKind,
    pub uid: Uid,
}

/// One container's selection pointer. `None` means nothing selected.
/// Holding a `Trackpoint` selection additionally records which point
/// within the track's point list, by index, since points have no uid of
/// their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub item: Option<ItemRef>,
    pub trackpoint_index: Option<usize>,
}

impl Selection {
    /// Clears the selection, returning whether it actually held
    /// anything (so the caller knows whether a redraw is needed).
    pub fn clear_highlight(&mut self) -> bool {
        let changed = self.item.is_some() || self.trackpoint_index.is_some();
        *self = Selection::default();
        changed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trw {
    uid: Uid,
    #[serde(skip, default = "UidAllocator::new")]
    allocator: UidAllocator,
    pub name: String,
    pub coord_mode: CoordMode,
    pub metadata: Metadata,
    tracks: HashMap<Uid, Track>,
    routes: HashMap<Uid, Track>,
    waypoints: HashMap<Uid, Waypoint>,
    pub tracks_visible: bool,
    pub routes_visible: bool,
    pub waypoints_visible: bool,
    pub sort_order: SortOrder,
    pub waypoints_bbox: LatLonBBox,
    pub selection: Selection,
    /// The highest number seen in a 3-digit auto-named waypoint
    /// (`"042"` -> 42), for fast `highest_wp_number_next`.
    highest_wp_number: u32,
    loading: bool,
}

impl Trw {
    pub fn new(uid: Uid, name: impl Into<String>, coord_mode: CoordMode) -> Self {
        Trw {
            uid,
            allocator: UidAllocator::new(),
            name: name.into(),
            coord_mode,
            metadata: Metadata::default(),
            tracks: HashMap::new(),
            routes: HashMap::new(),
            waypoints: HashMap::new(),
            tracks_visible: true,
            routes_visible: true,
            waypoints_visible: true,
            sort_order: SortOrder::None,
            waypoints_bbox: LatLonBBox::empty(),
            selection: Selection::default(),
            highest_wp_number: 0,
            loading: false,
        }
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    // --- Construction API (§6): a loader stages raw items, then calls
    // `end_load` once to pay for bbox/sort recomputation a single time
    // instead of incrementally per insert. ---

    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    pub fn add_track_raw(&mut self, mut track: Track) -> Uid {
        let id = self.allocator.next();
        track.uid = id;
        track.is_route = false;
        track.recalculate_bbox();
        self.tracks.insert(id, track);
        id
    }

    pub fn add_route_raw(&mut self, mut route: Track) -> Uid {
        let id = self.allocator.next();
        route.uid = id;
        route.is_route = true;
        route.recalculate_bbox();
        self.routes.insert(id, route);
        id
    }

    pub fn add_waypoint_raw(&mut self, mut wp: Waypoint) -> Uid {
        let id = self.allocator.next();
        wp.uid = id;
        self.waypoints.insert(id, wp);
        id
    }

    /// Recomputes every cached bbox and applies the configured sort
    /// order exactly once. Must be called after a `begin_load` batch.
    pub fn end_load(&mut self) {
        self.loading = false;
        self.recalculate_waypoints_bbox();
        self.refresh_highest_wp_number();
    }

    // --- Normal single-item mutation API; each call maintains its own
    // caches immediately rather than deferring to `end_load`. ---

    pub fn add_track(&mut self, track: Track) -> Uid {
        self.add_track_raw(track)
    }

    pub fn add_route(&mut self, route: Track) -> Uid {
        self.add_route_raw(route)
    }

    pub fn add_waypoint(&mut self, mut wp: Waypoint) -> Uid {
        if let Some(n) = auto_name_number(&wp.name) {
            self.highest_wp_number = self.highest_wp_number.max(n);
        }
        let id = self.allocator.next();
        wp.uid = id;
        self.waypoints_bbox.extend(&wp.coord.as_latlon());
        self.waypoints.insert(id, wp);
        id
    }

    pub fn get_track(&self, uid: Uid) -> Option<&Track> {
        self.tracks.get(&uid)
    }

    pub fn get_track_mut(&mut self, uid: Uid) -> Option<&mut Track> {
        self.tracks.get_mut(&uid)
    }

    pub fn get_route(&self, uid: Uid) -> Option<&Track> {
        self.routes.get(&uid)
    }

    pub fn get_waypoint(&self, uid: Uid) -> Option<&Waypoint> {
        self.waypoints.get(&uid)
    }

    pub fn get_track_by_name(&self, name: &str) -> Option<&Track> {
        self.tracks.values().find(|t| t.name.as_deref() == Some(name))
    }

    pub fn delete_track(&mut self, uid: Uid) -> Option<Track> {
        let removed = self.tracks.remove(&uid);
        if removed.is_some() {
            self.clear_selection_if(ItemKind::Track, uid);
        }
        removed
    }

    pub fn delete_route(&mut self, uid: Uid) -> Option<Track> {
        let removed = self.routes.remove(&uid);
        if removed.is_some() {
            self.clear_selection_if(ItemKind::Route, uid);
        }
        removed
    }

    pub fn delete_waypoint(&mut self, uid: Uid) -> Option<Waypoint> {
        let removed = self.waypoints.remove(&uid);
        if removed.is_some() {
            self.recalculate_waypoints_bbox();
            self.clear_selection_if(ItemKind::Waypoint, uid);
        }
        removed
    }

    fn clear_selection_if(&mut self, kind: ItemKind, uid: Uid) {
        if self.selection.item == Some(ItemRef { kind, uid }) {
            self.selection.clear_highlight();
        }
    }

    pub fn recalculate_waypoints_bbox(&mut self) {
        let latlons: Vec<_> = self.waypoints.values().map(|w| w.coord.as_latlon()).collect();
        self.waypoints_bbox = LatLonBBox::from_points(latlons.iter());
    }

    fn refresh_highest_wp_number(&mut self) {
        self.highest_wp_number = self.waypoints.values().filter_map(|w| auto_name_number(&w.name)).max().unwrap_or(0);
    }

    /// The earliest of: any track point timestamp, any waypoint
    /// timestamp, or the container's metadata timestamp.
    pub fn timestamp(&self) -> Option<i64> {
        let track_min = self
            .tracks
            .values()
            .chain(self.routes.values())
            .flat_map(|t| t.points.iter())
            .filter_map(|tp| tp.timestamp)
            .min();
        let wp_min = self.waypoints.values().filter_map(|w| w.timestamp).min();
        [track_min, wp_min, self.metadata.timestamp].into_iter().flatten().min()
    }

    /// Convert every contained coordinate to `mode` in place, and apply
    /// it to items added afterward.
    pub fn set_coord_mode(&mut self, mode: CoordMode) {
        self.coord_mode = mode;
        for track in self.tracks.values_mut().chain(self.routes.values_mut()) {
            for tp in track.points.iter_mut() {
                tp.coord = tp.coord.to_mode(mode);
            }
            track.recalculate_bbox();
        }
        for wp in self.waypoints.values_mut() {
            wp.coord = wp.coord.to_mode(mode);
        }
        self.recalculate_waypoints_bbox();
    }

    /// Move the item `item_ref` points at to `dest`, rebinding the
    /// selection to its new home if it was selected here. Returns the
    /// item's (possibly unchanged) uid in `dest`, or `None` if it wasn't
    /// found in `self`. Tracks and routes move as-is since they're keyed
    /// by uid, not name, in each container; waypoints go through
    /// `move_waypoint`'s name-collision handling.
    pub fn move_item(&mut self, item_ref: ItemRef, dest: &mut Trw) -> Option<Uid> {
        match item_ref.kind {
            ItemKind::Waypoint => self.move_waypoint(item_ref.uid, dest),
            ItemKind::Track => {
                let was_selected = self.selection.item == Some(item_ref);
                let track = self.tracks.remove(&item_ref.uid)?;
                self.clear_selection_if(ItemKind::Track, item_ref.uid);
                let new_id = dest.add_track(track);
                if was_selected {
                    dest.selection.item = Some(ItemRef { kind: ItemKind::Track, uid: new_id });
                    dest.selection.trackpoint_index = self.selection.trackpoint_index;
                }
                Some(new_id)
            }
            ItemKind::Route => {
                let was_selected = self.selection.item == Some(item_ref);
                let route = self.routes.remove(&item_ref.uid)?;
                self.clear_selection_if(ItemKind::Route, item_ref.uid);
                let new_id = dest.add_route(route);
                if was_selected {
                    dest.selection.item = Some(ItemRef { kind: ItemKind::Route, uid: new_id });
                    dest.selection.trackpoint_index = self.selection.trackpoint_index;
                }
                Some(new_id)
            }
            ItemKind::GroupOfTracks | ItemKind::GroupOfWaypoints => None,
        }
    }

    /// Move a single waypoint to `dest`, generating a fresh unique name
    /// in the destination if its current name collides there, and
    /// rebinding the selection onto it in `dest` if it was selected here.
    pub fn move_waypoint(&mut self, uid: Uid, dest: &mut Trw) -> Option<Uid> {
        let was_selected = self.selection.item == Some(ItemRef { kind: ItemKind::Waypoint, uid });
        let mut wp = self.waypoints.remove(&uid)?;
        self.recalculate_waypoints_bbox();
        self.clear_selection_if(ItemKind::Waypoint, uid);
        if dest.find_by_name(&wp.name).is_some() {
            wp.name = dest.unique_name_suggestion(&wp.name);
        }
        let new_id = dest.add_waypoint(wp);
        if was_selected {
            dest.selection.item = Some(ItemRef { kind: ItemKind::Waypoint, uid: new_id });
        }
        Some(new_id)
    }

    /// Rewrite colliding waypoint names into unique ones, iterating in
    /// `order` so items earlier in that order keep their original name.
    pub fn uniquify(&mut self, order: SortOrder) {
        let mut ids: Vec<Uid> = self.waypoints.keys().copied().collect();
        ids.sort_by(|a, b| {
            let (wa, wb) = (&self.waypoints[a], &self.waypoints[b]);
            sort::compare_names(&wa.name, &wb.name, order).then_with(|| sort::compare_dates(wa.timestamp, wb.timestamp, order))
        });
        let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();
        for id in ids {
            let name = self.waypoints[&id].name.clone();
            if seen.contains(&name) {
                let fresh = self.unique_name_suggestion(&name);
                self.waypoints.get_mut(&id).unwrap().name = fresh.clone();
                seen.insert(fresh);
            } else {
                seen.insert(name);
            }
        }
    }

    /// Tracks in the container's configured sort order.
    pub fn iter_tracks(&self) -> Vec<&Track> {
        let mut v: Vec<&Track> = self.tracks.values().collect();
        v.sort_by(|a, b| {
            sort::compare_names(a.name.as_deref().unwrap_or(""), b.name.as_deref().unwrap_or(""), self.sort_order)
        });
        v
    }

    pub fn iter_waypoints(&self) -> Vec<&Waypoint> {
        let mut v: Vec<&Waypoint> = self.waypoints.values().collect();
        v.sort_by(|a, b| sort::compare_names(&a.name, &b.name, self.sort_order));
        v
    }
}

// `WaypointStore` (crate::waypoint) models a flat `&[Waypoint]`-backed
// collection; `Trw` keys waypoints by `Uid` in a `HashMap` instead, so
// it implements the same lookups directly against the map rather than
// through that trait.
impl Trw {
    pub fn find_by_name(&self, name: &str) -> Option<&Waypoint> {
        self.waypoints.values().find(|w| w.name == name)
    }

    /// Every waypoint whose timestamp falls on `date` (`"YYYY-MM-DD"`),
    /// regardless of time of day. Returns empty if `date` doesn't parse.
    pub fn find_by_date(&self, date: &str) -> Vec<&Waypoint> {
        let Ok(target) = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
            return Vec::new();
        };
        self.waypoints.values().filter(|w| w.timestamp.is_some_and(|ts| crate::aggregate::epoch_matches_date(ts, target))).collect()
    }

    /// Rename the waypoint `uid` to `new_name`. Collisions with an
    /// existing name are allowed; the caller is responsible for
    /// confirming one was intended. Returns `false` if `uid` isn't held
    /// here.
    pub fn rename(&mut self, uid: Uid, new_name: impl Into<String>) -> bool {
        let Some(wp) = self.waypoints.get_mut(&uid) else {
            return false;
        };
        wp.name = new_name.into();
        self.refresh_highest_wp_number();
        true
    }

    pub fn search_closest(&self, coord: &crate::coord::Coord) -> Option<&Waypoint> {
        self.waypoints.values().min_by(|a, b| a.coord.distance(coord).total_cmp(&b.coord.distance(coord)))
    }

    /// Zero-padded three-digit successor to the highest auto-named
    /// waypoint number in use. Empty once `"999"` is taken and no
    /// further number is available.
    pub fn highest_wp_number_next(&self) -> String {
        let next = self.highest_wp_number + 1;
        if next > 999 {
            String::new()
        } else {
            format!("{next:03}")
        }
    }

    pub fn unique_name_suggestion(&self, base: &str) -> String {
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

/// Parses a 3-digit auto-name suffix like the trailing `"042"` in
/// `"Waypoint042"`.
fn auto_name_number(name: &str) -> Option<u32> {
    if name.len() < 3 {
        return None;
    }
    let tail = &name[name.len() - 3..];
    tail.parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{Coord, LatLon};

    fn wp(name: &str, lat: f64, lon: f64) -> Waypoint {
        Waypoint::new(Uid::from_raw(0), name, Coord::LatLon(LatLon::new(lat, lon)))
    }

    #[test]
    fn add_waypoint_extends_bbox_incrementally() {
        let mut trw = Trw::new(Uid::from_raw(1), "test", CoordMode::LatLon);
        trw.add_waypoint(wp("a", 1.0, 1.0));
        trw.add_waypoint(wp("b", -1.0, 2.0));
        assert_eq!(trw.waypoints_bbox.north, 1.0);
        assert_eq!(trw.waypoints_bbox.south, -1.0);
        assert_eq!(trw.waypoints_bbox.east, 2.0);
    }

    #[test]
    fn add_then_remove_waypoint_restores_bbox() {
        let mut trw = Trw::new(Uid::from_raw(1), "test", CoordMode::LatLon);
        trw.add_waypoint(wp("a", 1.0, 1.0));
        let before = trw.waypoints_bbox;
        let id = trw.add_waypoint(wp("b", 5.0, 5.0));
        trw.delete_waypoint(id);
        assert_eq!(trw.waypoints_bbox, before);
    }

    #[test]
    fn deleting_selected_item_clears_selection() {
        let mut trw = Trw::new(Uid::from_raw(1), "test", CoordMode::LatLon);
        let id = trw.add_waypoint(wp("a", 0.0, 0.0));
        trw.selection.item = Some(ItemRef { kind: ItemKind::Waypoint, uid: id });
        trw.delete_waypoint(id);
        assert_eq!(trw.selection.item, None);
    }

    #[test]
    fn move_waypoint_renames_on_collision() {
        let mut src = Trw::new(Uid::from_raw(1), "src", CoordMode::LatLon);
        let mut dst = Trw::new(Uid::from_raw(2), "dst", CoordMode::LatLon);
        dst.add_waypoint(wp("Home", 0.0, 0.0));
        let id = src.add_waypoint(wp("Home", 1.0, 1.0));
        let new_id = src.move_waypoint(id, &mut dst).unwrap();
        assert_eq!(dst.get_waypoint(new_id).unwrap().name, "Home#2");
    }

    #[test]
    fn move_item_rebinds_selection_in_the_destination() {
        use crate::track::Track;

        let mut src = Trw::new(Uid::from_raw(1), "src", CoordMode::LatLon);
        let mut dst = Trw::new(Uid::from_raw(2), "dst", CoordMode::LatLon);
        let id = src.add_track(Track::new(Uid::from_raw(0), false));
        src.selection.item = Some(ItemRef { kind: ItemKind::Track, uid: id });

        let new_id = src.move_item(ItemRef { kind: ItemKind::Track, uid: id }, &mut dst).unwrap();

        assert_eq!(src.selection.item, None);
        assert_eq!(dst.selection.item, Some(ItemRef { kind: ItemKind::Track, uid: new_id }));
        assert!(dst.get_track(new_id).is_some());
    }

    #[test]
    fn timestamp_is_earliest_across_sources() {
        let mut trw = Trw::new(Uid::from_raw(1), "test", CoordMode::LatLon);
        trw.metadata.timestamp = Some(500);
        let mut w = wp("a", 0.0, 0.0);
        w.timestamp = Some(100);
        trw.add_waypoint(w);
        assert_eq!(trw.timestamp(), Some(100));
    }

    #[test]
    fn find_by_date_matches_regardless_of_time_of_day() {
        use chrono::NaiveDate;

        let mut trw = Trw::new(Uid::from_raw(1), "test", CoordMode::LatLon);
        let mut a = wp("a", 0.0, 0.0);
        a.timestamp = Some(NaiveDate::from_ymd_opt(2020, 6, 15).unwrap().and_hms_opt(1, 0, 0).unwrap().and_utc().timestamp());
        let mut b = wp("b", 0.0, 0.0);
        b.timestamp = Some(NaiveDate::from_ymd_opt(2020, 6, 15).unwrap().and_hms_opt(23, 0, 0).unwrap().and_utc().timestamp());
        let mut c = wp("c", 0.0, 0.0);
        c.timestamp = Some(NaiveDate::from_ymd_opt(2020, 6, 16).unwrap().and_hms_opt(1, 0, 0).unwrap().and_utc().timestamp());
        trw.add_waypoint(a);
        trw.add_waypoint(b);
        trw.add_waypoint(c);
        assert_eq!(trw.find_by_date("2020-06-15").len(), 2);
        assert!(trw.find_by_date("not-a-date").is_empty());
    }

    #[test]
    fn rename_allows_collisions_and_refreshes_highest_wp_number() {
        let mut trw = Trw::new(Uid::from_raw(1), "test", CoordMode::LatLon);
        trw.add_waypoint(wp("Waypoint005", 0.0, 0.0));
        let id = trw.add_waypoint(wp("other", 1.0, 1.0));
        assert!(trw.rename(id, "Waypoint005"));
        assert_eq!(trw.get_waypoint(id).unwrap().name, "Waypoint005");
        assert!(trw.find_by_name("Waypoint005").is_some());
        assert!(!trw.rename(Uid::from_raw(999), "nope"));
    }

    #[test]
    fn highest_wp_number_next_is_zero_padded_and_exhausts_at_999() {
        let mut trw = Trw::new(Uid::from_raw(1), "test", CoordMode::LatLon);
        assert_eq!(trw.highest_wp_number_next(), "001");
        trw.add_waypoint(wp("Waypoint005", 0.0, 0.0));
        assert_eq!(trw.highest_wp_number_next(), "006");
        trw.add_waypoint(wp("Waypoint999", 0.0, 0.0));
        assert_eq!(trw.highest_wp_number_next(), "");
    }
}
