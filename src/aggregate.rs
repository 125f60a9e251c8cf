//! Aggregate container: a tree node that groups child containers
//! (`Trw`s or nested `Aggregate`s) for display and for cross-container
//! queries like "find whatever was recorded on this date".
//!
//! Grounded on `examples/original_source/src/vikaggregatelayer.h`'s
//! `VikAggregateLayer` (a `GList` of child `VikLayer*`, each tagged with
//! a `VikLayerTypeEnum`), replacing that inherited/virtual-dispatch layer
//! hierarchy with a tagged variant of layer kinds: `AggregateChild` is
//! that tagged variant instead of a trait object, so every child's kind
//! is known at match time with no downcasting.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::coord::LatLonBBox;
use crate::trw::{ItemKind, ItemRef, Selection, Trw};
use crate::uid::{Uid, UidAllocator};

/// Which kind of child occupies a given tree slot, for
/// `all_layers_of_type` filtering without descending into every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Trw,
    Aggregate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AggregateChild {
    Trw(Trw),
    Aggregate(Aggregate),
}

impl AggregateChild {
    pub fn kind(&self) -> LayerKind {
        match self {
            AggregateChild::Trw(_) => LayerKind::Trw,
            AggregateChild::Aggregate(_) => LayerKind::Aggregate,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            AggregateChild::Trw(t) => &t.name,
            AggregateChild::Aggregate(a) => &a.name,
        }
    }

    fn visible(&self) -> bool {
        match self {
            AggregateChild::Trw(t) => t.tracks_visible || t.routes_visible || t.waypoints_visible,
            AggregateChild::Aggregate(a) => a.visible,
        }
    }

    fn timestamp(&self) -> Option<i64> {
        match self {
            AggregateChild::Trw(t) => t.timestamp(),
            AggregateChild::Aggregate(a) => a.timestamp(),
        }
    }

    fn bbox(&self) -> LatLonBBox {
        match self {
            AggregateChild::Trw(t) => t.waypoints_bbox,
            AggregateChild::Aggregate(a) => a.bbox(),
        }
    }
}

/// A tree node owning an ordered list of children. Depth is unbounded:
/// an `Aggregate` may contain other `Aggregate`s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregate {
    uid: Uid,
    #[serde(skip, default = "UidAllocator::new")]
    allocator: UidAllocator,
    pub name: String,
    pub visible: bool,
    children: Vec<AggregateChild>,
}

impl Aggregate {
    pub fn new(uid: Uid, name: impl Into<String>) -> Self {
        Aggregate {
            uid,
            allocator: UidAllocator::new(),
            name: name.into(),
            visible: true,
            children: Vec::new(),
        }
    }

    pub fn uid(&self) -> Uid {
        self.uid
    }

    /// Append `child` as the last entry in this node's child list.
    pub fn add_child(&mut self, child: AggregateChild) {
        self.children.push(child);
    }

    /// Remove and return the child at `index`, if any.
    pub fn remove_child(&mut self, index: usize) -> Option<AggregateChild> {
        if index < self.children.len() {
            Some(self.children.remove(index))
        } else {
            None
        }
    }

    /// Swap a child with its predecessor (`up`) or successor (`down`) in
    /// the display order. No-op at either end of the list.
    pub fn move_child_up(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.children.len() {
            return false;
        }
        self.children.swap(index - 1, index);
        true
    }

    pub fn move_child_down(&mut self, index: usize) -> bool {
        if index + 1 >= self.children.len() {
            return false;
        }
        self.children.swap(index, index + 1);
        true
    }

    pub fn children(&self) -> &[AggregateChild] {
        &self.children
    }

    /// Allocate a uid from this node's own allocator, for callers
    /// constructing a fresh nested `Aggregate` or `Trw` to add as a
    /// child.
    pub fn next_uid(&self) -> Uid {
        self.allocator.next()
    }

    /// Every node in this subtree, in depth-first pre-order, paired with
    /// its depth (this node is depth 0).
    pub fn iter_tree(&self) -> Vec<(usize, &AggregateChild)> {
        let mut out = Vec::new();
        for child in &self.children {
            out.push((0, child));
            if let AggregateChild::Aggregate(a) = child {
                out.extend(a.iter_tree().into_iter().map(|(d, c)| (d + 1, c)));
            }
        }
        out
    }

    /// Every layer in this subtree of kind `kind`, depth-first. When
    /// `include_invisible` is false, a layer hidden via its own
    /// visibility flag (and everything inside an invisible `Aggregate`)
    /// is skipped.
    pub fn all_layers_of_type(&self, kind: LayerKind, include_invisible: bool) -> Vec<&AggregateChild> {
        let mut out = Vec::new();
        for child in &self.children {
            if !include_invisible && !child.visible() {
                continue;
            }
            if child.kind() == kind {
                out.push(child);
            }
            if let AggregateChild::Aggregate(a) = child {
                out.extend(a.all_layers_of_type(kind, include_invisible));
            }
        }
        out
    }

    /// The earliest timestamp anywhere in this subtree: the minimum
    /// across every child `Trw`'s own `timestamp()` and every nested
    /// `Aggregate`'s, recursively.
    pub fn timestamp(&self) -> Option<i64> {
        self.children.iter().filter_map(|c| c.timestamp()).min()
    }

    /// The union bounding box of every child's bbox in this subtree.
    pub fn bbox(&self) -> LatLonBBox {
        let mut acc = LatLonBBox::empty();
        for child in &self.children {
            acc.extend_bbox(&child.bbox());
        }
        acc
    }

    /// Find the first track, route, or waypoint anywhere in this subtree
    /// whose timestamp falls on the UTC calendar day `date` (format
    /// `"YYYY-MM-DD"`), returning a `Selection` that points at it. `None`
    /// if the date string doesn't parse or nothing matches.
    pub fn find_by_date(&self, date: &str) -> Option<Selection> {
        let target = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        self.find_by_date_parsed(target)
    }

    fn find_by_date_parsed(&self, target: NaiveDate) -> Option<Selection> {
        for child in &self.children {
            match child {
                AggregateChild::Trw(trw) => {
                    if let Some(sel) = find_in_trw(trw, target) {
                        return Some(sel);
                    }
                }
                AggregateChild::Aggregate(a) => {
                    if let Some(sel) = a.find_by_date_parsed(target) {
                        return Some(sel);
                    }
                }
            }
        }
        None
    }
}

pub(crate) fn epoch_matches_date(epoch_secs: i64, target: NaiveDate) -> bool {
    DateTime::<Utc>::from_timestamp(epoch_secs, 0).map(|dt| dt.date_naive() == target).unwrap_or(false)
}

fn find_in_trw(trw: &Trw, target: NaiveDate) -> Option<Selection> {
    for wp in trw.iter_waypoints() {
        if wp.timestamp.map_or(false, |ts| epoch_matches_date(ts, target)) {
            return Some(Selection {
                item: Some(ItemRef { kind: ItemKind::Waypoint, uid: wp.uid }),
                trackpoint_index: None,
            });
        }
    }
    for track in trw.iter_tracks() {
        if let Some((index, _)) = track.points.iter().enumerate().find(|(_, tp)| tp.timestamp.map_or(false, |ts| epoch_matches_date(ts, target))) {
            return Some(Selection {
                item: Some(ItemRef { kind: ItemKind::Track, uid: track.uid }),
                trackpoint_index: Some(index),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::{Coord, CoordMode, LatLon};
    use crate::waypoint::Waypoint;

    fn leaf(name: &str) -> Trw {
        Trw::new(Uid::from_raw(1), name, CoordMode::LatLon)
    }

    #[test]
    fn move_child_up_and_down_are_no_ops_at_the_edges() {
        let mut root = Aggregate::new(Uid::from_raw(1), "root");
        root.add_child(AggregateChild::Trw(leaf("a")));
        root.add_child(AggregateChild::Trw(leaf("b")));
        assert!(!root.move_child_up(0));
        assert!(!root.move_child_down(1));
        assert!(root.move_child_up(1));
        assert_eq!(root.children()[0].name(), "b");
    }

    #[test]
    fn iter_tree_visits_nested_aggregates_depth_first() {
        let mut inner = Aggregate::new(Uid::from_raw(2), "inner");
        inner.add_child(AggregateChild::Trw(leaf("deep")));
        let mut root = Aggregate::new(Uid::from_raw(1), "root");
        root.add_child(AggregateChild::Trw(leaf("shallow")));
        root.add_child(AggregateChild::Aggregate(inner));
        let visited = root.iter_tree();
        assert_eq!(visited.len(), 3);
        assert_eq!(visited[0].0, 0);
        assert_eq!(visited[2].0, 1);
    }

    #[test]
    fn all_layers_of_type_skips_invisible_unless_asked() {
        let mut hidden = leaf("hidden");
        hidden.tracks_visible = false;
        hidden.routes_visible = false;
        hidden.waypoints_visible = false;
        let mut root = Aggregate::new(Uid::from_raw(1), "root");
        root.add_child(AggregateChild::Trw(leaf("visible")));
        root.add_child(AggregateChild::Trw(hidden));
        assert_eq!(root.all_layers_of_type(LayerKind::Trw, false).len(), 1);
        assert_eq!(root.all_layers_of_type(LayerKind::Trw, true).len(), 2);
    }

    #[test]
    fn find_by_date_locates_a_waypoint_on_that_day() {
        let mut trw = leaf("container");
        let mut wp = Waypoint::new(Uid::from_raw(0), "home", Coord::LatLon(LatLon::new(1.0, 1.0)));
        wp.timestamp = Some(NaiveDate::from_ymd_opt(2020, 6, 15).unwrap().and_hms_opt(12, 0, 0).unwrap().and_utc().timestamp());
        let wp_id = trw.add_waypoint(wp);
        let mut root = Aggregate::new(Uid::from_raw(1), "root");
        root.add_child(AggregateChild::Trw(trw));

        let sel = root.find_by_date("2020-06-15").unwrap();
        assert_eq!(sel.item, Some(ItemRef { kind: ItemKind::Waypoint, uid: wp_id }));
        assert!(root.find_by_date("2020-06-16").is_none());
    }

    #[test]
    fn bbox_unions_across_children() {
        let mut a = leaf("a");
        a.add_waypoint(Waypoint::new(Uid::from_raw(0), "nw", Coord::LatLon(LatLon::new(10.0, -10.0))));
        let mut b = leaf("b");
        b.add_waypoint(Waypoint::new(Uid::from_raw(0), "se", Coord::LatLon(LatLon::new(-10.0, 10.0))));
        let mut root = Aggregate::new(Uid::from_raw(1), "root");
        root.add_child(AggregateChild::Trw(a));
        root.add_child(AggregateChild::Trw(b));
        let bbox = root.bbox();
        assert_eq!(bbox.north, 10.0);
        assert_eq!(bbox.south, -10.0);
    }
}
