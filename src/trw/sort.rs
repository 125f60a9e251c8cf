//! Sort orders applied to a container's export iterators, grounded on
//! `examples/original_source/src/vikwaypoint.h`'s neighboring
//! `VIK_LAYER_SORT_*` constants (name/date, ascending/descending).

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    NameAscending,
    NameDescending,
    DateAscending,
    DateDescending,
    /// Not resorted; reflects insertion order.
    None,
}

pub fn compare_names(a: &str, b: &str, order: SortOrder) -> Ordering {
    match order {
        SortOrder::NameAscending => a.cmp(b),
        SortOrder::NameDescending => b.cmp(a),
        _ => Ordering::Equal,
    }
}

pub fn compare_dates(a: Option<i64>, b: Option<i64>, order: SortOrder) -> Ordering {
    match order {
        SortOrder::DateAscending => a.cmp(&b),
        SortOrder::DateDescending => b.cmp(&a),
        _ => Ordering::Equal,
    }
}
