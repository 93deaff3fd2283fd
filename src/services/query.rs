//! Catalog search and sort.
//!
//! DESIGN
//! ======
//! Pure, synchronous helpers re-applied on every list request from the
//! caller's current search text and sort key. All sorts use `sort_by`, which
//! is stable: records that compare equal keep their input order.

use crate::state::Creator;

/// Sort keys accepted by the list endpoint. Wire names mirror the dashboard
/// controls ("A-Z", "Z-A", "New", "Price").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    NameAsc,
    NameDesc,
    RecentlyAdded,
    RecentlyUpdated,
    PriceHigh,
    PriceLow,
}

impl SortKey {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "nameAsc" => Some(Self::NameAsc),
            "nameDesc" => Some(Self::NameDesc),
            "recentlyAdded" => Some(Self::RecentlyAdded),
            "recentlyUpdated" => Some(Self::RecentlyUpdated),
            "priceHigh" => Some(Self::PriceHigh),
            "priceLow" => Some(Self::PriceLow),
            _ => None,
        }
    }
}

/// Case-insensitive substring match against name, designation, or any
/// specialty tag.
#[must_use]
pub fn matches_search(creator: &Creator, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    if needle.is_empty() {
        return true;
    }
    creator.name.to_lowercase().contains(&needle)
        || creator.designation.to_lowercase().contains(&needle)
        || creator
            .specialties
            .iter()
            .any(|s| s.to_lowercase().contains(&needle))
}

/// Sort in place. Stable: ties keep their current order.
pub fn sort_creators(creators: &mut [Creator], key: SortKey) {
    match key {
        SortKey::NameAsc => creators.sort_by(|a, b| name_key(a).cmp(&name_key(b))),
        SortKey::NameDesc => creators.sort_by(|a, b| name_key(b).cmp(&name_key(a))),
        SortKey::RecentlyAdded => creators.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::RecentlyUpdated => creators.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        SortKey::PriceHigh => creators.sort_by(|a, b| b.price.total_cmp(&a.price)),
        SortKey::PriceLow => creators.sort_by(|a, b| a.price.total_cmp(&b.price)),
    }
}

fn name_key(creator: &Creator) -> (String, String) {
    (creator.name.to_lowercase(), creator.name.clone())
}

/// Filter by search text, then sort. `sort` defaults to newest-first, which
/// matches the catalog's unsorted dashboard view.
#[must_use]
pub fn apply(creators: Vec<Creator>, search: Option<&str>, sort: Option<SortKey>) -> Vec<Creator> {
    let mut out: Vec<Creator> = match search {
        Some(needle) => creators
            .into_iter()
            .filter(|c| matches_search(c, needle))
            .collect(),
        None => creators,
    };
    sort_creators(&mut out, sort.unwrap_or(SortKey::RecentlyAdded));
    out
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
