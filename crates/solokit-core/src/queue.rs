//! Read-only views over the collection: filtered listing, the next item to
//! work on, and what blocks a given item.

use crate::types::{WorkItemStatus, WorkItemType};
use crate::work_item::{WorkItem, WorkItems};
use std::cmp::Reverse;

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<WorkItemStatus>,
    pub item_type: Option<WorkItemType>,
    pub milestone: Option<String>,
    /// Only urgent items when true.
    pub urgent: bool,
}

impl ListFilter {
    fn matches(&self, item: &WorkItem) -> bool {
        self.status.map_or(true, |s| item.status == s)
            && self.item_type.map_or(true, |t| item.item_type == t)
            && self
                .milestone
                .as_deref()
                .map_or(true, |m| item.milestone.as_deref() == Some(m))
            && (!self.urgent || item.urgent)
    }
}

fn sort_for_queue(items: &mut [&WorkItem]) {
    items.sort_by_key(|i| (Reverse(i.urgent), Reverse(i.priority), i.id.clone()));
}

/// Items matching `filter`, urgent first, then by priority (highest first),
/// then by id.
pub fn list<'a>(items: &'a WorkItems, filter: &ListFilter) -> Vec<&'a WorkItem> {
    let mut out: Vec<&WorkItem> = items.values().filter(|i| filter.matches(i)).collect();
    sort_for_queue(&mut out);
    out
}

/// Dependencies of `item_id` that are not completed. Missing ids count as
/// unmet. Empty for an unknown item.
pub fn blocked_by(items: &WorkItems, item_id: &str) -> Vec<String> {
    let Some(item) = items.get(item_id) else {
        return Vec::new();
    };
    item.dependencies
        .iter()
        .filter(|dep| !items.get(dep.as_str()).is_some_and(WorkItem::is_completed))
        .cloned()
        .collect()
}

/// The first `not_started` item whose dependencies are all completed.
pub fn next_available(items: &WorkItems) -> Option<&WorkItem> {
    let mut ready: Vec<&WorkItem> = items
        .values()
        .filter(|i| i.status == WorkItemStatus::NotStarted)
        .filter(|i| blocked_by(items, &i.id).is_empty())
        .collect();
    sort_for_queue(&mut ready);
    ready.into_iter().next()
}
