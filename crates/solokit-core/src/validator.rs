//! Side-effect free invariant checks over a work item collection.
//!
//! The dependency graph has edges `item -> dependency`. Checks take the
//! collection by reference plus the proposed change and never mutate.

use crate::work_item::WorkItems;
use std::collections::HashSet;

/// Check that `proposed_deps` can be attached to `item_id`.
///
/// Every id must exist, an item may not depend on itself, and the union of the
/// item's current and proposed dependencies must not close a cycle.
pub fn validate_dependencies(
    items: &WorkItems,
    item_id: &str,
    proposed_deps: &[String],
) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    for dep in proposed_deps {
        if dep == item_id {
            errors.push(format!("'{item_id}' cannot depend on itself"));
        } else if !items.contains_key(dep) {
            errors.push(format!("dependency '{dep}' does not exist"));
        }
    }

    if errors.is_empty() {
        if let Some(cycle) = find_cycle(items, item_id, proposed_deps) {
            errors.push(format!("circular dependency: {}", cycle.join(" -> ")));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Depth-first search from `item_id` through its existing and proposed
/// dependencies. Returns the cycle path with the first id repeated at the end.
pub fn find_cycle(
    items: &WorkItems,
    item_id: &str,
    proposed_deps: &[String],
) -> Option<Vec<String>> {
    let mut walk = CycleWalk {
        items,
        root: item_id,
        proposed: proposed_deps,
        stack: Vec::new(),
        on_stack: HashSet::new(),
        finished: HashSet::new(),
    };
    walk.visit(item_id)
}

struct CycleWalk<'a> {
    items: &'a WorkItems,
    root: &'a str,
    proposed: &'a [String],
    stack: Vec<&'a str>,
    on_stack: HashSet<&'a str>,
    finished: HashSet<&'a str>,
}

impl<'a> CycleWalk<'a> {
    fn dependencies_of(&self, id: &'a str) -> Vec<&'a str> {
        let mut deps: Vec<&'a str> = self
            .items
            .get(id)
            .map(|item| item.dependencies.iter().map(String::as_str).collect())
            .unwrap_or_default();
        if id == self.root {
            for dep in self.proposed {
                if !deps.contains(&dep.as_str()) {
                    deps.push(dep.as_str());
                }
            }
        }
        deps
    }

    fn visit(&mut self, id: &'a str) -> Option<Vec<String>> {
        if self.on_stack.contains(id) {
            let start = self.stack.iter().position(|s| *s == id).unwrap_or(0);
            let mut cycle: Vec<String> =
                self.stack[start..].iter().map(|s| s.to_string()).collect();
            cycle.push(id.to_string());
            return Some(cycle);
        }
        if self.finished.contains(id) {
            return None;
        }

        self.stack.push(id);
        self.on_stack.insert(id);
        for dep in self.dependencies_of(id) {
            if let Some(cycle) = self.visit(dep) {
                return Some(cycle);
            }
        }
        self.stack.pop();
        self.on_stack.remove(id);
        self.finished.insert(id);
        None
    }
}

/// Count urgent items other than `excluding_id`. The collection satisfies the
/// exclusivity invariant when that count is at most one, and zero whenever
/// `excluding_id` itself is urgent.
pub fn validate_no_duplicate_urgent(items: &WorkItems, excluding_id: &str) -> bool {
    let others = items
        .values()
        .filter(|i| i.urgent && i.id != excluding_id)
        .count();
    let own = items.get(excluding_id).map(|i| i.urgent).unwrap_or(false);
    if own {
        others == 0
    } else {
        others <= 1
    }
}

/// Full integrity report over a loaded collection. Empty when healthy.
pub fn validate_collection(items: &WorkItems) -> Vec<String> {
    let mut problems = Vec::new();

    for (key, item) in items {
        if key != &item.id {
            problems.push(format!("entry '{key}' holds an item with id '{}'", item.id));
        }
        for dep in &item.dependencies {
            if !items.contains_key(dep) {
                problems.push(format!("'{key}' depends on missing item '{dep}'"));
            }
        }
        if item.urgent && item.is_completed() {
            problems.push(format!("'{key}' is completed but still marked urgent"));
        }
    }

    let mut reported: HashSet<String> = HashSet::new();
    for key in items.keys() {
        if reported.contains(key) {
            continue;
        }
        if let Some(cycle) = find_cycle(items, key, &[]) {
            let members: HashSet<String> = cycle.iter().cloned().collect();
            if members.iter().any(|m| reported.contains(m)) {
                continue;
            }
            problems.push(format!("circular dependency: {}", cycle.join(" -> ")));
            reported.extend(members);
        }
    }

    let urgent: Vec<&str> = items
        .values()
        .filter(|i| i.urgent)
        .map(|i| i.id.as_str())
        .collect();
    if urgent.len() > 1 {
        problems.push(format!(
            "more than one urgent item: {}",
            urgent.join(", ")
        ));
    }

    problems
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Priority, WorkItemStatus, WorkItemType};
    use crate::work_item::WorkItem;

    fn items(edges: &[(&str, &[&str])]) -> WorkItems {
        edges
            .iter()
            .map(|(id, deps)| {
                let mut item = WorkItem::new(*id, WorkItemType::Feature, *id, Priority::Medium);
                item.dependencies = deps.iter().map(|d| d.to_string()).collect();
                (id.to_string(), item)
            })
            .collect()
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn existing_acyclic_dependency_is_accepted() {
        let items = items(&[("a", &[]), ("b", &[])]);
        assert!(validate_dependencies(&items, "a", &ids(&["b"])).is_ok());
    }

    #[test]
    fn missing_dependency_is_reported() {
        let items = items(&[("a", &[])]);
        let errors = validate_dependencies(&items, "a", &ids(&["ghost"])).unwrap_err();
        assert_eq!(errors, vec!["dependency 'ghost' does not exist".to_string()]);
    }

    #[test]
    fn self_dependency_is_reported() {
        let items = items(&[("a", &[])]);
        let errors = validate_dependencies(&items, "a", &ids(&["a"])).unwrap_err();
        assert!(errors[0].contains("cannot depend on itself"));
    }

    #[test]
    fn two_node_cycle_reports_full_path() {
        // a -> b already; proposing b -> a closes the loop
        let items = items(&[("a", &["b"]), ("b", &[])]);
        let cycle = find_cycle(&items, "b", &ids(&["a"])).unwrap();
        assert_eq!(cycle, ids(&["b", "a", "b"]));

        let errors = validate_dependencies(&items, "b", &ids(&["a"])).unwrap_err();
        assert_eq!(errors, vec!["circular dependency: b -> a -> b".to_string()]);
    }

    #[test]
    fn long_cycle_is_detected() {
        let items = items(&[("a", &["b"]), ("b", &["c"]), ("c", &[]), ("d", &[])]);
        let cycle = find_cycle(&items, "c", &ids(&["d", "a"])).unwrap();
        assert_eq!(cycle, ids(&["c", "a", "b", "c"]));
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let items = items(&[("a", &["b", "c"]), ("b", &["d"]), ("c", &["d"]), ("d", &[])]);
        assert!(find_cycle(&items, "a", &[]).is_none());
    }

    #[test]
    fn urgent_exclusivity() {
        let mut items = items(&[("a", &[]), ("b", &[]), ("c", &[])]);
        assert!(validate_no_duplicate_urgent(&items, "a"));

        items.get_mut("b").unwrap().urgent = true;
        assert!(validate_no_duplicate_urgent(&items, "a"));
        assert!(validate_no_duplicate_urgent(&items, "b"));

        items.get_mut("a").unwrap().urgent = true;
        assert!(!validate_no_duplicate_urgent(&items, "a"));
        assert!(!validate_no_duplicate_urgent(&items, "c"));
    }

    #[test]
    fn collection_report_finds_every_problem_kind() {
        let mut items = items(&[("a", &["b"]), ("b", &["a"]), ("c", &["ghost"])]);
        items.get_mut("a").unwrap().urgent = true;
        let c = items.get_mut("c").unwrap();
        c.urgent = true;
        c.status = WorkItemStatus::Completed;

        let problems = validate_collection(&items);
        assert!(problems.iter().any(|p| p.contains("missing item 'ghost'")));
        assert!(problems.iter().any(|p| p.contains("'c' is completed")));
        assert!(problems.iter().any(|p| p == "circular dependency: a -> b -> a"));
        assert!(problems.iter().any(|p| p.contains("more than one urgent item: a, c")));
        assert_eq!(
            problems.iter().filter(|p| p.starts_with("circular")).count(),
            1
        );
    }

    #[test]
    fn healthy_collection_reports_nothing() {
        let items = items(&[("a", &["b"]), ("b", &[])]);
        assert!(validate_collection(&items).is_empty());
    }
}
