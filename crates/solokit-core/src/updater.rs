//! The single mutation entry point for work items.
//!
//! An update that would change nothing is an error ("No changes to update")
//! so callers notice ineffective requests instead of silently succeeding.

use crate::error::{Result, SolokitError};
use crate::repository::WorkItemRepository;
use crate::types::{Priority, WorkItemStatus};
use crate::validator;
use crate::work_item::{parse_id_list, WorkItem, WorkItems};
use serde::Serialize;

pub const NO_CHANGES: &str = "No changes to update";

/// Requested field changes. `None`/`false` means "leave alone".
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    pub status: Option<WorkItemStatus>,
    pub priority: Option<Priority>,
    /// Comma-separated ids.
    pub add_dependency: Option<String>,
    /// Comma-separated ids.
    pub remove_dependency: Option<String>,
    pub set_urgent: bool,
    pub clear_urgent: bool,
    /// Empty string clears the milestone.
    pub milestone: Option<String>,
    /// Empty string clears the description.
    pub description: Option<String>,
}

impl UpdateRequest {
    pub fn status(status: WorkItemStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub item: WorkItem,
    /// Human-readable description of each applied change.
    pub changes: Vec<String>,
    /// Other items whose urgent flag was cleared by this update.
    pub urgent_cleared_from: Vec<String>,
}

pub struct WorkItemUpdater<'a> {
    repo: &'a WorkItemRepository,
}

impl<'a> WorkItemUpdater<'a> {
    pub fn new(repo: &'a WorkItemRepository) -> Self {
        Self { repo }
    }

    /// Load, apply, validate and save in one write.
    pub fn update(&self, item_id: &str, request: &UpdateRequest) -> Result<UpdateOutcome> {
        let mut items = self.repo.load()?;
        let outcome = apply_update(&mut items, item_id, request)?;
        self.repo.save(&items)?;
        Ok(outcome)
    }
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Apply `request` to `items` in memory. On error `items` is left untouched.
pub fn apply_update(
    items: &mut WorkItems,
    item_id: &str,
    request: &UpdateRequest,
) -> Result<UpdateOutcome> {
    if request.set_urgent && request.clear_urgent {
        return Err(SolokitError::validation(
            "cannot set and clear urgent in the same update",
        ));
    }
    if let (Some(add), Some(remove)) = (&request.add_dependency, &request.remove_dependency) {
        let removing = parse_id_list(remove);
        let overlap: Vec<String> = parse_id_list(add)
            .into_iter()
            .filter(|id| removing.contains(id))
            .collect();
        if !overlap.is_empty() {
            return Err(SolokitError::validation_with(
                "cannot add and remove the same dependency in one update",
                overlap,
            ));
        }
    }

    let current = items
        .get(item_id)
        .ok_or_else(|| SolokitError::WorkItemNotFound(item_id.to_string()))?;
    let mut updated = current.clone();
    let mut changes: Vec<String> = Vec::new();
    let mut hints: Vec<String> = Vec::new();

    if let Some(status) = request.status {
        if status != current.status {
            changes.push(format!("status: {} -> {status}", current.status));
            updated.status = status;
        } else {
            hints.push(format!("status is already '{status}'"));
        }
    }

    if let Some(priority) = request.priority {
        if priority != current.priority {
            changes.push(format!("priority: {} -> {priority}", current.priority));
            updated.priority = priority;
        } else {
            hints.push(format!("priority is already '{priority}'"));
        }
    }

    if let Some(raw) = &request.milestone {
        let milestone = normalize_optional(raw);
        if milestone != current.milestone {
            changes.push(format!(
                "milestone: {}",
                milestone.as_deref().unwrap_or("(cleared)")
            ));
            updated.milestone = milestone;
        } else {
            hints.push("milestone is unchanged".to_string());
        }
    }

    if let Some(raw) = &request.description {
        let description = normalize_optional(raw);
        if description != current.description {
            changes.push("description updated".to_string());
            updated.description = description;
        } else {
            hints.push("description is unchanged".to_string());
        }
    }

    let mut added: Vec<String> = Vec::new();
    if let Some(raw) = &request.add_dependency {
        let requested = parse_id_list(raw);
        if requested.is_empty() {
            hints.push("no dependency ids given to add".to_string());
        }
        for dep in requested {
            if current.dependencies.contains(&dep) {
                hints.push(format!("'{dep}' is already a dependency of '{item_id}'"));
            } else {
                updated.dependencies.push(dep.clone());
                added.push(dep);
            }
        }
        if !added.is_empty() {
            changes.push(format!("dependencies added: {}", added.join(", ")));
        }
    }

    if let Some(raw) = &request.remove_dependency {
        let requested = parse_id_list(raw);
        if requested.is_empty() {
            hints.push("no dependency ids given to remove".to_string());
        }
        let mut removed: Vec<String> = Vec::new();
        for dep in requested {
            if updated.dependencies.contains(&dep) {
                updated.dependencies.retain(|d| d != &dep);
                removed.push(dep);
            } else {
                hints.push(format!("'{dep}' is not a dependency of '{item_id}'"));
            }
        }
        if !removed.is_empty() {
            changes.push(format!("dependencies removed: {}", removed.join(", ")));
        }
    }

    let mut urgent_cleared_from: Vec<String> = Vec::new();
    if request.set_urgent {
        if updated.status == WorkItemStatus::Completed {
            return Err(SolokitError::validation(format!(
                "cannot mark completed item '{item_id}' urgent"
            )));
        }
        if current.urgent {
            hints.push(format!("'{item_id}' is already urgent"));
        } else {
            updated.urgent = true;
            changes.push("urgent: set".to_string());
            urgent_cleared_from = items
                .values()
                .filter(|i| i.urgent && i.id != item_id)
                .map(|i| i.id.clone())
                .collect();
        }
    }

    if request.clear_urgent {
        if current.urgent {
            updated.urgent = false;
            changes.push("urgent: cleared".to_string());
        } else {
            hints.push(format!("'{item_id}' is not urgent"));
        }
    }

    let completing =
        updated.status == WorkItemStatus::Completed && current.status != WorkItemStatus::Completed;
    if completing && updated.urgent {
        updated.urgent = false;
        changes.push("urgent: cleared on completion".to_string());
    }

    if changes.is_empty() {
        for hint in &hints {
            tracing::warn!(item = %item_id, "{hint}");
        }
        return Err(SolokitError::validation_with(NO_CHANGES, hints));
    }
    for hint in &hints {
        tracing::warn!(item = %item_id, "ignored: {hint}");
    }

    // Build the proposed collection and validate it before committing.
    let mut proposed = items.clone();
    for other_id in &urgent_cleared_from {
        if let Some(other) = proposed.get_mut(other_id) {
            tracing::warn!(from = %other_id, to = %item_id, "moving urgent flag");
            other.urgent = false;
            other.touch();
        }
    }
    updated.touch();
    proposed.insert(item_id.to_string(), updated);

    if !added.is_empty() {
        validator::validate_dependencies(&proposed, item_id, &added)
            .map_err(|errors| SolokitError::validation_with("Invalid dependencies", errors))?;
    }
    if (request.set_urgent || request.clear_urgent)
        && !validator::validate_no_duplicate_urgent(&proposed, item_id)
    {
        return Err(SolokitError::validation(
            "only one work item can be urgent at a time",
        ));
    }

    let item = proposed
        .get(item_id)
        .cloned()
        .ok_or_else(|| SolokitError::WorkItemNotFound(item_id.to_string()))?;
    *items = proposed;

    Ok(UpdateOutcome {
        item,
        changes,
        urgent_cleared_from,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WorkItemType;
    use crate::work_item::NewWorkItem;
    use tempfile::TempDir;

    fn setup(ids: &[&str]) -> (TempDir, WorkItemRepository) {
        let dir = TempDir::new().unwrap();
        let repo = WorkItemRepository::new(dir.path());
        repo.init().unwrap();
        for id in ids {
            repo.add_work_item(NewWorkItem::new(*id, WorkItemType::Feature, *id))
                .unwrap();
        }
        (dir, repo)
    }

    fn assert_no_changes(err: SolokitError) -> Vec<String> {
        match err {
            SolokitError::Validation { message, errors } => {
                assert_eq!(message, NO_CHANGES);
                errors
            }
            other => panic!("expected no-changes validation error, got {other:?}"),
        }
    }

    fn urgent_count(items: &WorkItems) -> usize {
        items.values().filter(|i| i.urgent).count()
    }

    fn set_urgent() -> UpdateRequest {
        UpdateRequest {
            set_urgent: true,
            ..UpdateRequest::default()
        }
    }

    fn clear_urgent() -> UpdateRequest {
        UpdateRequest {
            clear_urgent: true,
            ..UpdateRequest::default()
        }
    }

    fn add_deps(ids: &str) -> UpdateRequest {
        UpdateRequest {
            add_dependency: Some(ids.into()),
            ..UpdateRequest::default()
        }
    }

    fn remove_deps(ids: &str) -> UpdateRequest {
        UpdateRequest {
            remove_dependency: Some(ids.into()),
            ..UpdateRequest::default()
        }
    }

    #[test]
    fn unknown_item_is_not_found() {
        let (_dir, repo) = setup(&[]);
        let err = WorkItemUpdater::new(&repo)
            .update("ghost", &UpdateRequest::status(WorkItemStatus::InProgress))
            .unwrap_err();
        assert!(matches!(err, SolokitError::WorkItemNotFound(_)));
    }

    #[test]
    fn same_status_is_rejected_as_no_change() {
        let (_dir, repo) = setup(&["a"]);
        let before = std::fs::read_to_string(repo.path()).unwrap();
        let err = WorkItemUpdater::new(&repo)
            .update("a", &UpdateRequest::status(WorkItemStatus::NotStarted))
            .unwrap_err();
        let hints = assert_no_changes(err);
        assert_eq!(hints, vec!["status is already 'not_started'".to_string()]);
        assert_eq!(std::fs::read_to_string(repo.path()).unwrap(), before);
    }

    #[test]
    fn empty_request_is_rejected() {
        let (_dir, repo) = setup(&["a"]);
        let err = WorkItemUpdater::new(&repo)
            .update("a", &UpdateRequest::default())
            .unwrap_err();
        assert!(assert_no_changes(err).is_empty());
    }

    #[test]
    fn completing_an_urgent_item_clears_urgent() {
        let (_dir, repo) = setup(&["a"]);
        let updater = WorkItemUpdater::new(&repo);
        updater
            .update(
                "a",
                &UpdateRequest {
                    status: Some(WorkItemStatus::InProgress),
                    set_urgent: true,
                    ..UpdateRequest::default()
                },
            )
            .unwrap();

        let outcome = updater
            .update("a", &UpdateRequest::status(WorkItemStatus::Completed))
            .unwrap();
        assert_eq!(outcome.item.status, WorkItemStatus::Completed);
        assert!(!outcome.item.urgent);
        assert!(outcome
            .changes
            .iter()
            .any(|c| c == "urgent: cleared on completion"));

        let stored = repo.get("a").unwrap();
        assert!(!stored.urgent);
    }

    #[test]
    fn set_urgent_moves_flag_in_one_save() {
        let (_dir, repo) = setup(&["a", "b"]);
        let updater = WorkItemUpdater::new(&repo);
        updater
            .update("a", &set_urgent())
            .unwrap();
        let outcome = updater
            .update("b", &set_urgent())
            .unwrap();
        assert_eq!(outcome.urgent_cleared_from, vec!["a".to_string()]);

        let items = repo.load().unwrap();
        assert!(items["b"].urgent);
        assert!(!items["a"].urgent);
        assert_eq!(urgent_count(&items), 1);
    }

    #[test]
    fn set_urgent_on_urgent_item_is_no_change() {
        let (_dir, repo) = setup(&["a"]);
        let updater = WorkItemUpdater::new(&repo);
        let req = set_urgent();
        updater.update("a", &req).unwrap();
        assert_no_changes(updater.update("a", &req).unwrap_err());
    }

    #[test]
    fn clear_urgent_on_plain_item_is_no_change() {
        let (_dir, repo) = setup(&["a"]);
        let err = WorkItemUpdater::new(&repo)
            .update("a", &clear_urgent())
            .unwrap_err();
        assert_eq!(assert_no_changes(err), vec!["'a' is not urgent".to_string()]);
    }

    #[test]
    fn contradictory_urgent_flags_are_rejected() {
        let (_dir, repo) = setup(&["a"]);
        let err = WorkItemUpdater::new(&repo)
            .update(
                "a",
                &UpdateRequest {
                    set_urgent: true,
                    clear_urgent: true,
                    ..UpdateRequest::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, SolokitError::Validation { .. }));
    }

    #[test]
    fn adding_and_removing_same_dependency_is_rejected() {
        let (_dir, repo) = setup(&["a", "b", "c"]);
        let before = std::fs::read_to_string(repo.path()).unwrap();
        let err = WorkItemUpdater::new(&repo)
            .update(
                "a",
                &UpdateRequest {
                    add_dependency: Some("b,c".into()),
                    remove_dependency: Some("b".into()),
                    ..UpdateRequest::default()
                },
            )
            .unwrap_err();
        match err {
            SolokitError::Validation { errors, .. } => assert_eq!(errors, vec!["b".to_string()]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(std::fs::read_to_string(repo.path()).unwrap(), before);
        assert!(repo.get("a").unwrap().dependencies.is_empty());
    }

    #[test]
    fn completed_item_cannot_become_urgent() {
        let (_dir, repo) = setup(&["a"]);
        let updater = WorkItemUpdater::new(&repo);
        updater
            .update("a", &UpdateRequest::status(WorkItemStatus::Completed))
            .unwrap();
        let err = updater
            .update("a", &set_urgent())
            .unwrap_err();
        assert!(err.to_string().contains("cannot mark completed item 'a' urgent"));
    }

    #[test]
    fn add_dependency_applies_only_new_ids() {
        let (_dir, repo) = setup(&["a", "b", "c"]);
        let updater = WorkItemUpdater::new(&repo);
        updater
            .update("a", &add_deps("b"))
            .unwrap();
        let outcome = updater
            .update("a", &add_deps("b, c"))
            .unwrap();
        assert_eq!(outcome.item.dependencies, vec!["b".to_string(), "c".to_string()]);
        assert_eq!(outcome.changes, vec!["dependencies added: c".to_string()]);
    }

    #[test]
    fn add_existing_dependency_only_is_no_change_with_hint() {
        let (_dir, repo) = setup(&["a", "b"]);
        let updater = WorkItemUpdater::new(&repo);
        let req = add_deps("b");
        updater.update("a", &req).unwrap();
        let hints = assert_no_changes(updater.update("a", &req).unwrap_err());
        assert_eq!(hints, vec!["'b' is already a dependency of 'a'".to_string()]);
    }

    #[test]
    fn add_dependency_creating_cycle_is_rejected_without_saving() {
        let (_dir, repo) = setup(&["a", "b"]);
        let updater = WorkItemUpdater::new(&repo);
        updater
            .update("a", &add_deps("b"))
            .unwrap();
        let before = std::fs::read_to_string(repo.path()).unwrap();

        let err = updater
            .update("b", &add_deps("a"))
            .unwrap_err();
        match err {
            SolokitError::Validation { errors, .. } => {
                assert_eq!(errors, vec!["circular dependency: b -> a -> b".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(std::fs::read_to_string(repo.path()).unwrap(), before);
    }

    #[test]
    fn add_unknown_dependency_is_rejected() {
        let (_dir, repo) = setup(&["a"]);
        let err = WorkItemUpdater::new(&repo)
            .update("a", &add_deps("ghost"))
            .unwrap_err();
        match err {
            SolokitError::Validation { errors, .. } => {
                assert_eq!(errors, vec!["dependency 'ghost' does not exist".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn remove_absent_dependency_only_is_no_change() {
        let (_dir, repo) = setup(&["a", "b"]);
        let err = WorkItemUpdater::new(&repo)
            .update("a", &remove_deps("b"))
            .unwrap_err();
        assert_eq!(
            assert_no_changes(err),
            vec!["'b' is not a dependency of 'a'".to_string()]
        );
    }

    #[test]
    fn remove_dependency_applies_present_subset() {
        let (_dir, repo) = setup(&["a", "b", "c"]);
        let updater = WorkItemUpdater::new(&repo);
        updater
            .update("a", &add_deps("b,c"))
            .unwrap();
        let outcome = updater
            .update("a", &remove_deps("c, ghost"))
            .unwrap();
        assert_eq!(outcome.item.dependencies, vec!["b".to_string()]);
    }

    #[test]
    fn multiple_fields_batch_into_one_change_set() {
        let (_dir, repo) = setup(&["a"]);
        let outcome = WorkItemUpdater::new(&repo)
            .update(
                "a",
                &UpdateRequest {
                    status: Some(WorkItemStatus::Blocked),
                    priority: Some(Priority::Critical),
                    milestone: Some("m1".into()),
                    ..UpdateRequest::default()
                },
            )
            .unwrap();
        assert_eq!(outcome.changes.len(), 3);
        let stored = repo.get("a").unwrap();
        assert_eq!(stored.status, WorkItemStatus::Blocked);
        assert_eq!(stored.priority, Priority::Critical);
        assert_eq!(stored.milestone.as_deref(), Some("m1"));
    }

    #[test]
    fn urgent_and_acyclic_invariants_hold_across_a_sequence() {
        let (_dir, repo) = setup(&["a", "b", "c", "d"]);
        let updater = WorkItemUpdater::new(&repo);
        let steps: Vec<(&str, UpdateRequest)> = vec![
            ("a", set_urgent()),
            ("b", add_deps("a")),
            (
                "c",
                UpdateRequest {
                    set_urgent: true,
                    ..add_deps("b")
                },
            ),
            ("a", add_deps("c")),
            ("d", set_urgent()),
            ("d", UpdateRequest::status(WorkItemStatus::Completed)),
            ("a", add_deps("d")),
        ];
        for (id, req) in &steps {
            let _ = updater.update(id, req);
            let items = repo.load().unwrap();
            assert!(urgent_count(&items) <= 1);
            assert!(items.values().all(|i| !(i.is_completed() && i.urgent)));
            assert!(validator::validate_collection(&items).is_empty());
        }
        let items = repo.load().unwrap();
        assert!(!items["a"].dependencies.contains(&"c".to_string()));
        assert_eq!(items["a"].dependencies, vec!["d".to_string()]);
    }
}
