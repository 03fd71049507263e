use crate::error::{Result, SolokitError};
use crate::git::{CommandRunner, GitBranchStatusResolver, GitStatusTransition};
use crate::queue;
use crate::repository::WorkItemRepository;
use crate::types::{GitStatus, WorkItemStatus};
use crate::updater::{self, UpdateRequest};
use crate::work_item::{GitInfo, SessionRecord, WorkItem, WorkItems};
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SessionStart {
    pub item: WorkItem,
    pub session_num: u32,
    /// True when the item already had an open session.
    pub resumed: bool,
    /// Stale branch statuses reconciled before the session started.
    pub finalized: Vec<GitStatusTransition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionEnd {
    pub item: WorkItem,
    pub session_num: u32,
    pub changes: Vec<String>,
}

/// The item with an open session, most recently started first.
pub fn current_item(items: &WorkItems) -> Option<&WorkItem> {
    items
        .values()
        .filter_map(|item| item.open_session().map(|s| (s.started_at, item)))
        .max_by_key(|(started, _)| *started)
        .map(|(_, item)| item)
}

/// Start (or resume) a session on `item_id`.
///
/// Completed items whose branch status went stale are finalized first, then
/// the item moves to `in_progress` and gains a session record and a git block.
/// Everything lands in one save.
pub fn start_session<R: CommandRunner>(
    repo: &WorkItemRepository,
    resolver: &GitBranchStatusResolver<R>,
    item_id: &str,
    parent_branch: Option<&str>,
) -> Result<SessionStart> {
    let mut items = repo.load()?;

    let item = items
        .get(item_id)
        .ok_or_else(|| SolokitError::WorkItemNotFound(item_id.to_string()))?;
    if item.is_completed() {
        return Err(SolokitError::validation(format!(
            "'{item_id}' is already completed"
        )));
    }
    let unmet = queue::blocked_by(&items, item_id);
    if !unmet.is_empty() {
        return Err(SolokitError::validation_with(
            format!("cannot start '{item_id}': dependencies are not completed"),
            unmet,
        ));
    }
    if let Some(active) = current_item(&items) {
        if active.id != item_id {
            return Err(SolokitError::validation(format!(
                "a session is already open for '{}'; end it first",
                active.id
            )));
        }
    }

    let parent_branch = match parent_branch {
        Some(branch) => branch.to_string(),
        None => resolver
            .current_branch()
            .filter(|b| b != item_id)
            .unwrap_or_else(|| resolver.config().parent_branch.clone()),
    };

    let finalized = resolver.finalize_in_place(&mut items, item_id);

    let item = items
        .get_mut(item_id)
        .ok_or_else(|| SolokitError::WorkItemNotFound(item_id.to_string()))?;
    let open_num = item.open_session().map(|s| s.session_num);
    let resumed = open_num.is_some();
    let session_num = match open_num {
        Some(num) => num,
        None => {
            let next = item.sessions.iter().map(|s| s.session_num).max().unwrap_or(0) + 1;
            item.sessions.push(SessionRecord {
                session_num: next,
                started_at: Utc::now(),
                ended_at: None,
            });
            next
        }
    };

    item.status = WorkItemStatus::InProgress;
    match item.git.as_mut() {
        Some(git) => git.status = GitStatus::InProgress,
        None => {
            item.git = Some(GitInfo {
                branch: item_id.to_string(),
                parent_branch,
                status: GitStatus::InProgress,
            })
        }
    }
    item.touch();
    let item = item.clone();

    repo.save(&items)?;
    tracing::info!(item = %item_id, session = session_num, resumed, "session started");

    Ok(SessionStart {
        item,
        session_num,
        resumed,
        finalized,
    })
}

/// Close the open session on `item_id` (or on the current item when `None`),
/// optionally completing the item in the same save.
pub fn end_session(
    repo: &WorkItemRepository,
    item_id: Option<&str>,
    complete: bool,
) -> Result<SessionEnd> {
    let mut items = repo.load()?;

    let item_id = match item_id {
        Some(id) => id.to_string(),
        None => current_item(&items)
            .map(|i| i.id.clone())
            .ok_or_else(|| SolokitError::validation("no session is open"))?,
    };

    let item = items
        .get_mut(&item_id)
        .ok_or_else(|| SolokitError::WorkItemNotFound(item_id.clone()))?;
    let already_completed = item.is_completed();
    let open = item
        .sessions
        .iter_mut()
        .rev()
        .find(|s| s.is_open())
        .ok_or_else(|| SolokitError::validation(format!("no open session for '{item_id}'")))?;
    open.ended_at = Some(Utc::now());
    let session_num = open.session_num;
    item.touch();

    let mut changes = vec![format!("session {session_num} ended")];
    // Closing the session is itself the change when the item was completed
    // mid-session.
    if complete && !already_completed {
        let request = UpdateRequest::status(WorkItemStatus::Completed);
        let outcome = updater::apply_update(&mut items, &item_id, &request)?;
        changes.extend(outcome.changes);
    }

    let item = items
        .get(&item_id)
        .cloned()
        .ok_or_else(|| SolokitError::WorkItemNotFound(item_id.clone()))?;
    repo.save(&items)?;
    tracing::info!(item = %item_id, session = session_num, complete, "session ended");

    Ok(SessionEnd {
        item,
        session_num,
        changes,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
