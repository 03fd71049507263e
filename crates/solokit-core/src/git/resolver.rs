use crate::config::GitWorkflowConfig;
use crate::error::Result;
use crate::git::runner::CommandRunner;
use crate::repository::WorkItemRepository;
use crate::types::GitStatus;
use crate::work_item::WorkItems;
use serde::{Deserialize, Serialize};

/// A reconciled change of a work item's stored branch status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GitStatusTransition {
    pub item_id: String,
    pub branch: String,
    pub from: GitStatus,
    pub to: GitStatus,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    state: String,
}

/// Classifies what happened to a work item's branch.
///
/// Rules are evaluated in order and the first match wins:
///
/// 1. branch listed by `git branch --merged <parent>` → `merged`
/// 2. a pull request for the branch exists → `merged` / `pr_created` / `pr_closed`
/// 3. the branch exists locally or on the remote → `ready_for_pr`
/// 4. otherwise → `deleted`
///
/// Every command failure (missing binary, timeout, non-zero exit) means
/// "no information" and falls through to the next rule.
pub struct GitBranchStatusResolver<R> {
    runner: R,
    config: GitWorkflowConfig,
}

impl<R: CommandRunner> GitBranchStatusResolver<R> {
    pub fn new(runner: R, config: &GitWorkflowConfig) -> Self {
        Self {
            runner,
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &GitWorkflowConfig {
        &self.config
    }

    pub fn resolve(&self, branch: &str, parent_branch: &str) -> GitStatus {
        if self.is_merged_locally(branch, parent_branch) {
            return GitStatus::Merged;
        }
        if let Some(status) = self.pull_request_status(branch) {
            return status;
        }
        if self.exists_locally(branch) || self.exists_on_remote(branch) {
            return GitStatus::ReadyForPr;
        }
        GitStatus::Deleted
    }

    fn is_merged_locally(&self, branch: &str, parent_branch: &str) -> bool {
        match self.runner.run(&["git", "branch", "--merged", parent_branch]) {
            Ok(out) if out.success() => out.stdout.lines().any(|line| {
                let name = line.trim();
                let name = name
                    .strip_prefix("* ")
                    .or_else(|| name.strip_prefix("+ "))
                    .unwrap_or(name);
                name == branch
            }),
            Ok(out) => {
                tracing::debug!(branch, stderr = %out.stderr.trim(), "git branch --merged failed");
                false
            }
            Err(e) => {
                tracing::debug!(branch, error = %e, "git unavailable for merge check");
                false
            }
        }
    }

    fn pull_request_status(&self, branch: &str) -> Option<GitStatus> {
        if !self.config.check_pull_requests {
            return None;
        }
        let out = match self.runner.run(&[
            "gh", "pr", "list", "--head", branch, "--state", "all", "--json", "state", "--limit",
            "1",
        ]) {
            Ok(out) if out.success() => out,
            Ok(out) => {
                tracing::debug!(branch, stderr = %out.stderr.trim(), "gh pr list failed");
                return None;
            }
            Err(e) => {
                tracing::debug!(branch, error = %e, "gh unavailable, skipping pull request lookup");
                return None;
            }
        };

        let prs: Vec<PullRequest> = match serde_json::from_str(out.stdout.trim()) {
            Ok(prs) => prs,
            Err(e) => {
                tracing::debug!(branch, error = %e, "unparseable gh output");
                return None;
            }
        };
        let pr = prs.first()?;
        Some(match pr.state.to_ascii_uppercase().as_str() {
            "MERGED" => GitStatus::Merged,
            "OPEN" => GitStatus::PrCreated,
            _ => GitStatus::PrClosed,
        })
    }

    fn exists_locally(&self, branch: &str) -> bool {
        let reference = format!("refs/heads/{branch}");
        self.runner
            .run(&["git", "show-ref", "--verify", "--quiet", &reference])
            .map(|out| out.success())
            .unwrap_or(false)
    }

    fn exists_on_remote(&self, branch: &str) -> bool {
        self.runner
            .run(&["git", "ls-remote", "--heads", &self.config.remote, branch])
            .map(|out| out.success() && !out.stdout.trim().is_empty())
            .unwrap_or(false)
    }

    /// The checked-out branch, if git can tell.
    pub fn current_branch(&self) -> Option<String> {
        let out = self
            .runner
            .run(&["git", "rev-parse", "--abbrev-ref", "HEAD"])
            .ok()?;
        let name = out.stdout.trim();
        if !out.success() || name.is_empty() || name == "HEAD" {
            return None;
        }
        Some(name.to_string())
    }

    // -----------------------------------------------------------------------
    // Finalization
    // -----------------------------------------------------------------------

    /// Resolve every completed item whose branch status is still the transient
    /// `in_progress`, except `new_item_id`. Items that are not completed or
    /// have no git block are left alone.
    pub fn finalize_in_place(
        &self,
        items: &mut WorkItems,
        new_item_id: &str,
    ) -> Vec<GitStatusTransition> {
        let mut transitions = Vec::new();
        for item in items.values_mut() {
            if item.id == new_item_id || !item.is_completed() {
                continue;
            }
            let Some(git) = item.git.as_mut() else {
                tracing::debug!(
                    item = %item.id,
                    "completed item has no git tracking, nothing to finalize"
                );
                continue;
            };
            if git.status != GitStatus::InProgress {
                continue;
            }

            let resolved = self.resolve(&git.branch, &git.parent_branch);
            tracing::info!(
                item = %item.id,
                branch = %git.branch,
                from = %git.status,
                to = %resolved,
                "finalized git status"
            );
            transitions.push(GitStatusTransition {
                item_id: item.id.clone(),
                branch: git.branch.clone(),
                from: git.status,
                to: resolved,
            });
            git.status = resolved;
        }
        transitions
    }

    /// Load, finalize stale statuses and save. Nothing is written when no
    /// item needed finalizing.
    pub fn finalize_previous_work_item_git_status(
        &self,
        repo: &WorkItemRepository,
        new_item_id: &str,
    ) -> Result<Vec<GitStatusTransition>> {
        let mut items = repo.load()?;
        let transitions = self.finalize_in_place(&mut items, new_item_id);
        if !transitions.is_empty() {
            repo.save(&items)?;
        }
        Ok(transitions)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
