use crate::error::SolokitError;
use serde::{Deserialize, Serialize};
use std::fmt;

fn unknown(kind: &str, value: &str, accepted: &[&str]) -> SolokitError {
    SolokitError::validation(format!(
        "unknown {kind} '{value}' (expected one of: {})",
        accepted.join(", ")
    ))
}

// ---------------------------------------------------------------------------
// WorkItemType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemType {
    Feature,
    Bug,
    Refactor,
    Security,
    IntegrationTest,
    Deployment,
}

impl WorkItemType {
    pub fn all() -> &'static [WorkItemType] {
        &[
            WorkItemType::Feature,
            WorkItemType::Bug,
            WorkItemType::Refactor,
            WorkItemType::Security,
            WorkItemType::IntegrationTest,
            WorkItemType::Deployment,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkItemType::Feature => "feature",
            WorkItemType::Bug => "bug",
            WorkItemType::Refactor => "refactor",
            WorkItemType::Security => "security",
            WorkItemType::IntegrationTest => "integration_test",
            WorkItemType::Deployment => "deployment",
        }
    }
}

impl fmt::Display for WorkItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkItemType {
    type Err = SolokitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkItemType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = WorkItemType::all().iter().map(|t| t.as_str()).collect();
                unknown("work item type", s, &names)
            })
    }
}

// ---------------------------------------------------------------------------
// WorkItemStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    NotStarted,
    InProgress,
    Completed,
    Blocked,
}

impl WorkItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkItemStatus::NotStarted => "not_started",
            WorkItemStatus::InProgress => "in_progress",
            WorkItemStatus::Completed => "completed",
            WorkItemStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for WorkItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkItemStatus {
    type Err = SolokitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(WorkItemStatus::NotStarted),
            "in_progress" => Ok(WorkItemStatus::InProgress),
            "completed" => Ok(WorkItemStatus::Completed),
            "blocked" => Ok(WorkItemStatus::Blocked),
            _ => Err(unknown(
                "status",
                s,
                &["not_started", "in_progress", "completed", "blocked"],
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = SolokitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(unknown("priority", s, &["low", "medium", "high", "critical"])),
        }
    }
}

// ---------------------------------------------------------------------------
// GitStatus
// ---------------------------------------------------------------------------

/// Lifecycle of the branch attached to a work item.
///
/// `InProgress` is the only transient value: it is written when a session
/// starts and replaced by one of the others when the item is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GitStatus {
    InProgress,
    Merged,
    PrCreated,
    PrClosed,
    ReadyForPr,
    Deleted,
}

impl GitStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GitStatus::InProgress => "in_progress",
            GitStatus::Merged => "merged",
            GitStatus::PrCreated => "pr_created",
            GitStatus::PrClosed => "pr_closed",
            GitStatus::ReadyForPr => "ready_for_pr",
            GitStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for GitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
