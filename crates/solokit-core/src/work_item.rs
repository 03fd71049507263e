use crate::types::{GitStatus, Priority, WorkItemStatus, WorkItemType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The in-memory collection, keyed by work item id. Ordered so that
/// serialization is deterministic.
pub type WorkItems = BTreeMap<String, WorkItem>;

// ---------------------------------------------------------------------------
// GitInfo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitInfo {
    pub branch: String,
    pub parent_branch: String,
    pub status: GitStatus,
}

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_num: u32,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

// ---------------------------------------------------------------------------
// WorkItem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: WorkItemType,
    pub title: String,
    pub status: WorkItemStatus,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitInfo>,
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkItem {
    pub fn new(
        id: impl Into<String>,
        item_type: WorkItemType,
        title: impl Into<String>,
        priority: Priority,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            item_type,
            title: title.into(),
            status: WorkItemStatus::NotStarted,
            priority,
            description: None,
            milestone: None,
            dependencies: Vec::new(),
            urgent: false,
            git: None,
            sessions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == WorkItemStatus::Completed
    }

    pub fn open_session(&self) -> Option<&SessionRecord> {
        self.sessions.iter().rev().find(|s| s.is_open())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// NewWorkItem
// ---------------------------------------------------------------------------

/// Arguments for creating a work item through the repository.
#[derive(Debug, Clone)]
pub struct NewWorkItem {
    pub id: String,
    pub item_type: WorkItemType,
    pub title: String,
    pub priority: Priority,
    pub dependencies: Vec<String>,
    pub urgent: bool,
    pub milestone: Option<String>,
    pub description: Option<String>,
}

impl NewWorkItem {
    pub fn new(id: impl Into<String>, item_type: WorkItemType, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            item_type,
            title: title.into(),
            priority: Priority::default(),
            dependencies: Vec::new(),
            urgent: false,
            milestone: None,
            description: None,
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn urgent(mut self, urgent: bool) -> Self {
        self.urgent = urgent;
        self
    }

    pub(crate) fn into_work_item(self) -> WorkItem {
        let mut item = WorkItem::new(self.id, self.item_type, self.title, self.priority);
        item.dependencies = self.dependencies;
        item.urgent = self.urgent;
        item.milestone = self.milestone;
        item.description = self.description;
        item
    }
}

/// Split a comma-separated id list, trimming whitespace and dropping empties.
pub fn parse_id_list(raw: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let id = part.trim();
        if !id.is_empty() && !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_defaults() {
        let item = WorkItem::new("feature_auth", WorkItemType::Feature, "Auth", Priority::High);
        assert_eq!(item.status, WorkItemStatus::NotStarted);
        assert!(!item.urgent);
        assert!(item.git.is_none());
        assert!(item.sessions.is_empty());
    }

    #[test]
    fn type_field_serializes_as_type() {
        let item = WorkItem::new("bug_1", WorkItemType::Bug, "Crash", Priority::Low);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "bug");
        assert_eq!(value["status"], "not_started");
        assert!(value.get("git").is_none());
    }

    #[test]
    fn parse_id_list_trims_and_dedups() {
        assert_eq!(parse_id_list(" a, b ,,a,c "), vec!["a", "b", "c"]);
        assert!(parse_id_list(" , ").is_empty());
    }

    #[test]
    fn open_session_finds_unclosed_record() {
        let mut item = WorkItem::new("f", WorkItemType::Feature, "F", Priority::Medium);
        item.sessions.push(SessionRecord {
            session_num: 1,
            started_at: Utc::now(),
            ended_at: Some(Utc::now()),
        });
        assert!(item.open_session().is_none());
        item.sessions.push(SessionRecord {
            session_num: 2,
            started_at: Utc::now(),
            ended_at: None,
        });
        assert_eq!(item.open_session().map(|s| s.session_num), Some(2));
    }
}
