use crate::error::{Result, SolokitError};
use crate::paths;
use crate::types::WorkItemStatus;
use crate::validator;
use crate::work_item::{NewWorkItem, WorkItem, WorkItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// On-disk document
// ---------------------------------------------------------------------------

/// Informational counts written alongside the items. Recomputed on every
/// save and never trusted on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub total_items: usize,
    pub not_started: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub blocked: usize,
}

impl Metadata {
    pub fn compute(items: &WorkItems) -> Self {
        let count = |status: WorkItemStatus| items.values().filter(|i| i.status == status).count();
        Self {
            total_items: items.len(),
            not_started: count(WorkItemStatus::NotStarted),
            in_progress: count(WorkItemStatus::InProgress),
            completed: count(WorkItemStatus::Completed),
            blocked: count(WorkItemStatus::Blocked),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WorkItemsDocument {
    #[serde(default)]
    work_items: WorkItems,
}

// ---------------------------------------------------------------------------
// WorkItemRepository
// ---------------------------------------------------------------------------

/// Sole owner of `.session/tracking/work_items.json`.
#[derive(Debug, Clone)]
pub struct WorkItemRepository {
    path: PathBuf,
}

impl WorkItemRepository {
    pub fn new(root: &Path) -> Self {
        Self {
            path: paths::work_items_path(root),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Create an empty store if none exists. Returns true if it was created.
    pub fn init(&self) -> Result<bool> {
        if self.exists() {
            return Ok(false);
        }
        self.save(&WorkItems::new())?;
        Ok(true)
    }

    pub fn load(&self) -> Result<WorkItems> {
        if !self.exists() {
            return Err(SolokitError::StoreNotFound(self.path.clone()));
        }
        let data = std::fs::read_to_string(&self.path)?;
        let doc: WorkItemsDocument =
            serde_json::from_str(&data).map_err(|source| SolokitError::CorruptData {
                path: self.path.clone(),
                source,
            })?;
        Ok(doc.work_items)
    }

    pub fn save(&self, items: &WorkItems) -> Result<()> {
        #[derive(Serialize)]
        struct DocumentRef<'a> {
            work_items: &'a WorkItems,
            metadata: Metadata,
        }

        let doc = DocumentRef {
            work_items: items,
            metadata: Metadata::compute(items),
        };
        let mut data = serde_json::to_string_pretty(&doc)?;
        data.push('\n');
        crate::io::atomic_write(&self.path, data.as_bytes())
    }

    pub fn get(&self, id: &str) -> Result<WorkItem> {
        let mut items = self.load()?;
        items
            .remove(id)
            .ok_or_else(|| SolokitError::WorkItemNotFound(id.to_string()))
    }

    /// Insert a new `not_started` item. Requesting `urgent` takes the flag away
    /// from whichever item held it, in the same write.
    pub fn add_work_item(&self, new: NewWorkItem) -> Result<WorkItem> {
        paths::validate_id(&new.id)?;

        let mut items = self.load()?;
        if items.contains_key(&new.id) {
            return Err(SolokitError::WorkItemExists(new.id));
        }

        validator::validate_dependencies(&items, &new.id, &new.dependencies)
            .map_err(|errors| SolokitError::validation_with("Invalid dependencies", errors))?;

        if new.urgent {
            for other in items.values_mut().filter(|i| i.urgent) {
                tracing::warn!(from = %other.id, to = %new.id, "moving urgent flag");
                other.urgent = false;
                other.touch();
            }
        }

        let item = new.into_work_item();
        items.insert(item.id.clone(), item.clone());
        self.save(&items)?;
        Ok(item)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
