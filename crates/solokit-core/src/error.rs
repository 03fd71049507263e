use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolokitError {
    #[error("work item store not found at {}: run 'sk init'", .0.display())]
    StoreNotFound(PathBuf),

    #[error("work item not found: {0}")]
    WorkItemNotFound(String),

    #[error("work item already exists: {0}")]
    WorkItemExists(String),

    #[error("invalid work item id '{0}': must be lowercase alphanumeric with '_' or '-'")]
    InvalidId(String),

    #[error("{message}{}", format_details(.errors))]
    Validation {
        message: String,
        errors: Vec<String>,
    },

    #[error("corrupt data in {}: {source}", .path.display())]
    CorruptData {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn format_details(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    for e in errors {
        out.push_str("\n  - ");
        out.push_str(e);
    }
    out
}

/// Coarse error taxonomy used for exit codes and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    AlreadyExists,
    Validation,
    CorruptData,
    Io,
}

impl SolokitError {
    pub fn validation(message: impl Into<String>) -> Self {
        SolokitError::Validation {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn validation_with(message: impl Into<String>, errors: Vec<String>) -> Self {
        SolokitError::Validation {
            message: message.into(),
            errors,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SolokitError::StoreNotFound(_) | SolokitError::WorkItemNotFound(_) => {
                ErrorCategory::NotFound
            }
            SolokitError::WorkItemExists(_) => ErrorCategory::AlreadyExists,
            SolokitError::InvalidId(_) | SolokitError::Validation { .. } => {
                ErrorCategory::Validation
            }
            SolokitError::CorruptData { .. } => ErrorCategory::CorruptData,
            SolokitError::Io(_) | SolokitError::Json(_) => ErrorCategory::Io,
        }
    }

    /// Process exit code for this error's category.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Validation => 2,
            ErrorCategory::NotFound => 3,
            ErrorCategory::AlreadyExists => 4,
            ErrorCategory::CorruptData => 5,
            ErrorCategory::Io => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, SolokitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_lists_details() {
        let err = SolokitError::validation_with(
            "No changes to update",
            vec!["dependency 'b' is already present".to_string()],
        );
        let msg = err.to_string();
        assert!(msg.starts_with("No changes to update"));
        assert!(msg.contains("  - dependency 'b' is already present"));
    }

    #[test]
    fn categories_map_to_exit_codes() {
        assert_eq!(SolokitError::WorkItemNotFound("x".into()).exit_code(), 3);
        assert_eq!(SolokitError::WorkItemExists("x".into()).exit_code(), 4);
        assert_eq!(SolokitError::validation("nope").exit_code(), 2);
        assert_eq!(
            SolokitError::StoreNotFound(PathBuf::from("a")).category(),
            ErrorCategory::NotFound
        );
    }
}
