//! Per-item results for commands that act on several resources.
//!
//! One failing item does not stop the rest; the outcome keeps successes and
//! error messages side by side and reports failure overall if any item failed.

use serde::Serialize;

use crate::error_utils::innermost_message;
use crate::format::{format_rows, CsvRecordProducer, Formattable, FormattingError, OutputFormat};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchItem<T> {
    Ok { id: String, value: T },
    Failed { id: String, error: String },
}

impl<T> BatchItem<T> {
    pub fn id(&self) -> &str {
        match self {
            BatchItem::Ok { id, .. } | BatchItem::Failed { id, .. } => id,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, BatchItem::Ok { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome<T> {
    pub items: Vec<BatchItem<T>>,
}

impl<T> Default for BatchOutcome<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> BatchOutcome<T> {
    pub fn push<E: std::error::Error>(&mut self, id: impl Into<String>, result: Result<T, E>) {
        let id = id.into();
        let item = match result {
            Ok(value) => BatchItem::Ok { id, value },
            Err(e) => {
                let error = innermost_message(&e);
                tracing::warn!("{}: {}", id, error);
                BatchItem::Failed { id, error }
            }
        };
        self.items.push(item);
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// One row per item; successful values are embedded as JSON.
impl<T: Serialize> CsvRecordProducer for BatchOutcome<T> {
    fn csv_header(&self) -> Vec<String> {
        vec![
            "ID".to_string(),
            "STATUS".to_string(),
            "VALUE".to_string(),
            "ERROR".to_string(),
        ]
    }

    fn as_csv_records(&self) -> Vec<Vec<String>> {
        self.items
            .iter()
            .map(|item| match item {
                BatchItem::Ok { id, value } => vec![
                    id.clone(),
                    "ok".to_string(),
                    serde_json::to_string(value).unwrap_or_default(),
                    String::new(),
                ],
                BatchItem::Failed { id, error } => {
                    vec![id.clone(), "failed".to_string(), String::new(), error.clone()]
                }
            })
            .collect()
    }
}

impl<T: Serialize> Formattable for BatchOutcome<T> {
    fn format(&self, f: &OutputFormat) -> Result<String, FormattingError> {
        format_rows(self, f)
    }
}
