//! Bulk import summary models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A row that was skipped during import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RowFailure {
    /// 1-based line number in the uploaded file (the header is line 1).
    pub line: usize,
    pub reason: String,
}

/// Outcome of one import request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImportSummary {
    /// Rows persisted as books.
    pub rows_processed: usize,
    pub rows_failed: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<RowFailure>,
}

impl ImportSummary {
    pub fn record_success(&mut self) {
        self.rows_processed += 1;
    }

    pub fn record_failure(&mut self, line: usize, reason: impl Into<String>) {
        self.rows_failed += 1;
        self.failures.push(RowFailure {
            line,
            reason: reason.into(),
        });
    }
}
