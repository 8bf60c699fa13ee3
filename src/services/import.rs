//! Bulk book import service

use std::sync::Arc;

use crate::{
    config::ImportConfig,
    error::{AppError, AppResult},
    import::{check_format, parse_books},
    models::import_report::ImportSummary,
    repository::CatalogStore,
};

#[derive(Clone)]
pub struct ImportService {
    store: Arc<dyn CatalogStore>,
    id_offset: i32,
}

impl ImportService {
    pub fn new(store: Arc<dyn CatalogStore>, config: &ImportConfig) -> Self {
        Self {
            store,
            id_offset: config.id_offset,
        }
    }

    /// Import books from an uploaded CSV file.
    ///
    /// Only a rejected file fails the whole request. Rows that do not parse or
    /// cannot be inserted are counted in the summary and skipped.
    #[tracing::instrument(skip(self, content), fields(bytes = content.len()))]
    pub async fn import_books(&self, content: &[u8], filename: &str) -> AppResult<ImportSummary> {
        check_format(filename)?;
        let text = std::str::from_utf8(content)
            .map_err(|_| AppError::UnsupportedFormat(format!("'{}' is not UTF-8 text", filename)))?;

        tracing::info!("Importing books from {}", filename);

        let batch = parse_books(text, self.id_offset);
        let mut summary = ImportSummary::default();

        for failure in batch.failures {
            tracing::warn!(line = failure.line, "Skipping row: {}", failure.reason);
            summary.record_failure(failure.line, failure.reason);
        }

        for (line, book) in batch.books {
            match self.store.insert_book(&book).await {
                Ok(created) => {
                    tracing::debug!(line, id = created.id, "Inserted {}", created.title);
                    summary.record_success();
                }
                Err(e) => {
                    tracing::warn!(line, id = book.id, "Failed to insert row: {}", e);
                    summary.record_failure(line, e.to_string());
                }
            }
        }

        summary.failures.sort_by_key(|f| f.line);

        tracing::info!(
            rows_processed = summary.rows_processed,
            rows_failed = summary.rows_failed,
            "Import finished"
        );

        Ok(summary)
    }
}
