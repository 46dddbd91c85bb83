//! Upload registry: validates incoming files, persists them under the
//! configured directory, and builds the preview used for column mapping.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::Utc;
use seglens_core::mapping;
use seglens_core::upload::{
    sanitize_filename, validate_upload, FileKind, UploadRecord, SAMPLE_ROW_LIMIT,
};
use uuid::Uuid;

use crate::StoreError;

/// Durable storage for raw uploads.
#[derive(Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: u64,
}

impl UploadStore {
    #[must_use]
    pub fn new(dir: PathBuf, max_bytes: u64) -> Self {
        Self { dir, max_bytes }
    }

    /// Accept an uploaded file: validate, persist, and parse a CSV preview.
    ///
    /// Preview parsing is best-effort: a CSV that cannot be parsed still
    /// produces a valid record with an empty preview. Spreadsheet formats get
    /// no local preview at all; the caller may enrich the record through the
    /// remote engine.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Domain`] for an invalid type or oversized file
    /// and [`StoreError::Io`] if the file cannot be persisted.
    pub async fn receive(
        &self,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<UploadRecord, StoreError> {
        let kind = validate_upload(original_name, bytes.len() as u64, self.max_bytes)
            .map_err(StoreError::Domain)?;

        let id = format!("upload_{}", Uuid::new_v4().simple());
        let stored_name = format!("{id}_{}", sanitize_filename(original_name));
        let stored_path = self.dir.join(stored_name);

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&stored_path, bytes).await?;

        let (columns, sample_rows) = match kind {
            FileKind::Csv => match csv_preview(bytes) {
                Ok(preview) => preview,
                Err(e) => {
                    tracing::warn!(error = %e, filename = original_name, "csv preview failed");
                    (Vec::new(), Vec::new())
                }
            },
            FileKind::Spreadsheet => (Vec::new(), Vec::new()),
        };

        let suggested_mapping = if columns.is_empty() {
            None
        } else {
            Some(mapping::suggest(&columns))
        };

        Ok(UploadRecord {
            id,
            filename: original_name.to_string(),
            stored_path,
            size_bytes: bytes.len() as u64,
            columns,
            sample_rows,
            suggested_mapping,
            uploaded_at: Utc::now(),
        })
    }

    /// Read back a persisted upload for forwarding to the engine.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the stored file is gone or unreadable.
    pub async fn read_stored(&self, record: &UploadRecord) -> Result<Vec<u8>, StoreError> {
        Ok(tokio::fs::read(&record.stored_path).await?)
    }
}

type Preview = (Vec<String>, Vec<HashMap<String, String>>);

/// Parse the header row and up to [`SAMPLE_ROW_LIMIT`] sample rows.
fn csv_preview(bytes: &[u8]) -> Result<Preview, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);

    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut sample_rows = Vec::new();
    for record in reader.records().take(SAMPLE_ROW_LIMIT) {
        let record = record?;
        let row: HashMap<String, String> = columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                (
                    col.clone(),
                    record.get(i).unwrap_or_default().trim().to_string(),
                )
            })
            .collect();
        sample_rows.push(row);
    }

    Ok((columns, sample_rows))
}
