//! Upload validation and the upload record type.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::mapping::ColumnMapping;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];
pub const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;
/// Preview rows retained per upload.
pub const SAMPLE_ROW_LIMIT: usize = 10;

/// Recognized upload formats. Only CSV is previewed locally; spreadsheet
/// preview is delegated to the remote engine when one is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Spreadsheet,
}

/// A received file: identity, parsed header row, and sample rows. Exactly one
/// record is "current" per session; the next upload supersedes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: String,
    pub filename: String,
    pub stored_path: PathBuf,
    pub size_bytes: u64,
    /// Header order is significant.
    pub columns: Vec<String>,
    pub sample_rows: Vec<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_mapping: Option<ColumnMapping>,
    pub uploaded_at: DateTime<Utc>,
}

/// Validate an upload's extension and declared size.
///
/// # Errors
///
/// Returns [`CoreError::InvalidFileType`] for extensions outside the
/// allow-list and [`CoreError::FileTooLarge`] past the 25 MB cap.
pub fn validate_upload(filename: &str, size: u64, max_bytes: u64) -> Result<FileKind, CoreError> {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let kind = match ext.as_str() {
        "csv" => FileKind::Csv,
        "xlsx" | "xls" => FileKind::Spreadsheet,
        _ => return Err(CoreError::InvalidFileType(ext)),
    };

    if size > max_bytes {
        return Err(CoreError::FileTooLarge {
            size,
            max: max_bytes,
        });
    }

    Ok(kind)
}

/// Reduce an uploaded filename to a storage-safe form: anything outside
/// `[A-Za-z0-9._-]` becomes an underscore.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_and_spreadsheet_extensions_are_accepted() {
        assert_eq!(
            validate_upload("sales.csv", 1024, MAX_UPLOAD_BYTES).expect("csv"),
            FileKind::Csv
        );
        assert_eq!(
            validate_upload("sales.XLSX", 1024, MAX_UPLOAD_BYTES).expect("xlsx"),
            FileKind::Spreadsheet
        );
        assert_eq!(
            validate_upload("legacy.xls", 1024, MAX_UPLOAD_BYTES).expect("xls"),
            FileKind::Spreadsheet
        );
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = validate_upload("report.pdf", 10, MAX_UPLOAD_BYTES).expect_err("reject");
        assert!(matches!(err, CoreError::InvalidFileType(ref ext) if ext == "pdf"));
    }

    #[test]
    fn missing_extension_is_rejected() {
        assert!(validate_upload("README", 10, MAX_UPLOAD_BYTES).is_err());
    }

    #[test]
    fn oversized_file_is_rejected() {
        let err =
            validate_upload("big.csv", MAX_UPLOAD_BYTES + 1, MAX_UPLOAD_BYTES).expect_err("reject");
        assert!(matches!(err, CoreError::FileTooLarge { .. }));
    }

    #[test]
    fn size_at_exactly_the_cap_is_accepted() {
        assert!(validate_upload("edge.csv", MAX_UPLOAD_BYTES, MAX_UPLOAD_BYTES).is_ok());
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(
            sanitize_filename("Q3 Sales (final).csv"),
            "Q3_Sales__final_.csv"
        );
        assert_eq!(sanitize_filename("já-done.xlsx"), "j_-done.xlsx");
    }
}
