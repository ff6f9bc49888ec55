//! Supporting-document constants, validation, and storage-key derivation.
//!
//! Storage keys are derived only from ids and a vetted extension. The
//! user-supplied file name is kept as display metadata and never becomes
//! part of an object-store path.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::EntityId;
use crate::validation::FieldErrors;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum accepted upload size (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Longest display file name kept on a document record.
pub const MAX_FILE_NAME_CHARS: usize = 255;

/// Longest extension accepted from a file name.
const MAX_EXTENSION_CHARS: usize = 8;

/// Known MIME types and the extension used in their storage keys.
const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("application/pdf", "pdf"),
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/heic", "heic"),
    ("text/plain", "txt"),
    ("application/msword", "doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
];

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

/// Allow-listed kinds of supporting document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Id,
    UtilityBill,
    MedicalRecord,
    IncomeVerification,
    EvictionNotice,
    Other,
}

impl DocumentType {
    pub const ALL: [DocumentType; 6] = [
        Self::Id,
        Self::UtilityBill,
        Self::MedicalRecord,
        Self::IncomeVerification,
        Self::EvictionNotice,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::UtilityBill => "utility_bill",
            Self::MedicalRecord => "medical_record",
            Self::IncomeVerification => "income_verification",
            Self::EvictionNotice => "eviction_notice",
            Self::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Id => "Photo ID",
            Self::UtilityBill => "Utility Bill",
            Self::MedicalRecord => "Medical Record",
            Self::IncomeVerification => "Income Verification",
            Self::EvictionNotice => "Eviction Notice",
            Self::Other => "Other",
        }
    }

    /// Parse a document type against the allow-list.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|t| t.as_str()).collect();
                CoreError::Validation(format!(
                    "Invalid document type '{s}'. Must be one of: {allowed:?}"
                ))
            })
    }
}

impl TryFrom<String> for DocumentType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject empty and oversized uploads before any storage call is made.
pub fn validate_upload_size(size_bytes: u64) -> Result<(), FieldErrors> {
    if size_bytes == 0 {
        return Err(FieldErrors::single("file", "The file is empty"));
    }
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(FieldErrors::single(
            "file",
            format!(
                "The file is {size_bytes} bytes; the maximum is {MAX_UPLOAD_BYTES} bytes (10 MiB)"
            ),
        ));
    }
    Ok(())
}

/// Reduce a client-supplied file name to a display name: the last path
/// component, without control characters, bounded in length.
pub fn display_file_name(raw: &str) -> String {
    let last = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = last
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_FILE_NAME_CHARS)
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "document".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Normalize a declared content type (`"Image/PNG; charset=x"` -> `"image/png"`).
pub fn normalize_mime_type(raw: &str) -> String {
    let base = raw.split(';').next().unwrap_or_default().trim();
    if base.is_empty() {
        "application/octet-stream".to_string()
    } else {
        base.to_ascii_lowercase()
    }
}

// ---------------------------------------------------------------------------
// Storage keys
// ---------------------------------------------------------------------------

/// Extension for a storage key: from the MIME type when known, otherwise a
/// sanitized extension of the file name.
pub fn storage_extension(mime_type: &str, file_name: &str) -> Option<String> {
    let mime = normalize_mime_type(mime_type);
    if let Some((_, ext)) = MIME_EXTENSIONS.iter().find(|(m, _)| *m == mime) {
        return Some((*ext).to_string());
    }

    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    let ext = ext.to_ascii_lowercase();
    let valid = !ext.is_empty()
        && ext.len() <= MAX_EXTENSION_CHARS
        && ext.bytes().all(|b| b.is_ascii_alphanumeric());
    valid.then_some(ext)
}

/// Object-store key for a document: `needs/{need_id}/documents/{document_id}[.ext]`.
pub fn storage_key(
    need_id: EntityId,
    document_id: EntityId,
    mime_type: &str,
    file_name: &str,
) -> String {
    match storage_extension(mime_type, file_name) {
        Some(ext) => format!("needs/{need_id}/documents/{document_id}.{ext}"),
        None => format!("needs/{need_id}/documents/{document_id}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
