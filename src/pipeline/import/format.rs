use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ImportError;

/// Broad categories of uploaded repair-order files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    DigitalPdf,
    ScannedPdf,
    Unsupported,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DigitalPdf => "digital_pdf",
            Self::ScannedPdf => "scanned_pdf",
            Self::Unsupported => "unsupported",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

/// An upload that passed format checks, ready for the batch.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub category: FileCategory,
    pub bytes: Vec<u8>,
}

/// Detect the category from magic bytes, not the file extension.
pub fn detect_category(bytes: &[u8]) -> FileCategory {
    if !bytes.starts_with(b"%PDF") {
        return FileCategory::Unsupported;
    }
    if has_text_layer(bytes) {
        FileCategory::DigitalPdf
    } else {
        FileCategory::ScannedPdf
    }
}

/// Validate one uploaded file: non-empty, under the size limit, a PDF, not
/// encrypted. Scanned PDFs are accepted; they simply yield no text.
pub fn validate_upload(
    original_name: &str,
    bytes: Vec<u8>,
    max_bytes: usize,
) -> Result<UploadedFile, ImportError> {
    let file_name = sanitize_filename(original_name);

    if bytes.is_empty() {
        return Err(ImportError::EmptyFile(file_name));
    }
    if bytes.len() > max_bytes {
        return Err(ImportError::FileTooLarge {
            size_mb: bytes.len() as f64 / (1024.0 * 1024.0),
            max_mb: (max_bytes / (1024 * 1024)) as u64,
        });
    }

    let category = detect_category(&bytes);
    if !category.is_supported() {
        return Err(ImportError::UnsupportedFormat(file_name));
    }
    if is_encrypted(&bytes) {
        return Err(ImportError::EncryptedPdf);
    }
    if category == FileCategory::ScannedPdf {
        tracing::warn!(file = %file_name, "PDF has no text layer, fields will be empty");
    }

    tracing::debug!(file = %file_name, category = category.as_str(), size = bytes.len(), "Upload accepted");
    Ok(UploadedFile {
        file_name,
        category,
        bytes,
    })
}

/// Heuristic: three or more text operators in the first 256KB suggests a
/// digital PDF with a text layer.
fn has_text_layer(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(256 * 1024)];
    let content = String::from_utf8_lossy(head);
    let text_markers = ["BT", "ET", " Tj", " TJ", " Tf"];
    let marker_count: usize = text_markers
        .iter()
        .map(|m| content.matches(m).count())
        .sum();
    marker_count >= 3
}

fn is_encrypted(bytes: &[u8]) -> bool {
    bytes.windows(b"/Encrypt".len()).any(|w| w == b"/Encrypt")
}

/// Sanitize a filename: strip path components, limit length.
pub fn sanitize_filename(original: &str) -> String {
    let name = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document.pdf");

    let clean: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0') && !c.is_control())
        .take(255)
        .collect();

    if clean.trim().is_empty() {
        "document.pdf".to_string()
    } else {
        clean
    }
}
