//! Multipart upload form shared by the upload and batch endpoints.

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;

use crate::api::error::ApiError;
use crate::config::IntakeConfig;
use crate::pipeline::import::{validate_upload, UploadedFile};

const MAX_SHOP_ID_LEN: usize = 64;

/// Parsed `multipart/form-data` upload.
#[derive(Debug)]
pub struct UploadForm {
    pub shop_id: String,
    pub files: Vec<UploadedFile>,
    /// Explicit `segment` field; `None` means use the configured default.
    pub segment: Option<bool>,
}

impl UploadForm {
    /// (file name, bytes) pairs in upload order.
    pub fn into_documents(self) -> (String, Vec<(String, Vec<u8>)>) {
        let documents = self
            .files
            .into_iter()
            .map(|f| (f.file_name, f.bytes))
            .collect();
        (self.shop_id, documents)
    }
}

/// Read and validate the form. Missing shop id or files are rejected
/// before anything is analyzed.
pub async fn read_upload_form(
    mut multipart: Multipart,
    config: &IntakeConfig,
) -> Result<UploadForm, ApiError> {
    let mut shop_id: Option<String> = None;
    let mut segment: Option<bool> = None;
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "shop_id" => {
                let text = field.text().await.map_err(multipart_error)?;
                shop_id = Some(text.trim().to_string());
            }
            "segment" => {
                let text = field.text().await.map_err(multipart_error)?;
                segment = Some(parse_flag(&text)?);
            }
            "file" | "files" | "file[]" => {
                if files.len() >= config.max_files {
                    return Err(ApiError::BadRequest(format!(
                        "At most {} files per request",
                        config.max_files
                    )));
                }
                let file_name = field.file_name().unwrap_or("document.pdf").to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                files.push(validate_upload(&file_name, bytes.to_vec(), config.max_upload_bytes)?);
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    let shop_id = shop_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("shop_id is required".into()))?;
    if !valid_shop_id(&shop_id) {
        return Err(ApiError::BadRequest(format!("Invalid shop_id: {shop_id}")));
    }
    if files.is_empty() {
        return Err(ApiError::BadRequest("At least one file is required".into()));
    }

    Ok(UploadForm {
        shop_id,
        files,
        segment,
    })
}

/// Shop ids name storage directories: ASCII alphanumerics, `-` and `_`.
pub fn valid_shop_id(shop_id: &str) -> bool {
    !shop_id.is_empty()
        && shop_id.len() <= MAX_SHOP_ID_LEN
        && shop_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn parse_flag(raw: &str) -> Result<bool, ApiError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ApiError::BadRequest(format!("Invalid segment flag: {other}"))),
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(format!("Malformed upload: {}", err.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shop_id_charset() {
        assert!(valid_shop_id("shop-1"));
        assert!(valid_shop_id("ACME_Motors"));
        assert!(!valid_shop_id(""));
        assert!(!valid_shop_id("../etc"));
        assert!(!valid_shop_id("shop 1"));
        assert!(!valid_shop_id(&"x".repeat(65)));
    }

    #[test]
    fn segment_flag_values() {
        assert!(parse_flag("true").unwrap());
        assert!(parse_flag(" 1 ").unwrap());
        assert!(!parse_flag("FALSE").unwrap());
        assert!(!parse_flag("off").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
