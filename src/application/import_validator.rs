//! Import validation and sanitization.
//!
//! Untrusted documents go through a fixed pipeline: size, parse, shape,
//! structure, URL allow-list, checksum, then sanitization. The first failing
//! stage rejects the whole document.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{
    AppError, ExportDocument, ExportGroup, ExportItem, ImportRejection, Result, APP_NAME,
    EXPORT_VERSION,
};

use super::export_codec::compute_checksum;

/// Largest accepted input in bytes.
pub const MAX_IMPORT_SIZE: usize = 10 * 1024 * 1024;
pub const MAX_TITLE_LENGTH: usize = 512;
pub const MAX_URL_LENGTH: usize = 2048;
pub const MAX_EXPORTED_AT_LENGTH: usize = 64;
/// Deepest accepted folder nesting; top-level folders are depth 0.
pub const MAX_DEPTH: usize = 10;

const ALLOWED_SCHEMES: [&str; 6] = ["http", "https", "ftp", "chrome", "chrome-extension", "file"];

/// Longest URL quoted back in a rejection.
const REJECTED_URL_PREVIEW: usize = 100;

/// A document that passed every import check.
///
/// Only [`validate_import`] builds one. It is not `Clone`: a restore consumes
/// it.
#[derive(Debug, PartialEq, Eq)]
pub struct SanitizedDocument(ExportDocument);

impl SanitizedDocument {
    #[must_use]
    pub const fn document(&self) -> &ExportDocument {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> ExportDocument {
        self.0
    }
}

/// Validates and sanitizes an untrusted export document.
///
/// The returned document keeps the checksum from the input.
///
/// # Errors
/// Returns the first `ImportRejection` hit by the pipeline.
pub fn validate_import(input: &str) -> std::result::Result<SanitizedDocument, ImportRejection> {
    if input.len() > MAX_IMPORT_SIZE {
        return Err(ImportRejection::TooLarge {
            size: input.len(),
            limit: MAX_IMPORT_SIZE,
        });
    }

    let value: Value =
        serde_json::from_str(input).map_err(|e| ImportRejection::Malformed(e.to_string()))?;

    let obj = value
        .as_object()
        .ok_or(ImportRejection::Shape("top level is not an object"))?;

    if !is_current_version(obj.get("version")) {
        return Err(ImportRejection::Shape("unsupported version"));
    }
    if obj.get("appName").and_then(Value::as_str) != Some(APP_NAME) {
        return Err(ImportRejection::Shape("not a SyncGrid document"));
    }
    let checksum = obj
        .get("checksum")
        .and_then(Value::as_str)
        .ok_or(ImportRejection::Shape("checksum is not a string"))?;
    let data = obj
        .get("data")
        .filter(|d| d.is_array())
        .ok_or(ImportRejection::Shape("data is not an array"))?;

    if let Some(groups) = data.as_array() {
        for group in groups {
            check_structure(group, 0)?;
        }
    }

    let groups = Vec::<ExportGroup>::deserialize(data)
        .map_err(|e| ImportRejection::Malformed(e.to_string()))?;

    check_urls(&groups)?;

    let expected =
        compute_checksum(&groups).map_err(|e| ImportRejection::Malformed(e.to_string()))?;
    if expected != checksum {
        tracing::debug!(expected, found = checksum, "Import checksum mismatch");
        return Err(ImportRejection::ChecksumMismatch);
    }

    let exported_at = obj
        .get("exportedAt")
        .and_then(Value::as_str)
        .map_or_else(String::new, |s| sanitize_text(s, MAX_EXPORTED_AT_LENGTH));

    Ok(SanitizedDocument(ExportDocument {
        version: EXPORT_VERSION,
        exported_at,
        app_name: APP_NAME.to_string(),
        checksum: checksum.to_string(),
        data: sanitize_groups(groups),
    }))
}

/// Reads an import file, refusing oversized files before reading them.
///
/// # Errors
/// Returns `ImportRejected(TooLarge)` for oversized files and an IO error if
/// the file cannot be read.
pub fn read_import_file(path: &Path) -> Result<String> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| AppError::io(format!("Failed to stat {}", path.display()), e))?;

    let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
    if size > MAX_IMPORT_SIZE {
        return Err(ImportRejection::TooLarge {
            size,
            limit: MAX_IMPORT_SIZE,
        }
        .into());
    }

    std::fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read {}", path.display()), e))
}

fn is_current_version(version: Option<&Value>) -> bool {
    version
        .and_then(Value::as_f64)
        .is_some_and(|v| (v - f64::from(EXPORT_VERSION)).abs() < f64::EPSILON)
}

fn check_structure(group: &Value, depth: usize) -> std::result::Result<(), ImportRejection> {
    if depth > MAX_DEPTH {
        return Err(ImportRejection::Structure("folders nested more than 10 levels deep"));
    }

    let obj = group
        .as_object()
        .ok_or(ImportRejection::Structure("folder is not an object"))?;

    if !obj.get("title").is_some_and(Value::is_string) {
        return Err(ImportRejection::Structure("folder title is not a string"));
    }
    let items = obj
        .get("items")
        .and_then(Value::as_array)
        .ok_or(ImportRejection::Structure("folder items is not an array"))?;
    let children = obj
        .get("children")
        .and_then(Value::as_array)
        .ok_or(ImportRejection::Structure("folder children is not an array"))?;

    for item in items {
        let fields = item
            .as_object()
            .ok_or(ImportRejection::Structure("item is not an object"))?;
        let strings = fields.get("title").is_some_and(Value::is_string)
            && fields.get("url").is_some_and(Value::is_string);
        if !strings {
            return Err(ImportRejection::Structure("item title or url is not a string"));
        }
    }

    for child in children {
        check_structure(child, depth + 1)?;
    }

    Ok(())
}

fn check_urls(groups: &[ExportGroup]) -> std::result::Result<(), ImportRejection> {
    for group in groups {
        if let Some(bad) = group.items.iter().find(|item| !is_allowed_url(&item.url)) {
            let preview: String = bad.url.chars().take(REJECTED_URL_PREVIEW).collect();
            return Err(ImportRejection::UnsafeUrl(preview));
        }
        check_urls(&group.children)?;
    }
    Ok(())
}

/// Whether `url` parses and uses an allowed scheme.
#[must_use]
pub fn is_allowed_url(url: &str) -> bool {
    url::Url::parse(url).is_ok_and(|u| ALLOWED_SCHEMES.contains(&u.scheme()))
}

const fn is_stripped_control(c: char) -> bool {
    matches!(
        c,
        '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{7f}'
    )
}

/// Drops control characters (tab, LF and CR survive) and truncates to
/// `max_chars` characters.
fn sanitize_text(s: &str, max_chars: usize) -> String {
    s.chars()
        .filter(|c| !is_stripped_control(*c))
        .take(max_chars)
        .collect()
}

fn sanitize_groups(groups: Vec<ExportGroup>) -> Vec<ExportGroup> {
    groups
        .into_iter()
        .map(|group| ExportGroup {
            title: sanitize_text(&group.title, MAX_TITLE_LENGTH),
            items: group
                .items
                .into_iter()
                .map(|item| ExportItem {
                    title: sanitize_text(&item.title, MAX_TITLE_LENGTH),
                    url: sanitize_text(&item.url, MAX_URL_LENGTH),
                })
                .filter(|item| is_allowed_url(&item.url))
                .collect(),
            children: sanitize_groups(group.children),
        })
        .collect()
}
