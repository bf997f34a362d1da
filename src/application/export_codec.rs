//! Export document encoding.
//!
//! The checksum covers the compact JSON of `data` only, with the field order
//! fixed by the `ExportGroup`/`ExportItem` declarations.

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::domain::{
    AppError, ExportDocument, ExportGroup, Group, Result, APP_NAME, EXPORT_VERSION,
};

/// Builds an export document stamped with the current time.
///
/// # Errors
/// Returns error if the data cannot be serialized for the checksum.
pub fn export_data(groups: &[Group]) -> Result<ExportDocument> {
    export_data_at(groups, Utc::now())
}

/// Builds an export document stamped with `at`.
///
/// # Errors
/// Returns error if the data cannot be serialized for the checksum.
pub fn export_data_at(groups: &[Group], at: DateTime<Utc>) -> Result<ExportDocument> {
    let data: Vec<ExportGroup> = groups.iter().map(ExportGroup::from).collect();
    let checksum = compute_checksum(&data)?;

    Ok(ExportDocument {
        version: EXPORT_VERSION,
        exported_at: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        app_name: APP_NAME.to_string(),
        checksum,
        data,
    })
}

/// Lowercase hex SHA-256 of the compact JSON of `data`.
///
/// # Errors
/// Returns error if serialization fails.
pub fn compute_checksum(data: &[ExportGroup]) -> Result<String> {
    let canonical = serde_json::to_string(data).map_err(AppError::json_parse)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Document as written to files: two-space indented JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn to_pretty_json(doc: &ExportDocument) -> Result<String> {
    serde_json::to_string_pretty(doc).map_err(AppError::json_parse)
}

/// File name for a manual backup taken at `at`.
#[must_use]
pub fn backup_filename(at: DateTime<Utc>) -> String {
    format!("syncgrid-backup-{}.json", at.format("%Y-%m-%dT%H-%M-%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::fixtures::{item, nested};
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap()
    }

    #[test]
    fn test_checksum_of_empty_data() {
        assert_eq!(
            compute_checksum(&[]).unwrap(),
            "4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945"
        );
    }

    #[test]
    fn test_checksum_uses_compact_field_order() {
        let groups = vec![Group::new(
            "g1",
            "Work",
            "root",
            0,
            vec![item("i1", "GitHub", "https://github.com", "g1")],
        )];
        let doc = export_data_at(&groups, fixed_time()).unwrap();

        assert_eq!(
            serde_json::to_string(&doc.data).unwrap(),
            r#"[{"title":"Work","items":[{"title":"GitHub","url":"https://github.com"}],"children":[]}]"#
        );
        assert_eq!(
            doc.checksum,
            "0ff9044d2c00b7e60b556a3fd38868aab32178ab4d1cf4ebe94ecd11a3a53c14"
        );
    }

    #[test]
    fn test_document_header() {
        let doc = export_data_at(&nested(), fixed_time()).unwrap();

        assert_eq!(doc.version, 1);
        assert_eq!(doc.app_name, "SyncGrid");
        assert_eq!(doc.exported_at, "2025-03-04T05:06:07.000Z");
        assert_eq!(doc.group_count(), 4);
        assert_eq!(doc.item_count(), 4);
    }

    #[test]
    fn test_pretty_json_uses_camel_case() {
        let doc = export_data_at(&nested(), fixed_time()).unwrap();
        let json = to_pretty_json(&doc).unwrap();

        assert!(json.contains("\"exportedAt\": \"2025-03-04T05:06:07.000Z\""));
        assert!(json.contains("\"appName\": \"SyncGrid\""));
        assert!(json.starts_with("{\n  \"version\": 1,"));
    }

    #[test]
    fn test_backup_filename() {
        assert_eq!(
            backup_filename(fixed_time()),
            "syncgrid-backup-2025-03-04T05-06-07.json"
        );
    }
}
