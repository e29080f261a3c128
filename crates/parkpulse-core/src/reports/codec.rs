//! Codec - エリアごとのレポートログの永続化形式
//!
//! エリアはストレージキーで決まるので、レコードは id・level・時刻だけを持つ。
//! ドキュメントにはバージョンがあり、知らない新しいバージョンは
//! 誤読せず「データなし」として扱う。

use serde::{Deserialize, Serialize};

use crate::domain::{ActivityLevel, ActivityReport, AreaKind, ReportId, StoreError};

/// 永続化形式の現行バージョン
pub const REPORT_LOG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredReport {
    id: ReportId,
    level: ActivityLevel,
    observed_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredLog {
    version: u32,
    #[serde(default)]
    reports: Vec<StoredReport>,
}

pub fn encode(reports: &[ActivityReport]) -> Result<Vec<u8>, StoreError> {
    let doc = StoredLog {
        version: REPORT_LOG_VERSION,
        reports: reports
            .iter()
            .map(|r| StoredReport {
                id: r.id(),
                level: r.level(),
                observed_at: r.observed_at_ms(),
            })
            .collect(),
    };
    serde_json::to_vec(&doc).map_err(|source| StoreError::Codec {
        context: "encoding report log".to_string(),
        source,
    })
}

/// Decode a stored log for `area`.
///
/// `Ok(None)` means the document is from a newer format version.
pub fn decode(area: AreaKind, bytes: &[u8]) -> Result<Option<Vec<ActivityReport>>, StoreError> {
    let doc: StoredLog = serde_json::from_slice(bytes).map_err(|source| StoreError::Codec {
        context: format!("decoding report log for {area}"),
        source,
    })?;

    if doc.version > REPORT_LOG_VERSION {
        return Ok(None);
    }

    let mut reports: Vec<ActivityReport> = doc
        .reports
        .into_iter()
        .map(|r| ActivityReport::new(r.id, area, r.level, r.observed_at))
        .collect();
    // Hand-edited or merged files may be out of order.
    reports.sort_by_key(ActivityReport::observed_at_ms);
    Ok(Some(reports))
}
