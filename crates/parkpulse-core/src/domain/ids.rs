//! ReportId - レポート ID
//!
//! ULID ベースの ID。timestamp が先頭にあるので生成順にソートできる。
//! 編集・削除の操作はないので、ID は記録用でしかない。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// ReportId は混雑度レポート・危険報告の ID
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(Ulid);

impl ReportId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Milliseconds since epoch encoded in the id.
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl From<Ulid> for ReportId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "report-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_has_prefix() {
        let id = ReportId::from(Ulid::new());
        assert!(id.to_string().starts_with("report-"));
    }

    #[test]
    fn serializes_as_bare_ulid_string() {
        let ulid = Ulid::new();
        let id = ReportId::from_ulid(ulid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{ulid}\""));
        let back: ReportId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
