//! Errors - エラー型と分類
//!
//! 検証エラーだけが呼び出し元に返る。永続化・レプリケーションの失敗は
//! ReportLog / replication 境界の内側でログに残して握りつぶす。

use thiserror::Error;

/// ErrorKind は運用上の分類
///
/// - Validation: 入力が不正（呼び出し元に返す）
/// - Persistence: ローカルストアの読み書き失敗（ログのみ）
/// - Replication: リモートへの送信失敗（ログのみ）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Persistence,
    Replication,
}

/// Errors surfaced to callers of the park-activity API.
#[derive(Debug, Error)]
pub enum ParkError {
    #[error("invalid activity level {0:?}: expected one of Light, Medium, Busy")]
    InvalidLevel(String),

    #[error("unknown area {0:?}")]
    UnknownArea(String),

    #[error("unknown parking lot {0:?}")]
    UnknownLot(String),

    #[error("unknown report type {0:?}: expected one of suspicious, hazard, maintenance, other, alert")]
    UnknownHazardKind(String),

    #[error("please provide a description")]
    EmptyDescription,

    #[error("an alert must name an area")]
    MissingArea,

    #[error("alert {alert:?} does not apply to {area}")]
    AlertNotApplicable { alert: String, area: String },
}

impl ParkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidLevel(_)
            | Self::UnknownArea(_)
            | Self::UnknownLot(_)
            | Self::UnknownHazardKind(_)
            | Self::EmptyDescription
            | Self::MissingArea
            | Self::AlertNotApplicable { .. } => ErrorKind::Validation,
        }
    }
}

/// Failure of the durable local store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("record codec error: {context}: {source}")]
    Codec {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Persistence
    }
}

/// Failure of a best-effort remote replication attempt.
#[derive(Debug, Error)]
pub enum ReplicationError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote rejected record with status {status}")]
    Rejected { status: u16 },

    #[error("replication timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl ReplicationError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Replication
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_classified() {
        assert_eq!(
            ParkError::InvalidLevel("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ParkError::UnknownArea("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(ParkError::EmptyDescription.kind(), ErrorKind::Validation);
        assert_eq!(ParkError::MissingArea.kind(), ErrorKind::Validation);
    }

    #[test]
    fn invalid_level_message_names_the_choices() {
        let msg = ParkError::InvalidLevel("packed".into()).to_string();
        assert!(msg.contains("packed"));
        assert!(msg.contains("Light, Medium, Busy"));
    }

    #[test]
    fn persistence_and_replication_errors_are_classified() {
        let store = StoreError::Unavailable("down".into());
        assert_eq!(store.kind(), ErrorKind::Persistence);
        let remote = ReplicationError::Rejected { status: 503 };
        assert_eq!(remote.kind(), ErrorKind::Replication);
        assert!(remote.to_string().contains("503"));
    }
}
