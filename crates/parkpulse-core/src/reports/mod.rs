//! Reports - エリアごとのレポートログと永続化形式

pub mod codec;
mod log;

pub use self::log::{AppendOutcome, ReportLog};
