//! Domain - ドメインモデル
//!
//! # 含まれる型
//! - **AreaKind / ActivityLevel / ActivityReport**: レポートの構成要素
//! - **StatusAggregator**: 時間加重でステータスを求める純粋関数
//! - **errors**: エラー型と分類

pub mod aggregator;
pub mod area;
pub mod errors;
pub mod ids;
pub mod level;
pub mod report;

pub use self::aggregator::{DecayPolicy, StatusAggregator, TimeDecayAggregator};
pub use self::area::AreaKind;
pub use self::errors::{ErrorKind, ParkError, ReplicationError, StoreError};
pub use self::ids::ReportId;
pub use self::level::ActivityLevel;
pub use self::report::ActivityReport;
