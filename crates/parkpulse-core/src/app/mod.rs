//! App - アプリケーション層
//!
//! ports を組み合わせて UI 向けの操作を提供します。
//!
//! # 主要コンポーネント
//! - **ParkPulseBuilder**: 設定の検証と ports のワイヤリング
//! - **ParkPulse**: レポート送信・ステータス取得・駐車場・ジオフェンス

pub mod builder;
pub mod service;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, ParkPulseBuilder};
pub use self::service::ParkPulse;
