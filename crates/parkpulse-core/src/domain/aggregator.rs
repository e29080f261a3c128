//! StatusAggregator - レポートからエリアの現在ステータスを求める
//!
//! # 設計
//! - スナップショットに対する純粋な再計算（累積値は持たない）
//! - 重みは線形減衰: 経過 0 分で 1.0、decay_window で 0.0
//! - 加重平均 < 1.6 → Light、< 2.3 → Medium、それ以上 → Busy

use std::time::Duration;

use super::{ActivityLevel, ActivityReport};

const MS_PER_MINUTE: f64 = 60_000.0;

/// DecayPolicy は時間加重集計の窓としきい値
///
/// `retention` はログが保持する範囲、`decay_window` は重みが 0 になる経過時間。
/// どちらも既定は 45 分。
#[derive(Debug, Clone, PartialEq)]
pub struct DecayPolicy {
    pub retention: Duration,
    pub decay_window: Duration,
    /// Lowest weighted average that maps to Medium.
    pub medium_threshold: f64,
    /// Lowest weighted average that maps to Busy.
    pub busy_threshold: f64,
}

impl DecayPolicy {
    pub const DEFAULT_WINDOW: Duration = Duration::from_secs(45 * 60);
    pub const DEFAULT_MEDIUM_THRESHOLD: f64 = 1.6;
    pub const DEFAULT_BUSY_THRESHOLD: f64 = 2.3;

    pub fn decay_window_ms(&self) -> i64 {
        duration_ms(self.decay_window)
    }

    /// Linear decay: 1.0 at age 0, 0.0 at `decay_window` and beyond.
    ///
    /// Negative ages (reports stamped after `now`) count as age 0.
    pub fn weight(&self, age_minutes: f64) -> f64 {
        let window_minutes = self.decay_window_ms() as f64 / MS_PER_MINUTE;
        if window_minutes <= 0.0 {
            return 0.0;
        }
        (1.0 - age_minutes.max(0.0) / window_minutes).max(0.0)
    }

    /// Bucket a weighted average. Each bucket is inclusive on its lower bound.
    pub fn classify(&self, weighted_average: f64) -> ActivityLevel {
        if weighted_average < self.medium_threshold {
            ActivityLevel::Light
        } else if weighted_average < self.busy_threshold {
            ActivityLevel::Medium
        } else {
            ActivityLevel::Busy
        }
    }
}

impl Default for DecayPolicy {
    fn default() -> Self {
        Self {
            retention: Self::DEFAULT_WINDOW,
            decay_window: Self::DEFAULT_WINDOW,
            medium_threshold: Self::DEFAULT_MEDIUM_THRESHOLD,
            busy_threshold: Self::DEFAULT_BUSY_THRESHOLD,
        }
    }
}

fn duration_ms(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

/// StatusAggregator はスナップショットをステータスに変換
///
/// # 純粋性
/// - 同じレポートと `now_ms` なら同じ結果
/// - I/O も内部状態も持たない
pub trait StatusAggregator: Send + Sync {
    fn compute_status(&self, reports: &[ActivityReport], now_ms: i64) -> ActivityLevel;
}

/// TimeDecayAggregator は線形減衰の加重平均
#[derive(Debug, Clone, Default)]
pub struct TimeDecayAggregator {
    policy: DecayPolicy,
}

impl TimeDecayAggregator {
    pub fn new(policy: DecayPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &DecayPolicy {
        &self.policy
    }

    /// `Σ(score × weight) / Σ weight`, or `None` when there is no signal
    /// (no reports, or every weight clamped to zero).
    pub fn weighted_average(&self, reports: &[ActivityReport], now_ms: i64) -> Option<f64> {
        let (weighted_sum, weight_total) =
            reports
                .iter()
                .fold((0.0_f64, 0.0_f64), |(sum, total), report| {
                    let weight = self.policy.weight(report.age_minutes(now_ms));
                    (sum + report.level().score() * weight, total + weight)
                });

        if weight_total <= 0.0 {
            return None;
        }
        Some(weighted_sum / weight_total)
    }
}

impl StatusAggregator for TimeDecayAggregator {
    fn compute_status(&self, reports: &[ActivityReport], now_ms: i64) -> ActivityLevel {
        match self.weighted_average(reports, now_ms) {
            Some(avg) => self.policy.classify(avg),
            None => ActivityLevel::Light,
        }
    }
}
