//! ParkPulse - UI 向けの公開インターフェース
//!
//! # フロー
//! 1. submit: 入力検証 → ReportLog に追記（prune + 永続化）→ リモート複製を spawn
//! 2. status: スナップショットを取って毎回ゼロから集計（キャッシュしない）

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::{
    ActivityLevel, ActivityReport, AreaKind, ParkError, ReplicationError, ReportId,
    StatusAggregator, TimeDecayAggregator,
};
use crate::geo::{GeoPoint, Geofence, haversine_km};
use crate::hazards::{AreaAlert, HazardDraft, HazardKind, HazardLog, HazardReport, find_preset};
use crate::observability::AreaStatusView;
use crate::parking::{LotSnapshot, ParkingBoard, nearest_lot};
use crate::ports::{
    Clock, IdGenerator, RemoteActivityReport, RemoteParkingUpdate, ReportReplicator,
};
use crate::reports::ReportLog;

/// Fire-and-forget replication tasks still in flight.
pub(crate) struct ReplicationTracker {
    timeout: Duration,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl ReplicationTracker {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Spawn one replication attempt. The caller never awaits it.
    fn spawn<F>(&self, what: &'static str, attempt: F)
    where
        F: Future<Output = Result<(), ReplicationError>> + Send + 'static,
    {
        let timeout = self.timeout;
        let handle = tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, attempt).await {
                Ok(result) => result,
                Err(_) => Err(ReplicationError::Timeout(timeout)),
            };
            match result {
                Ok(()) => debug!(what, "replicated to remote"),
                Err(err) => {
                    warn!(what, error = %err, "remote replication failed; local copy kept")
                }
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    fn in_flight(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    /// Wait up to `grace` for in-flight attempts; abort the rest.
    /// Returns how many were abandoned.
    async fn drain(&self, grace: Duration) -> usize {
        let handles = std::mem::take(&mut *self.pending.lock().unwrap_or_else(|e| e.into_inner()));
        let deadline = tokio::time::Instant::now() + grace;
        let mut abandoned = 0;
        for mut handle in handles {
            if tokio::time::timeout_at(deadline, &mut handle).await.is_err() {
                handle.abort();
                abandoned += 1;
            }
        }
        abandoned
    }
}

/// Park activity service: activity reports, derived status, parking, geofence.
///
/// Build with [`ParkPulseBuilder`](super::ParkPulseBuilder).
pub struct ParkPulse {
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) ids: Box<dyn IdGenerator>,
    pub(crate) log: ReportLog,
    pub(crate) parking: ParkingBoard,
    pub(crate) hazards: HazardLog,
    pub(crate) aggregator: TimeDecayAggregator,
    pub(crate) replicator: Arc<dyn ReportReplicator>,
    pub(crate) geofence: Geofence,
    pub(crate) replications: ReplicationTracker,
}

impl ParkPulse {
    /// Record a visitor's report for `area` at `level`.
    ///
    /// Fails only on invalid input; a rejected submission leaves the log
    /// untouched. Local persistence and remote replication failures are logged
    /// and the report still counts.
    pub async fn submit_activity_report(
        &self,
        area: &str,
        level: &str,
    ) -> Result<ReportId, ParkError> {
        let level: ActivityLevel = level.parse()?;
        let area: AreaKind = area.parse()?;
        Ok(self.record_activity(area, level).await)
    }

    /// Typed variant of [`submit_activity_report`](Self::submit_activity_report).
    pub async fn record_activity(&self, area: AreaKind, level: ActivityLevel) -> ReportId {
        let now = self.clock.now();
        let now_ms = now.timestamp_millis();
        let id = self.ids.generate_report_id();

        let outcome = self
            .log
            .append(ActivityReport::new(id, area, level, now_ms), now_ms)
            .await;
        info!(%area, %level, report_id = %id, retained = outcome.retained, "activity report recorded");

        let replicator = Arc::clone(&self.replicator);
        let record = RemoteActivityReport {
            area_type: area,
            status: level,
            created_at: now,
        };
        self.replications.spawn("activity_report", async move {
            replicator.insert_report(record).await
        });

        id
    }

    /// Current status of `area`. Unknown area names are Light.
    pub fn current_status(&self, area: &str) -> ActivityLevel {
        match area.parse::<AreaKind>() {
            Ok(area) => self.status_of(area),
            Err(_) => ActivityLevel::Light,
        }
    }

    pub fn status_of(&self, area: AreaKind) -> ActivityLevel {
        let now_ms = self.clock.now_ms();
        let reports = self.log.snapshot(area, now_ms);
        self.aggregator.compute_status(&reports, now_ms)
    }

    /// Reports currently inside the retention window for `area`.
    pub fn snapshot(&self, area: AreaKind) -> Vec<ActivityReport> {
        self.log.snapshot(area, self.clock.now_ms())
    }

    pub fn explain(&self, area: AreaKind) -> AreaStatusView {
        let now_ms = self.clock.now_ms();
        let reports = self.log.snapshot(area, now_ms);
        AreaStatusView {
            area,
            status: self.aggregator.compute_status(&reports, now_ms),
            reports: reports.len(),
            weighted_average: self.aggregator.weighted_average(&reports, now_ms),
            newest_report_ms: reports.iter().map(ActivityReport::observed_at_ms).max(),
            computed_at_ms: now_ms,
        }
    }

    /// One view per area in the catalog.
    pub fn status_board(&self) -> Vec<AreaStatusView> {
        AreaKind::ALL.iter().map(|&area| self.explain(area)).collect()
    }

    /// Record a hazard, suspicious-activity, maintenance or alert report.
    ///
    /// `kind` is one of suspicious, hazard, maintenance, other, alert. An
    /// alert needs `area`. Local only; nothing is replicated.
    pub async fn submit_hazard_report(
        &self,
        kind: &str,
        description: &str,
        location: Option<&str>,
        area: Option<&str>,
    ) -> Result<HazardReport, ParkError> {
        let draft = HazardDraft {
            kind: kind.parse()?,
            description: description.to_string(),
            location: location.map(str::to_string),
            area: area.map(str::parse::<AreaKind>).transpose()?,
        };
        self.record_hazard(draft).await
    }

    /// Raise an alert for `area`: a preset id (`slippery`, `cold-sand`,
    /// `no-lights`) that applies to the area, or free text.
    pub async fn raise_alert(&self, area: &str, alert: &str) -> Result<HazardReport, ParkError> {
        let area: AreaKind = area.parse()?;
        let description = match find_preset(alert) {
            Some(preset) if preset.areas.contains(&area) => preset.name.to_string(),
            Some(preset) => {
                return Err(ParkError::AlertNotApplicable {
                    alert: preset.id.to_string(),
                    area: area.to_string(),
                });
            }
            None => alert.to_string(),
        };
        self.record_hazard(HazardDraft {
            kind: HazardKind::Alert,
            description,
            location: None,
            area: Some(area),
        })
        .await
    }

    async fn record_hazard(&self, draft: HazardDraft) -> Result<HazardReport, ParkError> {
        let report = draft.validate(self.ids.generate_report_id(), self.clock.now_ms())?;
        self.hazards.append(report.clone()).await;
        info!(kind = %report.kind, report_id = %report.id, area = ?report.area, "hazard report recorded");
        Ok(report)
    }

    /// Alerts raised for `area` in the last day, grouped by name.
    pub fn area_alerts(&self, area: AreaKind) -> Vec<AreaAlert> {
        self.hazards.alerts(area, self.clock.now_ms())
    }

    /// Every hazard report recorded so far, oldest first.
    pub fn hazard_reports(&self) -> Vec<HazardReport> {
        self.hazards.reports()
    }

    /// Adjust a lot's occupancy by `delta` (clamped) and replicate best-effort.
    pub async fn adjust_parking(&self, lot_id: &str, delta: i64) -> Result<LotSnapshot, ParkError> {
        let now = self.clock.now();
        let snapshot = self
            .parking
            .adjust(lot_id, delta, now.timestamp_millis())
            .await?;

        let replicator = Arc::clone(&self.replicator);
        let record = RemoteParkingUpdate {
            lot_id: snapshot.lot_id.clone(),
            occupied: snapshot.occupied,
            last_updated: now,
        };
        self.replications.spawn("parking_update", async move {
            replicator.upsert_parking(record).await
        });

        Ok(snapshot)
    }

    pub fn parking(&self) -> Vec<LotSnapshot> {
        self.parking.snapshots()
    }

    pub fn is_in_park(&self, point: GeoPoint) -> bool {
        self.geofence.contains(point)
    }

    /// A visitor arrived at `point`. Inside the park, counts one more car in
    /// the nearest lot and returns its snapshot; outside, does nothing.
    pub async fn check_in(&self, point: GeoPoint) -> Result<Option<LotSnapshot>, ParkError> {
        if !self.is_in_park(point) {
            debug!(
                lat = point.lat,
                lng = point.lng,
                distance_km = haversine_km(self.geofence.center(), point),
                radius_km = self.geofence.radius_km(),
                "check-in outside park ignored"
            );
            return Ok(None);
        }
        match nearest_lot(point) {
            Some(lot) => self.adjust_parking(lot.id, 1).await.map(Some),
            None => Ok(None),
        }
    }

    /// Replication attempts not yet finished.
    pub fn pending_replications(&self) -> usize {
        self.replications.in_flight()
    }

    /// Give in-flight replications up to `grace` to finish, then abandon them.
    /// Returns the number abandoned.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        let abandoned = self.replications.drain(grace).await;
        if abandoned > 0 {
            warn!(abandoned, "abandoned in-flight remote replications at shutdown");
        }
        abandoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ParkPulseBuilder;
    use crate::impls::InMemoryStore;
    use crate::ports::FixedClock;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    const START_MS: i64 = 1_717_232_400_000;

    /// Never finishes until released.
    struct StalledReplicator {
        release: Notify,
    }

    #[async_trait]
    impl ReportReplicator for StalledReplicator {
        async fn insert_report(&self, _r: RemoteActivityReport) -> Result<(), ReplicationError> {
            self.release.notified().await;
            Ok(())
        }

        async fn upsert_parking(&self, _r: RemoteParkingUpdate) -> Result<(), ReplicationError> {
            self.release.notified().await;
            Ok(())
        }
    }

    async fn app_with(replicator: Arc<dyn ReportReplicator>) -> (ParkPulse, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::from_millis(START_MS));
        let app = ParkPulseBuilder::new()
            .store(Arc::new(InMemoryStore::new()))
            .replicator(replicator)
            .clock(clock.clone())
            .build()
            .await
            .unwrap();
        (app, clock)
    }

    #[tokio::test]
    async fn stalled_remote_does_not_block_submit() {
        let replicator = Arc::new(StalledReplicator {
            release: Notify::new(),
        });
        let (app, _clock) = app_with(replicator.clone()).await;

        app.submit_activity_report("futsal", "Busy").await.unwrap();

        assert_eq!(app.current_status("futsal"), ActivityLevel::Busy);
        assert_eq!(app.pending_replications(), 1);

        let abandoned = app.shutdown(Duration::from_millis(20)).await;
        assert_eq!(abandoned, 1);
        assert_eq!(app.pending_replications(), 0);
    }

    #[tokio::test]
    async fn replication_timeout_is_contained() {
        let replicator = Arc::new(StalledReplicator {
            release: Notify::new(),
        });
        let clock = Arc::new(FixedClock::from_millis(START_MS));
        let app = ParkPulseBuilder::new()
            .store(Arc::new(InMemoryStore::new()))
            .replicator(replicator)
            .clock(clock)
            .replication_timeout(Duration::from_millis(10))
            .build()
            .await
            .unwrap();

        app.submit_activity_report("basketball", "medium")
            .await
            .unwrap();

        // The attempt times out on its own; nothing is left to abandon.
        assert_eq!(app.shutdown(Duration::from_secs(2)).await, 0);
        assert_eq!(app.current_status("basketball"), ActivityLevel::Medium);
    }

    #[tokio::test]
    async fn explain_reports_weighted_average() {
        let (app, clock) = app_with(Arc::new(crate::impls::NoopReplicator)).await;
        app.record_activity(AreaKind::Pickleball, ActivityLevel::Busy)
            .await;
        clock.advance(Duration::from_secs(10 * 60));
        app.record_activity(AreaKind::Pickleball, ActivityLevel::Light)
            .await;

        let view = app.explain(AreaKind::Pickleball);
        assert_eq!(view.status, ActivityLevel::Medium);
        assert_eq!(view.reports, 2);
        assert!((view.weighted_average.unwrap() - 1.875).abs() < 1e-9);
        assert_eq!(view.newest_report_ms, Some(START_MS + 600_000));
    }

    #[tokio::test]
    async fn explain_agrees_with_status_across_decay() {
        let (app, clock) = app_with(Arc::new(crate::impls::NoopReplicator)).await;
        app.record_activity(AreaKind::Futsal, ActivityLevel::Busy).await;
        app.record_activity(AreaKind::Futsal, ActivityLevel::Light).await;
        clock.advance(Duration::from_secs(5 * 60));
        app.record_activity(AreaKind::Futsal, ActivityLevel::Medium).await;

        for _ in 0..12 {
            assert_eq!(
                app.explain(AreaKind::Futsal).status,
                app.status_of(AreaKind::Futsal)
            );
            clock.advance(Duration::from_secs(5 * 60));
        }
    }

    #[tokio::test]
    async fn alerts_group_and_expire_through_the_facade() {
        let (app, clock) = app_with(Arc::new(crate::impls::NoopReplicator)).await;
        app.raise_alert("basketball", "slippery").await.unwrap();
        clock.advance(Duration::from_secs(60 * 60));
        app.raise_alert("basketball", "Slippery courts").await.unwrap();
        app.raise_alert("basketball", "  Rim is bent ").await.unwrap();

        let alerts = app.area_alerts(AreaKind::Basketball);
        assert_eq!(alerts.len(), 2);
        let slippery = alerts.iter().find(|a| a.name == "Slippery courts").unwrap();
        assert_eq!(slippery.count, 2);
        assert_eq!(slippery.latest_ms, START_MS + 3_600_000);
        assert!(alerts.iter().any(|a| a.name == "Rim is bent" && a.count == 1));

        // The first alert is now exactly one day old and still counts.
        clock.advance(Duration::from_secs(23 * 60 * 60));
        let total: usize = app.area_alerts(AreaKind::Basketball).iter().map(|a| a.count).sum();
        assert_eq!(total, 3);

        clock.advance(Duration::from_millis(1));
        let total: usize = app.area_alerts(AreaKind::Basketball).iter().map(|a| a.count).sum();
        assert_eq!(total, 2);

        clock.advance(Duration::from_secs(60 * 60));
        assert!(app.area_alerts(AreaKind::Basketball).is_empty());
        assert_eq!(app.hazard_reports().len(), 3);
    }

    #[tokio::test]
    async fn hazard_validation_errors_leave_nothing_behind() {
        let (app, _clock) = app_with(Arc::new(crate::impls::NoopReplicator)).await;

        let err = app
            .submit_hazard_report("hazard", "   ", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ParkError::EmptyDescription));

        let err = app
            .submit_hazard_report("graffiti", "paint", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ParkError::UnknownHazardKind(_)));

        let err = app
            .submit_hazard_report("alert", "No lights", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ParkError::MissingArea));

        let err = app.raise_alert("volleyball", "slippery").await.unwrap_err();
        assert!(matches!(err, ParkError::AlertNotApplicable { .. }));

        assert!(app.hazard_reports().is_empty());

        let report = app
            .submit_hazard_report("Maintenance", "broken net", Some(""), Some("volleyball"))
            .await
            .unwrap();
        assert_eq!(report.location, "Not specified");
        assert_eq!(app.hazard_reports(), vec![report]);
    }

    #[tokio::test]
    async fn status_board_covers_every_area() {
        let (app, _clock) = app_with(Arc::new(crate::impls::NoopReplicator)).await;
        let board = app.status_board();
        assert_eq!(board.len(), AreaKind::ALL.len());
        assert!(board.iter().all(|v| v.status == ActivityLevel::Light));
        assert!(board.iter().all(|v| v.weighted_average.is_none()));
    }

    #[tokio::test]
    async fn check_in_counts_only_visitors_inside_the_park() {
        let (app, _clock) = app_with(Arc::new(crate::impls::NoopReplicator)).await;

        let outside = app.check_in(GeoPoint::new(33.749, -84.388)).await.unwrap();
        assert!(outside.is_none());
        assert_eq!(app.parking()[0].occupied, 0);

        let inside = app
            .check_in(GeoPoint::new(33.9786, -84.1317))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inside.lot_id, "lot1");
        assert_eq!(inside.occupied, 1);
    }
}
