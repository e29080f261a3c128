use std::sync::Arc;
use std::time::Duration;

use parkpulse_core::hazards::{DEFAULT_LOCATION, HazardKind};
use parkpulse_core::impls::{FileStore, NoopReplicator};
use parkpulse_core::ports::FixedClock;
use parkpulse_core::{ActivityLevel, AreaKind, ParkPulse, ParkPulseBuilder};

const T0: i64 = 1_717_232_400_000;

async fn open(dir: &std::path::Path, clock: Arc<FixedClock>) -> ParkPulse {
    ParkPulseBuilder::new()
        .store(Arc::new(FileStore::new(dir)))
        .replicator(Arc::new(NoopReplicator))
        .clock(clock)
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_hazard_reports_and_alerts_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(FixedClock::from_millis(T0));

    let app = open(dir.path(), clock.clone()).await;
    app.submit_hazard_report("suspicious", "Someone trying car doors", None, None)
        .await
        .unwrap();
    app.raise_alert("volleyball", "cold-sand").await.unwrap();
    app.raise_alert("volleyball", "Cold sand").await.unwrap();
    drop(app);

    let app = open(dir.path(), clock.clone()).await;
    let reports = app.hazard_reports();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].kind, HazardKind::Suspicious);
    assert_eq!(reports[0].location, DEFAULT_LOCATION);

    let alerts = app.area_alerts(AreaKind::Volleyball);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].name, "Cold sand");
    assert_eq!(alerts[0].count, 2);

    clock.advance(Duration::from_secs(24 * 60 * 60 + 1));
    assert!(app.area_alerts(AreaKind::Volleyball).is_empty());
    assert_eq!(app.hazard_reports().len(), 3);
}

#[tokio::test]
async fn test_activity_and_hazards_share_one_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(FixedClock::from_millis(T0));

    let app = open(dir.path(), clock.clone()).await;
    app.submit_activity_report("futsal", "Busy").await.unwrap();
    app.raise_alert("futsal", "no-lights").await.unwrap();
    drop(app);

    let app = open(dir.path(), clock).await;
    assert_eq!(app.current_status("futsal"), ActivityLevel::Busy);
    assert_eq!(app.area_alerts(AreaKind::Futsal)[0].name, "No lights");
}
