//! Connection lifecycle tests over the in-memory repository.

use std::sync::Arc;

use chantier::channel::{
    adapters::memory::InMemoryConnectionRepository,
    domain::{ProjectId, SyncInterval},
    ports::ConnectionRepository,
    services::{ChannelConnectionError, ChannelConnectionService, ConnectChannelRequest},
};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

use super::helpers::{RecordingTrigger, ScriptedChannelApi, at};

type TestService = ChannelConnectionService<
    InMemoryConnectionRepository,
    ScriptedChannelApi,
    RecordingTrigger,
    DefaultClock,
>;

struct Lifecycle {
    repository: Arc<InMemoryConnectionRepository>,
    trigger: Arc<RecordingTrigger>,
    service: TestService,
    project_id: ProjectId,
}

fn lifecycle_with(api: ScriptedChannelApi) -> Lifecycle {
    let repository = Arc::new(InMemoryConnectionRepository::new());
    let trigger = Arc::new(RecordingTrigger::new());
    let service = ChannelConnectionService::new(
        Arc::clone(&repository),
        Arc::new(api),
        Arc::clone(&trigger),
        Arc::new(DefaultClock),
    );
    Lifecycle {
        repository,
        trigger,
        service,
        project_id: ProjectId::new(),
    }
}

#[fixture]
fn lifecycle() -> Lifecycle {
    lifecycle_with(ScriptedChannelApi::new())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn connect_stores_the_pair_and_fires_an_initial_sync(lifecycle: Lifecycle) {
    let request = ConnectChannelRequest::new(lifecycle.project_id, "C0001", "general");
    lifecycle
        .service
        .connect(request)
        .await
        .expect("connect should succeed");

    let connections = lifecycle
        .service
        .list_connections(lifecycle.project_id)
        .await
        .expect("listing should succeed");
    assert_eq!(connections.len(), 1);
    assert!(connections[0].is_active());
    assert_eq!(connections[0].sync_interval(), SyncInterval::default());

    let triggered = lifecycle.trigger.requests();
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].1.as_str(), "C0001");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn connect_refuses_channels_it_cannot_read() {
    let lifecycle = lifecycle_with(ScriptedChannelApi::new().denying_access());
    let request = ConnectChannelRequest::new(lifecycle.project_id, "C0001", "general");

    let result = lifecycle.service.connect(request).await;
    assert!(matches!(
        result,
        Err(ChannelConnectionError::NoAccess { .. })
    ));
    assert!(lifecycle.trigger.requests().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reconnecting_keeps_the_identity_and_watermark(lifecycle: Lifecycle) {
    let first_id = lifecycle
        .service
        .connect(ConnectChannelRequest::new(
            lifecycle.project_id,
            "C0001",
            "general",
        ))
        .await
        .expect("connect should succeed");

    // Simulate sync progress between the two connects.
    let channel_id = chantier::channel::domain::ChannelId::new("C0001").expect("valid channel id");
    let mut connection = lifecycle
        .repository
        .find_by_pair(lifecycle.project_id, &channel_id)
        .await
        .expect("lookup should succeed")
        .expect("connection should exist");
    connection.advance_watermark(at(500));
    lifecycle
        .repository
        .update(&connection)
        .await
        .expect("update should succeed");

    let second_id = lifecycle
        .service
        .connect(ConnectChannelRequest::new(
            lifecycle.project_id,
            "C0001",
            "general-renamed",
        ))
        .await
        .expect("reconnect should succeed");

    assert_eq!(first_id, second_id);
    let connections = lifecycle
        .service
        .list_connections(lifecycle.project_id)
        .await
        .expect("listing should succeed");
    assert_eq!(connections.len(), 1);
    assert_eq!(connections[0].channel_name().as_str(), "general-renamed");
    assert_eq!(connections[0].last_analysis_watermark(), Some(at(500)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disconnect_drops_the_pair_from_the_active_set(lifecycle: Lifecycle) {
    lifecycle
        .service
        .connect(ConnectChannelRequest::new(
            lifecycle.project_id,
            "C0001",
            "general",
        ))
        .await
        .expect("connect should succeed");

    lifecycle
        .service
        .disconnect(lifecycle.project_id, "C0001")
        .await
        .expect("disconnect should succeed");

    let active = lifecycle
        .service
        .list_connected_channels()
        .await
        .expect("listing should succeed");
    assert!(active.is_empty());

    // The row survives for history; it is only inactive.
    let all = lifecycle
        .service
        .list_connections(lifecycle.project_id)
        .await
        .expect("listing should succeed");
    assert_eq!(all.len(), 1);
    assert!(!all[0].is_active());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn disconnecting_an_unknown_pair_reports_not_connected(lifecycle: Lifecycle) {
    let result = lifecycle
        .service
        .disconnect(lifecycle.project_id, "C0404")
        .await;
    assert!(matches!(
        result,
        Err(ChannelConnectionError::NotConnected { .. })
    ));
}

#[rstest]
#[case(0)]
#[case(1441)]
#[tokio::test(flavor = "multi_thread")]
async fn out_of_range_sync_intervals_are_rejected(lifecycle: Lifecycle, #[case] minutes: u32) {
    lifecycle
        .service
        .connect(ConnectChannelRequest::new(
            lifecycle.project_id,
            "C0001",
            "general",
        ))
        .await
        .expect("connect should succeed");

    let result = lifecycle
        .service
        .update_sync_frequency(lifecycle.project_id, "C0001", minutes)
        .await;
    assert!(matches!(result, Err(ChannelConnectionError::Domain(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sync_interval_bounds_are_inclusive(lifecycle: Lifecycle) {
    lifecycle
        .service
        .connect(ConnectChannelRequest::new(
            lifecycle.project_id,
            "C0001",
            "general",
        ))
        .await
        .expect("connect should succeed");

    for minutes in [1, 1440] {
        lifecycle
            .service
            .update_sync_frequency(lifecycle.project_id, "C0001", minutes)
            .await
            .expect("bound should be accepted");
    }
}
