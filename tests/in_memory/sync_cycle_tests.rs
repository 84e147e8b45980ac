//! End-to-end sync cycle tests over in-memory adapters.

use std::sync::Arc;
use std::time::Duration;

use chantier::channel::{
    adapters::memory::InMemoryConnectionRepository,
    domain::{ChannelConnection, ChannelId, ChannelName, ProjectId, SyncInterval},
    ports::{ChannelApiError, ConnectionRepository, MessagePage},
};
use chantier::discovery::{
    adapters::memory::InMemoryDerivedTaskRepository,
    ports::{AnalysisEngineError, DerivedTaskRepository, InMemoryProjectDirectory},
};
use chantier::message::adapters::memory::InMemoryMessageRepository;
use chantier::sync::{
    SyncCycleStatus, SyncError, SyncOrchestrator, SyncScheduler, SyncSettings,
};
use chrono::TimeDelta;

use super::helpers::{
    EchoAnalysisEngine, FailingPairLookupRepository, FixedClock, ScriptedChannelApi, at,
    bot_message, user_message,
};

type TestOrchestrator = SyncOrchestrator<
    InMemoryConnectionRepository,
    InMemoryMessageRepository,
    ScriptedChannelApi,
    InMemoryDerivedTaskRepository,
    EchoAnalysisEngine,
    InMemoryProjectDirectory,
    FixedClock,
>;

struct Harness {
    connections: Arc<InMemoryConnectionRepository>,
    messages: Arc<InMemoryMessageRepository>,
    api: Arc<ScriptedChannelApi>,
    tasks: Arc<InMemoryDerivedTaskRepository>,
    clock: Arc<FixedClock>,
    orchestrator: Arc<TestOrchestrator>,
    project_id: ProjectId,
    channel_id: ChannelId,
}

impl Harness {
    async fn start(api: ScriptedChannelApi, engine: EchoAnalysisEngine) -> Self {
        let connections = Arc::new(InMemoryConnectionRepository::new());
        let messages = Arc::new(InMemoryMessageRepository::new());
        let api = Arc::new(api);
        let tasks = Arc::new(InMemoryDerivedTaskRepository::new());
        let clock = Arc::new(FixedClock::at(1_000));

        let orchestrator = Arc::new(SyncOrchestrator::new(
            Arc::clone(&connections),
            Arc::clone(&messages),
            Arc::clone(&api),
            Arc::clone(&tasks),
            Arc::new(engine),
            Arc::new(InMemoryProjectDirectory::new()),
            Arc::clone(&clock),
            SyncSettings::default(),
        ));

        let project_id = ProjectId::new();
        let channel_id = ChannelId::new("C0001").expect("valid channel id");
        let connection = ChannelConnection::new(
            project_id,
            channel_id.clone(),
            ChannelName::new("general").expect("valid channel name"),
            SyncInterval::default(),
            &*clock,
        );
        connections
            .store(&connection)
            .await
            .expect("seeding should succeed");

        Self {
            connections,
            messages,
            api,
            tasks,
            clock,
            orchestrator,
            project_id,
            channel_id,
        }
    }

    async fn connection(&self) -> ChannelConnection {
        self.connections
            .find_by_pair(self.project_id, &self.channel_id)
            .await
            .expect("lookup should succeed")
            .expect("connection should exist")
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn initial_sync_covers_full_history_and_sets_the_watermark() {
    let harness = Harness::start(
        ScriptedChannelApi::new(),
        EchoAnalysisEngine::suggesting_at(0.8),
    )
    .await;

    harness.api.push_page(MessagePage {
        messages: vec![
            user_message(&harness.channel_id, 100, "fix the login flow"),
            bot_message(&harness.channel_id, 150, "deploy finished"),
        ],
        next_page_token: Some("cursor-1".to_owned()),
    });
    harness.api.push_page(MessagePage::of(vec![user_message(
        &harness.channel_id,
        200,
        "rotate the signing keys",
    )]));

    let outcome = harness
        .orchestrator
        .run_cycle(harness.project_id, &harness.channel_id)
        .await
        .expect("cycle should succeed");

    assert_eq!(outcome.status, SyncCycleStatus::Completed);
    assert_eq!(outcome.messages_fetched, 3);
    // Bot messages are stored but never analysed.
    assert_eq!(outcome.messages_analyzed, 2);
    assert_eq!(outcome.tasks_discovered, 2);

    assert_eq!(harness.api.oldest_bounds(), vec![None, None]);
    assert_eq!(harness.messages.len().expect("len should succeed"), 3);
    assert_eq!(harness.tasks.len().expect("len should succeed"), 2);

    let connection = harness.connection().await;
    assert_eq!(connection.last_analysis_watermark(), Some(at(200)));
    assert!(connection.health().is_healthy());
}

#[tokio::test(flavor = "multi_thread")]
async fn a_repeated_pagination_cursor_ends_the_fetch() {
    let harness = Harness::start(
        ScriptedChannelApi::new(),
        EchoAnalysisEngine::suggesting_at(0.8),
    )
    .await;

    // An upstream stuck handing back the same cursor must not wedge the
    // cycle; it finishes with the pages gathered so far.
    harness.api.push_page(MessagePage {
        messages: vec![user_message(&harness.channel_id, 100, "fix the login flow")],
        next_page_token: Some("stuck-cursor".to_owned()),
    });
    harness.api.push_page(MessagePage {
        messages: vec![user_message(
            &harness.channel_id,
            200,
            "rotate the signing keys",
        )],
        next_page_token: Some("stuck-cursor".to_owned()),
    });

    let outcome = harness
        .orchestrator
        .run_cycle(harness.project_id, &harness.channel_id)
        .await
        .expect("cycle should succeed");

    assert_eq!(outcome.status, SyncCycleStatus::Completed);
    assert_eq!(outcome.messages_fetched, 2);
    assert_eq!(harness.api.fetch_calls(), 2);
    assert_eq!(
        harness.connection().await.last_analysis_watermark(),
        Some(at(200)),
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn history_fetches_are_capped_per_cycle() {
    let harness = Harness::start(
        ScriptedChannelApi::new(),
        EchoAnalysisEngine::suggesting_at(0.8),
    )
    .await;

    // More continuation pages than one cycle is allowed to follow.
    for page in 0..120 {
        harness.api.push_page(MessagePage {
            messages: vec![user_message(
                &harness.channel_id,
                100 + i64::from(page),
                "fix the login flow",
            )],
            next_page_token: Some(format!("cursor-{page}")),
        });
    }

    let outcome = harness
        .orchestrator
        .run_cycle(harness.project_id, &harness.channel_id)
        .await
        .expect("cycle should succeed");

    assert_eq!(outcome.status, SyncCycleStatus::Completed);
    assert_eq!(harness.api.fetch_calls(), 100);
    assert_eq!(outcome.messages_fetched, 100);
}

#[tokio::test(flavor = "multi_thread")]
async fn incremental_sync_bounds_the_fetch_and_skips_seen_messages() {
    let harness = Harness::start(
        ScriptedChannelApi::new(),
        EchoAnalysisEngine::suggesting_at(0.8),
    )
    .await;

    harness.api.push_page(MessagePage::of(vec![user_message(
        &harness.channel_id,
        100,
        "fix the login flow",
    )]));
    harness
        .orchestrator
        .run_cycle(harness.project_id, &harness.channel_id)
        .await
        .expect("first cycle should succeed");

    // The overlap message sits exactly on the watermark and must not be
    // re-analysed; only the strictly newer one is.
    harness.api.push_page(MessagePage::of(vec![
        user_message(&harness.channel_id, 100, "fix the login flow"),
        user_message(&harness.channel_id, 180, "write the postmortem"),
    ]));
    let outcome = harness
        .orchestrator
        .run_cycle(harness.project_id, &harness.channel_id)
        .await
        .expect("second cycle should succeed");

    assert_eq!(outcome.status, SyncCycleStatus::Completed);
    assert_eq!(outcome.messages_analyzed, 1);
    assert_eq!(outcome.tasks_discovered, 1);
    assert_eq!(
        harness.api.oldest_bounds(),
        vec![None, Some(at(100))],
    );
    assert_eq!(harness.tasks.len().expect("len should succeed"), 2);

    let connection = harness.connection().await;
    assert_eq!(connection.last_analysis_watermark(), Some(at(180)));
}

#[tokio::test(flavor = "multi_thread")]
async fn throttling_opens_the_breaker_until_the_retry_window_passes() {
    let harness = Harness::start(
        ScriptedChannelApi::new(),
        EchoAnalysisEngine::suggesting_at(0.8),
    )
    .await;
    harness.api.push_error(ChannelApiError::Throttled {
        retry_after: Some(Duration::from_secs(60)),
    });

    let throttled = harness
        .orchestrator
        .run_cycle(harness.project_id, &harness.channel_id)
        .await
        .expect("cycle should succeed");
    assert_eq!(throttled.status, SyncCycleStatus::Throttled);
    assert!(!harness.connection().await.health().is_healthy());

    let health = harness
        .orchestrator
        .sync_health(harness.project_id, &harness.channel_id)
        .await
        .expect("health query should succeed");
    assert!(health.circuit_open);
    assert!(!health.snapshot.is_healthy());

    let skipped = harness
        .orchestrator
        .run_cycle(harness.project_id, &harness.channel_id)
        .await
        .expect("cycle should succeed");
    assert_eq!(skipped.status, SyncCycleStatus::SkippedCircuitOpen);
    assert_eq!(harness.api.fetch_calls(), 1);

    harness.clock.advance(TimeDelta::seconds(60));
    let resumed = harness
        .orchestrator
        .run_cycle(harness.project_id, &harness.channel_id)
        .await
        .expect("cycle should succeed");
    assert_eq!(resumed.status, SyncCycleStatus::Completed);
    assert_eq!(harness.api.fetch_calls(), 2);
    assert!(harness.connection().await.health().is_healthy());
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_analysis_is_retried_by_the_next_cycle() {
    let engine = EchoAnalysisEngine::suggesting_at(0.8);
    engine.fail_next(AnalysisEngineError::Failed("engine offline".to_owned()));
    let harness = Harness::start(ScriptedChannelApi::new(), engine).await;
    let page = MessagePage::of(vec![user_message(
        &harness.channel_id,
        100,
        "fix the login flow",
    )]);
    harness.api.push_page(page.clone());

    let failed = harness
        .orchestrator
        .run_cycle(harness.project_id, &harness.channel_id)
        .await
        .expect("cycle should succeed");
    assert!(matches!(failed.status, SyncCycleStatus::AnalysisFailed(_)));
    // Messages landed, tasks did not, and the watermark stayed put.
    assert_eq!(harness.messages.len().expect("len should succeed"), 1);
    assert!(harness.tasks.is_empty().expect("is_empty should succeed"));
    let connection = harness.connection().await;
    assert_eq!(connection.last_analysis_watermark(), None);
    assert!(!connection.health().is_healthy());

    harness.api.push_page(page);
    let retried = harness
        .orchestrator
        .run_cycle(harness.project_id, &harness.channel_id)
        .await
        .expect("retry cycle should succeed");
    assert_eq!(retried.status, SyncCycleStatus::Completed);
    assert_eq!(retried.tasks_discovered, 1);
    assert_eq!(
        harness.connection().await.last_analysis_watermark(),
        Some(at(100)),
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_cycles_for_one_pair_fetch_once() {
    let api = ScriptedChannelApi::new().with_fetch_delay(Duration::from_millis(50));
    let harness = Harness::start(api, EchoAnalysisEngine::suggesting_at(0.8)).await;
    harness.api.push_page(MessagePage::of(vec![user_message(
        &harness.channel_id,
        100,
        "fix the login flow",
    )]));

    let (first, second) = tokio::join!(
        harness
            .orchestrator
            .run_cycle(harness.project_id, &harness.channel_id),
        harness
            .orchestrator
            .run_cycle(harness.project_id, &harness.channel_id),
    );

    let mut statuses = vec![
        first.expect("cycle should succeed").status,
        second.expect("cycle should succeed").status,
    ];
    statuses.sort_by_key(|status| status == &SyncCycleStatus::SkippedInFlight);
    assert_eq!(
        statuses,
        vec![
            SyncCycleStatus::Completed,
            SyncCycleStatus::SkippedInFlight,
        ],
    );
    assert_eq!(harness.api.fetch_calls(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn force_reanalysis_rescans_history_without_duplicating_tasks() {
    let harness = Harness::start(
        ScriptedChannelApi::new(),
        EchoAnalysisEngine::suggesting_at(0.8),
    )
    .await;
    let page = MessagePage::of(vec![user_message(
        &harness.channel_id,
        100,
        "fix the login flow",
    )]);

    harness.api.push_page(page.clone());
    harness
        .orchestrator
        .run_cycle(harness.project_id, &harness.channel_id)
        .await
        .expect("cycle should succeed");
    assert_eq!(
        harness.connection().await.last_analysis_watermark(),
        Some(at(100)),
    );

    // The cleared watermark means the rescan fetches unbounded history.
    harness.api.push_page(page);
    let rescan = harness
        .orchestrator
        .force_reanalysis(harness.project_id, &harness.channel_id)
        .await
        .expect("force_reanalysis should succeed");

    assert_eq!(rescan.status, SyncCycleStatus::Completed);
    assert_eq!(rescan.messages_analyzed, 1);
    // The source message already backs a task, so nothing new is stored.
    assert_eq!(rescan.tasks_discovered, 0);
    assert_eq!(harness.tasks.len().expect("len should succeed"), 1);
    assert_eq!(
        harness.connection().await.last_analysis_watermark(),
        Some(at(100)),
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn inactive_connections_refuse_to_sync() {
    let harness = Harness::start(
        ScriptedChannelApi::new(),
        EchoAnalysisEngine::suggesting_at(0.8),
    )
    .await;
    let mut connection = harness.connection().await;
    connection.deactivate();
    harness
        .connections
        .update(&connection)
        .await
        .expect("update should succeed");

    let result = harness
        .orchestrator
        .run_cycle(harness.project_id, &harness.channel_id)
        .await;
    assert!(matches!(result, Err(SyncError::InactiveConnection { .. })));
    assert_eq!(harness.api.fetch_calls(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_all_due_runs_only_connections_whose_cadence_elapsed() {
    let harness = Harness::start(
        ScriptedChannelApi::new(),
        EchoAnalysisEngine::suggesting_at(0.8),
    )
    .await;

    // A second connection that just synced is not due yet.
    let other_channel = ChannelId::new("C0002").expect("valid channel id");
    let mut other = ChannelConnection::new(
        harness.project_id,
        other_channel,
        ChannelName::new("random").expect("valid channel name"),
        SyncInterval::default(),
        &*harness.clock,
    );
    other.record_sync_success(&*harness.clock);
    harness
        .connections
        .store(&other)
        .await
        .expect("seeding should succeed");

    let scheduler = SyncScheduler::new(Arc::clone(&harness.orchestrator));
    let results = scheduler
        .sync_all_due()
        .await
        .expect("sync_all_due should succeed");

    assert_eq!(results.len(), 1);
    let outcome = results[0].as_ref().expect("cycle should succeed");
    assert_eq!(outcome.channel_id, harness.channel_id);
    assert_eq!(harness.api.fetch_calls(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn sync_all_due_reports_cycles_that_cannot_load_their_connection() {
    let clock = Arc::new(FixedClock::at(1_000));
    let connections = Arc::new(FailingPairLookupRepository::new());
    let project_id = ProjectId::new();
    let channel_id = ChannelId::new("C0001").expect("valid channel id");
    let connection = ChannelConnection::new(
        project_id,
        channel_id,
        ChannelName::new("general").expect("valid channel name"),
        SyncInterval::default(),
        &*clock,
    );
    connections
        .store(&connection)
        .await
        .expect("seeding should succeed");

    let orchestrator = Arc::new(SyncOrchestrator::new(
        Arc::clone(&connections),
        Arc::new(InMemoryMessageRepository::new()),
        Arc::new(ScriptedChannelApi::new()),
        Arc::new(InMemoryDerivedTaskRepository::new()),
        Arc::new(EchoAnalysisEngine::suggesting_at(0.8)),
        Arc::new(InMemoryProjectDirectory::new()),
        clock,
        SyncSettings::default(),
    ));
    let scheduler = SyncScheduler::new(orchestrator);

    let results = scheduler
        .sync_all_due()
        .await
        .expect("listing should succeed");

    // The broken store surfaces per pair instead of looking like an idle
    // fleet.
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(SyncError::Connections(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn spawned_cycles_report_through_their_join_handle() {
    let harness = Harness::start(
        ScriptedChannelApi::new(),
        EchoAnalysisEngine::suggesting_at(0.8),
    )
    .await;
    harness.api.push_page(MessagePage::of(vec![user_message(
        &harness.channel_id,
        100,
        "fix the login flow",
    )]));

    let scheduler = SyncScheduler::new(Arc::clone(&harness.orchestrator));
    let outcome = scheduler
        .spawn_cycle(harness.project_id, harness.channel_id.clone())
        .await
        .expect("spawned cycle should join")
        .expect("cycle should succeed");

    assert_eq!(outcome.status, SyncCycleStatus::Completed);
    assert_eq!(outcome.tasks_discovered, 1);
}
