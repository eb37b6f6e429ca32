//! Timeline session: loads, stale responses, optimistic edits, reloads.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;

use event_timeline::backend::{
    BackendError, Disposition, Fixture, FixtureError, MemoryBackend, Operation, TaskBackend,
};
use event_timeline::bus::{ChangeBus, TasksChanged};
use event_timeline::model::*;
use event_timeline::session::{fetch_tasks, LoadOutcome, Shift, TimelineSession};
use event_timeline::timeline::GridConfig;

const EVENT: &str = "summer-fest-2024";

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/event.json")
}

fn fixture() -> Fixture {
    Fixture::load(&fixture_path()).expect("fixture should load")
}

fn stage() -> Scope {
    Scope::new(EVENT, "stage")
}

fn id(s: &str) -> TaskId {
    TaskId::new(s)
}

fn visible_ids(session: &TimelineSession<MemoryBackend>) -> Vec<String> {
    session
        .state
        .tasks()
        .iter()
        .map(|t| t.id.to_string())
        .collect()
}

async fn loaded_session() -> (Arc<MemoryBackend>, TimelineSession<MemoryBackend>) {
    let backend = Arc::new(MemoryBackend::new(fixture()));
    let mut session = TimelineSession::new(Arc::clone(&backend), stage());
    assert_eq!(session.load().await, LoadOutcome::Applied(6));
    (backend, session)
}

// ═══════════════════════════════════════════════════════════════════════════
// Fixture
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_fixture_parses_camel_case_fields() {
    let fixture = fixture();
    assert_eq!(fixture.event_id, EventId::new(EVENT));
    assert_eq!(fixture.tasks.len(), 9);
    assert_eq!(fixture.dependencies.len(), 4);

    let lighting = fixture.tasks.iter().find(|t| t.id == id("stage-003")).unwrap();
    assert_eq!(lighting.status, TaskStatus::Blocked);
    assert_eq!(lighting.zonal_department_row_id, Some(ZonalRowId::new("row-north-stage")));
    assert_eq!(lighting.due_at, None);

    let barrier = fixture
        .dependencies
        .iter()
        .find(|e| e.blocked_id == id("sec-001"))
        .unwrap();
    assert_eq!(barrier.relation, RelationType::StartToStart);
}

#[test]
fn test_missing_fixture_is_an_io_error() {
    let err = Fixture::load(Path::new("/nonexistent/event.json")).unwrap_err();
    assert!(matches!(err, FixtureError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/event.json"));
}

// ═══════════════════════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_load_shows_only_the_scoped_department() {
    let (_backend, session) = loaded_session().await;
    assert!(session
        .state
        .tasks()
        .iter()
        .all(|t| t.department_id == DepartmentId::new("stage")));
    assert!(session.state.notice().is_none());
}

#[tokio::test]
async fn test_stale_response_is_discarded() {
    let backend = Arc::new(MemoryBackend::new(fixture()));
    let mut session = TimelineSession::new(Arc::clone(&backend), stage());

    // Dispatched for "everyone", then the user narrows to one assignee.
    let slow = tokio::spawn(fetch_tasks(Arc::clone(&backend), session.state.request_key()));
    session.state.filters.assignee = Some(UserId::new("u-ana"));
    assert_eq!(session.load().await, LoadOutcome::Applied(2));

    let (key, result) = slow.await.unwrap();
    assert_eq!(session.state.apply_loaded(key, result), LoadOutcome::Stale);
    assert_eq!(visible_ids(&session), vec!["stage-001", "stage-004"]);

    // The discarded response is still cached under its own key.
    session.state.filters.assignee = None;
    assert!(session.state.show_cached());
    assert_eq!(session.state.tasks().len(), 6);
}

#[tokio::test]
async fn test_stale_failure_raises_no_notice() {
    let backend = Arc::new(MemoryBackend::new(fixture()));
    let mut session = TimelineSession::new(Arc::clone(&backend), stage());
    let old_key = session.state.request_key();
    session.set_scope(Scope::new(EVENT, "catering"));

    let outcome = session
        .state
        .apply_loaded(old_key, Err(BackendError::Transport("offline".into())));

    assert_eq!(outcome, LoadOutcome::Failed);
    assert!(session.state.notice().is_none());
}

#[tokio::test]
async fn test_unknown_event_fails_with_notice() {
    let backend = Arc::new(MemoryBackend::new(fixture()));
    let mut session = TimelineSession::new(backend, Scope::new("winter-fest", "stage"));

    assert_eq!(session.load().await, LoadOutcome::Failed);
    let notice = session.state.notice().unwrap();
    assert_eq!(notice.disposition, Disposition::Gone);
    assert_eq!(
        notice.message,
        "Loading tasks failed: event winter-fest not found"
    );
}

#[tokio::test]
async fn test_members_resolve_assignee_names() {
    let (_backend, mut session) = loaded_session().await;
    session.load_members().await;
    let ana = UserId::new("u-ana");
    assert_eq!(session.state.members.display_name(&ana), "Ana Ortiz");
}

#[tokio::test]
async fn test_member_failure_keeps_raw_ids() {
    let (backend, mut session) = loaded_session().await;
    backend
        .fail_next(Operation::ListMembers, BackendError::Transport("offline".into()))
        .await;
    session.load_members().await;
    let ana = UserId::new("u-ana");
    assert_eq!(session.state.members.display_name(&ana), "u-ana");
    assert!(session.state.notice().is_none());
}

#[tokio::test]
async fn test_grid_follows_filtered_tasks() {
    let (_backend, mut session) = loaded_session().await;
    let now = Utc.with_ymd_and_hms(2024, 6, 6, 12, 0, 0).unwrap();
    session.state.filters.toggle_status(TaskStatus::Done);

    let grid = session.state.grid(now, &GridConfig::default());
    // Only stage-004 (due 06-02) is left.
    assert_eq!(grid.chart_start, NaiveDate::from_ymd_opt(2024, 5, 30).unwrap());
    assert_eq!(grid.chart_end, NaiveDate::from_ymd_opt(2024, 6, 9).unwrap());

    let rows = session.state.rows(&grid, now);
    assert_eq!(rows.rows.len(), 1);
    assert!(rows.unscheduled.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// Optimistic edits
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_forbidden_status_change_rolls_back() {
    let (backend, mut session) = loaded_session().await;
    backend
        .fail_next(
            Operation::ChangeStatus,
            BackendError::Forbidden {
                operation: Operation::ChangeStatus,
            },
        )
        .await;

    let change = StatusChange {
        status: TaskStatus::InProgress,
        progress_pct: Some(50),
    };
    assert!(session.change_status(&id("stage-002"), change).await.is_err());

    let task = session.state.task(&id("stage-002")).unwrap();
    assert_eq!(task.status, TaskStatus::Todo);
    assert_eq!(task.progress_pct, 0);

    let notice = session.state.notice().unwrap();
    assert_eq!(notice.disposition, Disposition::NotAllowed);
    assert_eq!(notice.message, "Changing status failed: not allowed");
}

#[tokio::test]
async fn test_failed_board_move_restores_column() {
    let (backend, mut session) = loaded_session().await;
    backend
        .fail_next(Operation::ChangeStatus, BackendError::Transport("timeout".into()))
        .await;

    assert!(session.move_card(&id("stage-001"), Shift::Right).await.is_err());

    let task = session.state.task(&id("stage-001")).unwrap();
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(task.progress_pct, 40);
    assert_eq!(
        session.state.notice().map(|n| n.disposition),
        Some(Disposition::Dismissible)
    );
    let stored = backend.task(&id("stage-001")).await.unwrap();
    assert_eq!(stored.status, TaskStatus::InProgress);
}

#[tokio::test]
async fn test_move_into_done_completes_progress() {
    let (backend, mut session) = loaded_session().await;

    let moved = session.move_card(&id("stage-003"), Shift::Right).await.unwrap();

    assert_eq!(moved, Some(TaskStatus::Done));
    assert_eq!(session.state.task(&id("stage-003")).unwrap().progress_pct, 100);
    assert_eq!(backend.task(&id("stage-003")).await.unwrap().progress_pct, 100);
    let calls = backend.calls_of(Operation::ChangeStatus).await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].task_id, Some(id("stage-003")));
}

#[tokio::test]
async fn test_move_past_the_edge_is_a_no_op() {
    let (backend, mut session) = loaded_session().await;

    let moved = session.move_card(&id("stage-002"), Shift::Left).await.unwrap();

    assert_eq!(moved, None);
    assert!(backend.calls_of(Operation::ChangeStatus).await.is_empty());
}

#[tokio::test]
async fn test_deleted_elsewhere_drops_the_row() {
    let (backend, mut session) = loaded_session().await;
    backend.delete_task(&stage(), &id("stage-002")).await.unwrap();

    let err = session
        .move_card(&id("stage-002"), Shift::Right)
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::NotFound { entity: "task", .. }));
    assert!(session.state.task(&id("stage-002")).is_none());
    assert_eq!(
        session.state.notice().map(|n| n.disposition),
        Some(Disposition::Gone)
    );
}

#[tokio::test]
async fn test_update_replaces_the_local_copy() {
    let (_backend, mut session) = loaded_session().await;
    let patch = TaskPatch {
        title: Some("Stage manager shift plan v2".into()),
        assignee_id: Some(Some(UserId::new("u-kim"))),
        ..TaskPatch::default()
    };

    let updated = session.update_task(&id("stage-005"), patch).await.unwrap();

    assert_eq!(session.state.task(&id("stage-005")), Some(&updated));
    assert_eq!(updated.assignee_id, Some(UserId::new("u-kim")));
}

#[tokio::test]
async fn test_delete_removes_row_and_edges() {
    let (backend, mut session) = loaded_session().await;

    session.delete_task(&id("stage-001")).await.unwrap();

    assert!(session.state.task(&id("stage-001")).is_none());
    assert!(backend.blocker_ids(&id("stage-002")).await.is_empty());
    assert_eq!(session.state.tasks().len(), 5);
}

// ═══════════════════════════════════════════════════════════════════════════
// Change notifications
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_change_notification_triggers_full_reload() {
    let bus = ChangeBus::new();
    let backend = Arc::new(MemoryBackend::new(fixture()).with_bus(bus.clone()));
    let mut subscription = bus.subscribe(stage());
    let mut session = TimelineSession::new(Arc::clone(&backend), stage());
    session.load().await;

    // Another client edits a task and the server announces it.
    let patch = TaskPatch {
        title: Some("Shift plan, final".into()),
        ..TaskPatch::default()
    };
    backend.update_task(&stage(), &id("stage-005"), patch).await.unwrap();
    let change = subscription.recv().await.unwrap();

    assert_eq!(
        session.on_tasks_changed(&change).await,
        Some(LoadOutcome::Applied(6))
    );
    assert_eq!(
        session.state.task(&id("stage-005")).unwrap().title,
        "Shift plan, final"
    );
    assert_eq!(backend.calls_of(Operation::ListTasks).await.len(), 2);
}

#[tokio::test]
async fn test_cache_age_follows_the_current_key() {
    let (_backend, mut session) = loaded_session().await;
    assert!(session.state.cache_age().is_some());

    session.state.invalidate();
    assert_eq!(session.state.cache_age(), None);
}

#[tokio::test]
async fn test_change_notification_forgets_cached_links() {
    let (_backend, mut session) = loaded_session().await;
    session.dependencies.list(&id("stage-001")).await.unwrap();
    session.dependencies.list(&id("stage-002")).await.unwrap();

    let change = TasksChanged { scope: stage() };
    session.on_tasks_changed(&change).await;

    assert!(session.dependencies.cached(&id("stage-001")).is_none());
    assert!(session.dependencies.cached(&id("stage-002")).is_none());
}

#[tokio::test]
async fn test_change_for_other_department_is_ignored() {
    let (backend, mut session) = loaded_session().await;
    let change = TasksChanged {
        scope: Scope::new(EVENT, "catering"),
    };

    assert_eq!(session.on_tasks_changed(&change).await, None);
    assert_eq!(backend.calls_of(Operation::ListTasks).await.len(), 1);
}

#[tokio::test]
async fn test_own_edits_are_announced_on_the_bus() {
    let bus = ChangeBus::new();
    let backend = Arc::new(MemoryBackend::new(fixture()).with_bus(bus.clone()));
    let mut subscription = bus.subscribe(stage());
    let mut session = TimelineSession::new(Arc::clone(&backend), stage());
    session.load().await;

    session.move_card(&id("stage-002"), Shift::Right).await.unwrap();

    let change = subscription.recv().await.unwrap();
    assert_eq!(change.scope, stage());
}
