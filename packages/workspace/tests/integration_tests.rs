/// Integration tests for the complete editing flow
/// Tests command → session → observers → autosave → gateway
use parking_lot::Mutex;
use reclist_common::{NoIdentity, StaticIdentity, UserId};
use reclist_editor::{ContainerRef, EditCommand, FocusTarget, ListDocument};
use reclist_workspace::{
    CallKind, EditorConfig, FileGateway, InMemoryGateway, ListEditor, Notice, ObserverId,
    SaveOutcome, SchedulerStatus, WorkspaceError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_stream::StreamExt;

const D: Duration = Duration::from_millis(1000);

fn config() -> EditorConfig {
    EditorConfig::default().with_debounce(D)
}

fn new_editor(gateway: &Arc<InMemoryGateway>) -> ListEditor {
    ListEditor::create(&StaticIdentity::new(UserId::new()), gateway.clone(), &config()).unwrap()
}

fn text(value: &str) -> EditCommand {
    EditCommand::SetText(value.to_string())
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_edits_saves_once_with_latest_snapshot() {
    let gateway = Arc::new(InMemoryGateway::new());
    let editor = new_editor(&gateway);
    let start = Instant::now();

    editor.dispatch(&text("K"), None).unwrap();
    tokio::time::sleep(D * 3 / 10).await;
    editor.dispatch(&text("Ka"), None).unwrap();
    tokio::time::sleep(D * 3 / 10).await;
    editor.dispatch(&text("Katz's"), None).unwrap();

    tokio::time::sleep(D * 5).await;

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].kind, CallKind::Create);
    assert_eq!(calls[0].at - start, D * 16 / 10);
    let payload = calls[0].payload.as_ref().unwrap();
    assert_eq!(payload.unsectioned_items[0].name, "Katz's");
}

#[tokio::test(start_paused = true)]
async fn test_untouched_list_is_never_saved() {
    let gateway = Arc::new(InMemoryGateway::new());
    let editor = new_editor(&gateway);

    editor
        .dispatch(&EditCommand::TapFocus(FocusTarget::None), None)
        .unwrap();
    tokio::time::sleep(D * 4).await;

    assert!(gateway.calls().is_empty());
    assert_eq!(editor.close().await.unwrap(), SaveOutcome::SkippedPlaceholder);
    assert!(gateway.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_refused_command_schedules_nothing() {
    let gateway = Arc::new(InMemoryGateway::new());
    let editor = new_editor(&gateway);

    let err = editor.dispatch(&EditCommand::DeleteEmpty, None).unwrap_err();

    assert!(matches!(err, WorkspaceError::Editor(_)));
    assert_eq!(editor.status(), SchedulerStatus::Idle);
    assert_eq!(editor.version(), 0);
}

#[tokio::test]
async fn test_create_requires_identity() {
    let gateway = Arc::new(InMemoryGateway::new());
    let result = ListEditor::create(&NoIdentity, gateway, &config());
    assert!(matches!(result, Err(WorkspaceError::Identity(_))));
}

#[tokio::test(start_paused = true)]
async fn test_observers_skip_their_own_changes() {
    let gateway = Arc::new(InMemoryGateway::new());
    let editor = new_editor(&gateway);
    let seen = Arc::new(Mutex::new(Vec::new()));

    for name in ["table", "outline"] {
        let seen = Arc::clone(&seen);
        editor.observers().add(name, move |change: &reclist_editor::Change| {
            seen.lock().push((name, change.version, change.focus));
        });
    }

    let table = ObserverId::from("table");
    editor.dispatch(&text("Lucali"), Some(&table)).unwrap();
    editor.dispatch(&EditCommand::Commit, None).unwrap();

    let seen = seen.lock();
    assert_eq!(
        *seen,
        vec![
            ("outline", 1, FocusTarget::name(ContainerRef::Unsectioned, 0)),
            ("table", 2, FocusTarget::description(ContainerRef::Unsectioned, 0)),
            ("outline", 2, FocusTarget::description(ContainerRef::Unsectioned, 0)),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_from_observer_keeps_versions_ordered() {
    let gateway = Arc::new(InMemoryGateway::new());
    let editor = Arc::new(new_editor(&gateway));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let weak = Arc::downgrade(&editor);
    editor.observers().add("auto-star", move |change: &reclist_editor::Change| {
        if change.version == 1 {
            if let Some(editor) = weak.upgrade() {
                let source = ObserverId::from("auto-star");
                editor.dispatch(&EditCommand::ToggleStar, Some(&source)).unwrap();
            }
        }
    });
    let log = Arc::clone(&seen);
    editor.observers().add("outline", move |change: &reclist_editor::Change| {
        log.lock().push(change.version);
    });

    editor.dispatch(&text("Lucali"), None).unwrap();
    assert_eq!(*seen.lock(), vec![2]);
    assert_eq!(editor.version(), 2);

    tokio::time::sleep(D * 3).await;

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].payload.as_ref().unwrap().unsectioned_items[0].is_starred);
}

#[tokio::test(start_paused = true)]
async fn test_save_now_and_notices() {
    let gateway = Arc::new(InMemoryGateway::new());
    let editor = new_editor(&gateway);
    let mut notices = editor.notices();

    editor.dispatch(&text("Russ & Daughters"), None).unwrap();
    let outcome = editor.save_now().await.unwrap();

    assert_eq!(outcome, SaveOutcome::Created(editor.id()));
    match notices.next().await.unwrap() {
        Notice::Saved { list_id, version, .. } => {
            assert_eq!(list_id, editor.id());
            assert_eq!(version, 1);
        }
        other => panic!("unexpected notice {:?}", other),
    }

    editor.dispatch(&EditCommand::ToggleStar, None).unwrap();
    editor.close().await.unwrap();

    assert_eq!(gateway.call_count(CallKind::Create), 1);
    assert_eq!(gateway.call_count(CallKind::Update), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failure_keeps_document_and_notifies() {
    let gateway = Arc::new(InMemoryGateway::new());
    let editor = new_editor(&gateway);
    let mut notices = editor.subscribe_notices();
    gateway.fail_next(1);

    editor.dispatch(&text("Di Fara"), None).unwrap();
    tokio::time::sleep(D * 2).await;

    assert!(matches!(notices.recv().await.unwrap(), Notice::SaveFailed { .. }));
    assert_eq!(editor.document().unsectioned_items()[0].name, "Di Fara");

    editor.dispatch(&EditCommand::Commit, None).unwrap();
    tokio::time::sleep(D * 2).await;

    assert!(matches!(notices.recv().await.unwrap(), Notice::Saved { version: 2, .. }));
    assert_eq!(gateway.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_delete_cancels_pending_save() {
    let gateway = Arc::new(InMemoryGateway::new());
    let editor = new_editor(&gateway);

    editor.dispatch(&text("Roberta's"), None).unwrap();
    editor.save_now().await.unwrap();
    editor.dispatch(&EditCommand::ToggleStar, None).unwrap();

    editor.delete().await.unwrap();
    tokio::time::sleep(D * 3).await;

    assert_eq!(gateway.call_count(CallKind::Create), 1);
    assert_eq!(gateway.call_count(CallKind::Update), 0);
    assert_eq!(gateway.call_count(CallKind::Delete), 1);
    assert!(gateway.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_delete_of_unsaved_list_skips_gateway() {
    let gateway = Arc::new(InMemoryGateway::new());
    let editor = new_editor(&gateway);

    editor.dispatch(&text("Unsaved"), None).unwrap();
    editor.delete().await.unwrap();
    tokio::time::sleep(D * 3).await;

    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_file_store_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(FileGateway::new(dir.path()));
    let editor = ListEditor::create(
        &StaticIdentity::new(UserId::new()),
        gateway.clone(),
        &config(),
    )
    .unwrap();

    for command in [
        EditCommand::SetListName("Brooklyn pizza".to_string()),
        text("Lucali"),
        EditCommand::Commit,
        text("Calzone too"),
        EditCommand::Commit,
        text("L&B"),
        EditCommand::CreateSection,
        text("Slices"),
    ] {
        editor.dispatch(&command, None).unwrap();
    }
    let expected: ListDocument = editor.document().as_ref().clone();
    let id = editor.id();
    editor.close().await.unwrap();

    let loaded = gateway.load(id).await.unwrap();
    assert_eq!(loaded, expected);

    let reopened = ListEditor::open(loaded, gateway.clone(), &config());
    reopened.dispatch(&EditCommand::SetListName("Pizza".to_string()), None).unwrap();
    assert_eq!(reopened.save_now().await.unwrap(), SaveOutcome::Updated);
    assert_eq!(gateway.load(id).await.unwrap().name(), "Pizza");

    reopened.delete().await.unwrap();
    assert!(!gateway.path_for(id).exists());
}
