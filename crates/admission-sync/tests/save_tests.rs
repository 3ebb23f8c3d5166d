//! Debounced save tests
//!
//! Time is paused; sleeps advance the mock clock.
//!
use admission_core::{BackendError, DraftSource, ErrorKind};
use admission_sync::prelude::*;
use admission_sync::{DraftStorage, NotificationLevel};
use admission_test_utils::{partial_fields, BackendCall, Harness, ScriptedBackend};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::time::{sleep, Instant};

async fn ready(backend: ScriptedBackend) -> Harness {
    let h = Harness::new(backend);
    h.controller.bootstrap().await;
    h
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_edits_produces_one_save() {
    let h = ready(ScriptedBackend::new()).await;
    let start = Instant::now();

    let edits = [
        ("fullNameEnglish", "Rahim Khan"),
        ("fatherName", "Karim Khan"),
        ("motherName", "Amena Begum"),
        ("mobile", "01711000000"),
        ("email", "rahim@example.com"),
    ];
    for (name, value) in edits {
        h.controller.set_field(name, value).unwrap();
        sleep(Duration::from_millis(50)).await;
    }
    sleep(Duration::from_millis(1200)).await;

    let saves = h.backend.save_calls();
    assert_eq!(saves.len(), 1);
    // Last edit at 200ms, debounce 1000ms
    let elapsed = saves[0].at - start;
    assert!(elapsed >= Duration::from_millis(1200));
    assert!(elapsed < Duration::from_millis(1250));

    let saved = h.backend.saved_drafts();
    assert_eq!(saved[0].0.filled_count(), 5);
    assert_eq!(saved[0].0.email.as_deref(), Some("rahim@example.com"));
    assert_eq!(saved[0].1, 1);

    let status = h.controller.snapshot();
    assert_eq!(status.draft.source, DraftSource::Server);
    assert!(status.draft.saved_at.is_some());
    assert!(!status.saving);
}

#[tokio::test(start_paused = true)]
async fn test_no_save_before_debounce_elapses() {
    let h = ready(ScriptedBackend::new()).await;

    h.controller.set_field("mobile", "01711000000").unwrap();
    sleep(Duration::from_millis(999)).await;
    assert!(h.backend.save_calls().is_empty());

    sleep(Duration::from_millis(2)).await;
    assert_eq!(h.backend.save_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_edits_are_mirrored_synchronously() {
    let h = ready(ScriptedBackend::new()).await;

    h.controller.set_field("fullNameEnglish", "Rahim Khan").unwrap();

    let local = DraftStorage::new(h.store.clone()).load_draft().unwrap().unwrap();
    assert_eq!(local.form_data, partial_fields());
    assert!(h.backend.save_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_step_changes_are_saved_and_clamped() {
    let h = ready(ScriptedBackend::new()).await;

    assert_eq!(h.controller.set_step(9), Ok(4));
    assert_eq!(h.controller.previous_step(), Ok(3));
    assert_eq!(h.controller.set_step(0), Ok(1));
    assert_eq!(h.controller.previous_step(), Ok(1));
    assert_eq!(h.controller.next_step(), Ok(2));
    sleep(Duration::from_millis(1500)).await;

    assert_eq!(
        h.backend.call_kinds().last(),
        Some(&BackendCall::SaveDraft { step: 2 })
    );
    assert_eq!(h.backend.save_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_saves_retry_with_growing_delays_then_fall_back() {
    let backend = ScriptedBackend::new();
    backend.fail_saves(BackendError::Network("connection reset".into()));
    let h = ready(backend).await;

    h.controller.set_field("fullNameEnglish", "Rahim Khan").unwrap();
    sleep(Duration::from_secs(5)).await;

    let saves = h.backend.save_calls();
    assert_eq!(saves.len(), 3);
    let first_gap = saves[1].at - saves[0].at;
    let second_gap = saves[2].at - saves[1].at;
    assert!(second_gap > first_gap);
    assert_eq!(first_gap, Duration::from_millis(500));

    let status = h.controller.snapshot();
    assert_eq!(status.draft.source, DraftSource::Local);
    assert!(status.offline);
    assert!(!status.saving);
    assert!(status.last_error.is_some());

    let local = DraftStorage::new(h.store.clone()).load_draft().unwrap().unwrap();
    assert_eq!(local.form_data, partial_fields());
    assert_eq!(h.notifier.count(NotificationLevel::Error), 0);
}

#[tokio::test(start_paused = true)]
async fn test_later_save_recovers_from_offline() {
    let backend = ScriptedBackend::new();
    backend.fail_saves(BackendError::Network("down".into()));
    let h = ready(backend).await;

    h.controller.set_field("fullNameEnglish", "Rahim").unwrap();
    sleep(Duration::from_secs(5)).await;
    assert!(h.controller.snapshot().offline);

    h.backend.restore_saves();
    h.controller.set_field("fullNameEnglish", "Rahim Khan").unwrap();
    sleep(Duration::from_millis(1500)).await;

    let status = h.controller.snapshot();
    assert!(!status.offline);
    assert_eq!(status.draft.source, DraftSource::Server);
    assert_eq!(status.last_error, None);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failure_is_absorbed_by_retry() {
    let backend =
        ScriptedBackend::new().failing_saves(1, BackendError::Unknown("502 bad gateway".into()));
    let h = ready(backend).await;

    h.controller.set_field("mobile", "01711000000").unwrap();
    sleep(Duration::from_secs(3)).await;

    assert_eq!(h.backend.save_calls().len(), 2);
    assert_eq!(h.controller.snapshot().draft.source, DraftSource::Server);
}

#[tokio::test(start_paused = true)]
async fn test_validation_failure_is_not_retried_and_notifies() {
    let backend =
        ScriptedBackend::new().failing_saves(1, BackendError::Validation("invalid step".into()));
    let h = ready(backend).await;

    h.controller.set_field("mobile", "01711000000").unwrap();
    sleep(Duration::from_secs(3)).await;

    assert_eq!(h.backend.save_calls().len(), 1);
    let status = h.controller.snapshot();
    assert_eq!(status.draft.source, DraftSource::Local);
    assert!(!status.offline);
    assert_eq!(h.notifier.count(NotificationLevel::Error), 1);
}

#[tokio::test(start_paused = true)]
async fn test_only_first_background_save_notifies() {
    let h = ready(ScriptedBackend::new()).await;

    h.controller.set_field("fullNameEnglish", "Rahim").unwrap();
    sleep(Duration::from_millis(1500)).await;
    h.controller.set_field("fatherName", "Karim").unwrap();
    sleep(Duration::from_millis(1500)).await;

    assert_eq!(h.backend.save_calls().len(), 2);
    assert_eq!(h.notifier.count(NotificationLevel::Success), 1);
}

#[tokio::test(start_paused = true)]
async fn test_save_now_bypasses_debounce() {
    let h = ready(ScriptedBackend::new()).await;
    h.controller.set_field("fullNameEnglish", "Rahim").unwrap();

    let outcome = h.controller.save_now().await;

    assert!(matches!(outcome, SaveOutcome::Saved { .. }));
    assert_eq!(h.notifier.last().unwrap().level, NotificationLevel::Success);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(h.backend.save_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_save_now_offers_retry() {
    let backend =
        ScriptedBackend::new().failing_saves(3, BackendError::Network("unreachable".into()));
    let h = ready(backend).await;
    h.controller.set_field("fullNameEnglish", "Rahim").unwrap();

    let outcome = h.controller.save_now().await;

    assert_eq!(
        outcome,
        SaveOutcome::Failed {
            kind: ErrorKind::Network,
            message: "network error: unreachable".into(),
            attempts: 3
        }
    );
    let last = h.notifier.last().unwrap();
    assert_eq!(last.level, NotificationLevel::Error);
    assert_eq!(last.action, Some(NotificationAction::RetrySave));

    assert!(matches!(
        h.controller.save_now().await,
        SaveOutcome::Saved { .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_saves_do_not_overlap() {
    let backend = ScriptedBackend::new().with_save_latency(Duration::from_millis(800));
    let h = ready(backend).await;

    h.controller.set_field("fullNameEnglish", "Rahim").unwrap();
    sleep(Duration::from_millis(1100)).await;
    // First save in flight; this edit schedules a second one
    h.controller.set_field("fatherName", "Karim").unwrap();
    let manual = h.controller.save_now().await;

    assert!(matches!(manual, SaveOutcome::Saved { .. }));
    let saves = h.backend.save_calls();
    assert_eq!(saves.len(), 2);
    assert!(saves[1].at - saves[0].at >= Duration::from_millis(800));
    assert_eq!(
        h.backend.saved_drafts()[1].0.father_name.as_deref(),
        Some("Karim")
    );
}

#[tokio::test(start_paused = true)]
async fn test_submit_cancels_pending_save() {
    let h = ready(ScriptedBackend::new().with_server_draft(admission_test_utils::sample_fields(), 4))
        .await;

    h.controller.set_field("session", "2025-26").unwrap();
    let outcome = h.controller.submit().await;
    sleep(Duration::from_secs(2)).await;

    assert!(matches!(outcome, SubmitOutcome::Submitted(_)));
    assert!(h.backend.save_calls().is_empty());
    assert_eq!(
        h.backend.submitted_payloads()[0].session.as_deref(),
        Some("2025-26")
    );
}

#[tokio::test(start_paused = true)]
async fn test_rejected_submit_restores_pending_save() {
    let backend = ScriptedBackend::new()
        .with_server_draft(admission_test_utils::sample_fields(), 4)
        .with_submit_result(Err(BackendError::Network("down".into())));
    let h = ready(backend).await;

    h.controller.set_field("session", "2025-26").unwrap();
    h.controller.submit().await;
    sleep(Duration::from_secs(2)).await;

    assert_eq!(h.backend.save_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_controller_cancels_pending_save() {
    let Harness {
        controller,
        backend,
        ..
    } = ready(ScriptedBackend::new()).await;

    controller.set_field("fullNameEnglish", "Rahim").unwrap();
    drop(controller);
    sleep(Duration::from_secs(3)).await;

    assert!(backend.save_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_reports_pending_timer() {
    let h = ready(ScriptedBackend::new()).await;

    assert!(!h.controller.cancel());
    h.controller.set_field("fullNameEnglish", "Rahim").unwrap();
    assert!(h.controller.cancel());
    sleep(Duration::from_secs(2)).await;

    assert!(h.backend.save_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_update_fields_closure_edit() {
    let h = ready(ScriptedBackend::new()).await;

    h.controller
        .update_fields(|f| {
            f.present_district = Some("Gazipur".into());
            f.same_as_present = true;
        })
        .unwrap();

    let fields = h.controller.snapshot().draft.fields;
    assert_eq!(fields.present_district.as_deref(), Some("Gazipur"));
    assert!(fields.same_as_present);
}
