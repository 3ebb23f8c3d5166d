//! Command tests
//!
//! Commands run against the scripted backend and write into a buffer.
//!
use admission_cli::commands;
use admission_core::{BackendError, SubmissionRecord};
use admission_sync::{DraftStorage, LocalStore, DRAFT_KEY, SUBMISSION_KEY};
use admission_test_utils::{partial_fields, sample_fields, Harness, ScriptedBackend};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn output(buf: Vec<u8>) -> String {
    String::from_utf8(buf).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_status_json_reports_draft() {
    let h = Harness::new(ScriptedBackend::new().with_server_draft(partial_fields(), 2));
    let mut out = Vec::new();

    commands::status(&h.controller, true, &mut out).await.unwrap();

    let report: serde_json::Value = serde_json::from_str(&output(out)).unwrap();
    assert_eq!(report["phase"], "draft");
    assert_eq!(report["current_step"], 2);
    assert_eq!(report["total_steps"], 4);
    assert_eq!(report["source"], "server");
    assert_eq!(report["filled_fields"], 1);
    assert_eq!(report["offline"], false);
}

#[tokio::test(start_paused = true)]
async fn test_status_text_shows_submission() {
    let h = Harness::new(ScriptedBackend::new().with_existing_admission("APP-9"));
    let mut out = Vec::new();

    commands::status(&h.controller, false, &mut out).await.unwrap();

    assert_eq!(output(out), "Application submitted: APP-9\n");
}

#[tokio::test(start_paused = true)]
async fn test_set_saves_immediately() {
    let h = Harness::new(ScriptedBackend::new());
    let mut out = Vec::new();

    commands::set_field(&h.controller, "fullNameEnglish", "Rahim Khan", &mut out)
        .await
        .unwrap();

    assert!(output(out).starts_with("Draft saved at "));
    assert_eq!(h.backend.saved_drafts()[0].0, partial_fields());
}

#[tokio::test(start_paused = true)]
async fn test_set_reports_device_only_save() {
    let backend = ScriptedBackend::new();
    backend.fail_saves(BackendError::Network("unreachable".into()));
    let h = Harness::new(backend);
    let mut out = Vec::new();

    commands::set_field(&h.controller, "mobile", "01711000000", &mut out)
        .await
        .unwrap();

    assert!(output(out).contains("kept on this device"));
    assert!(h.store.get(DRAFT_KEY).unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_set_unknown_field_fails() {
    let h = Harness::new(ScriptedBackend::new());
    let mut out = Vec::new();

    let err = commands::set_field(&h.controller, "nickname", "R", &mut out)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("nickname"));
}

#[tokio::test(start_paused = true)]
async fn test_set_after_submission_fails() {
    let h = Harness::new(ScriptedBackend::new().with_existing_admission("APP-9"));
    let mut out = Vec::new();

    let err = commands::set_field(&h.controller, "mobile", "017", &mut out)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("APP-9"));
}

#[tokio::test(start_paused = true)]
async fn test_step_is_clamped() {
    let h = Harness::new(ScriptedBackend::new());
    let mut out = Vec::new();

    commands::set_step(&h.controller, 7, &mut out).await.unwrap();

    assert!(output(out).starts_with("Step 4 of 4\n"));
}

#[tokio::test(start_paused = true)]
async fn test_submit_prints_application_id() {
    let h = Harness::new(ScriptedBackend::new().with_server_draft(sample_fields(), 4));
    let mut out = Vec::new();

    commands::submit(&h.controller, &mut out).await.unwrap();

    assert_eq!(output(out), "Application submitted: APP-1\n");
}

#[tokio::test(start_paused = true)]
async fn test_submit_rejection_is_error() {
    let backend = ScriptedBackend::new()
        .with_server_draft(sample_fields(), 4)
        .with_submit_result(Err(BackendError::Validation("Mobile number is invalid".into())));
    let h = Harness::new(backend);
    let mut out = Vec::new();

    let err = commands::submit(&h.controller, &mut out).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "submission rejected (validation): Mobile number is invalid"
    );
}

#[tokio::test(start_paused = true)]
async fn test_reset_clears_device_state() {
    let h = Harness::new(ScriptedBackend::new());
    let storage = DraftStorage::new(h.store.clone());
    storage.save_draft(&partial_fields(), 2).unwrap();
    storage
        .save_submission(&SubmissionRecord::submitted("X1"))
        .unwrap();
    let mut out = Vec::new();

    commands::reset(h.store.clone() as Arc<dyn LocalStore>, &mut out).unwrap();

    assert!(h.store.get(DRAFT_KEY).unwrap().is_none());
    assert!(h.store.get(SUBMISSION_KEY).unwrap().is_none());
}
