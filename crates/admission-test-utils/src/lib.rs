//! Testing utilities for the admission workspace
//!
//! Scripted backend, recording notifier and draft fixtures.

#![allow(missing_docs)]

use admission_core::{
    AdmissionSummary, BackendError, DraftFields, ExistingAdmission, Gender, SaveAck, ServerDraft,
    Shift, SubmissionPayload, SubmitReceipt, SyncConfig,
};
use admission_sync::{
    AdmissionBackend, DraftSyncController, LocalStore, MemoryStore, Notification,
    NotificationLevel, Notifier,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Backend operation, as recorded by [`ScriptedBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    CheckExisting,
    GetDraft,
    SaveDraft { step: u8 },
    ClearDraft,
    Submit,
    GetMyAdmission,
}

#[derive(Debug, Clone)]
pub struct CallRecord {
    pub call: BackendCall,
    pub at: Instant,
}

#[derive(Debug)]
struct Script {
    existing: Result<ExistingAdmission, BackendError>,
    draft: Result<Option<ServerDraft>, BackendError>,
    save_failures: VecDeque<BackendError>,
    save_error: Option<BackendError>,
    save_latency: Duration,
    clear: Result<(), BackendError>,
    submit: VecDeque<Result<SubmitReceipt, BackendError>>,
    my_admission: Result<AdmissionSummary, BackendError>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            existing: Ok(ExistingAdmission::none()),
            draft: Ok(None),
            save_failures: VecDeque::new(),
            save_error: None,
            save_latency: Duration::ZERO,
            clear: Ok(()),
            submit: VecDeque::new(),
            my_admission: Err(BackendError::NotFound("no admission".into())),
        }
    }
}

/// In-memory backend answering from a script and recording every call
///
/// Defaults: no existing admission, no server draft, saves succeed,
/// submission returns `APP-1`.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    script: Mutex<Script>,
    calls: Mutex<Vec<CallRecord>>,
    saved: Mutex<Vec<(DraftFields, u8)>>,
    submitted: Mutex<Vec<SubmissionPayload>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing_admission(self, id: &str) -> Self {
        self.script.lock().existing = Ok(ExistingAdmission::found(id));
        self
    }

    pub fn failing_existing_check(self, error: BackendError) -> Self {
        self.script.lock().existing = Err(error);
        self
    }

    pub fn with_server_draft(self, fields: DraftFields, step: u8) -> Self {
        self.script.lock().draft = Ok(Some(ServerDraft {
            draft_data: fields,
            current_step: step,
            saved_at: Some(timestamp(0)),
        }));
        self
    }

    pub fn failing_get_draft(self, error: BackendError) -> Self {
        self.script.lock().draft = Err(error);
        self
    }

    /// Fail the next `count` saves, then succeed
    pub fn failing_saves(self, count: usize, error: BackendError) -> Self {
        self.script
            .lock()
            .save_failures
            .extend(std::iter::repeat(error).take(count));
        self
    }

    pub fn with_save_latency(self, latency: Duration) -> Self {
        self.script.lock().save_latency = latency;
        self
    }

    /// Queue a submission result; the queue falls back to `APP-1` when empty
    pub fn with_submit_result(self, result: Result<SubmitReceipt, BackendError>) -> Self {
        self.script.lock().submit.push_back(result);
        self
    }

    pub fn with_my_admission(self, id: &str) -> Self {
        self.script.lock().my_admission = Ok(AdmissionSummary::new(id));
        self
    }

    pub fn failing_clear(self, error: BackendError) -> Self {
        self.script.lock().clear = Err(error);
        self
    }

    /// Fail every save until [`Self::restore_saves`]
    pub fn fail_saves(&self, error: BackendError) {
        self.script.lock().save_error = Some(error);
    }

    pub fn restore_saves(&self) {
        let mut script = self.script.lock();
        script.save_error = None;
        script.save_failures.clear();
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.calls.lock().clone()
    }

    pub fn call_kinds(&self) -> Vec<BackendCall> {
        self.calls.lock().iter().map(|c| c.call.clone()).collect()
    }

    pub fn save_calls(&self) -> Vec<CallRecord> {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c.call, BackendCall::SaveDraft { .. }))
            .cloned()
            .collect()
    }

    pub fn count(&self, call: &BackendCall) -> usize {
        self.calls.lock().iter().filter(|c| &c.call == call).count()
    }

    pub fn network_call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Fields of every save that reached the backend, in order
    pub fn saved_drafts(&self) -> Vec<(DraftFields, u8)> {
        self.saved.lock().clone()
    }

    pub fn submitted_payloads(&self) -> Vec<SubmissionPayload> {
        self.submitted.lock().clone()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().push(CallRecord {
            call,
            at: Instant::now(),
        });
    }
}

#[async_trait]
impl AdmissionBackend for ScriptedBackend {
    async fn check_existing_admission(&self) -> Result<ExistingAdmission, BackendError> {
        self.record(BackendCall::CheckExisting);
        self.script.lock().existing.clone()
    }

    async fn get_draft(&self) -> Result<Option<ServerDraft>, BackendError> {
        self.record(BackendCall::GetDraft);
        self.script.lock().draft.clone()
    }

    async fn save_draft(&self, fields: &DraftFields, current_step: u8) -> Result<SaveAck, BackendError> {
        self.record(BackendCall::SaveDraft { step: current_step });
        let latency = self.script.lock().save_latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let failure = {
            let mut script = self.script.lock();
            script
                .save_failures
                .pop_front()
                .or_else(|| script.save_error.clone())
        };
        if let Some(error) = failure {
            return Err(error);
        }

        let mut saved = self.saved.lock();
        saved.push((fields.clone(), current_step));
        Ok(SaveAck {
            saved_at: timestamp(saved.len() as i64),
        })
    }

    async fn clear_draft(&self) -> Result<(), BackendError> {
        self.record(BackendCall::ClearDraft);
        self.script.lock().clear.clone()
    }

    async fn submit_application(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<SubmitReceipt, BackendError> {
        self.record(BackendCall::Submit);
        self.submitted.lock().push(payload.clone());
        self.script
            .lock()
            .submit
            .pop_front()
            .unwrap_or_else(|| Ok(SubmitReceipt::new("APP-1")))
    }

    async fn get_my_admission(&self) -> Result<AdmissionSummary, BackendError> {
        self.record(BackendCall::GetMyAdmission);
        self.script.lock().my_admission.clone()
    }
}

/// Notifier keeping every notification for assertions
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.notifications.lock().last().cloned()
    }

    pub fn count(&self, level: NotificationLevel) -> usize {
        self.notifications
            .lock()
            .iter()
            .filter(|n| n.level == level)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}

/// Controller wired to test doubles
pub struct Harness {
    pub controller: DraftSyncController,
    pub backend: Arc<ScriptedBackend>,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new(backend: ScriptedBackend) -> Self {
        Self::with_store(backend, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(backend: ScriptedBackend, store: Arc<MemoryStore>) -> Self {
        let backend = Arc::new(backend);
        let notifier = Arc::new(RecordingNotifier::new());
        let controller = DraftSyncController::new(
            SyncConfig::default(),
            backend.clone(),
            store.clone() as Arc<dyn LocalStore>,
            notifier.clone(),
        );
        Self {
            controller,
            backend,
            store,
            notifier,
        }
    }
}

/// Fixed timestamp offset by `seconds`
pub fn timestamp(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_768_471_200 + seconds, 0).unwrap()
}

/// Complete, submittable draft
pub fn sample_fields() -> DraftFields {
    DraftFields {
        full_name_bangla: Some("রহিম খান".into()),
        full_name_english: Some("Rahim Khan".into()),
        father_name: Some("Karim Khan".into()),
        mother_name: Some("Amena Begum".into()),
        date_of_birth: Some("2007-03-14".into()),
        gender: Some(Gender::Male),
        religion: Some("Islam".into()),
        mobile: Some("01711000000".into()),
        email: Some("rahim@example.com".into()),
        present_division: Some("Dhaka".into()),
        present_district: Some("Gazipur".into()),
        present_upazila: Some("Kaliakair".into()),
        same_as_present: true,
        ssc_board: Some("Dhaka".into()),
        ssc_roll: Some("123456".into()),
        ssc_gpa: Some("4.75".into()),
        ssc_passing_year: Some("2023".into()),
        department: Some("Computer Technology".into()),
        shift: Some(Shift::Morning),
        ..DraftFields::default()
    }
}

/// Draft with only the first wizard step started
pub fn partial_fields() -> DraftFields {
    DraftFields {
        full_name_english: Some("Rahim Khan".into()),
        ..DraftFields::default()
    }
}
