//! Draft synchronisation controller
//!
//! Owns the admission draft lifecycle:
//! - Reconciles device and server state on bootstrap
//! - Mirrors every edit to local storage and debounces server saves
//! - Retries saves with backoff and degrades to device-only persistence
//! - Submits once, recovering duplicate submissions from the server

use crate::backend::AdmissionBackend;
use crate::error::SyncError;
use crate::notify::{Notification, NotificationAction, Notifier};
use crate::persistence::{DraftStorage, LocalDraft};
use crate::retry::retry_with_backoff;
use crate::status::{BootstrapOutcome, Phase, SaveOutcome, SubmitOutcome, SyncStatus};
use crate::store::LocalStore;
use admission_core::{
    BackendError, DraftFields, DraftSource, DraftState, ErrorKind, SubmissionPayload,
    SubmissionRecord, SubmitReceipt, SyncConfig,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::AbortHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveTrigger {
    Background,
    Explicit,
}

#[derive(Debug)]
struct PendingSave {
    generation: u64,
    handle: AbortHandle,
}

/// Clears the submit flag on every exit path
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct Inner {
    config: SyncConfig,
    backend: Arc<dyn AdmissionBackend>,
    storage: DraftStorage,
    notifier: Arc<dyn Notifier>,
    status: watch::Sender<SyncStatus>,
    pending_save: Mutex<Option<PendingSave>>,
    timer_generation: AtomicU64,
    /// Serialises saves with each other and with submission
    save_lock: tokio::sync::Mutex<()>,
    submit_in_flight: AtomicBool,
    save_confirmed: AtomicBool,
}

/// Admission draft controller
///
/// One instance per user session. Dropping it cancels the pending debounce
/// timer; a save whose timer already fired runs to completion.
///
/// Edits must be made from inside a tokio runtime so the background save can
/// be scheduled.
#[derive(Debug)]
pub struct DraftSyncController {
    inner: Arc<Inner>,
}

impl DraftSyncController {
    /// Create controller in the loading phase
    #[must_use]
    pub fn new(
        config: SyncConfig,
        backend: Arc<dyn AdmissionBackend>,
        store: Arc<dyn LocalStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (status, _) = watch::channel(SyncStatus::loading());
        Self {
            inner: Arc::new(Inner {
                config,
                backend,
                storage: DraftStorage::new(store),
                notifier,
                status,
                pending_save: Mutex::new(None),
                timer_generation: AtomicU64::new(0),
                save_lock: tokio::sync::Mutex::new(()),
                submit_in_flight: AtomicBool::new(false),
                save_confirmed: AtomicBool::new(false),
            }),
        }
    }

    /// Reconcile device and server state
    ///
    /// # Workflow
    /// 1. Submission recorded on the device → submitted, no network call
    /// 2. Existing admission on the server → adopt it, clear stale drafts
    /// 3. Otherwise load the server draft, falling back to the device copy
    ///
    /// Safe to call repeatedly: once a draft is loaded, later calls return
    /// the same outcome and leave the draft untouched.
    pub async fn bootstrap(&self) -> BootstrapOutcome {
        if let Some(record) = self.inner.current_record() {
            return BootstrapOutcome::Submitted(record);
        }
        if let Some(outcome) = self.inner.loaded_draft() {
            return outcome;
        }

        match self.inner.storage.load_submission() {
            Ok(Some(record)) => {
                tracing::info!(
                    application_id = record.application_id(),
                    "submission recorded on device"
                );
                self.inner.enter_submitted(record.clone());
                return BootstrapOutcome::Submitted(record);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable submission state"),
        }

        match self.inner.backend.check_existing_admission().await {
            Ok(existing) if existing.has_admission => match existing.admission_id {
                Some(id) => {
                    let record = SubmissionRecord::discovered(id);
                    tracing::info!(
                        application_id = record.application_id(),
                        "existing admission found"
                    );
                    self.inner.adopt_submission(record.clone()).await;
                    return BootstrapOutcome::Submitted(record);
                }
                None => tracing::warn!("backend reported an admission without an id"),
            },
            Ok(_) => tracing::debug!("no existing admission"),
            Err(e) => tracing::warn!(error = %e, "existing admission check failed, loading draft"),
        }

        self.inner.load_draft().await
    }

    /// Edit fields through a closure
    ///
    /// The draft is written to local storage before this returns and a
    /// background save is (re)scheduled.
    ///
    /// # Errors
    /// - `SyncError::NotReady` before bootstrap completed
    /// - `SyncError::AlreadySubmitted` after submission
    pub fn update_fields(&self, edit: impl FnOnce(&mut DraftFields)) -> Result<(), SyncError> {
        self.apply_edit(|draft| {
            edit(&mut draft.fields);
            Ok(())
        })
    }

    /// Edit one field by its camelCase name
    ///
    /// # Errors
    /// As [`Self::update_fields`], plus `SyncError::Field` for unknown names
    /// or unparsable values
    pub fn set_field(&self, name: &str, value: &str) -> Result<(), SyncError> {
        self.apply_edit(|draft| draft.fields.set_by_name(name, value).map_err(SyncError::from))
    }

    /// Move to a wizard step; out-of-range steps are clamped
    ///
    /// Returns the step actually applied.
    pub fn set_step(&self, step: u8) -> Result<u8, SyncError> {
        let total = self.inner.config.total_steps;
        let mut applied = step;
        self.apply_edit(|draft| {
            draft.current_step = DraftState::clamp_step(step, total);
            applied = draft.current_step;
            Ok(())
        })?;
        Ok(applied)
    }

    /// Advance one step
    pub fn next_step(&self) -> Result<u8, SyncError> {
        let current = self.inner.status.borrow().draft.current_step;
        self.set_step(current.saturating_add(1))
    }

    /// Go back one step
    pub fn previous_step(&self) -> Result<u8, SyncError> {
        let current = self.inner.status.borrow().draft.current_step;
        self.set_step(current.saturating_sub(1))
    }

    /// Save immediately, bypassing the debounce
    ///
    /// Always notifies: success with the server timestamp, failure with a
    /// retry action.
    pub async fn save_now(&self) -> SaveOutcome {
        self.inner.cancel_pending_save();
        self.inner.run_save(SaveTrigger::Explicit).await
    }

    /// Submit the application
    ///
    /// Cancels the pending background save and waits for an in-flight one
    /// before calling the backend. A duplicate-submission rejection is
    /// recovered by fetching the existing application.
    pub async fn submit(&self) -> SubmitOutcome {
        if self.inner.submit_in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!("submission already in flight");
            return SubmitOutcome::Busy;
        }
        let _in_flight = InFlight(&self.inner.submit_in_flight);
        self.inner.submit().await
    }

    /// Cancel the pending debounce timer
    ///
    /// Returns whether a timer was pending.
    pub fn cancel(&self) -> bool {
        self.inner.cancel_pending_save()
    }

    /// Current state
    #[must_use]
    pub fn snapshot(&self) -> SyncStatus {
        self.inner.status.borrow().clone()
    }

    /// Receive every state change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status.subscribe()
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    fn apply_edit(
        &self,
        edit: impl FnOnce(&mut DraftState) -> Result<(), SyncError>,
    ) -> Result<(), SyncError> {
        let storage = &self.inner.storage;
        let mut result = Err(SyncError::NotReady);

        self.inner.status.send_if_modified(|s| match &s.phase {
            Phase::Loading => false,
            Phase::Submitted { record } => {
                result = Err(SyncError::AlreadySubmitted(
                    record.application_id().to_string(),
                ));
                false
            }
            Phase::Draft => {
                result = edit(&mut s.draft);
                if result.is_err() {
                    return false;
                }
                // Mirrored under the status lock so device writes keep edit order
                if let Err(e) = storage.save_draft(&s.draft.fields, s.draft.current_step) {
                    tracing::warn!(error = %e, "failed to mirror draft locally");
                }
                true
            }
        });

        result?;
        self.inner.schedule_save();
        Ok(())
    }
}

impl Drop for DraftSyncController {
    fn drop(&mut self) {
        self.inner.cancel_pending_save();
    }
}

impl Inner {
    fn current_record(&self) -> Option<SubmissionRecord> {
        self.status.borrow().phase.record().cloned()
    }

    /// Outcome of an earlier bootstrap while the draft is live; the
    /// in-memory draft may hold edits not yet saved anywhere else
    fn loaded_draft(&self) -> Option<BootstrapOutcome> {
        let status = self.status.borrow();
        matches!(status.phase, Phase::Draft).then(|| BootstrapOutcome::Draft {
            source: status.draft.source,
            offline: status.offline,
        })
    }

    async fn load_draft(&self) -> BootstrapOutcome {
        let total = self.config.total_steps;
        let from_device = |local: LocalDraft| {
            DraftState::from_parts(
                local.form_data,
                DraftState::clamp_step(local.current_step, total),
                DraftSource::Local,
            )
        };

        let local = self.storage.load_draft().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable local draft");
            None
        });

        let (draft, offline, last_error) = match self.backend.get_draft().await {
            Ok(Some(server)) => {
                let step = DraftState::clamp_step(server.current_step, total);
                let draft = DraftState::from_parts(server.draft_data, step, DraftSource::Server)
                    .with_saved_at(server.saved_at);
                if let Err(e) = self.storage.save_draft(&draft.fields, draft.current_step) {
                    tracing::warn!(error = %e, "failed to mirror server draft locally");
                }
                (draft, false, None)
            }
            Ok(None) => (local.map_or_else(DraftState::new, from_device), false, None),
            Err(e) => {
                tracing::warn!(error = %e, "draft fetch failed, working offline");
                self.notifier.notify(Notification::warning(
                    "Working offline; changes are kept on this device",
                ));
                let mut draft = local.map_or_else(DraftState::new, from_device);
                draft.source = DraftSource::Local;
                (draft, true, Some(e.to_string()))
            }
        };

        let source = draft.source;
        self.status.send_modify(|s| {
            s.phase = Phase::Draft;
            s.draft = draft;
            s.offline = offline;
            s.last_error = last_error;
        });
        tracing::info!(?source, offline, "draft loaded");

        BootstrapOutcome::Draft { source, offline }
    }

    fn schedule_save(self: &Arc<Self>) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no async runtime, background save not scheduled");
            return;
        };
        let delay = self.config.debounce();

        let mut pending = self.pending_save.lock();
        if let Some(previous) = pending.take() {
            previous.handle.abort();
        }
        let generation = self.timer_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let inner = Arc::clone(self);
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // Once fired, the save is no longer cancellable by new edits
            let is_current = {
                let mut pending = inner.pending_save.lock();
                let current = pending
                    .as_ref()
                    .is_some_and(|p| p.generation == generation);
                if current {
                    *pending = None;
                }
                current
            };
            if is_current {
                inner.run_save(SaveTrigger::Background).await;
            }
        });

        *pending = Some(PendingSave {
            generation,
            handle: task.abort_handle(),
        });
        tracing::debug!(generation, debounce_ms = self.config.debounce_ms, "save scheduled");
    }

    fn cancel_pending_save(&self) -> bool {
        match self.pending_save.lock().take() {
            Some(pending) => {
                pending.handle.abort();
                tracing::debug!(generation = pending.generation, "pending save cancelled");
                true
            }
            None => false,
        }
    }

    async fn run_save(&self, trigger: SaveTrigger) -> SaveOutcome {
        let _guard = self.save_lock.lock().await;

        let snapshot = {
            let status = self.status.borrow();
            matches!(status.phase, Phase::Draft)
                .then(|| (status.draft.fields.clone(), status.draft.current_step))
        };
        let Some((fields, step)) = snapshot else {
            return SaveOutcome::Skipped;
        };

        self.status.send_modify(|s| s.saving = true);
        let backend = &self.backend;
        let result = retry_with_backoff(&self.config.retry, "save_draft", || {
            backend.save_draft(&fields, step)
        })
        .await;

        match result {
            Ok(ack) => {
                self.status.send_modify(|s| {
                    s.saving = false;
                    if matches!(s.phase, Phase::Draft) {
                        s.draft.saved_at = Some(ack.saved_at);
                        s.draft.source = DraftSource::Server;
                        s.offline = false;
                        s.last_error = None;
                    }
                });

                let first = !self.save_confirmed.swap(true, Ordering::SeqCst);
                if trigger == SaveTrigger::Explicit || first {
                    self.notifier.notify(Notification::success(format!(
                        "Draft saved at {}",
                        ack.saved_at.format("%H:%M:%S UTC")
                    )));
                }
                tracing::debug!(?trigger, saved_at = %ack.saved_at, "draft saved");
                SaveOutcome::Saved {
                    saved_at: ack.saved_at,
                }
            }
            Err(failure) => {
                let kind = failure.error.kind();
                let message = failure.error.to_string();
                self.status.send_modify(|s| {
                    s.saving = false;
                    if matches!(s.phase, Phase::Draft) {
                        s.draft.source = DraftSource::Local;
                        s.offline = failure.error.is_network();
                        s.last_error = Some(message.clone());
                    }
                });

                if trigger == SaveTrigger::Explicit || kind == ErrorKind::Validation {
                    self.notifier.notify(
                        Notification::error(format!("Could not save draft: {message}"))
                            .with_action(NotificationAction::RetrySave),
                    );
                } else {
                    tracing::warn!(
                        attempts = failure.attempts,
                        error = %failure.error,
                        "background save failed, draft kept on device"
                    );
                }
                SaveOutcome::Failed {
                    kind,
                    message,
                    attempts: failure.attempts,
                }
            }
        }
    }

    async fn submit(self: &Arc<Self>) -> SubmitOutcome {
        let fields = {
            let status = self.status.borrow();
            match &status.phase {
                Phase::Draft => status.draft.fields.clone(),
                Phase::Submitted { record } => return SubmitOutcome::Submitted(record.clone()),
                Phase::Loading => return SubmitOutcome::NotReady,
            }
        };

        let payload = match SubmissionPayload::from_fields(&fields) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(error = %e, "submission payload incomplete");
                let message = e.to_string();
                self.status
                    .send_modify(|s| s.last_error = Some(message.clone()));
                self.notifier.notify(Notification::error(message.clone()));
                return SubmitOutcome::Rejected {
                    kind: ErrorKind::Validation,
                    message,
                };
            }
        };

        let had_pending_save = self.cancel_pending_save();
        let _save_guard = self.save_lock.lock().await;
        self.status.send_modify(|s| s.submitting = true);
        tracing::info!("submitting application");

        let outcome = match self.backend.submit_application(&payload).await {
            Ok(receipt) => {
                let record = record_from_receipt(receipt);
                self.adopt_submission(record.clone()).await;
                self.notifier.notify(Notification::success(format!(
                    "Application submitted. Your application ID is {}",
                    record.application_id()
                )));
                SubmitOutcome::Submitted(record)
            }
            Err(error) if error.is_duplicate() => self.recover_duplicate(error).await,
            Err(error) => self.fail_submission(&error),
        };

        if had_pending_save && !matches!(outcome, SubmitOutcome::Submitted(_)) {
            self.schedule_save();
        }
        outcome
    }

    async fn recover_duplicate(&self, error: BackendError) -> SubmitOutcome {
        tracing::info!(error = %error, "duplicate submission, fetching existing application");
        match self.backend.get_my_admission().await {
            Ok(summary) => {
                let record = SubmissionRecord::discovered(summary.id);
                self.adopt_submission(record.clone()).await;
                self.notifier.notify(Notification::info(format!(
                    "You have already submitted an application (ID {})",
                    record.application_id()
                )));
                SubmitOutcome::Submitted(record)
            }
            Err(lookup) => {
                tracing::warn!(error = %lookup, "existing application lookup failed");
                self.fail_submission(&error)
            }
        }
    }

    fn fail_submission(&self, error: &BackendError) -> SubmitOutcome {
        let kind = error.kind();
        let message = error.to_string();
        if kind == ErrorKind::Unknown {
            tracing::error!(error = %error, "submission failed");
        } else {
            tracing::warn!(error = %error, %kind, "submission rejected");
        }

        self.status.send_modify(|s| {
            s.submitting = false;
            s.last_error = Some(message.clone());
            if error.is_network() {
                s.offline = true;
            }
        });

        let mut notification = Notification::error(message.clone());
        if kind != ErrorKind::Validation {
            notification = notification.with_action(NotificationAction::RetrySubmit);
        }
        self.notifier.notify(notification);

        SubmitOutcome::Rejected { kind, message }
    }

    /// Persist the record, drop every draft copy and enter the submitted phase
    async fn adopt_submission(&self, record: SubmissionRecord) {
        if let Err(e) = self.storage.save_submission(&record) {
            tracing::warn!(error = %e, "failed to record submission locally");
        }
        if let Err(e) = self.storage.clear_draft() {
            tracing::warn!(error = %e, "failed to clear local draft");
        }
        self.enter_submitted(record);

        // Best effort; a stale server draft is ignored once submitted
        if let Err(e) = self.backend.clear_draft().await {
            tracing::debug!(error = %e, "server draft cleanup failed");
        }
    }

    fn enter_submitted(&self, record: SubmissionRecord) {
        self.cancel_pending_save();
        self.status.send_modify(|s| {
            s.phase = Phase::Submitted { record };
            s.saving = false;
            s.submitting = false;
            s.offline = false;
            s.last_error = None;
        });
    }
}

fn record_from_receipt(receipt: SubmitReceipt) -> SubmissionRecord {
    if receipt.already_submitted.unwrap_or(false) {
        SubmissionRecord::discovered(receipt.id)
    } else {
        SubmissionRecord::submitted(receipt.id)
    }
}
