//! Subcommand implementations
//!
//! Each command bootstraps the controller first, so it always acts on the
//! reconciled device/server state.

use admission_core::{DraftSource, SubmissionRecord};
use admission_sync::{
    BootstrapOutcome, DraftStorage, DraftSyncController, LocalStore, Phase, SaveOutcome,
    SubmitOutcome, SyncStatus,
};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

/// Printable controller state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub phase: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    pub current_step: u8,
    pub total_steps: u8,
    pub source: DraftSource,
    pub offline: bool,
    pub filled_fields: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl StatusReport {
    pub fn from_status(status: &SyncStatus, total_steps: u8) -> Self {
        let phase = match status.phase {
            Phase::Loading => "loading",
            Phase::Draft => "draft",
            Phase::Submitted { .. } => "submitted",
        };
        Self {
            phase,
            application_id: status
                .phase
                .record()
                .map(|r| r.application_id().to_string()),
            current_step: status.draft.current_step,
            total_steps,
            source: status.draft.source,
            offline: status.offline,
            filled_fields: status.draft.fields.filled_count(),
            saved_at: status.draft.saved_at,
            last_error: status.last_error.clone(),
        }
    }

    fn render(&self, out: &mut impl Write) -> std::io::Result<()> {
        if let Some(id) = &self.application_id {
            writeln!(out, "Application submitted: {id}")?;
            return Ok(());
        }
        writeln!(out, "Phase:   {}", self.phase)?;
        writeln!(out, "Step:    {} of {}", self.current_step, self.total_steps)?;
        writeln!(out, "Fields:  {} filled", self.filled_fields)?;
        writeln!(out, "Source:  {:?}", self.source)?;
        match self.saved_at {
            Some(at) => writeln!(out, "Saved:   {}", at.to_rfc3339())?,
            None => writeln!(out, "Saved:   never")?,
        }
        if self.offline {
            writeln!(out, "Offline: changes are kept on this device")?;
        }
        if let Some(error) = &self.last_error {
            writeln!(out, "Error:   {error}")?;
        }
        Ok(())
    }
}

/// `status`
pub async fn status(controller: &DraftSyncController, json: bool, out: &mut impl Write) -> Result<()> {
    controller.bootstrap().await;
    let report = StatusReport::from_status(&controller.snapshot(), controller.config().total_steps);
    if json {
        serde_json::to_writer_pretty(&mut *out, &report).context("encoding status")?;
        writeln!(out)?;
    } else {
        report.render(out)?;
    }
    Ok(())
}

/// `set <field> <value>`
pub async fn set_field(
    controller: &DraftSyncController,
    name: &str,
    value: &str,
    out: &mut impl Write,
) -> Result<()> {
    ensure_draft(controller).await?;
    controller
        .set_field(name, value)
        .with_context(|| format!("cannot set {name}"))?;
    report_save(controller.save_now().await, out)
}

/// `step <n>`
pub async fn set_step(controller: &DraftSyncController, step: u8, out: &mut impl Write) -> Result<()> {
    ensure_draft(controller).await?;
    let applied = controller.set_step(step)?;
    writeln!(out, "Step {applied} of {}", controller.config().total_steps)?;
    report_save(controller.save_now().await, out)
}

/// `submit`
///
/// # Errors
/// Fails when the backend or payload validation rejects the application
pub async fn submit(controller: &DraftSyncController, out: &mut impl Write) -> Result<()> {
    if let BootstrapOutcome::Submitted(record) = controller.bootstrap().await {
        return print_submitted(&record, out);
    }

    match controller.submit().await {
        SubmitOutcome::Submitted(record) => print_submitted(&record, out),
        SubmitOutcome::Rejected { kind, message } => {
            bail!("submission rejected ({kind}): {message}")
        }
        SubmitOutcome::Busy => bail!("a submission is already in progress"),
        SubmitOutcome::NotReady => bail!("draft is not loaded"),
    }
}

/// `reset`: forget everything stored on this device
pub fn reset(store: Arc<dyn LocalStore>, out: &mut impl Write) -> Result<()> {
    let storage = DraftStorage::new(store);
    storage.clear_draft().context("clearing local draft")?;
    storage
        .clear_submission()
        .context("clearing local submission state")?;
    writeln!(out, "Local draft and submission state removed")?;
    Ok(())
}

async fn ensure_draft(controller: &DraftSyncController) -> Result<()> {
    match controller.bootstrap().await {
        BootstrapOutcome::Submitted(record) => {
            bail!("application {} is already submitted", record.application_id())
        }
        BootstrapOutcome::Draft { offline: true, .. } => {
            tracing::warn!("backend unreachable, editing the device copy");
            Ok(())
        }
        BootstrapOutcome::Draft { .. } => Ok(()),
    }
}

fn report_save(outcome: SaveOutcome, out: &mut impl Write) -> Result<()> {
    match outcome {
        SaveOutcome::Saved { saved_at } => writeln!(out, "Draft saved at {}", saved_at.to_rfc3339())?,
        SaveOutcome::Failed {
            message, attempts, ..
        } => writeln!(
            out,
            "Draft kept on this device; server save failed after {attempts} attempt(s): {message}"
        )?,
        SaveOutcome::Skipped => writeln!(out, "Nothing to save")?,
    }
    Ok(())
}

fn print_submitted(record: &SubmissionRecord, out: &mut impl Write) -> Result<()> {
    if record.already_submitted() {
        writeln!(out, "Application already submitted: {}", record.application_id())?;
    } else {
        writeln!(out, "Application submitted: {}", record.application_id())?;
    }
    Ok(())
}
