//! One-shot pull, backup, commit and push commands

use std::sync::Arc;

use vault_sync::{BackupOutcome, BackupRequest, Coordinator, PullOutcome, PushOutcome};

use crate::error::{CliError, Result};

pub async fn run_pull(coordinator: &Arc<Coordinator>) -> Result<()> {
    let outcome = coordinator.pull().await.map_err(|_| CliError::Reported)?;
    match outcome {
        PullOutcome::UpToDate | PullOutcome::Pulled { .. } => Ok(()),
        PullOutcome::NotReady | PullOutcome::Conflicted { .. } => Err(CliError::Reported),
    }
}

pub async fn run_backup(coordinator: &Arc<Coordinator>, message: Option<String>) -> Result<()> {
    let request = BackupRequest {
        message,
        ..BackupRequest::manual()
    };
    let outcome = coordinator
        .backup(request)
        .await
        .map_err(|_| CliError::Reported)?;
    backup_result(outcome)
}

pub async fn run_commit(coordinator: &Arc<Coordinator>, message: Option<String>) -> Result<()> {
    let outcome = coordinator
        .commit(message)
        .await
        .map_err(|_| CliError::Reported)?;
    backup_result(outcome)
}

pub async fn run_push(coordinator: &Arc<Coordinator>) -> Result<()> {
    let outcome = coordinator.push().await.map_err(|_| CliError::Reported)?;
    push_result(outcome)
}

fn backup_result(outcome: BackupOutcome) -> Result<()> {
    match outcome {
        BackupOutcome::Completed { push: None, .. } => Ok(()),
        BackupOutcome::Completed {
            push: Some(push), ..
        } => push_result(push),
        BackupOutcome::NotReady | BackupOutcome::Conflicted { .. } => Err(CliError::Reported),
    }
}

fn push_result(outcome: PushOutcome) -> Result<()> {
    match outcome {
        PushOutcome::Pushed { .. } | PushOutcome::NothingToPush | PushOutcome::Disabled => Ok(()),
        PushOutcome::NotReady | PushOutcome::NoUpstream | PushOutcome::Conflicted { .. } => {
            Err(CliError::Reported)
        }
    }
}
