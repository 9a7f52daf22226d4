//! Orchestration for one monthly send.
//!
//! A run moves through `Validating → CheckingRunState → Packaging → Sending`
//! and ends either `Done` or `Aborted` at the stage that stopped it. Nothing
//! is retried; every path returns a [`RunOutcome`].

use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::collect::{CollectedFolder, SourceFolders, collect_attachments};
use crate::core::period::TargetPeriod;
use crate::core::settings::{Settings, ValidationError, validate};
use crate::core::subject::mail_subject;
use crate::core::types::{Attachment, Stage};
use crate::exit_codes;
use crate::io::archiver::Archiver;
use crate::io::mailer::{MailError, MailRequest, Mailer};
use crate::io::run_state::RunStateStore;

/// Inputs for a single run.
#[derive(Debug, Clone)]
pub struct AutomationRequest {
    /// Persisted settings, `None` when none were ever saved.
    pub settings: Option<Settings>,
    /// Calendar date the run is executed on.
    pub today: NaiveDate,
    /// Where the two archives are written.
    pub archive_dir: PathBuf,
}

/// Why a run stopped. Display strings are what the operator sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ValidationError),
    #[error("Arquivos xml já enviados este mês.")]
    AlreadyRun { month: u32 },
    #[error("Nenhum arquivo encontrado para ser enviado.")]
    NoAttachments,
    #[error("Erro ao enviar email: {0}")]
    Transport(MailError),
    #[error("Erro ao acessar estado de execução: {0}")]
    State(String),
}

/// Details of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Calendar month consumed by this run.
    pub claimed_month: u32,
    pub period: TargetPeriod,
    pub folders: Vec<CollectedFolder>,
    pub attachments: Vec<Attachment>,
    pub subject: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Done(RunReport),
    Aborted { stage: Stage, error: RunError },
}

/// Shape handed back to the invoking shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub ok: bool,
    pub message: String,
}

pub const SUCCESS_MESSAGE: &str = "Sucesso";

impl RunOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, RunOutcome::Done(_))
    }

    pub fn result(&self) -> RunResult {
        match self {
            RunOutcome::Done(_) => RunResult {
                ok: true,
                message: SUCCESS_MESSAGE.to_string(),
            },
            RunOutcome::Aborted { error, .. } => RunResult {
                ok: false,
                message: error.to_string(),
            },
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Done(_) => exit_codes::OK,
            RunOutcome::Aborted { error, .. } => match error {
                RunError::Config(_) | RunError::State(_) => exit_codes::INVALID,
                RunError::AlreadyRun { .. } => exit_codes::ALREADY_RUN,
                RunError::NoAttachments => exit_codes::NOTHING_TO_SEND,
                RunError::Transport(_) => exit_codes::SEND_FAILED,
            },
        }
    }
}

/// Execute one run to a terminal state.
///
/// The month is claimed before anything is packaged and is not released
/// when packaging or sending fails afterwards.
#[instrument(skip_all, fields(today = %request.today))]
pub fn run_automation<S: RunStateStore, A: Archiver, M: Mailer>(
    request: &AutomationRequest,
    store: &S,
    archiver: &A,
    mailer: &M,
) -> RunOutcome {
    match drive(request, store, archiver, mailer) {
        Ok(report) => {
            info!(
                period = %report.period,
                attachments = report.attachments.len(),
                "run done"
            );
            RunOutcome::Done(report)
        }
        Err((stage, error)) => {
            warn!(?stage, %error, "run aborted");
            RunOutcome::Aborted { stage, error }
        }
    }
}

fn drive<S: RunStateStore, A: Archiver, M: Mailer>(
    request: &AutomationRequest,
    store: &S,
    archiver: &A,
    mailer: &M,
) -> Result<RunReport, (Stage, RunError)> {
    debug!(stage = ?Stage::Validating, "entering stage");
    let settings = validate(request.settings.as_ref()).map_err(at(Stage::Validating))?;

    debug!(stage = ?Stage::CheckingRunState, "entering stage");
    // Gate on the calendar month, before shifting to the target period.
    let month = request.today.month();
    let claimed = store
        .claim_month(month)
        .map_err(|err| (Stage::CheckingRunState, RunError::State(format!("{err:#}"))))?;
    if !claimed {
        return Err((Stage::CheckingRunState, RunError::AlreadyRun { month }));
    }

    debug!(stage = ?Stage::Packaging, "entering stage");
    let period = TargetPeriod::preceding(request.today);
    let sources = SourceFolders::for_period(&settings, period);
    let collection = collect_attachments(archiver, &sources, &request.archive_dir);
    let attachments = collection.attachments();
    if attachments.is_empty() {
        return Err((Stage::Packaging, RunError::NoAttachments));
    }

    debug!(stage = ?Stage::Sending, "entering stage");
    let subject = mail_subject(period, &settings.name, &settings.cnpj);
    let mail = MailRequest {
        from: settings.email.clone(),
        password: settings.password.clone(),
        to: settings.contabilidade.clone(),
        subject: subject.clone(),
        attachments: attachments.clone(),
    };
    mailer
        .send(&mail)
        .map_err(|err| (Stage::Sending, RunError::Transport(err)))?;

    Ok(RunReport {
        claimed_month: month,
        period,
        folders: collection.folders,
        attachments,
        subject,
    })
}

fn at<E: Into<RunError>>(stage: Stage) -> impl FnOnce(E) -> (Stage, RunError) {
    move |err| (stage, err.into())
}
