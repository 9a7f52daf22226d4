//! Month-over-month lifecycle tests.
//!
//! These tests drive `run_automation` with the real zip archiver and the
//! file-backed run state, substituting only the mail transport, to verify
//! the monthly gate, folder resolution and archive contents end to end.

use std::fs::{self, File};
use std::net::TcpListener;
use std::time::Duration;

use sat_sender::automation::{AutomationRequest, RunError, RunOutcome, run_automation};
use sat_sender::collect::FolderOutcome;
use sat_sender::core::types::{FolderKind, Stage};
use sat_sender::io::archiver::ZipArchiver;
use sat_sender::io::mailer::{MailError, SmtpMailer};
use sat_sender::io::run_state::{FileRunStateStore, RunState, RunStateStore, load_run_state};
use sat_sender::test_support::{RecordingMailer, TestHome, date, sample_settings, write_document};
use zip::ZipArchive;

/// Scenario: first-ever run on 2024-03-15, only February cancellations exist.
///
/// Expected: success, one `Cancelados.zip` attachment holding the documents,
/// subject mentions `2/2024`, run state records March.
#[test]
fn first_run_sends_available_cancellations() {
    let home = TestHome::new().expect("home");
    let vendas = home.root().join("CFeVenda");
    let cancelados = home.root().join("CFeCanc");
    write_document(&cancelados, 2024, 2, "canc-001.xml", "<CFeCanc/>");
    write_document(&cancelados, 2024, 2, "canc-002.xml", "<CFeCanc/>");

    let store = FileRunStateStore::new(&home.paths.run_state_path);
    let mailer = RecordingMailer::default();
    let request = AutomationRequest {
        settings: Some(sample_settings(&vendas, &cancelados)),
        today: date(2024, 3, 15),
        archive_dir: home.paths.archives_dir.clone(),
    };

    let outcome = run_automation(&request, &store, &ZipArchiver, &mailer);

    let result = outcome.result();
    assert!(result.ok, "{}", result.message);
    let RunOutcome::Done(report) = outcome else {
        panic!("expected done");
    };
    assert_eq!(report.attachments.len(), 1);
    assert_eq!(report.attachments[0].filename, "Cancelados.zip");
    assert!(report.subject.contains("2/2024"));
    assert_eq!(report.folders[1].kind, FolderKind::Vendas);
    assert!(matches!(
        report.folders[1].outcome,
        FolderOutcome::Skipped { .. }
    ));

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].attachments, report.attachments);

    let archive = ZipArchive::new(File::open(&report.attachments[0].path).expect("open zip"))
        .expect("read zip");
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort_unstable();
    assert_eq!(names, vec!["canc-001.xml", "canc-002.xml"]);

    assert_eq!(
        load_run_state(&home.paths.run_state_path).expect("state"),
        RunState::started(3)
    );
}

/// Scenario: March run succeeds, a second March invocation is refused, and
/// the April invocation sends March's documents.
#[test]
fn one_send_per_calendar_month() {
    let home = TestHome::new().expect("home");
    let vendas = home.root().join("CFeVenda");
    let cancelados = home.root().join("CFeCanc");
    write_document(&vendas, 2024, 2, "venda-feb.xml", "<CFe/>");
    write_document(&vendas, 2024, 3, "venda-mar.xml", "<CFe/>");

    let store = FileRunStateStore::new(&home.paths.run_state_path);
    let mailer = RecordingMailer::default();
    let request_on = |day| AutomationRequest {
        settings: Some(sample_settings(&vendas, &cancelados)),
        today: day,
        archive_dir: home.paths.archives_dir.clone(),
    };

    let march = run_automation(&request_on(date(2024, 3, 1)), &store, &ZipArchiver, &mailer);
    assert!(march.is_ok());

    let march_again = run_automation(&request_on(date(2024, 3, 31)), &store, &ZipArchiver, &mailer);
    assert_eq!(
        march_again,
        RunOutcome::Aborted {
            stage: Stage::CheckingRunState,
            error: RunError::AlreadyRun { month: 3 },
        }
    );
    assert_eq!(mailer.sent().len(), 1);

    let april = run_automation(&request_on(date(2024, 4, 2)), &store, &ZipArchiver, &mailer);
    assert!(april.is_ok());
    let sent = mailer.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].subject.contains("3/2024"));

    let archive = ZipArchive::new(File::open(&sent[1].attachments[0].path).expect("open zip"))
        .expect("read zip");
    assert_eq!(archive.file_names().collect::<Vec<_>>(), vec!["venda-mar.xml"]);
}

/// Both folders missing: nothing is sent, stale archives from an earlier
/// run are removed, and the month is still consumed.
#[test]
fn nothing_to_send_clears_stale_archives() {
    let home = TestHome::new().expect("home");
    fs::create_dir_all(&home.paths.archives_dir).expect("archives dir");
    let stale = home.paths.archives_dir.join("Vendas.zip");
    fs::write(&stale, "last month").expect("stale archive");

    let store = FileRunStateStore::new(&home.paths.run_state_path);
    let mailer = RecordingMailer::default();
    let request = AutomationRequest {
        settings: Some(sample_settings(
            home.root().join("none-v"),
            home.root().join("none-c"),
        )),
        today: date(2024, 7, 5),
        archive_dir: home.paths.archives_dir.clone(),
    };

    let outcome = run_automation(&request, &store, &ZipArchiver, &mailer);

    assert_eq!(
        outcome.result().message,
        "Nenhum arquivo encontrado para ser enviado."
    );
    assert!(mailer.sent().is_empty());
    assert!(!stale.exists());
    assert!(store.has_run_this_month(7).expect("check"));
}

/// A refused send is reported once; the month is not released for a retry.
#[test]
fn failed_send_is_not_retried_within_the_month() {
    let home = TestHome::new().expect("home");
    let vendas = home.root().join("CFeVenda");
    write_document(&vendas, 2023, 12, "venda.xml", "<CFe/>");

    let store = FileRunStateStore::new(&home.paths.run_state_path);
    let request = AutomationRequest {
        settings: Some(sample_settings(&vendas, home.root().join("CFeCanc"))),
        today: date(2024, 1, 20),
        archive_dir: home.paths.archives_dir.clone(),
    };

    let failing = RecordingMailer::failing(MailError::Transport("timeout".to_string()));
    let first = run_automation(&request, &store, &ZipArchiver, &failing);
    assert_eq!(first.result().message, "Erro ao enviar email: timeout");
    assert!(failing.sent()[0].subject.contains("12/2023"));

    let healthy = RecordingMailer::default();
    let second = run_automation(&request, &store, &ZipArchiver, &healthy);
    assert!(matches!(
        second,
        RunOutcome::Aborted {
            error: RunError::AlreadyRun { month: 1 },
            ..
        }
    ));
    assert!(healthy.sent().is_empty());
}

/// An unreachable relay fails the run at the sending stage and still
/// consumes the month.
#[test]
fn unreachable_relay_keeps_month_consumed() {
    let home = TestHome::new().expect("home");
    let vendas = home.root().join("CFeVenda");
    write_document(&vendas, 2024, 5, "venda.xml", "<CFe/>");
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };

    let store = FileRunStateStore::new(&home.paths.run_state_path);
    let mailer = SmtpMailer::new("127.0.0.1", Some(port), Duration::from_secs(2));
    let request = AutomationRequest {
        settings: Some(sample_settings(&vendas, home.root().join("CFeCanc"))),
        today: date(2024, 6, 3),
        archive_dir: home.paths.archives_dir.clone(),
    };

    let outcome = run_automation(&request, &store, &ZipArchiver, &mailer);

    let RunOutcome::Aborted {
        stage: Stage::Sending,
        error: RunError::Transport(MailError::Transport(_)),
    } = &outcome
    else {
        panic!("expected transport failure, got {outcome:?}");
    };
    assert!(outcome.result().message.starts_with("Erro ao enviar email: "));
    assert!(store.has_run_this_month(6).expect("check"));
}

/// A folder removed from the settings leaves no archive from an earlier run behind.
#[test]
fn unconfigured_folder_clears_its_previous_archive() {
    let home = TestHome::new().expect("home");
    let vendas = home.root().join("CFeVenda");
    write_document(&vendas, 2024, 8, "venda.xml", "<CFe/>");
    fs::create_dir_all(&home.paths.archives_dir).expect("archives dir");
    let stale = home.paths.archives_dir.join("Cancelados.zip");
    fs::write(&stale, "last month").expect("stale archive");

    let mut settings = sample_settings(&vendas, home.root().join("CFeCanc"));
    settings.pasta_cancelados = None;
    let store = FileRunStateStore::new(&home.paths.run_state_path);
    let mailer = RecordingMailer::default();
    let request = AutomationRequest {
        settings: Some(settings),
        today: date(2024, 9, 2),
        archive_dir: home.paths.archives_dir.clone(),
    };

    let outcome = run_automation(&request, &store, &ZipArchiver, &mailer);

    assert!(outcome.is_ok());
    assert!(!stale.exists());
    let sent = mailer.sent();
    assert_eq!(sent[0].attachments.len(), 1);
    assert_eq!(sent[0].attachments[0].filename, "Vendas.zip");
}
