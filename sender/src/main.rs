//! Monthly SAT fiscal-archive sender.
//!
//! Keeps its settings, config and run state under one home directory
//! (`--home` / `SAT_SENDER_HOME`). `sat-sender run` is meant to be invoked on
//! every login or from a scheduler; the run-state record makes repeated
//! invocations within a month harmless.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use sat_sender::automation::{AutomationRequest, run_automation};
use sat_sender::core::settings::{Settings, validate_for_save};
use sat_sender::exit_codes;
use sat_sender::io::archiver::ZipArchiver;
use sat_sender::io::config::load_config;
use sat_sender::io::mailer::SmtpMailer;
use sat_sender::io::paths::{AppPaths, default_home};
use sat_sender::io::run_state::FileRunStateStore;
use sat_sender::io::settings_store::{load_settings, write_settings};
use sat_sender::logging;
use sat_sender::status::status_for;

#[derive(Parser)]
#[command(
    name = "sat-sender",
    version,
    about = "Email last month's SAT fiscal archives to the accounting office"
)]
struct Cli {
    /// Directory holding settings.json, config.toml and run state.
    #[arg(long, global = true, env = "SAT_SENDER_HOME")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Package last month's folders and email them (at most once per calendar month).
    Run {
        /// Print the result as `{"ok":..,"message":..}` instead of the bare message.
        #[arg(long)]
        json: bool,
    },
    /// Show or update the persisted settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Show the run-state record and the period a run today would send.
    Status,
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the stored settings (password masked).
    Show,
    /// Update stored settings; omitted fields keep their current value.
    Set(SettingsArgs),
}

#[derive(Args)]
struct SettingsArgs {
    #[arg(long)]
    name: Option<String>,
    /// Sender address, also the SMTP login.
    #[arg(long)]
    email: Option<String>,
    /// SMTP password (for Gmail, an app password).
    #[arg(long, env = "SAT_SENDER_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Recipient address of the accounting office.
    #[arg(long)]
    contabilidade: Option<String>,
    #[arg(long)]
    cnpj: Option<String>,
    /// Base folder of the sales documents (`<base>/<year>/<MM>`).
    #[arg(long)]
    pasta_vendas: Option<PathBuf>,
    /// Base folder of the cancellation documents (`<base>/<year>/<MM>`).
    #[arg(long)]
    pasta_cancelados: Option<PathBuf>,
}

impl SettingsArgs {
    fn into_settings(self) -> Result<Settings> {
        Ok(Settings {
            name: self.name,
            email: self.email,
            password: self.password,
            contabilidade: self.contabilidade,
            cnpj: self.cnpj,
            pasta_vendas: self.pasta_vendas.map(absolute).transpose()?,
            pasta_cancelados: self.pasta_cancelados.map(absolute).transpose()?,
        })
    }
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let home = match cli.home {
        Some(home) => home,
        None => default_home()?,
    };
    let paths = AppPaths::new(home);
    match cli.command {
        Command::Run { json } => cmd_run(&paths, json),
        Command::Settings {
            action: SettingsAction::Show,
        } => cmd_settings_show(&paths),
        Command::Settings {
            action: SettingsAction::Set(args),
        } => cmd_settings_set(&paths, args),
        Command::Status => cmd_status(&paths),
    }
}

fn cmd_run(paths: &AppPaths, json: bool) -> Result<i32> {
    let cfg = load_config(&paths.config_path)?;
    let settings = load_settings(&paths.settings_path)?;
    let store = FileRunStateStore::new(&paths.run_state_path);
    let mailer = SmtpMailer::from_config(&cfg);
    let request = AutomationRequest {
        settings,
        today: Local::now().date_naive(),
        archive_dir: paths.archive_dir(&cfg),
    };

    let outcome = run_automation(&request, &store, &ZipArchiver, &mailer);
    let result = outcome.result();
    if json {
        println!(
            "{}",
            serde_json::to_string(&result).context("serialize run result")?
        );
    } else {
        println!("{}", result.message);
    }
    Ok(outcome.exit_code())
}

fn cmd_settings_show(paths: &AppPaths) -> Result<i32> {
    let Some(settings) = load_settings(&paths.settings_path)? else {
        bail!("no settings at {}", paths.settings_path.display());
    };
    let text = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    let folder = |value: &Option<PathBuf>| {
        value
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    println!("name: {}", text(&settings.name));
    println!("email: {}", text(&settings.email));
    println!(
        "password: {}",
        if settings.password.is_some() { "********" } else { "-" }
    );
    println!("contabilidade: {}", text(&settings.contabilidade));
    println!("cnpj: {}", text(&settings.cnpj));
    println!("pastaVendas: {}", folder(&settings.pasta_vendas));
    println!("pastaCancelados: {}", folder(&settings.pasta_cancelados));
    Ok(exit_codes::OK)
}

fn cmd_settings_set(paths: &AppPaths, args: SettingsArgs) -> Result<i32> {
    let mut settings = load_settings(&paths.settings_path)?.unwrap_or_default();
    settings.merge(args.into_settings()?);
    validate_for_save(&settings)?;
    write_settings(&paths.settings_path, &settings)?;
    println!("settings saved to {}", paths.settings_path.display());
    Ok(exit_codes::OK)
}

fn cmd_status(paths: &AppPaths) -> Result<i32> {
    let store = FileRunStateStore::new(&paths.run_state_path);
    let outcome = status_for(&store, Local::now().date_naive())?;
    match outcome.last_month {
        Some(month) => println!("last run month: {month}"),
        None => println!("last run month: never run"),
    }
    println!("current month consumed: {}", outcome.month_consumed);
    println!("next period: {}", outcome.period);
    Ok(exit_codes::OK)
}

fn absolute(path: PathBuf) -> Result<PathBuf> {
    std::path::absolute(&path).with_context(|| format!("resolve {}", path.display()))
}
