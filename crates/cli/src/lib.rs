pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use leadmate_core::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

use crate::commands::leads::{AddArgs, EditArgs};
use crate::commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "leadmate",
    about = "Lead store and agent CLI",
    long_about = "Manage a flat-file store of sales leads and run bounded agent tasks \
                  (brief, outreach, followup) against them.",
    after_help = "Examples:\n  leadmate add --name \"Acme Freight\" --website acme.test\n  \
                  leadmate run brief acme-freight\n  leadmate doctor --json"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Flags shared by every subcommand. They take precedence over both the
/// config file and environment overrides.
#[derive(Args, Clone, Debug, Default)]
pub struct GlobalArgs {
    #[arg(long, global = true, help = "Path to the config file (default: leadmate.toml)")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the lead store path")]
    pub store: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the log level (trace|debug|info|warn|error)")]
    pub log_level: Option<String>,
    #[arg(long, global = true, help = "Override the log format (compact|pretty|json)")]
    pub log_format: Option<LogFormat>,
}

impl GlobalArgs {
    pub(crate) fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                store_path: self.store.clone(),
                log_level: self.log_level.clone(),
                log_format: self.log_format,
                ..ConfigOverrides::default()
            },
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List leads, optionally filtered by a search query")]
    List {
        #[arg(long, help = "Case-insensitive substring over name, HQ, industry, and products")]
        search: Option<String>,
    },
    #[command(about = "Show one lead as pretty-printed JSON")]
    Show { id: String },
    #[command(about = "Create a new lead and persist it")]
    Add(AddArgs),
    #[command(about = "Change lead fields and persist the result")]
    Edit(EditArgs),
    #[command(about = "Delete a lead and its notes")]
    Remove {
        id: String,
        #[arg(long, help = "Confirm the deletion")]
        yes: bool,
    },
    #[command(about = "Append a timestamped note to a lead")]
    Note { id: String, text: String },
    #[command(about = "Set one extra attribute on a lead")]
    Set { id: String, key: String, value: String },
    #[command(about = "Run an agent task against a lead and persist its effects")]
    Run {
        #[arg(help = "Task kind: brief, outreach, or followup")]
        task: String,
        id: String,
    },
    #[command(about = "Load deterministic demo leads into the store")]
    Seed {
        #[arg(long, help = "Replace existing leads instead of refusing")]
        force: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, store readiness, and API-key presence")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

fn init_logging(config: &AppConfig) {
    use leadmate_core::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt()
                .with_target(false)
                .with_max_level(log_level)
                .with_writer(std::io::stderr)
                .compact()
                .init();
        }
        Pretty => {
            tracing_subscriber::fmt()
                .with_target(false)
                .with_max_level(log_level)
                .with_writer(std::io::stderr)
                .pretty()
                .init();
        }
        Json => {
            tracing_subscriber::fmt()
                .with_target(false)
                .with_max_level(log_level)
                .with_writer(std::io::stderr)
                .json()
                .init();
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Commands load their own config; this load only drives logging setup.
    if let Ok(config) = AppConfig::load(cli.global.load_options()) {
        init_logging(&config);
    }

    let global = cli.global;
    let result = match cli.command {
        Command::List { search } => commands::leads::list(&global, search.as_deref()),
        Command::Show { id } => commands::leads::show(&global, &id),
        Command::Add(args) => commands::leads::add(&global, &args),
        Command::Edit(args) => commands::leads::edit(&global, &args),
        Command::Remove { id, yes } => commands::leads::remove(&global, &id, yes),
        Command::Note { id, text } => commands::leads::note(&global, &id, &text),
        Command::Set { id, key, value } => commands::leads::set(&global, &id, &key, &value),
        Command::Run { task, id } => commands::run::run(&global, &task, &id),
        Command::Seed { force } => commands::seed::run(&global, force),
        Command::Config => CommandResult { exit_code: 0, output: commands::config::run(&global) },
        Command::Doctor { json } => commands::doctor::run(&global, json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
