pub mod config;
pub mod doctor;
pub mod leads;
pub mod run;
pub mod seed;

use serde::Serialize;

use leadmate_core::AppConfig;
use leadmate_store::LeadStore;

use crate::GlobalArgs;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn plain(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Loads config for one command, mapping failures to the shared exit code.
pub(crate) fn load_config(command: &str, global: &GlobalArgs) -> Result<AppConfig, CommandResult> {
    AppConfig::load(global.load_options()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

pub(crate) fn open_store(command: &str, config: &AppConfig) -> Result<LeadStore, CommandResult> {
    LeadStore::open(&config.store.path)
        .map_err(|error| CommandResult::failure(command, "store_io", error.to_string(), 4))
}

pub(crate) fn flush_store(command: &str, store: &LeadStore) -> Result<(), CommandResult> {
    store
        .flush()
        .map_err(|error| CommandResult::failure(command, "store_io", error.to_string(), 4))
}
