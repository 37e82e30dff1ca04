use leadmate_core::config::AppConfig;
use leadmate_store::LeadStore;
use serde::Serialize;

use crate::commands::CommandResult;
use crate::GlobalArgs;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(global: &GlobalArgs, json_output: bool) -> CommandResult {
    let report = build_report(global);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 2 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(global: &GlobalArgs) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(global.load_options()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_store(&config));
            checks.push(check_api_key(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "store_readiness",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "api_key_presence",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_store(config: &AppConfig) -> DoctorCheck {
    match LeadStore::open(&config.store.path) {
        Ok(store) => DoctorCheck {
            name: "store_readiness",
            status: CheckStatus::Pass,
            details: format!(
                "opened `{}` with {} lead(s)",
                config.store.path.display(),
                store.len()
            ),
        },
        Err(error) => DoctorCheck {
            name: "store_readiness",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_api_key(config: &AppConfig) -> DoctorCheck {
    match config.llm.require_api_key() {
        Ok(_) => DoctorCheck {
            name: "api_key_presence",
            status: CheckStatus::Pass,
            details: "api key is present for agent runs".to_string(),
        },
        Err(error) => DoctorCheck {
            name: "api_key_presence",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
