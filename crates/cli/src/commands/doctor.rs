use std::path::PathBuf;

use serde::Serialize;
use stayfinder_core::config::AppConfig;
use stayfinder_core::ListingTable;

use crate::commands::{load_options, CommandResult};

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

pub fn run(config_path: Option<PathBuf>, json_output: bool) -> CommandResult {
    let report = build_report(config_path);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

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

fn build_report(config_path: Option<PathBuf>) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(load_options(config_path)) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_llm_credential(&config));
            checks.push(check_listings_file(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("llm_credential"));
            checks.push(skipped("listings_file"));
        }
    }

    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if overall_status == CheckStatus::Pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn skipped(name: &'static str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: "skipped because configuration did not load".to_string(),
    }
}

fn check_llm_credential(config: &AppConfig) -> DoctorCheck {
    let provider = config.llm.provider;
    let base_url = &config.llm.base_url;
    let details = match (&config.llm.api_key, provider.requires_api_key()) {
        (Some(_), _) => format!("api key present for {provider:?} at {base_url}"),
        (None, false) => format!("{provider:?} does not require an api key ({base_url})"),
        (None, true) => {
            return DoctorCheck {
                name: "llm_credential",
                status: CheckStatus::Fail,
                details: "api key missing for a provider that requires one".to_string(),
            };
        }
    };

    DoctorCheck { name: "llm_credential", status: CheckStatus::Pass, details }
}

/// The listings file only matters to `browse`, so its absence is reported
/// as skipped rather than failed.
fn check_listings_file(config: &AppConfig) -> DoctorCheck {
    let path = &config.browse.listings_path;
    if !path.exists() {
        return DoctorCheck {
            name: "listings_file",
            status: CheckStatus::Skipped,
            details: format!("`{}` not found; browse will need --file", path.display()),
        };
    }

    match ListingTable::from_path(path) {
        Ok(table) => DoctorCheck {
            name: "listings_file",
            status: CheckStatus::Pass,
            details: format!("loaded {} listing(s) from `{}`", table.len(), path.display()),
        },
        Err(error) => DoctorCheck {
            name: "listings_file",
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
