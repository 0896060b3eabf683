//! bzr-risk command line: preview, create, update, delete and report risk assessments
//! against a local SQLite store. Results are printed to stdout as JSON; logs go to stderr.
//!
//! Usage:
//!   bzr-risk preview <factors.json>
//!   bzr-risk create <new-assessment.json>
//!   bzr-risk update <assessment-id> <changes.json>
//!   bzr-risk delete <assessment-id>
//!   bzr-risk report <report-request.json>

use bzr_risk::{
    access::{Actor, PermitAll},
    assessment::{AssessmentService, AssessmentUpdate, NewAssessment},
    config::EngineConfig,
    error::AssessmentError,
    logging::{LogEvent, StructuredLogger},
    report::{self, ReportRequest},
    risk::{PreviewRequest, RiskEngine},
    storage::SqliteAssessmentStore,
    types::AssessmentId,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const EXIT_USAGE: i32 = 64;
const EXIT_REJECTED: i32 = 2;

fn usage() -> ! {
    eprintln!(
        "usage: bzr-risk <preview FILE | create FILE | update ID FILE | delete ID | report FILE>"
    );
    std::process::exit(EXIT_USAGE);
}

fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, BoxError> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), BoxError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_service(config: &EngineConfig) -> Result<AssessmentService, BoxError> {
    std::fs::create_dir_all(&config.data_dir)?;
    let secret = if config.storage.encrypt_measures {
        let s = std::env::var(&config.storage.secret_env).map_err(|_| {
            format!(
                "encrypt_measures is enabled but {} is not set",
                config.storage.secret_env
            )
        })?;
        Some(s.into_bytes())
    } else {
        None
    };
    let store = SqliteAssessmentStore::open(&config.db_path(), secret.as_deref())?;
    Ok(AssessmentService::new(
        RiskEngine::new(config.risk.clone()),
        Arc::new(store),
        Arc::new(PermitAll),
    ))
}

/// Print the outcome and an audit line; rejections exit with `EXIT_REJECTED`.
fn finish<T: Serialize>(
    action: &str,
    outcome: Result<T, AssessmentError>,
    audit: impl FnOnce(&T),
) -> Result<(), BoxError> {
    match outcome {
        Ok(value) => {
            audit(&value);
            print_json(&value)
        }
        Err(err @ AssessmentError::Rejected(_)) => {
            StructuredLogger::emit_json(&LogEvent::failed(action, &err), &mut std::io::stderr());
            if let Some(v) = err.validation() {
                print_json(v)?;
            }
            std::process::exit(EXIT_REJECTED);
        }
        Err(e) => Err(e.into()),
    }
}

fn main() -> Result<(), BoxError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else { usage() };

    let config_path = std::env::var("BZR_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let config = EngineConfig::load(Path::new(&config_path));

    StructuredLogger::init(config.log.json, &config.log.level);

    info!(command = %command, data_dir = ?config.data_dir, "bzr-risk starting");
    let actor = Actor::local();

    match (command.as_str(), &args[1..]) {
        ("preview", [file]) => {
            let request: PreviewRequest = read_json(file)?;
            let preview = RiskEngine::new(config.risk.clone())
                .preview(request.initial_factors, request.residual_factors);
            print_json(&preview)
        }
        ("create", [file]) => {
            let input: NewAssessment = read_json(file)?;
            let service = open_service(&config)?;
            finish("create", service.create(&actor, input), |a| {
                StructuredLogger::emit_json(&LogEvent::accepted("create", a), &mut std::io::stderr())
            })
        }
        ("update", [id, file]) => {
            let id: AssessmentId = id.parse()?;
            let changes: AssessmentUpdate = read_json(file)?;
            let service = open_service(&config)?;
            finish("update", service.update(&actor, id, changes), |a| {
                StructuredLogger::emit_json(&LogEvent::accepted("update", a), &mut std::io::stderr())
            })
        }
        ("delete", [id]) => {
            let id: AssessmentId = id.parse()?;
            let service = open_service(&config)?;
            service.delete(&actor, id)?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
        ("report", [file]) => {
            let request: ReportRequest = read_json(file)?;
            let service = open_service(&config)?;
            let report = report::collect(&service, &actor, &request)?;
            print_json(&report)
        }
        _ => usage(),
    }
}
