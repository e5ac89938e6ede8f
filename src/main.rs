//! Clinsight: clinical risk inference and analysis engine.
//!
//! Thin CLI entry point: scores a patient record and prints the full
//! assessment bundle as JSON.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::IsTerminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clinsight::application::DEFAULT_TWINS;
use clinsight::domain::{
    AttributionEntry, CohortPercentiles, DigitalTwin, ScenarioResult,
};
use clinsight::{Assessment, ClinicalEngine, EngineConfig, EngineStatus, TrendResult};

/// Everything the engine can say about one patient snapshot.
#[derive(Serialize)]
struct AssessmentBundle {
    status: EngineStatus,
    assessment: Assessment,
    attributions: Vec<AttributionEntry>,
    scenarios: Vec<ScenarioResult>,
    percentiles: CohortPercentiles,
    digital_twins: Vec<DigitalTwin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trend: Option<TrendResult>,
}

fn main() -> Result<()> {
    // Initialize logging.
    //
    // Default behavior:
    // - interactive TTY: log to stderr so the JSON output stays clean
    // - CLINSIGHT_LOG_MODE=file: log to CLINSIGHT_LOG_FILE
    let log_mode = std::env::var("CLINSIGHT_LOG_MODE").unwrap_or_else(|_| "auto".to_string());

    let use_file = match log_mode.as_str() {
        "file" => true,
        "stderr" => false,
        // auto
        _ => !std::io::stderr().is_terminal(),
    };

    let (writer, _guard) = if use_file {
        let log_file = std::env::var("CLINSIGHT_LOG_FILE")
            .unwrap_or_else(|_| "data/clinsight.log".to_string());

        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    let mut args = std::env::args().skip(1);
    let record_path = args
        .next()
        .context("usage: clinsight <patient-record.json> [subject-id]")?;
    let subject_id = args.next();

    let json = std::fs::read_to_string(&record_path)
        .with_context(|| format!("reading patient record from {record_path}"))?;
    let record = serde_json::from_str(&json)
        .with_context(|| format!("parsing patient record from {record_path}"))?;

    let config = EngineConfig::from_env_or_default();
    let engine = ClinicalEngine::from_config(&config).context("starting engine")?;
    let status = engine.status();
    tracing::info!(
        "Engine ready (scorer={}, explainer={}, cohort={})",
        status.scorer_ready,
        status.explainer_ready,
        status.cohort_ready
    );

    let assessment = engine.score(&record)?;
    let attributions = engine.explain(&record)?;
    let scenarios = engine.generate_scenarios(&record)?;
    let percentiles = engine.percentiles(&record);
    let digital_twins = if status.cohort_ready {
        engine.nearest_twins(&record, DEFAULT_TWINS)?
    } else {
        Vec::new()
    };

    // With a subject id the assessment joins the longitudinal history.
    let trend = match &subject_id {
        Some(subject) => {
            engine.record_assessment(subject, &record, &assessment)?;
            Some(engine.velocity(subject)?)
        }
        None => None,
    };

    let bundle = AssessmentBundle {
        status,
        assessment,
        attributions,
        scenarios,
        percentiles,
        digital_twins,
        trend,
    };
    println!("{}", serde_json::to_string_pretty(&bundle)?);

    Ok(())
}
