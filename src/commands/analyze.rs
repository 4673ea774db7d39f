use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use super::{build_registry, load_profile};
use crate::cli::OutputFormat;
use crate::corpus::read_corpus;
use crate::pipeline::{ModuleOutcome, PipelineExecutor, PipelineResult};
use crate::recommendations::{self, Recommendation};
use crate::registry::DiscoveryReport;

pub struct AnalyzeConfig {
    pub corpus: PathBuf,
    pub profile: Option<PathBuf>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub manifests: Vec<PathBuf>,
    pub allow_override: bool,
}

/// Everything an `analyze` run reports.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub corpus: PathBuf,
    pub discovery: DiscoveryReport,
    pub result: PipelineResult,
    pub recommendations: Vec<Recommendation>,
}

pub fn handle_analyze(config: AnalyzeConfig) -> Result<()> {
    let profile = load_profile(config.profile.as_deref())?;
    let records = read_corpus(&config.corpus)
        .with_context(|| format!("reading corpus {}", config.corpus.display()))?;
    let (registry, discovery) = build_registry(&profile, &config.manifests, config.allow_override);

    let result = PipelineExecutor::new(profile.clone(), &registry).run(&records);
    let recommendations = recommendations::generate(&result, &profile);
    let report = AnalysisReport {
        generated_at: Utc::now(),
        corpus: config.corpus,
        discovery,
        result,
        recommendations,
    };

    let mut out: Box<dyn Write> = match &config.output {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    match config.format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Summary => write_summary(&mut out, &report)?,
    }
    out.flush()?;
    Ok(())
}

pub fn write_summary(out: &mut dyn Write, report: &AnalysisReport) -> std::io::Result<()> {
    let result = &report.result;
    writeln!(
        out,
        "corpuslens: {} records from {} (profile '{}', {:?})",
        result.records(),
        report.corpus.display(),
        result.profile(),
        result.status()
    )?;

    for rejection in &report.discovery.rejected {
        writeln!(
            out,
            "  rejected module {} from {}: {}",
            rejection.candidate.as_deref().unwrap_or("<manifest>"),
            rejection.location.display(),
            rejection.reason
        )?;
    }
    for warning in result.warnings() {
        writeln!(out, "  warning: {warning}")?;
    }

    writeln!(out)?;
    for name in result.selected_names() {
        match result.outcome(name) {
            Some(ModuleOutcome::Analyzed(bundle)) => {
                writeln!(out, "[{name}] analyzed")?;
                for (key, value) in bundle.values() {
                    if let Some(number) = value.as_number() {
                        writeln!(out, "    {key:<28} {}", format_number(number))?;
                    } else if let Some(text) = value.as_text() {
                        writeln!(out, "    {key:<28} {text}")?;
                    }
                }
            }
            Some(ModuleOutcome::Skipped(reason)) => writeln!(out, "[{name}] skipped: {reason}")?,
            Some(ModuleOutcome::Failed(failure)) => writeln!(out, "[{name}] failed: {failure}")?,
            None => {}
        }
    }

    if !report.recommendations.is_empty() {
        writeln!(out)?;
        writeln!(out, "Recommendations:")?;
        for rec in &report.recommendations {
            writeln!(out, "  P{} {:?} [{}] {}", rec.priority, rec.severity, rec.category, rec.title)?;
            if let Some(action) = rec.actions.first() {
                writeln!(out, "      -> {action}")?;
            }
        }
    }
    Ok(())
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.3}")
    }
}
