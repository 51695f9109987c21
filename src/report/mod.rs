//! Rendering of a finished run. Status labels are applied here and nowhere else.

pub mod console;
pub mod csv;
pub mod markdown;

use crate::config::{ReportConfig, ReportKind};
use crate::model::{CheckOutcome, ReportRow, Status};
use crate::summary::Summary;
use chrono::{DateTime, Datelike, Local};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to encode metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

pub fn status_label(status: Status) -> &'static str {
    match status {
        Status::Ok => "OK",
        Status::Warning => "Warning",
        Status::Critical => "Critical",
        Status::Unknown => "Unknown",
    }
}

pub fn rows(outcomes: &[CheckOutcome]) -> Vec<ReportRow> {
    outcomes
        .iter()
        .map(|o| ReportRow::from_outcome(o, status_label(o.status)))
        .collect()
}

/// Header data shared by every output format.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub title: String,
    pub file_prefix: String,
    pub generated_at: String,
    pub inspection_date: String,
    pub company_name: String,
    pub team_name: String,
}

impl ReportMeta {
    pub fn new(config: &ReportConfig, now: DateTime<Local>) -> Self {
        Self {
            title: report_title(config.kind, now),
            file_prefix: file_prefix(config.kind, now),
            generated_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            inspection_date: now.format("%Y-%m-%d").to_string(),
            company_name: config.company_name.clone(),
            team_name: config.team_name.clone(),
        }
    }
}

pub fn report_title<D: Datelike>(kind: ReportKind, date: D) -> String {
    match kind {
        ReportKind::Weekly => format!(
            "{} week {} infrastructure inspection report",
            date.year(),
            date.iso_week().week()
        ),
        ReportKind::Monthly => format!(
            "{}-{:02} infrastructure inspection report",
            date.year(),
            date.month()
        ),
    }
}

pub fn file_prefix<D: Datelike>(kind: ReportKind, date: D) -> String {
    match kind {
        ReportKind::Weekly => format!(
            "infra_check_{}_W{:02}",
            date.year(),
            date.iso_week().week()
        ),
        ReportKind::Monthly => format!("infra_check_{}_{:02}", date.year(), date.month()),
    }
}

/// Writes every file format into `output_dir`, creating it when missing.
pub fn generate_reports(
    meta: &ReportMeta,
    rows: &[ReportRow],
    summary: &Summary,
    output_dir: &Path,
) -> Result<Vec<(&'static str, PathBuf)>, ReportError> {
    fs::create_dir_all(output_dir).map_err(|source| ReportError::CreateDir {
        path: output_dir.display().to_string(),
        source,
    })?;

    let outputs = [
        ("csv", "csv", csv::render(meta, rows, summary)),
        ("markdown", "md", markdown::render(meta, rows, summary)),
    ];

    let mut written = Vec::with_capacity(outputs.len());
    for (format, extension, body) in outputs {
        let path = output_dir.join(format!("{}.{extension}", meta.file_prefix));
        write_file(&path, &body)?;
        info!(format, path = %path.display(), "report written");
        written.push((format, path));
    }
    Ok(written)
}

pub(crate) fn write_file(path: &Path, body: &str) -> Result<(), ReportError> {
    fs::write(path, body).map_err(|source| ReportError::Write {
        path: path.display().to_string(),
        source,
    })
}

/// Cuts to `max` characters and appends "..." when anything was cut.
pub(crate) fn ellipsize(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
