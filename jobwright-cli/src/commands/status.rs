//! `jobwright status`: drift visibility without contacting the server.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use jobwright_sync::{
    status::{check_all, format_datetime_age},
    JobStatus, StatusReport,
};

/// Arguments for `jobwright status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home()?;
        let reports = build_report(&home)?;
        if self.json {
            print_json(&reports)?;
            return Ok(());
        }
        print_table(&reports);
        Ok(())
    }
}

#[derive(Serialize)]
struct StatusReportJson {
    summary: StatusSummaryJson,
    jobs: Vec<JobStatusJson>,
}

#[derive(Serialize)]
struct StatusSummaryJson {
    jobs: usize,
    pending: usize,
}

#[derive(Serialize)]
struct JobStatusJson {
    key: String,
    job: String,
    status: String,
    detail: String,
    template_hash: Option<String>,
    applied_at: Option<String>,
    applied_age: String,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "key")]
    key: String,
    #[tabled(rename = "job")]
    job: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "detail")]
    detail: String,
    #[tabled(rename = "last apply")]
    last_apply: String,
}

fn build_report(home: &Path) -> Result<Vec<StatusReport>> {
    check_all(home, &super::document_builder()?)
        .context("status check failed; run `jobwright render <key>` for details")
}

fn pending(reports: &[StatusReport]) -> usize {
    reports
        .iter()
        .filter(|r| !matches!(r.status, JobStatus::Current))
        .count()
}

fn applied_age(report: &StatusReport) -> String {
    report
        .applied
        .as_ref()
        .map(|state| format_datetime_age(state.applied_at))
        .unwrap_or_else(|| "never".to_string())
}

fn print_json(reports: &[StatusReport]) -> Result<()> {
    let payload = StatusReportJson {
        summary: StatusSummaryJson {
            jobs: reports.len(),
            pending: pending(reports),
        },
        jobs: reports
            .iter()
            .map(|r| JobStatusJson {
                key: r.key.clone(),
                job: r.job.to_string(),
                status: status_key(&r.status).to_string(),
                detail: status_detail(&r.status),
                template_hash: r.applied.as_ref().map(|s| s.record.template_hash.clone()),
                applied_at: r.applied.as_ref().map(|s| s.applied_at.to_rfc3339()),
                applied_age: applied_age(r),
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(reports: &[StatusReport]) {
    println!(
        "jobwright v{} | {} jobs | {} pending",
        env!("CARGO_PKG_VERSION"),
        reports.len(),
        pending(reports),
    );
    if reports.is_empty() {
        println!("No job manifests found.");
        return;
    }

    let rows: Vec<StatusTableRow> = reports
        .iter()
        .map(|r| StatusTableRow {
            key: r.key.clone(),
            job: r.job.to_string(),
            status: format!("{} {}", status_indicator(&r.status), r.status.label()),
            detail: status_detail(&r.status),
            last_apply: applied_age(r),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if pending(reports) > 0 {
        println!("Run 'jobwright apply --all' to push pending changes.");
    }
}

fn status_key(status: &JobStatus) -> &'static str {
    match status {
        JobStatus::NeverApplied => "never_applied",
        JobStatus::Current => "current",
        JobStatus::Renamed { .. } => "renamed",
        JobStatus::Rebind => "rebind",
        JobStatus::Drifted { .. } => "drifted",
    }
}

fn status_indicator(status: &JobStatus) -> String {
    match status {
        JobStatus::NeverApplied => "■".bright_black().bold().to_string(),
        JobStatus::Current => "■".green().bold().to_string(),
        JobStatus::Renamed { .. } => "■".cyan().bold().to_string(),
        JobStatus::Rebind => "■".yellow().bold().to_string(),
        JobStatus::Drifted { .. } => "■".red().bold().to_string(),
    }
}

fn status_detail(status: &JobStatus) -> String {
    match status {
        JobStatus::NeverApplied => "not on the server yet".to_string(),
        JobStatus::Current => "up to date".to_string(),
        JobStatus::Renamed { from, to } => format!("{from} → {to}"),
        JobStatus::Rebind => "parameters changed; job will be replaced".to_string(),
        JobStatus::Drifted { stored, fresh } => format!("{} → {}", short(stored), short(fresh)),
    }
}

fn short(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}
