//! Human-readable rendering of migration results.

use fedstore_migrate::{MigrationReport, MigrationStatus};

/// One line per report, plus the keys that vanished mid-run.
pub fn format_reports(reports: &[MigrationReport]) -> String {
    if reports.is_empty() {
        return "No pending migrations".to_string();
    }
    reports
        .iter()
        .map(format_report)
        .collect::<Vec<_>>()
        .join("\n")
}

/// A single report.
pub fn format_report(report: &MigrationReport) -> String {
    let mut out = report.to_string();
    for key in &report.not_found {
        out.push_str(&format!("\n  skipped (deleted): {}", key));
    }
    out
}

/// Status table.
pub fn format_status(status: &[MigrationStatus]) -> String {
    status
        .iter()
        .map(|s| match s.applied_at {
            Some(at) => format!("[x] {}  applied {}  {}", s.id, at.to_rfc3339(), s.description),
            None => format!("[ ] {}  pending  {}", s.id, s.description),
        })
        .collect::<Vec<_>>()
        .join("\n")
}
