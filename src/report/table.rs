//! Plain-text rendering of scan results.

use chrono::NaiveDateTime;
use std::fmt::Write;

use crate::batch::{BatchRecord, BatchSummary};
use crate::restriction::RestrictionVerdict;

const HEADERS: [&str; 6] = ["File", "Plate", "Digit", "Status", "Day", "Time"];

fn file_label(record: &BatchRecord) -> String {
    record
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| record.path.display().to_string())
}

fn row(record: &BatchRecord) -> [String; 6] {
    let file = file_label(record);

    if let Some(error) = &record.error {
        return [
            file,
            "-".to_string(),
            "-".to_string(),
            "ERROR".to_string(),
            error.clone(),
            "-".to_string(),
        ];
    }

    let Some(report) = record.report.as_ref().filter(|r| r.is_detected()) else {
        return [
            file,
            "-".to_string(),
            "-".to_string(),
            "NO PLATE".to_string(),
            "No plate detected".to_string(),
            "-".to_string(),
        ];
    };

    let plate = match (&report.normalized_plate, &report.recognized_text) {
        (Some(plate), _) => plate.to_string(),
        (None, Some(text)) => text.clone(),
        (None, None) => "-".to_string(),
    };

    match &report.verdict {
        Some(verdict) => [
            file,
            plate,
            digit_label(verdict),
            verdict.overall_status.to_string(),
            verdict.day_reason.clone(),
            verdict.time_reason.clone(),
        ],
        None => [
            file,
            plate,
            "-".to_string(),
            "-".to_string(),
            "-".to_string(),
            "-".to_string(),
        ],
    }
}

fn digit_label(verdict: &RestrictionVerdict) -> String {
    verdict
        .last_digit
        .map(|d| d.to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// Renders one row per record, columns padded to their widest cell.
pub fn render_table(records: &[BatchRecord]) -> String {
    let rows: Vec<[String; 6]> = records.iter().map(row).collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = HEADERS.iter().map(|h| h.to_string()).collect();
    push_row(&mut out, &header, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for cells in &rows {
        push_row(&mut out, cells, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize; 6]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    let _ = writeln!(out, "{}", padded.join("  ").trim_end());
}

/// Totals block printed after the table.
pub fn render_summary(summary: &BatchSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Processed: {}/{} images", summary.detected, summary.total);
    let _ = writeln!(out, "No plate:  {}", summary.no_plate);
    let _ = writeln!(out, "Failed:    {}", summary.failed);
    let _ = writeln!(out, "Success rate: {:.1}%", summary.success_rate());
    out
}

/// Verdict block for a single plate.
pub fn render_verdict(plate_text: &str, verdict: &RestrictionVerdict, at: NaiveDateTime) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Plate:      {}", plate_text);
    let _ = writeln!(out, "Checked at: {}", at.format("%Y-%m-%d %H:%M:%S (%A)"));
    let _ = writeln!(out, "Last digit: {}", digit_label(verdict));
    let _ = writeln!(out, "Day:        {}", verdict.day_reason);
    let _ = writeln!(out, "Time:       {}", verdict.time_reason);
    let _ = writeln!(out, "Status:     {}", verdict.overall_status);
    out
}
