//! JSON export for batch scans.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::batch::{BatchRecord, BatchSummary};
use crate::restriction::TimePolicy;

#[derive(Debug, Serialize)]
struct ScanExport<'a> {
    scan_date: String,
    time_policy: TimePolicy,
    total_images: usize,
    detected: usize,
    no_plate: usize,
    failed: usize,
    success_rate: f64,
    results: &'a [BatchRecord],
}

/// Export a batch to a JSON file.
///
/// The output is pretty-printed for human readability.
pub fn export_to_json(
    records: &[BatchRecord],
    at: NaiveDateTime,
    time_policy: TimePolicy,
    output_path: &Path,
) -> Result<()> {
    let summary = BatchSummary::from_records(records);
    let export = ScanExport {
        scan_date: at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        time_policy,
        total_images: summary.total,
        detected: summary.detected,
        no_plate: summary.no_plate,
        failed: summary.failed,
        success_rate: summary.success_rate(),
        results: records,
    };

    let json =
        serde_json::to_string_pretty(&export).context("Failed to serialize scan results to JSON")?;

    let mut file = File::create(output_path)
        .context(format!("Failed to create JSON file: {}", output_path.display()))?;

    file.write_all(json.as_bytes())
        .context("Failed to write JSON data")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PlateReport;
    use crate::plate::{FormatPolicy, PlateFormatNormalizer};
    use crate::restriction::RestrictionEvaluator;
    use chrono::NaiveDate;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_export_to_json() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let normalizer = PlateFormatNormalizer::new(FormatPolicy::Strict).unwrap();
        let plate = normalizer.normalize("1232ABC").unwrap();
        let evaluator = RestrictionEvaluator::new(FormatPolicy::Strict, TimePolicy::Split).unwrap();

        let records = vec![
            BatchRecord::scanned(
                PathBuf::from("placa1.jpg"),
                PlateReport {
                    source_id: "placa1.jpg".to_string(),
                    recognized_text: Some("1232ABC".to_string()),
                    verdict: Some(evaluator.evaluate_plate(&plate, at)),
                    normalized_plate: Some(plate),
                    corrected_from: Some("123ZABC".to_string()),
                    candidate_count: 3,
                },
            ),
            BatchRecord::failed(PathBuf::from("placa2.jpg"), "truncated".to_string()),
        ];

        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");
        export_to_json(&records, at, TimePolicy::Split, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(value["scan_date"], "2024-01-01T10:00:00");
        assert_eq!(value["time_policy"], "split");
        assert_eq!(value["total_images"], 2);
        assert_eq!(value["detected"], 1);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["success_rate"], 50.0);

        let first = &value["results"][0]["report"];
        assert_eq!(first["normalized_plate"]["text"], "1232 ABC");
        assert_eq!(first["normalized_plate"]["schema"], "N4L3");
        assert_eq!(first["verdict"]["overall_status"], "RESTRICTED_OUT_OF_HOURS");
        assert_eq!(first["verdict"]["last_digit"], 2);
        assert_eq!(value["results"][1]["error"], "truncated");
        assert!(value["results"][1]["report"].is_null());
    }
}
