// src/io/results.rs - Writes match results for reviewers

use anyhow::{Context, Result};
use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::models::matching::MatchResult;
use crate::models::stats_models::MatchRunReport;

const TSV_HEADER: [&str; 7] = [
    "client",
    "found",
    "confidence",
    "match_type",
    "matched_words",
    "context",
    "reason",
];

/// Pretty-printed JSON with the run summary, the results and the skipped rows.
pub fn write_json_report(path: &Path, report: &MatchRunReport) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create report file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .with_context(|| format!("Failed to serialize report to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush report file {}", path.display()))?;
    info!("Wrote JSON report to {}", path.display());
    Ok(())
}

/// One row per client, tab-separated.
pub fn write_tsv_results(path: &Path, results: &[MatchResult]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create results file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", TSV_HEADER.join("\t")).context("Failed to write TSV header")?;
    for result in results {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            tsv_field(&result.client_name),
            if result.found { "yes" } else { "no" },
            result.confidence,
            result.match_type_label(),
            tsv_field(&result.matched_words.join(", ")),
            tsv_field(&result.context),
            result.reason.as_str()
        )
        .with_context(|| format!("Failed to write TSV row for '{}'", result.client_name))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush results file {}", path.display()))?;
    info!("Wrote {} result rows to {}", results.len(), path.display());
    Ok(())
}

fn tsv_field(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '\t' || c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::engine::{MatchEngine, MatchRunContext};
    use crate::utils::config::MatchConfig;
    use std::fs;
    use tempfile::tempdir;

    fn sample_report() -> MatchRunReport {
        let names = vec!["Viapol Ltda".to_string(), "".to_string(), "Furtan".to_string()];
        MatchEngine::new(MatchConfig::default().with_workers(1))
            .run(
                &names,
                Some("A empresa Viapol forneceu\tos materiais"),
                &MatchRunContext::new(),
            )
            .unwrap()
    }

    #[test]
    fn test_json_report_contains_all_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_json_report(&path, &sample_report()).unwrap();

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["summary"]["status"], "completed");
        assert_eq!(json["summary"]["found"], 1);
        assert_eq!(json["results"].as_array().unwrap().len(), 2);
        assert_eq!(json["results"][1]["match_type"], "N/A");
        assert_eq!(json["skipped"][0]["index"], 1);
    }

    #[test]
    fn test_tsv_has_one_row_per_result() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.tsv");
        let report = sample_report();
        write_tsv_results(&path, &report.results).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("client\tfound"));
        let first: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(first.len(), 7);
        assert_eq!(first[0], "Viapol Ltda");
        assert_eq!(first[1], "yes");
        assert!(!first[5].contains('\t'));
        assert!(lines[2].starts_with("Furtan\tno\t"));
    }
}
