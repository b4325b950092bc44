// src/utils/progress_bars/logging.rs - Phase-tagged logging helpers for matching runs
use log::{debug, info, warn};
use std::time::Instant;

use crate::models::matching::MatchResult;
use crate::models::stats_models::MatchRunSummary;

#[derive(Clone)]
pub struct MatchingLogger {
    label: &'static str,
    emoji: &'static str,
    start_time: Instant,
}

impl Default for MatchingLogger {
    fn default() -> Self {
        Self::new("CLIENTS", "👤")
    }
}

impl MatchingLogger {
    pub fn new(label: &'static str, emoji: &'static str) -> Self {
        Self {
            label,
            emoji,
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, run_id: &str, client_count: usize, workers: usize) {
        info!(
            "[{}] {} 🚀 Starting client matching (run ID: {}) for {} names",
            self.label, self.emoji, run_id, client_count
        );
        info!(
            "[{}] {} ⚙️  Scheduling: {}",
            self.label,
            self.emoji,
            if workers <= 1 {
                "sequential".to_string()
            } else {
                format!("{} workers", workers)
            }
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        let msg = if let Some(details) = details {
            format!(
                "[{}] {} 🔄 Phase: {} - {} [+{:.1}s]",
                self.label, self.emoji, phase, details, elapsed.as_secs_f32()
            )
        } else {
            format!(
                "[{}] {} 🔄 Phase: {} [+{:.1}s]",
                self.label, self.emoji, phase, elapsed.as_secs_f32()
            )
        };
        info!("{}", msg);
    }

    pub fn log_document_indexed(&self, original_chars: usize, tokens: usize, distinct_words: usize) {
        info!(
            "[{}] {} 📄 Document indexed: {} chars → {} tokens, {} distinct words",
            self.label, self.emoji, original_chars, tokens, distinct_words
        );
    }

    pub fn log_data_quality_issue(&self, issue_type: &str, count: usize) {
        if count > 0 {
            warn!(
                "[{}] {} ⚠️  Data quality: {} {}",
                self.label, self.emoji, count, issue_type
            );
        }
    }

    pub fn log_decision(&self, result: &MatchResult) {
        debug!(
            "[{}] {} '{}' → found={} confidence={} type={} reason={}",
            self.label,
            self.emoji,
            result.client_name,
            result.found,
            result.confidence,
            result.match_type_label(),
            result.reason.as_str()
        );
    }

    pub fn log_cancelled(&self, completed: usize, total: usize) {
        warn!(
            "[{}] {} 🛑 Run cancelled after {}/{} clients; results are partial",
            self.label, self.emoji, completed, total
        );
    }

    pub fn log_completion(&self, found: usize, evaluated: usize) {
        let elapsed = self.start_time.elapsed();
        info!(
            "[{}] {} ✅ Matching completed in {:.2?}",
            self.label, self.emoji, elapsed
        );
        info!(
            "[{}] {} 📊 Results: {} of {} clients found in the document",
            self.label, self.emoji, found, evaluated
        );
    }

    pub fn log_performance_summary(&self, false_positives_avoided: usize, skipped: usize) {
        if false_positives_avoided > 0 {
            info!(
                "[{}] {} 🛡️  False positives avoided: {}",
                self.label, self.emoji, false_positives_avoided
            );
        }
        if skipped > 0 {
            warn!(
                "[{}] {} ⏭️  {} empty input rows skipped",
                self.label, self.emoji, skipped
            );
        }
    }

    pub fn log_warning(&self, message: &str) {
        warn!("[{}] {} ⚠️  {}", self.label, self.emoji, message);
    }
}

pub fn log_run_summary(summary: &MatchRunSummary) {
    info!("🎉 ===== CLIENT MATCHING RUN {} =====", summary.status.as_str().to_uppercase());
    info!("📅 Run ID: {}", summary.run_id);
    info!("⏱️  Duration: {:.2}s", summary.elapsed_seconds);
    info!("📊 Summary:");
    info!("  • Names supplied: {}", summary.total_names);
    info!("  • Evaluated: {}", summary.evaluated);
    info!("  • Found: {}", summary.found);
    info!("  • Not found: {}", summary.not_found);
    info!("  • Skipped: {}", summary.skipped);
    info!("  • Success rate: {:.1}%", summary.success_rate);
    info!("  • False positives avoided: {}", summary.false_positives_avoided);
    info!("  • Threshold: {}", summary.threshold);
    info!("===============================================");
}
