// src/models/stats_models.rs - Run-level statistics and the full report of one matching run

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::matching::{MatchResult, SkippedInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// Stopped early; the results cover only the clients evaluated before
    /// the stop was observed.
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchRunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    /// Names supplied, including skipped ones.
    pub total_names: usize,
    pub evaluated: usize,
    pub found: usize,
    pub not_found: usize,
    pub skipped: usize,
    /// found / evaluated, in percent.
    pub success_rate: f64,
    pub false_positives_avoided: usize,
    pub threshold: u8,
    pub elapsed_seconds: f64,
}

impl MatchRunSummary {
    pub fn success_rate(found: usize, evaluated: usize) -> f64 {
        if evaluated == 0 {
            0.0
        } else {
            found as f64 * 100.0 / evaluated as f64
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchRunReport {
    pub summary: MatchRunSummary,
    /// One record per evaluated client, in input order.
    pub results: Vec<MatchResult>,
    pub skipped: Vec<SkippedInput>,
}

impl MatchRunReport {
    pub fn is_cancelled(&self) -> bool {
        self.summary.status == RunStatus::Cancelled
    }

    pub fn found(&self) -> impl Iterator<Item = &MatchResult> {
        self.results.iter().filter(|result| result.found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate() {
        assert_eq!(MatchRunSummary::success_rate(0, 0), 0.0);
        assert!((MatchRunSummary::success_rate(1, 4) - 25.0).abs() < 1e-9);
    }
}
