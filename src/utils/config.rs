// src/utils/config.rs - Matching thresholds and run settings, read from the environment

use log::{debug, info};
use std::env;

use crate::matching::keywords::PriorityTieBreak;

pub const DEFAULT_THRESHOLD: u8 = 85;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// External tolerance, 0..=100. Floor for verdicts that rest on fuzzy
    /// similarity alone.
    pub threshold: u8,
    pub single_word_fuzzy_floor: u8,
    pub two_word_fuzzy_floor: u8,
    /// Share of significant words that must match for a 3+ word name.
    pub multi_word_proportion: f64,
    pub multi_word_fuzzy_floor: u8,
    /// Lower fuzzy bar for 3+ word names when an adjacent pair matched.
    pub sequential_fuzzy_floor: u8,
    /// Radius of the normalized window inspected for poison phrases.
    pub context_radius: usize,
    /// Radius of the original-text snippet reported with each match.
    pub snippet_radius: usize,
    /// Worker pool size; 1 runs clients sequentially.
    pub workers: usize,
    pub priority_tie_break: PriorityTieBreak,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            single_word_fuzzy_floor: 96,
            two_word_fuzzy_floor: 88,
            multi_word_proportion: 0.6,
            multi_word_fuzzy_floor: 85,
            sequential_fuzzy_floor: 70,
            context_radius: 30,
            snippet_radius: 80,
            workers: num_cpus::get(),
            priority_tie_break: PriorityTieBreak::Both,
        }
    }
}

impl MatchConfig {
    /// Create configuration from environment variables. Missing or
    /// unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            threshold: env::var("MATCH_THRESHOLD")
                .ok()
                .and_then(|v| v.trim().parse::<u32>().ok())
                .map(clamp_percent)
                .unwrap_or(defaults.threshold),
            single_word_fuzzy_floor: percent_var("MATCH_SINGLE_WORD_FUZZY_FLOOR")
                .unwrap_or(defaults.single_word_fuzzy_floor),
            two_word_fuzzy_floor: percent_var("MATCH_TWO_WORD_FUZZY_FLOOR")
                .unwrap_or(defaults.two_word_fuzzy_floor),
            multi_word_proportion: env::var("MATCH_MULTI_WORD_PROPORTION")
                .ok()
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|p| (0.0..=1.0).contains(p))
                .unwrap_or(defaults.multi_word_proportion),
            multi_word_fuzzy_floor: percent_var("MATCH_MULTI_WORD_FUZZY_FLOOR")
                .unwrap_or(defaults.multi_word_fuzzy_floor),
            sequential_fuzzy_floor: percent_var("MATCH_SEQUENTIAL_FUZZY_FLOOR")
                .unwrap_or(defaults.sequential_fuzzy_floor),
            context_radius: env::var("MATCH_CONTEXT_RADIUS")
                .unwrap_or_else(|_| defaults.context_radius.to_string())
                .parse()
                .unwrap_or(defaults.context_radius),
            snippet_radius: env::var("MATCH_SNIPPET_RADIUS")
                .unwrap_or_else(|_| defaults.snippet_radius.to_string())
                .parse()
                .unwrap_or(defaults.snippet_radius),
            workers: env::var("MATCH_WORKERS")
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|w| *w > 0)
                .unwrap_or(defaults.workers),
            priority_tie_break: env::var("MATCH_PRIORITY_TIE_BREAK")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.priority_tie_break),
        };
        debug!("Match config from env: {:?}", config);
        config
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = clamp_percent(threshold);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn log_config(&self) {
        info!("⚙️  Match configuration:");
        info!("   • Threshold: {} (fuzzy-only verdicts)", self.threshold);
        info!(
            "   • Fuzzy floors: 1 word {}, 2 words {}, 3+ words {} ({} with an adjacent pair)",
            self.single_word_fuzzy_floor,
            self.two_word_fuzzy_floor,
            self.multi_word_fuzzy_floor,
            self.sequential_fuzzy_floor
        );
        info!(
            "   • 3+ word proportion: {:.2}, priority tie-break: {}",
            self.multi_word_proportion,
            self.priority_tie_break.as_str()
        );
        info!(
            "   • Workers: {}{}",
            self.workers,
            if self.workers <= 1 { " (sequential)" } else { "" }
        );
    }
}

fn clamp_percent(value: u32) -> u8 {
    value.min(100) as u8
}

fn percent_var(key: &str) -> Option<u8> {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .map(clamp_percent)
}
