// src/matching/decision.rs - Turns raw evidence into a found / not-found verdict
//
// The bar rises with the ambiguity of the name: a single significant word
// needs near-perfect evidence, longer names can be accepted on partial word
// coverage. The verdict is a union over strategies; the reported match type
// is the highest-priority strategy that qualified.

use std::collections::HashSet;

use strsim::normalized_levenshtein;

use super::scorer::ScoreEvidence;
use super::variants::NormalizedName;
use crate::models::matching::{MatchReason, MatchType};
use crate::utils::config::MatchConfig;

/// Word score needed for a word hit to count as exact evidence.
pub const STRONG_WORD_SCORE: u8 = 95;
/// Similarity at which a token of a fuzzy window counts as covering a word.
const WINDOW_COVERAGE_SIMILARITY: f64 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub found: bool,
    pub confidence: u8,
    pub match_type: Option<MatchType>,
    pub matched_words: Vec<String>,
    pub reason: MatchReason,
}

impl Decision {
    pub fn rejected(reason: MatchReason) -> Self {
        Self {
            found: false,
            confidence: 0,
            match_type: None,
            matched_words: Vec::new(),
            reason,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    threshold: u8,
    single_word_fuzzy_floor: u8,
    two_word_fuzzy_floor: u8,
    multi_word_proportion: f64,
    multi_word_fuzzy_floor: u8,
    sequential_fuzzy_floor: u8,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::from_config(&MatchConfig::default())
    }
}

impl DecisionPolicy {
    pub fn from_config(config: &MatchConfig) -> Self {
        Self {
            threshold: config.threshold.min(100),
            single_word_fuzzy_floor: config.single_word_fuzzy_floor,
            two_word_fuzzy_floor: config.two_word_fuzzy_floor,
            multi_word_proportion: config.multi_word_proportion,
            multi_word_fuzzy_floor: config.multi_word_fuzzy_floor,
            sequential_fuzzy_floor: config.sequential_fuzzy_floor,
        }
    }

    /// Bar for a verdict resting on fuzzy similarity alone.
    fn fuzzy_only_bar(&self, tier_floor: u8) -> u8 {
        tier_floor.max(self.threshold)
    }

    /// Never fails: absent evidence yields a not-found decision.
    pub fn decide(
        &self,
        name: &NormalizedName,
        evidence: &ScoreEvidence,
        priority_words: &[String],
    ) -> Decision {
        let total = name.significant_word_count();
        if total == 0 {
            return Decision::rejected(MatchReason::DegenerateName);
        }

        let substring = evidence.best_substring().map(|hit| {
            if hit.is_full_form {
                MatchType::Exact
            } else {
                MatchType::PunctuationFree
            }
        });
        let fuzzy = evidence.fuzzy_best_score();
        let overlap = &evidence.word_overlap;
        let has_pair = !evidence.sequential.is_empty();

        let verdict = match total {
            1 => {
                let strong_word = overlap.matched.iter().any(|hit| hit.score >= STRONG_WORD_SCORE);
                substring
                    .or_else(|| strong_word.then_some(MatchType::WordOverlap))
                    .or_else(|| {
                        (fuzzy >= self.fuzzy_only_bar(self.single_word_fuzzy_floor))
                            .then_some(MatchType::Fuzzy)
                    })
            }
            2 => {
                let priority_hit = priority_words.iter().any(|word| {
                    overlap
                        .get(word)
                        .map(|hit| hit.score >= STRONG_WORD_SCORE)
                        .unwrap_or(false)
                });
                let all_words = overlap.matched.len() == total;
                substring
                    .or_else(|| (priority_hit || all_words).then_some(MatchType::WordOverlap))
                    .or_else(|| has_pair.then_some(MatchType::SequentialWords))
                    .or_else(|| {
                        (fuzzy >= self.fuzzy_only_bar(self.two_word_fuzzy_floor))
                            .then_some(MatchType::Fuzzy)
                    })
            }
            _ => {
                let fuzzy_bar = if has_pair {
                    self.sequential_fuzzy_floor
                } else {
                    self.multi_word_fuzzy_floor
                };
                let enough_words =
                    overlap.proportion() >= self.multi_word_proportion && fuzzy >= fuzzy_bar;
                substring
                    .or_else(|| {
                        enough_words.then_some(if has_pair {
                            MatchType::SequentialWords
                        } else {
                            MatchType::WordOverlap
                        })
                    })
                    .or_else(|| {
                        (fuzzy >= self.fuzzy_only_bar(self.multi_word_fuzzy_floor))
                            .then_some(MatchType::Fuzzy)
                    })
            }
        };

        let (confidence, matched_words) = confidence(name, evidence, verdict);
        let reason = match verdict {
            Some(_) => MatchReason::Matched,
            None if evidence.is_empty() => MatchReason::NoEvidence,
            None => MatchReason::InsufficientEvidence,
        };

        Decision {
            found: verdict.is_some(),
            confidence,
            match_type: verdict,
            matched_words,
            reason,
        }
    }
}

/// `round(mean(contributing scores) * matched word proportion)`, plus the
/// matched significant words in name order.
fn confidence(
    name: &NormalizedName,
    evidence: &ScoreEvidence,
    verdict: Option<MatchType>,
) -> (u8, Vec<String>) {
    let mut scores: Vec<f64> = Vec::new();
    let mut matched: HashSet<&str> = HashSet::new();

    if evidence.best_substring().is_some() {
        scores.push(100.0);
        matched.extend(name.significant_words.iter().map(String::as_str));
    }
    for hit in &evidence.word_overlap.matched {
        scores.push(f64::from(hit.score));
        matched.insert(hit.word.as_str());
    }
    if let Some(best) = evidence.fuzzy_best() {
        scores.push(f64::from(best.score));
        if verdict == Some(MatchType::Fuzzy) {
            for word in &name.significant_words {
                let covered = best.window.split(' ').any(|token| {
                    normalized_levenshtein(word, token) >= WINDOW_COVERAGE_SIMILARITY
                });
                if covered {
                    matched.insert(word.as_str());
                }
            }
        }
    }

    let matched_words: Vec<String> = name
        .significant_words
        .iter()
        .filter(|word| matched.contains(word.as_str()))
        .cloned()
        .collect();

    if scores.is_empty() || name.significant_words.is_empty() {
        return (0, matched_words);
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    let proportion = matched_words.len() as f64 / name.significant_words.len() as f64;
    let confidence = (mean * proportion).round().clamp(0.0, 100.0) as u8;
    (confidence, matched_words)
}
