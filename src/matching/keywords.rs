// src/matching/keywords.rs - Picks the most distinctive words of a client name

use log::warn;
use std::fmt;
use std::str::FromStr;

use super::variants::NormalizedName;

/// Words up to this length are treated as acronyms.
pub const ACRONYM_MAX_LEN: usize = 4;
/// Words from this length on are treated as distinctive proper nouns.
pub const LONG_WORD_MIN_LEN: usize = 6;

/// Capability that names the words of a client name most likely to identify
/// it. Implementations may call out to a remote service; the engine only
/// ever uses words that belong to the name.
pub trait KeywordExtractor: Send + Sync {
    fn name(&self) -> &str;

    fn distinctive_words(&self, name: &NormalizedName) -> Vec<String>;
}

/// How to choose between short acronym-like tokens and long tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityTieBreak {
    /// Prefer short tokens ("QGC", "EMS").
    Acronym,
    /// Prefer the single longest token.
    Longest,
    /// Short and long tokens both count.
    Both,
}

impl PriorityTieBreak {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityTieBreak::Acronym => "acronym",
            PriorityTieBreak::Longest => "longest",
            PriorityTieBreak::Both => "both",
        }
    }
}

impl fmt::Display for PriorityTieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PriorityTieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "acronym" | "short" => Ok(PriorityTieBreak::Acronym),
            "longest" | "long" => Ok(PriorityTieBreak::Longest),
            "both" => Ok(PriorityTieBreak::Both),
            other => Err(format!("unknown priority tie-break '{}'", other)),
        }
    }
}

/// Local, deterministic extractor based on word length.
#[derive(Debug, Clone)]
pub struct HeuristicKeywordExtractor {
    tie_break: PriorityTieBreak,
}

impl Default for HeuristicKeywordExtractor {
    fn default() -> Self {
        Self::new(PriorityTieBreak::Both)
    }
}

impl HeuristicKeywordExtractor {
    pub fn new(tie_break: PriorityTieBreak) -> Self {
        Self { tie_break }
    }

    pub fn tie_break(&self) -> PriorityTieBreak {
        self.tie_break
    }
}

impl KeywordExtractor for HeuristicKeywordExtractor {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn distinctive_words(&self, name: &NormalizedName) -> Vec<String> {
        let words = &name.significant_words;
        match self.tie_break {
            PriorityTieBreak::Acronym => {
                let short: Vec<String> = words
                    .iter()
                    .filter(|w| char_len(w) <= ACRONYM_MAX_LEN)
                    .cloned()
                    .collect();
                if short.is_empty() {
                    longest(words).into_iter().collect()
                } else {
                    short
                }
            }
            PriorityTieBreak::Longest => longest(words).into_iter().collect(),
            PriorityTieBreak::Both => words
                .iter()
                .filter(|w| char_len(w) <= ACRONYM_MAX_LEN || char_len(w) >= LONG_WORD_MIN_LEN)
                .cloned()
                .collect(),
        }
    }
}

fn char_len(word: &str) -> usize {
    word.chars().count()
}

/// First of the longest words.
fn longest(words: &[String]) -> Option<String> {
    let mut best: Option<&String> = None;
    for word in words {
        match best {
            Some(current) if current.chars().count() >= word.chars().count() => {}
            _ => best = Some(word),
        }
    }
    best.cloned()
}

/// Ask `extractor` for priority words, falling back to `fallback` when the
/// answer is empty or names words the client name does not contain.
pub fn priority_words(
    extractor: &dyn KeywordExtractor,
    fallback: &HeuristicKeywordExtractor,
    name: &NormalizedName,
) -> Vec<String> {
    let words = extractor.distinctive_words(name);
    let valid = !words.is_empty() && words.iter().all(|w| name.significant_words.contains(w));
    if valid {
        return words;
    }
    if !words.is_empty() {
        warn!(
            "Keyword extractor '{}' returned words outside '{}': {:?}; using heuristic",
            extractor.name(),
            name.normalized,
            words
        );
    }
    fallback.distinctive_words(name)
}
