// src/models/matching.rs - Per-client match records handed to the result sink

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Label reported for clients with no accepted verdict.
pub const NOT_APPLICABLE: &str = "N/A";

/// Strategy behind an accepted verdict. Declaration order is the reporting
/// priority when several strategies qualify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchType {
    Exact,
    PunctuationFree,
    WordOverlap,
    SequentialWords,
    Fuzzy,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "Exact",
            MatchType::PunctuationFree => "PunctuationFree",
            MatchType::WordOverlap => "WordOverlap",
            MatchType::SequentialWords => "SequentialWords",
            MatchType::Fuzzy => "Fuzzy",
        }
    }

    pub fn label(match_type: Option<MatchType>) -> &'static str {
        match_type.map(|t| t.as_str()).unwrap_or(NOT_APPLICABLE)
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a client ended up found or not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    Matched,
    NoEvidence,
    InsufficientEvidence,
    FalsePositiveSuppressed,
    EmptyDocument,
    DegenerateName,
    NameTooShort,
}

impl MatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchReason::Matched => "matched",
            MatchReason::NoEvidence => "no evidence",
            MatchReason::InsufficientEvidence => "insufficient evidence",
            MatchReason::FalsePositiveSuppressed => "false positive suppressed",
            MatchReason::EmptyDocument => "empty document",
            MatchReason::DegenerateName => "name has no significant words",
            MatchReason::NameTooShort => "name too short to match",
        }
    }
}

/// Where and how a variant matched. Only used to pick the context snippet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvidence {
    /// Byte offset in the normalized document.
    pub position: usize,
    pub matched_variant: String,
    pub strategy: MatchType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub client_name: String,
    pub found: bool,
    /// 0..=100
    pub confidence: u8,
    #[serde(serialize_with = "serialize_match_type")]
    pub match_type: Option<MatchType>,
    pub matched_words: Vec<String>,
    pub context: String,
    pub reason: MatchReason,
    pub fuzzy_score: Option<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<MatchEvidence>,
}

impl MatchResult {
    /// A not-found record with no evidence at all.
    pub fn rejected(client_name: &str, reason: MatchReason) -> Self {
        Self {
            client_name: client_name.to_string(),
            found: false,
            confidence: 0,
            match_type: None,
            matched_words: Vec::new(),
            context: String::new(),
            reason,
            fuzzy_score: None,
            evidence: Vec::new(),
        }
    }

    pub fn match_type_label(&self) -> &'static str {
        MatchType::label(self.match_type)
    }
}

fn serialize_match_type<S>(match_type: &Option<MatchType>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(MatchType::label(*match_type))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EmptyName,
}

/// An input row that was not evaluated, with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedInput {
    pub index: usize,
    pub raw: String,
    pub reason: SkipReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_type_priority_follows_declaration_order() {
        let mut types = vec![
            MatchType::Fuzzy,
            MatchType::WordOverlap,
            MatchType::Exact,
            MatchType::SequentialWords,
            MatchType::PunctuationFree,
        ];
        types.sort();
        assert_eq!(types.first(), Some(&MatchType::Exact));
        assert_eq!(types.last(), Some(&MatchType::Fuzzy));
    }

    #[test]
    fn test_rejected_result_serializes_not_applicable() {
        let result = MatchResult::rejected("Cia Ltda", MatchReason::DegenerateName);
        assert_eq!(result.match_type_label(), NOT_APPLICABLE);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["match_type"], "N/A");
        assert_eq!(json["reason"], "degenerate_name");
        assert_eq!(json["confidence"], 0);
        assert!(json.get("evidence").is_none());
    }
}
