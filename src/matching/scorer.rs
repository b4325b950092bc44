// src/matching/scorer.rs - Raw similarity evidence for one client name against one document
//
// Each strategy looks at the document independently and records what it
// found. Nothing here decides whether a client is present.

use std::collections::HashMap;

use log::debug;
use strsim::normalized_levenshtein;

use super::document::DocumentIndex;
use super::variants::{NormalizedName, MEDIAL_PREPOSITIONS};

const MAX_OCCURRENCES_PER_HIT: usize = 32;
const MAX_FUZZY_CANDIDATES: usize = 8;
pub const MIN_RECORDED_FUZZY_SCORE: u8 = 50;

pub const EXACT_WORD_SCORE: u8 = 100;
pub const SUBSTITUTED_WORD_SCORE: u8 = 90;

/// A span of the normalized document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub offset: usize,
    pub len: usize,
}

/// A variant found as a whole phrase in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstringHit {
    pub variant: String,
    /// The variant is the full normalized name, not a rewrite of it.
    pub is_full_form: bool,
    pub occurrences: Vec<Occurrence>,
}

/// A significant word found in the document's word set, possibly through a
/// spelling substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct WordHit {
    pub word: String,
    pub form: String,
    pub score: u8,
    pub occurrences: Vec<Occurrence>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordOverlap {
    pub matched: Vec<WordHit>,
    pub total: usize,
}

impl WordOverlap {
    pub fn proportion(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.matched.len() as f64 / self.total as f64
    }

    pub fn get(&self, word: &str) -> Option<&WordHit> {
        self.matched.iter().find(|hit| hit.word == word)
    }
}

/// Two consecutive significant words written next to each other.
#[derive(Debug, Clone, PartialEq)]
pub struct PairHit {
    pub first: String,
    pub second: String,
    pub occurrences: Vec<Occurrence>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzyMeasure {
    /// Edit-distance ratio against a token-aligned window of the document.
    PartialRatio,
    /// Same ratio after sorting the tokens of both sides.
    TokenSortRatio,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyCandidate {
    pub variant: String,
    pub window: String,
    pub score: u8,
    pub measure: FuzzyMeasure,
    pub occurrence: Occurrence,
}

/// Everything the strategies found for one name. Thresholds are applied
/// later by the decision policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreEvidence {
    pub substring: Vec<SubstringHit>,
    pub word_overlap: WordOverlap,
    pub sequential: Vec<PairHit>,
    /// Best candidates first.
    pub fuzzy: Vec<FuzzyCandidate>,
}

impl ScoreEvidence {
    /// The full-form hit when there is one, otherwise the first rewrite hit.
    pub fn best_substring(&self) -> Option<&SubstringHit> {
        self.substring
            .iter()
            .find(|hit| hit.is_full_form)
            .or_else(|| self.substring.first())
    }

    pub fn fuzzy_best(&self) -> Option<&FuzzyCandidate> {
        self.fuzzy.first()
    }

    pub fn fuzzy_best_score(&self) -> u8 {
        self.fuzzy_best().map(|candidate| candidate.score).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.substring.is_empty()
            && self.word_overlap.matched.is_empty()
            && self.sequential.is_empty()
            && self.fuzzy.is_empty()
    }
}

/// One independent way of looking for a name in a document.
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn collect(
        &self,
        name: &NormalizedName,
        variants: &[String],
        index: &DocumentIndex,
        evidence: &mut ScoreEvidence,
    );
}

/// Token-aligned phrase search for every variant. The first variant is the
/// full normalized name.
pub struct ExactStrategy;

impl Strategy for ExactStrategy {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn collect(
        &self,
        _name: &NormalizedName,
        variants: &[String],
        index: &DocumentIndex,
        evidence: &mut ScoreEvidence,
    ) {
        for (i, variant) in variants.iter().enumerate() {
            let occurrences: Vec<Occurrence> = index
                .phrase_positions(variant, MAX_OCCURRENCES_PER_HIT)
                .into_iter()
                .map(|offset| Occurrence {
                    offset,
                    len: variant.len(),
                })
                .collect();
            if !occurrences.is_empty() {
                evidence.substring.push(SubstringHit {
                    variant: variant.clone(),
                    is_full_form: i == 0,
                    occurrences,
                });
            }
        }
    }
}

/// Membership of each significant word in the document's word set.
pub struct WordOverlapStrategy;

impl Strategy for WordOverlapStrategy {
    fn name(&self) -> &'static str {
        "word_overlap"
    }

    fn collect(
        &self,
        name: &NormalizedName,
        _variants: &[String],
        index: &DocumentIndex,
        evidence: &mut ScoreEvidence,
    ) {
        evidence.word_overlap.total = name.significant_word_count();
        for word in &name.significant_words {
            let found = if index.contains_word(word) {
                Some((word.clone(), EXACT_WORD_SCORE))
            } else {
                substitution_forms(word)
                    .into_iter()
                    .find(|form| index.contains_word(form))
                    .map(|form| (form, SUBSTITUTED_WORD_SCORE))
            };
            if let Some((form, score)) = found {
                let occurrences = index
                    .word_positions(&form)
                    .iter()
                    .take(MAX_OCCURRENCES_PER_HIT)
                    .map(|&offset| Occurrence {
                        offset,
                        len: form.len(),
                    })
                    .collect();
                evidence.word_overlap.matched.push(WordHit {
                    word: word.clone(),
                    form,
                    score,
                    occurrences,
                });
            }
        }
    }
}

/// Spellings that still refer to the same word: singular/plural and single
/// s/z swaps. Cedilla and accents are already folded by normalization.
pub fn substitution_forms(word: &str) -> Vec<String> {
    let mut forms = Vec::new();
    if let Some(stem) = word.strip_suffix("es") {
        forms.push(stem.to_string());
    }
    if let Some(stem) = word.strip_suffix('s') {
        forms.push(stem.to_string());
    }
    forms.push(format!("{}s", word));
    forms.push(format!("{}es", word));
    for (i, c) in word.char_indices() {
        let swapped = match c {
            's' => 'z',
            'z' => 's',
            _ => continue,
        };
        let mut form = String::with_capacity(word.len());
        form.push_str(&word[..i]);
        form.push(swapped);
        form.push_str(&word[i + 1..]);
        forms.push(form);
    }

    let mut kept: Vec<String> = Vec::with_capacity(forms.len());
    for form in forms {
        if form.chars().count() >= 3 && form != word && !kept.contains(&form) {
            kept.push(form);
        }
    }
    kept
}

/// Adjacent pairs of significant words, allowing a medial preposition
/// between them ("jose da silva").
pub struct SequentialWordsStrategy;

impl Strategy for SequentialWordsStrategy {
    fn name(&self) -> &'static str {
        "sequential_words"
    }

    fn collect(
        &self,
        name: &NormalizedName,
        _variants: &[String],
        index: &DocumentIndex,
        evidence: &mut ScoreEvidence,
    ) {
        for pair in name.significant_words.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            let mut phrases = vec![format!("{} {}", first, second)];
            phrases.extend(
                MEDIAL_PREPOSITIONS
                    .iter()
                    .map(|prep| format!("{} {} {}", first, prep, second)),
            );

            let mut occurrences: Vec<Occurrence> = phrases
                .iter()
                .flat_map(|phrase| {
                    index
                        .phrase_positions(phrase, MAX_OCCURRENCES_PER_HIT)
                        .into_iter()
                        .map(move |offset| Occurrence {
                            offset,
                            len: phrase.len(),
                        })
                })
                .collect();
            if occurrences.is_empty() {
                continue;
            }
            occurrences.sort_by_key(|occurrence| occurrence.offset);
            occurrences.truncate(MAX_OCCURRENCES_PER_HIT);
            evidence.sequential.push(PairHit {
                first: first.clone(),
                second: second.clone(),
                occurrences,
            });
        }
    }
}

/// Edit-distance similarity between each variant and every token-aligned
/// window of the document whose width is within one token of the variant's.
/// Windows are aligned on tokens so a short name never scores against the
/// inside of a longer word.
pub struct FuzzyStrategy;

impl Strategy for FuzzyStrategy {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn collect(
        &self,
        _name: &NormalizedName,
        variants: &[String],
        index: &DocumentIndex,
        evidence: &mut ScoreEvidence,
    ) {
        // best candidate per window start
        let mut best_by_offset: HashMap<usize, FuzzyCandidate> = HashMap::new();

        for variant in variants {
            let tokens: Vec<&str> = variant.split(' ').collect();
            let width = tokens.len();
            let sorted_variant = sorted_tokens(variant);
            let initials: Vec<char> = tokens.iter().filter_map(|t| t.chars().next()).collect();

            for start in 0..index.token_count() {
                let opens_like_variant = index
                    .token(start)
                    .and_then(|token| token.chars().next())
                    .map(|c| initials.contains(&c))
                    .unwrap_or(false);
                if !opens_like_variant {
                    continue;
                }

                for window_width in [width.saturating_sub(1), width, width + 1] {
                    let window = match index.token_window(start, window_width) {
                        Some(window) => window,
                        None => continue,
                    };
                    let mut score = similarity(variant, window);
                    let mut measure = FuzzyMeasure::PartialRatio;
                    if window_width == width && width > 1 {
                        let sorted = similarity(&sorted_variant, &sorted_tokens(window));
                        if sorted > score {
                            score = sorted;
                            measure = FuzzyMeasure::TokenSortRatio;
                        }
                    }
                    if score < MIN_RECORDED_FUZZY_SCORE {
                        continue;
                    }

                    let offset = index.token_start(start).unwrap_or(0);
                    let candidate = FuzzyCandidate {
                        variant: variant.clone(),
                        window: window.to_string(),
                        score,
                        measure,
                        occurrence: Occurrence {
                            offset,
                            len: window.len(),
                        },
                    };
                    match best_by_offset.get(&offset) {
                        Some(existing) if existing.score >= candidate.score => {}
                        _ => {
                            best_by_offset.insert(offset, candidate);
                        }
                    }
                }
            }
        }

        let mut candidates: Vec<FuzzyCandidate> = best_by_offset.into_values().collect();
        candidates.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.occurrence.offset.cmp(&b.occurrence.offset))
        });
        candidates.truncate(MAX_FUZZY_CANDIDATES);
        evidence.fuzzy = candidates;
    }
}

/// Normalized edit-distance similarity on a 0..=100 scale.
pub fn similarity(a: &str, b: &str) -> u8 {
    (normalized_levenshtein(a, b) * 100.0).round().clamp(0.0, 100.0) as u8
}

fn sorted_tokens(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Runs every strategy; none of them is short-circuited by another.
pub struct Scorer {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new()
    }
}

impl Scorer {
    pub fn new() -> Self {
        Self::with_strategies(vec![
            Box::new(ExactStrategy),
            Box::new(WordOverlapStrategy),
            Box::new(SequentialWordsStrategy),
            Box::new(FuzzyStrategy),
        ])
    }

    pub fn with_strategies(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn score(
        &self,
        name: &NormalizedName,
        variants: &[String],
        index: &DocumentIndex,
    ) -> ScoreEvidence {
        let mut evidence = ScoreEvidence::default();
        for strategy in &self.strategies {
            strategy.collect(name, variants, index, &mut evidence);
        }
        debug!(
            "Scored '{}': {} substring, {}/{} words, {} pairs, fuzzy best {}",
            name.normalized,
            evidence.substring.len(),
            evidence.word_overlap.matched.len(),
            evidence.word_overlap.total,
            evidence.sequential.len(),
            evidence.fuzzy_best_score()
        );
        evidence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::variants::generate_variants;

    fn score(raw: &str, document: &str) -> ScoreEvidence {
        let name = NormalizedName::from_raw(raw);
        let variants = generate_variants(&name.normalized);
        let index = DocumentIndex::build(document);
        Scorer::new().score(&name, &variants, &index)
    }

    #[test]
    fn test_exact_strategy_marks_full_form() {
        let evidence = score("Viapol Ltda", "Contrato com VIAPOL LTDA. assinado");
        let best = evidence.best_substring().unwrap();
        assert!(best.is_full_form);
        assert_eq!(best.variant, "viapol ltda");

        let rewritten = score("Viapol Ltda", "A empresa Viapol forneceu os materiais");
        let best = rewritten.best_substring().unwrap();
        assert!(!best.is_full_form);
        assert_eq!(best.variant, "viapol");
    }

    #[test]
    fn test_word_overlap_accepts_plural_and_sz_swaps() {
        let evidence = score("Tintas Brasileiras Viapol", "tinta brazileiras e viapol");
        let overlap = &evidence.word_overlap;
        assert_eq!(overlap.total, 3);
        assert_eq!(overlap.get("viapol").unwrap().score, EXACT_WORD_SCORE);
        assert_eq!(overlap.get("tintas").unwrap().form, "tinta");
        assert_eq!(overlap.get("brasileiras").unwrap().score, SUBSTITUTED_WORD_SCORE);
        assert!((overlap.proportion() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_substitution_forms() {
        let forms = substitution_forms("tintas");
        assert!(forms.contains(&"tinta".to_string()));
        assert!(forms.contains(&"tintaz".to_string()));
        assert!(!forms.contains(&"tintas".to_string()));
        assert!(substitution_forms("ems").iter().all(|f| f.len() >= 3));
    }

    #[test]
    fn test_sequential_pairs_tolerate_prepositions() {
        let evidence = score("Jose Silva Pupin Agro", "propriedade de jose da silva em goias");
        assert_eq!(evidence.sequential.len(), 1);
        assert_eq!(evidence.sequential[0].first, "jose");
        assert_eq!(evidence.sequential[0].second, "silva");
    }

    #[test]
    fn test_fuzzy_is_token_aligned() {
        let evidence = score("Viapol", "a viapolimeros vendeu");
        assert!(evidence.substring.is_empty());
        assert!(evidence.word_overlap.matched.is_empty());
        assert_eq!(evidence.fuzzy_best_score(), 50);
    }

    #[test]
    fn test_fuzzy_tolerates_typos_and_word_order() {
        let typo = score("Mauad Franqueadora", "a mauad franqeadora ltda");
        assert!(typo.fuzzy_best_score() >= 90, "got {}", typo.fuzzy_best_score());

        let swapped = score("Franqueadora Mauad", "pela mauad franqueadora");
        let best = swapped.fuzzy_best().unwrap();
        assert_eq!(best.score, 100);
        assert_eq!(best.measure, FuzzyMeasure::TokenSortRatio);
    }

    #[test]
    fn test_fuzzy_candidates_are_bounded_and_sorted() {
        let document = "viapol viapo viapl viaopl ".repeat(10);
        let evidence = score("Viapol", &document);
        assert!(evidence.fuzzy.len() <= MAX_FUZZY_CANDIDATES);
        assert!(evidence.fuzzy.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(evidence.fuzzy_best().unwrap().occurrence.offset, 0);
    }

    #[test]
    fn test_empty_document_yields_no_evidence() {
        let evidence = score("Viapol Ltda", "");
        assert!(evidence.is_empty());
        assert_eq!(evidence.word_overlap.total, 1);
    }

    #[test]
    fn test_default_scorer_runs_all_strategies() {
        assert_eq!(
            Scorer::new().strategy_names(),
            vec!["exact", "word_overlap", "sequential_words", "fuzzy"]
        );
    }
}
