// src/matching/variants.rs - Significant words and alternate surface forms of a client name

use std::collections::HashSet;

use super::normalize::{normalize, MIN_MATCHABLE_LEN};

pub const MIN_SIGNIFICANT_WORD_LEN: usize = 3;

/// Corporate, generic and function words that never identify an entity on
/// their own. Entries are in normalized form.
pub const GENERIC_TERMS: &[&str] = &[
    // legal forms
    "sa", "ltda", "cia", "eireli", "me", "epp", "inc", "corp", "ltd", "llc", "limited", "plc",
    "sociedade", "anonima", "empresa", "companhia", "company", "holding",
    // prepositions, articles, connectors
    "a", "o", "as", "os", "e", "em", "com", "para", "por", "do", "da", "de", "dos", "das",
    "the", "of", "and",
    // line-of-business words
    "comercio", "industria", "industrias", "servicos", "services", "solutions", "distribuidora",
    "materiais", "produtos", "equipamentos", "laboratorio", "farmacia", "saude", "health",
    "medical", "tech", "group", "grupo", "international", "global", "nacional", "brasil",
    "brazil", "center", "centre", "participacoes",
];

/// Prepositions that are routinely dropped from Brazilian company names.
pub const MEDIAL_PREPOSITIONS: &[&str] = &["do", "da", "de", "dos", "das"];

/// Legal-form tokens that may trail a company name.
pub const CORPORATE_SUFFIXES: &[&str] = &[
    "sa", "ltda", "cia", "eireli", "me", "epp", "inc", "corp", "ltd", "llc", "plc", "gmbh",
];

pub fn is_generic_term(token: &str) -> bool {
    GENERIC_TERMS.contains(&token)
}

pub fn is_significant_word(token: &str) -> bool {
    token.chars().count() >= MIN_SIGNIFICANT_WORD_LEN && !is_generic_term(token)
}

/// Significant words of an already-normalized name, in name order, without
/// repeats.
pub fn significant_words(normalized: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    normalized
        .split_whitespace()
        .filter(|token| is_significant_word(token))
        .filter(|token| seen.insert(*token))
        .map(str::to_string)
        .collect()
}

/// A client name after normalization, with the words that drive how strict
/// the decision has to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedName {
    pub raw: String,
    pub normalized: String,
    pub significant_words: Vec<String>,
}

impl NormalizedName {
    pub fn from_raw(raw: &str) -> Self {
        let normalized = normalize(raw);
        let significant_words = significant_words(&normalized);
        Self {
            raw: raw.to_string(),
            normalized,
            significant_words,
        }
    }

    pub fn significant_word_count(&self) -> usize {
        self.significant_words.len()
    }

    /// Collapses entirely to stopwords and legal suffixes.
    pub fn is_degenerate(&self) -> bool {
        self.significant_words.is_empty()
    }

    pub fn is_too_short(&self) -> bool {
        self.normalized.chars().count() < MIN_MATCHABLE_LEN
    }
}

/// Alternate surface forms of a normalized name, most literal first.
///
/// Produces the name itself, the name without medial prepositions, the name
/// without its trailing legal suffix, both rewrites together, and the
/// space-free spellings. Every variant is at least [`MIN_MATCHABLE_LEN`]
/// chars and is already in normalized form. Empty only when the input is
/// itself too short to match.
pub fn generate_variants(normalized: &str) -> Vec<String> {
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    let without_prepositions = drop_prepositions(&tokens);
    let without_suffix = strip_trailing_suffixes(&tokens);
    let without_both = strip_trailing_suffixes(&without_prepositions);

    let mut candidates = vec![
        tokens.join(" "),
        without_prepositions.join(" "),
        without_suffix.join(" "),
        without_both.join(" "),
    ];
    if tokens.len() > 1 {
        candidates.push(tokens.concat());
    }
    if without_both.len() > 1 {
        candidates.push(without_both.concat());
    }

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|variant| variant.chars().count() >= MIN_MATCHABLE_LEN)
        // a rewrite must not produce something the normalizer would change
        .filter(|variant| normalize(variant) == *variant)
        .filter(|variant| seen.insert(variant.clone()))
        .collect()
}

fn drop_prepositions<'a>(tokens: &[&'a str]) -> Vec<&'a str> {
    if tokens.len() < 3 {
        return tokens.to_vec();
    }
    let last = tokens.len() - 1;
    tokens
        .iter()
        .enumerate()
        .filter(|(i, token)| *i == 0 || *i == last || !MEDIAL_PREPOSITIONS.contains(*token))
        .map(|(_, token)| *token)
        .collect()
}

fn strip_trailing_suffixes<'a>(tokens: &[&'a str]) -> Vec<&'a str> {
    let mut kept = tokens.to_vec();
    while kept.len() > 1 {
        match kept.last() {
            Some(last) if CORPORATE_SUFFIXES.contains(last) => {
                kept.pop();
            }
            _ => break,
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_significant_words_skip_generic_terms() {
        assert_eq!(significant_words("viapol ltda"), vec!["viapol"]);
        assert_eq!(significant_words("ems sa"), vec!["ems"]);
        assert_eq!(
            significant_words("industria de tintas viapol ltda"),
            vec!["tintas", "viapol"]
        );
        assert_eq!(significant_words("jose pupin agropecuaria"), vec!["jose", "pupin", "agropecuaria"]);
        assert!(significant_words("cia ltda sa").is_empty());
    }

    #[test]
    fn test_short_tokens_are_not_significant() {
        assert_eq!(significant_words("ab xy comercio"), Vec::<String>::new());
        assert_eq!(significant_words("qgc sa"), vec!["qgc"]);
    }

    #[test]
    fn test_normalized_name_flags() {
        let degenerate = NormalizedName::from_raw("Cia. Ltda. S/A");
        assert!(degenerate.is_degenerate());
        assert!(!degenerate.is_too_short());

        let empty = NormalizedName::from_raw("  ... ");
        assert!(empty.is_too_short());
        assert!(empty.is_degenerate());

        let viapol = NormalizedName::from_raw("Viapol Ltda");
        assert_eq!(viapol.normalized, "viapol ltda");
        assert_eq!(viapol.significant_word_count(), 1);
    }

    #[test]
    fn test_variants_cover_common_rewrites() {
        let variants = generate_variants("industria de tintas viapol ltda");
        assert_eq!(variants[0], "industria de tintas viapol ltda");
        assert!(variants.contains(&"industria tintas viapol ltda".to_string()));
        assert!(variants.contains(&"industria de tintas viapol".to_string()));
        assert!(variants.contains(&"industria tintas viapol".to_string()));
        assert!(variants.contains(&"industriatintasviapol".to_string()));
    }

    #[test]
    fn test_suffix_stripping_keeps_at_least_one_token() {
        assert_eq!(generate_variants("viapol ltda"), vec!["viapol ltda", "viapol", "viapolltda"]);
        let only_suffix = generate_variants("ltda");
        assert_eq!(only_suffix, vec!["ltda"]);
    }

    #[test]
    fn test_variants_are_deduplicated_and_long_enough() {
        let variants = generate_variants("ems sa");
        assert_eq!(variants, vec!["ems sa", "ems", "emssa"]);
        assert!(generate_variants("ab").is_empty());
    }

    #[test]
    fn test_variants_are_already_normalized() {
        for name in ["Indústria de Tintas Viapol Ltda.", "EMS S.A.", "Mauad Franqueadora Ltda.", "José Pupin", "GROẞ Handel"] {
            let normalized = normalize(name);
            for variant in generate_variants(&normalized) {
                assert_eq!(normalize(&variant), variant);
            }
        }
        assert!(generate_variants(&normalize("GROẞ Handel")).contains(&"gross handel".to_string()));
    }
}
