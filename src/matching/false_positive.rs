// src/matching/false_positive.rs - Context screening for candidate matches

use log::debug;

use super::document::DocumentIndex;
use super::scorer::{Occurrence, ScoreEvidence};

pub const DEFAULT_CONTEXT_RADIUS: usize = 30;

// Negation and irrelevance markers, in normalized form. A marker only counts
// when it touches the matched token: "ems nao se aplica", "sem relacao com ems".
const TRAILING_MARKERS: &[&str] = &[
    "nao se aplica",
    "nao tem relacao",
    "sem relacao com",
    "nao possui relacao",
    "nao guarda relacao",
    "does not apply",
    "not applicable",
    "not related to",
    "unrelated to",
];

const LEADING_MARKERS: &[&str] = &[
    "nao tem relacao com",
    "sem relacao com",
    "nao possui relacao com",
    "nao guarda relacao com",
    "no relation to",
    "not related to",
    "unrelated to",
];

// Followed by "nao", these make the token the subject of a negation:
// "sobre ems nao se aplicam".
const SUBJECT_MARKERS: &[&str] = &["sobre", "acerca de", "quanto a"];

/// Short dictionary words that also show up as company names or acronyms.
pub const COMMON_SHORT_WORDS: &[&str] = &[
    "via", "sol", "mar", "rio", "luz", "vale", "ceu", "paz", "lar", "mais", "bem", "boa",
    "nova", "real", "alfa", "top", "uni", "max", "pro",
];

/// Connectors that, right after a common short word, show it is being used
/// as an ordinary word ("via de regra", "sol do meio dia").
const CONNECTORS: &[&str] = &["de", "do", "da", "dos", "das", "e", "em", "no", "na"];

#[derive(Debug, Clone)]
pub struct FalsePositiveFilter {
    radius: usize,
}

impl Default for FalsePositiveFilter {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_RADIUS)
    }
}

impl FalsePositiveFilter {
    pub fn new(radius: usize) -> Self {
        Self { radius }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    /// True when the normalized window around `matched_token` shows the
    /// token is not a reference to the entity.
    pub fn is_spurious(&self, matched_token: &str, window: &str) -> bool {
        if matched_token.is_empty() {
            return false;
        }
        let padded = format!(" {} ", window);
        let token = format!(" {} ", matched_token);
        let mut from = 0;
        while let Some(found) = padded[from..].find(&token) {
            let start = from + found;
            let before = &padded[..start + 1];
            let after = &padded[start + token.len() - 1..];
            let followed_by = |markers: &[&str]| {
                markers.iter().any(|m| after.starts_with(&format!(" {}", m)))
            };
            let preceded_by = |markers: &[&str]| {
                markers.iter().any(|m| before.ends_with(&format!(" {} ", m)))
            };
            if followed_by(TRAILING_MARKERS)
                || preceded_by(LEADING_MARKERS)
                || (after.starts_with(" nao ") && preceded_by(SUBJECT_MARKERS))
            {
                return true;
            }
            from = start + 1;
        }

        if COMMON_SHORT_WORDS.contains(&matched_token) {
            let needle = token;
            let mut from = 0;
            while let Some(found) = padded[from..].find(&needle) {
                let after = from + found + needle.len();
                let next_word = padded[after..].split(' ').next().unwrap_or("");
                if CONNECTORS.contains(&next_word) {
                    return true;
                }
                from = from + found + 1;
            }
        }
        false
    }

    fn keeps(&self, occurrence: &Occurrence, index: &DocumentIndex) -> bool {
        let text = index.normalized_text();
        let matched = text
            .get(occurrence.offset..occurrence.offset + occurrence.len)
            .unwrap_or("");
        let window = index.normalized_window(occurrence.offset, occurrence.len, self.radius);
        !self.is_spurious(matched, window)
    }

    /// Remove every poisoned occurrence from the evidence, dropping hits
    /// left with none. Returns the screened evidence and how many
    /// occurrences were discarded.
    pub fn screen(&self, evidence: ScoreEvidence, index: &DocumentIndex) -> (ScoreEvidence, usize) {
        let mut discarded = 0;
        let mut retain = |occurrences: &mut Vec<Occurrence>| {
            let before = occurrences.len();
            occurrences.retain(|occurrence| self.keeps(occurrence, index));
            discarded += before - occurrences.len();
            !occurrences.is_empty()
        };

        let ScoreEvidence {
            mut substring,
            mut word_overlap,
            mut sequential,
            mut fuzzy,
        } = evidence;

        substring.retain_mut(|hit| retain(&mut hit.occurrences));
        word_overlap
            .matched
            .retain_mut(|hit| retain(&mut hit.occurrences));
        sequential.retain_mut(|hit| retain(&mut hit.occurrences));
        fuzzy.retain_mut(|candidate| {
            let mut single = vec![candidate.occurrence];
            retain(&mut single)
        });

        if discarded > 0 {
            debug!("Context screening discarded {} occurrence(s)", discarded);
        }

        (
            ScoreEvidence {
                substring,
                word_overlap,
                sequential,
                fuzzy,
            },
            discarded,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::scorer::Scorer;
    use crate::matching::variants::{generate_variants, NormalizedName};

    #[test]
    fn test_negation_phrases_are_spurious() {
        let filter = FalsePositiveFilter::default();
        assert!(filter.is_spurious("ems", "informacoes sobre ems nao se aplicam"));
        assert!(filter.is_spurious("acme", "o item acme does not apply here"));
        assert!(filter.is_spurious("furtan", "furtan sem relacao com o caso"));
        assert!(filter.is_spurious("acme", "there is no relation to acme in this"));
        assert!(!filter.is_spurious("viapol", "a empresa viapol forneceu os materiais"));
    }

    #[test]
    fn test_negation_elsewhere_in_window_is_ignored() {
        let filter = FalsePositiveFilter::default();
        assert!(!filter.is_spurious("viapol ltda", "contrato com viapol ltda clausula 4 nao se aplica"));
        assert!(!filter.is_spurious("ems", "a ems assinou o item 3 does not apply"));
        assert!(!filter.is_spurious("qgc", "sobre o contrato qgc nao constam ressalvas"));
    }

    #[test]
    fn test_subject_of_negation() {
        let filter = FalsePositiveFilter::default();
        assert!(filter.is_spurious("qgc", "dados sobre qgc nao constam"));
        assert!(!filter.is_spurious("qgc", "dados sobre qgc constam"));
    }

    #[test]
    fn test_common_short_word_followed_by_connector() {
        let filter = FalsePositiveFilter::default();
        assert!(filter.is_spurious("sol", "o sol do meio dia"));
        assert!(filter.is_spurious("via", "enviado via e mail"));
        assert!(!filter.is_spurious("sol", "contrato com sol energia"));
        assert!(!filter.is_spurious("viapol", "viapol de sao paulo"));
    }

    #[test]
    fn test_screen_discards_only_poisoned_occurrences() {
        let document = "Sobre EMS não se aplica. ".to_string()
            + &"texto neutro ".repeat(10)
            + "Pedido emitido pela EMS ontem.";
        let name = NormalizedName::from_raw("EMS S.A.");
        let variants = generate_variants(&name.normalized);
        let index = DocumentIndex::build(&document);
        let evidence = Scorer::new().score(&name, &variants, &index);
        let before = evidence.word_overlap.get("ems").unwrap().occurrences.len();
        assert_eq!(before, 2);

        let (screened, discarded) = FalsePositiveFilter::default().screen(evidence, &index);
        assert!(discarded >= 1);
        let kept = &screened.word_overlap.get("ems").unwrap().occurrences;
        assert_eq!(kept.len(), 1);
        assert!(kept[0].offset > 40);
    }

    #[test]
    fn test_screen_drops_fully_poisoned_hits() {
        let name = NormalizedName::from_raw("EMS S.A.");
        let variants = generate_variants(&name.normalized);
        let index = DocumentIndex::build("informações sobre EMS não se aplicam");
        let evidence = Scorer::new().score(&name, &variants, &index);
        assert!(!evidence.substring.is_empty());

        let (screened, discarded) = FalsePositiveFilter::default().screen(evidence, &index);
        assert!(discarded > 0);
        assert!(screened.substring.is_empty());
        assert!(screened.word_overlap.matched.is_empty());
        assert!(screened.fuzzy.is_empty());
    }
}
