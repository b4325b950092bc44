// src/matching/normalize.rs - Canonical form for client names and document text
//
// The same pipeline runs over names and documents so that substring and
// word-set comparisons between the two are meaningful. Every byte of the
// output remembers which byte of the input produced it, which is how the
// document index maps a normalized match back to the original text.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::{decompose_compatible, is_combining_mark};

/// Results shorter than this (in chars) are too short to match anything.
pub const MIN_MATCHABLE_LEN: usize = 3;

// Applied in order, after lower-casing and before punctuation stripping:
// several spellings only differ by punctuation ("s/a", "s.a.", "e.i.r.e.l.i").
// Separators are `[\W_]` so that a rule sees the same token boundaries that
// the punctuation step will produce later.
static SUFFIX_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\bs[\W_]*[./][\W_]*a\b\.?", " sa "),
        (r"\bsociedade[\W_]+anonima\b", " sa "),
        (r"\blimitada\b", " ltda "),
        (r"\bcompanhia\b", " cia "),
        (r"\be[\W_]*\.[\W_]*i[\W_]*\.[\W_]*r[\W_]*\.[\W_]*e[\W_]*\.[\W_]*l[\W_]*\.[\W_]*i\b\.?", " eireli "),
        (r"\bl[\W_]*\.[\W_]*l[\W_]*\.[\W_]*c\b\.?", " llc "),
        (r"\bincorporated\b", " inc "),
        (r"\bcorporation\b", " corp "),
        (r"\blimited\b", " ltd "),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("suffix rule patterns are valid"),
            replacement,
        )
    })
    .collect()
});

/// Normalized text plus, for every output byte, the byte offset in the
/// source string it was derived from.
#[derive(Debug, Clone, Default)]
pub struct NormalizedText {
    text: String,
    origins: Vec<usize>,
}

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True when the text is below [`MIN_MATCHABLE_LEN`] characters.
    pub fn is_too_short(&self) -> bool {
        self.text.chars().count() < MIN_MATCHABLE_LEN
    }

    /// Byte offset in the source string that produced the given normalized
    /// byte offset. Offsets past the end clamp to the last known origin.
    pub fn source_offset(&self, normalized_offset: usize) -> usize {
        match self.origins.get(normalized_offset) {
            Some(origin) => *origin,
            None => self.origins.last().copied().unwrap_or(0),
        }
    }
}

/// Normalize a client name or a document body.
///
/// Steps: fold diacritics, lower-case, canonicalize corporate suffixes,
/// replace non-alphanumerics with spaces, collapse whitespace. Idempotent.
pub fn normalize(text: &str) -> String {
    normalize_mapped(text).into_string()
}

/// Same as [`normalize`], keeping the output-to-source offset map.
pub fn normalize_mapped(text: &str) -> NormalizedText {
    let mut mapped = MappedText::from_source(text)
        .map_chars(fold_char)
        .map_chars(|c, out| out.extend(c.to_lowercase()))
        // lower-casing can produce letters with their own fold (ẞ -> ß -> ss)
        .map_chars(fold_char);

    for (rule, replacement) in SUFFIX_RULES.iter() {
        mapped = mapped.replace_all(rule, replacement);
    }

    let mapped = mapped
        .map_chars(|c, out| out.push(if c.is_alphanumeric() { c } else { ' ' }))
        .collapse_whitespace();

    NormalizedText {
        text: mapped.text,
        origins: mapped.origins,
    }
}

/// Fold a single char to its base Latin form. Letters that carry no
/// canonical decomposition (ø, ß, æ...) are spelled out explicitly.
/// Connector punctuation is turned into a space here so the suffix rules
/// treat it as a separator.
fn fold_char(c: char, out: &mut Vec<char>) {
    if c.is_ascii() {
        out.push(if c == '_' { ' ' } else { c });
        return;
    }
    let spelled: Option<&str> = match c {
        'ø' => Some("o"),
        'Ø' => Some("O"),
        'ß' => Some("ss"),
        'æ' => Some("ae"),
        'Æ' => Some("AE"),
        'œ' => Some("oe"),
        'Œ' => Some("OE"),
        'đ' => Some("d"),
        'Đ' => Some("D"),
        'ł' => Some("l"),
        'Ł' => Some("L"),
        'þ' => Some("th"),
        'Þ' => Some("TH"),
        '‿' | '⁀' | '⁔' | '︳' | '︴' | '﹍' | '﹎' | '﹏' | '＿' => Some(" "),
        _ => None,
    };
    if let Some(spelled) = spelled {
        out.extend(spelled.chars());
        return;
    }
    decompose_compatible(c, |d| {
        if !is_combining_mark(d) {
            out.push(d);
        }
    });
}

/// A string under transformation that tracks, per byte, its source offset.
struct MappedText {
    text: String,
    origins: Vec<usize>,
}

impl MappedText {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            origins: Vec::with_capacity(capacity),
        }
    }

    fn from_source(source: &str) -> Self {
        let mut mapped = Self::with_capacity(source.len());
        for (offset, c) in source.char_indices() {
            mapped.push(c, offset);
        }
        mapped
    }

    fn push(&mut self, c: char, origin: usize) {
        self.text.push(c);
        for _ in 0..c.len_utf8() {
            self.origins.push(origin);
        }
    }

    fn push_slice(&mut self, other: &MappedText, start: usize, end: usize) {
        self.text.push_str(&other.text[start..end]);
        self.origins.extend_from_slice(&other.origins[start..end]);
    }

    fn map_chars<F>(self, mut f: F) -> Self
    where
        F: FnMut(char, &mut Vec<char>),
    {
        let mut mapped = Self::with_capacity(self.text.len());
        let mut buffer = Vec::with_capacity(4);
        for (offset, c) in self.text.char_indices() {
            buffer.clear();
            f(c, &mut buffer);
            let origin = self.origins[offset];
            for out in &buffer {
                mapped.push(*out, origin);
            }
        }
        mapped
    }

    fn replace_all(self, rule: &Regex, replacement: &str) -> Self {
        if !rule.is_match(&self.text) {
            return self;
        }
        let mut mapped = Self::with_capacity(self.text.len());
        let mut last = 0;
        for found in rule.find_iter(&self.text) {
            mapped.push_slice(&self, last, found.start());
            let origin = self.origins[found.start()];
            for c in replacement.chars() {
                mapped.push(c, origin);
            }
            last = found.end();
        }
        mapped.push_slice(&self, last, self.text.len());
        mapped
    }

    /// Trim and squeeze every whitespace run to a single ASCII space.
    fn collapse_whitespace(self) -> Self {
        let mut mapped = Self::with_capacity(self.text.len());
        let mut pending_space: Option<usize> = None;
        for (offset, c) in self.text.char_indices() {
            if c.is_whitespace() {
                if pending_space.is_none() && !mapped.text.is_empty() {
                    pending_space = Some(self.origins[offset]);
                }
                continue;
            }
            if let Some(origin) = pending_space.take() {
                mapped.push(' ', origin);
            }
            mapped.push(c, self.origins[offset]);
        }
        mapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_diacritics_and_case() {
        assert_eq!(normalize("Informações Técnicas"), "informacoes tecnicas");
        assert_eq!(normalize("AÇÚCAR São João"), "acucar sao joao");
        assert_eq!(normalize("Søren Straße"), "soren strasse");
    }

    #[test]
    fn test_canonicalizes_corporate_suffixes() {
        assert_eq!(normalize("EMS S.A."), "ems sa");
        assert_eq!(normalize("EMS S/A"), "ems sa");
        assert_eq!(normalize("EMS S. A."), "ems sa");
        assert_eq!(normalize("Viapol Limitada"), "viapol ltda");
        assert_eq!(normalize("Viapol Ltda."), "viapol ltda");
        assert_eq!(normalize("Furtan Sociedade Anônima"), "furtan sa");
        assert_eq!(normalize("Companhia Vale"), "cia vale");
        assert_eq!(normalize("Acme E.I.R.E.L.I."), "acme eireli");
        assert_eq!(normalize("Acme Corporation"), "acme corp");
    }

    #[test]
    fn test_does_not_fuse_suffix_inside_words() {
        assert_eq!(normalize("vendas.a seguir"), "vendas a seguir");
        assert_eq!(normalize("oasis s-a"), "oasis s a");
    }

    #[test]
    fn test_punctuation_and_whitespace_collapse() {
        assert_eq!(normalize("  Mauad --- Franqueadora,\n\tLtda.  "), "mauad franqueadora ltda");
        assert_eq!(normalize("LongPing High-Tech"), "longping high tech");
        assert_eq!(normalize("a_b"), "a b");
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("!!! ... ---"), "");
        assert!(normalize_mapped("S.").is_too_short());
        assert!(!normalize_mapped("EMS").is_too_short());
    }

    #[test]
    fn test_folds_letters_introduced_by_lowercasing() {
        assert_eq!(normalize("GROẞ Handel"), "gross handel");
        assert_eq!(normalize("groß handel"), "gross handel");
        assert_eq!(normalize("İZMİR"), "izmir");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "EMS S.A.",
            "Viapol Ltda",
            "Indústria de Tintas Viapol Limitada",
            "sociedade_anonima",
            "_sociedade anonima",
            "Acme E.I.R.E.L.I. - ME",
            "informações sobre EMS não se aplicam",
            "ﬁnanceira Ⅻ ½",
            "İstanbul Æther",
            "S/A S.A S . A",
            "GROẞ Handel",
            "İZMİR Ticaret",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_offsets_point_back_into_source() {
        let source = "A empresa Viapol forneceu";
        let mapped = normalize_mapped(source);
        let offset = mapped.as_str().find("viapol").unwrap();
        let origin = mapped.source_offset(offset);
        assert_eq!(&source[origin..origin + 6], "Viapol");
    }

    #[test]
    fn test_offsets_survive_multibyte_folding() {
        let source = "Informações: Sabiá Ltda";
        let mapped = normalize_mapped(source);
        let offset = mapped.as_str().find("sabia").unwrap();
        let origin = mapped.source_offset(offset);
        assert!(source[origin..].starts_with("Sabiá"));
    }
}
