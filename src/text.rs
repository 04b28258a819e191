// src/text.rs
//! Keyword matching shared by the scorer, fingerprinter and bucket classifier.

/// Lowercase for matching. Unicode-aware so accented capitals fold too; accents stay.
pub fn fold(s: &str) -> String {
    s.to_lowercase()
}

/// True when `needle` occurs in `haystack` on word boundaries.
///
/// Both sides are expected to be folded already. Multi-word needles match as
/// a phrase; a hit inside a longer word ("ram" in "programme") does not count.
pub fn contains_term(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        let start = from + pos;
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        // advance by one char past the match start
        from = start
            + haystack[start..]
                .chars()
                .next()
                .map(char::len_utf8)
                .unwrap_or(1);
    }
    false
}

/// A folded, deduplicated keyword list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordBank {
    terms: Vec<String>,
}

impl KeywordBank {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for t in terms {
            let f = fold(t.as_ref().trim());
            if !f.is_empty() && !out.contains(&f) {
                out.push(f);
            }
        }
        Self { terms: out }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// First term (in bank order) present in the folded text.
    pub fn first_match<'a>(&'a self, folded: &str) -> Option<&'a str> {
        self.terms
            .iter()
            .find(|t| contains_term(folded, t))
            .map(String::as_str)
    }

    pub fn matches(&self, folded: &str) -> bool {
        self.first_match(folded).is_some()
    }

    /// Number of distinct terms present in the folded text.
    pub fn count_matches(&self, folded: &str) -> usize {
        self.terms
            .iter()
            .filter(|t| contains_term(folded, t))
            .count()
    }
}
