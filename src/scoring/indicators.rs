// src/scoring/indicators.rs
//! Practical-impact indicators: money, dates, percentages, organizations.
//!
//! Callers that already ran entity extraction pass [`EntityIndicators`] directly.
//! Otherwise [`IndicatorDetector`] finds the categories with the configured regexes.
//! Each category is a yes/no signal; how often it occurs does not matter.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::IndicatorPatterns;
use crate::error::CurationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityIndicators {
    pub money: bool,
    pub date: bool,
    pub percent: bool,
    pub org: bool,
}

#[derive(Debug, Clone)]
pub struct IndicatorDetector {
    money: Regex,
    date: Regex,
    percent: Regex,
    org: Regex,
}

impl IndicatorDetector {
    pub fn new(p: &IndicatorPatterns) -> Result<Self, CurationError> {
        let compile = |name: &str, pat: &str| {
            Regex::new(pat).map_err(|e| {
                CurationError::config(format!("indicator pattern `{name}` regex error: {e}"))
            })
        };
        Ok(Self {
            money: compile("money", &p.money)?,
            date: compile("date", &p.date)?,
            percent: compile("percent", &p.percent)?,
            org: compile("org", &p.org)?,
        })
    }

    /// Detect indicator categories. Runs on the original-case text: the org
    /// pattern relies on capitalized acronyms.
    pub fn detect(&self, text: &str) -> EntityIndicators {
        EntityIndicators {
            money: self.money.is_match(text),
            date: self.date.is_match(text),
            percent: self.percent.is_match(text),
            org: self.org.is_match(text),
        }
    }

    /// `"category: matched text"` entries for diagnostics, first match per category.
    pub fn reasons(&self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        for (category, re) in [
            ("money", &self.money),
            ("date", &self.date),
            ("percent", &self.percent),
            ("org", &self.org),
        ] {
            if let Some(m) = re.find(text) {
                out.push(format!("{category}: {}", m.as_str().trim()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det() -> IndicatorDetector {
        IndicatorDetector::new(&IndicatorPatterns::default()).unwrap()
    }

    #[test]
    fn detects_each_category() {
        let d = det();
        let ind = d.detect("Le SMIC augmente de 2,5 % le 1er janvier, soit 30 € par mois");
        assert_eq!(
            ind,
            EntityIndicators {
                money: true,
                date: true,
                percent: true,
                org: true,
            }
        );
    }

    #[test]
    fn plain_text_has_no_indicators() {
        let ind = det().detect("une belle journée au bord de la mer");
        assert_eq!(ind, EntityIndicators::default());
    }

    #[test]
    fn money_forms() {
        let d = det();
        assert!(d.detect("une aide de 150 euros").money);
        assert!(d.detect("$5 billion deal").money);
        assert!(d.detect("coût: 3 milliards").money);
        assert!(!d.detect("3 enfants").money);
    }

    #[test]
    fn reasons_list_first_match_per_category() {
        let r = det().reasons("Hausse de 3 % annoncée par le gouvernement");
        assert!(r.contains(&"percent: 3 %".to_string()));
        assert!(r.contains(&"org: gouvernement".to_string()));
        assert_eq!(r.len(), 2);
    }
}
