//! # Source Trust
//!
//! Maps publishers (e.g. "AFP", "Le Monde", "Reuters") to a multiplicative trust
//! factor applied last in scoring.
//!
//! - Factors are clamped to `[1.0, 2.0]`: trust can lift a score, never sink it.
//! - Case-insensitive lookup with normalization of punctuation, dashes, etc.
//! - Aliases map alternative spellings/domains to canonical sources.
//! - Fallback order: aliases → exact match → substring match → default.

use serde::Deserialize;
use std::collections::HashMap;

const MIN_FACTOR: f64 = 1.0;
const MAX_FACTOR: f64 = 2.0;

/// `[source_trust]` section of the curation config.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SourceTrustConfig {
    /// Factor when no source matches.
    #[serde(default = "default_factor")]
    pub default_factor: f64,
    /// Explicit factors for canonical source names.
    #[serde(default)]
    pub weights: HashMap<String, f64>,
    /// Aliases mapping non-canonical names → canonical names.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

fn default_factor() -> f64 {
    1.0
}

impl SourceTrustConfig {
    /// Trust factor for a source name.
    ///
    /// Steps:
    /// 1. Alias lookup (normalized) → canonical → factor.
    /// 2. Exact match.
    /// 3. Substring fallback (e.g. "Le Monde - International" → "le monde"),
    ///    longest key first so overlapping names resolve the same way every run.
    /// 4. Default.
    pub fn factor_for(&self, source: &str) -> f64 {
        let s = normalize(source);

        if let Some(canon) = self.aliases.get(&s) {
            let c = normalize(canon);
            if let Some(&w) = self.weights.get(&c) {
                return clamp_factor(w);
            }
        }

        if let Some(&w) = self.weights.get(&s) {
            return clamp_factor(w);
        }

        let mut keys: Vec<&String> = self.weights.keys().filter(|k| s.contains(k.as_str())).collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        if let Some(k) = keys.first() {
            return clamp_factor(self.weights[*k]);
        }

        clamp_factor(self.default_factor)
    }

    /// Built-in seed with common French and international outlets.
    pub(crate) fn default_seed() -> Self {
        let mut weights = HashMap::new();
        let mut aliases = HashMap::new();

        for (k, v) in [
            ("afp", 1.15),
            ("reuters", 1.15),
            ("le monde", 1.10),
            ("les echos", 1.10),
            ("le figaro", 1.05),
            ("liberation", 1.05),
            ("franceinfo", 1.05),
            ("france 24", 1.05),
            ("rfi", 1.05),
            ("nouvel obs", 1.00),
        ] {
            weights.insert(k.to_string(), v);
        }

        for (a, c) in [
            ("agence france presse", "afp"),
            ("lemonde fr", "le monde"),
            ("lesechos fr", "les echos"),
            ("lefigaro fr", "le figaro"),
            ("libération", "liberation"),
            ("france info", "franceinfo"),
            ("francetvinfo", "franceinfo"),
            ("france24", "france 24"),
            ("radio france internationale", "rfi"),
            ("l'obs", "nouvel obs"),
            ("nouvelobs", "nouvel obs"),
        ] {
            aliases.insert(a.to_string(), c.to_string());
        }

        Self {
            default_factor: 1.0,
            weights,
            aliases,
        }
    }
}

/// Lowercase, replace punctuation/dashes with spaces, collapse whitespace.
fn normalize(s: &str) -> String {
    let mut out = s.trim().to_lowercase();

    for ch in ['—', '–', '-', '_', '/', '\\'] {
        out = out.replace(ch, " ");
    }

    out = out.replace(['\n', '\r', '\t', '.', ',', '‚'], " ");

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clamp_factor(x: f64) -> f64 {
    if !x.is_finite() {
        return MIN_FACTOR;
    }
    x.clamp(MIN_FACTOR, MAX_FACTOR)
}
