// src/enrichment/validate.rs
//! Validators for model replies. Each returns the typed payload or a short reason
//! that is fed back to the model in the corrective prompt.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::candidate::Explanation;

pub const MAX_TITLE_CHARS: usize = 70;
pub const SUMMARY_WORDS: std::ops::RangeInclusive<usize> = 28..=42;
pub const CEFR_LEVELS: [&str; 6] = ["A1", "A2", "B1", "B2", "C1", "C2"];
pub const TONES: [&str; 4] = ["neutral", "opinion", "satire", "other"];

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TitlesPayload {
    pub simplified_french_title: String,
    pub simplified_english_title: String,
    pub french_summary: String,
    pub english_summary: String,
    pub difficulty: String,
    pub tone: String,
}

/// First JSON object or array embedded in `text` (models like to wrap it in prose or fences).
pub fn extract_first_json(text: &str) -> Option<Value> {
    text.char_indices()
        .filter(|(_, c)| *c == '{' || *c == '[')
        .find_map(|(idx, _)| {
            serde_json::Deserializer::from_str(&text[idx..])
                .into_iter::<Value>()
                .next()
                .and_then(Result::ok)
        })
}

pub fn validate_titles(reply: &str) -> Result<TitlesPayload, String> {
    let value = extract_first_json(reply).ok_or("no JSON found")?;
    let payload: TitlesPayload =
        serde_json::from_value(value).map_err(|e| format!("missing or mistyped keys: {e}"))?;

    if payload.simplified_french_title.chars().count() > MAX_TITLE_CHARS
        || payload.simplified_english_title.chars().count() > MAX_TITLE_CHARS
    {
        return Err(format!("titles must be at most {MAX_TITLE_CHARS} characters"));
    }
    if payload.simplified_french_title.trim().is_empty() {
        return Err("simplified_french_title is empty".into());
    }
    for (field, text) in [
        ("french_summary", &payload.french_summary),
        ("english_summary", &payload.english_summary),
    ] {
        let words = text.split_whitespace().count();
        if !SUMMARY_WORDS.contains(&words) {
            return Err(format!(
                "{field} has {words} words, expected {}-{}",
                SUMMARY_WORDS.start(),
                SUMMARY_WORDS.end()
            ));
        }
    }
    if !CEFR_LEVELS.contains(&payload.difficulty.as_str()) {
        return Err(format!("invalid difficulty {:?}", payload.difficulty));
    }
    if !TONES.contains(&payload.tone.as_str()) {
        return Err(format!("invalid tone {:?}", payload.tone));
    }
    Ok(payload)
}

#[derive(Deserialize)]
struct KeyedExplanation {
    display_format: String,
    explanation: String,
    #[serde(default)]
    cultural_note: Option<String>,
}

/// Accepts a list of explanation objects or a map keyed by the original word.
pub fn validate_explanations(reply: &str) -> Result<Vec<Explanation>, String> {
    let value = extract_first_json(reply).ok_or("no JSON found")?;
    let items = match value {
        Value::Array(_) => serde_json::from_value::<Vec<Explanation>>(value)
            .map_err(|e| format!("invalid explanation item: {e}"))?,
        Value::Object(_) => serde_json::from_value::<BTreeMap<String, KeyedExplanation>>(value)
            .map_err(|e| format!("invalid explanation entry: {e}"))?
            .into_iter()
            .map(|(word, v)| Explanation {
                original_word: word,
                display_format: v.display_format,
                explanation: v.explanation,
                cultural_note: v.cultural_note,
            })
            .collect(),
        _ => return Err("expected a JSON list or object".into()),
    };
    if items.is_empty() {
        return Err("no explanations".into());
    }
    if items.iter().any(|e| e.original_word.trim().is_empty()) {
        return Err("explanation with empty original_word".into());
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["mot"; n].join(" ")
    }

    fn titles_json(fr_title: &str, summary_words: usize, difficulty: &str) -> String {
        serde_json::json!({
            "simplified_french_title": fr_title,
            "simplified_english_title": "Heat wave in Paris",
            "french_summary": words(summary_words),
            "english_summary": words(30),
            "difficulty": difficulty,
            "tone": "neutral",
        })
        .to_string()
    }

    #[test]
    fn finds_json_inside_fences_and_prose() {
        let reply = "Sure! Here it is:\n```json\n{\"a\": {\"b\": [1, 2]}}\n```\nAnything else?";
        assert_eq!(
            extract_first_json(reply),
            Some(serde_json::json!({"a": {"b": [1, 2]}}))
        );
        assert_eq!(extract_first_json("no json here"), None);
        // a stray bracket before the real payload is skipped
        assert_eq!(
            extract_first_json("[note] {\"x\": 1}"),
            Some(serde_json::json!({"x": 1}))
        );
    }

    #[test]
    fn valid_titles_payload() {
        let p = validate_titles(&titles_json("Canicule à Paris", 30, "B1")).unwrap();
        assert_eq!(p.simplified_french_title, "Canicule à Paris");
        assert_eq!(p.difficulty, "B1");
    }

    #[test]
    fn titles_rules() {
        assert!(validate_titles(&titles_json(&"x".repeat(71), 30, "B1"))
            .unwrap_err()
            .contains("70"));
        assert!(validate_titles(&titles_json("ok", 27, "B1"))
            .unwrap_err()
            .contains("french_summary"));
        assert!(validate_titles(&titles_json("ok", 43, "B1")).is_err());
        assert!(validate_titles(&titles_json("ok", 30, "D4"))
            .unwrap_err()
            .contains("difficulty"));
        assert!(validate_titles(r#"{"simplified_french_title": "x"}"#)
            .unwrap_err()
            .contains("missing"));
        assert_eq!(validate_titles("nothing").unwrap_err(), "no JSON found");
    }

    #[test]
    fn explanations_list_and_map_forms() {
        let list = r#"[{"original_word": "canicule", "display_format": "canicule (f.)",
                       "explanation": "heat wave"}]"#;
        let got = validate_explanations(list).unwrap();
        assert_eq!(got[0].original_word, "canicule");
        assert_eq!(got[0].cultural_note, None);

        let map = r#"{"grève": {"display_format": "grève (f.)", "explanation": "strike",
                                 "cultural_note": "frequent in transport"}}"#;
        let got = validate_explanations(map).unwrap();
        assert_eq!(got[0].original_word, "grève");
        assert_eq!(got[0].cultural_note.as_deref(), Some("frequent in transport"));
    }

    #[test]
    fn explanations_reject_bad_shapes() {
        assert!(validate_explanations("[]").is_err());
        assert!(validate_explanations(r#"[{"original_word": "x"}]"#).is_err());
        assert!(validate_explanations(r#"{"x": "not an object"}"#).is_err());
        assert!(validate_explanations(r#"[1, 2]"#).is_err());
    }
}
