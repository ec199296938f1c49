use serde::Deserialize;

use crate::model::ids::QuestionId;

//
// ─── RAW RECORDS ───────────────────────────────────────────────────────────────
//

/// Difficulty as it appears in the raw source: sometimes a number, sometimes
/// a string like `"4"` or `"hard"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDifficulty {
    Number(i64),
    Text(String),
}

impl RawDifficulty {
    fn as_i64(&self) -> Option<i64> {
        match self {
            RawDifficulty::Number(n) => Some(*n),
            RawDifficulty::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// One record of the static question source, exactly as shipped.
///
/// Every field besides the question text is optional in practice; loading
/// never fails and instead falls back to documented defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuestionRecord {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(rename = "Question", default)]
    pub question: String,
    #[serde(rename = "OptionA", default)]
    pub option_a: Option<String>,
    #[serde(rename = "OptionB", default)]
    pub option_b: Option<String>,
    #[serde(rename = "OptionC", default)]
    pub option_c: Option<String>,
    #[serde(rename = "OptionD", default)]
    pub option_d: Option<String>,
    #[serde(rename = "CorrectAnswer", default)]
    pub correct_answer: Option<String>,
    #[serde(rename = "Domain", default)]
    pub domain: Option<String>,
    #[serde(rename = "Explanation", default)]
    pub explanation: Option<String>,
    #[serde(rename = "Difficulty", default)]
    pub difficulty: Option<RawDifficulty>,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

pub(crate) const DEFAULT_DIFFICULTY: u8 = 3;
pub(crate) const DEFAULT_DOMAIN: &str = "General";
pub(crate) const DEFAULT_EXPLANATION: &str = "No explanation provided.";

/// Canonical multiple-choice question, immutable after load.
///
/// Invariant: `correct_index` always addresses a present option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub domain: String,
    pub explanation: String,
    pub difficulty: u8,
}

impl Question {
    /// Normalize a raw record into a canonical question.
    ///
    /// `position` is the record's 1-based position in the source, used as the
    /// id when the record carries none. Defaulting is the failure policy:
    /// a missing or invalid answer letter maps to the first option, an
    /// unusable difficulty becomes 3, and domain/explanation fall back to
    /// their placeholders. Returns `None` only when every option field is
    /// empty, since such a record cannot be asked at all.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_raw(raw: &RawQuestionRecord, position: u64) -> Option<Self> {
        let options: Vec<String> = [
            raw.option_a.as_deref(),
            raw.option_b.as_deref(),
            raw.option_c.as_deref(),
            raw.option_d.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_owned)
        .collect();

        if options.is_empty() {
            return None;
        }

        let mut correct_index = raw
            .correct_answer
            .as_deref()
            .and_then(answer_letter_index)
            .unwrap_or(0);
        if correct_index >= options.len() {
            correct_index = 0;
        }

        let domain = raw
            .domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map_or_else(|| DEFAULT_DOMAIN.to_owned(), title_case);

        let explanation = raw
            .explanation
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map_or_else(|| DEFAULT_EXPLANATION.to_owned(), str::to_owned);

        let difficulty = raw
            .difficulty
            .as_ref()
            .and_then(RawDifficulty::as_i64)
            .filter(|d| (1..=5).contains(d))
            .map_or(DEFAULT_DIFFICULTY, |d| d as u8);

        Some(Self {
            id: QuestionId::new(raw.id.unwrap_or(position)),
            text: raw.question.trim().to_owned(),
            options,
            correct_index,
            domain,
            explanation,
            difficulty,
        })
    }

    /// Whether the given option index is the stored correct answer.
    #[must_use]
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_index
    }

    /// Number of answer options.
    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }
}

/// Map an answer-key letter (A-D, any case, surrounding whitespace ok) to an
/// option index.
fn answer_letter_index(letter: &str) -> Option<usize> {
    match letter.trim().to_ascii_uppercase().as_str() {
        "A" => Some(0),
        "B" => Some(1),
        "C" => Some(2),
        "D" => Some(3),
        _ => None,
    }
}

/// Lowercase, then capitalize the first letter of every whitespace-separated
/// word. This is the canonical casing for domain names.
pub(crate) fn title_case(raw: &str) -> String {
    raw.to_lowercase()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(question: &str) -> RawQuestionRecord {
        RawQuestionRecord {
            question: question.to_owned(),
            option_a: Some("first".into()),
            option_b: Some("second".into()),
            ..RawQuestionRecord::default()
        }
    }

    #[test]
    fn empty_options_are_dropped_in_letter_order() {
        let mut record = raw("q");
        record.option_c = Some("  ".into());
        record.option_d = Some("fourth".into());

        let q = Question::from_raw(&record, 1).unwrap();
        assert_eq!(q.options, vec!["first", "second", "fourth"]);
    }

    #[test]
    fn missing_answer_letter_defaults_to_first_option() {
        let q = Question::from_raw(&raw("q"), 1).unwrap();
        assert_eq!(q.correct_index, 0);
    }

    #[test]
    fn answer_letter_is_case_insensitive() {
        let mut record = raw("q");
        record.correct_answer = Some(" b ".into());
        let q = Question::from_raw(&record, 1).unwrap();
        assert_eq!(q.correct_index, 1);
        assert!(q.is_correct(1));
    }

    #[test]
    fn answer_letter_beyond_options_falls_back_to_first() {
        let mut record = raw("q");
        record.correct_answer = Some("D".into());
        let q = Question::from_raw(&record, 1).unwrap();
        assert_eq!(q.correct_index, 0);
    }

    #[test]
    fn difficulty_defaults_when_unusable() {
        for bad in [
            Some(RawDifficulty::Number(0)),
            Some(RawDifficulty::Number(9)),
            Some(RawDifficulty::Text("hard".into())),
            None,
        ] {
            let mut record = raw("q");
            record.difficulty = bad;
            let q = Question::from_raw(&record, 1).unwrap();
            assert_eq!(q.difficulty, 3);
        }

        let mut record = raw("q");
        record.difficulty = Some(RawDifficulty::Text("4".into()));
        assert_eq!(Question::from_raw(&record, 1).unwrap().difficulty, 4);
    }

    #[test]
    fn domain_is_title_cased() {
        let mut record = raw("q");
        record.domain = Some("pROTECTION of INFORMATION assets".into());
        let q = Question::from_raw(&record, 1).unwrap();
        assert_eq!(q.domain, "Protection Of Information Assets");
    }

    #[test]
    fn missing_domain_and_explanation_use_placeholders() {
        let q = Question::from_raw(&raw("q"), 1).unwrap();
        assert_eq!(q.domain, "General");
        assert_eq!(q.explanation, "No explanation provided.");
    }

    #[test]
    fn position_becomes_id_when_source_has_none() {
        let q = Question::from_raw(&raw("q"), 7).unwrap();
        assert_eq!(q.id, QuestionId::new(7));

        let mut record = raw("q");
        record.id = Some(99);
        assert_eq!(
            Question::from_raw(&record, 7).unwrap().id,
            QuestionId::new(99)
        );
    }

    #[test]
    fn record_without_any_option_is_unusable() {
        let record = RawQuestionRecord {
            question: "q".into(),
            ..RawQuestionRecord::default()
        };
        assert!(Question::from_raw(&record, 1).is_none());
    }
}
