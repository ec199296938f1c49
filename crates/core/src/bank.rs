use crate::model::{Question, QuestionId, RawQuestionRecord};

//
// ─── QUESTION BANK ─────────────────────────────────────────────────────────────
//

/// The immutable, canonical question bank, loaded once at startup.
///
/// Bank order matches the order of the raw source; that order is what keeps
/// position-derived ids stable across sessions. Records that cannot be asked
/// at all (no options) are dropped; everything else is repaired by
/// defaulting, never rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Normalize raw source records into the canonical bank.
    #[must_use]
    pub fn load(records: &[RawQuestionRecord]) -> Self {
        let questions = records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| Question::from_raw(record, index as u64 + 1))
            .collect();
        Self { questions }
    }

    /// All questions in canonical order.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Look up a question by id.
    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Distinct domain names, in first-seen bank order.
    #[must_use]
    pub fn domains(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for question in &self.questions {
            if !seen.contains(&question.domain.as_str()) {
                seen.push(question.domain.as_str());
            }
        }
        seen
    }

    /// Questions belonging to one canonical domain, in bank order.
    pub fn in_domain<'a>(&'a self, domain: &'a str) -> impl Iterator<Item = &'a Question> {
        self.questions.iter().filter(move |q| q.domain == domain)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
