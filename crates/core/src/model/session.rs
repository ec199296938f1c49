use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ids::{QuestionId, SessionId};
use crate::model::question::Question;
use crate::model::stats::DomainStats;

//
// ─── SESSION MODE ──────────────────────────────────────────────────────────────
//

/// The kind of session a question set was assembled for.
///
/// The serialized forms (`practice`, `practice-incorrect`, ...) are the
/// values stored in the progress document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionMode {
    Practice,
    PracticeIncorrect,
    PracticeBookmarked,
    Exam,
    Assessment,
}

impl SessionMode {
    /// Practice-family modes reveal explanations immediately and feed
    /// question-level statistics on every answer event.
    #[must_use]
    pub fn is_practice(self) -> bool {
        matches!(
            self,
            SessionMode::Practice
                | SessionMode::PracticeIncorrect
                | SessionMode::PracticeBookmarked
        )
    }
}

//
// ─── ANSWER SHEET ──────────────────────────────────────────────────────────────
//

/// The answers a user has picked so far, keyed by question id.
///
/// Re-selecting overwrites the stored choice; only the latest choice counts
/// at scoring time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    choices: BTreeMap<QuestionId, usize>,
}

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the choice for a question.
    pub fn select(&mut self, question: QuestionId, option_index: usize) {
        self.choices.insert(question, option_index);
    }

    /// The stored choice for a question, if any.
    #[must_use]
    pub fn choice(&self, question: QuestionId) -> Option<usize> {
        self.choices.get(&question).copied()
    }

    /// Number of questions answered so far.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.choices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, usize)> + '_ {
        self.choices.iter().map(|(id, idx)| (*id, *idx))
    }

    /// Copy the sheet into the map shape stored on a session record.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<QuestionId, usize> {
        self.choices.clone()
    }
}

//
// ─── SCORE ─────────────────────────────────────────────────────────────────────
//

/// Result of grading one question set against an answer sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct: u32,
    pub total: u32,
    pub percentage: u8,
}

impl Score {
    /// Grade a question set: strict index equality, unanswered counts as
    /// incorrect, and an empty set scores 0% rather than dividing by zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn compute(questions: &[Question], answers: &AnswerSheet) -> Self {
        let total = questions.len() as u32;
        let correct = questions
            .iter()
            .filter(|q| answers.choice(q.id) == Some(q.correct_index))
            .count() as u32;
        let percentage = if total == 0 {
            0
        } else {
            ((f64::from(correct) / f64::from(total)) * 100.0).round() as u8
        };

        Self {
            correct,
            total,
            percentage,
        }
    }
}

//
// ─── SESSION RECORD ────────────────────────────────────────────────────────────
//

/// Immutable summary of a completed session.
///
/// `question_ids` preserves the exact presentation order so the session can
/// be replayed, and `selected_answers` keeps the final choice per question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub id: SessionId,
    pub date: DateTime<Utc>,
    pub mode: SessionMode,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub percentage: u8,
    pub time_spent_minutes: u32,
    pub domain_breakdown: BTreeMap<String, DomainStats>,
    pub question_ids: Vec<QuestionId>,
    pub selected_answers: BTreeMap<QuestionId, usize>,
}

impl SessionRecord {
    /// Build the record for a submitted session.
    ///
    /// Iterates the question set once, filling the per-domain breakdown with
    /// the same strict-equality rule as [`Score::compute`]. The id is derived
    /// from the submission timestamp.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn build(
        mode: SessionMode,
        questions: &[Question],
        answers: &AnswerSheet,
        started_at: DateTime<Utc>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        let score = Score::compute(questions, answers);

        let mut domain_breakdown: BTreeMap<String, DomainStats> = BTreeMap::new();
        for question in questions {
            let correct = answers.choice(question.id) == Some(question.correct_index);
            domain_breakdown
                .entry(question.domain.clone())
                .or_default()
                .record(correct);
        }

        let elapsed_minutes = ((submitted_at - started_at).num_seconds().max(0) as f64 / 60.0)
            .round() as u32;

        Self {
            id: SessionId::from_timestamp(submitted_at),
            date: submitted_at,
            mode,
            total_questions: score.total,
            correct_answers: score.correct,
            percentage: score.percentage,
            time_spent_minutes: elapsed_minutes,
            domain_breakdown,
            question_ids: questions.iter().map(|q| q.id).collect(),
            selected_answers: answers.to_map(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
