use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use crate::model::ids::{QuestionId, SessionId};
use crate::model::question::Question;
use crate::model::session::{SessionMode, SessionRecord};
use crate::model::stats::{DomainStats, QuestionStats};
use crate::planner::StudyPlanDay;

//
// ─── PROGRESS STATE ────────────────────────────────────────────────────────────
//

/// A user's cumulative progress: the in-memory form of the persisted
/// document, owned by exactly one authenticated user.
///
/// Created with empty defaults on first login. All mutation happens through
/// the methods below; the two invariants they maintain are newest-first
/// ordering of `session_history` and additive-only growth of the performance
/// maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressState {
    /// Completed sessions, most recent first.
    pub session_history: Vec<SessionRecord>,
    /// Lifetime per-domain counters, merged additively on every submission.
    pub domain_performance: BTreeMap<String, DomainStats>,
    /// Lifetime per-question counters, updated on every practice answer event.
    pub question_performance: BTreeMap<QuestionId, QuestionStats>,
    pub bookmarked: BTreeSet<QuestionId>,
    pub incorrect: BTreeSet<QuestionId>,
    pub exam_date: Option<NaiveDate>,
    pub study_plan: Vec<StudyPlanDay>,
    pub dark_mode: bool,
}

impl ProgressState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a submitted session at the front of the history and fold its
    /// domain breakdown into the lifetime counters.
    pub fn record_session(&mut self, record: SessionRecord) {
        for (domain, stats) in &record.domain_breakdown {
            self.domain_performance
                .entry(domain.clone())
                .or_default()
                .merge(stats);
        }
        self.session_history.insert(0, record);
    }

    /// Count a single answer event against the question-level statistics.
    ///
    /// Fires once per event: if the caller permits changing an answer, a
    /// changed answer counts as another attempt. The incorrect set only
    /// grows; answering correctly later does not remove the question from it.
    /// Returns whether the choice was correct.
    pub fn record_answer(&mut self, question: &Question, option_index: usize) -> bool {
        let correct = question.is_correct(option_index);
        self.question_performance
            .entry(question.id)
            .or_default()
            .record(correct);
        if !correct {
            self.incorrect.insert(question.id);
        }
        correct
    }

    /// Toggle a bookmark; returns true when the question is now bookmarked.
    pub fn toggle_bookmark(&mut self, question: QuestionId) -> bool {
        if self.bookmarked.remove(&question) {
            false
        } else {
            self.bookmarked.insert(question);
            true
        }
    }

    /// Remove the session with the given id from the history.
    ///
    /// The lifetime performance maps are deliberately not decremented; a
    /// deleted session disappears from the history but its attempts remain
    /// counted. Returns whether a record was removed.
    pub fn delete_session(&mut self, id: SessionId) -> bool {
        match self.session_history.iter().position(|s| s.id == id) {
            Some(index) => {
                self.session_history.remove(index);
                true
            }
            None => false,
        }
    }

    /// The most recently submitted assessment, if any.
    #[must_use]
    pub fn latest_assessment(&self) -> Option<&SessionRecord> {
        self.session_history
            .iter()
            .find(|s| s.mode == SessionMode::Assessment)
    }

    /// Ids the user answered incorrectly at least once, in the order they
    /// appear in the given bank slice.
    #[must_use]
    pub fn incorrect_pool<'a>(&self, questions: &'a [Question]) -> Vec<&'a Question> {
        questions
            .iter()
            .filter(|q| self.incorrect.contains(&q.id))
            .collect()
    }

    /// Bookmarked questions, in the order they appear in the given bank slice.
    #[must_use]
    pub fn bookmarked_pool<'a>(&self, questions: &'a [Question]) -> Vec<&'a Question> {
        questions
            .iter()
            .filter(|q| self.bookmarked.contains(&q.id))
            .collect()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
