use chrono::{DateTime, Duration, Utc};
use std::fmt;

use prep_core::model::{AnswerSheet, ProgressState, Question, SessionMode, SessionRecord};

use crate::error::SessionError;

/// Minutes allotted for a full-length 150-question exam.
const FULL_EXAM_MINUTES: f64 = 240.0;
const FULL_EXAM_QUESTIONS: f64 = 150.0;

//
// ─── ACTIVE SESSION ────────────────────────────────────────────────────────────
//

/// One in-flight session: the ordered question set, the user's answers so
/// far, and a cursor.
///
/// This is the explicit replacement for what the surrounding UI would keep
/// as view state; the core owns no hidden globals. Submission is idempotent:
/// whichever of a manual submit and a timer-expiry submit arrives first
/// produces the one and only `SessionRecord`.
pub struct ActiveSession {
    mode: SessionMode,
    questions: Vec<Question>,
    current: usize,
    answers: AnswerSheet,
    started_at: DateTime<Utc>,
    deadline: Option<DateTime<Utc>>,
    submitted: bool,
}

impl ActiveSession {
    /// Create a session over an already-selected question set.
    ///
    /// `started_at` should come from the services layer clock to keep time
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new(
        mode: SessionMode,
        questions: Vec<Question>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        Ok(Self {
            mode,
            questions,
            current: 0,
            answers: AnswerSheet::new(),
            started_at,
            deadline: None,
            submitted: false,
        })
    }

    /// Attach the exam countdown deadline, scaled to the question count.
    #[must_use]
    pub fn with_exam_deadline(mut self) -> Self {
        self.deadline = Some(self.started_at + Self::exam_duration(self.questions.len()));
        self
    }

    /// Time allotted for an exam of the given size: a 150-question exam gets
    /// 240 minutes and smaller exams scale proportionally.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn exam_duration(question_count: usize) -> Duration {
        let minutes = (question_count as f64 / FULL_EXAM_QUESTIONS * FULL_EXAM_MINUTES).round();
        Duration::minutes(minutes as i64)
    }

    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.answered_count()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Whether the exam countdown has run out. Sessions without a deadline
    /// never expire.
    #[must_use]
    pub fn time_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Remaining exam time, clamped at zero.
    #[must_use]
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.deadline
            .map(|deadline| (deadline - now).max(Duration::zero()))
    }

    /// Move the cursor to the next question; false when already at the end.
    pub fn advance(&mut self) -> bool {
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            true
        } else {
            false
        }
    }

    /// Move the cursor to the previous question; false at the beginning.
    pub fn retreat(&mut self) -> bool {
        if self.current > 0 {
            self.current -= 1;
            true
        } else {
            false
        }
    }

    /// Record an answer for the current question.
    ///
    /// The sheet keeps the latest choice for scoring. In practice-family
    /// modes the question-level statistics update immediately, once per
    /// answer event — changing an answer later counts as another attempt,
    /// and a miss permanently marks the question as incorrectly answered.
    /// Exam and assessment modes touch no statistics until submission.
    ///
    /// Returns whether the choice was correct.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` after submission, and
    /// `SessionError::Empty` if the cursor is somehow out of range.
    pub fn select_answer(
        &mut self,
        progress: &mut ProgressState,
        option_index: usize,
    ) -> Result<bool, SessionError> {
        if self.submitted {
            return Err(SessionError::AlreadySubmitted);
        }
        let Some(question) = self.questions.get(self.current) else {
            return Err(SessionError::Empty);
        };

        self.answers.select(question.id, option_index);

        if self.mode.is_practice() {
            Ok(progress.record_answer(question, option_index))
        } else {
            Ok(question.is_correct(option_index))
        }
    }

    /// Submit the session: build its record, append it to the progress
    /// history (newest first), and fold the breakdown into the lifetime
    /// counters.
    ///
    /// Only the first submission produces a record; any later call — e.g. a
    /// countdown firing right after a manual submit — is rejected without
    /// touching the progress state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` on any call after the first.
    pub fn submit(
        &mut self,
        progress: &mut ProgressState,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord, SessionError> {
        if self.submitted {
            return Err(SessionError::AlreadySubmitted);
        }

        let record = SessionRecord::build(
            self.mode,
            &self.questions,
            &self.answers,
            self.started_at,
            now,
        );
        progress.record_session(record.clone());
        self.submitted = true;
        Ok(record)
    }
}

impl fmt::Debug for ActiveSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSession")
            .field("mode", &self.mode)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answered", &self.answers.answered_count())
            .field("started_at", &self.started_at)
            .field("deadline", &self.deadline)
            .field("submitted", &self.submitted)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::RawQuestionRecord;
    use prep_core::time::fixed_now;

    fn question(id: u64, domain: &str) -> Question {
        let record = RawQuestionRecord {
            id: Some(id),
            question: format!("Q{id}"),
            option_a: Some("a".into()),
            option_b: Some("b".into()),
            correct_answer: Some("A".into()),
            domain: Some(domain.to_owned()),
            ..RawQuestionRecord::default()
        };
        Question::from_raw(&record, id).unwrap()
    }

    fn two_question_session(mode: SessionMode) -> ActiveSession {
        ActiveSession::new(
            mode,
            vec![question(1, "Alpha"), question(2, "Beta")],
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn empty_session_returns_error() {
        let err = ActiveSession::new(SessionMode::Practice, Vec::new(), fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::Empty));
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut session = two_question_session(SessionMode::Practice);
        assert!(!session.retreat());
        assert!(session.advance());
        assert!(!session.advance());
        assert_eq!(session.current_index(), 1);
        assert!(session.retreat());
        assert_eq!(session.current_question().unwrap().id.value(), 1);
    }

    #[test]
    fn practice_answers_feed_question_stats_immediately() {
        let mut session = two_question_session(SessionMode::Practice);
        let mut progress = ProgressState::new();

        assert!(session.select_answer(&mut progress, 0).unwrap());
        session.advance();
        assert!(!session.select_answer(&mut progress, 1).unwrap());

        assert_eq!(progress.question_performance.len(), 2);
        assert!(progress.incorrect.contains(&session.questions()[1].id));
    }

    #[test]
    fn exam_answers_touch_no_stats_until_submit() {
        let mut session = two_question_session(SessionMode::Exam);
        let mut progress = ProgressState::new();

        session.select_answer(&mut progress, 1).unwrap();
        assert!(progress.question_performance.is_empty());
        assert!(progress.incorrect.is_empty());
        assert!(progress.session_history.is_empty());
    }

    #[test]
    fn changed_answer_counts_another_attempt_and_scores_last_choice() {
        let mut session = two_question_session(SessionMode::Practice);
        let mut progress = ProgressState::new();

        session.select_answer(&mut progress, 1).unwrap(); // wrong
        session.select_answer(&mut progress, 0).unwrap(); // corrected

        let stats = progress.question_performance[&session.questions()[0].id];
        assert_eq!(stats.total_count, 2);
        assert_eq!(stats.correct_count, 1);
        assert!(progress.incorrect.contains(&session.questions()[0].id));

        let record = session
            .submit(&mut progress, fixed_now() + Duration::minutes(5))
            .unwrap();
        // scoring uses the final choice
        assert_eq!(record.correct_answers, 1);
    }

    #[test]
    fn second_submit_is_rejected_and_history_has_one_record() {
        let mut session = two_question_session(SessionMode::Exam);
        let mut progress = ProgressState::new();
        session.select_answer(&mut progress, 0).unwrap();

        let submitted_at = fixed_now() + Duration::minutes(30);
        let record = session.submit(&mut progress, submitted_at).unwrap();
        assert_eq!(record.mode, SessionMode::Exam);

        // the countdown firing a moment later must not double-record
        let err = session
            .submit(&mut progress, submitted_at + Duration::seconds(1))
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadySubmitted));
        assert_eq!(progress.session_history.len(), 1);

        let err = session.select_answer(&mut progress, 0).unwrap_err();
        assert!(matches!(err, SessionError::AlreadySubmitted));
    }

    #[test]
    fn exam_duration_scales_with_question_count() {
        assert_eq!(ActiveSession::exam_duration(150), Duration::minutes(240));
        assert_eq!(ActiveSession::exam_duration(100), Duration::minutes(160));
        assert_eq!(ActiveSession::exam_duration(50), Duration::minutes(80));
    }

    #[test]
    fn deadline_expiry_is_observable() {
        let session = two_question_session(SessionMode::Exam).with_exam_deadline();
        let deadline = session.deadline().unwrap();

        assert!(!session.time_expired(deadline - Duration::seconds(1)));
        assert!(session.time_expired(deadline));
        assert_eq!(
            session.time_remaining(deadline + Duration::minutes(1)),
            Some(Duration::zero())
        );
    }
}
