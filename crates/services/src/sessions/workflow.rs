use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use prep_core::bank::QuestionBank;
use prep_core::model::{ProgressState, QuestionId, SessionId, SessionMode, SessionRecord, UserHandle};
use prep_core::planner::{StudyPlanDay, StudyPlanner};
use prep_core::Clock;
use storage::autosave::DebouncedSaver;
use storage::document::ProgressDocument;
use storage::repository::ProgressRepository;

use crate::error::SessionError;
use super::selection::{DomainFilter, SelectionEngine};
use super::service::ActiveSession;

/// An exam or assessment session together with how far short of the
/// requested size the bank left it.
#[derive(Debug)]
pub struct StartedExam {
    pub session: ActiveSession,
    /// Zero when the bank could fill the request; otherwise the caller
    /// should warn before running the smaller session.
    pub shortfall: usize,
}

//
// ─── WORKFLOW ──────────────────────────────────────────────────────────────────
//

/// Orchestrates one user's sessions against the question bank and the
/// progress store.
///
/// Selection, scoring, and planning stay pure and synchronous; the only
/// asynchronous edge is persistence, which is debounced and fire-and-forget.
/// Every mutation queues a fresh document snapshot, so a failed write can
/// never lose in-memory results.
pub struct SessionWorkflow {
    clock: Clock,
    bank: Arc<QuestionBank>,
    repository: Arc<dyn ProgressRepository>,
    user: UserHandle,
    saver: DebouncedSaver,
}

impl SessionWorkflow {
    /// Create the workflow with the default save window.
    #[must_use]
    pub fn new(
        clock: Clock,
        bank: Arc<QuestionBank>,
        repository: Arc<dyn ProgressRepository>,
        user: UserHandle,
    ) -> Self {
        let saver = DebouncedSaver::new(repository.clone(), user.id.clone());
        Self {
            clock,
            bank,
            repository,
            user,
            saver,
        }
    }

    /// Create the workflow with a custom autosave quiet window (tests).
    #[must_use]
    pub fn with_save_window(
        clock: Clock,
        bank: Arc<QuestionBank>,
        repository: Arc<dyn ProgressRepository>,
        user: UserHandle,
        window: Duration,
    ) -> Self {
        let saver = DebouncedSaver::with_window(repository.clone(), user.id.clone(), window);
        Self {
            clock,
            bank,
            repository,
            user,
            saver,
        }
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn user(&self) -> &UserHandle {
        &self.user
    }

    /// Load the user's progress, creating the first-login document when none
    /// exists.
    ///
    /// Never fails: a broken store costs persistence, not the session. On a
    /// load error the user continues on fresh defaults and the failure is
    /// logged as a warning.
    pub async fn load_progress(&self) -> ProgressState {
        match self.repository.load(&self.user.id).await {
            Ok(Some(document)) => document.into_state(),
            Ok(None) => {
                let state = ProgressState::new();
                let document = ProgressDocument::from_state(&state)
                    .with_email(self.user.email.clone())
                    .with_created_at(self.clock.now());
                if let Err(error) = self.repository.save(&self.user.id, &document, false).await {
                    warn!(user = %self.user.id, %error, "could not create progress document");
                }
                state
            }
            Err(error) => {
                warn!(user = %self.user.id, %error, "could not load progress; starting fresh");
                ProgressState::new()
            }
        }
    }

    /// Start a practice session: random draw, or adaptive ranking against
    /// the user's recorded performance.
    ///
    /// # Errors
    ///
    /// `SessionError::Selection` when the filter matches no questions.
    pub fn start_practice(
        &self,
        progress: &ProgressState,
        filter: &DomainFilter,
        count: usize,
        adaptive: bool,
    ) -> Result<ActiveSession, SessionError> {
        let questions = if adaptive {
            SelectionEngine::adaptive_practice(&self.bank, progress, filter, count)?
        } else {
            SelectionEngine::random_practice(&self.bank, filter, count)?
        };
        ActiveSession::new(SessionMode::Practice, questions, self.clock.now())
    }

    /// Re-practice every question the user has ever missed.
    ///
    /// # Errors
    ///
    /// `SessionError::Empty` when nothing was ever answered incorrectly.
    pub fn start_incorrect_review(
        &self,
        progress: &ProgressState,
    ) -> Result<ActiveSession, SessionError> {
        let questions = progress
            .incorrect_pool(self.bank.questions())
            .into_iter()
            .cloned()
            .collect();
        ActiveSession::new(SessionMode::PracticeIncorrect, questions, self.clock.now())
    }

    /// Re-practice the user's bookmarked questions.
    ///
    /// # Errors
    ///
    /// `SessionError::Empty` when nothing is bookmarked.
    pub fn start_bookmarked_review(
        &self,
        progress: &ProgressState,
    ) -> Result<ActiveSession, SessionError> {
        let questions = progress
            .bookmarked_pool(self.bank.questions())
            .into_iter()
            .cloned()
            .collect();
        ActiveSession::new(SessionMode::PracticeBookmarked, questions, self.clock.now())
    }

    /// Start a timed exam composed per the domain blueprint.
    ///
    /// # Errors
    ///
    /// `SessionError::Selection` when the bank is empty.
    pub fn start_exam(&self, count: usize) -> Result<StartedExam, SessionError> {
        let draft = SelectionEngine::compose_weighted(&self.bank, count)?;
        let shortfall = draft.shortfall();
        let session = ActiveSession::new(SessionMode::Exam, draft.questions, self.clock.now())?
            .with_exam_deadline();
        Ok(StartedExam { session, shortfall })
    }

    /// Start an untimed assessment composed per the domain blueprint.
    ///
    /// # Errors
    ///
    /// `SessionError::Selection` when the bank is empty.
    pub fn start_assessment(&self, count: usize) -> Result<StartedExam, SessionError> {
        let draft = SelectionEngine::compose_weighted(&self.bank, count)?;
        let shortfall = draft.shortfall();
        let session = ActiveSession::new(SessionMode::Assessment, draft.questions, self.clock.now())?;
        Ok(StartedExam { session, shortfall })
    }

    /// Record an answer for the session's current question and, in practice
    /// modes, persist the updated statistics.
    ///
    /// Returns whether the choice was correct.
    ///
    /// # Errors
    ///
    /// Propagates `SessionError::AlreadySubmitted` after submission.
    pub fn record_answer(
        &self,
        session: &mut ActiveSession,
        progress: &mut ProgressState,
        option_index: usize,
    ) -> Result<bool, SessionError> {
        let correct = session.select_answer(progress, option_index)?;
        if session.mode().is_practice() {
            self.queue_save(progress);
        }
        Ok(correct)
    }

    /// Submit the session and persist the updated progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` on any call after the first.
    pub fn submit(
        &self,
        session: &mut ActiveSession,
        progress: &mut ProgressState,
    ) -> Result<SessionRecord, SessionError> {
        let record = session.submit(progress, self.clock.now())?;
        self.queue_save(progress);
        Ok(record)
    }

    /// The exam-countdown submission path: submits only when the deadline
    /// has passed and the session is still open.
    ///
    /// Safe against racing a manual submit — when the session was already
    /// submitted this is a no-op returning `None`, so at most one record is
    /// ever produced.
    pub fn submit_if_expired(
        &self,
        session: &mut ActiveSession,
        progress: &mut ProgressState,
    ) -> Option<SessionRecord> {
        if session.is_submitted() || !session.time_expired(self.clock.now()) {
            return None;
        }
        match session.submit(progress, self.clock.now()) {
            Ok(record) => {
                self.queue_save(progress);
                Some(record)
            }
            Err(_) => None,
        }
    }

    /// Toggle a bookmark and persist; returns the new bookmark state.
    pub fn toggle_bookmark(&self, progress: &mut ProgressState, question: QuestionId) -> bool {
        let bookmarked = progress.toggle_bookmark(question);
        self.queue_save(progress);
        bookmarked
    }

    /// Set or clear the target exam date and persist.
    pub fn set_exam_date(&self, progress: &mut ProgressState, date: Option<NaiveDate>) {
        progress.exam_date = date;
        self.queue_save(progress);
    }

    /// Flip the stored display preference and persist.
    pub fn set_dark_mode(&self, progress: &mut ProgressState, dark: bool) {
        progress.dark_mode = dark;
        self.queue_save(progress);
    }

    /// Generate the study plan from the latest assessment and the stored
    /// exam date, store it on the progress state, and persist.
    ///
    /// # Errors
    ///
    /// Propagates `PlanError` when prerequisites are missing or the date is
    /// not in the future.
    pub fn generate_study_plan<'a>(
        &self,
        progress: &'a mut ProgressState,
    ) -> Result<&'a [StudyPlanDay], SessionError> {
        let plan = StudyPlanner::generate(
            progress.latest_assessment(),
            progress.exam_date,
            self.clock.today(),
            self.bank.len(),
        )?;
        progress.study_plan = plan;
        self.queue_save(progress);
        Ok(&progress.study_plan)
    }

    /// Delete one session record by id and persist; the lifetime performance
    /// counters stay as they are. Returns whether a record was removed.
    pub fn delete_session(&self, progress: &mut ProgressState, id: SessionId) -> bool {
        let removed = progress.delete_session(id);
        if removed {
            self.queue_save(progress);
        }
        removed
    }

    /// Persist the progress immediately, bypassing the debounce window.
    ///
    /// For the few moments where waiting out the quiet window is wrong,
    /// e.g. right before logout. Unlike the debounced path this surfaces
    /// the failure, though even then the in-memory state stays intact.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the write fails.
    pub async fn save_now(&self, progress: &ProgressState) -> Result<(), SessionError> {
        let document =
            ProgressDocument::from_state(progress).with_last_updated(self.clock.now());
        self.repository
            .save(&self.user.id, &document, true)
            .await?;
        Ok(())
    }

    /// Stop accepting mutations and wait for the final pending write.
    pub async fn flush(self) {
        self.saver.flush().await;
    }

    fn queue_save(&self, progress: &ProgressState) {
        let document =
            ProgressDocument::from_state(progress).with_last_updated(self.clock.now());
        self.saver.queue(document);
    }
}
