use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use prep_core::model::{
    DomainStats, ProgressState, QuestionId, QuestionStats, SessionId, SessionMode, SessionRecord,
};
use prep_core::planner::StudyPlanDay;

//
// ─── DOCUMENT SHAPES ───────────────────────────────────────────────────────────
//

/// Persisted shape of one completed session inside the progress document.
///
/// This mirrors the domain `SessionRecord` so repositories can
/// serialize/deserialize without leaking storage concerns into the domain
/// layer. Map keys become strings and ids become plain integers, which is
/// what a JSON-shaped document store can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecordDoc {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub mode: SessionMode,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub percentage: u8,
    pub time_spent: u32,
    #[serde(default)]
    pub domain_breakdown: BTreeMap<String, DomainStats>,
    #[serde(default)]
    pub question_ids: Vec<u64>,
    #[serde(default)]
    pub selected_answers: BTreeMap<String, usize>,
}

impl SessionRecordDoc {
    #[must_use]
    pub fn from_record(record: &SessionRecord) -> Self {
        Self {
            id: record.id.value(),
            date: record.date,
            mode: record.mode,
            total_questions: record.total_questions,
            correct_answers: record.correct_answers,
            percentage: record.percentage,
            time_spent: record.time_spent_minutes,
            domain_breakdown: record.domain_breakdown.clone(),
            question_ids: record.question_ids.iter().map(|id| id.value()).collect(),
            selected_answers: record
                .selected_answers
                .iter()
                .map(|(id, idx)| (id.to_string(), *idx))
                .collect(),
        }
    }

    /// Convert the document shape back into a domain `SessionRecord`.
    ///
    /// Loading is tolerant: answer entries whose key is not a numeric
    /// question id are dropped rather than failing the whole document.
    #[must_use]
    pub fn into_record(self) -> SessionRecord {
        SessionRecord {
            id: SessionId::new(self.id),
            date: self.date,
            mode: self.mode,
            total_questions: self.total_questions,
            correct_answers: self.correct_answers,
            percentage: self.percentage,
            time_spent_minutes: self.time_spent,
            domain_breakdown: self.domain_breakdown,
            question_ids: self.question_ids.into_iter().map(QuestionId::new).collect(),
            selected_answers: self
                .selected_answers
                .into_iter()
                .filter_map(|(key, idx)| key.parse::<QuestionId>().ok().map(|id| (id, idx)))
                .collect(),
        }
    }
}

/// Persisted shape of one study-plan day (`date` as an ISO `YYYY-MM-DD`
/// string).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPlanDayDoc {
    pub date: String,
    pub tasks: Vec<String>,
}

impl StudyPlanDayDoc {
    #[must_use]
    pub fn from_day(day: &StudyPlanDay) -> Self {
        Self {
            date: day.date.format("%Y-%m-%d").to_string(),
            tasks: day.tasks.clone(),
        }
    }

    #[must_use]
    pub fn into_day(self) -> Option<StudyPlanDay> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()?;
        Some(StudyPlanDay {
            date,
            tasks: self.tasks,
        })
    }
}

//
// ─── PROGRESS DOCUMENT ─────────────────────────────────────────────────────────
//

/// The one-per-user document held by the external store.
///
/// Sets are stored as plain arrays and integer-keyed maps as string-keyed
/// objects; [`ProgressDocument::from_state`] / [`ProgressDocument::into_state`]
/// are the reversible boundary transform between this shape and
/// `ProgressState`. Every field defaults, so partially written or older
/// documents still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressDocument {
    pub session_history: Vec<SessionRecordDoc>,
    pub domain_performance: BTreeMap<String, DomainStats>,
    pub question_performance: BTreeMap<String, QuestionStats>,
    pub bookmarked: Vec<u64>,
    pub incorrect: Vec<u64>,
    pub exam_date: Option<String>,
    pub study_plan: Vec<StudyPlanDayDoc>,
    pub is_dark_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl ProgressDocument {
    /// Serialize in-memory progress into the stored document shape.
    #[must_use]
    pub fn from_state(state: &ProgressState) -> Self {
        Self {
            session_history: state
                .session_history
                .iter()
                .map(SessionRecordDoc::from_record)
                .collect(),
            domain_performance: state.domain_performance.clone(),
            question_performance: state
                .question_performance
                .iter()
                .map(|(id, stats)| (id.to_string(), *stats))
                .collect(),
            bookmarked: state.bookmarked.iter().map(|id| id.value()).collect(),
            incorrect: state.incorrect.iter().map(|id| id.value()).collect(),
            exam_date: state
                .exam_date
                .map(|date| date.format("%Y-%m-%d").to_string()),
            study_plan: state.study_plan.iter().map(StudyPlanDayDoc::from_day).collect(),
            is_dark_mode: state.dark_mode,
            email: None,
            created_at: None,
            last_updated: None,
        }
    }

    /// Reconstruct in-memory progress from the stored document.
    ///
    /// Tolerant by design: missing fields already defaulted during
    /// deserialization, unparseable map keys or dates are skipped. A corrupt
    /// entry costs that entry, never the whole profile.
    #[must_use]
    pub fn into_state(self) -> ProgressState {
        ProgressState {
            session_history: self
                .session_history
                .into_iter()
                .map(SessionRecordDoc::into_record)
                .collect(),
            domain_performance: self.domain_performance,
            question_performance: self
                .question_performance
                .into_iter()
                .filter_map(|(key, stats)| key.parse::<QuestionId>().ok().map(|id| (id, stats)))
                .collect(),
            bookmarked: self.bookmarked.into_iter().map(QuestionId::new).collect(),
            incorrect: self.incorrect.into_iter().map(QuestionId::new).collect(),
            exam_date: self
                .exam_date
                .and_then(|raw| NaiveDate::parse_from_str(&raw, "%Y-%m-%d").ok()),
            study_plan: self
                .study_plan
                .into_iter()
                .filter_map(StudyPlanDayDoc::into_day)
                .collect(),
            dark_mode: self.is_dark_mode,
        }
    }

    /// Stamp the document with its owner's email (set once at creation).
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Stamp the document's update time before a save.
    #[must_use]
    pub fn with_last_updated(mut self, now: DateTime<Utc>) -> Self {
        self.last_updated = Some(now.to_rfc3339());
        self
    }

    /// Stamp the document's creation time (first login).
    #[must_use]
    pub fn with_created_at(mut self, now: DateTime<Utc>) -> Self {
        self.created_at = Some(now.to_rfc3339());
        self
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
