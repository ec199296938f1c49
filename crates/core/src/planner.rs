use chrono::{Days, NaiveDate};
use thiserror::Error;

use crate::model::{SessionRecord, DomainStats};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("exam date is not set")]
    ExamDateMissing,
    #[error("a completed assessment is required before planning")]
    AssessmentRequired,
    #[error("exam date must be in the future ({days_until} day(s) from today)")]
    ExamDateNotInFuture { days_until: i64 },
}

//
// ─── STUDY PLAN ────────────────────────────────────────────────────────────────
//

/// One calendar day of the generated study schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyPlanDay {
    pub date: NaiveDate,
    pub tasks: Vec<String>,
}

/// Accuracy below which a domain counts as weak in the assessment.
const WEAK_ACCURACY: f64 = 0.70;
/// Accuracy at or above which a domain counts as strong.
const STRONG_ACCURACY: f64 = 0.80;
/// Fraction of the bank the plan aims to cover before the exam.
const BANK_COVERAGE: f64 = 0.8;
/// Floor for the per-day practice volume.
const MIN_QUESTIONS_PER_DAY: u32 = 20;

//
// ─── PLANNER ───────────────────────────────────────────────────────────────────
//

/// Derives a day-by-day study schedule from an assessment result and a
/// target exam date.
///
/// The generator is a pure function of its inputs: the same assessment, exam
/// date, reference day, and bank size always produce an identical plan.
/// Randomness never enters; weekday cadence comes from the day index alone.
///
/// # Examples
///
/// ```
/// # use prep_core::planner::StudyPlanner;
/// # use prep_core::model::{AnswerSheet, SessionMode, SessionRecord};
/// # use prep_core::time::fixed_now;
/// let assessment = SessionRecord::build(
///     SessionMode::Assessment,
///     &[],
///     &AnswerSheet::new(),
///     fixed_now(),
///     fixed_now(),
/// );
/// let today = fixed_now().date_naive();
/// let exam_date = today + chrono::Days::new(10);
/// let plan = StudyPlanner::generate(Some(&assessment), Some(exam_date), today, 500)?;
/// assert_eq!(plan.len(), 10);
/// # Ok::<(), prep_core::planner::PlanError>(())
/// ```
pub struct StudyPlanner;

impl StudyPlanner {
    /// Generate the schedule covering every day from `today` (inclusive) up
    /// to the exam date (exclusive).
    ///
    /// # Errors
    ///
    /// - `ExamDateMissing` / `AssessmentRequired` when a prerequisite is
    ///   absent.
    /// - `ExamDateNotInFuture` when the exam date is today or earlier.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn generate(
        assessment: Option<&SessionRecord>,
        exam_date: Option<NaiveDate>,
        today: NaiveDate,
        bank_size: usize,
    ) -> Result<Vec<StudyPlanDay>, PlanError> {
        let exam_date = exam_date.ok_or(PlanError::ExamDateMissing)?;
        let assessment = assessment.ok_or(PlanError::AssessmentRequired)?;

        let days_until_exam = (exam_date - today).num_days();
        if days_until_exam <= 0 {
            return Err(PlanError::ExamDateNotInFuture {
                days_until: days_until_exam,
            });
        }
        let questions_per_day = ((bank_size as f64 * BANK_COVERAGE / days_until_exam as f64)
            .round() as u32)
            .max(MIN_QUESTIONS_PER_DAY);

        let weak_domains = domains_with(assessment, |acc| acc < WEAK_ACCURACY);
        let strong_domains = domains_with(assessment, |acc| acc >= STRONG_ACCURACY);

        let mut plan = Vec::with_capacity(days_until_exam as usize);
        for i in 0..days_until_exam {
            let date = today + Days::new(i as u64);
            plan.push(StudyPlanDay {
                date,
                tasks: tasks_for_day(i, questions_per_day, &weak_domains, &strong_domains),
            });
        }
        Ok(plan)
    }
}

/// Domains from the assessment breakdown whose accuracy satisfies the
/// predicate. Domains with zero attempts are excluded outright.
fn domains_with(assessment: &SessionRecord, predicate: impl Fn(f64) -> bool) -> Vec<String> {
    assessment
        .domain_breakdown
        .iter()
        .filter_map(|(domain, stats): (&String, &DomainStats)| {
            stats
                .accuracy()
                .filter(|acc| predicate(*acc))
                .map(|_| domain.clone())
        })
        .collect()
}

fn tasks_for_day(
    day_index: i64,
    questions_per_day: u32,
    weak_domains: &[String],
    strong_domains: &[String],
) -> Vec<String> {
    let mut tasks = Vec::new();
    let is_review_day = day_index % 5 == 4;
    let is_assessment_day = day_index % 7 == 6;

    if is_assessment_day {
        tasks.push("Take a practice exam (50-100 questions)".to_owned());
    } else if is_review_day {
        tasks.push("Review incorrect answers and explanations".to_owned());
        tasks.push("Focus on bookmarked questions".to_owned());
        if !weak_domains.is_empty() {
            tasks.push(format!("Target weak domains: {}", weak_domains.join(", ")));
        }
    } else {
        tasks.push(format!("Practice {questions_per_day} questions"));
        if !weak_domains.is_empty() && day_index % 2 == 0 {
            tasks.push(format!(
                "Focus on weak domains: {}",
                weak_domains.join(", ")
            ));
        } else if !strong_domains.is_empty() && day_index % 3 == 0 {
            tasks.push(format!(
                "Quick review of strong domains: {}",
                strong_domains.join(", ")
            ));
        } else {
            tasks.push("Mixed domain practice".to_owned());
        }
        tasks.push("Use Adaptive Practice Mode".to_owned());
    }

    tasks
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnswerSheet, DomainStats, SessionMode, SessionRecord};
    use crate::time::fixed_now;
    use std::collections::BTreeMap;

    fn assessment(breakdown: &[(&str, u32, u32)]) -> SessionRecord {
        let mut record = SessionRecord::build(
            SessionMode::Assessment,
            &[],
            &AnswerSheet::new(),
            fixed_now(),
            fixed_now(),
        );
        record.domain_breakdown = breakdown
            .iter()
            .map(|(domain, correct, total)| {
                (
                    (*domain).to_owned(),
                    DomainStats {
                        correct: *correct,
                        total: *total,
                    },
                )
            })
            .collect::<BTreeMap<_, _>>();
        record
    }

    fn today() -> NaiveDate {
        fixed_now().date_naive()
    }

    #[test]
    fn missing_prerequisites_are_rejected() {
        let a = assessment(&[]);
        assert_eq!(
            StudyPlanner::generate(Some(&a), None, today(), 100).unwrap_err(),
            PlanError::ExamDateMissing
        );
        assert_eq!(
            StudyPlanner::generate(None, Some(today() + Days::new(5)), today(), 100).unwrap_err(),
            PlanError::AssessmentRequired
        );
    }

    #[test]
    fn past_or_same_day_exam_date_is_invalid() {
        let a = assessment(&[]);
        let yesterday = today().pred_opt().unwrap();
        assert_eq!(
            StudyPlanner::generate(Some(&a), Some(yesterday), today(), 100).unwrap_err(),
            PlanError::ExamDateNotInFuture { days_until: -1 }
        );
        assert_eq!(
            StudyPlanner::generate(Some(&a), Some(today()), today(), 100).unwrap_err(),
            PlanError::ExamDateNotInFuture { days_until: 0 }
        );
    }

    #[test]
    fn plan_covers_every_day_until_exam() {
        let a = assessment(&[("Alpha", 9, 10)]);
        let plan =
            StudyPlanner::generate(Some(&a), Some(today() + Days::new(14)), today(), 1000)
                .unwrap();

        assert_eq!(plan.len(), 14);
        assert_eq!(plan[0].date, today());
        assert_eq!(plan[13].date, today() + Days::new(13));
    }

    #[test]
    fn seventh_day_of_each_week_is_a_practice_exam() {
        let a = assessment(&[]);
        let plan =
            StudyPlanner::generate(Some(&a), Some(today() + Days::new(15)), today(), 100).unwrap();

        assert_eq!(plan[6].tasks, vec!["Take a practice exam (50-100 questions)"]);
        assert_eq!(plan[13].tasks, vec!["Take a practice exam (50-100 questions)"]);
    }

    #[test]
    fn review_days_call_out_weak_domains() {
        let a = assessment(&[("Alpha", 1, 10), ("Beta", 8, 10)]);
        let plan =
            StudyPlanner::generate(Some(&a), Some(today() + Days::new(10)), today(), 100).unwrap();

        let review = &plan[4].tasks;
        assert_eq!(review[0], "Review incorrect answers and explanations");
        assert_eq!(review[1], "Focus on bookmarked questions");
        assert_eq!(review[2], "Target weak domains: Alpha");
    }

    #[test]
    fn practice_days_alternate_weak_strong_and_mixed_focus() {
        let a = assessment(&[("Weakish", 1, 10), ("Strongish", 9, 10)]);
        let plan =
            StudyPlanner::generate(Some(&a), Some(today() + Days::new(4)), today(), 100).unwrap();

        // day 0: weak focus (even index), day 1: mixed, day 3: strong review
        assert!(plan[0].tasks[1].starts_with("Focus on weak domains: Weakish"));
        assert_eq!(plan[1].tasks[1], "Mixed domain practice");
        assert!(plan[3].tasks[1].starts_with("Quick review of strong domains: Strongish"));
        for day in &plan {
            assert_eq!(day.tasks.last().unwrap(), "Use Adaptive Practice Mode");
        }
    }

    #[test]
    fn zero_attempt_domains_are_neither_weak_nor_strong() {
        let a = assessment(&[("Untouched", 0, 0)]);
        let plan =
            StudyPlanner::generate(Some(&a), Some(today() + Days::new(6)), today(), 100).unwrap();

        assert_eq!(plan[4].tasks.len(), 2); // review day without weak callout
        assert_eq!(plan[0].tasks[1], "Mixed domain practice");
    }

    #[test]
    fn daily_volume_scales_with_bank_but_never_below_floor() {
        let a = assessment(&[]);
        let small =
            StudyPlanner::generate(Some(&a), Some(today() + Days::new(10)), today(), 50).unwrap();
        assert_eq!(small[0].tasks[0], "Practice 20 questions");

        let large =
            StudyPlanner::generate(Some(&a), Some(today() + Days::new(10)), today(), 1000).unwrap();
        assert_eq!(large[0].tasks[0], "Practice 80 questions");
    }

    #[test]
    fn generation_is_deterministic() {
        let a = assessment(&[("Alpha", 3, 10), ("Beta", 9, 10)]);
        let first =
            StudyPlanner::generate(Some(&a), Some(today() + Days::new(21)), today(), 800).unwrap();
        let second =
            StudyPlanner::generate(Some(&a), Some(today() + Days::new(21)), today(), 800).unwrap();
        assert_eq!(first, second);
    }

}
