use serde::Serialize;
use std::fmt;

use prep_core::model::ProgressState;

//
// ─── QUERY RESULTS ─────────────────────────────────────────────────────────────
//

/// Headline numbers across the whole session history.
///
/// Presentation-agnostic: no pre-formatted strings, no locale assumptions.
/// The UI formats as needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverallStats {
    /// Rounded mean of the per-session percentages; 0 with no sessions.
    pub average_score: u32,
    pub total_sessions: usize,
    /// Questions answered across all recorded sessions.
    pub total_questions: u64,
}

/// One domain's lifetime accuracy, rounded to a percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainScore {
    pub domain: String,
    pub percentage: u8,
}

/// One point of the score-over-time series, oldest session first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScorePoint {
    /// Short ordinal label (`S1`, `S2`, ...) in chronological order.
    pub label: String,
    pub score: u8,
}

/// Coarse confidence band for passing the real exam at a given score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PassOutlook {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl fmt::Display for PassOutlook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PassOutlook::Low => "Low",
            PassOutlook::Moderate => "Moderate",
            PassOutlook::High => "High",
            PassOutlook::VeryHigh => "Very High",
        };
        write!(f, "{label}")
    }
}

//
// ─── QUERIES ───────────────────────────────────────────────────────────────────
//

/// Read-only analytics over a user's progress.
pub struct ProgressQueries;

impl ProgressQueries {
    /// Average score, session count, and total questions answered.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn overall_stats(progress: &ProgressState) -> OverallStats {
        let history = &progress.session_history;
        if history.is_empty() {
            return OverallStats::default();
        }

        let total_questions = history
            .iter()
            .map(|s| u64::from(s.total_questions))
            .sum();
        let percentage_sum: u64 = history.iter().map(|s| u64::from(s.percentage)).sum();
        let average_score =
            (percentage_sum as f64 / history.len() as f64).round() as u32;

        OverallStats {
            average_score,
            total_sessions: history.len(),
            total_questions,
        }
    }

    /// Lifetime accuracy per domain, in the map's canonical order.
    #[must_use]
    pub fn domain_percentages(progress: &ProgressState) -> Vec<DomainScore> {
        progress
            .domain_performance
            .iter()
            .map(|(domain, stats)| DomainScore {
                domain: domain.clone(),
                percentage: stats.percentage(),
            })
            .collect()
    }

    /// Per-session scores in chronological order (history is stored newest
    /// first, so the series is reversed here).
    #[must_use]
    pub fn score_progression(progress: &ProgressState) -> Vec<ScorePoint> {
        progress
            .session_history
            .iter()
            .rev()
            .enumerate()
            .map(|(index, session)| ScorePoint {
                label: format!("S{}", index + 1),
                score: session.percentage,
            })
            .collect()
    }

    /// Confidence band for a session score.
    #[must_use]
    pub fn passing_outlook(percentage: u8) -> PassOutlook {
        match percentage {
            0..=49 => PassOutlook::Low,
            50..=64 => PassOutlook::Moderate,
            65..=74 => PassOutlook::High,
            _ => PassOutlook::VeryHigh,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::{
        AnswerSheet, DomainStats, Question, RawQuestionRecord, SessionMode, SessionRecord,
    };
    use prep_core::time::fixed_now;
    use chrono::Duration;

    fn question(id: u64, domain: &str) -> Question {
        let record = RawQuestionRecord {
            id: Some(id),
            question: format!("Q{id}"),
            option_a: Some("a".into()),
            option_b: Some("b".into()),
            domain: Some(domain.to_owned()),
            ..RawQuestionRecord::default()
        };
        Question::from_raw(&record, id).unwrap()
    }

    fn progress_with_scores(scores: &[(u32, u32)]) -> ProgressState {
        // (correct, total) per session, submitted a minute apart
        let mut progress = ProgressState::new();
        for (index, (correct, total)) in scores.iter().enumerate() {
            let questions: Vec<Question> =
                (1..=*total).map(|i| question(u64::from(i), "Alpha")).collect();
            let mut answers = AnswerSheet::new();
            for q in questions.iter().take(*correct as usize) {
                answers.select(q.id, 0);
            }
            let submitted = fixed_now() + Duration::minutes(index as i64 + 1);
            progress.record_session(SessionRecord::build(
                SessionMode::Practice,
                &questions,
                &answers,
                fixed_now(),
                submitted,
            ));
        }
        progress
    }

    #[test]
    fn empty_history_yields_zeroed_stats() {
        let stats = ProgressQueries::overall_stats(&ProgressState::new());
        assert_eq!(stats, OverallStats::default());
    }

    #[test]
    fn overall_stats_average_and_totals() {
        let progress = progress_with_scores(&[(4, 4), (1, 2)]);
        let stats = ProgressQueries::overall_stats(&progress);

        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_questions, 6);
        assert_eq!(stats.average_score, 75); // (100 + 50) / 2
    }

    #[test]
    fn progression_runs_oldest_to_newest() {
        let progress = progress_with_scores(&[(0, 2), (2, 2)]);
        let series = ProgressQueries::score_progression(&progress);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].label, "S1");
        assert_eq!(series[0].score, 0);
        assert_eq!(series[1].label, "S2");
        assert_eq!(series[1].score, 100);
    }

    #[test]
    fn domain_percentages_round_lifetime_accuracy() {
        let mut progress = ProgressState::new();
        progress
            .domain_performance
            .insert("Alpha".into(), DomainStats { correct: 2, total: 3 });
        progress
            .domain_performance
            .insert("Beta".into(), DomainStats { correct: 0, total: 0 });

        let scores = ProgressQueries::domain_percentages(&progress);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].percentage, 67);
        assert_eq!(scores[1].percentage, 0);
    }

    #[test]
    fn outlook_bands_match_thresholds() {
        assert_eq!(ProgressQueries::passing_outlook(49), PassOutlook::Low);
        assert_eq!(ProgressQueries::passing_outlook(50), PassOutlook::Moderate);
        assert_eq!(ProgressQueries::passing_outlook(64), PassOutlook::Moderate);
        assert_eq!(ProgressQueries::passing_outlook(65), PassOutlook::High);
        assert_eq!(ProgressQueries::passing_outlook(75), PassOutlook::VeryHigh);
        assert_eq!(PassOutlook::VeryHigh.to_string(), "Very High");
    }
}
