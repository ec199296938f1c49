use rand::rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

use prep_core::bank::QuestionBank;
use prep_core::model::{ProgressState, Question, QuestionId};

use crate::error::SelectionError;

//
// ─── DOMAIN FILTER ─────────────────────────────────────────────────────────────
//

/// Which slice of the bank a practice session draws from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainFilter {
    /// Every question in the bank.
    All,
    /// Only questions whose canonical domain matches exactly.
    Domain(String),
}

impl DomainFilter {
    #[must_use]
    pub fn domain(name: impl Into<String>) -> Self {
        Self::Domain(name.into())
    }

    fn matches(&self, question: &Question) -> bool {
        match self {
            DomainFilter::All => true,
            DomainFilter::Domain(name) => question.domain == *name,
        }
    }
}

//
// ─── EXAM COMPOSITION ──────────────────────────────────────────────────────────
//

/// The five canonical exam domains and their blueprint weights (sum 1.0).
pub const DOMAIN_WEIGHTS: [(&str, f64); 5] = [
    ("Information System Auditing Process", 0.18),
    ("Governance And Management Of It", 0.18),
    (
        "Information Systems Acquisition, Development And Implementation",
        0.12,
    ),
    (
        "Information Systems Operations And Business Resilience",
        0.26,
    ),
    ("Protection Of Information Assets", 0.26),
];

/// A composed exam or assessment set.
///
/// When the bank cannot supply the requested count the draft runs short;
/// `shortfall` makes that visible so the caller can warn or abort instead of
/// silently starting a smaller session.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamDraft {
    pub questions: Vec<Question>,
    pub requested: usize,
}

impl ExamDraft {
    /// How many questions short of the request the draft is.
    #[must_use]
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.questions.len())
    }

    #[must_use]
    pub fn is_short(&self) -> bool {
        self.shortfall() > 0
    }
}

//
// ─── SELECTION ENGINE ──────────────────────────────────────────────────────────
//

// Adaptive weight shape: a fully missed domain weighs (1-0)+0.5 = 1.5 and a
// perfect one (1-1)+0.5 = 0.5, so struggling areas always outrank mastered
// ones. Unseen domains take accuracy 1.0 and sort behind struggling ones.
const DOMAIN_WEIGHT_OFFSET: f64 = 0.5;
const QUESTION_WEIGHT_OFFSET: f64 = 0.3;
const UNSEEN_DOMAIN_ACCURACY: f64 = 1.0;

/// Builds question sets for practice, exam, and assessment sessions.
///
/// Every mode returns owned copies of the bank's questions so per-session
/// bookkeeping can never leak back into the immutable bank, and every
/// shuffle is an unbiased Fisher-Yates pass.
pub struct SelectionEngine;

impl SelectionEngine {
    /// Shuffle the filtered pool and take the first `count`.
    ///
    /// A pool smaller than `count` yields the whole (shuffled) pool.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::NoQuestions` when the filter matches nothing.
    pub fn random_practice(
        bank: &QuestionBank,
        filter: &DomainFilter,
        count: usize,
    ) -> Result<Vec<Question>, SelectionError> {
        let mut pool: Vec<Question> = bank
            .questions()
            .iter()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect();
        if pool.is_empty() {
            return Err(SelectionError::NoQuestions);
        }

        let mut rng = rng();
        pool.shuffle(&mut rng);
        pool.truncate(count);
        Ok(pool)
    }

    /// Rank the filtered pool by adaptive weight and take the first `count`.
    ///
    /// Weight is `((1 - domain_accuracy) + 0.5) * ((1 - question_accuracy) +
    /// 0.3)`; the question factor is omitted for never-attempted questions
    /// and a domain without any recorded attempts counts as fully accurate,
    /// so unexplored material is deprioritized rather than boosted. Ties
    /// keep bank order.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::NoQuestions` when the filter matches nothing.
    pub fn adaptive_practice(
        bank: &QuestionBank,
        progress: &ProgressState,
        filter: &DomainFilter,
        count: usize,
    ) -> Result<Vec<Question>, SelectionError> {
        let mut weighted: Vec<(f64, Question)> = bank
            .questions()
            .iter()
            .filter(|q| filter.matches(q))
            .map(|q| (Self::question_weight(progress, q), q.clone()))
            .collect();
        if weighted.is_empty() {
            return Err(SelectionError::NoQuestions);
        }

        // Stable sort keeps bank order among equal weights.
        weighted.sort_by(|a, b| b.0.total_cmp(&a.0));
        weighted.truncate(count);
        Ok(weighted.into_iter().map(|(_, q)| q).collect())
    }

    /// Compose an exam/assessment set of `total` questions.
    ///
    /// Each canonical domain contributes `round(total * weight)` questions
    /// sampled without replacement from its pool. If rounding or thin pools
    /// leave the set short, the remainder is drawn uniformly from the rest
    /// of the bank; if the whole bank runs out, the draft reports the
    /// shortfall. The combined set is shuffled once more so domain blocks
    /// are not presented contiguously, then truncated to exactly `total`.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::NoQuestions` when the bank is empty or
    /// `total` is zero.
    pub fn compose_weighted(
        bank: &QuestionBank,
        total: usize,
    ) -> Result<ExamDraft, SelectionError> {
        if bank.is_empty() || total == 0 {
            return Err(SelectionError::NoQuestions);
        }

        let mut rng = rng();
        let mut selected: Vec<Question> = Vec::with_capacity(total);
        let mut taken: HashSet<QuestionId> = HashSet::new();

        for (domain, weight) in DOMAIN_WEIGHTS {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let share = (total as f64 * weight).round() as usize;
            let mut pool: Vec<Question> = bank.in_domain(domain).cloned().collect();
            pool.shuffle(&mut rng);
            for question in pool.into_iter().take(share) {
                taken.insert(question.id);
                selected.push(question);
            }
        }

        if selected.len() < total {
            let mut backfill: Vec<Question> = bank
                .questions()
                .iter()
                .filter(|q| !taken.contains(&q.id))
                .cloned()
                .collect();
            backfill.shuffle(&mut rng);
            let needed = total - selected.len();
            selected.extend(backfill.into_iter().take(needed));
        }

        selected.shuffle(&mut rng);
        selected.truncate(total);

        if selected.is_empty() {
            return Err(SelectionError::NoQuestions);
        }
        Ok(ExamDraft {
            questions: selected,
            requested: total,
        })
    }

    pub(crate) fn question_weight(progress: &ProgressState, question: &Question) -> f64 {
        let domain_accuracy = progress
            .domain_performance
            .get(&question.domain)
            .and_then(|stats| stats.accuracy())
            .unwrap_or(UNSEEN_DOMAIN_ACCURACY);
        let mut weight = (1.0 - domain_accuracy) + DOMAIN_WEIGHT_OFFSET;

        if let Some(question_accuracy) = progress
            .question_performance
            .get(&question.id)
            .and_then(|stats| stats.accuracy())
        {
            weight *= (1.0 - question_accuracy) + QUESTION_WEIGHT_OFFSET;
        }

        weight
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
