use serde::{Deserialize, Serialize};

//
// ─── DOMAIN STATS ──────────────────────────────────────────────────────────────
//

/// Lifetime correct/total counters for one knowledge domain.
///
/// Counters only ever grow: session recording merges additively and session
/// deletion deliberately leaves them untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainStats {
    pub correct: u32,
    pub total: u32,
}

impl DomainStats {
    /// Count one attempt.
    pub fn record(&mut self, correct: bool) {
        self.total = self.total.saturating_add(1);
        if correct {
            self.correct = self.correct.saturating_add(1);
        }
    }

    /// Fold another counter into this one.
    pub fn merge(&mut self, other: &DomainStats) {
        self.correct = self.correct.saturating_add(other.correct);
        self.total = self.total.saturating_add(other.total);
    }

    /// Fraction correct, or `None` when nothing was attempted.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(f64::from(self.correct) / f64::from(self.total))
        }
    }

    /// Rounded percentage, 0 when nothing was attempted.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn percentage(&self) -> u8 {
        self.accuracy().map_or(0, |a| (a * 100.0).round() as u8)
    }
}

//
// ─── QUESTION STATS ────────────────────────────────────────────────────────────
//

/// Lifetime counters for one question, updated on every answer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionStats {
    pub correct_count: u32,
    pub total_count: u32,
    pub last_correct: bool,
}

impl QuestionStats {
    /// Count one answer event.
    pub fn record(&mut self, correct: bool) {
        self.total_count = self.total_count.saturating_add(1);
        if correct {
            self.correct_count = self.correct_count.saturating_add(1);
        }
        self.last_correct = correct;
    }

    /// Fraction correct, or `None` when the question was never attempted.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        if self.total_count == 0 {
            None
        } else {
            Some(f64::from(self.correct_count) / f64::from(self.total_count))
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
