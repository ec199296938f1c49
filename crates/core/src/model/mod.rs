mod ids;
mod progress;
mod question;
mod session;
mod stats;
mod user;

pub use ids::{ParseIdError, QuestionId, SessionId};
pub use progress::ProgressState;
pub use question::{Question, RawDifficulty, RawQuestionRecord};
pub use session::{AnswerSheet, Score, SessionMode, SessionRecord};
pub use stats::{DomainStats, QuestionStats};
pub use user::{UserHandle, UserId};
