mod answer;
mod ids;
mod level;
mod question;
mod result;

pub use answer::{AnswerEntry, AnswerSheet, NO_ANSWER, Selection, SubmissionPayload};
pub use ids::{ParseIdError, QuestionId, SessionId};
pub use level::{ParseLevelError, SkillLevel};
pub use question::{MAX_OPTIONS, MIN_OPTIONS, Question, QuestionError};
pub use result::{GradeReport, QuestionFeedback, SubmissionResult};
