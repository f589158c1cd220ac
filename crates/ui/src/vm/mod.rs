mod assessment_vm;
mod history_vm;
mod result_vm;
mod time_fmt;

pub use assessment_vm::{AssessmentVm, OptionVm, PaletteCell, PaletteState, QuestionVm, WarningVm};
pub use history_vm::{HistoryRowVm, map_history_rows};
pub use result_vm::{FeedbackVm, ResultVm, Verdict};
pub use time_fmt::{format_clock, format_datetime};
