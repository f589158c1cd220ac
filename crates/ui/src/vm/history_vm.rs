use services::AssessmentRecord;

use crate::vm::time_fmt::format_datetime;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRowVm {
    pub id: u64,
    pub skill: String,
    pub level: &'static str,
    pub score_text: String,
    pub correct_text: String,
    pub tab_switches: u32,
    pub status: &'static str,
    pub started_at_str: String,
    pub completed_at_str: Option<String>,
}

impl From<&AssessmentRecord> for HistoryRowVm {
    fn from(record: &AssessmentRecord) -> Self {
        Self {
            id: record.id.value(),
            skill: record.skill.clone(),
            level: record.level.as_str(),
            score_text: record
                .score
                .map_or_else(|| "-".to_string(), |score| format!("{score:.0}%")),
            correct_text: format!("{}/{}", record.correct_answers, record.total_questions),
            tab_switches: record.tab_switches,
            status: record.status.as_str(),
            started_at_str: format_datetime(record.started_at),
            completed_at_str: record.completed_at.map(format_datetime),
        }
    }
}

#[must_use]
pub fn map_history_rows(records: &[AssessmentRecord]) -> Vec<HistoryRowVm> {
    records.iter().map(HistoryRowVm::from).collect()
}
