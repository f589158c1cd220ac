use chrono::{DateTime, Utc};

#[must_use]
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

/// `MM:SS`, zero-padded. Minutes keep counting past 59.
#[must_use]
pub fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_core::time::fixed_now;

    #[test]
    fn clock_is_zero_padded() {
        assert_eq!(format_clock(900), "15:00");
        assert_eq!(format_clock(119), "01:59");
        assert_eq!(format_clock(5), "00:05");
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(6_000), "100:00");
    }

    #[test]
    fn datetime_is_minute_precision() {
        assert_eq!(format_datetime(fixed_now()), "2023-11-14 22:13");
    }
}
