use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// This is the standard way of converting a date to a string in goaltrack.
pub fn format_calendar_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Turns whatever date-ish string the outside world provides into a calendar day. Time entries are
/// grouped by this value, so it has to happen exactly once, at the boundary.
///
/// Accepted forms:
///  - `2023-06-01`
///  - `2023-06-01T18:00` / `2023-06-01T18:00:00` (time part is dropped)
///  - RFC 3339 timestamps such as `2023-06-01T23:30:00+02:00`, converted to UTC first
pub fn parse_calendar_day(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc).date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|v| v.date())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{format_calendar_day, parse_calendar_day};

    const TEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();

    #[test]
    fn test_parse_calendar_day_forms() {
        assert_eq!(parse_calendar_day("2023-06-01"), Some(TEST_DATE));
        assert_eq!(parse_calendar_day(" 2023-06-01 "), Some(TEST_DATE));
        assert_eq!(parse_calendar_day("2023-06-01T00:00"), Some(TEST_DATE));
        assert_eq!(parse_calendar_day("2023-06-01T18:00:00"), Some(TEST_DATE));
        assert_eq!(parse_calendar_day("2023-06-01T18:00:00.250"), Some(TEST_DATE));
        assert_eq!(parse_calendar_day("2023-06-01T18:00:00Z"), Some(TEST_DATE));
    }

    #[test]
    fn test_parse_calendar_day_uses_utc_for_offsets() {
        assert_eq!(
            parse_calendar_day("2023-06-02T01:30:00+02:00"),
            Some(TEST_DATE)
        );
    }

    #[test]
    fn test_parse_calendar_day_rejects_garbage() {
        assert_eq!(parse_calendar_day(""), None);
        assert_eq!(parse_calendar_day("yesterday"), None);
        assert_eq!(parse_calendar_day("2023-13-01"), None);
    }

    #[test]
    fn test_format_calendar_day() {
        assert_eq!(format_calendar_day(TEST_DATE), "2023-06-01");
    }
}
