//! Date parsing and the display key rows are grouped by.

use std::fmt::Write;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use exam_timeline_core::SeriesConfig;

/// Label used for records that carry no date at all.
pub const UNDATED_LABEL: &str = "sem data";

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Grouping key of a record plus the instant used to order rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateKey {
    pub label: String,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Parse the date formats the API is known to send. Values without an
/// offset are read as local time at `offset`.
pub fn parse_date(text: &str, offset: &FixedOffset) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        // Date columns serialize a calendar day as UTC midnight.
        if instant.offset().local_minus_utc() == 0 && instant.time() == NaiveTime::MIN {
            return instant
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .and_then(|naive| localize(naive, offset));
        }
        return Some(instant.with_timezone(&Utc));
    }

    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(instant) = DateTime::parse_from_str(text, format) {
            return Some(instant.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return localize(naive, offset);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).and_then(|naive| localize(naive, offset));
        }
    }

    None
}

fn localize(naive: NaiveDateTime, offset: &FixedOffset) -> Option<DateTime<Utc>> {
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|instant| instant.with_timezone(&Utc))
}

/// Render `instant` as a calendar day at `offset`.
///
/// Falls back to ISO `YYYY-MM-DD` when `format` cannot be rendered.
pub fn format_display_date(instant: DateTime<Utc>, offset: &FixedOffset, format: &str) -> String {
    let local = instant.with_timezone(offset);
    let mut rendered = String::new();
    if write!(rendered, "{}", local.format(format)).is_err() {
        rendered.clear();
        rendered.push_str(&local.date_naive().to_string());
    }
    rendered
}

/// Build the grouping key for a record date.
///
/// Unparseable text is kept verbatim as the label, without a timestamp.
pub fn date_key(text: Option<&str>, config: &SeriesConfig) -> DateKey {
    let offset = display_offset(config);
    let Some(text) = text.map(str::trim).filter(|text| !text.is_empty()) else {
        return DateKey {
            label: UNDATED_LABEL.to_string(),
            timestamp: None,
        };
    };

    match parse_date(text, &offset) {
        Some(instant) => DateKey {
            label: format_display_date(instant, &offset, &config.date_format),
            timestamp: Some(instant),
        },
        None => DateKey {
            label: text.to_string(),
            timestamp: None,
        },
    }
}

pub(crate) fn display_offset(config: &SeriesConfig) -> FixedOffset {
    config
        .display_offset()
        .unwrap_or_else(|| Utc.fix())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brasilia() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    #[test]
    fn date_only_values_keep_their_calendar_day() {
        let config = SeriesConfig::default();
        let key = date_key(Some("2024-01-15"), &config);
        assert_eq!(key.label, "15/01/2024");
        assert_eq!(
            key.timestamp,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 3, 0, 0).unwrap())
        );
    }

    #[test]
    fn brazilian_dates_are_accepted() {
        let config = SeriesConfig::default();
        assert_eq!(date_key(Some("10/04/2024"), &config).label, "10/04/2024");
    }

    #[test]
    fn instants_are_shown_in_display_offset() {
        let config = SeriesConfig::default();
        assert_eq!(
            date_key(Some("2024-01-15T01:30:00Z"), &config).label,
            "14/01/2024"
        );
        assert_eq!(
            date_key(Some("2024-01-15T13:30:00.250Z"), &config).label,
            "15/01/2024"
        );
        assert_eq!(
            date_key(Some("2024-01-15 10:00:00"), &config).label,
            "15/01/2024"
        );
    }

    #[test]
    fn utc_midnight_is_a_calendar_day() {
        let config = SeriesConfig::default();
        let stored = date_key(Some("2024-04-10T00:00:00.000Z"), &config);
        assert_eq!(stored, date_key(Some("2024-04-10"), &config));
        assert_eq!(stored.label, "10/04/2024");

        // Any other UTC instant is still shifted.
        assert_eq!(
            date_key(Some("2024-04-10T00:00:01Z"), &config).label,
            "09/04/2024"
        );
    }

    #[test]
    fn unparseable_dates_keep_raw_label() {
        let config = SeriesConfig::default();
        let key = date_key(Some("  ontem  "), &config);
        assert_eq!(key.label, "ontem");
        assert_eq!(key.timestamp, None);

        let undated = date_key(None, &config);
        assert_eq!(undated.label, UNDATED_LABEL);
        assert_eq!(undated.timestamp, None);
    }

    #[test]
    fn custom_format_and_offset() {
        let config = SeriesConfig {
            date_format: "%Y-%m-%d".to_string(),
            display_offset_minutes: 0,
            ..SeriesConfig::default()
        };
        assert_eq!(
            date_key(Some("2024-01-15T01:30:00Z"), &config).label,
            "2024-01-15"
        );
    }

    #[test]
    fn broken_format_falls_back_to_iso() {
        let instant = Utc.with_ymd_and_hms(2024, 4, 10, 12, 0, 0).unwrap();
        assert_eq!(format_display_date(instant, &brasilia(), "%Q"), "2024-04-10");
        assert_eq!(format_display_date(instant, &brasilia(), "%d/%m/%Y"), "10/04/2024");
    }
}
