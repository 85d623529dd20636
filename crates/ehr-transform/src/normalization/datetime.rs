//! Event timestamps.

use chrono::{Datelike, NaiveDateTime};

/// Layout of every event timestamp in the extracts.
pub const EVENT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Calendar date of an event; the time of day is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateStamp {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// Parses a raw (unnormalized) timestamp such as `2015-03-01 08:30:00`.
pub fn parse_event_date(value: &str) -> Option<DateStamp> {
    let parsed = NaiveDateTime::parse_from_str(value.trim(), EVENT_DATETIME_FORMAT).ok()?;
    Some(DateStamp {
        year: parsed.year(),
        month: parsed.month(),
        day: parsed.day(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fixed_layout_only() {
        assert_eq!(
            parse_event_date("2015-03-01 08:30:00"),
            Some(DateStamp {
                year: 2015,
                month: 3,
                day: 1
            })
        );
        assert_eq!(parse_event_date("2015-03-01"), None);
        assert_eq!(parse_event_date("2015-03-0108:30:00"), None);
        assert_eq!(parse_event_date("2015-02-30 00:00:00"), None);
    }
}
