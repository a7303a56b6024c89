use chrono::{Datelike, Days, NaiveDate, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A cost query period in both Cost Explorer form (exclusive end) and
/// display form (inclusive end).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub ce_start: String,
    pub ce_end: String,
    pub display_start: String,
    pub display_end: String,
}

impl DateRange {
    /// Normalize user supplied inclusive dates against today's UTC date.
    pub fn from_query(start: Option<&str>, end: Option<&str>) -> Self {
        Self::resolve(start, end, Utc::now().date_naive())
    }

    /// Missing, unparsable or reversed input falls back to the month
    /// containing `today`, ending today.
    pub fn resolve(start: Option<&str>, end: Option<&str>, today: NaiveDate) -> Self {
        let parsed = parse_date(start).zip(parse_date(end));

        match parsed {
            Some((start, end)) if end >= start => Self::inclusive(start, end),
            _ => Self::month_to_date(today),
        }
    }

    fn inclusive(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            ce_start: format_date(start),
            ce_end: format_date(day_after(end)),
            display_start: format_date(start),
            display_end: format_date(end),
        }
    }

    fn month_to_date(today: NaiveDate) -> Self {
        let first = today.with_day(1).unwrap_or(today);
        Self::inclusive(first, today)
    }
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

fn day_after(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
