use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime};

/// Inclusive timestamp interval. A range whose start is after its end
/// matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// From 00:00:00 on `from` through 23:59:59 on `to`.
    pub fn days(from: NaiveDate, to: NaiveDate) -> Self {
        Self::new(from.and_time(NaiveTime::MIN), end_of_day(to))
    }

    /// The whole of `date`.
    pub fn day(date: NaiveDate) -> Self {
        Self::days(date, date)
    }

    /// The calendar month containing `date`.
    pub fn month(date: NaiveDate) -> Self {
        let first = date.with_day(1).unwrap_or(date);
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(date);
        Self::days(first, last)
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}
