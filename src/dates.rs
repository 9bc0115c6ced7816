use chrono::{Days, Months, NaiveDate};

/// One calendar-month report window.
///
/// `label` identifies the window (`YYYY-MM`); the portal's form fields use
/// `DD-MM-YYYY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

impl DateRange {
    pub fn start_field(&self) -> String {
        self.start.format("%d-%m-%Y").to_string()
    }

    pub fn end_field(&self) -> String {
        self.end.format("%d-%m-%Y").to_string()
    }

    /// Combined human-readable value for the `reportDate` form field.
    pub fn report_date(&self) -> String {
        format!("{} - {}", self.start_field(), self.end_field())
    }
}

/// Lazy sequence of monthly windows covering `[start, end]`.
///
/// Each window spans `[current, current + 1 month - 1 day]` clamped to the
/// overall end date; advancement is by exactly one calendar month, so month
/// length and leap years are honoured. Empty when `start > end`.
pub fn monthly_ranges(start: NaiveDate, end: NaiveDate) -> MonthlyRanges {
    MonthlyRanges {
        current: start,
        end,
    }
}

#[derive(Debug, Clone)]
pub struct MonthlyRanges {
    current: NaiveDate,
    end: NaiveDate,
}

impl Iterator for MonthlyRanges {
    type Item = DateRange;

    fn next(&mut self) -> Option<DateRange> {
        if self.current > self.end {
            return None;
        }

        let next_month = self.current.checked_add_months(Months::new(1))?;
        let window_end = next_month.checked_sub_days(Days::new(1))?.min(self.end);

        let range = DateRange {
            start: self.current,
            end: window_end,
            label: self.current.format("%Y-%m").to_string(),
        };

        self.current = next_month;
        Some(range)
    }
}
