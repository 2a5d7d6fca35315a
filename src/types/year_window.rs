//! Calendar windows replicated across past years, and the synthetic historical date
//! axis built from them.

use crate::types::request::InputValidationError;
use chrono::{Datelike, NaiveDate};

/// One calendar span inside a single past year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    /// 0 for `max_year`, 1 for the year before, and so on.
    pub year_rank: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateSpan {
    pub fn year(&self) -> i32 {
        self.start.year()
    }

    /// Number of days in the span, both ends inclusive.
    pub fn len(&self) -> usize {
        ((self.end - self.start).num_days() + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Dates of the span in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

/// A (month, day) span replicated over `number_of_years` consecutive years ending at
/// `max_year`, walking backward one year at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearWindow {
    spans: Vec<DateSpan>,
}

impl YearWindow {
    /// Builds the windows from the month/day of the requested `start` and `end`.
    ///
    /// # Errors
    ///
    /// Returns [`InputValidationError::EndBeforeStart`] if `end < start`,
    /// [`InputValidationError::CrossYearWindow`] if the span crosses a year boundary,
    /// [`InputValidationError::DateMissingInYear`] if a bound (Feb 29) does not exist
    /// in one of the past years, and [`InputValidationError::NoHistoricalYears`]
    /// when `number_of_years` is zero.
    pub fn new(
        start: NaiveDate,
        end: NaiveDate,
        number_of_years: usize,
        max_year: i32,
    ) -> Result<Self, InputValidationError> {
        if end < start {
            return Err(InputValidationError::EndBeforeStart { start, end });
        }
        if number_of_years == 0 {
            return Err(InputValidationError::NoHistoricalYears);
        }
        if start.year() != end.year() {
            return Err(InputValidationError::CrossYearWindow { start, end });
        }

        let spans = (0..number_of_years)
            .map(|year_rank| {
                let year = max_year - year_rank as i32;
                let span_start = replace_year(start, year)?;
                let span_end = replace_year(end, year)?;
                Ok(DateSpan {
                    year_rank,
                    start: span_start,
                    end: span_end,
                })
            })
            .collect::<Result<Vec<_>, InputValidationError>>()?;

        Ok(Self { spans })
    }

    /// The per-year spans, most recent year first.
    pub fn spans(&self) -> &[DateSpan] {
        &self.spans
    }

    pub fn number_of_years(&self) -> usize {
        self.spans.len()
    }

    /// All span dates concatenated and sorted descending, most recent first.
    pub fn axis(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.spans.iter().flat_map(|s| s.days()).collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates
    }

    /// Total number of dates on the axis.
    pub fn axis_len(&self) -> usize {
        self.spans.iter().map(DateSpan::len).sum()
    }

    /// Date addressed by `(year_rank, day_offset)`, if it lies inside its span.
    pub fn date_at(&self, year_rank: usize, day_offset: usize) -> Option<NaiveDate> {
        let span = self.spans.get(year_rank)?;
        if day_offset >= span.len() {
            return None;
        }
        span.start.checked_add_days(chrono::Days::new(day_offset as u64))
    }
}

fn replace_year(date: NaiveDate, year: i32) -> Result<NaiveDate, InputValidationError> {
    date.with_year(year)
        .ok_or(InputValidationError::DateMissingInYear {
            month: date.month(),
            day: date.day(),
            year,
        })
}
