//! Cycle windows
//!
//! A cycle runs from local midnight on `start_day` of one month up to (not
//! including) local midnight on `start_day` of the next month. With the
//! default start day of 4 that is "4th through 3rd".

use crate::core::{EngineError, EngineResult};
use crate::utils::time::{day_start_millis, local_date};
use chrono::{Datelike, Months, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleWindow {
    /// Inclusive, Unix millis
    pub start: i64,
    /// Exclusive, Unix millis
    pub end: i64,
    pub first_day: NaiveDate,
    /// Inclusive last calendar day of the cycle
    pub last_day: NaiveDate,
}

impl CycleWindow {
    /// The window containing `as_of`
    pub fn enclosing(as_of: i64, start_day: u32, tz: Tz) -> EngineResult<Self> {
        let date = local_date(as_of, tz);
        let anchor = NaiveDate::from_ymd_opt(date.year(), date.month(), start_day)
            .ok_or_else(|| invalid_start_day(start_day))?;
        let first_day = if date >= anchor {
            anchor
        } else {
            anchor
                .checked_sub_months(Months::new(1))
                .ok_or_else(|| invalid_start_day(start_day))?
        };
        let next_first = first_day
            .checked_add_months(Months::new(1))
            .ok_or_else(|| invalid_start_day(start_day))?;
        let last_day = next_first.pred_opt().unwrap_or(first_day);

        Ok(Self {
            start: day_start_millis(first_day, tz),
            end: day_start_millis(next_first, tz),
            first_day,
            last_day,
        })
    }

    pub fn contains(&self, millis: i64) -> bool {
        millis >= self.start && millis < self.end
    }
}

fn invalid_start_day(start_day: u32) -> EngineError {
    EngineError::InvalidRequest(format!("cycle start day {start_day} has no window"))
}
