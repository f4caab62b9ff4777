//! Working-day labels and projection of schedules onto dates.
//!
//! The planner itself only knows ordered day labels. These helpers build
//! the usual Monday..Saturday label list and, when labels are weekday
//! names, place a solved [`Schedule`] on a real calendar, dropping
//! holidays and other excluded dates.

use crate::planner::{PlannerError, Role, Schedule};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::BTreeSet;

/// Full English name of a weekday.
pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Labels for the given weekdays with Sunday removed.
pub fn working_days(weekdays: &[Weekday]) -> Vec<String> {
    weekdays
        .iter()
        .filter(|&&d| d != Weekday::Sun)
        .map(|&d| weekday_label(d).to_string())
        .collect()
}

/// Monday through Saturday.
pub fn default_days() -> Vec<String> {
    working_days(&[
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ])
}

/// A schedule entry placed on a concrete date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatedShift {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Worker")]
    pub worker: String,
    /// 1-based week.
    #[serde(rename = "Week")]
    pub week: usize,
    #[serde(rename = "Day")]
    pub day: String,
    #[serde(rename = "Role")]
    pub role: Role,
}

/// Places a schedule on the calendar.
///
/// Week 0 is the calendar week (Monday first) containing `start`; each
/// day label must parse as a weekday name. Entries on `excluded` dates are
/// left out. Output is ordered by date, then worker order.
pub fn dated_shifts(
    schedule: &Schedule,
    start: NaiveDate,
    excluded: &BTreeSet<NaiveDate>,
) -> Result<Vec<DatedShift>, PlannerError> {
    let monday = start
        .checked_sub_days(Days::new(u64::from(start.weekday().num_days_from_monday())))
        .ok_or_else(|| PlannerError::Export(format!("date out of range: {start}")))?;

    let offsets = schedule
        .days()
        .iter()
        .map(|label| {
            label
                .parse::<Weekday>()
                .map(|d| u64::from(d.num_days_from_monday()))
                .map_err(|_| PlannerError::UnknownDay(label.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut shifts = Vec::new();
    for week in 0..schedule.weeks() {
        let mut week_days: Vec<(NaiveDate, &String)> = Vec::with_capacity(offsets.len());
        for (label, &offset) in schedule.days().iter().zip(&offsets) {
            let date = monday
                .checked_add_days(Days::new(week as u64 * 7 + offset))
                .ok_or_else(|| PlannerError::Export(format!("week {week} out of range")))?;
            if !excluded.contains(&date) {
                week_days.push((date, label));
            }
        }
        week_days.sort();

        for (date, label) in week_days {
            for worker in schedule.workers() {
                if let Some(role) = schedule.role(worker, week, label) {
                    shifts.push(DatedShift {
                        date,
                        worker: worker.clone(),
                        week: week + 1,
                        day: label.clone(),
                        role,
                    });
                }
            }
        }
    }
    Ok(shifts)
}
