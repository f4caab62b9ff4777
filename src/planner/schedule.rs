//! Solved schedules and their structural check.

use super::builder::{ShiftModel, VarKey};
use super::config::PlannerConfig;
use super::error::{PlannerError, StructureError};
use super::record::ShiftRecord;
use super::role::Role;
use crate::cp::CpSolution;
use std::collections::HashMap;

/// Label-level nested form: worker -> week (0-based) -> day -> role label.
pub type NestedSchedule = HashMap<String, HashMap<usize, HashMap<String, String>>>;

/// A complete role assignment for every (worker, week, day).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    workers: Vec<String>,
    days: Vec<String>,
    weeks: usize,
    /// Indexed by worker, then week, then day.
    roles: Vec<Role>,
}

impl Schedule {
    /// Reads every model variable out of a solver result.
    pub(crate) fn extract(
        config: &PlannerConfig,
        shift: &ShiftModel,
        solution: &CpSolution,
    ) -> Result<Self, PlannerError> {
        let roles = shift
            .keys()
            .map(|key| {
                let var = ShiftModel::var_name(key);
                let value = solution.value(&var);
                value.and_then(Role::from_value).ok_or_else(|| PlannerError::Extraction {
                    var,
                    value: value.map_or_else(|| "nothing".to_string(), |v| v.to_string()),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            workers: config.workers.clone(),
            days: config.days.clone(),
            weeks: config.weeks,
            roles,
        })
    }

    fn offset(&self, key: VarKey) -> usize {
        (key.worker * self.weeks + key.week) * self.days.len() + key.day
    }

    /// Workers in configuration order.
    pub fn workers(&self) -> &[String] {
        &self.workers
    }

    /// Day labels in configuration order.
    pub fn days(&self) -> &[String] {
        &self.days
    }

    /// Number of planned weeks.
    pub fn weeks(&self) -> usize {
        self.weeks
    }

    /// Role of a worker on a day of a 0-based week.
    pub fn role(&self, worker: &str, week: usize, day: &str) -> Option<Role> {
        let worker = self.workers.iter().position(|w| w == worker)?;
        let day = self.days.iter().position(|d| d == day)?;
        if week >= self.weeks {
            return None;
        }
        Some(self.roles[self.offset(VarKey { worker, week, day })])
    }

    /// The role a worker holds for a whole week.
    pub fn weekly_role(&self, worker: &str, week: usize) -> Option<Role> {
        self.role(worker, week, self.days.first()?)
    }

    /// Nested label mapping.
    pub fn to_nested(&self) -> NestedSchedule {
        let mut nested = NestedSchedule::new();
        for record in self.records() {
            nested
                .entry(record.worker)
                .or_default()
                .entry(record.week - 1)
                .or_default()
                .insert(record.day, record.role.label().to_string());
        }
        nested
    }

    /// Flat records ordered by worker, week, then day. Weeks are 1-based.
    pub fn records(&self) -> Vec<ShiftRecord> {
        let mut records = Vec::with_capacity(self.roles.len());
        for (w, worker) in self.workers.iter().enumerate() {
            for week in 0..self.weeks {
                for (d, day) in self.days.iter().enumerate() {
                    let key = VarKey {
                        worker: w,
                        week,
                        day: d,
                    };
                    records.push(ShiftRecord {
                        worker: worker.clone(),
                        week: week + 1,
                        day: day.clone(),
                        role: self.roles[self.offset(key)],
                    });
                }
            }
        }
        records
    }

    /// Structural check against the shape this schedule claims.
    pub fn validate(&self) -> Result<(), StructureError> {
        validate_solution_structure(&self.to_nested(), &self.workers, self.weeks, &self.days)
    }
}

/// Rebuilds the nested form from flat records (1-based weeks).
///
/// A record with week 0 is rejected with [`StructureError::ZeroWeek`].
pub fn nested_from_records(records: &[ShiftRecord]) -> Result<NestedSchedule, StructureError> {
    let mut nested = NestedSchedule::new();
    for record in records {
        let week = record
            .week
            .checked_sub(1)
            .ok_or_else(|| StructureError::ZeroWeek {
                worker: record.worker.clone(),
                day: record.day.clone(),
            })?;
        nested
            .entry(record.worker.clone())
            .or_default()
            .entry(week)
            .or_default()
            .insert(record.day.clone(), record.role.label().to_string());
    }
    Ok(nested)
}

/// Checks that a solution covers every expected key with a valid label.
///
/// Reports the first missing worker, week or day, or the first value that
/// is not a role label.
pub fn validate_solution_structure(
    solution: &NestedSchedule,
    workers: &[String],
    weeks: usize,
    days: &[String],
) -> Result<(), StructureError> {
    for worker in workers {
        let by_week = solution
            .get(worker)
            .ok_or_else(|| StructureError::MissingWorker(worker.clone()))?;
        if by_week.len() != weeks {
            return Err(StructureError::WeekCount {
                worker: worker.clone(),
                expected: weeks,
                found: by_week.len(),
            });
        }
        for week in 0..weeks {
            let by_day = by_week.get(&week).ok_or_else(|| StructureError::MissingWeek {
                worker: worker.clone(),
                week,
            })?;
            for day in days {
                let value = by_day.get(day).ok_or_else(|| StructureError::MissingDay {
                    worker: worker.clone(),
                    week,
                    day: day.clone(),
                })?;
                if !Role::is_label(value) {
                    return Err(StructureError::InvalidRole {
                        worker: worker.clone(),
                        week,
                        day: day.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Schedule {
        // W1 opens, W2 closes, W3 intermediate; swapped W1/W2 in week 1
        let mut roles = Vec::new();
        for (w0, w1) in [
            (Role::Opening, Role::Closing),
            (Role::Closing, Role::Opening),
            (Role::Intermediate, Role::Intermediate),
        ] {
            roles.extend([w0, w0, w1, w1]);
        }
        Schedule {
            workers: names(&["W1", "W2", "W3"]),
            days: names(&["Mon", "Tue"]),
            weeks: 2,
            roles,
        }
    }

    #[test]
    fn test_lookup() {
        let s = sample();
        assert_eq!(s.role("W1", 0, "Tue"), Some(Role::Opening));
        assert_eq!(s.role("W2", 1, "Mon"), Some(Role::Opening));
        assert_eq!(s.weekly_role("W3", 1), Some(Role::Intermediate));
        assert_eq!(s.role("W1", 2, "Mon"), None);
        assert_eq!(s.role("W9", 0, "Mon"), None);
    }

    #[test]
    fn test_records_are_one_based_and_ordered() {
        let records = sample().records();
        assert_eq!(records.len(), 12);
        assert_eq!(records[0].worker, "W1");
        assert_eq!(records[0].week, 1);
        assert_eq!(records[0].day, "Mon");
        assert_eq!(records[2].week, 2);
        assert_eq!(records[11].worker, "W3");
    }

    #[test]
    fn test_round_trip() {
        let s = sample();
        assert_eq!(nested_from_records(&s.records()).unwrap(), s.to_nested());
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_week_zero_record_is_rejected() {
        let mut records = sample().records();
        records[4].week = 0;
        let (worker, day) = (records[4].worker.clone(), records[4].day.clone());

        let err = nested_from_records(&records).unwrap_err();
        assert_eq!(err, StructureError::ZeroWeek { worker, day });
    }

    #[test]
    fn test_missing_day_is_named() {
        let s = sample();
        let mut nested = s.to_nested();
        if let Some(days) = nested.get_mut("W2").and_then(|w| w.get_mut(&1)) {
            days.remove("Tue");
        }

        let err = validate_solution_structure(&nested, s.workers(), 2, s.days()).unwrap_err();
        assert_eq!(
            err,
            StructureError::MissingDay {
                worker: "W2".into(),
                week: 1,
                day: "Tue".into()
            }
        );
    }

    #[test]
    fn test_invalid_label_is_named() {
        let s = sample();
        let mut nested = s.to_nested();
        if let Some(days) = nested.get_mut("W3").and_then(|w| w.get_mut(&0)) {
            days.insert("Mon".into(), "Night".into());
        }

        let err = validate_solution_structure(&nested, s.workers(), 2, s.days()).unwrap_err();
        assert!(matches!(err, StructureError::InvalidRole { ref value, .. } if value == "Night"));
    }

    #[test]
    fn test_missing_worker_and_week_count() {
        let s = sample();
        let nested = s.to_nested();

        let err = validate_solution_structure(&nested, &names(&["W1", "W4"]), 2, s.days())
            .unwrap_err();
        assert_eq!(err, StructureError::MissingWorker("W4".into()));

        let err = validate_solution_structure(&nested, s.workers(), 3, s.days()).unwrap_err();
        assert!(matches!(err, StructureError::WeekCount { found: 2, expected: 3, .. }));
    }
}
