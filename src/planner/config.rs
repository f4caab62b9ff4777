//! Planner configuration.
//!
//! [`PlannerConfig`] holds everything a planning request needs. It is
//! plain data; [`PlannerConfig::validate`] enforces the shape the model
//! relies on and runs when a [`ShiftPlanner`](super::ShiftPlanner) is built.

use super::error::ConfigError;
use crate::calendar::default_days;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

/// Number of workers (and roles) the coverage rule is built for.
pub const CREW_SIZE: usize = 3;

/// Longest horizon accepted, in weeks (ten years).
pub const MAX_WEEKS: usize = 520;

/// Configuration for one planning request.
///
/// # Defaults
///
/// ```
/// use u_shiftplan::planner::PlannerConfig;
///
/// let config = PlannerConfig::default();
/// assert_eq!(config.workers, vec!["Advisor_1", "Advisor_2", "Advisor_3"]);
/// assert_eq!(config.days.len(), 6);
/// assert_eq!(config.weeks, 1);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_shiftplan::planner::PlannerConfig;
///
/// let config = PlannerConfig::default()
///     .with_weeks(4)
///     .with_pinned_worker("Advisor_2")
///     .with_rotation(true);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Worker names, exactly [`CREW_SIZE`] and unique.
    pub workers: Vec<String>,

    /// Working-day labels of one week, in order.
    ///
    /// Sundays and holidays are left out by the caller.
    pub days: Vec<String>,

    /// Number of weeks to plan.
    pub weeks: usize,

    /// Whether [`pinned_worker`](Self::pinned_worker) is held to Opening.
    pub pin_enabled: bool,

    /// Worker held to Opening for the whole horizon.
    pub pinned_worker: Option<String>,

    /// Forbid a worker keeping the same role in consecutive weeks.
    ///
    /// Has no effect with a single week.
    pub rotation_enabled: bool,

    /// Concrete dates the caller does not staff.
    pub excluded_dates: BTreeSet<NaiveDate>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            workers: (1..=CREW_SIZE).map(|i| format!("Advisor_{i}")).collect(),
            days: default_days(),
            weeks: 1,
            pin_enabled: false,
            pinned_worker: None,
            rotation_enabled: false,
            excluded_dates: BTreeSet::new(),
        }
    }
}

impl PlannerConfig {
    /// Sets the worker names.
    pub fn with_workers<I, S>(mut self, workers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.workers = workers.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the day labels.
    pub fn with_days<I, S>(mut self, days: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.days = days.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the number of weeks.
    pub fn with_weeks(mut self, weeks: usize) -> Self {
        self.weeks = weeks;
        self
    }

    /// Enables pinning for the given worker.
    pub fn with_pinned_worker(mut self, worker: impl Into<String>) -> Self {
        self.pin_enabled = true;
        self.pinned_worker = Some(worker.into());
        self
    }

    /// Sets the pin flag and worker independently.
    pub fn with_pin(mut self, enabled: bool, worker: Option<String>) -> Self {
        self.pin_enabled = enabled;
        self.pinned_worker = worker;
        self
    }

    /// Enables or disables weekly rotation.
    pub fn with_rotation(mut self, enabled: bool) -> Self {
        self.rotation_enabled = enabled;
        self
    }

    /// Sets the excluded dates.
    pub fn with_excluded_dates<I>(mut self, dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        self.excluded_dates = dates.into_iter().collect();
        self
    }

    /// The worker actually pinned, if pinning is in effect.
    pub fn active_pin(&self) -> Option<&str> {
        if self.pin_enabled {
            self.pinned_worker.as_deref()
        } else {
            None
        }
    }

    /// Whether the rotation constraint applies.
    pub fn rotation_active(&self) -> bool {
        self.rotation_enabled && self.weeks > 1
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers.len() != CREW_SIZE {
            return Err(ConfigError::WorkerCount(self.workers.len()));
        }
        let mut seen = HashSet::new();
        for worker in &self.workers {
            if !seen.insert(worker.as_str()) {
                return Err(ConfigError::DuplicateWorker(worker.clone()));
            }
        }

        if self.days.is_empty() {
            return Err(ConfigError::NoDays);
        }
        let mut seen = HashSet::new();
        for day in &self.days {
            if !seen.insert(day.as_str()) {
                return Err(ConfigError::DuplicateDay(day.clone()));
            }
        }

        if self.weeks < 1 {
            return Err(ConfigError::NoWeeks(self.weeks));
        }
        if self.weeks > MAX_WEEKS {
            return Err(ConfigError::TooManyWeeks(self.weeks));
        }

        if self.pin_enabled && self.pinned_worker.is_none() {
            return Err(ConfigError::MissingPinnedWorker);
        }
        if let Some(pinned) = &self.pinned_worker {
            if !self.workers.contains(pinned) {
                return Err(ConfigError::UnknownPinnedWorker(pinned.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PlannerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_worker_count() {
        let config = PlannerConfig::default().with_workers(["W1", "W2"]);
        assert_eq!(config.validate(), Err(ConfigError::WorkerCount(2)));

        let config = PlannerConfig::default().with_workers(["W1", "W2", "W3", "W4"]);
        assert_eq!(config.validate(), Err(ConfigError::WorkerCount(4)));
    }

    #[test]
    fn test_duplicates() {
        let config = PlannerConfig::default().with_workers(["W1", "W2", "W1"]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateWorker("W1".into()))
        );

        let config = PlannerConfig::default().with_days(["Monday", "Monday"]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateDay("Monday".into()))
        );
    }

    #[test]
    fn test_days_and_weeks() {
        let config = PlannerConfig::default().with_days(Vec::<String>::new());
        assert_eq!(config.validate(), Err(ConfigError::NoDays));

        let config = PlannerConfig::default().with_weeks(0);
        assert_eq!(config.validate(), Err(ConfigError::NoWeeks(0)));

        assert!(PlannerConfig::default().with_weeks(MAX_WEEKS).validate().is_ok());
        let config = PlannerConfig::default().with_weeks(MAX_WEEKS + 1);
        assert_eq!(config.validate(), Err(ConfigError::TooManyWeeks(MAX_WEEKS + 1)));
    }

    #[test]
    fn test_pin_rules() {
        let config = PlannerConfig::default().with_pin(true, None);
        assert_eq!(config.validate(), Err(ConfigError::MissingPinnedWorker));

        let config = PlannerConfig::default().with_pinned_worker("Nobody");
        assert_eq!(
            config.validate(),
            Err(ConfigError::UnknownPinnedWorker("Nobody".into()))
        );

        // A name without the flag is tolerated but ignored.
        let config = PlannerConfig::default().with_pin(false, Some("Advisor_1".into()));
        assert!(config.validate().is_ok());
        assert_eq!(config.active_pin(), None);

        // ...unless it names someone outside the crew.
        let config = PlannerConfig::default().with_pin(false, Some("Nobody".into()));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rotation_needs_two_weeks() {
        let config = PlannerConfig::default().with_rotation(true);
        assert!(!config.rotation_active());
        assert!(config.with_weeks(2).rotation_active());
    }
}
