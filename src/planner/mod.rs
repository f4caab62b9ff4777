//! Weekly shift planning for a three-person crew.
//!
//! A [`ShiftPlanner`] turns a [`PlannerConfig`] into a CP model (see
//! [`build_model`]), solves it, and keeps the resulting [`Schedule`].
//!
//! # Example
//!
//! ```
//! use u_shiftplan::planner::{PlannerConfig, Role, ShiftPlanner};
//!
//! let config = PlannerConfig::default()
//!     .with_weeks(2)
//!     .with_pinned_worker("Advisor_1")
//!     .with_rotation(true);
//! let mut planner = ShiftPlanner::new(config).unwrap();
//! let schedule = planner.build_and_solve(Some(10)).unwrap();
//!
//! assert_eq!(schedule.weekly_role("Advisor_1", 1), Some(Role::Opening));
//! assert_ne!(
//!     schedule.weekly_role("Advisor_2", 0),
//!     schedule.weekly_role("Advisor_2", 1)
//! );
//! ```

mod builder;
mod config;
mod error;
mod record;
mod role;
mod schedule;

pub use builder::{build_model, ShiftModel, VarKey};
pub use config::{PlannerConfig, CREW_SIZE, MAX_WEEKS};
pub use error::{ConfigError, PlannerError, StructureError};
pub use record::{records_to_csv, records_to_json, ShiftRecord, CSV_HEADER};
pub use role::Role;
pub use schedule::{
    nested_from_records, validate_solution_structure, NestedSchedule, Schedule,
};

use crate::calendar::{dated_shifts, DatedShift};
use crate::cp::{BacktrackingSolver, CpSolver, SolverConfig};
use chrono::NaiveDate;
use log::{info, warn};

/// Default number of parallel search workers.
pub const DEFAULT_SEARCH_WORKERS: usize = 8;

/// Default time budget used by request handlers, in seconds.
pub const DEFAULT_TIME_LIMIT_SECS: u64 = 10;

/// Plans one request. Build a fresh planner per request; the cached
/// schedule is overwritten by every solve.
#[derive(Debug, Clone)]
pub struct ShiftPlanner<S = BacktrackingSolver> {
    config: PlannerConfig,
    solver: S,
    num_workers: usize,
    solution: Option<Schedule>,
}

impl ShiftPlanner<BacktrackingSolver> {
    /// Validates `config` and creates a planner using the built-in solver.
    pub fn new(config: PlannerConfig) -> Result<Self, PlannerError> {
        Self::with_solver(config, BacktrackingSolver::new())
    }
}

impl<S: CpSolver> ShiftPlanner<S> {
    /// Validates `config` and creates a planner with a custom solver.
    pub fn with_solver(config: PlannerConfig, solver: S) -> Result<Self, PlannerError> {
        config.validate()?;
        Ok(Self {
            config,
            solver,
            num_workers: DEFAULT_SEARCH_WORKERS,
            solution: None,
        })
    }

    /// Sets the number of parallel search workers.
    pub fn with_search_workers(mut self, n: usize) -> Self {
        self.num_workers = n.max(1);
        self
    }

    /// The validated configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Builds a fresh model for the configuration.
    pub fn build_model(&self) -> ShiftModel {
        build_model(&self.config)
    }

    /// Builds the model, solves it and caches the schedule.
    ///
    /// `time_limit_secs` of `None` or `Some(0)` searches without a time
    /// budget. Any status other than feasible/optimal is returned as
    /// [`PlannerError::NoSolution`] with the raw status.
    pub fn build_and_solve(
        &mut self,
        time_limit_secs: Option<u64>,
    ) -> Result<&Schedule, PlannerError> {
        let shift = self.build_model();

        let mut solver_config = SolverConfig::default().with_num_workers(self.num_workers);
        if let Some(secs) = time_limit_secs.filter(|&s| s > 0) {
            solver_config = solver_config.with_time_limit_secs(secs);
        }

        let solution = self.solver.solve(&shift.model, &solver_config);
        if !solution.is_solution_found() {
            warn!("shift plan not solved: {}", solution.status);
            return Err(PlannerError::NoSolution {
                status: solution.status,
            });
        }

        let schedule = Schedule::extract(&self.config, &shift, &solution)?;
        info!(
            "shift plan solved: {} weeks x {} days in {} ms",
            self.config.weeks,
            self.config.days.len(),
            solution.solve_time_ms
        );
        let schedule: &Schedule = self.solution.insert(schedule);
        Ok(schedule)
    }

    /// The last solved schedule.
    pub fn solution(&self) -> Option<&Schedule> {
        self.solution.as_ref()
    }

    /// Flat records of the last solved schedule.
    pub fn records(&self) -> Result<Vec<ShiftRecord>, PlannerError> {
        self.solution
            .as_ref()
            .map(Schedule::records)
            .ok_or(PlannerError::NotSolved)
    }

    /// JSON array of the last solved schedule's records.
    pub fn to_json(&self) -> Result<String, PlannerError> {
        records_to_json(&self.records()?)
    }

    /// CSV rendering of the last solved schedule's records.
    pub fn to_csv(&self) -> Result<String, PlannerError> {
        Ok(records_to_csv(&self.records()?))
    }

    /// The last solved schedule on the calendar starting at `start`,
    /// without the configured excluded dates.
    pub fn dated_shifts(&self, start: NaiveDate) -> Result<Vec<DatedShift>, PlannerError> {
        let schedule = self.solution.as_ref().ok_or(PlannerError::NotSolved)?;
        dated_shifts(schedule, start, &self.config.excluded_dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{CpModel, CpSolution, SolverStatus};
    use proptest::prelude::*;
    use std::collections::HashSet;

    const WEEKDAYS: [&str; 6] = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
    ];

    fn crew_config() -> PlannerConfig {
        PlannerConfig::default()
            .with_workers(["W1", "W2", "W3"])
            .with_days(WEEKDAYS)
    }

    fn solve(config: PlannerConfig) -> Schedule {
        let mut planner = ShiftPlanner::new(config).unwrap();
        planner.build_and_solve(Some(5)).unwrap().clone()
    }

    fn assert_coverage(s: &Schedule) {
        let all: HashSet<Role> = Role::ALL.into_iter().collect();
        for week in 0..s.weeks() {
            for day in s.days() {
                let roles: HashSet<Role> = s
                    .workers()
                    .iter()
                    .filter_map(|w| s.role(w, week, day))
                    .collect();
                assert_eq!(roles, all, "week {week} {day}");
            }
        }
    }

    fn assert_weekly_consistency(s: &Schedule) {
        for worker in s.workers() {
            for week in 0..s.weeks() {
                let first = s.weekly_role(worker, week);
                assert!(s.days().iter().all(|d| s.role(worker, week, d) == first));
            }
        }
    }

    #[test]
    fn test_single_week_unconstrained() {
        let s = solve(crew_config());
        assert!(s.validate().is_ok());
        assert_coverage(&s);
        assert_weekly_consistency(&s);
    }

    #[test]
    fn test_pinned_worker_opens() {
        let s = solve(crew_config().with_pinned_worker("W2"));
        for day in WEEKDAYS {
            assert_eq!(s.role("W2", 0, day), Some(Role::Opening));
        }
        let others: HashSet<_> = ["W1", "W3"]
            .iter()
            .map(|w| s.weekly_role(w, 0).unwrap())
            .collect();
        assert_eq!(others, HashSet::from([Role::Closing, Role::Intermediate]));
    }

    #[test]
    fn test_rotation_two_weeks() {
        let s = solve(crew_config().with_weeks(2).with_rotation(true));
        assert_coverage(&s);
        for worker in ["W1", "W2", "W3"] {
            assert_ne!(s.weekly_role(worker, 0), s.weekly_role(worker, 1));
        }
    }

    #[test]
    fn test_pin_with_rotation() {
        let s = solve(
            crew_config()
                .with_weeks(2)
                .with_pinned_worker("W1")
                .with_rotation(true),
        );
        for week in 0..2 {
            for day in WEEKDAYS {
                assert_eq!(s.role("W1", week, day), Some(Role::Opening));
            }
        }
        for worker in ["W2", "W3"] {
            assert_ne!(s.weekly_role(worker, 0), s.weekly_role(worker, 1));
        }
    }

    #[test]
    fn test_two_workers_rejected_before_build() {
        let err = ShiftPlanner::new(crew_config().with_workers(["W1", "W2"])).unwrap_err();
        assert_eq!(err, PlannerError::Config(ConfigError::WorkerCount(2)));
    }

    #[test]
    fn test_zero_time_limit_means_unbounded() {
        let mut planner = ShiftPlanner::new(crew_config().with_weeks(2)).unwrap();
        let schedule = planner.build_and_solve(Some(0)).unwrap();
        assert!(schedule.validate().is_ok());
    }

    #[test]
    fn test_records_before_solve() {
        let planner = ShiftPlanner::new(crew_config()).unwrap();
        assert_eq!(planner.records(), Err(PlannerError::NotSolved));
        assert!(planner.solution().is_none());
    }

    #[test]
    fn test_dated_shifts_use_excluded_dates() {
        let holiday = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let config = crew_config().with_excluded_dates([holiday]);
        let mut planner = ShiftPlanner::new(config).unwrap();
        planner.build_and_solve(None).unwrap();

        let start = NaiveDate::from_ymd_opt(2025, 4, 28).unwrap();
        let shifts = planner.dated_shifts(start).unwrap();
        assert_eq!(shifts.len(), 3 * 5);
        assert!(shifts.iter().all(|s| s.date != holiday));
    }

    #[test]
    fn test_exports() {
        let mut planner = ShiftPlanner::new(crew_config().with_weeks(2)).unwrap();
        planner.build_and_solve(None).unwrap();

        let records = planner.records().unwrap();
        assert_eq!(records.len(), 3 * 2 * 6);
        assert!(records.iter().all(|r| r.week == 1 || r.week == 2));

        let nested = nested_from_records(&records).unwrap();
        assert_eq!(Some(&nested), planner.solution().map(Schedule::to_nested).as_ref());

        let csv = planner.to_csv().unwrap();
        assert_eq!(csv.lines().count(), 1 + records.len());
        assert!(planner.to_json().unwrap().starts_with("[{\"Worker\":\"W1\""));
    }

    struct RefusingSolver(SolverStatus);

    impl CpSolver for RefusingSolver {
        fn solve(&self, _model: &CpModel, _config: &SolverConfig) -> CpSolution {
            CpSolution::empty(self.0)
        }
    }

    #[test]
    fn test_solver_failure_carries_status() {
        for status in [SolverStatus::Infeasible, SolverStatus::Timeout, SolverStatus::Unknown] {
            let mut planner =
                ShiftPlanner::with_solver(crew_config(), RefusingSolver(status)).unwrap();
            let err = planner.build_and_solve(Some(1)).unwrap_err();
            assert_eq!(err.solver_status(), Some(status));
            assert!(planner.solution().is_none());
        }
    }

    struct GarbageSolver;

    impl CpSolver for GarbageSolver {
        fn solve(&self, model: &CpModel, _config: &SolverConfig) -> CpSolution {
            let mut solution = CpSolution::empty(SolverStatus::Feasible);
            for var in model.int_vars() {
                solution.int_vars.insert(var.name.clone(), 9);
            }
            solution
        }
    }

    #[test]
    fn test_out_of_domain_value_rejected() {
        let mut planner = ShiftPlanner::with_solver(crew_config(), GarbageSolver).unwrap();
        let err = planner.build_and_solve(None).unwrap_err();
        assert!(matches!(err, PlannerError::Extraction { ref value, .. } if value == "9"));
    }

    #[test]
    fn test_sequential_search() {
        let mut planner = ShiftPlanner::new(crew_config().with_weeks(3).with_rotation(true))
            .unwrap()
            .with_search_workers(1);
        let s = planner.build_and_solve(None).unwrap().clone();
        assert_coverage(&s);
        for worker in s.workers() {
            for week in 0..2 {
                assert_ne!(s.weekly_role(worker, week), s.weekly_role(worker, week + 1));
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_constraints_hold(
            weeks in 1usize..6,
            days in 1usize..7,
            pin in proptest::option::of(0usize..3),
            rotation in any::<bool>(),
        ) {
            let mut config = crew_config()
                .with_days(WEEKDAYS.iter().take(days).copied())
                .with_weeks(weeks)
                .with_rotation(rotation);
            if let Some(p) = pin {
                config = config.with_pinned_worker(format!("W{}", p + 1));
            }
            let pinned = config.pinned_worker.clone();
            let s = solve(config);

            prop_assert!(s.validate().is_ok());
            assert_coverage(&s);
            assert_weekly_consistency(&s);

            if let Some(p) = &pinned {
                for week in 0..weeks {
                    prop_assert_eq!(s.weekly_role(p, week), Some(Role::Opening));
                }
            }
            if rotation {
                for worker in s.workers().iter().filter(|w| Some(*w) != pinned.as_ref()) {
                    for week in 0..weeks.saturating_sub(1) {
                        prop_assert_ne!(
                            s.weekly_role(worker, week),
                            s.weekly_role(worker, week + 1)
                        );
                    }
                }
            }
        }
    }
}
