//! Planner error types.

use crate::cp::SolverStatus;
use thiserror::Error;

/// Rejected planner configuration, raised before any model is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The coverage rule needs one worker per role.
    #[error("exactly 3 workers are required, got {0}")]
    WorkerCount(usize),
    /// Worker names are used as keys.
    #[error("duplicate worker name: {0}")]
    DuplicateWorker(String),
    /// At least one working day per week.
    #[error("at least one working day per week is required")]
    NoDays,
    /// Day labels are used as keys.
    #[error("duplicate day label: {0}")]
    DuplicateDay(String),
    /// The horizon must cover at least one week.
    #[error("weeks must be >= 1, got {0}")]
    NoWeeks(usize),
    /// The horizon is longer than the planner accepts.
    #[error("weeks must be <= {max}, got {0}", max = super::config::MAX_WEEKS)]
    TooManyWeeks(usize),
    /// Pinning was enabled without naming a worker.
    #[error("pinning is enabled but no pinned worker was given")]
    MissingPinnedWorker,
    /// The pinned worker is not one of the planned workers.
    #[error("pinned worker '{0}' is not in the worker list")]
    UnknownPinnedWorker(String),
    /// A request parameter could not be parsed.
    #[error("parameter '{name}' is invalid: {reason}")]
    InvalidParameter { name: String, reason: String },
}

/// A solution that does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("worker missing from solution: {0}")]
    MissingWorker(String),
    #[error("worker {worker} has {found} weeks, expected {expected}")]
    WeekCount {
        worker: String,
        expected: usize,
        found: usize,
    },
    #[error("week {week} missing for worker {worker}")]
    MissingWeek { worker: String, week: usize },
    #[error("day {day} missing for worker {worker}, week {week}")]
    MissingDay {
        worker: String,
        week: usize,
        day: String,
    },
    /// Flat records number weeks from 1.
    #[error("record for worker {worker}, day {day} has week 0; weeks start at 1")]
    ZeroWeek { worker: String, day: String },
    #[error("invalid role '{value}' for worker {worker}, week {week}, day {day}")]
    InvalidRole {
        worker: String,
        week: usize,
        day: String,
        value: String,
    },
}

/// Any failure of a planning request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The search ended without an assignment.
    #[error("no schedule found, solver status: {status}")]
    NoSolution { status: SolverStatus },
    /// The solver returned a value that is not a role.
    #[error("solver returned {value} for variable {var}")]
    Extraction { var: String, value: String },
    #[error("invalid schedule structure: {0}")]
    Structure(#[from] StructureError),
    #[error("no solution available; solve the plan first")]
    NotSolved,
    #[error("day label '{0}' is not a weekday name")]
    UnknownDay(String),
    #[error("export failed: {0}")]
    Export(String),
}

impl PlannerError {
    /// Raw solver status, when the error came from the search.
    pub fn solver_status(&self) -> Option<SolverStatus> {
        match self {
            PlannerError::NoSolution { status } => Some(*status),
            _ => None,
        }
    }
}
