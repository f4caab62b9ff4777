//! Weekly shift-role planning for a three-person crew.
//!
//! Assigns each worker one of three daily roles (Opening, Closing,
//! Intermediate) for every working day of a multi-week horizon:
//!
//! - **Coverage**: every role is held by exactly one worker each day.
//! - **Weekly consistency**: a worker keeps one role for a whole week.
//! - **Pinning** (optional): one worker always opens.
//! - **Rotation** (optional): nobody keeps the same role two weeks running.
//!
//! # Architecture
//!
//! - [`cp`]: a small finite-domain modeling layer and backtracking solver.
//! - [`planner`]: builds the shift model from a configuration, solves it
//!   and exposes the schedule as nested data, records, JSON and CSV.
//! - [`calendar`]: working-day labels and placement of a schedule on dates.
//! - [`request`]: query-parameter parsing and response envelopes for a web
//!   layer.
//!
//! The first feasible assignment is returned; nothing is optimized.

pub mod calendar;
pub mod cp;
pub mod planner;
pub mod request;
