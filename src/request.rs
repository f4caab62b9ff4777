//! Request boundary for web-facing callers.
//!
//! Parses the query parameters of a planning request, runs the planner and
//! wraps the outcome in a [`PlanResponse`]. Nothing here panics: every
//! failure becomes an error response the caller can serialize.
//!
//! | Parameter         | Default | Meaning                                |
//! |-------------------|---------|----------------------------------------|
//! | `weeks`           | 4       | weeks to plan, integer up to 520       |
//! | `opening_only`    | false   | pin `opening_advisor` to Opening       |
//! | `opening_advisor` | —       | name of the pinned worker              |
//! | `rotation`        | true    | no role repeated in consecutive weeks  |
//! | `time_limit`      | 10      | solver budget in seconds, 0 = no limit |

use crate::planner::{
    records_to_csv, ConfigError, PlannerConfig, PlannerError, ShiftPlanner, ShiftRecord,
    DEFAULT_TIME_LIMIT_SECS, MAX_WEEKS,
};
use log::warn;
use serde::Serialize;

/// Weeks planned when the request does not say.
pub const DEFAULT_WEEKS: usize = 4;

/// Parsed planning parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    pub weeks: usize,
    pub opening_only: bool,
    pub opening_advisor: Option<String>,
    pub rotation: bool,
    pub time_limit_secs: u64,
}

impl Default for PlanRequest {
    fn default() -> Self {
        Self {
            weeks: DEFAULT_WEEKS,
            opening_only: false,
            opening_advisor: None,
            rotation: true,
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
        }
    }
}

/// Truthy spellings accepted for flags.
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

impl PlanRequest {
    /// Parses key/value pairs, e.g. a decoded query string.
    ///
    /// Unknown keys are ignored. A `weeks` that is not an integer or is
    /// above [`MAX_WEEKS`] is an error. A bad `time_limit` falls back to
    /// the default, and `time_limit=0` means no limit.
    pub fn from_params<'a, I>(params: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut request = Self::default();
        for (key, value) in params {
            match key {
                "weeks" => {
                    let weeks: usize =
                        value.trim().parse().map_err(|_| ConfigError::InvalidParameter {
                            name: "weeks".into(),
                            reason: format!("expected an integer, got '{value}'"),
                        })?;
                    if weeks > MAX_WEEKS {
                        return Err(ConfigError::InvalidParameter {
                            name: "weeks".into(),
                            reason: format!("at most {MAX_WEEKS} weeks, got {weeks}"),
                        });
                    }
                    request.weeks = weeks;
                }
                "opening_only" => request.opening_only = parse_flag(value),
                "opening_advisor" => {
                    let name = value.trim();
                    request.opening_advisor = (!name.is_empty()).then(|| name.to_string());
                }
                "rotation" => request.rotation = parse_flag(value),
                "time_limit" => {
                    request.time_limit_secs = value.trim().parse().unwrap_or_else(|_| {
                        warn!("ignoring time_limit '{value}'");
                        DEFAULT_TIME_LIMIT_SECS
                    });
                }
                _ => {}
            }
        }
        Ok(request)
    }

    /// Planner configuration for the default crew and working days.
    pub fn to_config(&self) -> PlannerConfig {
        PlannerConfig::default()
            .with_weeks(self.weeks)
            .with_pin(self.opening_only, self.opening_advisor.clone())
            .with_rotation(self.rotation)
    }

    /// Validates, builds and solves, returning the flat records.
    pub fn run(&self) -> Result<Vec<ShiftRecord>, PlannerError> {
        let mut planner = ShiftPlanner::new(self.to_config())?;
        planner.build_and_solve(Some(self.time_limit_secs))?;
        planner.records()
    }
}

/// Response envelope: `{"status":"ok","plan":[...]}` or
/// `{"status":"error","message":"..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PlanResponse {
    Ok { plan: Vec<ShiftRecord> },
    Error { message: String },
}

impl PlanResponse {
    /// Whether the request succeeded.
    pub fn is_ok(&self) -> bool {
        matches!(self, PlanResponse::Ok { .. })
    }

    /// HTTP status code a web layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            PlanResponse::Ok { .. } => 200,
            PlanResponse::Error { .. } => 500,
        }
    }

    /// JSON body.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"status":"error","message":"serialization failed: {e}"}}"#)
        })
    }
}

impl From<Result<Vec<ShiftRecord>, PlannerError>> for PlanResponse {
    fn from(result: Result<Vec<ShiftRecord>, PlannerError>) -> Self {
        match result {
            Ok(plan) => PlanResponse::Ok { plan },
            Err(e) => PlanResponse::Error {
                message: e.to_string(),
            },
        }
    }
}

fn plan_records<'a, I>(params: I) -> Result<Vec<ShiftRecord>, PlannerError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    PlanRequest::from_params(params)?.run()
}

/// Handles a plan request end to end.
pub fn handle_plan<'a, I>(params: I) -> PlanResponse
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let response = PlanResponse::from(plan_records(params));
    if let PlanResponse::Error { message } = &response {
        warn!("plan request failed: {message}");
    }
    response
}

/// Handles a CSV export request.
pub fn export_csv<'a, I>(params: I) -> Result<String, PlannerError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    plan_records(params).map(|records| records_to_csv(&records))
}
