//! Shift roles.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three daily duties.
///
/// The integer encoding (1..=3) is the domain of the model variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Opening,
    Closing,
    Intermediate,
}

impl Role {
    /// All roles in encoding order.
    pub const ALL: [Role; 3] = [Role::Opening, Role::Closing, Role::Intermediate];

    /// Smallest encoded value.
    pub const MIN_VALUE: i64 = 1;
    /// Largest encoded value.
    pub const MAX_VALUE: i64 = 3;

    /// Integer encoding used in the constraint model.
    pub fn value(self) -> i64 {
        match self {
            Role::Opening => 1,
            Role::Closing => 2,
            Role::Intermediate => 3,
        }
    }

    /// Decodes a model value.
    pub fn from_value(value: i64) -> Option<Role> {
        match value {
            1 => Some(Role::Opening),
            2 => Some(Role::Closing),
            3 => Some(Role::Intermediate),
            _ => None,
        }
    }

    /// Canonical label.
    pub fn label(self) -> &'static str {
        match self {
            Role::Opening => "Opening",
            Role::Closing => "Closing",
            Role::Intermediate => "Intermediate",
        }
    }

    /// Whether `label` is one of the canonical labels.
    pub fn is_label(label: &str) -> bool {
        Role::ALL.iter().any(|r| r.label() == label)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.label() == s)
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}
