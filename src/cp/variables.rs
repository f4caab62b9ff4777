//! CP variable types.

/// An integer variable with a domain [min, max].
///
/// Represents a decision variable that takes integer values within
/// the specified bounds. Can be fixed to a single value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntVar {
    /// Variable name (unique identifier within a model).
    pub name: String,
    /// Minimum value.
    pub min: i64,
    /// Maximum value.
    pub max: i64,
    /// Fixed value, if any.
    pub fixed: Option<i64>,
}

impl IntVar {
    /// Creates a new integer variable with the given bounds.
    pub fn new(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            fixed: None,
        }
    }

    /// Creates a fixed integer variable.
    pub fn fixed(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            min: value,
            max: value,
            fixed: Some(value),
        }
    }

    /// Whether this variable is fixed to a single value.
    pub fn is_fixed(&self) -> bool {
        self.fixed.is_some()
    }

    /// Domain size (max - min + 1), zero for an empty domain.
    pub fn domain_size(&self) -> i64 {
        (self.max - self.min + 1).max(0)
    }

    /// Initial domain values in ascending order.
    ///
    /// A fixed variable yields only its fixed value.
    pub fn values(&self) -> Vec<i64> {
        match self.fixed {
            Some(v) => vec![v],
            None => (self.min..=self.max).collect(),
        }
    }
}
