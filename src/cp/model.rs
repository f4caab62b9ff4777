//! CP model definition.

use super::variables::IntVar;
use std::collections::HashMap;

/// A constraint in the CP model.
///
/// Constraints refer to integer variables by name. Only the relations
/// needed for assignment-style problems are provided; richer relations
/// belong in consumer layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Pairwise distinct values across all listed variables.
    AllDifferent {
        /// Names of the variables that must take distinct values.
        vars: Vec<String>,
    },

    /// `left == right`.
    Equal { left: String, right: String },

    /// `left != right`.
    NotEqual { left: String, right: String },

    /// `var == value`.
    Fixed {
        /// Variable to fix.
        var: String,
        /// Required value.
        value: i64,
    },
}

impl Constraint {
    /// Names of all variables this constraint refers to.
    pub fn scope(&self) -> Vec<&str> {
        match self {
            Constraint::AllDifferent { vars } => vars.iter().map(String::as_str).collect(),
            Constraint::Equal { left, right } | Constraint::NotEqual { left, right } => {
                vec![left.as_str(), right.as_str()]
            }
            Constraint::Fixed { var, .. } => vec![var.as_str()],
        }
    }
}

/// A constraint programming model.
///
/// Contains integer variables (kept in insertion order) and constraints.
/// There is no objective: solvers look for any feasible assignment.
///
/// # Examples
///
/// ```
/// use u_shiftplan::cp::{CpModel, IntVar};
///
/// let mut model = CpModel::new("example");
/// model.add_int_var(IntVar::new("a", 1, 3));
/// model.add_int_var(IntVar::new("b", 1, 3));
/// model.add_all_different(vec!["a".into(), "b".into()]);
/// assert!(model.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CpModel {
    /// Model name.
    pub name: String,
    int_vars: Vec<IntVar>,
    index: HashMap<String, usize>,
    constraints: Vec<Constraint>,
}

impl CpModel {
    /// Creates a new empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds an integer variable. A variable with the same name is replaced.
    pub fn add_int_var(&mut self, var: IntVar) {
        match self.index.get(&var.name) {
            Some(&i) => self.int_vars[i] = var,
            None => {
                self.index.insert(var.name.clone(), self.int_vars.len());
                self.int_vars.push(var);
            }
        }
    }

    /// Adds a constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Convenience: add an all-different constraint.
    pub fn add_all_different(&mut self, vars: Vec<String>) {
        self.constraints.push(Constraint::AllDifferent { vars });
    }

    /// Convenience: add an equality constraint.
    pub fn add_equal(&mut self, left: String, right: String) {
        self.constraints.push(Constraint::Equal { left, right });
    }

    /// Convenience: add a disequality constraint.
    pub fn add_not_equal(&mut self, left: String, right: String) {
        self.constraints.push(Constraint::NotEqual { left, right });
    }

    /// Convenience: fix a variable to a value.
    pub fn add_fixed(&mut self, var: String, value: i64) {
        self.constraints.push(Constraint::Fixed { var, value });
    }

    /// Integer variables in insertion order.
    pub fn int_vars(&self) -> &[IntVar] {
        &self.int_vars
    }

    /// Looks up a variable by name.
    pub fn int_var(&self, name: &str) -> Option<&IntVar> {
        self.index.get(name).map(|&i| &self.int_vars[i])
    }

    /// Position of a variable in insertion order.
    pub fn var_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// All constraints.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Validates the model for consistency.
    ///
    /// Checks that every referenced variable exists and that no variable
    /// has an empty domain. An unsatisfiable `Fixed` value is not a
    /// modeling error; solvers report it as infeasible.
    pub fn validate(&self) -> Result<(), String> {
        for var in &self.int_vars {
            if var.domain_size() == 0 {
                return Err(format!("empty domain: {}", var.name));
            }
            if let Some(v) = var.fixed {
                if v < var.min || v > var.max {
                    return Err(format!("fixed value {v} outside domain: {}", var.name));
                }
            }
        }
        for constraint in &self.constraints {
            for name in constraint.scope() {
                if !self.index.contains_key(name) {
                    return Err(format!("undefined variable: {name}"));
                }
            }
        }
        Ok(())
    }

    /// Returns the number of integer variables.
    pub fn var_count(&self) -> usize {
        self.int_vars.len()
    }

    /// Returns the number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}
