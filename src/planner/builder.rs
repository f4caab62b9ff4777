//! Translation of a [`PlannerConfig`] into a CP model.

use super::config::PlannerConfig;
use super::role::Role;
use crate::cp::{CpModel, IntVar};
use log::debug;

/// Position of one assignment variable, as indices into the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarKey {
    pub worker: usize,
    pub week: usize,
    pub day: usize,
}

/// A built model together with the naming of its variables.
#[derive(Debug, Clone)]
pub struct ShiftModel {
    /// The constraint model.
    pub model: CpModel,
    workers: usize,
    weeks: usize,
    days: usize,
}

impl ShiftModel {
    /// Name of the variable for a (worker, week, day) position.
    pub fn var_name(key: VarKey) -> String {
        format!("shift_p{}_w{}_d{}", key.worker, key.week, key.day)
    }

    /// All variable positions, ordered by worker, then week, then day.
    pub fn keys(&self) -> impl Iterator<Item = VarKey> + '_ {
        (0..self.workers).flat_map(move |worker| {
            (0..self.weeks).flat_map(move |week| {
                (0..self.days).map(move |day| VarKey { worker, week, day })
            })
        })
    }
}

/// Builds the shift model for a validated configuration.
///
/// Constraint families:
///
/// 1. **Coverage**: the crew's variables on each (week, day) are all
///    different. With three workers over three values this means every
///    role is held by exactly one worker.
/// 2. **Weekly consistency**: each worker's variable on the first day of a
///    week equals every other day of that week.
/// 3. **Pinning**: the pinned worker is fixed to Opening everywhere.
/// 4. **Rotation**: first-day variables of consecutive weeks differ, for
///    every worker except the pinned one.
pub fn build_model(config: &PlannerConfig) -> ShiftModel {
    let mut model = CpModel::new("shift_plan");
    let workers = config.workers.len();
    let days = config.days.len();
    let name = |worker, week, day| ShiftModel::var_name(VarKey { worker, week, day });

    for week in 0..config.weeks {
        for worker in 0..workers {
            for day in 0..days {
                model.add_int_var(IntVar::new(
                    name(worker, week, day),
                    Role::MIN_VALUE,
                    Role::MAX_VALUE,
                ));
            }
        }
    }

    for week in 0..config.weeks {
        for day in 0..days {
            model.add_all_different((0..workers).map(|w| name(w, week, day)).collect());
        }
    }

    for week in 0..config.weeks {
        for worker in 0..workers {
            for day in 1..days {
                model.add_equal(name(worker, week, 0), name(worker, week, day));
            }
        }
    }

    let pinned = config
        .active_pin()
        .and_then(|p| config.workers.iter().position(|w| w == p));

    if let Some(worker) = pinned {
        for week in 0..config.weeks {
            for day in 0..days {
                model.add_fixed(name(worker, week, day), Role::Opening.value());
            }
        }
    }

    if config.rotation_active() {
        for worker in (0..workers).filter(|&w| Some(w) != pinned) {
            for week in 0..config.weeks - 1 {
                model.add_not_equal(name(worker, week, 0), name(worker, week + 1, 0));
            }
        }
    }

    debug!(
        "built shift model: {} variables, {} constraints",
        model.var_count(),
        model.constraint_count()
    );

    ShiftModel {
        model,
        workers,
        weeks: config.weeks,
        days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::Constraint;

    fn count(model: &CpModel, pred: impl Fn(&Constraint) -> bool) -> usize {
        model.constraints().iter().filter(|c| pred(*c)).count()
    }

    #[test]
    fn test_base_model_shape() {
        let config = PlannerConfig::default();
        let shift = build_model(&config);
        let model = &shift.model;

        assert_eq!(model.var_count(), 3 * 6);
        assert!(model.validate().is_ok());
        assert_eq!(count(model, |c| matches!(c, Constraint::AllDifferent { .. })), 6);
        assert_eq!(count(model, |c| matches!(c, Constraint::Equal { .. })), 3 * 5);
        assert_eq!(count(model, |c| matches!(c, Constraint::Fixed { .. })), 0);
        assert_eq!(count(model, |c| matches!(c, Constraint::NotEqual { .. })), 0);
        assert!(model
            .int_vars()
            .iter()
            .all(|v| v.min == 1 && v.max == 3));
    }

    #[test]
    fn test_pin_adds_fixed() {
        let config = PlannerConfig::default()
            .with_weeks(2)
            .with_pinned_worker("Advisor_2");
        let shift = build_model(&config);
        let fixed: Vec<_> = shift
            .model
            .constraints()
            .iter()
            .filter_map(|c| match c {
                Constraint::Fixed { var, value } => Some((var.clone(), *value)),
                _ => None,
            })
            .collect();

        assert_eq!(fixed.len(), 2 * 6);
        assert!(fixed.iter().all(|(var, value)| var.starts_with("shift_p1_") && *value == 1));
    }

    #[test]
    fn test_rotation_skips_pinned_worker() {
        let config = PlannerConfig::default()
            .with_weeks(3)
            .with_pinned_worker("Advisor_1")
            .with_rotation(true);
        let shift = build_model(&config);

        let pairs: Vec<_> = shift
            .model
            .constraints()
            .iter()
            .filter_map(|c| match c {
                Constraint::NotEqual { left, right } => Some((left.clone(), right.clone())),
                _ => None,
            })
            .collect();

        // two free workers, two consecutive pairs each
        assert_eq!(pairs.len(), 4);
        assert!(pairs.iter().all(|(l, _)| !l.starts_with("shift_p0_")));
        assert!(pairs.contains(&("shift_p2_w1_d0".into(), "shift_p2_w2_d0".into())));
    }

    #[test]
    fn test_rotation_ignored_for_single_week() {
        let config = PlannerConfig::default().with_rotation(true);
        let shift = build_model(&config);
        assert_eq!(count(&shift.model, |c| matches!(c, Constraint::NotEqual { .. })), 0);
    }

    #[test]
    fn test_keys_order() {
        let config = PlannerConfig::default().with_weeks(2).with_days(["Mon", "Tue"]);
        let shift = build_model(&config);
        let keys: Vec<_> = shift.keys().collect();

        assert_eq!(keys.len(), 12);
        assert_eq!(keys[0], VarKey { worker: 0, week: 0, day: 0 });
        assert_eq!(keys[1], VarKey { worker: 0, week: 0, day: 1 });
        assert_eq!(keys[2], VarKey { worker: 0, week: 1, day: 0 });
        assert_eq!(keys[4], VarKey { worker: 1, week: 0, day: 0 });
    }
}
