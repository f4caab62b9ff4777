//! CP solver interface and backtracking implementation.

use super::model::{Constraint, CpModel};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Status of the solver after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverStatus {
    /// Proven optimal solution found.
    Optimal,
    /// Feasible (but not necessarily optimal) solution found.
    Feasible,
    /// No feasible solution exists.
    Infeasible,
    /// Model is invalid or malformed.
    ModelInvalid,
    /// Solver exceeded time limit without a solution.
    Timeout,
    /// No solution found for unknown reasons.
    Unknown,
}

impl SolverStatus {
    /// Raw numeric status code, stable across releases.
    pub fn code(self) -> i32 {
        match self {
            SolverStatus::Unknown => 0,
            SolverStatus::ModelInvalid => 1,
            SolverStatus::Feasible => 2,
            SolverStatus::Infeasible => 3,
            SolverStatus::Optimal => 4,
            SolverStatus::Timeout => 5,
        }
    }

    /// Whether this status carries a usable assignment.
    pub fn is_solution(self) -> bool {
        matches!(self, SolverStatus::Optimal | SolverStatus::Feasible)
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolverStatus::Optimal => "OPTIMAL",
            SolverStatus::Feasible => "FEASIBLE",
            SolverStatus::Infeasible => "INFEASIBLE",
            SolverStatus::ModelInvalid => "MODEL_INVALID",
            SolverStatus::Timeout => "TIMEOUT",
            SolverStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{name} ({})", self.code())
    }
}

/// Solution from a CP solver.
#[derive(Debug, Clone)]
pub struct CpSolution {
    /// Solver status.
    pub status: SolverStatus,
    /// Integer variable assignments (empty unless a solution was found).
    pub int_vars: HashMap<String, i64>,
    /// Solve time in milliseconds.
    pub solve_time_ms: u64,
    /// Search nodes visited.
    pub nodes: u64,
    /// Dead ends hit during search.
    pub failures: u64,
}

impl CpSolution {
    /// Creates an empty solution with the given status.
    pub fn empty(status: SolverStatus) -> Self {
        Self {
            status,
            int_vars: HashMap::new(),
            solve_time_ms: 0,
            nodes: 0,
            failures: 0,
        }
    }

    /// Whether a feasible solution was found.
    pub fn is_solution_found(&self) -> bool {
        self.status.is_solution()
    }

    /// Value assigned to a variable.
    pub fn value(&self, name: &str) -> Option<i64> {
        self.int_vars.get(name).copied()
    }
}

/// Solver configuration.
///
/// ```
/// use u_shiftplan::cp::SolverConfig;
///
/// let config = SolverConfig::default()
///     .with_time_limit_secs(10)
///     .with_num_workers(8);
/// assert_eq!(config.time_limit_ms, Some(10_000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Maximum solve time in milliseconds. `None` runs unbounded.
    pub time_limit_ms: Option<u64>,
    /// Number of parallel search workers.
    pub num_workers: usize,
    /// Seed for randomized value ordering. `None` keeps ascending order.
    pub seed: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: None,
            num_workers: 1,
            seed: None,
        }
    }
}

impl SolverConfig {
    /// Sets the time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = Some(ms);
        self
    }

    /// Sets the time limit in whole seconds.
    pub fn with_time_limit_secs(mut self, secs: u64) -> Self {
        self.time_limit_ms = Some(secs.saturating_mul(1000));
        self
    }

    /// Sets the number of search workers (at least 1).
    pub fn with_num_workers(mut self, n: usize) -> Self {
        self.num_workers = n.max(1);
        self
    }

    /// Sets the value-ordering seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Trait for CP solver implementations.
///
/// Implementors provide the actual constraint solving logic.
/// This can wrap external solvers or provide custom search.
pub trait CpSolver {
    /// Solves the model and returns a solution.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution;
}

/// Depth-first backtracking solver with forward checking.
///
/// Variables are branched in minimum-remaining-values order. Every
/// assignment is propagated through the constraints it takes part in
/// until no new variable becomes fixed. The search is complete: an
/// exhausted tree reports [`SolverStatus::Infeasible`].
///
/// With more than one worker, the values of the first branching variable
/// are explored on a rayon pool and the first solution stops the others.
///
/// # Limitations
///
/// - No objective: a found solution is reported as `Feasible`.
/// - Domains are explicit value lists, so very wide domains are slow.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktrackingSolver;

impl BacktrackingSolver {
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for BacktrackingSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        if let Err(reason) = model.validate() {
            warn!("model '{}' rejected: {reason}", model.name);
            return CpSolution::empty(SolverStatus::ModelInvalid);
        }

        let start_time = Instant::now();
        let deadline = config
            .time_limit_ms
            .map(|ms| start_time + Duration::from_millis(ms));
        let network = Network::compile(model);

        let mut root = State::new(&network);
        let consistent = network.root_consistent(&mut root);

        let outcome = if !consistent {
            Outcome::Exhausted(Stats::default())
        } else if config.num_workers > 1 {
            solve_parallel(&network, root, deadline, config)
        } else {
            let stop = AtomicBool::new(false);
            let mut search = Search::new(&network, deadline, &stop, config.seed);
            let result = search.run(root);
            search.finish(result)
        };

        let solve_time_ms = start_time.elapsed().as_millis() as u64;
        let (status, values, stats) = match outcome {
            Outcome::Found(values, stats) => (SolverStatus::Feasible, Some(values), stats),
            Outcome::Exhausted(stats) => (SolverStatus::Infeasible, None, stats),
            Outcome::TimedOut(stats) => (SolverStatus::Timeout, None, stats),
        };

        debug!(
            "model '{}': {} after {} nodes, {} failures, {} ms",
            model.name, status, stats.nodes, stats.failures, solve_time_ms
        );

        let int_vars = values
            .map(|vals| network.names.iter().cloned().zip(vals).collect())
            .unwrap_or_default();

        CpSolution {
            status,
            int_vars,
            solve_time_ms,
            nodes: stats.nodes,
            failures: stats.failures,
        }
    }
}

/// Constraint between variable indices.
#[derive(Debug, Clone)]
enum Relation {
    AllDifferent(Vec<usize>),
    Equal(usize, usize),
    NotEqual(usize, usize),
}

/// Index-based form of a model, built once per solve.
#[derive(Debug)]
struct Network {
    names: Vec<String>,
    initial: Vec<Vec<i64>>,
    relations: Vec<Relation>,
    /// For each variable, the relations it appears in.
    watches: Vec<Vec<usize>>,
}

impl Network {
    /// Compiles a validated model.
    fn compile(model: &CpModel) -> Self {
        let vars = model.int_vars();
        let names = vars.iter().map(|v| v.name.clone()).collect();
        let mut initial: Vec<Vec<i64>> = vars.iter().map(|v| v.values()).collect();
        let mut relations = Vec::new();
        let idx = |name: &str| model.var_index(name).unwrap_or_default();

        for constraint in model.constraints() {
            match constraint {
                Constraint::AllDifferent { vars } => {
                    relations.push(Relation::AllDifferent(vars.iter().map(|n| idx(n)).collect()));
                }
                Constraint::Equal { left, right } => {
                    relations.push(Relation::Equal(idx(left), idx(right)));
                }
                Constraint::NotEqual { left, right } => {
                    relations.push(Relation::NotEqual(idx(left), idx(right)));
                }
                Constraint::Fixed { var, value } => {
                    initial[idx(var)].retain(|v| v == value);
                }
            }
        }

        let mut watches = vec![Vec::new(); vars.len()];
        for (r, relation) in relations.iter().enumerate() {
            match relation {
                Relation::AllDifferent(members) => {
                    for &m in members {
                        watches[m].push(r);
                    }
                }
                Relation::Equal(a, b) | Relation::NotEqual(a, b) => {
                    watches[*a].push(r);
                    if a != b {
                        watches[*b].push(r);
                    }
                }
            }
        }

        Self {
            names,
            initial,
            relations,
            watches,
        }
    }

    /// Propagates every variable that is fixed before search starts.
    fn root_consistent(&self, state: &mut State) -> bool {
        if state.domains.iter().any(Vec::is_empty) {
            return false;
        }
        // x != x can never hold.
        if self
            .relations
            .iter()
            .any(|r| matches!(r, Relation::NotEqual(a, b) if a == b))
        {
            return false;
        }
        let singletons: Vec<usize> = (0..state.domains.len())
            .filter(|&i| state.domains[i].len() == 1)
            .collect();
        self.propagate(state, singletons)
    }

    /// Forward checking from newly fixed variables until fixpoint.
    ///
    /// Returns `false` when some domain becomes empty.
    fn propagate(&self, state: &mut State, mut queue: Vec<usize>) -> bool {
        while let Some(var) = queue.pop() {
            if state.settled[var] {
                continue;
            }
            state.settled[var] = true;
            let value = state.domains[var][0];

            for &r in &self.watches[var] {
                match &self.relations[r] {
                    Relation::AllDifferent(members) => {
                        for &other in members.iter().filter(|&&m| m != var) {
                            if !state.restrict(other, |v| v != value, &mut queue) {
                                return false;
                            }
                        }
                    }
                    Relation::Equal(a, b) => {
                        let other = if *a == var { *b } else { *a };
                        if !state.restrict(other, |v| v == value, &mut queue) {
                            return false;
                        }
                    }
                    Relation::NotEqual(a, b) => {
                        let other = if *a == var { *b } else { *a };
                        if !state.restrict(other, |v| v != value, &mut queue) {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }
}

/// Current domains plus which fixed variables have been propagated.
#[derive(Debug, Clone)]
struct State {
    domains: Vec<Vec<i64>>,
    settled: Vec<bool>,
}

impl State {
    fn new(network: &Network) -> Self {
        Self {
            domains: network.initial.clone(),
            settled: vec![false; network.initial.len()],
        }
    }

    /// Filters a domain, queueing the variable if it becomes fixed.
    fn restrict(&mut self, var: usize, keep: impl Fn(i64) -> bool, queue: &mut Vec<usize>) -> bool {
        let domain = &mut self.domains[var];
        let before = domain.len();
        domain.retain(|&v| keep(v));
        match domain.len() {
            0 => false,
            1 if before > 1 => {
                queue.push(var);
                true
            }
            _ => true,
        }
    }

    /// Minimum-remaining-values choice among unfixed variables.
    fn select(&self) -> Option<usize> {
        self.domains
            .iter()
            .enumerate()
            .filter(|(_, d)| d.len() > 1)
            .min_by_key(|(i, d)| (d.len(), *i))
            .map(|(i, _)| i)
    }

    /// Copy of this state with `var` fixed to `value`, propagated.
    fn branch(&self, network: &Network, var: usize, value: i64) -> Option<State> {
        let mut child = self.clone();
        child.domains[var] = vec![value];
        network.propagate(&mut child, vec![var]).then_some(child)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Stats {
    nodes: u64,
    failures: u64,
}

impl Stats {
    fn merge(self, other: Stats) -> Stats {
        Stats {
            nodes: self.nodes + other.nodes,
            failures: self.failures + other.failures,
        }
    }
}

enum Outcome {
    Found(Vec<i64>, Stats),
    Exhausted(Stats),
    TimedOut(Stats),
}

enum Step {
    Found(Vec<i64>),
    Exhausted,
    Interrupted,
}

/// Clock checks happen every 256 nodes.
const CLOCK_CHECK_MASK: u64 = 0xFF;

struct Search<'a> {
    network: &'a Network,
    deadline: Option<Instant>,
    stop: &'a AtomicBool,
    rng: Option<StdRng>,
    stats: Stats,
    timed_out: bool,
}

impl<'a> Search<'a> {
    fn new(
        network: &'a Network,
        deadline: Option<Instant>,
        stop: &'a AtomicBool,
        seed: Option<u64>,
    ) -> Self {
        Self {
            network,
            deadline,
            stop,
            rng: seed.map(StdRng::seed_from_u64),
            stats: Stats::default(),
            timed_out: false,
        }
    }

    fn run(&mut self, state: State) -> Step {
        self.stats.nodes += 1;

        if self.stop.load(Ordering::Relaxed) {
            return Step::Interrupted;
        }
        if self.stats.nodes & CLOCK_CHECK_MASK == 1 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    self.timed_out = true;
                    self.stop.store(true, Ordering::Relaxed);
                    return Step::Interrupted;
                }
            }
        }

        let Some(var) = state.select() else {
            return Step::Found(state.domains.iter().map(|d| d[0]).collect());
        };

        let mut values = state.domains[var].clone();
        if let Some(rng) = self.rng.as_mut() {
            values.shuffle(rng);
        }

        for value in values {
            match state.branch(self.network, var, value) {
                Some(child) => match self.run(child) {
                    Step::Exhausted => {}
                    other => return other,
                },
                None => self.stats.failures += 1,
            }
        }
        Step::Exhausted
    }

    fn finish(&self, step: Step) -> Outcome {
        match step {
            Step::Found(values) => Outcome::Found(values, self.stats),
            Step::Exhausted => Outcome::Exhausted(self.stats),
            Step::Interrupted if self.timed_out => Outcome::TimedOut(self.stats),
            // Interrupted without a deadline only happens in parallel mode.
            Step::Interrupted => Outcome::Exhausted(self.stats),
        }
    }
}

/// Explores the root variable's values concurrently.
fn solve_parallel(
    network: &Network,
    root: State,
    deadline: Option<Instant>,
    config: &SolverConfig,
) -> Outcome {
    let stop = AtomicBool::new(false);

    let Some(var) = root.select() else {
        let mut search = Search::new(network, deadline, &stop, config.seed);
        let step = search.run(root);
        return search.finish(step);
    };

    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.num_workers)
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            warn!("falling back to sequential search: {e}");
            let mut search = Search::new(network, deadline, &stop, config.seed);
            let step = search.run(root);
            return search.finish(step);
        }
    };

    let values = root.domains[var].clone();
    let results: Vec<(Step, Stats, bool)> = pool.install(|| {
        values
            .par_iter()
            .enumerate()
            .map(|(i, &value)| {
                let seed = config.seed.map(|s| s.wrapping_add(i as u64));
                let mut search = Search::new(network, deadline, &stop, seed);
                let step = match root.branch(network, var, value) {
                    Some(child) => search.run(child),
                    None => {
                        search.stats.failures += 1;
                        Step::Exhausted
                    }
                };
                if matches!(step, Step::Found(_)) {
                    stop.store(true, Ordering::Relaxed);
                }
                (step, search.stats, search.timed_out)
            })
            .collect()
    });

    let mut stats = Stats {
        nodes: 1,
        failures: 0,
    };
    let mut found = None;
    let mut timed_out = false;
    for (step, branch_stats, branch_timed_out) in results {
        stats = stats.merge(branch_stats);
        timed_out |= branch_timed_out;
        if let Step::Found(values) = step {
            found.get_or_insert(values);
        }
    }

    match found {
        Some(values) => Outcome::Found(values, stats),
        None if timed_out => Outcome::TimedOut(stats),
        None => Outcome::Exhausted(stats),
    }
}
