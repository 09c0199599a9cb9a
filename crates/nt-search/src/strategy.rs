//! Search strategies driving the evaluate-and-record loop.

use chrono::Utc;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use nt_harness::Evaluate;
use nt_types::{
    grid_points, Configuration, EvaluationResult, ParameterDomain, ParameterSpace, TunerError,
    TunerResult,
};

use crate::store::{ResultStore, SearchSession};
use crate::surrogate::GaussianProcess;

/// What to do when a single evaluation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the whole session on the first failure (the default).
    AbortSession,
    /// Log the failure and move on; the iteration still consumes budget and
    /// records nothing.
    SkipIteration,
}

/// Common contract for all search strategies: perform `budget` evaluations,
/// each through the evaluator, and return the recorded session.
pub trait SearchStrategy {
    fn run(&mut self, budget: usize) -> TunerResult<SearchSession>;

    /// Human-readable strategy name.
    fn name(&self) -> &str;
}

fn handle_failure(policy: FailurePolicy, iteration: usize, error: TunerError) -> TunerResult<()> {
    match policy {
        FailurePolicy::AbortSession => Err(error),
        FailurePolicy::SkipIteration => {
            warn!(iteration, %error, "evaluation failed; skipping iteration");
            Ok(())
        }
    }
}

// ---- Random search ----

/// Pure exploration: every iteration draws each parameter independently and
/// uniformly from its grid, conditioning on nothing.
///
/// Continuous ranges are discretized on a fixed `grid_step` grid first, so
/// every draw is a member of a finite candidate set.
pub struct RandomSearch<E: Evaluate> {
    space: ParameterSpace,
    evaluator: E,
    grid_step: f64,
    failure_policy: FailurePolicy,
    rng: ChaCha8Rng,
    next_run_id: u64,
}

impl<E: Evaluate> RandomSearch<E> {
    pub const DEFAULT_GRID_STEP: f64 = 0.01;

    pub fn new(space: ParameterSpace, evaluator: E) -> Self {
        Self {
            space,
            evaluator,
            grid_step: Self::DEFAULT_GRID_STEP,
            failure_policy: FailurePolicy::AbortSession,
            rng: ChaCha8Rng::from_entropy(),
            next_run_id: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn with_grid_step(mut self, step: f64) -> Self {
        self.grid_step = step;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// One candidate-value axis per parameter, in declaration order.
    fn build_axes(&self) -> Vec<(String, Vec<f64>)> {
        self.space
            .parameters
            .iter()
            .map(|param| {
                let values = match &param.domain {
                    ParameterDomain::Grid { values } => values.clone(),
                    ParameterDomain::Range { low, high } => {
                        grid_points(*low, *high, self.grid_step)
                    }
                };
                (param.name.clone(), values)
            })
            .collect()
    }
}

impl<E: Evaluate> SearchStrategy for RandomSearch<E> {
    fn run(&mut self, budget: usize) -> TunerResult<SearchSession> {
        self.space.check()?;
        let started_at = Utc::now();
        let axes = self.build_axes();
        let mut store = ResultStore::new();

        info!(budget, "starting random search");
        for iteration in 0..budget {
            let configuration: Configuration = axes
                .iter()
                .map(|(name, values)| {
                    let value = values[self.rng.gen_range(0..values.len())];
                    (name.clone(), value)
                })
                .collect();

            let run_id = self.next_run_id;
            self.next_run_id += 1;
            match self.evaluator.evaluate(&configuration, run_id) {
                Ok(utility) => {
                    debug!(iteration, utility, %configuration, "recorded evaluation");
                    store.record(EvaluationResult {
                        configuration,
                        utility,
                    });
                }
                Err(error) => handle_failure(self.failure_policy, iteration, error)?,
            }
        }

        let session = SearchSession::new(self.name(), started_at, store);
        if let Some(best) = session.best() {
            info!(utility = best.utility, configuration = %best.configuration, "random search finished");
        }
        Ok(session)
    }

    fn name(&self) -> &str {
        "random"
    }
}

// ---- Bayesian search ----

/// Sequential model-based optimization over the continuous relaxation of the
/// parameter space.
///
/// The first `init_points` proposals are uniform random draws to seed the
/// surrogate; each following proposal maximizes the UCB acquisition over the
/// current Gaussian-process posterior and the surrogate is refit after every
/// observation. Discrete domains take part as continuous intervals and every
/// proposal is projected back into its domain before evaluation.
pub struct BayesianSearch<E: Evaluate> {
    space: ParameterSpace,
    evaluator: E,
    init_points: usize,
    kappa: f64,
    candidates: usize,
    failure_policy: FailurePolicy,
    rng: ChaCha8Rng,
    next_run_id: u64,
}

impl<E: Evaluate> BayesianSearch<E> {
    pub const DEFAULT_INIT_POINTS: usize = 5;
    pub const DEFAULT_KAPPA: f64 = 2.0;
    const ACQUISITION_CANDIDATES: usize = 1000;

    pub fn new(space: ParameterSpace, evaluator: E) -> Self {
        Self {
            space,
            evaluator,
            init_points: Self::DEFAULT_INIT_POINTS,
            kappa: Self::DEFAULT_KAPPA,
            candidates: Self::ACQUISITION_CANDIDATES,
            failure_policy: FailurePolicy::AbortSession,
            rng: ChaCha8Rng::from_entropy(),
            next_run_id: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    /// Number of purely random seed evaluations before the surrogate takes
    /// over. The remainder of the budget is acquisition-driven.
    pub fn with_init_points(mut self, init_points: usize) -> Self {
        self.init_points = init_points;
        self
    }

    /// UCB exploration weight: higher favors uncertain regions.
    pub fn with_kappa(mut self, kappa: f64) -> Self {
        self.kappa = kappa;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    fn random_unit_point(&mut self) -> Vec<f64> {
        (0..self.space.len()).map(|_| self.rng.gen::<f64>()).collect()
    }

    /// Argmax of the acquisition over a uniform candidate set.
    fn maximize_acquisition(&mut self, gp: &GaussianProcess) -> Vec<f64> {
        let mut best_point = self.random_unit_point();
        let mut best_score = gp.upper_confidence_bound(&best_point, self.kappa);
        for _ in 1..self.candidates {
            let point = self.random_unit_point();
            let score = gp.upper_confidence_bound(&point, self.kappa);
            if score > best_score {
                best_score = score;
                best_point = point;
            }
        }
        best_point
    }

    /// Map a unit-cube point onto the parameter domains: scale onto each
    /// continuous relaxation, then project into the declared domain.
    fn to_configuration(&self, unit: &[f64]) -> (Configuration, Vec<f64>) {
        let mut configuration = Configuration::new();
        let mut projected_unit = Vec::with_capacity(unit.len());
        for (coordinate, param) in unit.iter().zip(&self.space.parameters) {
            let (low, high) = param.domain.bounds();
            let raw = low + coordinate * (high - low);
            let value = param.domain.project(raw);
            configuration.set(param.name.clone(), value);
            // Re-normalize what was actually evaluated so the surrogate
            // learns the projected point, not the intent.
            let span = high - low;
            projected_unit.push(if span > 0.0 { (value - low) / span } else { 0.5 });
        }
        (configuration, projected_unit)
    }
}

impl<E: Evaluate> SearchStrategy for BayesianSearch<E> {
    fn run(&mut self, budget: usize) -> TunerResult<SearchSession> {
        self.space.check()?;
        let started_at = Utc::now();
        let mut store = ResultStore::new();
        let mut observed_inputs: Vec<Vec<f64>> = Vec::new();
        let mut observed_utilities: Vec<f64> = Vec::new();

        info!(budget, init_points = self.init_points, "starting bayesian search");
        for iteration in 0..budget {
            let surrogate = if iteration < self.init_points {
                None
            } else {
                GaussianProcess::fit(
                    observed_inputs.clone(),
                    &observed_utilities,
                    GaussianProcess::DEFAULT_LENGTH_SCALE,
                    GaussianProcess::DEFAULT_NOISE,
                )
            };
            let unit = match &surrogate {
                Some(gp) => self.maximize_acquisition(gp),
                None => self.random_unit_point(),
            };
            let (configuration, projected_unit) = self.to_configuration(&unit);

            let run_id = self.next_run_id;
            self.next_run_id += 1;
            match self.evaluator.evaluate(&configuration, run_id) {
                Ok(utility) => {
                    debug!(
                        iteration,
                        utility,
                        guided = surrogate.is_some(),
                        %configuration,
                        "recorded evaluation"
                    );
                    observed_inputs.push(projected_unit);
                    observed_utilities.push(utility);
                    store.record(EvaluationResult {
                        configuration,
                        utility,
                    });
                }
                Err(error) => handle_failure(self.failure_policy, iteration, error)?,
            }
        }

        let session = SearchSession::new(self.name(), started_at, store);
        if let Some(best) = session.best() {
            info!(utility = best.utility, configuration = %best.configuration, "bayesian search finished");
        }
        Ok(session)
    }

    fn name(&self) -> &str {
        "bayesian"
    }
}
