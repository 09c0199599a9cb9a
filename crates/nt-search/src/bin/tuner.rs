//! Tuning driver: builds the agent's parameter space, runs the selected
//! search strategy against the external tournament harness, and persists a
//! ranked report.
//!
//! Configured entirely through `NT_*` environment variables; see `cfg_*`
//! helpers for defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use nt_harness::{Evaluator, HarnessPaths};
use nt_search::{BayesianSearch, FailurePolicy, RandomSearch, SearchSession, SearchStrategy};
use nt_types::ParameterSpace;

fn cfg_str(env_key: &str, default: &str) -> String {
    env::var(env_key).unwrap_or_else(|_| default.to_string())
}

fn cfg_usize(env_key: &str, default: usize) -> usize {
    env::var(env_key)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(default)
}

fn cfg_u64(env_key: &str, default: u64) -> u64 {
    env::var(env_key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default)
}

fn cfg_bool(env_key: &str, default: bool) -> bool {
    env::var(env_key)
        .ok()
        .and_then(|s| s.parse::<bool>().ok())
        .unwrap_or(default)
}

/// The six tunable hyperparameters of the negotiation agent.
fn agent_space() -> ParameterSpace {
    ParameterSpace::new()
        .add_grid_step("finishTime", 0.0, 1.0, 0.01)
        .add_grid_step("giveUpTime", 0.0, 1.0, 0.01)
        .add_grid_step("transitionTime", 0.0, 1.0, 0.01)
        .add_grid_step("boulwareBeta", 0.0, 1.0, 0.01)
        .add_grid_step("reservationValue", 0.0, 1.0, 0.01)
        .add_grid_step("maxListSize", 50.0, 490.0, 10.0)
}

fn paths_from_env() -> HarnessPaths {
    let mut paths = HarnessPaths::default();
    if let Ok(jar) = env::var("NT_ENGINE_JAR") {
        paths.engine_jar = PathBuf::from(jar);
    }
    if let Ok(jar) = env::var("NT_AGENT_JAR") {
        paths.agent_jar = PathBuf::from(jar);
    }
    if let Ok(tournament) = env::var("NT_TOURNAMENT") {
        paths.tournament_file = tournament;
    }
    if let Ok(dir) = env::var("NT_LOG_DIR") {
        paths.log_dir = PathBuf::from(dir);
    }
    if let Ok(java) = env::var("NT_JAVA") {
        paths.java_bin = java;
    }
    paths
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let strategy = cfg_str("NT_STRATEGY", "bayesian");
    let budget = cfg_usize("NT_BUDGET", 250);
    let seed = cfg_u64("NT_SEED", 1);
    let agent_name = cfg_str("NT_AGENT", "TunedAgent");
    let report_path = PathBuf::from(cfg_str("NT_REPORT", "search_results.txt"));
    let failure_policy = if cfg_bool("NT_SKIP_FAILURES", false) {
        FailurePolicy::SkipIteration
    } else {
        FailurePolicy::AbortSession
    };

    let space = agent_space();
    let mut evaluator = Evaluator::new(space.clone(), paths_from_env(), agent_name)?
        .with_rebuild(cfg_bool("NT_REBUILD", false));
    if let Ok(secs) = env::var("NT_TIMEOUT_SECS") {
        if let Ok(secs) = secs.parse::<u64>() {
            evaluator = evaluator.with_timeout(Duration::from_secs(secs));
        }
    }

    let session: SearchSession = match strategy.as_str() {
        "random" => RandomSearch::new(space, evaluator)
            .with_seed(seed)
            .with_failure_policy(failure_policy)
            .run(budget)?,
        "bayesian" => BayesianSearch::new(space, evaluator)
            .with_seed(seed)
            .with_init_points(cfg_usize("NT_INIT_POINTS", 50))
            .with_failure_policy(failure_policy)
            .run(budget)?,
        other => anyhow::bail!("unknown strategy {other:?} (expected \"random\" or \"bayesian\")"),
    };

    session.store.persist(&report_path)?;
    info!(
        session = %session.id,
        evaluations = session.len(),
        report = %report_path.display(),
        "search complete"
    );
    if let Some(best) = session.best() {
        info!(utility = best.utility, configuration = %best.configuration, "best configuration");
    }
    Ok(())
}
