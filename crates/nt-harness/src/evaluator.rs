//! One evaluation cycle: configuration in, scalar utility out.

use std::fs;
use std::process::{Command, ExitStatus};
use std::time::{Duration, Instant};

use nt_types::{Configuration, EvaluationError, ParameterSpace, TunerResult};
use tracing::{debug, info, warn};

use crate::log::sum_agent_utility;
use crate::paths::HarnessPaths;
use crate::properties::write_properties;

/// The seam between search strategies and the external harness.
///
/// Strategies drive any `Evaluate` implementation; tests substitute stubs so
/// the search loop can be exercised without a JVM.
pub trait Evaluate {
    /// Score one configuration. `run_id` keys the harness's result log so
    /// retried or successive evaluations never collide on the same file.
    fn evaluate(&mut self, config: &Configuration, run_id: u64) -> TunerResult<f64>;
}

/// Evaluates a configuration by running one full tournament against the
/// external harness.
///
/// Strictly sequential: each call blocks until the harness exits and its log
/// is parsed. The harness reads the shared properties file at startup, so a
/// second evaluation must not begin while one is in flight.
pub struct Evaluator {
    space: ParameterSpace,
    paths: HarnessPaths,
    agent_name: String,
    rebuild: bool,
    timeout: Option<Duration>,
}

impl Evaluator {
    pub fn new(
        space: ParameterSpace,
        paths: HarnessPaths,
        agent_name: impl Into<String>,
    ) -> TunerResult<Self> {
        space.check()?;
        fs::create_dir_all(&paths.log_dir)?;
        if let Some(parent) = paths.properties_path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            space,
            paths,
            agent_name: agent_name.into(),
            rebuild: false,
            timeout: None,
        })
    }

    /// Rebuild the agent jar (`mvn clean package`) before each evaluation.
    /// Off by default; tuning runs against a prebuilt jar.
    pub fn with_rebuild(mut self, rebuild: bool) -> Self {
        self.rebuild = rebuild;
        self
    }

    /// Kill the harness and fail the evaluation if it runs longer than
    /// `timeout`. Without this the invocation blocks indefinitely.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn rebuild_agent(&self) -> TunerResult<()> {
        info!("rebuilding agent jar before evaluation");
        let status = Command::new("mvn")
            .args(["clean", "package"])
            .status()
            .map_err(|e| spawn_error("mvn clean package", &e))?;
        if !status.success() {
            return Err(EvaluationError::BuildFailed {
                status: status.code().unwrap_or(-1),
            }
            .into());
        }
        Ok(())
    }

    fn run_harness(&self, run_id: u64) -> TunerResult<()> {
        let mut command = Command::new(&self.paths.java_bin);
        command
            .arg("-cp")
            .arg(self.paths.classpath())
            .arg(&self.paths.runner_class)
            .arg(&self.paths.tournament_file)
            .arg(self.paths.log_stem(run_id));
        debug!(run_id, java = %self.paths.java_bin, "launching tournament harness");

        let status = match self.timeout {
            None => command
                .status()
                .map_err(|e| spawn_error(&self.paths.java_bin, &e))?,
            Some(limit) => self.wait_with_timeout(command, limit)?,
        };

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            warn!(run_id, status = code, "harness exited abnormally");
            return Err(EvaluationError::NonZeroExit { status: code }.into());
        }
        Ok(())
    }

    fn wait_with_timeout(&self, mut command: Command, limit: Duration) -> TunerResult<ExitStatus> {
        let mut child = command
            .spawn()
            .map_err(|e| spawn_error(&self.paths.java_bin, &e))?;
        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if started.elapsed() >= limit {
                let _ = child.kill();
                let _ = child.wait();
                warn!(seconds = limit.as_secs(), "harness timed out; killed");
                return Err(EvaluationError::Timeout {
                    seconds: limit.as_secs(),
                }
                .into());
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    }
}

impl Evaluate for Evaluator {
    fn evaluate(&mut self, config: &Configuration, run_id: u64) -> TunerResult<f64> {
        self.space.validate(config)?;
        write_properties(&self.paths.properties_path, config)?;
        debug!(run_id, %config, "wrote candidate configuration");

        if self.rebuild {
            self.rebuild_agent()?;
        }
        self.run_harness(run_id)?;

        let utility = sum_agent_utility(&self.paths.log_path(run_id), &self.agent_name)?;
        info!(run_id, utility, "evaluation finished");
        Ok(utility)
    }
}

fn spawn_error(command: &str, error: &std::io::Error) -> EvaluationError {
    EvaluationError::Spawn {
        command: command.to_string(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nt_types::{ParameterError, TunerError};

    fn space() -> ParameterSpace {
        ParameterSpace::new()
            .add_grid_step("finishTime", 0.0, 1.0, 0.01)
            .add_grid_step("maxListSize", 50.0, 490.0, 10.0)
    }

    fn config() -> Configuration {
        let mut config = Configuration::new();
        config.set("finishTime", 0.95);
        config.set("maxListSize", 120.0);
        config
    }

    fn paths_in(dir: &std::path::Path) -> HarnessPaths {
        HarnessPaths::default().rooted_at(dir)
    }

    #[test]
    fn invalid_configuration_is_rejected_before_any_side_effect() {
        let dir = tempfile::tempdir().unwrap();
        let paths = paths_in(dir.path());
        let properties_path = paths.properties_path.clone();
        let mut evaluator = Evaluator::new(space(), paths, "TunedAgent").unwrap();

        let mut bad = config();
        bad.set("finishTime", 3.0);
        match evaluator.evaluate(&bad, 0) {
            Err(TunerError::Parameter(ParameterError::OutOfDomain { name, .. })) => {
                assert_eq!(name, "finishTime")
            }
            other => panic!("expected out-of-domain error, got {other:?}"),
        }
        assert!(!properties_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_fails_the_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = paths_in(dir.path());
        paths.java_bin = "false".to_string();
        let mut evaluator = Evaluator::new(space(), paths, "TunedAgent").unwrap();

        assert!(matches!(
            evaluator.evaluate(&config(), 1),
            Err(TunerError::Evaluation(EvaluationError::NonZeroExit { .. }))
        ));
    }

    #[test]
    fn missing_java_binary_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = paths_in(dir.path());
        paths.java_bin = "definitely-not-a-jvm".to_string();
        let mut evaluator = Evaluator::new(space(), paths, "TunedAgent").unwrap();

        assert!(matches!(
            evaluator.evaluate(&config(), 2),
            Err(TunerError::Evaluation(EvaluationError::Spawn { .. }))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn successful_run_parses_the_run_indexed_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = paths_in(dir.path());
        // Stand in for the harness: exit 0 and rely on a pre-written log.
        paths.java_bin = "true".to_string();
        fs::create_dir_all(&paths.log_dir).unwrap();
        fs::write(
            paths.log_path(3),
            "banner\nAgent 1;Agent 2;Utility 1;Utility 2\nTunedAgent@1;Boulware;0.3;0.1\nRival;TunedAgent@2;0.0;0.5\n",
        )
        .unwrap();

        let properties_path = paths.properties_path.clone();
        let mut evaluator = Evaluator::new(space(), paths, "TunedAgent").unwrap();
        let utility = evaluator.evaluate(&config(), 3).unwrap();
        assert!((utility - 0.8).abs() < 1e-12);

        // The candidate was persisted for the harness-side agent to read.
        let written = crate::properties::read_properties(&properties_path).unwrap();
        assert_eq!(written, config());
    }

    #[cfg(unix)]
    #[test]
    fn timeout_kills_the_harness() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let mut paths = paths_in(dir.path());

        // Stand-in harness that hangs regardless of its arguments.
        let script = dir.path().join("slow-harness.sh");
        fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        paths.java_bin = script.display().to_string();

        let mut evaluator = Evaluator::new(space(), paths, "TunedAgent")
            .unwrap()
            .with_timeout(Duration::from_millis(200));

        let started = Instant::now();
        let result = evaluator.evaluate(&config(), 4);
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(matches!(
            result,
            Err(TunerError::Evaluation(EvaluationError::Timeout { .. }))
        ));
    }
}
