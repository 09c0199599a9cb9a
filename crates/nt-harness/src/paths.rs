//! On-disk locations of everything the external harness touches.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Explicit path and classpath configuration for one tuning run.
///
/// Everything the evaluator needs to find on disk lives here, passed into
/// constructors instead of living in module-level globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessPaths {
    /// Resource directory the agent reads its properties file from; also on
    /// the classpath so the harness-side agent sees the same file.
    pub resources_dir: PathBuf,
    /// The shared hyperparameter properties file (overwritten per evaluation).
    pub properties_path: PathBuf,
    /// Tournament engine jar.
    pub engine_jar: PathBuf,
    /// The compiled agent-under-test jar.
    pub agent_jar: PathBuf,
    /// Tournament descriptor passed to the harness entry point.
    pub tournament_file: String,
    /// Directory receiving run-indexed result logs.
    pub log_dir: PathBuf,
    /// Java executable used to launch the harness.
    pub java_bin: String,
    /// Fully qualified main class of the harness entry point.
    pub runner_class: String,
}

impl Default for HarnessPaths {
    fn default() -> Self {
        let resources_dir = PathBuf::from("src/main/resources");
        Self {
            properties_path: resources_dir.join("hyperparameter.properties"),
            resources_dir,
            engine_jar: PathBuf::from("lib/genius-10.4.jar"),
            agent_jar: PathBuf::from("target/agent-jar-with-dependencies.jar"),
            tournament_file: "multilateraltournament_3.xml".to_string(),
            log_dir: PathBuf::from("log"),
            java_bin: "java".to_string(),
            runner_class: "genius.cli.Runner".to_string(),
        }
    }
}

impl HarnessPaths {
    /// Classpath for the harness JVM, joined with the platform separator.
    pub fn classpath(&self) -> String {
        let separator = if cfg!(windows) { ";" } else { ":" };
        [&self.resources_dir, &self.engine_jar, &self.agent_jar]
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Log path stem handed to the harness; it appends the `.csv` extension
    /// itself.
    pub fn log_stem(&self, run_id: u64) -> PathBuf {
        self.log_dir.join(format!("log{run_id}"))
    }

    /// The run-indexed result log the harness writes for `run_id`.
    pub fn log_path(&self, run_id: u64) -> PathBuf {
        self.log_dir.join(format!("log{run_id}.csv"))
    }

    /// Re-root every relative path under `base` (useful for tests and for
    /// running the tuner outside the agent's project directory).
    pub fn rooted_at(mut self, base: &Path) -> Self {
        self.resources_dir = base.join(&self.resources_dir);
        self.properties_path = base.join(&self.properties_path);
        self.engine_jar = base.join(&self.engine_jar);
        self.agent_jar = base.join(&self.agent_jar);
        self.log_dir = base.join(&self.log_dir);
        self
    }
}
