//! # nt-harness
//!
//! The bridge between a candidate configuration and a scalar utility score:
//! writes the agent's hyperparameter properties file, invokes the external
//! tournament harness as a blocking subprocess, and parses the run-indexed
//! result log it produces.

pub mod evaluator;
pub mod log;
pub mod paths;
pub mod properties;

pub use evaluator::{Evaluate, Evaluator};
pub use paths::HarnessPaths;
pub use properties::{read_properties, write_properties};
