//! # nt-search
//!
//! Hyperparameter search for the negotiation agent: random sampling over the
//! parameter grids and sequential model-based (Bayesian) optimization over
//! their continuous relaxation, with session tracking and ranked reports.

pub mod store;
pub mod strategy;
pub mod surrogate;

pub use store::{ResultStore, SearchSession};
pub use strategy::{BayesianSearch, FailurePolicy, RandomSearch, SearchStrategy};
pub use surrogate::GaussianProcess;
