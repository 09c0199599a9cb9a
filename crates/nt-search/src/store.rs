//! Result accumulation, ranking, and report persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

use nt_types::{EvaluationResult, TunerResult};

/// All (configuration, utility) pairs recorded during one search run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultStore {
    results: Vec<EvaluationResult>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: EvaluationResult) {
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Recorded results in evaluation order.
    pub fn results(&self) -> &[EvaluationResult] {
        &self.results
    }

    /// The maximum-utility result; the earliest one on ties.
    pub fn best(&self) -> Option<&EvaluationResult> {
        self.results.iter().fold(None, |best, candidate| match best {
            Some(current) if candidate.utility <= current.utility => Some(current),
            _ => Some(candidate),
        })
    }

    /// Results sorted by descending utility. The sort is stable, so equal
    /// utilities keep their recording order.
    pub fn ranked(&self) -> Vec<&EvaluationResult> {
        let mut ranked: Vec<&EvaluationResult> = self.results.iter().collect();
        ranked.sort_by(|a, b| {
            b.utility
                .partial_cmp(&a.utility)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    /// Write a human-readable report: one block per result in ranked order.
    pub fn persist(&self, destination: &Path) -> TunerResult<()> {
        let mut file = File::create(destination)?;
        for result in self.ranked() {
            writeln!(file, "{}", result.configuration)?;
            writeln!(file, "{}", result.utility)?;
            writeln!(file, "-------------------------")?;
        }
        Ok(())
    }
}

/// The artifact of one complete search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSession {
    pub id: Uuid,
    /// Which strategy produced this session ("random" or "bayesian").
    pub strategy: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub store: ResultStore,
}

impl SearchSession {
    pub fn new(strategy: &str, started_at: DateTime<Utc>, store: ResultStore) -> Self {
        Self {
            id: Uuid::new_v4(),
            strategy: strategy.to_string(),
            started_at,
            finished_at: Utc::now(),
            store,
        }
    }

    pub fn best(&self) -> Option<&EvaluationResult> {
        self.store.best()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Serialize the full session (results in evaluation order) as JSON.
    pub fn save_json(&self, destination: &Path) -> TunerResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(destination, json)?;
        Ok(())
    }
}
