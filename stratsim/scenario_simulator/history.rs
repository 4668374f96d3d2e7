use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{methods::SimulationMode, model::ScenarioResult};

/// Summary kept for each completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Run id.
    pub run_id: Uuid,
    /// Scenario name.
    pub scenario_name: String,
    /// Mode used.
    pub mode: SimulationMode,
    /// Number of paths produced.
    pub path_count: usize,
    /// Success rate logged.
    pub success_rate: f64,
    /// Expected value logged.
    pub expected_value: f64,
    /// Risk-adjusted value logged.
    pub risk_adjusted_value: f64,
    /// Recommended path id, if any.
    pub recommended_path: Option<String>,
    /// Whether ordering was degraded.
    pub degraded: bool,
    /// Timestamp when archived.
    pub recorded_at: DateTime<Utc>,
}

impl RunRecord {
    fn from_result(result: &ScenarioResult) -> Self {
        Self {
            run_id: result.run_id(),
            scenario_name: result.scenario_name().to_string(),
            mode: result.mode(),
            path_count: result.paths().len(),
            success_rate: result.success_rate(),
            expected_value: result.expected_value(),
            risk_adjusted_value: result.risk_adjusted_value(),
            recommended_path: result.recommended_path().map(|p| p.id().to_string()),
            degraded: result.is_degraded(),
            recorded_at: Utc::now(),
        }
    }
}

/// Bounded in-memory archive of past runs; the oldest record goes first.
#[derive(Debug, Default)]
pub struct SimulationHistory {
    records: VecDeque<RunRecord>,
    capacity: usize,
}

impl SimulationHistory {
    /// Creates archive with capacity. A capacity of zero keeps nothing.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Archives a result summary.
    pub fn push(&mut self, result: &ScenarioResult) {
        if self.capacity == 0 {
            return;
        }
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(RunRecord::from_result(result));
    }

    /// Last `limit` records for a scenario, newest first.
    #[must_use]
    pub fn history_for(&self, scenario_name: &str, limit: usize) -> Vec<RunRecord> {
        self.records
            .iter()
            .rev()
            .filter(|record| record.scenario_name == scenario_name)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Most recent record.
    #[must_use]
    pub fn latest(&self) -> Option<&RunRecord> {
        self.records.back()
    }

    /// Records retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing has been archived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(name: &str) -> ScenarioResult {
        ScenarioResult {
            run_id: Uuid::new_v4(),
            scenario_name: name.into(),
            mode: SimulationMode::MonteCarlo,
            seed: 1,
            risk_tolerance: 0.5,
            paths: Vec::new(),
            expected_value: 0.0,
            risk_adjusted_value: 0.0,
            success_rate: 0.0,
            average_cost: 0.0,
            average_duration: Duration::ZERO,
            recommended: None,
            unresolved: Vec::new(),
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn archive_tracks_history_per_scenario() {
        let mut history = SimulationHistory::new(4);
        history.push(&result("launch"));
        history.push(&result("migration"));
        history.push(&result("launch"));
        let launches = history.history_for("launch", 10);
        assert_eq!(launches.len(), 2);
        assert_eq!(history.latest().unwrap().scenario_name, "launch");
    }

    #[test]
    fn oldest_records_are_evicted() {
        let mut history = SimulationHistory::new(2);
        let first = result("a");
        history.push(&first);
        history.push(&result("b"));
        history.push(&result("c"));
        assert_eq!(history.len(), 2);
        assert!(history.history_for("a", 1).is_empty());
    }

    #[test]
    fn zero_capacity_keeps_nothing() {
        let mut history = SimulationHistory::new(0);
        history.push(&result("a"));
        assert!(history.is_empty());
    }
}
