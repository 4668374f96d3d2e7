use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

/// Tunables for a [`crate::runtime::ScenarioSimulator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// 0 is fully risk-averse, 1 fully risk-seeking.
    pub risk_tolerance: f64,
    /// Fixed run seed; a fresh random seed is drawn per run when absent.
    pub seed: Option<u64>,
    /// Blocking workers used by parallel runs.
    pub workers: usize,
    /// Run summaries retained in memory.
    pub history_capacity: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            risk_tolerance: 0.5,
            seed: None,
            workers: 4,
            history_capacity: 64,
        }
    }
}

impl SimulatorConfig {
    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self, SimulationError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values outside their allowed ranges.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(0.0..=1.0).contains(&self.risk_tolerance) {
            return Err(SimulationError::InvalidConfig(format!(
                "risk_tolerance must be within [0, 1], got {}",
                self.risk_tolerance
            )));
        }
        if self.workers == 0 {
            return Err(SimulationError::InvalidConfig(
                "workers must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
