use serde::{Deserialize, Serialize};

/// Supported run modes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Sample each action's success independently, N times.
    MonteCarlo,
    /// One path per fixed scenario in [`DeterministicScenario::ALL`].
    Deterministic,
}

impl SimulationMode {
    /// Label for logging.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::MonteCarlo => "monte_carlo",
            Self::Deterministic => "deterministic",
        }
    }
}

/// Fixed scenario used by [`SimulationMode::Deterministic`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeterministicScenario {
    /// Path id given to the scenario's path.
    pub label: &'static str,
    /// Success rate applied to every action.
    pub success_rate: f64,
}

impl DeterministicScenario {
    /// Everything succeeds.
    pub const OPTIMISTIC: Self = Self {
        label: "optimistic",
        success_rate: 1.0,
    };
    /// Typical success rate.
    pub const REALISTIC: Self = Self {
        label: "realistic",
        success_rate: 0.8,
    };
    /// Coin-flip success rate.
    pub const PESSIMISTIC: Self = Self {
        label: "pessimistic",
        success_rate: 0.5,
    };

    /// Scenarios in the order their paths are produced.
    pub const ALL: [Self; 3] = [Self::OPTIMISTIC, Self::REALISTIC, Self::PESSIMISTIC];

    /// Risk score assigned to the scenario's path.
    #[must_use]
    pub fn risk_score(self) -> f64 {
        1.0 - self.success_rate
    }
}
