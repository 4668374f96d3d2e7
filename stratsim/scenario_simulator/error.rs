use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while configuring a simulator.
///
/// Running a simulation never fails on plan data; these only surface from
/// [`crate::runtime::ScenarioSimulatorBuilder::build`] and config loading.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// A configuration value is outside its allowed range.
    #[error("invalid simulator config: {0}")]
    InvalidConfig(String),
    /// Config payload could not be parsed.
    #[error("config parse failure: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

/// Why an action's dependencies could not be honored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedCause {
    /// At least one dependency names an action that is not in the plan.
    Missing,
    /// The action is a member of a dependency cycle.
    Cycle,
    /// The action only waits on other unresolved actions.
    Blocked,
}

impl fmt::Display for UnresolvedCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("missing dependency"),
            Self::Cycle => f.write_str("dependency cycle"),
            Self::Blocked => f.write_str("blocked by unresolved dependency"),
        }
    }
}

/// An action was placed in the execution order before its dependencies.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("action `{action}` ordered without {unmet:?} ({cause})")]
pub struct UnresolvedDependency {
    /// Action that was force-appended.
    pub action: String,
    /// Dependencies not yet ordered when the action was appended.
    pub unmet: Vec<String>,
    /// Classification of the failure.
    pub cause: UnresolvedCause,
}

/// Failure reported by a single effect generator.
///
/// The cascader logs and drops these; they never abort a path.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EffectGeneratorError {
    /// The generator could not evaluate its rule.
    #[error("effect generator `{generator}` failed: {reason}")]
    Failed {
        /// Generator label.
        generator: String,
        /// Human readable detail.
        reason: String,
    },
    /// The generator produced an effect with out-of-range numbers.
    #[error(
        "effect generator `{generator}` produced out-of-range effect \
         (probability {probability}, impact {impact})"
    )]
    OutOfRange {
        /// Generator label.
        generator: String,
        /// Reported probability.
        probability: f64,
        /// Reported impact magnitude.
        impact: f64,
    },
}

impl EffectGeneratorError {
    /// Convenience constructor for [`EffectGeneratorError::Failed`].
    #[must_use]
    pub fn failed(generator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            generator: generator.into(),
            reason: reason.into(),
        }
    }
}
