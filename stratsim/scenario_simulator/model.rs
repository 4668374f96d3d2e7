use std::{fmt, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    boundary::ApprovalInputs, effects::EffectGenerator, error::UnresolvedDependency,
    methods::SimulationMode, outcome,
};

fn default_success_probability() -> f64 {
    0.8
}

/// A single step of a plan.
#[derive(Clone, Serialize, Deserialize)]
pub struct Action {
    /// Unique name within the plan.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Time the action takes when it executes.
    #[serde(default)]
    pub duration: Duration,
    /// Cost incurred when it executes.
    #[serde(default)]
    pub cost: f64,
    /// Chance of success in `[0, 1]`.
    #[serde(default = "default_success_probability")]
    pub success_probability: f64,
    /// Names of actions that must have executed first.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Cascading effect generators evaluated after the action executes.
    #[serde(skip)]
    pub effect_generators: Vec<Arc<dyn EffectGenerator>>,
}

impl Action {
    /// Creates an action with no dependencies or generators.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        duration: Duration,
        cost: f64,
        success_probability: f64,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            duration,
            cost,
            success_probability,
            dependencies: Vec::new(),
            effect_generators: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds a dependency by name.
    #[must_use]
    pub fn depends_on(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    /// Attaches an effect generator.
    #[must_use]
    pub fn with_effect(mut self, generator: impl EffectGenerator + 'static) -> Self {
        self.effect_generators.push(Arc::new(generator));
        self
    }

    /// Cost as accumulated by a path; NaN and infinite costs count as zero.
    #[must_use]
    pub fn effective_cost(&self) -> f64 {
        if self.cost.is_finite() {
            self.cost
        } else {
            0.0
        }
    }

    /// Success probability clamped into `[0, 1]`; NaN counts as zero.
    #[must_use]
    pub fn effective_success_probability(&self) -> f64 {
        if self.success_probability.is_nan() {
            0.0
        } else {
            self.success_probability.clamp(0.0, 1.0)
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let generators: Vec<&str> = self.effect_generators.iter().map(|g| g.label()).collect();
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("duration", &self.duration)
            .field("cost", &self.cost)
            .field("success_probability", &self.success_probability)
            .field("dependencies", &self.dependencies)
            .field("effect_generators", &generators)
            .finish_non_exhaustive()
    }
}

/// Cascading consequence of an executed action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecondOrderEffect {
    /// Action that caused the effect.
    pub source_action: String,
    /// Human readable description.
    pub description: String,
    /// Likelihood in `[0, 1]`.
    pub probability: f64,
    /// Impact in `[-1, 1]`; negative is harmful.
    pub impact_magnitude: f64,
    /// Actions the effect bears on.
    pub affected_actions: Vec<String>,
}

impl SecondOrderEffect {
    /// Creates an effect, clamping probability and impact into range.
    #[must_use]
    pub fn new(
        source_action: impl Into<String>,
        description: impl Into<String>,
        probability: f64,
        impact_magnitude: f64,
        affected_actions: Vec<String>,
    ) -> Self {
        Self {
            source_action: source_action.into(),
            description: description.into(),
            probability: probability.clamp(0.0, 1.0),
            impact_magnitude: impact_magnitude.clamp(-1.0, 1.0),
            affected_actions,
        }
    }

    /// True when the effect lowers the plan's prospects.
    #[must_use]
    pub fn is_harmful(&self) -> bool {
        self.impact_magnitude < 0.0
    }

    pub(crate) fn in_range(&self) -> bool {
        (0.0..=1.0).contains(&self.probability) && (-1.0..=1.0).contains(&self.impact_magnitude)
    }
}

/// Discrete classification of a completed path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeType {
    /// At least 90% of actions executed.
    Success,
    /// At least 60% of actions executed.
    PartialSuccess,
    /// At least 30% of actions executed.
    Failure,
    /// Fewer than 30% of actions executed.
    Catastrophic,
}

impl OutcomeType {
    /// All outcomes, best first.
    pub const ALL: [Self; 4] = [
        Self::Success,
        Self::PartialSuccess,
        Self::Failure,
        Self::Catastrophic,
    ];

    /// Label for logs and reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialSuccess => "partial_success",
            Self::Failure => "failure",
            Self::Catastrophic => "catastrophic",
        }
    }

    /// Higher is better.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Success => 3,
            Self::PartialSuccess => 2,
            Self::Failure => 1,
            Self::Catastrophic => 0,
        }
    }

    /// Counts towards the success rate.
    #[must_use]
    pub fn is_successful(self) -> bool {
        matches!(self, Self::Success | Self::PartialSuccess)
    }
}

/// Coarse band for a risk score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Below 0.25.
    Low,
    /// Below 0.5.
    Medium,
    /// Below 0.75.
    High,
    /// 0.75 and above.
    Critical,
}

impl RiskLevel {
    /// Bands a risk score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < 0.25 {
            Self::Low
        } else if score < 0.5 {
            Self::Medium
        } else if score < 0.75 {
            Self::High
        } else {
            Self::Critical
        }
    }

    /// Label for logs and reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// One simulated attempt at executing a plan. Frozen once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationPath {
    id: String,
    actions_taken: Vec<Arc<Action>>,
    outcome: OutcomeType,
    total_cost: f64,
    total_duration: Duration,
    probability: f64,
    second_order_effects: Vec<SecondOrderEffect>,
    risk_score: f64,
}

impl SimulationPath {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: String,
        actions_taken: Vec<Arc<Action>>,
        outcome: OutcomeType,
        total_cost: f64,
        total_duration: Duration,
        probability: f64,
        second_order_effects: Vec<SecondOrderEffect>,
        risk_score: f64,
    ) -> Self {
        Self {
            id,
            actions_taken,
            outcome,
            total_cost,
            total_duration,
            probability,
            second_order_effects,
            risk_score,
        }
    }

    /// Path identifier (`mc_<n>` or a deterministic scenario label).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Executed actions in execution order.
    #[must_use]
    pub fn actions_taken(&self) -> &[Arc<Action>] {
        &self.actions_taken
    }

    /// Names of executed actions in execution order.
    #[must_use]
    pub fn action_names(&self) -> Vec<&str> {
        self.actions_taken.iter().map(|a| a.name.as_str()).collect()
    }

    /// Outcome classification.
    #[must_use]
    pub fn outcome(&self) -> OutcomeType {
        self.outcome
    }

    /// Sum of executed action costs.
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Sum of executed action durations.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.total_duration
    }

    /// Path probability in `[0, 1]`.
    #[must_use]
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Effects accumulated along the path.
    #[must_use]
    pub fn second_order_effects(&self) -> &[SecondOrderEffect] {
        &self.second_order_effects
    }

    /// Risk score in `[0, 1]`.
    #[must_use]
    pub fn risk_score(&self) -> f64 {
        self.risk_score
    }

    /// Risk band of [`Self::risk_score`].
    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score)
    }

    /// Payoff for the outcome minus the accumulated cost.
    #[must_use]
    pub fn value(&self) -> f64 {
        outcome::path_value(self.outcome, self.total_cost)
    }
}

/// Summary of one call to simulate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub(crate) run_id: Uuid,
    pub(crate) scenario_name: String,
    pub(crate) mode: SimulationMode,
    pub(crate) seed: u64,
    pub(crate) risk_tolerance: f64,
    pub(crate) paths: Vec<SimulationPath>,
    pub(crate) expected_value: f64,
    pub(crate) risk_adjusted_value: f64,
    pub(crate) success_rate: f64,
    pub(crate) average_cost: f64,
    pub(crate) average_duration: Duration,
    pub(crate) recommended: Option<usize>,
    pub(crate) unresolved: Vec<UnresolvedDependency>,
    pub(crate) completed_at: DateTime<Utc>,
}

impl ScenarioResult {
    /// Unique id of this run.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Scenario name supplied by the caller.
    #[must_use]
    pub fn scenario_name(&self) -> &str {
        &self.scenario_name
    }

    /// Mode the run used.
    #[must_use]
    pub fn mode(&self) -> SimulationMode {
        self.mode
    }

    /// Run-level seed every sample seed was derived from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Risk tolerance used for adjustment and ranking.
    #[must_use]
    pub fn risk_tolerance(&self) -> f64 {
        self.risk_tolerance
    }

    /// All sampled paths in sample order.
    #[must_use]
    pub fn paths(&self) -> &[SimulationPath] {
        &self.paths
    }

    /// Probability-weighted value.
    #[must_use]
    pub fn expected_value(&self) -> f64 {
        self.expected_value
    }

    /// Probability-weighted value discounted by risk.
    #[must_use]
    pub fn risk_adjusted_value(&self) -> f64 {
        self.risk_adjusted_value
    }

    /// Share of paths classified success or partial success.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }

    /// Mean path cost.
    #[must_use]
    pub fn average_cost(&self) -> f64 {
        self.average_cost
    }

    /// Mean path duration.
    #[must_use]
    pub fn average_duration(&self) -> Duration {
        self.average_duration
    }

    /// Best risk-adjusted path, borrowed from [`Self::paths`].
    #[must_use]
    pub fn recommended_path(&self) -> Option<&SimulationPath> {
        self.recommended.and_then(|idx| self.paths.get(idx))
    }

    /// Ordering problems the resolver had to work around.
    #[must_use]
    pub fn unresolved_dependencies(&self) -> &[UnresolvedDependency] {
        &self.unresolved
    }

    /// True when the execution order could not honor every dependency.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.unresolved.is_empty()
    }

    /// Completion timestamp.
    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Path count per outcome, every outcome present, best first.
    #[must_use]
    pub fn outcome_distribution(&self) -> IndexMap<OutcomeType, usize> {
        let mut counts: IndexMap<OutcomeType, usize> =
            OutcomeType::ALL.iter().map(|o| (*o, 0)).collect();
        for path in &self.paths {
            *counts.entry(path.outcome).or_default() += 1;
        }
        counts
    }

    /// Figures the approval router consumes.
    #[must_use]
    pub fn approval_inputs(&self) -> ApprovalInputs {
        ApprovalInputs::from_result(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_deserializes_with_defaults() {
        let action: Action = serde_json::from_str(r#"{ "name": "survey" }"#).unwrap();
        assert_eq!(action.name, "survey");
        assert!((action.success_probability - 0.8).abs() < f64::EPSILON);
        assert_eq!(action.duration, Duration::ZERO);
        assert!(action.dependencies.is_empty());
        assert!(action.effect_generators.is_empty());
    }

    #[test]
    fn effective_probability_is_clamped() {
        let mut action = Action::new("a", Duration::ZERO, 0.0, 1.7);
        assert!((action.effective_success_probability() - 1.0).abs() < f64::EPSILON);
        action.success_probability = f64::NAN;
        assert!(action.effective_success_probability().abs() < f64::EPSILON);
    }

    #[test]
    fn effect_constructor_clamps_range() {
        let effect = SecondOrderEffect::new("a", "x", 1.5, -3.0, vec![]);
        assert!(effect.in_range());
        assert!(effect.is_harmful());
        assert!((effect.impact_magnitude + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn risk_levels_band_scores() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.3), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.6), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(1.0), RiskLevel::Critical);
    }

    #[test]
    fn outcome_rank_follows_table_order() {
        let ranks: Vec<u8> = OutcomeType::ALL.iter().map(|o| o.rank()).collect();
        assert_eq!(ranks, vec![3, 2, 1, 0]);
        assert!(OutcomeType::PartialSuccess.is_successful());
        assert!(!OutcomeType::Failure.is_successful());
    }
}
