//! Second-order effects.
//!
//! Every executed action is handed to the [`EffectCascader`], which asks each of
//! the action's [`EffectGenerator`]s for at most one effect and then applies the
//! built-in budget-pressure rule. A generator that errors is logged and skipped;
//! it never aborts the path it was evaluated on.

use std::{sync::Arc, time::Duration};

use serde_json::json;
use sim_logging::LogLevel;

use crate::{
    error::EffectGeneratorError,
    helper::SimulationTelemetry,
    model::{Action, SecondOrderEffect},
};

/// Cost above which an executed action pressures the remaining budget.
pub const HIGH_COST_THRESHOLD: f64 = 10_000.0;
/// Probability of the budget-pressure effect.
pub const BUDGET_PRESSURE_PROBABILITY: f64 = 0.8;
/// Impact of the budget-pressure effect.
pub const BUDGET_PRESSURE_IMPACT: f64 = -0.3;
/// Description of the budget-pressure effect.
pub const BUDGET_PRESSURE_DESCRIPTION: &str = "High cost reduces available budget";

/// What a generator gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct EffectContext<'a> {
    /// Action that just executed.
    pub action: &'a Action,
    /// Actions executed so far in this path, including `action`.
    pub executed: &'a [Arc<Action>],
    /// Every candidate action of the plan, in execution order.
    pub candidates: &'a [Arc<Action>],
}

impl EffectContext<'_> {
    /// Candidate names that have not executed in this path yet.
    #[must_use]
    pub fn pending_names(&self) -> Vec<String> {
        self.candidates
            .iter()
            .filter(|candidate| !self.executed.iter().any(|done| done.name == candidate.name))
            .map(|candidate| candidate.name.clone())
            .collect()
    }
}

/// Produces zero or one cascading effect for an executed action.
///
/// Returning `Err` is always survivable: the cascader logs the failure and
/// moves on to the next generator.
pub trait EffectGenerator: Send + Sync {
    /// Short label used in logs.
    fn label(&self) -> &str;

    /// Evaluates the generator for one executed action.
    fn generate(
        &self,
        ctx: &EffectContext<'_>,
    ) -> Result<Option<SecondOrderEffect>, EffectGeneratorError>;
}

/// Always emits the same effect.
#[derive(Debug, Clone)]
pub struct StaticEffect {
    description: String,
    probability: f64,
    impact_magnitude: f64,
    affected: Option<Vec<String>>,
}

impl StaticEffect {
    /// Effect on every action still pending when the source executes.
    #[must_use]
    pub fn new(description: impl Into<String>, probability: f64, impact_magnitude: f64) -> Self {
        Self {
            description: description.into(),
            probability,
            impact_magnitude,
            affected: None,
        }
    }

    /// Restricts the effect to named actions.
    #[must_use]
    pub fn affecting<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affected = Some(names.into_iter().map(Into::into).collect());
        self
    }
}

impl EffectGenerator for StaticEffect {
    fn label(&self) -> &str {
        "static"
    }

    fn generate(
        &self,
        ctx: &EffectContext<'_>,
    ) -> Result<Option<SecondOrderEffect>, EffectGeneratorError> {
        let affected = self
            .affected
            .clone()
            .unwrap_or_else(|| ctx.pending_names());
        Ok(Some(SecondOrderEffect {
            source_action: ctx.action.name.clone(),
            description: self.description.clone(),
            probability: self.probability,
            impact_magnitude: self.impact_magnitude,
            affected_actions: affected,
        }))
    }
}

/// Schedule pressure from actions that run longer than a limit.
#[derive(Debug, Clone)]
pub struct ScheduleSlipEffect {
    limit: Duration,
    probability: f64,
    impact_magnitude: f64,
}

impl ScheduleSlipEffect {
    /// Fires when the action's duration exceeds `limit`.
    #[must_use]
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            probability: 0.6,
            impact_magnitude: -0.2,
        }
    }

    /// Overrides probability and impact of the emitted effect.
    #[must_use]
    pub fn with_weights(mut self, probability: f64, impact_magnitude: f64) -> Self {
        self.probability = probability;
        self.impact_magnitude = impact_magnitude;
        self
    }
}

impl EffectGenerator for ScheduleSlipEffect {
    fn label(&self) -> &str {
        "schedule_slip"
    }

    fn generate(
        &self,
        ctx: &EffectContext<'_>,
    ) -> Result<Option<SecondOrderEffect>, EffectGeneratorError> {
        if ctx.action.duration <= self.limit {
            return Ok(None);
        }
        Ok(Some(SecondOrderEffect {
            source_action: ctx.action.name.clone(),
            description: format!(
                "Long-running step ({}s over {}s) compresses downstream schedule",
                ctx.action.duration.as_secs(),
                self.limit.as_secs()
            ),
            probability: self.probability,
            impact_magnitude: self.impact_magnitude,
            affected_actions: ctx.pending_names(),
        }))
    }
}

type EffectFn =
    dyn Fn(&EffectContext<'_>) -> Result<Option<SecondOrderEffect>, EffectGeneratorError>
        + Send
        + Sync;

/// Generator backed by a closure.
pub struct FnEffect {
    label: String,
    func: Box<EffectFn>,
}

impl FnEffect {
    /// Wraps a closure under a label.
    pub fn new<F>(label: impl Into<String>, func: F) -> Self
    where
        F: Fn(&EffectContext<'_>) -> Result<Option<SecondOrderEffect>, EffectGeneratorError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            label: label.into(),
            func: Box::new(func),
        }
    }
}

impl EffectGenerator for FnEffect {
    fn label(&self) -> &str {
        &self.label
    }

    fn generate(
        &self,
        ctx: &EffectContext<'_>,
    ) -> Result<Option<SecondOrderEffect>, EffectGeneratorError> {
        (self.func)(ctx)
    }
}

/// Derives the effects of one executed action.
#[derive(Debug, Clone, Default)]
pub struct EffectCascader {
    telemetry: Option<SimulationTelemetry>,
}

impl EffectCascader {
    /// Creates a cascader; failures are logged through `telemetry` when present.
    #[must_use]
    pub fn new(telemetry: Option<SimulationTelemetry>) -> Self {
        Self { telemetry }
    }

    /// Runs every attached generator, then the budget-pressure rule.
    #[must_use]
    pub fn cascade(&self, ctx: &EffectContext<'_>) -> Vec<SecondOrderEffect> {
        let mut effects = Vec::new();
        for generator in &ctx.action.effect_generators {
            match generator.generate(ctx) {
                Ok(Some(effect)) if effect.in_range() => effects.push(effect),
                Ok(Some(effect)) => self.report_failure(
                    ctx.action,
                    &EffectGeneratorError::OutOfRange {
                        generator: generator.label().to_string(),
                        probability: effect.probability,
                        impact: effect.impact_magnitude,
                    },
                ),
                Ok(None) => {}
                Err(err) => self.report_failure(ctx.action, &err),
            }
        }
        if ctx.action.cost > HIGH_COST_THRESHOLD {
            effects.push(SecondOrderEffect {
                source_action: ctx.action.name.clone(),
                description: BUDGET_PRESSURE_DESCRIPTION.to_string(),
                probability: BUDGET_PRESSURE_PROBABILITY,
                impact_magnitude: BUDGET_PRESSURE_IMPACT,
                affected_actions: ctx.pending_names(),
            });
        }
        effects
    }

    fn report_failure(&self, action: &Action, err: &EffectGeneratorError) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(
                LogLevel::Warn,
                "simulation.effect.generator_failed",
                json!({ "action": action.name, "error": err.to_string() }),
            );
        }
    }
}
