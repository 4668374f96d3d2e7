use std::{collections::HashSet, sync::Arc, time::Duration};

use rand::Rng;

use crate::{
    effects::{EffectCascader, EffectContext},
    methods::DeterministicScenario,
    model::{Action, SecondOrderEffect, SimulationPath},
    outcome,
};

/// Produces one path per invocation from a resolved action order.
#[derive(Debug, Clone, Default)]
pub struct PathSampler {
    cascader: EffectCascader,
}

impl PathSampler {
    /// Creates a sampler around a cascader.
    #[must_use]
    pub fn new(cascader: EffectCascader) -> Self {
        Self { cascader }
    }

    /// Draws each action's success from its own probability and cascades effects.
    pub fn sample_monte_carlo<R: Rng + ?Sized>(
        &self,
        order: &[Arc<Action>],
        index: usize,
        rng: &mut R,
    ) -> SimulationPath {
        let walk = self.walk(order, rng, None);
        let risk_score = outcome::risk_score(&walk.effects, walk.total_cost);
        walk.finish(format!("mc_{index}"), order.len(), risk_score)
    }

    /// Draws every action at the scenario's fixed rate; no effects are cascaded.
    pub fn sample_deterministic<R: Rng + ?Sized>(
        &self,
        order: &[Arc<Action>],
        scenario: DeterministicScenario,
        rng: &mut R,
    ) -> SimulationPath {
        let walk = self.walk(order, rng, Some(scenario.success_rate));
        walk.finish(scenario.label.to_string(), order.len(), scenario.risk_score())
    }

    fn walk<R: Rng + ?Sized>(
        &self,
        order: &[Arc<Action>],
        rng: &mut R,
        rate_override: Option<f64>,
    ) -> Walk {
        let mut walk = Walk::default();
        let mut done: HashSet<&str> = HashSet::with_capacity(order.len());

        for action in order {
            let eligible = action
                .dependencies
                .iter()
                .all(|dep| done.contains(dep.as_str()));
            if !eligible {
                continue;
            }
            let p = rate_override.map_or_else(
                || action.effective_success_probability(),
                |rate| rate.clamp(0.0, 1.0),
            );
            if rng.gen::<f64>() >= p {
                continue;
            }

            debug_assert!(
                action
                    .dependencies
                    .iter()
                    .all(|dep| done.contains(dep.as_str())),
                "action `{}` executed before its dependencies",
                action.name
            );
            done.insert(action.name.as_str());
            walk.executed.push(Arc::clone(action));
            walk.probabilities.push(p);
            walk.total_cost += action.effective_cost();
            walk.total_duration += action.duration;

            if rate_override.is_none() {
                let ctx = EffectContext {
                    action: action.as_ref(),
                    executed: &walk.executed,
                    candidates: order,
                };
                let effects = self.cascader.cascade(&ctx);
                walk.effects.extend(effects);
            }
        }
        walk
    }
}

#[derive(Default)]
struct Walk {
    executed: Vec<Arc<Action>>,
    probabilities: Vec<f64>,
    total_cost: f64,
    total_duration: Duration,
    effects: Vec<SecondOrderEffect>,
}

impl Walk {
    fn finish(self, id: String, candidates: usize, risk_score: f64) -> SimulationPath {
        let outcome = outcome::classify(self.executed.len(), candidates);
        let probability = outcome::path_probability(self.probabilities);
        SimulationPath::new(
            id,
            self.executed,
            outcome,
            self.total_cost,
            self.total_duration,
            probability,
            self.effects,
            risk_score.clamp(0.0, 1.0),
        )
    }
}
