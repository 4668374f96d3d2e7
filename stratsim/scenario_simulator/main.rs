use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Utc;
use futures::future::join_all;
use parking_lot::Mutex;
use serde_json::json;
use sim_logging::LogLevel;
use uuid::Uuid;

use crate::{
    aggregate::aggregate,
    config::SimulatorConfig,
    effects::EffectCascader,
    graph::{resolve_shared, ResolvedOrder},
    helper::{random_seed, sample_seed, seeded_rng, SimulationTelemetry},
    history::{RunRecord, SimulationHistory},
    methods::{DeterministicScenario, SimulationMode},
    model::{Action, ScenarioResult, SimulationPath},
    report::{SimulationReport, SimulationReportBuilder},
    sampler::PathSampler,
};

/// Runs scenario simulations over a plan of actions.
pub struct ScenarioSimulator {
    config: SimulatorConfig,
    telemetry: Option<SimulationTelemetry>,
    sampler: PathSampler,
    history: Mutex<SimulationHistory>,
}

impl ScenarioSimulator {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> ScenarioSimulatorBuilder {
        ScenarioSimulatorBuilder::default()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Returns telemetry handle.
    #[must_use]
    pub fn telemetry(&self) -> Option<&SimulationTelemetry> {
        self.telemetry.as_ref()
    }

    /// Simulates `actions` on the calling thread.
    ///
    /// Never fails: an empty plan gives a zero-valued result, and dependency
    /// problems are reported through [`ScenarioResult::unresolved_dependencies`].
    #[must_use]
    pub fn simulate(
        &self,
        scenario_name: &str,
        actions: &[Action],
        num_samples: usize,
        mode: SimulationMode,
    ) -> ScenarioResult {
        let run = self.begin(scenario_name, actions, num_samples, mode);
        let paths = match mode {
            _ if run.order.actions.is_empty() => Vec::new(),
            SimulationMode::MonteCarlo => (0..num_samples)
                .map(|idx| {
                    let mut rng = seeded_rng(sample_seed(run.seed, idx));
                    self.sampler
                        .sample_monte_carlo(&run.order.actions, idx, &mut rng)
                })
                .collect(),
            SimulationMode::Deterministic => self.deterministic_paths(&run),
        };
        self.finish(run, paths)
    }

    /// Simulates `actions`, spreading Monte Carlo samples over blocking workers.
    ///
    /// Samples are seeded by index exactly as in [`Self::simulate`], so both
    /// produce the same paths for the same seed. Aggregation starts only once
    /// every worker has returned.
    pub async fn simulate_parallel(
        &self,
        scenario_name: &str,
        actions: &[Action],
        num_samples: usize,
        mode: SimulationMode,
    ) -> Result<ScenarioResult> {
        let run = self.begin(scenario_name, actions, num_samples, mode);
        if run.order.actions.is_empty() || mode == SimulationMode::Deterministic {
            let paths = if run.order.actions.is_empty() {
                Vec::new()
            } else {
                self.deterministic_paths(&run)
            };
            return Ok(self.finish(run, paths));
        }

        let order: Arc<[Arc<Action>]> = run.order.actions.clone().into();
        let chunk = num_samples.div_ceil(self.config.workers).max(1);
        let tasks = (0..num_samples).step_by(chunk).map(|start| {
            let end = (start + chunk).min(num_samples);
            let order = Arc::clone(&order);
            let sampler = self.sampler.clone();
            let seed = run.seed;
            tokio::task::spawn_blocking(move || {
                (start..end)
                    .map(|idx| {
                        let mut rng = seeded_rng(sample_seed(seed, idx));
                        sampler.sample_monte_carlo(&order, idx, &mut rng)
                    })
                    .collect::<Vec<_>>()
            })
        });

        let mut paths = Vec::with_capacity(num_samples);
        for joined in join_all(tasks).await {
            let chunk_paths = joined.map_err(|err| {
                if err.is_panic() {
                    std::panic::resume_unwind(err.into_panic());
                }
                anyhow!("sample worker cancelled: {err}")
            })?;
            paths.extend(chunk_paths);
        }
        Ok(self.finish(run, paths))
    }

    /// Summaries of past runs for a scenario, newest first.
    #[must_use]
    pub fn history_for(&self, scenario_name: &str, limit: usize) -> Vec<RunRecord> {
        self.history.lock().history_for(scenario_name, limit)
    }

    /// Number of runs retained in history.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    /// Builds the structured report for a result.
    #[must_use]
    pub fn report(&self, result: &ScenarioResult) -> SimulationReport {
        SimulationReportBuilder::new().result(result).build()
    }

    fn begin(
        &self,
        scenario_name: &str,
        actions: &[Action],
        num_samples: usize,
        mode: SimulationMode,
    ) -> PendingRun {
        let seed = self.config.seed.unwrap_or_else(random_seed);
        let order = resolve_shared(actions.iter().cloned().map(Arc::new).collect());
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(
                LogLevel::Info,
                "simulation.run.start",
                json!({
                    "scenario": scenario_name,
                    "mode": mode.label(),
                    "actions": actions.len(),
                    "samples": num_samples,
                    "seed": seed,
                }),
            );
            if order.is_degraded() {
                let issues: Vec<String> =
                    order.unresolved.iter().map(ToString::to_string).collect();
                let _ = tel.log(
                    LogLevel::Warn,
                    "simulation.ordering.degraded",
                    json!({ "scenario": scenario_name, "unresolved": issues }),
                );
            }
        }
        PendingRun {
            run_id: Uuid::new_v4(),
            scenario_name: scenario_name.to_string(),
            mode,
            seed,
            order,
        }
    }

    fn deterministic_paths(&self, run: &PendingRun) -> Vec<SimulationPath> {
        DeterministicScenario::ALL
            .iter()
            .enumerate()
            .map(|(idx, scenario)| {
                let mut rng = seeded_rng(sample_seed(run.seed, idx));
                self.sampler
                    .sample_deterministic(&run.order.actions, *scenario, &mut rng)
            })
            .collect()
    }

    fn finish(&self, run: PendingRun, paths: Vec<SimulationPath>) -> ScenarioResult {
        let stats = aggregate(&paths, self.config.risk_tolerance);
        let result = ScenarioResult {
            run_id: run.run_id,
            scenario_name: run.scenario_name,
            mode: run.mode,
            seed: run.seed,
            risk_tolerance: self.config.risk_tolerance,
            paths,
            expected_value: stats.expected_value,
            risk_adjusted_value: stats.risk_adjusted_value,
            success_rate: stats.success_rate,
            average_cost: stats.average_cost,
            average_duration: stats.average_duration,
            recommended: stats.recommended,
            unresolved: run.order.unresolved,
            completed_at: Utc::now(),
        };
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(
                LogLevel::Info,
                "simulation.run.completed",
                json!({
                    "scenario": result.scenario_name(),
                    "run_id": result.run_id().to_string(),
                    "paths": result.paths().len(),
                    "success_rate": result.success_rate(),
                    "expected_value": result.expected_value(),
                    "risk_adjusted_value": result.risk_adjusted_value(),
                    "recommended": result.recommended_path().map(SimulationPath::id),
                    "degraded": result.is_degraded(),
                }),
            );
        }
        self.history.lock().push(&result);
        result
    }
}

struct PendingRun {
    run_id: Uuid,
    scenario_name: String,
    mode: SimulationMode,
    seed: u64,
    order: ResolvedOrder,
}

/// Builder for `ScenarioSimulator`.
#[derive(Default)]
pub struct ScenarioSimulatorBuilder {
    config: SimulatorConfig,
    telemetry: Option<SimulationTelemetry>,
}

impl ScenarioSimulatorBuilder {
    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: SimulatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets telemetry.
    #[must_use]
    pub fn telemetry(mut self, telemetry: SimulationTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Sets risk tolerance in `[0, 1]`.
    #[must_use]
    pub fn risk_tolerance(mut self, tolerance: f64) -> Self {
        self.config.risk_tolerance = tolerance;
        self
    }

    /// Pins the run seed so runs are reproducible.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Sets the parallel worker count.
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Sets how many run summaries are kept.
    #[must_use]
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.config.history_capacity = capacity;
        self
    }

    /// Validates the configuration and builds the simulator.
    pub fn build(self) -> Result<ScenarioSimulator> {
        self.config.validate()?;
        let cascader = EffectCascader::new(self.telemetry.clone());
        Ok(ScenarioSimulator {
            history: Mutex::new(SimulationHistory::new(self.config.history_capacity)),
            sampler: PathSampler::new(cascader),
            telemetry: self.telemetry,
            config: self.config,
        })
    }
}

/// One-shot simulation with a default simulator at the given risk tolerance.
///
/// Tolerances outside `[0, 1]` are clamped.
#[must_use]
pub fn simulate(
    scenario_name: &str,
    actions: &[Action],
    num_samples: usize,
    mode: SimulationMode,
    risk_tolerance: f64,
) -> ScenarioResult {
    let tolerance = if risk_tolerance.is_nan() {
        SimulatorConfig::default().risk_tolerance
    } else {
        risk_tolerance.clamp(0.0, 1.0)
    };
    let simulator = ScenarioSimulator {
        config: SimulatorConfig {
            risk_tolerance: tolerance,
            history_capacity: 0,
            ..SimulatorConfig::default()
        },
        telemetry: None,
        sampler: PathSampler::default(),
        history: Mutex::new(SimulationHistory::new(0)),
    };
    simulator.simulate(scenario_name, actions, num_samples, mode)
}
