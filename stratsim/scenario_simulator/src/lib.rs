#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! Scenario simulator – samples many execution paths through a plan of dependent
//! actions, cascades second-order effects, and recommends the best risk-adjusted path.

/// Telemetry and seeded randomness helpers.
#[path = "../helper.rs"]
pub mod helper;

/// Error taxonomy.
#[path = "../error.rs"]
pub mod error;

/// Plan and simulation data model.
#[path = "../model.rs"]
pub mod model;

/// Run modes and deterministic scenario table.
#[path = "../methods.rs"]
pub mod methods;

/// Dependency ordering of actions.
#[path = "../graph.rs"]
pub mod graph;

/// Second-order effect generators and the cascader.
#[path = "../effects.rs"]
pub mod effects;

/// Outcome classification and path scoring.
#[path = "../outcome.rs"]
pub mod outcome;

/// Per-run path sampling.
#[path = "../sampler.rs"]
pub mod sampler;

/// Aggregate statistics and path recommendation.
#[path = "../aggregate.rs"]
pub mod aggregate;

/// Simulator configuration.
#[path = "../config.rs"]
pub mod config;

/// In-process run history.
#[path = "../history.rs"]
pub mod history;

/// Human readable simulation reports.
#[path = "../report.rs"]
pub mod report;

/// Inputs handed to the constraint checker and approval router.
#[path = "../boundary.rs"]
pub mod boundary;

/// Simulator entry points.
#[path = "../main.rs"]
pub mod runtime;

pub use boundary::{ApprovalInputs, PlanSummary};
pub use config::SimulatorConfig;
pub use effects::{EffectContext, EffectGenerator, FnEffect, ScheduleSlipEffect, StaticEffect};
pub use error::{EffectGeneratorError, SimulationError, UnresolvedCause, UnresolvedDependency};
pub use graph::{resolve_order, ResolvedOrder};
pub use helper::{SimulationTelemetry, SimulationTelemetryBuilder};
pub use methods::{DeterministicScenario, SimulationMode};
pub use model::{Action, OutcomeType, RiskLevel, ScenarioResult, SecondOrderEffect, SimulationPath};
pub use report::{SimulationReport, SimulationReportBuilder};
pub use runtime::{simulate, ScenarioSimulator, ScenarioSimulatorBuilder};
