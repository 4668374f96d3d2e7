use crate::model::{OutcomeType, SecondOrderEffect};

/// Completion ratio at or above which a path is a success.
pub const SUCCESS_RATIO: f64 = 0.9;
/// Completion ratio at or above which a path is a partial success.
pub const PARTIAL_SUCCESS_RATIO: f64 = 0.6;
/// Completion ratio at or above which a path is a (recoverable) failure.
pub const FAILURE_RATIO: f64 = 0.3;
/// Cost at which the effect-based risk doubles.
pub const COST_RISK_SCALE: f64 = 100_000.0;

/// Executed share of the candidate actions; zero without candidates.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn completion_ratio(executed: usize, candidates: usize) -> f64 {
    if candidates == 0 {
        0.0
    } else {
        executed as f64 / candidates as f64
    }
}

/// Maps a completion ratio onto an outcome.
#[must_use]
pub fn classify_ratio(ratio: f64) -> OutcomeType {
    if ratio >= SUCCESS_RATIO {
        OutcomeType::Success
    } else if ratio >= PARTIAL_SUCCESS_RATIO {
        OutcomeType::PartialSuccess
    } else if ratio >= FAILURE_RATIO {
        OutcomeType::Failure
    } else {
        OutcomeType::Catastrophic
    }
}

/// Classifies a path from its executed and candidate counts.
#[must_use]
pub fn classify(executed: usize, candidates: usize) -> OutcomeType {
    classify_ratio(completion_ratio(executed, candidates))
}

/// Fixed payoff credited for reaching an outcome.
#[must_use]
pub fn payoff(outcome: OutcomeType) -> f64 {
    match outcome {
        OutcomeType::Success => 100_000.0,
        OutcomeType::PartialSuccess => 50_000.0,
        OutcomeType::Failure => -10_000.0,
        OutcomeType::Catastrophic => -50_000.0,
    }
}

/// Payoff minus what the path spent.
#[must_use]
pub fn path_value(outcome: OutcomeType, total_cost: f64) -> f64 {
    payoff(outcome) - total_cost
}

/// Product of the executed actions' success probabilities; zero for an empty path.
#[must_use]
pub fn path_probability<I>(probabilities: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut iter = probabilities.into_iter().peekable();
    if iter.peek().is_none() {
        return 0.0;
    }
    iter.product::<f64>().clamp(0.0, 1.0)
}

/// Effect-based risk score in `[0, 1]`.
///
/// Harmful effects contribute `|impact| * probability`; the sum is scaled by
/// `1 + cost / COST_RISK_SCALE` and capped at one. A NaN cost leaves the
/// effect sum unscaled.
#[must_use]
pub fn risk_score(effects: &[SecondOrderEffect], total_cost: f64) -> f64 {
    if effects.is_empty() {
        return 0.0;
    }
    let raw: f64 = effects
        .iter()
        .filter(|effect| effect.is_harmful())
        .map(|effect| effect.impact_magnitude.abs() * effect.probability)
        .sum();
    let scaled = raw * (1.0 + total_cost / COST_RISK_SCALE);
    if scaled.is_nan() {
        raw.clamp(0.0, 1.0)
    } else {
        scaled.clamp(0.0, 1.0)
    }
}

/// Multiplier applied to a path's weighted value given the caller's risk tolerance.
#[must_use]
pub fn risk_adjustment(risk_score: f64, risk_tolerance: f64) -> f64 {
    1.0 - risk_score * (1.0 - risk_tolerance)
}
