use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{model::SimulationPath, outcome::risk_adjustment};

/// Statistics over every path of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathStatistics {
    /// Share of successful or partially successful paths.
    pub success_rate: f64,
    /// Mean path cost.
    pub average_cost: f64,
    /// Mean path duration.
    pub average_duration: Duration,
    /// Sum of value times probability.
    pub expected_value: f64,
    /// Sum of value times probability times risk adjustment.
    pub risk_adjusted_value: f64,
    /// Index of the best-scoring path.
    pub recommended: Option<usize>,
}

/// Risk-adjusted ranking score of a single path.
#[must_use]
pub fn path_score(path: &SimulationPath, risk_tolerance: f64) -> f64 {
    path.value() * path.probability() * risk_adjustment(path.risk_score(), risk_tolerance)
}

/// Aggregates a completed set of paths. An empty slice yields all zeros.
///
/// The recommendation is the first path with the highest score; NaN scores
/// are never recommended.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate(paths: &[SimulationPath], risk_tolerance: f64) -> PathStatistics {
    if paths.is_empty() {
        return PathStatistics::default();
    }
    let count = paths.len() as f64;
    let successes = paths.iter().filter(|p| p.outcome().is_successful()).count();
    let total_cost: f64 = paths.iter().map(SimulationPath::total_cost).sum();
    let total_secs: f64 = paths
        .iter()
        .map(|p| p.total_duration().as_secs_f64())
        .sum();

    let mut expected_value = 0.0;
    let mut risk_adjusted_value = 0.0;
    let mut best: Option<(usize, f64)> = None;
    for (idx, path) in paths.iter().enumerate() {
        expected_value += path.value() * path.probability();
        let score = path_score(path, risk_tolerance);
        risk_adjusted_value += score;
        if !score.is_nan() && best.is_none_or(|(_, top)| score > top) {
            best = Some((idx, score));
        }
    }

    PathStatistics {
        success_rate: successes as f64 / count,
        average_cost: total_cost / count,
        average_duration: Duration::from_secs_f64(total_secs / count),
        expected_value,
        risk_adjusted_value,
        recommended: best.map(|(idx, _)| idx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Action, OutcomeType, SecondOrderEffect};
    use std::sync::Arc;

    #[allow(clippy::cast_precision_loss)]
    fn path(id: &str, executed: usize, candidates: usize, cost: f64, risk: f64) -> SimulationPath {
        let actions: Vec<Arc<Action>> = (0..executed)
            .map(|i| {
                Arc::new(Action::new(
                    format!("{id}-{i}"),
                    Duration::from_secs(10),
                    cost / executed.max(1) as f64,
                    1.0,
                ))
            })
            .collect();
        let probability = if executed == 0 { 0.0 } else { 1.0 };
        SimulationPath::new(
            id.into(),
            actions,
            crate::outcome::classify(executed, candidates),
            cost,
            Duration::from_secs(10 * executed as u64),
            probability,
            Vec::<SecondOrderEffect>::new(),
            risk,
        )
    }

    #[test]
    fn empty_path_set_is_zero_valued() {
        let stats = aggregate(&[], 0.5);
        assert_eq!(stats, PathStatistics::default());
        assert!(stats.recommended.is_none());
    }

    #[test]
    fn success_rate_counts_partial_successes() {
        let paths = vec![
            path("a", 10, 10, 1_000.0, 0.0),
            path("b", 7, 10, 1_000.0, 0.0),
            path("c", 4, 10, 1_000.0, 0.0),
            path("d", 1, 10, 1_000.0, 0.0),
        ];
        assert_eq!(paths[1].outcome(), OutcomeType::PartialSuccess);
        let stats = aggregate(&paths, 0.5);
        assert!((stats.success_rate - 0.5).abs() < f64::EPSILON);
        assert!((stats.average_cost - 1_000.0).abs() < 1e-9);
        assert_eq!(stats.average_duration, Duration::from_secs(55));
    }

    #[test]
    fn risk_discount_shrinks_with_tolerance() {
        let paths = vec![path("risky", 10, 10, 0.0, 0.5)];
        let averse = aggregate(&paths, 0.0);
        let seeking = aggregate(&paths, 1.0);
        assert!((averse.expected_value - 100_000.0).abs() < 1e-9);
        assert!((averse.risk_adjusted_value - 50_000.0).abs() < 1e-9);
        assert!((seeking.risk_adjusted_value - seeking.expected_value).abs() < 1e-9);
    }

    #[test]
    fn recommendation_prefers_risk_adjusted_score() {
        let paths = vec![
            path("cheap-risky", 10, 10, 0.0, 0.9),
            path("safe", 10, 10, 20_000.0, 0.0),
        ];
        let stats = aggregate(&paths, 0.0);
        assert_eq!(stats.recommended, Some(1));
    }

    #[test]
    fn nan_scored_path_is_never_recommended() {
        let paths = vec![
            path("broken", 10, 10, f64::NAN, 0.0),
            path("sound", 10, 10, 5_000.0, 0.0),
        ];
        assert!(path_score(&paths[0], 0.5).is_nan());
        assert_eq!(aggregate(&paths, 0.5).recommended, Some(1));
    }

    #[test]
    fn ties_go_to_first_path() {
        let paths = vec![
            path("first", 10, 10, 5_000.0, 0.1),
            path("second", 10, 10, 5_000.0, 0.1),
        ];
        assert_eq!(aggregate(&paths, 0.3).recommended, Some(0));
    }
}
