use std::time::Duration;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::model::{Action, ScenarioResult};

/// Plan totals handed to the constraint checker before a run is allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    /// Sum of every action's cost.
    pub total_cost: f64,
    /// Sum of every action's duration.
    pub total_duration: Duration,
    /// Number of actions in the plan.
    pub action_count: usize,
    /// Permissions the plan needs, first occurrence order, no duplicates.
    pub required_permissions: Vec<String>,
    /// Regulatory domains the plan touches, first occurrence order, no duplicates.
    pub regulatory_domains: Vec<String>,
}

impl PlanSummary {
    /// Sums the same fields the simulator accumulates per path and attaches
    /// the plan-level permissions and regulatory domains.
    #[must_use]
    pub fn from_actions<P, D>(
        actions: &[Action],
        required_permissions: P,
        regulatory_domains: D,
    ) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            total_cost: actions.iter().map(Action::effective_cost).sum(),
            total_duration: actions.iter().map(|a| a.duration).sum(),
            action_count: actions.len(),
            required_permissions: distinct(required_permissions),
            regulatory_domains: distinct(regulatory_domains),
        }
    }
}

fn distinct<I>(values: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    values
        .into_iter()
        .map(Into::into)
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect()
}

/// Simulation figures consumed by the approval router.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApprovalInputs {
    /// `1 - success_rate`.
    pub risk_score: f64,
    /// Expected value of the run.
    pub expected_value: f64,
    /// Risk-adjusted value of the run.
    pub risk_adjusted_value: f64,
}

impl ApprovalInputs {
    /// Extracts the router's inputs from a result.
    #[must_use]
    pub fn from_result(result: &ScenarioResult) -> Self {
        Self {
            risk_score: 1.0 - result.success_rate(),
            expected_value: result.expected_value(),
            risk_adjusted_value: result.risk_adjusted_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_sums_plan() {
        let actions = vec![
            Action::new("a", Duration::from_secs(60), 1_500.0, 0.9),
            Action::new("b", Duration::from_secs(30), 500.0, 0.9).depends_on("a"),
        ];
        let summary = PlanSummary::from_actions(
            &actions,
            ["read_data", "write_data", "deploy_staging", "read_data"],
            ["finance", "general"],
        );
        assert!((summary.total_cost - 2_000.0).abs() < 1e-9);
        assert_eq!(summary.total_duration, Duration::from_secs(90));
        assert_eq!(summary.action_count, 2);
        assert_eq!(
            summary.required_permissions,
            vec!["read_data", "write_data", "deploy_staging"]
        );
        assert_eq!(summary.regulatory_domains, vec!["finance", "general"]);
    }

    #[test]
    fn empty_plan_summary_is_zero() {
        let summary = PlanSummary::from_actions(&[], Vec::<String>::new(), Vec::<String>::new());
        assert_eq!(summary, PlanSummary::default());
    }
}
