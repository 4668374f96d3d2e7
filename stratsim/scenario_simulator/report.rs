use std::{fmt::Write as _, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{OutcomeType, RiskLevel, ScenarioResult, SecondOrderEffect};

/// Highlights of the recommended path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedPathSummary {
    /// Path id.
    pub path_id: String,
    /// Outcome reached.
    pub outcome: OutcomeType,
    /// Path probability.
    pub probability: f64,
    /// Path cost.
    pub total_cost: f64,
    /// Path duration.
    pub total_duration: Duration,
    /// Risk score.
    pub risk_score: f64,
    /// Risk band.
    pub risk_level: RiskLevel,
    /// Executed action count.
    pub action_count: usize,
    /// Leading effects, capped by the builder's effect limit.
    pub effects: Vec<SecondOrderEffect>,
}

/// Count and share of paths for one outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeShare {
    /// Outcome.
    pub outcome: OutcomeType,
    /// Paths with that outcome.
    pub count: usize,
    /// Percentage of all paths.
    pub percentage: f64,
}

/// Structured report summarizing a scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Run id.
    pub run_id: Uuid,
    /// Scenario name.
    pub scenario_name: String,
    /// Number of paths simulated.
    pub simulations_run: usize,
    /// Success rate.
    pub success_rate: f64,
    /// Expected value.
    pub expected_value: f64,
    /// Risk-adjusted value.
    pub risk_adjusted_value: f64,
    /// Average cost.
    pub average_cost: f64,
    /// Average duration.
    pub average_duration: Duration,
    /// Best path, if any.
    pub recommended: Option<RecommendedPathSummary>,
    /// Outcome distribution, best outcome first.
    pub outcome_distribution: Vec<OutcomeShare>,
    /// Ordering caveats raised by the resolver.
    pub ordering_caveats: Vec<String>,
    /// Timestamp.
    pub generated_at: DateTime<Utc>,
}

/// Builder for `SimulationReport`.
pub struct SimulationReportBuilder<'a> {
    result: Option<&'a ScenarioResult>,
    effect_limit: usize,
}

impl<'a> SimulationReportBuilder<'a> {
    /// Creates builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            result: None,
            effect_limit: 5,
        }
    }

    /// Sets the result to report on.
    #[must_use]
    pub fn result(mut self, result: &'a ScenarioResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Caps the effects listed under the recommended path.
    #[must_use]
    pub fn effect_limit(mut self, limit: usize) -> Self {
        self.effect_limit = limit;
        self
    }

    /// Builds report; without a result every figure is zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build(self) -> SimulationReport {
        let Some(result) = self.result else {
            return SimulationReport {
                run_id: Uuid::nil(),
                scenario_name: String::new(),
                simulations_run: 0,
                success_rate: 0.0,
                expected_value: 0.0,
                risk_adjusted_value: 0.0,
                average_cost: 0.0,
                average_duration: Duration::ZERO,
                recommended: None,
                outcome_distribution: zero_distribution(),
                ordering_caveats: Vec::new(),
                generated_at: Utc::now(),
            };
        };
        let total = result.paths().len();
        let outcome_distribution = result
            .outcome_distribution()
            .into_iter()
            .map(|(outcome, count)| OutcomeShare {
                outcome,
                count,
                percentage: if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64 * 100.0
                },
            })
            .collect();
        let recommended = result.recommended_path().map(|path| RecommendedPathSummary {
            path_id: path.id().to_string(),
            outcome: path.outcome(),
            probability: path.probability(),
            total_cost: path.total_cost(),
            total_duration: path.total_duration(),
            risk_score: path.risk_score(),
            risk_level: path.risk_level(),
            action_count: path.actions_taken().len(),
            effects: path
                .second_order_effects()
                .iter()
                .take(self.effect_limit)
                .cloned()
                .collect(),
        });
        SimulationReport {
            run_id: result.run_id(),
            scenario_name: result.scenario_name().to_string(),
            simulations_run: total,
            success_rate: result.success_rate(),
            expected_value: result.expected_value(),
            risk_adjusted_value: result.risk_adjusted_value(),
            average_cost: result.average_cost(),
            average_duration: result.average_duration(),
            recommended,
            outcome_distribution,
            ordering_caveats: result
                .unresolved_dependencies()
                .iter()
                .map(ToString::to_string)
                .collect(),
            generated_at: Utc::now(),
        }
    }
}

impl Default for SimulationReportBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn zero_distribution() -> Vec<OutcomeShare> {
    OutcomeType::ALL
        .iter()
        .map(|outcome| OutcomeShare {
            outcome: *outcome,
            count: 0,
            percentage: 0.0,
        })
        .collect()
}

impl SimulationReport {
    /// Plain-text rendering for terminals and logs.
    #[must_use]
    pub fn render(&self) -> String {
        let rule = "=".repeat(60);
        let mut out = String::new();
        let _ = writeln!(out, "Strategic Scenario Simulation Report");
        let _ = writeln!(out, "{rule}\n");
        let _ = writeln!(out, "Scenario: {}", self.scenario_name);
        let _ = writeln!(out, "Simulations Run: {}\n", self.simulations_run);

        let _ = writeln!(out, "Key Metrics:");
        let _ = writeln!(out, "  Success Rate: {:.1}%", self.success_rate * 100.0);
        let _ = writeln!(out, "  Expected Value: {}", money(self.expected_value));
        let _ = writeln!(out, "  Risk-Adjusted Value: {}", money(self.risk_adjusted_value));
        let _ = writeln!(out, "  Average Cost: {}", money(self.average_cost));
        let _ = writeln!(out, "  Average Duration: {}", span(self.average_duration));

        if let Some(path) = &self.recommended {
            let _ = writeln!(out, "\nRecommended Path: {}", path.path_id);
            let _ = writeln!(out, "  Outcome: {}", path.outcome.label());
            let _ = writeln!(out, "  Probability: {:.1}%", path.probability * 100.0);
            let _ = writeln!(out, "  Cost: {}", money(path.total_cost));
            let _ = writeln!(out, "  Duration: {}", span(path.total_duration));
            let _ = writeln!(
                out,
                "  Risk Score: {:.2} ({})",
                path.risk_score,
                path.risk_level.label()
            );
            let _ = writeln!(out, "  Actions: {}", path.action_count);
            if !path.effects.is_empty() {
                let _ = writeln!(out, "\n  Second-Order Effects:");
                for effect in &path.effects {
                    let _ = writeln!(
                        out,
                        "    - {} (p={:.2}, impact={:+.2})",
                        effect.description, effect.probability, effect.impact_magnitude
                    );
                }
            }
        }

        if !self.ordering_caveats.is_empty() {
            let _ = writeln!(out, "\nOrdering Caveats:");
            for caveat in &self.ordering_caveats {
                let _ = writeln!(out, "  - {caveat}");
            }
        }

        let _ = writeln!(out, "\nOutcome Distribution:");
        for share in &self.outcome_distribution {
            let _ = writeln!(
                out,
                "  {}: {} ({:.1}%)",
                share.outcome.label(),
                share.count,
                share.percentage
            );
        }
        out
    }
}

/// `$1,234.50` style amount; negatives carry a leading minus.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}

fn span(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (days, rem) = (secs / 86_400, secs % 86_400);
    let (hours, rem) = (rem / 3_600, rem % 3_600);
    let minutes = rem / 60;
    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else {
        format!("{hours}h {minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        methods::SimulationMode,
        model::{Action, SimulationPath},
    };
    use std::sync::Arc;

    fn sample_result() -> ScenarioResult {
        let elapsed = Duration::from_secs(86_400 + 7_200);
        let action = Arc::new(Action::new("deploy", elapsed, 12_000.0, 1.0));
        let effects: Vec<SecondOrderEffect> = (0..7)
            .map(|i| SecondOrderEffect::new("deploy", format!("effect {i}"), 0.5, -0.1, vec![]))
            .collect();
        let path = SimulationPath::new(
            "mc_0".into(),
            vec![action],
            OutcomeType::Success,
            12_000.0,
            elapsed,
            1.0,
            effects,
            0.4,
        );
        ScenarioResult {
            run_id: Uuid::new_v4(),
            scenario_name: "Launch".into(),
            mode: SimulationMode::MonteCarlo,
            seed: 9,
            risk_tolerance: 0.5,
            paths: vec![path],
            expected_value: 88_000.0,
            risk_adjusted_value: 70_400.0,
            success_rate: 1.0,
            average_cost: 12_000.0,
            average_duration: elapsed,
            recommended: Some(0),
            unresolved: Vec::new(),
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn report_caps_effects_and_covers_every_outcome() {
        let result = sample_result();
        let report = SimulationReportBuilder::new().result(&result).build();
        assert_eq!(report.simulations_run, 1);
        let recommended = report.recommended.as_ref().unwrap();
        assert_eq!(recommended.effects.len(), 5);
        assert_eq!(recommended.risk_level, RiskLevel::Medium);
        assert_eq!(report.outcome_distribution.len(), 4);
        assert!((report.outcome_distribution[0].percentage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn render_contains_key_sections() {
        let result = sample_result();
        let text = SimulationReportBuilder::new()
            .result(&result)
            .effect_limit(2)
            .build()
            .render();
        assert!(text.contains("Scenario: Launch"));
        assert!(text.contains("Expected Value: $88,000.00"));
        assert!(text.contains("Recommended Path: mc_0"));
        assert!(text.contains("Duration: 1d 2h 0m"));
        assert!(text.contains("effect 1"));
        assert!(!text.contains("effect 2"));
        assert!(text.contains("catastrophic: 0 (0.0%)"));
    }

    #[test]
    fn builder_without_result_is_empty() {
        let report = SimulationReportBuilder::default().build();
        assert_eq!(report.simulations_run, 0);
        assert!(report.recommended.is_none());
        assert_eq!(report.outcome_distribution.len(), 4);
    }

    #[test]
    fn money_groups_thousands() {
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(1_234_567.891), "$1,234,567.89");
        assert_eq!(money(-10_000.0), "-$10,000.00");
        assert_eq!(money(999.5), "$999.50");
    }
}
