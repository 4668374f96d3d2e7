use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use petgraph::{algo::tarjan_scc, graph::DiGraph};

use crate::{
    error::{UnresolvedCause, UnresolvedDependency},
    model::Action,
};

/// Dependency-respecting execution order plus any ordering it could not honor.
#[derive(Debug, Clone, Default)]
pub struct ResolvedOrder {
    /// Every input action exactly once.
    pub actions: Vec<Arc<Action>>,
    /// Actions appended despite unmet dependencies, in append order.
    pub unresolved: Vec<UnresolvedDependency>,
}

impl ResolvedOrder {
    /// True when some action was placed ahead of a dependency.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.unresolved.is_empty()
    }

    /// Names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name.as_str()).collect()
    }
}

/// Orders actions so each follows its dependencies.
///
/// Works in waves: every action whose dependencies are already ordered joins the
/// next wave, in input order. When a wave comes up empty the remaining actions
/// are appended in input order and reported as [`UnresolvedDependency`]: a
/// dangling name is `Missing`, a member of a dependency cycle is `Cycle`, and
/// anything else waiting on one of those is `Blocked`.
#[must_use]
pub fn resolve_order(actions: &[Action]) -> ResolvedOrder {
    resolve_shared(actions.iter().cloned().map(Arc::new).collect())
}

pub(crate) fn resolve_shared(actions: Vec<Arc<Action>>) -> ResolvedOrder {
    let known: HashSet<String> = actions.iter().map(|a| a.name.clone()).collect();
    let mut ordered_names: HashSet<String> = HashSet::with_capacity(actions.len());
    let mut ordered = Vec::with_capacity(actions.len());
    let mut unresolved = Vec::new();
    let mut remaining = actions;

    while !remaining.is_empty() {
        let (ready, blocked): (Vec<_>, Vec<_>) = remaining.into_iter().partition(|action| {
            action
                .dependencies
                .iter()
                .all(|dep| ordered_names.contains(dep))
        });

        if ready.is_empty() {
            let cyclic = cycle_members(&blocked);
            for action in &blocked {
                let unmet: Vec<String> = action
                    .dependencies
                    .iter()
                    .filter(|dep| !ordered_names.contains(*dep))
                    .cloned()
                    .collect();
                let cause = if unmet.iter().any(|dep| !known.contains(dep)) {
                    UnresolvedCause::Missing
                } else if cyclic.contains(action.name.as_str()) {
                    UnresolvedCause::Cycle
                } else {
                    UnresolvedCause::Blocked
                };
                unresolved.push(UnresolvedDependency {
                    action: action.name.clone(),
                    unmet,
                    cause,
                });
            }
            ordered.extend(blocked);
            break;
        }

        ordered_names.extend(ready.iter().map(|a| a.name.clone()));
        ordered.extend(ready);
        remaining = blocked;
    }

    ResolvedOrder {
        actions: ordered,
        unresolved,
    }
}

/// Names of actions on a dependency cycle, self-dependencies included.
fn cycle_members(actions: &[Arc<Action>]) -> HashSet<&str> {
    let mut graph: DiGraph<&str, ()> = DiGraph::with_capacity(actions.len(), actions.len());
    let nodes: HashMap<&str, _> = actions
        .iter()
        .map(|a| (a.name.as_str(), graph.add_node(a.name.as_str())))
        .collect();
    for action in actions {
        let Some(&to) = nodes.get(action.name.as_str()) else {
            continue;
        };
        for dep in &action.dependencies {
            if let Some(&from) = nodes.get(dep.as_str()) {
                graph.update_edge(from, to, ());
            }
        }
    }
    tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .flatten()
        .map(|idx| graph[idx])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn action(name: &str, deps: &[&str]) -> Action {
        deps.iter().fold(
            Action::new(name, Duration::from_secs(60), 100.0, 0.9),
            |a, dep| a.depends_on(*dep),
        )
    }

    fn position(order: &ResolvedOrder, name: &str) -> usize {
        order.names().iter().position(|n| *n == name).unwrap()
    }

    #[test]
    fn dependencies_precede_dependents() {
        let actions = vec![
            action("deploy", &["test"]),
            action("test", &["build", "design"]),
            action("build", &["design"]),
            action("design", &[]),
            action("docs", &["design"]),
        ];
        let order = resolve_order(&actions);
        assert!(!order.is_degraded());
        assert_eq!(order.actions.len(), actions.len());
        for a in &actions {
            for dep in &a.dependencies {
                assert!(position(&order, dep) < position(&order, &a.name));
            }
        }
    }

    #[test]
    fn ready_actions_keep_input_order() {
        let actions = vec![action("c", &[]), action("a", &[]), action("b", &["c"])];
        let order = resolve_order(&actions);
        assert_eq!(order.names(), vec!["c", "a", "b"]);
    }

    #[test]
    fn cycle_terminates_and_is_reported() {
        let actions = vec![
            action("root", &[]),
            action("x", &["y"]),
            action("y", &["x"]),
            action("after", &["y"]),
        ];
        let order = resolve_order(&actions);
        assert_eq!(order.names(), vec!["root", "x", "y", "after"]);
        assert!(order.is_degraded());
        let causes: Vec<_> = order
            .unresolved
            .iter()
            .map(|u| (u.action.as_str(), u.cause))
            .collect();
        assert_eq!(
            causes,
            vec![
                ("x", UnresolvedCause::Cycle),
                ("y", UnresolvedCause::Cycle),
                ("after", UnresolvedCause::Blocked),
            ]
        );
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let order = resolve_order(&[action("loop", &["loop"])]);
        assert_eq!(order.names(), vec!["loop"]);
        assert_eq!(order.unresolved[0].cause, UnresolvedCause::Cycle);
    }

    #[test]
    fn dangling_reference_is_reported_as_missing() {
        let actions = vec![action("a", &[]), action("b", &["ghost"]), action("c", &["a"])];
        let order = resolve_order(&actions);
        assert_eq!(order.names(), vec!["a", "c", "b"]);
        assert_eq!(
            order.unresolved,
            vec![UnresolvedDependency {
                action: "b".into(),
                unmet: vec!["ghost".into()],
                cause: UnresolvedCause::Missing,
            }]
        );
    }

    #[test]
    fn acyclic_plan_behind_dangling_reference_reports_no_cycle() {
        let actions = vec![action("a", &[]), action("b", &["ghost"]), action("c", &["b"])];
        let order = resolve_order(&actions);
        assert_eq!(order.names(), vec!["a", "b", "c"]);
        assert_eq!(order.unresolved.len(), 2);
        assert_eq!(order.unresolved[0].cause, UnresolvedCause::Missing);
        assert_eq!(order.unresolved[1].action, "c");
        assert_eq!(order.unresolved[1].unmet, vec!["b".to_string()]);
        assert_eq!(order.unresolved[1].cause, UnresolvedCause::Blocked);
        assert!(order
            .unresolved
            .iter()
            .all(|u| u.cause != UnresolvedCause::Cycle));
    }

    #[test]
    fn empty_input_yields_empty_order() {
        let order = resolve_order(&[]);
        assert!(order.actions.is_empty());
        assert!(!order.is_degraded());
    }
}
