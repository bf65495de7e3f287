//! Structural reachability of targets
//!
//! Rates are ignored here: the question is only whether each target can be
//! made at all from the available materials through some chain of
//! processes. A process fires once every item it consumes is reachable, and
//! firing makes everything it produces reachable. The closure is monotone,
//! so it terminates and its fixed point does not depend on the order in
//! which processes are visited.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::hypergraph::Hypergraph;
use crate::models::{ItemId, ProcessId};
use crate::plan::{self, Available, ResolvedPlan, Targets};
use crate::registry::Registry;

/// Fixed point of the firing rule, seeded with a set of free items.
#[derive(Debug, Clone)]
pub struct Closure {
    reachable: Vec<bool>,
    fired: Vec<bool>,
}

impl Closure {
    pub fn compute(graph: &Hypergraph, seeds: &[ItemId]) -> Self {
        let mut reachable = vec![false; graph.vertex_count()];
        let mut fired = vec![false; graph.edge_count()];
        // Inputs of each process not yet reachable.
        let mut missing: Vec<usize> = graph.edges().iter().map(|e| e.tail.len()).collect();

        let mut ready: Vec<ProcessId> = graph
            .edges()
            .iter()
            .filter(|e| e.tail.is_empty())
            .map(|e| e.process)
            .collect();
        let mut frontier: Vec<ItemId> = Vec::new();
        for &seed in seeds {
            if !reachable[seed.index()] {
                reachable[seed.index()] = true;
                frontier.push(seed);
            }
        }

        loop {
            while let Some(item) = frontier.pop() {
                for &process in graph.consumers_of(item).unwrap_or_default() {
                    let left = &mut missing[process.index()];
                    *left -= 1;
                    if *left == 0 {
                        ready.push(process);
                    }
                }
            }

            let Some(process) = ready.pop() else {
                break;
            };
            fired[process.index()] = true;
            trace!(process = process.0, "process fires");
            let head = graph.edge(process).map(|e| e.head.as_slice());
            for &item in head.unwrap_or_default() {
                if !reachable[item.index()] {
                    reachable[item.index()] = true;
                    frontier.push(item);
                }
            }
        }

        Self { reachable, fired }
    }

    /// False for items outside the graph the closure was computed on.
    pub fn is_reachable(&self, item: ItemId) -> bool {
        self.reachable.get(item.index()).copied().unwrap_or(false)
    }

    pub fn reachable_items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.reachable
            .iter()
            .enumerate()
            .filter(|(_, r)| **r)
            .map(|(i, _)| ItemId(i as u32))
    }

    pub fn dormant_processes(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.fired
            .iter()
            .enumerate()
            .filter(|(_, f)| !**f)
            .map(|(i, _)| ProcessId(i as u32))
    }
}

/// Outcome of the structural check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reachability {
    pub feasible: bool,
    /// Targets that no chain of processes can make.
    pub unreachable_items: BTreeSet<String>,
    pub reachable_items: BTreeSet<String>,
    /// Processes whose inputs can never all be supplied.
    pub dormant_processes: BTreeSet<String>,
}

/// Check that every target can be derived from the available materials.
pub fn check_reachability(
    registry: &Registry,
    available: &Available,
    targets: &Targets,
) -> Result<Reachability> {
    let plan = plan::resolve(registry, available, targets, None)?;
    let graph = Hypergraph::build(registry)?;
    Ok(check_resolved(registry, &graph, &plan))
}

pub(crate) fn check_resolved(
    registry: &Registry,
    graph: &Hypergraph,
    plan: &ResolvedPlan,
) -> Reachability {
    let closure = Closure::compute(graph, &plan.available);

    let unreachable_items: BTreeSet<String> = plan
        .targets
        .iter()
        .filter(|&&t| !closure.is_reachable(t))
        .map(|&t| registry.item_name(t))
        .collect();
    let reachable_items = closure
        .reachable_items()
        .map(|i| registry.item_name(i))
        .collect();
    let dormant_processes = closure
        .dormant_processes()
        .filter_map(|p| registry.process(p).map(|p| p.name.clone()))
        .collect();

    let feasible = unreachable_items.is_empty();
    if feasible {
        debug!(targets = plan.targets.len(), "all targets reachable");
    } else {
        warn!(unreachable = ?unreachable_items, "targets structurally unreachable");
    }

    Reachability {
        feasible,
        unreachable_items,
        reachable_items,
        dormant_processes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanError;
    use crate::models::ProcessDef;

    fn chain() -> Registry {
        Registry::from_defs(
            ["ore", "coal", "iron", "steel", "gear", "widget"],
            [
                ProcessDef::new("steel_mill")
                    .input("iron", 2.0)
                    .input("coal", 1.0)
                    .output("steel", 1.0),
                ProcessDef::new("smelter").input("ore", 1.0).output("iron", 1.0),
                ProcessDef::new("gear_press").input("steel", 1.0).output("gear", 2.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn reaches_through_multi_input_processes() {
        let reg = chain();
        let result = check_reachability(
            &reg,
            &Available::new().with("ore").with("coal"),
            &Targets::new().with("gear", 1.0),
        )
        .unwrap();
        assert!(result.feasible);
        assert!(result.unreachable_items.is_empty());
        assert!(result.reachable_items.contains("steel"));
        assert!(result.dormant_processes.is_empty());
    }

    #[test]
    fn missing_co_input_blocks_the_chain() {
        let reg = chain();
        let result = check_reachability(
            &reg,
            &Available::new().with("ore"),
            &Targets::new().with("gear", 1.0).with("iron", 1.0),
        )
        .unwrap();
        assert!(!result.feasible);
        assert_eq!(result.unreachable_items, BTreeSet::from(["gear".to_string()]));
        assert_eq!(
            result.dormant_processes,
            BTreeSet::from(["gear_press".to_string(), "steel_mill".to_string()])
        );
    }

    #[test]
    fn unproduced_target_is_unreachable() {
        let reg = chain();
        let result = check_reachability(
            &reg,
            &Available::new().with("ore").with("coal"),
            &Targets::new().with("widget", 1.0),
        )
        .unwrap();
        assert!(!result.feasible);
        assert_eq!(result.unreachable_items, BTreeSet::from(["widget".to_string()]));
    }

    #[test]
    fn sources_fire_without_available_items() {
        let reg = Registry::from_defs(
            ["iron", "gear"],
            [
                ProcessDef::new("mine").output("iron", 1.0),
                ProcessDef::new("press").input("iron", 2.0).output("gear", 1.0),
            ],
        )
        .unwrap();
        let result =
            check_reachability(&reg, &Available::new(), &Targets::new().with("gear", 5.0))
                .unwrap();
        assert!(result.feasible);
    }

    #[test]
    fn available_target_is_trivially_reachable() {
        let reg = chain();
        let result = check_reachability(
            &reg,
            &Available::new().with("widget"),
            &Targets::new().with("widget", 1.0),
        )
        .unwrap();
        assert!(result.feasible);
    }

    #[test]
    fn closure_answers_false_for_foreign_items() {
        let reg = chain();
        let graph = Hypergraph::build(&reg).unwrap();
        let ore = reg.item_id("ore").unwrap();
        let closure = Closure::compute(&graph, &[ore]);

        assert!(closure.is_reachable(ore));
        assert!(closure.is_reachable(reg.item_id("iron").unwrap()));
        assert!(!closure.is_reachable(ItemId(42)));
    }

    #[test]
    fn propagates_resolution_errors() {
        let reg = chain();
        assert!(matches!(
            check_reachability(&reg, &Available::new().with("unobtainium"), &Targets::new()),
            Err(PlanError::UnknownItem { .. })
        ));
    }
}
