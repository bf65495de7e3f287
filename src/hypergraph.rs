//! Item hypergraph
//!
//! Items are vertices and every process is a hyperedge from the items it
//! consumes (tail) to the items it produces (head). The graph is derived from
//! a registry snapshot and never mutated.

use crate::error::{MalformedReason, PlanError, Result};
use crate::models::{ItemId, ProcessId};
use crate::registry::Registry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hyperedge {
    pub process: ProcessId,
    pub tail: Vec<ItemId>,
    pub head: Vec<ItemId>,
}

#[derive(Debug, Clone)]
pub struct Hypergraph {
    edges: Vec<Hyperedge>,
    consumers: Vec<Vec<ProcessId>>,
    producers: Vec<Vec<ProcessId>>,
}

impl Hypergraph {
    /// Build the hypergraph of `registry`.
    ///
    /// Fails if a process lists the same item among both its inputs and its
    /// outputs: such a self-loop has no unambiguous direction.
    pub fn build(registry: &Registry) -> Result<Self> {
        let n = registry.item_count();
        let mut consumers = vec![Vec::new(); n];
        let mut producers = vec![Vec::new(); n];
        let mut edges = Vec::with_capacity(registry.process_count());

        for process in registry.processes() {
            if let Some(flow) = process
                .inputs
                .iter()
                .find(|i| process.outputs.iter().any(|o| o.item == i.item))
            {
                return Err(PlanError::MalformedProcess {
                    process: process.name.clone(),
                    reason: MalformedReason::SelfLoop(registry.item_name(flow.item)),
                });
            }

            let tail: Vec<ItemId> = process.inputs.iter().map(|f| f.item).collect();
            let head: Vec<ItemId> = process.outputs.iter().map(|f| f.item).collect();
            for item in &tail {
                consumers[item.index()].push(process.id);
            }
            for item in &head {
                producers[item.index()].push(process.id);
            }
            edges.push(Hyperedge {
                process: process.id,
                tail,
                head,
            });
        }

        Ok(Self {
            edges,
            consumers,
            producers,
        })
    }

    pub fn edges(&self) -> &[Hyperedge] {
        &self.edges
    }

    /// `None` for ids that did not come from the registry this graph was
    /// built from.
    pub fn edge(&self, process: ProcessId) -> Option<&Hyperedge> {
        self.edges.get(process.index())
    }

    /// Processes that take `item` as an input.
    pub fn consumers_of(&self, item: ItemId) -> Option<&[ProcessId]> {
        self.consumers.get(item.index()).map(Vec::as_slice)
    }

    /// Processes that list `item` as an output.
    pub fn producers_of(&self, item: ItemId) -> Option<&[ProcessId]> {
        self.producers.get(item.index()).map(Vec::as_slice)
    }

    pub fn vertex_count(&self) -> usize {
        self.producers.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProcessDef;

    #[test]
    fn indexes_producers_and_consumers() {
        let reg = Registry::from_defs(
            ["water", "oxygen", "hydrogen"],
            [
                ProcessDef::new("electrolyzer")
                    .input("water", 1.0)
                    .output("oxygen", 0.888)
                    .output("hydrogen", 0.112),
                ProcessDef::new("h2_generator").input("hydrogen", 0.1),
                ProcessDef::new("pump").output("water", 5.0),
            ],
        )
        .unwrap();
        let graph = Hypergraph::build(&reg).unwrap();

        let water = reg.item_id("water").unwrap();
        let hydrogen = reg.item_id("hydrogen").unwrap();
        assert_eq!(graph.consumers_of(water), Some(&[ProcessId(0)][..]));
        assert_eq!(graph.producers_of(water), Some(&[ProcessId(2)][..]));
        assert_eq!(graph.producers_of(hydrogen), Some(&[ProcessId(0)][..]));
        assert_eq!(graph.consumers_of(hydrogen), Some(&[ProcessId(1)][..]));
        assert!(graph.edge(ProcessId(1)).unwrap().head.is_empty());
        assert_eq!((graph.vertex_count(), graph.edge_count()), (3, 3));
    }

    #[test]
    fn ids_from_a_larger_registry_are_absent() {
        let small = Registry::from_defs(["ore"], [ProcessDef::new("dig").output("ore", 1.0)])
            .unwrap();
        let graph = Hypergraph::build(&small).unwrap();

        assert!(graph.edge(ProcessId(1)).is_none());
        assert!(graph.consumers_of(ItemId(3)).is_none());
        assert!(graph.producers_of(ItemId(3)).is_none());
        assert_eq!(graph.producers_of(ItemId(0)), Some(&[ProcessId(0)][..]));
    }

    #[test]
    fn rejects_self_loops() {
        let reg = Registry::from_defs(
            ["seed", "crop"],
            [ProcessDef::new("farm")
                .input("seed", 1.0)
                .output("crop", 4.0)
                .output("seed", 2.0)],
        )
        .unwrap();
        assert_eq!(
            Hypergraph::build(&reg).unwrap_err(),
            PlanError::MalformedProcess {
                process: "farm".into(),
                reason: MalformedReason::SelfLoop("seed".into()),
            }
        );
    }

    #[test]
    fn zero_rate_overlap_is_not_a_self_loop() {
        let reg = Registry::from_defs(
            ["seed", "crop"],
            [ProcessDef::new("farm")
                .input("seed", 1.0)
                .output("crop", 4.0)
                .output("seed", 0.0)],
        )
        .unwrap();
        assert!(Hypergraph::build(&reg).is_ok());
    }
}
