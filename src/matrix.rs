//! Net-flow matrix
//!
//! Rows are items and columns are processes, both in registry order. Entry
//! `(i, j)` is the net rate at which process `j` produces item `i` when run
//! at a throughput of 1: outputs count positive, inputs negative.

use crate::models::{ItemId, ProcessId};
use crate::registry::Registry;

#[derive(Debug, Clone, PartialEq)]
pub struct NetFlowMatrix {
    items: Vec<String>,
    processes: Vec<String>,
    /// Row-major, `items.len() * processes.len()`.
    data: Vec<f64>,
}

/// Build the net-flow matrix of `registry`.
pub fn build_net_flow_matrix(registry: &Registry) -> NetFlowMatrix {
    let rows = registry.item_count();
    let cols = registry.process_count();
    let mut data = vec![0.0; rows * cols];

    for process in registry.processes() {
        let j = process.id.index();
        for flow in &process.inputs {
            data[flow.item.index() * cols + j] -= flow.rate;
        }
        for flow in &process.outputs {
            data[flow.item.index() * cols + j] += flow.rate;
        }
    }

    NetFlowMatrix {
        items: registry.items().iter().map(|i| i.name.clone()).collect(),
        processes: registry.processes().iter().map(|p| p.name.clone()).collect(),
        data,
    }
}

impl NetFlowMatrix {
    pub fn rows(&self) -> usize {
        self.items.len()
    }

    pub fn cols(&self) -> usize {
        self.processes.len()
    }

    /// Item names, in row order.
    pub fn item_order(&self) -> &[String] {
        &self.items
    }

    /// Process names, in column order.
    pub fn process_order(&self) -> &[String] {
        &self.processes
    }

    pub fn get(&self, item: ItemId, process: ProcessId) -> f64 {
        self.data[item.index() * self.cols() + process.index()]
    }

    pub fn row(&self, item: ItemId) -> &[f64] {
        let cols = self.cols();
        let start = item.index() * cols;
        &self.data[start..start + cols]
    }

    /// Net production rate of every item for the throughput vector `x`.
    pub fn apply(&self, x: &[f64]) -> Vec<f64> {
        assert_eq!(x.len(), self.cols(), "one throughput per process");
        (0..self.rows())
            .map(|i| {
                self.row(ItemId(i as u32))
                    .iter()
                    .zip(x)
                    .map(|(a, x)| a * x)
                    .sum()
            })
            .collect()
    }
}
