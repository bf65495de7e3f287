//! Item and process registry
//!
//! Items and processes are registered into a [`RegistryBuilder`] and frozen
//! into an immutable [`Registry`] snapshot. Ids are dense indices assigned
//! in registration order, so every structure derived from a snapshot can use
//! flat array indexing and stays reproducible across rebuilds.

use std::collections::HashMap;

use crate::error::{MalformedReason, PlanError, Result};
use crate::models::{Flow, Item, ItemId, Process, ProcessDef, ProcessId};

#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    items: Vec<Item>,
    item_name_to_id: HashMap<String, ItemId>,
    processes: Vec<Process>,
    process_name_to_id: HashMap<String, ProcessId>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item type. Returns its id.
    pub fn register_item(&mut self, name: &str) -> Result<ItemId> {
        if self.item_name_to_id.contains_key(name) {
            return Err(PlanError::DuplicateItem(name.to_string()));
        }
        let id = ItemId(self.items.len() as u32);
        self.items.push(Item {
            id,
            name: name.to_string(),
        });
        self.item_name_to_id.insert(name.to_string(), id);
        Ok(id)
    }

    /// Register several item types at once, stopping at the first error.
    pub fn register_items<'a>(
        &mut self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<ItemId>> {
        names.into_iter().map(|n| self.register_item(n)).collect()
    }

    /// Register a process. Every referenced item must already be registered.
    ///
    /// Amounts are converted to rates by dividing by `time_per_op`; entries
    /// with a zero amount are dropped.
    pub fn register_process(&mut self, def: ProcessDef) -> Result<ProcessId> {
        if self.process_name_to_id.contains_key(&def.name) {
            return Err(PlanError::DuplicateProcess(def.name));
        }
        if !def.time_per_op.is_finite() || def.time_per_op <= 0.0 {
            return Err(PlanError::InvalidRate {
                what: format!("time per operation of process `{}`", def.name),
                value: def.time_per_op,
            });
        }
        if let Some(machines) = def.machines {
            check_non_negative(machines, || format!("machine count of process `{}`", def.name))?;
        }

        let inputs = self.resolve_flows(&def, &def.inputs, "input")?;
        let outputs = self.resolve_flows(&def, &def.outputs, "output")?;

        let id = ProcessId(self.processes.len() as u32);
        self.processes.push(Process {
            id,
            name: def.name.clone(),
            inputs,
            outputs,
            machines: def.machines,
        });
        self.process_name_to_id.insert(def.name, id);
        Ok(id)
    }

    fn resolve_flows(
        &self,
        def: &ProcessDef,
        entries: &[(String, f64)],
        side: &str,
    ) -> Result<Vec<Flow>> {
        let mut flows: Vec<Flow> = Vec::with_capacity(entries.len());
        let mut seen = Vec::with_capacity(entries.len());
        for (name, amount) in entries {
            let item = self
                .item_name_to_id
                .get(name)
                .copied()
                .ok_or_else(|| PlanError::UnknownItem {
                    item: name.clone(),
                    referenced_by: format!("process `{}`", def.name),
                })?;
            if seen.contains(&item) {
                let reason = if side == "input" {
                    MalformedReason::DuplicateInput(name.clone())
                } else {
                    MalformedReason::DuplicateOutput(name.clone())
                };
                return Err(PlanError::MalformedProcess {
                    process: def.name.clone(),
                    reason,
                });
            }
            seen.push(item);

            check_non_negative(*amount, || {
                format!("{side} `{name}` of process `{}`", def.name)
            })?;
            if *amount == 0.0 {
                continue;
            }
            // A finite amount over a tiny cycle time can still overflow.
            let rate = amount / def.time_per_op;
            check_non_negative(rate, || {
                format!("{side} rate of `{name}` in process `{}`", def.name)
            })?;
            flows.push(Flow { item, rate });
        }
        Ok(flows)
    }

    pub fn item_id(&self, name: &str) -> Option<ItemId> {
        self.item_name_to_id.get(name).copied()
    }

    pub fn process_id(&self, name: &str) -> Option<ProcessId> {
        self.process_name_to_id.get(name).copied()
    }

    /// Freeze the builder into an immutable snapshot.
    pub fn build(self) -> Registry {
        Registry {
            items: self.items,
            item_name_to_id: self.item_name_to_id,
            processes: self.processes,
            process_name_to_id: self.process_name_to_id,
        }
    }
}

pub(crate) fn check_non_negative(value: f64, what: impl FnOnce() -> String) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PlanError::InvalidRate {
            what: what(),
            value,
        })
    }
}

/// Immutable snapshot of items and processes. Cheap to share between
/// threads; edits go through [`Registry::to_builder`] and produce a new
/// snapshot.
#[derive(Debug, Clone)]
pub struct Registry {
    items: Vec<Item>,
    item_name_to_id: HashMap<String, ItemId>,
    processes: Vec<Process>,
    process_name_to_id: HashMap<String, ProcessId>,
}

impl Registry {
    /// Build a snapshot from item names and process definitions in one go.
    pub fn from_defs<'a>(
        items: impl IntoIterator<Item = &'a str>,
        processes: impl IntoIterator<Item = ProcessDef>,
    ) -> Result<Self> {
        let mut builder = RegistryBuilder::new();
        builder.register_items(items)?;
        for def in processes {
            builder.register_process(def)?;
        }
        Ok(builder.build())
    }

    /// Start a new snapshot from this one.
    pub fn to_builder(&self) -> RegistryBuilder {
        RegistryBuilder {
            items: self.items.clone(),
            item_name_to_id: self.item_name_to_id.clone(),
            processes: self.processes.clone(),
            process_name_to_id: self.process_name_to_id.clone(),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.index())
    }

    pub fn process(&self, id: ProcessId) -> Option<&Process> {
        self.processes.get(id.index())
    }

    pub fn item_id(&self, name: &str) -> Option<ItemId> {
        self.item_name_to_id.get(name).copied()
    }

    pub fn process_id(&self, name: &str) -> Option<ProcessId> {
        self.process_name_to_id.get(name).copied()
    }

    /// Name of a registered item. Ids always come from this snapshot, so an
    /// out-of-range id is rendered as its raw index.
    pub fn item_name(&self, id: ItemId) -> String {
        self.item(id)
            .map(|i| i.name.clone())
            .unwrap_or_else(|| format!("#{}", id.0))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }
}
