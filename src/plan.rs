//! Planning requests: what to make, what may be consumed, and how far each
//! process may be pushed.
//!
//! These are keyed by name so that callers can build them without a
//! registry at hand; [`resolve`] checks them against a snapshot and turns
//! them into index-based form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::models::ItemId;
use crate::registry::{Registry, check_non_negative as check_rate};

/// Items to produce, each with a minimum net rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Targets(pub BTreeMap<String, f64>);

impl Targets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, item: impl Into<String>, rate: f64) -> Self {
        self.0.insert(item.into(), rate);
        self
    }
}

/// Materials that may be consumed without being produced. An entry with a
/// cap limits net consumption to that rate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Available(pub BTreeMap<String, Option<f64>>);

impl Available {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, item: impl Into<String>) -> Self {
        self.0.insert(item.into(), None);
        self
    }

    pub fn with_cap(mut self, item: impl Into<String>, cap: f64) -> Self {
        self.0.insert(item.into(), Some(cap));
        self
    }
}

/// Per-process throughput caps, overriding any declared machine count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessCaps(pub BTreeMap<String, f64>);

impl ProcessCaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, process: impl Into<String>, cap: f64) -> Self {
        self.0.insert(process.into(), cap);
        self
    }
}

/// How an item is constrained in the balance equations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemRole {
    /// Must balance to zero.
    Intermediate,
    /// May be consumed freely, optionally up to a cap.
    Available { cap: Option<f64> },
    /// Must be produced at or above the given rate.
    Target { rate: f64 },
    /// Both available and demanded.
    AvailableTarget { rate: f64, cap: Option<f64> },
}

impl ItemRole {
    pub fn required_rate(&self) -> Option<f64> {
        match *self {
            ItemRole::Target { rate } | ItemRole::AvailableTarget { rate, .. } => Some(rate),
            _ => None,
        }
    }

    pub fn consumption_cap(&self) -> Option<f64> {
        match *self {
            ItemRole::Available { cap } | ItemRole::AvailableTarget { cap, .. } => cap,
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(
            self,
            ItemRole::Available { .. } | ItemRole::AvailableTarget { .. }
        )
    }

    pub fn is_target(&self) -> bool {
        self.required_rate().is_some()
    }
}

/// A request checked against a registry snapshot.
#[derive(Debug, Clone)]
pub struct ResolvedPlan {
    /// One role per registry item, indexed by `ItemId`.
    pub roles: Vec<ItemRole>,
    /// Target items in name order.
    pub targets: Vec<ItemId>,
    /// Available items in name order.
    pub available: Vec<ItemId>,
    /// One upper bound per process, indexed by `ProcessId`.
    pub caps: Vec<Option<f64>>,
}

impl ResolvedPlan {
    pub fn role(&self, item: ItemId) -> ItemRole {
        self.roles[item.index()]
    }
}

/// Check a request against `registry` and assign every item its role.
pub fn resolve(
    registry: &Registry,
    available: &Available,
    targets: &Targets,
    caps: Option<&ProcessCaps>,
) -> Result<ResolvedPlan> {
    let mut roles = vec![ItemRole::Intermediate; registry.item_count()];

    let mut available_ids = Vec::with_capacity(available.0.len());
    for (name, cap) in &available.0 {
        let id = lookup_item(registry, name, "the available set")?;
        if let Some(cap) = cap {
            check_rate(*cap, || format!("consumption cap of `{name}`"))?;
        }
        roles[id.index()] = ItemRole::Available { cap: *cap };
        available_ids.push(id);
    }

    let mut target_ids = Vec::with_capacity(targets.0.len());
    for (name, rate) in &targets.0 {
        let id = lookup_item(registry, name, "the target set")?;
        check_rate(*rate, || format!("target rate of `{name}`"))?;
        roles[id.index()] = match roles[id.index()] {
            ItemRole::Available { cap } => ItemRole::AvailableTarget { rate: *rate, cap },
            _ => ItemRole::Target { rate: *rate },
        };
        target_ids.push(id);
    }

    let mut process_caps: Vec<Option<f64>> =
        registry.processes().iter().map(|p| p.machines).collect();
    if let Some(caps) = caps {
        for (name, cap) in &caps.0 {
            let id = registry
                .process_id(name)
                .ok_or_else(|| PlanError::UnknownProcess(name.clone()))?;
            check_rate(*cap, || format!("throughput cap of `{name}`"))?;
            process_caps[id.index()] = Some(*cap);
        }
    }

    Ok(ResolvedPlan {
        roles,
        targets: target_ids,
        available: available_ids,
        caps: process_caps,
    })
}

fn lookup_item(registry: &Registry, name: &str, referenced_by: &str) -> Result<ItemId> {
    registry.item_id(name).ok_or_else(|| PlanError::UnknownItem {
        item: name.to_string(),
        referenced_by: referenced_by.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProcessDef;

    fn registry() -> Registry {
        Registry::from_defs(
            ["ore", "iron", "gear"],
            [
                ProcessDef::new("smelt")
                    .input("ore", 1.0)
                    .output("iron", 1.0)
                    .machines(4.0),
                ProcessDef::new("press").input("iron", 2.0).output("gear", 1.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn assigns_roles() {
        let reg = registry();
        let plan = resolve(
            &reg,
            &Available::new().with_cap("ore", 10.0).with("gear"),
            &Targets::new().with("gear", 5.0),
            None,
        )
        .unwrap();

        assert_eq!(plan.role(ItemId(0)), ItemRole::Available { cap: Some(10.0) });
        assert_eq!(plan.role(ItemId(1)), ItemRole::Intermediate);
        assert_eq!(
            plan.role(ItemId(2)),
            ItemRole::AvailableTarget { rate: 5.0, cap: None }
        );
        assert_eq!(plan.targets, vec![ItemId(2)]);
        assert_eq!(plan.available, vec![ItemId(2), ItemId(0)]);
    }

    #[test]
    fn explicit_caps_override_machine_counts() {
        let reg = registry();
        let plan = resolve(
            &reg,
            &Available::new(),
            &Targets::new(),
            Some(&ProcessCaps::new().with("press", 2.5)),
        )
        .unwrap();
        assert_eq!(plan.caps, vec![Some(4.0), Some(2.5)]);

        let plan = resolve(
            &reg,
            &Available::new(),
            &Targets::new(),
            Some(&ProcessCaps::new().with("smelt", 1.0)),
        )
        .unwrap();
        assert_eq!(plan.caps, vec![Some(1.0), None]);
    }

    #[test]
    fn rejects_unknown_references() {
        let reg = registry();
        assert!(matches!(
            resolve(&reg, &Available::new(), &Targets::new().with("widget", 1.0), None),
            Err(PlanError::UnknownItem { item, .. }) if item == "widget"
        ));
        assert!(matches!(
            resolve(&reg, &Available::new().with("sand"), &Targets::new(), None),
            Err(PlanError::UnknownItem { item, .. }) if item == "sand"
        ));
        assert_eq!(
            resolve(
                &reg,
                &Available::new(),
                &Targets::new(),
                Some(&ProcessCaps::new().with("weld", 1.0))
            )
            .unwrap_err(),
            PlanError::UnknownProcess("weld".into())
        );
    }

    #[test]
    fn rejects_negative_rates() {
        let reg = registry();
        assert!(matches!(
            resolve(&reg, &Available::new(), &Targets::new().with("gear", -1.0), None),
            Err(PlanError::InvalidRate { .. })
        ));
        assert!(matches!(
            resolve(&reg, &Available::new().with_cap("ore", f64::NAN), &Targets::new(), None),
            Err(PlanError::InvalidRate { .. })
        ));
    }
}
