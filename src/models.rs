//! Data models for items and processes

use serde::{Deserialize, Serialize};

/// Dense index of an item within a registry snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Dense index of a process within a registry snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessId(pub u32);

impl ItemId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl ProcessId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
}

/// One item consumed or produced by a process, in units per unit time at
/// a throughput of 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flow {
    pub item: ItemId,
    pub rate: f64,
}

/// A registered conversion rule. Rates are already normalized by the
/// operation time, so `inputs`/`outputs` are per-unit-time figures.
#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    pub id: ProcessId,
    pub name: String,
    pub inputs: Vec<Flow>,
    pub outputs: Vec<Flow>,
    /// Number of parallel copies available, if limited.
    pub machines: Option<f64>,
}

impl Process {
    /// A process with nothing consumed.
    pub fn is_source(&self) -> bool {
        self.inputs.is_empty()
    }

    /// A process with nothing produced.
    pub fn is_sink(&self) -> bool {
        self.outputs.is_empty()
    }

    pub fn input_rate(&self, item: ItemId) -> f64 {
        rate_of(&self.inputs, item)
    }

    pub fn output_rate(&self, item: ItemId) -> f64 {
        rate_of(&self.outputs, item)
    }
}

fn rate_of(flows: &[Flow], item: ItemId) -> f64 {
    flows
        .iter()
        .find(|f| f.item == item)
        .map(|f| f.rate)
        .unwrap_or(0.0)
}

fn one() -> f64 {
    1.0
}

/// A process as declared by the caller, by item name and per operation.
///
/// Amounts are divided by `time_per_op` at registration to obtain rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessDef {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<(String, f64)>,
    #[serde(default)]
    pub outputs: Vec<(String, f64)>,
    #[serde(default = "one")]
    pub time_per_op: f64,
    #[serde(default)]
    pub machines: Option<f64>,
}

impl ProcessDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            time_per_op: 1.0,
            machines: None,
        }
    }

    pub fn input(mut self, item: impl Into<String>, amount: f64) -> Self {
        self.inputs.push((item.into(), amount));
        self
    }

    pub fn output(mut self, item: impl Into<String>, amount: f64) -> Self {
        self.outputs.push((item.into(), amount));
        self
    }

    pub fn time_per_op(mut self, time: f64) -> Self {
        self.time_per_op = time;
        self
    }

    pub fn machines(mut self, machines: f64) -> Self {
        self.machines = Some(machines);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_def_deserializes_with_defaults() {
        let def: ProcessDef = serde_json::from_str(
            r#"{ "name": "smelt", "inputs": [["ore", 2.0]], "outputs": [["iron", 1.0]] }"#,
        )
        .unwrap();
        assert_eq!(
            def,
            ProcessDef::new("smelt").input("ore", 2.0).output("iron", 1.0)
        );
    }

    #[test]
    fn rate_lookup_defaults_to_zero() {
        let p = Process {
            id: ProcessId(0),
            name: "mine".into(),
            inputs: vec![],
            outputs: vec![Flow { item: ItemId(1), rate: 3.0 }],
            machines: None,
        };
        assert!(p.is_source());
        assert!(!p.is_sink());
        assert_eq!(p.output_rate(ItemId(1)), 3.0);
        assert_eq!(p.output_rate(ItemId(0)), 0.0);
        assert_eq!(p.input_rate(ItemId(1)), 0.0);
    }
}
