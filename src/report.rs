//! Interpretation of solver output
//!
//! Turns a raw throughput vector into per-process and per-item figures,
//! snaps solver noise to zero and derives the utilization analysis.

use std::fmt;

use serde::Serialize;

use crate::error::{PlanError, Result};
use crate::matrix::NetFlowMatrix;
use crate::models::ItemId;
use crate::plan::{ItemRole, ResolvedPlan};
use crate::solver::{self, LpOutcome, Objective, SolveOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    /// No non-negative throughputs satisfy the constraints.
    Infeasible,
    /// The objective can grow without limit.
    Unbounded,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessThroughput {
    pub process: String,
    pub rate: f64,
    pub cap: Option<f64>,
}

impl ProcessThroughput {
    /// Share of the cap in use. `None` for uncapped or zero-capacity processes.
    pub fn utilization(&self) -> Option<f64> {
        self.cap.filter(|c| *c > 0.0).map(|c| self.rate / c)
    }

    pub fn unused_capacity(&self) -> Option<f64> {
        self.cap.map(|c| (c - self.rate).max(0.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemBalance {
    pub item: String,
    pub role: ItemRole,
    /// Net production rate; negative means net consumption.
    pub net_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub objective: Objective,
    /// Objective value at the optimum.
    pub objective_value: Option<f64>,
    /// One entry per process, in registry order. Empty unless optimal.
    pub throughputs: Vec<ProcessThroughput>,
    /// One entry per item, in registry order. Empty unless optimal.
    pub item_balances: Vec<ItemBalance>,
    /// Capped processes running near their cap, if they are few enough to
    /// single out.
    pub bottlenecks: Vec<String>,
    /// Balance constraints the snapped solution misses by more than the
    /// tolerance. Empty for any solution the solver reports as optimal.
    pub violations: Vec<String>,
    /// Absolute tolerance used for snapping.
    pub tolerance: f64,
}

/// Build the report for `outcome`.
pub fn interpret(
    matrix: &NetFlowMatrix,
    plan: &ResolvedPlan,
    outcome: LpOutcome,
    options: &SolveOptions,
) -> SolveResult {
    let raw = match outcome {
        LpOutcome::Optimal { throughputs } => throughputs,
        LpOutcome::Infeasible => return SolveResult::empty(SolveStatus::Infeasible, options),
        LpOutcome::Unbounded => return SolveResult::empty(SolveStatus::Unbounded, options),
    };

    let tolerance = options.epsilon * flow_scale(matrix, &raw);
    let x: Vec<f64> = raw.iter().map(|&v| snap(v, tolerance)).collect();

    let throughputs: Vec<ProcessThroughput> = matrix
        .process_order()
        .iter()
        .zip(&x)
        .zip(&plan.caps)
        .map(|((name, &rate), &cap)| ProcessThroughput {
            process: name.clone(),
            rate,
            cap,
        })
        .collect();

    let item_balances: Vec<ItemBalance> = matrix
        .apply(&x)
        .into_iter()
        .enumerate()
        .map(|(i, net)| ItemBalance {
            item: matrix.item_order()[i].clone(),
            role: plan.role(ItemId(i as u32)),
            net_rate: snap(net, tolerance),
        })
        .collect();

    let objective_value = match options.objective {
        Objective::MaximizeTargets => plan
            .targets
            .iter()
            .map(|&t| solver::target_weight(plan, t) * item_balances[t.index()].net_rate)
            .sum(),
        Objective::MinimizeThroughput => x.iter().sum(),
    };

    let violations = item_balances
        .iter()
        .filter_map(|b| violation(b, tolerance))
        .collect();
    let bottlenecks = find_bottlenecks(&throughputs, options);

    SolveResult {
        status: SolveStatus::Optimal,
        objective: options.objective,
        objective_value: Some(objective_value),
        throughputs,
        item_balances,
        bottlenecks,
        violations,
        tolerance,
    }
}

/// Largest single flow in the solution, floored at 1.
fn flow_scale(matrix: &NetFlowMatrix, x: &[f64]) -> f64 {
    let mut scale: f64 = 1.0;
    for i in 0..matrix.rows() {
        for (a, v) in matrix.row(ItemId(i as u32)).iter().zip(x) {
            scale = scale.max((a * v).abs());
        }
    }
    for v in x {
        scale = scale.max(v.abs());
    }
    scale
}

fn snap(value: f64, tolerance: f64) -> f64 {
    if value.abs() <= tolerance { 0.0 } else { value }
}

fn violation(balance: &ItemBalance, tolerance: f64) -> Option<String> {
    let net = balance.net_rate;
    match balance.role {
        ItemRole::Intermediate if net != 0.0 => Some(format!(
            "intermediate `{}` does not balance (net {net})",
            balance.item
        )),
        ItemRole::Target { rate } | ItemRole::AvailableTarget { rate, .. }
            if net < rate - tolerance =>
        {
            Some(format!(
                "target `{}` produced at {net}, below required {rate}",
                balance.item
            ))
        }
        ItemRole::Available { cap: Some(cap) } if net < -cap - tolerance => Some(format!(
            "available `{}` consumed at {}, above cap {cap}",
            balance.item, -net
        )),
        _ => None,
    }
}

fn find_bottlenecks(throughputs: &[ProcessThroughput], options: &SolveOptions) -> Vec<String> {
    let capped = throughputs.iter().filter(|t| t.cap.is_some()).count();
    let hot: Vec<String> = throughputs
        .iter()
        .filter(|t| {
            t.utilization()
                .is_some_and(|u| u > options.bottleneck_threshold)
        })
        .map(|t| t.process.clone())
        .collect();

    // When most of the factory runs flat out it is simply well proportioned.
    if hot.len() as f64 <= options.bottleneck_share * capped as f64 {
        hot
    } else {
        Vec::new()
    }
}

impl SolveResult {
    fn empty(status: SolveStatus, options: &SolveOptions) -> Self {
        Self {
            status,
            objective: options.objective,
            objective_value: None,
            throughputs: Vec::new(),
            item_balances: Vec::new(),
            bottlenecks: Vec::new(),
            violations: Vec::new(),
            tolerance: options.epsilon,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    /// Turn a non-optimal status into the matching error.
    pub fn require_optimal(self) -> Result<Self> {
        match self.status {
            SolveStatus::Optimal => Ok(self),
            SolveStatus::Infeasible => Err(PlanError::NumericInfeasibility),
            SolveStatus::Unbounded => Err(PlanError::Unbounded),
        }
    }

    pub fn throughput(&self, process: &str) -> Option<f64> {
        self.throughputs
            .iter()
            .find(|t| t.process == process)
            .map(|t| t.rate)
    }

    pub fn balance(&self, item: &str) -> Option<f64> {
        self.item_balances
            .iter()
            .find(|b| b.item == item)
            .map(|b| b.net_rate)
    }

    /// Net production of every target item.
    pub fn produced(&self) -> impl Iterator<Item = (&str, f64)> {
        self.item_balances
            .iter()
            .filter(|b| b.role.is_target())
            .map(|b| (b.item.as_str(), b.net_rate))
    }

    /// Net consumption of every available item that is drawn on.
    pub fn consumed(&self) -> impl Iterator<Item = (&str, f64)> {
        self.item_balances
            .iter()
            .filter(|b| b.role.is_available() && b.net_rate < 0.0)
            .map(|b| (b.item.as_str(), -b.net_rate))
    }

    pub fn total_unused_capacity(&self) -> f64 {
        self.throughputs
            .iter()
            .filter_map(ProcessThroughput::unused_capacity)
            .sum()
    }

    /// True when the solution is optimal and every balance constraint holds
    /// within tolerance.
    pub fn is_balanced(&self) -> bool {
        self.is_optimal() && self.violations.is_empty()
    }
}

impl fmt::Display for SolveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Production Plan ===")?;
        let goal = match self.objective {
            Objective::MaximizeTargets => "weighted target output",
            Objective::MinimizeThroughput => "total throughput",
        };
        match self.objective_value {
            Some(value) => writeln!(f, "Status: {} ({goal} = {value:.3})", self.status)?,
            None => writeln!(f, "Status: {}", self.status)?,
        }
        if !self.is_optimal() {
            return Ok(());
        }
        if self.violations.is_empty() {
            writeln!(f, "Verdict: feasible, all balances hold")?;
        } else {
            writeln!(f, "Verdict: tolerance exceeded")?;
            for v in &self.violations {
                writeln!(f, "  {v}")?;
            }
        }
        writeln!(f)?;

        writeln!(f, "Throughput:")?;
        for t in &self.throughputs {
            match t.utilization() {
                Some(u) => writeln!(
                    f,
                    "  {:.3}x {} ({:.0}% of {})",
                    t.rate,
                    t.process,
                    u * 100.0,
                    t.cap.unwrap_or(0.0)
                )?,
                None => writeln!(f, "  {:.3}x {}", t.rate, t.process)?,
            }
        }
        writeln!(f)?;

        writeln!(f, "Produces:")?;
        for (item, rate) in self.produced() {
            writeln!(f, "  {item} @ {rate:.3}/t")?;
        }
        writeln!(f)?;

        writeln!(f, "Consumes:")?;
        for (item, rate) in self.consumed() {
            writeln!(f, "  {item} @ {rate:.3}/t")?;
        }
        writeln!(f)?;

        writeln!(f, "Bottlenecks:")?;
        if self.bottlenecks.is_empty() {
            writeln!(f, "  none significant")?;
        }
        for name in &self.bottlenecks {
            writeln!(f, "  {name}")?;
        }
        writeln!(f)?;

        writeln!(f, "Unused capacity:")?;
        for t in &self.throughputs {
            if let Some(unused) = t.unused_capacity() {
                writeln!(f, "  {}: {unused:.3}", t.process)?;
            }
        }
        writeln!(f, "  Total: {:.3}", self.total_unused_capacity())?;

        Ok(())
    }
}
