//! Ratio solver
//!
//! Finds one non-negative throughput per process such that
//! - every intermediate item balances exactly,
//! - every target item is produced at least at its required rate,
//! - every capped available item is consumed no faster than its cap,
//! - every capped process runs at most at its cap,
//!
//! and the objective is optimal. With [`Objective::MaximizeTargets`] (the
//! default) the objective is the net production of the target items, each
//! weighted by its required rate so the requested mix is kept;
//! with [`Objective::MinimizeThroughput`] it is the total throughput, which
//! reads the targets as exact demand.
//!
//! The structural reachability check runs first; the linear program is only
//! built once every target is known to be derivable.

use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem, Variable};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PlanError, Result};
use crate::hypergraph::Hypergraph;
use crate::matrix::{NetFlowMatrix, build_net_flow_matrix};
use crate::models::{ItemId, ProcessId};
use crate::plan::{self, Available, ItemRole, ProcessCaps, ResolvedPlan, Targets};
use crate::reachability;
use crate::registry::Registry;
use crate::report::{self, SolveResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Maximize the net production of the target items, weighted by their
    /// required rates.
    #[default]
    MaximizeTargets,
    /// Minimize the summed throughput of all processes.
    MinimizeThroughput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    pub objective: Objective,
    /// Relative tolerance below which values are reported as zero.
    pub epsilon: f64,
    /// Utilization above which a capped process counts as a bottleneck.
    pub bottleneck_threshold: f64,
    /// Bottlenecks are only reported when they make up at most this share
    /// of the capped processes.
    pub bottleneck_share: f64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            objective: Objective::MaximizeTargets,
            epsilon: 1e-9,
            bottleneck_threshold: 0.95,
            bottleneck_share: 0.8,
        }
    }
}

/// Raw outcome of the linear program, before interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum LpOutcome {
    Optimal { throughputs: Vec<f64> },
    Infeasible,
    Unbounded,
}

#[derive(Debug, Clone, Default)]
pub struct Solver {
    options: SolveOptions,
}

impl Solver {
    pub fn new(options: SolveOptions) -> Self {
        Self { options }
    }

    /// Run the full pipeline: resolve the request, check reachability, build
    /// the net-flow matrix, solve, and interpret the solution.
    pub fn solve(
        &self,
        registry: &Registry,
        available: &Available,
        targets: &Targets,
        caps: Option<&ProcessCaps>,
    ) -> Result<SolveResult> {
        let plan = plan::resolve(registry, available, targets, caps)?;
        let graph = Hypergraph::build(registry)?;

        let reach = reachability::check_resolved(registry, &graph, &plan);
        if !reach.feasible {
            return Err(PlanError::StructuralInfeasibility {
                unreachable: reach.unreachable_items,
            });
        }

        let matrix = build_net_flow_matrix(registry);
        let outcome = solve_lp(&matrix, &plan, self.options.objective);
        Ok(report::interpret(&matrix, &plan, outcome, &self.options))
    }
}

/// Solve for process ratios with the default options.
pub fn solve_ratios(
    registry: &Registry,
    available: &Available,
    targets: &Targets,
    caps: Option<&ProcessCaps>,
) -> Result<SolveResult> {
    Solver::default().solve(registry, available, targets, caps)
}

/// Objective coefficient of every process.
pub fn objective_coefficients(
    matrix: &NetFlowMatrix,
    plan: &ResolvedPlan,
    objective: Objective,
) -> Vec<f64> {
    (0..matrix.cols())
        .map(|j| match objective {
            Objective::MaximizeTargets => plan
                .targets
                .iter()
                .map(|&t| target_weight(plan, t) * matrix.get(t, ProcessId(j as u32)))
                .sum(),
            Objective::MinimizeThroughput => 1.0,
        })
        .collect()
}

/// Objective weight of a target item: its required rate.
pub(crate) fn target_weight(plan: &ResolvedPlan, item: ItemId) -> f64 {
    plan.role(item).required_rate().unwrap_or(0.0)
}

/// Balance constraint on an item's net production, if its role imposes one.
fn row_bound(role: ItemRole) -> Option<(ComparisonOp, f64)> {
    match role {
        ItemRole::Intermediate => Some((ComparisonOp::Eq, 0.0)),
        ItemRole::Available { cap } => cap.map(|c| (ComparisonOp::Ge, -c)),
        // The demand bound is never looser than the consumption cap.
        ItemRole::Target { rate } | ItemRole::AvailableTarget { rate, .. } => {
            Some((ComparisonOp::Ge, rate))
        }
    }
}

fn holds_at_zero(op: ComparisonOp, rhs: f64) -> bool {
    match op {
        ComparisonOp::Eq => rhs == 0.0,
        ComparisonOp::Ge => rhs <= 0.0,
        ComparisonOp::Le => rhs >= 0.0,
    }
}

pub(crate) fn solve_lp(
    matrix: &NetFlowMatrix,
    plan: &ResolvedPlan,
    objective: Objective,
) -> LpOutcome {
    let direction = match objective {
        Objective::MaximizeTargets => OptimizationDirection::Maximize,
        Objective::MinimizeThroughput => OptimizationDirection::Minimize,
    };
    let mut problem = Problem::new(direction);

    let coefficients = objective_coefficients(matrix, plan, objective);
    let vars: Vec<Variable> = coefficients
        .iter()
        .zip(&plan.caps)
        .map(|(&c, cap)| problem.add_var(c, (0.0, cap.unwrap_or(f64::INFINITY))))
        .collect();

    let mut constraints = 0;
    for i in 0..matrix.rows() {
        let item = ItemId(i as u32);
        let Some((op, rhs)) = row_bound(plan.role(item)) else {
            continue;
        };

        let row = matrix.row(item);
        if row.iter().all(|a| *a == 0.0) {
            // No process touches this item; its net rate is fixed at zero.
            if holds_at_zero(op, rhs) {
                continue;
            }
            warn!(item = i, "item constrained away from zero but untouched by any process");
            return LpOutcome::Infeasible;
        }

        let mut expr = LinearExpr::empty();
        for (var, &a) in vars.iter().zip(row) {
            if a != 0.0 {
                expr.add(*var, a);
            }
        }
        problem.add_constraint(expr, op, rhs);
        constraints += 1;
    }

    debug!(
        items = matrix.rows(),
        processes = matrix.cols(),
        constraints,
        ?objective,
        "solving ratio program"
    );

    if constraints == 0 {
        return solve_box(&coefficients, &plan.caps, objective);
    }

    match problem.solve() {
        Ok(solution) => LpOutcome::Optimal {
            throughputs: vars.iter().map(|&v| solution[v]).collect(),
        },
        Err(minilp::Error::Infeasible) => {
            warn!("ratio program is infeasible");
            LpOutcome::Infeasible
        }
        Err(minilp::Error::Unbounded) => {
            warn!("ratio program is unbounded");
            LpOutcome::Unbounded
        }
    }
}

/// Without balance constraints every throughput is independent: it sits at
/// whichever bound its objective coefficient favours.
fn solve_box(coefficients: &[f64], caps: &[Option<f64>], objective: Objective) -> LpOutcome {
    let mut throughputs = Vec::with_capacity(coefficients.len());
    for (&c, cap) in coefficients.iter().zip(caps) {
        let improves = match objective {
            Objective::MaximizeTargets => c > 0.0,
            Objective::MinimizeThroughput => c < 0.0,
        };
        match (improves, cap) {
            (false, _) => throughputs.push(0.0),
            (true, Some(cap)) => throughputs.push(*cap),
            (true, None) => return LpOutcome::Unbounded,
        }
    }
    LpOutcome::Optimal { throughputs }
}
