//! Factory Planner
//!
//! Steady-state production ratios for a factory of interdependent
//! processes.
//!
//! A request is answered in stages:
//! 1. the [`Registry`] snapshot is viewed as a [`Hypergraph`] of items and
//!    processes,
//! 2. [`check_reachability`] proves every target can be derived from the
//!    available materials at all,
//! 3. [`build_net_flow_matrix`] tabulates the net rate of every item per
//!    unit throughput of every process,
//! 4. [`solve_ratios`] solves the linear program over process throughputs
//!    and interprets the result as a [`SolveResult`].
//!
//! Everything is a pure function of its inputs; a registry is never mutated
//! once built.
//!
//! ```
//! use factory_planner::{Available, ProcessCaps, ProcessDef, Registry, Targets, solve_ratios};
//!
//! let registry = Registry::from_defs(
//!     ["iron", "gear"],
//!     [
//!         ProcessDef::new("mine").output("iron", 1.0),
//!         ProcessDef::new("press").input("iron", 2.0).output("gear", 1.0),
//!     ],
//! )?;
//! let result = solve_ratios(
//!     &registry,
//!     &Available::new(),
//!     &Targets::new().with("gear", 5.0),
//!     Some(&ProcessCaps::new().with("press", 5.0)),
//! )?
//! .require_optimal()?;
//!
//! let mine = result.throughput("mine").unwrap_or_default();
//! assert!((mine - 10.0).abs() < 1e-9);
//! # Ok::<(), factory_planner::PlanError>(())
//! ```

pub mod error;
pub mod hypergraph;
pub mod matrix;
pub mod models;
pub mod plan;
pub mod reachability;
pub mod registry;
pub mod report;
pub mod solver;

pub use error::{MalformedReason, PlanError, Result};
pub use hypergraph::Hypergraph;
pub use matrix::{NetFlowMatrix, build_net_flow_matrix};
pub use models::{ItemId, ProcessDef, ProcessId};
pub use plan::{Available, ItemRole, ProcessCaps, Targets};
pub use reachability::{Reachability, check_reachability};
pub use registry::{Registry, RegistryBuilder};
pub use report::{SolveResult, SolveStatus};
pub use solver::{Objective, SolveOptions, Solver, solve_ratios};
