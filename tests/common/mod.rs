//! Shared fixtures for integration tests.

#![allow(dead_code)]

use factory_planner::{Available, ProcessDef, Registry};

pub const EPS: f64 = 1e-6;

pub fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("value present");
    assert!(
        (actual - expected).abs() <= EPS * expected.abs().max(1.0),
        "expected {expected}, got {actual}"
    );
}

/// Raw iron mined from nothing, pressed two-to-one into gears.
pub fn gear_line() -> Registry {
    Registry::from_defs(
        ["iron", "gear"],
        [
            ProcessDef::new("raw").output("iron", 1.0),
            ProcessDef::new("gear").input("iron", 2.0).output("gear", 1.0),
        ],
    )
    .expect("valid registry")
}

/// A small oxygen economy: electrolysis with hydrogen burn-off, a water
/// sieve, an algae terrarium and a few processes that cannot run from the
/// materials in [`oxygen_supply`].
pub fn oxygen_base() -> Registry {
    Registry::from_defs(
        [
            "Water",
            "DirtyWater",
            "Sand",
            "ToxicSand",
            "Oxygen",
            "Hydrogen",
            "Algae",
            "IronOre",
            "Iron",
            "Coal",
            "CarbonDioxide",
            "Methane",
        ],
        [
            ProcessDef::new("Electrolyzer")
                .input("Water", 1.0)
                .output("Oxygen", 0.888)
                .output("Hydrogen", 0.112)
                .machines(2.0),
            ProcessDef::new("HydrogenGenerator").input("Hydrogen", 0.1),
            ProcessDef::new("WaterSieve")
                .input("DirtyWater", 5.0)
                .input("Sand", 1.0)
                .output("Water", 5.0)
                .output("ToxicSand", 0.2),
            ProcessDef::new("AlgaeTerrarium")
                .input("Algae", 0.030)
                .input("Water", 0.300)
                .output("Oxygen", 0.040)
                .output("DirtyWater", 0.290),
            // 100kg per 200s cycle
            ProcessDef::new("MetalRefinery")
                .input("IronOre", 100.0)
                .output("Iron", 100.0)
                .time_per_op(200.0)
                .machines(1.0),
            ProcessDef::new("CoalGenerator")
                .input("Coal", 1.0)
                .output("CarbonDioxide", 0.02),
            ProcessDef::new("MethaneGenerator")
                .input("Methane", 0.090)
                .output("CarbonDioxide", 0.0225)
                .output("DirtyWater", 0.0675),
        ],
    )
    .expect("valid registry")
}

/// Polluted water and sand on tap, a trickle of algae, and room to dump
/// toxic sand.
pub fn oxygen_supply() -> Available {
    Available::new()
        .with_cap("DirtyWater", 10.0)
        .with("Sand")
        .with_cap("Algae", 0.03)
        .with("ToxicSand")
}
