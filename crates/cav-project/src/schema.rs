//! Case file schema.
//!
//! Every field has a default so an empty document describes the reference
//! cavity case.

use cav_core::Real;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn latest_version() -> u32 {
    crate::migrate::LATEST_VERSION
}

fn default_name() -> String {
    "cavity".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseConfig {
    #[serde(default = "latest_version")]
    pub version: u32,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub physics: PhysicsDef,
    #[serde(default)]
    pub grid: GridDef,
    #[serde(default)]
    pub numerics: NumericsDef,
    #[serde(default)]
    pub mode: ModeDef,
    #[serde(default)]
    pub output: OutputDef,
    /// Restart record to continue from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart: Option<PathBuf>,
}

impl Default for CaseConfig {
    fn default() -> Self {
        Self {
            version: latest_version(),
            name: default_name(),
            physics: PhysicsDef::default(),
            grid: GridDef::default(),
            numerics: NumericsDef::default(),
            mode: ModeDef::default(),
            output: OutputDef::default(),
            restart: None,
        }
    }
}

/// Fluid properties, lid speed and domain box, all SI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsDef {
    pub rho_kg_m3: Real,
    pub uinf_m_s: Real,
    pub re: Real,
    pub pinf_pa: Real,
    pub xmin_m: Real,
    pub xmax_m: Real,
    pub ymin_m: Real,
    pub ymax_m: Real,
}

impl Default for PhysicsDef {
    fn default() -> Self {
        Self {
            rho_kg_m3: 1.0,
            uinf_m_s: 1.0,
            re: 10.0,
            pinf_pa: 0.801333844662,
            xmin_m: 0.0,
            xmax_m: 0.05,
            ymin_m: 0.0,
            ymax_m: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GridDef {
    pub nx: usize,
    pub ny: usize,
}

impl Default for GridDef {
    fn default() -> Self {
        Self { nx: 65, ny: 65 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchemeDef {
    #[default]
    Sgs,
    PointJacobi,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DtMinDef {
    #[default]
    LastNode,
    GlobalMinimum,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NumericsDef {
    pub cfl: Real,
    /// Fourth-order dissipation coefficients
    pub cx: Real,
    pub cy: Real,
    /// Preconditioning constant
    pub rkappa: Real,
    pub toler: Real,
    pub max_iterations: usize,
    pub scheme: SchemeDef,
    pub dtmin: DtMinDef,
    /// Relax Point-Jacobi rows in parallel
    pub parallel: bool,
}

impl Default for NumericsDef {
    fn default() -> Self {
        Self {
            cfl: 0.8,
            cx: 0.01,
            cy: 0.01,
            rkappa: 0.1,
            toler: 1e-10,
            max_iterations: 100_000,
            scheme: SchemeDef::default(),
            dtmin: DtMinDef::default(),
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModeDef {
    #[default]
    Cavity,
    Manufactured,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OutputDef {
    /// Iterations between field snapshots and restart records
    pub iterout: usize,
    /// Iterations between residual history lines
    pub residual_out: usize,
}

impl Default for OutputDef {
    fn default() -> Self {
        Self {
            iterout: 500,
            residual_out: 10,
        }
    }
}
