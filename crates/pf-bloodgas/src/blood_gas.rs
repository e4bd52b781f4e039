//! Combined blood-gas evaluation.
//!
//! Acid-base is solved first because the dissociation curve depends on the
//! resulting pH and base excess. A sample either yields a complete
//! [`BloodGas`] or an error; there is no partially updated result.

use pf_core::units::constants;
use pf_solver::{BrentConfig, SolverError, SolverResult, brent};
use rayon::prelude::*;
use tracing::debug;

use crate::acid_base::solve_acid_base;
use crate::composition::{BloodContent, Solute, Solutes};
use crate::error::BloodGasResult;
use crate::oxygenation::{OdcParams, solve_oxygenation};

/// Inputs of one blood-gas evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BloodSample {
    pub to2: f64,
    pub tco2: f64,
    pub solutes: Solutes,
    /// Celsius
    pub temp_c: f64,
}

impl BloodSample {
    pub fn from_content(content: &BloodContent, temp_c: f64) -> Self {
        Self {
            to2: content.to2,
            tco2: content.tco2,
            solutes: content.solutes,
            temp_c,
        }
    }
}

impl Default for BloodSample {
    fn default() -> Self {
        Self::from_content(&BloodContent::default(), constants::BODY_TEMP_C)
    }
}

/// Derived blood-gas snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BloodGas {
    pub ph: f64,
    /// mmHg
    pub pco2: f64,
    /// mmHg
    pub po2: f64,
    /// Fraction in `[0, 1]`
    pub so2: f64,
    /// mmol/L
    pub hco3: f64,
    /// mmol/L
    pub be: f64,
    /// Hydrogen ion concentration (mmol/L); also the next acid-base hint
    pub hp: f64,
}

/// Solve acid-base then oxygenation for `sample`.
///
/// `previous` seeds the narrow brackets of both solves.
pub fn solve_blood_gas(sample: &BloodSample, previous: Option<&BloodGas>) -> BloodGasResult<BloodGas> {
    let config = BrentConfig::default();

    let ab = solve_acid_base(sample.tco2, &sample.solutes, previous.map(|p| p.hp), &config)?;

    let odc = OdcParams {
        ph: ab.ph,
        be: ab.be,
        temp_c: sample.temp_c,
        dpg: sample.solutes.get(Solute::Dpg),
    };
    let ox = solve_oxygenation(
        sample.to2,
        sample.solutes.get(Solute::Hemoglobin),
        odc,
        previous.map(|p| p.po2),
        &config,
    )?;

    Ok(BloodGas {
        ph: ab.ph,
        pco2: ab.pco2,
        po2: ox.po2,
        so2: ox.so2,
        hco3: ab.hco3,
        be: ab.be,
        hp: ab.hp,
    })
}

/// Evaluate independent samples in parallel; results keep input order.
pub fn solve_batch(samples: &[BloodSample]) -> Vec<BloodGasResult<BloodGas>> {
    samples
        .par_iter()
        .map(|sample| solve_blood_gas(sample, None))
        .collect()
}

/// Root of `f`, trying `narrow` first and falling back to `wide`.
pub(crate) fn bracketed<F>(
    mut f: F,
    narrow: Option<(f64, f64)>,
    wide: (f64, f64),
    config: &BrentConfig,
    label: &'static str,
) -> SolverResult<f64>
where
    F: FnMut(f64) -> f64,
{
    if let Some((lo, hi)) = narrow {
        match brent(&mut f, lo, hi, config) {
            Ok(sol) => return Ok(sol.x),
            Err(SolverError::NotBracketed { .. }) => {
                debug!(solve = label, lo, hi, "narrow bracket missed, widening");
            }
            Err(e) => return Err(e),
        }
    }
    brent(&mut f, wide.0, wide.1, config).map(|sol| sol.x)
}
