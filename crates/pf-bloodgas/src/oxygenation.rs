//! Oxygen dissociation and content.
//!
//! Saturation follows the Siggaard-Andersen tanh form of the dissociation
//! curve, shifted by pH (Bohr effect), base excess, 2,3-DPG and temperature.
//! Total content is hemoglobin-bound plus dissolved oxygen.

use pf_core::units::{as_kpa, constants, mmhg};
use pf_solver::{BrentConfig, brent};
use tracing::debug;

use crate::error::{BloodGasError, BloodGasResult};

/// O2 solubility in blood (mmol/L per kPa).
pub const ALPHA_O2: f64 = 0.0105;
/// Wide fallback bracket for po2 (mmHg).
pub const PO2_WIDE: (f64, f64) = (0.1, 1000.0);
/// Narrow bracket around the previous solution, as multipliers.
pub const PO2_NARROW: (f64, f64) = (0.8, 1.25);

const Y0: f64 = 1.875;
const X0_REF: f64 = 1.946;
const H0_REF: f64 = 3.5;
const K_TANH: f64 = 0.5343;
const STANDARD_TEMP_K: f64 = 310.15;

/// Conditions that shift the dissociation curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OdcParams {
    pub ph: f64,
    /// Base excess (mmol/L)
    pub be: f64,
    /// Celsius
    pub temp_c: f64,
    /// 2,3-DPG (mmol/L)
    pub dpg: f64,
}

impl Default for OdcParams {
    fn default() -> Self {
        Self {
            ph: 7.4,
            be: 0.0,
            temp_c: constants::BODY_TEMP_C,
            dpg: 5.0,
        }
    }
}

/// Hemoglobin saturation fraction at `po2` (mmHg).
pub fn saturation(po2_mmhg: f64, params: &OdcParams) -> f64 {
    if po2_mmhg <= 0.0 {
        return 0.0;
    }
    let x = as_kpa(mmhg(po2_mmhg)).ln();

    let a = 1.04 * (7.4 - params.ph) + 0.005 * params.be + 0.07 * (params.dpg - 5.0);
    let b = 0.055 * (params.temp_c + constants::KELVIN_OFFSET - STANDARD_TEMP_K);
    let x0 = X0_REF + a + b;
    let h0 = H0_REF + a;

    let y = Y0 + x - x0 + h0 * (K_TANH * (x - x0)).tanh();
    1.0 / (1.0 + (-y).exp())
}

/// Total oxygen content at a given po2.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OxygenContent {
    /// Target total O2 (mmol/L)
    pub to2: f64,
    /// Hemoglobin (mmol/L)
    pub hemoglobin: f64,
    pub odc: OdcParams,
}

impl OxygenContent {
    pub fn content(&self, po2_mmhg: f64) -> f64 {
        let so2 = saturation(po2_mmhg, &self.odc);
        self.hemoglobin * so2 + ALPHA_O2 * as_kpa(mmhg(po2_mmhg))
    }

    pub fn residual(&self, po2_mmhg: f64) -> f64 {
        self.content(po2_mmhg) - self.to2
    }
}

/// Solved oxygenation state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Oxygenation {
    /// mmHg
    pub po2: f64,
    /// Fraction in `[0, 1]`
    pub so2: f64,
}

/// po2 (mmHg) at half saturation.
pub fn p50(params: &OdcParams) -> BloodGasResult<f64> {
    brent(
        |po2| saturation(po2, params) - 0.5,
        PO2_WIDE.0,
        PO2_WIDE.1,
        &BrentConfig::default().with_f_tol(1e-10),
    )
    .map(|sol| sol.x)
    .map_err(BloodGasError::Oxygenation)
}

/// Solve for the po2 at which total content equals `to2`.
pub fn solve_oxygenation(
    to2: f64,
    hemoglobin: f64,
    odc: OdcParams,
    hint: Option<f64>,
    config: &BrentConfig,
) -> BloodGasResult<Oxygenation> {
    if !(to2.is_finite() && to2 >= 0.0) {
        return Err(BloodGasError::InvalidComposition {
            what: "to2 must be finite and non-negative",
        });
    }
    if !(hemoglobin.is_finite() && hemoglobin >= 0.0) {
        return Err(BloodGasError::InvalidComposition {
            what: "hemoglobin must be finite and non-negative",
        });
    }

    let problem = OxygenContent {
        to2,
        hemoglobin,
        odc,
    };
    let narrow = hint
        .filter(|h| h.is_finite() && *h > 0.0)
        .map(|h| (h * PO2_NARROW.0, h * PO2_NARROW.1));

    let po2 = crate::blood_gas::bracketed(
        |po2| problem.residual(po2),
        narrow,
        PO2_WIDE,
        config,
        "oxygenation",
    )
    .map_err(BloodGasError::Oxygenation)?;

    let so2 = saturation(po2, &odc);
    debug!(po2, so2, "oxygenation solved");
    Ok(Oxygenation { po2, so2 })
}
