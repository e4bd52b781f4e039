//! Plasma acid-base equilibrium by charge balance.
//!
//! Hydrogen ion concentration `hp` (mmol/L) is the unknown. For a given total
//! CO2 the carbonic acid system splits into dissolved CO2, bicarbonate and
//! carbonate; the net plasma charge
//!
//! ```text
//! hp + SID - HCO3(hp) - 2·CO3(hp) - OH(hp) - A(pH) - UMA
//! ```
//!
//! increases monotonically with `hp` and is zero at equilibrium.

use pf_solver::BrentConfig;
use tracing::debug;

use crate::composition::{Solute, Solutes};
use crate::error::{BloodGasError, BloodGasResult};

/// First carbonic acid dissociation constant, pK 6.1 (mmol/L).
pub const K1: f64 = 7.943_282_347_242_815e-4;
/// Bicarbonate dissociation constant, pK 10.22 (mmol/L).
pub const K2: f64 = 6.025_595_860_743_578e-8;
/// Water ion product, pKw 13.6 ((mmol/L)^2).
pub const KW: f64 = 2.511_886_431_509_58e-8;
/// CO2 solubility in plasma (mmol/L per mmHg).
pub const ALPHA_CO2: f64 = 0.030_67;

/// Wide fallback bracket for `hp` (mmol/L), pH 10 down to pH 4.
pub const HP_WIDE: (f64, f64) = (1e-7, 1e-1);
/// Narrow bracket around the previous solution, as multipliers.
pub const HP_NARROW: (f64, f64) = (0.9, 1.1);

#[inline]
pub fn ph_from_hp(hp: f64) -> f64 {
    -(hp / 1000.0).log10()
}

#[inline]
pub fn hp_from_ph(ph: f64) -> f64 {
    10f64.powf(-ph) * 1000.0
}

/// Base excess from bicarbonate, pH and hemoglobin (mmol/L).
#[inline]
pub fn base_excess(hco3: f64, ph: f64, hemoglobin: f64) -> f64 {
    (1.0 - 0.023 * hemoglobin) * (hco3 - 24.4 + (2.3 * hemoglobin + 7.7) * (ph - 7.4))
}

/// Context of one charge-balance problem.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChargeBalance {
    pub sid: f64,
    pub tco2: f64,
    pub albumin: f64,
    pub phosphates: f64,
    pub uma: f64,
}

impl ChargeBalance {
    pub fn from_solutes(tco2: f64, solutes: &Solutes) -> Self {
        Self {
            sid: solutes.sid(),
            tco2,
            albumin: solutes.get(Solute::Albumin),
            phosphates: solutes.get(Solute::Phosphates),
            uma: solutes.get(Solute::Uma),
        }
    }

    #[inline]
    pub fn dissolved_co2(&self, hp: f64) -> f64 {
        self.tco2 / (1.0 + K1 / hp + (K1 * K2) / (hp * hp))
    }

    #[inline]
    pub fn hco3(&self, hp: f64) -> f64 {
        K1 * self.dissolved_co2(hp) / hp
    }

    #[inline]
    pub fn co3(&self, hp: f64) -> f64 {
        K2 * self.hco3(hp) / hp
    }

    #[inline]
    pub fn pco2(&self, hp: f64) -> f64 {
        self.dissolved_co2(hp) / ALPHA_CO2
    }

    /// Charge carried by albumin and phosphate buffers at `ph`.
    #[inline]
    pub fn weak_acid_base(&self, ph: f64) -> f64 {
        self.albumin * (0.123 * ph - 0.631) + self.phosphates * (0.309 * ph - 0.469)
    }

    /// Net plasma charge at `hp`; the objective of the acid-base solve.
    pub fn net_charge(&self, hp: f64) -> f64 {
        let ph = ph_from_hp(hp);
        let hco3 = self.hco3(hp);
        let co3 = K2 * hco3 / hp;
        hp + self.sid - hco3 - 2.0 * co3 - KW / hp - self.weak_acid_base(ph) - self.uma
    }

    /// Total CO2 that puts this plasma exactly at `ph`.
    ///
    /// Ignores `self.tco2`. `None` when no non-negative CO2 content can
    /// balance the strong and weak ions at that pH.
    pub fn tco2_at_ph(&self, ph: f64) -> Option<f64> {
        let hp = hp_from_ph(ph);
        let carbonate_charge = hp + self.sid - KW / hp - self.weak_acid_base(ph) - self.uma;
        if carbonate_charge <= 0.0 {
            return None;
        }
        let r1 = K1 / hp;
        let r2 = K1 * K2 / (hp * hp);
        let dissolved = carbonate_charge / (r1 + 2.0 * r2);
        Some(dissolved * (1.0 + r1 + r2))
    }
}

/// Solved acid-base state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AcidBase {
    /// Hydrogen ion concentration (mmol/L)
    pub hp: f64,
    pub ph: f64,
    /// mmHg
    pub pco2: f64,
    /// mmol/L
    pub hco3: f64,
    /// mmol/L
    pub be: f64,
}

/// Solve plasma charge balance for the given total CO2 and solutes.
///
/// `hint` is the previous `hp`; when given, a narrow bracket around it is
/// tried first and the wide bracket only if it does not straddle the root.
pub fn solve_acid_base(
    tco2: f64,
    solutes: &Solutes,
    hint: Option<f64>,
    config: &BrentConfig,
) -> BloodGasResult<AcidBase> {
    if !(tco2.is_finite() && tco2 >= 0.0) {
        return Err(BloodGasError::InvalidComposition {
            what: "tco2 must be finite and non-negative",
        });
    }

    let balance = ChargeBalance::from_solutes(tco2, solutes);
    let objective = |hp: f64| balance.net_charge(hp);

    let narrow = hint
        .filter(|h| h.is_finite() && *h > 0.0)
        .map(|h| (h * HP_NARROW.0, h * HP_NARROW.1));

    let hp = crate::blood_gas::bracketed(objective, narrow, HP_WIDE, config, "acid-base")
        .map_err(BloodGasError::AcidBase)?;

    let ph = ph_from_hp(hp);
    let hco3 = balance.hco3(hp);
    let solved = AcidBase {
        hp,
        ph,
        pco2: balance.pco2(hp),
        hco3,
        be: base_excess(hco3, ph, solutes.get(Solute::Hemoglobin)),
    };
    debug!(ph = solved.ph, pco2 = solved.pco2, "acid-base solved");
    Ok(solved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ph_hp_conversion() {
        assert!((ph_from_hp(hp_from_ph(7.4)) - 7.4).abs() < 1e-12);
        // pH 7.4 is about 40 nmol/L
        assert!((hp_from_ph(7.4) - 3.981e-5).abs() < 1e-8);
    }

    #[test]
    fn henderson_hasselbalch_consistency() {
        let balance = ChargeBalance {
            sid: 40.0,
            tco2: 25.0,
            albumin: 0.0,
            phosphates: 0.0,
            uma: 0.0,
        };
        let hp = hp_from_ph(7.4);
        let ratio = balance.hco3(hp) / balance.dissolved_co2(hp);
        // pH = pK1 + log10(HCO3 / CO2)
        assert!((6.1 + ratio.log10() - 7.4).abs() < 1e-9);
    }

    #[test]
    fn net_charge_is_increasing_in_hp() {
        let balance = ChargeBalance::from_solutes(25.0, &Solutes::normal_plasma());
        let lo = balance.net_charge(hp_from_ph(7.6));
        let hi = balance.net_charge(hp_from_ph(7.2));
        assert!(hi > lo);
    }

    #[test]
    fn base_excess_is_zero_at_reference() {
        assert!(base_excess(24.4, 7.4, 8.0).abs() < 1e-12);
        assert!(base_excess(30.0, 7.4, 8.0) > 0.0);
    }

    #[test]
    fn impossible_composition_has_no_tco2() {
        let balance = ChargeBalance {
            sid: -10.0,
            tco2: 0.0,
            albumin: 0.0,
            phosphates: 0.0,
            uma: 0.0,
        };
        assert!(balance.tco2_at_ph(7.4).is_none());
    }

    #[test]
    fn negative_tco2_is_rejected() {
        let err =
            solve_acid_base(-1.0, &Solutes::normal_plasma(), None, &BrentConfig::default()).unwrap_err();
        assert!(matches!(err, BloodGasError::InvalidComposition { .. }));
    }
}
