//! Solute tables and transported blood content.

use std::collections::BTreeMap;
use std::fmt;

/// A solute tracked per blood compartment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Solute {
    Na,
    K,
    Ca,
    Mg,
    Cl,
    Lactate,
    /// g/L
    Albumin,
    Phosphates,
    /// Unmeasured anions (mEq/L)
    Uma,
    /// mmol/L (monomer)
    Hemoglobin,
    /// 2,3-diphosphoglycerate
    Dpg,
}

impl Solute {
    pub const COUNT: usize = 11;

    pub const ALL: [Solute; Solute::COUNT] = [
        Solute::Na,
        Solute::K,
        Solute::Ca,
        Solute::Mg,
        Solute::Cl,
        Solute::Lactate,
        Solute::Albumin,
        Solute::Phosphates,
        Solute::Uma,
        Solute::Hemoglobin,
        Solute::Dpg,
    ];

    /// Stable name used in build specs and property paths.
    pub fn name(self) -> &'static str {
        match self {
            Solute::Na => "na",
            Solute::K => "k",
            Solute::Ca => "ca",
            Solute::Mg => "mg",
            Solute::Cl => "cl",
            Solute::Lactate => "lact",
            Solute::Albumin => "albumin",
            Solute::Phosphates => "phosphates",
            Solute::Uma => "uma",
            Solute::Hemoglobin => "hemoglobin",
            Solute::Dpg => "dpg",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Solute::ALL.into_iter().find(|s| s.name() == name)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Solute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-size solute concentration table.
///
/// `Copy` so that a connector can snapshot its source compartment's content
/// before mutating the destination.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Solutes {
    values: [f64; Solute::COUNT],
}

impl Default for Solutes {
    fn default() -> Self {
        Self {
            values: [0.0; Solute::COUNT],
        }
    }
}

impl Solutes {
    /// Typical adult arterial plasma.
    pub fn normal_plasma() -> Self {
        let mut s = Self::default();
        s.set(Solute::Na, 138.0);
        s.set(Solute::K, 4.0);
        s.set(Solute::Ca, 1.2);
        s.set(Solute::Mg, 0.8);
        s.set(Solute::Cl, 104.0);
        s.set(Solute::Lactate, 1.0);
        s.set(Solute::Albumin, 40.0);
        s.set(Solute::Phosphates, 1.64);
        s.set(Solute::Uma, 2.38);
        s.set(Solute::Hemoglobin, 8.0);
        s.set(Solute::Dpg, 5.0);
        s
    }

    #[inline]
    pub fn get(&self, solute: Solute) -> f64 {
        self.values[solute.slot()]
    }

    #[inline]
    pub fn set(&mut self, solute: Solute, value: f64) {
        self.values[solute.slot()] = value;
    }

    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        Solute::from_name(name).map(|s| self.get(s))
    }

    /// Returns false for an unknown solute name.
    pub fn set_by_name(&mut self, name: &str, value: f64) -> bool {
        match Solute::from_name(name) {
            Some(s) => {
                self.set(s, value);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Solute, f64)> + '_ {
        Solute::ALL.into_iter().map(|s| (s, self.get(s)))
    }

    /// Strong ion difference: `Na + K + 2Ca + 2Mg - Cl - Lactate`.
    pub fn sid(&self) -> f64 {
        self.get(Solute::Na) + self.get(Solute::K) + 2.0 * self.get(Solute::Ca)
            + 2.0 * self.get(Solute::Mg)
            - self.get(Solute::Cl)
            - self.get(Solute::Lactate)
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.iter().map(|(s, v)| (s.name().to_string(), v)).collect()
    }

    /// Volume-weighted blend: `self` holds `vol`, `other` contributes `dv`.
    pub fn mix(&mut self, vol: f64, other: &Solutes, dv: f64) {
        let total = vol + dv;
        if total <= 0.0 {
            return;
        }
        for (mine, theirs) in self.values.iter_mut().zip(other.values.iter()) {
            *mine = (*mine * vol + theirs * dv) / total;
        }
    }
}

/// Everything that travels with a volume of blood.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BloodContent {
    /// Total O2 content (mmol/L)
    pub to2: f64,
    /// Total CO2 content (mmol/L)
    pub tco2: f64,
    pub solutes: Solutes,
}

impl Default for BloodContent {
    fn default() -> Self {
        Self {
            to2: 7.9,
            tco2: 25.6,
            solutes: Solutes::normal_plasma(),
        }
    }
}

impl BloodContent {
    /// Blend `dv` of `source` into this content, which currently fills `vol`.
    pub fn mix_in(&mut self, vol: f64, source: &BloodContent, dv: f64) {
        let total = vol + dv;
        if dv <= 0.0 || total <= 0.0 {
            return;
        }
        self.to2 = (self.to2 * vol + source.to2 * dv) / total;
        self.tco2 = (self.tco2 * vol + source.tco2 * dv) / total;
        self.solutes.mix(vol, &source.solutes, dv);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for s in Solute::ALL {
            assert_eq!(Solute::from_name(s.name()), Some(s));
        }
        assert_eq!(Solute::from_name("sodium"), None);
    }

    #[test]
    fn sid_of_normal_plasma() {
        let s = Solutes::normal_plasma();
        // 138 + 4 + 2.4 + 1.6 - 104 - 1
        assert!((s.sid() - 41.0).abs() < 1e-12);
    }

    #[test]
    fn set_by_unknown_name_is_rejected() {
        let mut s = Solutes::default();
        assert!(s.set_by_name("na", 140.0));
        assert!(!s.set_by_name("sodium", 140.0));
        assert_eq!(s.get(Solute::Na), 140.0);
    }

    #[test]
    fn equal_volumes_average() {
        let mut a = BloodContent::default();
        a.to2 = 4.0;
        let mut b = a;
        b.to2 = 8.0;
        b.solutes.set(Solute::Lactate, 3.0);
        a.mix_in(0.1, &b, 0.1);
        assert!((a.to2 - 6.0).abs() < 1e-12);
        assert!((a.solutes.get(Solute::Lactate) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn mixing_into_empty_compartment_copies_source() {
        let mut empty = BloodContent::default();
        let mut src = BloodContent::default();
        src.tco2 = 30.0;
        empty.mix_in(0.0, &src, 0.01);
        assert!((empty.tco2 - 30.0).abs() < 1e-12);
    }

    #[test]
    fn to_map_contains_every_solute() {
        let map = Solutes::normal_plasma().to_map();
        assert_eq!(map.len(), Solute::COUNT);
        assert_eq!(map["na"], 138.0);
    }
}
