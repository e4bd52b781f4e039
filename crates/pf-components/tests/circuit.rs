mod common;

use common::{Bench, DT};
use pf_components::{
    BloodCapacitance, Capacitance, ComponentError, Container, Heart, Resistor, StepOutcome,
    TimeVaryingElastance, Valve, VolumeGuard,
};
use pf_core::AttrValue;

fn two_compartments(p_a: f64, p_b: f64) -> Bench {
    let mut bench = Bench::default();
    bench.add(Capacitance::new("A").with_volume(1.0).with_elastance(p_a, 0.0));
    bench.add(Capacitance::new("B").with_volume(1.0).with_elastance(p_b, 0.0));
    bench
}

#[test]
fn elastance_scenario() {
    let mut bench = Bench::default();
    bench.add(Capacitance::new("A"));
    bench
        .init(
            "A",
            &[
                ("el_base", AttrValue::from(1.0)),
                ("u_vol", AttrValue::from(0.0)),
                ("el_k", AttrValue::from(0.0)),
                ("vol", AttrValue::from(1.0)),
            ],
        )
        .unwrap();
    bench.tick().unwrap();
    assert_eq!(bench.cap("A").pres_in(), 1.0);
}

#[test]
fn resistor_scenario() {
    let mut bench = Bench::default();
    bench.add(Capacitance::new("A").with_volume(1.0).with_elastance(10.0, 0.0));
    bench.add(Capacitance::new("B").with_volume(0.0).with_elastance(10.0, 0.0));
    bench.add(Resistor::new("A_B").between("A", "B").with_resistance(10.0, 10.0));
    bench.init_all().unwrap();

    bench.tick().unwrap();

    assert_eq!(bench.number("A_B", "flow"), 1.0);
    assert!((bench.cap("A").volume() - (1.0 - DT)).abs() < 1e-15);
    assert!((bench.cap("B").volume() - DT).abs() < 1e-15);
}

#[test]
fn resistor_conducts_backwards_through_r_back() {
    let mut bench = two_compartments(0.0, 10.0);
    bench.add(Resistor::new("R").between("A", "B").with_resistance(10.0, 20.0));
    bench.init_all().unwrap();
    bench.tick().unwrap();
    assert!((bench.number("R", "flow") + 0.5).abs() < 1e-12);
    assert!(bench.cap("A").volume() > 1.0);
}

#[test]
fn gating_flags_stop_flow() {
    let mut bench = two_compartments(0.0, 10.0);
    bench.add(Resistor::new("R").between("A", "B"));
    bench.init_all().unwrap();
    bench.set("R", "no_back_flow", true);
    bench.tick().unwrap();
    assert_eq!(bench.number("R", "flow"), 0.0);

    bench.set("R", "no_back_flow", false);
    bench.set("R", "no_flow", true);
    bench.tick().unwrap();
    assert_eq!(bench.number("R", "flow"), 0.0);
    assert_eq!(bench.cap("A").volume(), 1.0);
}

#[test]
fn valve_is_strictly_one_way() {
    let mut bench = two_compartments(0.0, 10.0);
    bench.add(Valve::new("V").between("A", "B").with_resistance(1.0));
    bench.init_all().unwrap();
    bench.tick().unwrap();
    assert_eq!(bench.number("V", "flow"), 0.0);
    assert_eq!(bench.number("V", "prev_flow"), 0.0);

    // forward gradient opens it
    let mut bench = two_compartments(10.0, 0.0);
    bench.add(Valve::new("V").between("A", "B").with_resistance(1.0));
    bench.init_all().unwrap();
    bench.tick().unwrap();
    assert_eq!(bench.number("V", "flow"), 10.0);
}

#[test]
fn valve_rejects_back_resistance() {
    let mut bench = two_compartments(1.0, 1.0);
    bench.add(Valve::new("V"));
    let err = bench
        .init("V", &[("r_back", AttrValue::from(5.0))])
        .unwrap_err();
    assert!(matches!(err, ComponentError::UnknownAttribute { .. }));
}

#[test]
fn quadratic_term_reduces_flow() {
    let mut bench = two_compartments(10.0, 0.0);
    bench.add(Resistor::new("R").between("A", "B").with_resistance(10.0, 10.0));
    bench.init_all().unwrap();
    bench.set("R", "r_k", 5.0);
    bench.tick().unwrap();
    // no previous flow yet
    assert_eq!(bench.number("R", "flow"), 1.0);
    bench.tick().unwrap();
    let second = bench.number("R", "flow");
    assert!(second < 1.0 && second > 0.0);
}

fn fixed_ends(p_a: f64, p_b: f64) -> Bench {
    let mut bench = two_compartments(p_a, p_b);
    bench.set("A", "fixed_composition", true);
    bench.set("B", "fixed_composition", true);
    bench
}

#[test]
fn quadratic_term_adds_to_resistance() {
    let mut bench = fixed_ends(10.0, 0.0);
    bench.add(Resistor::new("R").between("A", "B").with_resistance(10.0, 10.0));
    bench.add(Valve::new("V").between("A", "B").with_resistance(10.0));
    bench.init_all().unwrap();
    // pressures settle on the first tick
    bench.tick().unwrap();
    bench.set("R", "r_k", 1.0);
    bench.set("R", "flow", 1.0);
    bench.set("V", "r_k", 1.0);
    bench.set("V", "prev_flow", 1.0);
    bench.tick().unwrap();
    assert!((bench.number("R", "flow") - 10.0 / 11.0).abs() < 1e-12);
    assert!((bench.number("V", "flow") - 10.0 / 11.0).abs() < 1e-12);
}

#[test]
fn quadratic_flow_settles_under_constant_gradient() {
    let mut bench = fixed_ends(10.0, 0.0);
    bench.add(Resistor::new("R").between("A", "B").with_resistance(10.0, 10.0));
    bench.init_all().unwrap();
    bench.set("R", "r_k", 1.0);
    for _ in 0..60 {
        bench.tick().unwrap();
        assert!(bench.number("R", "flow") > 0.0);
    }
    // fixed point of q = 10 / (10 + q^2)
    let q = bench.number("R", "flow");
    assert!((q * (10.0 + q * q) - 10.0).abs() < 1e-9);
}

#[test]
fn injected_pressure_is_consumed() {
    let mut bench = two_compartments(0.0, 0.0);
    bench.add(Resistor::new("R").between("A", "B").with_resistance(10.0, 10.0));
    bench.init_all().unwrap();
    bench.set("R", "p1_ext", 20.0);
    bench.tick().unwrap();
    assert_eq!(bench.number("R", "flow"), 2.0);
    assert_eq!(bench.number("R", "p1_ext"), 0.0);
    bench.tick().unwrap();
    assert_eq!(bench.number("R", "flow"), 0.0);
}

#[test]
fn shortfall_is_withheld_from_downstream() {
    let mut bench = Bench::default();
    bench.add(Capacitance::new("A").with_volume(0.0001).with_elastance(100_000.0, 0.0));
    bench.add(Capacitance::new("B").with_volume(0.0));
    bench.add(Resistor::new("R").between("A", "B").with_resistance(0.01, 0.01));
    bench.init_all().unwrap();

    bench.tick().unwrap();

    // requested 10 mmHg / 0.01 * dt = 0.5 L, only 0.1 mL available
    assert_eq!(bench.cap("A").volume(), 0.0);
    assert!((bench.cap("B").volume() - 0.0001).abs() < 1e-12);
}

#[test]
fn negative_volume_aborts_or_clamps() {
    let mut bench = Bench::default();
    bench.add(Capacitance::new("A").with_volume(1.0).with_elastance(1.0, 0.0));
    bench.init_all().unwrap();
    bench.set("A", "vol", -0.5);
    let err = bench.tick().unwrap_err();
    assert!(matches!(err, ComponentError::NegativeVolume { .. }));

    bench.guard = VolumeGuard::Clamp;
    bench.tick().unwrap();
    assert_eq!(bench.cap("A").volume(), 0.0);
}

#[test]
fn unresolved_and_non_capacitive_references() {
    let mut bench = two_compartments(1.0, 1.0);
    bench.add(Resistor::new("R").between("A", "missing"));
    let err = bench.init("R", &[]).unwrap_err();
    assert!(matches!(err, ComponentError::UnresolvedReference { .. }));

    bench.add(Resistor::new("R2").between("A", "R"));
    let err = bench.init("R2", &[]).unwrap_err();
    assert!(matches!(err, ComponentError::NotCapacitive { .. }));
}

#[test]
fn uninitialized_components_are_skipped() {
    let mut bench = Bench::default();
    bench.add(Capacitance::new("A").with_volume(1.0).with_elastance(1.0, 0.0));
    let outcomes = bench.tick().unwrap();
    assert_eq!(outcomes, vec![StepOutcome::Skipped]);
    assert_eq!(bench.cap("A").pressure(), 0.0);

    bench.init("A", &[("is_enabled", AttrValue::from(false))]).unwrap();
    assert_eq!(bench.tick().unwrap(), vec![StepOutcome::Skipped]);
}

#[test]
fn heart_drives_chamber_activation() {
    let mut bench = Bench::default();
    bench.add(Heart::new("Heart"));
    bench.add(
        TimeVaryingElastance::new("LA")
            .with_volume(0.05)
            .with_elastances(100.0, 300.0, 0.0),
    );
    bench.add(
        TimeVaryingElastance::new("LV")
            .with_volume(0.1)
            .with_elastances(50.0, 2000.0, 0.0),
    );
    bench
        .init(
            "Heart",
            &[
                ("atrial_chambers", AttrValue::from("LA")),
                (
                    "ventricular_chambers",
                    AttrValue::Names(vec!["LV".to_string()]),
                ),
            ],
        )
        .unwrap();
    bench.init("LA", &[]).unwrap();
    bench.init("LV", &[]).unwrap();

    let mut peak_lv: f64 = 0.0;
    let mut peak_la: f64 = 0.0;
    for _ in 0..(2.0 / DT) as usize {
        bench.tick().unwrap();
        peak_lv = peak_lv.max(bench.cap("LV").pres_in());
        peak_la = peak_la.max(bench.cap("LA").pres_in());
    }
    // diastolic 5 mmHg, systolic 200 mmHg at this volume
    assert!(peak_lv > 190.0 && peak_lv <= 200.0 + 1e-9);
    assert!(peak_la > 14.0 && peak_la <= 15.0 + 1e-9);
}

#[test]
fn container_pressurizes_children() {
    let mut bench = Bench::default();
    bench.add(Container::new("PC").containing(["LV"]));
    bench.add(Capacitance::new("LV").with_volume(0.1).with_elastance(50.0, 0.0));
    bench.init("PC", &[("el_base", AttrValue::from(100.0)), ("vol_extra", AttrValue::from(0.02))]).unwrap();
    bench.init("LV", &[]).unwrap();

    bench.tick().unwrap();

    // container volume is LV + extra; its pressure adds to LV's external pressure
    assert!((bench.cap("PC").volume() - 0.12).abs() < 1e-12);
    let pc = bench.cap("PC").pressure();
    assert!((pc - 12.0).abs() < 1e-9);
    assert!((bench.cap("LV").pressure() - (5.0 + pc)).abs() < 1e-9);
    assert!((bench.cap("LV").pres_tm() - (5.0 - pc)).abs() < 1e-9);
}

#[test]
fn blood_content_travels_with_flow() {
    let mut bench = Bench::default();
    let mut a = BloodCapacitance::new("A");
    a.inner.state.vol = 1.0;
    a.inner.el_base = 10.0;
    a.blood.content.to2 = 8.0;
    let mut b = BloodCapacitance::new("B");
    b.inner.state.vol = 1.0;
    b.blood.content.to2 = 4.0;
    bench.add(a);
    bench.add(b);
    bench.add(Resistor::new("R").between("A", "B").with_resistance(1.0, 1.0));
    bench.init_all().unwrap();

    for _ in 0..200 {
        bench.tick().unwrap();
    }
    let to2_b = bench.number("B", "to2");
    assert!(to2_b > 4.0 && to2_b < 8.0);
    assert_eq!(bench.number("A", "to2"), 8.0);
}

#[test]
fn blood_gas_updates_on_interval() {
    let mut bench = Bench::default();
    bench.add(BloodCapacitance::new("A"));
    bench.init("A", &[("bg_interval", AttrValue::from(0.01)), ("vol", AttrValue::from(0.1))]).unwrap();
    // solved once at init
    let ph0 = bench.number("A", "ph");
    assert!(ph0 > 7.3 && ph0 < 7.5);

    bench.set("A", "tco2", 30.0);
    for _ in 0..10 {
        bench.tick().unwrap();
    }
    // next update is due at 0.01 s
    assert_eq!(bench.number("A", "ph"), ph0);
    for _ in 0..30 {
        bench.tick().unwrap();
    }
    let ph = bench.number("A", "ph");
    assert!(ph.is_finite());
    assert!((ph - ph0).abs() > 1e-6);
}
