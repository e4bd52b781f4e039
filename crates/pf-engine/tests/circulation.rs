use std::path::Path;

use pf_engine::{DataCollector, Engine, NullObserver, TickOutcome};

fn load_model(file: &str) -> pf_project::ModelDef {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../models")
        .join(file);
    pf_project::load(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", file, e))
}

fn total_volume(engine: &Engine) -> f64 {
    ["LV", "AO", "VEN"]
        .iter()
        .map(|n| engine.get_number(&format!("{n}.vol")).unwrap())
        .sum()
}

#[test]
fn bundled_models_build() {
    for file in ["circulation.yaml", "two_compartments.json"] {
        let model = load_model(file);
        let engine = Engine::build(&model).unwrap_or_else(|e| panic!("{}: {}", file, e));
        assert_eq!(engine.len(), model.walk().len());
        assert!(engine.components().all(|c| c.meta().initialized));
    }
}

#[test]
fn two_compartment_flow_matches_hand_calculation() {
    let mut engine = Engine::build(&load_model("two_compartments.json")).unwrap();
    assert_eq!(engine.tick().unwrap(), TickOutcome::Clean);
    assert_eq!(engine.get_number("A_B.flow").unwrap(), 1.0);
    assert!((engine.get_number("A.vol").unwrap() - 0.9995).abs() < 1e-15);
    assert!((engine.get_number("B.vol").unwrap() - 0.0005).abs() < 1e-15);
}

#[test]
fn children_are_built_after_their_container() {
    let engine = Engine::build(&load_model("circulation.yaml")).unwrap();
    let order: Vec<&str> = engine.components().map(|c| c.name()).collect();
    assert_eq!(order, ["Heart", "PC", "LV", "AO", "VEN", "LV_AO", "AO_VEN", "VEN_LV"]);
    assert_eq!(
        engine.get_property("PC.contained_components").unwrap(),
        pf_core::AttrValue::Names(vec!["LV".to_string()])
    );
}

#[test]
fn heart_pumps_and_volume_is_conserved() {
    let mut engine = Engine::build(&load_model("circulation.yaml")).unwrap();
    let initial = total_volume(&engine);

    let mut collector =
        DataCollector::new(["LV.pres", "AO.pres", "LV_AO.flow", "VEN_LV.flow"], 0.005).unwrap();
    collector.check(&engine).unwrap();
    engine.run(4.0, &mut collector).unwrap();

    assert_eq!(engine.ticks(), 8000);
    assert!((engine.time() - 4.0).abs() < 1e-9);
    assert!((total_volume(&engine) - initial).abs() < 1e-9);
    assert!(engine.get_number("Heart.beats").unwrap() >= 3.0);

    let ejection = collector.series("LV_AO.flow").unwrap();
    let filling = collector.series("VEN_LV.flow").unwrap();
    assert!(ejection.iter().all(|(_, q)| *q >= 0.0));
    assert!(filling.iter().all(|(_, q)| *q >= 0.0));
    assert!(ejection.iter().any(|(_, q)| *q > 0.1));
    assert!(filling.iter().any(|(_, q)| *q > 0.0));

    // systolic LV pressure exceeds the aortic pressure at some point
    let lv = collector.series("LV.pres").unwrap();
    let ao = collector.series("AO.pres").unwrap();
    assert!(lv.iter().zip(&ao).any(|((_, p_lv), (_, p_ao))| p_lv > p_ao));
    assert_eq!(collector.rows().len(), 800);
}

#[test]
fn blood_gas_is_computed_during_run() {
    let mut engine = Engine::build(&load_model("circulation.yaml")).unwrap();
    let ph_built = engine.get_number("AO.ph").unwrap();
    assert!(ph_built > 7.2 && ph_built < 7.6);
    engine.run(1.0, &mut NullObserver).unwrap();

    let ph_ao = engine.get_number("AO.ph").unwrap();
    let so2_ao = engine.get_number("AO.so2").unwrap();
    let so2_ven = engine.get_number("VEN.so2").unwrap();
    assert!(ph_ao > 7.2 && ph_ao < 7.6);
    assert!(so2_ven < so2_ao);
    assert!(engine.diagnostics().is_empty());
}

#[test]
fn blood_gas_can_be_sampled_from_the_first_tick() {
    let mut engine = Engine::build(&load_model("circulation.yaml")).unwrap();
    let mut collector = DataCollector::new(["AO.ph", "VEN.so2", "AO.pres"], 0.01).unwrap();
    collector.check(&engine).unwrap();
    collector.sample(&engine).unwrap();
    engine.run(1.0, &mut collector).unwrap();

    assert_eq!(collector.rows().len(), 101);
    assert_eq!(collector.rows()[0].time, 0.0);
    let ph = collector.series("AO.ph").unwrap();
    assert!(ph.iter().all(|(_, v)| *v > 7.0 && *v < 7.8));
    let so2 = collector.series("VEN.so2").unwrap();
    assert!(so2.iter().all(|(_, v)| *v > 0.0 && *v <= 1.0));
}

#[test]
fn on_demand_blood_gas_update() {
    let mut engine = Engine::build(&load_model("circulation.yaml")).unwrap();
    engine.update_blood_gas("VEN").unwrap();
    let pco2 = engine.get_number("VEN.pco2").unwrap();
    assert!(pco2 > 35.0);

    assert!(engine.update_blood_gas("Heart").is_err());
    assert!(engine.update_blood_gas("nobody").is_err());
}

#[test]
fn perturbation_between_ticks() {
    let mut engine = Engine::build(&load_model("circulation.yaml")).unwrap();
    engine.set_property("Heart.hr_factor_ps", 2.0).unwrap();
    engine.tick().unwrap();
    assert_eq!(engine.get_number("Heart.heart_rate").unwrap(), 120.0);

    // closing the outflow lets the arterial compartment drain
    engine.set_property("LV_AO.is_enabled", false).unwrap();
    engine.run(2.0, &mut NullObserver).unwrap();
    assert!(engine.get_number("AO.vol").unwrap() < 0.8);
    assert_eq!(engine.get_property("LV_AO.is_enabled").unwrap(), false.into());
}
