use hearth_core::{
    config::{CooldownScaling, EnergyPolicy, PayoutTiming, SimConfig},
    error::SimError,
};
use std::path::PathBuf;

fn write_temp(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("hearth-{name}-{}.json", std::process::id()));
    std::fs::write(&path, content).expect("write temp config");
    path
}

#[test]
fn partial_file_keeps_the_other_defaults() {
    let path = write_temp(
        "partial",
        r#"{ "fuel": { "decay_rate": 0.1 }, "energy": { "policy": "halt" } }"#,
    );
    let config = SimConfig::load(path.to_str().unwrap()).unwrap();
    std::fs::remove_file(&path).ok();

    let defaults = SimConfig::default();
    assert_eq!(config.fuel.decay_rate, 0.1);
    assert_eq!(config.fuel.fuel_per_log, defaults.fuel.fuel_per_log);
    assert_eq!(config.energy.policy, EnergyPolicy::Halt);
    assert_eq!(config.energy.slow_factor, defaults.energy.slow_factor);
    assert_eq!(config.actions, defaults.actions);
    assert_eq!(config.crackle, defaults.crackle);
}

#[test]
fn one_action_field_keeps_the_rest_of_that_action() {
    let path = write_temp(
        "action",
        r#"{ "actions": { "work": { "cooldown_ms": 5000 }, "eat": { "payout": { "energy": 40 } } } }"#,
    );
    let config = SimConfig::load(path.to_str().unwrap()).unwrap();
    std::fs::remove_file(&path).ok();

    let defaults = SimConfig::default().actions;
    let work = &config.actions.work;
    assert_eq!(work.cooldown_ms, 5_000.0);
    assert_eq!(work.energy_cost, 10.0);
    assert!(work.energy_gated);
    assert_eq!(work.payout.coins, 12);
    assert_eq!(work.payout_timing, PayoutTiming::OnCooldown);
    assert_eq!(work.scaling, CooldownScaling::TimeAndEnergy);
    assert_eq!(work.cost, defaults.work.cost);

    // A nested payout replaces the payout as a whole.
    assert_eq!(config.actions.eat.payout.energy, 40.0);
    assert_eq!(config.actions.eat.scaling, CooldownScaling::TimeOnly);
    assert_eq!(config.actions.eat.cooldown_ms, defaults.eat.cooldown_ms);

    assert_eq!(config.actions.add_log, defaults.add_log);
    assert_eq!(config.actions.buy_wood, defaults.buy_wood);
    assert_eq!(config.actions.buy_food, defaults.buy_food);
    assert_eq!(config.actions.chop, defaults.chop);
}

#[test]
fn shipped_defaults_survive_a_save_and_load() {
    let defaults = SimConfig::default();
    let path = write_temp("defaults", &serde_json::to_string_pretty(&defaults).unwrap());
    let loaded = SimConfig::load(path.to_str().unwrap()).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded, defaults);
}

#[test]
fn malformed_json_is_a_serialization_error() {
    let path = write_temp("malformed", "{ fuel: ");
    let result = SimConfig::load(path.to_str().unwrap());
    std::fs::remove_file(&path).ok();
    assert!(matches!(result, Err(SimError::Serialization(_))));
}

#[test]
fn missing_file_is_reported() {
    let result = SimConfig::load("/definitely/not/here/hearth.json");
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Cannot read"), "unexpected error: {err}");
}

#[test]
fn loaded_values_are_validated() {
    let path = write_temp("invalid", r#"{ "chart": { "sample_interval_ms": 0 } }"#);
    let result = SimConfig::load(path.to_str().unwrap());
    std::fs::remove_file(&path).ok();
    assert!(matches!(
        result,
        Err(SimError::InvalidConfig { field: "chart.sample_interval_ms", .. })
    ));
}

#[test]
fn validate_rejects_unusable_values() {
    assert!(SimConfig::default().validate().is_ok());

    let mut c = SimConfig::default();
    c.fuel.decay_rate = -0.1;
    assert!(c.validate().is_err());

    let mut c = SimConfig::default();
    c.fuel.max_fuel = f64::NAN;
    assert!(c.validate().is_err());

    let mut c = SimConfig::default();
    c.time_scale.default_scale = 5.0;
    assert!(c.validate().is_err());

    let mut c = SimConfig::default();
    c.actions.work.cooldown_ms = -1.0;
    assert!(c.validate().is_err());

    let mut c = SimConfig::default();
    c.energy.slow_factor = 0.0;
    assert!(c.validate().is_err(), "a zero floor is only allowed under the halt policy");
    c.energy.policy = EnergyPolicy::Halt;
    assert!(c.validate().is_ok());

    let mut c = SimConfig::default();
    c.wallet.starting_energy = 150.0;
    assert!(c.validate().is_err());
}
