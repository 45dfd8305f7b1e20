//! Integration tests for the greedy dispatch policy.

mod common;

use bess_dispatch::battery::BatteryConfig;
use bess_dispatch::sim::engine::Engine;
use bess_dispatch::sim::policy::GreedyPolicy;
use bess_dispatch::sim::types::Action;

#[test]
fn charges_at_cheap_period() {
    let engine = Engine::new(common::arbitrage_battery(), common::no_opex(), GreedyPolicy);
    let result = engine.run(&common::series(&[(10.0, 100.0)])).unwrap();

    let e = &result.ledger[0];
    assert_eq!(e.action, Action::Charge);
    assert_eq!(e.charge_mwh, 5.0);
    assert_eq!(e.discharge_mwh, 0.0);
    assert!((e.soc_end_mwh - 5.0).abs() < 1e-12);
    assert_eq!(result.summary.total_cost, 50.0);
}

#[test]
fn charge_then_discharge_cycle() {
    // 90 > 10 charges twice; at (95, 100) derated revenue 90 < 95 but 100 > 95
    let signals = common::series(&[(10.0, 100.0), (10.0, 100.0), (95.0, 100.0)]);
    let engine = Engine::new(common::arbitrage_battery(), common::no_opex(), GreedyPolicy);
    let result = engine.run(&signals).unwrap();

    let actions: Vec<_> = result.ledger.iter().map(|e| e.action).collect();
    assert_eq!(actions, [Action::Charge, Action::Charge, Action::Discharge]);

    // 0.5 + 4.5 = 5.0, + 4.5 = 9.5, - 4.5 = 5.0
    assert!((result.ledger[1].soc_end_mwh - 9.5).abs() < 1e-12);
    assert_eq!(result.ledger[2].discharge_mwh, 4.5);
    assert!((result.ledger[2].soc_end_mwh - 5.0).abs() < 1e-12);

    assert_eq!(result.summary.total_cost, 100.0);
    assert_eq!(result.summary.total_revenue, 450.0);
    assert_eq!(result.summary.ebitda, 350.0);
}

#[test]
fn idles_when_cost_exceeds_revenue() {
    let signals = common::series(&[(100.0, 50.0), (120.0, 119.0)]);
    let engine = Engine::new(common::btm_battery(), common::no_opex(), GreedyPolicy);
    let result = engine.run(&signals).unwrap();

    for e in &result.ledger {
        assert_eq!(e.action, Action::Idle);
        assert_eq!(e.soc_start_mwh, e.soc_end_mwh);
        assert_eq!(e.net(), 0.0);
    }
    assert_eq!(result.summary.idle_periods, 2);
}

#[test]
fn full_battery_does_not_overflow() {
    let full = BatteryConfig::new(10.0, 10.0, 0.9, 0.05, 1.0, 10.0).unwrap();
    // charge trigger (-0.9 > -0.95) with no headroom, and no discharge trigger
    let signals = common::series(&[(-0.95, -1.0)]);
    let result = Engine::new(full, common::no_opex(), GreedyPolicy)
        .run(&signals)
        .unwrap();

    let e = &result.ledger[0];
    assert_eq!(e.action, Action::Idle);
    assert_eq!(e.charge_mwh, 0.0);
    assert_eq!(e.soc_end_mwh, 10.0);
}

#[test]
fn discharge_stops_at_soc_floor() {
    let full = BatteryConfig::new(10.0, 10.0, 0.9, 0.05, 1.0, 10.0).unwrap();
    let signals = common::series(&[(95.0, 100.0); 4]);
    let result = Engine::new(full, common::no_opex(), GreedyPolicy)
        .run(&signals)
        .unwrap();

    let delivered: Vec<_> = result.ledger.iter().map(|e| e.discharge_mwh).collect();
    // 10 -> 5.5 -> 1.0 -> 0.5 floor, then empty
    assert_eq!(delivered, [4.5, 4.5, 0.5, 0.0]);
    assert_eq!(result.ledger[3].action, Action::Idle);
    assert_eq!(result.ledger[3].soc_end_mwh, 0.5);
}

#[test]
fn charged_energy_reconciles_with_soc_rise() {
    let signals = common::series(&[
        (10.0, 100.0),
        (30.0, 60.0),
        (95.0, 100.0),
        (20.0, 90.0),
        (99.0, 100.0),
    ]);
    let engine = Engine::new(common::btm_battery(), common::no_opex(), GreedyPolicy);
    let result = engine.run(&signals).unwrap();

    let soc_rise: f64 = result
        .ledger
        .iter()
        .filter(|e| e.action == Action::Charge)
        .map(|e| e.soc_end_mwh - e.soc_start_mwh)
        .sum();
    let expected = result.summary.total_charged_mwh * 0.85;
    assert!((soc_rise - expected).abs() < 1e-9, "{soc_rise} vs {expected}");
}

#[test]
fn flips_state_every_period_without_hysteresis() {
    let signals = common::series(&[
        (10.0, 100.0),
        (95.0, 100.0),
        (10.0, 100.0),
        (95.0, 100.0),
        (10.0, 100.0),
        (95.0, 100.0),
    ]);
    let engine = Engine::new(common::arbitrage_battery(), common::no_opex(), GreedyPolicy);
    let result = engine.run(&signals).unwrap();

    for (i, e) in result.ledger.iter().enumerate() {
        let expected = if i % 2 == 0 { Action::Charge } else { Action::Discharge };
        assert_eq!(e.action, expected, "period {i}");
    }
    // each cycle draws 5 MWh, stores 4.5 and delivers 4.5
    let last = result.ledger.last().unwrap();
    assert!((last.soc_end_mwh - 0.5).abs() < 1e-12);
    assert_eq!(result.summary.charge_periods, 3);
    assert_eq!(result.summary.discharge_periods, 3);
}
