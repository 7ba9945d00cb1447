use hearth_core::{
    action::{energy_factor, ActionKind, ActionOutcome, ActionScheduler, RejectReason},
    command::PlayerCommand,
    config::{ActionsConfig, EnergyConfig, EnergyPolicy, ResourceDelta, WalletConfig},
    engine::SimEngine,
    event::SimEvent,
    wallet::ResourceWallet,
};

fn setup() -> (ActionScheduler, ResourceWallet) {
    let scheduler = ActionScheduler::new(ActionsConfig::default(), EnergyConfig::default());
    let wallet = ResourceWallet::new(&WalletConfig::default(), 100.0);
    (scheduler, wallet)
}

#[test]
fn buy_wood_pays_out_once_when_the_cooldown_ends() {
    let (mut scheduler, mut wallet) = setup();

    let outcome = scheduler.try_trigger(ActionKind::BuyWood, &mut wallet);
    assert_eq!(
        outcome,
        ActionOutcome::Fired { cooldown_ms: 7_000.0, immediate_payout: None }
    );
    assert_eq!(wallet.coins, 12);
    assert_eq!(wallet.wood, 6, "wood must not arrive before the cooldown ends");
    assert!(scheduler.cooldown(ActionKind::BuyWood).pending);

    for _ in 0..6 {
        let paid = scheduler.tick(1_000.0, 1.0, 1.0, &mut wallet);
        assert!(paid.is_empty());
    }
    assert_eq!(wallet.wood, 6);

    let paid = scheduler.tick(1_000.0, 1.0, 1.0, &mut wallet);
    assert_eq!(paid.len(), 1);
    assert_eq!(paid[0].action, ActionKind::BuyWood);
    assert_eq!(wallet.wood, 9);

    for _ in 0..20 {
        assert!(scheduler.tick(1_000.0, 1.0, 1.0, &mut wallet).is_empty());
    }
    assert_eq!(wallet.wood, 9, "payout applied more than once");
    assert!(scheduler.cooldown(ActionKind::BuyWood).is_ready());
}

#[test]
fn fatigue_stretches_the_cooldown() {
    let (mut scheduler, mut wallet) = setup();
    scheduler.try_trigger(ActionKind::BuyWood, &mut wallet);

    // At 0.8 a 7 s cooldown needs 8.75 s of real time.
    assert!(scheduler.tick(8_000.0, 1.0, 0.8, &mut wallet).is_empty());
    assert_eq!(wallet.wood, 6);
    assert_eq!(scheduler.tick(1_000.0, 1.0, 0.8, &mut wallet).len(), 1);
    assert_eq!(wallet.wood, 9);
}

#[test]
fn eating_ignores_fatigue() {
    let (mut scheduler, mut wallet) = setup();
    wallet.energy = 0.0;
    let factor = scheduler.energy_factor(wallet.energy);
    assert_eq!(factor, 0.25);

    assert!(scheduler.try_trigger(ActionKind::Eat, &mut wallet).fired());
    assert!(scheduler.try_trigger(ActionKind::BuyWood, &mut wallet).fired());
    assert_eq!(wallet.food, 2);

    let paid = scheduler.tick(4_000.0, 1.0, factor, &mut wallet);
    assert_eq!(paid.len(), 1);
    assert_eq!(paid[0].action, ActionKind::Eat);
    assert_eq!(wallet.energy, 30.0);
    assert_eq!(scheduler.cooldown(ActionKind::BuyWood).remaining_ms, 6_000.0);
}

#[test]
fn halt_policy_freezes_work_but_not_meals() {
    let energy = EnergyConfig { policy: EnergyPolicy::Halt, ..Default::default() };
    let mut scheduler = ActionScheduler::new(ActionsConfig::default(), energy);
    let mut wallet = ResourceWallet::new(&WalletConfig::default(), 100.0);

    scheduler.try_trigger(ActionKind::BuyWood, &mut wallet);
    scheduler.try_trigger(ActionKind::Eat, &mut wallet);
    wallet.energy = 0.0;
    let factor = scheduler.energy_factor(wallet.energy);
    assert_eq!(factor, 0.0);

    let paid = scheduler.tick(60_000.0, 1.0, factor, &mut wallet);
    assert_eq!(paid.len(), 1);
    assert_eq!(paid[0].action, ActionKind::Eat);
    assert_eq!(scheduler.cooldown(ActionKind::BuyWood).remaining_ms, 7_000.0);
}

#[test]
fn energy_factor_stays_in_bounds() {
    let floor = EnergyConfig::default();
    let halt = EnergyConfig { policy: EnergyPolicy::Halt, ..Default::default() };

    for step in 0..=300 {
        let energy = step as f64 * 0.5;
        let f = energy_factor(energy, &floor);
        assert!((0.25..=1.0).contains(&f), "floor factor {f} at energy {energy}");
        let h = energy_factor(energy, &halt);
        assert!((0.0..=1.0).contains(&h), "halt factor {h} at energy {energy}");
    }
    assert_eq!(energy_factor(80.0, &floor), 0.8);
    assert_eq!(energy_factor(10.0, &floor), 0.25);
    assert_eq!(energy_factor(10.0, &halt), 0.1);
    assert_eq!(energy_factor(150.0, &floor), 1.0);
}

#[test]
fn a_cooling_action_cannot_fire_again() {
    let (mut scheduler, mut wallet) = setup();
    assert!(scheduler.try_trigger(ActionKind::BuyWood, &mut wallet).fired());
    assert_eq!(
        scheduler.try_trigger(ActionKind::BuyWood, &mut wallet),
        ActionOutcome::Rejected(RejectReason::CoolingDown)
    );
    assert_eq!(wallet.coins, 12, "rejected trigger must not charge");

    let status = scheduler.status(ActionKind::BuyWood, &wallet);
    assert!(!status.enabled);
    assert!(status.pending);
    assert_eq!(status.cooldown_fraction, 1.0);

    scheduler.tick(3_500.0, 1.0, 1.0, &mut wallet);
    let status = scheduler.status(ActionKind::BuyWood, &wallet);
    assert_eq!(status.cooldown_fraction, 0.5);
}

#[test]
fn unaffordable_actions_change_nothing() {
    let (mut scheduler, mut wallet) = setup();
    wallet.coins = 7;
    let before = wallet.clone();

    assert_eq!(
        scheduler.try_trigger(ActionKind::BuyWood, &mut wallet),
        ActionOutcome::Rejected(RejectReason::InsufficientResources)
    );
    assert_eq!(wallet, before);
    assert!(scheduler.cooldown(ActionKind::BuyWood).is_ready());
}

#[test]
fn gated_actions_need_more_than_the_minimum_energy() {
    let (mut scheduler, mut wallet) = setup();

    wallet.energy = 5.0;
    assert_eq!(
        scheduler.try_trigger(ActionKind::Work, &mut wallet),
        ActionOutcome::Rejected(RejectReason::TooTired)
    );
    assert_eq!(wallet.energy, 5.0);

    wallet.energy = 5.1;
    assert!(scheduler.try_trigger(ActionKind::Work, &mut wallet).fired());
    assert_eq!(wallet.energy, 0.0, "energy never goes negative");

    wallet.energy = 20.0;
    assert!(scheduler.try_trigger(ActionKind::Chop, &mut wallet).fired());
    assert_eq!(wallet.energy, 5.0);

    // Ungated actions go through at any energy.
    wallet.energy = 0.0;
    assert!(scheduler.try_trigger(ActionKind::BuyFood, &mut wallet).fired());
}

#[test]
fn zero_cooldown_pays_out_on_trigger() {
    let mut actions = ActionsConfig::default();
    actions.buy_wood.cooldown_ms = 0.0;
    let mut scheduler = ActionScheduler::new(actions, EnergyConfig::default());
    let mut wallet = ResourceWallet::new(&WalletConfig::default(), 100.0);

    let outcome = scheduler.try_trigger(ActionKind::BuyWood, &mut wallet);
    assert_eq!(
        outcome,
        ActionOutcome::Fired {
            cooldown_ms: 0.0,
            immediate_payout: Some(ResourceDelta { wood: 3, ..Default::default() }),
        }
    );
    assert_eq!(wallet.wood, 9);
    assert!(scheduler.cooldown(ActionKind::BuyWood).is_ready());
    assert!(scheduler.try_trigger(ActionKind::BuyWood, &mut wallet).fired());
}

#[test]
fn adding_logs_spends_wood_and_energy() {
    let mut engine = SimEngine::new(
        42,
        Default::default(),
        Box::new(hearth_core::audio_output::OfflineOutput::new(48_000)),
    )
    .unwrap();
    assert_eq!(engine.fuel().level(), 0.0);

    let (first, _) = engine.perform(ActionKind::AddLog);
    let (second, _) = engine.perform(ActionKind::AddLog);
    assert!(first.fired() && second.fired());

    assert_eq!(engine.wallet().wood, 4);
    assert_eq!(engine.logs().len(), 2);
    assert_eq!(engine.fuel().level(), 48.0);
    assert_eq!(engine.wallet().energy, 76.0);
}

#[test]
fn eating_without_food_is_rejected() {
    let mut engine = SimEngine::build_test(42).unwrap();
    engine.wallet_mut().food = 0;

    let (outcome, events) = engine.perform(ActionKind::Eat);
    assert_eq!(outcome, ActionOutcome::Rejected(RejectReason::InsufficientResources));
    assert!(events.is_empty());
    assert_eq!(engine.wallet().food, 0);
    assert!(engine.actions().cooldown(ActionKind::Eat).is_ready());
}

#[test]
fn engine_delivers_buy_wood_exactly_once() {
    let mut engine = SimEngine::build_test(42).unwrap();
    let events = engine.trigger(&PlayerCommand::BuyWood);
    assert!(matches!(
        events.as_slice(),
        [SimEvent::ActionTriggered { action: ActionKind::BuyWood, .. }]
    ));
    assert_eq!(engine.wallet().coins, 12);

    let events = engine.run_for(30_000.0, 1_000.0 / 60.0);
    let payouts = events
        .iter()
        .filter(|e| matches!(e, SimEvent::PayoutApplied { action: ActionKind::BuyWood, .. }))
        .count();
    assert_eq!(payouts, 1);
    assert_eq!(engine.wallet().wood, 9);
}
