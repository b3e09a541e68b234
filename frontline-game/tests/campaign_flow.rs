use std::sync::{Arc, Mutex};
use std::time::Duration;

use frontline_game::{
    ActionOutcome, Card, CardKind, EngineEvent, Escalation, Faction, GameEngine, GamePhase, ManualClock,
    MissionResult, Rejection,
};

fn engine(seed: u64) -> (GameEngine, ManualClock) {
    let clock = ManualClock::new();
    let engine = GameEngine::with_clock(seed, Box::new(clock.clone())).unwrap();
    (engine, clock)
}

fn deploy_and_play(engine: &mut GameEngine) {
    assert!(engine.start_battle().is_applied());
    while engine.phase() == GamePhase::Tutorial {
        assert!(engine.advance_tutorial().is_applied());
    }
}

/// Slip a counter-weapon card for the active call into the hand and play it.
fn strike_call(engine: &mut GameEngine) -> bool {
    let Some(call) = engine.current_call() else {
        return false;
    };
    let kind = engine
        .grid()
        .find_value(call)
        .map_or(CardKind::LightWeapon, |cell| cell.enemy_type.counter());
    let mut hand = engine.hand().to_vec();
    hand.push(Card::new("strike", call, kind));
    engine.debug_set_hand(hand);
    engine.play_card("strike").is_applied()
}

#[test]
fn menu_to_tutorial_to_playing() {
    let (mut engine, _) = engine(1);
    assert_eq!(engine.phase(), GamePhase::Menu);
    assert!(engine.select_faction(Faction::Allies).is_applied());
    assert_eq!(engine.phase(), GamePhase::Briefing);
    assert_eq!(engine.battle_index(), 0);
    assert_eq!(
        engine.select_faction(Faction::Axis),
        ActionOutcome::Rejected(Rejection::InvalidTransition)
    );

    assert!(engine.start_battle().is_applied());
    assert_eq!(engine.phase(), GamePhase::Tutorial);
    assert!(engine.tick().is_none());

    deploy_and_play_from_tutorial(&mut engine);
    assert_eq!(engine.phase(), GamePhase::Playing);
    assert!(engine.scheduler().is_running());
    assert!(engine.current_call().is_some());
}

fn deploy_and_play_from_tutorial(engine: &mut GameEngine) {
    while engine.phase() == GamePhase::Tutorial {
        let _ = engine.advance_tutorial();
    }
}

#[test]
fn ticks_escalate_and_pause_freezes_threat() {
    let (mut engine, clock) = engine(2);
    let _ = engine.select_faction(Faction::Allies);
    deploy_and_play(&mut engine);

    for _ in 0..100 {
        clock.advance(Duration::from_millis(50));
        let _ = engine.tick();
    }
    // Torch: 0.04 * 0.5 per tick, below every panic band.
    let after_play = engine.threat_level();
    assert!((after_play - 2.0).abs() < 1e-9, "threat {after_play}");
    assert_eq!(engine.scheduler().fired(), 100);

    assert!(engine.toggle_pause().is_applied());
    assert_eq!(engine.phase(), GamePhase::Paused);
    assert!(!engine.scheduler().is_running());
    for _ in 0..100 {
        clock.advance(Duration::from_millis(50));
        assert!(engine.tick().is_none());
    }
    assert!((engine.threat_level() - after_play).abs() < f64::EPSILON);

    assert!(engine.toggle_pause().is_applied());
    assert!(engine.scheduler().is_running());
    let _ = engine.tick();
    assert!(engine.threat_level() > after_play);
}

#[test]
fn restart_issues_a_fresh_scheduler_generation() {
    let (mut engine, _) = engine(3);
    let _ = engine.select_faction(Faction::Axis);
    deploy_and_play(&mut engine);
    let first = engine.scheduler().handle().unwrap();

    assert!(engine.restart_level().is_applied());
    assert_eq!(engine.phase(), GamePhase::Tutorial);
    assert!(!engine.scheduler().is_running());
    assert!(!engine.scheduler().is_current(first));

    deploy_and_play_from_tutorial(&mut engine);
    let second = engine.scheduler().handle().unwrap();
    assert!(second.generation() > first.generation());
    assert!(!engine.scheduler().is_current(first));
}

#[test]
fn quit_to_menu_stops_everything() {
    let (mut engine, clock) = engine(4);
    let _ = engine.select_faction(Faction::Allies);
    deploy_and_play(&mut engine);
    assert!(engine.quit_to_menu().is_applied());
    assert_eq!(engine.phase(), GamePhase::Menu);
    assert!(!engine.scheduler().is_running());
    let _ = engine.quit_to_menu();
    clock.advance(Duration::from_secs(1));
    assert!(engine.tick().is_none());
    assert_eq!(
        engine.restart_level(),
        ActionOutcome::Rejected(Rejection::InvalidTransition)
    );
}

#[test]
fn sustained_neglect_ends_in_defeat() {
    let (mut engine, clock) = engine(5);
    let _ = engine.select_faction(Faction::Allies);
    deploy_and_play(&mut engine);
    engine.debug_set_threat(99.0);

    let mut ticks = 0;
    while engine.phase() == GamePhase::Playing && ticks < 1_000 {
        clock.advance(Duration::from_millis(50));
        let _ = engine.tick();
        ticks += 1;
    }
    assert_eq!(engine.phase(), GamePhase::Defeat);
    assert!(!engine.scheduler().is_running());
    assert!((engine.threat_level() - 100.0).abs() < f64::EPSILON);
    assert!(engine.restart_level().is_applied());
    assert!(engine.threat_level().abs() < f64::EPSILON);
}

#[test]
fn later_battles_skip_the_tutorial_and_campaign_ends_in_war_won() {
    let (mut engine, _) = engine(6);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    engine.subscribe(move |event| {
        if let EngineEvent::MissionEnded { result, .. } = event {
            sink.lock().unwrap().push(*result);
        }
    });

    let _ = engine.select_faction(Faction::Axis);
    let campaign_len = engine.current_campaign().len();
    for index in 0..campaign_len {
        assert_eq!(engine.battle_index(), index);
        assert!(engine.start_battle().is_applied());
        if index == 0 {
            assert_eq!(engine.phase(), GamePhase::Tutorial);
            deploy_and_play_from_tutorial(&mut engine);
        } else {
            assert_eq!(engine.phase(), GamePhase::Playing);
            assert_eq!(engine.tutorial_step(), 0);
        }
        let mut guard = 0;
        while engine.phase() == GamePhase::Playing && guard < 200 {
            assert!(strike_call(&mut engine));
            guard += 1;
        }
        assert_eq!(engine.phase(), GamePhase::Victory, "battle {index}");
        assert!(engine.next_level().is_applied());
    }
    assert_eq!(engine.phase(), GamePhase::WarWon);
    assert_eq!(events.lock().unwrap().len(), campaign_len);
    assert!(
        events
            .lock()
            .unwrap()
            .iter()
            .all(|result| *result == MissionResult::Victory)
    );
    assert_eq!(
        engine.next_level(),
        ActionOutcome::Rejected(Rejection::InvalidTransition)
    );
    assert!(engine.quit_to_menu().is_applied());
}

#[test]
fn grace_window_uses_the_injected_clock() {
    let (mut engine, clock) = engine(7);
    let _ = engine.select_faction(Faction::Allies);
    deploy_and_play(&mut engine);
    engine.debug_set_threat(20.0);
    clock.advance(Duration::from_millis(50));
    assert!(matches!(engine.tick(), Some(Escalation::Raised { .. })));
    assert!(!engine.in_grace_window());
}

#[test]
fn threat_change_event_expires_with_time() {
    let (mut engine, clock) = engine(8);
    engine.reset_for_tests();
    engine.debug_set_supplies(0);
    let _ = engine.emergency_resupply();
    let change = engine.last_threat_change().cloned().unwrap();
    assert!((change.amount - 25.0).abs() < f64::EPSILON);
    clock.advance(Duration::from_millis(1_499));
    assert!(engine.last_threat_change().is_some());
    clock.advance(Duration::from_millis(1));
    assert!(engine.last_threat_change().is_none());
}
