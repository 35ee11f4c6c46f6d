//! Role ability rule tests

use super::super::events::EventKind;
use super::super::player::DeathCause;
use super::super::{ActionKind, GameOptions, Intent, Phase};
use super::test_utils::*;
use crate::error::{ActionError, GameError};

fn rejection(result: Result<(), GameError>) -> ActionError {
    match result {
        Err(GameError::Rejected(err)) => err,
        other => panic!("expected a rejected intent, got {other:?}"),
    }
}

#[test]
fn test_guard_cannot_repeat_target() {
    let mut game = table(no_badge());
    start_first_night(&mut game);
    play_night(&mut game, Some(7), 8, Potion::Pass, 0);

    let mut game = game.force_jump(Phase::NightGuardAction).unwrap();
    assert_eq!(game.day(), 2);
    let result = try_act(&mut game, GUARD, Intent::on(ActionKind::GuardProtect, 7));
    assert_eq!(rejection(result), ActionError::RepeatedGuardTarget);

    // Another target, or nobody, is fine
    act(&mut game, GUARD, Intent::on(ActionKind::GuardProtect, GUARD));
    assert_eq!(game.phase(), Phase::NightWolfAction);
}

#[test]
fn test_guard_may_skip_then_repeat() {
    let mut game = table(no_badge());
    start_first_night(&mut game);
    play_night(&mut game, None, 8, Potion::Pass, 0);

    let mut game = game.force_jump(Phase::NightGuardAction).unwrap();
    act(&mut game, GUARD, Intent::on(ActionKind::GuardProtect, 7));
    assert_eq!(game.night.guard_target, Some(7));
}

#[test]
fn test_potions_are_used_once() {
    let mut game = table(no_badge());
    start_first_night(&mut game);
    play_night(&mut game, None, 8, Potion::Save, 0);

    let mut game = game.force_jump(Phase::NightWitchAction).unwrap();
    let result = try_act(&mut game, WITCH, Intent::new(ActionKind::WitchSave, None));
    assert_eq!(rejection(result), ActionError::PotionUsed);

    act(&mut game, WITCH, Intent::on(ActionKind::WitchPoison, 0));
    assert!(game.abilities.witch_heal_used);
    assert!(game.abilities.witch_poison_used);
    act(&mut game, SEER, Intent::on(ActionKind::SeerCheck, 1));
    assert_eq!(game.phase(), Phase::NightResolve);

    // With both potions gone the witch no longer wakes up
    let result = game.force_jump(Phase::NightWitchAction);
    assert!(matches!(result, Err(GameError::Rejected(ActionError::UnreachablePhase))));
}

#[test]
fn test_witch_uses_one_potion_per_night() {
    let mut game = table(no_badge());
    start_first_night(&mut game);
    for intent in [
        Intent::new(ActionKind::GuardProtect, None),
        Intent::on(ActionKind::WolfKill, 8),
    ] {
        for seat in game.pending_actors() {
            act(&mut game, seat, intent.clone());
        }
    }
    assert_eq!(game.phase(), Phase::NightWitchAction);
    act(&mut game, WITCH, Intent::new(ActionKind::WitchSave, None));

    // The witch's turn is over
    assert_eq!(game.phase(), Phase::NightSeerAction);
    let result = game.submit_action(WITCH, Phase::NightWitchAction, Intent::on(ActionKind::WitchPoison, 0));
    assert_eq!(rejection(result), ActionError::StalePhase);
}

#[test]
fn test_witch_self_save_option() {
    let mut game = table(GameOptions {
        witch_self_save: false,
        ..no_badge()
    });
    start_first_night(&mut game);
    act(&mut game, GUARD, Intent::new(ActionKind::GuardProtect, None));
    for wolf in WOLVES {
        act(&mut game, wolf, Intent::on(ActionKind::WolfKill, WITCH));
    }
    let result = try_act(&mut game, WITCH, Intent::new(ActionKind::WitchSave, None));
    assert_eq!(rejection(result), ActionError::SelfSaveForbidden);
    assert_eq!(game.phase(), Phase::NightWitchAction);

    // Allowed by default
    let mut game = table(no_badge());
    start_first_night(&mut game);
    play_night(&mut game, None, WITCH, Potion::Save, 0);
    assert!(game.night.pending_wolf_victim.is_none());
}

#[test]
fn test_witch_cannot_poison_herself() {
    let mut game = table(no_badge());
    start_first_night(&mut game);
    act(&mut game, GUARD, Intent::new(ActionKind::GuardProtect, None));
    for wolf in WOLVES {
        act(&mut game, wolf, Intent::on(ActionKind::WolfKill, 8));
    }
    let result = try_act(&mut game, WITCH, Intent::on(ActionKind::WitchPoison, WITCH));
    assert_eq!(rejection(result), ActionError::InvalidPlayerChoice);
}

#[test]
fn test_wolves_must_choose_living_target() {
    let mut game = table(no_badge());
    start_first_night(&mut game);
    act(&mut game, GUARD, Intent::new(ActionKind::GuardProtect, None));

    let result = try_act(&mut game, WOLVES[0], Intent::new(ActionKind::WolfKill, None));
    assert_eq!(rejection(result), ActionError::InvalidPlayerChoice);
    let result = try_act(&mut game, WOLVES[0], Intent::on(ActionKind::WolfKill, 99));
    assert_eq!(rejection(result), ActionError::InvalidPlayerIndex);

    // Non-wolves cannot vote
    let result = try_act(&mut game, 7, Intent::on(ActionKind::WolfKill, 8));
    assert_eq!(rejection(result), ActionError::NotYourTurn);

    act(&mut game, WOLVES[0], Intent::on(ActionKind::WolfKill, 8));
    let result = try_act(&mut game, WOLVES[0], Intent::on(ActionKind::WolfKill, 7));
    assert_eq!(rejection(result), ActionError::AlreadyActed);
    assert_eq!(game.pending_actors(), vec![WOLVES[1], WOLVES[2]]);
}

#[test]
fn test_rejected_intent_leaves_game_untouched() {
    let mut game = table(no_badge());
    start_first_night(&mut game);
    let before = game.clone();

    assert!(try_act(&mut game, 7, Intent::on(ActionKind::GuardProtect, 8)).is_err());
    assert!(game
        .submit_action(GUARD, Phase::NightWolfAction, Intent::on(ActionKind::GuardProtect, 8))
        .is_err());
    assert!(try_act(&mut game, GUARD, Intent::on(ActionKind::SeerCheck, 8)).is_err());
    assert_eq!(game, before);
}

#[test]
fn test_seer_recheck_is_only_a_warning() {
    let mut game = table(no_badge());
    start_first_night(&mut game);
    play_night(&mut game, Some(7), 7, Potion::Pass, 8);

    let mut game = game.force_jump(Phase::NightSeerAction).unwrap();
    act(&mut game, SEER, Intent::on(ActionKind::SeerCheck, 8));
    assert_eq!(game.phase(), Phase::NightResolve);

    let warnings = game
        .events()
        .visible_to(Some(SEER))
        .filter(|e| matches!(e.kind, EventKind::RuleWarning { seat: SEER, .. }))
        .count();
    assert_eq!(warnings, 1);
}

#[test]
fn test_seer_cannot_check_self() {
    let mut game = table(no_badge());
    start_first_night(&mut game);
    let mut game = game.force_jump(Phase::NightSeerAction).unwrap();
    let result = try_act(&mut game, SEER, Intent::on(ActionKind::SeerCheck, SEER));
    assert_eq!(rejection(result), ActionError::InvalidPlayerChoice);
}

#[test]
fn test_poisoned_hunter_cannot_shoot() {
    let mut game = table(no_badge());
    start_first_night(&mut game);
    play_night(&mut game, None, 7, Potion::Poison(HUNTER), 0);
    assert!(!game.abilities.hunter_can_shoot);

    game.advance().unwrap();
    game.advance().unwrap();
    assert_eq!(game.players()[HUNTER].death.unwrap().cause, DeathCause::Poisoned);

    // Straight to last words, with no shot
    assert_eq!(game.phase(), Phase::DayLastWords);
    assert_eq!(game.current_speaker(), Some(HUNTER));
    assert!(game.force_jump(Phase::HunterShoot).is_err());
}

#[test]
fn test_hunter_shoots_when_killed_at_night() {
    let mut game = table(no_badge());
    start_first_night(&mut game);
    play_night(&mut game, None, HUNTER, Potion::Pass, 0);
    game.advance().unwrap();
    game.advance().unwrap();

    assert_eq!(game.phase(), Phase::HunterShoot);
    assert_eq!(game.pending_actors(), vec![HUNTER]);

    // Cannot shoot a dead player or themselves
    let result = try_act(&mut game, HUNTER, Intent::on(ActionKind::HunterShoot, HUNTER));
    assert_eq!(rejection(result), ActionError::InvalidPlayerChoice);

    act(&mut game, HUNTER, Intent::on(ActionKind::HunterShoot, WOLVES[0]));
    assert!(!game.players()[WOLVES[0]].alive);
    assert_eq!(game.players()[WOLVES[0]].death.unwrap().cause, DeathCause::Shot);
    assert!(!game.abilities.hunter_can_shoot);

    // Then the hunter's last words
    assert_eq!(game.phase(), Phase::DayLastWords);
    assert_eq!(game.current_speaker(), Some(HUNTER));
}

#[test]
fn test_hunter_may_hold_fire() {
    let mut game = table(no_badge());
    start_first_night(&mut game);
    play_night(&mut game, None, HUNTER, Potion::Pass, 0);
    game.advance().unwrap();
    game.advance().unwrap();
    act(&mut game, HUNTER, Intent::new(ActionKind::HunterShoot, None));
    assert_eq!(game.num_players_alive(), 8);
    assert_eq!(game.phase(), Phase::DayLastWords);
}

#[test]
fn test_legal_intents_are_accepted() {
    let mut game = table(no_badge());
    start_first_night(&mut game);
    for _ in 0..10 {
        let phase = game.phase();
        if !phase.is_night() || phase == Phase::NightResolve {
            break;
        }
        let seat = game.pending_actors()[0];
        let options = game.legal_intents(seat);
        assert!(!options.is_empty());
        for intent in &options {
            let mut copy = game.clone();
            assert!(copy.submit_action(seat, phase, intent.clone()).is_ok(), "{intent:?} in {}", phase.to_string());
        }
        let default = game.default_intent(seat).unwrap();
        assert!(options.contains(&default));
        act(&mut game, seat, default);
    }
}
