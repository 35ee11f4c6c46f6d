//! Event visibility and history tests

use super::super::events::{EventKind, Visibility};
use super::super::history::Fact;
use super::super::player::{DeathCause, Role};
use super::super::{GameOptions, Phase};
use super::test_utils::*;
use crate::error::InvariantViolation;

#[test]
fn test_wolves_see_each_other() {
    let mut game = table(GameOptions::default());
    game.advance().unwrap();

    let known_roles = |seat: usize| {
        game.events()
            .visible_to(Some(seat))
            .filter_map(|e| match e.kind {
                EventKind::RoleAssigned { seat, role } => Some((seat, role)),
                _ => None,
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(
        known_roles(0),
        vec![(0, Role::Werewolf), (1, Role::Werewolf), (2, Role::Werewolf)]
    );
    assert_eq!(known_roles(SEER), vec![(SEER, Role::Seer)]);
    assert_eq!(game.events().visible_to(None).filter(|e| matches!(e.kind, EventKind::RoleAssigned { .. })).count(), 0);
}

#[test]
fn test_night_actions_are_private() {
    let mut game = table(no_badge());
    start_first_night(&mut game);
    play_night(&mut game, Some(7), 8, Potion::Pass, 0);

    let seer_check = game
        .events()
        .all()
        .iter()
        .find(|e| matches!(e.kind, EventKind::SeerChecked { .. }))
        .unwrap();
    assert_eq!(seer_check.visibility, Visibility::Private { visible_to: vec![SEER] });

    let wolf_votes = game
        .events()
        .visible_to(Some(7))
        .filter(|e| matches!(e.kind, EventKind::WolfVoted { .. }))
        .count();
    assert_eq!(wolf_votes, 0);
    let wolf_votes = game
        .events()
        .visible_to(Some(1))
        .filter(|e| matches!(e.kind, EventKind::WolfVoted { .. }))
        .count();
    assert_eq!(wolf_votes, 3);
}

#[test]
fn test_event_sequence_numbers() {
    let game = peaceful_first_day();
    for (idx, event) in game.events().all().iter().enumerate() {
        assert_eq!(event.seq, idx as u64);
    }
    let tail = game.events().since(3);
    assert_eq!(tail.len(), game.events().all().len() - 3);
    assert!(game.events().since(10_000).is_empty());
}

#[test]
fn test_history_records_night_and_day() {
    let mut game = table(no_badge());
    start_first_night(&mut game);
    play_night(&mut game, None, 8, Potion::Pass, 0);
    game.advance().unwrap();
    game.advance().unwrap();

    let facts = game.history().facts(1);
    assert_eq!(facts, &[Fact::Died { seat: 8, cause: DeathCause::Killed }]);
    assert_eq!(game.history().day(1).unwrap().deaths, vec![(8, DeathCause::Killed)]);
    assert_eq!(game.history().night(1).unwrap().seer_check.map(|(seat, _)| seat), Some(0));
}

#[test]
fn test_history_closes_at_nightfall() {
    let mut game = peaceful_first_day();
    end_speeches(&mut game);
    vote_all(&mut game, |_| None);
    game.advance().unwrap();
    assert_eq!(game.phase(), Phase::NightStart);
    assert_eq!(game.history().closed_through(), 1);

    let result = game.history.add_fact(1, Fact::NoElimination);
    assert_eq!(result, Err(InvariantViolation::HistoryClosed(1)));
    assert!(game.history.day_mut(1).is_err());
    assert!(game.history.add_fact(2, Fact::PeacefulNight).is_ok());
}

#[test]
fn test_night_cannot_be_recorded_twice() {
    let mut game = table(no_badge());
    start_first_night(&mut game);
    play_night(&mut game, None, 8, Potion::Pass, 0);
    let record = game.history().night(1).unwrap().clone();
    assert!(game.history.record_night(1, record).is_err());
}

#[test]
fn test_player_view_hides_roles() {
    let mut game = table(no_badge());
    start_first_night(&mut game);

    let view = game.get_player_json(7);
    let players = view["players"].as_array().unwrap();
    assert_eq!(players[7]["role"], "Villager");
    assert!(players[0]["role"].is_null());

    let view = game.get_player_json(1);
    assert_eq!(view["players"][0]["role"], "Werewolf");
    assert!(view["players"][SEER]["role"].is_null());

    // The witch learns the victim only on her turn
    assert!(game.get_player_json(WITCH)["knowledge"]["victim"].is_null());
    act(&mut game, GUARD, super::super::Intent::new(super::super::ActionKind::GuardProtect, None));
    for wolf in WOLVES {
        act(&mut game, wolf, super::super::Intent::on(super::super::ActionKind::WolfKill, 8));
    }
    let view = game.get_player_json(WITCH);
    assert_eq!(view["knowledge"]["victim"], 8);
    assert_eq!(view["action"]["type"], "NIGHT_WITCH_ACTION");
    assert!(game.get_player_json(7)["action"].is_null());
}

#[test]
fn test_board_view() {
    let game = peaceful_first_day();
    let board = game.get_board_json();
    assert_eq!(board["phase"], "DAY_SPEECH");
    assert_eq!(board["day"], 1);
    assert_eq!(board["currentSpeaker"], 0);
    assert!(board["players"][0]["role"].is_null());
    assert_eq!(game.get_outcome_json()["finished"], false);
}
