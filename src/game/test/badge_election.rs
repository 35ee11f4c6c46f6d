//! Sheriff election and badge hand-over tests

use super::super::events::EventKind;
use super::super::history::Fact;
use super::super::{ActionKind, Game, GameOptions, Intent, Phase, PkSource};
use super::test_utils::*;
use crate::error::{ActionError, GameError};

/// Plays the first night (seat 8 is killed) and opens the badge signup.
fn signup_day() -> Game {
    let mut game = table(GameOptions::default());
    start_first_night(&mut game);
    play_night(&mut game, None, 8, Potion::Pass, 0);
    game.advance().unwrap();
    game.advance().unwrap();
    assert_eq!(game.phase(), Phase::DayBadgeSignup);
    game
}

#[test]
fn test_night_victim_is_revealed_after_election() {
    let mut game = signup_day();

    // The victim is not known to be dead yet and may take part
    assert!(game.players()[8].alive);
    assert!(game.pending_actors().contains(&8));

    badge_signup(&mut game, &[SEER, 7]);
    assert_eq!(game.phase(), Phase::DayBadgeSpeech);
    assert_eq!(game.current_speaker(), Some(SEER));
    end_speeches(&mut game);

    assert_eq!(game.phase(), Phase::DayBadgeElection);
    let mut voters = game.pending_actors();
    voters.sort();
    assert_eq!(voters, vec![0, 1, 2, 4, 5, 6, 8]);

    vote_all(&mut game, |_| Some(SEER));
    assert_eq!(game.sheriff(), Some(SEER));
    assert!(!game.players()[8].alive);

    // Last words, then speeches start after the sheriff
    assert_eq!(game.phase(), Phase::DayLastWords);
    end_speeches(&mut game);
    assert_eq!(game.phase(), Phase::DaySpeech);
    assert_eq!(game.current_speaker(), Some(SEER + 1));
    assert!(game.history().facts(1).contains(&Fact::SheriffElected { seat: SEER }));
}

#[test]
fn test_sheriff_speaks_last() {
    let mut game = signup_day();
    badge_signup(&mut game, &[SEER, 7]);
    end_speeches(&mut game);
    vote_all(&mut game, |_| Some(SEER));
    end_speeches(&mut game);

    let mut order = vec![];
    while game.phase() == Phase::DaySpeech {
        let speaker = game.current_speaker().unwrap();
        order.push(speaker);
        act(&mut game, speaker, Intent::new(ActionKind::EndSpeech, None));
    }
    assert_eq!(order, vec![4, 5, 6, 7, 0, 1, 2, 3]);
    assert_eq!(game.phase(), Phase::DayVote);
}

#[test]
fn test_nobody_runs() {
    let mut game = signup_day();
    badge_signup(&mut game, &[]);
    assert_eq!(game.sheriff(), None);
    assert!(game.badge.election_held);
    assert!(!game.badge.destroyed);
    assert!(game.history().facts(1).contains(&Fact::NoSheriff));
    assert_eq!(game.phase(), Phase::DayLastWords);
}

#[test]
fn test_lone_candidate_wins_unopposed() {
    let mut game = signup_day();
    badge_signup(&mut game, &[WITCH]);
    assert_eq!(game.sheriff(), Some(WITCH));
    assert_eq!(game.phase(), Phase::DayLastWords);
}

#[test]
fn test_withdrawal_leaves_lone_candidate() {
    let mut game = signup_day();
    badge_signup(&mut game, &[SEER, 7]);
    assert_eq!(game.current_speaker(), Some(SEER));

    // A candidate may withdraw while someone else is speaking
    act(&mut game, 7, Intent::new(ActionKind::BadgeWithdraw, None));
    assert_eq!(game.sheriff(), Some(SEER));
    assert!(!game.players()[8].alive);
}

#[test]
fn test_withdrawal_during_speeches() {
    let mut game = signup_day();
    badge_signup(&mut game, &[SEER, WITCH, 7]);
    act(&mut game, WITCH, Intent::new(ActionKind::BadgeWithdraw, None));
    assert_eq!(game.phase(), Phase::DayBadgeSpeech);
    assert_eq!(game.badge.candidates, vec![SEER, 7]);

    // Only candidates may withdraw, and only once
    let result = try_act(&mut game, WITCH, Intent::new(ActionKind::BadgeWithdraw, None));
    assert!(matches!(result, Err(GameError::Rejected(ActionError::NotYourTurn))));

    end_speeches(&mut game);
    assert_eq!(game.phase(), Phase::DayBadgeElection);

    // The withdrawn candidate still may not vote
    assert!(!game.pending_actors().contains(&WITCH));
}

#[test]
fn test_badge_tie_goes_to_pk() {
    let mut game = signup_day();
    badge_signup(&mut game, &[SEER, 7]);
    end_speeches(&mut game);

    vote_all(&mut game, |voter| match voter {
        0..=2 => Some(SEER),
        8 => None,
        _ => Some(7),
    });
    assert_eq!(game.phase(), Phase::DayPkSpeech);
    assert_eq!(game.pk_targets(), &[SEER, 7]);
    assert_eq!(game.pk_source, Some(PkSource::Badge));
    assert!(game.players()[8].alive);

    end_speeches(&mut game);
    assert_eq!(game.phase(), Phase::DayBadgeElection);

    // Votes are limited to the PK
    let result = try_act(&mut game, 0, Intent::on(ActionKind::BadgeVote, 5));
    assert!(matches!(result, Err(GameError::Rejected(ActionError::InvalidPlayerChoice))));

    vote_all(&mut game, |voter| if voter == 8 { Some(SEER) } else { None });
    assert_eq!(game.sheriff(), Some(SEER));
}

#[test]
fn test_repeated_badge_tie_destroys_badge() {
    let mut game = signup_day();
    badge_signup(&mut game, &[SEER, 7]);
    end_speeches(&mut game);

    let split = |voter: usize| match voter {
        0..=2 => Some(SEER),
        8 => None,
        _ => Some(7),
    };
    vote_all(&mut game, split);
    end_speeches(&mut game);
    vote_all(&mut game, split);

    assert_eq!(game.sheriff(), None);
    assert!(game.badge.destroyed);
    assert_eq!(game.badge.history[&1].len(), 2);
    assert_eq!(game.phase(), Phase::DayLastWords);
    assert!(game.events().all().iter().any(|e| e.kind == EventKind::NoSheriff));
}

#[test]
fn test_candidates_cannot_vote() {
    let mut game = signup_day();
    badge_signup(&mut game, &[SEER, 7]);
    end_speeches(&mut game);
    let result = try_act(&mut game, SEER, Intent::on(ActionKind::BadgeVote, 7));
    assert!(matches!(result, Err(GameError::Rejected(ActionError::NotYourTurn))));
}

#[test]
fn test_no_election_after_first_day() {
    let mut game = signup_day();
    badge_signup(&mut game, &[]);
    let mut game = game.force_jump(Phase::NightStart).unwrap();
    game.advance().unwrap();
    play_night(&mut game, None, 7, Potion::Pass, 0);
    game.advance().unwrap();
    game.advance().unwrap();
    assert_ne!(game.phase(), Phase::DayBadgeSignup);
    assert!(game.force_jump(Phase::DayBadgeSignup).is_err());
}

#[test]
fn test_badge_transfer_on_exile() {
    let mut game = signup_day();
    badge_signup(&mut game, &[SEER]);
    end_speeches(&mut game);
    end_speeches(&mut game);
    assert_eq!(game.phase(), Phase::DayVote);

    vote_all(&mut game, |voter| if voter == SEER { Some(0) } else { Some(SEER) });
    assert_eq!(game.phase(), Phase::DayResolve);
    game.advance().unwrap();

    assert_eq!(game.phase(), Phase::BadgeTransfer);
    assert_eq!(game.pending_actors(), vec![SEER]);

    // The badge cannot go to a dead player
    let result = try_act(&mut game, SEER, Intent::on(ActionKind::BadgeTransfer, 8));
    assert!(matches!(result, Err(GameError::Rejected(ActionError::InvalidPlayerChoice))));

    act(&mut game, SEER, Intent::on(ActionKind::BadgeTransfer, WITCH));
    assert_eq!(game.sheriff(), Some(WITCH));
    assert_eq!(game.phase(), Phase::DayLastWords);
    end_speeches(&mut game);
    assert_eq!(game.phase(), Phase::NightStart);
    assert_eq!(game.day(), 2);
}

#[test]
fn test_badge_torn_up() {
    let mut game = signup_day();
    badge_signup(&mut game, &[SEER]);
    end_speeches(&mut game);
    end_speeches(&mut game);
    vote_all(&mut game, |voter| if voter == SEER { Some(0) } else { Some(SEER) });
    game.advance().unwrap();

    act(&mut game, SEER, Intent::new(ActionKind::BadgeTransfer, None));
    assert_eq!(game.sheriff(), None);
    assert!(game.badge.destroyed);
    assert!(game.history().facts(1).contains(&Fact::BadgeDestroyed { from: SEER }));
}
