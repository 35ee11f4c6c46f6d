//! Test utilities and helper functions for game testing

use super::super::player::{PlayerSpec, Role};
use super::super::{ActionKind, Game, GameOptions, Intent, Phase};
use crate::error::GameError;

pub const WOLVES: [usize; 3] = [0, 1, 2];
pub const SEER: usize = 3;
pub const WITCH: usize = 4;
pub const HUNTER: usize = 5;
pub const GUARD: usize = 6;
pub const VILLAGERS: [usize; 2] = [7, 8];

/// Creates a test game with the specified number of players and options
pub fn create_test_game(num_players: usize, opts: GameOptions, seed: u64) -> Game {
    let players: Vec<PlayerSpec> = (0..num_players).map(|i| PlayerSpec::agent(format!("Player{}", i))).collect();
    Game::new(opts, &players, seed).unwrap()
}

/// Creates a nine-player game in the lobby with a fixed seating:
/// wolves on seats 0-2, then seer, witch, hunter, guard and two villagers.
pub fn table(opts: GameOptions) -> Game {
    let mut game = create_test_game(9, opts, 42);
    let roles = [
        Role::Werewolf,
        Role::Werewolf,
        Role::Werewolf,
        Role::Seer,
        Role::Witch,
        Role::Hunter,
        Role::Guard,
        Role::Villager,
        Role::Villager,
    ];
    for (player, role) in game.players.iter_mut().zip(roles) {
        player.role = role;
    }
    game
}

pub fn no_badge() -> GameOptions {
    GameOptions {
        badge_election: false,
        ..Default::default()
    }
}

/// Advances from the lobby to the guard's turn on the first night.
pub fn start_first_night(game: &mut Game) {
    game.advance().unwrap();
    game.advance().unwrap();
    game.advance().unwrap();
    assert_eq!(game.phase(), Phase::NightGuardAction);
}

pub fn act(game: &mut Game, seat: usize, intent: Intent) {
    let phase = game.phase();
    game.submit_action(seat, phase, intent).unwrap();
}

pub fn try_act(game: &mut Game, seat: usize, intent: Intent) -> Result<(), GameError> {
    let phase = game.phase();
    game.submit_action(seat, phase, intent)
}

/// The witch's choice for a night.
#[derive(Clone, Copy)]
pub enum Potion {
    Pass,
    Save,
    Poison(usize),
}

/// Plays the rest of a night. Every living wolf votes for `victim`.
pub fn play_night(game: &mut Game, guard: Option<usize>, victim: usize, potion: Potion, check: usize) {
    loop {
        match game.phase() {
            Phase::NightGuardAction => {
                let guard_seat = game.pending_actors()[0];
                act(game, guard_seat, Intent::new(ActionKind::GuardProtect, guard));
            }
            Phase::NightWolfAction => {
                for wolf in game.pending_actors() {
                    act(game, wolf, Intent::on(ActionKind::WolfKill, victim));
                }
            }
            Phase::NightWitchAction => {
                let witch = game.pending_actors()[0];
                let intent = match potion {
                    Potion::Pass => Intent::new(ActionKind::WitchPass, None),
                    Potion::Save => Intent::new(ActionKind::WitchSave, None),
                    Potion::Poison(target) => Intent::on(ActionKind::WitchPoison, target),
                };
                act(game, witch, intent);
            }
            Phase::NightSeerAction => {
                let seer = game.pending_actors()[0];
                act(game, seer, Intent::on(ActionKind::SeerCheck, check));
            }
            Phase::NightStart => game.advance().unwrap(),
            _ => break,
        }
    }
    assert_eq!(game.phase(), Phase::NightResolve);
}

/// Answers the badge signup: the seats in `runners` run and everyone else declines.
pub fn badge_signup(game: &mut Game, runners: &[usize]) {
    assert_eq!(game.phase(), Phase::DayBadgeSignup);
    for seat in game.pending_actors() {
        let kind = if runners.contains(&seat) {
            ActionKind::BadgeSignup
        } else {
            ActionKind::BadgeDecline
        };
        act(game, seat, Intent::new(kind, None));
    }
}

/// Lets every speaker of the current speech phase finish.
pub fn end_speeches(game: &mut Game) {
    let phase = game.phase();
    while game.phase() == phase && phase.is_speech() {
        let speaker = game.current_speaker().unwrap();
        act(game, speaker, Intent::new(ActionKind::EndSpeech, None));
    }
}

/// Casts every outstanding ballot of the current vote, as chosen by `choice`.
pub fn vote_all(game: &mut Game, choice: impl Fn(usize) -> Option<usize>) {
    let kind = match game.phase() {
        Phase::DayVote => ActionKind::DayVote,
        Phase::DayBadgeElection => ActionKind::BadgeVote,
        other => panic!("no vote in {}", other.to_string()),
    };
    for voter in game.pending_actors() {
        act(game, voter, Intent::new(kind, choice(voter)));
    }
}

/// Plays a first night with no deaths and reveals it, with the badge election off.
/// Leaves the game at the start of the day-1 speeches.
pub fn peaceful_first_day() -> Game {
    let mut game = table(no_badge());
    start_first_night(&mut game);
    play_night(&mut game, Some(7), 7, Potion::Pass, 0);
    game.advance().unwrap();
    game.advance().unwrap();
    assert_eq!(game.phase(), Phase::DaySpeech);
    game
}

/// Plays the game to the end, always submitting each pending actor's default intent.
pub fn play_defaults(game: &mut Game) {
    for _ in 0..5000 {
        if game.game_over() {
            return;
        }
        if game.phase().is_host_phase() {
            game.advance().unwrap();
            continue;
        }
        let seat = game.pending_actors()[0];
        let intent = game.default_intent(seat).unwrap();
        act(game, seat, intent);
    }
    panic!("game did not finish");
}
