use self::badge::Badge;
use self::events::{EventKind, EventLog, Visibility};
use self::history::{Fact, History, NightRecord, VoteRound};
use self::night::{resolve_night, NightActions, NightOutcome};
pub use self::options::GameOptions;
use self::player::{assign_roles, Alignment, Death, DeathCause, Player, PlayerSpec, Role};
use self::rules::{can_act, RoleAbilities};
use self::votes::{Tally, VoteDecision, Votes, MAX_BADGE_ROUNDS, MAX_VOTE_ROUNDS, NORMAL_WEIGHT, SHERIFF_WEIGHT};
use crate::error::{ActionError, GameError, InvariantViolation};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub mod action;
mod badge;
pub mod events;
mod eligible;
mod history;
mod invariants;
mod json;
mod jump;
mod night;
mod options;
pub mod player;
mod rules;
mod test;
mod votes;
mod win;

pub use self::action::{ActionKind, Intent};

pub const MAX_PLAYERS: usize = 12;

/// The night sub-phases, in the order they are played.
const NIGHT_ORDER: [Phase; 4] = [
    Phase::NightGuardAction,
    Phase::NightWolfAction,
    Phase::NightWitchAction,
    Phase::NightSeerAction,
];

/// A game of Werewolf.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Game {
    opts: GameOptions,
    seed: u64,
    players: Vec<Player>,
    phase: Phase,
    day: u32,
    night: NightActions,
    night_outcome: Option<NightOutcome>,
    abilities: RoleAbilities,
    votes: Votes,
    badge: Badge,
    pk_targets: Vec<usize>,
    pk_source: Option<PkSource>,
    /// PK rounds entered in today's execution vote.
    revote_count: u32,
    speakers: VecDeque<usize>,
    current_speaker: Option<usize>,
    /// The dead player acting in `HunterShoot` or `BadgeTransfer`.
    actor: Option<usize>,
    interrupts: VecDeque<Interrupt>,
    /// Where the main flow continues once the interrupts are done.
    resume: Phase,
    last_tally: Option<Tally>,
    day_decision: Option<VoteDecision>,
    history: History,
    events: EventLog,
    winner: Option<Alignment>,
}

/// Represents the current phase in the game loop.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Lobby,
    Setup,
    NightStart,
    NightGuardAction,
    NightWolfAction,
    NightWitchAction,
    NightSeerAction,
    NightResolve,
    DayStart,
    DayBadgeSignup,
    DayBadgeSpeech,
    DayBadgeElection,
    DayPkSpeech,
    DayLastWords,
    DaySpeech,
    DayVote,
    DayResolve,
    BadgeTransfer,
    HunterShoot,
    GameEnd,
}

/// Which vote a PK runoff belongs to.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub enum PkSource {
    Badge,
    Vote,
}

/// A sub-flow inserted into the game after a death.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
enum Interrupt {
    HunterShoot { hunter: usize },
    BadgeTransfer { holder: usize },
    LastWords { seats: Vec<usize> },
}

impl Phase {
    /// Phases that wait for the host to move on, rather than for player intents.
    pub fn is_host_phase(self) -> bool {
        matches!(
            self,
            Phase::Lobby | Phase::Setup | Phase::NightStart | Phase::NightResolve | Phase::DayStart | Phase::DayResolve
        )
    }

    pub fn is_speech(self) -> bool {
        matches!(
            self,
            Phase::DayBadgeSpeech | Phase::DayPkSpeech | Phase::DayLastWords | Phase::DaySpeech
        )
    }

    pub fn is_night(self) -> bool {
        matches!(
            self,
            Phase::NightStart
                | Phase::NightGuardAction
                | Phase::NightWolfAction
                | Phase::NightWitchAction
                | Phase::NightSeerAction
                | Phase::NightResolve
        )
    }

    /// The role that acts during a night sub-phase.
    pub fn night_role(self) -> Option<Role> {
        match self {
            Phase::NightGuardAction => Some(Role::Guard),
            Phase::NightWolfAction => Some(Role::Werewolf),
            Phase::NightWitchAction => Some(Role::Witch),
            Phase::NightSeerAction => Some(Role::Seer),
            _ => None,
        }
    }
}

impl ToString for Phase {
    fn to_string(&self) -> String {
        match self {
            Phase::Lobby => "LOBBY",
            Phase::Setup => "SETUP",
            Phase::NightStart => "NIGHT_START",
            Phase::NightGuardAction => "NIGHT_GUARD_ACTION",
            Phase::NightWolfAction => "NIGHT_WOLF_ACTION",
            Phase::NightWitchAction => "NIGHT_WITCH_ACTION",
            Phase::NightSeerAction => "NIGHT_SEER_ACTION",
            Phase::NightResolve => "NIGHT_RESOLVE",
            Phase::DayStart => "DAY_START",
            Phase::DayBadgeSignup => "DAY_BADGE_SIGNUP",
            Phase::DayBadgeSpeech => "DAY_BADGE_SPEECH",
            Phase::DayBadgeElection => "DAY_BADGE_ELECTION",
            Phase::DayPkSpeech => "DAY_PK_SPEECH",
            Phase::DayLastWords => "DAY_LAST_WORDS",
            Phase::DaySpeech => "DAY_SPEECH",
            Phase::DayVote => "DAY_VOTE",
            Phase::DayResolve => "DAY_RESOLVE",
            Phase::BadgeTransfer => "BADGE_TRANSFER",
            Phase::HunterShoot => "HUNTER_SHOOT",
            Phase::GameEnd => "GAME_END",
        }
        .to_string()
    }
}

impl Game {
    /// Creates a new game of Werewolf, dealing the roles with the given seed.
    pub fn new(opts: GameOptions, players: &[PlayerSpec], seed: u64) -> Result<Self, GameError> {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
        let roles = assign_roles(players.len(), &opts, &mut rng)?;
        let players = players
            .iter()
            .zip(roles)
            .enumerate()
            .map(|(seat, (spec, role))| Player::new(spec.name.clone(), seat, role, spec.is_human))
            .collect::<Vec<_>>();

        Ok(Game {
            opts,
            seed,
            players,
            phase: Phase::Lobby,
            day: 0,
            night: NightActions::default(),
            night_outcome: None,
            abilities: RoleAbilities::default(),
            votes: Votes::default(),
            badge: Badge::default(),
            pk_targets: vec![],
            pk_source: None,
            revote_count: 0,
            speakers: VecDeque::new(),
            current_speaker: None,
            actor: None,
            interrupts: VecDeque::new(),
            resume: Phase::DaySpeech,
            last_tally: None,
            day_decision: None,
            history: History::default(),
            events: EventLog::default(),
            winner: None,
        })
    }

    /// Called by the host to move past a phase that needs no player input.
    pub fn advance(&mut self) -> Result<(), GameError> {
        self.check_not_over()?;
        match self.phase {
            Phase::Lobby => {
                // Wolves know each other
                let wolves = self.living_with_role(Role::Werewolf);
                for idx in 0..self.players.len() {
                    let role = self.players[idx].role;
                    let visible_to = if role == Role::Werewolf { wolves.clone() } else { vec![idx] };
                    self.private(EventKind::RoleAssigned { seat: idx, role }, visible_to);
                }
                self.set_phase(Phase::Setup);
            }
            Phase::Setup => self.start_night(),
            Phase::NightStart => self.next_night_phase(Phase::NightStart)?,
            Phase::NightResolve => self.set_phase(Phase::DayStart),
            Phase::DayStart => {
                if self.badge_election_due() {
                    self.badge.clear_election();
                    self.set_phase(Phase::DayBadgeSignup);
                } else {
                    self.announce_night()?;
                }
            }
            Phase::DayResolve => self.finish_day_resolve()?,
            _ => return Err(ActionError::InvalidAction.into()),
        }
        self.check_invariants()?;
        Ok(())
    }

    /// Returns true if the game is over.
    pub fn game_over(&self) -> bool {
        self.winner.is_some()
    }

    pub fn winner(&self) -> Option<Alignment> {
        self.winner
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn options(&self) -> &GameOptions {
        &self.opts
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn current_speaker(&self) -> Option<usize> {
        self.current_speaker
    }

    pub fn sheriff(&self) -> Option<usize> {
        self.badge.holder
    }

    pub fn pk_targets(&self) -> &[usize] {
        &self.pk_targets
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Gets the player names.
    pub fn player_names(&self) -> impl Iterator<Item = &'_ str> {
        self.players.iter().map(|p| &p.name[..])
    }

    /// Finds a player with the given name.
    pub fn find_player(&self, name: &str) -> Result<usize, GameError> {
        self.players
            .iter()
            .position(|p| p.name == name)
            .ok_or(GameError::PlayerNotFound)
    }

    /// Gets the number of players in the game.
    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    /// Gets the number of players in the game that are alive.
    pub fn num_players_alive(&self) -> usize {
        self.players.iter().filter(|p| p.alive).count()
    }

    /// Gets the number of living players on the given side.
    pub fn num_alive(&self, alignment: Alignment) -> usize {
        self.players.iter().filter(|p| p.alive && p.alignment() == alignment).count()
    }

    /// Returns `Ok` if the given player index is valid, and an `Err` otherwise.
    fn check_player_index(&self, player: usize) -> Result<(), ActionError> {
        if player < self.num_players() {
            Ok(())
        } else {
            Err(ActionError::InvalidPlayerIndex)
        }
    }

    fn check_not_over(&self) -> Result<(), ActionError> {
        if self.winner.is_some() {
            Err(ActionError::GameOver)
        } else {
            Ok(())
        }
    }

    fn set_phase(&mut self, to: Phase) {
        let from = self.phase;
        self.phase = to;
        log::debug!("day {}: {} -> {}", self.day, from.to_string(), to.to_string());
        self.public(EventKind::PhaseChanged { from, to });
    }

    fn public(&mut self, kind: EventKind) {
        self.events.push(self.day, self.phase, kind, Visibility::Public);
    }

    fn private(&mut self, kind: EventKind, visible_to: Vec<usize>) {
        self.events.push(self.day, self.phase, kind, Visibility::Private { visible_to });
    }

    /// Seats of every living player with the given role.
    fn living_with_role(&self, role: Role) -> Vec<usize> {
        self.eligible_players().with_role(role).make().seats()
    }

    fn badge_election_due(&self) -> bool {
        self.opts.badge_election && self.day == 1 && !self.badge.election_held && !self.badge.destroyed
    }

    fn start_night(&mut self) {
        self.history.close_through(self.day);
        self.day += 1;
        self.votes = Votes::default();
        self.pk_targets.clear();
        self.pk_source = None;
        self.revote_count = 0;
        self.last_tally = None;
        self.day_decision = None;
        self.night_outcome = None;
        self.set_phase(Phase::NightStart);
    }

    /// Moves to the first night sub-phase after `after` that has someone able to act,
    /// or resolves the night if there is none.
    fn next_night_phase(&mut self, after: Phase) -> Result<(), GameError> {
        for phase in NIGHT_ORDER.into_iter().filter(|p| *p > after) {
            let Some(role) = phase.night_role() else {
                continue;
            };
            let able = self
                .players
                .iter()
                .any(|p| p.role == role && can_act(role, phase, p, &self.abilities));
            if able {
                self.set_phase(phase);
                return Ok(());
            }
        }
        self.finish_night()
    }

    fn finish_night(&mut self) -> Result<(), GameError> {
        let outcome = resolve_night(&self.night, &self.players)?;
        for death in &outcome.deaths {
            match death.cause {
                DeathCause::Poisoned => self.night.pending_poison_victim = Some(death.seat),
                _ => self.night.pending_wolf_victim = Some(death.seat),
            }
            if death.cause == DeathCause::Poisoned && self.players[death.seat].role == Role::Hunter {
                self.abilities.hunter_can_shoot = false;
            }
        }
        self.history.record_night(
            self.day,
            NightRecord {
                guard_target: self.night.guard_target,
                wolf_target: self.night.wolf_target,
                witch_saved: self.night.witch_save,
                witch_poisoned: self.night.witch_poison,
                seer_check: outcome.seer_result,
                deaths: outcome.deaths.clone(),
            },
        )?;
        self.night_outcome = Some(outcome);
        self.set_phase(Phase::NightResolve);
        Ok(())
    }

    /// Commits and reveals the night's deaths, then plays out their consequences.
    fn announce_night(&mut self) -> Result<(), GameError> {
        let mut victims = vec![];
        if let Some(seat) = self.night.pending_wolf_victim {
            victims.push((seat, DeathCause::Killed));
        }
        if let Some(seat) = self.night.pending_poison_victim {
            victims.push((seat, DeathCause::Poisoned));
        }
        victims.sort_by_key(|(seat, _)| *seat);
        self.night.close_night();

        if victims.is_empty() {
            log::info!("day {}: peaceful night", self.day);
            self.public(EventKind::PeacefulNight);
            self.history.add_fact(self.day, Fact::PeacefulNight)?;
        }
        for (seat, cause) in &victims {
            self.commit_death(*seat, *cause)?;
        }
        if self.check_win()? {
            return Ok(());
        }

        let seats: Vec<usize> = victims.iter().map(|(seat, _)| *seat).collect();
        for seat in &seats {
            self.queue_death_interrupts(*seat, false);
        }
        if self.opts.last_words && self.day == 1 && !seats.is_empty() {
            self.interrupts.push_back(Interrupt::LastWords { seats });
        }
        self.resume = Phase::DaySpeech;
        self.continue_flow()
    }

    fn commit_death(&mut self, seat: usize, cause: DeathCause) -> Result<(), InvariantViolation> {
        let day = self.day;
        let player = self.players.get_mut(seat).ok_or(InvariantViolation::UnknownSeat(seat))?;
        if !player.alive {
            return Err(InvariantViolation::AlreadyDead(seat));
        }
        player.alive = false;
        player.death = Some(Death { day, cause });
        if player.role == Role::Hunter && cause == DeathCause::Poisoned {
            self.abilities.hunter_can_shoot = false;
        }
        log::info!("day {}: seat {} {}", day, seat, cause.to_string());
        self.public(EventKind::PlayerDied { seat, cause });
        self.history.day_mut(day)?.deaths.push((seat, cause));
        self.history.add_fact(day, Fact::Died { seat, cause })?;
        Ok(())
    }

    /// Schedules the hunter's shot and the badge hand-over a death triggers.
    fn queue_death_interrupts(&mut self, seat: usize, urgent: bool) {
        let mut queued = vec![];
        if self.players[seat].role == Role::Hunter && self.abilities.hunter_can_shoot {
            queued.push(Interrupt::HunterShoot { hunter: seat });
        }
        if self.badge.holder == Some(seat) {
            queued.push(Interrupt::BadgeTransfer { holder: seat });
        }
        if urgent {
            for interrupt in queued.into_iter().rev() {
                self.interrupts.push_front(interrupt);
            }
        } else {
            self.interrupts.extend(queued);
        }
    }

    /// Ends the game if a side has won, skipping any pending sub-flow.
    fn check_win(&mut self) -> Result<bool, InvariantViolation> {
        let Some(winner) = win::check_win(&self.players) else {
            return Ok(false);
        };
        self.winner = Some(winner);
        self.interrupts.clear();
        self.speakers.clear();
        self.current_speaker = None;
        self.actor = None;
        self.pk_targets.clear();
        self.pk_source = None;
        self.votes = Votes::default();
        self.badge.votes = Votes::default();
        self.night.close_night();
        log::info!("game over: {:?} win on day {}", winner, self.day);
        self.history.add_fact(self.day, Fact::Winner { alignment: winner })?;
        self.set_phase(Phase::GameEnd);
        self.public(EventKind::GameOver { winner });
        Ok(true)
    }

    /// Runs the next pending interrupt, or resumes the main flow.
    fn continue_flow(&mut self) -> Result<(), GameError> {
        self.actor = None;
        self.current_speaker = None;
        self.speakers.clear();
        while let Some(interrupt) = self.interrupts.pop_front() {
            match interrupt {
                Interrupt::HunterShoot { hunter } if self.abilities.hunter_can_shoot => {
                    self.actor = Some(hunter);
                    self.set_phase(Phase::HunterShoot);
                    return Ok(());
                }
                Interrupt::BadgeTransfer { holder } if self.badge.holder == Some(holder) => {
                    self.actor = Some(holder);
                    self.set_phase(Phase::BadgeTransfer);
                    return Ok(());
                }
                Interrupt::LastWords { seats } if !seats.is_empty() => {
                    self.start_speeches(seats, Phase::DayLastWords);
                    return Ok(());
                }
                _ => {}
            }
        }
        match self.resume {
            Phase::NightStart => self.start_night(),
            _ => self.start_day_speech(),
        }
        Ok(())
    }

    fn start_speeches(&mut self, seats: impl IntoIterator<Item = usize>, phase: Phase) {
        self.speakers = seats.into_iter().collect();
        self.current_speaker = self.speakers.pop_front();
        self.set_phase(phase);
    }

    /// Speeches go round the table starting after the sheriff, so the sheriff speaks last.
    fn start_day_speech(&mut self) {
        let n = self.players.len();
        let start = self.badge.holder.map(|s| (s + 1) % n).unwrap_or(0);
        let order: Vec<usize> = (start..n)
            .chain(0..start)
            .filter(|seat| self.players[*seat].alive)
            .collect();
        self.start_speeches(order, Phase::DaySpeech);
    }

    /// Moves to the next speaker, ending the speeches once everyone has spoken.
    fn next_speaker(&mut self) -> Result<(), GameError> {
        self.current_speaker = self.speakers.pop_front();
        if self.current_speaker.is_some() {
            return Ok(());
        }
        match self.phase {
            Phase::DayBadgeSpeech => self.end_badge_speeches(),
            Phase::DayPkSpeech => match self.pk_source {
                Some(PkSource::Badge) => self.start_badge_vote(),
                _ => self.start_day_vote(),
            },
            Phase::DayLastWords => self.continue_flow(),
            Phase::DaySpeech => self.start_day_vote(),
            _ => Err(InvariantViolation::Inconsistent(format!("speeches in {}", self.phase.to_string())).into()),
        }
    }

    /// Called once every living player has answered the badge signup.
    fn close_badge_signup(&mut self) -> Result<(), GameError> {
        self.badge.candidates = self.badge.signed_up().collect();
        match self.badge.candidates.len() {
            0 => self.finish_badge_election(None),
            1 => self.finish_badge_election(Some(self.badge.candidates[0])),
            _ => {
                let candidates = self.badge.candidates.clone();
                self.start_speeches(candidates, Phase::DayBadgeSpeech);
                Ok(())
            }
        }
    }

    fn end_badge_speeches(&mut self) -> Result<(), GameError> {
        match self.badge.candidates.len() {
            0 => self.finish_badge_election(None),
            1 => self.finish_badge_election(Some(self.badge.candidates[0])),
            _ => self.start_badge_vote(),
        }
    }

    /// Starts a round of the sheriff election. Only players who did not run may vote.
    fn start_badge_vote(&mut self) -> Result<(), GameError> {
        self.current_speaker = None;
        self.speakers.clear();
        let runners: Vec<usize> = self.badge.signed_up().collect();
        let voters = self.eligible_players().exclude_all(&runners).make().seats();
        if voters.is_empty() {
            return self.finish_badge_election(None);
        }
        self.badge.votes = Votes::new(voters);
        self.set_phase(Phase::DayBadgeElection);
        Ok(())
    }

    /// Seats that may receive votes in the current sheriff election round.
    fn badge_ballot(&self) -> Vec<usize> {
        match self.pk_source {
            Some(PkSource::Badge) => self.pk_targets.clone(),
            _ => self.badge.candidates.clone(),
        }
    }

    fn resolve_badge_vote(&mut self) -> Result<(), GameError> {
        let tally = self.badge.votes.tally(|_| NORMAL_WEIGHT);
        self.badge.record_round(self.day, tally.clone());
        self.badge.votes = Votes::default();
        self.pk_targets.clear();
        self.pk_source = None;
        let decision = tally.decide(self.badge.revote_count + 1, MAX_BADGE_ROUNDS);
        self.last_tally = Some(tally);
        match decision {
            VoteDecision::Winner(seat) => self.finish_badge_election(Some(seat)),
            VoteDecision::Runoff(targets) => {
                self.badge.revote_count += 1;
                self.start_runoff(targets, PkSource::Badge);
                Ok(())
            }
            VoteDecision::NoResult => {
                self.badge.destroyed = true;
                self.finish_badge_election(None)
            }
        }
    }

    fn start_runoff(&mut self, targets: Vec<usize>, source: PkSource) {
        log::info!("day {}: PK between {:?}", self.day, targets);
        self.pk_targets = targets.clone();
        self.pk_source = Some(source);
        self.public(EventKind::PkStarted { targets: targets.clone(), source });
        self.start_speeches(targets, Phase::DayPkSpeech);
    }

    fn finish_badge_election(&mut self, sheriff: Option<usize>) -> Result<(), GameError> {
        self.badge.election_held = true;
        self.badge.clear_election();
        self.pk_targets.clear();
        self.pk_source = None;
        self.current_speaker = None;
        self.speakers.clear();
        match sheriff {
            Some(seat) => {
                log::info!("day {}: seat {} elected sheriff", self.day, seat);
                self.badge.holder = Some(seat);
                self.public(EventKind::SheriffElected { seat });
                self.history.add_fact(self.day, Fact::SheriffElected { seat })?;
            }
            None => {
                self.public(EventKind::NoSheriff);
                self.history.add_fact(self.day, Fact::NoSheriff)?;
            }
        }
        self.announce_night()
    }

    /// Starts a round of the execution vote. Players in a PK may not vote, so a PK
    /// holding every living player is counted straight away with no ballots.
    fn start_day_vote(&mut self) -> Result<(), GameError> {
        self.current_speaker = None;
        self.speakers.clear();
        let voters = self.eligible_players().exclude_all(&self.pk_targets).make().seats();
        if voters.is_empty() {
            return self.resolve_day_vote();
        }
        self.votes = Votes::new(voters);
        self.set_phase(Phase::DayVote);
        Ok(())
    }

    /// The half-votes a seat carries in the execution vote.
    fn vote_weight(&self, seat: usize) -> u32 {
        if self.badge.holder == Some(seat) {
            SHERIFF_WEIGHT
        } else {
            NORMAL_WEIGHT
        }
    }

    /// Counts the execution vote and reveals its result.
    fn resolve_day_vote(&mut self) -> Result<(), GameError> {
        let tally = self.votes.tally(|seat| self.vote_weight(seat));
        let votes = std::mem::take(&mut self.votes);
        let runoff = self.pk_source == Some(PkSource::Vote);
        self.history.day_mut(self.day)?.vote_rounds.push(VoteRound {
            ballots: votes.ballots().clone(),
            reasons: votes.reasons().clone(),
            tally: tally.clone(),
            runoff,
        });
        self.pk_targets.clear();
        self.pk_source = None;
        let decision = tally.decide(self.revote_count + 1, MAX_VOTE_ROUNDS);
        self.last_tally = Some(tally);
        self.day_decision = Some(decision.clone());
        self.set_phase(Phase::DayResolve);

        match decision {
            VoteDecision::Winner(seat) => {
                self.exile(seat)?;
                if self.check_win()? {
                    return Ok(());
                }
                self.queue_death_interrupts(seat, false);
                if self.opts.last_words {
                    self.interrupts.push_back(Interrupt::LastWords { seats: vec![seat] });
                }
                self.resume = Phase::NightStart;
            }
            VoteDecision::Runoff(_) => {}
            VoteDecision::NoResult => {
                log::info!("day {}: no elimination", self.day);
                self.public(EventKind::NoElimination);
                self.history.add_fact(self.day, Fact::NoElimination)?;
            }
        }
        Ok(())
    }

    /// Records the day's exile and kills the exiled player.
    fn exile(&mut self, seat: usize) -> Result<(), InvariantViolation> {
        self.history.day_mut(self.day)?.exiled = Some(seat);
        self.history.add_fact(self.day, Fact::Exiled { seat })?;
        self.commit_death(seat, DeathCause::Exiled)
    }

    fn finish_day_resolve(&mut self) -> Result<(), GameError> {
        match self.day_decision.take() {
            Some(VoteDecision::Runoff(targets)) => {
                self.revote_count += 1;
                self.start_runoff(targets, PkSource::Vote);
                Ok(())
            }
            Some(VoteDecision::Winner(_)) => self.continue_flow(),
            Some(VoteDecision::NoResult) | None => {
                self.start_night();
                Ok(())
            }
        }
    }
}
