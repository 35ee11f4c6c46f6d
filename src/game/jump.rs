use super::events::EventKind;
use super::history::Fact;
use super::night::NightActions;
use super::player::{DeathCause, PlayerSpec, Role};
use super::rules::can_act;
use super::votes::Votes;
use super::{Game, Phase, NIGHT_ORDER};
use crate::error::{ActionError, GameError};

impl Game {
    /// Developer tooling: returns a copy of the game moved to `target`, with every field a
    /// normal run of the game would have set rebuilt to match. Unplayed choices are filled
    /// with each role's default. The copy passes the same invariants as a normally reached game.
    pub fn force_jump(&self, target: Phase) -> Result<Game, GameError> {
        log::warn!("developer jump from {} to {}", self.phase.to_string(), target.to_string());
        self.jumped(target)
    }

    /// The game as it would be at `target`, if it is reachable. Used by agents to decide
    /// ahead of their turn.
    pub fn preview(&self, target: Phase) -> Option<Game> {
        self.jumped(target).ok()
    }

    fn jumped(&self, target: Phase) -> Result<Game, GameError> {
        let mut game = self.clone();
        game.heal_for(target)?;
        if let Err(err) = game.check_invariants() {
            log::debug!("jump to {} rejected: {}", target.to_string(), err);
            return Err(ActionError::UnreachablePhase.into());
        }
        Ok(game)
    }

    fn heal_for(&mut self, target: Phase) -> Result<(), GameError> {
        if matches!(target, Phase::Lobby | Phase::Setup) {
            let specs: Vec<PlayerSpec> = self
                .players
                .iter()
                .map(|p| PlayerSpec {
                    name: p.name.clone(),
                    is_human: p.is_human,
                })
                .collect();
            *self = Game::new(self.opts, &specs, self.seed)?;
            if target == Phase::Setup {
                self.advance()?;
            }
            return Ok(());
        }

        if self.winner.is_some() && target != Phase::GameEnd {
            return Err(ActionError::UnreachablePhase.into());
        }
        self.clear_turn_state();
        if self.phase == Phase::Lobby {
            self.advance()?;
        }

        match target {
            Phase::NightStart
            | Phase::NightGuardAction
            | Phase::NightWolfAction
            | Phase::NightWitchAction
            | Phase::NightSeerAction
            | Phase::NightResolve => self.heal_night(target),
            Phase::DayStart => {
                self.enter_day()?;
                self.settle_night(false)?;
                self.set_phase(Phase::DayStart);
                Ok(())
            }
            Phase::DayBadgeSignup | Phase::DayBadgeSpeech | Phase::DayBadgeElection => self.heal_badge(target),
            Phase::DayPkSpeech => {
                self.settle_day()?;
                let targets = self.eligible_players().make().seats();
                if targets.len() < 3 {
                    return Err(ActionError::UnreachablePhase.into());
                }
                self.revote_count = 1;
                self.start_runoff(targets[..2].to_vec(), super::PkSource::Vote);
                Ok(())
            }
            Phase::DayLastWords => {
                self.settle_day()?;
                let today: Vec<usize> = self
                    .history
                    .day(self.day)
                    .map(|d| d.deaths.iter().map(|(seat, _)| *seat).collect())
                    .unwrap_or_default();
                if today.is_empty() {
                    return Err(ActionError::UnreachablePhase.into());
                }
                self.resume = Phase::DaySpeech;
                self.start_speeches(today, Phase::DayLastWords);
                Ok(())
            }
            Phase::DaySpeech => {
                self.settle_day()?;
                self.start_day_speech();
                Ok(())
            }
            Phase::DayVote => {
                self.settle_day()?;
                self.start_day_vote()
            }
            Phase::DayResolve => {
                self.settle_day()?;
                self.start_day_vote()?;
                for voter in self.votes.voters().to_vec() {
                    self.votes.vote(voter, None, None);
                }
                self.resolve_day_vote()
            }
            Phase::HunterShoot => {
                self.settle_day()?;
                let hunter = self
                    .players
                    .iter()
                    .find(|p| p.role == Role::Hunter)
                    .map(|p| p.seat)
                    .ok_or(ActionError::UnreachablePhase)?;
                if !self.abilities.hunter_can_shoot {
                    return Err(ActionError::UnreachablePhase.into());
                }
                if self.players[hunter].alive {
                    self.exile_for_jump(hunter)?;
                }
                self.actor = Some(hunter);
                self.resume = Phase::NightStart;
                self.set_phase(Phase::HunterShoot);
                Ok(())
            }
            Phase::BadgeTransfer => {
                self.settle_day()?;
                let holder = self.badge.holder.ok_or(ActionError::UnreachablePhase)?;
                if self.players[holder].alive {
                    self.exile_for_jump(holder)?;
                }
                self.actor = Some(holder);
                self.resume = Phase::NightStart;
                self.set_phase(Phase::BadgeTransfer);
                Ok(())
            }
            Phase::GameEnd => {
                if self.winner.is_some() {
                    return Ok(());
                }
                self.settle_day()?;
                if !self.check_win()? {
                    return Err(ActionError::UnreachablePhase.into());
                }
                Ok(())
            }
            Phase::Lobby | Phase::Setup => Ok(()),
        }
    }

    /// Drops everything tied to the current turn, including a sheriff election in progress.
    fn clear_turn_state(&mut self) {
        self.interrupts.clear();
        self.speakers.clear();
        self.current_speaker = None;
        self.actor = None;
        self.votes = Votes::default();
        self.badge.votes = Votes::default();
        self.pk_targets.clear();
        self.pk_source = None;
        self.revote_count = 0;
        self.badge.revote_count = 0;
        self.last_tally = None;
        self.day_decision = None;
        self.badge.candidates.clear();
        self.badge.signup.clear();
    }

    /// Exiles `seat` today, unless someone has already been exiled.
    fn exile_for_jump(&mut self, seat: usize) -> Result<(), GameError> {
        if self.history.day(self.day).is_some_and(|d| d.exiled.is_some()) {
            return Err(ActionError::UnreachablePhase.into());
        }
        self.exile(seat)?;
        Ok(())
    }

    /// Marks today's sheriff election as held with no sheriff, if it has not happened yet.
    fn skip_badge_election(&mut self) -> Result<(), GameError> {
        if self.badge_election_due() {
            self.badge.clear_election();
            self.badge.election_held = true;
            self.public(EventKind::NoSheriff);
            self.history.add_fact(self.day, Fact::NoSheriff)?;
        }
        Ok(())
    }

    fn heal_night(&mut self, target: Phase) -> Result<(), GameError> {
        if target == Phase::NightResolve && self.phase == Phase::NightResolve {
            return Ok(());
        }
        let same_night = self.day > 0 && self.phase.is_night() && self.phase != Phase::NightResolve;
        if !same_night {
            if self.day > 0 {
                self.settle_night(true)?;
                self.skip_badge_election()?;
            }
            self.start_night();
        }
        self.clear_night_from(target);
        self.fill_night_defaults(target);

        if target == Phase::NightResolve {
            return self.finish_night();
        }
        if let Some(role) = target.night_role() {
            let able = self.players.iter().any(|p| p.role == role && can_act(role, target, p, &self.abilities));
            if !able {
                return Err(ActionError::UnreachablePhase.into());
            }
        }
        if self.phase != target {
            self.set_phase(target);
        }
        Ok(())
    }

    /// Forgets tonight's choices for `from` and every later night sub-phase.
    fn clear_night_from(&mut self, from: Phase) {
        let night = &mut self.night;
        if from <= Phase::NightGuardAction {
            night.guard_target = None;
            night.guard_done = false;
        }
        if from <= Phase::NightWolfAction {
            night.wolf_votes.clear();
            night.wolf_target = None;
        }
        if from <= Phase::NightWitchAction {
            // Potions spent tonight go back to the witch
            if night.witch_save {
                self.abilities.witch_heal_used = false;
            }
            if night.witch_poison.is_some() {
                self.abilities.witch_poison_used = false;
            }
            night.witch_save = false;
            night.witch_poison = None;
            night.witch_done = false;
        }
        if from <= Phase::NightSeerAction {
            if let Some(target) = night.seer_target {
                let checked_before = self.history.nights().values().any(|n| n.seer_check.is_some_and(|(s, _)| s == target));
                if !checked_before {
                    self.abilities.seer_history.remove(&target);
                }
            }
            night.seer_target = None;
            night.seer_result = None;
        }
        night.pending_wolf_victim = None;
        night.pending_poison_victim = None;
        self.night_outcome = None;
    }

    /// Makes the default choice for every night sub-phase before `before` that has not been played.
    fn fill_night_defaults(&mut self, before: Phase) {
        for phase in NIGHT_ORDER.into_iter().filter(|p| *p < before) {
            match phase {
                Phase::NightGuardAction => self.night.guard_done = true,
                Phase::NightWolfAction if self.night.wolf_target.is_none() => {
                    let Some(victim) = self
                        .eligible_players()
                        .without_role(Role::Werewolf)
                        .make()
                        .first()
                    else {
                        continue;
                    };
                    for wolf in self.living_with_role(Role::Werewolf) {
                        self.night.wolf_votes.entry(wolf).or_insert(victim);
                    }
                    self.night.wolf_target = self.night.plurality_wolf_target();
                }
                Phase::NightWitchAction => self.night.witch_done = true,
                _ => {}
            }
        }
    }

    /// Plays out an unresolved night with default choices. With `announce`, its deaths are
    /// also committed and the night is closed.
    fn settle_night(&mut self, announce: bool) -> Result<(), GameError> {
        if !self.night_in_progress() {
            return Ok(());
        }
        if self.history.night(self.day).is_none() {
            self.fill_night_defaults(Phase::NightResolve);
            self.finish_night()?;
        }
        if announce {
            let victims = [
                (self.night.pending_wolf_victim, DeathCause::Killed),
                (self.night.pending_poison_victim, DeathCause::Poisoned),
            ];
            self.night.close_night();
            for (seat, cause) in victims {
                if let Some(seat) = seat {
                    self.commit_death(seat, cause)?;
                }
            }
        }
        Ok(())
    }

    /// Makes sure the game is on a day, starting day 1 from before the first night.
    fn enter_day(&mut self) -> Result<(), GameError> {
        if self.day == 0 {
            self.day = 1;
            self.night = NightActions::default();
        }
        Ok(())
    }

    /// Brings the game to the open part of a day: the night is over, its deaths revealed,
    /// and today's sheriff election, if any, behind us.
    fn settle_day(&mut self) -> Result<(), GameError> {
        self.enter_day()?;
        self.settle_night(true)?;
        self.skip_badge_election()
    }

    fn heal_badge(&mut self, target: Phase) -> Result<(), GameError> {
        self.enter_day()?;
        self.badge.clear_election();
        if !self.badge_election_due() {
            return Err(ActionError::UnreachablePhase.into());
        }
        self.settle_night(false)?;
        if target == Phase::DayBadgeSignup {
            self.set_phase(Phase::DayBadgeSignup);
            return Ok(());
        }

        // Everyone has answered the signup; the two lowest seats are running
        let living = self.eligible_players().make().seats();
        if living.len() < 3 {
            return Err(ActionError::UnreachablePhase.into());
        }
        for seat in &living {
            self.badge.signup.insert(*seat, living[..2].contains(seat));
        }
        self.badge.candidates = living[..2].to_vec();
        if target == Phase::DayBadgeSpeech {
            let candidates = self.badge.candidates.clone();
            self.start_speeches(candidates, Phase::DayBadgeSpeech);
            Ok(())
        } else {
            self.start_badge_vote()
        }
    }
}
