use super::player::Role;
use super::votes::{MAX_BADGE_ROUNDS, MAX_VOTE_ROUNDS};
use super::{Game, Phase, PkSource};
use crate::error::InvariantViolation;

impl Game {
    /// Whether this phase may still carry tonight's actions and undisclosed deaths.
    pub(super) fn night_in_progress(&self) -> bool {
        match self.phase {
            p if p.is_night() => true,
            Phase::DayStart | Phase::DayBadgeSignup | Phase::DayBadgeSpeech | Phase::DayBadgeElection => true,
            Phase::DayPkSpeech => self.pk_source == Some(PkSource::Badge),
            _ => false,
        }
    }

    /// Checks every structural invariant of the game.
    /// Both normal transitions and developer jumps must leave the game passing these.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let fail = |msg: String| Err(InvariantViolation::Inconsistent(msg));

        if self.winner.is_some() != (self.phase == Phase::GameEnd) {
            return fail(format!("winner {:?} in phase {}", self.winner, self.phase.to_string()));
        }
        if let Some(winner) = self.winner {
            if super::win::check_win(&self.players) != Some(winner) {
                return fail("winner does not match the living players".into());
            }
        } else if super::win::check_win(&self.players).is_some() && !self.night.has_pending_victims() {
            return fail("a side has won but the game continues".into());
        }

        let pregame = matches!(self.phase, Phase::Lobby | Phase::Setup);
        if pregame != (self.day == 0) {
            return fail(format!("day {} in phase {}", self.day, self.phase.to_string()));
        }
        if pregame && self.players.iter().any(|p| !p.alive) {
            return fail("a player died before the game started".into());
        }

        // Speakers
        if self.current_speaker.is_some() != self.phase.is_speech() {
            return fail(format!("speaker {:?} in phase {}", self.current_speaker, self.phase.to_string()));
        }
        if !self.phase.is_speech() && !self.speakers.is_empty() {
            return fail("speaker queue outside a speech".into());
        }
        if let Some(seat) = self.current_speaker {
            let player = self.players.get(seat).ok_or(InvariantViolation::UnknownSeat(seat))?;
            if player.alive == (self.phase == Phase::DayLastWords) {
                return fail(format!("seat {seat} cannot speak in {}", self.phase.to_string()));
            }
        }

        // Dead actors
        match self.phase {
            Phase::HunterShoot => {
                let Some(hunter) = self.actor.and_then(|s| self.players.get(s)) else {
                    return fail("no hunter to shoot".into());
                };
                if hunter.role != Role::Hunter || hunter.alive || !self.abilities.hunter_can_shoot {
                    return fail(format!("seat {} cannot shoot", hunter.seat));
                }
            }
            Phase::BadgeTransfer => {
                let Some(holder) = self.actor.and_then(|s| self.players.get(s)) else {
                    return fail("no sheriff to hand over the badge".into());
                };
                if holder.alive || self.badge.holder != Some(holder.seat) {
                    return fail(format!("seat {} cannot hand over the badge", holder.seat));
                }
            }
            _ if self.actor.is_some() => return fail("acting player outside a death phase".into()),
            _ => {}
        }

        // Votes
        if !self.votes.is_empty() && self.phase != Phase::DayVote {
            return fail("day votes outside the day vote".into());
        }
        if !self.badge.votes.is_empty() && self.phase != Phase::DayBadgeElection {
            return fail("badge votes outside the badge election".into());
        }
        if self.pk_targets.is_empty() != self.pk_source.is_none() {
            return fail("PK targets without a PK source".into());
        }
        if !self.pk_targets.is_empty() {
            let allowed = match self.pk_source {
                Some(PkSource::Badge) => matches!(self.phase, Phase::DayPkSpeech | Phase::DayBadgeElection),
                _ => matches!(self.phase, Phase::DayPkSpeech | Phase::DayVote),
            };
            if !allowed || self.pk_targets.len() < 2 {
                return fail(format!("PK {:?} in phase {}", self.pk_targets, self.phase.to_string()));
            }
        }
        let electing = match self.phase {
            Phase::DayBadgeSignup | Phase::DayBadgeSpeech | Phase::DayBadgeElection => true,
            Phase::DayPkSpeech => self.pk_source == Some(PkSource::Badge),
            _ => false,
        };
        if !electing && !(self.badge.candidates.is_empty() && self.badge.signup.is_empty()) {
            return fail(format!("sheriff election left over in {}", self.phase.to_string()));
        }
        if self.revote_count >= MAX_VOTE_ROUNDS || self.badge.revote_count >= MAX_BADGE_ROUNDS {
            return fail("too many PK rounds".into());
        }
        if let Some(holder) = self.badge.holder {
            if self.badge.destroyed || holder >= self.players.len() {
                return fail(format!("invalid sheriff {holder}"));
            }
        }

        // Night scratch
        if !self.night_in_progress() && !self.night.is_clear() {
            return fail(format!("night actions left over in {}", self.phase.to_string()));
        }
        if self.night.guard_target.is_some() && self.night.guard_target == self.night.last_guard_target {
            return fail("guard protected the same seat twice in a row".into());
        }
        for seat in [self.night.pending_wolf_victim, self.night.pending_poison_victim].into_iter().flatten() {
            if !self.players.get(seat).is_some_and(|p| p.alive) {
                return fail(format!("pending victim {seat} is not alive"));
            }
        }

        Ok(())
    }
}
