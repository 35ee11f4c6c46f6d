use super::events::EventKind;
use super::player::Role;
use super::rules::validate_target;
use super::{Game, Phase};
use crate::error::{ActionError, GameError};
use serde::{Deserialize, Serialize};

/// The kinds of action a player can submit.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub enum ActionKind {
    /// The guard protects a player, or nobody, tonight.
    GuardProtect,
    /// A wolf votes for tonight's victim.
    WolfKill,
    /// The witch uses her antidote on the wolves' victim.
    WitchSave,
    /// The witch poisons a player.
    WitchPoison,
    /// The witch uses no potion tonight.
    WitchPass,
    /// The seer learns a player's alignment.
    SeerCheck,
    /// The player runs for sheriff.
    BadgeSignup,
    /// The player does not run for sheriff.
    BadgeDecline,
    /// A candidate drops out of the sheriff election.
    BadgeWithdraw,
    /// A vote in the sheriff election; no target abstains.
    BadgeVote,
    /// A vote in the execution vote; no target abstains.
    DayVote,
    /// The current speaker finishes speaking.
    EndSpeech,
    /// The dead hunter shoots a player, or holds fire.
    HunterShoot,
    /// The dead sheriff passes the badge on, or tears it up.
    BadgeTransfer,
}

/// A decision submitted by a human or an agent.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct Intent {
    pub kind: ActionKind,
    pub target: Option<usize>,
    /// The reason given for a vote, or the text of a speech.
    pub reason: Option<String>,
}

impl Intent {
    pub fn new(kind: ActionKind, target: Option<usize>) -> Self {
        Self { kind, target, reason: None }
    }

    pub fn on(kind: ActionKind, target: usize) -> Self {
        Self::new(kind, Some(target))
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl Game {
    /// Called when a player submits an intent for the given phase.
    /// A rejected intent leaves the game untouched.
    pub fn submit_action(&mut self, seat: usize, phase: Phase, intent: Intent) -> Result<(), GameError> {
        self.check_player_index(seat)?;
        self.check_not_over()?;
        if phase != self.phase {
            return Err(ActionError::StalePhase.into());
        }

        use ActionKind::*;
        match (self.phase, intent.kind) {
            (Phase::NightGuardAction, GuardProtect) => self.guard_protect(seat, intent.target)?,
            (Phase::NightWolfAction, WolfKill) => self.wolf_kill(seat, intent.target)?,
            (Phase::NightWitchAction, WitchSave | WitchPoison | WitchPass) => {
                self.witch_act(seat, intent.kind, intent.target)?
            }
            (Phase::NightSeerAction, SeerCheck) => self.seer_check(seat, intent.target)?,
            (Phase::DayBadgeSignup, BadgeSignup | BadgeDecline) => {
                self.badge_signup(seat, intent.kind == BadgeSignup)?
            }
            (Phase::DayBadgeSpeech, BadgeWithdraw) => self.badge_withdraw(seat)?,
            (Phase::DayBadgeElection, BadgeVote) => self.badge_vote(seat, intent.target, intent.reason)?,
            (Phase::DayVote, DayVote) => self.day_vote(seat, intent.target, intent.reason)?,
            (p, EndSpeech) if p.is_speech() => self.end_speech(seat, intent.reason)?,
            (Phase::HunterShoot, HunterShoot) => self.hunter_shoot(seat, intent.target)?,
            (Phase::BadgeTransfer, BadgeTransfer) => self.badge_transfer(seat, intent.target)?,
            _ => return Err(ActionError::InvalidAction.into()),
        }
        self.check_invariants()?;
        Ok(())
    }

    /// The seats whose intent the game is waiting for.
    pub fn pending_actors(&self) -> Vec<usize> {
        match self.phase {
            Phase::NightGuardAction if !self.night.guard_done => self.able_actors(Role::Guard),
            Phase::NightWolfAction => self
                .able_actors(Role::Werewolf)
                .into_iter()
                .filter(|s| !self.night.wolf_votes.contains_key(s))
                .collect(),
            Phase::NightWitchAction if !self.night.witch_done => self.able_actors(Role::Witch),
            Phase::NightSeerAction if self.night.seer_target.is_none() => self.able_actors(Role::Seer),
            Phase::DayBadgeSignup => self
                .eligible_players()
                .make()
                .seats()
                .into_iter()
                .filter(|s| !self.badge.signup.contains_key(s))
                .collect(),
            Phase::DayBadgeElection => self.badge.votes.outstanding().collect(),
            Phase::DayVote => self.votes.outstanding().collect(),
            p if p.is_speech() => self.current_speaker.into_iter().collect(),
            Phase::HunterShoot | Phase::BadgeTransfer => self.actor.into_iter().collect(),
            _ => vec![],
        }
    }

    /// The intent used when a pending actor gives no decision in time.
    /// Every default is a legal move.
    pub fn default_intent(&self, seat: usize) -> Option<Intent> {
        use ActionKind::*;
        if !self.pending_actors().contains(&seat) {
            return None;
        }
        let intent = match self.phase {
            Phase::NightGuardAction => Intent::new(GuardProtect, None),
            Phase::NightWolfAction => {
                let target = self
                    .eligible_players()
                    .without_role(Role::Werewolf)
                    .make()
                    .first()
                    .or_else(|| self.eligible_players().make().first());
                Intent::new(WolfKill, target)
            }
            Phase::NightWitchAction => Intent::new(WitchPass, None),
            Phase::NightSeerAction => {
                let target = self
                    .eligible_players()
                    .exclude(seat)
                    .not_checked_by_seer()
                    .make()
                    .first()
                    .or_else(|| self.eligible_players().exclude(seat).make().first());
                Intent::new(SeerCheck, target)
            }
            Phase::DayBadgeSignup => Intent::new(BadgeDecline, None),
            Phase::DayBadgeElection => Intent::new(BadgeVote, None),
            Phase::DayVote => Intent::new(DayVote, None),
            p if p.is_speech() => Intent::new(EndSpeech, None),
            Phase::HunterShoot => Intent::new(HunterShoot, None),
            Phase::BadgeTransfer => Intent::new(BadgeTransfer, None),
            _ => return None,
        };
        Some(intent)
    }

    /// Every intent `seat` could have accepted right now.
    pub fn legal_intents(&self, seat: usize) -> Vec<Intent> {
        use ActionKind::*;
        if !self.pending_actors().contains(&seat) {
            return vec![];
        }
        match self.phase {
            Phase::NightGuardAction => self.role_intents(seat, Role::Guard, GuardProtect),
            Phase::NightWolfAction => self.role_intents(seat, Role::Werewolf, WolfKill),
            Phase::NightWitchAction => {
                let mut intents = vec![Intent::new(WitchPass, None)];
                if self.check_actor(seat, Role::Witch, WitchSave, None).is_ok() {
                    intents.push(Intent::new(WitchSave, None));
                }
                intents.extend(self.role_intents(seat, Role::Witch, WitchPoison));
                intents
            }
            Phase::NightSeerAction => self.role_intents(seat, Role::Seer, SeerCheck),
            Phase::DayBadgeSignup => vec![Intent::new(BadgeSignup, None), Intent::new(BadgeDecline, None)],
            Phase::DayBadgeElection => std::iter::once(None)
                .chain(self.badge_ballot().into_iter().map(Some))
                .map(|t| Intent::new(BadgeVote, t))
                .collect(),
            Phase::DayVote => {
                let allowed = self.eligible_players().exclude(seat);
                let allowed = if self.pk_targets.is_empty() {
                    allowed
                } else {
                    allowed.among(&self.pk_targets)
                };
                std::iter::once(None)
                    .chain(allowed.make().seats().into_iter().map(Some))
                    .map(|t| Intent::new(DayVote, t))
                    .collect()
            }
            Phase::HunterShoot => self.role_intents(seat, Role::Hunter, HunterShoot),
            Phase::BadgeTransfer => std::iter::once(None)
                .chain(self.eligible_players().exclude(seat).make().seats().into_iter().map(Some))
                .map(|t| Intent::new(BadgeTransfer, t))
                .collect(),
            p if p.is_speech() => {
                let mut intents = vec![Intent::new(EndSpeech, None)];
                if p == Phase::DayBadgeSpeech && self.badge.is_candidate(seat) {
                    intents.push(Intent::new(BadgeWithdraw, None));
                }
                intents
            }
            _ => vec![],
        }
    }

    /// Intents for a role ability, one per target the rules accept.
    fn role_intents(&self, seat: usize, role: Role, kind: ActionKind) -> Vec<Intent> {
        std::iter::once(None)
            .chain((0..self.num_players()).map(Some))
            .filter(|target| {
                let needs_target = matches!(kind, ActionKind::WolfKill | ActionKind::SeerCheck | ActionKind::WitchPoison);
                (target.is_some() || !needs_target) && self.check_actor(seat, role, kind, *target).is_ok()
            })
            .map(|target| Intent::new(kind, target))
            .collect()
    }

    /// Living players of the given role who may act in the current phase.
    fn able_actors(&self, role: Role) -> Vec<usize> {
        self.players
            .iter()
            .filter(|p| p.role == role && super::rules::can_act(role, self.phase, p, &self.abilities))
            .map(|p| p.seat)
            .collect()
    }

    /// Checks `seat` may act now as `role`, returning any soft-rule warning for the target.
    fn check_actor(
        &self,
        seat: usize,
        role: Role,
        kind: ActionKind,
        target: Option<usize>,
    ) -> Result<Option<super::rules::RuleWarning>, ActionError> {
        if !self.able_actors(role).contains(&seat) {
            return Err(ActionError::NotYourTurn);
        }
        validate_target(&self.players[seat], kind, target, self)
    }

    fn guard_protect(&mut self, seat: usize, target: Option<usize>) -> Result<(), GameError> {
        if self.night.guard_done {
            return Err(ActionError::AlreadyActed.into());
        }
        self.check_actor(seat, Role::Guard, ActionKind::GuardProtect, target)?;
        self.night.guard_target = target;
        self.night.guard_done = true;
        self.private(EventKind::GuardProtected { target }, vec![seat]);
        self.next_night_phase(Phase::NightGuardAction)
    }

    fn wolf_kill(&mut self, seat: usize, target: Option<usize>) -> Result<(), GameError> {
        if self.night.wolf_votes.contains_key(&seat) {
            return Err(ActionError::AlreadyActed.into());
        }
        self.check_actor(seat, Role::Werewolf, ActionKind::WolfKill, target)?;
        let target = target.ok_or(ActionError::InvalidPlayerChoice)?;
        self.night.wolf_votes.insert(seat, target);
        let wolves = self.living_with_role(Role::Werewolf);
        self.private(EventKind::WolfVoted { wolf: seat, target }, wolves.clone());

        if wolves.iter().all(|w| self.night.wolf_votes.contains_key(w)) {
            let Some(target) = self.night.plurality_wolf_target() else {
                return Err(crate::error::InvariantViolation::MissingWolfTarget.into());
            };
            self.night.wolf_target = Some(target);
            self.private(EventKind::WolfTargetChosen { target }, wolves);
            self.next_night_phase(Phase::NightWolfAction)?;
        }
        Ok(())
    }

    fn witch_act(&mut self, seat: usize, kind: ActionKind, target: Option<usize>) -> Result<(), GameError> {
        if self.night.witch_done {
            return Err(ActionError::AlreadyActed.into());
        }
        self.check_actor(seat, Role::Witch, kind, target)?;
        match kind {
            ActionKind::WitchSave => {
                let victim = self.night.wolf_target.ok_or(ActionError::InvalidAction)?;
                self.night.witch_save = true;
                self.abilities.witch_heal_used = true;
                self.private(EventKind::WitchSaved { target: victim }, vec![seat]);
            }
            ActionKind::WitchPoison => {
                let target = target.ok_or(ActionError::InvalidPlayerChoice)?;
                self.night.witch_poison = Some(target);
                self.abilities.witch_poison_used = true;
                self.private(EventKind::WitchPoisoned { target }, vec![seat]);
            }
            _ => self.private(EventKind::WitchPassed, vec![seat]),
        }
        self.night.witch_done = true;
        self.next_night_phase(Phase::NightWitchAction)
    }

    fn seer_check(&mut self, seat: usize, target: Option<usize>) -> Result<(), GameError> {
        if self.night.seer_target.is_some() {
            return Err(ActionError::AlreadyActed.into());
        }
        let warning = self.check_actor(seat, Role::Seer, ActionKind::SeerCheck, target)?;
        let target = target.ok_or(ActionError::InvalidPlayerChoice)?;
        if let Some(warning) = warning {
            log::warn!("seat {}: {}", seat, warning.to_string());
            self.private(
                EventKind::RuleWarning {
                    seat,
                    message: warning.to_string(),
                },
                vec![seat],
            );
        }
        let alignment = self.players[target].alignment();
        self.night.seer_target = Some(target);
        self.night.seer_result = Some(alignment);
        self.abilities.seer_history.insert(target, alignment);
        self.private(EventKind::SeerChecked { target, alignment }, vec![seat]);
        self.next_night_phase(Phase::NightSeerAction)
    }

    fn badge_signup(&mut self, seat: usize, running: bool) -> Result<(), GameError> {
        if !self.players[seat].alive {
            return Err(ActionError::NotYourTurn.into());
        }
        if self.badge.signup.contains_key(&seat) {
            return Err(ActionError::AlreadyActed.into());
        }
        self.badge.signup.insert(seat, running);
        self.public(EventKind::BadgeSignup { seat, running });
        if self.pending_actors().is_empty() {
            self.close_badge_signup()?;
        }
        Ok(())
    }

    fn badge_withdraw(&mut self, seat: usize) -> Result<(), GameError> {
        if !self.badge.is_candidate(seat) {
            return Err(ActionError::NotYourTurn.into());
        }
        self.badge.candidates.retain(|c| *c != seat);
        self.speakers.retain(|s| *s != seat);
        self.public(EventKind::BadgeWithdrawn { seat });
        if self.badge.candidates.len() <= 1 {
            self.speakers.clear();
            self.current_speaker = None;
            return self.end_badge_speeches();
        }
        if self.current_speaker == Some(seat) {
            self.next_speaker()?;
        }
        Ok(())
    }

    fn badge_vote(&mut self, seat: usize, target: Option<usize>, reason: Option<String>) -> Result<(), GameError> {
        if !self.badge.votes.is_voter(seat) {
            return Err(ActionError::NotYourTurn.into());
        }
        if self.badge.votes.has_cast(seat) {
            return Err(ActionError::AlreadyActed.into());
        }
        if let Some(target) = target {
            self.check_player_index(target)?;
            if !self.badge_ballot().contains(&target) {
                return Err(ActionError::InvalidPlayerChoice.into());
            }
        }
        self.public(EventKind::VoteCast {
            voter: seat,
            target,
            reason: reason.clone(),
            badge: true,
        });
        self.badge.votes.vote(seat, target, reason);
        if self.badge.votes.is_complete() {
            self.resolve_badge_vote()?;
        }
        Ok(())
    }

    fn day_vote(&mut self, seat: usize, target: Option<usize>, reason: Option<String>) -> Result<(), GameError> {
        if !self.votes.is_voter(seat) {
            return Err(ActionError::NotYourTurn.into());
        }
        if self.votes.has_cast(seat) {
            return Err(ActionError::AlreadyActed.into());
        }
        if let Some(target) = target {
            self.check_player_index(target)?;
            let allowed = self.eligible_players().exclude(seat);
            let allowed = if self.pk_targets.is_empty() {
                allowed
            } else {
                allowed.among(&self.pk_targets)
            };
            if !allowed.make().includes(target) {
                return Err(ActionError::InvalidPlayerChoice.into());
            }
        }
        self.public(EventKind::VoteCast {
            voter: seat,
            target,
            reason: reason.clone(),
            badge: false,
        });
        self.votes.vote(seat, target, reason);
        if self.votes.is_complete() {
            self.resolve_day_vote()?;
        }
        Ok(())
    }

    fn end_speech(&mut self, seat: usize, text: Option<String>) -> Result<(), GameError> {
        if self.current_speaker != Some(seat) {
            return Err(ActionError::NotYourTurn.into());
        }
        self.public(EventKind::Speech { seat, text });
        self.next_speaker()
    }

    fn hunter_shoot(&mut self, seat: usize, target: Option<usize>) -> Result<(), GameError> {
        if self.actor != Some(seat) {
            return Err(ActionError::NotYourTurn.into());
        }
        self.check_actor(seat, Role::Hunter, ActionKind::HunterShoot, target)?;
        log::info!("day {}: hunter {} shoots {:?}", self.day, seat, target);
        self.public(EventKind::HunterShot { hunter: seat, target });
        self.history
            .add_fact(self.day, super::history::Fact::HunterShot { hunter: seat, target })?;
        self.abilities.hunter_can_shoot = false;
        if let Some(target) = target {
            self.commit_death(target, super::player::DeathCause::Shot)?;
            if self.check_win()? {
                return Ok(());
            }
            self.queue_death_interrupts(target, true);
        }
        self.continue_flow()
    }

    fn badge_transfer(&mut self, seat: usize, target: Option<usize>) -> Result<(), GameError> {
        if self.actor != Some(seat) || self.badge.holder != Some(seat) {
            return Err(ActionError::NotYourTurn.into());
        }
        match target {
            Some(target) => {
                self.check_player_index(target)?;
                if !self.eligible_players().exclude(seat).make().includes(target) {
                    return Err(ActionError::InvalidPlayerChoice.into());
                }
                self.badge.holder = Some(target);
                self.public(EventKind::BadgeTransferred { from: seat, to: target });
                self.history
                    .add_fact(self.day, super::history::Fact::BadgeTransferred { from: seat, to: target })?;
            }
            None => {
                self.badge.holder = None;
                self.badge.destroyed = true;
                self.public(EventKind::BadgeDestroyed { from: seat });
                self.history
                    .add_fact(self.day, super::history::Fact::BadgeDestroyed { from: seat })?;
            }
        }
        self.continue_flow()
    }
}
