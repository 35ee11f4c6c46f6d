use super::player::{Alignment, DeathCause, Player, Role};
use crate::error::InvariantViolation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Settles a tie between wolf targets, given in ascending seat order: the lowest seat is bitten.
pub const WOLF_TIE_BREAK: fn(&[usize]) -> Option<usize> = |tied| tied.first().copied();

/// Per-night scratch space for the role actions collected so far.
#[derive(Clone, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct NightActions {
    /// The seat the guard protects tonight, if any.
    pub guard_target: Option<usize>,
    /// Whether the guard has made (or skipped) their choice tonight.
    pub guard_done: bool,
    /// The seat the guard protected last night; it may not be protected again tonight.
    pub last_guard_target: Option<usize>,
    /// Each living wolf's chosen victim, keyed by the wolf's seat.
    pub wolf_votes: BTreeMap<usize, usize>,
    /// The agreed wolf victim, set once every living wolf has voted.
    pub wolf_target: Option<usize>,
    pub witch_save: bool,
    pub witch_poison: Option<usize>,
    pub witch_done: bool,
    pub seer_target: Option<usize>,
    pub seer_result: Option<Alignment>,
    /// Deaths computed by the resolver but not yet committed to the players.
    pub pending_wolf_victim: Option<usize>,
    pub pending_poison_victim: Option<usize>,
}

/// A death produced by the night resolver.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct NightDeath {
    pub seat: usize,
    pub cause: DeathCause,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct NightOutcome {
    pub deaths: Vec<NightDeath>,
    /// The wolf target that survived thanks to the guard or the witch.
    pub blocked: Option<usize>,
    pub seer_result: Option<(usize, Alignment)>,
}

impl NightActions {
    /// Clears tonight's scratch, remembering the guard's choice for the next night.
    pub fn close_night(&mut self) {
        let last_guard_target = self.guard_target;
        *self = NightActions {
            last_guard_target,
            ..Default::default()
        };
    }

    /// Returns true if nothing but the previous guard target is recorded.
    pub fn is_clear(&self) -> bool {
        *self
            == NightActions {
                last_guard_target: self.last_guard_target,
                ..Default::default()
            }
    }

    /// Gets the number of votes each seat received from the wolves.
    pub fn wolf_vote_counts(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for target in self.wolf_votes.values() {
            *counts.entry(*target).or_insert(0) += 1;
        }
        counts
    }

    /// Computes the wolves' victim: the seat with the most votes, with ties
    /// settled by [WOLF_TIE_BREAK].
    pub fn plurality_wolf_target(&self) -> Option<usize> {
        let counts = self.wolf_vote_counts();
        let max = counts.values().copied().max()?;
        let tied: Vec<usize> = counts.into_iter().filter(|(_, n)| *n == max).map(|(seat, _)| seat).collect();
        WOLF_TIE_BREAK(&tied)
    }

    pub fn has_pending_victims(&self) -> bool {
        self.pending_wolf_victim.is_some() || self.pending_poison_victim.is_some()
    }
}

impl NightOutcome {
    pub fn is_peaceful(&self) -> bool {
        self.deaths.is_empty()
    }
}

/// Resolves one night's actions into deaths and a seer result.
///
/// The guard and the witch's antidote each block the wolf kill on their own;
/// poison is never blocked. A seat that is both bitten and poisoned dies once, of poison.
pub fn resolve_night(actions: &NightActions, players: &[Player]) -> Result<NightOutcome, InvariantViolation> {
    let living = |seat: usize| -> Result<&Player, InvariantViolation> {
        let player = players.get(seat).ok_or(InvariantViolation::UnknownSeat(seat))?;
        if !player.alive {
            return Err(InvariantViolation::Inconsistent(format!("night action targets dead seat {seat}")));
        }
        Ok(player)
    };

    let wolves_alive = players.iter().any(|p| p.alive && p.role == Role::Werewolf);
    if wolves_alive && actions.wolf_target.is_none() {
        return Err(InvariantViolation::MissingWolfTarget);
    }
    if actions.witch_save && actions.wolf_target.is_none() {
        return Err(InvariantViolation::SaveWithoutTarget);
    }
    if actions.witch_save && actions.witch_poison.is_some() {
        return Err(InvariantViolation::Inconsistent("witch used both potions in one night".into()));
    }

    let mut outcome = NightOutcome::default();

    if let Some(target) = actions.wolf_target {
        living(target)?;
        let protected = actions.guard_target == Some(target) || actions.witch_save;
        if actions.witch_poison == Some(target) {
            // Counted below as a poison death
        } else if protected {
            outcome.blocked = Some(target);
        } else {
            outcome.deaths.push(NightDeath { seat: target, cause: DeathCause::Killed });
        }
    }

    if let Some(target) = actions.witch_poison {
        living(target)?;
        outcome.deaths.push(NightDeath { seat: target, cause: DeathCause::Poisoned });
    }
    outcome.deaths.sort_by_key(|d| d.seat);

    if let Some(target) = actions.seer_target {
        let alignment = living(target)?.alignment();
        outcome.seer_result = Some((target, alignment));
    }

    Ok(outcome)
}
