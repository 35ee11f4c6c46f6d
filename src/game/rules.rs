use super::action::ActionKind;
use super::player::{Alignment, Player, Role};
use super::{Game, Phase};
use crate::error::ActionError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Abilities that can only be used once, or can be lost.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct RoleAbilities {
    pub witch_heal_used: bool,
    pub witch_poison_used: bool,
    /// Cleared when the hunter dies of poison.
    pub hunter_can_shoot: bool,
    /// Every seat the seer has checked, with the result.
    pub seer_history: BTreeMap<usize, Alignment>,
}

impl Default for RoleAbilities {
    fn default() -> Self {
        Self {
            witch_heal_used: false,
            witch_poison_used: false,
            hunter_can_shoot: true,
            seer_history: BTreeMap::new(),
        }
    }
}

/// A soft rule the actor broke. The action still goes through.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum RuleWarning {
    SeatAlreadyChecked(usize),
}

impl ToString for RuleWarning {
    fn to_string(&self) -> String {
        match self {
            RuleWarning::SeatAlreadyChecked(seat) => format!("seat {seat} has already been checked"),
        }
    }
}

/// Returns whether a player of the given role may act in the given phase.
pub fn can_act(role: Role, phase: Phase, player: &Player, abilities: &RoleAbilities) -> bool {
    match role {
        Role::Guard => phase == Phase::NightGuardAction && player.alive,
        Role::Werewolf => phase == Phase::NightWolfAction && player.alive,
        Role::Witch => {
            phase == Phase::NightWitchAction
                && player.alive
                && !(abilities.witch_heal_used && abilities.witch_poison_used)
        }
        Role::Seer => phase == Phase::NightSeerAction && player.alive,
        Role::Hunter => phase == Phase::HunterShoot && !player.alive && abilities.hunter_can_shoot,
        Role::Villager => false,
    }
}

/// Checks that `actor` may use the ability `kind` on `target`.
pub fn validate_target(
    actor: &Player,
    kind: ActionKind,
    target: Option<usize>,
    game: &Game,
) -> Result<Option<RuleWarning>, ActionError> {
    let abilities = &game.abilities;
    let living_other = |target: Option<usize>| -> Result<usize, ActionError> {
        let target = target.ok_or(ActionError::InvalidPlayerChoice)?;
        let player = game.players.get(target).ok_or(ActionError::InvalidPlayerIndex)?;
        if !player.alive || target == actor.seat {
            return Err(ActionError::InvalidPlayerChoice);
        }
        Ok(target)
    };

    match (actor.role, kind) {
        (Role::Guard, ActionKind::GuardProtect) => {
            let Some(target) = target else {
                return Ok(None);
            };
            let player = game.players.get(target).ok_or(ActionError::InvalidPlayerIndex)?;
            if !player.alive {
                return Err(ActionError::InvalidPlayerChoice);
            }
            if game.night.last_guard_target == Some(target) {
                return Err(ActionError::RepeatedGuardTarget);
            }
            Ok(None)
        }
        (Role::Werewolf, ActionKind::WolfKill) => {
            let target = target.ok_or(ActionError::InvalidPlayerChoice)?;
            let player = game.players.get(target).ok_or(ActionError::InvalidPlayerIndex)?;
            if !player.alive {
                return Err(ActionError::InvalidPlayerChoice);
            }
            Ok(None)
        }
        (Role::Witch, ActionKind::WitchSave) => {
            if abilities.witch_heal_used {
                return Err(ActionError::PotionUsed);
            }
            let victim = game.night.wolf_target.ok_or(ActionError::InvalidAction)?;
            if target.is_some_and(|t| t != victim) {
                return Err(ActionError::InvalidPlayerChoice);
            }
            if victim == actor.seat && !game.opts.witch_self_save {
                return Err(ActionError::SelfSaveForbidden);
            }
            Ok(None)
        }
        (Role::Witch, ActionKind::WitchPoison) => {
            if abilities.witch_poison_used {
                return Err(ActionError::PotionUsed);
            }
            living_other(target)?;
            Ok(None)
        }
        (Role::Witch, ActionKind::WitchPass) => Ok(None),
        (Role::Seer, ActionKind::SeerCheck) => {
            let target = living_other(target)?;
            if abilities.seer_history.contains_key(&target) {
                return Ok(Some(RuleWarning::SeatAlreadyChecked(target)));
            }
            Ok(None)
        }
        (Role::Hunter, ActionKind::HunterShoot) => {
            if !abilities.hunter_can_shoot {
                return Err(ActionError::InvalidAction);
            }
            if target.is_some() {
                living_other(target)?;
            }
            Ok(None)
        }
        (Role::Werewolf | Role::Villager | Role::Seer | Role::Witch | Role::Hunter | Role::Guard, _) => {
            Err(ActionError::InvalidAction)
        }
    }
}
