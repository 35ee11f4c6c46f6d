use super::options::GameOptions;
use crate::error::GameError;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// A seated player.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub seat: usize,
    pub role: Role,
    pub alive: bool,
    pub is_human: bool,
    pub death: Option<Death>,
}

/// A player joining a new game.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct PlayerSpec {
    pub name: String,
    pub is_human: bool,
}

impl PlayerSpec {
    pub fn human(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_human: true }
    }

    pub fn agent(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_human: false }
    }
}

/// The roles of the game. Each has a fixed [Alignment].
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Role {
    Werewolf,
    Villager,
    Seer,
    Witch,
    Hunter,
    Guard,
}

/// The two opposing sides.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Alignment {
    Wolf,
    Village,
}

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub enum DeathCause {
    /// Killed by the werewolves during the night.
    Killed,
    /// Poisoned by the witch.
    Poisoned,
    /// Voted out during the day.
    Exiled,
    /// Shot by the hunter.
    Shot,
}

#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct Death {
    pub day: u32,
    pub cause: DeathCause,
}

impl Role {
    pub fn alignment(self) -> Alignment {
        match self {
            Role::Werewolf => Alignment::Wolf,
            Role::Villager | Role::Seer | Role::Witch | Role::Hunter | Role::Guard => Alignment::Village,
        }
    }
}

impl ToString for Role {
    fn to_string(&self) -> String {
        match self {
            Role::Werewolf => "Werewolf",
            Role::Villager => "Villager",
            Role::Seer => "Seer",
            Role::Witch => "Witch",
            Role::Hunter => "Hunter",
            Role::Guard => "Guard",
        }
        .to_string()
    }
}

impl ToString for DeathCause {
    fn to_string(&self) -> String {
        match self {
            DeathCause::Killed => "killed",
            DeathCause::Poisoned => "poisoned",
            DeathCause::Exiled => "exiled",
            DeathCause::Shot => "shot",
        }
        .to_string()
    }
}

impl Player {
    pub fn new(name: String, seat: usize, role: Role, is_human: bool) -> Self {
        Self {
            name,
            seat,
            role,
            alive: true,
            is_human,
            death: None,
        }
    }

    pub fn alignment(&self) -> Alignment {
        self.role.alignment()
    }
}

/// Deals the roles for the given number of players onto seats in a random order.
pub fn assign_roles(num_players: usize, opts: &GameOptions, rng: &mut impl rand::Rng) -> Result<Vec<Role>, GameError> {
    let mut roles = opts.role_distribution(num_players)?;
    roles.shuffle(rng);
    Ok(roles)
}
