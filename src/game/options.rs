use super::player::Role;
use crate::error::GameError;
use serde::{Deserialize, Serialize};

pub const MIN_PLAYERS: usize = 6;

/// Options for customising a game of Werewolf.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct GameOptions {
    /// Whether a sheriff is elected on the first day.
    pub badge_election: bool,
    /// Whether the witch may use her antidote on herself.
    pub witch_self_save: bool,
    /// Whether first-night victims and exiled players give last words.
    pub last_words: bool,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            badge_election: true,
            witch_self_save: true,
            last_words: true,
        }
    }
}

impl GameOptions {
    /// Gets the roles to deal for the given number of players, in no particular order.
    /// Returns a `GameError` if no distribution exists for that player count.
    pub fn role_distribution(&self, num_players: usize) -> Result<Vec<Role>, GameError> {
        let (wolves, guard, villagers) = match num_players {
            0..=5 => return Err(GameError::TooFewPlayers),
            6 => (2, false, 1),
            7 => (2, true, 1),
            8 => (3, true, 1),
            9 => (3, true, 2),
            10 => (3, true, 3),
            11 => (3, true, 4),
            12 => (4, true, 4),
            _ => return Err(GameError::TooManyPlayers),
        };
        let mut roles = vec![Role::Werewolf; wolves];
        roles.extend([Role::Seer, Role::Witch, Role::Hunter]);
        if guard {
            roles.push(Role::Guard);
        }
        roles.extend(std::iter::repeat(Role::Villager).take(villagers));
        Ok(roles)
    }

    /// Returns the minimum number of players.
    pub fn min_players(&self) -> usize {
        MIN_PLAYERS
    }

    /// Returns the maximum number of players.
    pub fn max_players(&self) -> usize {
        super::MAX_PLAYERS
    }
}
