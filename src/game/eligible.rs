use super::{player::Role, Game, MAX_PLAYERS};
use serde::{Deserialize, Serialize};

/// A set of seats.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct EligiblePlayers {
    eligible: [bool; MAX_PLAYERS],
}

impl EligiblePlayers {
    pub fn includes(&self, player: usize) -> bool {
        self.eligible.get(player).copied().unwrap_or(false)
    }

    /// The seats in the set, in ascending order.
    pub fn seats(&self) -> Vec<usize> {
        (0..MAX_PLAYERS).filter(|i| self.eligible[*i]).collect()
    }

    pub fn first(&self) -> Option<usize> {
        self.eligible.iter().position(|e| *e)
    }

    pub fn is_empty(&self) -> bool {
        !self.eligible.iter().any(|e| *e)
    }
}

pub struct EligiblePlayersBuilder<'a> {
    game: &'a Game,
    eligible: [bool; MAX_PLAYERS],
}

impl Game {
    /// Starts building a set of seats from the living players.
    pub fn eligible_players(&self) -> EligiblePlayersBuilder<'_> {
        EligiblePlayersBuilder {
            game: self,
            eligible: core::array::from_fn(|i| self.players.get(i).map(|p| p.alive).unwrap_or(false)),
        }
    }
}

impl<'a> EligiblePlayersBuilder<'a> {
    pub fn exclude(mut self, player: usize) -> Self {
        if let Some(e) = self.eligible.get_mut(player) {
            *e = false;
        }
        self
    }

    pub fn exclude_all(mut self, players: &[usize]) -> Self {
        for player in players {
            self = self.exclude(*player);
        }
        self
    }

    /// Keeps only the given seats.
    pub fn among(mut self, players: &[usize]) -> Self {
        for (idx, e) in self.eligible.iter_mut().enumerate() {
            *e &= players.contains(&idx);
        }
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        for (idx, player) in self.game.players.iter().enumerate() {
            self.eligible[idx] &= player.role == role;
        }
        self
    }

    pub fn without_role(mut self, role: Role) -> Self {
        for (idx, player) in self.game.players.iter().enumerate() {
            self.eligible[idx] &= player.role != role;
        }
        self
    }

    pub fn not_checked_by_seer(mut self) -> Self {
        for idx in self.game.abilities.seer_history.keys() {
            if let Some(e) = self.eligible.get_mut(*idx) {
                *e = false;
            }
        }
        self
    }

    pub fn make(self) -> EligiblePlayers {
        EligiblePlayers { eligible: self.eligible }
    }
}
