use super::votes::{Tally, Votes};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The sheriff's badge and the state of its election.
#[derive(Clone, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Badge {
    /// The current sheriff.
    pub holder: Option<usize>,
    /// Players still running for sheriff.
    pub candidates: Vec<usize>,
    /// Each living player's answer to "run for sheriff?".
    pub signup: BTreeMap<usize, bool>,
    pub votes: Votes,
    /// Tallies of every election round, by day.
    pub history: BTreeMap<u32, Vec<Tally>>,
    /// PK rounds entered in the current election.
    pub revote_count: u32,
    /// Set once the election has been held, whatever its result.
    pub election_held: bool,
    /// Set when the badge is out of play for the rest of the game.
    pub destroyed: bool,
}

impl Badge {
    /// Clears the scratch fields of an election, keeping the holder and history.
    pub fn clear_election(&mut self) {
        self.candidates.clear();
        self.signup.clear();
        self.votes = Votes::default();
        self.revote_count = 0;
    }

    pub fn is_candidate(&self, seat: usize) -> bool {
        self.candidates.contains(&seat)
    }

    /// Players who answered the signup prompt with yes.
    pub fn signed_up(&self) -> impl Iterator<Item = usize> + '_ {
        self.signup.iter().filter(|(_, running)| **running).map(|(seat, _)| *seat)
    }

    pub fn record_round(&mut self, day: u32, tally: Tally) {
        self.history.entry(day).or_default().push(tally);
    }
}
