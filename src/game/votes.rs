use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Voting rounds allowed for a day vote (the first vote plus PK revotes) before a tie means no one is exiled.
pub const MAX_VOTE_ROUNDS: u32 = 3;
/// Voting rounds allowed for the sheriff election before a tie means no sheriff.
pub const MAX_BADGE_ROUNDS: u32 = 2;

/// Vote weights, counted in half-votes.
pub const NORMAL_WEIGHT: u32 = 2;
pub const SHERIFF_WEIGHT: u32 = 3;

/// Tracks the ballot of each eligible voter. A `None` ballot is an abstention.
#[derive(Clone, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Votes {
    voters: Vec<usize>,
    ballots: BTreeMap<usize, Option<usize>>,
    reasons: BTreeMap<usize, String>,
}

/// The counted result of a vote.
#[derive(Clone, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Tally {
    /// Half-votes received by each seat.
    pub counts: BTreeMap<usize, u32>,
    pub winner: Option<usize>,
    /// Seats sharing the highest count, when more than one.
    pub tied: Vec<usize>,
    pub total: u32,
}

/// What a tally means for the flow of the game.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum VoteDecision {
    Winner(usize),
    Runoff(Vec<usize>),
    NoResult,
}

impl Votes {
    /// Creates a new `Votes` for the given voters.
    pub fn new(voters: Vec<usize>) -> Self {
        Self {
            voters,
            ..Default::default()
        }
    }

    pub fn is_voter(&self, seat: usize) -> bool {
        self.voters.contains(&seat)
    }

    /// Returns whether the given player has cast their vote.
    pub fn has_cast(&self, seat: usize) -> bool {
        self.ballots.contains_key(&seat)
    }

    /// Records the vote of a player.
    pub fn vote(&mut self, seat: usize, target: Option<usize>, reason: Option<String>) {
        self.ballots.insert(seat, target);
        if let Some(reason) = reason {
            self.reasons.insert(seat, reason);
        }
    }

    /// Returns true once every voter has cast a ballot.
    pub fn is_complete(&self) -> bool {
        self.voters.iter().all(|v| self.ballots.contains_key(v))
    }

    pub fn is_empty(&self) -> bool {
        self.ballots.is_empty()
    }

    pub fn voters(&self) -> &[usize] {
        &self.voters
    }

    /// Voters that still need to cast a ballot.
    pub fn outstanding(&self) -> impl Iterator<Item = usize> + '_ {
        self.voters.iter().copied().filter(|v| !self.ballots.contains_key(v))
    }

    pub fn ballots(&self) -> &BTreeMap<usize, Option<usize>> {
        &self.ballots
    }

    pub fn reasons(&self) -> &BTreeMap<usize, String> {
        &self.reasons
    }

    /// Counts the ballots, with each voter's weight given in half-votes.
    pub fn tally(&self, weight: impl Fn(usize) -> u32) -> Tally {
        tally(&self.ballots, weight)
    }
}

/// Counts ballots. Abstentions carry no weight.
pub fn tally(ballots: &BTreeMap<usize, Option<usize>>, weight: impl Fn(usize) -> u32) -> Tally {
    let mut counts = BTreeMap::new();
    for (voter, target) in ballots {
        if let Some(target) = target {
            *counts.entry(*target).or_insert(0) += weight(*voter);
        }
    }
    let total = counts.values().sum();
    let max = counts.values().copied().max().unwrap_or(0);
    let leaders: Vec<usize> = counts.iter().filter(|(_, n)| **n == max && max > 0).map(|(s, _)| *s).collect();
    let (winner, tied) = match leaders.len() {
        1 => (Some(leaders[0]), vec![]),
        _ => (None, leaders),
    };
    Tally { counts, winner, tied, total }
}

impl Tally {
    /// Decides the result of a voting round, where `rounds_held` counts this round and
    /// every earlier round of the same vote.
    pub fn decide(&self, rounds_held: u32, max_rounds: u32) -> VoteDecision {
        if let Some(winner) = self.winner {
            return VoteDecision::Winner(winner);
        }
        if self.tied.len() > 1 && rounds_held < max_rounds {
            return VoteDecision::Runoff(self.tied.clone());
        }
        VoteDecision::NoResult
    }
}
