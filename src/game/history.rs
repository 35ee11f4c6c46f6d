use super::night::NightDeath;
use super::player::{Alignment, DeathCause};
use super::votes::Tally;
use crate::error::InvariantViolation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What happened during one night.
#[derive(Clone, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct NightRecord {
    pub guard_target: Option<usize>,
    pub wolf_target: Option<usize>,
    pub witch_saved: bool,
    pub witch_poisoned: Option<usize>,
    pub seer_check: Option<(usize, Alignment)>,
    pub deaths: Vec<NightDeath>,
}

/// One round of the day vote.
#[derive(Clone, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct VoteRound {
    pub ballots: BTreeMap<usize, Option<usize>>,
    pub reasons: BTreeMap<usize, String>,
    pub tally: Tally,
    pub runoff: bool,
}

/// What happened during one day.
#[derive(Clone, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct DayRecord {
    pub vote_rounds: Vec<VoteRound>,
    pub exiled: Option<usize>,
    pub deaths: Vec<(usize, DeathCause)>,
}

/// A plain statement about a day, for after-game analysis.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Fact {
    PeacefulNight,
    Died { seat: usize, cause: DeathCause },
    SheriffElected { seat: usize },
    NoSheriff,
    Exiled { seat: usize },
    NoElimination,
    HunterShot { hunter: usize, target: Option<usize> },
    BadgeTransferred { from: usize, to: usize },
    BadgeDestroyed { from: usize },
    Winner { alignment: Alignment },
}

/// Append-only record of resolved outcomes. Once a day is closed, nothing about it may change.
#[derive(Clone, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct History {
    nights: BTreeMap<u32, NightRecord>,
    days: BTreeMap<u32, DayRecord>,
    facts: BTreeMap<u32, Vec<Fact>>,
    /// Every day up to and including this one is closed.
    closed_through: u32,
}

impl History {
    fn check_open(&self, day: u32) -> Result<(), InvariantViolation> {
        if day <= self.closed_through {
            Err(InvariantViolation::HistoryClosed(day))
        } else {
            Ok(())
        }
    }

    pub fn record_night(&mut self, day: u32, record: NightRecord) -> Result<(), InvariantViolation> {
        self.check_open(day)?;
        if self.nights.contains_key(&day) {
            return Err(InvariantViolation::Inconsistent(format!("night {day} resolved twice")));
        }
        self.nights.insert(day, record);
        Ok(())
    }

    pub fn day_mut(&mut self, day: u32) -> Result<&mut DayRecord, InvariantViolation> {
        self.check_open(day)?;
        Ok(self.days.entry(day).or_default())
    }

    pub fn add_fact(&mut self, day: u32, fact: Fact) -> Result<(), InvariantViolation> {
        self.check_open(day)?;
        self.facts.entry(day).or_default().push(fact);
        Ok(())
    }

    /// Closes every day up to and including `day`.
    pub fn close_through(&mut self, day: u32) {
        self.closed_through = self.closed_through.max(day);
    }

    pub fn closed_through(&self) -> u32 {
        self.closed_through
    }

    pub fn night(&self, day: u32) -> Option<&NightRecord> {
        self.nights.get(&day)
    }

    pub fn day(&self, day: u32) -> Option<&DayRecord> {
        self.days.get(&day)
    }

    pub fn facts(&self, day: u32) -> &[Fact] {
        self.facts.get(&day).map(|f| &f[..]).unwrap_or(&[])
    }

    pub fn nights(&self) -> &BTreeMap<u32, NightRecord> {
        &self.nights
    }

    pub fn days(&self) -> &BTreeMap<u32, DayRecord> {
        &self.days
    }
}
