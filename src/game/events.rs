use super::player::{Alignment, DeathCause, Role};
use super::{Phase, PkSource};
use serde::{Deserialize, Serialize};

/// Who may observe an event.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Visibility {
    Public,
    Private { visible_to: Vec<usize> },
}

/// An entry in the append-only event log through which the outside world observes a game.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct GameEvent {
    pub seq: u64,
    pub day: u32,
    pub phase: Phase,
    pub kind: EventKind,
    pub visibility: Visibility,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum EventKind {
    PhaseChanged { from: Phase, to: Phase },
    RoleAssigned { seat: usize, role: Role },
    GuardProtected { target: Option<usize> },
    WolfVoted { wolf: usize, target: usize },
    WolfTargetChosen { target: usize },
    WitchSaved { target: usize },
    WitchPoisoned { target: usize },
    WitchPassed,
    SeerChecked { target: usize, alignment: Alignment },
    RuleWarning { seat: usize, message: String },
    PeacefulNight,
    PlayerDied { seat: usize, cause: DeathCause },
    BadgeSignup { seat: usize, running: bool },
    BadgeWithdrawn { seat: usize },
    VoteCast { voter: usize, target: Option<usize>, reason: Option<String>, badge: bool },
    PkStarted { targets: Vec<usize>, source: PkSource },
    SheriffElected { seat: usize },
    NoSheriff,
    NoElimination,
    Speech { seat: usize, text: Option<String> },
    HunterShot { hunter: usize, target: Option<usize> },
    BadgeTransferred { from: usize, to: usize },
    BadgeDestroyed { from: usize },
    GameOver { winner: Alignment },
}

/// The append-only log of events.
#[derive(Clone, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<GameEvent>,
}

impl EventLog {
    pub fn push(&mut self, day: u32, phase: Phase, kind: EventKind, visibility: Visibility) {
        let seq = self.events.len() as u64;
        self.events.push(GameEvent {
            seq,
            day,
            phase,
            kind,
            visibility,
        });
    }

    pub fn all(&self) -> &[GameEvent] {
        &self.events
    }

    /// Events starting at the given sequence number.
    pub fn since(&self, seq: u64) -> &[GameEvent] {
        let start = (seq as usize).min(self.events.len());
        &self.events[start..]
    }

    /// Events the given seat is allowed to see. `None` is the public board.
    pub fn visible_to(&self, seat: Option<usize>) -> impl Iterator<Item = &GameEvent> + '_ {
        self.events.iter().filter(move |e| match (&e.visibility, seat) {
            (Visibility::Public, _) => true,
            (Visibility::Private { visible_to }, Some(seat)) => visible_to.contains(&seat),
            (Visibility::Private { .. }, None) => false,
        })
    }
}
