use thiserror::Error;

/// An intent that was refused. The game state is left untouched and the
/// submitting actor may retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("this action cannot be performed during this phase of the game")]
    InvalidAction,
    #[error("the action was submitted for a phase that has already ended")]
    StalePhase,
    #[error("it is not this player's turn to act")]
    NotYourTurn,
    #[error("this player has already acted in this phase")]
    AlreadyActed,
    #[error("invalid player index")]
    InvalidPlayerIndex,
    #[error("this player cannot be chosen for this action")]
    InvalidPlayerChoice,
    #[error("the guard cannot protect the same player on consecutive nights")]
    RepeatedGuardTarget,
    #[error("the potion has already been used")]
    PotionUsed,
    #[error("the witch cannot save herself")]
    SelfSaveForbidden,
    #[error("the game is over")]
    GameOver,
    #[error("the requested phase cannot be reached from the current game")]
    UnreachablePhase,
}

/// A broken internal precondition. Fatal to the game it occurs in.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("night resolved without a wolf target")]
    MissingWolfTarget,
    #[error("witch saved but there was no wolf target")]
    SaveWithoutTarget,
    #[error("seat {0} does not exist")]
    UnknownSeat(usize),
    #[error("seat {0} was killed twice")]
    AlreadyDead(usize),
    #[error("history for day {0} is closed")]
    HistoryClosed(u32),
    #[error("inconsistent state: {0}")]
    Inconsistent(String),
}

/// The result of attempting to perform an invalid operation on a [Game] or [Session].
#[derive(Error, Debug)]
pub enum GameError {
    #[error(transparent)]
    Rejected(#[from] ActionError),
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error("game does not exist")]
    GameNotFound,
    #[error("too few players in the game")]
    TooFewPlayers,
    #[error("too many players in the game")]
    TooManyPlayers,
    #[error("no player exists with the given name")]
    PlayerNotFound,
    #[error("cannot join a game in progress")]
    CannotJoinStartedGame,
    #[error("the game was halted after an internal error")]
    GameHalted,
    #[error("developer tools are disabled on this server")]
    DevToolsDisabled,
}

impl GameError {
    /// Returns true if the game can no longer continue.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GameError::Invariant(_) | GameError::GameHalted)
    }

    /// Gets the rejection reason, if this error is a rejected intent.
    pub fn rejection(&self) -> Option<&ActionError> {
        match self {
            GameError::Rejected(err) => Some(err),
            _ => None,
        }
    }
}
