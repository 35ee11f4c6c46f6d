use crate::{
    error::{ActionError, GameError},
    game::{GameOptions, Intent, Phase},
    session::{lock_session, SessionHandle, SessionManager},
};
use serde_json::{json, Value};
use tokio::sync::watch;

/// A single game client, which could be a board or a player.
pub struct Client<'a> {
    manager: &'a SessionManager,
    session: Option<SessionHandle>,
    player: Option<String>,
    seat: Option<usize>,
    game_id: Option<String>,
    updates: Option<watch::Receiver<Value>>,
}

impl<'a> Client<'a> {
    /// Creates a new game client.
    pub fn new(manager: &'a SessionManager) -> Self {
        Self {
            manager,
            session: None,
            player: None,
            seat: None,
            game_id: None,
            updates: None,
        }
    }

    /// Creates a new game session, returning its ID.
    pub fn create_game(&mut self, options: GameOptions) -> Result<String, GameError> {
        let session = self.manager.create_game(options);
        let id = lock_session(&session)?.id().to_owned();
        Ok(id)
    }

    /// Joins a game as a board.
    pub fn join_as_board(&mut self, game_id: &str) -> Result<(), GameError> {
        let session = self.manager.find_game(game_id)?;
        self.updates = Some(lock_session(&session)?.join_board());
        self.player = None;
        self.seat = None;
        self.game_id = Some(game_id.to_string());
        self.session = Some(session);
        Ok(())
    }

    /// Joins a game as a player.
    pub fn join_as_player(&mut self, game_id: &str, name: &str) -> Result<(), GameError> {
        let session = self.manager.find_game(game_id)?;
        {
            let mut session = lock_session(&session)?;
            let seat = session.get_or_insert_player(name)?;
            self.updates = Some(session.join_player(seat)?);
            self.seat = Some(seat);
        }
        self.player = Some(name.to_string());
        self.game_id = Some(game_id.to_string());
        self.session = Some(session);
        Ok(())
    }

    /// Waits until there is an update to the game state, then returns the latest state.
    pub async fn next_state(&mut self) -> Value {
        let Some(updates) = &mut self.updates else {
            return std::future::pending().await;
        };

        if updates.changed().await.is_err() {
            // The session is gone
            self.updates = None;
            return json!({ "game_id": self.game_id, "state": { "type": "ended" } });
        }
        let state = updates.borrow().clone();

        json!({
            "game_id": self.game_id,
            "name": self.player,
            "seat": self.seat,
            "state": state
        })
    }

    /// Leaves the game.
    pub fn leave(&mut self) {
        self.player = None;
        self.seat = None;
        self.game_id = None;
        self.updates = None;
        self.session = None;
    }

    /// Seats an agent in the lobby. Only the board may do this.
    pub fn add_agent(&self, name: &str) -> Result<usize, GameError> {
        if self.player.is_some() {
            return Err(ActionError::InvalidAction.into());
        }
        lock_session(self.session()?)?.add_agent(name)
    }

    /// Starts a new game of Werewolf.
    pub fn start_game(&self) -> Result<(), GameError> {
        self.manager.start_game(self.session()?)
    }

    /// Called when the board presses "next".
    pub fn board_next(&self) -> Result<(), GameError> {
        if self.player.is_some() {
            return Err(ActionError::InvalidAction.into());
        }
        lock_session(self.session()?)?.advance()
    }

    /// Called when the board jumps to a phase.
    pub fn board_jump(&self, phase: Phase) -> Result<(), GameError> {
        if self.player.is_some() {
            return Err(ActionError::InvalidAction.into());
        }
        if !self.manager.dev_tools() {
            return Err(GameError::DevToolsDisabled);
        }
        lock_session(self.session()?)?.jump(phase)
    }

    /// Called when a player submits an intent.
    pub fn player_action(&self, phase: Phase, intent: Intent) -> Result<(), GameError> {
        let seat = self.seat.ok_or(ActionError::InvalidAction)?;
        lock_session(self.session()?)?.submit(seat, phase, intent)
    }

    /// Keeps the game session alive.
    pub fn heartbeat(&self) {
        let Some(session) = &self.session else {
            return;
        };
        if let Ok(mut session) = lock_session(session) {
            session.heartbeat();
        }
    }

    /// Ends the game.
    pub fn end_game(&self) -> Result<(), GameError> {
        lock_session(self.session()?)?.end_game()
    }

    fn session(&self) -> Result<&SessionHandle, GameError> {
        self.session.as_ref().ok_or(GameError::GameNotFound)
    }
}
