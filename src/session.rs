use crate::agent::{AgentDriver, DecisionProvider, RandomDecider, DEFAULT_DECISION_TIMEOUT};
use crate::error::{ActionError, GameError};
use crate::game::player::PlayerSpec;
use crate::game::{GameOptions, Intent, Phase};
use crate::pg::{read_row, GameStats};
use crate::time::iso8601;
use crate::game::Game as GameInner;
use dashmap::{mapref::entry::Entry, DashMap};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::error::Error;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long a session may sit idle before it is purged.
const SESSION_TTL: Duration = Duration::from_secs(3600);

/// Manages all the game sessions running on the server.
pub struct SessionManager {
    sessions: DashMap<String, SessionHandle>,
    dbs: Dbs,
    settings: Settings,
}

/// Server-wide settings for sessions.
#[derive(Clone)]
pub struct Settings {
    /// Plays the agent seats.
    pub provider: Arc<dyn DecisionProvider>,
    /// How long an agent may take over a decision before its default is played.
    pub decision_timeout: Duration,
    /// Whether boards may jump between phases.
    pub dev_tools: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: Arc::new(RandomDecider::new(rand::thread_rng().next_u64())),
            decision_timeout: DEFAULT_DECISION_TIMEOUT,
            dev_tools: false,
        }
    }
}

/// The databases that games are persisted to.
#[derive(Clone)]
struct Dbs {
    db: sled::Db,
    game: sled::Tree,
    archive: sled::Tree,
}

/// A single game session.
pub struct Session {
    /// The game ID.
    id: String,
    /// The game itself.
    game: Game,
    /// Channel for sending game state updates to boards.
    board_state: watch::Sender<Value>,
    /// Channels for sending game state updates to players.
    player_states: Vec<watch::Sender<Value>>,
    /// The databases.
    dbs: Dbs,
    /// Timestamp of the last time this session was interacted with.
    last_ts: Instant,
    /// The task playing the agent seats, if any.
    agents: Option<JoinHandle<()>>,
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// Locks a session. A poisoned session is treated as gone.
pub fn lock_session(session: &SessionHandle) -> Result<MutexGuard<'_, Session>, GameError> {
    session.lock().map_err(|_| GameError::GameNotFound)
}

#[allow(clippy::large_enum_variant)]
#[derive(Serialize, Deserialize)]
enum Game {
    Lobby {
        options: GameOptions,
        players: Vec<PlayerSpec>,
    },
    Playing {
        /// The game itself.
        game: GameInner,
        /// Timestamp that the game was created.
        started_ts: SystemTime,
        /// Whether this game has been archived.
        archived: bool,
    },
    /// A game stopped by a broken invariant. Kept for inspection; it accepts no more actions.
    Faulted {
        game: GameInner,
        error: String,
    },
    Over,
}

impl SessionManager {
    pub fn new(db: sled::Db, settings: Settings) -> Result<Self, Box<dyn Error>> {
        let sessions = DashMap::new();
        let dbs = Dbs {
            db: db.clone(),
            game: db.open_tree("games")?,
            archive: db.open_tree("archive")?,
        };
        for entry in dbs.game.iter() {
            let (id, game) = entry?;
            let id = String::from_utf8(id.to_vec())?;
            let Ok(game) = serde_json::from_slice(&game) else {
                log::warn!("Could not restore game {}", id);
                continue;
            };
            let session = Session::hydrate(id.clone(), dbs.clone(), game);
            let session = Arc::new(Mutex::new(session));
            sessions.insert(id, session);
        }
        Ok(Self { sessions, dbs, settings })
    }

    pub fn create_game(&self, options: GameOptions) -> SessionHandle {
        loop {
            let id = Self::random_id();
            let entry = self.sessions.entry(id);
            if let Entry::Occupied(_) = entry {
                continue;
            }
            let session = Session::new(entry.key().clone(), self.dbs.clone(), options);
            let session = Arc::new(Mutex::new(session));
            entry.or_insert(session.clone());
            log::info!("Created game {}", session_id(&session));
            break session;
        }
    }

    pub fn find_game(&self, game_id: &str) -> Result<SessionHandle, GameError> {
        self.sessions
            .get(game_id)
            .map(|session| session.clone())
            .ok_or(GameError::GameNotFound)
    }

    pub fn num_games(&self) -> usize {
        self.sessions.len()
    }

    pub fn dev_tools(&self) -> bool {
        self.settings.dev_tools
    }

    /// Starts the game in a session, and sets its agents playing.
    pub fn start_game(&self, session: &SessionHandle) -> Result<(), GameError> {
        let mut guard = lock_session(session)?;
        guard.start_game()?;
        self.spawn_agents(session, &mut guard);
        Ok(())
    }

    /// Sets the agents of every restored game playing again.
    pub fn resume_agents(&self) {
        for entry in self.sessions.iter() {
            let Ok(mut guard) = entry.value().lock() else {
                continue;
            };
            self.spawn_agents(entry.value(), &mut guard);
        }
    }

    fn spawn_agents(&self, handle: &SessionHandle, session: &mut Session) {
        let Some(game) = session.game() else {
            return;
        };
        if game.game_over() || game.players().iter().all(|p| p.is_human) {
            return;
        }
        let auto_advance = game.players().iter().all(|p| !p.is_human);
        let updates = session.board_state.subscribe();
        let driver = AgentDriver::new(handle, self.settings.provider.clone(), self.settings.decision_timeout)
            .auto_advance(auto_advance);
        session.stop_agents();
        session.agents = Some(driver.spawn(updates));
    }

    /// Summaries of finished games that have not yet been synced elsewhere.
    pub fn past_games(&self) -> Vec<(i64, GameStats)> {
        self.dbs
            .archive
            .iter()
            .filter_map(|entry| entry.ok().and_then(read_row))
            .collect()
    }

    pub fn purge_games(&self) {
        let mut ids_to_delete = vec![];

        // Find expired sessions
        for session in self.sessions.iter() {
            let game_id = session.key();
            let Ok(session) = session.lock() else {
                log::error!("Found poisoned session: {}", game_id);
                ids_to_delete.push(game_id.clone());
                continue;
            };
            let elapsed = Instant::now().duration_since(session.last_ts);
            if elapsed > SESSION_TTL {
                if self.dbs.game.remove(session.id().as_bytes()).is_ok() {
                    ids_to_delete.push(game_id.clone());
                } else {
                    log::error!("Could not remove game: {}", game_id);
                }
            }
        }

        for game_id in ids_to_delete.into_iter() {
            log::info!("Purging game {}", game_id);
            self.sessions.remove(&game_id);
        }
    }

    fn random_id() -> String {
        let mut rng = rand::thread_rng();
        (0..4)
            .map(|_| match rng.gen_range('A'..='Z') {
                // Avoid O and I, which read as digits
                'O' => 'W',
                'I' => 'X',
                other => other,
            })
            .collect()
    }
}

fn session_id(session: &SessionHandle) -> String {
    session.lock().map(|s| s.id().to_string()).unwrap_or_default()
}

impl Session {
    fn new(id: String, dbs: Dbs, options: GameOptions) -> Self {
        let game = Game::Lobby {
            options,
            players: vec![],
        };
        Self::hydrate(id, dbs, game)
    }

    fn hydrate(id: String, dbs: Dbs, game: Game) -> Self {
        let mut player_states = vec![];
        for _ in 0..game.num_players() {
            player_states.push(watch::channel(Value::Null).0);
        }
        Self {
            id,
            game,
            board_state: watch::channel(Value::Null).0,
            player_states,
            dbs,
            last_ts: Instant::now(),
            agents: None,
        }
    }

    /// Gets the unique game ID.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Gets the game being played, if there is one.
    pub fn game(&self) -> Option<&GameInner> {
        match &self.game {
            Game::Playing { game, .. } => Some(game),
            _ => None,
        }
    }

    /// Whether the game was halted by an internal error.
    pub fn is_faulted(&self) -> bool {
        matches!(self.game, Game::Faulted { .. })
    }

    /// Gets the seat of the human player with the given name,
    /// adding the player to the game if no player with that name has joined yet.
    pub fn get_or_insert_player(&mut self, name: &str) -> Result<usize, GameError> {
        let seat = self.insert_player(PlayerSpec::human(name))?;
        self.notify();
        Ok(seat)
    }

    /// Seats an agent in the lobby.
    pub fn add_agent(&mut self, name: &str) -> Result<usize, GameError> {
        if !matches!(self.game, Game::Lobby { .. }) {
            return Err(GameError::CannotJoinStartedGame);
        }
        let seat = self.insert_player(PlayerSpec::agent(name))?;
        self.notify();
        Ok(seat)
    }

    fn insert_player(&mut self, spec: PlayerSpec) -> Result<usize, GameError> {
        match &mut self.game {
            Game::Lobby { options, players } => {
                if let Some(idx) = players.iter().position(|p| p.name == spec.name) {
                    return Ok(idx);
                }
                if players.len() == options.max_players() {
                    return Err(GameError::TooManyPlayers);
                }
                self.player_states.push(watch::channel(Value::Null).0);
                players.push(spec);
                Ok(players.len() - 1)
            }
            Game::Playing { game, .. } | Game::Faulted { game, .. } => match game.find_player(&spec.name) {
                Ok(seat) => Ok(seat),
                Err(_) => Err(GameError::CannotJoinStartedGame),
            },
            Game::Over => Err(GameError::GameNotFound),
        }
    }

    /// Called by a new game board client, and returns a stream of updates for the game board.
    pub fn join_board(&mut self) -> watch::Receiver<Value> {
        let rx = self.board_state.subscribe();
        self.notify();
        rx
    }

    /// Called by a new player client, and returns a stream of updates for that player.
    pub fn join_player(&mut self, seat: usize) -> Result<watch::Receiver<Value>, GameError> {
        let rx = self
            .player_states
            .get(seat)
            .ok_or(GameError::PlayerNotFound)?
            .subscribe();
        self.notify();
        Ok(rx)
    }

    /// Deals the roles and starts the game. A finished game can be started again with the same players.
    pub fn start_game(&mut self) -> Result<(), GameError> {
        let (options, players) = match &self.game {
            Game::Lobby { options, players } => (*options, players.clone()),
            Game::Playing { game, .. } if game.game_over() => {
                let players = game
                    .players()
                    .iter()
                    .map(|p| PlayerSpec {
                        name: p.name.clone(),
                        is_human: p.is_human,
                    })
                    .collect::<Vec<_>>();
                (*game.options(), players)
            }
            _ => return Err(ActionError::InvalidAction.into()),
        };

        if players.len() < options.min_players() {
            return Err(GameError::TooFewPlayers);
        }

        self.archive().ok();
        let seed = rand::thread_rng().next_u64();
        let mut game = GameInner::new(options, &players, seed)?;
        game.advance()?;
        log::info!("Game {} started with {} players", self.id, players.len());
        self.game = Game::Playing {
            game,
            started_ts: SystemTime::now(),
            archived: false,
        };
        self.notify();
        self.persist_game().ok();

        Ok(())
    }

    /// Performs an action on the game. The action works on a copy, which replaces the game
    /// only if the action succeeds. A broken invariant halts the game for good.
    pub fn mutate_game<F>(&mut self, mutation: F) -> Result<(), GameError>
    where
        F: FnOnce(&mut GameInner) -> Result<(), GameError>,
    {
        let game = match &mut self.game {
            Game::Playing { game, .. } => game,
            Game::Faulted { .. } => return Err(GameError::GameHalted),
            _ => return Err(ActionError::InvalidAction.into()),
        };

        let mut next = game.clone();
        match mutation(&mut next) {
            Ok(()) => *game = next,
            Err(err) if err.is_fatal() => {
                log::error!("Game {} halted: {}", self.id, err);
                self.fault(err.to_string());
                return Err(err);
            }
            Err(err) => return Err(err),
        }

        self.notify();
        self.persist_game().ok();
        self.archive().ok();

        Ok(())
    }

    /// Moves the game on from a host phase.
    pub fn advance(&mut self) -> Result<(), GameError> {
        self.mutate_game(|game| game.advance())
    }

    /// Submits a player's intent.
    pub fn submit(&mut self, seat: usize, phase: Phase, intent: Intent) -> Result<(), GameError> {
        self.mutate_game(|game| game.submit_action(seat, phase, intent))
    }

    /// Moves the game straight to the given phase.
    pub fn jump(&mut self, phase: Phase) -> Result<(), GameError> {
        self.mutate_game(|game| {
            *game = game.force_jump(phase)?;
            Ok(())
        })
    }

    /// Keeps the game session alive.
    pub fn heartbeat(&mut self) {
        self.last_ts = Instant::now();
    }

    /// Ends the game.
    pub fn end_game(&mut self) -> Result<(), GameError> {
        // Check the game is over.
        if !self.game.can_end() {
            return Err(ActionError::InvalidAction.into());
        }

        self.archive().ok();
        self.stop_agents();
        self.game = Game::Over;
        self.notify();
        self.persist_game().ok();

        Ok(())
    }

    fn fault(&mut self, error: String) {
        let game = std::mem::replace(&mut self.game, Game::Over);
        self.game = match game {
            Game::Playing { game, .. } => Game::Faulted { game, error },
            other => other,
        };
        self.stop_agents();
        self.notify();
        self.persist_game().ok();
    }

    fn stop_agents(&mut self) {
        if let Some(agents) = self.agents.take() {
            agents.abort();
        }
    }

    /// Notifies all connected clients of the new game state.
    fn notify(&mut self) {
        match &self.game {
            Game::Lobby { players, .. } => {
                let names: Vec<String> = players.iter().map(|p| p.name.clone()).collect();
                let state = GameInner::get_lobby_board_json(&names);
                self.board_state.send_replace(state);
                for (idx, player_state) in self.player_states.iter().enumerate() {
                    let state = GameInner::get_lobby_player_json(&names, idx);
                    player_state.send_replace(state);
                }
            }
            Game::Playing { game, .. } => {
                self.board_state.send_replace(game.get_board_json());
                for (idx, player_state) in self.player_states.iter().enumerate() {
                    let state = game.get_player_json(idx);
                    player_state.send_replace(state);
                }
            }
            Game::Faulted { game, error } => {
                let mut state = game.get_board_json();
                state["faulted"] = error.as_str().into();
                self.board_state.send_replace(state);
                for player_state in self.player_states.iter() {
                    player_state.send_replace(json!({ "type": "faulted", "error": error }));
                }
            }
            Game::Over => {
                self.board_state.send_replace(json!({ "type": "gameover" }));
                for player_state in self.player_states.iter() {
                    player_state.send_replace(json!({ "type": "gameover" }));
                }
            }
        }
        self.last_ts = Instant::now();
    }

    /// Persists the game state to disk, so it can be recovered upon server restart.
    fn persist_game(&mut self) -> Result<(), Box<dyn Error>> {
        self.dbs
            .game
            .insert(self.id.as_bytes(), serde_json::to_string(&self.game)?.as_bytes())?;
        Ok(())
    }

    /// Archives the game if it is over and hasn't been archived yet.
    fn archive(&mut self) -> Result<(), Box<dyn Error>> {
        let Game::Playing { game, started_ts, archived } = &mut self.game else {
            return Ok(());
        };
        if game.game_over() && !*archived {
            let key = self.dbs.db.generate_id()?.to_be_bytes();
            let outcome = game.get_outcome_json();
            let data = json!({
                "game_id": self.id,
                "players": game.player_names().collect::<Value>(),
                "started": iso8601(*started_ts),
                "finished": iso8601(SystemTime::now()),
                "winner": outcome["winner"],
                "days": outcome["days"],
            })
            .to_string();
            self.dbs.archive.insert(key, data.as_bytes())?;
            *archived = true;
            log::info!("Archived game {}", self.id);
        }
        Ok(())
    }
}

impl Game {
    fn num_players(&self) -> usize {
        match self {
            Game::Lobby { players, .. } => players.len(),
            Game::Playing { game, .. } | Game::Faulted { game, .. } => game.num_players(),
            Game::Over => 0,
        }
    }

    fn can_end(&self) -> bool {
        match self {
            Game::Lobby { .. } => false,
            Game::Playing { game, .. } => game.game_over(),
            Game::Faulted { .. } => true,
            Game::Over => false,
        }
    }
}
