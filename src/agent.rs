//! Seats played by agents.
//!
//! Decisions are requested from a [DecisionProvider] as soon as they are due (and, at night,
//! before they are due), so slow providers work in parallel. Finished decisions wait in a
//! [DecisionBuffer] and are applied to the game one at a time, in turn order.

use crate::error::GameError;
use crate::game::{Game, Intent, Phase};
use crate::session::{Session, SessionHandle};
use futures_util::future::{self, BoxFuture, FutureExt};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub const DEFAULT_DECISION_TIMEOUT: Duration = Duration::from_millis(5000);

/// Night phases whose choices can be made before the phase is reached.
/// The witch is left out, as her choice depends on the wolves' victim.
const PREFETCH_PHASES: [Phase; 3] = [Phase::NightGuardAction, Phase::NightWolfAction, Phase::NightSeerAction];

/// What an agent is shown when asked for a decision.
#[derive(Clone, Debug)]
pub struct DecisionRequest {
    pub seat: usize,
    pub day: u32,
    pub phase: Phase,
    /// The seat's own view of the game.
    pub view: Value,
    /// Every intent the game would accept.
    pub options: Vec<Intent>,
    pub default: Option<Intent>,
}

impl DecisionRequest {
    fn new(game: &Game, seat: usize) -> Self {
        Self {
            seat,
            day: game.day(),
            phase: game.phase(),
            view: game.get_player_json(seat),
            options: game.legal_intents(seat),
            default: game.default_intent(seat),
        }
    }

    fn key(&self) -> DecisionKey {
        DecisionKey {
            day: self.day,
            phase: self.phase,
            seat: self.seat,
        }
    }
}

/// Makes decisions for agent seats. A provider may take as long as it likes;
/// the driver gives up after its timeout and plays the default instead.
pub trait DecisionProvider: Send + Sync {
    fn decide(&self, request: DecisionRequest) -> BoxFuture<'static, Option<Intent>>;
}

/// Always plays the default intent.
pub struct FallbackDecider;

impl DecisionProvider for FallbackDecider {
    fn decide(&self, request: DecisionRequest) -> BoxFuture<'static, Option<Intent>> {
        future::ready(request.default).boxed()
    }
}

/// Picks uniformly among the legal intents.
pub struct RandomDecider {
    rng: Mutex<ChaCha8Rng>,
}

impl RandomDecider {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl DecisionProvider for RandomDecider {
    fn decide(&self, request: DecisionRequest) -> BoxFuture<'static, Option<Intent>> {
        let choice = match self.rng.lock() {
            Ok(mut rng) => request.options.choose(&mut *rng).cloned(),
            Err(_) => None,
        };
        future::ready(choice.or(request.default)).boxed()
    }
}

/// Identifies the turn a decision was made for.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct DecisionKey {
    pub day: u32,
    pub phase: Phase,
    pub seat: usize,
}

/// Decisions that have been made but not yet applied.
#[derive(Default, Debug)]
pub struct DecisionBuffer {
    decisions: BTreeMap<DecisionKey, Intent>,
}

impl DecisionBuffer {
    pub fn insert(&mut self, key: DecisionKey, intent: Intent) {
        self.decisions.insert(key, intent);
    }

    pub fn contains(&self, key: &DecisionKey) -> bool {
        self.decisions.contains_key(key)
    }

    pub fn take(&mut self, key: &DecisionKey) -> Option<Intent> {
        self.decisions.remove(key)
    }

    /// Drops decisions left over from earlier days.
    pub fn discard_before(&mut self, day: u32) {
        self.decisions.retain(|key, _| key.day >= day);
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

/// Plays every agent seat of one session.
pub struct AgentDriver {
    session: Weak<Mutex<Session>>,
    provider: Arc<dyn DecisionProvider>,
    timeout: Duration,
    /// Also presses "next" in host phases, for games without a board.
    auto_advance: bool,
    buffer: DecisionBuffer,
    in_flight: HashSet<DecisionKey>,
    results_tx: mpsc::UnboundedSender<(DecisionKey, Option<Intent>)>,
    results_rx: mpsc::UnboundedReceiver<(DecisionKey, Option<Intent>)>,
}

impl AgentDriver {
    pub fn new(session: &SessionHandle, provider: Arc<dyn DecisionProvider>, timeout: Duration) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            session: Arc::downgrade(session),
            provider,
            timeout,
            auto_advance: false,
            buffer: DecisionBuffer::default(),
            in_flight: HashSet::new(),
            results_tx,
            results_rx,
        }
    }

    pub fn auto_advance(mut self, auto_advance: bool) -> Self {
        self.auto_advance = auto_advance;
        self
    }

    /// Runs the driver until the session goes away or the game halts.
    pub fn spawn(self, updates: watch::Receiver<Value>) -> JoinHandle<()> {
        tokio::spawn(self.run(updates))
    }

    async fn run(mut self, mut updates: watch::Receiver<Value>) {
        loop {
            match self.apply_ready() {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => {
                    log::error!("Agent driver stopped: {}", err);
                    return;
                }
            }
            self.request_decisions();

            let received = tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    None
                }
                result = self.results_rx.recv() => result,
            };
            if let Some((key, intent)) = received {
                self.receive(key, intent);
            }
        }
        log::debug!("Agent driver finished");
    }

    /// Applies buffered decisions that are due, in turn order.
    /// Returns false once there is nothing left to play.
    fn apply_ready(&mut self) -> Result<bool, GameError> {
        let session = self.session.upgrade().ok_or(GameError::GameNotFound)?;
        let mut session = session.lock().map_err(|_| GameError::GameNotFound)?;
        loop {
            let Some(game) = session.game() else {
                return Ok(false);
            };
            if game.game_over() {
                return Ok(false);
            }
            self.buffer.discard_before(game.day());

            if game.phase().is_host_phase() {
                if !self.auto_advance {
                    return Ok(true);
                }
                session.advance()?;
                continue;
            }

            // Agents act in seat order, so the first agent still waiting holds up the rest
            let Some(seat) = agents_waiting(game).into_iter().next() else {
                return Ok(true);
            };
            let key = DecisionKey {
                day: game.day(),
                phase: game.phase(),
                seat,
            };
            let Some(intent) = self.buffer.take(&key) else {
                return Ok(true);
            };
            let fallback = game.default_intent(seat);
            submit(&mut session, key, intent, fallback)?;
        }
    }

    /// Asks the provider for every decision that is due, or can be made ahead of time,
    /// and isn't already known or being worked on.
    fn request_decisions(&mut self) {
        let Some(session) = self.session.upgrade() else {
            return;
        };
        let requests = match session.lock() {
            Ok(session) => match session.game() {
                Some(game) if !game.game_over() => self.due_requests(game),
                _ => return,
            },
            Err(_) => return,
        };
        for request in requests {
            self.dispatch(request);
        }
    }

    fn due_requests(&self, game: &Game) -> Vec<DecisionRequest> {
        let mut requests = self.requests_for(game);
        if game.phase().is_night() {
            for phase in PREFETCH_PHASES.into_iter().filter(|p| *p > game.phase()) {
                if let Some(preview) = game.preview(phase) {
                    requests.extend(self.requests_for(&preview));
                }
            }
        }
        requests
    }

    fn requests_for(&self, game: &Game) -> Vec<DecisionRequest> {
        agents_waiting(game)
            .into_iter()
            .map(|seat| DecisionRequest::new(game, seat))
            .filter(|req| !self.buffer.contains(&req.key()) && !self.in_flight.contains(&req.key()))
            .collect()
    }

    fn dispatch(&mut self, request: DecisionRequest) {
        let key = request.key();
        let default = request.default.clone();
        let decision = self.provider.decide(request);
        let timeout = self.timeout;
        let results = self.results_tx.clone();
        self.in_flight.insert(key);

        tokio::spawn(async move {
            let intent = match tokio::time::timeout(timeout, decision).await {
                Ok(Some(intent)) => Some(intent),
                Ok(None) => {
                    log::warn!("Seat {} made no decision, playing the default", key.seat);
                    default
                }
                Err(_) => {
                    log::warn!("Seat {} timed out, playing the default", key.seat);
                    default
                }
            };
            results.send((key, intent)).ok();
        });
    }

    fn receive(&mut self, key: DecisionKey, intent: Option<Intent>) {
        self.in_flight.remove(&key);
        if let Some(intent) = intent {
            self.buffer.insert(key, intent);
        }
    }
}

/// Agent seats the game is waiting on, in turn order.
fn agents_waiting(game: &Game) -> Vec<usize> {
    game.pending_actors()
        .into_iter()
        .filter(|seat| !game.players()[*seat].is_human)
        .collect()
}

/// Submits a decision, playing the default instead if the game refuses it.
fn submit(session: &mut Session, key: DecisionKey, intent: Intent, fallback: Option<Intent>) -> Result<(), GameError> {
    match session.submit(key.seat, key.phase, intent) {
        Err(err) if !err.is_fatal() => {
            log::warn!("Seat {} made an illegal choice ({}), playing the default", key.seat, err);
            let fallback = fallback.ok_or(err)?;
            session.submit(key.seat, key.phase, fallback)
        }
        result => result,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::game::events::EventKind;
    use crate::game::player::Role;
    use crate::game::{ActionKind, GameOptions};
    use crate::session::{SessionManager, Settings};

    /// Answers slower the lower the seat.
    struct StaggeredDecider;

    impl DecisionProvider for StaggeredDecider {
        fn decide(&self, request: DecisionRequest) -> BoxFuture<'static, Option<Intent>> {
            let delay = Duration::from_millis(10 * (12 - request.seat as u64));
            async move {
                tokio::time::sleep(delay).await;
                request.default
            }
            .boxed()
        }
    }

    /// Never answers.
    struct SilentDecider;

    impl DecisionProvider for SilentDecider {
        fn decide(&self, _request: DecisionRequest) -> BoxFuture<'static, Option<Intent>> {
            future::pending().boxed()
        }
    }

    /// Always wants to vote for seat 0, whatever the phase.
    struct StubbornDecider;

    impl DecisionProvider for StubbornDecider {
        fn decide(&self, _request: DecisionRequest) -> BoxFuture<'static, Option<Intent>> {
            future::ready(Some(Intent::on(ActionKind::DayVote, 0))).boxed()
        }
    }

    fn manager() -> SessionManager {
        let db = sled::Config::new().temporary(true).open().unwrap();
        SessionManager::new(db, Settings::default()).unwrap()
    }

    /// A nine-seat game at the guard's first turn, with every seat an agent.
    fn agent_game(manager: &SessionManager) -> SessionHandle {
        let options = GameOptions {
            badge_election: false,
            ..Default::default()
        };
        let handle = manager.create_game(options);
        {
            let mut session = handle.lock().unwrap();
            for idx in 0..9 {
                session.add_agent(&format!("BOT{}", idx)).unwrap();
            }
            session.start_game().unwrap();
            session.advance().unwrap();
            session.advance().unwrap();
        }
        handle
    }

    fn spawn_driver(handle: &SessionHandle, provider: impl DecisionProvider + 'static, timeout: Duration, auto_advance: bool) {
        let updates = handle.lock().unwrap().join_board();
        AgentDriver::new(handle, Arc::new(provider), timeout)
            .auto_advance(auto_advance)
            .spawn(updates);
    }

    async fn wait_until(handle: &SessionHandle, done: impl Fn(&Game) -> bool) {
        let mut updates = handle.lock().unwrap().join_board();
        let waited = tokio::time::timeout(Duration::from_secs(20), async {
            loop {
                {
                    let session = handle.lock().unwrap();
                    if session.game().map_or(false, &done) {
                        return;
                    }
                }
                updates.changed().await.unwrap();
            }
        })
        .await;
        assert!(waited.is_ok(), "timed out waiting for the agents");
    }

    #[test]
    fn test_buffer_discards_old_days() {
        let mut buffer = DecisionBuffer::default();
        let intent = Intent::new(ActionKind::EndSpeech, None);
        for day in 1..=3 {
            let key = DecisionKey {
                day,
                phase: Phase::DaySpeech,
                seat: 0,
            };
            buffer.insert(key, intent.clone());
        }
        buffer.discard_before(3);
        assert_eq!(buffer.len(), 1);
        let key = DecisionKey {
            day: 3,
            phase: Phase::DaySpeech,
            seat: 0,
        };
        assert_eq!(buffer.take(&key), Some(intent));
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_agents_play_a_whole_game() {
        let manager = manager();
        let handle = agent_game(&manager);
        spawn_driver(&handle, FallbackDecider, DEFAULT_DECISION_TIMEOUT, true);
        wait_until(&handle, |game| game.game_over()).await;
        assert!(handle.lock().unwrap().game().unwrap().winner().is_some());
    }

    #[tokio::test]
    async fn test_random_agents_play_a_whole_game() {
        let manager = manager();
        let handle = agent_game(&manager);
        spawn_driver(&handle, RandomDecider::new(7), DEFAULT_DECISION_TIMEOUT, true);
        wait_until(&handle, |game| game.game_over()).await;
    }

    #[tokio::test]
    async fn test_decisions_applied_in_seat_order() {
        let manager = manager();
        let handle = agent_game(&manager);
        spawn_driver(&handle, StaggeredDecider, DEFAULT_DECISION_TIMEOUT, false);
        wait_until(&handle, |game| game.phase() == Phase::NightResolve).await;

        let session = handle.lock().unwrap();
        let game = session.game().unwrap();
        let wolves: Vec<usize> = game
            .events()
            .all()
            .iter()
            .filter_map(|e| match e.kind {
                EventKind::WolfVoted { wolf, .. } => Some(wolf),
                _ => None,
            })
            .collect();
        let expected: Vec<usize> = game
            .players()
            .iter()
            .filter(|p| p.role == Role::Werewolf)
            .map(|p| p.seat)
            .collect();
        assert_eq!(wolves, expected);
    }

    #[tokio::test]
    async fn test_silent_agents_time_out() {
        let manager = manager();
        let handle = agent_game(&manager);
        spawn_driver(&handle, SilentDecider, Duration::from_millis(20), false);
        wait_until(&handle, |game| game.phase() == Phase::NightResolve).await;

        let session = handle.lock().unwrap();
        let game = session.game().unwrap();
        let passed = game.events().all().iter().any(|e| matches!(e.kind, EventKind::WitchPassed));
        assert!(passed);
    }

    #[tokio::test]
    async fn test_illegal_decisions_are_replaced() {
        let manager = manager();
        let handle = agent_game(&manager);
        spawn_driver(&handle, StubbornDecider, DEFAULT_DECISION_TIMEOUT, false);
        wait_until(&handle, |game| game.phase() == Phase::NightResolve).await;

        let session = handle.lock().unwrap();
        let game = session.game().unwrap();
        let guarded = game
            .events()
            .all()
            .iter()
            .any(|e| matches!(e.kind, EventKind::GuardProtected { target: None }));
        assert!(guarded);
    }
}
