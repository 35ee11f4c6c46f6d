use crate::{
    client::Client,
    error::GameError,
    game::{ActionKind, GameOptions, Intent, Phase},
    session::SessionManager,
};
use futures_util::{select, FutureExt, SinkExt, StreamExt, TryStreamExt};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;

#[derive(Error, Debug)]
enum WsError {
    #[error("violation of the application-layer protocol")]
    ProtocolError,
    #[error(transparent)]
    GameError(#[from] GameError),
}

pub async fn accept_connection(stream: TcpStream, manager: &SessionManager) {
    log::info!("Accepted new connection");

    let Ok(stream) = tokio_tungstenite::accept_async(stream).await else {
        log::error!("Error occured during websocket handshake");
        return;
    };
    let (mut write, read) = stream.split();
    let mut read = read.fuse();

    let mut client = Client::new(manager);

    loop {
        let event = select! {
            msg = read.try_next() => Event::Message(msg),
            state = client.next_state().fuse() => Event::Update(state),
        };

        let reply = match event {
            Event::Message(msg) => {
                let Ok(Some(Message::Text(msg))) = msg else {
                    break;
                };
                let Ok(msg) = serde_json::from_str::<Value>(&msg) else {
                    log::error!("Invalid JSON received: {}", &msg);
                    break;
                };
                let reply = match parse_request(&msg) {
                    Ok(req) => process_request(req, &mut client),
                    Err(err) => {
                        log::warn!("Invalid message received: {}", &msg);
                        Err(err)
                    }
                };
                match reply {
                    Ok(Some(reply)) => format_reply(reply),
                    Ok(None) => continue,
                    Err(err) => json!({
                        "type": "error",
                        "error": err.to_string()
                    }),
                }
            }
            Event::Update(state) => json!({
                "type": "update",
                "state": state
            }),
        };

        if write.send(Message::Text(reply.to_string())).await.is_err() {
            log::error!("Could not send websockets message");
            break;
        }
    }

    client.leave();
    log::info!("Connection closed");
}

/// Something for the connection to handle.
enum Event {
    Message(Result<Option<Message>, tokio_tungstenite::tungstenite::Error>),
    Update(Value),
}

/// A message sent by a game client to the server.
#[derive(Debug, PartialEq)]
enum Request {
    CreateGame { options: GameOptions },
    JoinAsBoard { game_id: String },
    JoinAsPlayer { game_id: String, name: String },
    AddAgent { name: String },
    StartGame,
    BoardNext,
    BoardJump { phase: Phase },
    PlayerAction { phase: Phase, intent: Intent },
    Heartbeat,
    EndGame,
    GetState,
}

/// A message sent by the server to a game client.
enum Response {
    GameCreated { game_id: String },
    GameJoined { game_id: String, player_id: Option<String> },
    AgentAdded { seat: usize },
}

/// Parses a websockets message from the client.
fn parse_request(req: &Value) -> Result<Request, WsError> {
    match req["type"].as_str().unwrap_or("") {
        "create_game" => {
            let options = match &req["options"] {
                Value::Null => GameOptions::default(),
                options => serde_json::from_value(options.clone()).map_err(|_| WsError::ProtocolError)?,
            };
            Ok(Request::CreateGame { options })
        }
        "board_join" => {
            let game_id = string_field(req, "gameId")?;
            Ok(Request::JoinAsBoard { game_id })
        }
        "player_join" => {
            let game_id = string_field(req, "gameId")?;
            let name = req["name"]
                .as_str()
                .or_else(|| req["playerId"].as_str())
                .ok_or(WsError::ProtocolError)?
                .to_ascii_uppercase();
            Ok(Request::JoinAsPlayer { game_id, name })
        }
        "add_agent" => {
            let name = string_field(req, "name")?.to_ascii_uppercase();
            Ok(Request::AddAgent { name })
        }
        "start_game" => Ok(Request::StartGame),
        "board_next" => Ok(Request::BoardNext),
        "board_jump" => Ok(Request::BoardJump { phase: phase_field(req)? }),
        "player_action" => {
            let phase = phase_field(req)?;
            let kind: ActionKind = serde_json::from_value(req["kind"].clone()).map_err(|_| WsError::ProtocolError)?;
            let target = match &req["target"] {
                Value::Null => None,
                target => Some(target.as_u64().ok_or(WsError::ProtocolError)? as usize),
            };
            let mut intent = Intent::new(kind, target);
            if let Some(reason) = req["reason"].as_str() {
                intent = intent.with_reason(reason);
            }
            Ok(Request::PlayerAction { phase, intent })
        }
        "heartbeat" => Ok(Request::Heartbeat),
        "end_game" => Ok(Request::EndGame),
        "get_state" => Ok(Request::GetState),
        _ => Err(WsError::ProtocolError),
    }
}

fn string_field(req: &Value, field: &str) -> Result<String, WsError> {
    req[field]
        .as_str()
        .map(|s| s.to_string())
        .ok_or(WsError::ProtocolError)
}

fn phase_field(req: &Value) -> Result<Phase, WsError> {
    serde_json::from_value(req["phase"].clone()).map_err(|_| WsError::ProtocolError)
}

/// Processes a request from the client.
fn process_request(req: Request, client: &mut Client) -> Result<Option<Response>, WsError> {
    match req {
        Request::CreateGame { options } => {
            let game_id = client.create_game(options)?;
            return Ok(Some(Response::GameCreated { game_id }));
        }
        Request::JoinAsBoard { game_id } => {
            client.join_as_board(&game_id)?;
            return Ok(Some(Response::GameJoined {
                game_id,
                player_id: None,
            }));
        }
        Request::JoinAsPlayer { game_id, name } => {
            client.join_as_player(&game_id, &name)?;
            return Ok(Some(Response::GameJoined {
                game_id,
                player_id: Some(name),
            }));
        }
        Request::AddAgent { name } => {
            let seat = client.add_agent(&name)?;
            return Ok(Some(Response::AgentAdded { seat }));
        }
        Request::StartGame => client.start_game()?,
        Request::BoardNext => client.board_next()?,
        Request::BoardJump { phase } => client.board_jump(phase)?,
        Request::PlayerAction { phase, intent } => client.player_action(phase, intent)?,
        Request::Heartbeat => client.heartbeat(),
        Request::EndGame => client.end_game()?,
        Request::GetState => {}
    }
    Ok(None)
}

/// Formats a reply to the client to be sent over websockets.
fn format_reply(res: Response) -> Value {
    match res {
        Response::GameCreated { game_id } => json!({
            "type": "game_created",
            "gameId": game_id
        }),
        Response::GameJoined { game_id, player_id } => json!({
            "type": "game_joined",
            "gameId": game_id,
            "playerId": player_id
        }),
        Response::AgentAdded { seat } => json!({
            "type": "agent_added",
            "seat": seat
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_player_action() {
        let req = json!({
            "type": "player_action",
            "phase": "DAY_VOTE",
            "kind": "DayVote",
            "target": 3,
            "reason": "quiet all day"
        });
        let expected = Request::PlayerAction {
            phase: Phase::DayVote,
            intent: Intent::on(ActionKind::DayVote, 3).with_reason("quiet all day"),
        };
        assert_eq!(parse_request(&req).unwrap(), expected);
    }

    #[test]
    fn test_parse_abstention() {
        let req = json!({ "type": "player_action", "phase": "DAY_BADGE_ELECTION", "kind": "BadgeVote" });
        let Request::PlayerAction { intent, .. } = parse_request(&req).unwrap() else {
            panic!("expected a player action");
        };
        assert_eq!(intent.target, None);
    }

    #[test]
    fn test_parse_jump_and_join() {
        let req = json!({ "type": "board_jump", "phase": "HUNTER_SHOOT" });
        assert_eq!(parse_request(&req).unwrap(), Request::BoardJump { phase: Phase::HunterShoot });

        let req = json!({ "type": "player_join", "gameId": "ABCD", "name": "alice" });
        assert_eq!(
            parse_request(&req).unwrap(),
            Request::JoinAsPlayer {
                game_id: "ABCD".into(),
                name: "ALICE".into()
            }
        );
    }

    #[test]
    fn test_parse_create_with_options() {
        let req = json!({
            "type": "create_game",
            "options": { "badge_election": false, "witch_self_save": true, "last_words": false }
        });
        let Request::CreateGame { options } = parse_request(&req).unwrap() else {
            panic!("expected create_game");
        };
        assert!(!options.badge_election);
        assert!(!options.last_words);
    }

    #[test]
    fn test_malformed_requests() {
        for req in [
            json!({ "type": "board_jump", "phase": "TEA_TIME" }),
            json!({ "type": "player_action", "phase": "DAY_VOTE", "kind": "DayVote", "target": "three" }),
            json!({ "type": "board_join" }),
            json!({ "type": "dance" }),
        ] {
            assert!(matches!(parse_request(&req), Err(WsError::ProtocolError)));
        }
    }
}
