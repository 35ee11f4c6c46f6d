use super::player::{Player, Role};
use super::{Game, Phase};
use serde_json::{json, Value};

impl Game {
    pub fn get_board_json(&self) -> Value {
        json!({
            "players": self.get_players_json(None),
            "phase": self.phase.to_string(),
            "day": self.day,
            "sheriff": self.badge.holder,
            "badgeDestroyed": self.badge.destroyed,
            "candidates": self.badge.candidates,
            "currentSpeaker": self.current_speaker,
            "pkTargets": self.pk_targets,
            "pendingActors": self.pending_actors(),
            "lastTally": self.last_tally.as_ref().map(|t| json!({
                "counts": t.counts,
                "winner": t.winner,
                "tied": t.tied,
            })),
            "winner": self.winner,
        })
    }

    pub fn get_lobby_board_json(players: &[String]) -> Value {
        json!({
            "players": Self::get_lobby_players_json(players),
            "phase": Phase::Lobby.to_string(),
            "day": 0,
            "sheriff": null,
            "pendingActors": [],
        })
    }

    /// Everything the player in `seat` is allowed to know, including what they may do next.
    pub fn get_player_json(&self, seat: usize) -> Value {
        let player = &self.players[seat];

        json!({
            "id": player.name,
            "name": player.name,
            "seat": seat,
            "role": player.role.to_string(),
            "phase": self.phase.to_string(),
            "day": self.day,
            "action": self.get_player_action_json(seat, player),
            "knowledge": self.get_knowledge_json(player),
            "players": self.get_players_json(Some(seat)),
            "events": self.events.visible_to(Some(seat)).collect::<Vec<_>>(),
            "isDead": !player.alive
        })
    }

    pub fn get_lobby_player_json(names: &[String], player: usize) -> Value {
        json!({
            "id": names[player],
            "name": names[player],
            "action": {
                "type": "lobby",
                "canStart": names.len() >= super::options::MIN_PLAYERS
            },
            "players": Self::get_lobby_players_json(names),
            "isDead": false
        })
    }

    fn get_players_json(&self, viewer: Option<usize>) -> Value {
        self.players
            .iter()
            .map(|player| {
                let view_role = match viewer {
                    Some(i) => self.can_view_role(i, player.seat),
                    None => self.winner.is_some(),
                };
                json!({
                    "id": player.name,
                    "name": player.name,
                    "seat": player.seat,
                    "isDead": !player.alive,
                    "death": player.death.map(|d| json!({ "day": d.day, "cause": d.cause.to_string() })),
                    "isSheriff": self.badge.holder == Some(player.seat),
                    "role": view_role.then(|| player.role.to_string())
                })
            })
            .collect()
    }

    fn can_view_role(&self, viewer: usize, other: usize) -> bool {
        if viewer == other || self.winner.is_some() {
            return true;
        }
        self.players[viewer].role == Role::Werewolf && self.players[other].role == Role::Werewolf
    }

    pub fn get_lobby_players_json(players: &[String]) -> Value {
        players
            .iter()
            .enumerate()
            .map(|(seat, name)| {
                json!({
                    "id": name,
                    "name": name,
                    "seat": seat,
                    "isDead": false,
                })
            })
            .collect()
    }

    pub fn get_outcome_json(&self) -> Value {
        let Some(winner) = self.winner else {
            return json!({ "finished": false });
        };
        json!({
            "finished": true,
            "winner": winner,
            "days": self.day,
        })
    }

    /// Private facts a role has learned so far.
    fn get_knowledge_json(&self, player: &Player) -> Value {
        match player.role {
            Role::Werewolf => json!({
                "wolves": self.players.iter().filter(|p| p.role == Role::Werewolf).map(|p| p.seat).collect::<Vec<_>>(),
                "wolfVotes": self.night.wolf_votes,
                "target": self.night.wolf_target,
            }),
            Role::Seer => json!({
                "checks": self.abilities.seer_history,
            }),
            Role::Witch => json!({
                "healUsed": self.abilities.witch_heal_used,
                "poisonUsed": self.abilities.witch_poison_used,
                "victim": (self.phase == Phase::NightWitchAction && !self.abilities.witch_heal_used)
                    .then_some(self.night.wolf_target)
                    .flatten(),
            }),
            Role::Guard => json!({
                "lastProtected": self.night.last_guard_target,
            }),
            Role::Hunter => json!({
                "canShoot": self.abilities.hunter_can_shoot,
            }),
            Role::Villager => Value::Null,
        }
    }

    fn get_player_action_json(&self, seat: usize, player: &Player) -> Value {
        if let Some(winner) = self.winner {
            return json!({
                "type": "gameover",
                "winner": winner,
                "won": player.alignment() == winner
            });
        }
        let intents = self.legal_intents(seat);
        if intents.is_empty() {
            return Value::Null;
        }
        json!({
            "type": self.phase.to_string(),
            "options": intents,
            "default": self.default_intent(seat),
        })
    }
}
