use crate::session::SessionManager;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub fn make_router(manager: &'static SessionManager) -> Router {
    Router::new()
        .route("/sessions", get(get_sessions))
        .route("/pastgames", get(get_past_games))
        .with_state(manager)
}

/// Serves the HTTP API until the listener fails.
pub async fn serve(manager: &'static SessionManager, port: u16) -> anyhow::Result<()> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    log::info!("API listening on {}", listener.local_addr()?);
    axum::serve(listener, make_router(manager)).await?;
    Ok(())
}

async fn get_sessions(State(manager): State<&SessionManager>) -> Result<Json<impl Serialize>, StatusCode> {
    Ok(Json(json!({
        "num_sessions": manager.num_games()
    })))
}

async fn get_past_games(State(manager): State<&SessionManager>) -> Result<Json<impl Serialize>, StatusCode> {
    let games: Vec<Value> = manager
        .past_games()
        .into_iter()
        .map(|(id, stats)| {
            let mut json = serde_json::to_value(stats).unwrap_or(json!({}));
            if let Some(fields) = json.as_object_mut() {
                fields.insert("id".into(), id.into());
            }
            json
        })
        .collect();

    Ok(Json(json!({
        "games": games
    })))
}
