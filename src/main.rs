use crate::agent::DEFAULT_DECISION_TIMEOUT;
use crate::session::{SessionManager, Settings};
use crate::ws::accept_connection;
use anyhow::Context;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;
use tokio::net::TcpListener;

mod agent;
mod api;
mod client;
mod error;
mod game;
mod pg;
mod session;
mod time;
mod ws;

// FIXME: Implement TLS support

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::try_init().ok();

    let port: u16 = std::env::var("PORT")
        .context("PORT is unspecified")?
        .parse()
        .context("PORT is invalid")?;

    let db_path = std::env::var("DB_PATH").unwrap_or_else(|_| "./data".to_string());
    let db = sled::open(&db_path).with_context(|| format!("could not open database at {}", db_path))?;

    let decision_timeout = match std::env::var("DECISION_TIMEOUT_MS") {
        Ok(ms) => Duration::from_millis(ms.parse().context("DECISION_TIMEOUT_MS is invalid")?),
        Err(_) => DEFAULT_DECISION_TIMEOUT,
    };
    let settings = Settings {
        decision_timeout,
        dev_tools: std::env::var("DEV_TOOLS").map_or(false, |v| v == "1" || v == "true"),
        ..Default::default()
    };

    let manager = SessionManager::new(db.clone(), settings)
        .map_err(|err| anyhow::anyhow!("could not restore sessions: {}", err))?;
    let manager: &'static SessionManager = Box::leak(Box::new(manager));
    manager.resume_agents();

    if let Ok(api_port) = std::env::var("API_PORT") {
        let api_port: u16 = api_port.parse().context("API_PORT is invalid")?;
        tokio::spawn(async move {
            if let Err(err) = api::serve(manager, api_port).await {
                log::error!("API server failed: {:?}", err);
            }
        });
    }

    if std::env::var("PG_HOST").is_ok() {
        tokio::spawn(pg::sync_game_stats(db));
    }

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
            manager.purge_games();
        }
    });

    let addr = SocketAddrV4::new(Ipv4Addr::new(127, 0, 0, 1), port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("could not bind to address: {:?}", addr))?;
    log::info!("Listening on: {:?}", addr);

    while let Ok((stream, _)) = listener.accept().await {
        tokio::spawn(accept_connection(stream, manager));
    }

    Ok(())
}
