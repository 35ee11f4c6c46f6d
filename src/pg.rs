use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::IVec;
use std::time::Duration;
use tokio_postgres::{types::ToSql, Client, NoTls, Statement};

/// The summary of a finished game, as archived and as stored in Postgres.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameStats {
    pub game_id: String,
    pub players: Vec<String>,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    /// The winning alignment, if the game reached an end.
    pub winner: Option<String>,
    pub days: u32,
}

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS game (
        id BIGINT PRIMARY KEY,
        code TEXT NOT NULL,
        started TIMESTAMPTZ NOT NULL,
        finished TIMESTAMPTZ NOT NULL,
        players TEXT[] NOT NULL,
        winner TEXT,
        days INTEGER NOT NULL
    );";

const INSERT_GAME: &str = "INSERT INTO game (id, code, started, finished, players, winner, days)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    ON CONFLICT DO NOTHING;";

/// Moves archived game summaries into Postgres, removing each from the archive once written.
pub async fn sync_game_stats(db: sled::Db) {
    let client = match connect_pg().await {
        Ok(client) => client,
        Err(err) => return log::error!("Could not connect to PostgresQL: {:?}", err),
    };
    if let Err(err) = client.batch_execute(CREATE_TABLE).await {
        return log::error!("Could not create game table: {:?}", err);
    }
    let Ok(insert) = client.prepare(INSERT_GAME).await else {
        return log::error!("Could not create prepared statement");
    };
    let Ok(archive) = db.open_tree("archive") else {
        return log::error!("Could not open archive database");
    };

    log::info!("Writing game statistics to PostgresQL.");
    let mut interval = tokio::time::interval(Duration::from_secs(5));
    loop {
        interval.tick().await;

        if client.is_closed() {
            log::error!("Connection to PostgresQL closed.");
            return;
        }

        let pending: Vec<_> = archive.iter().filter_map(|e| e.ok().and_then(read_row)).collect();
        for (key, game) in pending {
            let code = game.game_id.clone();
            if let Err(err) = write_row(&client, &insert, key, game).await {
                log::error!("Could not write game {}: {:?}", code, err);
                break;
            }
            log::info!("Archived game {} to PostgresQL", code);
            archive.remove((key as u64).to_be_bytes()).ok();
        }
    }
}

async fn connect_pg() -> anyhow::Result<Client> {
    let host = std::env::var("PG_HOST")?;
    let user = std::env::var("PG_USER")?;
    let password = std::env::var("PG_PASSWORD")?;
    let dbname = std::env::var("PG_DBNAME")?;

    let (client, connection) = tokio_postgres::Config::new()
        .host(&host)
        .user(&user)
        .password(&password)
        .dbname(&dbname)
        .connect(NoTls)
        .await?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("PostgresQL connection error: {}", e);
        }
    });

    Ok(client)
}

/// Reads an archive entry, keyed by its big-endian id.
pub fn read_row(entry: (IVec, IVec)) -> Option<(i64, GameStats)> {
    let key = u64::from_be_bytes(entry.0.as_ref().try_into().ok()?) as i64;
    let game = serde_json::from_slice::<GameStats>(&entry.1).ok()?;
    Some((key, game))
}

async fn write_row(client: &Client, stmt: &Statement, key: i64, game: GameStats) -> anyhow::Result<()> {
    let days = game.days as i32;
    let args: [&(dyn ToSql + Sync); 7] = [
        &key,
        &game.game_id.as_str(),
        &game.started,
        &game.finished,
        &game.players,
        &game.winner,
        &days,
    ];
    client.execute(stmt, &args).await?;
    Ok(())
}
