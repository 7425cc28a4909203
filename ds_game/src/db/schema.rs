//! PostgreSQL schema.
//!
//! Every statement is idempotent, so [`migrate`] runs on each startup.

use sqlx::PgPool;

/// Schema statements, applied in order
pub const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS players (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS games (
        id UUID PRIMARY KEY,
        mode TEXT NOT NULL,
        starting_score INTEGER,
        legs INTEGER NOT NULL CHECK (legs > 0),
        sets INTEGER NOT NULL CHECK (sets > 0),
        double_out BOOLEAN NOT NULL DEFAULT false,
        status TEXT NOT NULL DEFAULT 'pending',
        winner_id UUID REFERENCES players (id),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS game_players (
        game_id UUID NOT NULL REFERENCES games (id) ON DELETE CASCADE,
        player_id UUID NOT NULL REFERENCES players (id),
        seat INTEGER NOT NULL CHECK (seat > 0),
        PRIMARY KEY (game_id, player_id),
        UNIQUE (game_id, seat)
    )",
    "CREATE TABLE IF NOT EXISTS throws (
        id UUID PRIMARY KEY,
        game_id UUID NOT NULL REFERENCES games (id) ON DELETE CASCADE,
        player_id UUID NOT NULL REFERENCES players (id),
        visit_score INTEGER NOT NULL CHECK (visit_score BETWEEN 0 AND 180),
        darts_thrown SMALLINT NOT NULL CHECK (darts_thrown BETWEEN 1 AND 3),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE INDEX IF NOT EXISTS idx_throws_game_order ON throws (game_id, created_at, id)",
    "CREATE INDEX IF NOT EXISTS idx_games_created_at ON games (created_at DESC)",
];

/// Create any missing tables and indexes
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in STATEMENTS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    log::info!("Database schema is up to date ({} statements)", STATEMENTS.len());
    Ok(())
}
