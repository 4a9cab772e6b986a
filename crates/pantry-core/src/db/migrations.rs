//! Schema migrations, tracked in `schema_version`.

use libsql::Connection;

use crate::error::Result;

/// Ordered schema steps. Each runs in its own transaction together with its
/// `schema_version` row.
const MIGRATIONS: &[(i32, &[&str])] = &[
    (
        1,
        &[
            "CREATE TABLE inventory_items (
                id TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '[]',
                expires_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                note TEXT
            )",
            "CREATE INDEX idx_inventory_position ON inventory_items(position)",
        ],
    ),
    // marks "saved empty" apart from "never saved"
    (
        2,
        &["CREATE TABLE store_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )"],
    ),
];

pub async fn run(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
        (),
    )
    .await?;

    let current = schema_version(conn).await?;
    for (version, statements) in MIGRATIONS.iter().filter(|(version, _)| *version > current) {
        apply(conn, *version, statements).await?;
        tracing::info!(version, "Applied inventory schema migration");
    }

    tracing::debug!(version = latest_version(), "Inventory schema up to date");
    Ok(())
}

fn latest_version() -> i32 {
    MIGRATIONS.last().map_or(0, |(version, _)| *version)
}

async fn schema_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;
    match rows.next().await? {
        Some(row) => Ok(row.get::<i32>(0)?),
        None => Ok(0),
    }
}

async fn apply(conn: &Connection, version: i32, statements: &[&str]) -> Result<()> {
    conn.execute("BEGIN", ()).await?;

    let outcome = async {
        for statement in statements {
            conn.execute(statement, ()).await?;
        }
        conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])
            .await?;
        conn.execute("COMMIT", ()).await?;
        Ok::<(), libsql::Error>(())
    }
    .await;

    if let Err(error) = outcome {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(error.into());
    }
    Ok(())
}
