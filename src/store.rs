use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::Path;
use std::sync::Mutex;

/* Durable storage for the marker and route collections. The sqlite file is
used as a tiny key-value store with transaction support: one row per
collection, the whole collection serialized as a json array. Every save is
a full overwrite inside a transaction, so a collection is never partially
written.

Reads are fail-open: a missing row, an unreadable file, or corrupted json
yields an empty collection instead of an error. In-memory state is
authoritative for the session either way. */

pub const TARGET_VERSION: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Markers,
    Routes,
}

impl Collection {
    pub fn key(self) -> &'static str {
        match self {
            Collection::Markers => "markers",
            Collection::Routes => "routes",
        }
    }
}

fn open_db(dir: &str, file_name: &str) -> Result<Connection> {
    debug!("opening store db for {}", file_name);
    let mut conn = Connection::open(Path::new(dir).join(file_name))?;

    let tx = conn.transaction()?;
    let create_db_metadata_sql = "
    CREATE TABLE IF NOT EXISTS `db_metadata` (
	`key`	TEXT NOT NULL,
	`value`	TEXT,
	PRIMARY KEY(`key`)
    )";
    tx.execute(create_db_metadata_sql, ())?;

    let version_str: Option<String> = tx
        .query_row(
            "SELECT `value` FROM `db_metadata` WHERE key='version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    let version = match version_str {
        None => 0,
        Some(s) => s.parse()?,
    };

    match version.cmp(&TARGET_VERSION) {
        Ordering::Equal => (),
        Ordering::Less => {
            tx.execute(
                "INSERT OR REPLACE INTO `db_metadata` (key, value) VALUES (?1, ?2)",
                ("version", TARGET_VERSION.to_string()),
            )?;
        }
        Ordering::Greater => {
            bail!(
                "version too high: current version = {}, target_version = {}",
                version,
                TARGET_VERSION
            );
        }
    }

    tx.execute(
        "CREATE TABLE IF NOT EXISTS `collection` (
            name  TEXT PRIMARY KEY NOT NULL UNIQUE,
            value TEXT NOT NULL
        );",
        (),
    )?;
    tx.commit()?;
    Ok(conn)
}

pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    pub fn open(dir: &str) -> Result<Store> {
        let conn = open_db(dir, "waypoints.db")?;
        Ok(Store {
            conn: Mutex::new(conn),
        })
    }

    /// Load a collection, yielding an empty one on any failure.
    pub fn load_collection<T: DeserializeOwned>(&self, collection: Collection) -> Vec<T> {
        match self.try_load(collection) {
            Ok(items) => items,
            Err(error) => {
                warn!(
                    "[store] failed to load collection {}: {}",
                    collection.key(),
                    error
                );
                Vec::new()
            }
        }
    }

    fn try_load<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        let conn = self.conn.lock().unwrap();
        let mut query = conn.prepare("SELECT value FROM collection WHERE name = ?1;")?;
        let value: Option<String> = query
            .query_row([collection.key()], |row| row.get(0))
            .optional()?;
        match value {
            None => Ok(Vec::new()),
            Some(s) => Ok(serde_json::from_str(&s)?),
        }
    }

    /// Overwrite the whole collection.
    pub fn save_collection<T: Serialize>(&self, collection: Collection, items: &[T]) -> Result<()> {
        let value = serde_json::to_string(items)?;
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO collection (name, value) VALUES (?1, ?2);",
            (collection.key(), value),
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Remove the named collections entirely; subsequent loads return
    /// empty.
    pub fn clear(&self, collections: &[Collection]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        for collection in collections {
            info!("[store] clearing collection {}", collection.key());
            tx.execute(
                "DELETE FROM collection WHERE name = ?1;",
                [collection.key()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
