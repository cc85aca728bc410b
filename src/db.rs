// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;

use crate::error::Fallible;
use crate::storage::FlipStore;
use crate::types::timestamp::Timestamp;

/// SQLite-backed flip state. Cloning shares the connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating database schema in {database_path}");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    /// When the slot was last written, if ever.
    pub fn last_saved(&self, key: &str) -> Fallible<Option<Timestamp>> {
        let conn = self.acquire();
        let sql = "select updated_at from slots where key = ?;";
        let ts: Option<Timestamp> = conn
            .query_row(sql, [key], |row| row.get(0))
            .optional()?;
        Ok(ts)
    }

    fn acquire(&self) -> MutexGuard<'_, Connection> {
        // Every write is a single statement, so a poisoned lock holds no
        // partial state.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FlipStore for Database {
    fn read(&self, key: &str) -> Fallible<Option<String>> {
        let conn = self.acquire();
        let sql = "select payload from slots where key = ?;";
        let payload: Option<String> = conn
            .query_row(sql, [key], |row| row.get(0))
            .optional()?;
        Ok(payload)
    }

    fn write(&self, key: &str, payload: &str) -> Fallible<()> {
        log::debug!("Saving {key}: {payload}");
        let conn = self.acquire();
        let sql = "insert into slots (key, payload, updated_at) values (?, ?, ?) on conflict (key) do update set payload = excluded.payload, updated_at = excluded.updated_at;";
        conn.execute(sql, (key, payload, Timestamp::now()))?;
        Ok(())
    }
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["slots"], |row| row.get(0))?;
    Ok(count > 0)
}
