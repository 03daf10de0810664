//! In-process SQLite store holding the `users` and `callLogs` tables.
//!
//! [`CallStore`] owns the single connection for a run. Stages borrow it; the
//! connection is released when the store is closed or dropped.

use etl_core::error::Result;
use etl_core::models::{CallLog, NewCallLog, NewUser, User, UserAnalytics};
use rusqlite::{params, Connection, Row, Transaction};
use tracing::debug;

const SCHEMA: &str = "
    DROP TABLE IF EXISTS callLogs;
    DROP TABLE IF EXISTS users;

    CREATE TABLE users (
        userId INTEGER PRIMARY KEY AUTOINCREMENT,
        firstName TEXT NOT NULL,
        lastName TEXT NOT NULL
    );

    CREATE TABLE callLogs (
        callId INTEGER PRIMARY KEY AUTOINCREMENT,
        phoneNumber TEXT,
        startTime INTEGER,
        endTime INTEGER,
        direction TEXT,
        userId INTEGER,
        FOREIGN KEY (userId) REFERENCES users(userId)
    );
";

const INSERT_USER: &str = "INSERT INTO users (firstName, lastName) VALUES (?1, ?2)";

const INSERT_CALL_LOG: &str = "INSERT INTO callLogs (phoneNumber, startTime, endTime, direction, userId)
     VALUES (?1, ?2, ?3, ?4, ?5)";

const SELECT_CALL_LOG: &str =
    "SELECT callId, phoneNumber, startTime, endTime, direction, userId FROM callLogs";

// ── CallStore ─────────────────────────────────────────────────────────────────

/// Owner of the relational store for one pipeline run.
pub struct CallStore {
    conn: Connection,
}

impl CallStore {
    /// Open a fresh in-memory store. Tables are not created until
    /// [`CallStore::init_schema`] runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // The callLogs -> users key is declared for documentation only.
        conn.pragma_update(None, "foreign_keys", false)?;
        Ok(Self { conn })
    }

    /// Drop and recreate both tables so every run starts empty.
    pub fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        debug!("schema initialised: users, callLogs");
        Ok(())
    }

    /// Start an insert batch. Rows become visible to readers once
    /// [`LoadBatch::commit`] succeeds; dropping the batch rolls it back.
    pub fn begin_load(&mut self) -> Result<LoadBatch<'_>> {
        Ok(LoadBatch {
            tx: self.conn.transaction()?,
        })
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// All users in key order.
    pub fn users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT userId, firstName, lastName FROM users ORDER BY userId")?;
        let rows = stmt.query_map([], |row| {
            Ok(User {
                user_id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// All call logs in insertion order.
    pub fn call_logs(&self) -> Result<Vec<CallLog>> {
        self.query_call_logs(&format!("{SELECT_CALL_LOG} ORDER BY callId"))
    }

    /// Call logs ordered by `userId`, then `startTime`, with ties kept in
    /// insertion order.
    pub fn ordered_calls(&self) -> Result<Vec<CallLog>> {
        self.query_call_logs(&format!(
            "{SELECT_CALL_LOG} ORDER BY userId ASC, startTime ASC, callId ASC"
        ))
    }

    /// Average duration and call count per `userId` present in `callLogs`,
    /// ascending by `userId`.
    pub fn user_analytics(&self) -> Result<Vec<UserAnalytics>> {
        let mut stmt = self.conn.prepare(
            "SELECT userId,
                    AVG(endTime - startTime) AS avgDuration,
                    COUNT(callId) AS numCalls
             FROM callLogs
             GROUP BY userId
             ORDER BY userId",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(UserAnalytics {
                user_id: row.get(0)?,
                avg_duration: row.get(1)?,
                num_calls: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn user_exists(&self, user_id: i64) -> Result<bool> {
        user_exists(&self.conn, user_id)
    }

    /// Close the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e.into())
    }

    fn query_call_logs(&self, sql: &str) -> Result<Vec<CallLog>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], call_log_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

// ── LoadBatch ─────────────────────────────────────────────────────────────────

/// A transaction over the store used by one loader.
pub struct LoadBatch<'a> {
    tx: Transaction<'a>,
}

impl LoadBatch<'_> {
    /// Insert a user and return its assigned `userId`.
    pub fn insert_user(&self, user: &NewUser) -> Result<i64> {
        self.tx
            .prepare_cached(INSERT_USER)?
            .execute(params![user.first_name, user.last_name])?;
        Ok(self.tx.last_insert_rowid())
    }

    /// Insert a call log and return its assigned `callId`.
    pub fn insert_call_log(&self, call: &NewCallLog) -> Result<i64> {
        self.tx.prepare_cached(INSERT_CALL_LOG)?.execute(params![
            call.phone_number,
            call.start_time,
            call.end_time,
            call.direction,
            call.user_id,
        ])?;
        Ok(self.tx.last_insert_rowid())
    }

    pub fn user_exists(&self, user_id: i64) -> Result<bool> {
        user_exists(&self.tx, user_id)
    }

    pub fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }
}

// ── Row mapping ───────────────────────────────────────────────────────────────

fn call_log_from_row(row: &Row<'_>) -> rusqlite::Result<CallLog> {
    Ok(CallLog {
        call_id: row.get(0)?,
        phone_number: row.get(1)?,
        start_time: row.get(2)?,
        end_time: row.get(3)?,
        direction: row.get(4)?,
        user_id: row.get(5)?,
    })
}

fn user_exists(conn: &Connection, user_id: i64) -> Result<bool> {
    let found: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE userId = ?1)",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(found)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CallStore {
        let store = CallStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        store
    }

    fn new_user(first: &str, last: &str) -> NewUser {
        NewUser {
            first_name: first.to_string(),
            last_name: last.to_string(),
        }
    }

    fn new_call(phone: &str, start: i64, end: i64, user_id: i64) -> NewCallLog {
        NewCallLog {
            phone_number: phone.to_string(),
            start_time: start,
            end_time: end,
            direction: "OUT".to_string(),
            user_id,
        }
    }

    fn seed_calls(store: &mut CallStore, calls: &[NewCallLog]) {
        let batch = store.begin_load().unwrap();
        for call in calls {
            batch.insert_call_log(call).unwrap();
        }
        batch.commit().unwrap();
    }

    // ── Schema ────────────────────────────────────────────────────────────────

    #[test]
    fn test_init_schema_creates_empty_tables() {
        let store = store();
        assert!(store.users().unwrap().is_empty());
        assert!(store.call_logs().unwrap().is_empty());
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let mut store = store();
        let batch = store.begin_load().unwrap();
        batch.insert_user(&new_user("Alice", "Smith")).unwrap();
        batch.insert_call_log(&new_call("555", 1, 2, 1)).unwrap();
        batch.commit().unwrap();

        store.init_schema().unwrap();

        assert!(store.users().unwrap().is_empty());
        assert!(store.call_logs().unwrap().is_empty());
    }

    #[test]
    fn test_foreign_key_is_not_enforced() {
        let mut store = store();
        seed_calls(&mut store, &[new_call("555", 1, 2, 42)]);
        assert_eq!(store.call_logs().unwrap().len(), 1);
        assert!(!store.user_exists(42).unwrap());
    }

    // ── Inserts ───────────────────────────────────────────────────────────────

    #[test]
    fn test_insert_user_assigns_increasing_ids() {
        let mut store = store();
        let batch = store.begin_load().unwrap();
        let first = batch.insert_user(&new_user("Alice", "Smith")).unwrap();
        let second = batch.insert_user(&new_user("Bob", "Jones")).unwrap();
        assert!(batch.user_exists(second).unwrap());
        batch.commit().unwrap();

        assert_eq!((first, second), (1, 2));
        let users = store.users().unwrap();
        assert_eq!(users[1].first_name, "Bob");
        assert!(store.user_exists(1).unwrap());
    }

    #[test]
    fn test_dropped_batch_rolls_back() {
        let mut store = store();
        {
            let batch = store.begin_load().unwrap();
            batch.insert_user(&new_user("Ghost", "User")).unwrap();
        }
        assert!(store.users().unwrap().is_empty());
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    #[test]
    fn test_user_analytics_mean_and_count() {
        let mut store = store();
        seed_calls(
            &mut store,
            &[
                new_call("555-1234", 100, 200, 1),
                new_call("555-5678", 150, 180, 1),
                new_call("555-9999", 10, 15, 2),
            ],
        );

        let analytics = store.user_analytics().unwrap();

        assert_eq!(
            analytics,
            vec![
                UserAnalytics {
                    user_id: 1,
                    avg_duration: 65.0,
                    num_calls: 2
                },
                UserAnalytics {
                    user_id: 2,
                    avg_duration: 5.0,
                    num_calls: 1
                },
            ]
        );
    }

    #[test]
    fn test_user_analytics_fractional_mean() {
        let mut store = store();
        seed_calls(
            &mut store,
            &[new_call("a", 0, 1, 3), new_call("b", 0, 2, 3)],
        );
        let analytics = store.user_analytics().unwrap();
        assert_eq!(analytics.len(), 1);
        assert!((analytics[0].avg_duration - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_user_analytics_ascending_user_ids() {
        let mut store = store();
        seed_calls(
            &mut store,
            &[
                new_call("a", 0, 1, 9),
                new_call("b", 0, 1, 2),
                new_call("c", 0, 1, 5),
            ],
        );
        let ids: Vec<i64> = store
            .user_analytics()
            .unwrap()
            .iter()
            .map(|r| r.user_id)
            .collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn test_user_analytics_empty_table() {
        assert!(store().user_analytics().unwrap().is_empty());
    }

    #[test]
    fn test_ordered_calls_sorted_with_stable_ties() {
        let mut store = store();
        seed_calls(
            &mut store,
            &[
                new_call("u2-late", 300, 310, 2),
                new_call("u1-late", 150, 180, 1),
                new_call("u1-tie-a", 100, 110, 1),
                new_call("u2-early", 50, 60, 2),
                new_call("u1-tie-b", 100, 120, 1),
            ],
        );

        let phones: Vec<String> = store
            .ordered_calls()
            .unwrap()
            .into_iter()
            .map(|c| c.phone_number)
            .collect();

        assert_eq!(
            phones,
            vec!["u1-tie-a", "u1-tie-b", "u1-late", "u2-early", "u2-late"]
        );
    }

    #[test]
    fn test_call_logs_insertion_order() {
        let mut store = store();
        seed_calls(
            &mut store,
            &[new_call("b", 9, 10, 2), new_call("a", 1, 2, 1)],
        );
        let ids: Vec<i64> = store.call_logs().unwrap().iter().map(|c| c.call_id).collect();
        assert_eq!(ids, vec![1, 2]);
    }
}
