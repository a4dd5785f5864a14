use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};

use crate::error::{Error, Result};

pub const EXPENSES_KEY: &str = "expenses";
pub const COMPANY_SETTINGS_KEY: &str = "companySettings";
pub const EMPLOYEE_DETAILS_KEY: &str = "employeeDetails";

/// Durable key/value store. Each key holds one JSON document that is rewritten
/// wholesale on every save.
pub struct Store {
    conn: Connection,
}

fn sqlite_error_string(err: &rusqlite::Error) -> String {
    match err {
        rusqlite::Error::SqliteFailure(code, msg) => {
            let message = msg.clone().unwrap_or_default();
            format!(
                "sqlite(code={:?}, extended_code={}, msg={})",
                code.code, code.extended_code, message
            )
        }
        other => other.to_string(),
    }
}

fn configure_sqlite(conn: &Connection) -> std::result::Result<(), rusqlite::Error> {
    // journal_mode is left alone: in-memory databases reject WAL.
    conn.execute_batch(
        "PRAGMA synchronous = NORMAL;\n\
         PRAGMA temp_store = MEMORY;\n\
         PRAGMA busy_timeout = 5000;\n",
    )?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn init_schema(conn: &Connection) -> std::result::Result<(), rusqlite::Error> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        );
        "#,
    )
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path).map_err(|e| storage_error("open", &e))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| storage_error("open", &e))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        let store = Self { conn };
        store.run("configure", configure_sqlite)?;
        store.run("init_schema", init_schema)?;
        Ok(store)
    }

    fn run<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> std::result::Result<T, rusqlite::Error>,
    {
        f(&self.conn).map_err(|e| storage_error(op, &e))
    }

    pub fn get_raw(&self, key: &str) -> Result<Option<String>> {
        self.run("get", |conn| {
            conn.query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional()
        })
    }

    pub fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        self.run("set", |conn| {
            conn.execute(
                "INSERT INTO kv_store(key, value) VALUES(?1, ?2) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map(|_| ())
        })
    }

    /// Absent and malformed values both fall back to `T::default()`.
    pub fn load_or_default<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(T::default());
        };
        match serde_json::from_str::<T>(&raw) {
            Ok(v) => Ok(v),
            Err(e) => {
                warn!(key, error = %e, "stored value is malformed, using empty default");
                Ok(T::default())
            }
        }
    }

    pub fn save<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_string(value)?;
        self.set_raw(key, &json)
    }
}

fn storage_error(op: &'static str, e: &rusqlite::Error) -> Error {
    let message = sqlite_error_string(e);
    error!(op, error = %message, "sqlite failure");
    Error::Storage { op, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EmployeeDetails;

    #[test]
    fn set_raw_overwrites_existing_value() {
        let store = Store::open_in_memory().unwrap();
        store.set_raw("k", "1").unwrap();
        store.set_raw("k", "2").unwrap();
        assert_eq!(store.get_raw("k").unwrap().as_deref(), Some("2"));
        assert_eq!(store.get_raw("missing").unwrap(), None);
    }

    #[test]
    fn malformed_value_falls_back_to_default() {
        let store = Store::open_in_memory().unwrap();
        // The browser build initialised employee details as an empty array.
        store.set_raw(EMPLOYEE_DETAILS_KEY, "[]").unwrap();
        let details: EmployeeDetails = store.load_or_default(EMPLOYEE_DETAILS_KEY).unwrap();
        assert_eq!(details, EmployeeDetails::default());

        store.set_raw(EXPENSES_KEY, "{not json").unwrap();
        let list: Vec<crate::model::Expense> = store.load_or_default(EXPENSES_KEY).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn save_then_load_returns_value() {
        let store = Store::open_in_memory().unwrap();
        let d = EmployeeDetails {
            emp_name: "Asha".into(),
            ..Default::default()
        };
        store.save(EMPLOYEE_DETAILS_KEY, &d).unwrap();
        let back: EmployeeDetails = store.load_or_default(EMPLOYEE_DETAILS_KEY).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("expenses.db");
        let store = Store::open(&path).unwrap();
        store.set_raw("k", "v").unwrap();
        assert!(path.exists());
    }
}
