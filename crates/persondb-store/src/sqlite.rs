use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use persondb_core::criteria::CriteriaSet;
use persondb_core::error::Error;
use persondb_core::traits::{RecordSession, RecordStore};
use persondb_core::types::Person;

use crate::query::{self, WhereClause};
use crate::schema::{init_schema, person_from_row, person_values, register_functions, SELECT_COLUMNS, WRITE_COLUMNS};

/// Record store backed by one SQLite connection.
///
/// A [`SqliteSession`] owns the connection from `BEGIN` to `COMMIT`, so
/// concurrent sessions run one after the other and never see each other's
/// uncommitted writes.
pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
    holder: Mutex<Option<ThreadId>>,
}

impl SqliteRecordStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_millis(500))?;
        tracing::debug!(path = %path.display(), "opened record store");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        register_functions(&conn)?;
        init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn), holder: Mutex::new(None) })
    }

    fn holder(&self) -> Result<MutexGuard<'_, Option<ThreadId>>> {
        self.holder
            .lock()
            .map_err(|_| Error::Operation("record store holder poisoned".to_string()).into())
    }
}

impl RecordStore for SqliteRecordStore {
    type Session<'a> = SqliteSession<'a>;

    fn begin_transaction(&self) -> Result<SqliteSession<'_>> {
        let me = thread::current().id();
        if *self.holder()? == Some(me) {
            return Err(Error::Transaction("a transaction is already open on this thread".to_string()).into());
        }
        let conn = self
            .conn
            .lock()
            .map_err(|_| Error::Operation("record store connection poisoned".to_string()))?;
        *self.holder()? = Some(me);
        let mut session = SqliteSession { conn, holder: &self.holder, open: false };
        session.conn.execute_batch("BEGIN")?;
        session.open = true;
        Ok(session)
    }
}

/// Exclusive hold on the connection for one transaction.
///
/// Dropping an uncommitted session rolls it back.
pub struct SqliteSession<'a> {
    conn: MutexGuard<'a, Connection>,
    holder: &'a Mutex<Option<ThreadId>>,
    open: bool,
}

impl SqliteSession<'_> {
    fn count_where(&self, clause: WhereClause) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM person{}", clause.sql);
        let n: i64 = self.conn.query_row(&sql, params_from_iter(clause.params), |r| r.get(0))?;
        Ok(u64::try_from(n)?)
    }

    fn find_where(&self, clause: WhereClause, from: usize, size: usize) -> Result<Vec<Person>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM person{} ORDER BY id LIMIT ? OFFSET ?", clause.sql);
        let mut bound = clause.params;
        bound.push(Value::Integer(i64::try_from(size)?));
        bound.push(Value::Integer(i64::try_from(from)?));
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bound), person_from_row)?;
        let people = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(people)
    }

    fn insert(&self, person: &Person, id: Option<i64>) -> Result<i64> {
        let mut values = person_values(person)?;
        let mut columns = WRITE_COLUMNS.to_vec();
        if let Some(id) = id {
            columns.push("id");
            values.push(Value::Integer(id));
        }
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!("INSERT INTO person ({}) VALUES ({placeholders})", columns.join(", "));
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(self.conn.last_insert_rowid())
    }
}

impl Drop for SqliteSession<'_> {
    fn drop(&mut self) {
        if self.open {
            tracing::warn!("session dropped without commit, rolling back");
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::error!(error = %e, "rollback failed");
            }
        }
        if let Ok(mut holder) = self.holder.lock() {
            *holder = None;
        }
    }
}

impl RecordSession for SqliteSession<'_> {
    fn commit(&mut self) -> Result<()> {
        if !self.open {
            return Err(Error::Transaction("no open transaction to commit".to_string()).into());
        }
        // Left open on failure so the drop rolls it back.
        self.conn.execute_batch("COMMIT")?;
        self.open = false;
        Ok(())
    }

    fn get_by_reference(&self, reference: &str) -> Result<Option<Person>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM person WHERE reference = ?1");
        let person = self.conn.query_row(&sql, params![reference], person_from_row).optional()?;
        Ok(person)
    }

    fn save(&self, person: &Person) -> Result<Person> {
        let id = match person.id {
            None => self.insert(person, None)?,
            Some(id) => {
                let assignments: Vec<String> = WRITE_COLUMNS.iter().map(|c| format!("{c} = ?")).collect();
                let sql = format!("UPDATE person SET {} WHERE id = ?", assignments.join(", "));
                let mut values = person_values(person)?;
                values.push(Value::Integer(id));
                if self.conn.execute(&sql, params_from_iter(values))? == 0 {
                    self.insert(person, Some(id))?
                } else {
                    id
                }
            }
        };
        tracing::debug!(id, reference = ?person.reference, "saved person");
        Ok(Person { id: Some(id), ..person.clone() })
    }

    fn delete(&self, person: &Person) -> Result<()> {
        let removed = match (person.id, person.reference.as_deref()) {
            (Some(id), _) => self.conn.execute("DELETE FROM person WHERE id = ?1", params![id])?,
            (None, Some(reference)) => self.conn.execute("DELETE FROM person WHERE reference = ?1", params![reference])?,
            (None, None) => 0,
        };
        tracing::debug!(removed, id = ?person.id, "deleted person");
        Ok(())
    }

    fn count_like_free_text(&self, query: Option<&str>) -> Result<u64> {
        self.count_where(query::free_text(query))
    }

    fn find_like_free_text(&self, query: Option<&str>, from: usize, size: usize) -> Result<Vec<Person>> {
        self.find_where(query::free_text(query), from, size)
    }

    fn count_with_criteria(&self, criteria: &CriteriaSet) -> Result<u64> {
        self.count_where(query::criteria(criteria))
    }

    fn find_with_criteria(&self, criteria: &CriteriaSet, from: usize, size: usize) -> Result<Vec<Person>> {
        self.find_where(query::criteria(criteria), from, size)
    }
}
