//! User Storage
//! Mission: Persist user accounts in SQLite
//!
//! Email uniqueness is enforced by the schema; a UNIQUE violation surfaces as
//! `ServiceError::DuplicateEmail`. Updates run read-modify-write inside one
//! SQLite transaction.

use crate::auth::{
    error::ServiceError,
    models::{NewUser, Role, User, UserUpdate},
};
use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use tracing::{info, warn};

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT UNIQUE NOT NULL,
    name TEXT NOT NULL,
    city TEXT,
    role TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);
"#;

const USER_COLUMNS: &str = "id, email, name, city, role, password_hash, created_at";

/// User storage with SQLite backend
pub struct UserStore {
    conn: Mutex<Connection>,
}

impl UserStore {
    /// Open (or create) the database at `db_path`. `":memory:"` gives a private in-memory DB.
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database at {}", db_path))?;

        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize database schema")?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .context("Failed to count users")?;
        info!("👥 User store opened at {} ({} users)", db_path, count);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<User> {
        let role_str: String = row.get(4)?;
        let role = Role::parse(&role_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                Type::Text,
                format!("unknown role '{}'", role_str).into(),
            )
        })?;

        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            city: row.get(3)?,
            role,
            password_hash: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn query_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            params![id],
            Self::map_row,
        )
        .optional()
    }

    /// Insert a new user; the id is assigned by SQLite
    pub fn create_user(&self, new_user: &NewUser) -> Result<User, ServiceError> {
        let created_at = Utc::now().to_rfc3339();

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO users (email, name, city, role, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new_user.email,
                new_user.name,
                new_user.city,
                new_user.role.as_str(),
                new_user.password_hash,
                created_at,
            ],
        )
        .map_err(map_write_error)?;

        let user = User {
            id: conn.last_insert_rowid(),
            email: new_user.email.clone(),
            name: new_user.name.clone(),
            city: new_user.city.clone(),
            role: new_user.role,
            password_hash: new_user.password_hash.clone(),
            created_at,
        };

        info!("✅ Created user {} ({}) id={}", user.email, user.role, user.id);
        Ok(user)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let conn = self.conn.lock();
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
                params![email],
                Self::map_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<User>, ServiceError> {
        let conn = self.conn.lock();
        Ok(Self::query_by_id(&conn, id)?)
    }

    /// List all users, oldest first
    pub fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))?;

        let users = stmt
            .query_map([], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(users)
    }

    /// Apply a partial update and return the stored result. An empty update
    /// writes nothing but still reports a missing id.
    pub fn update_user(&self, id: i64, update: UserUpdate) -> Result<User, ServiceError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let mut user = Self::query_by_id(&tx, id)?.ok_or_else(ServiceError::user_not_found)?;
        if update.is_empty() {
            return Ok(user);
        }
        update.apply(&mut user);

        tx.execute(
            "UPDATE users SET email = ?1, name = ?2, city = ?3, role = ?4, password_hash = ?5
             WHERE id = ?6",
            params![
                user.email,
                user.name,
                user.city,
                user.role.as_str(),
                user.password_hash,
                user.id,
            ],
        )
        .map_err(map_write_error)?;
        tx.commit()?;

        info!("✏️  Updated user id={} ({})", user.id, user.email);
        Ok(user)
    }

    pub fn delete_user(&self, id: i64) -> Result<(), ServiceError> {
        let conn = self.conn.lock();
        let rows_affected = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;

        if rows_affected == 0 {
            return Err(ServiceError::user_not_found());
        }

        info!("🗑️  Deleted user id={}", id);
        Ok(())
    }

    pub fn count_admins(&self) -> Result<i64, ServiceError> {
        let conn = self.conn.lock();
        let count = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = ?1",
            params![Role::Admin.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Make sure at least one ADMIN exists. Returns the account created or
    /// promoted, or `None` when an admin was already present.
    pub fn ensure_admin(&self, email: &str, password_hash: &str) -> Result<Option<User>, ServiceError> {
        if self.count_admins()? > 0 {
            return Ok(None);
        }

        if let Some(existing) = self.find_by_email(email)? {
            warn!("Promoting existing account {} to ADMIN", email);
            let update = UserUpdate {
                role: Some(Role::Admin),
                ..Default::default()
            };
            return self.update_user(existing.id, update).map(Some);
        }

        let admin = self.create_user(&NewUser {
            email: email.to_string(),
            name: "Administrator".to_string(),
            city: None,
            role: Role::Admin,
            password_hash: password_hash.to_string(),
        })?;

        info!("🔐 Seeded admin account {}", admin.email);
        Ok(Some(admin))
    }
}

fn map_write_error(err: rusqlite::Error) -> ServiceError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            ServiceError::DuplicateEmail
        }
        _ => err.into(),
    }
}
