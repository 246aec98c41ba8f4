//! SQLite key-value store implementation.

use crate::Result;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use tracing::debug;

/// Slot holding the user-supplied Gemini API key.
pub const USER_KEY_SLOT: &str = "USER_GEMINI_KEY";

/// Prefix every Gemini API key starts with.
const GEMINI_KEY_PREFIX: &str = "AIza";

/// SQLite-backed key-value store.
pub struct KeyStore {
    conn: Connection,
}

impl KeyStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Read a value.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert or replace a value.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        debug!(key, "setting stored");
        Ok(())
    }

    /// Delete a value. Returns whether anything was removed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM settings WHERE key = ?1", [key])?;
        Ok(removed > 0)
    }

    /// The stored user API key, exactly as saved.
    pub fn user_key(&self) -> Result<Option<String>> {
        self.get(USER_KEY_SLOT)
    }

    /// Save a user API key.
    ///
    /// Blank input is ignored and leaves any existing key in place. Otherwise
    /// all whitespace is stripped before storing, since pasted keys often
    /// carry invisible spaces or line breaks. Returns whether a key was written.
    pub fn save_user_key(&self, raw: &str) -> Result<bool> {
        if raw.trim().is_empty() {
            return Ok(false);
        }
        let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        self.set(USER_KEY_SLOT, &cleaned)?;
        Ok(true)
    }

    /// Forget the user API key.
    pub fn clear_user_key(&self) -> Result<bool> {
        self.remove(USER_KEY_SLOT)
    }
}

/// Whether a string has the shape of a Gemini API key.
///
/// Only a hint for the user; requests are never gated on it.
pub fn looks_like_gemini_key(value: &str) -> bool {
    value.trim().starts_with(GEMINI_KEY_PREFIX)
}
