//! SQLite-backed key-value settings for the mentor client.
//!
//! This crate is the local credential store. It holds a handful of string
//! settings, most importantly the user's own Gemini API key under
//! [`USER_KEY_SLOT`]. The login flow writes the slot; the relay reads it
//! fresh at the start of every request.
//!
//! # Example
//!
//! ```no_run
//! use keystore::KeyStore;
//!
//! let store = KeyStore::open("mentor.db")?;
//!
//! // Save a key the way the login form does (whitespace removed)
//! store.save_user_key("  AIzaSy-example-key  ")?;
//!
//! assert_eq!(store.user_key()?.as_deref(), Some("AIzaSy-example-key"));
//! # Ok::<(), keystore::Error>(())
//! ```

mod error;
mod store;

pub use error::{Error, Result};
pub use store::{KeyStore, USER_KEY_SLOT, looks_like_gemini_key};
