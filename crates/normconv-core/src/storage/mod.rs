//! On-disk session state.

pub mod dates;
mod manager;

pub use manager::{Persisted, SessionState, SessionStore, STORAGE_VERSION};
