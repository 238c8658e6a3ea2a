//! Core library for normconv.
//!
//! Everything a front end needs to run a speech-language norm conversion:
//! age calculation, the assessment tool registry, score entry state, the
//! scoring service client, session persistence and the copy-ready report.
//! Each state struct is owned by the caller and passed explicitly.

pub mod age;
pub mod api;
pub mod auth;
pub mod config;
pub mod convert;
pub mod error;
pub mod models;
pub mod report;
pub mod scores;
pub mod selection;
pub mod storage;
pub mod utils;

pub use age::{calculate_age, calculate_age_at, format_age_result, AgeResult};
pub use api::{ApiClient, ApiError};
pub use auth::{AuthSession, CredentialStore};
pub use config::Config;
pub use convert::{apply_response, build_request, submit, SubmitError};
pub use error::ValidationError;
pub use report::{format_report, format_session_report, format_tool_section};
pub use scores::ScoreEntryState;
pub use selection::SelectionState;
pub use storage::{SessionState, SessionStore};
