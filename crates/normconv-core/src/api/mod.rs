//! REST API client module for the norm conversion service.
//!
//! This module provides the `ApiClient` for verifying API keys and sending
//! raw scores to the scoring service for conversion.
//!
//! The service uses a static API key sent as a bearer token. A `401` from
//! any endpoint surfaces as `ApiError::Unauthorized`.

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use error::ApiError;
