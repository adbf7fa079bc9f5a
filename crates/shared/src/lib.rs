//! Shared types, errors, and configuration for Faktura.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error taxonomy
//! - Configuration management
//! - Identity verification against the external auth provider

pub mod config;
pub mod error;
pub mod identity;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use identity::{IdentityError, TokenVerifier, VerifiedIdentity};
