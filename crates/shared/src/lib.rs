//! Shared types, errors, and configuration for Photostore.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for products and stored files
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, LogConfig, ServerConfig, StorageSettings, UploadSettings};
pub use error::AppError;
