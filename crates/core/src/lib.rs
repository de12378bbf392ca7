//! Core photo storage logic for Photostore.
//!
//! This crate contains the object storage adapter, the object key naming
//! scheme and the photo use cases. It has no web dependencies.
//!
//! # Modules
//!
//! - `storage` - Object store adapter over Apache OpenDAL
//! - `photo` - Key naming and photo use cases

pub mod photo;
pub mod storage;
