//! # Foolscap
//!
//! A document workspace server, usable both as a standalone binary and as a
//! library. Users own documents and projects, share them at viewer/editor/
//! owner levels, organize documents into projects, trash and restore both,
//! and spend a byte-exact storage quota.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! foolscap = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use foolscap::engine::{Engine, EnginePolicy};
//! use foolscap::server::{AppState, create_router};
//! use foolscap::store::{SqliteStore, Store};
//!
//! let store = Arc::new(SqliteStore::new("./data/foolscap.db").unwrap());
//! store.initialize().unwrap();
//!
//! let engine = Engine::new(store.clone(), EnginePolicy::default());
//! let state = Arc::new(AppState { store, engine });
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the CLI binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
