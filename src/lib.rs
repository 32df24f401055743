//! Route history: a bounded, favorite-aware cache of computed routes kept in
//! a key-value store.
//!
//! This library crate exposes all modules for use by the RPC binary and
//! integration tests.

pub mod app;
pub mod database;
pub mod managers;
pub mod rpc_handler;
pub mod services;
pub mod storage;
pub mod types;
