//! Publikator library
//!
//! This library exposes the core functionality of the Publikator server for
//! the binary and for integration tests.

pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod forms;
pub mod routes;
pub mod sanitize;
pub mod services;
pub mod slug;
