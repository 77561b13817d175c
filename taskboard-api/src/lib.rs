//! # Taskboard API Server Library
//!
//! HTTP layer of Taskboard: routing, sessions, request validation and the
//! mapping of domain errors onto HTTP responses.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration from the environment
//! - `error`: error handling and HTTP response mapping
//! - `middleware`: security headers
//! - `routes`: route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
