//! # MythicalDash API Server Library
//!
//! Dashboard backend: session-scoped user endpoints, admin settings,
//! leaderboards, PayPal coin purchases and the guarded frontend entry routes.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Session resolution and client address extraction
//! - `response`: Success envelope and redirect helpers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod response;
pub mod routes;
