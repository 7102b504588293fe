//! # MythicalDash Shared Library
//!
//! This crate contains the domain types, persistence layer, business rules and
//! third-party integrations used by the MythicalDash API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their store traits
//! - `db`: Connection pool, migrations and store implementations
//! - `auth`: Roles, capabilities and session resolution
//! - `services`: Settings, leaderboard and payment operations
//! - `integrations`: PayPal, Pterodactyl, license service and Turnstile clients
//! - `navigation`: Route guard rules for the single-page frontend
//! - `net`: Client IP resolution behind proxies
//! - `format`: Human-readable number formatting

pub mod auth;
pub mod db;
pub mod error;
pub mod format;
pub mod integrations;
pub mod models;
pub mod navigation;
pub mod net;
pub mod services;

/// Current version of the MythicalDash shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
