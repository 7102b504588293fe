/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `user`: Session profile
/// - `leaderboard`: Ranked user listings
/// - `settings`: Admin settings CRUD
/// - `pterodactyl`: Panel account lookups
/// - `paypal`: Checkout redirects
/// - `webhooks`: PayPal IPN receiver
/// - `license`: License information relay
/// - `captcha`: Turnstile token checks
/// - `frontend`: Guarded single-page app entry routes

pub mod captcha;
pub mod frontend;
pub mod health;
pub mod leaderboard;
pub mod license;
pub mod paypal;
pub mod pterodactyl;
pub mod settings;
pub mod user;
pub mod webhooks;
