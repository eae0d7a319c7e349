//! Infrastructure adapters and runtime bootstrap.

pub mod db;
pub mod error;
pub mod http;
pub mod mail;
pub mod passwords;
pub mod sessions;
pub mod telemetry;
