//! Library exports for wayshare subsystems.
//!
//! Provider loading, request dispatch and result extraction are exposed so the
//! schema dump binaries and integration tests can share them with the main
//! binary.

pub mod action;
pub mod capture;
pub mod clipboard;
pub mod config;
pub mod dispatch;
pub mod notification;
pub mod prompt;
pub mod provider;
pub mod template;
pub mod upload_log;

pub use config::Config;
