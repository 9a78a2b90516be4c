//! # Backdrop
//!
//! Headless runner for the background engine: loads configuration, installs
//! logging and drives a [`engine::controller::BackgroundController`] with
//! adapters that stand in for the page.
//!
//! ## Modules
//!
//! - [`adapters`] - Theme file signal, HTTP player and console surfaces
//! - [`app`] - Collaborator wiring and the stdin command loop
//! - [`config`] - Configuration loading, defaults and validation
//! - [`error`] - Error types for start-up and the command loop
//! - [`logger`] - Logging configuration
//!
//! This library interface enables integration testing by providing access to internal modules.

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod logger;

pub use error::{AppError, AppResult};
