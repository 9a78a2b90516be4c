//! # Backdrop Engine
//!
//! Core library for switching a page background between a static image and a
//! theme-specific looping video. It resolves video locators through an
//! optional remote indirection service, tracks per-theme load status for the
//! session, enforces a bounded load wait and falls back to the image
//! background on failure.
//!
//! ## Modules
//!
//! - [`controller`] - The background-mode state machine and its handle
//! - [`preference`] - Persisted image/video preference
//! - [`theme_source`] - Light/dark theme observation with change deduplication
//! - [`resolver`] - Theme to media locator resolution with session cache
//! - [`probe`] - Lightweight existence checks used for pre-warming
//! - [`status`] - Per-theme load status tracking
//! - [`notification`] - Transient, pre-empting user notifications
//! - [`player`] - Media player and page surface seams
//! - [`model`] - Data models shared by all components
//! - [`taskpool`] - Bounded background work and cancellable timers
//! - [`common`] - Error types

pub mod common;
pub mod controller;
pub mod model;
pub mod notification;
pub mod player;
pub mod preference;
pub mod probe;
pub mod resolver;
pub mod status;
pub mod taskpool;
pub mod theme_source;
