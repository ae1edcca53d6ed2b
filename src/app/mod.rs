//! Core application modules for Math Lab.
//!
//! - [`data_hub`] - cross-tab data exchange: store, events, queries, snapshots
//! - [`notifications`] - notification system for user feedback
//! - [`config`] - configuration file handling

pub mod config;
pub mod data_hub;
pub mod notifications;
